//! Helper macro generating domain port error enums.
//!
//! Each variant gets a snake_case constructor whose fields accept anything
//! convertible into the declared type.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum ArchiveError {
            Unavailable => "archive unavailable",
            Write { path: String } => "could not write {path}",
            Rejected { status: u16 } => "rejected with status {status}",
            Partial { path: String, written: u64 } => "{path}: only {written} bytes written",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(ArchiveError::unavailable().to_string(), "archive unavailable");
    }

    #[test]
    fn string_fields_accept_str() {
        let err = ArchiveError::write("invoice-1.pdf");
        assert_eq!(err.to_string(), "could not write invoice-1.pdf");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = ArchiveError::rejected(503_u16);
        assert_eq!(err, ArchiveError::Rejected { status: 503 });
    }

    #[test]
    fn mixed_fields_are_passed_in_order() {
        let err = ArchiveError::partial("invoice-2.pdf", 12_u64);
        assert_eq!(err.to_string(), "invoice-2.pdf: only 12 bytes written");
    }
}
