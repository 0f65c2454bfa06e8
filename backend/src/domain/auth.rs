//! Authentication primitives: passwords, credentials and account requests.
//!
//! Handlers hand raw strings to these constructors; services only ever see
//! validated values.

use std::fmt;

use zeroize::Zeroizing;

use super::user::UserValidationError;
use super::{CountryId, EmailAddress, ResetToken};

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 5;
/// Maximum accepted password length.
pub const PASSWORD_MAX: usize = 128;

const PASSWORD_RULE: &str =
    "Please enter a password of at least 5 characters made up of only numbers and letters";

/// Validation failures for authentication payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    InvalidEmail,
    PasswordTooShort,
    PasswordTooLong,
    PasswordNotAlphanumeric,
    MalformedResetToken,
}

impl AuthValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "email",
            Self::PasswordTooShort | Self::PasswordTooLong | Self::PasswordNotAlphanumeric => {
                "password"
            }
            Self::MalformedResetToken => "passwordToken",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::PasswordTooShort => "password_too_short",
            Self::PasswordTooLong => "password_too_long",
            Self::PasswordNotAlphanumeric => "password_not_alphanumeric",
            Self::MalformedResetToken => "invalid_or_expired_token",
        }
    }
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "Please enter a valid email"),
            Self::PasswordTooShort | Self::PasswordNotAlphanumeric => f.write_str(PASSWORD_RULE),
            Self::PasswordTooLong => {
                write!(f, "password must be at most {PASSWORD_MAX} characters")
            }
            Self::MalformedResetToken => write!(f, "reset link is invalid or has expired"),
        }
    }
}

impl std::error::Error for AuthValidationError {}

impl From<UserValidationError> for AuthValidationError {
    fn from(_: UserValidationError) -> Self {
        Self::InvalidEmail
    }
}

/// Plaintext password held in zeroising memory.
///
/// ## Invariants
/// - Surrounding whitespace is trimmed.
/// - Between [`PASSWORD_MIN`] and [`PASSWORD_MAX`] ASCII letters or digits.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(raw: &str) -> Result<Self, AuthValidationError> {
        let trimmed = raw.trim();
        let length = trimmed.chars().count();
        if length < PASSWORD_MIN {
            return Err(AuthValidationError::PasswordTooShort);
        }
        if length > PASSWORD_MAX {
            return Err(AuthValidationError::PasswordTooLong);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthValidationError::PasswordNotAlphanumeric);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Validated login credentials.
///
/// # Examples
/// ```
/// use covid_tracker::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "abc123").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Password,
}

impl LoginCredentials {
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            password: Password::new(password)?,
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Validated signup request claiming one country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    email: EmailAddress,
    password: Password,
    country_id: CountryId,
}

impl SignupRequest {
    pub fn try_from_parts(
        email: &str,
        password: &str,
        country_id: CountryId,
    ) -> Result<Self, AuthValidationError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            password: Password::new(password)?,
            country_id,
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn country_id(&self) -> &CountryId {
        &self.country_id
    }
}

/// Validated request replacing a password with a reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPasswordRequest {
    token: ResetToken,
    password: Password,
}

impl NewPasswordRequest {
    pub fn try_from_parts(token: &str, password: &str) -> Result<Self, AuthValidationError> {
        let token = ResetToken::parse(token).ok_or(AuthValidationError::MalformedResetToken)?;
        Ok(Self {
            token,
            password: Password::new(password)?,
        })
    }

    pub fn token(&self) -> &ResetToken {
        &self.token
    }

    pub fn password(&self) -> &Password {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abcd", AuthValidationError::PasswordTooShort)]
    #[case("   ab1   ", AuthValidationError::PasswordTooShort)]
    #[case("pass word", AuthValidationError::PasswordNotAlphanumeric)]
    #[case("pässwort1", AuthValidationError::PasswordNotAlphanumeric)]
    #[case("hunter2!", AuthValidationError::PasswordNotAlphanumeric)]
    fn password_rejects_invalid_shapes(#[case] raw: &str, #[case] expected: AuthValidationError) {
        assert_eq!(Password::new(raw).expect_err("invalid password"), expected);
    }

    #[rstest]
    fn password_rejects_overlong_input() {
        let raw = "a".repeat(PASSWORD_MAX + 1);
        assert_eq!(
            Password::new(&raw).expect_err("too long"),
            AuthValidationError::PasswordTooLong
        );
    }

    #[rstest]
    #[case("abc12", "abc12")]
    #[case("  Secret99  ", "Secret99")]
    fn password_is_trimmed(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Password::new(raw).expect("valid").expose(), expected);
    }

    #[rstest]
    fn password_debug_is_redacted() {
        let password = Password::new("abc123").expect("valid");
        assert_eq!(format!("{password:?}"), "Password(<redacted>)");
    }

    #[rstest]
    #[case("not-an-email", "abc12", "email", "Please enter a valid email")]
    #[case("ada@example.com", "ab", "password", PASSWORD_RULE)]
    fn login_reports_first_violation(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let err = LoginCredentials::try_from_parts(email, password).expect_err("invalid");
        assert_eq!(err.field(), field);
        assert_eq!(err.to_string(), message);
    }

    #[rstest]
    fn new_password_rejects_malformed_token() {
        let err = NewPasswordRequest::try_from_parts("zz", "abc123").expect_err("bad token");
        assert_eq!(err, AuthValidationError::MalformedResetToken);
        assert_eq!(err.code(), "invalid_or_expired_token");
    }
}
