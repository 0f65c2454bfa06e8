//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Countries available for administration.
    countries (id) {
        id -> Uuid,
        name -> Varchar,
        /// Lowered by every recorded death; may go negative.
        population -> Int8,
        /// Administering user, unique when present.
        admin_user_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Registered users, one per administered country.
    users (id) {
        id -> Uuid,
        /// Normalised (trimmed, lower-case) email; unique.
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        country_id -> Uuid,
        /// Hex SHA-256 digest of the outstanding reset token.
        reset_token_digest -> Nullable<Varchar>,
        reset_token_expires_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only statistic records.
    country_statistics (id) {
        id -> Int8,
        country_id -> Uuid,
        /// One of `cases`, `deaths`, `recoveries`, `tests`.
        channel -> Varchar,
        amount -> Int8,
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(country_statistics -> countries (country_id));
diesel::joinable!(users -> countries (country_id));

diesel::allow_tables_to_appear_in_same_query!(countries, country_statistics, users);
