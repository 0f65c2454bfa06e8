//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{countries, country_statistics, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub country_id: Uuid,
    pub reset_token_digest: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub country_id: Uuid,
}

/// Changeset writing or clearing the reset grant columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ResetGrantUpdate<'a> {
    pub reset_token_digest: Option<&'a str>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
}

/// Row struct for reading from the countries table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = countries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CountryRow {
    pub id: Uuid,
    pub name: String,
    pub population: i64,
    pub admin_user_id: Option<Uuid>,
}

/// Row struct for reading statistic records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = country_statistics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StatisticRow {
    pub channel: String,
    pub amount: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Insertable struct for appending a statistic record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = country_statistics)]
pub(crate) struct NewStatisticRow<'a> {
    pub country_id: Uuid,
    pub channel: &'a str,
    pub amount: i64,
    pub recorded_at: DateTime<Utc>,
}
