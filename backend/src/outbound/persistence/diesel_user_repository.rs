//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;

use crate::domain::ports::{NewAccount, UserPersistenceError, UserRepository};
use crate::domain::{
    CountryId, EmailAddress, PasswordHash, ResetGrant, ResetTokenDigest, User, UserId,
};

use super::error_mapping::{user_diesel_error, user_pool_error};
use super::models::{NewUserRow, ResetGrantUpdate, UserRow};
use super::pool::DbPool;
use super::schema::{countries, users};

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside the signup transaction.
#[derive(Debug)]
enum RegisterError {
    Diesel(DieselError),
    CountryUnavailable,
}

impl From<DieselError> for RegisterError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let UserRow {
        id,
        email,
        password_hash,
        country_id,
        reset_token_digest,
        reset_token_expires_at,
    } = row;
    let email = EmailAddress::new(&email)
        .map_err(|err| UserPersistenceError::query(format!("stored email invalid: {err}")))?;
    let user = User::new(
        UserId::from_uuid(id),
        email,
        PasswordHash::new(password_hash),
        CountryId::from_uuid(country_id),
    );
    Ok(match (reset_token_digest, reset_token_expires_at) {
        (Some(digest), Some(expires_at)) => user.with_reset_grant(ResetGrant::new(
            ResetTokenDigest::from_stored(digest),
            expires_at,
        )),
        _ => user,
    })
}

fn expect_single_row(affected: usize, id: &UserId) -> Result<(), UserPersistenceError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(UserPersistenceError::query(format!(
            "user {id} does not exist"
        )))
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(user_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(user_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_reset_digest(
        &self,
        digest: &ResetTokenDigest,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = users::table
            .filter(users::reset_token_digest.eq(digest.as_str()))
            .filter(users::reset_token_expires_at.gt(now))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(user_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn register(&self, account: &NewAccount) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = NewUserRow {
            id: *account.id.as_uuid(),
            email: account.email.as_ref(),
            password_hash: account.password_hash.as_str(),
            country_id: *account.country_id.as_uuid(),
        };
        let user_id = *account.id.as_uuid();
        let country_id = *account.country_id.as_uuid();

        // The user row goes first so a duplicate email aborts before the claim.
        let outcome = conn
            .transaction::<_, RegisterError, _>(|conn| {
                async move {
                    diesel::insert_into(users::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    let claimed = diesel::update(
                        countries::table
                            .filter(countries::id.eq(country_id))
                            .filter(countries::admin_user_id.is_null()),
                    )
                    .set(countries::admin_user_id.eq(Some(user_id)))
                    .execute(conn)
                    .await?;
                    if claimed == 0 {
                        return Err(RegisterError::CountryUnavailable);
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Ok(()) => Ok(User::new(
                account.id,
                account.email.clone(),
                account.password_hash.clone(),
                account.country_id,
            )),
            Err(RegisterError::CountryUnavailable) => Err(
                UserPersistenceError::country_unavailable(account.country_id.to_string()),
            ),
            Err(RegisterError::Diesel(error)) => Err(match user_diesel_error(error) {
                UserPersistenceError::EmailTaken { .. } => {
                    UserPersistenceError::email_taken(account.email.as_ref())
                }
                UserPersistenceError::CountryUnavailable { .. } => {
                    UserPersistenceError::country_unavailable(account.country_id.to_string())
                }
                other => other,
            }),
        }
    }

    async fn store_reset_grant(
        &self,
        id: &UserId,
        grant: &ResetGrant,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let update = ResetGrantUpdate {
            reset_token_digest: Some(grant.digest().as_str()),
            reset_token_expires_at: Some(grant.expires_at()),
        };
        let affected = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(user_diesel_error)?;
        expect_single_row(affected, id)
    }

    async fn redeem_reset_grant(
        &self,
        id: &UserId,
        digest: &ResetTokenDigest,
        now: DateTime<Utc>,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let cleared = ResetGrantUpdate {
            reset_token_digest: None,
            reset_token_expires_at: None,
        };
        // The grant predicate makes a concurrent second redemption match no row.
        let affected = diesel::update(
            users::table
                .filter(users::id.eq(id.as_uuid()))
                .filter(users::reset_token_digest.eq(digest.as_str()))
                .filter(users::reset_token_expires_at.gt(now)),
        )
        .set((users::password_hash.eq(password_hash.as_str()), &cleared))
        .execute(&mut conn)
        .await
        .map_err(user_diesel_error)?;
        Ok(affected == 1)
    }
}
