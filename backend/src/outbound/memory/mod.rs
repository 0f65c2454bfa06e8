//! In-process store implementing the user and country repositories.
//!
//! Used when no database URL is configured and by integration tests. Every
//! operation runs under one mutex, so signup claims and statistic appends are
//! atomic with respect to each other.

mod catalogue;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CountryPersistenceError, CountryRepository, NewAccount, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Country, CountryId, CountrySummary, EmailAddress, NewStatisticRecord, PasswordHash,
    ResetGrant, ResetTokenDigest, User, UserId,
};

pub use catalogue::SEED_COUNTRIES;

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    countries: HashMap<CountryId, Country>,
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Empty store without countries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the country catalogue.
    pub fn seeded() -> Self {
        let store = Self::new();
        for (name, population) in SEED_COUNTRIES {
            store.insert_country(Country::new(CountryId::random(), *name, *population));
        }
        store
    }

    /// Insert or replace a country.
    pub fn insert_country(&self, country: Country) {
        if let Ok(mut state) = self.state.lock() {
            state.countries.insert(*country.id(), country);
        }
    }

    /// Find a country id by its display name.
    pub fn country_id_by_name(&self, name: &str) -> Option<CountryId> {
        let state = self.state.lock().ok()?;
        state
            .countries
            .values()
            .find(|country| country.name() == name)
            .map(|country| *country.id())
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.state.lock().map(|state| state.users.len()).unwrap_or(0)
    }

    fn lock_users(&self) -> Result<MutexGuard<'_, State>, UserPersistenceError> {
        self.state
            .lock()
            .map_err(|_| UserPersistenceError::query("in-memory store lock poisoned"))
    }

    fn lock_countries(&self) -> Result<MutexGuard<'_, State>, CountryPersistenceError> {
        self.state
            .lock()
            .map_err(|_| CountryPersistenceError::query("in-memory store lock poisoned"))
    }
}

fn missing_user(id: &UserId) -> UserPersistenceError {
    UserPersistenceError::query(format!("user {id} does not exist"))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock_users()?.users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock_users()?
            .users
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn find_by_reset_digest(
        &self,
        digest: &ResetTokenDigest,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock_users()?
            .users
            .values()
            .find(|user| {
                user.reset_grant()
                    .is_some_and(|grant| grant.accepts(digest, now))
            })
            .cloned())
    }

    async fn register(&self, account: &NewAccount) -> Result<User, UserPersistenceError> {
        let mut state = self.lock_users()?;
        if state.users.values().any(|user| user.email() == &account.email) {
            return Err(UserPersistenceError::email_taken(account.email.as_ref()));
        }
        let claimable = state
            .countries
            .get(&account.country_id)
            .is_some_and(|country| country.admin().is_none());
        if !claimable {
            return Err(UserPersistenceError::country_unavailable(
                account.country_id.to_string(),
            ));
        }

        let user = User::new(
            account.id,
            account.email.clone(),
            account.password_hash.clone(),
            account.country_id,
        );
        if let Some(country) = state.countries.remove(&account.country_id) {
            state
                .countries
                .insert(account.country_id, country.with_admin(account.id));
        }
        state.users.insert(account.id, user.clone());
        Ok(user)
    }

    async fn store_reset_grant(
        &self,
        id: &UserId,
        grant: &ResetGrant,
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.lock_users()?;
        let user = state.users.get_mut(id).ok_or_else(|| missing_user(id))?;
        user.set_reset_grant(grant.clone());
        Ok(())
    }

    async fn redeem_reset_grant(
        &self,
        id: &UserId,
        digest: &ResetTokenDigest,
        now: DateTime<Utc>,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.lock_users()?;
        let user = state.users.get_mut(id).ok_or_else(|| missing_user(id))?;
        let redeemable = user
            .reset_grant()
            .is_some_and(|grant| grant.accepts(digest, now));
        if redeemable {
            user.set_password(password_hash.clone());
        }
        Ok(redeemable)
    }
}

#[async_trait]
impl CountryRepository for InMemoryStore {
    async fn find_by_id(&self, id: &CountryId) -> Result<Option<Country>, CountryPersistenceError> {
        Ok(self.lock_countries()?.countries.get(id).cloned())
    }

    async fn list_unclaimed(&self) -> Result<Vec<CountrySummary>, CountryPersistenceError> {
        let state = self.lock_countries()?;
        let mut summaries: Vec<CountrySummary> = state
            .countries
            .values()
            .filter(|country| country.admin().is_none())
            .map(Country::summary)
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn append_record(
        &self,
        id: &CountryId,
        record: &NewStatisticRecord,
    ) -> Result<Country, CountryPersistenceError> {
        let mut state = self.lock_countries()?;
        let country = state
            .countries
            .get_mut(id)
            .ok_or_else(|| CountryPersistenceError::not_found(id.to_string()))?;
        country
            .append(record)
            .map_err(|_| CountryPersistenceError::population_overflow(id.to_string()))?;
        Ok(country.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, RecordAmount, ResetToken};
    use chrono::Duration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_country(Country::new(CountryId::random(), "Peru", 33_000_000));
        store.insert_country(Country::new(CountryId::random(), "Fiji", 900_000));
        store
    }

    fn account(store: &InMemoryStore, email: &str, country: &str) -> NewAccount {
        NewAccount {
            id: UserId::random(),
            email: EmailAddress::new(email).expect("valid email"),
            password_hash: PasswordHash::new("hash"),
            country_id: store.country_id_by_name(country).expect("seeded country"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn register_claims_country(store: InMemoryStore) {
        let new_account = account(&store, "a@example.com", "Peru");
        store.register(&new_account).await.expect("registered");

        let country = CountryRepository::find_by_id(&store, &new_account.country_id)
            .await
            .expect("lookup")
            .expect("country");
        assert!(country.is_administered_by(&new_account.id));
        let unclaimed = store.list_unclaimed().await.expect("list");
        assert_eq!(unclaimed.len(), 1);
        assert_eq!(unclaimed[0].name, "Fiji");
    }

    #[rstest]
    #[tokio::test]
    async fn register_rejects_duplicate_email_without_claiming(store: InMemoryStore) {
        store
            .register(&account(&store, "a@example.com", "Peru"))
            .await
            .expect("first");
        let err = store
            .register(&account(&store, "a@example.com", "Fiji"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, UserPersistenceError::EmailTaken { .. }));
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.list_unclaimed().await.expect("list").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn register_rejects_claimed_country(store: InMemoryStore) {
        store
            .register(&account(&store, "a@example.com", "Peru"))
            .await
            .expect("first");
        let err = store
            .register(&account(&store, "b@example.com", "Peru"))
            .await
            .expect_err("claimed");
        assert!(matches!(err, UserPersistenceError::CountryUnavailable { .. }));
        assert_eq!(store.user_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn reset_grant_lookup_respects_expiry(store: InMemoryStore) {
        let new_account = account(&store, "a@example.com", "Peru");
        store.register(&new_account).await.expect("registered");
        let token = ResetToken::generate();
        let issued = Utc::now();
        store
            .store_reset_grant(&new_account.id, &ResetGrant::issue(&token, issued))
            .await
            .expect("stored");

        let found = store
            .find_by_reset_digest(&token.digest(), issued + Duration::minutes(59))
            .await
            .expect("lookup");
        assert!(found.is_some());
        let expired = store
            .find_by_reset_digest(&token.digest(), issued + Duration::minutes(61))
            .await
            .expect("lookup");
        assert!(expired.is_none());

        let redeemed = store
            .redeem_reset_grant(
                &new_account.id,
                &token.digest(),
                issued,
                &PasswordHash::new("new"),
            )
            .await
            .expect("redeemed");
        assert!(redeemed);
        let replayed = store
            .find_by_reset_digest(&token.digest(), issued)
            .await
            .expect("lookup");
        assert!(replayed.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn overflowing_append_writes_nothing(store: InMemoryStore) {
        let id = CountryId::random();
        store.insert_country(Country::new(id, "Nauru", i64::MIN + 1));
        let record = NewStatisticRecord {
            channel: Channel::Deaths,
            amount: RecordAmount::new(2).expect("positive"),
            day: Utc::now(),
        };

        let err = store.append_record(&id, &record).await.expect_err("overflow");
        assert!(matches!(
            err,
            CountryPersistenceError::PopulationOverflow { .. }
        ));
        let country = CountryRepository::find_by_id(&store, &id)
            .await
            .expect("lookup")
            .expect("country");
        assert_eq!(country.population(), i64::MIN + 1);
        assert!(country.series(Channel::Deaths).is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_appends_keep_every_record(store: InMemoryStore) {
        let id = store.country_id_by_name("Fiji").expect("seeded");
        let tasks = (0..50).map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let record = NewStatisticRecord {
                    channel: Channel::Deaths,
                    amount: RecordAmount::new(2).expect("positive"),
                    day: Utc::now(),
                };
                store.append_record(&id, &record).await
            })
        });
        for task in futures::future::join_all(tasks).await {
            task.expect("join").expect("append");
        }

        let country = CountryRepository::find_by_id(&store, &id)
            .await
            .expect("lookup")
            .expect("country");
        assert_eq!(country.series(Channel::Deaths).len(), 50);
        assert_eq!(country.population(), 900_000 - 100);
    }
}
