//! Builders wiring domain services to their outbound adapters.

use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
use url::Url;

use covid_tracker::domain::ports::{
    CountryRepository, Mailer, PasswordHasher, ReportArchive, ReportRenderer, UserRepository,
};
use covid_tracker::domain::{AccountService, AccountServiceConfig, CountryService};
use covid_tracker::inbound::http::state::HttpState;
use covid_tracker::outbound::mail::{LogMailer, SENDGRID_ENDPOINT, SendGridMailer};
use covid_tracker::outbound::persistence::{
    DbPool, DieselCountryRepository, DieselUserRepository, PoolConfig,
};
use covid_tracker::outbound::report::{FileReportArchive, PdfReportRenderer};
use covid_tracker::outbound::{Argon2PasswordHasher, InMemoryStore};

use super::ServerConfig;

const MAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Adapters shared by both services regardless of the storage backend.
struct SharedAdapters {
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    renderer: Arc<dyn ReportRenderer>,
    archive: Arc<dyn ReportArchive>,
    clock: Arc<dyn Clock>,
    account_config: AccountServiceConfig,
}

fn build_mailer(config: &ServerConfig) -> std::io::Result<Arc<dyn Mailer>> {
    let Some(api_key) = config.sendgrid_api_key.as_deref() else {
        warn!("no SendGrid API key configured; outbound mail is only logged");
        return Ok(Arc::new(LogMailer));
    };
    let endpoint = Url::parse(SENDGRID_ENDPOINT)
        .map_err(|e| std::io::Error::other(format!("invalid mail endpoint: {e}")))?;
    let mailer = SendGridMailer::new(endpoint, api_key, config.mail_from.clone(), MAIL_TIMEOUT)
        .map_err(|e| std::io::Error::other(format!("mail client setup failed: {e}")))?;
    Ok(Arc::new(mailer))
}

fn build_shared_adapters(config: &ServerConfig) -> std::io::Result<SharedAdapters> {
    let archive = FileReportArchive::open(&config.reports_dir).map_err(|e| {
        std::io::Error::other(format!(
            "failed to open reports directory {}: {e}",
            config.reports_dir.display()
        ))
    })?;
    Ok(SharedAdapters {
        hasher: Arc::new(Argon2PasswordHasher::new()),
        mailer: build_mailer(config)?,
        renderer: Arc::new(PdfReportRenderer::new()),
        archive: Arc::new(archive),
        clock: Arc::new(DefaultClock),
        account_config: AccountServiceConfig::new(config.public_base_url.clone()),
    })
}

/// Assemble the HTTP port bundle over one pair of repositories.
fn build_services<U, C>(users: Arc<U>, countries: Arc<C>, adapters: SharedAdapters) -> HttpState
where
    U: UserRepository + 'static,
    C: CountryRepository + 'static,
{
    let SharedAdapters {
        hasher,
        mailer,
        renderer,
        archive,
        clock,
        account_config,
    } = adapters;
    let accounts = Arc::new(AccountService::new(
        users,
        countries.clone(),
        hasher,
        mailer,
        clock.clone(),
        account_config,
    ));
    let statistics = Arc::new(CountryService::new(countries, renderer, archive, clock));
    HttpState {
        login: accounts.clone(),
        signup: accounts.clone(),
        password_reset: accounts,
        statistics_query: statistics.clone(),
        statistics_command: statistics.clone(),
        reports: statistics,
    }
}

/// Build the HTTP state, backed by PostgreSQL when a database URL is set and
/// by the seeded in-memory store otherwise.
pub(super) async fn build_http_state(config: &ServerConfig) -> std::io::Result<HttpState> {
    let adapters = build_shared_adapters(config)?;
    match config.database_url() {
        Some(url) => {
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            info!("using PostgreSQL repositories");
            Ok(build_services(
                Arc::new(DieselUserRepository::new(pool.clone())),
                Arc::new(DieselCountryRepository::new(pool)),
                adapters,
            ))
        }
        None => {
            warn!("no database configured; using the in-memory store");
            let store = Arc::new(InMemoryStore::seeded());
            Ok(build_services(store.clone(), store, adapters))
        }
    }
}
