//! Application settings loaded through OrthoConfig, and the resolved server
//! configuration built from them.
//!
//! Every setting can come from a config file, `COVID_TRACKER_*` environment
//! variables or CLI flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use covid_tracker::domain::EmailAddress;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REPORTS_DIR: &str = "data/invoices";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_MAIL_FROM: &str = "noreply@covid-tracker.local";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Minimum session key length; the key signs and encrypts cookies.
pub const SESSION_KEY_MIN_BYTES: usize = 64;

/// Raw settings as supplied by the operator.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "COVID_TRACKER")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Permit the in-memory store in release builds.
    #[ortho_config(default = false)]
    pub allow_in_memory: bool,
    /// Directory receiving rendered reports.
    pub reports_dir: Option<PathBuf>,
    /// Base URL used in emailed reset links.
    pub public_base_url: Option<String>,
    /// Sender address for outbound mail.
    pub mail_from: Option<String>,
    /// SendGrid API key; mail is only logged when absent.
    pub sendgrid_api_key: Option<String>,
    /// File holding the session key.
    pub session_key_file: Option<PathBuf>,
    /// Mark the session cookie `Secure` (defaults to true).
    pub session_cookie_secure: Option<bool>,
    /// Fall back to a throwaway session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_session_key: bool,
}

/// Reasons the settings cannot produce a runnable server.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid public base url {value}: {message}")]
    PublicBaseUrl { value: String, message: String },
    #[error("invalid mail sender {value}")]
    MailFrom { value: String },
    #[error("session key at {path} is {len} bytes; at least 64 are required")]
    SessionKeyTooShort { path: String, len: usize },
    #[error("failed to read session key at {path}: {message}")]
    SessionKeyUnreadable { path: String, message: String },
    #[error("database_url is required unless allow_in_memory is set")]
    DatabaseRequired,
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| ConfigError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR))
    }

    pub fn public_base_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL);
        Url::parse(raw).map_err(|err| ConfigError::PublicBaseUrl {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn mail_from(&self) -> Result<EmailAddress, ConfigError> {
        let raw = self.mail_from.as_deref().unwrap_or(DEFAULT_MAIL_FROM);
        EmailAddress::new(raw).map_err(|_| ConfigError::MailFrom {
            value: raw.to_owned(),
        })
    }

    pub fn cookie_secure(&self) -> bool {
        self.session_cookie_secure.unwrap_or(true)
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Database URL to use, or `None` for the in-memory store.
    pub fn database_url(&self) -> Result<Option<&str>, ConfigError> {
        match self.database_url.as_deref() {
            Some(url) => Ok(Some(url)),
            None if cfg!(debug_assertions) || self.allow_in_memory => Ok(None),
            None => Err(ConfigError::DatabaseRequired),
        }
    }

    /// Load the session key, falling back to a generated key only when
    /// permitted.
    pub fn session_key(&self) -> Result<Key, ConfigError> {
        let path = self.session_key_file();
        match std::fs::read(&path) {
            Ok(bytes) => session_key_from_bytes(&path.display().to_string(), &bytes),
            Err(err) if cfg!(debug_assertions) || self.allow_ephemeral_session_key => {
                warn!(path = %path.display(), error = %err, "using temporary session key");
                Ok(Key::generate())
            }
            Err(err) => Err(ConfigError::SessionKeyUnreadable {
                path: path.display().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

fn session_key_from_bytes(path: &str, bytes: &[u8]) -> Result<Key, ConfigError> {
    let too_short = || ConfigError::SessionKeyTooShort {
        path: path.to_owned(),
        len: bytes.len(),
    };
    if bytes.len() < SESSION_KEY_MIN_BYTES {
        return Err(too_short());
    }
    Key::try_from(bytes).map_err(|_| too_short())
}

/// Resolved configuration consumed by [`super::create_server`].
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) database_url: Option<String>,
    pub(crate) reports_dir: PathBuf,
    pub(crate) public_base_url: Url,
    pub(crate) mail_from: EmailAddress,
    pub(crate) sendgrid_api_key: Option<String>,
}

impl ServerConfig {
    /// Validate settings into a server configuration.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            key: settings.session_key()?,
            cookie_secure: settings.cookie_secure(),
            same_site: SameSite::Lax,
            bind_addr: settings.bind_addr()?,
            database_url: settings.database_url()?.map(str::to_owned),
            reports_dir: settings.reports_dir(),
            public_base_url: settings.public_base_url()?,
            mail_from: settings.mail_from()?,
            sendgrid_api_key: settings.sendgrid_api_key.clone(),
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
}
