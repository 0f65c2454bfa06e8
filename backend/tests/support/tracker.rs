//! In-process tracker harness shared by the HTTP integration suites.
//!
//! Services run over the in-memory store with a controllable clock, a mailer
//! that records every message and a report archive in a temporary directory.

use std::sync::{Arc, Mutex};

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;
use tempfile::TempDir;
use url::Url;

use covid_tracker::domain::ports::{Mailer, MailerError, OutboundEmail};
use covid_tracker::domain::{AccountService, AccountServiceConfig, CountryId, CountryService};
use covid_tracker::inbound::http::state::HttpState;
use covid_tracker::middleware::CSRF_HEADER;
use covid_tracker::outbound::report::{FileReportArchive, PdfReportRenderer};
use covid_tracker::outbound::{Argon2PasswordHasher, InMemoryStore};

/// Clock that only moves when told to.
pub struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Mailer that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer lock").clone()
    }

    /// Path of the most recent reset link mailed to `to`.
    pub fn reset_path_for(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .filter(|email| email.to.as_ref() == to)
            .find_map(|email| {
                let start = email.html_body.find("/reset-password/")?;
                let rest = &email.html_body[start..];
                let end = rest.find('"')?;
                Some(rest[..end].to_owned())
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        self.sent.lock().expect("mailer lock").push(email.clone());
        Ok(())
    }
}

/// Services and adapters behind one test application.
pub struct Tracker {
    pub store: Arc<InMemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<SteppingClock>,
    pub reports_dir: TempDir,
    pub state: HttpState,
    pub key: Key,
}

impl Tracker {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        let start = Utc
            .with_ymd_and_hms(2021, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start time");
        let clock = Arc::new(SteppingClock::starting_at(start));
        let reports_dir = tempfile::tempdir().expect("reports dir");
        let archive = FileReportArchive::open(reports_dir.path()).expect("open archive");
        let base_url = Url::parse("http://localhost:8080").expect("base url");

        let accounts = Arc::new(AccountService::new(
            store.clone(),
            store.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            mailer.clone(),
            clock.clone(),
            AccountServiceConfig::new(base_url),
        ));
        let statistics = Arc::new(CountryService::new(
            store.clone(),
            Arc::new(PdfReportRenderer::new()),
            Arc::new(archive),
            clock.clone(),
        ));
        let state = HttpState {
            login: accounts.clone(),
            signup: accounts.clone(),
            password_reset: accounts,
            statistics_query: statistics.clone(),
            statistics_command: statistics.clone(),
            reports: statistics,
        };

        Self {
            store,
            mailer,
            clock,
            reports_dir,
            state,
            key: Key::generate(),
        }
    }

    pub fn country(&self, name: &str) -> CountryId {
        self.store
            .country_id_by_name(name)
            .expect("seeded country")
    }

    pub fn session_middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build()
    }
}

/// Build the initialised tracker service for a [`Tracker`].
macro_rules! tracker_app {
    ($tracker:expr) => {{
        let tracker = &$tracker;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(tracker.state.clone()))
                .wrap(covid_tracker::middleware::security_headers())
                .wrap(actix_web::middleware::Compress::default())
                .wrap(covid_tracker::Trace)
                .service(
                    actix_web::web::scope("")
                        .wrap(covid_tracker::middleware::CsrfProtection)
                        .wrap(tracker.session_middleware())
                        .configure(covid_tracker::inbound::http::configure),
                ),
        )
        .await
    }};
}

/// Cookie jar holding the session cookie between requests.
#[derive(Default)]
pub struct Browser {
    session: Option<Cookie<'static>>,
}

impl Browser {
    pub fn session_cookie(&self) -> Option<Cookie<'static>> {
        self.session.clone()
    }

    pub async fn send<S, B>(&mut self, app: &S, request: TestRequest) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let request = match &self.session {
            Some(cookie) => request.cookie(cookie.clone()),
            None => request,
        };
        let response = test::call_service(app, request.to_request()).await;
        if let Some(cookie) = response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
        {
            self.session = Some(cookie.into_owned());
        }
        response
    }

    /// GET `path` and decode the JSON page model, asserting success.
    pub async fn page<S, B>(&mut self, app: &S, path: &str) -> Value
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let response = self.send(app, TestRequest::get().uri(path)).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        test::read_body_json(response).await
    }

    /// Fresh CSRF token taken from the login page.
    pub async fn csrf_token<S, B>(&mut self, app: &S) -> String
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let page = self.page(app, "/login").await;
        page["csrfToken"]
            .as_str()
            .expect("csrf token")
            .to_owned()
    }

    /// POST JSON with a valid CSRF token.
    pub async fn post<S, B>(&mut self, app: &S, path: &str, body: Value) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let token = self.csrf_token(app).await;
        let request = TestRequest::post()
            .uri(path)
            .insert_header((CSRF_HEADER, token))
            .set_json(body);
        self.send(app, request).await
    }

    pub async fn sign_up<S, B>(&mut self, app: &S, email: &str, password: &str, country: CountryId)
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let response = self
            .post(
                app,
                "/signup",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "country": country.to_string(),
                }),
            )
            .await;
        assert_see_other(&response, "/login");
    }

    pub async fn log_in<S, B>(&mut self, app: &S, email: &str, password: &str) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.post(
            app,
            "/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }
}

pub fn assert_see_other<B>(response: &ServiceResponse<B>, location: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some(location)
    );
}
