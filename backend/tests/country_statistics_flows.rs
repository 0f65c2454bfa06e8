//! End-to-end statistics and report flows for a signed-in administrator.

#[allow(dead_code)]
#[macro_use]
#[path = "support/tracker.rs"]
mod support;

use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use futures::future::join_all;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use covid_tracker::domain::Channel;
use covid_tracker::domain::ports::CountryRepository;
use covid_tracker::middleware::CSRF_HEADER;
use support::{Browser, Tracker};

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "secret1";

#[fixture]
fn tracker() -> Tracker {
    Tracker::new()
}

/// Sign up as administrator of `country` and log in.
async fn administrator<S, B>(app: &S, tracker: &Tracker, country: &str) -> Browser
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
{
    let mut browser = Browser::default();
    browser
        .sign_up(app, EMAIL, PASSWORD, tracker.country(country))
        .await;
    let response = browser.log_in(app, EMAIL, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    browser
}

#[rstest]
#[case("/new-cases")]
#[case("/new-tests")]
#[actix_web::test]
async fn channel_pages_require_login(tracker: Tracker, #[case] path: &str) {
    let app = tracker_app!(tracker);
    let mut browser = Browser::default();

    let response = browser.send(&app, TestRequest::get().uri(path)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn recording_updates_the_channel_page(tracker: Tracker) {
    let app = tracker_app!(tracker);
    let mut browser = administrator(&app, &tracker, "Denmark").await;

    for amount in [100, 50] {
        let response = browser.post(&app, "/cases", json!({ "amount": amount })).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = browser.post(&app, "/deaths", json!({ "amount": 2 })).await;
    let page: Value = test::read_body_json(response).await;

    assert_eq!(page["statistics"]["channel"], "deaths");
    assert_eq!(page["statistics"]["total"], 2);
    assert_eq!(page["statistics"]["population"], 5_792_200);
    assert_eq!(page["statistics"]["activeCases"], 148);

    let cases = browser.page(&app, "/new-cases").await;
    assert_eq!(cases["statistics"]["total"], 150);
    assert_eq!(cases["statistics"]["movingAverage"], 75);
    assert_eq!(cases["statistics"]["perMillion"], 5_792_200 / 150);
    assert_eq!(cases["statistics"]["records"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[actix_web::test]
async fn empty_channel_has_no_per_million_figure(tracker: Tracker) {
    let app = tracker_app!(tracker);
    let mut browser = administrator(&app, &tracker, "Denmark").await;

    let page = browser.page(&app, "/new-recoveries").await;

    assert_eq!(page["statistics"]["total"], 0);
    assert_eq!(page["statistics"]["perMillion"], Value::Null);
    assert_eq!(page["statistics"]["latest"], Value::Null);
}

#[rstest]
#[case(json!({ "amount": 0 }))]
#[case(json!({ "amount": -4 }))]
#[actix_web::test]
async fn non_positive_amounts_are_rejected(tracker: Tracker, #[case] body: Value) {
    let app = tracker_app!(tracker);
    let mut browser = administrator(&app, &tracker, "Denmark").await;

    let response = browser.post(&app, "/tests", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let country = tracker
        .store
        .find_by_id(&tracker.country("Denmark"))
        .await
        .expect("lookup")
        .expect("country");
    assert!(country.series(Channel::Tests).is_empty());
}

#[rstest]
#[actix_web::test]
async fn concurrent_submissions_are_all_kept(tracker: Tracker) {
    let app = tracker_app!(tracker);
    let mut browser = administrator(&app, &tracker, "Finland").await;
    let token = browser.csrf_token(&app).await;
    let cookie = browser.session_cookie().expect("signed-in session");

    let requests = (1..=20).map(|amount| {
        TestRequest::post()
            .uri("/deaths")
            .cookie(cookie.clone())
            .insert_header((CSRF_HEADER, token.clone()))
            .set_json(json!({ "amount": amount }))
            .to_request()
    });
    let responses = join_all(requests.map(|request| test::call_service(&app, request))).await;

    assert!(responses.iter().all(|r| r.status() == StatusCode::OK));
    let country = tracker
        .store
        .find_by_id(&tracker.country("Finland"))
        .await
        .expect("lookup")
        .expect("country");
    assert_eq!(country.series(Channel::Deaths).len(), 20);
    assert_eq!(country.population(), 5_540_720 - 210);
}

#[rstest]
#[actix_web::test]
async fn report_downloads_and_is_archived(tracker: Tracker) {
    let app = tracker_app!(tracker);
    let mut browser = administrator(&app, &tracker, "Denmark").await;
    browser.post(&app, "/cases", json!({ "amount": 12 })).await;
    let country = tracker.country("Denmark");

    let response = browser
        .send(&app, TestRequest::get().uri(&format!("/cases/{country}")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/pdf")
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("content disposition");
    assert!(disposition.starts_with("attachment"));
    let body = test::read_body(response).await;
    assert!(body.starts_with(b"%PDF-"));
    let archived = tracker
        .reports_dir
        .path()
        .join(format!("invoice-{country}.pdf"));
    assert_eq!(std::fs::read(archived).expect("archived report"), body.to_vec());
}

#[rstest]
#[actix_web::test]
async fn report_requires_recorded_cases(tracker: Tracker) {
    let app = tracker_app!(tracker);
    let mut browser = administrator(&app, &tracker, "Denmark").await;
    let country = tracker.country("Denmark");

    let response = browser
        .send(&app, TestRequest::get().uri(&format!("/cases/{country}")))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn report_of_another_country_is_forbidden(tracker: Tracker) {
    let app = tracker_app!(tracker);
    let mut browser = administrator(&app, &tracker, "Denmark").await;
    let other = tracker.country("Chile");

    let response = browser
        .send(&app, TestRequest::get().uri(&format!("/cases/{other}")))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
