//! Channel statistics handlers for the signed-in country administrator.
//!
//! ```text
//! GET  /new-cases   channel page model
//! POST /cases       {"amount": 12}
//! ```
//!
//! The same pair exists for `deaths`, `recoveries` and `tests`.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Channel, ChannelOverview, Error, RecordAmount};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::AuthenticatedUser;
use crate::inbound::http::pages::PageContext;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_amount_error};

/// Channel page model.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPage {
    pub csrf_token: String,
    pub error_message: Option<String>,
    pub statistics: ChannelOverview,
}

/// New statistic submission.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordForm {
    /// Whole number, at least 1.
    pub amount: i64,
}

fn parse_channel(raw: &str) -> ApiResult<Channel> {
    raw.parse()
        .map_err(|_| Error::not_found(format!("unknown channel: {raw}")))
}

fn channel_page(session: &SessionContext, statistics: ChannelOverview) -> ApiResult<ChannelPage> {
    let context = PageContext::from_session(session)?;
    Ok(ChannelPage {
        csrf_token: context.csrf_token,
        error_message: context.error_message,
        statistics,
    })
}

#[utoipa::path(
    get,
    path = "/new-{channel}",
    params(("channel" = Channel, Path, description = "Statistic channel")),
    responses(
        (status = 200, description = "Channel page model", body = ChannelPage),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Country missing", body = Error)
    ),
    tags = ["statistics"],
    operation_id = "channelPage"
)]
#[get("/new-{channel:(cases|deaths|recoveries|tests)}")]
pub async fn channel_page_handler(
    state: web::Data<HttpState>,
    session: SessionContext,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<ChannelPage>> {
    let channel = parse_channel(&path.into_inner())?;
    let statistics = state
        .statistics_query
        .channel_overview(user.country_id(), channel)
        .await?;
    Ok(web::Json(channel_page(&session, statistics)?))
}

/// Append one record to the administrator's country.
#[utoipa::path(
    post,
    path = "/{channel}",
    params(("channel" = Channel, Path, description = "Statistic channel")),
    request_body = RecordForm,
    responses(
        (status = 200, description = "Updated channel page model", body = ChannelPage),
        (status = 400, description = "Amount is not a whole number of at least 1", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Missing or wrong CSRF token", body = Error),
        (status = 404, description = "Country missing", body = Error)
    ),
    tags = ["statistics"],
    operation_id = "recordStatistic"
)]
#[post("/{channel:(cases|deaths|recoveries|tests)}")]
pub async fn record_statistic(
    state: web::Data<HttpState>,
    session: SessionContext,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<RecordForm>,
) -> ApiResult<web::Json<ChannelPage>> {
    let channel = parse_channel(&path.into_inner())?;
    let amount = RecordAmount::new(payload.amount)
        .map_err(|err| invalid_amount_error(FieldName::new("amount"), err))?;
    let statistics = state
        .statistics_command
        .record(user.country_id(), channel, amount)
        .await?;
    Ok(web::Json(channel_page(&session, statistics)?))
}
