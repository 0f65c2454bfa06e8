//! Country report download.
//!
//! ```text
//! GET /cases/{countryId}   application/pdf
//! ```

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, web};

use crate::domain::{CountryId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Render, archive and download the report of the caller's country.
#[utoipa::path(
    get,
    path = "/cases/{countryId}",
    params(("countryId" = String, Path, description = "Country identifier")),
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Malformed id or no cases recorded yet", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Country is administered by someone else", body = Error),
        (status = 404, description = "Country missing", body = Error)
    ),
    tags = ["reports"],
    operation_id = "downloadReport"
)]
#[get("/cases/{country_id}")]
pub async fn download_report(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let country_id = CountryId::from_uuid(parse_uuid(&path, FieldName::new("countryId"))?);
    let report = state.reports.generate(user.id(), &country_id).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(report.file_name)],
            },
        ))
        .body(report.bytes))
}
