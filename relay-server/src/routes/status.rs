//! Challenge status endpoint
//!
//! GET /status/{challenge_id}
//! Read-only lookup for polling clients; never mutates challenge state.

use crate::AppState;
use actix_web::{get, web, HttpResponse, Responder};
use relay_common::types::{ApiData, StatusData};
use relay_common::{RelayError, Result};
use verusid_login::ChallengeId;

#[get("/status/{challenge_id}")]
pub async fn status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder> {
    // An unparseable id cannot name a stored challenge
    let id: ChallengeId = path.parse().map_err(|_| RelayError::NotFound)?;

    let record = state.store.get(&id).await.ok_or(RelayError::NotFound)?;

    Ok(HttpResponse::Ok().json(ApiData::new(StatusData {
        status: record.status,
        created_at: record.created_at,
        signing_id: record.signing_id,
    })))
}
