//! Login challenge endpoint
//!
//! POST /login
//! Issues a fresh challenge and returns its deeplink/QR rendering.

use crate::AppState;
use actix_web::{post, web, HttpResponse, Responder};
use relay_common::types::ApiData;
use relay_common::Result;

#[post("/login")]
pub async fn login(state: web::Data<AppState>) -> Result<impl Responder> {
    let data = state.issuer.issue().await?;
    Ok(HttpResponse::Ok().json(ApiData::new(data)))
}
