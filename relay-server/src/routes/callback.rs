//! Wallet callback endpoint
//!
//! POST /verusidlogin
//! Receives the wallet's signed login-consent response. The body is taken as
//! raw bytes so that parse failures surface as `MalformedResponse` rather
//! than the framework's extractor error.

use crate::AppState;
use actix_web::{post, web, HttpResponse, Responder};
use relay_common::Result;

#[post("/verusidlogin")]
pub async fn verusid_login(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<impl Responder> {
    state.verifier.handle(&body).await?;
    Ok(HttpResponse::Ok().json(true))
}
