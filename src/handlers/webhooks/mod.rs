mod sms;

pub use sms::*;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/sms", post(handle_inbound_sms))
}
