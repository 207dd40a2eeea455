mod appointments;
mod customers;
mod roi;
mod waitlist;

pub use appointments::*;
pub use customers::*;
pub use roi::*;
pub use waitlist::*;

use axum::{
    routing::{get, post},
    Router,
};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", post(create_customer))
        .route("/api/waitlist", post(create_waitlist_entry))
        .route("/api/waitlist", get(list_waitlist))
        .route("/api/appointments/{id}/confirm", post(confirm_appointment))
        .route("/api/roi/dashboard", get(roi_dashboard))
}
