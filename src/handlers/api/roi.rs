//! ROI dashboard aggregation.
//!
//! Windows are UTC: "today" is the current calendar day, "month" is
//! month-to-date. The daily series is zero-filled so the dashboard renders
//! a row per day even when nothing happened.

use std::collections::HashMap;

use axum::extract::State;
use chrono::{Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, OptionExt, Result};
use crate::extractors::{Json, Query};
use crate::models::RevenueEventType;

const DEFAULT_SERIES_DAYS: i64 = 7;
const MAX_SERIES_DAYS: i64 = 90;

#[derive(Debug, Deserialize)]
pub struct RoiQuery {
    pub tenant_id: String,
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RoiBucket {
    pub cents: i64,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct RoiSummary {
    pub recovered_today: RoiBucket,
    pub recovered_month: RoiBucket,
    pub prevented_no_show_today: RoiBucket,
    pub prevented_no_show_month: RoiBucket,
    /// Monthly subscription price; 0 without an active subscription
    pub subscription_cents: i64,
    /// recovered_month.cents / subscription_cents; null without a
    /// subscription to divide by
    pub roi_multiple: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RoiDay {
    pub day: String,
    pub recovered: RoiBucket,
    pub prevented_no_show: RoiBucket,
    pub appointments: i64,
}

#[derive(Debug, Serialize)]
pub struct RoiDashboard {
    pub summary: RoiSummary,
    pub series: Vec<RoiDay>,
}

/// `GET /api/roi/dashboard?tenant_id=&days=`
pub async fn roi_dashboard(
    State(state): State<AppState>,
    Query(query): Query<RoiQuery>,
) -> Result<Json<RoiDashboard>> {
    let conn = state.db.get()?;

    queries::get_tenant_by_id(&conn, &query.tenant_id)?.or_not_found(msg::TENANT_NOT_FOUND)?;

    let days = query
        .days
        .unwrap_or(DEFAULT_SERIES_DAYS)
        .clamp(1, MAX_SERIES_DAYS);

    let today = Utc::now().date_naive();
    let today_start = today.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
    let month_start = today
        .with_day(1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp();

    let bucket = |totals: (i64, i64)| RoiBucket {
        cents: totals.0,
        count: totals.1,
    };

    let recovered_today = bucket(queries::revenue_window_totals(
        &conn,
        &query.tenant_id,
        RevenueEventType::RecoveredBooking,
        today_start,
    )?);
    let recovered_month = bucket(queries::revenue_window_totals(
        &conn,
        &query.tenant_id,
        RevenueEventType::RecoveredBooking,
        month_start,
    )?);
    let prevented_today = bucket(queries::revenue_window_totals(
        &conn,
        &query.tenant_id,
        RevenueEventType::PreventedNoShow,
        today_start,
    )?);
    let prevented_month = bucket(queries::revenue_window_totals(
        &conn,
        &query.tenant_id,
        RevenueEventType::PreventedNoShow,
        month_start,
    )?);

    let subscription = queries::current_subscription_for_tenant(&conn, &query.tenant_id)?;
    let subscription_cents = subscription.as_ref().map(|s| s.price_cents).unwrap_or(0);
    let roi_multiple = subscription
        .filter(|s| s.price_cents > 0)
        .map(|s| recovered_month.cents as f64 / s.price_cents as f64);

    // Daily series, oldest day first, zero-filled.
    let series_start = today - Duration::days(days - 1);
    let since_ts = series_start
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp();
    let until_ts = today_start + 86400;

    let mut revenue_by_day: HashMap<(String, RevenueEventType), RoiBucket> = HashMap::new();
    for (day, event_type, cents, count) in
        queries::daily_revenue_series(&conn, &query.tenant_id, since_ts)?
    {
        revenue_by_day.insert((day, event_type), RoiBucket { cents, count });
    }

    let appointments_by_day: HashMap<String, i64> =
        queries::daily_appointment_counts(&conn, &query.tenant_id, since_ts, until_ts)?
            .into_iter()
            .collect();

    let series = (0..days)
        .map(|offset| {
            let day = (series_start + Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string();
            RoiDay {
                recovered: revenue_by_day
                    .get(&(day.clone(), RevenueEventType::RecoveredBooking))
                    .copied()
                    .unwrap_or_default(),
                prevented_no_show: revenue_by_day
                    .get(&(day.clone(), RevenueEventType::PreventedNoShow))
                    .copied()
                    .unwrap_or_default(),
                appointments: appointments_by_day.get(&day).copied().unwrap_or(0),
                day,
            }
        })
        .collect();

    Ok(Json(RoiDashboard {
        summary: RoiSummary {
            recovered_today,
            recovered_month,
            prevented_no_show_today: prevented_today,
            prevented_no_show_month: prevented_month,
            subscription_cents,
            roi_multiple,
        },
        series,
    }))
}
