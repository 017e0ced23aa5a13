// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monthly uptime for the dashboard.

use axum::{
	extract::{Path, State},
	Json,
};
use chrono::Utc;
use serde::Serialize;

use beacon_uptime_core::{MonitorMonthlyUptime, UserId};

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Serialize)]
pub struct MonthlyUptimeResponse {
	pub ok: bool,
	pub data: Vec<MonitorMonthlyUptime>,
}

/// GET /api/users/{user_id}/uptime/monthly
///
/// The caller is authenticated upstream; `user_id` is trusted here.
#[tracing::instrument(skip(state))]
pub async fn get_monthly_uptime(
	State(state): State<AppState>,
	Path(user_id): Path<i64>,
) -> Result<Json<MonthlyUptimeResponse>, ServerError> {
	let data = state
		.uptime_query
		.for_user(UserId(user_id), Utc::now())
		.await
		.map_err(|e| {
			tracing::error!(user_id, error = %e, "Failed to load monthly uptime");
			e
		})?;

	tracing::debug!(user_id, monitors = data.len(), "Loaded monthly uptime");
	Ok(Json(MonthlyUptimeResponse { ok: true, data }))
}
