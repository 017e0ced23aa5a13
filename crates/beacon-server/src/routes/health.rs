// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tokio::time::Instant;

use beacon_server_jobs::{HealthState, JobsHealthStatus};

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
	pub status: HealthStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthComponents {
	pub database: DatabaseHealth,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub jobs: Option<JobsHealthStatus>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub timestamp: String,
	pub duration_ms: u64,
	pub version: &'static str,
	pub components: HealthComponents,
}

fn aggregate_status(components: &HealthComponents) -> HealthStatus {
	if components.database.status == HealthStatus::Unhealthy {
		return HealthStatus::Unhealthy;
	}
	match components.jobs.as_ref().map(|j| j.status) {
		Some(HealthState::Unhealthy) | Some(HealthState::Degraded) => HealthStatus::Degraded,
		_ => HealthStatus::Healthy,
	}
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let started = Instant::now();

	let database = match beacon_server_db::ping(&state.pool).await {
		Ok(()) => DatabaseHealth {
			status: HealthStatus::Healthy,
			error: None,
		},
		Err(e) => {
			tracing::warn!(error = %e, "Database health check failed");
			DatabaseHealth {
				status: HealthStatus::Unhealthy,
				error: Some(e.to_string()),
			}
		}
	};

	let jobs = match &state.job_scheduler {
		Some(scheduler) => Some(scheduler.health_status().await),
		None => None,
	};

	let components = HealthComponents { database, jobs };
	let status = aggregate_status(&components);

	let response = HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		duration_ms: started.elapsed().as_millis() as u64,
		version: crate::version::VERSION,
		components,
	};

	let http_status = match status {
		HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	(http_status, Json(response))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn components(db: HealthStatus, jobs: Option<HealthState>) -> HealthComponents {
		HealthComponents {
			database: DatabaseHealth {
				status: db,
				error: None,
			},
			jobs: jobs.map(|status| JobsHealthStatus {
				status,
				jobs: Vec::new(),
			}),
		}
	}

	#[test]
	fn test_aggregate_status() {
		assert_eq!(
			aggregate_status(&components(HealthStatus::Healthy, None)),
			HealthStatus::Healthy
		);
		assert_eq!(
			aggregate_status(&components(HealthStatus::Healthy, Some(HealthState::Unhealthy))),
			HealthStatus::Degraded
		);
		assert_eq!(
			aggregate_status(&components(HealthStatus::Unhealthy, Some(HealthState::Healthy))),
			HealthStatus::Unhealthy
		);
	}
}
