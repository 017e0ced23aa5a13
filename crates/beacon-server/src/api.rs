// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router construction.

use axum::{
	routing::{get, post},
	Router,
};
use std::sync::Arc;

use beacon_server_config::ServerConfig;
use beacon_server_db::{JobRepository, SqlitePool};
use beacon_server_jobs::JobScheduler;
use beacon_server_uptime::{MonthlyUptimeQuery, SqliteUptimeRepository};

use crate::{games::GameCatalog, routes};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub uptime_query: Arc<MonthlyUptimeQuery>,
	pub games: Arc<GameCatalog>,
	pub job_scheduler: Option<Arc<JobScheduler>>,
	pub job_repository: Option<Arc<JobRepository>>,
}

/// Build state from a migrated pool. The scheduler is attached afterwards.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig, games: GameCatalog) -> AppState {
	let uptime_query = Arc::new(MonthlyUptimeQuery::with_retention(
		Arc::new(SqliteUptimeRepository::new(pool.clone())),
		config.uptime.retention_months,
	));

	AppState {
		pool,
		uptime_query,
		games: Arc::new(games),
		job_scheduler: None,
		job_repository: None,
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/api/users/{user_id}/uptime/monthly",
			get(routes::uptime::get_monthly_uptime),
		)
		.route("/api/games", get(routes::games::list_games))
		.route("/api/jobs", get(routes::jobs::list_jobs))
		.route("/api/jobs/{job_id}/run", post(routes::jobs::trigger_job))
		.with_state(state)
}
