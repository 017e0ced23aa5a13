// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job scheduler inspection and manual triggering.

use axum::{
	extract::{Path, State},
	Json,
};
use serde::Serialize;
use std::sync::Arc;

use beacon_server_jobs::{JobHealthStatus, JobScheduler, TriggerSource};

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Serialize)]
pub struct JobInfo {
	#[serde(flatten)]
	pub health: JobHealthStatus,
	pub job_type: String,
	pub interval_secs: Option<i64>,
	pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
	pub ok: bool,
	pub jobs: Vec<JobInfo>,
}

#[derive(Debug, Serialize)]
pub struct TriggerJobResponse {
	pub ok: bool,
	pub run_id: String,
}

fn scheduler(state: &AppState) -> Result<&Arc<JobScheduler>, ServerError> {
	state
		.job_scheduler
		.as_ref()
		.ok_or_else(|| ServerError::NotImplemented("Job scheduler not configured".to_string()))
}

/// GET /api/jobs
#[tracing::instrument(skip(state))]
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<ListJobsResponse>, ServerError> {
	let health = scheduler(&state)?.health_status().await;

	let definitions = match &state.job_repository {
		Some(repo) => repo.list_definitions().await?,
		None => Vec::new(),
	};

	let jobs = health
		.jobs
		.into_iter()
		.map(|health| {
			let def = definitions.iter().find(|d| d.id == health.job_id);
			JobInfo {
				job_type: def
					.map(|d| d.job_type.clone())
					.unwrap_or_else(|| "periodic".to_string()),
				interval_secs: def.and_then(|d| d.interval_secs),
				enabled: def.map(|d| d.enabled).unwrap_or(true),
				health,
			}
		})
		.collect();

	Ok(Json(ListJobsResponse { ok: true, jobs }))
}

/// POST /api/jobs/{job_id}/run
///
/// Runs the job to completion before responding.
#[tracing::instrument(skip(state))]
pub async fn trigger_job(
	State(state): State<AppState>,
	Path(job_id): Path<String>,
) -> Result<Json<TriggerJobResponse>, ServerError> {
	let run_id = scheduler(&state)?
		.trigger_job(&job_id, TriggerSource::Manual)
		.await?;

	tracing::info!(job_id = %job_id, run_id = %run_id, "Job triggered manually");
	Ok(Json(TriggerJobResponse { ok: true, run_id }))
}
