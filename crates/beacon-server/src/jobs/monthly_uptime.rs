// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic recomputation of monthly uptime for every monitor.

use async_trait::async_trait;
use beacon_server_config::UptimeConfig;
use beacon_server_jobs::{Job, JobContext, JobError, JobOutput, JobScheduler};
use beacon_server_uptime::Aggregator;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub const MONTHLY_UPTIME_JOB_ID: &str = "monthly-uptime";

pub struct MonthlyUptimeJob {
	aggregator: Arc<Aggregator>,
}

impl MonthlyUptimeJob {
	pub fn new(aggregator: Arc<Aggregator>) -> Self {
		Self { aggregator }
	}
}

/// Register `job` on `scheduler` as `config` asks.
///
/// A zero `aggregation_interval_secs` registers it without a schedule, so it
/// only runs through `POST /api/jobs/monthly-uptime/run`.
pub fn register_monthly_uptime_job(
	scheduler: &mut JobScheduler,
	job: Arc<MonthlyUptimeJob>,
	config: &UptimeConfig,
) {
	if config.aggregation_interval_secs == 0 {
		scheduler.register_one_shot(job);
		return;
	}

	let interval = Duration::from_secs(config.aggregation_interval_secs);
	if config.aggregate_on_startup {
		scheduler.register_periodic_on_start(job, interval);
	} else {
		scheduler.register_periodic(job, interval);
	}
}

#[async_trait]
impl Job for MonthlyUptimeJob {
	fn id(&self) -> &str {
		MONTHLY_UPTIME_JOB_ID
	}

	fn name(&self) -> &str {
		"Monthly Uptime"
	}

	fn description(&self) -> &str {
		"Recompute monthly uptime summaries from heartbeat history"
	}

	#[instrument(skip(self, ctx), fields(job_id = MONTHLY_UPTIME_JOB_ID, run_id = %ctx.run_id))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let now = Utc::now();
		let window = self.aggregator.window(now);
		info!(since = %window.start_month(), "Starting monthly uptime aggregation");

		let token = ctx.cancellation_token.clone();
		let report = self
			.aggregator
			.aggregate_all_until(now, &move || token.is_cancelled())
			.await;

		if let Some(e) = &report.listing_error {
			return Err(JobError::retryable(format!(
				"Failed to list monitors for monthly uptime: {e}"
			)));
		}
		if report.cancelled {
			return Err(JobError::Cancelled);
		}

		Ok(JobOutput {
			message: format!(
				"Updated monthly uptime for {}/{} monitors ({} months)",
				report.monitors_succeeded, report.monitors_total, report.months_written
			),
			metadata: Some(serde_json::json!({
				"since": window.start_month().to_string(),
				"monitors_total": report.monitors_total,
				"monitors_succeeded": report.monitors_succeeded,
				"months_written": report.months_written,
				"failures": report.failures,
			})),
		})
	}
}
