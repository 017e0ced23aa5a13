// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bulk recomputation of monthly summaries from heartbeat history.
//!
//! For every monitor, heartbeats inside the retention window are grouped by
//! calendar month and the stored counters are overwritten with the fresh
//! counts. A failure for one monitor is logged and does not stop the others.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument, warn};

use beacon_uptime_core::{MonitorId, RetentionWindow, DEFAULT_RETENTION_MONTHS};

use crate::error::Result;
use crate::repository::UptimeRepository;

/// One async lock per monitor, so two recomputations of the same monitor
/// never interleave.
#[derive(Default)]
pub struct MonitorLocks {
	locks: StdMutex<HashMap<MonitorId, Arc<Mutex<()>>>>,
}

impl MonitorLocks {
	pub async fn lock(&self, monitor_id: MonitorId) -> OwnedMutexGuard<()> {
		let lock = {
			let mut locks = self
				.locks
				.lock()
				.unwrap_or_else(|poisoned| poisoned.into_inner());
			Arc::clone(locks.entry(monitor_id).or_default())
		};
		lock.lock_owned().await
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorFailure {
	pub monitor_id: MonitorId,
	pub error: String,
}

/// Outcome of [`Aggregator::aggregate_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
	pub monitors_total: usize,
	pub monitors_succeeded: usize,
	pub months_written: usize,
	pub failures: Vec<MonitorFailure>,
	/// Set when the monitor list itself could not be loaded.
	pub listing_error: Option<String>,
	/// Set when the run stopped early because it was cancelled.
	pub cancelled: bool,
}

impl AggregationReport {
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty() && self.listing_error.is_none() && !self.cancelled
	}
}

pub struct Aggregator {
	repository: Arc<dyn UptimeRepository>,
	retention_months: u32,
	locks: MonitorLocks,
}

impl Aggregator {
	pub fn new(repository: Arc<dyn UptimeRepository>) -> Self {
		Self::with_retention(repository, DEFAULT_RETENTION_MONTHS)
	}

	pub fn with_retention(repository: Arc<dyn UptimeRepository>, retention_months: u32) -> Self {
		Self {
			repository,
			retention_months,
			locks: MonitorLocks::default(),
		}
	}

	pub fn window(&self, now: DateTime<Utc>) -> RetentionWindow {
		RetentionWindow::new(now, self.retention_months)
	}

	/// Recompute all months in the window for one monitor.
	///
	/// Returns the number of months written. Nothing is written if any part
	/// fails.
	#[instrument(skip_all, fields(monitor_id = %monitor_id))]
	pub async fn aggregate_monitor(&self, monitor_id: MonitorId, now: DateTime<Utc>) -> Result<usize> {
		let _guard = self.locks.lock(monitor_id).await;
		let since = self.window(now).start_month();

		let months = self
			.repository
			.recompute_months(monitor_id, since, now)
			.await?;

		debug!(
			monitor_id = %monitor_id,
			since = %since,
			months = months.len(),
			"Recomputed monthly uptime"
		);
		Ok(months.len())
	}

	/// Recompute every registered monitor.
	pub async fn aggregate_all(&self, now: DateTime<Utc>) -> AggregationReport {
		self.aggregate_all_until(now, &|| false).await
	}

	/// Like [`Aggregator::aggregate_all`], checking `should_stop` before each
	/// monitor.
	#[instrument(skip_all)]
	pub async fn aggregate_all_until(
		&self,
		now: DateTime<Utc>,
		should_stop: &(dyn Fn() -> bool + Sync),
	) -> AggregationReport {
		let mut report = AggregationReport::default();

		let monitors = match self.repository.list_monitors().await {
			Ok(monitors) => monitors,
			Err(e) => {
				error!(error = %e, "Failed to list monitors for monthly uptime aggregation");
				report.listing_error = Some(e.to_string());
				return report;
			}
		};
		report.monitors_total = monitors.len();

		for monitor in &monitors {
			if should_stop() {
				info!(
					processed = report.monitors_succeeded + report.failures.len(),
					total = report.monitors_total,
					"Monthly uptime aggregation stopped early"
				);
				report.cancelled = true;
				return report;
			}

			match self.aggregate_monitor(monitor.id, now).await {
				Ok(months) => {
					report.monitors_succeeded += 1;
					report.months_written += months;
				}
				Err(e) => {
					warn!(
						monitor_id = %monitor.id,
						monitor_name = %monitor.name,
						error = %e,
						"Failed to update monthly uptime for monitor"
					);
					report.failures.push(MonitorFailure {
						monitor_id: monitor.id,
						error: e.to_string(),
					});
				}
			}
		}

		info!(
			monitors = report.monitors_total,
			failed = report.failures.len(),
			months_written = report.months_written,
			"Updated monthly uptime"
		);
		report
	}
}
