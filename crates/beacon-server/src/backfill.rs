// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One-off population of `monthly_uptime` from existing heartbeats.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use beacon_server_uptime::{AggregationReport, Aggregator, Result, UptimeRepository};
use beacon_uptime_core::MonthlyUptimeRow;

pub const SAMPLE_ROWS: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct BackfillSummary {
	pub monitors: u64,
	pub heartbeats: u64,
	/// `None` when there was nothing to aggregate.
	pub report: Option<AggregationReport>,
	pub monthly_rows: u64,
	pub sample: Vec<MonthlyUptimeRow>,
}

/// Aggregate every monitor and collect what was written.
///
/// An empty registry or empty history is a valid outcome, not an error.
pub async fn run_backfill(
	repository: &dyn UptimeRepository,
	aggregator: &Aggregator,
	now: DateTime<Utc>,
) -> Result<BackfillSummary> {
	let monitors = repository.count_monitors().await?;
	let heartbeats = if monitors > 0 {
		repository.count_heartbeats().await?
	} else {
		0
	};

	let report = if heartbeats > 0 {
		Some(aggregator.aggregate_all(now).await)
	} else {
		None
	};

	Ok(BackfillSummary {
		monitors,
		heartbeats,
		report,
		monthly_rows: repository.count_monthly_uptime().await?,
		sample: repository.sample_monthly_uptime(SAMPLE_ROWS).await?,
	})
}

impl fmt::Display for BackfillSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Monitors:   {}", self.monitors)?;
		if self.monitors == 0 {
			return writeln!(f, "No monitors found. Summaries will appear once monitors are added.");
		}
		writeln!(f, "Heartbeats: {}", self.heartbeats)?;

		match &self.report {
			None => writeln!(
				f,
				"No heartbeats found. Summaries will be built as new heartbeats arrive."
			)?,
			Some(report) => {
				writeln!(
					f,
					"Aggregated: {}/{} monitors, {} months written",
					report.monitors_succeeded, report.monitors_total, report.months_written
				)?;
				for failure in &report.failures {
					writeln!(f, "  failed monitor {}: {}", failure.monitor_id, failure.error)?;
				}
				if let Some(e) = &report.listing_error {
					writeln!(f, "  could not list monitors: {e}")?;
				}
			}
		}

		writeln!(f, "Monthly uptime rows: {}", self.monthly_rows)?;
		if !self.sample.is_empty() {
			writeln!(
				f,
				"\n{:>10}  {:<24} {:<8} {:>8} {:>10} {:>8}",
				"monitor", "name", "month", "total", "successful", "uptime"
			)?;
			for row in &self.sample {
				writeln!(
					f,
					"{:>10}  {:<24} {:<8} {:>8} {:>10} {:>7.2}%",
					row.monitor_id,
					row.monitor_name,
					row.year_month,
					row.counters.total_heartbeats,
					row.counters.successful_heartbeats,
					row.counters.uptime_percentage()
				)?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use beacon_server_db::testing::{create_test_pool, insert_monitor, insert_raw_heartbeat};
	use beacon_server_uptime::SqliteUptimeRepository;
	use beacon_uptime_core::MonitorId;
	use chrono::TimeZone;
	use std::sync::Arc;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
	}

	#[tokio::test]
	async fn test_empty_registry() {
		let repo = Arc::new(SqliteUptimeRepository::new(create_test_pool().await));
		let aggregator = Aggregator::new(repo.clone());

		let summary = run_backfill(repo.as_ref(), &aggregator, now()).await.unwrap();
		assert_eq!(summary.monitors, 0);
		assert!(summary.report.is_none());
		assert!(summary.to_string().contains("No monitors found"));
	}

	#[tokio::test]
	async fn test_monitors_without_heartbeats() {
		let pool = create_test_pool().await;
		insert_monitor(&pool, 1, "api", 1).await;
		let repo = Arc::new(SqliteUptimeRepository::new(pool));
		let aggregator = Aggregator::new(repo.clone());

		let summary = run_backfill(repo.as_ref(), &aggregator, now()).await.unwrap();
		assert_eq!(summary.monitors, 1);
		assert_eq!(summary.heartbeats, 0);
		assert!(summary.report.is_none());
		assert_eq!(summary.monthly_rows, 0);
	}

	#[tokio::test]
	async fn test_populates_and_samples_newest_first() {
		let pool = create_test_pool().await;
		insert_monitor(&pool, 1, "api", 1).await;
		insert_raw_heartbeat(&pool, 1, 1, "2024-01-05 10:00:00.000").await;
		insert_raw_heartbeat(&pool, 1, 0, "2024-01-06 10:00:00.000").await;
		insert_raw_heartbeat(&pool, 1, 1, "2024-03-01 00:00:00.000").await;
		let repo = Arc::new(SqliteUptimeRepository::new(pool));
		let aggregator = Aggregator::new(repo.clone());

		let summary = run_backfill(repo.as_ref(), &aggregator, now()).await.unwrap();
		assert_eq!(summary.heartbeats, 3);
		assert!(summary.report.as_ref().unwrap().is_clean());
		assert_eq!(summary.monthly_rows, 2);
		assert_eq!(summary.sample[0].monitor_id, MonitorId(1));
		assert_eq!(summary.sample[0].year_month.to_string(), "2024-03");
		assert_eq!(summary.sample[1].counters.uptime_percentage(), 50.0);

		let text = summary.to_string();
		assert!(text.contains("Aggregated: 1/1 monitors, 2 months written"));
		assert!(text.contains("50.00%"));
	}
}
