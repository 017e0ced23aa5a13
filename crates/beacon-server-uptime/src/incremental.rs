// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-heartbeat adjustment of the current month's summary.

use chrono::Utc;
use std::sync::Arc;
use tracing::{instrument, warn};

use beacon_uptime_core::{Heartbeat, MonthlyUptime};

use crate::error::Result;
use crate::repository::UptimeRepository;

pub struct IncrementalUpdater {
	repository: Arc<dyn UptimeRepository>,
}

impl IncrementalUpdater {
	pub fn new(repository: Arc<dyn UptimeRepository>) -> Self {
		Self { repository }
	}

	/// Count `heartbeat` into its month. Failures are logged and swallowed so
	/// heartbeat ingestion never fails because of uptime bookkeeping.
	pub async fn apply(&self, heartbeat: &Heartbeat) {
		if let Err(e) = self.try_apply(heartbeat).await {
			warn!(
				monitor_id = %heartbeat.monitor_id,
				time = %heartbeat.time,
				error = %e,
				"Failed to update current month uptime"
			);
		}
	}

	/// Count `heartbeat` into its month and return the updated summary.
	#[instrument(skip_all, fields(monitor_id = %heartbeat.monitor_id, status = %heartbeat.status))]
	pub async fn try_apply(&self, heartbeat: &Heartbeat) -> Result<MonthlyUptime> {
		let year_month = heartbeat.year_month()?;
		self
			.repository
			.increment_month(
				heartbeat.monitor_id,
				year_month,
				heartbeat.status.is_up(),
				Utc::now(),
			)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::aggregator::Aggregator;
	use crate::repository::SqliteUptimeRepository;
	use beacon_server_db::testing::{create_file_test_pool, create_test_pool, insert_monitor};
	use beacon_uptime_core::{HeartbeatStatus, MonitorId, YearMonth};
	use chrono::{DateTime, TimeZone};

	fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
	}

	async fn setup() -> (Arc<SqliteUptimeRepository>, IncrementalUpdater) {
		let pool = create_test_pool().await;
		insert_monitor(&pool, 5, "api", 1).await;
		let repo = Arc::new(SqliteUptimeRepository::new(pool));
		let updater = IncrementalUpdater::new(repo.clone());
		(repo, updater)
	}

	#[tokio::test]
	async fn test_monitor_five_scenario_matches_bulk_path() {
		use HeartbeatStatus::*;
		let (repo, updater) = setup().await;

		let mut last = None;
		for (day, status) in [(3, Up), (10, Up), (20, Down), (31, Up)] {
			let heartbeat = Heartbeat::new(MonitorId(5), at(2024, 1, day, 10), status);
			repo.insert_heartbeat(&heartbeat, None).await.unwrap();
			last = Some(updater.try_apply(&heartbeat).await.unwrap());
		}

		let last = last.unwrap();
		assert_eq!(last.total_heartbeats, 4);
		assert_eq!(last.successful_heartbeats, 3);
		assert_eq!(last.uptime_percentage(), 75.0);

		let now = at(2024, 6, 15, 12);
		Aggregator::new(repo.clone())
			.aggregate_monitor(MonitorId(5), now)
			.await
			.unwrap();
		let bulk = repo
			.get_monthly_uptime(MonitorId(5), "2024-01".parse().unwrap())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(bulk.counters(), last.counters());
	}

	#[tokio::test]
	async fn test_new_month_starts_fresh_row() {
		let (repo, updater) = setup().await;

		updater
			.apply(&Heartbeat::new(MonitorId(5), at(2024, 1, 31, 23), HeartbeatStatus::Up))
			.await;
		let february = updater
			.try_apply(&Heartbeat::new(MonitorId(5), at(2024, 2, 1, 0), HeartbeatStatus::Down))
			.await
			.unwrap();

		assert_eq!(february.year_month, "2024-02".parse::<YearMonth>().unwrap());
		assert_eq!(february.total_heartbeats, 1);
		assert_eq!(february.successful_heartbeats, 0);
		assert_eq!(february.uptime_percentage(), 0.0);

		let january = repo
			.get_monthly_uptime(MonitorId(5), "2024-01".parse().unwrap())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(january.total_heartbeats, 1);
		assert_eq!(january.uptime_percentage(), 100.0);
	}

	#[tokio::test]
	async fn test_pending_and_maintenance_are_not_successful() {
		let (_repo, updater) = setup().await;

		let mut row = None;
		for status in [HeartbeatStatus::Pending, HeartbeatStatus::Maintenance, HeartbeatStatus::Up] {
			row = Some(
				updater
					.try_apply(&Heartbeat::new(MonitorId(5), at(2024, 3, 1, 0), status))
					.await
					.unwrap(),
			);
		}
		assert_eq!(row.unwrap().uptime_percentage(), 33.33);
	}

	#[tokio::test]
	async fn test_apply_swallows_storage_errors() {
		let (repo, updater) = setup().await;

		// Monitor 99 is not registered, so the foreign key rejects the row.
		let orphan = Heartbeat::new(MonitorId(99), at(2024, 3, 1, 0), HeartbeatStatus::Up);
		assert!(updater.try_apply(&orphan).await.is_err());
		updater.apply(&orphan).await;

		assert!(repo.list_monthly_uptime(MonitorId(99)).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_five_digit_year_is_rejected_without_a_row() {
		let (repo, updater) = setup().await;

		let far_future = Heartbeat::new(
			MonitorId(5),
			Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap(),
			HeartbeatStatus::Up,
		);
		assert!(matches!(
			updater.try_apply(&far_future).await,
			Err(crate::error::UptimeServerError::Uptime(_))
		));
		updater.apply(&far_future).await;

		assert!(repo.list_monthly_uptime(MonitorId(5)).await.unwrap().is_empty());
		let rows = repo
			.list_monthly_uptime_for_user(beacon_uptime_core::UserId(1), "2024-01".parse().unwrap())
			.await
			.unwrap();
		assert!(rows.is_empty());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_increments_are_not_lost() {
		let (pool, _dir) = create_file_test_pool(std::time::Duration::from_secs(5)).await;
		insert_monitor(&pool, 5, "api", 1).await;
		let repo = Arc::new(SqliteUptimeRepository::new(pool));
		let updater = Arc::new(IncrementalUpdater::new(repo.clone()));

		let tasks: Vec<_> = (0..20)
			.map(|i| {
				let updater = Arc::clone(&updater);
				tokio::spawn(async move {
					let status = if i % 4 == 0 {
						HeartbeatStatus::Down
					} else {
						HeartbeatStatus::Up
					};
					updater
						.try_apply(&Heartbeat::new(MonitorId(5), at(2024, 4, 2, 0), status))
						.await
						.unwrap();
				})
			})
			.collect();
		for task in tasks {
			task.await.unwrap();
		}

		let row = repo
			.get_monthly_uptime(MonitorId(5), "2024-04".parse().unwrap())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(row.total_heartbeats, 20);
		assert_eq!(row.successful_heartbeats, 15);
	}
}
