// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hook the monitoring pipeline calls for every new heartbeat.

use std::sync::Arc;
use tracing::instrument;

use beacon_server_uptime::{IncrementalUpdater, UptimeRepository, UptimeServerError};
use beacon_uptime_core::Heartbeat;

pub struct HeartbeatIngestor {
	repository: Arc<dyn UptimeRepository>,
	updater: IncrementalUpdater,
}

impl HeartbeatIngestor {
	pub fn new(repository: Arc<dyn UptimeRepository>) -> Self {
		Self {
			updater: IncrementalUpdater::new(Arc::clone(&repository)),
			repository,
		}
	}

	/// Persist `heartbeat`, then count it into its month.
	///
	/// Only the insert can fail the call. The monthly update is best-effort
	/// and the next aggregation run repairs anything it misses.
	#[instrument(skip_all, fields(monitor_id = %heartbeat.monitor_id))]
	pub async fn record(&self, heartbeat: &Heartbeat, msg: Option<&str>) -> Result<(), UptimeServerError> {
		self.repository.insert_heartbeat(heartbeat, msg).await?;
		self.updater.apply(heartbeat).await;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use beacon_server_db::testing::{create_test_pool, insert_monitor};
	use beacon_server_uptime::SqliteUptimeRepository;
	use beacon_uptime_core::{HeartbeatStatus, MonitorId};
	use chrono::{TimeZone, Utc};

	#[tokio::test]
	async fn test_record_persists_and_counts() {
		let pool = create_test_pool().await;
		insert_monitor(&pool, 5, "api", 1).await;
		let repo = Arc::new(SqliteUptimeRepository::new(pool));
		let ingestor = HeartbeatIngestor::new(repo.clone());

		let time = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
		for status in [HeartbeatStatus::Up, HeartbeatStatus::Down] {
			ingestor
				.record(&Heartbeat::new(MonitorId(5), time, status), Some("check"))
				.await
				.unwrap();
		}

		assert_eq!(repo.count_heartbeats().await.unwrap(), 2);
		let month = repo
			.get_monthly_uptime(MonitorId(5), "2024-01".parse().unwrap())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(month.total_heartbeats, 2);
		assert_eq!(month.uptime_percentage(), 50.0);
	}

	#[tokio::test]
	async fn test_insert_failure_is_returned() {
		let pool = create_test_pool().await;
		let repo = Arc::new(SqliteUptimeRepository::new(pool));
		let ingestor = HeartbeatIngestor::new(repo.clone());

		let orphan = Heartbeat::new(MonitorId(42), Utc::now(), HeartbeatStatus::Up);
		assert!(ingestor.record(&orphan, None).await.is_err());
		assert_eq!(repo.count_monthly_uptime().await.unwrap(), 0);
	}
}
