// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Heartbeat counters and the uptime percentage derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HeartbeatStatus, MonitorId, UptimeError, YearMonth};

/// Total and successful heartbeat counts for one monitor-month.
///
/// `successful_heartbeats <= total_heartbeats` always holds for values
/// produced through [`UptimeCounters::new`] or [`UptimeCounters::record`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeCounters {
	pub total_heartbeats: u64,
	pub successful_heartbeats: u64,
}

impl UptimeCounters {
	pub fn new(total_heartbeats: u64, successful_heartbeats: u64) -> Result<Self, UptimeError> {
		if successful_heartbeats > total_heartbeats {
			return Err(UptimeError::InconsistentCounters {
				total: total_heartbeats,
				successful: successful_heartbeats,
			});
		}
		Ok(Self {
			total_heartbeats,
			successful_heartbeats,
		})
	}

	/// Count one more heartbeat.
	pub fn record(&mut self, status: HeartbeatStatus) {
		self.total_heartbeats += 1;
		if status.is_up() {
			self.successful_heartbeats += 1;
		}
	}

	pub fn from_statuses<I>(statuses: I) -> Self
	where
		I: IntoIterator<Item = HeartbeatStatus>,
	{
		statuses.into_iter().fold(Self::default(), |mut acc, status| {
			acc.record(status);
			acc
		})
	}

	/// Uptime in hundredths of a percent, rounded half-up.
	///
	/// `(successful * 20000 + total) / (2 * total)` is `successful / total *
	/// 10000 + 0.5` floored, in integer arithmetic. The `monthly_uptime`
	/// generated column uses the same expression.
	pub fn uptime_hundredths(&self) -> u64 {
		if self.total_heartbeats == 0 {
			return 0;
		}
		let total = u128::from(self.total_heartbeats);
		let successful = u128::from(self.successful_heartbeats);
		((successful * 20_000 + total) / (2 * total)) as u64
	}

	/// Uptime as a percentage with two decimals, `0.0` when there are no
	/// heartbeats.
	pub fn uptime_percentage(&self) -> f64 {
		self.uptime_hundredths() as f64 / 100.0
	}
}

/// Counters for one month as computed from heartbeat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTotals {
	pub year_month: YearMonth,
	pub counters: UptimeCounters,
	/// Time of the earliest heartbeat in the month, used as `created_date`
	/// when the summary row does not exist yet.
	pub first_heartbeat: DateTime<Utc>,
}

/// A persisted monthly summary for one monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUptime {
	pub monitor_id: MonitorId,
	pub year_month: YearMonth,
	pub total_heartbeats: u64,
	pub successful_heartbeats: u64,
	pub created_date: DateTime<Utc>,
	pub updated_date: DateTime<Utc>,
}

impl MonthlyUptime {
	pub fn counters(&self) -> UptimeCounters {
		UptimeCounters {
			total_heartbeats: self.total_heartbeats,
			successful_heartbeats: self.successful_heartbeats,
		}
	}

	pub fn uptime_percentage(&self) -> f64 {
		self.counters().uptime_percentage()
	}
}
