// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Heartbeat types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{MonitorId, UptimeError, YearMonth};

/// Outcome of a single check, stored as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum HeartbeatStatus {
	/// 0
	Down,
	/// 1
	Up,
	/// 2
	Pending,
	/// 3
	Maintenance,
	/// Any code this crate doesn't know about. Counted, never successful.
	Other(i64),
}

impl HeartbeatStatus {
	pub fn from_code(code: i64) -> Self {
		match code {
			0 => Self::Down,
			1 => Self::Up,
			2 => Self::Pending,
			3 => Self::Maintenance,
			other => Self::Other(other),
		}
	}

	pub fn code(&self) -> i64 {
		match self {
			Self::Down => 0,
			Self::Up => 1,
			Self::Pending => 2,
			Self::Maintenance => 3,
			Self::Other(code) => *code,
		}
	}

	/// Only `Up` counts toward successful heartbeats.
	pub fn is_up(&self) -> bool {
		matches!(self, Self::Up)
	}
}

impl From<i64> for HeartbeatStatus {
	fn from(code: i64) -> Self {
		Self::from_code(code)
	}
}

impl From<HeartbeatStatus> for i64 {
	fn from(status: HeartbeatStatus) -> Self {
		status.code()
	}
}

impl fmt::Display for HeartbeatStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Down => write!(f, "down"),
			Self::Up => write!(f, "up"),
			Self::Pending => write!(f, "pending"),
			Self::Maintenance => write!(f, "maintenance"),
			Self::Other(code) => write!(f, "status({code})"),
		}
	}
}

/// A single persisted check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
	pub monitor_id: MonitorId,
	pub time: DateTime<Utc>,
	pub status: HeartbeatStatus,
}

impl Heartbeat {
	pub fn new(monitor_id: MonitorId, time: DateTime<Utc>, status: HeartbeatStatus) -> Self {
		Self {
			monitor_id,
			time,
			status,
		}
	}

	/// Calendar month (UTC) this heartbeat belongs to.
	///
	/// Fails for years outside 0..=9999, which have no "YYYY-MM" key.
	pub fn year_month(&self) -> Result<YearMonth, UptimeError> {
		YearMonth::try_from_datetime(self.time)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn status_code_roundtrip(code in any::<i64>()) {
			let status = HeartbeatStatus::from_code(code);
			prop_assert_eq!(status.code(), code);
		}

		#[test]
		fn only_code_one_is_up(code in any::<i64>()) {
			prop_assert_eq!(HeartbeatStatus::from_code(code).is_up(), code == 1);
		}
	}

	#[test]
	fn status_serializes_as_code() {
		assert_eq!(serde_json::to_string(&HeartbeatStatus::Up).unwrap(), "1");
		let parsed: HeartbeatStatus = serde_json::from_str("3").unwrap();
		assert_eq!(parsed, HeartbeatStatus::Maintenance);
	}

	#[test]
	fn heartbeat_month_uses_utc() {
		let hb = Heartbeat::new(
			MonitorId(1),
			Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap(),
			HeartbeatStatus::Up,
		);
		assert_eq!(hb.year_month().unwrap().to_string(), "2024-01");
	}

	#[test]
	fn heartbeat_month_rejects_five_digit_years() {
		let hb = Heartbeat::new(
			MonitorId(1),
			Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap(),
			HeartbeatStatus::Up,
		);
		assert!(matches!(hb.year_month(), Err(UptimeError::InvalidYearMonth(_))));
	}
}
