// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monthly uptime aggregation settings.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::ConfigError;

pub const RETENTION_MONTHS_RANGE: RangeInclusive<u32> = 1..=120;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UptimeConfigLayer {
	pub retention_months: Option<u32>,
	pub aggregation_interval_secs: Option<u64>,
	pub aggregate_on_startup: Option<bool>,
}

impl UptimeConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.retention_months.is_some() {
			self.retention_months = other.retention_months;
		}
		if other.aggregation_interval_secs.is_some() {
			self.aggregation_interval_secs = other.aggregation_interval_secs;
		}
		if other.aggregate_on_startup.is_some() {
			self.aggregate_on_startup = other.aggregate_on_startup;
		}
	}

	pub fn finalize(self) -> Result<UptimeConfig, ConfigError> {
		let defaults = UptimeConfig::default();
		let config = UptimeConfig {
			retention_months: self.retention_months.unwrap_or(defaults.retention_months),
			aggregation_interval_secs: self
				.aggregation_interval_secs
				.unwrap_or(defaults.aggregation_interval_secs),
			aggregate_on_startup: self
				.aggregate_on_startup
				.unwrap_or(defaults.aggregate_on_startup),
		};

		if !RETENTION_MONTHS_RANGE.contains(&config.retention_months) {
			return Err(ConfigError::InvalidValue {
				key: "uptime.retention_months".to_string(),
				message: format!(
					"{} is outside {}..={}",
					config.retention_months,
					RETENTION_MONTHS_RANGE.start(),
					RETENTION_MONTHS_RANGE.end()
				),
			});
		}
		Ok(config)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UptimeConfig {
	/// Months before the current one that aggregation and queries cover.
	pub retention_months: u32,
	/// Zero disables the schedule; the job then only runs when triggered.
	pub aggregation_interval_secs: u64,
	pub aggregate_on_startup: bool,
}

impl Default for UptimeConfig {
	fn default() -> Self {
		Self {
			retention_months: 12,
			aggregation_interval_secs: 3600,
			aggregate_on_startup: true,
		}
	}
}
