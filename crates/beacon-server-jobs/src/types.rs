// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use beacon_server_db::{JobDefinition, JobRun, JobStatus, TriggerSource};

#[derive(Debug, Clone)]
pub enum JobType {
	Periodic {
		interval: Duration,
		/// Run once as soon as the scheduler starts instead of waiting a
		/// full interval.
		run_on_start: bool,
	},
	OneShot,
}

impl JobType {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobType::Periodic { .. } => "periodic",
			JobType::OneShot => "one_shot",
		}
	}

	pub fn interval_secs(&self) -> Option<i64> {
		match self {
			JobType::Periodic { interval, .. } => Some(interval.as_secs() as i64),
			JobType::OneShot => None,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
	pub message: String,
	pub metadata: Option<serde_json::Value>,
}

/// Exponential backoff applied to retryable failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub factor: f64,
	pub max_retries: u32,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(60),
			factor: 2.0,
			max_retries: 3,
		}
	}
}

impl RetryPolicy {
	/// Delay before retry number `retry_count` (1-based).
	pub fn delay(&self, retry_count: u32) -> Duration {
		let exponent = retry_count.saturating_sub(1).min(63) as i32;
		let secs = self.base_delay.as_secs_f64() * self.factor.powi(exponent);
		Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
	}
}
