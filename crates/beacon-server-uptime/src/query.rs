// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only access to monthly summaries for the dashboard.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;

use beacon_uptime_core::{group_by_monitor, MonitorMonthlyUptime, RetentionWindow, UserId, DEFAULT_RETENTION_MONTHS};

use crate::error::Result;
use crate::repository::UptimeRepository;

pub struct MonthlyUptimeQuery {
	repository: Arc<dyn UptimeRepository>,
	retention_months: u32,
}

impl MonthlyUptimeQuery {
	pub fn new(repository: Arc<dyn UptimeRepository>) -> Self {
		Self::with_retention(repository, DEFAULT_RETENTION_MONTHS)
	}

	pub fn with_retention(repository: Arc<dyn UptimeRepository>, retention_months: u32) -> Self {
		Self {
			repository,
			retention_months,
		}
	}

	/// Monthly uptime of every monitor owned by `user_id` inside the
	/// retention window, one entry per monitor in monitor id order.
	///
	/// Monitors without any summary rows are omitted.
	#[instrument(skip_all, fields(user_id = %user_id))]
	pub async fn for_user(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<MonitorMonthlyUptime>> {
		let since = RetentionWindow::new(now, self.retention_months).start_month();
		let rows = self
			.repository
			.list_monthly_uptime_for_user(user_id, since)
			.await?;
		Ok(group_by_monitor(rows))
	}
}
