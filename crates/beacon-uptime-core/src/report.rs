// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dashboard-facing shape of monthly uptime data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{MonitorId, UptimeCounters, YearMonth};

/// One joined `monthly_uptime` + `monitor` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyUptimeRow {
	pub monitor_id: MonitorId,
	pub monitor_name: String,
	pub year_month: YearMonth,
	pub counters: UptimeCounters,
}

/// Per-monitor monthly uptime as returned to the dashboard.
///
/// Serializes as `{ "id": 5, "name": "api", "uptime": { "2024-01": 99.5 } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorMonthlyUptime {
	pub id: MonitorId,
	pub name: String,
	pub uptime: BTreeMap<YearMonth, f64>,
}

/// Group rows by monitor, keeping monitors in the order they first appear.
pub fn group_by_monitor<I>(rows: I) -> Vec<MonitorMonthlyUptime>
where
	I: IntoIterator<Item = MonthlyUptimeRow>,
{
	let mut grouped: Vec<MonitorMonthlyUptime> = Vec::new();
	let mut positions: BTreeMap<MonitorId, usize> = BTreeMap::new();

	for row in rows {
		let index = *positions.entry(row.monitor_id).or_insert_with(|| {
			grouped.push(MonitorMonthlyUptime {
				id: row.monitor_id,
				name: row.monitor_name.clone(),
				uptime: BTreeMap::new(),
			});
			grouped.len() - 1
		});
		grouped[index]
			.uptime
			.insert(row.year_month, row.counters.uptime_percentage());
	}

	grouped
}
