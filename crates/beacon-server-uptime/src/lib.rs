// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monthly uptime aggregation for Beacon server.
//!
//! Two write paths maintain `monthly_uptime` and converge on the same
//! counters:
//!
//! - [`Aggregator`] recomputes months from heartbeat history in bulk
//! - [`IncrementalUpdater`] counts one heartbeat into its month as it arrives
//!
//! [`MonthlyUptimeQuery`] is the read side used by the dashboard.

pub mod aggregator;
pub mod error;
pub mod incremental;
pub mod query;
pub mod repository;

pub use aggregator::{AggregationReport, Aggregator, MonitorFailure, MonitorLocks};
pub use error::{Result, UptimeServerError};
pub use incremental::IncrementalUpdater;
pub use query::MonthlyUptimeQuery;
pub use repository::{format_heartbeat_time, SqliteUptimeRepository, UptimeRepository};
