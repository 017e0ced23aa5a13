// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Beacon monthly uptime aggregation.
//!
//! This crate holds the pure, I/O-free half of the monthly uptime feature. It
//! is shared by the SQLite-backed server implementation (`beacon-server-uptime`)
//! and the HTTP layer.
//!
//! # Overview
//!
//! - Heartbeats are per-check outcomes recorded by the monitoring pipeline
//! - Summaries count heartbeats per monitor per calendar month (UTC)
//! - Uptime percentages are derived from the two counters, never stored
//!   independently, using one integer rounding rule

pub mod error;
pub mod heartbeat;
pub mod monitor;
pub mod month;
pub mod report;
pub mod uptime;

pub use error::{Result, UptimeError};
pub use heartbeat::{Heartbeat, HeartbeatStatus};
pub use monitor::{MonitorId, MonitorRef, UserId};
pub use month::{RetentionWindow, YearMonth, DEFAULT_RETENTION_MONTHS};
pub use report::{group_by_monitor, MonitorMonthlyUptime, MonthlyUptimeRow};
pub use uptime::{MonthTotals, MonthlyUptime, UptimeCounters};
