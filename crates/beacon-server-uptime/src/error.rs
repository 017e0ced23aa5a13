// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for uptime server operations.

use beacon_uptime_core::{MonitorId, UptimeError};
use thiserror::Error;

/// Result type for uptime server operations.
pub type Result<T> = std::result::Result<T, UptimeServerError>;

/// Errors that can occur while aggregating, updating or querying summaries.
#[derive(Debug, Error)]
pub enum UptimeServerError {
	#[error("heartbeat with unparseable time for monitor {monitor_id}")]
	MalformedHeartbeatTime { monitor_id: MonitorId },

	#[error("invalid uptime value: {0}")]
	Uptime(#[from] UptimeError),

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("internal error: {0}")]
	Internal(String),
}
