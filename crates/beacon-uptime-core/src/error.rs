// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for uptime aggregation.

use thiserror::Error;

/// Result type for uptime core operations.
pub type Result<T> = std::result::Result<T, UptimeError>;

/// Errors that can occur while building uptime values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UptimeError {
	#[error("invalid year-month: {0}")]
	InvalidYearMonth(String),

	#[error("successful heartbeats ({successful}) exceed total heartbeats ({total})")]
	InconsistentCounters { total: u64, successful: u64 },
}
