// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background jobs registered with the scheduler.

mod job_history_cleanup;
mod monthly_uptime;

pub use job_history_cleanup::JobHistoryCleanupJob;
pub use monthly_uptime::{register_monthly_uptime_job, MonthlyUptimeJob, MONTHLY_UPTIME_JOB_ID};
