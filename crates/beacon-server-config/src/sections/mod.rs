// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for beacon-server.

pub mod database;
pub mod games;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod uptime;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use games::{GamesConfig, GamesConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use jobs::{JobsConfig, JobsConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use uptime::{UptimeConfig, UptimeConfigLayer};
