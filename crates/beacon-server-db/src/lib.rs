// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # beacon-server-db
//!
//! SQLite persistence shared by the Beacon server crates.
//!
//! - [`create_pool`] opens a WAL-mode pool
//! - [`run_migrations`] creates the registry, job and `monthly_uptime` tables
//! - [`JobRepository`] stores job definitions and run history
//!
//! Domain repositories (such as the uptime repository) live in their own
//! crates and take a `SqlitePool` from here.
//!
//! ## Testing
//!
//! With the `testing` feature (always on for this crate's own tests),
//! [`testing::create_test_pool`] returns a migrated in-memory database and
//! [`testing::create_file_test_pool`] a file-backed one with several
//! connections.

mod error;
pub mod job;
pub mod migrations;
pub mod pool;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{DbError, Result};
pub use job::{JobDefinition, JobRepository, JobRun, JobStatus, TriggerSource};
pub use migrations::{run_migrations, table_exists};
pub use pool::{connect_options, create_pool, ping};
pub use sqlx::SqlitePool;
