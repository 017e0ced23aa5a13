// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory database helpers for tests.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tempfile::TempDir;

use crate::migrations::run_migrations;
use crate::pool::connect_options;

/// A fully migrated in-memory database.
///
/// Limited to a single connection so every query sees the same database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.unwrap()
		.foreign_keys(true);
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

/// A fully migrated WAL database in a temporary directory, opened with the
/// production connection options and up to 8 connections.
///
/// The database lives as long as the returned `TempDir`.
pub async fn create_file_test_pool(busy_timeout: Duration) -> (SqlitePool, TempDir) {
	let dir = tempfile::tempdir().unwrap();
	let url = format!("sqlite:{}", dir.path().join("beacon.db").display());
	let options = connect_options(&url).unwrap().busy_timeout(busy_timeout);
	let pool = SqlitePoolOptions::new()
		.max_connections(8)
		.connect_with(options)
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	(pool, dir)
}

pub async fn insert_monitor(pool: &SqlitePool, id: i64, name: &str, user_id: i64) {
	sqlx::query("INSERT INTO monitor (id, name, user_id) VALUES (?, ?, ?)")
		.bind(id)
		.bind(name)
		.bind(user_id)
		.execute(pool)
		.await
		.unwrap();
}

/// Insert a heartbeat with a raw `time` value, bypassing any formatting.
pub async fn insert_raw_heartbeat(pool: &SqlitePool, monitor_id: i64, status: i64, time: &str) {
	sqlx::query("INSERT INTO heartbeat (monitor_id, status, time) VALUES (?, ?, ?)")
		.bind(monitor_id)
		.bind(status)
		.bind(time)
		.execute(pool)
		.await
		.unwrap();
}
