// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema migrations.
//!
//! Every statement uses `IF NOT EXISTS`, so running the full list against an
//! already-migrated database is a no-op.

use sqlx::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_create_registry",
		include_str!("../migrations/001_create_registry.sql"),
	),
	("002_create_jobs", include_str!("../migrations/002_create_jobs.sql")),
	(
		"003_create_monthly_uptime",
		include_str!("../migrations/003_create_monthly_uptime.sql"),
	),
];

/// Apply all migrations in order.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await.map_err(|e| {
				tracing::error!(migration = %name, error = %e, "migration failed");
				DbError::Sqlx(e)
			})?;
		}
		tracing::debug!(migration = %name, "migration applied");
	}
	Ok(())
}

/// Whether a table with this name exists.
pub async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool, DbError> {
	let row: Option<(String,)> =
		sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
			.bind(table)
			.fetch_optional(pool)
			.await?;
	Ok(row.is_some())
}
