// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema inspection for the `monthly_uptime` table.

use beacon_server_db::{table_exists, DbError, SqlitePool};
use serde::Serialize;
use std::fmt;

pub const MONTHLY_UPTIME_TABLE: &str = "monthly_uptime";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ColumnInfo {
	pub name: String,
	#[sqlx(rename = "type")]
	pub data_type: String,
	#[sqlx(rename = "notnull")]
	pub not_null: bool,
	/// Position in the primary key, 0 when not part of it.
	pub pk: i64,
	/// 0 for ordinary columns, 2 or 3 for generated ones.
	pub hidden: i64,
}

impl ColumnInfo {
	pub fn is_generated(&self) -> bool {
		self.hidden >= 2
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct IndexInfo {
	pub name: String,
	pub unique: bool,
	pub origin: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
	pub table: &'static str,
	pub columns: Vec<ColumnInfo>,
	pub indexes: Vec<IndexInfo>,
	pub rows: u64,
}

/// Describe `monthly_uptime`, or `None` when the table is missing.
pub async fn inspect_monthly_uptime(pool: &SqlitePool) -> Result<Option<SchemaReport>, DbError> {
	if !table_exists(pool, MONTHLY_UPTIME_TABLE).await? {
		return Ok(None);
	}

	// table_xinfo includes generated columns, which table_info hides.
	let columns: Vec<ColumnInfo> = sqlx::query_as(
		"SELECT name, type, \"notnull\", pk, hidden FROM pragma_table_xinfo('monthly_uptime') ORDER BY cid",
	)
	.fetch_all(pool)
	.await?;

	let indexes: Vec<IndexInfo> = sqlx::query_as(
		"SELECT name, \"unique\", origin FROM pragma_index_list('monthly_uptime') ORDER BY name",
	)
	.fetch_all(pool)
	.await?;

	let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM monthly_uptime")
		.fetch_one(pool)
		.await?;

	Ok(Some(SchemaReport {
		table: MONTHLY_UPTIME_TABLE,
		columns,
		indexes,
		rows: u64::try_from(rows).unwrap_or_default(),
	}))
}

impl fmt::Display for SchemaReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Table {} ({} rows)", self.table, self.rows)?;
		writeln!(f, "Columns:")?;
		for column in &self.columns {
			let mut flags = Vec::new();
			if column.pk > 0 {
				flags.push("primary key");
			}
			if column.not_null {
				flags.push("not null");
			}
			if column.is_generated() {
				flags.push("generated");
			}
			writeln!(f, "  {:<24} {:<10} {}", column.name, column.data_type, flags.join(", "))?;
		}
		writeln!(f, "Indexes:")?;
		for index in &self.indexes {
			writeln!(
				f,
				"  {:<40} {}",
				index.name,
				if index.unique { "unique" } else { "" }
			)?;
		}
		Ok(())
	}
}
