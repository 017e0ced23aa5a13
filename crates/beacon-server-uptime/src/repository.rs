// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository layer for monthly uptime database operations.
//!
//! `monitor` and `heartbeat` belong to the monitoring pipeline; this layer
//! only reads them (and inserts heartbeats on the pipeline's behalf). It owns
//! `monthly_uptime`, whose `uptime_percentage` column is generated by SQLite
//! and never written here.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use beacon_uptime_core::{
	Heartbeat, MonitorId, MonitorRef, MonthTotals, MonthlyUptime, MonthlyUptimeRow,
	UptimeCounters, UserId, YearMonth,
};

use crate::error::{Result, UptimeServerError};

/// Storage format of `heartbeat.time`, always UTC.
const HEARTBEAT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Repository trait for monthly uptime operations.
#[async_trait]
pub trait UptimeRepository: Send + Sync {
	// Registry
	async fn list_monitors(&self) -> Result<Vec<MonitorRef>>;
	async fn count_monitors(&self) -> Result<u64>;

	// Heartbeats
	async fn insert_heartbeat(&self, heartbeat: &Heartbeat, msg: Option<&str>) -> Result<()>;
	async fn count_heartbeats(&self) -> Result<u64>;

	// Summaries
	/// Recount every month of `monitor_id` from `since` onwards and overwrite
	/// the stored counters, all in one transaction. Returns the months written.
	async fn recompute_months(
		&self,
		monitor_id: MonitorId,
		since: YearMonth,
		now: DateTime<Utc>,
	) -> Result<Vec<MonthTotals>>;

	/// Atomically count one heartbeat into its month, creating the row if
	/// needed, and return the updated row.
	async fn increment_month(
		&self,
		monitor_id: MonitorId,
		year_month: YearMonth,
		successful: bool,
		now: DateTime<Utc>,
	) -> Result<MonthlyUptime>;

	async fn get_monthly_uptime(
		&self,
		monitor_id: MonitorId,
		year_month: YearMonth,
	) -> Result<Option<MonthlyUptime>>;
	async fn list_monthly_uptime(&self, monitor_id: MonitorId) -> Result<Vec<MonthlyUptime>>;

	/// Rows for all monitors of `user_id` from `since` onwards, ordered by
	/// monitor id then month.
	async fn list_monthly_uptime_for_user(
		&self,
		user_id: UserId,
		since: YearMonth,
	) -> Result<Vec<MonthlyUptimeRow>>;

	/// Up to `limit` rows, ordered by monitor id then newest month first.
	async fn sample_monthly_uptime(&self, limit: u32) -> Result<Vec<MonthlyUptimeRow>>;
	async fn count_monthly_uptime(&self) -> Result<u64>;
}

/// SQLite implementation of the uptime repository.
#[derive(Clone)]
pub struct SqliteUptimeRepository {
	pool: SqlitePool,
}

impl SqliteUptimeRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl UptimeRepository for SqliteUptimeRepository {
	#[instrument(skip(self))]
	async fn list_monitors(&self) -> Result<Vec<MonitorRef>> {
		let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM monitor ORDER BY id")
			.fetch_all(&self.pool)
			.await?;

		Ok(rows
			.into_iter()
			.map(|(id, name)| MonitorRef {
				id: MonitorId(id),
				name,
			})
			.collect())
	}

	#[instrument(skip(self))]
	async fn count_monitors(&self) -> Result<u64> {
		count(&self.pool, "SELECT COUNT(*) FROM monitor").await
	}

	#[instrument(skip_all, fields(monitor_id = %heartbeat.monitor_id, status = %heartbeat.status))]
	async fn insert_heartbeat(&self, heartbeat: &Heartbeat, msg: Option<&str>) -> Result<()> {
		sqlx::query("INSERT INTO heartbeat (monitor_id, status, msg, time) VALUES (?, ?, ?, ?)")
			.bind(heartbeat.monitor_id.0)
			.bind(heartbeat.status.code())
			.bind(msg)
			.bind(format_heartbeat_time(heartbeat.time))
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	#[instrument(skip(self))]
	async fn count_heartbeats(&self) -> Result<u64> {
		count(&self.pool, "SELECT COUNT(*) FROM heartbeat").await
	}

	#[instrument(skip_all, fields(monitor_id = %monitor_id, since = %since))]
	async fn recompute_months(
		&self,
		monitor_id: MonitorId,
		since: YearMonth,
		now: DateTime<Utc>,
	) -> Result<Vec<MonthTotals>> {
		// Write lock up front: in WAL mode a deferred read transaction cannot
		// upgrade after another connection commits (SQLITE_BUSY_SNAPSHOT).
		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

		// `time` is compared as text against the first day of `since`, which
		// orders correctly for any "YYYY-MM-DD..." timestamp.
		let rows: Vec<MonthTotalsRow> = sqlx::query_as(
			r#"
			SELECT strftime('%Y-%m', time) AS year_month,
				   COUNT(*) AS total_heartbeats,
				   COALESCE(SUM(CASE WHEN status = 1 THEN 1 ELSE 0 END), 0) AS successful_heartbeats,
				   MIN(time) AS first_heartbeat
			FROM heartbeat
			WHERE monitor_id = ?
			AND time >= ?
			GROUP BY strftime('%Y-%m', time)
			ORDER BY year_month
			"#,
		)
		.bind(monitor_id.0)
		.bind(format!("{since}-01"))
		.fetch_all(&mut *tx)
		.await?;

		let totals = rows
			.into_iter()
			.map(|row| row.into_totals(monitor_id, now))
			.collect::<Result<Vec<_>>>()?;

		let updated_date = format_timestamp(now);
		for month in &totals {
			sqlx::query(
				r#"
				INSERT INTO monthly_uptime (
					monitor_id, year_month, total_heartbeats, successful_heartbeats,
					created_date, updated_date
				)
				VALUES (?, ?, ?, ?, ?, ?)
				ON CONFLICT(monitor_id, year_month) DO UPDATE SET
					total_heartbeats = excluded.total_heartbeats,
					successful_heartbeats = excluded.successful_heartbeats,
					updated_date = excluded.updated_date
				"#,
			)
			.bind(monitor_id.0)
			.bind(month.year_month.to_string())
			.bind(to_i64(month.counters.total_heartbeats)?)
			.bind(to_i64(month.counters.successful_heartbeats)?)
			.bind(format_timestamp(month.first_heartbeat))
			.bind(&updated_date)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;
		Ok(totals)
	}

	#[instrument(skip_all, fields(monitor_id = %monitor_id, year_month = %year_month, successful = successful))]
	async fn increment_month(
		&self,
		monitor_id: MonitorId,
		year_month: YearMonth,
		successful: bool,
		now: DateTime<Utc>,
	) -> Result<MonthlyUptime> {
		let now = format_timestamp(now);
		let row: MonthlyUptimeDbRow = sqlx::query_as(
			r#"
			INSERT INTO monthly_uptime (
				monitor_id, year_month, total_heartbeats, successful_heartbeats,
				created_date, updated_date
			)
			VALUES (?, ?, 1, ?, ?, ?)
			ON CONFLICT(monitor_id, year_month) DO UPDATE SET
				total_heartbeats = total_heartbeats + 1,
				successful_heartbeats = successful_heartbeats + excluded.successful_heartbeats,
				updated_date = excluded.updated_date
			RETURNING monitor_id, year_month, total_heartbeats, successful_heartbeats,
				created_date, updated_date
			"#,
		)
		.bind(monitor_id.0)
		.bind(year_month.to_string())
		.bind(i64::from(successful))
		.bind(&now)
		.bind(&now)
		.fetch_one(&self.pool)
		.await?;

		row.try_into()
	}

	#[instrument(skip_all, fields(monitor_id = %monitor_id, year_month = %year_month))]
	async fn get_monthly_uptime(
		&self,
		monitor_id: MonitorId,
		year_month: YearMonth,
	) -> Result<Option<MonthlyUptime>> {
		let row: Option<MonthlyUptimeDbRow> = sqlx::query_as(
			r#"
			SELECT monitor_id, year_month, total_heartbeats, successful_heartbeats,
				   created_date, updated_date
			FROM monthly_uptime
			WHERE monitor_id = ? AND year_month = ?
			"#,
		)
		.bind(monitor_id.0)
		.bind(year_month.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip_all, fields(monitor_id = %monitor_id))]
	async fn list_monthly_uptime(&self, monitor_id: MonitorId) -> Result<Vec<MonthlyUptime>> {
		let rows: Vec<MonthlyUptimeDbRow> = sqlx::query_as(
			r#"
			SELECT monitor_id, year_month, total_heartbeats, successful_heartbeats,
				   created_date, updated_date
			FROM monthly_uptime
			WHERE monitor_id = ?
			ORDER BY year_month
			"#,
		)
		.bind(monitor_id.0)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip_all, fields(user_id = %user_id, since = %since))]
	async fn list_monthly_uptime_for_user(
		&self,
		user_id: UserId,
		since: YearMonth,
	) -> Result<Vec<MonthlyUptimeRow>> {
		let rows: Vec<JoinedRow> = sqlx::query_as(
			r#"
			SELECT mu.monitor_id, m.name AS monitor_name, mu.year_month,
				   mu.total_heartbeats, mu.successful_heartbeats
			FROM monthly_uptime mu
			JOIN monitor m ON mu.monitor_id = m.id
			WHERE m.user_id = ?
			AND mu.year_month >= ?
			ORDER BY mu.monitor_id, mu.year_month
			"#,
		)
		.bind(user_id.0)
		.bind(since.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn sample_monthly_uptime(&self, limit: u32) -> Result<Vec<MonthlyUptimeRow>> {
		let rows: Vec<JoinedRow> = sqlx::query_as(
			r#"
			SELECT mu.monitor_id, m.name AS monitor_name, mu.year_month,
				   mu.total_heartbeats, mu.successful_heartbeats
			FROM monthly_uptime mu
			JOIN monitor m ON mu.monitor_id = m.id
			ORDER BY mu.monitor_id, mu.year_month DESC
			LIMIT ?
			"#,
		)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn count_monthly_uptime(&self) -> Result<u64> {
		count(&self.pool, "SELECT COUNT(*) FROM monthly_uptime").await
	}
}

async fn count(pool: &SqlitePool, sql: &'static str) -> Result<u64> {
	let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await?;
	from_i64(n, "count")
}

/// Format a heartbeat time the way the monitoring pipeline stores it.
pub fn format_heartbeat_time(time: DateTime<Utc>) -> String {
	time.format(HEARTBEAT_TIME_FORMAT).to_string()
}

fn format_timestamp(time: DateTime<Utc>) -> String {
	time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse either an RFC 3339 timestamp or the pipeline's
/// "YYYY-MM-DD HH:MM:SS.sss" UTC format.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
	if let Ok(time) = DateTime::parse_from_rfc3339(value) {
		return Some(time.with_timezone(&Utc));
	}
	NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
		.ok()
		.map(|naive| naive.and_utc())
}

fn to_i64(value: u64) -> Result<i64> {
	i64::try_from(value)
		.map_err(|_| UptimeServerError::Internal(format!("counter out of range: {value}")))
}

fn from_i64(value: i64, field: &str) -> Result<u64> {
	u64::try_from(value)
		.map_err(|_| UptimeServerError::Internal(format!("negative {field}: {value}")))
}

#[derive(sqlx::FromRow)]
struct MonthTotalsRow {
	year_month: Option<String>,
	total_heartbeats: i64,
	successful_heartbeats: i64,
	first_heartbeat: Option<String>,
}

impl MonthTotalsRow {
	fn into_totals(self, monitor_id: MonitorId, now: DateTime<Utc>) -> Result<MonthTotals> {
		let year_month = self
			.year_month
			.ok_or(UptimeServerError::MalformedHeartbeatTime { monitor_id })?
			.parse::<YearMonth>()?;

		let counters = UptimeCounters::new(
			from_i64(self.total_heartbeats, "total_heartbeats")?,
			from_i64(self.successful_heartbeats, "successful_heartbeats")?,
		)?;

		let first_heartbeat = self
			.first_heartbeat
			.as_deref()
			.and_then(parse_timestamp)
			.unwrap_or(now);

		Ok(MonthTotals {
			year_month,
			counters,
			first_heartbeat,
		})
	}
}

#[derive(sqlx::FromRow)]
struct MonthlyUptimeDbRow {
	monitor_id: i64,
	year_month: String,
	total_heartbeats: i64,
	successful_heartbeats: i64,
	created_date: String,
	updated_date: String,
}

impl TryFrom<MonthlyUptimeDbRow> for MonthlyUptime {
	type Error = UptimeServerError;

	fn try_from(row: MonthlyUptimeDbRow) -> Result<Self> {
		let parse = |value: &str, field: &str| {
			parse_timestamp(value)
				.ok_or_else(|| UptimeServerError::Internal(format!("invalid {field}: {value}")))
		};

		Ok(MonthlyUptime {
			monitor_id: MonitorId(row.monitor_id),
			year_month: row.year_month.parse()?,
			total_heartbeats: from_i64(row.total_heartbeats, "total_heartbeats")?,
			successful_heartbeats: from_i64(row.successful_heartbeats, "successful_heartbeats")?,
			created_date: parse(&row.created_date, "created_date")?,
			updated_date: parse(&row.updated_date, "updated_date")?,
		})
	}
}

#[derive(sqlx::FromRow)]
struct JoinedRow {
	monitor_id: i64,
	monitor_name: String,
	year_month: String,
	total_heartbeats: i64,
	successful_heartbeats: i64,
}

impl TryFrom<JoinedRow> for MonthlyUptimeRow {
	type Error = UptimeServerError;

	fn try_from(row: JoinedRow) -> Result<Self> {
		Ok(MonthlyUptimeRow {
			monitor_id: MonitorId(row.monitor_id),
			monitor_name: row.monitor_name,
			year_month: row.year_month.parse()?,
			counters: UptimeCounters::new(
				from_i64(row.total_heartbeats, "total_heartbeats")?,
				from_i64(row.successful_heartbeats, "successful_heartbeats")?,
			)?,
		})
	}
}
