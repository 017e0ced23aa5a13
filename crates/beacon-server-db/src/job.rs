// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for background job definitions and run history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DbError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Running,
	Succeeded,
	Failed,
	Cancelled,
}

impl JobStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobStatus::Running => "running",
			JobStatus::Succeeded => "succeeded",
			JobStatus::Failed => "failed",
			JobStatus::Cancelled => "cancelled",
		}
	}
}

impl std::str::FromStr for JobStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"running" => Ok(JobStatus::Running),
			"succeeded" => Ok(JobStatus::Succeeded),
			"failed" => Ok(JobStatus::Failed),
			"cancelled" => Ok(JobStatus::Cancelled),
			_ => Err(format!("unknown job status: {s}")),
		}
	}
}

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
	Schedule,
	Startup,
	Manual,
	Retry,
}

impl TriggerSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			TriggerSource::Schedule => "schedule",
			TriggerSource::Startup => "startup",
			TriggerSource::Manual => "manual",
			TriggerSource::Retry => "retry",
		}
	}
}

impl std::str::FromStr for TriggerSource {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"schedule" => Ok(TriggerSource::Schedule),
			"startup" => Ok(TriggerSource::Startup),
			"manual" => Ok(TriggerSource::Manual),
			"retry" => Ok(TriggerSource::Retry),
			_ => Err(format!("unknown trigger source: {s}")),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
	pub id: String,
	pub name: String,
	pub description: String,
	pub job_type: String,
	pub interval_secs: Option<i64>,
	pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
	pub id: String,
	pub job_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub duration_ms: Option<i64>,
	pub error_message: Option<String>,
	pub retry_count: u32,
	pub triggered_by: TriggerSource,
	pub metadata: Option<serde_json::Value>,
}

#[derive(sqlx::FromRow)]
struct JobRunRow {
	id: String,
	job_id: String,
	status: String,
	started_at: DateTime<Utc>,
	completed_at: Option<DateTime<Utc>>,
	duration_ms: Option<i64>,
	error_message: Option<String>,
	retry_count: i64,
	triggered_by: String,
	metadata: Option<String>,
}

impl TryFrom<JobRunRow> for JobRun {
	type Error = DbError;

	fn try_from(row: JobRunRow) -> Result<Self> {
		Ok(JobRun {
			id: row.id,
			job_id: row.job_id,
			status: row.status.parse().map_err(DbError::Internal)?,
			started_at: row.started_at,
			completed_at: row.completed_at,
			duration_ms: row.duration_ms,
			error_message: row.error_message,
			retry_count: u32::try_from(row.retry_count)
				.map_err(|e| DbError::Internal(format!("invalid retry_count: {e}")))?,
			triggered_by: row.triggered_by.parse().map_err(DbError::Internal)?,
			metadata: row
				.metadata
				.as_deref()
				.map(serde_json::from_str)
				.transpose()?,
		})
	}
}

const RUN_COLUMNS: &str = "id, job_id, status, started_at, completed_at, duration_ms, error_message, retry_count, triggered_by, metadata";

#[derive(Clone)]
pub struct JobRepository {
	pool: SqlitePool,
}

impl JobRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, def), fields(job_id = %def.id))]
	pub async fn upsert_definition(&self, def: &JobDefinition) -> Result<()> {
		let now = Utc::now();
		sqlx::query(
			r#"
			INSERT INTO job_definitions (id, name, description, job_type, interval_secs, enabled, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET
				name = excluded.name,
				description = excluded.description,
				job_type = excluded.job_type,
				interval_secs = excluded.interval_secs,
				enabled = excluded.enabled,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(&def.id)
		.bind(&def.name)
		.bind(&def.description)
		.bind(&def.job_type)
		.bind(def.interval_secs)
		.bind(def.enabled)
		.bind(now)
		.bind(now)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_definitions(&self) -> Result<Vec<JobDefinition>> {
		let rows: Vec<(String, String, String, String, Option<i64>, bool)> = sqlx::query_as(
			"SELECT id, name, description, job_type, interval_secs, enabled FROM job_definitions ORDER BY name",
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(
				|(id, name, description, job_type, interval_secs, enabled)| JobDefinition {
					id,
					name,
					description,
					job_type,
					interval_secs,
					enabled,
				},
			)
			.collect())
	}

	#[tracing::instrument(skip(self, run), fields(run_id = %run.id, job_id = %run.job_id))]
	pub async fn record_run_start(&self, run: &JobRun) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO job_runs (id, job_id, status, started_at, retry_count, triggered_by)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&run.id)
		.bind(&run.job_id)
		.bind(run.status.as_str())
		.bind(run.started_at)
		.bind(i64::from(run.retry_count))
		.bind(run.triggered_by.as_str())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, metadata))]
	pub async fn record_run_complete(
		&self,
		run_id: &str,
		status: JobStatus,
		error: Option<String>,
		metadata: Option<serde_json::Value>,
	) -> Result<()> {
		let now = Utc::now();
		let metadata = metadata.map(|m| m.to_string());

		let result = sqlx::query(
			r#"
			UPDATE job_runs
			SET status = ?,
				completed_at = ?,
				duration_ms = CAST((julianday(?) - julianday(started_at)) * 86400000 AS INTEGER),
				error_message = ?,
				metadata = ?
			WHERE id = ?
			"#,
		)
		.bind(status.as_str())
		.bind(now)
		.bind(now)
		.bind(error)
		.bind(metadata)
		.bind(run_id)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("job run {run_id}")));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_run(&self, run_id: &str) -> Result<Option<JobRun>> {
		let row: Option<JobRunRow> =
			sqlx::query_as(&format!("SELECT {RUN_COLUMNS} FROM job_runs WHERE id = ?"))
				.bind(run_id)
				.fetch_optional(&self.pool)
				.await?;

		row.map(JobRun::try_from).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_runs(&self, job_id: &str, limit: u32) -> Result<Vec<JobRun>> {
		let rows: Vec<JobRunRow> = sqlx::query_as(&format!(
			"SELECT {RUN_COLUMNS} FROM job_runs WHERE job_id = ? ORDER BY started_at DESC LIMIT ?"
		))
		.bind(job_id)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(JobRun::try_from).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>> {
		Ok(self.list_runs(job_id, 1).await?.into_iter().next())
	}

	/// Number of failed runs since the most recent run that did not fail.
	#[tracing::instrument(skip(self))]
	pub async fn count_consecutive_failures(&self, job_id: &str) -> Result<u32> {
		let (count,): (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*)
			FROM job_runs
			WHERE job_id = ?1
				AND status = 'failed'
				AND started_at > COALESCE(
					(SELECT MAX(started_at) FROM job_runs WHERE job_id = ?1 AND status != 'failed'),
					''
				)
			"#,
		)
		.bind(job_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(count as u32)
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_old_runs(&self, before: DateTime<Utc>) -> Result<u64> {
		let result = sqlx::query("DELETE FROM job_runs WHERE completed_at < ?")
			.bind(before)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}

	#[tracing::instrument(skip(self))]
	pub async fn cleanup_old_runs(&self, retention_days: u32) -> Result<u64> {
		let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
		self.delete_old_runs(cutoff).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	fn definition(id: &str, name: &str) -> JobDefinition {
		JobDefinition {
			id: id.to_string(),
			name: name.to_string(),
			description: "Test description".to_string(),
			job_type: "periodic".to_string(),
			interval_secs: Some(60),
			enabled: true,
		}
	}

	fn run(id: &str, job_id: &str, started_at: DateTime<Utc>) -> JobRun {
		JobRun {
			id: id.to_string(),
			job_id: job_id.to_string(),
			status: JobStatus::Running,
			started_at,
			completed_at: None,
			duration_ms: None,
			error_message: None,
			retry_count: 0,
			triggered_by: TriggerSource::Schedule,
			metadata: None,
		}
	}

	async fn repo_with_job() -> (JobRepository, SqlitePool) {
		let pool = create_test_pool().await;
		let repo = JobRepository::new(pool.clone());
		repo
			.upsert_definition(&definition("job-1", "Test Job"))
			.await
			.unwrap();
		(repo, pool)
	}

	#[tokio::test]
	async fn test_upsert_definition_updates_in_place() {
		let (repo, _pool) = repo_with_job().await;

		let updated = JobDefinition {
			name: "Renamed".to_string(),
			enabled: false,
			..definition("job-1", "Test Job")
		};
		repo.upsert_definition(&updated).await.unwrap();

		let defs = repo.list_definitions().await.unwrap();
		assert_eq!(defs.len(), 1);
		assert_eq!(defs[0].name, "Renamed");
		assert!(!defs[0].enabled);
	}

	#[tokio::test]
	async fn test_corrupt_run_metadata_is_a_serialization_error() {
		let (repo, pool) = repo_with_job().await;
		repo
			.record_run_start(&run("run-1", "job-1", Utc::now()))
			.await
			.unwrap();
		sqlx::query("UPDATE job_runs SET metadata = '{not json' WHERE id = 'run-1'")
			.execute(&pool)
			.await
			.unwrap();

		let err = repo.get_run("run-1").await.unwrap_err();
		assert!(matches!(err, DbError::Serialization(_)));
	}

	#[tokio::test]
	async fn test_record_run_lifecycle() {
		let (repo, _pool) = repo_with_job().await;

		repo
			.record_run_start(&run("run-1", "job-1", Utc::now()))
			.await
			.unwrap();
		let started = repo.get_run("run-1").await.unwrap().unwrap();
		assert_eq!(started.status, JobStatus::Running);
		assert!(started.completed_at.is_none());

		repo
			.record_run_complete(
				"run-1",
				JobStatus::Succeeded,
				None,
				Some(serde_json::json!({ "monitors_processed": 2 })),
			)
			.await
			.unwrap();

		let completed = repo.get_run("run-1").await.unwrap().unwrap();
		assert_eq!(completed.status, JobStatus::Succeeded);
		assert!(completed.completed_at.is_some());
		assert_eq!(
			completed.metadata,
			Some(serde_json::json!({ "monitors_processed": 2 }))
		);
	}

	#[tokio::test]
	async fn test_record_run_complete_unknown_run() {
		let (repo, _pool) = repo_with_job().await;
		let result = repo
			.record_run_complete("missing", JobStatus::Failed, None, None)
			.await;
		assert!(matches!(result, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn test_get_last_run_picks_latest() {
		let (repo, _pool) = repo_with_job().await;
		assert!(repo.get_last_run("job-1").await.unwrap().is_none());

		repo
			.record_run_start(&run("run-1", "job-1", Utc::now() - chrono::Duration::hours(1)))
			.await
			.unwrap();
		repo
			.record_run_start(&run("run-2", "job-1", Utc::now()))
			.await
			.unwrap();

		assert_eq!(repo.get_last_run("job-1").await.unwrap().unwrap().id, "run-2");
	}

	#[tokio::test]
	async fn test_count_consecutive_failures() {
		let (repo, _pool) = repo_with_job().await;
		assert_eq!(repo.count_consecutive_failures("job-1").await.unwrap(), 0);

		let base = Utc::now() - chrono::Duration::minutes(10);
		let outcomes = [
			JobStatus::Failed,
			JobStatus::Succeeded,
			JobStatus::Failed,
			JobStatus::Failed,
		];
		for (i, status) in outcomes.into_iter().enumerate() {
			let id = format!("run-{i}");
			repo
				.record_run_start(&run(&id, "job-1", base + chrono::Duration::minutes(i as i64)))
				.await
				.unwrap();
			repo.record_run_complete(&id, status, None, None).await.unwrap();
		}

		assert_eq!(repo.count_consecutive_failures("job-1").await.unwrap(), 2);
	}

	#[tokio::test]
	async fn test_cleanup_old_runs() {
		let (repo, pool) = repo_with_job().await;

		for (id, age_days) in [("old-run", 10), ("new-run", 0)] {
			repo
				.record_run_start(&run(id, "job-1", Utc::now() - chrono::Duration::days(age_days)))
				.await
				.unwrap();
			repo
				.record_run_complete(id, JobStatus::Succeeded, None, None)
				.await
				.unwrap();
			sqlx::query("UPDATE job_runs SET completed_at = ? WHERE id = ?")
				.bind(Utc::now() - chrono::Duration::days(age_days))
				.bind(id)
				.execute(&pool)
				.await
				.unwrap();
		}

		assert_eq!(repo.cleanup_old_runs(7).await.unwrap(), 1);
		assert!(repo.get_run("old-run").await.unwrap().is_none());
		assert!(repo.get_run("new-run").await.unwrap().is_some());
	}
}
