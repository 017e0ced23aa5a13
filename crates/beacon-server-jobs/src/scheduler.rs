// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
use crate::job::Job;
use crate::types::{JobDefinition, JobRun, JobStatus, JobType, RetryPolicy, TriggerSource};
use beacon_server_db::JobRepository;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

struct RegisteredJob {
	job: Arc<dyn Job>,
	job_type: JobType,
	cancellation_token: CancellationToken,
}

impl RegisteredJob {
	fn definition(&self) -> JobDefinition {
		JobDefinition {
			id: self.job.id().to_string(),
			name: self.job.name().to_string(),
			description: self.job.description().to_string(),
			job_type: self.job_type.as_str().to_string(),
			interval_secs: self.job_type.interval_secs(),
			enabled: true,
		}
	}
}

pub struct JobScheduler {
	jobs: BTreeMap<String, RegisteredJob>,
	repository: Arc<JobRepository>,
	retry_policy: RetryPolicy,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
	pub fn new(repository: Arc<JobRepository>) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: BTreeMap::new(),
			repository,
			retry_policy: RetryPolicy::default(),
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
		self.retry_policy = retry_policy;
		self
	}

	/// Run `job` every `interval`, first run one interval after start.
	pub fn register_periodic(&mut self, job: Arc<dyn Job>, interval: Duration) {
		self.register(
			job,
			JobType::Periodic {
				interval,
				run_on_start: false,
			},
		);
	}

	/// Run `job` once at start and then every `interval`.
	pub fn register_periodic_on_start(&mut self, job: Arc<dyn Job>, interval: Duration) {
		self.register(
			job,
			JobType::Periodic {
				interval,
				run_on_start: true,
			},
		);
	}

	/// Register a job that only runs when triggered.
	pub fn register_one_shot(&mut self, job: Arc<dyn Job>) {
		self.register(job, JobType::OneShot);
	}

	fn register(&mut self, job: Arc<dyn Job>, job_type: JobType) {
		let id = job.id().to_string();
		self.jobs.insert(
			id,
			RegisteredJob {
				job,
				job_type,
				cancellation_token: CancellationToken::new(),
			},
		);
	}

	#[instrument(skip(self))]
	pub async fn start(&self) -> Result<()> {
		let mut handles = self.handles.lock().await;

		for (job_id, registered) in &self.jobs {
			self
				.repository
				.upsert_definition(&registered.definition())
				.await?;

			if let JobType::Periodic {
				interval,
				run_on_start,
			} = registered.job_type
			{
				let job = Arc::clone(&registered.job);
				let repository = Arc::clone(&self.repository);
				let retry_policy = self.retry_policy;
				let mut shutdown_rx = self.shutdown_tx.subscribe();
				let cancellation_token = registered.cancellation_token.clone();
				let job_id = job_id.clone();

				let handle = tokio::spawn(async move {
					if run_on_start && !cancellation_token.is_cancelled() {
						let _ = run_job_with_retry(
							&job,
							&repository,
							&retry_policy,
							TriggerSource::Startup,
							&cancellation_token,
						)
						.await;
					}

					loop {
						tokio::select! {
							_ = tokio::time::sleep(interval) => {
								if cancellation_token.is_cancelled() {
									continue;
								}
								let _ = run_job_with_retry(
									&job,
									&repository,
									&retry_policy,
									TriggerSource::Schedule,
									&cancellation_token,
								).await;
							}
							_ = shutdown_rx.recv() => {
								info!(job_id = %job_id, "Shutting down periodic job");
								break;
							}
						}
					}
				});

				handles.push(handle);
			}
		}

		info!(
			job_count = self.jobs.len(),
			periodic_count = handles.len(),
			"Job scheduler started"
		);
		Ok(())
	}

	/// Run a registered job now and wait for it to finish.
	///
	/// Clears a previous [`JobScheduler::cancel_job`] for this job.
	#[instrument(skip(self))]
	pub async fn trigger_job(&self, job_id: &str, triggered_by: TriggerSource) -> Result<String> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		self
			.repository
			.upsert_definition(&registered.definition())
			.await?;
		registered.cancellation_token.reset();

		run_job_with_retry(
			&registered.job,
			&self.repository,
			&self.retry_policy,
			triggered_by,
			&registered.cancellation_token,
		)
		.await
	}

	/// Ask a job to stop. Periodic runs are skipped until it is triggered again.
	#[instrument(skip(self))]
	pub async fn cancel_job(&self, job_id: &str) -> Result<()> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		registered.cancellation_token.cancel();
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		for registered in self.jobs.values() {
			registered.cancellation_token.cancel();
		}
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("Job scheduler shut down");
	}

	pub fn job_ids(&self) -> Vec<String> {
		self.jobs.keys().cloned().collect()
	}

	#[instrument(skip(self))]
	pub async fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let registered = self.jobs.get(job_id)?;

		let last_run = match self.repository.get_last_run(job_id).await {
			Ok(run) => run,
			Err(e) => {
				warn!(job_id = %job_id, error = %e, "Failed to load last job run");
				None
			}
		};
		let consecutive_failures = self
			.repository
			.count_consecutive_failures(job_id)
			.await
			.unwrap_or(0);

		let status = HealthState::from_last_run(last_run.as_ref(), consecutive_failures);

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: registered.job.name().to_string(),
			description: registered.job.description().to_string(),
			status,
			last_run: last_run.map(LastRunInfo::from),
			consecutive_failures,
		})
	}

	#[instrument(skip(self))]
	pub async fn health_status(&self) -> JobsHealthStatus {
		let mut jobs = Vec::with_capacity(self.jobs.len());

		for job_id in self.jobs.keys() {
			if let Some(status) = self.job_status(job_id).await {
				jobs.push(status);
			}
		}

		let status = jobs
			.iter()
			.map(|job| job.status)
			.max()
			.unwrap_or(HealthState::Healthy);

		JobsHealthStatus { status, jobs }
	}
}

async fn run_job_with_retry(
	job: &Arc<dyn Job>,
	repository: &Arc<JobRepository>,
	retry_policy: &RetryPolicy,
	triggered_by: TriggerSource,
	cancellation_token: &CancellationToken,
) -> Result<String> {
	let mut retry_count = 0u32;
	let run_id = uuid::Uuid::new_v4().to_string();

	repository
		.record_run_start(&JobRun {
			id: run_id.clone(),
			job_id: job.id().to_string(),
			status: JobStatus::Running,
			started_at: Utc::now(),
			completed_at: None,
			duration_ms: None,
			error_message: None,
			retry_count,
			triggered_by,
			metadata: None,
		})
		.await?;

	loop {
		let ctx = JobContext {
			run_id: run_id.clone(),
			triggered_by: if retry_count > 0 {
				TriggerSource::Retry
			} else {
				triggered_by
			},
			cancellation_token: cancellation_token.clone(),
		};

		match job.run(&ctx).await {
			Ok(output) => {
				repository
					.record_run_complete(&run_id, JobStatus::Succeeded, None, output.metadata)
					.await?;
				info!(
					job_id = %job.id(),
					run_id = %run_id,
					message = %output.message,
					"Job completed successfully"
				);
				return Ok(run_id);
			}
			Err(JobError::Cancelled) => {
				repository
					.record_run_complete(&run_id, JobStatus::Cancelled, None, None)
					.await?;
				info!(job_id = %job.id(), run_id = %run_id, "Job cancelled");
				return Err(JobError::Cancelled);
			}
			Err(JobError::Failed { message, retryable }) => {
				if retryable && retry_count < retry_policy.max_retries {
					retry_count += 1;
					let delay = retry_policy.delay(retry_count);
					warn!(
						job_id = %job.id(),
						run_id = %run_id,
						retry_count,
						delay_ms = delay.as_millis() as u64,
						error = %message,
						"Job failed, retrying"
					);
					tokio::time::sleep(delay).await;
					continue;
				}

				repository
					.record_run_complete(&run_id, JobStatus::Failed, Some(message.clone()), None)
					.await?;
				warn!(job_id = %job.id(), run_id = %run_id, error = %message, "Job failed");
				return Err(JobError::Failed { message, retryable });
			}
			Err(e) => {
				let message = e.to_string();
				repository
					.record_run_complete(&run_id, JobStatus::Failed, Some(message.clone()), None)
					.await?;
				warn!(job_id = %job.id(), run_id = %run_id, error = %message, "Job failed with error");
				return Err(e);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::JobOutput;
	use async_trait::async_trait;
	use beacon_server_db::testing::create_test_pool;
	use std::sync::atomic::{AtomicU32, Ordering};

	/// Fails `failures` times with the given retryability, then succeeds.
	struct CountingJob {
		id: String,
		failures: u32,
		retryable: bool,
		attempts: AtomicU32,
	}

	impl CountingJob {
		fn new(id: &str, failures: u32, retryable: bool) -> Self {
			Self {
				id: id.to_string(),
				failures,
				retryable,
				attempts: AtomicU32::new(0),
			}
		}

		fn attempts(&self) -> u32 {
			self.attempts.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl Job for CountingJob {
		fn id(&self) -> &str {
			&self.id
		}

		fn name(&self) -> &str {
			"Counting job"
		}

		fn description(&self) -> &str {
			"Fails a fixed number of times"
		}

		async fn run(&self, ctx: &JobContext) -> std::result::Result<JobOutput, JobError> {
			if ctx.cancellation_token.is_cancelled() {
				return Err(JobError::Cancelled);
			}
			let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
			if attempt < self.failures {
				return Err(JobError::Failed {
					message: format!("attempt {attempt} failed"),
					retryable: self.retryable,
				});
			}
			Ok(JobOutput {
				message: "done".to_string(),
				metadata: Some(serde_json::json!({ "attempts": attempt + 1 })),
			})
		}
	}

	fn instant_retries() -> RetryPolicy {
		RetryPolicy {
			base_delay: Duration::ZERO,
			max_delay: Duration::ZERO,
			..RetryPolicy::default()
		}
	}

	async fn scheduler() -> (JobScheduler, Arc<JobRepository>) {
		let pool = create_test_pool().await;
		let repository = Arc::new(JobRepository::new(pool));
		let scheduler = JobScheduler::new(Arc::clone(&repository)).with_retry_policy(instant_retries());
		(scheduler, repository)
	}

	#[test]
	fn test_backoff_doubles_and_caps() {
		let policy = RetryPolicy::default();
		assert_eq!(policy.delay(1), Duration::from_secs(1));
		assert_eq!(policy.delay(2), Duration::from_secs(2));
		assert_eq!(policy.delay(3), Duration::from_secs(4));
		assert_eq!(policy.delay(10), Duration::from_secs(60));
		assert_eq!(policy.delay(100), Duration::from_secs(60));
	}

	#[tokio::test]
	async fn test_register_jobs() {
		let (mut scheduler, _repo) = scheduler().await;
		scheduler.register_periodic(
			Arc::new(CountingJob::new("periodic", 0, false)),
			Duration::from_secs(60),
		);
		scheduler.register_one_shot(Arc::new(CountingJob::new("once", 0, false)));

		assert_eq!(scheduler.job_ids(), vec!["once".to_string(), "periodic".to_string()]);
	}

	#[tokio::test]
	async fn test_trigger_nonexistent_job_returns_not_found() {
		let (scheduler, _repo) = scheduler().await;
		match scheduler.trigger_job("missing", TriggerSource::Manual).await {
			Err(JobError::NotFound(id)) => assert_eq!(id, "missing"),
			other => panic!("expected NotFound, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_retryable_failure_is_retried_until_success() {
		let (mut scheduler, repo) = scheduler().await;
		let job = Arc::new(CountingJob::new("flaky", 2, true));
		scheduler.register_one_shot(job.clone());

		let run_id = scheduler
			.trigger_job("flaky", TriggerSource::Manual)
			.await
			.unwrap();

		assert_eq!(job.attempts(), 3);
		let run = repo.get_run(&run_id).await.unwrap().unwrap();
		assert_eq!(run.status, JobStatus::Succeeded);
		assert_eq!(run.triggered_by, TriggerSource::Manual);
		assert_eq!(run.metadata, Some(serde_json::json!({ "attempts": 3 })));
	}

	#[tokio::test]
	async fn test_retries_are_bounded() {
		let (mut scheduler, repo) = scheduler().await;
		let job = Arc::new(CountingJob::new("broken", u32::MAX, true));
		scheduler.register_one_shot(job.clone());

		let result = scheduler.trigger_job("broken", TriggerSource::Manual).await;
		assert!(matches!(result, Err(JobError::Failed { .. })));
		assert_eq!(job.attempts(), 1 + RetryPolicy::default().max_retries);

		let last = repo.get_last_run("broken").await.unwrap().unwrap();
		assert_eq!(last.status, JobStatus::Failed);
	}

	#[tokio::test]
	async fn test_non_retryable_failure_runs_once_and_degrades_health() {
		let (mut scheduler, _repo) = scheduler().await;
		let job = Arc::new(CountingJob::new("fragile", 1, false));
		scheduler.register_one_shot(job.clone());

		assert!(scheduler.trigger_job("fragile", TriggerSource::Manual).await.is_err());
		assert_eq!(job.attempts(), 1);

		let health = scheduler.health_status().await;
		assert_eq!(health.status, HealthState::Degraded);
		assert_eq!(health.jobs[0].consecutive_failures, 1);

		scheduler
			.trigger_job("fragile", TriggerSource::Manual)
			.await
			.unwrap();
		assert_eq!(scheduler.health_status().await.status, HealthState::Healthy);
	}

	#[tokio::test]
	async fn test_periodic_job_runs_on_start_and_shuts_down() {
		let (mut scheduler, repo) = scheduler().await;
		let job = Arc::new(CountingJob::new("eager", 0, false));
		scheduler.register_periodic_on_start(job.clone(), Duration::from_secs(3600));
		scheduler.start().await.unwrap();

		for _ in 0..100 {
			if job.attempts() > 0 {
				break;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		scheduler.shutdown().await;

		assert_eq!(job.attempts(), 1);
		let last = repo.get_last_run("eager").await.unwrap().unwrap();
		assert_eq!(last.triggered_by, TriggerSource::Startup);
		assert_eq!(last.status, JobStatus::Succeeded);
	}

	#[tokio::test]
	async fn test_manual_trigger_clears_cancellation() {
		let (mut scheduler, repo) = scheduler().await;
		scheduler.register_one_shot(Arc::new(CountingJob::new("cancel-me", 0, false)));
		scheduler.cancel_job("cancel-me").await.unwrap();

		let run_id = scheduler
			.trigger_job("cancel-me", TriggerSource::Manual)
			.await
			.unwrap();
		let run = repo.get_run(&run_id).await.unwrap().unwrap();
		assert_eq!(run.status, JobStatus::Succeeded);
	}
}
