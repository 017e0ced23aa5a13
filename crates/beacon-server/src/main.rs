// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Beacon server binary.

use beacon_server::{
	backfill::run_backfill,
	create_app_state, create_router,
	inspect::inspect_monthly_uptime,
	jobs::{register_monthly_uptime_job, JobHistoryCleanupJob, MonthlyUptimeJob},
	version, GameCatalog,
};
use beacon_server_config::{LogFormat, LoggingConfig, ServerConfig};
use beacon_server_db::{JobRepository, SqlitePool};
use beacon_server_jobs::JobScheduler;
use beacon_server_uptime::{Aggregator, SqliteUptimeRepository};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Beacon server - monthly uptime aggregation and dashboard API.
#[derive(Parser, Debug)]
#[command(name = "beacon-server", about = "Beacon monthly uptime server", version)]
struct Args {
	/// Config file to use instead of /etc/beacon/server.toml
	#[arg(long, global = true, env = "BEACON_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server and background jobs (default)
	Serve,
	/// Build monthly uptime summaries from existing heartbeats and exit
	Backfill,
	/// Show the monthly_uptime schema and row count
	Inspect,
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => beacon_server_config::load_config_with_file(path)?,
		None => beacon_server_config::load_config()?,
	};

	init_tracing(&config.logging);

	let pool = beacon_server_db::create_pool(&config.database.url).await?;
	beacon_server_db::run_migrations(&pool).await?;

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => serve(pool, config).await,
		Command::Backfill => backfill(pool, &config).await,
		Command::Inspect => inspect(pool).await,
		Command::Version => Ok(()),
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

fn load_games(config: &ServerConfig) -> GameCatalog {
	let Some(path) = &config.games.catalog_path else {
		return GameCatalog::empty();
	};
	match GameCatalog::load(path) {
		Ok(catalog) => catalog,
		Err(e) => {
			tracing::warn!(error = %e, "Continuing with an empty game catalog");
			GameCatalog::empty()
		}
	}
}

async fn serve(pool: SqlitePool, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting beacon-server"
	);

	let mut state = create_app_state(pool.clone(), &config, load_games(&config));

	let job_repo = Arc::new(JobRepository::new(pool.clone()));
	let mut scheduler = JobScheduler::new(Arc::clone(&job_repo));

	// Register monthly uptime aggregation
	{
		let aggregator = Arc::new(Aggregator::with_retention(
			Arc::new(SqliteUptimeRepository::new(pool.clone())),
			config.uptime.retention_months,
		));
		let job = Arc::new(MonthlyUptimeJob::new(aggregator));
		register_monthly_uptime_job(&mut scheduler, job, &config.uptime);

		tracing::info!(
			interval_secs = config.uptime.aggregation_interval_secs,
			retention_months = config.uptime.retention_months,
			on_startup = config.uptime.aggregate_on_startup,
			"Registered monthly uptime job"
		);
	}

	// Register job history cleanup job
	scheduler.register_periodic(
		Arc::new(JobHistoryCleanupJob::new(
			Arc::clone(&job_repo),
			config.jobs.history_retention_days,
		)),
		Duration::from_secs(24 * 60 * 60),
	);

	let scheduler = Arc::new(scheduler);
	state.job_scheduler = Some(Arc::clone(&scheduler));
	state.job_repository = Some(Arc::clone(&job_repo));

	if let Err(e) = scheduler.start().await {
		tracing::error!(error = %e, "Failed to start job scheduler");
	}

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	scheduler.shutdown().await;
	tracing::info!("Server shutdown complete");
	Ok(())
}

async fn backfill(pool: SqlitePool, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
	let repo = Arc::new(SqliteUptimeRepository::new(pool));
	let aggregator = Aggregator::with_retention(repo.clone(), config.uptime.retention_months);

	let summary = run_backfill(repo.as_ref(), &aggregator, chrono::Utc::now()).await?;
	print!("{summary}");
	Ok(())
}

async fn inspect(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
	match inspect_monthly_uptime(&pool).await? {
		Some(report) => {
			print!("{report}");
			Ok(())
		}
		None => {
			eprintln!("monthly_uptime table does not exist");
			std::process::exit(1);
		}
	}
}
