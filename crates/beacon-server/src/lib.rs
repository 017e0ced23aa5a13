// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Beacon server: monthly uptime aggregation for an uptime monitor.
//!
//! Wires the uptime crates into an HTTP API, background jobs and the
//! heartbeat ingestion hook.

pub mod api;
pub mod backfill;
pub mod error;
pub mod games;
pub mod ingest;
pub mod inspect;
pub mod jobs;
pub mod routes;
pub mod version;

pub use api::{create_app_state, create_router, AppState};
pub use beacon_server_config::ServerConfig;
pub use error::ServerError;
pub use games::{Game, GameCatalog};
pub use ingest::HeartbeatIngestor;
