// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.
//!
//! Errors use the dashboard envelope `{ "ok": false, "msg": "..." }`.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;

use beacon_server_db::DbError;
use beacon_server_jobs::JobError;
use beacon_server_uptime::UptimeServerError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error("Uptime error: {0}")]
	Uptime(#[from] UptimeServerError),

	#[error("Job error: {0}")]
	Job(#[from] JobError),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Not implemented: {0}")]
	NotImplemented(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub ok: bool,
	pub msg: String,
}

impl ServerError {
	fn status(&self) -> StatusCode {
		match self {
			ServerError::NotFound(_) | ServerError::Job(JobError::NotFound(_)) => StatusCode::NOT_FOUND,
			ServerError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		(
			status,
			Json(ErrorResponse {
				ok: false,
				msg: self.to_string(),
			}),
		)
			.into_response()
	}
}
