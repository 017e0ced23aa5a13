// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{api::AppState, games::Game};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameListResponse {
	pub ok: bool,
	pub game_list: Vec<Game>,
}

/// GET /api/games
pub async fn list_games(State(state): State<AppState>) -> Json<GameListResponse> {
	Json(GameListResponse {
		ok: true,
		game_list: state.games.games().to_vec(),
	})
}
