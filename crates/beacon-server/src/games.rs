// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only catalog of game server types a game monitor can query.
//!
//! Loaded once at startup and shared through [`crate::AppState`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum GameCatalogError {
	#[error("Failed to read game catalog {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse game catalog {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

/// One supported game type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
	/// Identifiers accepted for this game, the first being canonical.
	pub keys: Vec<String>,
	/// Display name.
	pub pretty: String,
	/// Protocol options and anything else the catalog carries, passed through.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
	Wrapped { games: Vec<Game> },
	Bare(Vec<Game>),
}

#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
	games: Vec<Game>,
}

impl GameCatalog {
	/// Build a catalog, ordered by display name.
	pub fn new(mut games: Vec<Game>) -> Self {
		games.sort_by(|a, b| a.pretty.cmp(&b.pretty));
		Self { games }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	/// Parse either `{ "games": [...] }` or a bare array.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		let games = match serde_json::from_str::<CatalogFile>(json)? {
			CatalogFile::Wrapped { games } | CatalogFile::Bare(games) => games,
		};
		Ok(Self::new(games))
	}

	pub fn load(path: &Path) -> Result<Self, GameCatalogError> {
		let content = std::fs::read_to_string(path).map_err(|e| GameCatalogError::Read {
			path: path.to_path_buf(),
			source: e,
		})?;
		let catalog = Self::from_json(&content).map_err(|e| GameCatalogError::Parse {
			path: path.to_path_buf(),
			source: e,
		})?;
		tracing::info!(path = %path.display(), games = catalog.len(), "Loaded game catalog");
		Ok(catalog)
	}

	pub fn games(&self) -> &[Game] {
		&self.games
	}

	pub fn len(&self) -> usize {
		self.games.len()
	}

	pub fn is_empty(&self) -> bool {
		self.games.is_empty()
	}
}
