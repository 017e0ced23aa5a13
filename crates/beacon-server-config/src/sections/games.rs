// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Game catalog location.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GamesConfigLayer {
	pub catalog_path: Option<PathBuf>,
}

impl GamesConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.catalog_path.is_some() {
			self.catalog_path = other.catalog_path;
		}
	}

	pub fn finalize(self) -> GamesConfig {
		GamesConfig {
			catalog_path: self.catalog_path,
		}
	}
}

/// `catalog_path` of `None` serves an empty game list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GamesConfig {
	pub catalog_path: Option<PathBuf>,
}
