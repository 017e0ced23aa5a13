// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, GamesConfigLayer, HttpConfigLayer, JobsConfigLayer, LoggingConfigLayer,
	UptimeConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/beacon/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: BEACON_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		load_from(&|name| std::env::var(name).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn load_from(lookup: Lookup<'_>) -> Result<ServerConfigLayer, ConfigError> {
	let env = Env(lookup);
	Ok(ServerConfigLayer {
		http: Some(HttpConfigLayer {
			host: env.var("BEACON_SERVER_HOST"),
			port: env.parse("BEACON_SERVER_PORT")?,
		}),
		database: Some(DatabaseConfigLayer {
			url: env.var("BEACON_SERVER_DATABASE_URL"),
		}),
		uptime: Some(UptimeConfigLayer {
			retention_months: env.parse("BEACON_SERVER_UPTIME_RETENTION_MONTHS")?,
			aggregation_interval_secs: env.parse("BEACON_SERVER_UPTIME_AGGREGATION_INTERVAL_SECS")?,
			aggregate_on_startup: env.bool("BEACON_SERVER_UPTIME_AGGREGATE_ON_STARTUP"),
		}),
		jobs: Some(JobsConfigLayer {
			history_retention_days: env.parse("BEACON_SERVER_JOB_HISTORY_RETENTION_DAYS")?,
		}),
		games: Some(GamesConfigLayer {
			catalog_path: env.var("BEACON_SERVER_GAMES_CATALOG_PATH").map(PathBuf::from),
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("BEACON_SERVER_LOG_LEVEL"),
			format: env.parse("BEACON_SERVER_LOG_FORMAT")?,
		}),
	})
}

struct Env<'a>(Lookup<'a>);

impl Env<'_> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid value '{v}'"),
			}),
			None => Ok(None),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sections::LogFormat;
	use std::collections::HashMap;
	use std::io::Write;

	fn env_layer(vars: &[(&str, &str)]) -> Result<ServerConfigLayer, ConfigError> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		load_from(&|name| vars.get(name).cloned())
	}

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.uptime.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/server.toml").load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_reads_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[uptime]\nretention_months = 6\n\n[logging]\nformat = \"json\"\n\n[games]\ncatalog_path = \"/srv/games.json\""
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.uptime.unwrap().retention_months, Some(6));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
		assert_eq!(
			layer.games.unwrap().catalog_path,
			Some(PathBuf::from("/srv/games.json"))
		);
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[uptime\nretention_months = ").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_values_are_parsed() {
		let layer = env_layer(&[
			("BEACON_SERVER_PORT", "8081"),
			("BEACON_SERVER_UPTIME_RETENTION_MONTHS", "3"),
			("BEACON_SERVER_UPTIME_AGGREGATE_ON_STARTUP", "0"),
			("BEACON_SERVER_LOG_FORMAT", "json"),
			("BEACON_SERVER_DATABASE_URL", ""),
		])
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(8081));
		let uptime = layer.uptime.unwrap();
		assert_eq!(uptime.retention_months, Some(3));
		assert_eq!(uptime.aggregate_on_startup, Some(false));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
		assert!(layer.database.unwrap().url.is_none());
	}

	#[test]
	fn test_env_invalid_number_names_the_variable() {
		let err = env_layer(&[("BEACON_SERVER_PORT", "not-a-port")]).unwrap_err();
		assert!(err.to_string().contains("BEACON_SERVER_PORT"));
	}
}
