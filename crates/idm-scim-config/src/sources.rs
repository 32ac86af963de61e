// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use idm_scim::KeyPolicy;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ScimConfigLayer;
use crate::sections::{FilterConfigLayer, LoggingConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ScimConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<ScimConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ScimConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file that is skipped when absent.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: false,
		}
	}

	/// A file that must exist; loading fails with `FileRead` otherwise.
	pub fn required(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	pub fn system() -> Self {
		Self::new("/etc/idm/scim.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ScimConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ScimConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ScimConfigLayer =
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
/// Convention: IDM_SCIM_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ScimConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_layer(&|name| std::env::var(name).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn load_layer(lookup: Lookup<'_>) -> Result<ScimConfigLayer, ConfigError> {
	Ok(ScimConfigLayer {
		filter: Some(load_filter_from_env(lookup)?),
		logging: Some(load_logging_from_env(lookup)),
	})
}

fn env_var(lookup: Lookup<'_>, name: &str) -> Option<String> {
	lookup(name).filter(|s| !s.is_empty())
}

fn env_bool(lookup: Lookup<'_>, name: &str) -> Option<bool> {
	env_var(lookup, name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_usize(lookup: Lookup<'_>, name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(lookup, name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_filter_from_env(lookup: Lookup<'_>) -> Result<FilterConfigLayer, ConfigError> {
	let key_policy = match env_var(lookup, "IDM_SCIM_FILTER_KEY_POLICY") {
		Some(v) => Some(v.parse::<KeyPolicy>().map_err(|message| ConfigError::InvalidValue {
			key: "IDM_SCIM_FILTER_KEY_POLICY".to_string(),
			message,
		})?),
		None => None,
	};

	let schemas = env_var(lookup, "IDM_SCIM_FILTER_SCHEMAS").map(|s| {
		s.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(PathBuf::from)
			.collect()
	});

	Ok(FilterConfigLayer {
		max_length: env_usize(lookup, "IDM_SCIM_FILTER_MAX_LENGTH")?,
		case_exact_default: env_bool(lookup, "IDM_SCIM_FILTER_CASE_EXACT"),
		key_policy,
		schemas,
	})
}

fn load_logging_from_env(lookup: Lookup<'_>) -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var(lookup, "IDM_SCIM_LOG_LEVEL"),
	}
}
