// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the SCIM filter engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`IDM_SCIM_*`)
//!
//! # Usage
//!
//! ```ignore
//! use idm_scim_config::load_config;
//!
//! let config = load_config()?;
//! let parser = FilterParser::default().max_length(config.filter.max_length);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ScimConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScimConfig {
	pub filter: FilterConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`IDM_SCIM_*`)
/// 2. Config file (`/etc/idm/scim.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ScimConfig, ConfigError> {
	load_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<ScimConfig, ConfigError> {
	let mut merged = ScimConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
///
/// Unlike the system file, an explicit path must exist.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ScimConfig, ConfigError> {
	load_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::required(config_path)),
		Box::new(EnvSource),
	])
}

fn load_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ScimConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ScimConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ScimConfigLayer) -> Result<ScimConfig, ConfigError> {
	let filter = layer.filter.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&filter)?;

	info!(
		max_length = filter.max_length,
		case_exact_default = filter.case_exact_default,
		key_policy = %filter.key_policy,
		schemas = filter.schemas.len(),
		log_level = %logging.level,
		"SCIM configuration loaded"
	);

	Ok(ScimConfig { filter, logging })
}

fn validate_config(filter: &FilterConfig) -> Result<(), ConfigError> {
	if filter.max_length == 0 {
		return Err(ConfigError::Validation(
			"filter.max_length must be greater than zero".to_string(),
		));
	}

	Ok(())
}
