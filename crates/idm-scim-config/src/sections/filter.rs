// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filter parsing and evaluation settings.

use std::path::PathBuf;

use idm_scim::KeyPolicy;
use serde::{Deserialize, Serialize};

/// Longest filter or path expression accepted by default, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// Filter configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterConfigLayer {
	#[serde(default)]
	pub max_length: Option<usize>,
	#[serde(default)]
	pub case_exact_default: Option<bool>,
	#[serde(default)]
	pub key_policy: Option<KeyPolicy>,
	#[serde(default)]
	pub schemas: Option<Vec<PathBuf>>,
}

impl FilterConfigLayer {
	pub fn merge(&mut self, other: FilterConfigLayer) {
		if other.max_length.is_some() {
			self.max_length = other.max_length;
		}
		if other.case_exact_default.is_some() {
			self.case_exact_default = other.case_exact_default;
		}
		if other.key_policy.is_some() {
			self.key_policy = other.key_policy;
		}
		if other.schemas.is_some() {
			self.schemas = other.schemas;
		}
	}

	pub fn finalize(self) -> FilterConfig {
		FilterConfig {
			max_length: self.max_length.unwrap_or(DEFAULT_MAX_LENGTH),
			case_exact_default: self.case_exact_default.unwrap_or(false),
			key_policy: self.key_policy.unwrap_or_default(),
			schemas: self.schemas.unwrap_or_default(),
		}
	}
}

/// Filter configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
	pub max_length: usize,
	/// caseExact used for attributes with no schema definition.
	pub case_exact_default: bool,
	pub key_policy: KeyPolicy,
	/// Schema documents to register on top of the core schemas.
	pub schemas: Vec<PathBuf>,
}

impl Default for FilterConfig {
	fn default() -> Self {
		FilterConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = FilterConfig::default();
		assert_eq!(config.max_length, 4096);
		assert!(!config.case_exact_default);
		assert_eq!(config.key_policy, KeyPolicy::CaseInsensitive);
		assert!(config.schemas.is_empty());
	}

	#[test]
	fn test_deserialize_partial() {
		let layer: FilterConfigLayer = toml::from_str(
			r#"
key_policy = "case-sensitive"
schemas = ["/etc/idm/schemas/enterprise.json"]
"#,
		)
		.unwrap();
		assert_eq!(layer.key_policy, Some(KeyPolicy::CaseSensitive));
		assert!(layer.max_length.is_none());

		let config = layer.finalize();
		assert_eq!(config.max_length, 4096);
		assert_eq!(
			config.schemas,
			vec![PathBuf::from("/etc/idm/schemas/enterprise.json")]
		);
	}

	#[test]
	fn test_unknown_key_policy_rejected() {
		let result: Result<FilterConfigLayer, _> = toml::from_str(r#"key_policy = "loose""#);
		assert!(result.is_err());
	}

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = FilterConfigLayer {
			max_length: Some(128),
			case_exact_default: Some(true),
			..Default::default()
		};
		base.merge(FilterConfigLayer {
			max_length: Some(256),
			..Default::default()
		});
		assert_eq!(base.max_length, Some(256));
		assert_eq!(base.case_exact_default, Some(true));
	}
}
