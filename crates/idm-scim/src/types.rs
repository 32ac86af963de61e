// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

pub const SCHEMA_CORE_USER: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const SCHEMA_ENTERPRISE_USER: &str =
	"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
pub const SCHEMA_CORE_GROUP: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

/// Prefix shared by the core resource schemas, whose attributes live at the
/// top level of a resource.
pub const SCHEMA_CORE_PREFIX: &str = "urn:ietf:params:scim:schemas:core:";

pub const SCHEMA_LIST_RESPONSE: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";
pub const SCHEMA_PATCH_OP: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";
pub const SCHEMA_ERROR: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
	pub schemas: Vec<String>,
	pub total_results: usize,
	#[serde(default)]
	pub items_per_page: usize,
	#[serde(default = "default_start_index")]
	pub start_index: usize,
	#[serde(rename = "Resources", default = "Vec::new")]
	pub resources: Vec<T>,
}

fn default_start_index() -> usize {
	1
}

impl<T> ListResponse<T> {
	pub fn new(resources: Vec<T>, total_results: usize, start_index: usize, items_per_page: usize) -> Self {
		Self {
			schemas: vec![SCHEMA_LIST_RESPONSE.to_string()],
			total_results,
			items_per_page,
			start_index,
			resources,
		}
	}

	/// A single page holding every result.
	pub fn from_resources(resources: Vec<T>) -> Self {
		let total = resources.len();
		Self::new(resources, total, 1, total)
	}
}
