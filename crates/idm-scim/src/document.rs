// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Member lookup in JSON resources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::SCHEMA_CORE_PREFIX;

/// How attribute names are matched against the keys of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
	#[default]
	CaseInsensitive,
	CaseSensitive,
}

impl KeyPolicy {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::CaseInsensitive => "case-insensitive",
			Self::CaseSensitive => "case-sensitive",
		}
	}

	pub fn matches(&self, key: &str, name: &str) -> bool {
		match self {
			Self::CaseInsensitive => key.eq_ignore_ascii_case(name),
			Self::CaseSensitive => key == name,
		}
	}
}

impl fmt::Display for KeyPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for KeyPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"case-insensitive" | "insensitive" => Ok(Self::CaseInsensitive),
			"case-sensitive" | "sensitive" => Ok(Self::CaseSensitive),
			other => Err(format!("unknown key policy '{other}'")),
		}
	}
}

/// The key under which `name` is stored in `object`. An exact match wins
/// over a case-insensitive one.
pub fn member_key<'m>(object: &'m Map<String, Value>, name: &str, policy: KeyPolicy) -> Option<&'m str> {
	if let Some((key, _)) = object.get_key_value(name) {
		return Some(key.as_str());
	}
	match policy {
		KeyPolicy::CaseSensitive => None,
		KeyPolicy::CaseInsensitive => object
			.keys()
			.find(|key| policy.matches(key, name))
			.map(String::as_str),
	}
}

pub fn member<'m>(object: &'m Map<String, Value>, name: &str, policy: KeyPolicy) -> Option<&'m Value> {
	member_key(object, name, policy).and_then(|key| object.get(key))
}

pub fn member_mut<'m>(
	object: &'m mut Map<String, Value>,
	name: &str,
	policy: KeyPolicy,
) -> Option<&'m mut Value> {
	let key = member_key(object, name, policy)?.to_string();
	object.get_mut(&key)
}

/// Where the attributes of a schema namespace live within a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
	/// Attributes are members of the resource itself.
	TopLevel,
	/// Attributes are members of the object stored under this key.
	Member(String),
	/// The resource carries no attributes of this extension.
	Absent(String),
}

impl NamespaceScope {
	/// Extension members take precedence; core schemas otherwise address the
	/// top level.
	pub fn of(namespace: Option<&str>, object: &Map<String, Value>, policy: KeyPolicy) -> Self {
		let Some(namespace) = namespace else {
			return Self::TopLevel;
		};
		if let Some(key) = member_key(object, namespace, policy) {
			return Self::Member(key.to_string());
		}
		let is_core = namespace
			.get(..SCHEMA_CORE_PREFIX.len())
			.is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEMA_CORE_PREFIX));
		if is_core {
			Self::TopLevel
		} else {
			Self::Absent(namespace.to_string())
		}
	}

	/// The value whose members are the namespace's attributes.
	pub fn select<'v>(&self, document: &'v Value) -> Option<&'v Value> {
		match self {
			Self::TopLevel => Some(document),
			Self::Member(key) => document.get(key.as_str()),
			Self::Absent(_) => None,
		}
	}

	/// Like [`NamespaceScope::select`]; an absent extension is created as an
	/// empty object when `create` is set.
	pub fn select_mut<'v>(&self, document: &'v mut Value, create: bool) -> Option<&'v mut Value> {
		match self {
			Self::TopLevel => Some(document),
			Self::Member(key) => document.get_mut(key.as_str()),
			Self::Absent(namespace) if create => {
				let object = document.as_object_mut()?;
				Some(
					object
						.entry(namespace.clone())
						.or_insert_with(|| Value::Object(Map::new())),
				)
			}
			Self::Absent(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn object(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			_ => panic!("not an object"),
		}
	}

	#[test]
	fn test_member_lookup_by_policy() {
		let map = object(json!({"userName": "bjensen"}));
		assert_eq!(
			member(&map, "USERNAME", KeyPolicy::CaseInsensitive),
			Some(&json!("bjensen"))
		);
		assert_eq!(member(&map, "USERNAME", KeyPolicy::CaseSensitive), None);
		assert_eq!(
			member(&map, "userName", KeyPolicy::CaseSensitive),
			Some(&json!("bjensen"))
		);
	}

	#[test]
	fn test_exact_key_wins() {
		let map = object(json!({"Name": 1, "name": 2}));
		assert_eq!(member_key(&map, "name", KeyPolicy::CaseInsensitive), Some("name"));
	}

	#[test]
	fn test_member_mut() {
		let mut map = object(json!({"active": false}));
		*member_mut(&mut map, "ACTIVE", KeyPolicy::CaseInsensitive).unwrap() = json!(true);
		assert_eq!(map["active"], json!(true));
	}

	#[test]
	fn test_key_policy_from_str() {
		assert_eq!("case-sensitive".parse::<KeyPolicy>(), Ok(KeyPolicy::CaseSensitive));
		assert_eq!(" Case-Insensitive ".parse::<KeyPolicy>(), Ok(KeyPolicy::CaseInsensitive));
		assert!("loose".parse::<KeyPolicy>().is_err());
	}

	#[test]
	fn test_namespace_scope() {
		let doc = json!({
			"userName": "bjensen",
			"urn:example:ext": {"level": 3}
		});
		let map = doc.as_object().unwrap();

		assert_eq!(
			NamespaceScope::of(None, map, KeyPolicy::default()),
			NamespaceScope::TopLevel
		);
		let scope = NamespaceScope::of(Some("URN:EXAMPLE:EXT"), map, KeyPolicy::default());
		assert_eq!(scope, NamespaceScope::Member("urn:example:ext".to_string()));
		assert_eq!(scope.select(&doc), Some(&json!({"level": 3})));

		let scope = NamespaceScope::of(
			Some("urn:ietf:params:scim:schemas:core:2.0:User"),
			map,
			KeyPolicy::default(),
		);
		assert_eq!(scope, NamespaceScope::TopLevel);

		let scope = NamespaceScope::of(Some("urn:example:other"), map, KeyPolicy::default());
		assert_eq!(scope.select(&doc), None);
	}

	#[test]
	fn test_select_mut_creates_extension() {
		let mut doc = json!({});
		let scope = NamespaceScope::of(
			Some("urn:example:ext"),
			doc.as_object().unwrap(),
			KeyPolicy::default(),
		);
		assert!(scope.select_mut(&mut doc, false).is_none());
		scope.select_mut(&mut doc, true).unwrap()["level"] = json!(1);
		assert_eq!(doc, json!({"urn:example:ext": {"level": 1}}));
	}
}
