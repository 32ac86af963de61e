// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! RFC 7643 attribute definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::types::SCHEMA_CORE_USER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
	#[default]
	String,
	Boolean,
	Decimal,
	Integer,
	DateTime,
	Binary,
	Reference,
	Complex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAttribute {
	pub name: String,
	#[serde(rename = "type", default)]
	pub attr_type: AttributeType,
	#[serde(default)]
	pub multi_valued: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub required: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub canonical_values: Option<Vec<String>>,
	#[serde(default)]
	pub case_exact: bool,
	#[serde(default = "default_mutability")]
	pub mutability: String,
	#[serde(default = "default_returned")]
	pub returned: String,
	#[serde(default = "default_uniqueness")]
	pub uniqueness: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub sub_attributes: Vec<SchemaAttribute>,
}

fn default_mutability() -> String {
	"readWrite".to_string()
}

fn default_returned() -> String {
	"default".to_string()
}

fn default_uniqueness() -> String {
	"none".to_string()
}

impl SchemaAttribute {
	pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
		Self {
			name: name.into(),
			attr_type,
			multi_valued: false,
			description: None,
			required: false,
			canonical_values: None,
			case_exact: false,
			mutability: default_mutability(),
			returned: default_returned(),
			uniqueness: default_uniqueness(),
			sub_attributes: Vec::new(),
		}
	}

	pub fn string(name: impl Into<String>) -> Self {
		Self::new(name, AttributeType::String)
	}

	pub fn complex(name: impl Into<String>, sub_attributes: Vec<SchemaAttribute>) -> Self {
		Self {
			sub_attributes,
			..Self::new(name, AttributeType::Complex)
		}
	}

	pub fn case_exact(mut self, case_exact: bool) -> Self {
		self.case_exact = case_exact;
		self
	}

	pub fn multi_valued(mut self, multi_valued: bool) -> Self {
		self.multi_valued = multi_valued;
		self
	}

	pub fn required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}

	pub fn mutability(mut self, mutability: impl Into<String>) -> Self {
		self.mutability = mutability.into();
		self
	}

	pub fn uniqueness(mut self, uniqueness: impl Into<String>) -> Self {
		self.uniqueness = uniqueness.into();
		self
	}

	pub fn sub_attribute(&self, name: &str) -> Option<&SchemaAttribute> {
		find(&self.sub_attributes, name)
	}
}

fn find<'a>(attributes: &'a [SchemaAttribute], name: &str) -> Option<&'a SchemaAttribute> {
	attributes
		.iter()
		.find(|attribute| attribute.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub attributes: Vec<SchemaAttribute>,
}

impl Schema {
	pub fn new(id: impl Into<String>, name: impl Into<String>, attributes: Vec<SchemaAttribute>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			description: None,
			attributes,
		}
	}

	/// The definition `path` addresses, descending through sub-attributes.
	/// Value filters and the namespace of `path` are not consulted.
	pub fn attribute(&self, path: &Path) -> Option<&SchemaAttribute> {
		let mut elements = path.iter();
		let mut current = find(&self.attributes, elements.next()?.attribute())?;
		for element in elements {
			current = current.sub_attribute(element.attribute())?;
		}
		Some(current)
	}

	fn owns(&self, namespace: Option<&str>) -> bool {
		namespace.map_or(true, |namespace| namespace.eq_ignore_ascii_case(&self.id))
	}

	/// The core User attributes that matter for matching.
	pub fn core_user() -> Self {
		let mut schema = Self::new(
			SCHEMA_CORE_USER,
			"User",
			vec![
				SchemaAttribute::string("id")
					.case_exact(true)
					.mutability("readOnly")
					.uniqueness("server"),
				SchemaAttribute::string("externalId").case_exact(true),
				SchemaAttribute::string("userName")
					.required(true)
					.uniqueness("server"),
				SchemaAttribute::complex(
					"name",
					vec![
						SchemaAttribute::string("formatted"),
						SchemaAttribute::string("familyName"),
						SchemaAttribute::string("givenName"),
						SchemaAttribute::string("middleName"),
						SchemaAttribute::string("honorificPrefix"),
						SchemaAttribute::string("honorificSuffix"),
					],
				),
				SchemaAttribute::string("displayName"),
				SchemaAttribute::string("title"),
				SchemaAttribute::string("userType"),
				SchemaAttribute::new("active", AttributeType::Boolean),
				SchemaAttribute::complex(
					"emails",
					vec![
						SchemaAttribute::string("value"),
						SchemaAttribute::string("display"),
						SchemaAttribute::string("type"),
						SchemaAttribute::new("primary", AttributeType::Boolean),
					],
				)
				.multi_valued(true),
				SchemaAttribute::complex(
					"meta",
					vec![
						SchemaAttribute::string("resourceType").case_exact(true),
						SchemaAttribute::new("created", AttributeType::DateTime),
						SchemaAttribute::new("lastModified", AttributeType::DateTime),
						SchemaAttribute::new("location", AttributeType::Reference).case_exact(true),
						SchemaAttribute::string("version").case_exact(true),
					],
				)
				.mutability("readOnly"),
			],
		);
		schema.description = Some("User Account".to_string());
		schema
	}
}

/// Resolves the attribute definition behind a path. `None` means no
/// definition is known and matching falls back to its defaults.
pub trait AttributeDefinitions {
	fn definition(&self, path: &Path) -> Option<&SchemaAttribute>;
}

impl AttributeDefinitions for () {
	fn definition(&self, _path: &Path) -> Option<&SchemaAttribute> {
		None
	}
}

impl AttributeDefinitions for Schema {
	fn definition(&self, path: &Path) -> Option<&SchemaAttribute> {
		if !self.owns(path.namespace()) {
			return None;
		}
		self.attribute(path)
	}
}

/// Schemas keyed by URN, one of which is the default for paths without a
/// namespace.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
	schemas: BTreeMap<String, Schema>,
	default: Option<String>,
}

impl SchemaRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry whose default is the core User schema.
	pub fn core() -> Self {
		let mut registry = Self::new();
		registry.set_default(Schema::core_user());
		registry
	}

	pub fn register(&mut self, schema: Schema) {
		tracing::debug!(schema = %schema.id, "registered schema");
		self.schemas.insert(schema.id.to_ascii_lowercase(), schema);
	}

	pub fn set_default(&mut self, schema: Schema) {
		self.default = Some(schema.id.to_ascii_lowercase());
		self.register(schema);
	}

	pub fn get(&self, id: &str) -> Option<&Schema> {
		self.schemas.get(&id.to_ascii_lowercase())
	}

	pub fn default_schema(&self) -> Option<&Schema> {
		self.default.as_deref().and_then(|id| self.schemas.get(id))
	}

	pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
		self.schemas.values()
	}

	pub fn len(&self) -> usize {
		self.schemas.len()
	}

	pub fn is_empty(&self) -> bool {
		self.schemas.is_empty()
	}
}

impl AttributeDefinitions for SchemaRegistry {
	fn definition(&self, path: &Path) -> Option<&SchemaAttribute> {
		if let Some(namespace) = path.namespace() {
			return self.get(namespace)?.attribute(path);
		}
		self.default_schema()
			.and_then(|schema| schema.attribute(path))
			.or_else(|| self.schemas().find_map(|schema| schema.attribute(path)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn path(expression: &str) -> Path {
		Path::parse(expression).unwrap()
	}

	#[test]
	fn test_attribute_descends_sub_attributes() {
		let schema = Schema::core_user();
		let given = schema.attribute(&path("NAME.givenName")).unwrap();
		assert_eq!(given.name, "givenName");
		assert!(!given.case_exact);

		let value = schema.attribute(&path(r#"emails[type eq "work"].value"#)).unwrap();
		assert_eq!(value.name, "value");

		assert!(schema.attribute(&path("name.nickname")).is_none());
		assert!(schema.attribute(&Path::root()).is_none());
	}

	#[test]
	fn test_schema_definitions_respect_namespace() {
		let schema = Schema::core_user();
		assert!(schema.definition(&path("id")).unwrap().case_exact);
		assert!(schema
			.definition(&path("urn:ietf:params:scim:schemas:core:2.0:User:id"))
			.is_some());
		assert!(schema.definition(&path("urn:example:ext:id")).is_none());
	}

	#[test]
	fn test_registry_lookup() {
		let mut registry = SchemaRegistry::core();
		registry.register(Schema::new(
			"urn:example:ext",
			"Ext",
			vec![
				SchemaAttribute::string("badge").case_exact(true),
				SchemaAttribute::string("id"),
			],
		));
		assert_eq!(registry.len(), 2);

		assert!(registry.definition(&path("id")).unwrap().case_exact);
		assert!(!registry.definition(&path("urn:example:ext:id")).unwrap().case_exact);
		assert!(registry.definition(&path("badge")).unwrap().case_exact);
		assert!(registry.definition(&path("urn:example:missing:id")).is_none());
	}

	#[test]
	fn test_unit_has_no_definitions() {
		assert!(().definition(&path("id")).is_none());
	}

	#[test]
	fn test_deserialize_schema_document() {
		let schema: Schema = serde_json::from_value(json!({
			"id": "urn:example:ext",
			"name": "Ext",
			"attributes": [
				{"name": "hired", "type": "dateTime"},
				{"name": "badge", "type": "string", "caseExact": true, "multiValued": false}
			]
		}))
		.unwrap();
		assert_eq!(schema.attributes[0].attr_type, AttributeType::DateTime);
		assert!(schema.attributes[1].case_exact);
		assert_eq!(schema.attributes[1].mutability, "readWrite");
	}
}
