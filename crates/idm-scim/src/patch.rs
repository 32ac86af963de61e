// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! RFC 7644 §3.5.2 PATCH operations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::document::{member_key, member_mut, KeyPolicy, NamespaceScope};
use crate::error::ScimError;
use crate::filter::Evaluator;
use crate::path::{is_namespace, Path};
use crate::types::SCHEMA_PATCH_OP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
	#[serde(alias = "Add")]
	Add,
	#[serde(alias = "Remove")]
	Remove,
	#[serde(alias = "Replace")]
	Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
	Add,
	Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOperation {
	pub op: PatchOp,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<Path>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
	pub schemas: Vec<String>,
	#[serde(rename = "Operations")]
	pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
	pub fn new(operations: Vec<PatchOperation>) -> Self {
		Self {
			schemas: vec![SCHEMA_PATCH_OP.to_string()],
			operations,
		}
	}

	pub fn validate(&self) -> Result<(), ScimError> {
		if !self.schemas.iter().any(|schema| schema == SCHEMA_PATCH_OP) {
			return Err(ScimError::InvalidSyntax(
				"Missing PatchOp schema".to_string(),
			));
		}
		for op in &self.operations {
			op.validate()?;
		}
		Ok(())
	}

	/// Validates the request and applies its operations in order. The
	/// resource is left partially patched when an operation fails.
	pub fn apply(&self, resource: &mut Value, evaluator: &Evaluator<'_>) -> Result<(), ScimError> {
		self.validate()?;
		for operation in &self.operations {
			operation.apply(resource, evaluator)?;
		}
		Ok(())
	}
}

impl PatchOperation {
	pub fn add(path: Option<Path>, value: Value) -> Self {
		Self {
			op: PatchOp::Add,
			path,
			value: Some(value),
		}
	}

	pub fn replace(path: Option<Path>, value: Value) -> Self {
		Self {
			op: PatchOp::Replace,
			path,
			value: Some(value),
		}
	}

	pub fn remove(path: Path) -> Self {
		Self {
			op: PatchOp::Remove,
			path: Some(path),
			value: None,
		}
	}

	pub fn validate(&self) -> Result<(), ScimError> {
		match self.op {
			PatchOp::Remove if self.path.is_none() => {
				Err(ScimError::NoTarget("Remove requires path".to_string()))
			}
			PatchOp::Add | PatchOp::Replace if self.value.is_none() => Err(
				ScimError::InvalidValue(format!("{:?} requires a value", self.op)),
			),
			_ => Ok(()),
		}
	}

	/// Applies this operation to `resource`. Returns the values a remove
	/// took out; add and replace return nothing.
	pub fn apply(&self, resource: &mut Value, evaluator: &Evaluator<'_>) -> Result<Vec<Value>, ScimError> {
		self.validate()?;
		let removed = match (self.op, &self.value) {
			(PatchOp::Remove, _) => match &self.path {
				Some(path) => remove(resource, path, evaluator)?,
				None => Vec::new(),
			},
			(PatchOp::Add, Some(value)) => {
				self.merge(resource, value, Merge::Add, evaluator)?;
				Vec::new()
			}
			(PatchOp::Replace, Some(value)) => {
				self.merge(resource, value, Merge::Replace, evaluator)?;
				Vec::new()
			}
			_ => Vec::new(),
		};
		debug!(
			op = ?self.op,
			path = %self.path.as_ref().map(Path::to_string).unwrap_or_default(),
			removed = removed.len(),
			"applied patch operation"
		);
		Ok(removed)
	}

	/// Merges into a copy of `resource` that replaces it only on success, so
	/// a failed add or replace leaves the resource untouched.
	fn merge(
		&self,
		resource: &mut Value,
		value: &Value,
		mode: Merge,
		evaluator: &Evaluator<'_>,
	) -> Result<(), ScimError> {
		let mut staged = resource.clone();
		self.merge_into(&mut staged, value, mode, evaluator)?;
		*resource = staged;
		Ok(())
	}

	fn merge_into(
		&self,
		resource: &mut Value,
		value: &Value,
		mode: Merge,
		evaluator: &Evaluator<'_>,
	) -> Result<(), ScimError> {
		if let Some(path) = &self.path {
			return merge_at(resource, path, value.clone(), mode, evaluator);
		}
		let Value::Object(members) = value else {
			return Err(ScimError::InvalidValue(
				"a patch without path needs an object value".to_string(),
			));
		};
		for (name, member) in members {
			let path = if is_namespace(name) {
				Path::extension(name.clone())?
			} else {
				Path::attr(name.clone())
			};
			merge_at(resource, &path, member.clone(), mode, evaluator)?;
		}
		Ok(())
	}
}

fn merge_at(
	resource: &mut Value,
	path: &Path,
	value: Value,
	mode: Merge,
	evaluator: &Evaluator<'_>,
) -> Result<(), ScimError> {
	let policy = evaluator.key_policy;
	let no_target = || ScimError::NoTarget(path.to_string());
	let scope = scope_mut(resource, path, true, policy).ok_or_else(no_target)?;

	let Some(last) = path.last() else {
		if !value.is_object() || !scope.is_object() {
			return Err(ScimError::InvalidValue(format!(
				"{path} can only be patched with an object"
			)));
		}
		merge_value(scope, value, mode, policy);
		return Ok(());
	};

	let parents = parents(scope, path, 0, path.len() - 1, true, evaluator);
	if parents.is_empty() {
		return Err(no_target());
	}

	let Some(filter) = last.filter() else {
		for parent in parents {
			merge_member(parent, last.attribute(), value.clone(), mode, policy);
		}
		return Ok(());
	};

	let scope_path = path.without_filters();
	let mut matched = 0;
	for parent in parents {
		let Some(existing) = member_mut(parent, last.attribute(), policy) else {
			continue;
		};
		let entries: Vec<&mut Value> = match existing {
			Value::Array(items) => items.iter_mut().collect(),
			other => vec![other],
		};
		for entry in entries {
			if evaluator.evaluate(filter, entry, &scope_path) {
				merge_value(entry, value.clone(), mode, policy);
				matched += 1;
			}
		}
	}
	if matched == 0 {
		return Err(no_target());
	}
	Ok(())
}

fn remove(resource: &mut Value, path: &Path, evaluator: &Evaluator<'_>) -> Result<Vec<Value>, ScimError> {
	let policy = evaluator.key_policy;
	let Some(last) = path.last() else {
		return remove_extension(resource, path, policy);
	};
	let Some(scope) = scope_mut(resource, path, false, policy) else {
		return Ok(Vec::new());
	};

	let scope_path = path.without_filters();
	let mut removed = Vec::new();
	for parent in parents(scope, path, 0, path.len() - 1, false, evaluator) {
		let Some(key) = member_key(parent, last.attribute(), policy).map(str::to_string) else {
			continue;
		};
		let Some(filter) = last.filter() else {
			removed.extend(parent.remove(&key));
			continue;
		};
		let Some(existing) = parent.get_mut(&key) else {
			continue;
		};
		match existing {
			Value::Array(items) => {
				let (gone, kept): (Vec<Value>, Vec<Value>) = std::mem::take(items)
					.into_iter()
					.partition(|item| evaluator.evaluate(filter, item, &scope_path));
				*items = kept;
				removed.extend(gone);
				if items.is_empty() {
					parent.remove(&key);
				}
			}
			other => {
				if evaluator.evaluate(filter, other, &scope_path) {
					removed.extend(parent.remove(&key));
				}
			}
		}
	}
	Ok(removed)
}

fn remove_extension(resource: &mut Value, path: &Path, policy: KeyPolicy) -> Result<Vec<Value>, ScimError> {
	let Some(namespace) = path.namespace() else {
		return Err(ScimError::NoTarget("the resource itself cannot be removed".to_string()));
	};
	let Some(object) = resource.as_object_mut() else {
		return Ok(Vec::new());
	};
	let removed = member_key(object, namespace, policy)
		.map(str::to_string)
		.and_then(|key| object.remove(&key));
	if removed.is_some() {
		if let Some(Value::Array(schemas)) = object.get_mut("schemas") {
			schemas.retain(|schema| {
				!schema
					.as_str()
					.is_some_and(|schema| schema.eq_ignore_ascii_case(namespace))
			});
		}
	}
	Ok(removed.into_iter().collect())
}

/// The value holding the attributes of `path`'s namespace. With `create`, a
/// missing extension is added and listed in `schemas`.
fn scope_mut<'v>(
	resource: &'v mut Value,
	path: &Path,
	create: bool,
	policy: KeyPolicy,
) -> Option<&'v mut Value> {
	let scope = NamespaceScope::of(path.namespace(), resource.as_object()?, policy);
	if let (NamespaceScope::Absent(namespace), true) = (&scope, create) {
		if let Some(Value::Array(schemas)) = resource.get_mut("schemas") {
			let listed = schemas.iter().any(|schema| {
				schema
					.as_str()
					.is_some_and(|schema| schema.eq_ignore_ascii_case(namespace))
			});
			if !listed {
				schemas.push(Value::String(namespace.clone()));
			}
		}
	}
	scope.select_mut(resource, create)
}

/// The objects that hold the element at `last`, reached by walking the
/// elements of `path` from `depth`. Value filters on the way select matching
/// entries; with `create`, missing members without a value filter become
/// empty objects.
fn parents<'v>(
	value: &'v mut Value,
	path: &Path,
	depth: usize,
	last: usize,
	create: bool,
	evaluator: &Evaluator<'_>,
) -> Vec<&'v mut Map<String, Value>> {
	if depth >= last {
		return value.as_object_mut().into_iter().collect();
	}
	let (Some(element), Some(object)) = (path.element(depth), value.as_object_mut()) else {
		return Vec::new();
	};

	let key = match member_key(object, element.attribute(), evaluator.key_policy).map(str::to_string) {
		Some(key) => key,
		None if create && element.filter().is_none() => {
			let key = element.attribute().to_string();
			object.insert(key.clone(), Value::Object(Map::new()));
			key
		}
		None => return Vec::new(),
	};
	let Some(child) = object.get_mut(&key) else {
		return Vec::new();
	};

	let scope = path.sub(depth + 1).without_filters();
	let selected = |entry: &Value| {
		element
			.filter()
			.map_or(true, |filter| evaluator.evaluate(filter, entry, &scope))
	};
	match child {
		Value::Array(items) => items
			.iter_mut()
			.filter(|item| selected(item))
			.flat_map(|item| parents(item, path, depth + 1, last, create, evaluator))
			.collect(),
		other => {
			if selected(other) {
				parents(other, path, depth + 1, last, create, evaluator)
			} else {
				Vec::new()
			}
		}
	}
}

fn merge_member(object: &mut Map<String, Value>, name: &str, value: Value, mode: Merge, policy: KeyPolicy) {
	match member_mut(object, name, policy) {
		Some(existing) => merge_value(existing, value, mode, policy),
		None => {
			object.insert(name.to_string(), value);
		}
	}
}

/// Objects merge member by member. In add mode arrays gain the values they do
/// not hold yet; otherwise the new value replaces the old one.
fn merge_value(existing: &mut Value, value: Value, mode: Merge, policy: KeyPolicy) {
	match (existing, value) {
		(Value::Object(target), Value::Object(source)) => {
			for (name, member) in source {
				merge_member(target, &name, member, mode, policy);
			}
		}
		(Value::Array(target), Value::Array(source)) if mode == Merge::Add => {
			for item in source {
				if !target.contains(&item) {
					target.push(item);
				}
			}
		}
		(existing, value) => *existing = value,
	}
}
