// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde_json::{Number, Value};

use super::ast::{CompareOp, Filter};
use crate::document::{member, KeyPolicy, NamespaceScope};
use crate::path::Path;
use crate::schema::{AttributeDefinitions, AttributeType, SchemaAttribute};

/// Matches filters against JSON resources.
///
/// String comparisons follow the `caseExact` flag of the attribute
/// definition, falling back to [`Evaluator::case_exact_default`] when the
/// definitions know nothing about the attribute. Member names are matched
/// under the configured [`KeyPolicy`].
#[derive(Clone, Copy)]
pub struct Evaluator<'d> {
	definitions: &'d dyn AttributeDefinitions,
	pub(crate) key_policy: KeyPolicy,
	case_exact_default: bool,
}

impl fmt::Debug for Evaluator<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Evaluator")
			.field("key_policy", &self.key_policy)
			.field("case_exact_default", &self.case_exact_default)
			.finish_non_exhaustive()
	}
}

impl Default for Evaluator<'static> {
	fn default() -> Self {
		Self::new(&())
	}
}

/// Matches `filter` against `document` without attribute definitions.
pub fn evaluate_filter(filter: &Filter, document: &Value) -> bool {
	Evaluator::default().matches(filter, document)
}

impl<'d> Evaluator<'d> {
	pub fn new(definitions: &'d dyn AttributeDefinitions) -> Self {
		Self {
			definitions,
			key_policy: KeyPolicy::default(),
			case_exact_default: false,
		}
	}

	pub fn key_policy(mut self, key_policy: KeyPolicy) -> Self {
		self.key_policy = key_policy;
		self
	}

	pub fn case_exact_default(mut self, case_exact: bool) -> Self {
		self.case_exact_default = case_exact;
		self
	}

	pub fn matches(&self, filter: &Filter, document: &Value) -> bool {
		let matched = self.evaluate(filter, document, &Path::root());
		tracing::trace!(filter = %filter, matched, "evaluated filter");
		matched
	}

	/// Every value `path` addresses in `document`. Value filters on path
	/// elements select the matching entries of multi-valued attributes.
	pub fn resolve<'v>(&self, path: &Path, document: &'v Value) -> Vec<&'v Value> {
		let Some(object) = document.as_object() else {
			return Vec::new();
		};
		let Some(scope) =
			NamespaceScope::of(path.namespace(), object, self.key_policy).select(document)
		else {
			return Vec::new();
		};

		let mut current = vec![scope];
		for (index, element) in path.iter().enumerate() {
			let mut next = Vec::new();
			for value in current {
				for object in entries(value).filter_map(Value::as_object) {
					let Some(child) = member(object, element.attribute(), self.key_policy) else {
						continue;
					};
					match element.filter() {
						None => next.push(child),
						Some(filter) => {
							let prefix = path.sub(index + 1).without_filters();
							next.extend(
								entries(child).filter(|entry| self.evaluate(filter, entry, &prefix)),
							);
						}
					}
				}
			}
			current = next;
		}
		current
	}

	/// The first value `path` addresses in `document`.
	pub fn value<'v>(&self, path: &Path, document: &'v Value) -> Option<&'v Value> {
		self.resolve(path, document).into_iter().next()
	}

	pub(crate) fn definition(&self, path: &Path) -> Option<&'d SchemaAttribute> {
		self.definitions.definition(path)
	}

	pub(crate) fn evaluate(&self, filter: &Filter, document: &Value, base: &Path) -> bool {
		match filter {
			Filter::Present(path) => self.candidates(path, document).any(is_present),
			Filter::Compare { op, path, value } => {
				let definition = self.definition(&scoped(base, path));
				self.candidates(path, document)
					.any(|candidate| self.compare(*op, candidate, value, definition))
			}
			Filter::And(filters) => filters.iter().all(|f| self.evaluate(f, document, base)),
			Filter::Or(filters) => filters.iter().any(|f| self.evaluate(f, document, base)),
			Filter::Not(inner) => !self.evaluate(inner, document, base),
			Filter::Complex { path, filter } => {
				let scope = scoped(base, path).without_filters();
				self.resolve(path, document)
					.into_iter()
					.flat_map(entries)
					.filter(|entry| entry.is_object())
					.any(|entry| self.evaluate(filter, entry, &scope))
			}
		}
	}

	fn candidates<'v>(&self, path: &Path, document: &'v Value) -> impl Iterator<Item = &'v Value> {
		self.resolve(path, document).into_iter().flat_map(entries)
	}

	fn compare(
		&self,
		op: CompareOp,
		actual: &Value,
		expected: &Value,
		definition: Option<&SchemaAttribute>,
	) -> bool {
		let actual = match actual {
			Value::Object(object) => match member(object, "value", self.key_policy) {
				Some(value) => value,
				None => return op == CompareOp::Eq && actual == expected,
			},
			other => other,
		};

		match (actual, expected) {
			(Value::String(a), Value::String(b)) => self.compare_strings(op, a, b, definition),
			(Value::Number(a), Value::Number(b)) => compare_numbers(op, a, b),
			_ => op == CompareOp::Eq && actual == expected,
		}
	}

	fn compare_strings(
		&self,
		op: CompareOp,
		actual: &str,
		expected: &str,
		definition: Option<&SchemaAttribute>,
	) -> bool {
		let typed_date =
			definition.is_some_and(|definition| definition.attr_type == AttributeType::DateTime);
		if !op.is_string_match() || (typed_date && op == CompareOp::Eq) {
			if let (Some(a), Some(b)) = (parse_date(actual), parse_date(expected)) {
				return ordering_matches(op, a.cmp(&b));
			}
		}

		let case_exact = definition.map_or(self.case_exact_default, |definition| {
			definition.case_exact
		});
		let (actual, expected): (Cow<'_, str>, Cow<'_, str>) = if case_exact {
			(Cow::Borrowed(actual), Cow::Borrowed(expected))
		} else {
			(
				Cow::Owned(actual.to_lowercase()),
				Cow::Owned(expected.to_lowercase()),
			)
		};

		match op {
			CompareOp::Co => actual.contains(expected.as_ref()),
			CompareOp::Sw => actual.starts_with(expected.as_ref()),
			CompareOp::Ew => actual.ends_with(expected.as_ref()),
			_ => ordering_matches(op, actual.cmp(&expected)),
		}
	}
}

/// `base` extended by `path`, for definition lookups inside value filters.
fn scoped<'p>(base: &Path, path: &'p Path) -> Cow<'p, Path> {
	if base.is_root() {
		Cow::Borrowed(path)
	} else {
		Cow::Owned(base.append(path))
	}
}

fn entries(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
	match value {
		Value::Array(items) => Box::new(items.iter()),
		other => Box::new(std::iter::once(other)),
	}
}

fn is_present(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::String(s) => !s.is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Object(object) => !object.is_empty(),
		Value::Bool(_) | Value::Number(_) => true,
	}
}

fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
	DateTime::parse_from_rfc3339(text).ok()
}

fn compare_numbers(op: CompareOp, actual: &Number, expected: &Number) -> bool {
	let ordering = if let (Some(a), Some(b)) = (actual.as_i64(), expected.as_i64()) {
		Some(a.cmp(&b))
	} else if let (Some(a), Some(b)) = (actual.as_u64(), expected.as_u64()) {
		Some(a.cmp(&b))
	} else if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
		a.partial_cmp(&b)
	} else {
		None
	};
	ordering.is_some_and(|ordering| ordering_matches(op, ordering))
}

fn ordering_matches(op: CompareOp, ordering: Ordering) -> bool {
	match op {
		CompareOp::Eq => ordering == Ordering::Equal,
		CompareOp::Gt => ordering == Ordering::Greater,
		CompareOp::Ge => ordering != Ordering::Less,
		CompareOp::Lt => ordering == Ordering::Less,
		CompareOp::Le => ordering != Ordering::Greater,
		CompareOp::Co | CompareOp::Sw | CompareOp::Ew => false,
	}
}
