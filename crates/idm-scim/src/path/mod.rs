// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SCIM attribute paths (RFC 7644 §3.10).

pub(crate) mod parser;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseErrorKind, ScimError};
use crate::filter::{Filter, FilterParser};

/// Whether `text` looks like a schema URN (`urn:` followed by something).
pub fn is_namespace(text: &str) -> bool {
	text.len() > 4
		&& text
			.get(..4)
			.is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"))
}

/// One step of a path: an attribute name and an optional value filter.
#[derive(Debug, Clone)]
pub struct Element {
	attribute: String,
	filter: Option<Filter>,
}

impl Element {
	pub fn new(attribute: impl Into<String>, filter: Option<Filter>) -> Self {
		Self {
			attribute: attribute.into(),
			filter,
		}
	}

	pub fn attribute(&self) -> &str {
		&self.attribute
	}

	pub fn filter(&self) -> Option<&Filter> {
		self.filter.as_ref()
	}
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		self.attribute.eq_ignore_ascii_case(&other.attribute) && self.filter == other.filter
	}
}

impl Hash for Element {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.attribute.to_ascii_lowercase().hash(state);
	}
}

impl fmt::Display for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.attribute)?;
		if let Some(filter) = &self.filter {
			write!(f, "[{filter}]")?;
		}
		Ok(())
	}
}

/// An attribute path: an optional schema URN and a chain of elements.
///
/// The root path has neither. A path with a namespace and no elements
/// addresses the whole extension schema.
#[derive(Debug, Clone, Default)]
pub struct Path {
	namespace: Option<String>,
	elements: Vec<Element>,
}

impl Path {
	pub fn root() -> Self {
		Self::default()
	}

	/// The root of an extension schema.
	pub fn extension(namespace: impl Into<String>) -> Result<Self, ScimError> {
		let namespace = namespace.into();
		if !is_namespace(&namespace) {
			return Err(ScimError::InvalidPath {
				kind: ParseErrorKind::InvalidNamespace(namespace),
				offset: None,
			});
		}
		Ok(Self {
			namespace: Some(namespace),
			elements: Vec::new(),
		})
	}

	/// A single-attribute path, without value filter.
	pub fn attr(attribute: impl Into<String>) -> Self {
		Self::root().attribute(attribute, None)
	}

	pub fn parse(expression: &str) -> Result<Self, ScimError> {
		FilterParser::default().path(expression)
	}

	pub fn is_root(&self) -> bool {
		self.elements.is_empty()
	}

	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	pub fn element(&self, index: usize) -> Option<&Element> {
		self.elements.get(index)
	}

	pub fn elements(&self) -> &[Element] {
		&self.elements
	}

	pub fn last(&self) -> Option<&Element> {
		self.elements.last()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Element> {
		self.elements.iter()
	}

	/// This path extended by one element.
	pub fn attribute(&self, attribute: impl Into<String>, filter: Option<Filter>) -> Self {
		let mut elements = self.elements.clone();
		elements.push(Element::new(attribute, filter));
		Self {
			namespace: self.namespace.clone(),
			elements,
		}
	}

	/// This path extended by the elements of `other`; `other`'s namespace is
	/// ignored.
	pub fn append(&self, other: &Path) -> Self {
		let mut elements = self.elements.clone();
		elements.extend(other.elements.iter().cloned());
		Self {
			namespace: self.namespace.clone(),
			elements,
		}
	}

	/// The first `len` elements of this path.
	pub fn sub(&self, len: usize) -> Self {
		Self {
			namespace: self.namespace.clone(),
			elements: self.elements.iter().take(len).cloned().collect(),
		}
	}

	pub fn replace_attribute(&self, index: usize, attribute: impl Into<String>) -> Self {
		let mut path = self.clone();
		if let Some(element) = path.elements.get_mut(index) {
			element.attribute = attribute.into();
		}
		path
	}

	pub fn replace_filter(&self, index: usize, filter: Option<Filter>) -> Self {
		let mut path = self.clone();
		if let Some(element) = path.elements.get_mut(index) {
			element.filter = filter;
		}
		path
	}

	pub fn without_filters(&self) -> Self {
		Self {
			namespace: self.namespace.clone(),
			elements: self
				.elements
				.iter()
				.map(|element| Element::new(element.attribute.clone(), None))
				.collect(),
		}
	}

	pub(crate) fn push(&mut self, element: Element) {
		self.elements.push(element);
	}
}

impl<'a> IntoIterator for &'a Path {
	type Item = &'a Element;
	type IntoIter = std::slice::Iter<'a, Element>;

	fn into_iter(self) -> Self::IntoIter {
		self.elements.iter()
	}
}

impl PartialEq for Path {
	fn eq(&self, other: &Self) -> bool {
		let namespace = match (&self.namespace, &other.namespace) {
			(Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
			(None, None) => true,
			_ => false,
		};
		namespace && self.elements == other.elements
	}
}

impl Hash for Path {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.namespace
			.as_ref()
			.map(|namespace| namespace.to_ascii_lowercase())
			.hash(state);
		self.elements.hash(state);
	}
}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(namespace) = &self.namespace {
			write!(f, "{namespace}:")?;
		}
		for (i, element) in self.elements.iter().enumerate() {
			if i > 0 {
				f.write_str(".")?;
			}
			write!(f, "{element}")?;
		}
		Ok(())
	}
}

impl FromStr for Path {
	type Err = ScimError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl Serialize for Path {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Path {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let expression = String::deserialize(deserializer)?;
		Self::parse(&expression).map_err(serde::de::Error::custom)
	}
}
