// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::parser::FilterParser;
use crate::error::ScimError;
use crate::path::Path;

/// Attribute comparison operators. `ne` has no variant; it is parsed as
/// `not (... eq ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
	Eq,
	Co,
	Sw,
	Ew,
	Gt,
	Ge,
	Lt,
	Le,
}

impl CompareOp {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Eq => "eq",
			Self::Co => "co",
			Self::Sw => "sw",
			Self::Ew => "ew",
			Self::Gt => "gt",
			Self::Ge => "ge",
			Self::Lt => "lt",
			Self::Le => "le",
		}
	}

	/// Looks up an operator keyword, ignoring case. `ne` and `pr` are not
	/// comparison operators here.
	pub fn from_keyword(keyword: &str) -> Option<Self> {
		[
			Self::Eq,
			Self::Co,
			Self::Sw,
			Self::Ew,
			Self::Gt,
			Self::Ge,
			Self::Lt,
			Self::Le,
		]
		.into_iter()
		.find(|op| op.as_str().eq_ignore_ascii_case(keyword))
	}

	/// Substring and equality operators, the ones governed by `caseExact`.
	pub fn is_string_match(&self) -> bool {
		matches!(self, Self::Eq | Self::Co | Self::Sw | Self::Ew)
	}
}

impl fmt::Display for CompareOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
	Present(Path),
	Compare {
		op: CompareOp,
		path: Path,
		value: Value,
	},
	And(Vec<Filter>),
	Or(Vec<Filter>),
	Not(Box<Filter>),
	Complex {
		path: Path,
		filter: Box<Filter>,
	},
}

impl Filter {
	pub fn parse(expression: &str) -> Result<Self, ScimError> {
		FilterParser::parse(expression)
	}

	pub fn compare(op: CompareOp, path: Path, value: impl Into<Value>) -> Self {
		Self::Compare {
			op,
			path,
			value: value.into(),
		}
	}

	pub fn eq(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Eq, path, value)
	}

	pub fn ne(path: Path, value: impl Into<Value>) -> Self {
		Self::not(Self::eq(path, value))
	}

	pub fn co(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Co, path, value)
	}

	pub fn sw(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Sw, path, value)
	}

	pub fn ew(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Ew, path, value)
	}

	pub fn gt(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Gt, path, value)
	}

	pub fn ge(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Ge, path, value)
	}

	pub fn lt(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Lt, path, value)
	}

	pub fn le(path: Path, value: impl Into<Value>) -> Self {
		Self::compare(CompareOp::Le, path, value)
	}

	pub fn pr(path: Path) -> Self {
		Self::Present(path)
	}

	pub fn not(filter: Filter) -> Self {
		Self::Not(Box::new(filter))
	}

	pub fn complex(path: Path, filter: Filter) -> Self {
		Self::Complex {
			path,
			filter: Box::new(filter),
		}
	}

	/// Conjunction of `filters`; a single filter is returned as is and an
	/// empty input yields `None`.
	pub fn and_all(filters: impl IntoIterator<Item = Filter>) -> Option<Self> {
		Self::group(filters.into_iter().collect(), Self::And)
	}

	/// Disjunction of `filters`; a single filter is returned as is and an
	/// empty input yields `None`.
	pub fn or_all(filters: impl IntoIterator<Item = Filter>) -> Option<Self> {
		Self::group(filters.into_iter().collect(), Self::Or)
	}

	fn group(mut filters: Vec<Filter>, wrap: fn(Vec<Filter>) -> Filter) -> Option<Self> {
		match filters.len() {
			0 => None,
			1 => filters.pop(),
			_ => Some(wrap(filters)),
		}
	}

	/// The attribute path this filter tests, if it tests exactly one.
	pub fn path(&self) -> Option<&Path> {
		match self {
			Self::Present(path) | Self::Compare { path, .. } | Self::Complex { path, .. } => {
				Some(path)
			}
			Self::And(_) | Self::Or(_) | Self::Not(_) => None,
		}
	}

	fn is_group(&self) -> bool {
		matches!(self, Self::And(_) | Self::Or(_))
	}
}

impl fmt::Display for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Present(path) => write!(f, "{path} pr"),
			Self::Compare { op, path, value } => write!(f, "{path} {op} {value}"),
			Self::And(filters) => write_group(f, filters, "and"),
			Self::Or(filters) => write_group(f, filters, "or"),
			Self::Not(filter) => write!(f, "not ({filter})"),
			Self::Complex { path, filter } => write!(f, "{path}[{filter}]"),
		}
	}
}

// Nested groups keep their parentheses so that reading the text back does
// not flatten them into the enclosing group.
fn write_group(f: &mut fmt::Formatter<'_>, filters: &[Filter], keyword: &str) -> fmt::Result {
	for (i, filter) in filters.iter().enumerate() {
		if i > 0 {
			write!(f, " {keyword} ")?;
		}
		if filter.is_group() {
			write!(f, "({filter})")?;
		} else {
			write!(f, "{filter}")?;
		}
	}
	Ok(())
}

impl FromStr for Filter {
	type Err = ScimError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl Serialize for Filter {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Filter {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let expression = String::deserialize(deserializer)?;
		Self::parse(&expression).map_err(serde::de::Error::custom)
	}
}
