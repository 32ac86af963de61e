// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SCHEMA_ERROR;

/// What went wrong while reading a path or filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
	#[error("unexpected character '{0}'")]
	UnexpectedCharacter(char),
	#[error("unexpected token '{0}'")]
	UnexpectedToken(String),
	#[error("unexpected end of filter")]
	UnexpectedEndOfFilter,
	#[error("unexpected end of path after '.'")]
	UnexpectedEndOfPath,
	#[error("expected an attribute name")]
	ExpectedAttributeName,
	#[error("expected an attribute path")]
	ExpectedAttributePath,
	#[error("expected '(' after 'not'")]
	ExpectedParenthesis,
	#[error("unbalanced parenthesis")]
	UnbalancedParenthesis,
	#[error("unrecognized operator '{0}'")]
	UnrecognizedOperator(String),
	#[error("invalid comparison value: {0}")]
	InvalidComparisonValue(String),
	#[error("invalid schema namespace '{0}'")]
	InvalidNamespace(String),
	#[error("expression of {length} characters exceeds the limit of {max}")]
	TooLong { length: usize, max: usize },
	#[error("groups nested deeper than {max} levels")]
	TooDeep { max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScimError {
	#[error("invalid filter: {kind}{}", at(.offset))]
	InvalidFilter {
		kind: ParseErrorKind,
		offset: Option<usize>,
	},
	#[error("invalid path: {kind}{}", at(.offset))]
	InvalidPath {
		kind: ParseErrorKind,
		offset: Option<usize>,
	},
	#[error("invalid value: {0}")]
	InvalidValue(String),
	#[error("invalid syntax: {0}")]
	InvalidSyntax(String),
	#[error("no target: {0}")]
	NoTarget(String),
}

fn at(offset: &Option<usize>) -> String {
	offset
		.map(|offset| format!(" at offset {offset}"))
		.unwrap_or_default()
}

impl ScimError {
	pub(crate) fn filter(kind: ParseErrorKind, offset: usize) -> Self {
		Self::InvalidFilter {
			kind,
			offset: Some(offset),
		}
	}

	pub(crate) fn path(kind: ParseErrorKind, offset: usize) -> Self {
		Self::InvalidPath {
			kind,
			offset: Some(offset),
		}
	}

	pub(crate) fn end_of_filter() -> Self {
		Self::InvalidFilter {
			kind: ParseErrorKind::UnexpectedEndOfFilter,
			offset: None,
		}
	}

	/// The parse failure, if this error came from reading an expression.
	pub fn kind(&self) -> Option<&ParseErrorKind> {
		match self {
			Self::InvalidFilter { kind, .. } | Self::InvalidPath { kind, .. } => Some(kind),
			_ => None,
		}
	}

	/// Character offset into the expression where reading failed.
	pub fn offset(&self) -> Option<usize> {
		match self {
			Self::InvalidFilter { offset, .. } | Self::InvalidPath { offset, .. } => *offset,
			_ => None,
		}
	}

	/// Re-reports an expression error as a path error, keeping its cause.
	pub(crate) fn into_path_error(self) -> Self {
		match self {
			Self::InvalidFilter { kind, offset } => Self::InvalidPath { kind, offset },
			other => other,
		}
	}

	/// Re-reports an expression error as a filter error, keeping its cause.
	///
	/// Offsets without a position are pinned to `fallback`.
	pub(crate) fn into_filter_error(self, fallback: usize) -> Self {
		match self {
			Self::InvalidFilter { kind, offset } | Self::InvalidPath { kind, offset } => {
				Self::InvalidFilter {
					kind,
					offset: offset.or(Some(fallback)),
				}
			}
			other => other,
		}
	}

	pub fn error_type(&self) -> ScimErrorType {
		match self {
			Self::InvalidFilter { .. } => ScimErrorType::InvalidFilter,
			Self::InvalidPath { .. } => ScimErrorType::InvalidPath,
			Self::InvalidValue(_) => ScimErrorType::InvalidValue,
			Self::InvalidSyntax(_) => ScimErrorType::InvalidSyntax,
			Self::NoTarget(_) => ScimErrorType::NoTarget,
		}
	}

	/// Every expression failure is the client's fault.
	pub fn status(&self) -> u16 {
		400
	}

	pub fn to_response(&self) -> ScimErrorResponse {
		ScimErrorResponse::new(self.status(), Some(self.error_type()), self.to_string())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScimErrorType {
	InvalidFilter,
	InvalidSyntax,
	InvalidPath,
	NoTarget,
	InvalidValue,
}

/// RFC 7644 §3.12 error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimErrorResponse {
	pub schemas: Vec<String>,
	pub status: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scim_type: Option<ScimErrorType>,
	pub detail: String,
}

impl ScimErrorResponse {
	pub fn new(status: u16, error_type: Option<ScimErrorType>, detail: impl Into<String>) -> Self {
		Self {
			schemas: vec![SCHEMA_ERROR.to_string()],
			status: status.to_string(),
			scim_type: error_type,
			detail: detail.into(),
		}
	}
}
