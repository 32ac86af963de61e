// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Comparison values embedded in filter text.

use serde_json::Value;
use thiserror::Error;

use crate::cursor::Cursor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValueReadError(pub String);

impl From<serde_json::Error> for ValueReadError {
	fn from(err: serde_json::Error) -> Self {
		Self(err.to_string())
	}
}

/// A value read from filter text and how many characters it took up,
/// leading whitespace included.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRead {
	pub value: Value,
	pub consumed: usize,
}

/// Reads one comparison value from the cursor.
///
/// Implementations may read as far ahead as they like; the parser rewinds
/// the cursor afterwards and skips exactly [`ValueRead::consumed`]
/// characters. `Ok(None)` means nothing but whitespace was left.
pub trait ValueReader: Send + Sync {
	fn read_value(&self, cursor: &mut Cursor) -> Result<Option<ValueRead>, ValueReadError>;
}

/// Reads a single JSON value with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValueReader;

fn ends_scalar(c: char) -> bool {
	c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']')
}

impl ValueReader for JsonValueReader {
	fn read_value(&self, cursor: &mut Cursor) -> Result<Option<ValueRead>, ValueReadError> {
		let rest = cursor.read_to_end();
		let text = rest.trim_start();
		if text.is_empty() {
			return Ok(None);
		}
		let leading = rest.chars().count() - text.chars().count();

		let (value, end) = match text.chars().next() {
			Some('"' | '[' | '{') => {
				let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
				match stream.next() {
					Some(value) => (value?, stream.byte_offset()),
					None => return Ok(None),
				}
			}
			_ => {
				let end = text.find(ends_scalar).unwrap_or(text.len());
				(serde_json::from_str(&text[..end])?, end)
			}
		};

		Ok(Some(ValueRead {
			value,
			consumed: leading + text[..end].chars().count(),
		}))
	}
}
