// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::cursor::Cursor;
use crate::error::{ParseErrorKind, ScimError};

/// A run of filter text and the character offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
	pub text: String,
	pub offset: usize,
}

impl Token {
	pub fn is(&self, keyword: &str) -> bool {
		self.text.eq_ignore_ascii_case(keyword)
	}
}

pub(crate) fn is_filter_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '$')
}

fn skip_spaces(cursor: &mut Cursor) -> bool {
	while let Some(c) = cursor.read() {
		if c != ' ' {
			cursor.unread();
			cursor.mark();
			return true;
		}
	}
	false
}

/// Reads the next filter token, `None` once only spaces remain.
///
/// Parentheses are tokens of their own. Outside a value filter a token may
/// end in `[`, which opens one; inside a value filter `]` is a token of its
/// own.
pub(crate) fn read_filter_token(
	cursor: &mut Cursor,
	value_filter: bool,
) -> Result<Option<Token>, ScimError> {
	if !skip_spaces(cursor) {
		return Ok(None);
	}
	let offset = cursor.marked();
	let mut text = String::new();

	while let Some(c) = cursor.read() {
		match c {
			' ' => break,
			'(' | ')' => {
				if text.is_empty() {
					text.push(c);
				} else {
					cursor.unread();
				}
				break;
			}
			']' if value_filter => {
				if text.is_empty() {
					text.push(c);
				} else {
					cursor.unread();
				}
				break;
			}
			'[' if !value_filter => {
				text.push(c);
				break;
			}
			c if is_filter_char(c) => text.push(c),
			c => {
				return Err(ScimError::filter(
					ParseErrorKind::UnexpectedCharacter(c),
					cursor.position() - 1,
				));
			}
		}
	}

	tracing::trace!(token = %text, offset, "filter token");
	Ok(Some(Token { text, offset }))
}

/// Reads whatever stands where a comparison operator is expected.
///
/// Any run of characters up to a space, parenthesis or bracket is accepted so
/// that an unknown operator surfaces as such rather than as a stray
/// character. A lone delimiter is returned as a one-character token.
pub(crate) fn read_operator_token(cursor: &mut Cursor) -> Option<Token> {
	if !skip_spaces(cursor) {
		return None;
	}
	let offset = cursor.marked();
	let mut text = String::new();

	while let Some(c) = cursor.read() {
		match c {
			' ' => break,
			'(' | ')' | '[' | ']' => {
				if text.is_empty() {
					text.push(c);
				} else {
					cursor.unread();
				}
				break;
			}
			c => text.push(c),
		}
	}

	Some(Token { text, offset })
}
