// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use super::{is_namespace, Element, Path};
use crate::cursor::Cursor;
use crate::error::{ParseErrorKind, ScimError};
use crate::filter::FilterParser;

fn is_path_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '$')
}

/// Reads one attribute name, ending at `.`, `[` or the end of input.
/// Returns the name and the terminator that ended it.
fn read_path_token(cursor: &mut Cursor) -> Result<(String, Option<char>), ScimError> {
	let mut name = String::new();
	while let Some(c) = cursor.read() {
		match c {
			'.' | '[' => return Ok((name, Some(c))),
			c if is_path_char(c) => name.push(c),
			c => {
				return Err(ScimError::path(
					ParseErrorKind::UnexpectedCharacter(c),
					cursor.position() - 1,
				));
			}
		}
	}
	Ok((name, None))
}

/// Reads a path expression. `base` is the character offset of `expression`
/// within the text it was taken from, so reported offsets point into that
/// text.
pub(crate) fn read_path(
	parser: &FilterParser<'_>,
	expression: &str,
	base: usize,
) -> Result<Path, ScimError> {
	let text = expression.trim();
	if text.is_empty() {
		return Ok(Path::root());
	}
	let base = base + (expression.chars().count() - expression.trim_start().chars().count());

	let (mut path, rest, rest_base) = if is_namespace(text) {
		let head = text.find('[').map_or(text, |end| &text[..end]);
		let colon = head.rfind(':').unwrap_or(3);
		let path = Path::extension(&text[..colon]).map_err(|err| match err {
			ScimError::InvalidPath { kind, .. } => ScimError::path(kind, base),
			other => other,
		})?;
		let rest_base = base + text[..=colon].chars().count();
		(path, &text[colon + 1..], rest_base)
	} else {
		(Path::root(), text, base)
	};

	if rest.is_empty() {
		return Ok(path);
	}

	let mut cursor = Cursor::with_base(rest, rest_base);
	loop {
		let start = cursor.position();
		let (name, terminator) = read_path_token(&mut cursor)?;
		if name.is_empty() {
			return Err(ScimError::path(ParseErrorKind::ExpectedAttributeName, start));
		}

		match terminator {
			None => {
				path.push(Element::new(name, None));
				break;
			}
			Some('[') => {
				let filter = parser
					.read_filter(&mut cursor, true)
					.map_err(ScimError::into_path_error)?;
				path.push(Element::new(name, Some(filter)));
				match cursor.read() {
					None => break,
					Some('.') if cursor.is_at_end() => {
						return Err(ScimError::path(
							ParseErrorKind::UnexpectedEndOfPath,
							cursor.position() - 1,
						));
					}
					Some('.') => {}
					Some(c) => {
						return Err(ScimError::path(
							ParseErrorKind::UnexpectedCharacter(c),
							cursor.position() - 1,
						));
					}
				}
			}
			Some(_) => {
				path.push(Element::new(name, None));
				if cursor.is_at_end() {
					return Err(ScimError::path(
						ParseErrorKind::UnexpectedEndOfPath,
						cursor.position() - 1,
					));
				}
			}
		}
	}

	tracing::trace!(path = %path, "parsed path");
	Ok(path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filter::Filter;
	use proptest::prelude::*;

	fn parse(expression: &str) -> Result<Path, ScimError> {
		Path::parse(expression)
	}

	fn attributes(path: &Path) -> Vec<&str> {
		path.iter().map(Element::attribute).collect()
	}

	#[test]
	fn test_simple_and_nested() {
		let path = parse("userName").unwrap();
		assert_eq!(attributes(&path), vec!["userName"]);
		assert_eq!(path.namespace(), None);

		let path = parse("name.givenName").unwrap();
		assert_eq!(attributes(&path), vec!["name", "givenName"]);
	}

	#[test]
	fn test_namespace() {
		let path = parse("urn:ietf:params:scim:schemas:core:2.0:User:name.givenName").unwrap();
		assert_eq!(
			path.namespace(),
			Some("urn:ietf:params:scim:schemas:core:2.0:User")
		);
		assert_eq!(attributes(&path), vec!["name", "givenName"]);
	}

	#[test]
	fn test_extension_root() {
		let path = parse("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:").unwrap();
		assert!(path.is_root());
		assert_eq!(
			path.namespace(),
			Some("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User")
		);
	}

	#[test]
	fn test_namespace_split_ignores_colons_in_filter() {
		let path = parse(r#"urn:example:ext:emails[value eq "a:b"].display"#).unwrap();
		assert_eq!(path.namespace(), Some("urn:example:ext"));
		assert_eq!(attributes(&path), vec!["emails", "display"]);
		assert_eq!(
			path.element(0).unwrap().filter(),
			Some(&Filter::eq(Path::attr("value"), "a:b"))
		);
	}

	#[test]
	fn test_value_filter_elements() {
		let path = parse(r#"emails[type eq "work"].value"#).unwrap();
		assert_eq!(attributes(&path), vec!["emails", "value"]);
		assert!(path.element(1).unwrap().filter().is_none());

		let path = parse("members[value pr]").unwrap();
		assert_eq!(path.len(), 1);
		assert_eq!(
			path.element(0).unwrap().filter(),
			Some(&Filter::pr(Path::attr("value")))
		);
	}

	#[test]
	fn test_empty_is_root() {
		assert!(parse("").unwrap().is_root());
		assert!(parse("   ").unwrap().is_root());
	}

	#[test]
	fn test_surrounding_spaces_are_ignored() {
		let err = parse("  a.").unwrap_err();
		assert_eq!(err.offset(), Some(3));
		assert_eq!(parse(" name ").unwrap(), Path::attr("name"));
	}

	#[test]
	fn test_trailing_dot() {
		let err = parse("name.").unwrap_err();
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfPath));
		assert_eq!(err.offset(), Some(4));

		let err = parse("emails[value pr].").unwrap_err();
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfPath));
	}

	#[test]
	fn test_empty_segment() {
		let err = parse("name..givenName").unwrap_err();
		assert_eq!(err.kind(), Some(&ParseErrorKind::ExpectedAttributeName));
		assert_eq!(err.offset(), Some(5));

		let err = parse("[value pr]").unwrap_err();
		assert_eq!(err.kind(), Some(&ParseErrorKind::ExpectedAttributeName));
	}

	#[test]
	fn test_bad_characters() {
		let err = parse("na me").unwrap_err();
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedCharacter(' ')));
		assert_eq!(err.offset(), Some(2));
		assert_eq!(err.error_type(), crate::ScimErrorType::InvalidPath);

		let err = parse("emails[value pr]x").unwrap_err();
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedCharacter('x')));
		assert_eq!(err.offset(), Some(16));
	}

	#[test]
	fn test_bad_value_filter_is_a_path_error() {
		let err = parse(r#"emails[type eq "work""#).unwrap_err();
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
		assert_eq!(err.error_type(), crate::ScimErrorType::InvalidPath);

		let err = parse("emails[type ?? 1]").unwrap_err();
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::UnrecognizedOperator("??".to_string()))
		);
		assert_eq!(err.offset(), Some(12));
	}

	#[test]
	fn test_invalid_namespace() {
		let err = parse("urn:x").unwrap_err();
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::InvalidNamespace("urn".to_string()))
		);
	}

	#[test]
	fn test_display_round_trip() {
		for expression in [
			"userName",
			"name.familyName",
			"urn:ietf:params:scim:schemas:core:2.0:User:userName",
			r#"emails[type eq "work" and primary eq true].value"#,
			"members[not (type eq \"Group\")]",
		] {
			let path = parse(expression).unwrap();
			assert_eq!(path.to_string(), expression);
			assert_eq!(parse(&path.to_string()).unwrap(), path);
		}
	}

	proptest! {
		#[test]
		fn dotted_names_parse(names in prop::collection::vec("[A-Za-z][A-Za-z0-9_$-]{0,10}", 1..5)) {
			let expression = names.join(".");
			let path = parse(&expression).unwrap();
			prop_assert_eq!(attributes(&path), names.iter().map(String::as_str).collect::<Vec<_>>());
			prop_assert_eq!(path.to_string(), expression);
		}
	}
}
