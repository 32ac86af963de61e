// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::ast::{CompareOp, Filter};
use super::tokenizer::{read_filter_token, read_operator_token, Token};
use super::value::{JsonValueReader, ValueReader};
use crate::cursor::Cursor;
use crate::error::{ParseErrorKind, ScimError};
use crate::path::{parser::read_path, Path};

static JSON_READER: JsonValueReader = JsonValueReader;

/// Deepest nesting of `(` and `not (` groups a filter may have.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
	Open,
	Not,
	And,
	Or,
}

/// Reads filter and path expressions.
///
/// Filters are built with an operator-precedence parse over an operator
/// stack and an operand stack: `and` binds tighter than `or`, runs of the
/// same operator are flattened, and `not` must be followed by a
/// parenthesized filter. Comparison values are read by the configured
/// [`ValueReader`].
#[derive(Clone, Copy)]
pub struct FilterParser<'r> {
	reader: &'r dyn ValueReader,
	max_length: Option<usize>,
}

impl fmt::Debug for FilterParser<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FilterParser")
			.field("max_length", &self.max_length)
			.finish_non_exhaustive()
	}
}

impl Default for FilterParser<'static> {
	fn default() -> Self {
		Self::new(&JSON_READER)
	}
}

impl FilterParser<'static> {
	/// Parses `expression` with JSON comparison values and no length limit.
	pub fn parse(expression: &str) -> Result<Filter, ScimError> {
		Self::default().filter(expression)
	}
}

impl<'r> FilterParser<'r> {
	pub fn new(reader: &'r dyn ValueReader) -> Self {
		Self {
			reader,
			max_length: None,
		}
	}

	/// Rejects expressions longer than `max` characters.
	pub fn max_length(mut self, max: usize) -> Self {
		self.max_length = Some(max);
		self
	}

	pub fn filter(&self, expression: &str) -> Result<Filter, ScimError> {
		if let Some(kind) = self.check_length(expression) {
			return Err(ScimError::InvalidFilter { kind, offset: None });
		}
		debug!(expression, "parsing filter");
		let mut cursor = Cursor::new(expression);
		let filter = self.read_filter(&mut cursor, false)?;
		debug!(filter = %filter, "parsed filter");
		Ok(filter)
	}

	pub fn path(&self, expression: &str) -> Result<Path, ScimError> {
		if let Some(kind) = self.check_length(expression) {
			return Err(ScimError::InvalidPath { kind, offset: None });
		}
		debug!(expression, "parsing path");
		read_path(self, expression, 0)
	}

	fn check_length(&self, expression: &str) -> Option<ParseErrorKind> {
		let max = self.max_length?;
		let length = expression.chars().count();
		(length > max).then_some(ParseErrorKind::TooLong { length, max })
	}

	/// Reads a filter from the cursor. In value filter mode reading stops
	/// after the closing `]`, which must be present.
	pub(crate) fn read_filter(
		&self,
		cursor: &mut Cursor,
		value_filter: bool,
	) -> Result<Filter, ScimError> {
		let mut operators: Vec<Operator> = Vec::new();
		let mut operands: Vec<Filter> = Vec::new();
		let mut expecting = true;
		let mut closed = false;
		let mut depth = 0;

		while let Some(token) = read_filter_token(cursor, value_filter)? {
			if expecting && (token.text == "(" || token.is("not")) {
				depth += 1;
				if depth > MAX_DEPTH {
					return Err(ScimError::filter(
						ParseErrorKind::TooDeep { max: MAX_DEPTH },
						token.offset,
					));
				}
			}

			if expecting && token.text == "(" {
				operators.push(Operator::Open);
				continue;
			}

			if expecting && token.is("not") {
				match read_filter_token(cursor, value_filter)? {
					None => return Err(ScimError::end_of_filter()),
					Some(next) if next.text == "(" => operators.push(Operator::Not),
					Some(next) => {
						return Err(ScimError::filter(
							ParseErrorKind::ExpectedParenthesis,
							next.offset,
						));
					}
				}
				continue;
			}

			if !expecting && token.text == ")" {
				match collapse(&mut operators, &mut operands)? {
					Some(Operator::Open) => depth -= 1,
					Some(Operator::Not) => {
						depth -= 1;
						let inner = operands.pop().ok_or_else(ScimError::end_of_filter)?;
						operands.push(Filter::not(inner));
					}
					_ => {
						return Err(ScimError::filter(
							ParseErrorKind::UnbalancedParenthesis,
							token.offset,
						));
					}
				}
				continue;
			}

			if !expecting && token.is("and") {
				operators.push(Operator::And);
				expecting = true;
				continue;
			}

			if !expecting && token.is("or") {
				if operators.last() == Some(&Operator::And) {
					collapse_run(&mut operators, &mut operands, Operator::And)?;
				}
				operators.push(Operator::Or);
				expecting = true;
				continue;
			}

			if expecting && token.text.ends_with('[') {
				let attribute = &token.text[..token.text.len() - 1];
				let path = self.attribute_path(attribute, token.offset)?;
				let inner = self.read_filter(cursor, true)?;
				operands.push(Filter::complex(path, inner));
				expecting = false;
				continue;
			}

			if value_filter && !expecting && token.text == "]" {
				closed = true;
				break;
			}

			if expecting && token.text != ")" && token.text != "]" {
				operands.push(self.attribute_expression(cursor, &token)?);
				expecting = false;
				continue;
			}

			return Err(ScimError::filter(
				ParseErrorKind::UnexpectedToken(token.text),
				token.offset,
			));
		}

		if value_filter && !closed {
			return Err(ScimError::end_of_filter());
		}
		if collapse(&mut operators, &mut operands)?.is_some() {
			return Err(ScimError::end_of_filter());
		}

		let filter = operands.pop().ok_or_else(ScimError::end_of_filter)?;
		if let Some(extra) = operands.pop() {
			return Err(ScimError::InvalidFilter {
				kind: ParseErrorKind::UnexpectedToken(extra.to_string()),
				offset: None,
			});
		}
		Ok(filter)
	}

	fn attribute_path(&self, text: &str, offset: usize) -> Result<Path, ScimError> {
		let path =
			read_path(self, text, offset).map_err(|err| err.into_filter_error(offset))?;
		if path.is_root() {
			return Err(ScimError::filter(
				ParseErrorKind::ExpectedAttributePath,
				offset,
			));
		}
		Ok(path)
	}

	/// `path pr` or `path op value`, with `token` holding the path.
	fn attribute_expression(&self, cursor: &mut Cursor, token: &Token) -> Result<Filter, ScimError> {
		let path = self.attribute_path(&token.text, token.offset)?;
		let operator = read_operator_token(cursor).ok_or_else(ScimError::end_of_filter)?;

		if operator.is("pr") {
			return Ok(Filter::pr(path));
		}
		if matches!(operator.text.as_str(), "(" | ")" | "[" | "]") {
			return Err(ScimError::filter(
				ParseErrorKind::UnexpectedToken(operator.text),
				operator.offset,
			));
		}

		let negated = operator.is("ne");
		let op = if negated {
			CompareOp::Eq
		} else {
			CompareOp::from_keyword(&operator.text).ok_or_else(|| {
				ScimError::filter(
					ParseErrorKind::UnrecognizedOperator(operator.text.clone()),
					operator.offset,
				)
			})?
		};

		let value = self.read_value(cursor)?;
		let compare = Filter::compare(op, path, value);
		Ok(if negated { Filter::not(compare) } else { compare })
	}

	fn read_value(&self, cursor: &mut Cursor) -> Result<Value, ScimError> {
		cursor.mark();
		let start = cursor.marked();
		let read = self.reader.read_value(cursor);
		cursor.reset();

		let read = read
			.map_err(|err| {
				ScimError::filter(ParseErrorKind::InvalidComparisonValue(err.0), start)
			})?
			.ok_or_else(ScimError::end_of_filter)?;
		cursor.skip(read.consumed);
		Ok(read.value)
	}
}

/// Pops operators down to the nearest `(` or `not` marker, building one
/// flattened node per run of the same operator. Returns the marker, if any.
fn collapse(
	operators: &mut Vec<Operator>,
	operands: &mut Vec<Filter>,
) -> Result<Option<Operator>, ScimError> {
	loop {
		match operators.last().copied() {
			Some(op @ (Operator::And | Operator::Or)) => collapse_run(operators, operands, op)?,
			Some(marker) => {
				operators.pop();
				return Ok(Some(marker));
			}
			None => return Ok(None),
		}
	}
}

/// Replaces the run of `op` on top of the operator stack, and the operands it
/// joins, with a single node.
fn collapse_run(
	operators: &mut Vec<Operator>,
	operands: &mut Vec<Filter>,
	op: Operator,
) -> Result<(), ScimError> {
	let mut children = vec![operands.pop().ok_or_else(ScimError::end_of_filter)?];
	while operators.last() == Some(&op) {
		operators.pop();
		children.push(operands.pop().ok_or_else(ScimError::end_of_filter)?);
	}
	children.reverse();
	operands.push(match op {
		Operator::And => Filter::And(children),
		_ => Filter::Or(children),
	});
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filter::value::{ValueRead, ValueReadError};
	use serde_json::json;

	fn path(expression: &str) -> Path {
		Path::parse(expression).unwrap()
	}

	fn parse(expression: &str) -> Filter {
		FilterParser::parse(expression).unwrap()
	}

	fn parse_err(expression: &str) -> ScimError {
		FilterParser::parse(expression).unwrap_err()
	}

	#[test]
	fn test_and_binds_tighter_than_or() {
		assert_eq!(
			parse("a eq 1 and b eq 2 or c eq 3"),
			Filter::Or(vec![
				Filter::And(vec![
					Filter::eq(path("a"), json!(1)),
					Filter::eq(path("b"), json!(2)),
				]),
				Filter::eq(path("c"), json!(3)),
			])
		);
		assert_eq!(
			parse("a pr or b pr and c pr"),
			Filter::Or(vec![
				Filter::pr(path("a")),
				Filter::And(vec![Filter::pr(path("b")), Filter::pr(path("c"))]),
			])
		);
	}

	#[test]
	fn test_runs_are_flattened() {
		assert_eq!(
			parse("a pr or b pr and c pr or d pr"),
			Filter::Or(vec![
				Filter::pr(path("a")),
				Filter::And(vec![Filter::pr(path("b")), Filter::pr(path("c"))]),
				Filter::pr(path("d")),
			])
		);
		assert_eq!(
			parse("a pr and b pr and c pr"),
			Filter::And(vec![
				Filter::pr(path("a")),
				Filter::pr(path("b")),
				Filter::pr(path("c")),
			])
		);
	}

	#[test]
	fn test_parentheses_group() {
		assert_eq!(
			parse("a pr and (b pr or c pr)"),
			Filter::And(vec![
				Filter::pr(path("a")),
				Filter::Or(vec![Filter::pr(path("b")), Filter::pr(path("c"))]),
			])
		);
		assert_eq!(parse("((a pr))"), Filter::pr(path("a")));
	}

	#[test]
	fn test_not() {
		assert_eq!(
			parse("not (a eq 1 and b eq 2)"),
			Filter::not(Filter::And(vec![
				Filter::eq(path("a"), json!(1)),
				Filter::eq(path("b"), json!(2)),
			]))
		);
		assert_eq!(
			parse("NOT(a pr) or b pr"),
			Filter::Or(vec![Filter::not(Filter::pr(path("a"))), Filter::pr(path("b"))])
		);
	}

	#[test]
	fn test_ne_is_negated_eq() {
		assert_eq!(
			parse(r#"title ne "Tour Guide""#),
			Filter::not(Filter::eq(path("title"), "Tour Guide"))
		);
	}

	#[test]
	fn test_keywords_ignore_case() {
		assert_eq!(
			parse(r#"userName EQ "x" AND active Pr"#),
			Filter::And(vec![
				Filter::eq(path("userName"), "x"),
				Filter::pr(path("active")),
			])
		);
	}

	#[test]
	fn test_complex_value_filter() {
		assert_eq!(
			parse(r#"emails[type eq "work" and value co "@example.com"]"#),
			Filter::complex(
				path("emails"),
				Filter::And(vec![
					Filter::eq(path("type"), "work"),
					Filter::co(path("value"), "@example.com"),
				]),
			)
		);
		assert_eq!(
			parse(r#"emails[type eq "work"] or userName pr"#),
			Filter::Or(vec![
				Filter::complex(path("emails"), Filter::eq(path("type"), "work")),
				Filter::pr(path("userName")),
			])
		);
	}

	#[test]
	fn test_namespaced_attribute() {
		let filter = parse(
			r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber eq "701984""#,
		);
		let Filter::Compare { path, .. } = &filter else {
			panic!("expected comparison, got {filter:?}");
		};
		assert_eq!(
			path.namespace(),
			Some("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User")
		);
		assert_eq!(path.element(0).unwrap().attribute(), "employeeNumber");
	}

	#[test]
	fn test_values_of_every_json_type() {
		assert_eq!(parse("a eq null"), Filter::eq(path("a"), Value::Null));
		assert_eq!(parse("a eq false"), Filter::eq(path("a"), json!(false)));
		assert_eq!(parse("a gt 2.5"), Filter::gt(path("a"), json!(2.5)));
		assert_eq!(
			parse(r#"a eq ["x", 1]"#),
			Filter::eq(path("a"), json!(["x", 1]))
		);
		assert_eq!(
			parse(r#"(a eq "x")"#),
			Filter::eq(path("a"), json!("x"))
		);
	}

	#[test]
	fn test_missing_value() {
		let err = parse_err("a eq");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
		let err = parse_err("a eq   ");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
		let err = parse_err("a");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
	}

	#[test]
	fn test_unterminated_group() {
		let err = parse_err("(a eq 1");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
		let err = parse_err("not (a pr");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
	}

	#[test]
	fn test_unbalanced_parenthesis() {
		let err = parse_err("a pr)");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnbalancedParenthesis));
		assert_eq!(err.offset(), Some(4));
	}

	#[test]
	fn test_unrecognized_operator() {
		let err = parse_err("a ?? 1");
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::UnrecognizedOperator("??".to_string()))
		);
		assert_eq!(err.offset(), Some(2));
	}

	#[test]
	fn test_not_requires_parenthesis() {
		let err = parse_err("not a pr");
		assert_eq!(err.kind(), Some(&ParseErrorKind::ExpectedParenthesis));
		assert_eq!(err.offset(), Some(4));
		let err = parse_err("not");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
	}

	#[test]
	fn test_unexpected_tokens() {
		let err = parse_err("a pr b pr");
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::UnexpectedToken("b".to_string()))
		);
		let err = parse_err("a pr and ()");
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::UnexpectedToken(")".to_string()))
		);
		let err = parse_err("emails[]");
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::UnexpectedToken("]".to_string()))
		);
	}

	#[test]
	fn test_unterminated_value_filter() {
		let err = parse_err(r#"emails[type eq "work""#);
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfFilter));
	}

	#[test]
	fn test_invalid_value_reports_its_offset() {
		let err = parse_err("userName eq bjensen");
		assert!(matches!(
			err.kind(),
			Some(ParseErrorKind::InvalidComparisonValue(_))
		));
		assert_eq!(err.offset(), Some(12));
	}

	#[test]
	fn test_attribute_errors_become_filter_errors() {
		let err = parse_err("name. pr");
		assert_eq!(err.kind(), Some(&ParseErrorKind::UnexpectedEndOfPath));
		assert_eq!(err.error_type(), crate::ScimErrorType::InvalidFilter);
		assert_eq!(err.offset(), Some(4));

		let err = parse_err("urn:example:ext: pr");
		assert_eq!(err.kind(), Some(&ParseErrorKind::ExpectedAttributePath));
	}

	#[test]
	fn test_empty_filter() {
		assert_eq!(
			parse_err("").kind(),
			Some(&ParseErrorKind::UnexpectedEndOfFilter)
		);
		assert_eq!(
			parse_err("   ").kind(),
			Some(&ParseErrorKind::UnexpectedEndOfFilter)
		);
	}

	#[test]
	fn test_max_length() {
		let parser = FilterParser::default().max_length(8);
		assert!(parser.filter("a pr").is_ok());
		let err = parser.filter("userName pr").unwrap_err();
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::TooLong { length: 11, max: 8 })
		);
	}

	struct WordReader;

	impl ValueReader for WordReader {
		fn read_value(&self, cursor: &mut Cursor) -> Result<Option<ValueRead>, ValueReadError> {
			let rest = cursor.read_to_end();
			let text = rest.trim_start();
			let word: String = text.chars().take_while(|c| c.is_alphanumeric()).collect();
			if word.is_empty() {
				return Ok(None);
			}
			let consumed = rest.len() - text.len() + word.chars().count();
			Ok(Some(ValueRead {
				value: Value::String(word),
				consumed,
			}))
		}
	}

	#[test]
	fn test_nesting_depth_is_bounded() {
		let nested = |levels: usize| {
			format!("{}a pr{}", "not (".repeat(levels), ")".repeat(levels))
		};
		assert!(FilterParser::parse(&nested(MAX_DEPTH)).is_ok());

		let err = parse_err(&nested(50_000));
		assert_eq!(
			err.kind(),
			Some(&ParseErrorKind::TooDeep { max: MAX_DEPTH })
		);
		assert_eq!(err.offset(), Some(MAX_DEPTH * 5));

		let grouped = format!("{}a pr{}", "(a pr and ".repeat(300), ")".repeat(300));
		assert!(matches!(
			parse_err(&grouped).kind(),
			Some(ParseErrorKind::TooDeep { .. })
		));
	}

	#[test]
	fn test_custom_value_reader() {
		let parser = FilterParser::new(&WordReader);
		assert_eq!(
			parser.filter("userName eq bjensen and active pr").unwrap(),
			Filter::And(vec![
				Filter::eq(path("userName"), "bjensen"),
				Filter::pr(path("active")),
			])
		);
	}
}
