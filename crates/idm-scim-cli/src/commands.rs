// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use idm_scim::types::SCHEMA_LIST_RESPONSE;
use idm_scim::{Evaluator, FilterParser, ListResponse, PatchRequest, Schema, SchemaRegistry};
use idm_scim_config::ScimConfig;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, clap::Args)]
pub struct EvalArgs {
	/// Filter expression, e.g. `userName eq "bjensen"`
	pub filter: String,

	/// JSON resource, array of resources or ListResponse (stdin when omitted)
	#[arg(long)]
	pub input: Option<PathBuf>,

	/// Schema document(s) to register in addition to the core schemas
	#[arg(long)]
	pub schema: Vec<PathBuf>,

	/// Print matches as a ListResponse instead of one resource per line
	#[arg(long)]
	pub list: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PatchArgs {
	/// PatchOp request document
	#[arg(long)]
	pub request: PathBuf,

	/// Resource to patch (stdin when omitted)
	#[arg(long)]
	pub input: Option<PathBuf>,
}

fn parser(config: &ScimConfig) -> FilterParser<'static> {
	FilterParser::default().max_length(config.filter.max_length)
}

pub fn parse(out: &mut impl Write, config: &ScimConfig, expression: &str, ast: bool) -> Result<()> {
	let filter = parser(config).filter(expression)?;
	writeln!(out, "{filter}")?;
	if ast {
		writeln!(out, "{filter:#?}")?;
	}
	Ok(())
}

pub fn path(out: &mut impl Write, config: &ScimConfig, expression: &str) -> Result<()> {
	let path = parser(config).path(expression)?;
	if let Some(namespace) = path.namespace() {
		writeln!(out, "namespace: {namespace}")?;
	}
	for (index, element) in path.iter().enumerate() {
		match element.filter() {
			Some(filter) => writeln!(out, "{index}: {} [{filter}]", element.attribute())?,
			None => writeln!(out, "{index}: {}", element.attribute())?,
		}
	}
	Ok(())
}

pub fn eval(out: &mut impl Write, config: &ScimConfig, args: &EvalArgs) -> Result<()> {
	let filter = parser(config).filter(&args.filter)?;
	let registry = load_schemas(config.filter.schemas.iter().chain(&args.schema))?;
	let evaluator = Evaluator::new(&registry)
		.key_policy(config.filter.key_policy)
		.case_exact_default(config.filter.case_exact_default);

	let input = read_json(args.input.as_deref())?;
	let resources = resources(input)?;
	let total = resources.len();
	let matched: Vec<Value> = resources
		.into_iter()
		.filter(|resource| evaluator.matches(&filter, resource))
		.collect();
	debug!(total, matched = matched.len(), "evaluated filter");

	if args.list {
		let response = ListResponse::from_resources(matched);
		writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
	} else {
		for resource in &matched {
			writeln!(out, "{}", serde_json::to_string(resource)?)?;
		}
	}
	Ok(())
}

pub fn patch(out: &mut impl Write, config: &ScimConfig, args: &PatchArgs) -> Result<()> {
	let text = std::fs::read_to_string(&args.request)
		.with_context(|| format!("failed to read {}", args.request.display()))?;
	let request: PatchRequest = serde_json::from_str(&text)
		.with_context(|| format!("invalid PatchOp request in {}", args.request.display()))?;

	let mut resource = read_json(args.input.as_deref())?;
	if !resource.is_object() {
		bail!("the resource to patch must be a JSON object");
	}

	let registry = load_schemas(config.filter.schemas.iter())?;
	let evaluator = Evaluator::new(&registry)
		.key_policy(config.filter.key_policy)
		.case_exact_default(config.filter.case_exact_default);
	request.apply(&mut resource, &evaluator)?;

	writeln!(out, "{}", serde_json::to_string_pretty(&resource)?)?;
	Ok(())
}

/// Builds a registry of the core schemas plus every schema found in `paths`.
/// A file holds either one schema or an array of them.
fn load_schemas<'p>(paths: impl IntoIterator<Item = &'p PathBuf>) -> Result<SchemaRegistry> {
	let mut registry = SchemaRegistry::core();
	for path in paths {
		let text = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read schema {}", path.display()))?;
		let value: Value = serde_json::from_str(&text)
			.with_context(|| format!("invalid JSON in schema {}", path.display()))?;
		let schemas: Vec<Schema> = match value {
			Value::Array(_) => serde_json::from_value(value),
			other => serde_json::from_value(other).map(|schema| vec![schema]),
		}
		.with_context(|| format!("invalid schema definition in {}", path.display()))?;
		for schema in schemas {
			registry.register(schema);
		}
	}
	Ok(registry)
}

fn read_json(input: Option<&Path>) -> Result<Value> {
	let text = match input {
		Some(path) => std::fs::read_to_string(path)
			.with_context(|| format!("failed to read {}", path.display()))?,
		None => {
			let mut text = String::new();
			std::io::stdin()
				.read_to_string(&mut text)
				.context("failed to read stdin")?;
			text
		}
	};
	serde_json::from_str(&text).context("input is not valid JSON")
}

fn is_list_response(object: &serde_json::Map<String, Value>) -> bool {
	let tagged = object
		.get("schemas")
		.and_then(Value::as_array)
		.is_some_and(|schemas| schemas.iter().any(|s| s.as_str() == Some(SCHEMA_LIST_RESPONSE)));
	tagged || object.contains_key("Resources")
}

/// Splits input into resources: a single object, an array of objects, or
/// the `Resources` of a ListResponse. Non-object entries are skipped.
fn resources(input: Value) -> Result<Vec<Value>> {
	let entries = match input {
		Value::Object(object) if is_list_response(&object) => {
			let response: ListResponse<Value> =
				serde_json::from_value(Value::Object(object)).context("invalid ListResponse")?;
			response.resources
		}
		Value::Object(object) => return Ok(vec![Value::Object(object)]),
		Value::Array(entries) => entries,
		_ => bail!("input must be a JSON object, an array or a ListResponse"),
	};

	Ok(entries
		.into_iter()
		.enumerate()
		.filter_map(|(index, entry)| {
			if entry.is_object() {
				Some(entry)
			} else {
				warn!(index, "skipping input entry that is not a JSON object");
				None
			}
		})
		.collect())
}
