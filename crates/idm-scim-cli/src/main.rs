// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `scimq`: parse, evaluate and apply SCIM filters, paths and PATCH requests.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use idm_scim::ScimError;
use idm_scim_config::ScimConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(
	name = "scimq",
	about = "Query and patch SCIM resources from the command line",
	version
)]
struct Args {
	/// Configuration file (defaults to /etc/idm/scim.toml)
	#[arg(long, global = true, env = "IDM_SCIM_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Parse a filter and print its normalized form
	Parse {
		filter: String,

		/// Also print the parsed expression tree
		#[arg(long)]
		ast: bool,
	},
	/// Parse an attribute path and print its parts
	Path { path: String },
	/// Print the resources matching a filter
	Eval(commands::EvalArgs),
	/// Apply a PatchOp request to a resource
	Patch(commands::PatchArgs),
}

fn main() -> ExitCode {
	let args = Args::parse();

	let config = match load_config(args.config.as_deref()) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("error: {e:#}");
			return ExitCode::FAILURE;
		}
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	match run(args.command, &config) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			report(&e);
			ExitCode::FAILURE
		}
	}
}

fn load_config(path: Option<&std::path::Path>) -> Result<ScimConfig> {
	let config = match path {
		Some(path) => idm_scim_config::load_config_with_file(path)?,
		None => idm_scim_config::load_config()?,
	};
	Ok(config)
}

fn run(command: Command, config: &ScimConfig) -> Result<()> {
	let mut out = std::io::stdout().lock();
	match command {
		Command::Parse { filter, ast } => commands::parse(&mut out, config, &filter, ast),
		Command::Path { path } => commands::path(&mut out, config, &path),
		Command::Eval(args) => commands::eval(&mut out, config, &args),
		Command::Patch(args) => commands::patch(&mut out, config, &args),
	}
}

fn report(error: &anyhow::Error) {
	eprintln!("error: {error:#}");
	if let Some(scim) = error.downcast_ref::<ScimError>() {
		if let Ok(body) = serde_json::to_string_pretty(&scim.to_response()) {
			eprintln!("{body}");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_subcommand() {
		let args = Args::try_parse_from(["scimq", "parse", "userName pr", "--ast"]).unwrap();
		assert!(args.config.is_none());
		assert!(matches!(
			args.command,
			Command::Parse { ref filter, ast: true } if filter == "userName pr"
		));
	}

	#[test]
	fn test_global_config_flag() {
		let args =
			Args::try_parse_from(["scimq", "path", "name.givenName", "--config", "/tmp/scim.toml"])
				.unwrap();
		assert_eq!(args.config, Some(PathBuf::from("/tmp/scim.toml")));
		assert!(matches!(args.command, Command::Path { ref path } if path == "name.givenName"));
	}

	#[test]
	fn test_eval_arguments() {
		let args = Args::try_parse_from([
			"scimq",
			"eval",
			"active eq true",
			"--input",
			"users.json",
			"--schema",
			"a.json",
			"--schema",
			"b.json",
			"--list",
		])
		.unwrap();
		let Command::Eval(eval) = args.command else {
			panic!("expected eval");
		};
		assert_eq!(eval.filter, "active eq true");
		assert_eq!(eval.input, Some(PathBuf::from("users.json")));
		assert_eq!(eval.schema.len(), 2);
		assert!(eval.list);
	}

	#[test]
	fn test_patch_requires_request() {
		assert!(Args::try_parse_from(["scimq", "patch"]).is_err());
		let args = Args::try_parse_from(["scimq", "patch", "--request", "ops.json"]).unwrap();
		assert!(matches!(args.command, Command::Patch(ref p) if p.request == PathBuf::from("ops.json")));
	}

	#[test]
	fn test_missing_config_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("scim.toml");
		let err = load_config(Some(&path)).unwrap_err();
		assert!(err.to_string().contains("scim.toml"));
	}

	#[test]
	fn test_missing_subcommand() {
		assert!(Args::try_parse_from(["scimq"]).is_err());
	}
}
