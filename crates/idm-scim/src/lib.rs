// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SCIM 2.0 (RFC 7644) path and filter expressions.
//!
//! This crate provides:
//! - [`Path`]: attribute paths with optional schema URN and value filters
//! - [`Filter`]: the filter AST, built by [`FilterParser`]
//! - [`Evaluator`]: in-memory matching of filters against JSON documents,
//!   with case sensitivity driven by [`AttributeDefinitions`]
//! - [`PatchRequest`]: PATCH operations addressed by [`Path`]
//!
//! # Usage
//!
//! ```
//! use idm_scim::{evaluate_filter, Filter};
//! use serde_json::json;
//!
//! let filter = Filter::parse(r#"emails[type eq "work"] and active eq true"#).unwrap();
//! let user = json!({
//!     "active": true,
//!     "emails": [{ "type": "work", "value": "bjensen@example.com" }]
//! });
//! assert!(evaluate_filter(&filter, &user));
//! ```

pub mod cursor;
pub mod document;
pub mod error;
pub mod filter;
pub mod patch;
pub mod path;
pub mod schema;
pub mod types;

pub use cursor::Cursor;
pub use document::{KeyPolicy, NamespaceScope};
pub use error::{ParseErrorKind, ScimError, ScimErrorResponse, ScimErrorType};
pub use filter::{
	evaluate_filter, CompareOp, Evaluator, Filter, FilterParser, JsonValueReader, ValueRead,
	ValueReadError, ValueReader,
};
pub use patch::{PatchOp, PatchOperation, PatchRequest};
pub use path::{Element, Path};
pub use schema::{AttributeDefinitions, AttributeType, Schema, SchemaAttribute, SchemaRegistry};
pub use types::ListResponse;
