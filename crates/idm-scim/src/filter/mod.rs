// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod ast;
pub mod eval;
pub mod parser;
mod tokenizer;
pub mod value;

pub use ast::{CompareOp, Filter};
pub use eval::{evaluate_filter, Evaluator};
pub use parser::FilterParser;
pub use value::{JsonValueReader, ValueRead, ValueReadError, ValueReader};
