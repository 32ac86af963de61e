// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the SCIM filter engine.

pub mod filter;
pub mod logging;

pub use filter::{FilterConfig, FilterConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
