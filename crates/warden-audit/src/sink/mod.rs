// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Terminal loggers: where entries finally land.

pub mod file;
pub mod memory;
pub mod tracing;

pub use file::{format_json_line, read_json_lines, JsonLinesAuditLogger};
pub use memory::InMemoryAuditLogger;
pub use self::tracing::TracingAuditLogger;
