// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tamper-evident audit trail for Warden authorization decisions.
//!
//! Loggers compose as decorators around a terminal sink:
//!
//! ```text
//! AuditedEngine -> FilteringAuditLogger -> AsyncAuditLogger -> SigningAuditLogger -> sink
//! ```
//!
//! [`AuditVerifier`] checks persisted entries offline, without a live engine.

pub mod audited;
pub mod entry;
pub mod error;
pub mod filter;
pub mod logger;
pub mod pipeline;
pub mod signing;
pub mod sink;
pub mod verify;

pub use audited::AuditedEngine;
pub use entry::AuditEntry;
pub use error::{AuditError, AuditResult, VerifyError};
pub use filter::{AuditFilterConfig, AuditMode, FilteringAuditLogger};
pub use logger::AuditLogger;
pub use pipeline::{AsyncAuditConfig, AsyncAuditLogger};
pub use signing::{sign_entry, AuditSigner, EcdsaAuditSigner, SigningAuditLogger};
pub use sink::{read_json_lines, InMemoryAuditLogger, JsonLinesAuditLogger, TracingAuditLogger};
pub use verify::{
	AuditVerifier, FileVerification, VerificationResult, VerificationSummary, VerifierConfig,
};
