// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
	#[error("failed to serialize audit entry: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("audit I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to sign audit entry: {0}")]
	Signing(String),

	#[error("audit logger is closed")]
	Closed,

	#[error("audit sink '{sink}' error: {message}")]
	Sink { sink: String, message: String },
}

/// Structural problems that make an entry unverifiable.
///
/// A well-formed entry whose signature does not check out is not an error;
/// it is a `valid = false` verification result.
#[derive(Error, Debug)]
pub enum VerifyError {
	#[error("invalid base64 in {field}: {source}")]
	InvalidEncoding {
		field: &'static str,
		#[source]
		source: base64::DecodeError,
	},

	#[error("invalid public key: {0}")]
	InvalidPublicKey(String),

	#[error("signature must be 64 bytes, got {0}")]
	InvalidSignatureLength(usize),

	#[error("failed to canonicalize entry: {0}")]
	Serialization(#[from] serde_json::Error),
}
