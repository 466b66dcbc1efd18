// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced by policy and resource stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
	#[error("{kind} '{id}' not found")]
	NotFound { kind: &'static str, id: String },

	#[error("{kind} '{id}' already exists")]
	AlreadyExists { kind: &'static str, id: String },

	#[error("invalid {kind}: {message}")]
	Invalid { kind: &'static str, message: String },

	#[error("storage backend error: {0}")]
	Backend(String),
}

impl StoreError {
	pub fn policy_not_found(id: impl Into<String>) -> Self {
		StoreError::NotFound {
			kind: "policy",
			id: id.into(),
		}
	}

	pub fn resource_not_found(resource_type: &str, id: &str) -> Self {
		StoreError::NotFound {
			kind: "resource",
			id: format!("{resource_type}:{id}"),
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, StoreError::NotFound { .. })
	}
}

/// Failures that abort an evaluation.
///
/// These are never decisions: a caller receiving one has no answer, and must
/// not treat it as a deny without saying so.
#[derive(Error, Debug)]
pub enum EngineError {
	#[error("failed to load policies: {0}")]
	PolicyStore(#[source] StoreError),

	#[error("failed to resolve resource attributes: {0}")]
	ResourceAttributes(#[source] StoreError),

	#[error("evaluation exceeded deadline of {0:?}")]
	Timeout(Duration),
}

/// A caller-supplied policy field is missing or malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
	pub field: &'static str,
	pub message: String,
}

impl ValidationError {
	pub fn new(field: &'static str, message: impl Into<String>) -> Self {
		Self {
			field,
			message: message.into(),
		}
	}
}
