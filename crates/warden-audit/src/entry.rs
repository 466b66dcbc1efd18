// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The audit record and its canonical form.
//!
//! The canonical form is the compact JSON serialization of the entry with the
//! signature fields removed. Field order is the declaration order below and
//! map keys are sorted, so two parties serializing the same entry always
//! produce the same bytes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use warden_authz::{Attributes, AuthorizationRequest, Decision};

/// A flattened snapshot of one `(request, decision, duration)` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
	pub timestamp: DateTime<Utc>,
	#[serde(default)]
	pub user_id: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub organization_id: String,
	#[serde(default)]
	pub role: String,
	pub action: String,
	pub resource_type: String,
	#[serde(default)]
	pub resource_id: String,
	#[serde(default)]
	pub environment: Attributes,
	#[serde(default)]
	pub request_id: String,
	pub allowed: bool,
	pub reason: String,
	#[serde(default)]
	pub policy_ids: Vec<String>,
	/// Evaluation time, serialized as integer nanoseconds.
	#[serde(with = "duration_nanos")]
	pub duration: Duration,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub signature: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub public_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub signed_by: Option<String>,
}

impl AuditEntry {
	/// Builds the entry for a decision. The entry's timestamp is the decision's.
	pub fn from_decision(
		request: &AuthorizationRequest,
		decision: &Decision,
		duration: Duration,
	) -> Self {
		let (user_id, email, organization_id, role) = match &request.subject {
			Some(s) => (
				s.user_id.clone(),
				s.email.clone(),
				s.organization_id.clone(),
				s.organization_role.clone(),
			),
			None => Default::default(),
		};

		Self {
			timestamp: decision.timestamp,
			user_id,
			email,
			organization_id,
			role,
			action: request.action.clone(),
			resource_type: request.resource.resource_type.clone(),
			resource_id: request.resource.id.clone(),
			environment: request.environment.clone(),
			request_id: request.request_id().unwrap_or_default().to_string(),
			allowed: decision.allowed,
			reason: decision.reason.clone(),
			policy_ids: decision.policy_ids.clone(),
			duration,
			signature: None,
			public_key: None,
			signed_by: None,
		}
	}

	pub fn is_signed(&self) -> bool {
		self.signature.is_some()
	}

	pub fn clear_signature(&mut self) {
		self.signature = None;
		self.public_key = None;
		self.signed_by = None;
	}

	/// Canonical JSON bytes of the entry with signature fields cleared.
	pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
		let mut unsigned = self.clone();
		unsigned.clear_signature();
		serde_json::to_vec(&unsigned)
	}

	/// SHA-256 over [`AuditEntry::canonical_bytes`]. This is what gets signed.
	pub fn digest(&self) -> serde_json::Result<[u8; 32]> {
		let bytes = self.canonical_bytes()?;
		Ok(Sha256::digest(&bytes).into())
	}
}

mod duration_nanos {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
		serializer.serialize_u64(nanos)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_nanos)
	}
}
