// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and decision types exchanged with the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::{AttrValue, Attributes};

pub const REASON_NO_SUBJECT: &str = "no authenticated subject";
pub const REASON_NO_ORGANIZATION: &str = "subject not associated with organization";
pub const REASON_EXPLICIT_DENY: &str = "access explicitly denied by policy";
pub const REASON_ALLOWED: &str = "access granted by policy";
pub const REASON_DEFAULT_DENY: &str = "no matching policy found (default deny)";

/// An authenticated principal, as produced by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
	pub user_id: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub provider: String,
	#[serde(default)]
	pub organization_id: String,
	#[serde(default)]
	pub organization_role: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub team_role: Option<String>,
	/// Free-form attributes supplied by the identity provider.
	#[serde(default)]
	pub attributes: Attributes,
}

impl Subject {
	pub fn new(
		user_id: impl Into<String>,
		organization_id: impl Into<String>,
		organization_role: impl Into<String>,
	) -> Self {
		Self {
			user_id: user_id.into(),
			organization_id: organization_id.into(),
			organization_role: organization_role.into(),
			..Default::default()
		}
	}

	/// Builder: set email.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = email.into();
		self
	}

	/// Builder: set team membership.
	pub fn with_team(mut self, team_id: impl Into<String>, team_role: impl Into<String>) -> Self {
		self.team_id = Some(team_id.into());
		self.team_role = Some(team_role.into());
		self
	}

	/// Builder: add a custom attribute.
	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}
}

/// A reference to the thing being accessed.
///
/// An empty `id` means the request is about the type as a whole (for example
/// creating a new plan), not a specific instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
	#[serde(rename = "type")]
	pub resource_type: String,
	#[serde(default)]
	pub id: String,
}

impl Resource {
	pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
		Self {
			resource_type: resource_type.into(),
			id: id.into(),
		}
	}

	/// A type-level resource reference.
	pub fn of_type(resource_type: impl Into<String>) -> Self {
		Self::new(resource_type, "")
	}

	pub fn is_type_level(&self) -> bool {
		self.id.is_empty()
	}

	/// The `type:id` string resource patterns are matched against.
	pub fn pattern_key(&self) -> String {
		format!("{}:{}", self.resource_type, self.id)
	}
}

/// Everything the engine needs to render one decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
	#[serde(default)]
	pub subject: Option<Subject>,
	pub action: String,
	pub resource: Resource,
	/// Request context: client IP, HTTP method, timestamp, request id, ...
	#[serde(default)]
	pub environment: Attributes,
}

impl AuthorizationRequest {
	pub fn new(subject: Option<Subject>, action: impl Into<String>, resource: Resource) -> Self {
		Self {
			subject,
			action: action.into(),
			resource,
			environment: Attributes::new(),
		}
	}

	/// Builder: add an environment attribute.
	pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.environment.insert(key.into(), value.into());
		self
	}

	/// The request id carried in `environment.request_id`, if it is a string.
	pub fn request_id(&self) -> Option<&str> {
		self.environment.get("request_id").and_then(AttrValue::as_str)
	}
}

/// The outcome of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
	pub allowed: bool,
	pub reason: String,
	/// The policies that determined the outcome; empty for default deny.
	pub policy_ids: Vec<String>,
	pub timestamp: DateTime<Utc>,
}

impl Decision {
	fn new(allowed: bool, reason: &str, policy_ids: Vec<String>) -> Self {
		Self {
			allowed,
			reason: reason.to_string(),
			policy_ids,
			timestamp: Utc::now(),
		}
	}

	pub fn allow(policy_ids: Vec<String>) -> Self {
		Self::new(true, REASON_ALLOWED, policy_ids)
	}

	pub fn explicit_deny(policy_ids: Vec<String>) -> Self {
		Self::new(false, REASON_EXPLICIT_DENY, policy_ids)
	}

	pub fn default_deny() -> Self {
		Self::new(false, REASON_DEFAULT_DENY, Vec::new())
	}

	pub fn no_subject() -> Self {
		Self::new(false, REASON_NO_SUBJECT, Vec::new())
	}

	pub fn no_organization() -> Self {
		Self::new(false, REASON_NO_ORGANIZATION, Vec::new())
	}
}
