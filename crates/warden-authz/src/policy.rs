// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant-scoped policy documents.
//!
//! A [`Policy`] grants or denies a set of actions on a set of resource
//! patterns to a set of principals, optionally guarded by conditions.
//! Policies are plain values: the engine only ever reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::AttrValue;
use crate::error::ValidationError;

/// Whether a matching policy grants or refuses access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
	Allow,
	Deny,
}

impl Effect {
	pub fn as_str(&self) -> &'static str {
		match self {
			Effect::Allow => "allow",
			Effect::Deny => "deny",
		}
	}
}

impl std::fmt::Display for Effect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Effect {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"allow" => Ok(Effect::Allow),
			"deny" => Ok(Effect::Deny),
			other => Err(ValidationError::new(
				"effect",
				format!("invalid effect '{other}', expected 'allow' or 'deny'"),
			)),
		}
	}
}

/// Comparison operators available to conditions and attribute principals.
///
/// Unrecognised operator names deserialize to [`Operator::Unknown`], which
/// never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
	Equals,
	NotEquals,
	In,
	NotIn,
	GreaterThan,
	LessThan,
	GreaterThanOrEqual,
	LessThanOrEqual,
	StringLike,
	Exists,
	NotExists,
	#[serde(other)]
	Unknown,
}

/// The organisational level a role principal applies at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalScope {
	#[default]
	Organization,
	Team,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolePrincipal {
	pub role: String,
	#[serde(default)]
	pub scope: PrincipalScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributePrincipal {
	pub attribute: String,
	pub operator: Operator,
	#[serde(default)]
	pub value: AttrValue,
}

/// Who a policy applies to: either a role or an attribute predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
	Role(RolePrincipal),
	Attribute(AttributePrincipal),
}

impl Principal {
	pub fn role(role: impl Into<String>, scope: PrincipalScope) -> Self {
		Principal::Role(RolePrincipal {
			role: role.into(),
			scope,
		})
	}

	pub fn attribute(
		attribute: impl Into<String>,
		operator: Operator,
		value: impl Into<AttrValue>,
	) -> Self {
		Principal::Attribute(AttributePrincipal {
			attribute: attribute.into(),
			operator,
			value: value.into(),
		})
	}
}

/// A guard on a policy. All conditions of a policy must pass.
///
/// `value` may itself be a `$`-prefixed attribute path, in which case it is
/// resolved before comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
	pub attribute: String,
	pub operator: Operator,
	#[serde(default)]
	pub value: AttrValue,
}

impl Condition {
	pub fn new(
		attribute: impl Into<String>,
		operator: Operator,
		value: impl Into<AttrValue>,
	) -> Self {
		Self {
			attribute: attribute.into(),
			operator,
			value: value.into(),
		}
	}
}

fn default_enabled() -> bool {
	true
}

/// An authorization rule owned by one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
	pub id: String,
	pub organization_id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	/// Starts at 1 and increases by one on every update. Zero means "unset".
	#[serde(default)]
	pub version: u64,
	pub effect: Effect,
	/// Empty matches every principal.
	#[serde(default)]
	pub principals: Vec<Principal>,
	pub actions: Vec<String>,
	pub resources: Vec<String>,
	#[serde(default)]
	pub conditions: Vec<Condition>,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	#[serde(default = "Utc::now")]
	pub created_at: DateTime<Utc>,
	#[serde(default = "Utc::now")]
	pub updated_at: DateTime<Utc>,
}

impl Policy {
	/// Creates an enabled policy with no principals, actions, resources or conditions.
	pub fn new(
		id: impl Into<String>,
		organization_id: impl Into<String>,
		name: impl Into<String>,
		effect: Effect,
	) -> Self {
		let now = Utc::now();
		Self {
			id: id.into(),
			organization_id: organization_id.into(),
			name: name.into(),
			description: String::new(),
			version: 0,
			effect,
			principals: Vec::new(),
			actions: Vec::new(),
			resources: Vec::new(),
			conditions: Vec::new(),
			enabled: true,
			created_at: now,
			updated_at: now,
		}
	}

	/// Builder: set description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	/// Builder: add a principal.
	pub fn with_principal(mut self, principal: Principal) -> Self {
		self.principals.push(principal);
		self
	}

	/// Builder: add actions.
	pub fn with_actions<I, S>(mut self, actions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.actions.extend(actions.into_iter().map(Into::into));
		self
	}

	/// Builder: add resource patterns.
	pub fn with_resources<I, S>(mut self, resources: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.resources.extend(resources.into_iter().map(Into::into));
		self
	}

	/// Builder: add a condition.
	pub fn with_condition(mut self, condition: Condition) -> Self {
		self.conditions.push(condition);
		self
	}

	/// Builder: set enabled.
	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	/// Checks the fields a caller must supply for the policy to be usable.
	///
	/// Identity (`id`, `organization_id`) is checked by the store, not here.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.name.trim().is_empty() {
			return Err(ValidationError::new("name", "name is required"));
		}
		if self.actions.is_empty() {
			return Err(ValidationError::new(
				"actions",
				"at least one action is required",
			));
		}
		if self.resources.is_empty() {
			return Err(ValidationError::new(
				"resources",
				"at least one resource is required",
			));
		}
		Ok(())
	}
}
