// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation engine.
//!
//! Evaluation is default-deny with explicit deny overriding allow:
//!
//! 1. Reject requests without a subject or without an organization
//! 2. Load the organization's enabled policies
//! 3. Resolve subject and (for instance-level requests) resource attributes
//! 4. Select candidates by principal, action and resource
//! 5. Keep candidates whose conditions all pass, bucketed by effect
//! 6. Any deny wins; otherwise any allow grants; otherwise deny
//!
//! Store failures abort the evaluation with an [`EngineError`]. They are never
//! turned into a deny decision.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::attributes::{AttributeContext, Attributes};
use crate::cache::AttributeCacheConfig;
use crate::error::{EngineError, EngineResult};
use crate::matching::{conditions_pass, is_candidate};
use crate::policy::{Effect, Policy};
use crate::request::{AuthorizationRequest, Decision};
use crate::resolver::AttributeResolver;
use crate::store::{PolicyStore, ResourceStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
	/// Upper bound on one evaluation, store calls included. `None` waits indefinitely.
	#[serde(default)]
	pub evaluation_timeout_ms: Option<u64>,
}

impl EngineConfig {
	pub fn evaluation_timeout(&self) -> Option<Duration> {
		self.evaluation_timeout_ms.map(Duration::from_millis)
	}
}

/// Renders authorization decisions. Safe to share across tasks.
pub struct Engine {
	policies: Arc<dyn PolicyStore>,
	resolver: Arc<AttributeResolver>,
	config: EngineConfig,
}

impl Engine {
	pub fn new(
		policies: Arc<dyn PolicyStore>,
		resolver: Arc<AttributeResolver>,
		config: EngineConfig,
	) -> Self {
		Self {
			policies,
			resolver,
			config,
		}
	}

	/// Builds an engine with a default-configured resolver over `resources`.
	pub fn with_stores(policies: Arc<dyn PolicyStore>, resources: Arc<dyn ResourceStore>) -> Self {
		let resolver = AttributeResolver::new(resources, AttributeCacheConfig::default());
		Self::new(policies, Arc::new(resolver), EngineConfig::default())
	}

	pub fn resolver(&self) -> &Arc<AttributeResolver> {
		&self.resolver
	}

	pub fn policy_store(&self) -> &Arc<dyn PolicyStore> {
		&self.policies
	}

	/// Evaluates one request.
	///
	/// Dropping the returned future cancels the evaluation and any store call
	/// in flight.
	#[instrument(
		level = "debug",
		skip(self, request),
		fields(
			action = %request.action,
			resource_type = %request.resource.resource_type,
			resource_id = %request.resource.id,
		)
	)]
	pub async fn evaluate(&self, request: &AuthorizationRequest) -> EngineResult<Decision> {
		let decision = match self.config.evaluation_timeout() {
			Some(limit) => tokio::time::timeout(limit, self.evaluate_inner(request))
				.await
				.unwrap_or_else(|_| Err(EngineError::Timeout(limit))),
			None => self.evaluate_inner(request).await,
		};

		match &decision {
			Ok(decision) => debug!(
				allowed = decision.allowed,
				reason = %decision.reason,
				policy_ids = ?decision.policy_ids,
				"authorization decision"
			),
			Err(e) => error!(error = %e, "authorization evaluation failed"),
		}
		decision
	}

	async fn evaluate_inner(&self, request: &AuthorizationRequest) -> EngineResult<Decision> {
		let Some(subject) = request.subject.as_ref() else {
			return Ok(Decision::no_subject());
		};
		if subject.organization_id.is_empty() {
			return Ok(Decision::no_organization());
		}

		let policies = self
			.policies
			.load_policies(&subject.organization_id)
			.await
			.map_err(EngineError::PolicyStore)?;

		let subject_attrs = self.resolver.subject_attributes(subject);
		let resource_attrs = if request.resource.is_type_level() {
			Attributes::new()
		} else {
			self
				.resolver
				.resource_attributes(&request.resource.resource_type, &request.resource.id)
				.await
				.map_err(EngineError::ResourceAttributes)?
		};

		Ok(evaluate_policies(
			&policies,
			request,
			&subject_attrs,
			&resource_attrs,
		))
	}
}

/// The pure half of evaluation: decides a request against already-loaded
/// policies and already-resolved attributes.
pub fn evaluate_policies(
	policies: &[Policy],
	request: &AuthorizationRequest,
	subject_attrs: &Attributes,
	resource_attrs: &Attributes,
) -> Decision {
	let ctx = AttributeContext::new(subject_attrs, resource_attrs, &request.environment);
	let resource_key = request.resource.pattern_key();

	let mut allow = Vec::new();
	let mut deny = Vec::new();
	for policy in policies {
		if !is_candidate(policy, request, &resource_key, &ctx) {
			continue;
		}
		if !conditions_pass(&policy.conditions, &ctx) {
			continue;
		}
		match policy.effect {
			Effect::Allow => allow.push(policy.id.clone()),
			Effect::Deny => deny.push(policy.id.clone()),
		}
	}

	if !deny.is_empty() {
		Decision::explicit_deny(deny)
	} else if !allow.is_empty() {
		Decision::allow(allow)
	} else {
		Decision::default_deny()
	}
}
