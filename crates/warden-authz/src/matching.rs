// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Candidate selection: principal, action, resource and condition matching.
//!
//! Every function here fails closed. A malformed entry simply does not match;
//! nothing in this module can abort an evaluation.

use crate::attributes::AttributeContext;
use crate::policy::{Condition, Policy, Principal};
use crate::request::AuthorizationRequest;

/// Matches an action or resource pattern against a concrete value.
///
/// `*` matches everything, `prefix*` matches by prefix, anything else must be
/// equal.
pub fn matches_pattern(pattern: &str, value: &str) -> bool {
	if pattern == "*" || pattern == value {
		return true;
	}
	match pattern.strip_suffix('*') {
		Some(prefix) => value.starts_with(prefix),
		None => false,
	}
}

/// True if any pattern in `patterns` matches `value`.
pub fn matches_any(patterns: &[String], value: &str) -> bool {
	patterns.iter().any(|p| matches_pattern(p, value))
}

/// True if the policy applies to the subject described by `ctx`.
///
/// An empty principal list applies to everyone. Role entries compare against
/// the subject's `role` and `organization_role`; attribute entries run their
/// operator against the resolved subject attribute.
pub fn principal_matches(principals: &[Principal], ctx: &AttributeContext<'_>) -> bool {
	if principals.is_empty() {
		return true;
	}

	principals.iter().any(|principal| match principal {
		Principal::Role(entry) => ["role", "organization_role"].iter().any(|key| {
			ctx.subject
				.get(*key)
				.and_then(|v| v.as_str())
				.is_some_and(|role| !role.is_empty() && role == entry.role)
		}),
		Principal::Attribute(entry) => {
			let actual = ctx.resolve_subject(&entry.attribute);
			entry.operator.evaluate(actual, Some(&entry.value))
		}
	})
}

/// Evaluates one condition. A `$`-prefixed value is resolved before comparing.
pub fn condition_passes(condition: &Condition, ctx: &AttributeContext<'_>) -> bool {
	let left = ctx.resolve(&condition.attribute);
	let right = match condition.value.as_reference() {
		Some(path) => ctx.resolve(path),
		None => Some(&condition.value),
	};
	condition.operator.evaluate(left, right)
}

/// All conditions must pass; an empty list passes.
pub fn conditions_pass(conditions: &[Condition], ctx: &AttributeContext<'_>) -> bool {
	conditions.iter().all(|c| condition_passes(c, ctx))
}

/// True if the policy's principal, action and resource criteria all match.
///
/// Disabled policies are never candidates.
pub fn is_candidate(
	policy: &Policy,
	request: &AuthorizationRequest,
	resource_key: &str,
	ctx: &AttributeContext<'_>,
) -> bool {
	policy.enabled
		&& principal_matches(&policy.principals, ctx)
		&& matches_any(&policy.actions, &request.action)
		&& matches_any(&policy.resources, resource_key)
}
