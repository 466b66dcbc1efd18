// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The standard tenant-role policy set.
//!
//! | role   | grants                                                        |
//! |--------|---------------------------------------------------------------|
//! | owner  | every action on every resource                                |
//! | admin  | approve/create/update/delete/read, same-organization resources |
//! | member | create/read/update                                            |
//! | viewer | read/list                                                     |

use crate::policy::{Condition, Effect, Operator, Policy, Principal, PrincipalScope};

/// Resource types the built-in role policies enumerate actions for.
pub const STANDARD_RESOURCE_TYPES: &[&str] = &["plan", "build", "workflow", "team", "policy"];

/// Roles with a built-in policy, most privileged first.
pub const BUILT_IN_ROLES: &[&str] = &["owner", "admin", "member", "viewer"];

fn actions_for(verbs: &[&str]) -> Vec<String> {
	STANDARD_RESOURCE_TYPES
		.iter()
		.flat_map(|ty| verbs.iter().map(move |verb| format!("{ty}:{verb}")))
		.collect()
}

fn role_policy(organization_id: &str, role: &str, description: &str) -> Policy {
	Policy::new(
		format!("builtin-{role}-{organization_id}"),
		organization_id,
		format!("built-in {role}"),
		Effect::Allow,
	)
	.with_description(description)
	.with_principal(Principal::role(role, PrincipalScope::Organization))
	.with_resources(["*"])
}

/// Builds the four standard role policies for an organization.
pub fn built_in_policies(organization_id: &str) -> Vec<Policy> {
	vec![
		role_policy(organization_id, "owner", "Organization owners may do anything")
			.with_actions(["*"]),
		role_policy(
			organization_id,
			"admin",
			"Organization admins manage resources of their own organization",
		)
		.with_actions(actions_for(&["approve", "create", "update", "delete", "read"]))
		.with_condition(Condition::new(
			"$resource.organization_id",
			Operator::Equals,
			"$subject.organization_id",
		)),
		role_policy(
			organization_id,
			"member",
			"Organization members create, read and update resources",
		)
		.with_actions(actions_for(&["create", "read", "update"])),
		role_policy(organization_id, "viewer", "Organization viewers have read-only access")
			.with_actions(actions_for(&["read", "list"])),
	]
}
