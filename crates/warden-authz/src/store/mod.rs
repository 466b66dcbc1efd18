// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage contracts consumed by the engine and the attribute resolver.
//!
//! Any backend (in-memory, relational, document store) must honour the same
//! failure semantics:
//!
//! - `create_policy` fails on an empty `id`/`organization_id` or a duplicate `id`
//! - `update_policy`, `delete_policy` and `get_policy` fail on a missing `id`
//! - every returned value is an independent copy
//!
//! Futures returned by these traits may be dropped at any await point; a
//! network-backed implementation must tolerate that as cancellation.

mod builtin;
mod memory;
mod resource;

pub use builtin::{built_in_policies, BUILT_IN_ROLES, STANDARD_RESOURCE_TYPES};
pub use memory::{InMemoryPolicyStore, InMemoryResourceStore};
pub use resource::{CompositeResourceStore, PolicyResourceStore};

use async_trait::async_trait;

use crate::attributes::Attributes;
use crate::error::StoreResult;
use crate::policy::Policy;

/// Persistence boundary for policies.
#[async_trait]
pub trait PolicyStore: Send + Sync {
	/// Enabled policies of one organization.
	async fn load_policies(&self, organization_id: &str) -> StoreResult<Vec<Policy>>;

	/// Every policy of one organization, enabled or not.
	async fn list_policies(&self, organization_id: &str) -> StoreResult<Vec<Policy>>;

	async fn get_policy(&self, id: &str) -> StoreResult<Policy>;

	/// Stores a new policy, stamping timestamps and defaulting `version` to 1.
	async fn create_policy(&self, policy: Policy) -> StoreResult<Policy>;

	/// Replaces an existing policy, preserving `created_at` and bumping `version`.
	async fn update_policy(&self, policy: Policy) -> StoreResult<Policy>;

	async fn delete_policy(&self, id: &str) -> StoreResult<()>;
}

/// Source of resource attributes, owned by whichever subsystem owns the resource.
#[async_trait]
pub trait ResourceStore: Send + Sync {
	async fn get_resource_attributes(&self, resource_type: &str, id: &str)
		-> StoreResult<Attributes>;
}
