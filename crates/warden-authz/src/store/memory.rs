// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::builtin::built_in_policies;
use super::{PolicyStore, ResourceStore};
use crate::attributes::Attributes;
use crate::error::{StoreError, StoreResult};
use crate::policy::Policy;

/// Reference [`PolicyStore`] holding policies in a map behind a reader/writer lock.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
	policies: RwLock<HashMap<String, Policy>>,
}

impl InMemoryPolicyStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds the four standard tenant-role policies for `organization_id`.
	///
	/// Fails if any of them has been seeded already.
	#[instrument(skip(self))]
	pub async fn load_built_in_policies(&self, organization_id: &str) -> StoreResult<Vec<Policy>> {
		let mut created = Vec::new();
		for policy in built_in_policies(organization_id) {
			created.push(self.create_policy(policy).await?);
		}
		debug!(count = created.len(), "seeded built-in policies");
		Ok(created)
	}

	pub async fn len(&self) -> usize {
		self.policies.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.policies.read().await.is_empty()
	}

	async fn collect(&self, organization_id: &str, enabled_only: bool) -> Vec<Policy> {
		let policies = self.policies.read().await;
		let mut matching: Vec<Policy> = policies
			.values()
			.filter(|p| p.organization_id == organization_id)
			.filter(|p| !enabled_only || p.enabled)
			.cloned()
			.collect();
		matching.sort_by(|a, b| a.id.cmp(&b.id));
		matching
	}
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
	async fn load_policies(&self, organization_id: &str) -> StoreResult<Vec<Policy>> {
		Ok(self.collect(organization_id, true).await)
	}

	async fn list_policies(&self, organization_id: &str) -> StoreResult<Vec<Policy>> {
		Ok(self.collect(organization_id, false).await)
	}

	async fn get_policy(&self, id: &str) -> StoreResult<Policy> {
		self
			.policies
			.read()
			.await
			.get(id)
			.cloned()
			.ok_or_else(|| StoreError::policy_not_found(id))
	}

	#[instrument(
		skip(self, policy),
		fields(policy_id = %policy.id, organization_id = %policy.organization_id)
	)]
	async fn create_policy(&self, mut policy: Policy) -> StoreResult<Policy> {
		if policy.id.is_empty() {
			return Err(StoreError::Invalid {
				kind: "policy",
				message: "policy id is required".to_string(),
			});
		}
		if policy.organization_id.is_empty() {
			return Err(StoreError::Invalid {
				kind: "policy",
				message: "organization id is required".to_string(),
			});
		}

		let mut policies = self.policies.write().await;
		if policies.contains_key(&policy.id) {
			return Err(StoreError::AlreadyExists {
				kind: "policy",
				id: policy.id,
			});
		}

		let now = Utc::now();
		policy.created_at = now;
		policy.updated_at = now;
		if policy.version == 0 {
			policy.version = 1;
		}

		policies.insert(policy.id.clone(), policy.clone());
		debug!("policy created");
		Ok(policy)
	}

	#[instrument(skip(self, policy), fields(policy_id = %policy.id))]
	async fn update_policy(&self, mut policy: Policy) -> StoreResult<Policy> {
		let mut policies = self.policies.write().await;
		let existing = policies
			.get(&policy.id)
			.ok_or_else(|| StoreError::policy_not_found(&policy.id))?;

		policy.organization_id = existing.organization_id.clone();
		policy.created_at = existing.created_at;
		policy.version = existing.version + 1;
		policy.updated_at = Utc::now();

		policies.insert(policy.id.clone(), policy.clone());
		debug!(version = policy.version, "policy updated");
		Ok(policy)
	}

	#[instrument(skip(self))]
	async fn delete_policy(&self, id: &str) -> StoreResult<()> {
		match self.policies.write().await.remove(id) {
			Some(_) => {
				debug!("policy deleted");
				Ok(())
			}
			None => Err(StoreError::policy_not_found(id)),
		}
	}
}

/// Reference [`ResourceStore`] keyed by `(type, id)`.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
	resources: RwLock<HashMap<(String, String), Attributes>>,
}

impl InMemoryResourceStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores a copy of `attributes` for the resource, replacing any previous set.
	pub async fn set_resource_attributes(
		&self,
		resource_type: &str,
		id: &str,
		attributes: Attributes,
	) {
		self
			.resources
			.write()
			.await
			.insert((resource_type.to_string(), id.to_string()), attributes);
	}

	pub async fn remove_resource(&self, resource_type: &str, id: &str) -> bool {
		self
			.resources
			.write()
			.await
			.remove(&(resource_type.to_string(), id.to_string()))
			.is_some()
	}
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
	async fn get_resource_attributes(
		&self,
		resource_type: &str,
		id: &str,
	) -> StoreResult<Attributes> {
		self
			.resources
			.read()
			.await
			.get(&(resource_type.to_string(), id.to_string()))
			.cloned()
			.ok_or_else(|| StoreError::resource_not_found(resource_type, id))
	}
}
