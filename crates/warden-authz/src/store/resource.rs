// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{PolicyStore, ResourceStore};
use crate::attributes::{AttrValue, Attributes};
use crate::error::{StoreError, StoreResult};

/// Exposes policy documents as resources of type `policy`, so that policy
/// management itself is authorized through the engine.
pub struct PolicyResourceStore {
	policies: Arc<dyn PolicyStore>,
}

impl PolicyResourceStore {
	pub const RESOURCE_TYPE: &'static str = "policy";

	pub fn new(policies: Arc<dyn PolicyStore>) -> Self {
		Self { policies }
	}
}

#[async_trait]
impl ResourceStore for PolicyResourceStore {
	async fn get_resource_attributes(
		&self,
		resource_type: &str,
		id: &str,
	) -> StoreResult<Attributes> {
		if resource_type != Self::RESOURCE_TYPE {
			return Err(StoreError::resource_not_found(resource_type, id));
		}

		let policy = self.policies.get_policy(id).await?;
		let mut attrs = Attributes::new();
		attrs.insert(
			"organization_id".to_string(),
			AttrValue::from(policy.organization_id),
		);
		attrs.insert("name".to_string(), AttrValue::from(policy.name));
		attrs.insert("effect".to_string(), AttrValue::from(policy.effect.as_str()));
		attrs.insert("enabled".to_string(), AttrValue::Bool(policy.enabled));
		attrs.insert(
			"version".to_string(),
			AttrValue::Int(i64::try_from(policy.version).unwrap_or(i64::MAX)),
		);
		Ok(attrs)
	}
}

/// Routes attribute lookups to a per-type store, with an optional fallback.
#[derive(Default)]
pub struct CompositeResourceStore {
	routes: HashMap<String, Arc<dyn ResourceStore>>,
	fallback: Option<Arc<dyn ResourceStore>>,
}

impl CompositeResourceStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: route `resource_type` to `store`.
	pub fn with_route(
		mut self,
		resource_type: impl Into<String>,
		store: Arc<dyn ResourceStore>,
	) -> Self {
		self.routes.insert(resource_type.into(), store);
		self
	}

	/// Builder: store consulted for types without a route.
	pub fn with_fallback(mut self, store: Arc<dyn ResourceStore>) -> Self {
		self.fallback = Some(store);
		self
	}
}

#[async_trait]
impl ResourceStore for CompositeResourceStore {
	async fn get_resource_attributes(
		&self,
		resource_type: &str,
		id: &str,
	) -> StoreResult<Attributes> {
		match self.routes.get(resource_type).or(self.fallback.as_ref()) {
			Some(store) => store.get_resource_attributes(resource_type, id).await,
			None => Err(StoreError::resource_not_found(resource_type, id)),
		}
	}
}
