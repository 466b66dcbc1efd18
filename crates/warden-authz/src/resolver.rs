// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::attributes::{AttrValue, Attributes};
use crate::cache::{AttributeCache, AttributeCacheConfig};
use crate::error::StoreResult;
use crate::request::Subject;
use crate::store::ResourceStore;

/// Turns subjects and resource references into flat attribute maps.
pub struct AttributeResolver {
	resources: Arc<dyn ResourceStore>,
	cache: AttributeCache,
}

impl AttributeResolver {
	/// Must be called inside a tokio runtime: the cache sweeper is spawned here.
	pub fn new(resources: Arc<dyn ResourceStore>, config: AttributeCacheConfig) -> Self {
		Self {
			resources,
			cache: AttributeCache::start(config),
		}
	}

	/// Flattens a subject. Custom attributes are applied last and win on collision.
	pub fn subject_attributes(&self, subject: &Subject) -> Attributes {
		let mut attrs = Attributes::new();
		let mut put = |key: &str, value: &str| {
			attrs.insert(key.to_string(), AttrValue::from(value));
		};

		put("user_id", subject.user_id.as_str());
		put("email", subject.email.as_str());
		put("provider", subject.provider.as_str());
		put("organization_id", subject.organization_id.as_str());
		put("organization_role", subject.organization_role.as_str());
		put("role", subject.organization_role.as_str());
		if let Some(team_id) = subject.team_id.as_deref() {
			put("team_id", team_id);
		}
		if let Some(team_role) = subject.team_role.as_deref() {
			put("team_role", team_role);
		}

		for (key, value) in &subject.attributes {
			attrs.insert(key.clone(), value.clone());
		}
		attrs
	}

	/// Attributes of one resource, stamped with `type` and `id`.
	///
	/// An empty `id` yields `{type}` without touching the store.
	#[instrument(skip(self))]
	pub async fn resource_attributes(
		&self,
		resource_type: &str,
		id: &str,
	) -> StoreResult<Attributes> {
		let mut attrs = Attributes::new();
		if id.is_empty() {
			attrs.insert("type".to_string(), AttrValue::from(resource_type));
			return Ok(attrs);
		}

		let key = AttributeCache::key(resource_type, id);
		let generation = self.cache.generation();
		if let Some(cached) = self.cache.get(&key).await {
			debug!("resource attributes served from cache");
			return Ok(cached);
		}

		attrs = self
			.resources
			.get_resource_attributes(resource_type, id)
			.await?;
		attrs.insert("type".to_string(), AttrValue::from(resource_type));
		attrs.insert("id".to_string(), AttrValue::from(id));

		if !self.cache.insert_if_unchanged(key, attrs.clone(), generation).await {
			debug!("cache invalidated during fetch; result not cached");
		}
		Ok(attrs)
	}

	/// Drops the cached attributes of one resource after a write.
	pub async fn invalidate(&self, resource_type: &str, id: &str) {
		self
			.cache
			.invalidate(&AttributeCache::key(resource_type, id))
			.await;
	}

	pub fn cache(&self) -> &AttributeCache {
		&self.cache
	}

	/// Stops the cache sweeper. Idempotent.
	pub async fn shutdown(&self) {
		self.cache.shutdown().await;
	}
}
