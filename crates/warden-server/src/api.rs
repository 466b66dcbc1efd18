// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router assembly.

use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::{get, post};
use axum::Router;
use warden_audit::AuditedEngine;
use warden_authz::{PolicyResourceStore, PolicyStore};

use crate::authz_middleware::RequireAuthorization;
use crate::routes::{health, policies};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
	pub policies: Arc<dyn PolicyStore>,
	pub engine: AuditedEngine,
}

impl AppState {
	pub fn new(policies: Arc<dyn PolicyStore>, engine: AuditedEngine) -> Self {
		Self { policies, engine }
	}

	fn authorize(&self, action: &str) -> RequireAuthorization {
		RequireAuthorization::new(
			self.engine.clone(),
			action,
			PolicyResourceStore::RESOURCE_TYPE,
		)
	}
}

/// Builds the application router.
///
/// Identity is not established here: callers stack an identity layer (for
/// example [`crate::identity::TrustedHeaders`]) on the returned router.
pub fn create_router(state: AppState) -> Router {
	let policy_routes = Router::new()
		.route(
			"/policies",
			get(policies::list_policies.layer(state.authorize("policy:read")))
				.post(policies::create_policy.layer(state.authorize("policy:create"))),
		)
		.route(
			"/policies/simulate",
			post(policies::simulate.layer(state.authorize("policy:read"))),
		)
		.route(
			"/policies/{id}",
			get(policies::get_policy.layer(state.authorize("policy:read")))
				.put(policies::update_policy.layer(state.authorize("policy:update")))
				.delete(policies::delete_policy.layer(state.authorize("policy:delete"))),
		);

	Router::new()
		.route("/health", get(health::health))
		.merge(policy_routes)
		.with_state(state)
}
