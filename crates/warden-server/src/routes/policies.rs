// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy management handlers.
//!
//! Route-level authorization has already run when these execute; handlers add
//! the tenant check, so a policy belonging to another organization is a 403
//! even when the caller's own policies would grant the action.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use warden_authz::{
	AuthorizationRequest, Condition, Decision, Effect, Policy, PolicyResourceStore, Principal,
	Subject,
};

use crate::api::AppState;
use crate::error::ApiError;
use crate::identity::CurrentSubject;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePolicyRequest {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub effect: Effect,
	#[serde(default)]
	pub principals: Vec<Principal>,
	#[serde(default)]
	pub actions: Vec<String>,
	#[serde(default)]
	pub resources: Vec<String>,
	#[serde(default)]
	pub conditions: Vec<Condition>,
	#[serde(default)]
	pub enabled: Option<bool>,
}

/// Every field optional; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePolicyRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	pub effect: Option<Effect>,
	pub principals: Option<Vec<Principal>>,
	pub actions: Option<Vec<String>>,
	pub resources: Option<Vec<String>>,
	pub conditions: Option<Vec<Condition>>,
	pub enabled: Option<bool>,
}

impl UpdatePolicyRequest {
	fn apply(self, policy: &mut Policy) -> Result<(), ApiError> {
		if matches!(&self.actions, Some(a) if a.is_empty()) {
			return Err(ApiError::BadRequest {
				message: "actions cannot be set empty".to_string(),
				details: Some(serde_json::json!({ "field": "actions" })),
			});
		}
		if matches!(&self.resources, Some(r) if r.is_empty()) {
			return Err(ApiError::BadRequest {
				message: "resources cannot be set empty".to_string(),
				details: Some(serde_json::json!({ "field": "resources" })),
			});
		}

		if let Some(name) = self.name {
			policy.name = name;
		}
		if let Some(description) = self.description {
			policy.description = description;
		}
		if let Some(effect) = self.effect {
			policy.effect = effect;
		}
		if let Some(principals) = self.principals {
			policy.principals = principals;
		}
		if let Some(actions) = self.actions {
			policy.actions = actions;
		}
		if let Some(resources) = self.resources {
			policy.resources = resources;
		}
		if let Some(conditions) = self.conditions {
			policy.conditions = conditions;
		}
		if let Some(enabled) = self.enabled {
			policy.enabled = enabled;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyListResponse {
	pub policies: Vec<Policy>,
}

fn ensure_same_tenant(subject: &Subject, policy: &Policy) -> Result<(), ApiError> {
	if policy.organization_id != subject.organization_id {
		info!(
			user_id = %subject.user_id,
			policy_id = %policy.id,
			"cross-organization policy access refused"
		);
		return Err(ApiError::forbidden());
	}
	Ok(())
}

/// POST /policies
#[instrument(skip(state, subject, body), fields(user_id = %subject.user_id))]
pub async fn create_policy(
	State(state): State<AppState>,
	CurrentSubject(subject): CurrentSubject,
	body: Result<Json<CreatePolicyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
	let Json(body) = body?;

	let mut policy = Policy::new(
		Uuid::new_v4().to_string(),
		subject.organization_id.clone(),
		body.name,
		body.effect,
	)
	.with_description(body.description)
	.with_actions(body.actions)
	.with_resources(body.resources)
	.with_enabled(body.enabled.unwrap_or(true));
	policy.principals = body.principals;
	policy.conditions = body.conditions;
	policy.validate()?;

	let created = state.policies.create_policy(policy).await?;
	info!(policy_id = %created.id, organization_id = %created.organization_id, "policy created");
	Ok((StatusCode::CREATED, Json(created)))
}

/// GET /policies
#[instrument(skip(state, subject), fields(user_id = %subject.user_id))]
pub async fn list_policies(
	State(state): State<AppState>,
	CurrentSubject(subject): CurrentSubject,
) -> Result<Json<PolicyListResponse>, ApiError> {
	let policies = state
		.policies
		.list_policies(&subject.organization_id)
		.await?;
	Ok(Json(PolicyListResponse { policies }))
}

/// GET /policies/{id}
#[instrument(skip(state, subject), fields(user_id = %subject.user_id))]
pub async fn get_policy(
	State(state): State<AppState>,
	CurrentSubject(subject): CurrentSubject,
	Path(id): Path<String>,
) -> Result<Json<Policy>, ApiError> {
	let policy = state.policies.get_policy(&id).await?;
	ensure_same_tenant(&subject, &policy)?;
	Ok(Json(policy))
}

/// PUT /policies/{id}
#[instrument(skip(state, subject, body), fields(user_id = %subject.user_id))]
pub async fn update_policy(
	State(state): State<AppState>,
	CurrentSubject(subject): CurrentSubject,
	Path(id): Path<String>,
	body: Result<Json<UpdatePolicyRequest>, JsonRejection>,
) -> Result<Json<Policy>, ApiError> {
	let Json(body) = body?;

	let mut policy = state.policies.get_policy(&id).await?;
	ensure_same_tenant(&subject, &policy)?;
	body.apply(&mut policy)?;
	policy.validate()?;

	let updated = state.policies.update_policy(policy).await?;
	state
		.engine
		.engine()
		.resolver()
		.invalidate(PolicyResourceStore::RESOURCE_TYPE, &id)
		.await;
	info!(policy_id = %updated.id, version = updated.version, "policy updated");
	Ok(Json(updated))
}

/// DELETE /policies/{id}
#[instrument(skip(state, subject), fields(user_id = %subject.user_id))]
pub async fn delete_policy(
	State(state): State<AppState>,
	CurrentSubject(subject): CurrentSubject,
	Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
	let policy = state.policies.get_policy(&id).await?;
	ensure_same_tenant(&subject, &policy)?;

	state.policies.delete_policy(&id).await?;
	state
		.engine
		.engine()
		.resolver()
		.invalidate(PolicyResourceStore::RESOURCE_TYPE, &id)
		.await;
	info!(policy_id = %id, "policy deleted");
	Ok(StatusCode::NO_CONTENT)
}

/// POST /policies/simulate
///
/// Dry run: evaluates an arbitrary request against the live policy set
/// without writing an audit entry. The simulated subject must belong to the
/// caller's organization.
#[instrument(skip(state, subject, body), fields(user_id = %subject.user_id))]
pub async fn simulate(
	State(state): State<AppState>,
	CurrentSubject(subject): CurrentSubject,
	body: Result<Json<AuthorizationRequest>, JsonRejection>,
) -> Result<Json<Decision>, ApiError> {
	let Json(request) = body?;

	if let Some(simulated) = &request.subject {
		if simulated.organization_id != subject.organization_id {
			return Err(ApiError::forbidden());
		}
	}

	let decision = state.engine.engine().evaluate(&request).await?;
	Ok(Json(decision))
}
