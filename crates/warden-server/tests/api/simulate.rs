// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::StatusCode;
use serde_json::json;
use warden_authz::request::{REASON_ALLOWED, REASON_DEFAULT_DENY};
use warden_authz::Decision;

use super::support::{json_body, TestApp, ORG_A};

#[tokio::test]
async fn simulate_returns_the_decision() {
	let app = TestApp::new().await;
	let viewer = &app.fixtures.org_a.viewer;

	let response = app
		.post(
			"/policies/simulate",
			Some(viewer),
			json!({
				"subject": {
					"user_id": "u9",
					"organization_id": ORG_A,
					"organization_role": "viewer"
				},
				"action": "plan:delete",
				"resource": {"type": "plan"},
			}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	let decision: Decision = json_body(response).await;
	assert!(!decision.allowed);
	assert_eq!(decision.reason, REASON_DEFAULT_DENY);

	let response = app
		.post(
			"/policies/simulate",
			Some(viewer),
			json!({
				"subject": {
					"user_id": "u9",
					"organization_id": ORG_A,
					"organization_role": "owner"
				},
				"action": "plan:delete",
				"resource": {"type": "plan"},
			}),
		)
		.await;
	let decision: Decision = json_body(response).await;
	assert!(decision.allowed);
	assert_eq!(decision.reason, REASON_ALLOWED);
	assert_eq!(decision.policy_ids, vec![format!("builtin-owner-{ORG_A}")]);
}

#[tokio::test]
async fn simulate_is_not_audited() {
	let app = TestApp::new().await;
	let before = app.audit.len().await;

	let response = app
		.post(
			"/policies/simulate",
			Some(&app.fixtures.org_a.owner),
			json!({
				"subject": {
					"user_id": "u9",
					"organization_id": ORG_A,
					"organization_role": "viewer"
				},
				"action": "plan:read",
				"resource": {"type": "plan"},
			}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);

	// Only the route-level check on the simulate call itself is recorded.
	let entries = app.audit.entries().await;
	assert_eq!(entries.len(), before + 1);
	assert_eq!(entries[before].action, "policy:read");
}

#[tokio::test]
async fn simulate_refuses_subjects_of_other_organizations() {
	let app = TestApp::new().await;
	let response = app
		.post(
			"/policies/simulate",
			Some(&app.fixtures.org_a.owner),
			json!({
				"subject": {
					"user_id": "spy",
					"organization_id": "org-b",
					"organization_role": "owner"
				},
				"action": "plan:read",
				"resource": {"type": "plan"},
			}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn simulate_without_subject_is_a_no_subject_decision() {
	let app = TestApp::new().await;
	let response = app
		.post(
			"/policies/simulate",
			Some(&app.fixtures.org_a.owner),
			json!({"action": "plan:read", "resource": {"type": "plan"}}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	let decision: Decision = json_body(response).await;
	assert!(!decision.allowed);
	assert!(decision.policy_ids.is_empty());
}

#[tokio::test]
async fn simulate_rejects_malformed_requests() {
	let app = TestApp::new().await;
	let response = app
		.post("/policies/simulate", Some(&app.fixtures.org_a.owner), json!({"action": 7}))
		.await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
