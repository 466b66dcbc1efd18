// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use serde_json::json;
use warden_authz::{Effect, Policy};
use warden_server::routes::policies::PolicyListResponse;
use warden_server::ErrorResponse;

use super::support::{json_body, run_authz_cases, AuthzCase, TestApp, ORG_A, POLICY_A, POLICY_B};

fn new_policy_body() -> serde_json::Value {
	json!({
		"name": "deploy approvers",
		"effect": "allow",
		"principals": [{"role": "member", "scope": "organization"}],
		"actions": ["plan:approve"],
		"resources": ["plan:*"],
	})
}

#[tokio::test]
async fn test_policy_authorization() {
	let app = TestApp::new().await;
	let a = &app.fixtures.org_a;
	let b = &app.fixtures.org_b;

	let cases = vec![
		AuthzCase {
			name: "unauthenticated_cannot_list",
			method: Method::GET,
			path: "/policies".to_string(),
			user: None,
			body: None,
			expected_status: StatusCode::UNAUTHORIZED,
		},
		AuthzCase {
			name: "viewer_can_list",
			method: Method::GET,
			path: "/policies".to_string(),
			user: Some(a.viewer.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "viewer_cannot_create",
			method: Method::POST,
			path: "/policies".to_string(),
			user: Some(a.viewer.clone()),
			body: Some(new_policy_body()),
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "member_can_create",
			method: Method::POST,
			path: "/policies".to_string(),
			user: Some(a.member.clone()),
			body: Some(new_policy_body()),
			expected_status: StatusCode::CREATED,
		},
		AuthzCase {
			name: "admin_can_get_own_org_policy",
			method: Method::GET,
			path: format!("/policies/{POLICY_A}"),
			user: Some(a.admin.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "other_org_admin_cannot_get_policy",
			method: Method::GET,
			path: format!("/policies/{POLICY_A}"),
			user: Some(b.admin.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "other_org_member_cannot_get_policy",
			method: Method::GET,
			path: format!("/policies/{POLICY_A}"),
			user: Some(b.member.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "missing_policy_is_not_found",
			method: Method::GET,
			path: "/policies/does-not-exist".to_string(),
			user: Some(a.owner.clone()),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
		},
		AuthzCase {
			name: "member_cannot_delete",
			method: Method::DELETE,
			path: format!("/policies/{POLICY_A}"),
			user: Some(a.member.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "viewer_cannot_update",
			method: Method::PUT,
			path: format!("/policies/{POLICY_A}"),
			user: Some(a.viewer.clone()),
			body: Some(json!({"enabled": false})),
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "other_org_owner_cannot_delete",
			method: Method::DELETE,
			path: format!("/policies/{POLICY_A}"),
			user: Some(b.owner.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "admin_can_delete_own_org_policy",
			method: Method::DELETE,
			path: format!("/policies/{POLICY_B}"),
			user: Some(b.admin.clone()),
			body: None,
			expected_status: StatusCode::NO_CONTENT,
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn create_assigns_id_and_caller_organization() {
	let app = TestApp::new().await;
	let owner = &app.fixtures.org_a.owner;

	let mut body = new_policy_body();
	body["organization_id"] = json!("org-b");
	body["id"] = json!("chosen-by-client");
	let response = app.post("/policies", Some(owner), body).await;
	assert_eq!(response.status(), StatusCode::CREATED);

	let created: Policy = json_body(response).await;
	assert_ne!(created.id, "chosen-by-client");
	assert_eq!(created.organization_id, ORG_A);
	assert_eq!(created.version, 1);
	assert!(created.enabled);
	assert_eq!(created.effect, Effect::Allow);

	let response = app.get(&format!("/policies/{}", created.id), Some(owner)).await;
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_validates_fields() {
	let app = TestApp::new().await;
	let owner = &app.fixtures.org_a.owner;

	let mut no_actions = new_policy_body();
	no_actions["actions"] = json!([]);
	let response = app.post("/policies", Some(owner), no_actions).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	let error: ErrorResponse = json_body(response).await;
	assert_eq!(error.error, "bad_request");
	assert_eq!(error.details, Some(json!({"field": "actions"})));

	let mut no_name = new_policy_body();
	no_name.as_object_mut().unwrap().remove("name");
	let response = app.post("/policies", Some(owner), no_name).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let mut bad_effect = new_policy_body();
	bad_effect["effect"] = json!("maybe");
	let response = app.post("/policies", Some(owner), bad_effect).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	let error: ErrorResponse = json_body(response).await;
	assert_eq!(error.error, "bad_request");

	let response = app.post_raw("/policies", Some(owner), "{not json").await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_returns_only_the_callers_organization() {
	let app = TestApp::new().await;
	let response = app.get("/policies", Some(&app.fixtures.org_a.viewer)).await;
	assert_eq!(response.status(), StatusCode::OK);

	let list: PolicyListResponse = json_body(response).await;
	assert!(!list.policies.is_empty());
	assert!(list.policies.iter().all(|p| p.organization_id == ORG_A));
	assert!(list.policies.iter().any(|p| p.id == POLICY_A));
	assert!(!list.policies.iter().any(|p| p.id == POLICY_B));
}

#[tokio::test]
async fn list_includes_disabled_policies() {
	let app = TestApp::new().await;
	let owner = &app.fixtures.org_a.owner;

	let response = app
		.put(&format!("/policies/{POLICY_A}"), Some(owner), json!({"enabled": false}))
		.await;
	assert_eq!(response.status(), StatusCode::OK);

	let list: PolicyListResponse = json_body(app.get("/policies", Some(owner)).await).await;
	let custom = list.policies.iter().find(|p| p.id == POLICY_A).unwrap();
	assert!(!custom.enabled);
}

#[tokio::test]
async fn update_is_partial_and_bumps_version() {
	let app = TestApp::new().await;
	let member = &app.fixtures.org_a.member;

	let response = app
		.put(
			&format!("/policies/{POLICY_A}"),
			Some(member),
			json!({"name": "renamed", "organization_id": "org-b"}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);

	let updated: Policy = json_body(response).await;
	assert_eq!(updated.name, "renamed");
	assert_eq!(updated.version, 2);
	assert_eq!(updated.organization_id, ORG_A);
	assert_eq!(updated.actions, vec!["plan:read"]);
	assert_eq!(updated.resources, vec!["plan:*"]);
}

#[tokio::test]
async fn update_rejects_emptied_lists() {
	let app = TestApp::new().await;
	let owner = &app.fixtures.org_a.owner;

	for field in ["actions", "resources"] {
		let response = app
			.put(&format!("/policies/{POLICY_A}"), Some(owner), json!({ field: [] }))
			.await;
		assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{field}");
		let error: ErrorResponse = json_body(response).await;
		assert_eq!(error.details, Some(json!({"field": field})));
	}

	let response = app
		.put(&format!("/policies/{POLICY_A}"), Some(owner), json!({"conditions": []}))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_removes_the_policy() {
	let app = TestApp::new().await;
	let owner = &app.fixtures.org_a.owner;
	let path = format!("/policies/{POLICY_A}");

	assert_eq!(app.get(&path, Some(owner)).await.status(), StatusCode::OK);
	assert_eq!(app.delete(&path, Some(owner)).await.status(), StatusCode::NO_CONTENT);
	assert_eq!(app.get(&path, Some(owner)).await.status(), StatusCode::NOT_FOUND);
	assert_eq!(app.delete(&path, Some(owner)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn created_deny_policy_overrides_built_in_allow() {
	let app = TestApp::new().await;
	let owner = &app.fixtures.org_a.owner;

	let response = app
		.post(
			"/policies",
			Some(owner),
			json!({
				"name": "freeze policy deletion",
				"effect": "deny",
				"actions": ["policy:delete"],
				"resources": ["policy:*"],
			}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::CREATED);

	let response = app.delete(&format!("/policies/{POLICY_A}"), Some(owner)).await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	let error: ErrorResponse = json_body(response).await;
	assert_eq!(error.error, "forbidden");
	assert!(!error.message.contains("freeze"));
}
