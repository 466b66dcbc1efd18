// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::StatusCode;
use warden_authz::AttrValue;
use warden_server::routes::health::HealthResponse;
use warden_server::{ErrorResponse, REQUEST_ID_HEADER};

use super::support::{json_body, TestApp, POLICY_A};

#[tokio::test]
async fn health_needs_no_identity() {
	let app = TestApp::new().await;
	let response = app.get("/health", None).await;
	assert_eq!(response.status(), StatusCode::OK);
	let health: HealthResponse = json_body(response).await;
	assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn unauthenticated_requests_get_a_json_401() {
	let app = TestApp::new().await;
	let response = app.get(&format!("/policies/{POLICY_A}"), None).await;
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	let error: ErrorResponse = json_body(response).await;
	assert_eq!(error.error, "unauthorized");
	assert!(app.audit.is_empty().await);
}

#[tokio::test]
async fn decisions_are_audited_with_request_context() {
	let app = TestApp::new().await;
	let viewer = &app.fixtures.org_a.viewer;

	let response = app
		.get_with_headers(
			&format!("/policies/{POLICY_A}"),
			Some(viewer),
			&[(REQUEST_ID_HEADER, "req-abc")],
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);

	let entries = app.audit.entries().await;
	assert_eq!(entries.len(), 1);
	let entry = &entries[0];
	assert!(entry.allowed);
	assert_eq!(entry.request_id, "req-abc");
	assert_eq!(entry.user_id, viewer.user_id);
	assert_eq!(entry.action, "policy:read");
	assert_eq!(entry.resource_type, "policy");
	assert_eq!(entry.resource_id, POLICY_A);
	assert_eq!(
		entry.environment.get("http_method"),
		Some(&AttrValue::from("GET"))
	);
	assert_eq!(
		entry.environment.get("path"),
		Some(&AttrValue::from(format!("/policies/{POLICY_A}")))
	);
}

#[tokio::test]
async fn missing_request_id_is_generated() {
	let app = TestApp::new().await;
	let response = app.get("/policies", Some(&app.fixtures.org_a.viewer)).await;
	assert_eq!(response.status(), StatusCode::OK);

	let entries = app.audit.entries().await;
	assert_eq!(entries.len(), 1);
	assert!(!entries[0].request_id.is_empty());
	assert!(entries[0].resource_id.is_empty());
}

#[tokio::test]
async fn denials_are_audited() {
	let app = TestApp::new().await;
	let response = app
		.delete(&format!("/policies/{POLICY_A}"), Some(&app.fixtures.org_a.viewer))
		.await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);

	let entries = app.audit.entries().await;
	assert_eq!(entries.len(), 1);
	assert!(!entries[0].allowed);
	assert_eq!(entries[0].action, "policy:delete");
}

#[tokio::test]
async fn subject_without_organization_is_forbidden() {
	let app = TestApp::new().await;
	let mut orphan = app.fixtures.org_a.owner.clone();
	orphan.organization_id = String::new();

	let response = app.get("/policies", Some(&orphan)).await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleted_policy_attributes_are_not_served_from_cache() {
	let app = TestApp::new().await;
	let owner = &app.fixtures.org_a.owner;
	let path = format!("/policies/{POLICY_A}");

	assert_eq!(app.get(&path, Some(owner)).await.status(), StatusCode::OK);
	let resolver = app.state.engine.engine().resolver().clone();
	assert!(!resolver.cache().is_empty().await);

	assert_eq!(app.delete(&path, Some(owner)).await.status(), StatusCode::NO_CONTENT);
	assert!(resolver.cache().is_empty().await);
}
