// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use axum::{
	body::Body,
	http::{Method, Request, StatusCode},
	response::Response,
	Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceExt;
use warden_audit::{AuditedEngine, InMemoryAuditLogger};
use warden_authz::{
	AttributeCacheConfig, AttributeResolver, CompositeResourceStore, Effect, Engine, EngineConfig,
	InMemoryPolicyStore, InMemoryResourceStore, Policy, PolicyResourceStore, PolicyStore,
};
use warden_server::identity::{
	ORGANIZATION_ID_HEADER, ORGANIZATION_ROLE_HEADER, USER_ID_HEADER,
};
use warden_server::{create_router, AppState, TrustedHeaders};

pub const ORG_A: &str = "org-a";
pub const ORG_B: &str = "org-b";
pub const POLICY_A: &str = "custom-a";
pub const POLICY_B: &str = "custom-b";

#[derive(Debug, Clone)]
pub struct TestUser {
	pub user_id: String,
	pub organization_id: String,
	pub role: String,
}

impl TestUser {
	pub fn new(user_id: &str, organization_id: &str, role: &str) -> Self {
		Self {
			user_id: user_id.to_string(),
			organization_id: organization_id.to_string(),
			role: role.to_string(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct OrgFixture {
	pub owner: TestUser,
	pub admin: TestUser,
	pub member: TestUser,
	pub viewer: TestUser,
}

impl OrgFixture {
	fn new(organization_id: &str) -> Self {
		let user = |role: &str| {
			TestUser::new(&format!("{role}@{organization_id}"), organization_id, role)
		};
		Self {
			owner: user("owner"),
			admin: user("admin"),
			member: user("member"),
			viewer: user("viewer"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Fixtures {
	pub org_a: OrgFixture,
	pub org_b: OrgFixture,
}

pub struct TestApp {
	pub router: Router,
	pub fixtures: Fixtures,
	pub state: AppState,
	pub audit: Arc<InMemoryAuditLogger>,
}

fn custom_policy(id: &str, organization_id: &str) -> Policy {
	Policy::new(id, organization_id, format!("{id} readers"), Effect::Allow)
		.with_actions(["plan:read"])
		.with_resources(["plan:*"])
}

impl TestApp {
	pub async fn new() -> Self {
		let store = Arc::new(InMemoryPolicyStore::new());
		for org in [ORG_A, ORG_B] {
			store.load_built_in_policies(org).await.unwrap();
		}
		store.create_policy(custom_policy(POLICY_A, ORG_A)).await.unwrap();
		store.create_policy(custom_policy(POLICY_B, ORG_B)).await.unwrap();
		let policies: Arc<dyn PolicyStore> = store;

		let resources = CompositeResourceStore::new()
			.with_route(
				PolicyResourceStore::RESOURCE_TYPE,
				Arc::new(PolicyResourceStore::new(policies.clone())),
			)
			.with_fallback(Arc::new(InMemoryResourceStore::new()));
		let resolver = Arc::new(AttributeResolver::new(
			Arc::new(resources),
			AttributeCacheConfig::default(),
		));
		let engine = Arc::new(Engine::new(policies.clone(), resolver, EngineConfig::default()));

		let audit = Arc::new(InMemoryAuditLogger::new());
		let state = AppState::new(policies, AuditedEngine::new(engine, audit.clone()));
		let router = create_router(state.clone()).layer(TrustedHeaders);

		Self {
			router,
			fixtures: Fixtures {
				org_a: OrgFixture::new(ORG_A),
				org_b: OrgFixture::new(ORG_B),
			},
			state,
			audit,
		}
	}

	pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response<Body> {
		self
			.request(Method::GET, path, user, Option::<()>::None, &[])
			.await
	}

	pub async fn post(
		&self,
		path: &str,
		user: Option<&TestUser>,
		body: impl Serialize,
	) -> Response<Body> {
		self.request(Method::POST, path, user, Some(body), &[]).await
	}

	pub async fn put(
		&self,
		path: &str,
		user: Option<&TestUser>,
		body: impl Serialize,
	) -> Response<Body> {
		self.request(Method::PUT, path, user, Some(body), &[]).await
	}

	pub async fn delete(&self, path: &str, user: Option<&TestUser>) -> Response<Body> {
		self
			.request(Method::DELETE, path, user, Option::<()>::None, &[])
			.await
	}

	pub async fn get_with_headers(
		&self,
		path: &str,
		user: Option<&TestUser>,
		headers: &[(&str, &str)],
	) -> Response<Body> {
		self
			.request(Method::GET, path, user, Option::<()>::None, headers)
			.await
	}

	pub async fn post_raw(
		&self,
		path: &str,
		user: Option<&TestUser>,
		body: &str,
	) -> Response<Body> {
		let builder = with_identity(
			Request::builder()
				.method(Method::POST)
				.uri(path)
				.header("content-type", "application/json"),
			user,
		);
		let request = builder.body(Body::from(body.to_string())).unwrap();
		self.router.clone().oneshot(request).await.unwrap()
	}

	async fn request<T: Serialize>(
		&self,
		method: Method,
		path: &str,
		user: Option<&TestUser>,
		body: Option<T>,
		headers: &[(&str, &str)],
	) -> Response<Body> {
		let mut builder = with_identity(Request::builder().method(method).uri(path), user);
		for (name, value) in headers {
			builder = builder.header(*name, *value);
		}

		let request = match body {
			Some(body) => builder
				.header("content-type", "application/json")
				.body(Body::from(serde_json::to_string(&body).unwrap()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};

		self.router.clone().oneshot(request).await.unwrap()
	}
}

fn with_identity(
	builder: axum::http::request::Builder,
	user: Option<&TestUser>,
) -> axum::http::request::Builder {
	match user {
		Some(user) => builder
			.header(USER_ID_HEADER, user.user_id.as_str())
			.header(ORGANIZATION_ID_HEADER, user.organization_id.as_str())
			.header(ORGANIZATION_ROLE_HEADER, user.role.as_str()),
		None => builder,
	}
}

pub async fn json_body<T: DeserializeOwned>(response: Response<Body>) -> T {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

pub struct AuthzCase {
	pub name: &'static str,
	pub method: Method,
	pub path: String,
	pub user: Option<TestUser>,
	pub body: Option<serde_json::Value>,
	pub expected_status: StatusCode,
}

pub async fn run_authz_cases(app: &TestApp, cases: &[AuthzCase]) {
	for case in cases {
		let response = match (&case.method, &case.body) {
			(m, Some(body)) if *m == Method::POST => {
				app.post(&case.path, case.user.as_ref(), body.clone()).await
			}
			(m, Some(body)) if *m == Method::PUT => {
				app.put(&case.path, case.user.as_ref(), body.clone()).await
			}
			(m, _) if *m == Method::DELETE => app.delete(&case.path, case.user.as_ref()).await,
			_ => app.get(&case.path, case.user.as_ref()).await,
		};

		if response.status() != case.expected_status {
			let (parts, body) = response.into_parts();
			let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
			let body_str = String::from_utf8_lossy(&body_bytes);
			panic!(
				"Case '{}': {} {} - expected {}, got {}\nResponse body: {}",
				case.name, case.method, case.path, case.expected_status, parts.status, body_str
			);
		}
	}
}
