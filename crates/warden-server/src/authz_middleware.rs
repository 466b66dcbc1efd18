// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route-level authorization.
//!
//! [`RequireAuthorization`] wraps a route and asks the audited engine whether
//! the request's [`Subject`] may perform a fixed action on a fixed resource
//! type. The resource id, when the route has one, comes from the `{id}` path
//! parameter; routes without it are checked at type level.
//!
//! - No subject in the request extensions: 401
//! - Deny: 403, body never names the policy that denied
//! - Unknown resource id: 404
//! - Evaluation failure: 500 `evaluation_failed`
//!
//! ```ignore
//! Router::new().route(
//!     "/policies/{id}",
//!     delete(delete_policy.layer(RequireAuthorization::new(engine, "policy:delete", "policy"))),
//! );
//! ```

use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use http::Request;
use tower::{Layer, Service};
use tracing::{debug, info};
use uuid::Uuid;
use warden_audit::AuditedEngine;
use warden_authz::{AuthorizationRequest, EngineError, Resource, Subject};

use crate::error::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Path parameter naming the target resource.
const RESOURCE_ID_PARAM: &str = "id";

#[derive(Clone)]
pub struct RequireAuthorization {
	engine: AuditedEngine,
	action: String,
	resource_type: String,
}

impl RequireAuthorization {
	pub fn new(
		engine: AuditedEngine,
		action: impl Into<String>,
		resource_type: impl Into<String>,
	) -> Self {
		Self {
			engine,
			action: action.into(),
			resource_type: resource_type.into(),
		}
	}
}

impl<S> Layer<S> for RequireAuthorization {
	type Service = RequireAuthorizationService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RequireAuthorizationService {
			inner,
			engine: self.engine.clone(),
			action: self.action.clone(),
			resource_type: self.resource_type.clone(),
		}
	}
}

#[derive(Clone)]
pub struct RequireAuthorizationService<S> {
	inner: S,
	engine: AuditedEngine,
	action: String,
	resource_type: String,
}

impl<S> Service<Request<Body>> for RequireAuthorizationService<S>
where
	S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
	S::Future: Send,
{
	type Response = Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Response, S::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		// The clone is not ready; keep the one poll_ready was called on.
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);
		let engine = self.engine.clone();
		let action = self.action.clone();
		let resource_type = self.resource_type.clone();

		Box::pin(async move {
			let (mut parts, body) = req.into_parts();

			let Some(subject) = parts.extensions.get::<Subject>().cloned() else {
				debug!(
					action = %action,
					resource_type = %resource_type,
					"authorization denied: not authenticated"
				);
				return Ok(ApiError::Unauthorized.into_response());
			};

			let resource_id = match RawPathParams::from_request_parts(&mut parts, &()).await {
				Ok(params) => params
					.iter()
					.find(|(name, _)| *name == RESOURCE_ID_PARAM)
					.map(|(_, value)| value.to_string())
					.unwrap_or_default(),
				Err(_) => String::new(),
			};

			let request_id = parts
				.headers
				.get(REQUEST_ID_HEADER)
				.and_then(|v| v.to_str().ok())
				.filter(|v| !v.is_empty())
				.map(str::to_string)
				.unwrap_or_else(|| Uuid::new_v4().to_string());

			let user_id = subject.user_id.clone();
			let request = AuthorizationRequest::new(
				Some(subject),
				action.clone(),
				Resource::new(resource_type.clone(), resource_id.clone()),
			)
			.with_environment("request_id", request_id)
			.with_environment("http_method", parts.method.as_str())
			.with_environment("path", parts.uri.path());

			match engine.authorize(&request).await {
				Ok(decision) if decision.allowed => {
					debug!(
						user_id = %user_id,
						action = %action,
						resource_type = %resource_type,
						resource_id = %resource_id,
						"authorization allowed"
					);
					inner.call(Request::from_parts(parts, body)).await
				}
				Ok(decision) => {
					info!(
						user_id = %user_id,
						action = %action,
						resource_type = %resource_type,
						resource_id = %resource_id,
						reason = %decision.reason,
						"authorization denied"
					);
					Ok(ApiError::forbidden().into_response())
				}
				Err(EngineError::ResourceAttributes(e)) if e.is_not_found() => {
					Ok(ApiError::NotFound(e.to_string()).into_response())
				}
				Err(e) => Ok(ApiError::from(e).into_response()),
			}
		})
	}
}
