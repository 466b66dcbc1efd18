// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request identity.
//!
//! Authentication happens upstream. Whatever authenticates a request leaves a
//! [`Subject`] in the request extensions; handlers read it through
//! [`CurrentSubject`]. [`TrustedHeaders`] is one such producer, for
//! deployments behind a proxy that has already authenticated the caller and
//! forwards identity in `x-warden-*` headers.
//!
//! Never enable [`TrustedHeaders`] on a listener clients can reach directly.

use std::task::{Context, Poll};

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{HeaderMap, Request};
use tower::{Layer, Service};
use warden_authz::Subject;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-warden-user-id";
pub const EMAIL_HEADER: &str = "x-warden-email";
pub const ORGANIZATION_ID_HEADER: &str = "x-warden-organization-id";
pub const ORGANIZATION_ROLE_HEADER: &str = "x-warden-organization-role";
pub const TEAM_ID_HEADER: &str = "x-warden-team-id";
pub const TEAM_ROLE_HEADER: &str = "x-warden-team-role";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::trim)
		.filter(|v| !v.is_empty())
}

/// Builds a subject from `x-warden-*` headers. A user id is required.
pub fn subject_from_headers(headers: &HeaderMap) -> Option<Subject> {
	let user_id = header(headers, USER_ID_HEADER)?;
	let mut subject = Subject::new(
		user_id,
		header(headers, ORGANIZATION_ID_HEADER).unwrap_or_default(),
		header(headers, ORGANIZATION_ROLE_HEADER).unwrap_or_default(),
	);
	subject.provider = "trusted-headers".to_string();
	if let Some(email) = header(headers, EMAIL_HEADER) {
		subject.email = email.to_string();
	}
	if let Some(team_id) = header(headers, TEAM_ID_HEADER) {
		subject.team_id = Some(team_id.to_string());
		subject.team_role = header(headers, TEAM_ROLE_HEADER).map(str::to_string);
	}
	Some(subject)
}

/// Layer inserting a [`Subject`] built from trusted proxy headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedHeaders;

impl<S> Layer<S> for TrustedHeaders {
	type Service = TrustedHeadersService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		TrustedHeadersService { inner }
	}
}

#[derive(Debug, Clone)]
pub struct TrustedHeadersService<S> {
	inner: S,
}

impl<S, B> Service<Request<B>> for TrustedHeadersService<S>
where
	S: Service<Request<B>>,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = S::Future;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, mut req: Request<B>) -> Self::Future {
		if let Some(subject) = subject_from_headers(req.headers()) {
			req.extensions_mut().insert(subject);
		}
		self.inner.call(req)
	}
}

/// Extractor for the authenticated subject; rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct CurrentSubject(pub Subject);

impl<S> FromRequestParts<S> for CurrentSubject
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<Subject>()
			.cloned()
			.map(CurrentSubject)
			.ok_or(ApiError::Unauthorized)
	}
}
