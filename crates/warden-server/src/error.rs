// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON error responses.
//!
//! Every error leaving the HTTP boundary is `{error, message, details?}` with
//! a stable `error` code.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use warden_authz::{EngineError, StoreError, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum ApiError {
	#[error("{message}")]
	BadRequest {
		message: String,
		details: Option<serde_json::Value>,
	},

	#[error("authentication required")]
	Unauthorized,

	#[error("{0}")]
	Forbidden(String),

	#[error("{0}")]
	NotFound(String),

	#[error("{0}")]
	Conflict(String),

	#[error("{0}")]
	Internal(String),

	#[error("{0}")]
	EvaluationFailed(String),
}

impl ApiError {
	pub fn bad_request(message: impl Into<String>) -> Self {
		ApiError::BadRequest {
			message: message.into(),
			details: None,
		}
	}

	pub fn forbidden() -> Self {
		ApiError::Forbidden("insufficient permissions".to_string())
	}

	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
			ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Conflict(_) => StatusCode::CONFLICT,
			ApiError::Internal(_) | ApiError::EvaluationFailed(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	pub fn code(&self) -> &'static str {
		match self {
			ApiError::BadRequest { .. } => "bad_request",
			ApiError::Unauthorized => "unauthorized",
			ApiError::Forbidden(_) => "forbidden",
			ApiError::NotFound(_) => "not_found",
			ApiError::Conflict(_) => "conflict",
			ApiError::Internal(_) => "internal_error",
			ApiError::EvaluationFailed(_) => "evaluation_failed",
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		let details = match &self {
			ApiError::BadRequest { details, .. } => details.clone(),
			_ => None,
		};
		let body = ErrorResponse {
			error: self.code().to_string(),
			message: self.to_string(),
			details,
		};
		(status, Json(body)).into_response()
	}
}

impl From<StoreError> for ApiError {
	fn from(e: StoreError) -> Self {
		match e {
			StoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
			StoreError::AlreadyExists { .. } => ApiError::Conflict(e.to_string()),
			StoreError::Invalid { .. } => ApiError::bad_request(e.to_string()),
			StoreError::Backend(_) => {
				error!(error = %e, "policy store failure");
				ApiError::Internal("internal server error".to_string())
			}
		}
	}
}

impl From<ValidationError> for ApiError {
	fn from(e: ValidationError) -> Self {
		ApiError::BadRequest {
			message: e.to_string(),
			details: Some(serde_json::json!({ "field": e.field })),
		}
	}
}

impl From<EngineError> for ApiError {
	fn from(e: EngineError) -> Self {
		error!(error = %e, "authorization evaluation failed");
		ApiError::EvaluationFailed("authorization could not be evaluated".to_string())
	}
}

impl From<JsonRejection> for ApiError {
	fn from(e: JsonRejection) -> Self {
		ApiError::bad_request(e.body_text())
	}
}
