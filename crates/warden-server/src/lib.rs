// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP boundary for Warden.
//!
//! Policy management (`/policies`), dry-run simulation
//! (`/policies/simulate`) and the [`RequireAuthorization`] route layer that
//! authorizes every management call through the audited engine.

pub mod api;
pub mod audit_check;
pub mod authz_middleware;
pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

pub use api::{create_router, AppState};
pub use audit_check::verify_audit_log;
pub use authz_middleware::{RequireAuthorization, REQUEST_ID_HEADER};
pub use error::{ApiError, ErrorResponse};
pub use identity::{subject_from_headers, CurrentSubject, TrustedHeaders};
