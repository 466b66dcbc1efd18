// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant-scoped attribute-based access control for Warden.
//!
//! Given an authenticated [`Subject`], an action and a [`Resource`], the
//! [`Engine`] renders a [`Decision`] against the policies of the subject's
//! organization. Evaluation is default-deny and an explicit deny always wins.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden_authz::{
//! 	AuthorizationRequest, Engine, InMemoryPolicyStore, InMemoryResourceStore, Resource, Subject,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let policies = Arc::new(InMemoryPolicyStore::new());
//! policies.load_built_in_policies("org-1").await?;
//! let engine = Engine::with_stores(policies, Arc::new(InMemoryResourceStore::new()));
//!
//! let request = AuthorizationRequest::new(
//! 	Some(Subject::new("user-1", "org-1", "viewer")),
//! 	"plan:read",
//! 	Resource::of_type("plan"),
//! );
//! assert!(engine.evaluate(&request).await?.allowed);
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod cache;
pub mod engine;
pub mod error;
pub mod matching;
pub mod operator;
pub mod policy;
pub mod request;
pub mod resolver;
pub mod store;

pub use attributes::{AttrValue, AttributeContext, Attributes};
pub use cache::{AttributeCache, AttributeCacheConfig};
pub use engine::{evaluate_policies, Engine, EngineConfig};
pub use error::{EngineError, EngineResult, StoreError, StoreResult, ValidationError};
pub use operator::{evaluate_operator, string_like};
pub use policy::{
	AttributePrincipal, Condition, Effect, Operator, Policy, Principal, PrincipalScope,
	RolePrincipal,
};
pub use request::{AuthorizationRequest, Decision, Resource, Subject};
pub use resolver::AttributeResolver;
pub use store::{
	built_in_policies, CompositeResourceStore, InMemoryPolicyStore, InMemoryResourceStore,
	PolicyResourceStore, PolicyStore, ResourceStore, BUILT_IN_ROLES, STANDARD_RESOURCE_TYPES,
};
