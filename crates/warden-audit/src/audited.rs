// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Instant;

use tracing::{instrument, warn};
use warden_authz::{AuthorizationRequest, Decision, Engine, EngineResult};

use crate::entry::AuditEntry;
use crate::logger::AuditLogger;

/// An [`Engine`] whose decisions are recorded on an audit logger.
///
/// Audit is best effort relative to the decision: a logging failure is
/// warned about and the decision is still returned.
#[derive(Clone)]
pub struct AuditedEngine {
	engine: Arc<Engine>,
	logger: Arc<dyn AuditLogger>,
}

impl AuditedEngine {
	pub fn new(engine: Arc<Engine>, logger: Arc<dyn AuditLogger>) -> Self {
		Self { engine, logger }
	}

	pub fn engine(&self) -> &Arc<Engine> {
		&self.engine
	}

	pub fn logger(&self) -> &Arc<dyn AuditLogger> {
		&self.logger
	}

	/// Evaluates `request` and records the decision.
	///
	/// Evaluation errors are returned without an audit entry: there is no
	/// decision to record.
	#[instrument(skip(self, request), fields(action = %request.action))]
	pub async fn authorize(&self, request: &AuthorizationRequest) -> EngineResult<Decision> {
		let started = Instant::now();
		let decision = self.engine.evaluate(request).await?;
		let entry = AuditEntry::from_decision(request, &decision, started.elapsed());

		if let Err(e) = self.logger.log_decision(entry).await {
			warn!(
				sink = self.logger.name(),
				error = %e,
				"failed to record authorization decision"
			);
		}
		Ok(decision)
	}

	/// Flushes and closes the audit logger, then stops the engine's cache sweeper.
	pub async fn shutdown(&self) -> crate::AuditResult<()> {
		let closed = self.logger.close().await;
		self.engine.resolver().shutdown().await;
		closed
	}
}
