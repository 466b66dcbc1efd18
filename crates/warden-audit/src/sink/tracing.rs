// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::entry::AuditEntry;
use crate::error::AuditResult;
use crate::logger::AuditLogger;

/// Emits each entry as a structured `tracing` event on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn log_decision(&self, entry: AuditEntry) -> AuditResult<()> {
		info!(
			target: "audit",
			user_id = %entry.user_id,
			organization_id = %entry.organization_id,
			action = %entry.action,
			resource_type = %entry.resource_type,
			resource_id = %entry.resource_id,
			request_id = %entry.request_id,
			allowed = entry.allowed,
			reason = %entry.reason,
			policy_ids = ?entry.policy_ids,
			duration_us = duration_micros(entry.duration),
			signed = entry.is_signed(),
			"authorization decision"
		);
		Ok(())
	}

	async fn close(&self) -> AuditResult<()> {
		Ok(())
	}
}

/// Whole microseconds, saturating at `u64::MAX`.
fn duration_micros(duration: Duration) -> u64 {
	u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
