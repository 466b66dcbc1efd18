// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

use crate::entry::AuditEntry;
use crate::error::AuditResult;

/// Destination for audit entries.
///
/// Loggers are composable: the filtering, async and signing loggers each wrap
/// another logger. `close` must be idempotent and must flush anything the
/// logger still holds.
#[async_trait]
pub trait AuditLogger: Send + Sync {
	fn name(&self) -> &str;

	async fn log_decision(&self, entry: AuditEntry) -> AuditResult<()>;

	async fn close(&self) -> AuditResult<()>;
}

#[async_trait]
impl<T: AuditLogger + ?Sized> AuditLogger for Arc<T> {
	fn name(&self) -> &str {
		(**self).name()
	}

	async fn log_decision(&self, entry: AuditEntry) -> AuditResult<()> {
		(**self).log_decision(entry).await
	}

	async fn close(&self) -> AuditResult<()> {
		(**self).close().await
	}
}
