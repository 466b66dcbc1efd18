// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entry::AuditEntry;
use crate::error::AuditResult;
use crate::logger::AuditLogger;

/// Keeps entries in memory. Used by tests and the simulate path.
///
/// Entries are owned values: nothing a caller does to its own entry after
/// logging, or to a vector returned by [`InMemoryAuditLogger::entries`], can
/// reach the stored record.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogger {
	entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLogger {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn entries(&self) -> Vec<AuditEntry> {
		self.entries.read().await.clone()
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}

	pub async fn clear(&self) {
		self.entries.write().await.clear();
	}
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
	fn name(&self) -> &str {
		"memory"
	}

	async fn log_decision(&self, entry: AuditEntry) -> AuditResult<()> {
		self.entries.write().await.push(entry);
		Ok(())
	}

	async fn close(&self) -> AuditResult<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use warden_authz::{AttrValue, AuthorizationRequest, Decision, Resource, Subject};

	use super::*;

	#[tokio::test]
	async fn stored_entries_are_isolated_from_callers() {
		let logger = InMemoryAuditLogger::new();
		let request = AuthorizationRequest::new(
			Some(Subject::new("u1", "org-1", "admin")),
			"plan:approve",
			Resource::new("plan", "p1"),
		)
		.with_environment("client_ip", "10.0.0.1");
		let mut original = AuditEntry::from_decision(
			&request,
			&Decision::allow(vec!["p1".to_string()]),
			Duration::from_millis(2),
		);

		logger.log_decision(original.clone()).await.unwrap();
		original
			.environment
			.insert("client_ip".to_string(), AttrValue::from("6.6.6.6"));
		original.policy_ids.push("forged".to_string());

		let mut fetched = logger.entries().await;
		assert_eq!(fetched[0].environment["client_ip"], AttrValue::from("10.0.0.1"));
		assert_eq!(fetched[0].policy_ids, vec!["p1".to_string()]);

		fetched[0].policy_ids.clear();
		assert_eq!(logger.entries().await[0].policy_ids.len(), 1);
	}
}
