// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::AuditEntry;
use crate::error::AuditResult;
use crate::logger::AuditLogger;

/// Which decisions reach the audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
	#[default]
	DenialsOnly,
	All,
}

impl FromStr for AuditMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"denials_only" | "denials" => Ok(AuditMode::DenialsOnly),
			"all" => Ok(AuditMode::All),
			other => Err(format!(
				"unknown audit mode '{other}' (expected 'all' or 'denials_only')"
			)),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilterConfig {
	#[serde(default)]
	pub mode: AuditMode,
	/// Drop `environment` attributes before delivery.
	#[serde(default)]
	pub strip_environment: bool,
}

impl AuditFilterConfig {
	pub fn allows(&self, entry: &AuditEntry) -> bool {
		match self.mode {
			AuditMode::All => true,
			AuditMode::DenialsOnly => !entry.allowed,
		}
	}
}

/// Drops entries the config does not allow and optionally strips environment data.
pub struct FilteringAuditLogger<L> {
	inner: L,
	config: AuditFilterConfig,
}

impl<L: AuditLogger> FilteringAuditLogger<L> {
	pub fn new(inner: L, config: AuditFilterConfig) -> Self {
		Self { inner, config }
	}

	pub fn config(&self) -> &AuditFilterConfig {
		&self.config
	}
}

#[async_trait]
impl<L: AuditLogger> AuditLogger for FilteringAuditLogger<L> {
	fn name(&self) -> &str {
		self.inner.name()
	}

	async fn log_decision(&self, mut entry: AuditEntry) -> AuditResult<()> {
		if !self.config.allows(&entry) {
			return Ok(());
		}
		if self.config.strip_environment {
			entry.environment.clear();
		}
		self.inner.log_decision(entry).await
	}

	async fn close(&self) -> AuditResult<()> {
		self.inner.close().await
	}
}
