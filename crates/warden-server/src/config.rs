// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line and environment configuration.
//!
//! Every flag has a `WARDEN_*` environment fallback. The args convert into the
//! per-component config structs; nothing here is read from disk.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use warden_audit::{AsyncAuditConfig, AuditFilterConfig, AuditMode, VerifierConfig};
use warden_authz::{AttributeCacheConfig, EngineConfig};

/// Warden - attribute-based authorization service.
#[derive(Parser, Debug)]
#[command(name = "warden-server", about = "Attribute-based authorization service", version)]
pub struct Cli {
	/// Default log filter, overridden by RUST_LOG.
	#[arg(long, global = true, env = "WARDEN_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	/// Emit logs as JSON lines.
	#[arg(long, global = true, env = "WARDEN_JSON_LOGS")]
	pub json_logs: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run the HTTP server
	Serve(ServeArgs),
	/// Verify a JSON-lines audit log
	Verify(VerifyArgs),
	/// Generate an ECDSA P-256 audit signing key
	Keygen(KeygenArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
	#[arg(long, env = "WARDEN_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
	pub listen_addr: SocketAddr,

	/// Append audit entries to this JSON-lines file. Without it entries go to the log.
	#[arg(long, env = "WARDEN_AUDIT_LOG")]
	pub audit_log: Option<PathBuf>,

	/// `all` or `denials_only`.
	#[arg(long, env = "WARDEN_AUDIT_MODE", default_value = "denials_only")]
	pub audit_mode: AuditMode,

	/// Drop environment attributes from audit entries.
	#[arg(long, env = "WARDEN_AUDIT_STRIP_ENVIRONMENT")]
	pub strip_environment: bool,

	/// PKCS#8 PEM key used to sign audit entries.
	#[arg(long, env = "WARDEN_SIGNING_KEY")]
	pub signing_key: Option<PathBuf>,

	#[arg(long, env = "WARDEN_SIGNER_ID", default_value = "warden")]
	pub signer_id: String,

	#[arg(long, env = "WARDEN_AUDIT_QUEUE_CAPACITY", default_value_t = 1024)]
	pub audit_queue_capacity: usize,

	#[arg(long, env = "WARDEN_CACHE_TTL_SECS", default_value_t = 60)]
	pub cache_ttl_secs: u64,

	#[arg(long, env = "WARDEN_CACHE_SWEEP_SECS", default_value_t = 30)]
	pub cache_sweep_secs: u64,

	/// Deadline for one evaluation, in milliseconds.
	#[arg(long, env = "WARDEN_EVAL_TIMEOUT_MS")]
	pub eval_timeout_ms: Option<u64>,

	/// Build the caller's identity from x-warden-* headers. Only behind an
	/// authenticating proxy.
	#[arg(long, env = "WARDEN_TRUST_IDENTITY_HEADERS")]
	pub trust_identity_headers: bool,

	/// Seed the built-in role policies for these organizations.
	#[arg(long, env = "WARDEN_SEED_ORGANIZATIONS", value_delimiter = ',')]
	pub seed_organization: Vec<String>,
}

impl ServeArgs {
	pub fn engine_config(&self) -> EngineConfig {
		EngineConfig {
			evaluation_timeout_ms: self.eval_timeout_ms,
		}
	}

	pub fn cache_config(&self) -> AttributeCacheConfig {
		AttributeCacheConfig {
			ttl_ms: self.cache_ttl_secs.saturating_mul(1000),
			sweep_interval_ms: self.cache_sweep_secs.saturating_mul(1000),
		}
	}

	pub fn filter_config(&self) -> AuditFilterConfig {
		AuditFilterConfig {
			mode: self.audit_mode,
			strip_environment: self.strip_environment,
		}
	}

	pub fn async_audit_config(&self) -> AsyncAuditConfig {
		AsyncAuditConfig {
			queue_capacity: self.audit_queue_capacity,
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
	/// JSON-lines audit log to check.
	pub path: PathBuf,

	/// Reject entries older than this many seconds.
	#[arg(long)]
	pub max_age_secs: Option<u64>,

	/// Accept only these signer identities (repeatable).
	#[arg(long = "allowed-signer")]
	pub allowed_signers: Vec<String>,

	/// Accept only these base64 DER public keys (repeatable).
	#[arg(long = "trusted-key")]
	pub trusted_keys: Vec<String>,
}

impl VerifyArgs {
	pub fn verifier_config(&self) -> VerifierConfig {
		fn non_empty(values: &[String]) -> Option<BTreeSet<String>> {
			(!values.is_empty()).then(|| values.iter().cloned().collect())
		}

		VerifierConfig {
			max_age: self.max_age_secs.map(Duration::from_secs),
			allowed_signers: non_empty(&self.allowed_signers),
			trusted_public_keys: non_empty(&self.trusted_keys),
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct KeygenArgs {
	/// Where to write the PKCS#8 PEM private key.
	#[arg(long)]
	pub out: PathBuf,

	/// Overwrite an existing file.
	#[arg(long)]
	pub force: bool,
}
