// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `verify` subcommand: offline check of a JSON-lines audit log.

use std::io::Write;

use anyhow::{bail, Context};
use warden_audit::{AuditVerifier, VerificationSummary};

use crate::config::VerifyArgs;

/// Verifies every entry of `args.path`, reporting failures and the summary to `out`.
///
/// Fails when the log cannot be read or any entry does not verify, so the
/// process exits non-zero on a tampered, unsigned or broken trail.
pub async fn verify_audit_log(
	args: &VerifyArgs,
	out: &mut impl Write,
) -> anyhow::Result<VerificationSummary> {
	let verifier = AuditVerifier::new(args.verifier_config());
	let report = verifier
		.verify_file(&args.path)
		.await
		.with_context(|| format!("reading audit log {}", args.path.display()))?;

	for (index, (entry, result)) in report.entries.iter().zip(&report.results).enumerate() {
		match result {
			Ok(result) if result.valid => {}
			Ok(result) => writeln!(
				out,
				"entry {} (request {}): invalid: {}",
				index + 1,
				entry.request_id,
				result.reason
			)?,
			Err(e) => writeln!(
				out,
				"entry {} (request {}): error: {}",
				index + 1,
				entry.request_id,
				e
			)?,
		}
	}

	let summary = report.summary;
	writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
	if !summary.all_valid() {
		bail!(
			"{} of {} audit entries failed verification",
			summary.failed(),
			summary.total
		);
	}
	Ok(summary)
}
