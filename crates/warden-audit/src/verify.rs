// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline verification of signed audit entries.
//!
//! The verifier needs nothing but the entries themselves. It fails closed:
//! an unsigned entry is never valid.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use serde::{Deserialize, Serialize};

use crate::entry::AuditEntry;
use crate::error::{AuditResult, VerifyError};
use crate::sink::read_json_lines;

pub const REASON_VALID: &str = "signature valid";
pub const REASON_UNSIGNED: &str = "entry is not signed";
pub const REASON_SIGNER_NOT_ALLOWED: &str = "signer not allowed";
pub const REASON_TOO_OLD: &str = "entry exceeds maximum age";
pub const REASON_KEY_NOT_TRUSTED: &str = "public key not trusted";
pub const REASON_BAD_SIGNATURE: &str = "signature verification failed";

const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
	/// Reject entries whose timestamp is older than this.
	#[serde(default)]
	pub max_age: Option<Duration>,
	/// Accept only these `signed_by` identities.
	#[serde(default)]
	pub allowed_signers: Option<BTreeSet<String>>,
	/// Accept only these base64 DER public keys.
	#[serde(default)]
	pub trusted_public_keys: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
	pub valid: bool,
	pub reason: String,
}

impl VerificationResult {
	fn valid() -> Self {
		Self {
			valid: true,
			reason: REASON_VALID.to_string(),
		}
	}

	fn invalid(reason: &str) -> Self {
		Self {
			valid: false,
			reason: reason.to_string(),
		}
	}

	pub fn is_unsigned(&self) -> bool {
		!self.valid && self.reason == REASON_UNSIGNED
	}
}

/// Tally of a batch verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
	pub total: usize,
	pub valid: usize,
	/// Signed entries that failed a check, structurally broken ones included.
	pub invalid: usize,
	pub unsigned: usize,
	/// The structurally broken subset of `invalid`.
	pub errors: usize,
}

impl VerificationSummary {
	pub fn all_valid(&self) -> bool {
		self.valid == self.total
	}

	/// Entries that did not verify, unsigned ones included.
	pub fn failed(&self) -> usize {
		self.total - self.valid
	}

	fn record(&mut self, result: &Result<VerificationResult, VerifyError>) {
		match result {
			Ok(r) if r.valid => self.valid += 1,
			Ok(r) if r.is_unsigned() => self.unsigned += 1,
			Ok(_) => self.invalid += 1,
			Err(_) => {
				self.invalid += 1;
				self.errors += 1;
			}
		}
	}
}

/// Outcome of checking a persisted JSON-lines audit log.
#[derive(Debug)]
pub struct FileVerification {
	pub entries: Vec<AuditEntry>,
	/// One result per entry, in file order.
	pub results: Vec<Result<VerificationResult, VerifyError>>,
	pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default)]
pub struct AuditVerifier {
	config: VerifierConfig,
}

impl AuditVerifier {
	pub fn new(config: VerifierConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &VerifierConfig {
		&self.config
	}

	/// Verifies one entry.
	///
	/// Policy violations (unsigned, stale, disallowed signer, untrusted key,
	/// wrong signature) are `valid = false` results. Undecodable fields are
	/// errors.
	pub fn verify(&self, entry: &AuditEntry) -> Result<VerificationResult, VerifyError> {
		let Some(signature_b64) = entry.signature.as_deref() else {
			return Ok(VerificationResult::invalid(REASON_UNSIGNED));
		};
		let public_key_b64 = entry.public_key.as_deref().ok_or_else(|| {
			VerifyError::InvalidPublicKey("signed entry carries no public key".to_string())
		})?;

		if let Some(allowed) = &self.config.allowed_signers {
			let signer = entry.signed_by.as_deref().unwrap_or_default();
			if !allowed.contains(signer) {
				return Ok(VerificationResult::invalid(REASON_SIGNER_NOT_ALLOWED));
			}
		}

		if let Some(max_age) = self.config.max_age {
			let age = Utc::now().signed_duration_since(entry.timestamp);
			if let Ok(max_age) = chrono::Duration::from_std(max_age) {
				if age > max_age {
					return Ok(VerificationResult::invalid(REASON_TOO_OLD));
				}
			}
		}

		if let Some(trusted) = &self.config.trusted_public_keys {
			if !trusted.contains(public_key_b64) {
				return Ok(VerificationResult::invalid(REASON_KEY_NOT_TRUSTED));
			}
		}

		let key_der = BASE64
			.decode(public_key_b64)
			.map_err(|source| VerifyError::InvalidEncoding {
				field: "public_key",
				source,
			})?;
		let key = VerifyingKey::from_public_key_der(&key_der)
			.map_err(|e| VerifyError::InvalidPublicKey(e.to_string()))?;

		let signature_bytes = BASE64
			.decode(signature_b64)
			.map_err(|source| VerifyError::InvalidEncoding {
				field: "signature",
				source,
			})?;
		if signature_bytes.len() != SIGNATURE_LEN {
			return Err(VerifyError::InvalidSignatureLength(signature_bytes.len()));
		}
		// Right length but out-of-range scalars: a bad value, not a bad shape.
		let Ok(signature) = Signature::from_slice(&signature_bytes) else {
			return Ok(VerificationResult::invalid(REASON_BAD_SIGNATURE));
		};

		let digest = entry.digest()?;
		match key.verify_prehash(&digest, &signature) {
			Ok(()) => Ok(VerificationResult::valid()),
			Err(_) => Ok(VerificationResult::invalid(REASON_BAD_SIGNATURE)),
		}
	}

	pub fn verify_batch(
		&self,
		entries: &[AuditEntry],
	) -> Vec<Result<VerificationResult, VerifyError>> {
		entries.iter().map(|entry| self.verify(entry)).collect()
	}

	pub fn summarize(&self, entries: &[AuditEntry]) -> VerificationSummary {
		tally(&self.verify_batch(entries))
	}

	/// Reads a JSON-lines audit log and verifies every entry in it.
	///
	/// Unreadable files and unparseable lines are errors; entries that fail
	/// verification are reported in the returned summary.
	pub async fn verify_file(&self, path: impl AsRef<Path>) -> AuditResult<FileVerification> {
		let entries = read_json_lines(path).await?;
		let results = self.verify_batch(&entries);
		let summary = tally(&results);
		Ok(FileVerification {
			entries,
			results,
			summary,
		})
	}
}

fn tally(results: &[Result<VerificationResult, VerifyError>]) -> VerificationSummary {
	let mut summary = VerificationSummary {
		total: results.len(),
		..Default::default()
	};
	for result in results {
		summary.record(result);
	}
	summary
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use warden_authz::{AuthorizationRequest, Decision, Resource, Subject};

	use super::*;
	use crate::signing::{sign_entry, EcdsaAuditSigner};

	fn entry() -> AuditEntry {
		let request = AuthorizationRequest::new(
			Some(Subject::new("u1", "org-1", "admin")),
			"plan:approve",
			Resource::new("plan", "plan-123"),
		)
		.with_environment("request_id", "req-1");
		AuditEntry::from_decision(
			&request,
			&Decision::allow(vec!["p1".to_string()]),
			Duration::from_millis(4),
		)
	}

	fn signed(signer: &EcdsaAuditSigner) -> AuditEntry {
		let mut entry = entry();
		sign_entry(signer, &mut entry).unwrap();
		entry
	}

	#[test]
	fn signed_entries_verify() {
		let signer = EcdsaAuditSigner::generate("warden");
		let result = AuditVerifier::default().verify(&signed(&signer)).unwrap();
		assert!(result.valid);
		assert_eq!(result.reason, REASON_VALID);
	}

	#[test]
	fn tampering_breaks_the_signature() {
		let signer = EcdsaAuditSigner::generate("warden");
		let mut entry = signed(&signer);
		entry.allowed = false;

		let result = AuditVerifier::default().verify(&entry).unwrap();
		assert!(!result.valid);
		assert_eq!(result.reason, REASON_BAD_SIGNATURE);
	}

	#[test]
	fn signature_from_another_key_fails() {
		let mut entry = signed(&EcdsaAuditSigner::generate("a"));
		let other = signed(&EcdsaAuditSigner::generate("a"));
		entry.public_key = other.public_key;

		let result = AuditVerifier::default().verify(&entry).unwrap();
		assert_eq!(result.reason, REASON_BAD_SIGNATURE);
	}

	#[test]
	fn unsigned_entries_are_invalid_not_errors() {
		let result = AuditVerifier::default().verify(&entry()).unwrap();
		assert!(!result.valid);
		assert_eq!(result.reason, REASON_UNSIGNED);
		assert!(result.is_unsigned());
	}

	#[test]
	fn max_age_is_measured_from_the_entry_timestamp() {
		let signer = EcdsaAuditSigner::generate("warden");
		let mut old = entry();
		old.timestamp = Utc::now() - chrono::Duration::hours(2);
		sign_entry(&signer, &mut old).unwrap();

		let strict = AuditVerifier::new(VerifierConfig {
			max_age: Some(Duration::from_secs(3600)),
			..Default::default()
		});
		let result = strict.verify(&old).unwrap();
		assert!(!result.valid);
		assert_eq!(result.reason, REASON_TOO_OLD);

		let lenient = AuditVerifier::new(VerifierConfig {
			max_age: Some(Duration::from_secs(3 * 3600)),
			..Default::default()
		});
		assert!(lenient.verify(&old).unwrap().valid);
	}

	#[test]
	fn disallowed_signers_are_rejected() {
		let entry = signed(&EcdsaAuditSigner::generate("rogue"));
		let verifier = AuditVerifier::new(VerifierConfig {
			allowed_signers: Some(BTreeSet::from(["warden".to_string()])),
			..Default::default()
		});
		assert_eq!(verifier.verify(&entry).unwrap().reason, REASON_SIGNER_NOT_ALLOWED);
	}

	#[test]
	fn only_pinned_keys_are_trusted() {
		let pinned = EcdsaAuditSigner::generate("warden");
		let impostor = EcdsaAuditSigner::generate("warden");
		let verifier = AuditVerifier::new(VerifierConfig {
			trusted_public_keys: Some(BTreeSet::from([pinned.public_key_base64().unwrap()])),
			..Default::default()
		});

		assert!(verifier.verify(&signed(&pinned)).unwrap().valid);
		let result = verifier.verify(&signed(&impostor)).unwrap();
		assert!(!result.valid);
		assert_eq!(result.reason, REASON_KEY_NOT_TRUSTED);
	}

	#[test]
	fn structural_damage_is_an_error() {
		let signer = EcdsaAuditSigner::generate("warden");
		let verifier = AuditVerifier::default();

		let mut bad_base64 = signed(&signer);
		bad_base64.signature = Some("!!not base64!!".to_string());
		assert!(matches!(
			verifier.verify(&bad_base64),
			Err(VerifyError::InvalidEncoding { field: "signature", .. })
		));

		let mut short = signed(&signer);
		short.signature = Some(BASE64.encode([1u8; 32]));
		assert!(matches!(
			verifier.verify(&short),
			Err(VerifyError::InvalidSignatureLength(32))
		));

		let mut bad_key = signed(&signer);
		bad_key.public_key = Some(BASE64.encode(b"not a key"));
		assert!(matches!(
			verifier.verify(&bad_key),
			Err(VerifyError::InvalidPublicKey(_))
		));

		let mut keyless = signed(&signer);
		keyless.public_key = None;
		assert!(matches!(
			verifier.verify(&keyless),
			Err(VerifyError::InvalidPublicKey(_))
		));
	}

	#[test]
	fn summary_tallies_each_outcome() {
		let signer = EcdsaAuditSigner::generate("warden");
		let good = signed(&signer);
		let mut tampered = signed(&signer);
		tampered.reason = "edited".to_string();
		let mut broken = signed(&signer);
		broken.signature = Some(BASE64.encode([7u8; 10]));

		let entries = vec![good.clone(), good, tampered, entry(), broken];
		let summary = AuditVerifier::default().summarize(&entries);
		assert_eq!(
			summary,
			VerificationSummary {
				total: 5,
				valid: 2,
				invalid: 2,
				unsigned: 1,
				errors: 1,
			}
		);
		assert!(!summary.all_valid());
	}

	mod on_disk {
		use std::collections::BTreeMap;
		use std::sync::Arc;

		use tempfile::TempDir;
		use warden_authz::AttrValue;

		use super::*;
		use crate::logger::AuditLogger;
		use crate::pipeline::{AsyncAuditConfig, AsyncAuditLogger};
		use crate::signing::SigningAuditLogger;
		use crate::sink::JsonLinesAuditLogger;

		fn varied_entry(request_id: &str) -> AuditEntry {
			let mut nested = BTreeMap::new();
			nested.insert("region".to_string(), AttrValue::from("eu-west-1"));
			nested.insert("weight".to_string(), AttrValue::from(0.25));
			let request = AuthorizationRequest::new(
				Some(Subject::new("u1", "org-1", "member").with_email("u1@example.com")),
				"plan:approve",
				Resource::new("plan", "plan-123"),
			)
			.with_environment("request_id", request_id)
			.with_environment("score", 1.5)
			.with_environment("whole", 1.0)
			.with_environment("count", i64::MAX)
			.with_environment("not_a_number", f64::NAN)
			.with_environment("infinite", f64::INFINITY)
			.with_environment("tags", vec!["a", "b"])
			.with_environment("nested", AttrValue::Map(nested));
			AuditEntry::from_decision(
				&request,
				&Decision::default_deny(),
				Duration::from_nanos(1_234_567),
			)
		}

		async fn write_signed_log(path: &Path, count: usize) {
			let signer = Arc::new(EcdsaAuditSigner::generate("warden"));
			let logger = AsyncAuditLogger::new(
				SigningAuditLogger::new(JsonLinesAuditLogger::new(path), signer),
				AsyncAuditConfig::default(),
			);
			for i in 0..count {
				logger
					.log_decision(varied_entry(&format!("req-{i}")))
					.await
					.unwrap();
			}
			logger.close().await.unwrap();
		}

		#[tokio::test]
		async fn signed_entries_survive_the_json_lines_round_trip() {
			let dir = TempDir::new().unwrap();
			let path = dir.path().join("audit.jsonl");
			write_signed_log(&path, 3).await;

			let report = AuditVerifier::default().verify_file(&path).await.unwrap();
			assert_eq!(report.entries.len(), 3);
			assert_eq!(report.entries[0].duration, Duration::from_nanos(1_234_567));
			assert!(report.entries[0].environment["not_a_number"].is_null());
			assert!(report.results.iter().all(|r| matches!(r, Ok(r) if r.valid)));
			assert!(report.summary.all_valid());
			assert_eq!(report.summary.failed(), 0);
		}

		#[tokio::test]
		async fn edited_and_unsigned_lines_are_reported() {
			let dir = TempDir::new().unwrap();
			let path = dir.path().join("audit.jsonl");
			write_signed_log(&path, 3).await;

			let raw = tokio::fs::read_to_string(&path).await.unwrap();
			let mut lines: Vec<String> = raw.lines().map(str::to_string).collect();
			assert!(lines[1].contains("\"allowed\":false"));
			lines[1] = lines[1].replace("\"allowed\":false", "\"allowed\":true");

			let mut unsigned = varied_entry("req-unsigned");
			unsigned.clear_signature();
			lines.push(serde_json::to_string(&unsigned).unwrap());
			tokio::fs::write(&path, lines.join("\n") + "\n").await.unwrap();

			let report = AuditVerifier::default().verify_file(&path).await.unwrap();
			assert_eq!(
				report.summary,
				VerificationSummary {
					total: 4,
					valid: 2,
					invalid: 1,
					unsigned: 1,
					errors: 0,
				}
			);
			assert!(!report.summary.all_valid());
			assert_eq!(report.summary.failed(), 2);
			assert!(matches!(&report.results[1], Ok(r) if r.reason == REASON_BAD_SIGNATURE));
		}

		#[tokio::test]
		async fn unparseable_log_is_an_error() {
			let dir = TempDir::new().unwrap();
			let path = dir.path().join("audit.jsonl");
			tokio::fs::write(&path, "{\"truncated\": \n").await.unwrap();

			assert!(AuditVerifier::default().verify_file(&path).await.is_err());
		}
	}
}
