// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit entry signing.
//!
//! The signed message is the SHA-256 digest of the entry's canonical JSON
//! (see [`AuditEntry::canonical_bytes`]). Signatures are raw 64-byte P-256
//! `r || s` values and public keys are SubjectPublicKeyInfo DER, both base64
//! encoded on the entry.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use tracing::warn;

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};
use crate::logger::AuditLogger;

/// Produces signatures over entry digests.
pub trait AuditSigner: Send + Sync {
	/// Recorded on each entry as `signed_by`.
	fn identity(&self) -> &str;

	fn sign_digest(&self, digest: &[u8; 32]) -> AuditResult<Vec<u8>>;

	/// DER-encoded SubjectPublicKeyInfo of the verifying key.
	fn public_key_der(&self) -> AuditResult<Vec<u8>>;
}

/// ECDSA P-256 signer.
pub struct EcdsaAuditSigner {
	key: SigningKey,
	identity: String,
}

impl EcdsaAuditSigner {
	pub fn new(key: SigningKey, identity: impl Into<String>) -> Self {
		Self {
			key,
			identity: identity.into(),
		}
	}

	/// Generates a fresh key from the operating system RNG.
	pub fn generate(identity: impl Into<String>) -> Self {
		Self::new(SigningKey::random(&mut rand::rngs::OsRng), identity)
	}

	pub fn from_pkcs8_pem(pem: &str, identity: impl Into<String>) -> AuditResult<Self> {
		let key = SigningKey::from_pkcs8_pem(pem)
			.map_err(|e| AuditError::Signing(format!("invalid PKCS#8 private key: {e}")))?;
		Ok(Self::new(key, identity))
	}

	pub fn to_pkcs8_pem(&self) -> AuditResult<String> {
		let pem = self
			.key
			.to_pkcs8_pem(LineEnding::LF)
			.map_err(|e| AuditError::Signing(format!("failed to encode private key: {e}")))?;
		Ok(pem.to_string())
	}

	/// Base64 of the DER public key, the form stored on entries and pinned by verifiers.
	pub fn public_key_base64(&self) -> AuditResult<String> {
		Ok(BASE64.encode(self.public_key_der()?))
	}
}

impl AuditSigner for EcdsaAuditSigner {
	fn identity(&self) -> &str {
		&self.identity
	}

	fn sign_digest(&self, digest: &[u8; 32]) -> AuditResult<Vec<u8>> {
		let signature: Signature = self
			.key
			.sign_prehash(digest)
			.map_err(|e| AuditError::Signing(e.to_string()))?;
		Ok(signature.to_bytes().to_vec())
	}

	fn public_key_der(&self) -> AuditResult<Vec<u8>> {
		let document = self
			.key
			.verifying_key()
			.to_public_key_der()
			.map_err(|e| AuditError::Signing(format!("failed to encode public key: {e}")))?;
		Ok(document.as_bytes().to_vec())
	}
}

/// Signs `entry` in place, replacing any previous signature.
pub fn sign_entry(signer: &dyn AuditSigner, entry: &mut AuditEntry) -> AuditResult<()> {
	entry.clear_signature();
	let digest = entry.digest()?;
	let signature = signer.sign_digest(&digest)?;
	let public_key = signer.public_key_der()?;

	entry.signature = Some(BASE64.encode(signature));
	entry.public_key = Some(BASE64.encode(public_key));
	entry.signed_by = Some(signer.identity().to_string());
	Ok(())
}

/// Signs each entry before handing it to the wrapped logger.
///
/// A signing failure is logged and the entry is delivered unsigned.
pub struct SigningAuditLogger<L> {
	inner: L,
	signer: Arc<dyn AuditSigner>,
}

impl<L: AuditLogger> SigningAuditLogger<L> {
	pub fn new(inner: L, signer: Arc<dyn AuditSigner>) -> Self {
		Self { inner, signer }
	}
}

#[async_trait]
impl<L: AuditLogger> AuditLogger for SigningAuditLogger<L> {
	fn name(&self) -> &str {
		self.inner.name()
	}

	async fn log_decision(&self, mut entry: AuditEntry) -> AuditResult<()> {
		if let Err(e) = sign_entry(self.signer.as_ref(), &mut entry) {
			warn!(
				signer = self.signer.identity(),
				error = %e,
				"failed to sign audit entry, delivering unsigned"
			);
			entry.clear_signature();
		}
		self.inner.log_decision(entry).await
	}

	async fn close(&self) -> AuditResult<()> {
		self.inner.close().await
	}
}
