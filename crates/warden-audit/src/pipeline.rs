// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Asynchronous audit delivery.
//!
//! [`AsyncAuditLogger`] owns a bounded queue and one background task that
//! drains it into the wrapped logger. When the queue is full the caller writes
//! synchronously instead, so an entry is never dropped and a caller never
//! waits on queue space.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};
use crate::logger::AuditLogger;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

fn default_queue_capacity() -> usize {
	DEFAULT_QUEUE_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncAuditConfig {
	#[serde(default = "default_queue_capacity")]
	pub queue_capacity: usize,
}

impl Default for AsyncAuditConfig {
	fn default() -> Self {
		Self {
			queue_capacity: default_queue_capacity(),
		}
	}
}

pub struct AsyncAuditLogger<L: AuditLogger + 'static> {
	inner: Arc<L>,
	tx: RwLock<Option<mpsc::Sender<AuditEntry>>>,
	worker: Mutex<Option<JoinHandle<()>>>,
}

impl<L: AuditLogger + 'static> AsyncAuditLogger<L> {
	/// Spawns the delivery task on the current tokio runtime.
	pub fn new(inner: L, config: AsyncAuditConfig) -> Self {
		let inner = Arc::new(inner);
		let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
		let worker = tokio::spawn(Self::background_task(rx, Arc::clone(&inner)));

		Self {
			inner,
			tx: RwLock::new(Some(tx)),
			worker: Mutex::new(Some(worker)),
		}
	}

	async fn background_task(mut rx: mpsc::Receiver<AuditEntry>, inner: Arc<L>) {
		while let Some(entry) = rx.recv().await {
			if let Err(e) = inner.log_decision(entry).await {
				warn!(sink = inner.name(), error = %e, "audit delivery failed");
			}
		}
		debug!(sink = inner.name(), "audit queue drained");
	}
}

#[async_trait]
impl<L: AuditLogger + 'static> AuditLogger for AsyncAuditLogger<L> {
	fn name(&self) -> &str {
		self.inner.name()
	}

	#[instrument(skip(self, entry), fields(action = %entry.action, allowed = entry.allowed))]
	async fn log_decision(&self, entry: AuditEntry) -> AuditResult<()> {
		// Held across the fallback write so that `close` cannot finish underneath it.
		let guard = self.tx.read().await;
		let tx = guard.as_ref().ok_or(AuditError::Closed)?;

		match tx.try_send(entry) {
			Ok(()) => Ok(()),
			Err(TrySendError::Full(entry)) => {
				debug!("audit queue full, writing synchronously");
				self.inner.log_decision(entry).await
			}
			Err(TrySendError::Closed(_)) => Err(AuditError::Closed),
		}
	}

	/// Stops accepting entries, waits for the queue to drain, then closes the
	/// wrapped logger. Later calls are no-ops.
	async fn close(&self) -> AuditResult<()> {
		let Some(tx) = self.tx.write().await.take() else {
			return Ok(());
		};
		drop(tx);

		let worker = self.worker.lock().await.take();
		let drained = match worker {
			Some(worker) => worker.await.map_err(|e| AuditError::Sink {
				sink: self.inner.name().to_string(),
				message: format!("delivery task failed: {e}"),
			}),
			None => Ok(()),
		};

		// The wrapped logger is closed even when the delivery task died.
		let closed = self.inner.close().await;
		drained?;
		closed?;
		info!(sink = self.inner.name(), "audit logger closed");
		Ok(())
	}
}
