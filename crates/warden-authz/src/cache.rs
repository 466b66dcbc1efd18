// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! TTL cache for resource attributes with a background sweeper.
//!
//! The sweeper is an owned task: [`AttributeCache::start`] spawns it and
//! [`AttributeCache::shutdown`] stops and joins it. Shutdown is idempotent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::attributes::Attributes;

const DEFAULT_TTL_MS: u64 = 60_000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 30_000;

fn default_ttl_ms() -> u64 {
	DEFAULT_TTL_MS
}

fn default_sweep_interval_ms() -> u64 {
	DEFAULT_SWEEP_INTERVAL_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCacheConfig {
	#[serde(default = "default_ttl_ms")]
	pub ttl_ms: u64,
	#[serde(default = "default_sweep_interval_ms")]
	pub sweep_interval_ms: u64,
}

impl Default for AttributeCacheConfig {
	fn default() -> Self {
		Self {
			ttl_ms: default_ttl_ms(),
			sweep_interval_ms: default_sweep_interval_ms(),
		}
	}
}

impl AttributeCacheConfig {
	pub fn ttl(&self) -> Duration {
		Duration::from_millis(self.ttl_ms)
	}

	pub fn sweep_interval(&self) -> Duration {
		Duration::from_millis(self.sweep_interval_ms.max(1))
	}
}

#[derive(Debug, Clone)]
struct CacheEntry {
	attributes: Attributes,
	expires_at: Instant,
}

type Entries = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Thread-safe TTL cache keyed by `type:id`.
///
/// Reads and writes always copy: no caller ever holds a reference into the
/// cache. Every invalidation bumps a generation counter so a fill that raced
/// with it can be discarded (see [`AttributeCache::insert_if_unchanged`]).
pub struct AttributeCache {
	entries: Entries,
	generation: AtomicU64,
	ttl: Duration,
	shutdown_tx: watch::Sender<bool>,
	sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl AttributeCache {
	/// Creates the cache and spawns its sweeper on the current tokio runtime.
	pub fn start(config: AttributeCacheConfig) -> Self {
		let entries: Entries = Arc::new(RwLock::new(HashMap::new()));
		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let handle = tokio::spawn(sweep_loop(
			Arc::clone(&entries),
			config.sweep_interval(),
			shutdown_rx,
		));

		Self {
			entries,
			generation: AtomicU64::new(0),
			ttl: config.ttl(),
			shutdown_tx,
			sweeper: Mutex::new(Some(handle)),
		}
	}

	pub fn key(resource_type: &str, id: &str) -> String {
		format!("{resource_type}:{id}")
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns a copy of the live entry for `key`, ignoring expired ones.
	pub async fn get(&self, key: &str) -> Option<Attributes> {
		let entries = self.entries.read().await;
		entries
			.get(key)
			.filter(|entry| entry.expires_at > Instant::now())
			.map(|entry| entry.attributes.clone())
	}

	pub async fn insert(&self, key: String, attributes: Attributes) {
		let entry = CacheEntry {
			attributes,
			expires_at: Instant::now() + self.ttl,
		};
		self.entries.write().await.insert(key, entry);
	}

	/// Current invalidation generation. Read it before fetching the value
	/// later passed to [`AttributeCache::insert_if_unchanged`].
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Inserts only if no invalidation happened since `seen` was read.
	pub async fn insert_if_unchanged(
		&self,
		key: String,
		attributes: Attributes,
		seen: u64,
	) -> bool {
		let mut entries = self.entries.write().await;
		if self.generation.load(Ordering::Acquire) != seen {
			return false;
		}
		entries.insert(
			key,
			CacheEntry {
				attributes,
				expires_at: Instant::now() + self.ttl,
			},
		);
		true
	}

	pub async fn invalidate(&self, key: &str) -> bool {
		let mut entries = self.entries.write().await;
		self.generation.fetch_add(1, Ordering::AcqRel);
		entries.remove(key).is_some()
	}

	/// Removes expired entries now, returning how many were dropped.
	pub async fn purge_expired(&self) -> usize {
		purge(&self.entries).await
	}

	/// Number of stored entries, expired or not.
	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}

	/// Stops the sweeper and waits for it to exit.
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(true);
		let handle = self.sweeper.lock().await.take();
		if let Some(handle) = handle {
			let _ = handle.await;
			info!("attribute cache sweeper stopped");
		}
	}
}

impl Drop for AttributeCache {
	fn drop(&mut self) {
		let _ = self.shutdown_tx.send(true);
	}
}

async fn purge(entries: &Entries) -> usize {
	let now = Instant::now();
	let mut entries = entries.write().await;
	let before = entries.len();
	entries.retain(|_, entry| entry.expires_at > now);
	before - entries.len()
}

async fn sweep_loop(entries: Entries, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
	let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
	loop {
		tokio::select! {
			_ = ticker.tick() => {
				let removed = purge(&entries).await;
				if removed > 0 {
					debug!(removed, "evicted expired attribute cache entries");
				}
			}
			changed = shutdown_rx.changed() => {
				if changed.is_err() || *shutdown_rx.borrow() {
					break;
				}
			}
		}
	}
}
