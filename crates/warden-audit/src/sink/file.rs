// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::entry::AuditEntry;
use crate::error::{AuditError, AuditResult};
use crate::logger::AuditLogger;

/// Appends one JSON entry per line to a file, flushing after every entry.
///
/// The file is opened lazily on the first entry and released by `close`.
pub struct JsonLinesAuditLogger {
	path: PathBuf,
	file: Mutex<Option<File>>,
}

impl JsonLinesAuditLogger {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			file: Mutex::new(None),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn open(&self) -> AuditResult<File> {
		OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)
			.await
			.map_err(AuditError::from)
	}
}

pub fn format_json_line(entry: &AuditEntry) -> AuditResult<String> {
	let json = serde_json::to_string(entry)?;
	Ok(format!("{json}\n"))
}

#[async_trait]
impl AuditLogger for JsonLinesAuditLogger {
	fn name(&self) -> &str {
		"json-lines"
	}

	async fn log_decision(&self, entry: AuditEntry) -> AuditResult<()> {
		let line = format_json_line(&entry)?;

		let mut guard = self.file.lock().await;
		if guard.is_none() {
			*guard = Some(self.open().await?);
		}
		let file = guard.as_mut().ok_or(AuditError::Closed)?;

		file.write_all(line.as_bytes()).await?;
		file.flush().await?;
		Ok(())
	}

	async fn close(&self) -> AuditResult<()> {
		if let Some(mut file) = self.file.lock().await.take() {
			file.flush().await?;
			file.sync_all().await?;
		}
		Ok(())
	}
}

/// Reads a JSON-lines audit stream. Blank lines are skipped.
pub async fn read_json_lines(path: impl AsRef<Path>) -> AuditResult<Vec<AuditEntry>> {
	let file = File::open(path.as_ref()).await?;
	let mut lines = BufReader::new(file).lines();
	let mut entries = Vec::new();
	while let Some(line) = lines.next_line().await? {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		entries.push(serde_json::from_str(line)?);
	}
	Ok(entries)
}
