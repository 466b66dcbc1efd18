// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden server binary.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_audit::{
	AsyncAuditLogger, AuditLogger, AuditedEngine, EcdsaAuditSigner, FilteringAuditLogger,
	JsonLinesAuditLogger, SigningAuditLogger, TracingAuditLogger,
};
use warden_authz::{
	AttributeResolver, CompositeResourceStore, Engine, InMemoryPolicyStore, InMemoryResourceStore,
	PolicyResourceStore, PolicyStore,
};
use warden_server::config::{Cli, Command, KeygenArgs, ServeArgs, VerifyArgs};
use warden_server::{create_router, verify_audit_log, AppState, TrustedHeaders};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_tracing(&cli);

	match cli.command {
		Command::Serve(args) => serve(args).await,
		Command::Verify(args) => verify(args).await,
		Command::Keygen(args) => keygen(args).await,
	}
}

fn init_tracing(cli: &Cli) {
	let (json, plain) = if cli.json_logs {
		(Some(fmt::layer().json()), None)
	} else {
		(None, Some(fmt::layer()))
	};

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
		.with(json)
		.with(plain)
		.init();
}

async fn audit_logger(args: &ServeArgs) -> anyhow::Result<Arc<dyn AuditLogger>> {
	let sink: Arc<dyn AuditLogger> = match &args.audit_log {
		Some(path) => {
			tracing::info!(path = %path.display(), "writing audit entries to file");
			Arc::new(JsonLinesAuditLogger::new(path))
		}
		None => Arc::new(TracingAuditLogger::new()),
	};

	let sink: Arc<dyn AuditLogger> = match &args.signing_key {
		Some(path) => {
			let pem = tokio::fs::read_to_string(path)
				.await
				.with_context(|| format!("reading signing key {}", path.display()))?;
			let signer = EcdsaAuditSigner::from_pkcs8_pem(&pem, args.signer_id.as_str())
				.with_context(|| format!("loading signing key {}", path.display()))?;
			tracing::info!(signer_id = %args.signer_id, "audit signing enabled");
			Arc::new(SigningAuditLogger::new(sink, Arc::new(signer)))
		}
		None => {
			tracing::warn!("no signing key configured; audit entries will be unsigned");
			sink
		}
	};

	let queued = AsyncAuditLogger::new(sink, args.async_audit_config());
	Ok(Arc::new(FilteringAuditLogger::new(queued, args.filter_config())))
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
	tracing::info!(listen_addr = %args.listen_addr, "starting warden-server");

	let policy_store = Arc::new(InMemoryPolicyStore::new());
	for organization_id in &args.seed_organization {
		policy_store
			.load_built_in_policies(organization_id)
			.await
			.with_context(|| format!("seeding built-in policies for {organization_id}"))?;
		tracing::info!(organization_id = %organization_id, "seeded built-in policies");
	}
	let policies: Arc<dyn PolicyStore> = policy_store;

	let resources = CompositeResourceStore::new()
		.with_route(
			PolicyResourceStore::RESOURCE_TYPE,
			Arc::new(PolicyResourceStore::new(policies.clone())),
		)
		.with_fallback(Arc::new(InMemoryResourceStore::new()));
	let resolver = Arc::new(AttributeResolver::new(Arc::new(resources), args.cache_config()));
	let engine = Arc::new(Engine::new(policies.clone(), resolver, args.engine_config()));
	let audited = AuditedEngine::new(engine, audit_logger(&args).await?);

	let mut app = create_router(AppState::new(policies, audited.clone()));
	if args.trust_identity_headers {
		tracing::warn!(
			"trusting x-warden-* identity headers; only run behind an authenticating proxy"
		);
		app = app.layer(TrustedHeaders);
	} else {
		tracing::warn!("no identity layer configured; authorized routes will answer 401");
	}
	let app = app.layer(TraceLayer::new_for_http());

	let listener = tokio::net::TcpListener::bind(args.listen_addr)
		.await
		.with_context(|| format!("binding {}", args.listen_addr))?;
	tracing::info!("listening on {}", args.listen_addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "failed to listen for shutdown signal");
			}
			tracing::info!("received shutdown signal");
		})
		.await
		.context("server error")?;

	tracing::info!("flushing audit trail");
	audited.shutdown().await.context("closing audit logger")?;
	tracing::info!("server shutdown complete");
	Ok(())
}

async fn verify(args: VerifyArgs) -> anyhow::Result<()> {
	verify_audit_log(&args, &mut std::io::stdout().lock()).await?;
	Ok(())
}

async fn keygen(args: KeygenArgs) -> anyhow::Result<()> {
	if !args.force && tokio::fs::try_exists(&args.out).await.unwrap_or(false) {
		bail!("{} already exists; pass --force to overwrite", args.out.display());
	}

	let signer = EcdsaAuditSigner::generate("warden");
	let pem = signer.to_pkcs8_pem()?;

	let mut options = tokio::fs::OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	options.mode(0o600);
	let mut file = options
		.open(&args.out)
		.await
		.with_context(|| format!("creating {}", args.out.display()))?;
	file.write_all(pem.as_bytes()).await?;
	file.sync_all().await?;

	println!("{}", signer.public_key_base64()?);
	tracing::info!(path = %args.out.display(), "wrote audit signing key");
	Ok(())
}
