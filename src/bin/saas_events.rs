// ABOUTME: Command-line tail of one tenant's real-time event stream
// ABOUTME: Prints connection health, toasts, and workflow progress until interrupted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # saas-events
//!
//! ```bash
//! # Tail the stream of the tenant owning the token
//! saas-events --url https://app.example.com --token "$TOKEN"
//!
//! # Follow one workflow run with a 4-step progress bar
//! SAAS_EVENTS_TOKEN=... saas-events --workflow wf-42 --total-steps 4
//! ```

use std::collections::HashSet;
use std::future::pending;

use anyhow::Result;
use clap::Parser;
use saas_realtime::config::StreamConfig;
use saas_realtime::constants::env_vars;
use saas_realtime::logging::{LogFormat, LoggingConfig};
use saas_realtime::projections::{Projection, WorkflowProgress};
use saas_realtime::session::RealtimeSession;
use saas_realtime::toast::ProgressBar;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "saas-events")]
#[command(about = "Tail a tenant's real-time event stream")]
struct Args {
    /// Event server base URL (overrides SAAS_EVENTS_BASE_URL)
    #[arg(long)]
    url: Option<String>,

    /// Bearer credential for the stream
    #[arg(long, env = env_vars::TOKEN, hide_env_values = true)]
    token: String,

    /// Workflow id whose progress is shown
    #[arg(long)]
    workflow: Option<String>,

    /// Step count of the followed workflow, if known in advance
    #[arg(long)]
    total_steps: Option<u64>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::from_env();
    logging.format = LogFormat::Compact;
    if args.verbose {
        logging.level = "debug".to_owned();
    }
    logging.init()?;

    let mut config = StreamConfig::from_env();
    if let Some(url) = args.url {
        config.base_url = url;
    }
    config.validate()?;

    let session = RealtimeSession::from_config(&config)?;
    info!(session_id = %session.id(), "Tailing event stream");
    session.connect(args.token);

    let workflow: Option<Projection<WorkflowProgress>> =
        args.workflow.map(|id| session.watch_workflow(id));

    tail(&session, workflow.as_ref(), args.total_steps).await?;
    info!("Interrupted, shutting down");
    Ok(())
}

async fn tail(
    session: &RealtimeSession,
    workflow: Option<&Projection<WorkflowProgress>>,
    total_steps: Option<u64>,
) -> Result<()> {
    let mut status = session.stream().watch_status();
    let mut toast_changes = session.toasts().changes();
    let mut workflow_changes = workflow.map(|projection| projection.watch());
    let mut shown: HashSet<u64> = HashSet::new();
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                return Ok(());
            }
            changed = status.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = status.borrow_and_update().clone();
                match &current.error {
                    Some(error) => println!("[{}] {error}", current.indicator()),
                    None => println!("[{}]", current.indicator()),
                }
            }
            changed = toast_changes.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                for toast in session.visible_toasts().await {
                    if shown.insert(toast.id) {
                        println!("({}) {}: {}", toast.severity, toast.title, toast.message);
                    }
                }
            }
            Some(()) = next_change(workflow_changes.as_mut()) => {
                if let Some(projection) = workflow {
                    let progress = projection.progress().await;
                    println!("{}", ProgressBar::from_progress(&progress, total_steps));
                }
            }
        }
    }
}

/// Resolves on the next workflow change; never when no workflow is followed
async fn next_change(receiver: Option<&mut watch::Receiver<u64>>) -> Option<()> {
    match receiver {
        Some(receiver) => receiver.changed().await.ok(),
        None => pending().await,
    }
}
