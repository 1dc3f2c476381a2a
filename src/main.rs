// ===============================
// src/main.rs
// ===============================
/*
=============================================================================
Project : sl_bot_rust — Bitunix futures stop-loss manager in Rust

Summary : Watches one leveraged futures position over the signed Bitunix
          REST API and keeps a stop-loss order sized to a fixed max-loss
          budget: fuzzy symbol matching across spelling conventions,
          tick-size price quantization in exact decimal arithmetic,
          idempotent re-issue as the position notional moves, Prometheus
          metrics, console prompts for symbol + budget.
=============================================================================
*/
mod config;
mod domain;
mod engine;
mod gateway;
mod metrics;
mod position;
mod prompt;
mod quantize;
mod signing;
mod symbols;

use tokio::select;
use tracing::info;

#[tokio::main]
async fn main() {
    // ---- Logging ----
    tracing_subscriber::fmt().with_env_filter("info").init();

    // ---- Load config ----
    let settings = config::load();

    // ---- Metrics ----
    metrics::init();
    tokio::spawn(metrics::serve_metrics(settings.metrics_port));

    info!(
        base_url = %settings.base_url,
        poll_seconds = settings.poll_seconds,
        metrics_port = settings.metrics_port,
        "startup config"
    );

    let gw = gateway::Gateway::new(&settings);

    // ---- Initial inputs ----
    let inputs = prompt::prompt_inputs_blocking().await;

    // ---- Reconciliation loop, raced against Ctrl-C ----
    select! {
        _ = engine::run(gw, inputs, settings.poll_seconds) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
    }
}
