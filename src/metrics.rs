// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Gauge, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use crate::domain::Mode;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static POLLS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("position_polls_total", "position list polls").unwrap());

pub static STOPS_PLACED: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("stop_orders_placed_total", "stop-loss orders placed").unwrap());

pub static CLEANUPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("position_cleanups_total", "closed-position cleanup sweeps").unwrap()
});

pub static API_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("api_errors_total", "failed engine ticks (label: mode)"),
        &["mode"],
    )
    .unwrap()
});

pub static MODE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("engine_mode", "active engine mode (label: mode)"),
        &["mode"],
    )
    .unwrap()
});

pub static NOTIONAL: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("managed_notional_usdt", "notional of the managed position").unwrap()
});

pub static STOP_PRICE: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("last_stop_price", "last quantized stop price placed").unwrap());

pub fn set_mode(mode: Mode) {
    MODE.with_label_values(&["watching"])
        .set((mode == Mode::Watching) as i64);
    MODE.with_label_values(&["managing"])
        .set((mode == Mode::Managing) as i64);
}

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(POLLS.clone())),
        REGISTRY.register(Box::new(STOPS_PLACED.clone())),
        REGISTRY.register(Box::new(CLEANUPS.clone())),
        REGISTRY.register(Box::new(API_ERRORS.clone())),
        REGISTRY.register(Box::new(MODE.clone())),
        REGISTRY.register(Box::new(NOTIONAL.clone())),
        REGISTRY.register(Box::new(STOP_PRICE.clone())),
    ] {
        let _ = m;
    }
}

fn render() -> Vec<u8> {
    let mut body = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&REGISTRY.gather(), &mut body).is_err() || body.is_empty() {
        body.extend_from_slice(b"# no metrics\n");
    }
    body
}

// Minimal HTTP 1.1 responder: any request path gets the full text exposition.
fn respond(mut stream: TcpStream) {
    // Drain whatever headers arrived; nothing in the request matters.
    let _ = stream.read(&mut [0u8; 1024]);

    let body = render();
    let mut rsp = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    rsp.extend_from_slice(&body);
    let _ = stream.write_all(&rsp);
    let _ = stream.flush();
}

// The exporter runs on its own OS thread so the Tokio runtime stays clean.
pub async fn serve_metrics(port: u16) {
    thread::spawn(move || {
        let addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&addr)
            .unwrap_or_else(|e| panic!("metrics bind {} failed: {}", addr, e));
        eprintln!("metrics listening on http://{addr}/metrics");

        for conn in listener.incoming() {
            match conn {
                Ok(stream) => respond(stream),
                Err(e) => eprintln!("metrics accept error: {}", e),
            }
        }
    });
}
