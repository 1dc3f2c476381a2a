// ===============================
// src/engine.rs
// ===============================
//
// Two-state reconciliation loop.
//   WATCHING : no confirmed open position; poll until one shows up.
//   MANAGING : recompute the stop from the max-loss budget each tick and
//              re-place it whenever the position notional moves.
//
// Each tick's fallible work runs behind one error boundary: transport and
// API failures are logged and the loop keeps polling. Only an external
// interrupt (handled in main) ends the process.

use ahash::AHashSet;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::domain::{CanonicalPosition, ManagementState, Mode, Side};
use crate::gateway::{CancelOutcome, Gateway, GatewayError};
use crate::metrics;
use crate::position;
use crate::prompt::{self, Inputs};
use crate::quantize;
use crate::symbols;

/// Notional must move by more than this before the stop is re-placed.
const REISSUE_EPSILON: f64 = 1e-9;
const INVALID_STOP_DELAY: Duration = Duration::from_secs(2);
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Max-loss budget in quote currency → stop trigger before quantization.
pub fn compute_stop(side: Side, entry: f64, notional: f64, max_loss: f64) -> f64 {
    let pct = max_loss * 100.0 / notional;
    let delta = entry * pct / 100.0;
    match side {
        Side::Long => entry - delta,
        // Short and unrecognized sides stop above entry.
        _ => entry + delta,
    }
}

/// Re-place only when the notional actually moved since the last stop.
pub fn needs_reissue(notional: f64, last_notional: Option<f64>) -> bool {
    match last_notional {
        Some(prev) => (notional - prev).abs() > REISSUE_EPSILON,
        None => true,
    }
}

/// Fuzzy-match the user symbol against the account's open positions.
/// Returns the raw record plus the spelling the exchange used for it.
async fn find_position(
    gw: &Gateway,
    user_symbol: &str,
) -> Result<Option<(Value, String)>, GatewayError> {
    let records = gw.pending_positions().await?;
    metrics::POLLS.inc();

    let targets: AHashSet<String> = symbols::variants(user_symbol)
        .iter()
        .map(|v| symbols::normalize(v))
        .collect();

    for record in &records {
        if let Some(api_symbol) = position::record_symbol(record) {
            if targets.contains(&symbols::normalize(&api_symbol)) {
                return Ok(Some((record.clone(), api_symbol)));
            }
        }
    }

    let inventory: Vec<String> = records.iter().filter_map(position::record_symbol).collect();
    debug!(?inventory, "no matching position in inventory");
    Ok(None)
}

pub async fn run(gw: Gateway, initial: Inputs, poll_seconds: u64) {
    let mut state = ManagementState::new(initial.symbol, initial.max_loss);
    let poll_interval = Duration::from_secs(poll_seconds);
    info!(symbol = %state.symbol, max_loss = state.max_loss, "engine started");

    loop {
        metrics::set_mode(state.mode);
        let result = match state.mode {
            Mode::Watching => watching_tick(&gw, &mut state, poll_interval).await,
            Mode::Managing => managing_tick(&gw, &mut state).await,
        };
        if let Err(e) = result {
            let mode_label = match state.mode {
                Mode::Watching => "watching",
                Mode::Managing => "managing",
            };
            error!(error = %e, mode = mode_label, "tick failed");
            metrics::API_ERRORS.with_label_values(&[mode_label]).inc();
            sleep(ERROR_BACKOFF).await;
        }
    }
}

async fn watching_tick(
    gw: &Gateway,
    state: &mut ManagementState,
    poll_interval: Duration,
) -> Result<(), GatewayError> {
    if let Some((record, api_symbol)) = find_position(gw, &state.symbol).await? {
        let pos = position::extract(&record);
        if pos.qty != 0.0 {
            info!(symbol = %api_symbol, qty = pos.qty, "position detected, managing stop-loss");
            state.mode = Mode::Managing;
            state.resolved_symbol = Some(api_symbol);
            // Unset sentinel: the first MANAGING tick always places a stop.
            state.last_notional = None;
            return Ok(());
        }
    }
    info!(symbol = %state.symbol, "no open position, watching");
    sleep(poll_interval).await;
    Ok(())
}

async fn managing_tick(gw: &Gateway, state: &mut ManagementState) -> Result<(), GatewayError> {
    let found = find_position(gw, &state.symbol).await?;
    let pos = match &found {
        Some((record, api_symbol)) => {
            state.resolved_symbol = Some(api_symbol.clone());
            position::extract(record)
        }
        None => CanonicalPosition::default(),
    };

    if !pos.actionable() {
        handle_closed(gw, state).await;
        return Ok(());
    }

    let stop = compute_stop(pos.side, pos.entry_price, pos.notional, state.max_loss);
    if stop <= 0.0 {
        warn!(
            stop,
            max_loss = state.max_loss,
            "computed stop not positive, check the max-loss budget"
        );
        sleep(INVALID_STOP_DELAY).await;
        return Ok(());
    }

    let symbol = state
        .resolved_symbol
        .clone()
        .unwrap_or_else(|| state.symbol.clone());
    let pair_info = gw.trading_pair(&symbol).await?;
    let tick = quantize::derive_tick(&pair_info);
    let stop_q = quantize::quantize_price(stop, tick);

    if needs_reissue(pos.notional, state.last_notional) {
        info!(
            symbol = %symbol,
            side = ?pos.side,
            stop = stop_q,
            notional = pos.notional,
            "placing stop-loss"
        );
        gw.place_stop(&symbol, &pos.position_id, stop_q, pos.qty.abs())
            .await?;
        state.last_notional = Some(pos.notional);
        metrics::STOPS_PLACED.inc();
        metrics::STOP_PRICE.set(stop_q);
        metrics::NOTIONAL.set(pos.notional);
    }
    Ok(())
}

/// The managed position is gone or unusable: sweep exchange-side orders
/// (best-effort, failures ignored), reset state, ask for the next job.
async fn handle_closed(gw: &Gateway, state: &mut ManagementState) {
    let symbol = state
        .resolved_symbol
        .clone()
        .unwrap_or_else(|| state.symbol.clone());
    info!(symbol = %symbol, "position closed or invalid, cancelling TP/SL and open orders");
    metrics::CLEANUPS.inc();

    match gw.cancel_all_tpsl(&symbol).await {
        CancelOutcome::Cancelled => debug!(symbol = %symbol, "tp/sl cancelled"),
        CancelOutcome::Nothing => debug!(symbol = %symbol, "no tp/sl to cancel"),
        CancelOutcome::Failed(e) => {
            debug!(symbol = %symbol, error = %e, "tp/sl cancel failed, ignoring")
        }
    }
    if let Err(e) = gw.cancel_all_orders(&symbol).await {
        debug!(symbol = %symbol, error = %e, "cancel open orders failed, ignoring");
    }

    let inputs = prompt::prompt_inputs_blocking().await;
    *state = ManagementState::new(inputs.symbol, inputs.max_loss);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_stop_sits_below_entry() {
        // entry 100, notional 1000, budget 50 -> pct 5 -> delta 5
        let stop = compute_stop(Side::Long, 100.0, 1000.0, 50.0);
        assert_eq!(stop, 95.0);
        assert_eq!(quantize::quantize_price(stop, 0.1), 95.0);
    }

    #[test]
    fn short_stop_sits_above_entry() {
        // entry 100, notional 1000, budget 200 -> pct 20 -> delta 20
        let stop = compute_stop(Side::Short, 100.0, 1000.0, 200.0);
        assert_eq!(stop, 120.0);
        assert_eq!(quantize::quantize_price(stop, 1.0), 120.0);
    }

    #[test]
    fn unknown_side_takes_the_short_branch() {
        assert_eq!(compute_stop(Side::Unknown, 100.0, 1000.0, 50.0), 105.0);
    }

    #[test]
    fn oversized_budget_drives_stop_non_positive() {
        // entry 10, notional 10, budget 50 -> pct 500 -> delta 50 -> -40
        let stop = compute_stop(Side::Long, 10.0, 10.0, 50.0);
        assert_eq!(stop, -40.0);
        assert!(stop <= 0.0); // tick is skipped, nothing placed
    }

    #[test]
    fn first_tick_always_places() {
        assert!(needs_reissue(1000.0, None));
    }

    #[test]
    fn unchanged_notional_suppresses_reissue() {
        assert!(!needs_reissue(1000.0, Some(1000.0)));
        // within epsilon counts as unchanged
        assert!(!needs_reissue(1000.0 + 1e-10, Some(1000.0)));
    }

    #[test]
    fn moved_notional_triggers_reissue() {
        assert!(needs_reissue(1000.5, Some(1000.0)));
        assert!(needs_reissue(999.5, Some(1000.0)));
    }
}
