// ===============================
// src/domain.rs
// ===============================
/// Position direction as reported by the exchange, normalized from the
/// aliases Bitunix uses across endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
    Unknown,
}

impl Default for Side {
    fn default() -> Self {
        Side::Unknown
    }
}

impl Side {
    pub fn parse(s: &str) -> Side {
        match s.to_ascii_uppercase().as_str() {
            "LONG" | "BUY" => Side::Long,
            "SHORT" | "SELL" => Side::Short,
            _ => Side::Unknown,
        }
    }
}

/// Canonical view of one raw position record, derived fresh on every poll.
#[derive(Debug, Clone, Default)]
pub struct CanonicalPosition {
    pub side: Side,
    pub qty: f64,
    pub entry_price: f64,
    pub notional: f64,
    pub position_id: String,
}

impl CanonicalPosition {
    /// A position can be protected only when every field the stop placement
    /// needs is usable. Anything else counts as "no open position".
    pub fn actionable(&self) -> bool {
        self.qty != 0.0
            && self.entry_price > 0.0
            && self.notional > 0.0
            && !self.position_id.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Watching,
    Managing,
}

/// State owned by the reconciliation loop. Reset to a fresh value whenever
/// the managed position closes; never persisted.
#[derive(Debug, Clone)]
pub struct ManagementState {
    pub mode: Mode,
    /// User-supplied root symbol (exchange-agnostic spelling).
    pub symbol: String,
    /// Last exchange-confirmed exact spelling.
    pub resolved_symbol: Option<String>,
    /// Risk budget in quote currency, fixed until reset.
    pub max_loss: f64,
    /// Notional at which the stop was last placed. `None` forces the next
    /// MANAGING tick to issue one.
    pub last_notional: Option<f64>,
}

impl ManagementState {
    pub fn new(symbol: String, max_loss: f64) -> Self {
        Self {
            mode: Mode::Watching,
            symbol,
            resolved_symbol: None,
            max_loss,
            last_notional: None,
        }
    }
}
