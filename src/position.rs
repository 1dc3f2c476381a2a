// ===============================
// src/position.rs
// ===============================
//
// Bitunix position endpoints are not consistent about field names, so each
// canonical value is pulled from a fixed alternative list, first present
// (and parseable) wins. Missing or malformed fields degrade to zero/empty
// instead of failing, so the caller can apply the actionable() check
// uniformly to whatever comes back.

use serde_json::Value;

use crate::domain::{CanonicalPosition, Side};

const SIDE_FIELDS: &[&str] = &["side", "positionSide", "posSide"];
const QTY_FIELDS: &[&str] = &["qty", "positionSize", "size", "volume", "availableQty"];
const ENTRY_FIELDS: &[&str] = &["avgOpenPrice", "entryPrice", "avgPrice"];
const ID_FIELDS: &[&str] = &["positionId", "id"];
const SYMBOL_FIELDS: &[&str] = &["symbol", "tradingPair"];

/// Number from a JSON field that may arrive as a number or a numeric string.
pub(crate) fn num(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_num(record: &Value, fields: &[&str]) -> f64 {
    fields
        .iter()
        .filter_map(|f| record.get(f))
        .filter_map(num)
        .next()
        .unwrap_or(0.0)
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The symbol spelling a position record carries, as the exchange wrote it.
pub fn record_symbol(record: &Value) -> Option<String> {
    SYMBOL_FIELDS
        .iter()
        .filter_map(|f| record.get(f))
        .filter_map(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_uppercase())
        .next()
}

/// Canonicalize one raw position record. Never fails.
pub fn extract(record: &Value) -> CanonicalPosition {
    let side = SIDE_FIELDS
        .iter()
        .filter_map(|f| record.get(f))
        .filter_map(|v| v.as_str())
        .map(Side::parse)
        .next()
        .unwrap_or(Side::Unknown);

    let qty = first_num(record, QTY_FIELDS);
    let entry_price = first_num(record, ENTRY_FIELDS);

    // Explicit notional wins; otherwise derive it when both inputs exist.
    let notional = record
        .get("positionValue")
        .and_then(num)
        .or_else(|| {
            if qty != 0.0 && entry_price != 0.0 {
                Some(qty.abs() * entry_price)
            } else {
                None
            }
        })
        .unwrap_or(0.0);

    let position_id = ID_FIELDS
        .iter()
        .filter_map(|f| record.get(f))
        .filter_map(id_string)
        .next()
        .unwrap_or_default();

    CanonicalPosition {
        side,
        qty,
        entry_price,
        notional,
        position_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_primary_field_names() {
        let p = extract(&json!({
            "symbol": "BTCUSDT",
            "side": "LONG",
            "qty": "0.5",
            "avgOpenPrice": "40000",
            "positionId": "abc-1",
        }));
        assert_eq!(p.side, Side::Long);
        assert_eq!(p.qty, 0.5);
        assert_eq!(p.entry_price, 40000.0);
        assert_eq!(p.notional, 20000.0); // derived |qty| * entry
        assert_eq!(p.position_id, "abc-1");
        assert!(p.actionable());
    }

    #[test]
    fn falls_back_through_alternative_names() {
        let p = extract(&json!({
            "posSide": "sell",
            "positionSize": 2,
            "entryPrice": 100,
            "positionValue": "250",
            "id": 987654,
        }));
        assert_eq!(p.side, Side::Short);
        assert_eq!(p.qty, 2.0);
        assert_eq!(p.entry_price, 100.0);
        assert_eq!(p.notional, 250.0); // explicit field beats |qty| * entry
        assert_eq!(p.position_id, "987654");
    }

    #[test]
    fn malformed_fields_degrade_to_zero() {
        let p = extract(&json!({
            "side": "LONG",
            "qty": "not-a-number",
            "size": "1.5",
            "avgOpenPrice": null,
            "avgPrice": "99.5",
            "positionId": "x",
        }));
        // unparseable qty falls through to the next alternative
        assert_eq!(p.qty, 1.5);
        assert_eq!(p.entry_price, 99.5);
    }

    #[test]
    fn missing_everything_yields_inert_position() {
        let p = extract(&json!({}));
        assert_eq!(p.side, Side::Unknown);
        assert_eq!(p.qty, 0.0);
        assert_eq!(p.entry_price, 0.0);
        assert_eq!(p.notional, 0.0);
        assert!(p.position_id.is_empty());
        assert!(!p.actionable());
    }

    #[test]
    fn missing_position_id_is_never_actionable() {
        let p = extract(&json!({
            "side": "LONG",
            "qty": 1,
            "avgOpenPrice": 50,
        }));
        assert_eq!(p.notional, 50.0);
        assert!(!p.actionable());
    }

    #[test]
    fn zero_qty_is_never_actionable() {
        let p = extract(&json!({
            "side": "SHORT",
            "qty": 0,
            "avgOpenPrice": 50,
            "positionValue": 100,
            "positionId": "live",
        }));
        assert!(!p.actionable());
    }

    #[test]
    fn record_symbol_prefers_symbol_then_trading_pair() {
        assert_eq!(
            record_symbol(&json!({"symbol": "btc-usdt"})).as_deref(),
            Some("BTC-USDT")
        );
        assert_eq!(
            record_symbol(&json!({"tradingPair": "ETH_USDT"})).as_deref(),
            Some("ETH_USDT")
        );
        assert_eq!(record_symbol(&json!({"symbol": ""})), None);
        assert_eq!(record_symbol(&json!({})), None);
    }
}
