// ===============================
// src/quantize.rs
// ===============================
//
// Stop prices must land on the instrument's tick grid. The arithmetic runs
// on `Decimal`, not f64: 95.07 / 0.1 has to floor to exactly 950 steps, not
// drift to 949 through a binary representation error.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::position::num;

const DEFAULT_TICK: f64 = 0.01;
const SCALE_FIELDS: &[&str] = &["quotePrecision", "pricePrecision", "priceScale", "quoteScale"];

/// Tick size for a trading-pair record: explicit tick field, the price
/// filter's nested tick, 10^-scale from a precision field, then a 0.01
/// default.
pub fn derive_tick(info: &Value) -> f64 {
    let explicit = info
        .get("tickSize")
        .or_else(|| info.get("priceFilter").and_then(|pf| pf.get("tickSize")));
    if let Some(tick) = explicit.and_then(num) {
        if tick > 0.0 {
            return tick;
        }
    }
    for field in SCALE_FIELDS {
        if let Some(scale) = info.get(field).and_then(num) {
            return 1.0 / 10f64.powi(scale as i32);
        }
    }
    DEFAULT_TICK
}

/// Floor `price` onto the tick grid. Floor is deliberate for both position
/// sides; the quantized stop never crosses the requested level upward.
pub fn quantize_price(price: f64, tick: f64) -> f64 {
    let (d_price, d_tick) = match (dec(price), dec(tick)) {
        (Some(p), Some(t)) if !t.is_zero() => (p, t),
        _ => return price,
    };
    let steps = (d_price / d_tick).floor();
    (steps * d_tick).to_f64().unwrap_or(price)
}

// f64 Display yields the shortest round-trip string, so 0.1 parses as the
// decimal 0.1 rather than its binary approximation.
fn dec(x: f64) -> Option<Decimal> {
    Decimal::from_str(&x.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_tick_wins() {
        assert_eq!(derive_tick(&json!({"tickSize": "0.5"})), 0.5);
        assert_eq!(derive_tick(&json!({"tickSize": 0.001, "pricePrecision": 1})), 0.001);
    }

    #[test]
    fn nested_price_filter_tick() {
        assert_eq!(derive_tick(&json!({"priceFilter": {"tickSize": "0.05"}})), 0.05);
    }

    #[test]
    fn scale_fields_give_power_of_ten() {
        assert_eq!(derive_tick(&json!({"quotePrecision": 3})), 0.001);
        assert_eq!(derive_tick(&json!({"priceScale": "4"})), 0.0001);
    }

    #[test]
    fn zero_or_absent_tick_falls_through() {
        assert_eq!(derive_tick(&json!({"tickSize": 0, "pricePrecision": 1})), 0.1);
        assert_eq!(derive_tick(&json!({})), 0.01);
    }

    #[test]
    fn quantize_floors_onto_grid() {
        assert_eq!(quantize_price(95.07, 0.1), 95.0);
        assert_eq!(quantize_price(123.456, 0.01), 123.45);
        assert_eq!(quantize_price(120.0, 1.0), 120.0);
        assert_eq!(quantize_price(0.00949, 0.0001), 0.0094);
    }

    #[test]
    fn quantize_never_exceeds_price_and_lands_on_a_multiple() {
        let prices = [0.013, 1.0, 95.07, 1234.5678, 40000.01];
        let ticks = [0.0001, 0.01, 0.1, 0.5, 1.0];
        for &p in &prices {
            for &t in &ticks {
                let q = quantize_price(p, t);
                assert!(q <= p, "quantize({p}, {t}) = {q} > {p}");
                let steps = Decimal::from_str(&q.to_string()).unwrap()
                    / Decimal::from_str(&t.to_string()).unwrap();
                assert_eq!(steps, steps.floor(), "quantize({p}, {t}) = {q} off-grid");
            }
        }
    }

    #[test]
    fn exact_decimal_avoids_float_drift() {
        // In f64, 2.3 / 0.1 is 22.999..., which would floor a step short.
        assert_eq!(quantize_price(2.3, 0.1), 2.3);
        assert_eq!(quantize_price(0.3, 0.1), 0.3);
    }

    #[test]
    fn degenerate_tick_returns_price_unchanged() {
        assert_eq!(quantize_price(95.07, 0.0), 95.07);
    }
}
