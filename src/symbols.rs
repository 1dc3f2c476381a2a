// ===============================
// src/symbols.rs
// ===============================
//
// Exchanges disagree on contract spelling (BTCUSDT, BTC_USDT, BTC-USDT,
// BTCUSDT-PERP). Matching runs on a normalized form; the variant list covers
// the known conventions without asking the exchange for a symbol directory.

/// Canonical comparison form: uppercase, separators stripped, the literal
/// "PERP" marker stripped. Only for equality checks, never for display.
pub fn normalize(s: &str) -> String {
    s.to_ascii_uppercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .replace("PERP", "")
}

/// The four candidate spellings for a user-entered root symbol.
pub fn variants(base: &str) -> Vec<String> {
    let base = base.to_ascii_uppercase();
    let (root, base) = match base.strip_suffix("USDT") {
        Some(root) => (root.to_string(), base.clone()),
        None => (base.clone(), format!("{base}USDT")),
    };
    vec![
        format!("{root}USDT"),
        format!("{root}_USDT"),
        format!("{root}-USDT"),
        format!("{base}-PERP"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_separators_and_perp() {
        assert_eq!(normalize("btc-usdt"), "BTCUSDT");
        assert_eq!(normalize("BTC_USDT"), "BTCUSDT");
        assert_eq!(normalize("BTCUSDT-PERP"), "BTCUSDT");
        assert_eq!(normalize("ethusdt"), "ETHUSDT");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["BTC-USDT", "eth_usdt", "SOLUSDT-PERP", "DOGEUSDT"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn variants_of_root_symbol() {
        assert_eq!(
            variants("BTC"),
            vec!["BTCUSDT", "BTC_USDT", "BTC-USDT", "BTCUSDT-PERP"]
        );
    }

    #[test]
    fn variants_accept_suffixed_input() {
        assert_eq!(
            variants("ethusdt"),
            vec!["ETHUSDT", "ETH_USDT", "ETH-USDT", "ETHUSDT-PERP"]
        );
    }

    #[test]
    fn variants_all_normalize_onto_the_root_pair() {
        let vs = variants("SOL");
        assert_eq!(vs.len(), 4);
        for v in &vs {
            assert_eq!(normalize(v), "SOLUSDT");
        }
    }
}
