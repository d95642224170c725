//! Ticker symbol normalization
//!
//! The upstream provider keys B3 (Brazilian exchange) tickers with a `.SA`
//! suffix, while the API and the database use the bare ticker. Both
//! directions live here so every call site agrees on the mapping.

/// Exchange suffix used by the market data provider.
pub const EXCHANGE_SUFFIX: &str = ".SA";

/// Append the exchange suffix if it is not already present.
pub fn normalize(symbol: &str) -> String {
    if symbol.ends_with(EXCHANGE_SUFFIX) {
        symbol.to_string()
    } else {
        format!("{}{}", symbol, EXCHANGE_SUFFIX)
    }
}

/// Strip the exchange suffix, returning the bare ticker.
pub fn denormalize(symbol: &str) -> String {
    symbol
        .strip_suffix(EXCHANGE_SUFFIX)
        .unwrap_or(symbol)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_suffix_when_missing() {
        assert_eq!(normalize("PETR4"), "PETR4.SA");
    }

    #[test]
    fn leaves_suffixed_symbol_unchanged() {
        assert_eq!(normalize("PETR4.SA"), "PETR4.SA");
    }

    #[test]
    fn denormalize_is_inverse() {
        assert_eq!(denormalize(&normalize("VALE3")), "VALE3");
        assert_eq!(denormalize("VALE3"), "VALE3");
    }
}
