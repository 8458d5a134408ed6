//! Instrument universe helpers: parsing and merging symbol lists.

use crate::domain::error::TurtlescanError;
use std::collections::BTreeSet;

/// Parse a comma-separated symbol list: trimmed, uppercased, duplicates and
/// empty tokens rejected. Used for CLI/config symbol overrides.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, TurtlescanError> {
    let mut symbols = Vec::new();
    let mut seen = BTreeSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(TurtlescanError::Universe {
                reason: "empty token in symbol list".into(),
            });
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(TurtlescanError::Universe {
                reason: format!("duplicate symbol: {symbol}"),
            });
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Union of several ticker lists (one per watchlist file), de-duplicated
/// and sorted — the shape every scan expects its input in.
pub fn merge_symbol_lists(lists: &[Vec<String>]) -> Vec<String> {
    let unique: BTreeSet<String> = lists.iter().flatten().cloned().collect();
    unique.into_iter().collect()
}
