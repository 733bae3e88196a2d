//! Resolution of raw on-chain denoms to display symbols and exponents.
//!
//! The registry's asset list is authoritative. When it is unavailable, or
//! does not list the denom, a prefix heuristic takes over, so resolution
//! never fails.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::models::NetworkKey;
use crate::registry::ChainRegistry;

/// Exponent assumed when nothing better is known (micro-denominated tokens).
pub const DEFAULT_EXPONENT: u32 = 6;

/// Exponent of atto-denominated (EVM-style) tokens.
pub const ATTO_EXPONENT: u32 = 18;

const IBC_PREFIX: &str = "ibc/";

/// Display symbol and decimal exponent for a denom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenomInfo {
    pub symbol: String,
    pub exponent: u32,
}

impl DenomInfo {
    pub fn new(symbol: impl Into<String>, exponent: u32) -> Self {
        Self {
            symbol: symbol.into(),
            exponent,
        }
    }
}

#[derive(Clone)]
pub struct DenomResolver {
    registry: Arc<dyn ChainRegistry>,
}

impl DenomResolver {
    pub fn new(registry: Arc<dyn ChainRegistry>) -> Self {
        Self { registry }
    }

    pub async fn resolve(&self, network: &NetworkKey, denom: &str) -> DenomInfo {
        match self.registry.asset_list(network).await {
            Ok(list) => {
                if let Some(asset) = list.find_base(denom) {
                    return DenomInfo::new(
                        asset.symbol.clone(),
                        asset.display_exponent().unwrap_or(DEFAULT_EXPONENT),
                    );
                }
                tracing::debug!(network = %network, denom, "denom not in asset list");
            }
            Err(err) => {
                tracing::debug!(network = %network, denom, error = %err, "asset list unavailable");
            }
        }

        heuristic(denom)
    }
}

/// Guesses symbol and exponent from the shape of the denom alone.
///
/// - `ibc/<hash>` keeps the hash and is marked unknown, exponent 6
/// - `u<name>` is micro-denominated, exponent 6
/// - `a<name>` is atto-denominated, exponent 18
/// - anything else is shown verbatim, exponent 6
pub fn heuristic(denom: &str) -> DenomInfo {
    if denom.starts_with(IBC_PREFIX) {
        return DenomInfo::new(format!("{denom} (Unknown IBC Asset)"), DEFAULT_EXPONENT);
    }
    if denom.starts_with('u') {
        return DenomInfo::new(denom.trim_start_matches('u').to_uppercase(), DEFAULT_EXPONENT);
    }
    if denom.starts_with('a') {
        return DenomInfo::new(denom.trim_start_matches('a').to_uppercase(), ATTO_EXPONENT);
    }
    DenomInfo::new(denom, DEFAULT_EXPONENT)
}

/// Scales a raw base-unit amount down by `10^exponent`.
///
/// Accepts integer and decimal strings. The decimal point is moved before
/// parsing, so raw amounts beyond `Decimal`'s range still scale as long as the
/// result fits; digits past `Decimal`'s precision are rounded. Returns `None`
/// for unparseable, negative or still out-of-range input.
pub fn scale_amount(raw: &str, exponent: u32) -> Option<Decimal> {
    let shifted = shift_point_left(raw.trim(), exponent)?;
    let value = Decimal::from_str(&shifted).ok()?;
    Some(value.normalize())
}

/// Moves the decimal point of an unsigned digit string `places` to the left.
fn shift_point_left(raw: &str, places: u32) -> Option<String> {
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw, ""));
    if int_part.is_empty() {
        return None;
    }
    if !int_part
        .bytes()
        .chain(frac_part.bytes())
        .all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let digits = format!("{int_part}{frac_part}");
    let places = usize::try_from(places).ok()?;
    let (int_digits, frac_digits) = match int_part.len().checked_sub(places) {
        Some(point) => (digits[..point].to_string(), digits[point..].to_string()),
        None => (
            String::new(),
            format!("{}{digits}", "0".repeat(places - int_part.len())),
        ),
    };

    let int_digits = match int_digits.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let frac_digits = frac_digits.trim_end_matches('0');
    if frac_digits.is_empty() {
        Some(int_digits.to_string())
    } else {
        Some(format!("{int_digits}.{frac_digits}"))
    }
}
