//! Collecting the result stream and rendering it for the terminal.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::mpsc;

use crate::models::BalanceRecord;

/// Drains the stream until every producer is done.
pub async fn collect(mut records: mpsc::Receiver<BalanceRecord>) -> Vec<BalanceRecord> {
    let mut out = Vec::new();
    while let Some(record) = records.recv().await {
        out.push(record);
    }
    out
}

/// Orders by fiat value (largest first), then network, then token.
pub fn sort_records(records: &mut [BalanceRecord]) {
    records.sort_by(|a, b| {
        b.usd_value
            .cmp(&a.usd_value)
            .then_with(|| a.network.cmp(&b.network))
            .then_with(|| a.token.cmp(&b.token))
    });
}

/// Per-token totals across every network and account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub tokens: BTreeMap<String, TokenTotal>,
    pub total_value: Decimal,
    pub records: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenTotal {
    pub amount: Decimal,
    pub value: Decimal,
}

pub fn summarize(records: &[BalanceRecord]) -> Summary {
    let mut summary = Summary {
        records: records.len(),
        ..Default::default()
    };
    for record in records {
        let total = summary.tokens.entry(record.token.clone()).or_default();
        total.amount = total.amount.saturating_add(record.amount);
        total.value = total.value.saturating_add(record.usd_value);
        summary.total_value = summary.total_value.saturating_add(record.usd_value);
    }
    summary
}

/// Rounds to `dp` places (half away from zero) and inserts thousands separators.
pub fn format_amount(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let s = pad_fraction_to_dp(&rounded.abs().normalize().to_string(), dp);
    let grouped = group_number_string(&s);
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn group_int_digits(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

fn pad_fraction_to_dp(s: &str, dp: u32) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if dp == 0 {
        return int_part.to_string();
    }

    let mut out = String::with_capacity(int_part.len() + 1 + dp as usize);
    out.push_str(int_part);
    out.push('.');
    let frac: String = frac_part.chars().take(dp as usize).collect();
    out.push_str(&frac);
    for _ in frac.len()..dp as usize {
        out.push('0');
    }
    out
}

fn group_number_string(s: &str) -> String {
    match s.split_once('.') {
        Some((int_part, frac)) => format!("{}.{frac}", group_int_digits(int_part)),
        None => group_int_digits(s),
    }
}

/// Fixed-width table of non-zero records.
pub fn render_table(records: &[BalanceRecord], quote_currency: &str) -> String {
    let quote = quote_currency.to_uppercase();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:<46} {:<14} {:>22} {:>16}",
        "NETWORK", "ACCOUNT", "TOKEN", "AMOUNT", quote
    );
    let _ = writeln!(out, "{}", "-".repeat(126));
    for record in records.iter().filter(|r| !r.amount.is_zero()) {
        let _ = writeln!(
            out,
            "{:<24} {:<46} {:<14} {:>22} {:>16}",
            record.network,
            record.account,
            truncate(&record.token, 14),
            format_amount(record.amount, 6),
            format_amount(record.usd_value, 2),
        );
    }
    out
}

pub fn render_summary(summary: &Summary, quote_currency: &str) -> String {
    let quote = quote_currency.to_uppercase();
    let mut tokens: Vec<(&String, &TokenTotal)> = summary.tokens.iter().collect();
    tokens.sort_by(|a, b| b.1.value.cmp(&a.1.value).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    let _ = writeln!(out, "{:<24} {:>22} {:>16}", "TOKEN", "AMOUNT", quote);
    let _ = writeln!(out, "{}", "-".repeat(64));
    for (token, total) in tokens.into_iter().filter(|(_, t)| !t.amount.is_zero()) {
        let _ = writeln!(
            out,
            "{:<24} {:>22} {:>16}",
            truncate(token, 24),
            format_amount(total.amount, 6),
            format_amount(total.value, 2),
        );
    }
    let _ = writeln!(out, "{}", "-".repeat(64));
    let _ = writeln!(
        out,
        "{:<24} {:>22} {:>16}",
        "TOTAL",
        format!("{} records", summary.records),
        format_amount(summary.total_value, 2)
    );
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}
