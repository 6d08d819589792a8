use serde_json::Value;

use super::amount;
use super::payload::{RawCmaPayload, RawYearRecord, StructuredCma, TableRow, TabularCma};
use super::statements::{CmaModel, TrustTier, YearData};
use crate::types::Money;

/// Base fiscal year used when column headers are missing entirely and labels
/// must be synthesized.
const FALLBACK_BASE_YEAR: i32 = 2024;

// Row-label synonym dictionaries, one per YearData field. Matching is
// case-insensitive substring search; the first matching row wins.
const REVENUE_KEYWORDS: &[&str] = &["revenue", "turnover", "sales", "income from operations"];
const PAT_KEYWORDS: &[&str] = &["profit after tax", "pat", "net profit"];
const DEPRECIATION_KEYWORDS: &[&str] = &["depreciation", "amortization"];
const INTEREST_KEYWORDS: &[&str] = &["interest", "finance cost"];
const CURRENT_ASSETS_KEYWORDS: &[&str] = &["current assets"];
const CURRENT_LIABILITIES_KEYWORDS: &[&str] = &["current liabilities"];
const LONG_TERM_DEBT_KEYWORDS: &[&str] = &["term loan", "long term borrowing", "long term debt"];
const SHORT_TERM_DEBT_KEYWORDS: &[&str] =
    &["working capital", "short term borrowing", "cc/od", "bank borrowing"];
const NET_WORTH_KEYWORDS: &[&str] =
    &["net worth", "equity", "shareholders fund", "tangible net worth", "tnw"];
const FIXED_ASSETS_KEYWORDS: &[&str] = &["fixed assets", "property plant", "ppe", "gross block"];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert a raw extraction payload into a normalized `CmaModel`.
///
/// Best-effort by design: malformed cells read as zero and an unidentifiable
/// payload yields an empty model, so unparseable upstream AI output never
/// blocks the pipeline. Constructing the model applies the optimism
/// guardrail.
pub fn parse_cma(raw: &Value) -> CmaModel {
    match RawCmaPayload::from_value(raw) {
        RawCmaPayload::Structured(payload) => from_structured(payload),
        RawCmaPayload::Tabular(payload) => from_tabular(payload),
    }
}

// ---------------------------------------------------------------------------
// Structured fast path
// ---------------------------------------------------------------------------

fn from_structured(payload: StructuredCma) -> CmaModel {
    let audited = payload
        .audited_financials
        .into_iter()
        .map(|record| into_year_data(record, TrustTier::Audited))
        .collect();
    let provisional = payload
        .provisional_financials
        .and_then(|wrapped| wrapped.into_first())
        .map(|record| into_year_data(record, TrustTier::Provisional));
    let projected = payload
        .projected_financials
        .into_iter()
        .map(|record| into_year_data(record, TrustTier::Projected))
        .collect();

    CmaModel::new(audited, provisional, projected)
}

fn into_year_data(record: RawYearRecord, default_tier: TrustTier) -> YearData {
    let tier = record
        .tier
        .as_deref()
        .and_then(normalize_tier)
        .unwrap_or(default_tier);

    YearData {
        year: record.year.unwrap_or_default(),
        tier,
        revenue: record.revenue,
        pat: record.pat,
        depreciation: record.depreciation,
        interest_expense: record.interest_expense,
        current_assets: record.current_assets,
        fixed_assets: record.fixed_assets,
        current_liabilities: record.current_liabilities,
        long_term_debt: record.long_term_debt,
        short_term_debt: record.short_term_debt,
        tangible_net_worth: record.tangible_net_worth,
    }
}

/// Map a free-form tier string onto a trust tier.
fn normalize_tier(raw: &str) -> Option<TrustTier> {
    match raw.trim().to_lowercase().as_str() {
        "estimated" | "estimate" | "current" | "provisional" => Some(TrustTier::Provisional),
        "projected" | "projection" | "forecast" | "target" => Some(TrustTier::Projected),
        "audited" | "actual" | "historical" => Some(TrustTier::Audited),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tabular slow path
// ---------------------------------------------------------------------------

fn from_tabular(payload: TabularCma) -> CmaModel {
    let operating = payload.operating_statement;
    let balance = payload.balance_sheet;

    let mut years = if !operating.years.is_empty() {
        operating.years.clone()
    } else {
        balance.years.clone()
    };
    if years.is_empty() {
        years = infer_year_labels(&operating.rows, &balance.rows);
    }
    if years.is_empty() {
        return CmaModel::empty();
    }

    let mut audited = Vec::new();
    let mut provisional = None;
    let mut projected = Vec::new();

    for (idx, label) in years.iter().enumerate() {
        let tier = tier_from_label(label, idx);
        let year = YearData {
            year: label.clone(),
            tier,
            revenue: row_value(&operating.rows, REVENUE_KEYWORDS, idx),
            pat: row_value(&operating.rows, PAT_KEYWORDS, idx),
            depreciation: row_value(&operating.rows, DEPRECIATION_KEYWORDS, idx),
            interest_expense: row_value(&operating.rows, INTEREST_KEYWORDS, idx),
            current_assets: row_value(&balance.rows, CURRENT_ASSETS_KEYWORDS, idx),
            fixed_assets: row_value(&balance.rows, FIXED_ASSETS_KEYWORDS, idx),
            current_liabilities: row_value(&balance.rows, CURRENT_LIABILITIES_KEYWORDS, idx),
            long_term_debt: row_value(&balance.rows, LONG_TERM_DEBT_KEYWORDS, idx),
            short_term_debt: row_value(&balance.rows, SHORT_TERM_DEBT_KEYWORDS, idx),
            tangible_net_worth: row_value(&balance.rows, NET_WORTH_KEYWORDS, idx),
        };

        match tier {
            TrustTier::Audited => audited.push(year),
            TrustTier::Provisional => provisional = Some(year),
            TrustTier::Projected => projected.push(year),
        }
    }

    CmaModel::new(audited, provisional, projected)
}

/// Find a row by label keywords and read the value in the given year column.
/// Rows whose value arrays are too short are skipped in favour of later
/// matches; no match at all reads as zero.
fn row_value(rows: &[TableRow], keywords: &[&str], idx: usize) -> Money {
    for row in rows {
        let label = row.particulars.to_lowercase();
        if !keywords.iter().any(|kw| label.contains(kw)) {
            continue;
        }
        if let Some(cell) = row.values.get(idx) {
            return amount::coerce_value(cell);
        }
    }
    Money::ZERO
}

/// Tier from the year-column label, falling back to position: the first two
/// columns read as audited history, the remainder as projections.
fn tier_from_label(label: &str, idx: usize) -> TrustTier {
    let lowered = label.to_lowercase();
    if lowered.contains("audited") || lowered.contains("actual") {
        TrustTier::Audited
    } else if lowered.contains("estimated") || lowered.contains("provisional") {
        TrustTier::Provisional
    } else if lowered.contains("projected")
        || lowered.contains("forecast")
        || lowered.contains("target")
    {
        TrustTier::Projected
    } else if idx < 2 {
        TrustTier::Audited
    } else {
        TrustTier::Projected
    }
}

/// Rescue heuristic for tables that carry value rows but no year header:
/// synthesize sequential FY labels, treating all but the last two columns as
/// audited history.
fn infer_year_labels(operating_rows: &[TableRow], balance_rows: &[TableRow]) -> Vec<String> {
    let max_cols = operating_rows
        .iter()
        .chain(balance_rows)
        .map(|row| row.values.len())
        .max()
        .unwrap_or(0);

    (0..max_cols)
        .map(|i| {
            let offset = i as i32 - 2;
            let suffix = if i + 2 < max_cols {
                " (Audited)"
            } else {
                " (Projected)"
            };
            format!("FY{}{}", FALLBACK_BASE_YEAR + offset, suffix)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_structured_fast_path() {
        let raw = serde_json::json!({
            "audited_financials": [
                {"year": "FY23", "tier": "audited", "revenue": 1_000_000, "pat": 80_000}
            ],
            "provisional_financials": {"year": "FY24E", "tier": "estimated", "revenue": 1_200_000},
            "projected_financials": [
                {"year": "FY25P", "tier": "forecast", "revenue": 1_400_000}
            ]
        });
        let model = parse_cma(&raw);
        assert_eq!(model.audited_financials().len(), 1);
        assert_eq!(model.audited_financials()[0].pat, dec!(80_000));
        let provisional = model.provisional_financials().unwrap();
        assert_eq!(provisional.tier, TrustTier::Provisional);
        assert_eq!(model.projected_financials()[0].tier, TrustTier::Projected);
    }

    #[test]
    fn test_structured_missing_tier_defaults_by_container() {
        let raw = serde_json::json!({
            "audited_financials": [{"year": "FY23", "revenue": 500}],
            "projected_financials": [{"year": "FY25P", "revenue": 600}]
        });
        let model = parse_cma(&raw);
        assert_eq!(model.audited_financials()[0].tier, TrustTier::Audited);
        assert_eq!(model.projected_financials()[0].tier, TrustTier::Projected);
    }

    #[test]
    fn test_tabular_slow_path_with_synonyms() {
        let raw = serde_json::json!({
            "operating_statement": {
                "years": ["FY22 (Audited)", "FY23 (Audited)", "FY24 (Projected)"],
                "rows": [
                    {"particulars": "Total Turnover", "values": [900, 1000, 1100]},
                    {"particulars": "Net Profit", "values": [90, 100, 110]},
                    {"particulars": "Finance Costs", "values": [9, 10, 11]}
                ]
            },
            "balance_sheet": {
                "years": ["FY22 (Audited)", "FY23 (Audited)", "FY24 (Projected)"],
                "rows": [
                    {"particulars": "Total Current Assets", "values": ["1,500", "1,600", "1,700"]},
                    {"particulars": "Total Current Liabilities", "values": [700, 800, 900]},
                    {"particulars": "Shareholders Funds", "values": [400, 500, 600]}
                ]
            }
        });
        let model = parse_cma(&raw);
        assert_eq!(model.audited_financials().len(), 2);
        assert_eq!(model.projected_financials().len(), 1);
        let fy23 = &model.audited_financials()[1];
        assert_eq!(fy23.revenue, dec!(1000));
        assert_eq!(fy23.pat, dec!(100));
        assert_eq!(fy23.interest_expense, dec!(10));
        assert_eq!(fy23.current_assets, dec!(1600));
        assert_eq!(fy23.tangible_net_worth, dec!(500));
        // No debt rows at all: read as zero, not an error.
        assert_eq!(fy23.long_term_debt, Money::ZERO);
    }

    #[test]
    fn test_tabular_positional_tier_fallback() {
        let raw = serde_json::json!({
            "operating_statement": {
                "years": ["FY22", "FY23", "FY24", "FY25"],
                "rows": [{"particulars": "Revenue", "values": [1, 2, 3, 4]}]
            }
        });
        let model = parse_cma(&raw);
        assert_eq!(model.audited_financials().len(), 2);
        assert_eq!(model.projected_financials().len(), 2);
    }

    #[test]
    fn test_missing_years_header_is_rescued_from_row_width() {
        let raw = serde_json::json!({
            "operating_statement": {
                "rows": [{"particulars": "Revenue", "values": [10, 20, 30, 40, 50]}]
            }
        });
        let model = parse_cma(&raw);
        // Five columns: first three audited, last two projected.
        assert_eq!(model.audited_financials().len(), 3);
        assert_eq!(model.projected_financials().len(), 2);
        assert_eq!(model.audited_financials()[0].year, "FY2022 (Audited)");
        assert_eq!(model.projected_financials()[1].year, "FY2026 (Projected)");
    }

    #[test]
    fn test_no_identifiable_years_yields_empty_model() {
        let raw = serde_json::json!({"operating_statement": {"rows": []}});
        let model = parse_cma(&raw);
        assert!(!model.has_financials());

        let model = parse_cma(&serde_json::json!({"unrelated": true}));
        assert!(!model.has_financials());
    }

    #[test]
    fn test_parse_triggers_optimism_guardrail() {
        let raw = serde_json::json!({
            "audited_financials": [{"year": "FY23", "revenue": 1_000_000}],
            "projected_financials": [{"year": "FY24P", "revenue": 5_000_000}]
        });
        let model = parse_cma(&raw);
        assert_eq!(model.projected_financials()[0].revenue, dec!(1_500_000));
        assert!(model.adjusted_projections());
    }

    #[test]
    fn test_short_row_is_skipped_for_later_match() {
        let raw = serde_json::json!({
            "operating_statement": {
                "years": ["FY22", "FY23"],
                "rows": [
                    {"particulars": "Revenue (net)", "values": [100]},
                    {"particulars": "Gross Sales", "values": [100, 200]}
                ]
            }
        });
        let model = parse_cma(&raw);
        // The first revenue row has no FY23 column; the sales row supplies it.
        assert_eq!(model.audited_financials()[1].revenue, dec!(200));
    }
}
