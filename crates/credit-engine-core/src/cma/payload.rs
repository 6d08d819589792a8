use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::amount;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

/// Raw extraction payload as produced by the upstream document-AI step.
///
/// Two shapes are accepted: lists of already-normalized year records, or the
/// generic years/rows tables the extractor falls back to when it cannot
/// normalize. Everything downstream matches exhaustively on this type, so
/// missing-field handling is decided here and nowhere else.
#[derive(Debug, Clone)]
pub enum RawCmaPayload {
    Structured(StructuredCma),
    Tabular(TabularCma),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredCma {
    #[serde(default)]
    pub audited_financials: Vec<RawYearRecord>,
    #[serde(default)]
    pub provisional_financials: Option<OneOrMany>,
    #[serde(default)]
    pub projected_financials: Vec<RawYearRecord>,
}

/// The extractor sometimes wraps the single provisional year in a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(RawYearRecord),
    Many(Vec<RawYearRecord>),
}

impl OneOrMany {
    pub fn into_first(self) -> Option<RawYearRecord> {
        match self {
            Self::One(record) => Some(record),
            Self::Many(records) => records.into_iter().next(),
        }
    }
}

/// One year of extracted figures with loosely-typed cells: every amount may
/// arrive as a number, a formatted string, or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawYearRecord {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default, deserialize_with = "amount_cell")]
    pub revenue: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub pat: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub depreciation: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub interest_expense: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub current_assets: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub fixed_assets: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub current_liabilities: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub long_term_debt: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub short_term_debt: Money,
    #[serde(default, deserialize_with = "amount_cell")]
    pub tangible_net_worth: Money,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabularCma {
    #[serde(default)]
    pub operating_statement: StatementTable,
    #[serde(default)]
    pub balance_sheet: StatementTable,
}

/// A generic statement section: a year header row and labelled value rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementTable {
    #[serde(default)]
    pub years: Vec<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub particulars: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

fn amount_cell<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(amount::coerce_value(&value))
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

const STRUCTURED_KEYS: &[&str] = &[
    "audited_financials",
    "provisional_financials",
    "projected_financials",
];

impl RawCmaPayload {
    /// Classify a raw JSON document into one of the two accepted shapes.
    ///
    /// Presence of any structured key selects the structured reading; a
    /// structured payload that fails to deserialize degrades to the tabular
    /// reading, and anything else degrades to an empty table. Never fails.
    pub fn from_value(value: &Value) -> Self {
        if let Value::Object(map) = value {
            if STRUCTURED_KEYS.iter().any(|key| map.contains_key(*key)) {
                if let Ok(parsed) = serde_json::from_value::<StructuredCma>(value.clone()) {
                    return Self::Structured(parsed);
                }
            }
        }
        Self::Tabular(serde_json::from_value(value.clone()).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
