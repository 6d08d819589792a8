use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// YoY growth above which a projected revenue figure is considered
/// over-optimistic (3.0 = 300%).
const OPTIMISM_GROWTH_LIMIT: Decimal = dec!(3.0);

/// Replacement growth applied to capped projections (1.5 = 50% YoY).
const OPTIMISM_CAP_MULTIPLIER: Decimal = dec!(1.5);

// ---------------------------------------------------------------------------
// Year-level data
// ---------------------------------------------------------------------------

/// Data trust classification based on audit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Audited,
    Provisional,
    Projected,
}

impl std::fmt::Display for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Audited => "audited",
            Self::Provisional => "provisional",
            Self::Projected => "projected",
        };
        write!(f, "{}", s)
    }
}

/// Financial statement data for a single fiscal year, all amounts in INR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearData {
    /// Fiscal year label, e.g. "FY24".
    pub year: String,
    pub tier: TrustTier,

    // Income statement
    #[serde(default)]
    pub revenue: Money,
    #[serde(default)]
    pub pat: Money,
    #[serde(default)]
    pub depreciation: Money,
    #[serde(default)]
    pub interest_expense: Money,

    // Balance sheet
    #[serde(default)]
    pub current_assets: Money,
    #[serde(default)]
    pub fixed_assets: Money,
    #[serde(default)]
    pub current_liabilities: Money,
    #[serde(default)]
    pub long_term_debt: Money,
    #[serde(default)]
    pub short_term_debt: Money,
    /// TNW = equity less intangibles.
    #[serde(default)]
    pub tangible_net_worth: Money,
}

impl YearData {
    /// TOL = long-term debt + short-term debt + current liabilities.
    pub fn total_outside_liabilities(&self) -> Money {
        self.long_term_debt + self.short_term_debt + self.current_liabilities
    }

    /// Cash accrual = PAT + depreciation.
    pub fn cash_accrual(&self) -> Money {
        self.pat + self.depreciation
    }
}

// ---------------------------------------------------------------------------
// Borrower model
// ---------------------------------------------------------------------------

/// A borrower's full financial history, split by trust tier.
///
/// Constructed once per analysis request. The optimism guardrail runs in the
/// constructor and the model is read-only afterwards, so every consumer sees
/// the same adjusted figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CmaModelParts")]
pub struct CmaModel {
    audited_financials: Vec<YearData>,
    provisional_financials: Option<YearData>,
    projected_financials: Vec<YearData>,
    optimism_warning: Option<String>,
    adjusted_projections: bool,
}

/// Raw constructor input; deserialization routes through `CmaModel::new` so
/// the guardrail also covers models read back from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
struct CmaModelParts {
    #[serde(default)]
    audited_financials: Vec<YearData>,
    #[serde(default)]
    provisional_financials: Option<YearData>,
    #[serde(default)]
    projected_financials: Vec<YearData>,
}

impl From<CmaModelParts> for CmaModel {
    fn from(parts: CmaModelParts) -> Self {
        CmaModel::new(
            parts.audited_financials,
            parts.provisional_financials,
            parts.projected_financials,
        )
    }
}

impl CmaModel {
    /// Build the model and apply the optimism guardrail: any projected year
    /// growing more than 300% over its baseline (previous projection, or the
    /// last audited year for the first projection) is capped at 50% growth.
    /// Capped figures feed the next year's baseline.
    pub fn new(
        audited: Vec<YearData>,
        provisional: Option<YearData>,
        mut projected: Vec<YearData>,
    ) -> Self {
        let mut adjusted = false;

        if let Some(last_audited) = audited.last() {
            if last_audited.revenue > Decimal::ZERO && !projected.is_empty() {
                let mut prev_revenue = last_audited.revenue;
                for proj in projected.iter_mut() {
                    if prev_revenue > Decimal::ZERO {
                        let growth = (proj.revenue - prev_revenue) / prev_revenue;
                        if growth > OPTIMISM_GROWTH_LIMIT {
                            proj.revenue = prev_revenue * OPTIMISM_CAP_MULTIPLIER;
                            adjusted = true;
                        }
                    }
                    prev_revenue = proj.revenue;
                }
            }
        }

        let optimism_warning = adjusted.then(|| {
            "Optimism Bias Detected: Projected growth exceeded 300% YoY and was capped at 50%."
                .to_string()
        });

        Self {
            audited_financials: audited,
            provisional_financials: provisional,
            projected_financials: projected,
            optimism_warning,
            adjusted_projections: adjusted,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), None, Vec::new())
    }

    pub fn audited_financials(&self) -> &[YearData] {
        &self.audited_financials
    }

    pub fn provisional_financials(&self) -> Option<&YearData> {
        self.provisional_financials.as_ref()
    }

    pub fn projected_financials(&self) -> &[YearData] {
        &self.projected_financials
    }

    pub fn optimism_warning(&self) -> Option<&str> {
        self.optimism_warning.as_deref()
    }

    pub fn adjusted_projections(&self) -> bool {
        self.adjusted_projections
    }

    /// The most current, most reliable snapshot: provisional over audited.
    pub fn latest_financials(&self) -> Option<&YearData> {
        self.provisional_financials
            .as_ref()
            .or_else(|| self.audited_financials.last())
    }

    pub fn has_financials(&self) -> bool {
        self.latest_financials().is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
