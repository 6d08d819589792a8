use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{
    ASSET_MARGIN_PERCENT, TURNOVER_GROSS_WC_PERCENT, TURNOVER_METHOD_THRESHOLD,
    TURNOVER_PROMOTER_MARGIN,
};
use crate::cma::{CmaModel, YearData};
use crate::types::{with_metadata, ComputationOutput, Money};

/// Provisional-vs-projected revenue divergence that triggers the
/// conservative turnover adjustment.
const CONSERVATIVE_DIVERGENCE: Decimal = dec!(0.20);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MpbfMethod {
    #[serde(rename = "NAYAK")]
    Turnover,
    #[serde(rename = "TANDON")]
    AssetBased,
    #[serde(rename = "NONE")]
    Unavailable,
}

impl MpbfMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Turnover => "Turnover Method (Nayak Committee)",
            Self::AssetBased => "MPBF Method II (Tandon Committee)",
            Self::Unavailable => "N/A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Primary,
    Warning,
    Danger,
    Success,
}

/// One labelled bar of the working-capital breakdown chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSegment {
    pub label: String,
    pub value: Money,
    pub kind: SegmentKind,
}

/// Intermediate figures of whichever method was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MpbfBreakdown {
    Turnover {
        projected_turnover: Money,
        gross_working_capital_need: Money,
        promoter_contribution: Money,
    },
    AssetBased {
        total_current_assets: Money,
        other_current_liabilities: Money,
        working_capital_gap: Money,
        margin_on_assets: Money,
        surplus_liquidity: bool,
    },
    Unavailable {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingCapitalAssessment {
    pub method: MpbfMethod,
    pub method_used: String,
    /// The finance ceiling, floored to the nearest ₹1,000.
    pub eligible_bank_finance: Money,
    pub breakdown: MpbfBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conservative_adjustment: Option<String>,
    pub chart_data: Vec<ChartSegment>,
}

impl WorkingCapitalAssessment {
    pub fn unavailable(reason: &str) -> Self {
        Self {
            method: MpbfMethod::Unavailable,
            method_used: MpbfMethod::Unavailable.label().to_string(),
            eligible_bank_finance: Money::ZERO,
            breakdown: MpbfBreakdown::Unavailable {
                error: reason.to_string(),
            },
            conservative_adjustment: None,
            chart_data: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the Maximum Permissible Bank Finance ceiling.
///
/// Method selection follows projected annual turnover: below ₹5 crore the
/// turnover method applies (ceiling = 20% of turnover), at or above it the
/// asset-based method applies (working-capital gap less a 25% margin on
/// current assets, floored at zero). The result is always rounded down to
/// the nearest ₹1,000. Missing financials produce a zeroed result with an
/// error marker, never a failure.
pub fn calculate_mpbf(cma: &CmaModel, flags: &mut Vec<String>) -> WorkingCapitalAssessment {
    let Some(latest) = cma.latest_financials() else {
        return WorkingCapitalAssessment::unavailable(
            "No financial data available for MPBF calculation",
        );
    };

    let projected = cma.projected_financials().first();
    let mut turnover = projected.map(|year| year.revenue).unwrap_or(latest.revenue);
    let mut conservative_adjustment = None;

    // When the management estimate and the first projection disagree by more
    // than 20%, take the lower figure.
    if let (Some(provisional), Some(projection)) = (cma.provisional_financials(), projected) {
        if provisional.revenue > Decimal::ZERO && projection.revenue > Decimal::ZERO {
            let divergence =
                ((projection.revenue - provisional.revenue) / provisional.revenue).abs();
            if divergence > CONSERVATIVE_DIVERGENCE {
                turnover = provisional.revenue.min(projection.revenue);
                let note = format!(
                    "Provisional (₹{}Cr) vs Projected (₹{}Cr) differ by {}%. Using lower value.",
                    (provisional.revenue / dec!(10_000_000)).round_dp(2),
                    (projection.revenue / dec!(10_000_000)).round_dp(2),
                    (divergence * dec!(100)).round_dp(1),
                );
                flags.push(format!("Conservative: {note}"));
                conservative_adjustment = Some(note);
            }
        }
    }

    let mut assessment = if turnover < TURNOVER_METHOD_THRESHOLD {
        turnover_method(turnover, flags)
    } else {
        asset_based_method(latest, flags)
    };
    assessment.conservative_adjustment = conservative_adjustment;
    assessment.eligible_bank_finance = round_down_to_thousand(assessment.eligible_bank_finance);
    assessment
}

/// Standalone envelope API for CLI and bindings callers.
pub fn working_capital_limit(cma: &CmaModel) -> ComputationOutput<WorkingCapitalAssessment> {
    let start = Instant::now();
    let mut flags = Vec::new();
    let assessment = calculate_mpbf(cma, &mut flags);

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "method_cutoff_turnover": TURNOVER_METHOD_THRESHOLD.to_string(),
        "rounding": "floor to nearest 1000",
    });

    with_metadata(
        "Maximum Permissible Bank Finance (RBI methods)",
        &assumptions,
        flags,
        elapsed,
        assessment,
    )
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Turnover method for units below the ₹5 crore cutoff: gross need is 25% of
/// projected turnover, the promoter funds 5%, the bank finances the rest.
fn turnover_method(projected_turnover: Money, flags: &mut Vec<String>) -> WorkingCapitalAssessment {
    let gross_need = projected_turnover * TURNOVER_GROSS_WC_PERCENT;
    let promoter_contribution = projected_turnover * TURNOVER_PROMOTER_MARGIN;
    let finance = gross_need - promoter_contribution;

    flags.push(format!(
        "MPBF (Turnover Method - Nayak): ₹{}",
        finance.round_dp(0)
    ));

    WorkingCapitalAssessment {
        method: MpbfMethod::Turnover,
        method_used: MpbfMethod::Turnover.label().to_string(),
        eligible_bank_finance: finance,
        breakdown: MpbfBreakdown::Turnover {
            projected_turnover,
            gross_working_capital_need: gross_need,
            promoter_contribution,
        },
        conservative_adjustment: None,
        chart_data: vec![
            ChartSegment {
                label: "Total Requirement (25%)".to_string(),
                value: gross_need,
                kind: SegmentKind::Primary,
            },
            ChartSegment {
                label: "Less: Promoter Margin (5%)".to_string(),
                value: -promoter_contribution,
                kind: SegmentKind::Warning,
            },
            ChartSegment {
                label: "Bank Finance (20%)".to_string(),
                value: finance,
                kind: SegmentKind::Success,
            },
        ],
    }
}

/// Asset-based method for units at or above the cutoff: bank finance covers
/// the working-capital gap beyond a 25% margin on current assets.
fn asset_based_method(latest: &YearData, flags: &mut Vec<String>) -> WorkingCapitalAssessment {
    let total_current_assets = latest.current_assets;
    // OCL excludes existing short-term bank borrowings.
    let other_current_liabilities =
        (latest.current_liabilities - latest.short_term_debt).max(Decimal::ZERO);
    let working_capital_gap = total_current_assets - other_current_liabilities;
    let margin_on_assets = total_current_assets * ASSET_MARGIN_PERCENT;

    let mut finance = working_capital_gap - margin_on_assets;
    let surplus_liquidity = finance < Decimal::ZERO;
    if surplus_liquidity {
        flags.push(
            "Surplus Liquidity: Working capital gap covered by OCL and margin. No bank finance needed."
                .to_string(),
        );
        finance = Decimal::ZERO;
    } else {
        flags.push(format!(
            "MPBF (Method II - Tandon): ₹{}",
            finance.round_dp(0)
        ));
    }

    WorkingCapitalAssessment {
        method: MpbfMethod::AssetBased,
        method_used: MpbfMethod::AssetBased.label().to_string(),
        eligible_bank_finance: finance,
        breakdown: MpbfBreakdown::AssetBased {
            total_current_assets,
            other_current_liabilities,
            working_capital_gap,
            margin_on_assets,
            surplus_liquidity,
        },
        conservative_adjustment: None,
        chart_data: vec![
            ChartSegment {
                label: "Total Current Assets".to_string(),
                value: total_current_assets,
                kind: SegmentKind::Primary,
            },
            ChartSegment {
                label: "Less: Other Current Liabilities".to_string(),
                value: -other_current_liabilities,
                kind: SegmentKind::Danger,
            },
            ChartSegment {
                label: "Less: Margin (25% of TCA)".to_string(),
                value: -margin_on_assets,
                kind: SegmentKind::Warning,
            },
            ChartSegment {
                label: "Bank Finance (MPBF)".to_string(),
                value: finance,
                kind: SegmentKind::Success,
            },
        ],
    }
}

/// Conservative rounding: always down, never nearest.
fn round_down_to_thousand(value: Money) -> Money {
    (value / dec!(1_000)).floor() * dec!(1_000)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
