use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::mpbf::{calculate_mpbf, WorkingCapitalAssessment};
use super::ratios::{
    assess_dscr, assess_leverage, assess_liquidity, DscrStatus, LeverageStatus, LiquidityStatus,
    YearlyDscr,
};
use super::waterfall::{run_waterfall, EligibilityStatus, Scheme, WaterfallStep};
use super::{
    CGTMSE_FEE_PERCENT, CGTMSE_MAX_AMOUNT, CR_ELIGIBLE_THRESHOLD, CR_RESTRICTED_THRESHOLD,
    DSCR_APPROVE_THRESHOLD, MUDRA_MAX_AMOUNT, TOL_TNW_HIGH_RISK,
};
use crate::cma::CmaModel;
use crate::profile::BorrowerProfile;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Borrower figures plotted against the policy benchmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarChartData {
    pub user_cr: Multiple,
    pub benchmark_cr: Multiple,
    pub user_tol_tnw: Multiple,
    pub benchmark_tol_tnw: Multiple,
    pub user_dscr: Multiple,
    pub benchmark_dscr: Multiple,
}

/// Complete credit analysis document, persisted by the caller keyed on the
/// deal id. Immutable once returned; only the override path may later change
/// its status and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditResult {
    pub deal_id: String,
    pub analyzed_at: DateTime<Utc>,

    // Recommendation
    pub eligible_scheme: Scheme,
    pub status: EligibilityStatus,
    /// MPBF ceiling in INR.
    pub max_permissible_limit: Money,
    /// Sanction recommendation: min(MPBF, requested), zero when rejected.
    pub recommended_amount: Money,

    // Core ratios
    pub current_ratio: Multiple,
    pub current_ratio_status: LiquidityStatus,
    pub tol_tnw: Multiple,
    pub leverage_status: LeverageStatus,
    pub avg_dscr: Multiple,
    pub dscr_status: DscrStatus,
    pub yearly_dscr: Vec<YearlyDscr>,

    // Flags and notes accumulated over the run
    pub flags: Vec<String>,
    pub compliance_notes: Vec<String>,
    pub rejection_reasons: Vec<String>,

    // Visualization data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radar_chart_data: Option<RadarChartData>,
    pub working_capital_analysis: WorkingCapitalAssessment,
    pub waterfall_data: Vec<WaterfallStep>,

    // Informational scheme eligibility, independent of the waterfall winner
    pub cgtmse_eligible: bool,
    pub mudra_eligible: bool,
    pub cgss_eligible: bool,

    // Guarantee fee, charged only under CGTMSE
    pub guarantee_fee_percent: Rate,
    pub guarantee_fee_amount: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full deterministic credit analysis for one borrower.
///
/// Never fails: absent financials produce a fully-populated rejection result
/// and arithmetic edge cases resolve to documented sentinels. Each call
/// builds its own flag and trail lists, so concurrent calls share nothing.
pub fn analyze(cma: &CmaModel, profile: &BorrowerProfile) -> ComputationOutput<CreditResult> {
    let start = Instant::now();
    let mut flags: Vec<String> = Vec::new();

    if !cma.has_financials() {
        let reason = "No financial data available for analysis";
        let result = rejection_result(&profile.deal_id, reason);
        return envelope(vec![reason.to_string()], start, result);
    }

    if let Some(warning) = cma.optimism_warning() {
        flags.push(warning.to_string());
    }

    // 1. Core ratios
    let liquidity = assess_liquidity(cma, &mut flags);
    let leverage = assess_leverage(cma, profile, &mut flags);
    let dscr = assess_dscr(cma, &mut flags);

    // 2. Working-capital ceiling
    let working_capital = calculate_mpbf(cma, &mut flags);
    let mpbf = working_capital.eligible_bank_finance;

    // 3. Scheme waterfall
    let outcome = run_waterfall(
        cma,
        profile,
        liquidity.current_ratio,
        leverage.tol_tnw,
        dscr.average,
    );

    // 4. Sanction recommendation: the figures cap the ask, a rejection zeroes it.
    let eligible_amount = mpbf.min(profile.loan_amount_requested);
    let recommended = if outcome.status == EligibilityStatus::Rejected {
        Money::ZERO
    } else {
        eligible_amount
    };

    // 5. Visualization data
    let radar = RadarChartData {
        user_cr: liquidity.current_ratio,
        benchmark_cr: CR_ELIGIBLE_THRESHOLD,
        user_tol_tnw: leverage.tol_tnw,
        benchmark_tol_tnw: TOL_TNW_HIGH_RISK,
        user_dscr: dscr.average,
        benchmark_dscr: DSCR_APPROVE_THRESHOLD,
    };

    // 6. Informational scheme eligibility, shown regardless of the winner
    let cgtmse_eligible = profile.loan_amount_requested <= CGTMSE_MAX_AMOUNT
        && !profile.has_collateral
        && liquidity.current_ratio >= CR_RESTRICTED_THRESHOLD;
    let mudra_eligible = profile.loan_amount_requested <= MUDRA_MAX_AMOUNT;
    let cgss_eligible =
        profile.dpiit_recognized && profile.loan_amount_requested > CGTMSE_MAX_AMOUNT;

    let (guarantee_fee_percent, guarantee_fee_amount) = if outcome.scheme == Scheme::Cgtmse {
        (CGTMSE_FEE_PERCENT * dec!(100), recommended * CGTMSE_FEE_PERCENT)
    } else {
        (Rate::ZERO, Money::ZERO)
    };

    let result = CreditResult {
        deal_id: profile.deal_id.clone(),
        analyzed_at: Utc::now(),
        eligible_scheme: outcome.scheme,
        status: outcome.status,
        max_permissible_limit: mpbf,
        recommended_amount: recommended,
        current_ratio: liquidity.current_ratio,
        current_ratio_status: liquidity.status,
        tol_tnw: leverage.tol_tnw,
        leverage_status: leverage.status,
        avg_dscr: dscr.average,
        dscr_status: dscr.status,
        yearly_dscr: dscr.yearly,
        flags: flags.clone(),
        compliance_notes: Vec::new(),
        rejection_reasons: outcome.rejection_reasons,
        radar_chart_data: Some(radar),
        working_capital_analysis: working_capital,
        waterfall_data: outcome.steps,
        cgtmse_eligible,
        mudra_eligible,
        cgss_eligible,
        guarantee_fee_percent,
        guarantee_fee_amount,
    };

    envelope(flags, start, result)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn envelope(
    warnings: Vec<String>,
    start: Instant,
    result: CreditResult,
) -> ComputationOutput<CreditResult> {
    let assumptions = serde_json::json!({
        "dscr_denominator": "interest expense only (floored at 1), no principal schedule",
        "mpbf_rounding": "floor to nearest 1000",
        "projection_growth_cap": "50% YoY when growth exceeds 300%",
    });
    with_metadata(
        "Deterministic credit underwriting (RBI working-capital norms + scheme waterfall)",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    )
}

/// Rejection result for deals with no usable financial data.
fn rejection_result(deal_id: &str, reason: &str) -> CreditResult {
    CreditResult {
        deal_id: deal_id.to_string(),
        analyzed_at: Utc::now(),
        eligible_scheme: Scheme::Advisory,
        status: EligibilityStatus::Rejected,
        max_permissible_limit: Money::ZERO,
        recommended_amount: Money::ZERO,
        current_ratio: Multiple::ZERO,
        current_ratio_status: LiquidityStatus::NoData,
        tol_tnw: Multiple::ZERO,
        leverage_status: LeverageStatus::NoData,
        avg_dscr: Multiple::ZERO,
        dscr_status: DscrStatus::NoData,
        yearly_dscr: Vec::new(),
        flags: vec![reason.to_string()],
        compliance_notes: Vec::new(),
        rejection_reasons: vec![reason.to_string()],
        radar_chart_data: None,
        working_capital_analysis: WorkingCapitalAssessment::unavailable(
            "No financial data available for MPBF calculation",
        ),
        waterfall_data: Vec::new(),
        cgtmse_eligible: false,
        mudra_eligible: false,
        cgss_eligible: false,
        guarantee_fee_percent: Rate::ZERO,
        guarantee_fee_amount: Money::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
