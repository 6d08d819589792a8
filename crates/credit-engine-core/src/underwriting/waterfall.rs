use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{
    CGTMSE_MAX_AMOUNT, CR_RESTRICTED_THRESHOLD, DSCR_APPROVE_THRESHOLD, DSCR_REJECT_THRESHOLD,
    MUDRA_MAX_AMOUNT, TOL_TNW_CRITICAL,
};
use crate::cma::CmaModel;
use crate::profile::BorrowerProfile;
use crate::types::Multiple;

/// Sectors outside CGTMSE cover. Case-insensitive exact match; synonym
/// variance in upstream-extracted sector text is a known gap.
const CGTMSE_EXCLUDED_INDUSTRIES: &[&str] =
    &["agriculture", "retail trade", "educational", "self help groups"];

/// Minimum YoY revenue growth for venture-debt (CGSS) eligibility.
const CGSS_GROWTH_THRESHOLD: Decimal = dec!(0.20);

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// Loan schemes in waterfall priority order, most favourable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    #[serde(rename = "Mudra Yojana")]
    Mudra,
    #[serde(rename = "CGTMSE")]
    Cgtmse,
    #[serde(rename = "CGSS (Startup India)")]
    Cgss,
    #[serde(rename = "Loans for New Entities")]
    NewEntity,
    #[serde(rename = "Business Installment Loan")]
    Bil,
    #[serde(rename = "Advisory Services")]
    Advisory,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Mudra => "Mudra Yojana",
            Self::Cgtmse => "CGTMSE",
            Self::Cgss => "CGSS (Startup India)",
            Self::NewEntity => "Loans for New Entities",
            Self::Bil => "Business Installment Loan",
            Self::Advisory => "Advisory Services",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityStatus {
    Approved,
    Rejected,
    Conditional,
    Referral,
    Ineligible,
}

impl std::fmt::Display for EligibilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Conditional => "Conditional",
            Self::Referral => "Referral",
            Self::Ineligible => "Ineligible",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckResult {
    Pass,
    Fail,
    Referral,
}

/// One recorded decision-trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub step_number: u32,
    pub scheme_name: String,
    pub rule_checked: String,
    pub result: CheckResult,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallOutcome {
    pub scheme: Scheme,
    pub status: EligibilityStatus,
    pub rejection_reasons: Vec<String>,
    pub steps: Vec<WaterfallStep>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the fixed scheme waterfall.
///
/// Every check runs and is recorded, even after a hard rejection, so the
/// trail always shows each scheme's individual verdict. The first passing
/// scheme in priority order (Mudra > CGTMSE > CGSS > New Entity > BIL) wins;
/// a hard rejection from the policy gates forces the advisory outcome
/// regardless of scheme passes.
pub fn run_waterfall(
    cma: &CmaModel,
    profile: &BorrowerProfile,
    current_ratio: Multiple,
    tol_tnw: Multiple,
    avg_dscr: Multiple,
) -> WaterfallOutcome {
    let mut trail = Trail::default();
    let mut rejection_reasons = Vec::new();
    let mut hard_rejection = false;
    let mut winner: Option<Scheme> = None;

    // Gate 1: policy hard rejections
    if tol_tnw <= TOL_TNW_CRITICAL {
        trail.record(
            "Leverage Check",
            "TOL/TNW <= 4.0",
            CheckResult::Pass,
            format!("TOL/TNW = {tol_tnw}"),
        );
    } else {
        trail.record(
            "Leverage Check",
            "TOL/TNW <= 4.0",
            CheckResult::Fail,
            format!("TOL/TNW = {tol_tnw}"),
        );
        rejection_reasons.push(format!(
            "Leverage ratio ({tol_tnw}x) exceeds maximum threshold of 4.0"
        ));
        hard_rejection = true;
    }

    if current_ratio >= CR_RESTRICTED_THRESHOLD {
        trail.record(
            "Liquidity Check",
            "CR >= 1.0",
            CheckResult::Pass,
            format!("CR = {current_ratio}"),
        );
    } else {
        trail.record(
            "Liquidity Check",
            "CR >= 1.0",
            CheckResult::Fail,
            format!("CR = {current_ratio}"),
        );
        rejection_reasons.push(format!(
            "Current Ratio ({current_ratio}) below minimum threshold of 1.0"
        ));
        hard_rejection = true;
    }

    // Gate 2: repayment signal (recorded, never a hard rejection by itself)
    let dscr_result = if avg_dscr >= DSCR_REJECT_THRESHOLD {
        CheckResult::Pass
    } else {
        CheckResult::Fail
    };
    trail.record(
        "DSCR Check",
        "DSCR >= 1.15",
        dscr_result,
        format!("DSCR = {avg_dscr}"),
    );

    // Gate 3: scheme filters, priority order

    // Mudra: micro loans for non-corporate entities.
    if profile.loan_amount_requested <= MUDRA_MAX_AMOUNT {
        if profile.entity_type.is_non_corporate() {
            trail.record(
                "Mudra Yojana",
                "Request <= ₹10L + Non-Corporate",
                CheckResult::Pass,
                "Eligible for Mudra",
            );
            claim(&mut winner, hard_rejection, Scheme::Mudra);
        } else {
            trail.record(
                "Mudra Yojana",
                "Non-Corporate Check",
                CheckResult::Fail,
                format!("Entity: {}", profile.entity_type),
            );
        }
    } else {
        trail.record(
            "Mudra Yojana",
            "Request <= ₹10L",
            CheckResult::Fail,
            format!("Request: ₹{}", profile.loan_amount_requested.round_dp(0)),
        );
    }

    // CGTMSE: collateral-free guarantee cover.
    if profile.loan_amount_requested <= CGTMSE_MAX_AMOUNT && !profile.has_collateral {
        if is_cgtmse_excluded(&profile.industry_sector) {
            trail.record(
                "CGTMSE",
                "Industry check",
                CheckResult::Fail,
                format!("Industry: {}", profile.industry_sector),
            );
        } else {
            trail.record(
                "CGTMSE",
                "Request <= ₹2Cr + No Collateral",
                CheckResult::Pass,
                "Eligible for CGTMSE",
            );
            claim(&mut winner, hard_rejection, Scheme::Cgtmse);
        }
    } else {
        let reason = if profile.has_collateral {
            "Has Collateral".to_string()
        } else {
            format!("Request: ₹{}", profile.loan_amount_requested.round_dp(0))
        };
        trail.record(
            "CGTMSE",
            "Request <= ₹2Cr + No Collateral",
            CheckResult::Fail,
            reason,
        );
    }

    // CGSS: venture debt for DPIIT startups on a growth trajectory.
    if !profile.dpiit_recognized {
        trail.record(
            "CGSS (Startup India)",
            "DPIIT Recognized",
            CheckResult::Fail,
            "Not DPIIT registered",
        );
    } else if cma.projected_financials().is_empty() {
        trail.record(
            "CGSS (Startup India)",
            "Projections",
            CheckResult::Fail,
            "No projected financials",
        );
    } else {
        match cma.latest_financials() {
            Some(latest) if latest.revenue > Decimal::ZERO => {
                let projection = &cma.projected_financials()[0];
                let growth = (projection.revenue - latest.revenue) / latest.revenue;
                if growth > CGSS_GROWTH_THRESHOLD {
                    trail.record(
                        "CGSS (Startup India)",
                        "DPIIT + Growth > 20%",
                        CheckResult::Pass,
                        "Venture Debt Eligible",
                    );
                    claim(&mut winner, hard_rejection, Scheme::Cgss);
                } else {
                    trail.record(
                        "CGSS (Startup India)",
                        "Growth > 20%",
                        CheckResult::Fail,
                        format!("Growth = {}%", (growth * dec!(100)).round_dp(1)),
                    );
                }
            }
            _ => trail.record(
                "CGSS (Startup India)",
                "Revenue Data",
                CheckResult::Fail,
                "No revenue data",
            ),
        }
    }

    // New Entity: bridge loans for young, collateralized borrowers.
    if profile.vintage_years >= dec!(1)
        && profile.vintage_years <= dec!(3)
        && profile.has_collateral
    {
        trail.record(
            "New Entity Loan",
            "Vintage 1-3 years + Collateral",
            CheckResult::Pass,
            "Bridge Loan Eligible",
        );
        claim(&mut winner, hard_rejection, Scheme::NewEntity);
    } else {
        trail.record(
            "New Entity Loan",
            "Vintage 1-3 years + Collateral",
            CheckResult::Fail,
            format!(
                "Vintage: {}y, Collateral: {}",
                profile.vintage_years, profile.has_collateral
            ),
        );
    }

    // BIL: the standard product for established, profitable businesses.
    if profile.vintage_years > dec!(3) && profile.is_profitable_2_years {
        if avg_dscr >= DSCR_APPROVE_THRESHOLD {
            trail.record(
                "Business Installment Loan",
                "Vintage > 3y + Profitable + DSCR >= 1.25",
                CheckResult::Pass,
                "BIL Eligible",
            );
            claim(&mut winner, hard_rejection, Scheme::Bil);
        } else {
            trail.record(
                "Business Installment Loan",
                "DSCR >= 1.25",
                CheckResult::Fail,
                format!("DSCR = {avg_dscr}"),
            );
        }
    } else {
        trail.record(
            "Business Installment Loan",
            "Vintage > 3y + Profitable",
            CheckResult::Fail,
            format!(
                "Vintage: {}y, Profitable 2Y: {}",
                profile.vintage_years, profile.is_profitable_2_years
            ),
        );
    }

    // Gate 4: final verdict
    if hard_rejection {
        trail.record(
            "Final Verdict",
            "Hard rejection check",
            CheckResult::Fail,
            "Does not meet basic eligibility criteria",
        );
        return WaterfallOutcome {
            scheme: Scheme::Advisory,
            status: EligibilityStatus::Rejected,
            rejection_reasons,
            steps: trail.steps,
        };
    }

    if let Some(scheme) = winner {
        trail.record(
            "Final Verdict",
            "Scheme matched",
            CheckResult::Pass,
            format!("Eligible for {scheme}"),
        );
        return WaterfallOutcome {
            scheme,
            status: EligibilityStatus::Approved,
            rejection_reasons: Vec::new(),
            steps: trail.steps,
        };
    }

    trail.record(
        "Final Verdict",
        "No scheme matched",
        CheckResult::Referral,
        "Advisory services recommended",
    );
    rejection_reasons.push("No standard lending scheme matched the applicant's profile".to_string());
    rejection_reasons
        .push("Recommended: open a current account to build the banking relationship".to_string());

    WaterfallOutcome {
        scheme: Scheme::Advisory,
        status: EligibilityStatus::Referral,
        rejection_reasons,
        steps: trail.steps,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Trail {
    steps: Vec<WaterfallStep>,
}

impl Trail {
    fn record(
        &mut self,
        scheme_name: &str,
        rule_checked: &str,
        result: CheckResult,
        reason: impl Into<String>,
    ) {
        let step_number = self.steps.len() as u32 + 1;
        self.steps.push(WaterfallStep {
            step_number,
            scheme_name: scheme_name.to_string(),
            rule_checked: rule_checked.to_string(),
            result,
            reason: reason.into(),
        });
    }
}

/// A scheme wins only if no hard rejection occurred and nothing higher in
/// priority order has claimed the decision already.
fn claim(winner: &mut Option<Scheme>, hard_rejection: bool, scheme: Scheme) {
    if !hard_rejection && winner.is_none() {
        *winner = Some(scheme);
    }
}

fn is_cgtmse_excluded(sector: &str) -> bool {
    let normalized = sector.trim().to_lowercase();
    CGTMSE_EXCLUDED_INDUSTRIES.contains(&normalized.as_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cma::{TrustTier, YearData};
    use crate::profile::EntityType;

    fn year(label: &str, tier: TrustTier, revenue: Decimal) -> YearData {
        YearData {
            year: label.to_string(),
            tier,
            revenue,
            pat: Decimal::ZERO,
            depreciation: Decimal::ZERO,
            interest_expense: Decimal::ZERO,
            current_assets: Decimal::ZERO,
            fixed_assets: Decimal::ZERO,
            current_liabilities: Decimal::ZERO,
            long_term_debt: Decimal::ZERO,
            short_term_debt: Decimal::ZERO,
            tangible_net_worth: Decimal::ZERO,
        }
    }

    fn simple_model() -> CmaModel {
        CmaModel::new(
            vec![year("FY23", TrustTier::Audited, dec!(2_000_000))],
            None,
            Vec::new(),
        )
    }

    fn proprietor_profile() -> BorrowerProfile {
        BorrowerProfile {
            deal_id: "deal-1".to_string(),
            entity_type: EntityType::Proprietorship,
            vintage_years: dec!(5),
            loan_amount_requested: dec!(800_000),
            industry_sector: "manufacturing".to_string(),
            ..BorrowerProfile::default()
        }
    }

    #[test]
    fn test_every_check_is_recorded() {
        let outcome = run_waterfall(
            &simple_model(),
            &proprietor_profile(),
            dec!(1.5),
            dec!(2.0),
            dec!(1.5),
        );
        assert_eq!(outcome.steps.len(), 9);
        for (idx, step) in outcome.steps.iter().enumerate() {
            assert_eq!(step.step_number, idx as u32 + 1);
        }
    }

    #[test]
    fn test_hard_rejection_still_runs_every_check() {
        let outcome = run_waterfall(
            &simple_model(),
            &proprietor_profile(),
            dec!(0.8),
            dec!(5.0),
            dec!(1.5),
        );
        assert_eq!(outcome.steps.len(), 9);
        assert_eq!(outcome.scheme, Scheme::Advisory);
        assert_eq!(outcome.status, EligibilityStatus::Rejected);
        assert_eq!(outcome.rejection_reasons.len(), 2);
        // Mudra itself still shows as a pass in the trail.
        let mudra = outcome
            .steps
            .iter()
            .find(|s| s.scheme_name == "Mudra Yojana")
            .unwrap();
        assert_eq!(mudra.result, CheckResult::Pass);
    }

    #[test]
    fn test_first_match_wins_priority_order() {
        // Proprietorship asking under 10L with no collateral passes both
        // Mudra and CGTMSE; Mudra is higher priority.
        let outcome = run_waterfall(
            &simple_model(),
            &proprietor_profile(),
            dec!(1.5),
            dec!(2.0),
            dec!(1.5),
        );
        assert_eq!(outcome.scheme, Scheme::Mudra);
        assert_eq!(outcome.status, EligibilityStatus::Approved);
        assert!(outcome.rejection_reasons.is_empty());
    }

    #[test]
    fn test_mudra_excludes_corporate_entities() {
        let profile = BorrowerProfile {
            entity_type: EntityType::PrivateLimited,
            ..proprietor_profile()
        };
        let outcome = run_waterfall(&simple_model(), &profile, dec!(1.5), dec!(2.0), dec!(1.5));
        assert_ne!(outcome.scheme, Scheme::Mudra);
        // Falls through to CGTMSE instead.
        assert_eq!(outcome.scheme, Scheme::Cgtmse);
    }

    #[test]
    fn test_cgtmse_industry_exclusion_exact_match() {
        let profile = BorrowerProfile {
            entity_type: EntityType::PrivateLimited,
            industry_sector: "Retail Trade".to_string(),
            ..proprietor_profile()
        };
        let outcome = run_waterfall(&simple_model(), &profile, dec!(1.5), dec!(2.0), dec!(1.5));
        let cgtmse = outcome
            .steps
            .iter()
            .find(|s| s.scheme_name == "CGTMSE")
            .unwrap();
        assert_eq!(cgtmse.result, CheckResult::Fail);

        // A variant phrasing is not excluded (documented fragility).
        let profile = BorrowerProfile {
            entity_type: EntityType::PrivateLimited,
            industry_sector: "retail trading".to_string(),
            ..proprietor_profile()
        };
        let outcome = run_waterfall(&simple_model(), &profile, dec!(1.5), dec!(2.0), dec!(1.5));
        assert_eq!(outcome.scheme, Scheme::Cgtmse);
    }

    #[test]
    fn test_cgss_requires_growth_above_twenty_percent() {
        let model = CmaModel::new(
            vec![year("FY23", TrustTier::Audited, dec!(10_000_000))],
            None,
            vec![year("FY24P", TrustTier::Projected, dec!(13_000_000))],
        );
        let profile = BorrowerProfile {
            entity_type: EntityType::PrivateLimited,
            dpiit_recognized: true,
            has_collateral: true,
            vintage_years: dec!(0.5),
            loan_amount_requested: dec!(30_000_000),
            ..proprietor_profile()
        };
        let outcome = run_waterfall(&model, &profile, dec!(1.5), dec!(2.0), dec!(1.5));
        // 30% growth clears the bar; everything else fails.
        assert_eq!(outcome.scheme, Scheme::Cgss);

        let flat_model = CmaModel::new(
            vec![year("FY23", TrustTier::Audited, dec!(10_000_000))],
            None,
            vec![year("FY24P", TrustTier::Projected, dec!(11_000_000))],
        );
        let outcome = run_waterfall(&flat_model, &profile, dec!(1.5), dec!(2.0), dec!(1.5));
        assert_eq!(outcome.status, EligibilityStatus::Referral);
    }

    #[test]
    fn test_new_entity_and_bil_gates() {
        // Young entity with collateral
        let profile = BorrowerProfile {
            entity_type: EntityType::PrivateLimited,
            vintage_years: dec!(2),
            has_collateral: true,
            loan_amount_requested: dec!(5_000_000),
            ..proprietor_profile()
        };
        let outcome = run_waterfall(&simple_model(), &profile, dec!(1.5), dec!(2.0), dec!(1.5));
        assert_eq!(outcome.scheme, Scheme::NewEntity);

        // Established, profitable, strong DSCR
        let profile = BorrowerProfile {
            entity_type: EntityType::PrivateLimited,
            vintage_years: dec!(6),
            has_collateral: true,
            is_profitable_2_years: true,
            loan_amount_requested: dec!(5_000_000),
            ..proprietor_profile()
        };
        let outcome = run_waterfall(&simple_model(), &profile, dec!(1.5), dec!(2.0), dec!(1.4));
        assert_eq!(outcome.scheme, Scheme::Bil);

        // Same but weak DSCR
        let outcome = run_waterfall(&simple_model(), &profile, dec!(1.5), dec!(2.0), dec!(1.2));
        assert_eq!(outcome.status, EligibilityStatus::Referral);
    }

    #[test]
    fn test_referral_fallback_reasons() {
        let profile = BorrowerProfile {
            entity_type: EntityType::PrivateLimited,
            vintage_years: dec!(0.5),
            has_collateral: true,
            loan_amount_requested: dec!(50_000_000),
            ..proprietor_profile()
        };
        let outcome = run_waterfall(&simple_model(), &profile, dec!(1.5), dec!(2.0), dec!(1.5));
        assert_eq!(outcome.scheme, Scheme::Advisory);
        assert_eq!(outcome.status, EligibilityStatus::Referral);
        assert_eq!(outcome.rejection_reasons.len(), 2);
        assert_eq!(
            outcome.steps.last().unwrap().result,
            CheckResult::Referral
        );
    }
}
