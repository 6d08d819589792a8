use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{
    CR_ELIGIBLE_THRESHOLD, CR_RESTRICTED_THRESHOLD, DSCR_APPROVE_THRESHOLD,
    DSCR_REJECT_THRESHOLD, TOL_TNW_CRITICAL, TOL_TNW_CRITICAL_DPIIT, TOL_TNW_HIGH_RISK,
};
use crate::cma::{CmaModel, TrustTier, YearData};
use crate::profile::BorrowerProfile;
use crate::types::Multiple;

/// Sentinel leverage reported when tangible net worth is zero.
const LEVERAGE_SENTINEL: Decimal = dec!(99.9);

// ---------------------------------------------------------------------------
// Status types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityStatus {
    Eligible,
    Restricted,
    Ineligible,
    #[serde(rename = "No Data")]
    NoData,
}

impl std::fmt::Display for LiquidityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Eligible => "Eligible",
            Self::Restricted => "Restricted",
            Self::Ineligible => "Ineligible",
            Self::NoData => "No Data",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeverageStatus {
    Safe,
    #[serde(rename = "High Risk")]
    HighRisk,
    Critical,
    #[serde(rename = "No Data")]
    NoData,
}

impl std::fmt::Display for LeverageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Safe => "Safe",
            Self::HighRisk => "High Risk",
            Self::Critical => "Critical",
            Self::NoData => "No Data",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DscrStatus {
    Approved,
    Conditional,
    Rejected,
    #[serde(rename = "No Data")]
    NoData,
}

impl std::fmt::Display for DscrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Approved => "Approved",
            Self::Conditional => "Conditional",
            Self::Rejected => "Rejected",
            Self::NoData => "No Data",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityAssessment {
    pub current_ratio: Multiple,
    pub status: LiquidityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageAssessment {
    pub tol_tnw: Multiple,
    pub status: LeverageStatus,
}

/// DSCR for one year of the repayment window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyDscr {
    pub year: String,
    pub tier: TrustTier,
    pub dscr: Multiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrAssessment {
    pub yearly: Vec<YearlyDscr>,
    pub average: Multiple,
    pub status: DscrStatus,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Current Ratio = current assets / current liabilities of the latest year.
///
/// Below 1.0 the borrower is ineligible outright; between 1.0 and 1.33 only
/// government-backed schemes remain open. Zero current liabilities resolve
/// to the (0.0, Ineligible) sentinel rather than dividing.
pub fn assess_liquidity(cma: &CmaModel, flags: &mut Vec<String>) -> LiquidityAssessment {
    let latest = match cma.latest_financials() {
        Some(year) if !year.current_liabilities.is_zero() => year,
        _ => {
            return LiquidityAssessment {
                current_ratio: Decimal::ZERO,
                status: LiquidityStatus::Ineligible,
            }
        }
    };

    let cr = (latest.current_assets / latest.current_liabilities).round_dp(2);

    let status = if cr < CR_RESTRICTED_THRESHOLD {
        flags.push(format!(
            "Critical: Current Ratio ({cr}) below 1.0 - High liquidity risk"
        ));
        LiquidityStatus::Ineligible
    } else if cr < CR_ELIGIBLE_THRESHOLD {
        flags.push(format!(
            "Warning: Current Ratio ({cr}) below 1.33 - Eligible only for government schemes"
        ));
        LiquidityStatus::Restricted
    } else {
        LiquidityStatus::Eligible
    };

    LiquidityAssessment {
        current_ratio: cr,
        status,
    }
}

/// TOL/TNW = total outside liabilities / tangible net worth of the latest
/// year.
///
/// The critical threshold is 4.0x, relaxed to 4.5x for DPIIT-recognized
/// startups. Zero TNW resolves to the (99.9, Critical) sentinel.
pub fn assess_leverage(
    cma: &CmaModel,
    profile: &BorrowerProfile,
    flags: &mut Vec<String>,
) -> LeverageAssessment {
    let latest = match cma.latest_financials() {
        Some(year) if !year.tangible_net_worth.is_zero() => year,
        _ => {
            return LeverageAssessment {
                tol_tnw: LEVERAGE_SENTINEL,
                status: LeverageStatus::Critical,
            }
        }
    };

    let ratio = (latest.total_outside_liabilities() / latest.tangible_net_worth).round_dp(2);

    let critical_threshold = if profile.dpiit_recognized {
        TOL_TNW_CRITICAL_DPIIT
    } else {
        TOL_TNW_CRITICAL
    };
    if profile.dpiit_recognized && ratio > critical_threshold {
        flags.push(format!(
            "Info: Leverage ({ratio}x) evaluated against relaxed startup threshold (4.5x)"
        ));
    }

    let status = if ratio > critical_threshold {
        flags.push(format!(
            "Critical: Leverage ({ratio}x) exceeds limit ({critical_threshold}) - Hard reject"
        ));
        LeverageStatus::Critical
    } else if ratio > TOL_TNW_HIGH_RISK {
        flags.push(format!(
            "Warning: Leverage ({ratio}x) exceeds 3.0 - High debt burden"
        ));
        LeverageStatus::HighRisk
    } else {
        LeverageStatus::Safe
    };

    LeverageAssessment {
        tol_tnw: ratio,
        status,
    }
}

/// Per-year DSCR over the projection window, else the last two audited
/// years.
///
/// DSCR = (PAT + depreciation + interest) / interest, with the denominator
/// floored at 1 when no interest is recorded. Principal repayment schedules
/// are not modelled; the 1.15/1.25 rule thresholds are calibrated against
/// this interest-only definition.
pub fn assess_dscr(cma: &CmaModel, flags: &mut Vec<String>) -> DscrAssessment {
    let window: Vec<&YearData> = if cma.projected_financials().is_empty() {
        let audited = cma.audited_financials();
        audited[audited.len().saturating_sub(2)..].iter().collect()
    } else {
        cma.projected_financials().iter().collect()
    };

    if window.is_empty() {
        return DscrAssessment {
            yearly: Vec::new(),
            average: Decimal::ZERO,
            status: DscrStatus::NoData,
        };
    }

    let yearly: Vec<YearlyDscr> = window
        .iter()
        .map(|year| YearlyDscr {
            year: year.year.clone(),
            tier: year.tier,
            dscr: single_year_dscr(year),
        })
        .collect();

    let total: Decimal = yearly.iter().map(|entry| entry.dscr).sum();
    let average = (total / Decimal::from(yearly.len() as u64)).round_dp(2);

    let status = if average < DSCR_REJECT_THRESHOLD {
        flags.push(format!(
            "Critical: Average DSCR ({average}) below 1.15 - Cannot service debt"
        ));
        DscrStatus::Rejected
    } else if average < DSCR_APPROVE_THRESHOLD {
        flags.push(format!(
            "Warning: Average DSCR ({average}) below 1.25 - Marginal repayment capacity"
        ));
        DscrStatus::Conditional
    } else {
        DscrStatus::Approved
    };

    DscrAssessment {
        yearly,
        average,
        status,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn single_year_dscr(year: &YearData) -> Multiple {
    let cash_available = year.cash_accrual() + year.interest_expense;
    let debt_obligation = if year.interest_expense > Decimal::ZERO {
        year.interest_expense
    } else {
        Decimal::ONE
    };
    (cash_available / debt_obligation).round_dp(2)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cma::TrustTier;

    fn year(label: &str, tier: TrustTier) -> YearData {
        YearData {
            year: label.to_string(),
            tier,
            revenue: Decimal::ZERO,
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

    fn model_with_latest(latest: YearData) -> CmaModel {
        CmaModel::new(vec![latest], None, Vec::new())
    }

    fn profile() -> BorrowerProfile {
        BorrowerProfile {
            deal_id: "deal-1".to_string(),
            ..BorrowerProfile::default()
        }
    }

    #[test]
    fn test_current_ratio_bands() {
        let cases = [
            (dec!(900), dec!(1000), LiquidityStatus::Ineligible),
            (dec!(1200), dec!(1000), LiquidityStatus::Restricted),
            (dec!(1330), dec!(1000), LiquidityStatus::Eligible),
            (dec!(2000), dec!(1000), LiquidityStatus::Eligible),
        ];
        for (assets, liabilities, expected) in cases {
            let mut flags = Vec::new();
            let model = model_with_latest(YearData {
                current_assets: assets,
                current_liabilities: liabilities,
                ..year("FY23", TrustTier::Audited)
            });
            let assessment = assess_liquidity(&model, &mut flags);
            assert_eq!(assessment.status, expected, "CA={assets} CL={liabilities}");
        }
    }

    #[test]
    fn test_current_ratio_zero_liabilities_sentinel() {
        let mut flags = Vec::new();
        let model = model_with_latest(YearData {
            current_assets: dec!(1000),
            ..year("FY23", TrustTier::Audited)
        });
        let assessment = assess_liquidity(&model, &mut flags);
        assert_eq!(assessment.current_ratio, Decimal::ZERO);
        assert_eq!(assessment.status, LiquidityStatus::Ineligible);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_leverage_bands_and_flags() {
        let mut flags = Vec::new();
        let model = model_with_latest(YearData {
            long_term_debt: dec!(1_200_000),
            short_term_debt: dec!(800_000),
            current_liabilities: dec!(2_200_000),
            tangible_net_worth: dec!(1_000_000),
            ..year("FY23", TrustTier::Audited)
        });
        let assessment = assess_leverage(&model, &profile(), &mut flags);
        // TOL = 4.2M over TNW 1M
        assert_eq!(assessment.tol_tnw, dec!(4.2));
        assert_eq!(assessment.status, LeverageStatus::Critical);
        assert!(flags.iter().any(|f| f.contains("Hard reject")));
    }

    #[test]
    fn test_leverage_dpiit_relaxation() {
        let model = model_with_latest(YearData {
            long_term_debt: dec!(1_200_000),
            short_term_debt: dec!(800_000),
            current_liabilities: dec!(2_200_000),
            tangible_net_worth: dec!(1_000_000),
            ..year("FY23", TrustTier::Audited)
        });

        let mut flags = Vec::new();
        let dpiit_profile = BorrowerProfile {
            dpiit_recognized: true,
            ..profile()
        };
        let assessment = assess_leverage(&model, &dpiit_profile, &mut flags);
        // 4.2x clears the relaxed 4.5x gate but stays above 3.0x.
        assert_eq!(assessment.status, LeverageStatus::HighRisk);
        assert!(flags.iter().any(|f| f.contains("High debt burden")));
    }

    #[test]
    fn test_leverage_zero_tnw_sentinel() {
        let mut flags = Vec::new();
        let model = model_with_latest(YearData {
            long_term_debt: dec!(500),
            ..year("FY23", TrustTier::Audited)
        });
        let assessment = assess_leverage(&model, &profile(), &mut flags);
        assert_eq!(assessment.tol_tnw, dec!(99.9));
        assert_eq!(assessment.status, LeverageStatus::Critical);
    }

    #[test]
    fn test_dscr_over_projection_window() {
        let audited = vec![year("FY23", TrustTier::Audited)];
        let projected = vec![
            YearData {
                pat: dec!(500_000),
                depreciation: dec!(100_000),
                interest_expense: dec!(200_000),
                ..year("FY24P", TrustTier::Projected)
            },
            YearData {
                pat: dec!(300_000),
                depreciation: dec!(100_000),
                interest_expense: dec!(200_000),
                ..year("FY25P", TrustTier::Projected)
            },
        ];
        let model = CmaModel::new(audited, None, projected);
        let mut flags = Vec::new();
        let assessment = assess_dscr(&model, &mut flags);
        // (500k+100k+200k)/200k = 4.0 and (300k+100k+200k)/200k = 3.0
        assert_eq!(assessment.yearly[0].dscr, dec!(4));
        assert_eq!(assessment.yearly[1].dscr, dec!(3));
        assert_eq!(assessment.average, dec!(3.5));
        assert_eq!(assessment.status, DscrStatus::Approved);
    }

    #[test]
    fn test_dscr_falls_back_to_last_two_audited() {
        let audited = vec![
            year("FY21", TrustTier::Audited),
            YearData {
                pat: dec!(100),
                interest_expense: dec!(100),
                ..year("FY22", TrustTier::Audited)
            },
            YearData {
                pat: dec!(200),
                interest_expense: dec!(100),
                ..year("FY23", TrustTier::Audited)
            },
        ];
        let model = CmaModel::new(audited, None, Vec::new());
        let mut flags = Vec::new();
        let assessment = assess_dscr(&model, &mut flags);
        assert_eq!(assessment.yearly.len(), 2);
        assert_eq!(assessment.yearly[0].year, "FY22");
        assert_eq!(assessment.yearly[1].year, "FY23");
    }

    #[test]
    fn test_dscr_interest_floor() {
        let projected = vec![YearData {
            pat: dec!(150),
            depreciation: dec!(50),
            ..year("FY24P", TrustTier::Projected)
        }];
        let model = CmaModel::new(Vec::new(), None, projected);
        let mut flags = Vec::new();
        let assessment = assess_dscr(&model, &mut flags);
        // No interest recorded: denominator floors at 1.
        assert_eq!(assessment.yearly[0].dscr, dec!(200));
    }

    #[test]
    fn test_dscr_no_data() {
        let mut flags = Vec::new();
        let assessment = assess_dscr(&CmaModel::empty(), &mut flags);
        assert!(assessment.yearly.is_empty());
        assert_eq!(assessment.average, Decimal::ZERO);
        assert_eq!(assessment.status, DscrStatus::NoData);
    }

    #[test]
    fn test_dscr_classification_bands() {
        for (pat, expected) in [
            (dec!(10), DscrStatus::Rejected),     // DSCR 1.1
            (dec!(20), DscrStatus::Conditional),  // DSCR 1.2
            (dec!(30), DscrStatus::Approved),     // DSCR 1.3
        ] {
            let projected = vec![YearData {
                pat,
                interest_expense: dec!(100),
                ..year("FY24P", TrustTier::Projected)
            }];
            let model = CmaModel::new(Vec::new(), None, projected);
            let mut flags = Vec::new();
            let assessment = assess_dscr(&model, &mut flags);
            assert_eq!(assessment.status, expected, "pat={pat}");
        }
    }

    #[test]
    fn test_ratios_are_idempotent() {
        let model = model_with_latest(YearData {
            current_assets: dec!(5_000_000),
            current_liabilities: dec!(2_200_000),
            long_term_debt: dec!(1_200_000),
            short_term_debt: dec!(800_000),
            tangible_net_worth: dec!(1_000_000),
            ..year("FY23", TrustTier::Audited)
        });
        let mut first_flags = Vec::new();
        let mut second_flags = Vec::new();
        let first = assess_liquidity(&model, &mut first_flags);
        let second = assess_liquidity(&model, &mut second_flags);
        assert_eq!(first, second);
        assert_eq!(first_flags, second_flags);

        let first = assess_leverage(&model, &profile(), &mut first_flags);
        let second = assess_leverage(&model, &profile(), &mut second_flags);
        assert_eq!(first, second);
    }
}
