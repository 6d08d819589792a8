pub mod decision;
pub mod mpbf;
pub mod ratios;
pub mod waterfall;

pub use decision::{analyze, CreditResult, RadarChartData};
pub use mpbf::{calculate_mpbf, working_capital_limit, WorkingCapitalAssessment};
pub use ratios::{assess_dscr, assess_leverage, assess_liquidity};
pub use waterfall::{run_waterfall, EligibilityStatus, Scheme, WaterfallOutcome, WaterfallStep};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Policy benchmark constants. Thresholds mirror standard SME lending
// covenants and RBI working-capital guidance.

/// Current ratio floor for standard (non-government) eligibility.
pub const CR_ELIGIBLE_THRESHOLD: Decimal = dec!(1.33);
/// Below this the borrower is ineligible outright.
pub const CR_RESTRICTED_THRESHOLD: Decimal = dec!(1.0);

/// Leverage above this is a high debt burden.
pub const TOL_TNW_HIGH_RISK: Decimal = dec!(3.0);
/// Leverage above this is a hard-reject signal.
pub const TOL_TNW_CRITICAL: Decimal = dec!(4.0);
/// Relaxed critical leverage for DPIIT-recognized startups (venture debt
/// norms).
pub const TOL_TNW_CRITICAL_DPIIT: Decimal = dec!(4.5);

/// Average DSCR at or above this approves a term loan.
pub const DSCR_APPROVE_THRESHOLD: Decimal = dec!(1.25);
/// Average DSCR below this rejects a term loan.
pub const DSCR_REJECT_THRESHOLD: Decimal = dec!(1.15);

/// ₹5 crore projected turnover: the cutoff between the turnover method and
/// the asset-based MPBF method.
pub const TURNOVER_METHOD_THRESHOLD: Decimal = dec!(50_000_000);
/// Gross working-capital need as a share of projected turnover.
pub const TURNOVER_GROSS_WC_PERCENT: Decimal = dec!(0.25);
/// Promoter contribution as a share of projected turnover.
pub const TURNOVER_PROMOTER_MARGIN: Decimal = dec!(0.05);
/// Margin on total current assets under the asset-based method.
pub const ASSET_MARGIN_PERCENT: Decimal = dec!(0.25);

/// ₹10 lakh Mudra ceiling.
pub const MUDRA_MAX_AMOUNT: Decimal = dec!(1_000_000);
/// ₹2 crore CGTMSE ceiling.
pub const CGTMSE_MAX_AMOUNT: Decimal = dec!(20_000_000);
/// CGTMSE annual guarantee fee (0.85%).
pub const CGTMSE_FEE_PERCENT: Decimal = dec!(0.0085);
