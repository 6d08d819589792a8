use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_engine_core::cma::{amount, parse_cma, CmaModel};
use credit_engine_core::profile::{BorrowerProfile, EntityType};
use credit_engine_core::underwriting::decision::analyze;
use credit_engine_core::underwriting::mpbf::working_capital_limit;
use credit_engine_core::underwriting::ratios::{assess_dscr, assess_leverage, assess_liquidity};

use crate::input;

type CliResult = Result<Value, Box<dyn std::error::Error>>;

/// Arguments for the full credit analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the raw CMA extraction payload (JSON or YAML; or pipe stdin)
    #[arg(long)]
    pub cma: Option<String>,

    /// Path to a borrower profile file (overrides the individual flags)
    #[arg(long)]
    pub profile: Option<String>,

    /// Deal identifier
    #[arg(long, default_value = "adhoc")]
    pub deal_id: String,

    /// Entity type: Proprietorship, Partnership, "Pvt Ltd", or LLP
    #[arg(long)]
    pub entity_type: Option<String>,

    /// Years since incorporation
    #[arg(long)]
    pub vintage_years: Option<Decimal>,

    /// Requested loan amount (plain INR or suffixed, e.g. "50 lakhs")
    #[arg(long)]
    pub loan_amount: Option<String>,

    /// Borrower has offered collateral
    #[arg(long)]
    pub has_collateral: bool,

    /// DPIIT-recognized startup
    #[arg(long)]
    pub dpiit: bool,

    /// Industry sector
    #[arg(long)]
    pub industry_sector: Option<String>,

    /// Profitable in each of the last two years
    #[arg(long)]
    pub profitable_2_years: bool,
}

/// Arguments for the standalone ratio run
#[derive(Args)]
pub struct RatiosArgs {
    /// Path to the raw CMA extraction payload (JSON or YAML; or pipe stdin)
    #[arg(long)]
    pub cma: Option<String>,

    /// Evaluate leverage against the relaxed DPIIT startup threshold
    #[arg(long)]
    pub dpiit: bool,
}

/// Arguments for the standalone MPBF run
#[derive(Args)]
pub struct MpbfArgs {
    /// Path to the raw CMA extraction payload (JSON or YAML; or pipe stdin)
    #[arg(long)]
    pub cma: Option<String>,
}

/// Arguments for payload normalization
#[derive(Args)]
pub struct ParseArgs {
    /// Path to the raw CMA extraction payload (JSON or YAML; or pipe stdin)
    #[arg(long)]
    pub cma: Option<String>,
}

// ---------------------------------------------------------------------------
// Command runners
// ---------------------------------------------------------------------------

pub fn run_analyze(args: AnalyzeArgs) -> CliResult {
    let cma = load_cma(&args.cma)?;
    let profile = resolve_profile(&args)?;
    let output = analyze(&cma, &profile);
    Ok(serde_json::to_value(&output)?)
}

pub fn run_ratios(args: RatiosArgs) -> CliResult {
    let cma = load_cma(&args.cma)?;
    let profile = BorrowerProfile {
        deal_id: "adhoc".to_string(),
        dpiit_recognized: args.dpiit,
        ..BorrowerProfile::default()
    };

    let mut flags = Vec::new();
    let liquidity = assess_liquidity(&cma, &mut flags);
    let leverage = assess_leverage(&cma, &profile, &mut flags);
    let dscr = assess_dscr(&cma, &mut flags);

    Ok(serde_json::json!({
        "liquidity": liquidity,
        "leverage": leverage,
        "dscr": dscr,
        "flags": flags,
    }))
}

pub fn run_mpbf(args: MpbfArgs) -> CliResult {
    let cma = load_cma(&args.cma)?;
    let output = working_capital_limit(&cma);
    Ok(serde_json::to_value(&output)?)
}

pub fn run_parse(args: ParseArgs) -> CliResult {
    let cma = load_cma(&args.cma)?;
    Ok(serde_json::to_value(&cma)?)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn load_cma(path: &Option<String>) -> Result<CmaModel, Box<dyn std::error::Error>> {
    let raw: Value = if let Some(path) = path {
        input::file::read_document(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--cma is required (or pipe the payload on stdin)".into());
    };
    Ok(parse_cma(&raw))
}

fn resolve_profile(args: &AnalyzeArgs) -> Result<BorrowerProfile, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.profile {
        let value = input::file::read_document(path)?;
        let profile: BorrowerProfile = serde_json::from_value(value)
            .map_err(|e| format!("Invalid borrower profile in '{}': {}", path, e))?;
        return Ok(profile);
    }

    let entity_type = match args.entity_type.as_deref() {
        Some(raw) => parse_entity_type(raw)?,
        None => EntityType::default(),
    };

    Ok(BorrowerProfile {
        deal_id: args.deal_id.clone(),
        entity_type,
        vintage_years: args.vintage_years.unwrap_or_default(),
        loan_amount_requested: args
            .loan_amount
            .as_deref()
            .map(amount::parse_amount)
            .unwrap_or_default(),
        has_collateral: args.has_collateral,
        dpiit_recognized: args.dpiit,
        industry_sector: args.industry_sector.clone().unwrap_or_default(),
        is_profitable_2_years: args.profitable_2_years,
    })
}

fn parse_entity_type(raw: &str) -> Result<EntityType, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(raw.to_string())).map_err(|_| {
        format!(
            "Unknown entity type '{raw}' (expected Proprietorship, Partnership, Pvt Ltd, or LLP)"
        )
        .into()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_args() -> AnalyzeArgs {
        AnalyzeArgs {
            cma: None,
            profile: None,
            deal_id: "deal-cli".to_string(),
            entity_type: Some("Proprietorship".to_string()),
            vintage_years: Some(dec!(4)),
            loan_amount: Some("8 lakhs".to_string()),
            has_collateral: false,
            dpiit: false,
            industry_sector: Some("manufacturing".to_string()),
            profitable_2_years: true,
        }
    }

    #[test]
    fn test_profile_from_flags() {
        let profile = resolve_profile(&base_args()).unwrap();
        assert_eq!(profile.deal_id, "deal-cli");
        assert_eq!(profile.entity_type, EntityType::Proprietorship);
        assert_eq!(profile.loan_amount_requested, dec!(800_000));
        assert!(profile.is_profitable_2_years);
    }

    #[test]
    fn test_unknown_entity_type_rejected() {
        let mut args = base_args();
        args.entity_type = Some("Trust".to_string());
        let err = resolve_profile(&args).unwrap_err();
        assert!(err.to_string().contains("Unknown entity type"));
    }
}
