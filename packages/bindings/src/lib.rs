use std::sync::Mutex;

use napi::Result as NapiResult;
use napi_derive::napi;
use once_cell::sync::Lazy;

use credit_engine_core::cma::parse_cma;
use credit_engine_core::compliance::{
    apply_override, audit_trail, DecisionStore, MemoryStore, OverrideRequest,
};
use credit_engine_core::profile::BorrowerProfile;
use credit_engine_core::underwriting::decision::analyze;
use credit_engine_core::underwriting::mpbf::working_capital_limit;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Decision store shared across calls from the host process. The Node layer
/// persists results durably; this cell only backs the override round-trip.
static STORE: Lazy<Mutex<MemoryStore>> = Lazy::new(|| Mutex::new(MemoryStore::new()));

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[napi]
pub fn parse_cma_payload(payload_json: String) -> NapiResult<String> {
    let raw: serde_json::Value = serde_json::from_str(&payload_json).map_err(to_napi_error)?;
    let model = parse_cma(&raw);
    serde_json::to_string(&model).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn run_credit_analysis(payload_json: String, profile_json: String) -> NapiResult<String> {
    let raw: serde_json::Value = serde_json::from_str(&payload_json).map_err(to_napi_error)?;
    let profile: BorrowerProfile = serde_json::from_str(&profile_json).map_err(to_napi_error)?;

    let model = parse_cma(&raw);
    let output = analyze(&model, &profile);

    let mut store = STORE
        .lock()
        .map_err(|_| napi::Error::from_reason("decision store poisoned"))?;
    store
        .save_result(&profile.deal_id, &output.result)
        .map_err(to_napi_error)?;

    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn working_capital_ceiling(payload_json: String) -> NapiResult<String> {
    let raw: serde_json::Value = serde_json::from_str(&payload_json).map_err(to_napi_error)?;
    let model = parse_cma(&raw);
    let output = working_capital_limit(&model);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Override & audit
// ---------------------------------------------------------------------------

#[napi]
pub fn apply_decision_override(request_json: String) -> NapiResult<String> {
    let request: OverrideRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let mut store = STORE
        .lock()
        .map_err(|_| napi::Error::from_reason("decision store poisoned"))?;
    let outcome = apply_override(&mut *store, &request).map_err(to_napi_error)?;
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

#[napi]
pub fn deal_audit_trail(deal_id: String) -> NapiResult<String> {
    let store = STORE
        .lock()
        .map_err(|_| napi::Error::from_reason("decision store poisoned"))?;
    let trail = audit_trail(&*store, &deal_id).map_err(to_napi_error)?;
    serde_json::to_string(&trail).map_err(to_napi_error)
}
