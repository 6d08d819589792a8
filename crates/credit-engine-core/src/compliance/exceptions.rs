use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::DecisionStore;
use crate::error::CreditEngineError;
use crate::underwriting::waterfall::EligibilityStatus;
use crate::CreditEngineResult;

/// Shortest acceptable override justification, in characters.
pub const MIN_JUSTIFICATION_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Request to override an automated credit decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub deal_id: String,
    /// Rule being overridden, e.g. "dscr_check" or "leverage_check".
    pub rule_id: String,
    pub justification: String,
    pub analyst_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// Immutable compliance record of one override action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideAuditLog {
    pub deal_id: String,
    pub rule_id: String,
    pub original_status: EligibilityStatus,
    pub new_status: EligibilityStatus,
    pub justification: String,
    pub analyst_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideOutcome {
    pub deal_id: String,
    pub new_status: EligibilityStatus,
    pub compliance_note: String,
    pub audit_timestamp: DateTime<Utc>,
}

/// A deal's compliance audit history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrail {
    pub deal_id: String,
    pub entries: Vec<OverrideAuditLog>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply a human-in-the-loop override to a stored decision.
///
/// The justification is validated before the store is touched, and the audit
/// entry is appended before the mutated result is written back, so a crash
/// mid-operation can lose the status change but never the audit record. The
/// original ratios and waterfall trail stay as computed; only the terminal
/// status and annotations change, and no thresholds are re-validated: the
/// human override wins, the audit log is the compliance control.
pub fn apply_override(
    store: &mut dyn DecisionStore,
    request: &OverrideRequest,
) -> CreditEngineResult<OverrideOutcome> {
    let justification = request.justification.trim();
    if justification.chars().count() < MIN_JUSTIFICATION_LEN {
        return Err(CreditEngineError::JustificationTooShort {
            length: justification.chars().count(),
            minimum: MIN_JUSTIFICATION_LEN,
        });
    }
    if request.analyst_id.trim().is_empty() {
        return Err(CreditEngineError::InvalidInput {
            field: "analyst_id".to_string(),
            reason: "An analyst identity is required for the audit trail.".to_string(),
        });
    }

    let mut result = store
        .load_result(&request.deal_id)?
        .ok_or_else(|| CreditEngineError::DealNotFound(request.deal_id.clone()))?;

    let entry = OverrideAuditLog {
        deal_id: request.deal_id.clone(),
        rule_id: request.rule_id.clone(),
        original_status: result.status,
        new_status: EligibilityStatus::Conditional,
        justification: justification.to_string(),
        analyst_id: request.analyst_id.clone(),
        timestamp: Utc::now(),
        ip_address: request.ip_address.clone(),
    };
    store.append_audit(&entry)?;

    let compliance_note = format!(
        "Approved via Exception by [{}]: {}",
        request.analyst_id, justification
    );
    result.status = EligibilityStatus::Conditional;
    result.compliance_notes.push(compliance_note.clone());
    result.flags.push(format!("Override applied: {}", request.rule_id));
    store.save_result(&request.deal_id, &result)?;

    Ok(OverrideOutcome {
        deal_id: request.deal_id.clone(),
        new_status: EligibilityStatus::Conditional,
        compliance_note,
        audit_timestamp: entry.timestamp,
    })
}

/// Compliance audit trail for a deal, newest first.
pub fn audit_trail(store: &dyn DecisionStore, deal_id: &str) -> CreditEngineResult<AuditTrail> {
    let entries = store.audit_trail(deal_id)?;
    Ok(AuditTrail {
        deal_id: deal_id.to_string(),
        count: entries.len(),
        entries,
    })
}
