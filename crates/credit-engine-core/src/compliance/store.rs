use std::collections::HashMap;

use super::exceptions::OverrideAuditLog;
use crate::underwriting::decision::CreditResult;
use crate::CreditEngineResult;

/// Storage port for decision records and the compliance audit trail.
///
/// The engine performs no I/O of its own; callers inject whichever backend
/// the deployment uses. Audit entries are append-only: implementations must
/// never rewrite or delete them.
pub trait DecisionStore {
    fn load_result(&self, deal_id: &str) -> CreditEngineResult<Option<CreditResult>>;

    fn save_result(&mut self, deal_id: &str, result: &CreditResult) -> CreditEngineResult<()>;

    fn append_audit(&mut self, entry: &OverrideAuditLog) -> CreditEngineResult<()>;

    /// All audit entries for a deal, newest first.
    fn audit_trail(&self, deal_id: &str) -> CreditEngineResult<Vec<OverrideAuditLog>>;
}

/// In-memory store backing unit tests and embedded callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    results: HashMap<String, CreditResult>,
    audit: Vec<OverrideAuditLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionStore for MemoryStore {
    fn load_result(&self, deal_id: &str) -> CreditEngineResult<Option<CreditResult>> {
        Ok(self.results.get(deal_id).cloned())
    }

    fn save_result(&mut self, deal_id: &str, result: &CreditResult) -> CreditEngineResult<()> {
        self.results.insert(deal_id.to_string(), result.clone());
        Ok(())
    }

    fn append_audit(&mut self, entry: &OverrideAuditLog) -> CreditEngineResult<()> {
        self.audit.push(entry.clone());
        Ok(())
    }

    fn audit_trail(&self, deal_id: &str) -> CreditEngineResult<Vec<OverrideAuditLog>> {
        let mut entries: Vec<OverrideAuditLog> = self
            .audit
            .iter()
            .filter(|entry| entry.deal_id == deal_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
