pub mod exceptions;
pub mod store;

pub use exceptions::{
    apply_override, audit_trail, AuditTrail, OverrideAuditLog, OverrideOutcome, OverrideRequest,
    MIN_JUSTIFICATION_LEN,
};
pub use store::{DecisionStore, MemoryStore};
