use serde_json::Value;

use super::scalar;

/// Fields worth a one-line summary, in display order.
const SUMMARY_KEYS: &[&str] = &[
    "eligible_scheme",
    "status",
    "max_permissible_limit",
    "recommended_amount",
    "eligible_bank_finance",
    "current_ratio",
    "tol_tnw",
    "avg_dscr",
];

/// One line: the decision and its headline figures.
pub fn print_minimal(value: &Value) {
    let body = value.get("result").unwrap_or(value);

    let mut parts = Vec::new();
    for key in SUMMARY_KEYS {
        if let Some(val) = body.get(*key) {
            parts.push(format!("{}={}", key, scalar(val)));
        }
    }

    if parts.is_empty() {
        println!("{}", body);
    } else {
        println!("{}", parts.join(" "));
    }
}
