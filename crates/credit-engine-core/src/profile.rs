use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Legal constitution of the borrowing entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Proprietorship,
    Partnership,
    #[default]
    #[serde(rename = "Pvt Ltd")]
    PrivateLimited,
    #[serde(rename = "LLP")]
    Llp,
}

impl EntityType {
    /// Non-corporate constitutions qualify for micro-enterprise schemes.
    pub fn is_non_corporate(&self) -> bool {
        matches!(self, Self::Proprietorship | Self::Partnership)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Proprietorship => "Proprietorship",
            Self::Partnership => "Partnership",
            Self::PrivateLimited => "Pvt Ltd",
            Self::Llp => "LLP",
        };
        write!(f, "{}", s)
    }
}

/// Borrower context for scheme eligibility. Supplied by the calling layer per
/// analysis request, never derived from the financials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BorrowerProfile {
    pub deal_id: String,
    #[serde(default)]
    pub entity_type: EntityType,
    /// Years since incorporation.
    #[serde(default)]
    pub vintage_years: Decimal,
    /// Requested loan amount in INR.
    #[serde(default)]
    pub loan_amount_requested: Money,
    #[serde(default)]
    pub has_collateral: bool,
    /// DPIIT startup recognition; relaxes the leverage gate and opens CGSS.
    #[serde(default)]
    pub dpiit_recognized: bool,
    #[serde(default)]
    pub industry_sector: String,
    #[serde(default)]
    pub is_profitable_2_years: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_labels_round_trip() {
        for (entity, label) in [
            (EntityType::Proprietorship, "\"Proprietorship\""),
            (EntityType::Partnership, "\"Partnership\""),
            (EntityType::PrivateLimited, "\"Pvt Ltd\""),
            (EntityType::Llp, "\"LLP\""),
        ] {
            assert_eq!(serde_json::to_string(&entity).unwrap(), label);
            let parsed: EntityType = serde_json::from_str(label).unwrap();
            assert_eq!(parsed, entity);
        }
    }

    #[test]
    fn test_non_corporate_split() {
        assert!(EntityType::Proprietorship.is_non_corporate());
        assert!(EntityType::Partnership.is_non_corporate());
        assert!(!EntityType::PrivateLimited.is_non_corporate());
        assert!(!EntityType::Llp.is_non_corporate());
    }

    #[test]
    fn test_profile_defaults_from_sparse_json() {
        let profile: BorrowerProfile =
            serde_json::from_str(r#"{"deal_id": "deal-1"}"#).unwrap();
        assert_eq!(profile.entity_type, EntityType::PrivateLimited);
        assert!(!profile.has_collateral);
        assert!(profile.industry_sector.is_empty());
    }
}
