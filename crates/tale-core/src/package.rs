//! # Package Tiers
//!
//! Subscription packages sold through the payment gateway.
//! The table is fixed at startup: built-in defaults, or `config/packages.toml`.
//!
//! A tier's `nominal` is the single source for both the amount charged at
//! transaction creation and the amount matched when a payment notification
//! arrives, so the two paths cannot drift apart.

use crate::error::{GateError, GateResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named subscription package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageTier {
    /// Tier name (e.g., "supporter")
    pub name: String,
    /// Price in whole currency units (IDR has no minor unit in practice)
    pub nominal: i64,
    /// How long the entitlement lasts
    pub duration_days: u32,
    /// Daily generation quota granted while the entitlement is active
    pub quota_per_day: u32,
}

impl PackageTier {
    pub fn new(
        name: impl Into<String>,
        nominal: i64,
        duration_days: u32,
        quota_per_day: u32,
    ) -> Self {
        Self {
            name: name.into(),
            nominal,
            duration_days,
            quota_per_day,
        }
    }

    /// Entitlement length in seconds
    pub fn duration_secs(&self) -> i64 {
        i64::from(self.duration_days) * 86_400
    }
}

/// Tier lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCatalog {
    pub packages: Vec<PackageTier>,
}

impl PackageCatalog {
    /// Build a catalog, rejecting tables that could resolve ambiguously
    pub fn new(packages: Vec<PackageTier>) -> GateResult<Self> {
        let catalog = Self { packages };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The three tiers the service ships with
    pub fn builtin() -> Self {
        Self {
            packages: vec![
                PackageTier::new("supporter", 5_000, 1, 10),
                PackageTier::new("subscriber", 15_000, 7, 25),
                PackageTier::new("premium", 45_000, 30, 50),
            ],
        }
    }

    /// Parse and validate a TOML table of `[[packages]]`
    pub fn from_toml_str(content: &str) -> GateResult<Self> {
        let catalog: PackageCatalog = toml::from_str(content)
            .map_err(|e| GateError::Configuration(format!("Invalid package table: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check names and nominal values are unique and every tier grants something
    pub fn validate(&self) -> GateResult<()> {
        if self.packages.is_empty() {
            return Err(GateError::Configuration(
                "Package table is empty".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut nominals = HashSet::new();

        for tier in &self.packages {
            if tier.name.is_empty() {
                return Err(GateError::Configuration(
                    "Package tier with empty name".to_string(),
                ));
            }
            if tier.nominal <= 0 || tier.duration_days == 0 || tier.quota_per_day == 0 {
                return Err(GateError::Configuration(format!(
                    "Package '{}' must have positive nominal, duration and quota",
                    tier.name
                )));
            }
            if !names.insert(tier.name.as_str()) {
                return Err(GateError::Configuration(format!(
                    "Duplicate package name: {}",
                    tier.name
                )));
            }
            if !nominals.insert(tier.nominal) {
                return Err(GateError::Configuration(format!(
                    "Duplicate package nominal {} ({})",
                    tier.nominal, tier.name
                )));
            }
        }

        Ok(())
    }

    /// Look up a tier by name
    pub fn get(&self, name: &str) -> Option<&PackageTier> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Look up the tier whose nominal equals `amount`
    pub fn find_by_amount(&self, amount: i64) -> Option<&PackageTier> {
        self.packages.iter().find(|p| p.nominal == amount)
    }

    /// Tier names, in table order
    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tiers_are_valid_and_distinct() {
        let catalog = PackageCatalog::builtin();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.len(), 3);

        for tier in &catalog.packages {
            let matches = catalog
                .packages
                .iter()
                .filter(|p| p.nominal == tier.nominal)
                .count();
            assert_eq!(matches, 1, "{} shares its nominal", tier.name);
        }
    }

    #[test]
    fn test_find_by_amount() {
        let catalog = PackageCatalog::builtin();

        assert_eq!(catalog.find_by_amount(5_000).unwrap().name, "supporter");
        assert_eq!(catalog.find_by_amount(15_000).unwrap().name, "subscriber");
        assert_eq!(catalog.find_by_amount(45_000).unwrap().name, "premium");
        assert!(catalog.find_by_amount(9_999).is_none());
    }

    #[test]
    fn test_get_by_name() {
        let catalog = PackageCatalog::builtin();
        let supporter = catalog.get("supporter").unwrap();

        assert_eq!(supporter.nominal, 5_000);
        assert_eq!(supporter.duration_secs(), 86_400);
        assert!(catalog.get("platinum").is_none());
    }

    #[test]
    fn test_duplicate_nominal_rejected() {
        let result = PackageCatalog::new(vec![
            PackageTier::new("a", 5_000, 1, 10),
            PackageTier::new("b", 5_000, 7, 20),
        ]);
        assert!(matches!(result, Err(GateError::Configuration(_))));
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
            [[packages]]
            name = "supporter"
            nominal = 5000
            duration_days = 1
            quota_per_day = 10

            [[packages]]
            name = "premium"
            nominal = 45000
            duration_days = 30
            quota_per_day = 50
        "#;

        let catalog = PackageCatalog::from_toml_str(content).unwrap();
        assert_eq!(catalog.names(), vec!["supporter", "premium"]);
    }

    #[test]
    fn test_from_toml_rejects_zero_quota() {
        let content = r#"
            [[packages]]
            name = "free"
            nominal = 1
            duration_days = 1
            quota_per_day = 0
        "#;

        assert!(PackageCatalog::from_toml_str(content).is_err());
    }
}
