//! SKU normalization and mapping
//!
//! Order lines arrive with variant-tagged SKUs ("80524-44"). Everything
//! downstream joins and groups on the canonical form, so normalization
//! happens in exactly one place: [`canonical_sku`]. Mapping rules rewrite a
//! canonical SKU into zero or more (SKU, quantity) pairs, handling bundle
//! expansion, placeholder items and deprecated SKUs.

use std::collections::HashMap;

/// Strip the order-line variant suffix from a raw SKU.
///
/// `"80524-44"` becomes `"80524"`. Applied before every lookup, grouping or
/// join; ingestion and analysis must agree on this form or per-SKU rows
/// silently fragment.
pub fn canonical_sku(raw: &str) -> String {
    raw.split('-').next().unwrap_or(raw).trim().to_string()
}

/// How a canonical SKU resolves during aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingRule {
    /// Expand into several SKUs, each receiving the full input quantity
    Bundle(Vec<String>),

    /// Drop the line entirely (placeholder or non-physical items)
    Ignore,

    /// Replace the SKU, quantity unchanged
    Single(String),

    /// Replace with several SKUs, each quantity = multiplier x input
    Weighted(Vec<(String, i64)>),
}

/// Resolves order-line SKUs into canonical (SKU, quantity) pairs.
///
/// SKUs without a rule pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct SkuMapper {
    rules: HashMap<String, MappingRule>,
}

impl SkuMapper {
    /// Empty mapper: every SKU resolves to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Production rule set: the 8000 bundle, its placeholder SKUs and the
    /// deprecated SKUs folded into their successors.
    pub fn with_default_rules() -> Self {
        let mut mapper = Self::new();

        mapper.insert(
            "8000",
            MappingRule::Bundle(vec!["80534".to_string(), "80536".to_string()]),
        );

        for sku in ["8001", "8002", "8003", "8004"] {
            mapper.insert(sku, MappingRule::Ignore);
        }

        mapper.insert("80524", MappingRule::Single("80534".to_string()));
        mapper.insert("80523", MappingRule::Single("80536".to_string()));

        mapper
    }

    /// Register a rule; the key is normalized before insertion.
    pub fn insert(&mut self, sku: &str, rule: MappingRule) {
        self.rules.insert(canonical_sku(sku), rule);
    }

    /// Rewrite one order line into zero or more canonical (SKU, quantity)
    /// pairs. Bundle targets each receive the full quantity, not a split.
    pub fn resolve(&self, sku: &str, quantity: i64) -> Vec<(String, i64)> {
        let sku = canonical_sku(sku);

        match self.rules.get(&sku) {
            Some(MappingRule::Bundle(targets)) => targets
                .iter()
                .map(|target| (target.clone(), quantity))
                .collect(),
            Some(MappingRule::Ignore) => Vec::new(),
            Some(MappingRule::Single(target)) => vec![(target.clone(), quantity)],
            Some(MappingRule::Weighted(targets)) => targets
                .iter()
                .map(|(target, multiplier)| (target.clone(), multiplier * quantity))
                .collect(),
            None => vec![(sku, quantity)],
        }
    }
}

/// Display names for canonical SKUs, shown next to summary rows
#[derive(Debug, Clone, Default)]
pub struct SkuCatalog {
    names: HashMap<String, String>,
}

impl SkuCatalog {
    /// Build the catalog, normalizing the keys.
    pub fn new(names: HashMap<String, String>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|(sku, name)| (canonical_sku(&sku), name))
                .collect(),
        }
    }

    /// Display name for a SKU, if one is configured.
    pub fn name(&self, sku: &str) -> Option<&str> {
        self.names.get(&canonical_sku(sku)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_sku_strips_variant_suffix() {
        assert_eq!(canonical_sku("80524-44"), "80524");
        assert_eq!(canonical_sku("80524"), "80524");
        assert_eq!(canonical_sku("80524-44-2"), "80524");
    }

    #[test]
    fn test_bundle_keeps_full_quantity_per_target() {
        let mapper = SkuMapper::with_default_rules();
        let resolved = mapper.resolve("8000", 3);
        assert_eq!(
            resolved,
            vec![("80534".to_string(), 3), ("80536".to_string(), 3)]
        );
    }

    #[test]
    fn test_ignored_skus_resolve_to_nothing() {
        let mapper = SkuMapper::with_default_rules();
        for sku in ["8001", "8002", "8003", "8004"] {
            assert!(mapper.resolve(sku, 5).is_empty());
        }
    }

    #[test]
    fn test_single_target_passes_quantity_through() {
        let mapper = SkuMapper::with_default_rules();
        assert_eq!(mapper.resolve("80524-44", 2), vec![("80534".to_string(), 2)]);
    }

    #[test]
    fn test_weighted_targets_multiply_quantity() {
        let mut mapper = SkuMapper::new();
        mapper.insert(
            "9000",
            MappingRule::Weighted(vec![("X".to_string(), 2), ("Y".to_string(), 1)]),
        );
        assert_eq!(
            mapper.resolve("9000", 4),
            vec![("X".to_string(), 8), ("Y".to_string(), 4)]
        );
    }

    #[test]
    fn test_unmapped_sku_is_identity() {
        let mapper = SkuMapper::with_default_rules();
        assert_eq!(mapper.resolve("12345", 7), vec![("12345".to_string(), 7)]);
    }

    #[test]
    fn test_catalog_normalizes_lookups() {
        let mut names = HashMap::new();
        names.insert("80534".to_string(), "Olive Oil 500ml".to_string());
        let catalog = SkuCatalog::new(names);
        assert_eq!(catalog.name("80534-12"), Some("Olive Oil 500ml"));
        assert_eq!(catalog.name("99999"), None);
    }
}
