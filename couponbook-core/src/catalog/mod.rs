//! src/catalog/mod.rs
//!
//! Read-only coupon catalog, loaded once per session and indexed by id.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use couponbook_common::models::{CouponDefinition, CouponId};
use crate::Error;

const BUILTIN_CATALOG: &str = include_str!("default_catalog.json");

#[derive(Debug, Clone)]
pub struct CouponCatalog {
    coupons: Vec<CouponDefinition>,
    index: HashMap<CouponId, usize>,
}

/// Coupons sharing a category, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub coupons: Vec<&'a CouponDefinition>,
}

impl CouponCatalog {
    /// Builds a catalog, keeping the given order. Ids must be unique and
    /// every coupon that is not `unlimited` needs a positive `uses`.
    pub fn new(coupons: Vec<CouponDefinition>) -> Result<Self, Error> {
        let mut index = HashMap::with_capacity(coupons.len());
        for (pos, c) in coupons.iter().enumerate() {
            if index.insert(c.id, pos).is_some() {
                return Err(Error::Catalog(format!("duplicate coupon id {}", c.id)));
            }
            if !c.has_valid_limit() {
                return Err(Error::Catalog(format!(
                    "coupon id {} is limited but has no positive 'uses'",
                    c.id
                )));
            }
        }
        Ok(Self { coupons, index })
    }

    /// Parses a JSON array of coupon definitions.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let de = &mut serde_json::Deserializer::from_str(raw);
        let coupons: Vec<CouponDefinition> = serde_path_to_error::deserialize(de)
            .map_err(|e| Error::Catalog(format!("invalid catalog at '{}': {}", e.path(), e.inner())))?;
        Self::new(coupons)
    }

    /// Reads and parses a catalog file. Unlike the ledger, a broken catalog
    /// is an error: there is nothing sensible to fall back to.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let raw = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json_str(&raw)?;
        info!("Loaded {} coupon(s) from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// The catalog bundled with the binary.
    pub fn builtin() -> Result<Self, Error> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn get(&self, id: CouponId) -> Option<&CouponDefinition> {
        self.index.get(&id).map(|&pos| &self.coupons[pos])
    }

    pub fn contains(&self, id: CouponId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CouponDefinition> {
        self.coupons.iter()
    }

    pub fn coupons(&self) -> &[CouponDefinition] {
        &self.coupons
    }

    pub fn with_cooldown(&self) -> impl Iterator<Item = &CouponDefinition> {
        self.coupons.iter().filter(|c| c.cooldown_ms.is_some())
    }

    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// Case-insensitive substring match on title or description. An empty
    /// term matches everything.
    pub fn search(&self, term: &str) -> Vec<&CouponDefinition> {
        let needle = term.trim().to_lowercase();
        let hits: Vec<_> = self
            .coupons
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || c.title.to_lowercase().contains(&needle)
                    || c.description.to_lowercase().contains(&needle)
            })
            .collect();
        debug!("search '{}' matched {} coupon(s)", term, hits.len());
        hits
    }

    /// Distinct categories in first-appearance order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for c in &self.coupons {
            if !seen.contains(&c.category.as_str()) {
                seen.push(c.category.as_str());
            }
        }
        seen
    }
}

/// Groups coupons by category. Groups appear in the order their first
/// coupon does.
pub fn group_by_category<'a, I>(coupons: I) -> Vec<CategoryGroup<'a>>
where
    I: IntoIterator<Item = &'a CouponDefinition>,
{
    let mut groups: Vec<CategoryGroup<'a>> = Vec::new();
    for c in coupons {
        match groups.iter_mut().find(|g| g.category == c.category) {
            Some(g) => g.coupons.push(c),
            None => groups.push(CategoryGroup { category: &c.category, coupons: vec![c] }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: CouponId, title: &str, category: &str) -> CouponDefinition {
        CouponDefinition {
            id,
            title: title.to_string(),
            description: format!("{} description", title),
            category: category.to_string(),
            unlimited: false,
            max_uses: Some(1),
            cooldown_ms: None,
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = CouponCatalog::new(vec![def(1, "a", "x"), def(1, "b", "y")]).unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }

    #[test]
    fn test_limited_coupon_without_uses_rejected() {
        let raw = r#"[
            {"id": 1, "title": "Hug", "description": "d", "category": "Love", "unlimited": true},
            {"id": 2, "title": "Argument", "description": "d", "category": "Love"}
        ]"#;
        match CouponCatalog::from_json_str(raw).unwrap_err() {
            Error::Catalog(msg) => assert!(msg.contains("coupon id 2"), "got: {}", msg),
            other => panic!("unexpected error: {:?}", other),
        }

        let mut zero = def(3, "Zero", "x");
        zero.max_uses = Some(0);
        assert!(matches!(CouponCatalog::new(vec![zero]), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_lookup_by_id() {
        let cat = CouponCatalog::new(vec![def(5, "Five", "x"), def(2, "Two", "y")]).unwrap();
        assert_eq!(cat.get(2).map(|c| c.title.as_str()), Some("Two"));
        assert!(cat.get(3).is_none());
        assert!(cat.contains(5));
    }

    #[test]
    fn test_search_is_case_insensitive_and_checks_description() {
        let cat = CouponCatalog::new(vec![
            def(1, "Breakfast", "Food"),
            def(2, "Massage", "Love"),
        ])
        .unwrap();
        let hits: Vec<_> = cat.search("BREAK").iter().map(|c| c.id).collect();
        assert_eq!(hits, vec![1]);
        let hits: Vec<_> = cat.search("massage desc").iter().map(|c| c.id).collect();
        assert_eq!(hits, vec![2]);
        assert_eq!(cat.search("  ").len(), 2);
        assert!(cat.search("nothing").is_empty());
    }

    #[test]
    fn test_grouping_keeps_first_appearance_order() {
        let cat = CouponCatalog::new(vec![
            def(1, "a", "Food"),
            def(2, "b", "Love"),
            def(3, "c", "Food"),
        ])
        .unwrap();
        let groups = group_by_category(cat.iter());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Food");
        assert_eq!(groups[0].coupons.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(groups[1].category, "Love");
        assert_eq!(cat.categories(), vec!["Food", "Love"]);
    }

    #[test]
    fn test_bad_json_reports_path() {
        let err = CouponCatalog::from_json_str(r#"[{"id": 1, "title": 5}]"#).unwrap_err();
        match err {
            Error::Catalog(msg) => assert!(msg.contains("[0].title"), "got: {}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let cat = CouponCatalog::builtin().unwrap();
        assert!(!cat.is_empty());
        assert!(cat.with_cooldown().count() > 0);
    }
}
