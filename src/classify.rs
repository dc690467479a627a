// src/classify.rs
//! Channel categorization from a keyword taxonomy.
//!
//! Classification is a pure, total function of the display name and URL:
//! the first rule whose keyword appears (case-folded) wins, so table order
//! encodes priority. National-broadcast keywords are consulted before the
//! generic regional ones; `other` is the unconditional fallback.
//!
//! The default table ships embedded in the crate; deployments can replace
//! it from TOML via the config's `taxonomy_path`.

use anyhow::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_TAXONOMY: Lazy<Taxonomy> = Lazy::new(|| {
    let raw = include_str!("../taxonomy.json");
    Taxonomy::from_json_str(raw).expect("valid embedded taxonomy")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    NationalBroadcast,
    RegionalBroadcast,
    Sports,
    Movies,
    Kids,
    News,
    International,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NationalBroadcast => "national-broadcast",
            Category::RegionalBroadcast => "regional-broadcast",
            Category::Sports => "sports",
            Category::Movies => "movies",
            Category::Kids => "kids",
            Category::News => "news",
            Category::International => "international",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Ordered keyword table. Rules are matched top-down.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    rules: Vec<TaxonomyRule>,
}

impl Taxonomy {
    fn compile(mut rules: Vec<TaxonomyRule>) -> Self {
        for rule in &mut rules {
            for kw in &mut rule.keywords {
                *kw = kw.to_lowercase();
            }
            rule.keywords.retain(|kw| !kw.is_empty());
        }
        Self { rules }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let rules: Vec<TaxonomyRule> = serde_json::from_str(raw)?;
        Ok(Self::compile(rules))
    }

    /// TOML form used by `taxonomy_path` overrides:
    /// ```toml
    /// [[rules]]
    /// category = "sports"
    /// keywords = ["espn", "体育"]
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct TaxonomyFile {
            rules: Vec<TaxonomyRule>,
        }
        let file: TaxonomyFile = toml::from_str(raw)?;
        Ok(Self::compile(file.rules))
    }

    /// Never fails: anything unmatched is `Other`.
    pub fn classify(&self, display_name: &str, url: &str) -> Category {
        let haystack = format!("{} {}", display_name, url).to_lowercase();
        for rule in &self.rules {
            if rule.keywords.iter().any(|kw| haystack.contains(kw)) {
                return rule.category;
            }
        }
        Category::Other
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        DEFAULT_TAXONOMY.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_total_with_other_fallback() {
        let t = Taxonomy::default();
        assert_eq!(t.classify("", ""), Category::Other);
        assert_eq!(
            t.classify("频道九十九", "http://host/ch99"),
            Category::Other
        );
    }

    #[test]
    fn table_order_encodes_priority() {
        let t = Taxonomy::default();
        // Both a national and a regional keyword present: national wins.
        assert_eq!(
            t.classify("CCTV-1 河南卫视转播", "http://host/x"),
            Category::NationalBroadcast
        );
        // City channel suffix stays regional even though it contains 新闻.
        assert_eq!(
            t.classify("郑州新闻综合", "http://host/zz1"),
            Category::RegionalBroadcast
        );
    }

    #[test]
    fn matching_is_case_folded_and_includes_the_url() {
        let t = Taxonomy::default();
        assert_eq!(t.classify("Channel 5", "http://host/ESPN/live"), Category::Sports);
        assert_eq!(t.classify("CCTV-5", "http://host/5"), Category::NationalBroadcast);
    }

    #[test]
    fn toml_override_replaces_the_table() {
        let t = Taxonomy::from_toml_str(
            r#"
            [[rules]]
            category = "movies"
            keywords = ["HBO"]
            "#,
        )
        .unwrap();
        assert_eq!(t.classify("hbo max", "http://h/x"), Category::Movies);
        // Default-table keywords no longer apply.
        assert_eq!(t.classify("CCTV-1", "http://h/1"), Category::Other);
    }
}
