use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::cart::CartItem;

/// Restricts a rule to a product, and optionally to a subset of its
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariantTarget {
    pub product_id: String,
    #[serde(flatten)]
    pub selection: VariantSelection,
}

/// Which variants of the targeted product the rule covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant_mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariantSelection {
    /// Every variant of the product qualifies, including lines with no
    /// variant at all.
    AllVariants,
    /// Only lines carrying one of these variant ids qualify.
    SpecificVariants { variant_ids: HashSet<String> },
}

impl ProductVariantTarget {
    pub fn all_variants(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            selection: VariantSelection::AllVariants,
        }
    }

    pub fn specific_variants<I, S>(product_id: impl Into<String>, variant_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            product_id: product_id.into(),
            selection: VariantSelection::SpecificVariants {
                variant_ids: variant_ids.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Whether this target covers the given cart line.
    pub fn matches(&self, item: &CartItem) -> bool {
        if item.product_id != self.product_id {
            return false;
        }
        match &self.selection {
            VariantSelection::AllVariants => true,
            VariantSelection::SpecificVariants { variant_ids } => item
                .variant_id
                .as_ref()
                .is_some_and(|v| variant_ids.contains(v)),
        }
    }
}
