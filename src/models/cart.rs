use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line in the cart being evaluated.
///
/// The engine only ever reads cart items: quantities, prices, and
/// variants are fixed for the duration of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    /// Absent means the line has no variant; such a line satisfies
    /// all-variants targeting but never a specific-variants set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    /// Always >= 1.
    pub quantity: i32,
    /// Unit price.
    pub price: Decimal,
    /// Per-unit markdown already applied upstream. Carried through for
    /// callers; the discount engine does not consume it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
}

impl CartItem {
    /// Gross line value, the unit a percentage discount base is built
    /// from.
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}
