//! Cart lines and the rules for mutating them.
//!
//! A [`Cart`] keeps at most one [`CartLine`] per product code and never holds
//! a line with zero quantity. Both invariants are enforced by every mutation
//! and re-established when a cart is decoded from JSON.

use serde::{Deserialize, Serialize, Serializer};

use super::{Price, Product, ProductCode};

/// One product in the cart and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog code; unique within a cart.
    pub code: ProductCode,
    /// Product name at the time it was added.
    pub name: String,
    /// Unit price at the time it was added.
    pub price: Price,
    /// Image path or `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Units in the cart, always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }

    /// The product descriptor this line was created from.
    ///
    /// Lets a view re-add one more unit of a line it is displaying.
    #[must_use]
    pub fn to_product(&self) -> Product {
        Product {
            code: self.code.clone(),
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
            description: None,
            rating: 0.0,
            reviews: 0,
        }
    }

    fn from_product(product: &Product) -> Self {
        Self {
            code: product.code.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
        }
    }
}

/// Ordered cart contents.
///
/// Serialized as a plain JSON array of lines. Decoding drops zero-quantity
/// lines and merges duplicate codes into the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<CartLine>")]
pub struct Cart(Vec<CartLine>);

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a cart from arbitrary lines, restoring the cart invariants.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart: Vec<CartLine> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            if let Some(existing) = cart.iter_mut().find(|l| l.code == line.code) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                cart.push(line);
            }
        }
        Self(cart)
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the product's code, or appends a new
    /// line with quantity 1.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(&product.code) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.0.push(CartLine::from_product(product));
        }
    }

    /// Remove `quantity` units of `code`.
    ///
    /// The line is deleted once its quantity would reach zero. Returns
    /// `false` (and leaves the cart untouched) when no line has that code or
    /// `quantity` is zero.
    pub fn remove(&mut self, code: &ProductCode, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let Some(pos) = self.0.iter().position(|l| &l.code == code) else {
            return false;
        };
        let remaining = self
            .0
            .get(pos)
            .map_or(0, |line| line.quantity.saturating_sub(quantity));
        if remaining == 0 {
            self.0.remove(pos);
        } else if let Some(line) = self.0.get_mut(pos) {
            line.quantity = remaining;
        }
        true
    }

    /// Empty the cart. Returns `false` if it was already empty.
    pub fn clear(&mut self) -> bool {
        let had_lines = !self.0.is_empty();
        self.0.clear();
        had_lines
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.0
    }

    /// The line for `code`, if any.
    #[must_use]
    pub fn line(&self, code: &ProductCode) -> Option<&CartLine> {
        self.0.iter().find(|l| &l.code == code)
    }

    fn line_mut(&mut self, code: &ProductCode) -> Option<&mut CartLine> {
        self.0.iter_mut().find(|l| &l.code == code)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.0.iter().fold(0, |n, l| n.saturating_add(l.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.0.iter().map(CartLine::line_total).sum()
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self::from_lines(lines)
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
