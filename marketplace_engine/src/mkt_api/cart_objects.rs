use serde::{Deserialize, Serialize};

use crate::db_types::{CartItem, Money, UserId};

/// A snapshot of a user's cart, with the derived totals shown at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new(user_id: UserId, items: Vec<CartItem>) -> Self {
        Self { user_id, items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of rows (distinct products), as opposed to [`Self::total_quantity`].
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn total_price(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Splits the rows by supplier. Suppliers appear in the order their first product was added, and rows keep their
    /// relative order within each group.
    pub fn group_by_supplier(&self) -> Vec<(UserId, Vec<CartItem>)> {
        let mut groups: Vec<(UserId, Vec<CartItem>)> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|(supplier, _)| *supplier == item.supplier_id) {
                Some((_, rows)) => rows.push(item.clone()),
                None => groups.push((item.supplier_id, vec![item.clone()])),
            }
        }
        groups
    }
}
