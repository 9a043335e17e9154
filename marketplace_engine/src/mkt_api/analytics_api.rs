use std::{collections::HashMap, fmt::Debug};

use chrono::{NaiveDate, Utc};
use log::*;

use crate::{
    db::traits::{CatalogManagement, OrderManagement, OrderQueryFilter},
    db_types::{User, UserId},
    mkt_api::analytics_objects::{BuyerAnalytics, SupplierAnalytics},
};

/// Read-only dashboards over historical orders.
///
/// Reports never fail. If any data cannot be read, the problem is logged and an empty report is returned instead.
pub struct AnalyticsApi<B> {
    db: B,
}

impl<B> Debug for AnalyticsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnalyticsApi")
    }
}

impl<B> AnalyticsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AnalyticsApi<B>
where B: OrderManagement + CatalogManagement
{
    pub async fn supplier_report(&self, supplier_id: UserId) -> SupplierAnalytics {
        self.supplier_report_at(supplier_id, Utc::now().date_naive()).await
    }

    /// The supplier report as it would look on `today`, which anchors the monthly series.
    pub async fn supplier_report_at(&self, supplier_id: UserId, today: NaiveDate) -> SupplierAnalytics {
        match self.try_supplier_report(supplier_id, today).await {
            Ok(report) => report,
            Err(e) => {
                error!("📊️ Could not generate supplier analytics for {supplier_id}. {e}");
                SupplierAnalytics::default()
            },
        }
    }

    pub async fn buyer_report(&self, buyer_id: UserId) -> BuyerAnalytics {
        self.buyer_report_at(buyer_id, Utc::now().date_naive()).await
    }

    pub async fn buyer_report_at(&self, buyer_id: UserId, today: NaiveDate) -> BuyerAnalytics {
        match self.try_buyer_report(buyer_id, today).await {
            Ok(report) => report,
            Err(e) => {
                error!("📊️ Could not generate buyer analytics for {buyer_id}. {e}");
                BuyerAnalytics::default()
            },
        }
    }

    async fn try_supplier_report(&self, supplier_id: UserId, today: NaiveDate) -> Result<SupplierAnalytics, String> {
        let query = OrderQueryFilter::default().with_supplier_id(supplier_id);
        let orders = self.db.fetch_orders(query).await.map_err(|e| e.to_string())?;
        let products = self.db.fetch_products_for_supplier(supplier_id).await.map_err(|e| e.to_string())?;
        trace!("📊️ Supplier report for {supplier_id} covers {} orders and {} products", orders.len(), products.len());
        Ok(SupplierAnalytics::compute(&orders, &products, today))
    }

    async fn try_buyer_report(&self, buyer_id: UserId, today: NaiveDate) -> Result<BuyerAnalytics, String> {
        let query = OrderQueryFilter::default().with_buyer_id(buyer_id);
        let orders = self.db.fetch_orders(query).await.map_err(|e| e.to_string())?;
        let mut suppliers: HashMap<UserId, User> = HashMap::new();
        for order in &orders {
            if suppliers.contains_key(&order.supplier_id) {
                continue;
            }
            if let Some(user) = self.db.fetch_user(order.supplier_id).await.map_err(|e| e.to_string())? {
                suppliers.insert(user.id, user);
            }
        }
        trace!("📊️ Buyer report for {buyer_id} covers {} orders from {} suppliers", orders.len(), suppliers.len());
        Ok(BuyerAnalytics::compute(&orders, &suppliers, today))
    }
}
