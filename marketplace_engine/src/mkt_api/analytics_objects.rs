//! Report types for the analytics dashboards, and the pure functions that compute them.
//!
//! Nothing in here touches the database. The functions take the orders (and products or users) they report on, plus
//! the reference date, so that results are fully determined by their inputs.
use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderStatusType, Product, ProductId, User, UserId};

pub const TRAILING_MONTHS: usize = 12;
pub const TOP_PRODUCT_LIMIT: usize = 5;
pub const FAVOURITE_SUPPLIER_LIMIT: usize = 5;
pub const RECENT_ORDER_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// e.g. "Mar 2024"
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub amount: Money,
    pub order_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatusType,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    /// The number of orders that contain the product, regardless of quantity.
    pub sales_count: usize,
    /// The sum of the totals of the orders that contain the product.
    pub revenue: Money,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRanking {
    pub supplier_id: UserId,
    pub name: String,
    pub order_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierAnalytics {
    pub total_orders: usize,
    pub total_revenue: Money,
    pub total_customers: usize,
    pub average_rating: f64,
    pub status_distribution: Vec<StatusCount>,
    pub monthly_revenue: Vec<MonthlyTotal>,
    pub revenue_growth_percent: i64,
    pub order_growth_percent: i64,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<Order>,
}

impl SupplierAnalytics {
    /// Builds the supplier dashboard from all of the supplier's orders and products.
    pub fn compute(orders: &[Order], products: &[Product], today: NaiveDate) -> Self {
        let monthly_revenue = monthly_totals(orders, today);
        let (revenue_growth_percent, order_growth_percent) = match monthly_revenue.as_slice() {
            [.., previous, current] => (
                growth_percent(current.amount.value(), previous.amount.value()),
                growth_percent(Decimal::from(current.order_count), Decimal::from(previous.order_count)),
            ),
            _ => (0, 0),
        };
        Self {
            total_orders: orders.len(),
            total_revenue: orders.iter().map(|o| o.total).sum(),
            total_customers: orders.iter().map(|o| o.buyer_id).collect::<HashSet<_>>().len(),
            average_rating: weighted_rating(products),
            status_distribution: status_distribution(orders),
            monthly_revenue,
            revenue_growth_percent,
            order_growth_percent,
            top_products: top_products(orders, products, TOP_PRODUCT_LIMIT),
            recent_orders: recent_orders(orders, RECENT_ORDER_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerAnalytics {
    pub total_orders: usize,
    pub total_spent: Money,
    pub average_order_value: Money,
    pub status_distribution: Vec<StatusCount>,
    pub monthly_spending: Vec<MonthlyTotal>,
    pub favourite_suppliers: Vec<SupplierRanking>,
    pub recent_orders: Vec<Order>,
}

impl BuyerAnalytics {
    /// Builds the buyer dashboard. `suppliers` supplies the names shown in the favourite-supplier ranking.
    pub fn compute(orders: &[Order], suppliers: &HashMap<UserId, User>, today: NaiveDate) -> Self {
        let total_spent: Money = orders.iter().map(|o| o.total).sum();
        Self {
            total_orders: orders.len(),
            total_spent,
            average_order_value: total_spent.average_over(orders.len()),
            status_distribution: status_distribution(orders),
            monthly_spending: monthly_totals(orders, today),
            favourite_suppliers: favourite_suppliers(orders, suppliers, FAVOURITE_SUPPLIER_LIMIT),
            recent_orders: recent_orders(orders, RECENT_ORDER_LIMIT),
        }
    }
}

/// The `TRAILING_MONTHS` calendar months ending with the month containing `today`, oldest first, as (year, month).
pub fn trailing_months(today: NaiveDate) -> Vec<(i32, u32)> {
    let current = today.year() * 12 + today.month0() as i32;
    (0..TRAILING_MONTHS as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.format("%b %Y").to_string()).unwrap_or_default()
}

/// Order totals and counts per calendar month (UTC) for the trailing year. Months without orders are present with
/// zero values.
pub fn monthly_totals(orders: &[Order], today: NaiveDate) -> Vec<MonthlyTotal> {
    trailing_months(today)
        .into_iter()
        .map(|(year, month)| {
            let in_month = orders.iter().filter(|o| o.created_at.year() == year && o.created_at.month() == month);
            let (amount, order_count) = in_month.fold((Money::zero(), 0), |(sum, n), o| (sum + o.total, n + 1));
            MonthlyTotal { label: month_label(year, month), year, month, amount, order_count }
        })
        .collect()
}

/// Percentage change from `previous` to `current`, rounded to the nearest whole number with halves rounded up.
/// Zero when there is no previous value to compare against.
pub fn growth_percent(current: Decimal, previous: Decimal) -> i64 {
    if previous <= Decimal::ZERO {
        return 0;
    }
    let change = (current - previous) * Decimal::ONE_HUNDRED / previous;
    (change + Decimal::new(5, 1)).floor().to_i64().unwrap_or(0)
}

/// Order counts for every lifecycle status, in lifecycle order.
pub fn status_distribution(orders: &[Order]) -> Vec<StatusCount> {
    OrderStatusType::ALL
        .iter()
        .map(|&status| StatusCount { status, count: orders.iter().filter(|o| o.status == status).count() })
        .collect()
}

/// The review-weighted mean of the products' average ratings. Zero if nothing has been reviewed.
pub fn weighted_rating(products: &[Product]) -> f64 {
    let (weighted, reviews) = products
        .iter()
        .filter(|p| p.review_count > 0)
        .fold((0.0, 0i64), |(sum, n), p| (sum + p.average_rating * p.review_count as f64, n + p.review_count));
    if reviews == 0 {
        0.0
    } else {
        weighted / reviews as f64
    }
}

/// Products ranked by how many orders contain them. Unsold products are left out, and products with equal sales keep
/// their catalog order.
pub fn top_products(orders: &[Order], products: &[Product], limit: usize) -> Vec<TopProduct> {
    let mut ranked = products
        .iter()
        .filter_map(|product| {
            let containing = orders.iter().filter(|o| o.contains_product(product.id)).collect::<Vec<_>>();
            if containing.is_empty() {
                return None;
            }
            Some(TopProduct {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                sales_count: containing.len(),
                revenue: containing.iter().map(|o| o.total).sum(),
                average_rating: product.average_rating,
            })
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.sales_count.cmp(&a.sales_count));
    ranked.truncate(limit);
    ranked
}

/// Suppliers ranked by the number of orders placed with them. Ties keep the order in which the suppliers were first
/// ordered from. Names fall back to the supplier id for users that could not be found.
pub fn favourite_suppliers(orders: &[Order], suppliers: &HashMap<UserId, User>, limit: usize) -> Vec<SupplierRanking> {
    let mut ranked: Vec<SupplierRanking> = Vec::new();
    for order in orders {
        match ranked.iter_mut().find(|r| r.supplier_id == order.supplier_id) {
            Some(r) => r.order_count += 1,
            None => {
                let name = suppliers
                    .get(&order.supplier_id)
                    .map(|u| u.display_name().to_string())
                    .unwrap_or_else(|| order.supplier_id.to_string());
                ranked.push(SupplierRanking { supplier_id: order.supplier_id, name, order_count: 1 });
            },
        }
    }
    ranked.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    ranked.truncate(limit);
    ranked
}

/// The `limit` newest orders, newest first.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<Order> {
    let mut recent = orders.to_vec();
    recent.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::db_types::{OrderId, OrderItem, PaymentStatus, UserRole};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn order(id: i64, buyer: i64, supplier: i64, total: i64, created_at: DateTime<Utc>, products: &[i64]) -> Order {
        Order {
            id: OrderId(id),
            buyer_id: UserId(buyer),
            supplier_id: UserId(supplier),
            status: OrderStatusType::Pending,
            payment_status: PaymentStatus::Unpaid,
            subtotal: Money::from(total),
            shipping_cost: Money::zero(),
            total: Money::from(total),
            shipping_method: None,
            payment_method: None,
            shipping_address: None,
            tracking_number: None,
            courier_name: None,
            created_at,
            updated_at: created_at,
            items: products
                .iter()
                .enumerate()
                .map(|(i, p)| OrderItem {
                    id: id * 100 + i as i64,
                    order_id: OrderId(id),
                    product_id: ProductId(*p),
                    product_name: format!("Product {p}"),
                    quantity: 1,
                    unit_price: Money::from(total),
                })
                .collect(),
        }
    }

    fn product(id: i64, rating: f64, reviews: i64) -> Product {
        Product {
            id: ProductId(id),
            supplier_id: UserId(50),
            name: format!("Product {id}"),
            price: Money::from(1000),
            stock_quantity: 10,
            average_rating: rating,
            review_count: reviews,
            created_at: at(2023, 1, 1),
        }
    }

    fn supplier(id: i64, username: &str, company: Option<&str>) -> User {
        User {
            id: UserId(id),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role: UserRole::Supplier,
            company_name: company.map(String::from),
            created_at: at(2023, 1, 1),
        }
    }

    #[test]
    fn trailing_months_cross_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let months = trailing_months(today);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], (2023, 4));
        assert_eq!(months[8], (2023, 12));
        assert_eq!(months[9], (2024, 1));
        assert_eq!(months[11], (2024, 3));
    }

    #[test]
    fn monthly_totals_are_labelled_and_bucketed() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let orders = vec![
            order(1, 1, 50, 1000, at(2024, 3, 1), &[1]),
            order(2, 1, 50, 500, at(2024, 3, 14), &[1]),
            order(3, 1, 50, 2000, at(2024, 2, 29), &[1]),
            order(4, 1, 50, 9000, at(2023, 3, 31), &[1]),
        ];
        let totals = monthly_totals(&orders, today);
        assert_eq!(totals.first().unwrap().label, "Apr 2023");
        assert_eq!(totals.last().unwrap().label, "Mar 2024");
        assert_eq!(totals[11].amount, Money::from(1500));
        assert_eq!(totals[11].order_count, 2);
        assert_eq!(totals[10].amount, Money::from(2000));
        let sum: Money = totals.iter().map(|t| t.amount).sum();
        assert_eq!(sum, Money::from(3500), "orders older than the window are excluded");
    }

    #[test]
    fn growth_rounds_half_up_and_guards_zero() {
        assert_eq!(growth_percent(Decimal::from(150), Decimal::from(100)), 50);
        assert_eq!(growth_percent(Decimal::from(1), Decimal::from(8)), -87);
        assert_eq!(growth_percent(Decimal::from(9), Decimal::from(8)), 13);
        assert_eq!(growth_percent(Decimal::from(7), Decimal::from(8)), -12);
        assert_eq!(growth_percent(Decimal::from(3), Decimal::from(200)), -98);
        assert_eq!(growth_percent(Decimal::from(500), Decimal::ZERO), 0);
    }

    #[test]
    fn weighted_average_rating() {
        assert_eq!(weighted_rating(&[]), 0.0);
        assert_eq!(weighted_rating(&[product(1, 4.0, 0)]), 0.0);
        let rating = weighted_rating(&[product(1, 5.0, 3), product(2, 3.0, 1), product(3, 1.0, 0)]);
        assert!((rating - 4.5).abs() < 1e-9);
    }

    #[test]
    fn top_products_rank_by_orders_and_keep_catalog_order_on_ties() {
        let products = vec![product(1, 4.0, 2), product(2, 3.5, 1), product(3, 0.0, 0), product(4, 5.0, 1)];
        let orders = vec![
            order(1, 1, 50, 100, at(2024, 1, 1), &[2]),
            order(2, 1, 50, 200, at(2024, 1, 2), &[1, 2]),
            order(3, 2, 50, 300, at(2024, 1, 3), &[4]),
            order(4, 2, 50, 400, at(2024, 1, 4), &[1]),
        ];
        let top = top_products(&orders, &products, 5);
        let ids = top.iter().map(|p| p.product_id.value()).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 4], "product 3 has no sales");
        assert_eq!(top[0].sales_count, 2);
        assert_eq!(top[0].revenue, Money::from(600));
        assert_eq!(top[1].revenue, Money::from(300));
        assert_eq!(top[2].average_rating, 5.0);
        assert_eq!(top_products(&orders, &products, 1).len(), 1);
    }

    #[test]
    fn favourite_suppliers_use_company_name_or_username() {
        let mut suppliers = HashMap::new();
        suppliers.insert(UserId(50), supplier(50, "dewi", Some("Dewi Batik")));
        suppliers.insert(UserId(60), supplier(60, "agus", None));
        let orders = vec![
            order(1, 1, 60, 100, at(2024, 1, 1), &[1]),
            order(2, 1, 50, 100, at(2024, 1, 2), &[2]),
            order(3, 1, 50, 100, at(2024, 1, 3), &[2]),
            order(4, 1, 70, 100, at(2024, 1, 4), &[3]),
        ];
        let ranked = favourite_suppliers(&orders, &suppliers, 5);
        let names = ranked.iter().map(|r| (r.name.as_str(), r.order_count)).collect::<Vec<_>>();
        assert_eq!(names, vec![("Dewi Batik", 2), ("agus", 1), ("user-70", 1)]);
    }

    #[test]
    fn supplier_report() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let mut orders = vec![
            order(1, 1, 50, 1000, at(2024, 2, 10), &[1]),
            order(2, 2, 50, 1500, at(2024, 3, 1), &[1]),
            order(3, 1, 50, 500, at(2024, 3, 2), &[2]),
        ];
        orders[2].status = OrderStatusType::Cancelled;
        let products = vec![product(1, 4.0, 1), product(2, 2.0, 1)];
        let report = SupplierAnalytics::compute(&orders, &products, today);
        assert_eq!(report.total_orders, 3);
        assert_eq!(report.total_revenue, Money::from(3000));
        assert_eq!(report.total_customers, 2);
        assert!((report.average_rating - 3.0).abs() < 1e-9);
        assert_eq!(report.status_distribution.len(), 5);
        assert_eq!(report.status_distribution[0], StatusCount { status: OrderStatusType::Pending, count: 2 });
        assert_eq!(report.status_distribution[4], StatusCount { status: OrderStatusType::Cancelled, count: 1 });
        assert_eq!(report.revenue_growth_percent, 100);
        assert_eq!(report.order_growth_percent, 100);
        assert_eq!(report.recent_orders.iter().map(|o| o.id.value()).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn buyer_report_without_orders_is_zeroed() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let report = BuyerAnalytics::compute(&[], &HashMap::new(), today);
        assert_eq!(report.total_orders, 0);
        assert_eq!(report.total_spent, Money::zero());
        assert_eq!(report.average_order_value, Money::zero());
        assert_eq!(report.monthly_spending.len(), 12);
        assert!(report.monthly_spending.iter().all(|m| m.amount.is_zero()));
        assert!(report.status_distribution.iter().all(|s| s.count == 0));
        assert!(report.favourite_suppliers.is_empty());
        assert!(report.recent_orders.is_empty());
    }

    #[test]
    fn buyer_average_order_value() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let orders = vec![
            order(1, 1, 50, 100, at(2024, 3, 1), &[1]),
            order(2, 1, 50, 100, at(2024, 3, 2), &[1]),
            order(3, 1, 60, 101, at(2024, 3, 3), &[2]),
        ];
        let report = BuyerAnalytics::compute(&orders, &HashMap::new(), today);
        assert_eq!(report.total_spent, Money::from(301));
        assert_eq!(report.average_order_value, "100.33".parse().unwrap());
        assert_eq!(report.favourite_suppliers[0].supplier_id, UserId(50));
    }
}
