use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------       Identifiers      --------------------------------------------------------
macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .trim_start_matches($prefix)
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| ConversionError(format!("{s} is not a valid {}. {e}", stringify!($name))))
            }
        }

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }
    };
}

id_type!(UserId, "user-");
id_type!(ProductId, "product-");
id_type!(OrderId, "#");
id_type!(NotificationId, "notification-");

//--------------------------------------        UserRole        --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Purchases products and places orders.
    Buyer,
    /// Lists products and fulfils orders.
    Supplier,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Buyer => write!(f, "BUYER"),
            UserRole::Supplier => write!(f, "SUPPLIER"),
        }
    }
}

impl FromStr for UserRole {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUYER" => Ok(Self::Buyer),
            "SUPPLIER" => Ok(Self::Supplier),
            _ => Err(ConversionError(format!("Invalid user role: {s}"))),
        }
    }
}

//--------------------------------------          User          --------------------------------------------------------
/// A marketplace user. The role is fixed when the user is created; there is no way to change it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_buyer(&self) -> bool {
        self.role == UserRole::Buyer
    }

    pub fn is_supplier(&self) -> bool {
        self.role == UserRole::Supplier
    }

    /// The company name if there is one, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.company_name.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(self.username.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub company_name: Option<String>,
}

impl NewUser {
    pub fn buyer<S: Into<String>>(username: S, email: S) -> Self {
        Self { username: username.into(), email: email.into(), role: UserRole::Buyer, company_name: None }
    }

    pub fn supplier<S: Into<String>>(username: S, email: S, company_name: S) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            role: UserRole::Supplier,
            company_name: Some(company_name.into()),
        }
    }

    pub fn with_company_name<S: Into<String>>(mut self, company_name: S) -> Self {
        self.company_name = Some(company_name.into());
        self
    }
}

//--------------------------------------         Product        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub supplier_id: UserId,
    pub name: String,
    pub price: Money,
    pub stock_quantity: i64,
    /// Mean review score. Maintained by the catalog; zero when there are no reviews.
    pub average_rating: f64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub supplier_id: UserId,
    pub name: String,
    pub price: Money,
    pub stock_quantity: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(supplier_id: UserId, name: S, price: Money, stock_quantity: i64) -> Self {
        Self { supplier_id, name: name.into(), price, stock_quantity }
    }
}

//--------------------------------------        CartItem        --------------------------------------------------------
/// A single cart row. There is at most one row per (user, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub supplier_id: UserId,
    pub quantity: i64,
    /// The product price when the row was first created.
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been placed, and is waiting for the supplier.
    Pending,
    /// The supplier has accepted the order.
    Confirmed,
    /// The order is on its way to the buyer.
    Shipped,
    /// The buyer has received the order.
    Delivered,
    /// The order was cancelled before it shipped.
    Cancelled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 5] = [
        OrderStatusType::Pending,
        OrderStatusType::Confirmed,
        OrderStatusType::Shipped,
        OrderStatusType::Delivered,
        OrderStatusType::Cancelled,
    ];

    /// Delivered and cancelled orders will not change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatusType::Pending | OrderStatusType::Confirmed)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// | From \ To | Confirmed | Shipped | Delivered | Cancelled |
    /// |-----------|-----------|---------|-----------|-----------|
    /// | Pending   | ✓         |         |           | ✓         |
    /// | Confirmed |           | ✓       |           | ✓         |
    /// | Shipped   |           |         | ✓         |           |
    ///
    /// Nothing leaves `Delivered` or `Cancelled`, and nothing returns to `Pending`.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Shipped) | (Shipped, Delivered) | (Pending | Confirmed, Cancelled)
        )
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Confirmed => write!(f, "CONFIRMED"),
            OrderStatusType::Shipped => write!(f, "SHIPPED"),
            OrderStatusType::Delivered => write!(f, "DELIVERED"),
            OrderStatusType::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentStatus      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "UNPAID"),
            PaymentStatus::Paid => write!(f, "PAID"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNPAID" => Ok(Self::Unpaid),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentMethod      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[sqlx(rename = "BANK_TRANSFER")]
    BankTransfer,
    #[sqlx(rename = "E_WALLET")]
    #[serde(rename = "E_WALLET")]
    EWallet,
    #[sqlx(rename = "CASH_ON_DELIVERY")]
    CashOnDelivery,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::BankTransfer => write!(f, "BANK_TRANSFER"),
            PaymentMethod::EWallet => write!(f, "E_WALLET"),
            PaymentMethod::CashOnDelivery => write!(f, "CASH_ON_DELIVERY"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            "E_WALLET" => Ok(Self::EWallet),
            "CASH_ON_DELIVERY" => Ok(Self::CashOnDelivery),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------     ShippingMethod     --------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingMethod {
    #[default]
    Regular,
    Express,
    SameDay,
    Instant,
}

impl ShippingMethod {
    /// Flat shipping fee for each method.
    pub fn cost(&self) -> Money {
        match self {
            ShippingMethod::Instant => Money::from(25_000),
            ShippingMethod::SameDay => Money::from(15_000),
            ShippingMethod::Express => Money::from(10_000),
            ShippingMethod::Regular => Money::from(5_000),
        }
    }
}

impl Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShippingMethod::Regular => write!(f, "REGULAR"),
            ShippingMethod::Express => write!(f, "EXPRESS"),
            ShippingMethod::SameDay => write!(f, "SAME_DAY"),
            ShippingMethod::Instant => write!(f, "INSTANT"),
        }
    }
}

impl FromStr for ShippingMethod {
    type Err = ConversionError;

    /// Unrecognised methods fall back to `Regular`, matching the flat-fee table's default row.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSTANT" => Ok(Self::Instant),
            "SAME_DAY" => Ok(Self::SameDay),
            "EXPRESS" => Ok(Self::Express),
            "REGULAR" => Ok(Self::Regular),
            "" => Err(ConversionError("Shipping method is empty".to_string())),
            _ => Ok(Self::Regular),
        }
    }
}

//--------------------------------------     ShippingAddress    --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub phone: String,
}

//--------------------------------------       OrderItem        --------------------------------------------------------
/// A snapshot of a product line at the time the order was placed. Later price changes do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------         Order          --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub supplier_id: UserId,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total: Money,
    pub shipping_method: Option<ShippingMethod>,
    pub payment_method: Option<PaymentMethod>,
    pub shipping_address: Option<ShippingAddress>,
    pub tracking_number: Option<String>,
    pub courier_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Filled in separately from the `order_items` table.
    pub items: Vec<OrderItem>,
}

impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let address: Option<String> = row.try_get("shipping_address")?;
        let shipping_address = match address {
            Some(address) => Some(ShippingAddress {
                address,
                city: row.try_get::<Option<String>, _>("shipping_city")?.unwrap_or_default(),
                province: row.try_get::<Option<String>, _>("shipping_province")?.unwrap_or_default(),
                postal_code: row.try_get::<Option<String>, _>("shipping_postal_code")?.unwrap_or_default(),
                phone: row.try_get::<Option<String>, _>("shipping_phone")?.unwrap_or_default(),
            }),
            None => None,
        };
        Ok(Self {
            id: row.try_get("id")?,
            buyer_id: row.try_get("buyer_id")?,
            supplier_id: row.try_get("supplier_id")?,
            status: row.try_get("status")?,
            payment_status: row.try_get("payment_status")?,
            subtotal: row.try_get("subtotal")?,
            shipping_cost: row.try_get("shipping_cost")?,
            total: row.try_get("total")?,
            shipping_method: row.try_get("shipping_method")?,
            payment_method: row.try_get("payment_method")?,
            shipping_address,
            tracking_number: row.try_get("tracking_number")?,
            courier_name: row.try_get("courier_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            items: Vec::new(),
        })
    }
}

impl Order {
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_party(&self, user_id: UserId) -> bool {
        self.buyer_id == user_id || self.supplier_id == user_id
    }
}

//--------------------------------------        NewOrder        --------------------------------------------------------
/// A line of a prospective order, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: Money) -> Self {
        Self { product_id, quantity, unit_price }
    }

    /// A line item priced at the product's current catalog price.
    pub fn at_catalog_price(product: &Product, quantity: i64) -> Self {
        Self::new(product.id, quantity, product.price)
    }
}

impl From<&CartItem> for LineItem {
    fn from(item: &CartItem) -> Self {
        Self::new(item.product_id, item.quantity, item.unit_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A validated order, ready to be written to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_id: UserId,
    pub supplier_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(buyer_id: UserId, supplier_id: UserId, items: Vec<NewOrderItem>) -> Self {
        Self { buyer_id, supplier_id, items, created_at: Utc::now() }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Σ(unit_price × quantity) over all items.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.unit_price * i.quantity).sum()
    }
}

//--------------------------------------       OrderUpdate      --------------------------------------------------------
/// The subset of order fields that may change after the order is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub shipping_method: Option<ShippingMethod>,
    pub shipping_cost: Option<Money>,
    pub total: Option<Money>,
    pub shipping_address: Option<ShippingAddress>,
    pub tracking_number: Option<String>,
    pub courier_name: Option<String>,
}

impl OrderUpdate {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payment_status(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    pub fn with_payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = Some(payment_method);
        self
    }

    /// Sets the shipping method, and the matching shipping cost and total for an order with the given subtotal.
    pub fn with_shipping(mut self, method: ShippingMethod, subtotal: Money) -> Self {
        let cost = method.cost();
        self.shipping_method = Some(method);
        self.shipping_cost = Some(cost);
        self.total = Some(subtotal + cost);
        self
    }

    pub fn with_shipping_address(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }

    pub fn with_tracking<S: Into<String>>(mut self, tracking_number: S, courier_name: S) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self.courier_name = Some(courier_name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() &&
            self.payment_status.is_none() &&
            self.payment_method.is_none() &&
            self.shipping_method.is_none() &&
            self.shipping_cost.is_none() &&
            self.total.is_none() &&
            self.shipping_address.is_none() &&
            self.tracking_number.is_none() &&
            self.courier_name.is_none()
    }
}

//--------------------------------------    NotificationType    --------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    OrderUpdate,
    ProductUpdate,
    PaymentConfirmed,
    ShippingUpdate,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::Info => "INFO",
            NotificationType::Success => "SUCCESS",
            NotificationType::Warning => "WARNING",
            NotificationType::Error => "ERROR",
            NotificationType::OrderUpdate => "ORDER_UPDATE",
            NotificationType::ProductUpdate => "PRODUCT_UPDATE",
            NotificationType::PaymentConfirmed => "PAYMENT_CONFIRMED",
            NotificationType::ShippingUpdate => "SHIPPING_UPDATE",
        };
        f.write_str(s)
    }
}

impl FromStr for NotificationType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Self::Info),
            "SUCCESS" => Ok(Self::Success),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "ORDER_UPDATE" => Ok(Self::OrderUpdate),
            "PRODUCT_UPDATE" => Ok(Self::ProductUpdate),
            "PAYMENT_CONFIRMED" => Ok(Self::PaymentConfirmed),
            "SHIPPING_UPDATE" => Ok(Self::ShippingUpdate),
            s => Err(ConversionError(format!("Invalid notification type: {s}"))),
        }
    }
}

//--------------------------------------      Notification      --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub order_id: Option<OrderId>,
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub order_id: Option<OrderId>,
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
}

impl NewNotification {
    pub fn new<S: Into<String>>(user_id: UserId, title: S, message: S, notification_type: NotificationType) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            notification_type,
            order_id: None,
            product_name: None,
            quantity: None,
        }
    }

    pub fn for_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_product<S: Into<String>>(mut self, product_name: S, quantity: i64) -> Self {
        self.product_name = Some(product_name.into());
        self.quantity = Some(quantity);
        self
    }
}
