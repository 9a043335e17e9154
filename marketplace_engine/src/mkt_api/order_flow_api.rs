use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{
        CartManagement,
        CatalogManagement,
        CheckoutResult,
        InsertOrderResult,
        OrderFlowDatabase,
        OrderManagement,
        OrderQueryFilter,
    },
    db_types::{
        LineItem,
        NewOrder,
        NewOrderItem,
        Order,
        OrderId,
        OrderStatusType,
        OrderUpdate,
        PaymentStatus,
        ShippingAddress,
        ShippingMethod,
        User,
        UserId,
    },
    events::{
        EventProducers,
        OrderConfirmedEvent,
        OrderCreatedEvent,
        OrderShippedEvent,
        PaymentApprovedEvent,
        PaymentConfirmedEvent,
    },
    mkt_api::{
        cart_objects::Cart,
        errors::{OrderFlowError, ValidationError},
        order_objects::{display_index, CheckoutRequest, DeliveryEstimates},
    },
};

/// `OrderFlowApi` is the primary API for the order lifecycle: creating orders from line items or a cart, moving them
/// through their statuses, and recording payment and shipping details.
///
/// Every state change that a user should hear about is published as an event. Event delivery happens elsewhere and
/// can never fail an operation here.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    estimates: DeliveryEstimates,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

/// An order that has passed validation but has not been written yet.
struct PreparedOrder {
    supplier: User,
    order: NewOrder,
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, estimates: DeliveryEstimates::default() }
    }

    pub fn with_estimates(mut self, estimates: DeliveryEstimates) -> Self {
        self.estimates = estimates;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase + OrderManagement + CatalogManagement + CartManagement
{
    /// Creates a single order for `buyer_id` from the given line items.
    ///
    /// All items must come from one supplier and there must be enough stock for each of them. The order is stored as
    /// `Pending` and `Unpaid`, with no shipping cost, and the stock of every product is reduced by the ordered
    /// quantity in the same transaction.
    pub async fn create_order(&self, buyer_id: UserId, items: Vec<LineItem>) -> Result<Order, OrderFlowError> {
        if items.is_empty() {
            return Err(ValidationError::NoItems.into());
        }
        let buyer = self.fetch_buyer(buyer_id).await?;
        let prepared = self.prepare_order(&buyer, items).await?;
        self.place_order(buyer, prepared).await
    }

    /// Turns the buyer's cart into one order per supplier.
    ///
    /// Every group is validated before anything is written. The orders, with the checkout choices applied to each,
    /// are then stored together with the emptying of the cart in one transaction. If any product runs short, nothing
    /// is saved and the cart and stock levels stay as they were.
    pub async fn checkout(&self, buyer_id: UserId, request: CheckoutRequest) -> Result<Vec<Order>, OrderFlowError> {
        let buyer = self.fetch_buyer(buyer_id).await?;
        let cart = Cart::new(buyer_id, self.db.fetch_cart_items(buyer_id).await.map_err(OrderFlowError::database)?);
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let mut suppliers = Vec::new();
        let mut batch = Vec::new();
        for (supplier_id, group) in cart.group_by_supplier() {
            trace!("🔄️🛒️ Validating {} cart rows from {supplier_id} for {buyer_id}", group.len());
            let items = group.iter().map(LineItem::from).collect();
            let PreparedOrder { supplier, order } = self.prepare_order(&buyer, items).await?;
            let mut update = OrderUpdate::default().with_shipping(request.shipping_method, order.subtotal());
            if let Some(method) = request.payment_method {
                update = update.with_payment_method(method);
            }
            if let Some(address) = request.shipping_address.clone() {
                update = update.with_shipping_address(address);
            }
            suppliers.push(supplier);
            batch.push((order, update));
        }
        let orders = match self.db.insert_checkout_orders(buyer_id, batch).await.map_err(OrderFlowError::database)? {
            CheckoutResult::Placed(orders) => orders,
            CheckoutResult::InsufficientStock(shortfall) => {
                warn!("🔄️🛒️ Stock ran out during checkout for {buyer_id}. No orders were placed. {shortfall}");
                return Err(ValidationError::from(shortfall).into());
            },
        };
        for (order, supplier) in orders.iter().zip(suppliers) {
            info!("🔄️📦️ Order {} placed by {buyer_id} with {} for {}", order.id, supplier.id, order.total);
            self.call_order_created_hook(order, buyer.clone(), supplier).await;
        }
        info!("🔄️🛒️ Checkout for {buyer_id} complete. {} orders created", orders.len());
        Ok(orders)
    }

    /// Moves the order to `new_status`.
    ///
    /// Setting the status an order already has does nothing and publishes nothing. Otherwise the move must be a valid
    /// lifecycle transition. Confirming or shipping an order notifies the buyer.
    pub async fn update_order_status(&self, order_id: OrderId, new_status: OrderStatusType) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        let old_status = order.status;
        if old_status == new_status {
            debug!("🔄️📦️ Order {order_id} is already {new_status}. Nothing to do");
            return Ok(order);
        }
        if !old_status.can_transition_to(new_status) {
            return Err(OrderFlowError::InvalidStateError(format!(
                "Order {order_id} cannot move from {old_status} to {new_status}"
            )));
        }
        let order = self.apply_update(order_id, OrderUpdate::default().with_status(new_status)).await?;
        info!("🔄️📦️ Order {order_id} status changed from {old_status} to {new_status}");
        match new_status {
            OrderStatusType::Confirmed => self.call_order_confirmed_hook(&order).await,
            OrderStatusType::Shipped => self.call_order_shipped_hook(&order).await,
            _ => {},
        }
        Ok(order)
    }

    /// Cancels a pending or confirmed order on behalf of its buyer or supplier. Stock is not restored.
    pub async fn cancel_order(&self, order_id: OrderId, requester: UserId) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if !order.is_party(requester) {
            return Err(OrderFlowError::AuthorizationError(format!("{requester} may not cancel order {order_id}")));
        }
        if !order.status.is_cancellable() {
            return Err(OrderFlowError::InvalidStateError(format!(
                "Order {order_id} is {} and can no longer be cancelled",
                order.status
            )));
        }
        let order = self.apply_update(order_id, OrderUpdate::default().with_status(OrderStatusType::Cancelled)).await?;
        info!("🔄️❌️ Order {order_id} has been cancelled by {requester}");
        Ok(order)
    }

    /// Permanently removes a delivered or cancelled order. Only the buyer may do this.
    pub async fn delete_order(&self, order_id: OrderId, requester: UserId) -> Result<(), OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if order.buyer_id != requester {
            return Err(OrderFlowError::AuthorizationError(format!("{requester} may not delete order {order_id}")));
        }
        if !order.status.is_terminal() {
            return Err(OrderFlowError::InvalidStateError(format!(
                "Only delivered or cancelled orders can be deleted. Order {order_id} is {}",
                order.status
            )));
        }
        if !self.db.delete_order(order_id).await.map_err(OrderFlowError::database)? {
            return Err(OrderFlowError::NotFoundError(format!("Order {order_id}")));
        }
        info!("🔄️🗑️ Order {order_id} has been deleted by {requester}");
        Ok(())
    }

    /// Sets the shipping method (and optionally the address), and recalculates the total from the flat shipping fee.
    pub async fn set_shipping(
        &self,
        order_id: OrderId,
        method: ShippingMethod,
        address: Option<ShippingAddress>,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if !order.status.is_cancellable() {
            return Err(OrderFlowError::InvalidStateError(format!(
                "Shipping for order {order_id} cannot change once it is {}",
                order.status
            )));
        }
        let mut update = OrderUpdate::default().with_shipping(method, order.subtotal);
        if let Some(address) = address {
            update = update.with_shipping_address(address);
        }
        let order = self.apply_update(order_id, update).await?;
        debug!("🔄️🚚️ Order {order_id} will ship {method}. New total is {}", order.total);
        Ok(order)
    }

    /// The buyer declares the order paid. A pending order is confirmed at the same time.
    pub async fn confirm_payment(&self, order_id: OrderId, buyer_id: UserId) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if order.buyer_id != buyer_id {
            return Err(OrderFlowError::AuthorizationError(format!(
                "{buyer_id} may not confirm payment for order {order_id}"
            )));
        }
        if order.status == OrderStatusType::Cancelled {
            return Err(OrderFlowError::InvalidStateError(format!("Order {order_id} has been cancelled")));
        }
        if order.payment_status == PaymentStatus::Paid {
            return Err(OrderFlowError::InvalidStateError(format!("Order {order_id} has already been paid")));
        }
        let mut update = OrderUpdate::default().with_payment_status(PaymentStatus::Paid);
        if order.status == OrderStatusType::Pending {
            update = update.with_status(OrderStatusType::Confirmed);
        }
        let order = self.apply_update(order_id, update).await?;
        info!("🔄️💰️ Payment for order {order_id} confirmed by {buyer_id}");
        self.call_payment_confirmed_hook(&order).await;
        Ok(order)
    }

    /// Records the payment status as seen by the supplier. Marking an order paid notifies the buyer.
    pub async fn update_payment_status(&self, order_id: OrderId, status: PaymentStatus) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if order.payment_status == status {
            debug!("🔄️💰️ Payment for order {order_id} is already {status}");
            return Ok(order);
        }
        let order = self.apply_update(order_id, OrderUpdate::default().with_payment_status(status)).await?;
        info!("🔄️💰️ Payment status for order {order_id} is now {status}");
        if status == PaymentStatus::Paid {
            self.call_payment_approved_hook(&order).await;
        }
        Ok(order)
    }

    /// Records the courier details and marks the order as shipped.
    pub async fn update_shipping_info(
        &self,
        order_id: OrderId,
        tracking_number: &str,
        courier_name: &str,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if order.status != OrderStatusType::Shipped && !order.status.can_transition_to(OrderStatusType::Shipped) {
            return Err(OrderFlowError::InvalidStateError(format!(
                "Order {order_id} is {} and cannot be shipped",
                order.status
            )));
        }
        self.apply_update(order_id, OrderUpdate::default().with_tracking(tracking_number, courier_name)).await?;
        debug!("🔄️🚚️ Order {order_id} is travelling with {courier_name} ({tracking_number})");
        self.update_order_status(order_id, OrderStatusType::Shipped).await
    }

    /// The order's position among the buyer's orders, oldest first, counting from 1.
    pub async fn display_index_for_buyer(&self, order_id: OrderId, buyer_id: UserId) -> Result<Option<usize>, OrderFlowError> {
        let orders = self.orders_for_buyer(buyer_id).await?;
        Ok(display_index(&orders, order_id))
    }

    /// The order's position among the supplier's orders, oldest first, counting from 1.
    pub async fn display_index_for_supplier(
        &self,
        order_id: OrderId,
        supplier_id: UserId,
    ) -> Result<Option<usize>, OrderFlowError> {
        let orders = self.orders_for_supplier(supplier_id).await?;
        Ok(display_index(&orders, order_id))
    }

    pub async fn order_by_id(&self, order_id: OrderId) -> Result<Option<Order>, OrderFlowError> {
        self.db.fetch_order(order_id).await.map_err(OrderFlowError::database)
    }

    pub async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, OrderFlowError> {
        self.search_orders(OrderQueryFilter::default().with_buyer_id(buyer_id)).await
    }

    pub async fn orders_for_supplier(&self, supplier_id: UserId) -> Result<Vec<Order>, OrderFlowError> {
        self.search_orders(OrderQueryFilter::default().with_supplier_id(supplier_id)).await
    }

    pub async fn orders_for_buyer_with_status(
        &self,
        buyer_id: UserId,
        status: OrderStatusType,
    ) -> Result<Vec<Order>, OrderFlowError> {
        self.search_orders(OrderQueryFilter::default().with_buyer_id(buyer_id).with_status(status)).await
    }

    /// The buyer's `limit` newest orders, newest first.
    pub async fn recent_orders_for_buyer(&self, buyer_id: UserId, limit: usize) -> Result<Vec<Order>, OrderFlowError> {
        let mut orders = self.orders_for_buyer(buyer_id).await?;
        orders.reverse();
        orders.truncate(limit);
        Ok(orders)
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        self.db.fetch_orders(query).await.map_err(OrderFlowError::database)
    }

    async fn fetch_buyer(&self, buyer_id: UserId) -> Result<User, OrderFlowError> {
        let buyer = self
            .db
            .fetch_user(buyer_id)
            .await
            .map_err(OrderFlowError::database)?
            .ok_or_else(|| OrderFlowError::NotFoundError(format!("{buyer_id}")))?;
        if !buyer.is_buyer() {
            return Err(OrderFlowError::AuthorizationError(format!("{buyer_id} is not a buyer and cannot place orders")));
        }
        Ok(buyer)
    }

    async fn fetch_existing_order(&self, order_id: OrderId) -> Result<Order, OrderFlowError> {
        self.order_by_id(order_id).await?.ok_or_else(|| OrderFlowError::NotFoundError(format!("Order {order_id}")))
    }

    async fn apply_update(&self, order_id: OrderId, update: OrderUpdate) -> Result<Order, OrderFlowError> {
        self.db
            .update_order(order_id, update)
            .await
            .map_err(OrderFlowError::database)?
            .ok_or_else(|| OrderFlowError::NotFoundError(format!("Order {order_id}")))
    }

    /// Checks the line items against the catalog: every product exists with a positive quantity, all of them belong to
    /// the same supplier, and there is enough stock for each one.
    async fn prepare_order(&self, buyer: &User, items: Vec<LineItem>) -> Result<PreparedOrder, OrderFlowError> {
        if items.is_empty() {
            return Err(ValidationError::NoItems.into());
        }
        let mut products = Vec::with_capacity(items.len());
        for item in &items {
            if item.quantity < 1 {
                return Err(ValidationError::InvalidQuantity(item.quantity).into());
            }
            let product = self
                .db
                .fetch_product(item.product_id)
                .await
                .map_err(OrderFlowError::database)?
                .ok_or(ValidationError::ProductNotFound(item.product_id))?;
            products.push(product);
        }
        let first = &products[0];
        let supplier = self
            .db
            .fetch_user(first.supplier_id)
            .await
            .map_err(OrderFlowError::database)?
            .filter(User::is_supplier)
            .ok_or(ValidationError::MissingSupplier(first.id))?;
        if products.iter().any(|p| p.supplier_id != supplier.id) {
            return Err(ValidationError::MixedSuppliers.into());
        }
        let mut order_items = Vec::with_capacity(items.len());
        for (item, product) in items.into_iter().zip(products) {
            if product.stock_quantity < item.quantity {
                return Err(ValidationError::InsufficientStock {
                    product: product.name,
                    available: product.stock_quantity,
                    requested: item.quantity,
                }
                .into());
            }
            order_items.push(NewOrderItem {
                product_id: product.id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }
        let order = NewOrder::new(buyer.id, supplier.id, order_items);
        Ok(PreparedOrder { supplier, order })
    }

    async fn place_order(&self, buyer: User, prepared: PreparedOrder) -> Result<Order, OrderFlowError> {
        let PreparedOrder { supplier, order } = prepared;
        let order = match self.db.insert_order(order).await.map_err(OrderFlowError::database)? {
            InsertOrderResult::Inserted(order) => order,
            InsertOrderResult::InsufficientStock(shortfall) => {
                warn!("🔄️📦️ Stock ran out while placing an order for {}. {shortfall}", buyer.id);
                return Err(ValidationError::from(shortfall).into());
            },
        };
        info!(
            "🔄️📦️ Order {} placed by {} with {} for {} ({} items)",
            order.id,
            buyer.id,
            supplier.id,
            order.total,
            order.items.len()
        );
        self.call_order_created_hook(&order, buyer, supplier).await;
        Ok(order)
    }

    /// The user record for the event, or `None` (with a warning) if it cannot be read. A missing party only costs
    /// the notification.
    async fn fetch_party(&self, user_id: UserId) -> Option<User> {
        match self.db.fetch_user(user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                warn!("🔄️📬️ {user_id} no longer exists. No event will be published");
                None
            },
            Err(e) => {
                warn!("🔄️📬️ Could not fetch {user_id} for event publication. {e}");
                None
            },
        }
    }

    async fn call_order_created_hook(&self, order: &Order, buyer: User, supplier: User) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.clone(), buyer.clone(), supplier.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_confirmed_hook(&self, order: &Order) {
        if self.producers.order_confirmed_producer.is_empty() {
            return;
        }
        let Some(buyer) = self.fetch_party(order.buyer_id).await else { return };
        for emitter in &self.producers.order_confirmed_producer {
            debug!("🔄️✅️ Notifying order confirmed hook subscribers");
            let event = OrderConfirmedEvent::new(order.clone(), buyer.clone(), self.estimates.shipping.as_str());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_shipped_hook(&self, order: &Order) {
        if self.producers.order_shipped_producer.is_empty() {
            return;
        }
        let Some(buyer) = self.fetch_party(order.buyer_id).await else { return };
        for emitter in &self.producers.order_shipped_producer {
            debug!("🔄️🚚️ Notifying order shipped hook subscribers");
            let event = OrderShippedEvent::new(order.clone(), buyer.clone(), self.estimates.delivery.as_str());
            emitter.publish_event(event).await;
        }
    }

    async fn call_payment_confirmed_hook(&self, order: &Order) {
        if self.producers.payment_confirmed_producer.is_empty() {
            return;
        }
        let Some(buyer) = self.fetch_party(order.buyer_id).await else { return };
        let Some(supplier) = self.fetch_party(order.supplier_id).await else { return };
        for emitter in &self.producers.payment_confirmed_producer {
            debug!("🔄️💰️ Notifying payment confirmed hook subscribers");
            let event = PaymentConfirmedEvent::new(order.clone(), buyer.clone(), supplier.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_payment_approved_hook(&self, order: &Order) {
        if self.producers.payment_approved_producer.is_empty() {
            return;
        }
        let Some(buyer) = self.fetch_party(order.buyer_id).await else { return };
        for emitter in &self.producers.payment_approved_producer {
            debug!("🔄️💰️ Notifying payment approved hook subscribers");
            let event = PaymentApprovedEvent::new(order.clone(), buyer.clone());
            emitter.publish_event(event).await;
        }
    }
}
