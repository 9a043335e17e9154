use log::*;

use crate::{
    db::traits::NotificationManagement,
    db_types::{NewNotification, NotificationType, Order, User},
    events::{
        EventHooks,
        OrderConfirmedEvent,
        OrderCreatedEvent,
        OrderShippedEvent,
        PaymentApprovedEvent,
        PaymentConfirmedEvent,
    },
    notifier::EmailSender,
};

/// Turns marketplace events into user notifications and emails.
///
/// Dispatch is best-effort. Every failure is logged and dropped, so a broken mail server or a full disk never
/// reaches the operation that published the event.
#[derive(Clone)]
pub struct NotificationDispatcher<N, M> {
    db: N,
    mailer: M,
}

impl<N, M> NotificationDispatcher<N, M>
where
    N: NotificationManagement,
    M: EmailSender,
{
    pub fn new(db: N, mailer: M) -> Self {
        Self { db, mailer }
    }

    /// Hooks that route every event type to this dispatcher. Pass them to
    /// [`EventHandlers::new`](crate::events::EventHandlers::new).
    pub fn hooks(&self) -> EventHooks {
        let mut hooks = EventHooks::default();
        let dispatcher = self.clone();
        hooks.on_order_created(move |ev| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move { dispatcher.order_created(ev).await })
        });
        let dispatcher = self.clone();
        hooks.on_order_confirmed(move |ev| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move { dispatcher.order_confirmed(ev).await })
        });
        let dispatcher = self.clone();
        hooks.on_order_shipped(move |ev| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move { dispatcher.order_shipped(ev).await })
        });
        let dispatcher = self.clone();
        hooks.on_payment_confirmed(move |ev| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move { dispatcher.payment_confirmed(ev).await })
        });
        let dispatcher = self.clone();
        hooks.on_payment_approved(move |ev| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move { dispatcher.payment_approved(ev).await })
        });
        hooks
    }

    /// SUCCESS to the buyer, ORDER_UPDATE to the supplier, and an email to the supplier.
    pub async fn order_created(&self, event: OrderCreatedEvent) {
        let OrderCreatedEvent { order, buyer, supplier } = event;
        let (product_name, quantity) = first_line(&order);
        let mut buyer_note = NewNotification::new(
            buyer.id,
            "Order Placed".to_string(),
            format!("Order {} has been placed. The supplier will process it shortly.", order.id),
            NotificationType::Success,
        )
        .for_order(order.id);
        let mut supplier_note = NewNotification::new(
            supplier.id,
            "New Order".to_string(),
            format!("You have a new order {} from {}: {product_name} x{quantity}.", order.id, buyer.username),
            NotificationType::OrderUpdate,
        )
        .for_order(order.id);
        if !order.items.is_empty() {
            buyer_note = buyer_note.with_product(product_name.clone(), quantity);
            supplier_note = supplier_note.with_product(product_name.clone(), quantity);
        }
        self.notify(buyer_note).await;
        self.notify(supplier_note).await;
        let subject = format!("New Order {}", order.id);
        let body = format!(
            "<p>Hello {},</p><p>{} ordered {quantity} x {product_name}.</p><p>Order total: {}</p>",
            supplier.display_name(),
            buyer.username,
            order.total
        );
        self.email(&supplier, &subject, &body).await;
    }

    pub async fn order_confirmed(&self, event: OrderConfirmedEvent) {
        let OrderConfirmedEvent { order, buyer, estimated_shipping } = event;
        let note = NewNotification::new(
            buyer.id,
            "Order Confirmed".to_string(),
            format!(
                "Order {} has been confirmed by the supplier. Estimated shipping: {estimated_shipping}",
                order.id
            ),
            NotificationType::OrderUpdate,
        )
        .for_order(order.id);
        self.notify(note).await;
        let subject = format!("Order Confirmed {}", order.id);
        let body = format!("<p>Your order {} has been confirmed.</p><p>Estimated shipping: {estimated_shipping}</p>", order.id);
        self.email(&buyer, &subject, &body).await;
    }

    pub async fn order_shipped(&self, event: OrderShippedEvent) {
        let OrderShippedEvent { order, buyer, tracking_number, estimated_delivery } = event;
        let note = NewNotification::new(
            buyer.id,
            "Order Shipped".to_string(),
            format!(
                "Order {} has been shipped. Tracking number: {tracking_number}. Estimated arrival: {estimated_delivery}",
                order.id
            ),
            NotificationType::ShippingUpdate,
        )
        .for_order(order.id);
        self.notify(note).await;
        let subject = format!("Order Shipped {}", order.id);
        let body = format!(
            "<p>Your order {} is on its way.</p><p>Tracking number: {tracking_number}</p><p>Estimated arrival: \
             {estimated_delivery}</p>",
            order.id
        );
        self.email(&buyer, &subject, &body).await;
    }

    /// PAYMENT_CONFIRMED to both parties, and an email to the buyer.
    pub async fn payment_confirmed(&self, event: PaymentConfirmedEvent) {
        let PaymentConfirmedEvent { order, buyer, supplier } = event;
        let method = order.payment_method.map(|m| m.to_string()).unwrap_or_else(|| "UNSPECIFIED".to_string());
        let buyer_note = NewNotification::new(
            buyer.id,
            "Payment Confirmed".to_string(),
            format!("A payment of {} for order {} has been confirmed.", order.total, order.id),
            NotificationType::PaymentConfirmed,
        )
        .for_order(order.id);
        let supplier_note = NewNotification::new(
            supplier.id,
            "Payment Received".to_string(),
            format!("A payment of {} for order {} has been received via {method}.", order.total, order.id),
            NotificationType::PaymentConfirmed,
        )
        .for_order(order.id);
        self.notify(buyer_note).await;
        self.notify(supplier_note).await;
        let subject = format!("Payment Confirmed {}", order.id);
        let body = format!("<p>We have recorded your payment of {} via {method}.</p>", order.total);
        self.email(&buyer, &subject, &body).await;
    }

    pub async fn payment_approved(&self, event: PaymentApprovedEvent) {
        let PaymentApprovedEvent { order, buyer } = event;
        let note = NewNotification::new(
            buyer.id,
            "Payment Approved".to_string(),
            format!("A payment of {} for order {} has been approved.", order.total, order.id),
            NotificationType::PaymentConfirmed,
        )
        .for_order(order.id);
        self.notify(note).await;
        let subject = format!("Payment Approved {}", order.id);
        let body = format!("<p>The supplier has approved your payment of {} for order {}.</p>", order.total, order.id);
        self.email(&buyer, &subject, &body).await;
    }

    async fn notify(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        match self.db.insert_notification(notification).await {
            Ok(n) => trace!("🔔️ Notification {} sent to {user_id}", n.id),
            Err(e) => warn!("🔔️ Could not store notification for {user_id}: {e}"),
        }
    }

    async fn email(&self, to: &User, subject: &str, body: &str) {
        if to.email.trim().is_empty() {
            warn!("🔔️ {} has no email address. '{subject}' was not sent", to.id);
            return;
        }
        if let Err(e) = self.mailer.send(&to.email, subject, body).await {
            warn!("🔔️ Could not email {} about '{subject}': {e}", to.id);
        }
    }
}

/// The product name and quantity of the order's first line, for the summary in new-order messages.
fn first_line(order: &Order) -> (String, i64) {
    order.items.first().map(|i| (i.product_name.clone(), i.quantity)).unwrap_or_else(|| ("items".to_string(), 0))
}
