use cucumber::{then, when};
use marketplace_engine::{
    db_types::{LineItem, Money, OrderStatusType, PaymentMethod, ShippingMethod},
    order_objects::CheckoutRequest,
    CatalogManagement,
};

use crate::cucumber::MarketWorld;

#[when(expr = "{word} orders {int} x {string}")]
async fn place_order(world: &mut MarketWorld, buyer: String, quantity: i64, product: String) {
    let buyer_id = world.user(&buyer).id;
    let item = LineItem::at_catalog_price(world.product(&product), quantity);
    let result = world.system().orders.create_order(buyer_id, vec![item]).await;
    world.record(result);
}

#[when(expr = "{word} adds {int} x {string} to the cart")]
async fn add_to_cart(world: &mut MarketWorld, buyer: String, quantity: i64, product: String) {
    let buyer_id = world.user(&buyer).id;
    let product_id = world.product(&product).id;
    world.system().cart.add(buyer_id, product_id, quantity).await.expect("Error adding to cart");
}

#[when(expr = "{word} checks out with {word} shipping")]
async fn checkout(world: &mut MarketWorld, buyer: String, shipping: String) {
    let buyer_id = world.user(&buyer).id;
    let method = shipping.parse::<ShippingMethod>().expect("Unknown shipping method");
    let request = CheckoutRequest::new(PaymentMethod::BankTransfer, method);
    match world.system().orders.checkout(buyer_id, request).await {
        Ok(orders) => {
            world.last_order = orders.last().cloned();
            world.last_checkout = orders;
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "the order is moved to {word}")]
async fn move_order(world: &mut MarketWorld, status: String) {
    let status = status.parse::<OrderStatusType>().expect("Unknown order status");
    let id = world.last_order().id;
    let result = world.system().orders.update_order_status(id, status).await;
    world.record(result);
}

#[when(expr = "{word} cancels the order")]
async fn cancel_order(world: &mut MarketWorld, requester: String) {
    let requester_id = world.user(&requester).id;
    let id = world.last_order().id;
    let result = world.system().orders.cancel_order(id, requester_id).await;
    world.record(result);
}

#[when(expr = "{word} pays for the order")]
async fn pay_for_order(world: &mut MarketWorld, buyer: String) {
    let buyer_id = world.user(&buyer).id;
    let id = world.last_order().id;
    let result = world.system().orders.confirm_payment(id, buyer_id).await;
    world.record(result);
}

#[then(expr = "the order total is {int}")]
async fn check_total(world: &mut MarketWorld, total: i64) {
    assert_eq!(world.last_order().total, Money::from(total), "Order total is incorrect");
}

#[then(expr = "the order status is {word}")]
async fn check_status(world: &mut MarketWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Unknown order status");
    let id = world.last_order().id;
    let order = world.system().orders.order_by_id(id).await.expect("Error fetching order").expect("Order not found");
    assert_eq!(order.status, expected);
}

#[then(expr = "the stock of {string} is {int}")]
async fn check_stock(world: &mut MarketWorld, product: String, stock: i64) {
    let id = world.product(&product).id;
    let product = world.system().db.fetch_product(id).await.expect("Error fetching product").expect("No product");
    assert_eq!(product.stock_quantity, stock, "Stock level is incorrect");
}

#[then(expr = "the request fails with {string}")]
async fn check_failure(world: &mut MarketWorld, message: String) {
    let error = world.last_error.as_deref().expect("The request succeeded");
    assert!(error.contains(&message), "Expected '{message}' in '{error}'");
}

#[then(expr = "{word} has {int} orders")]
async fn check_order_count(world: &mut MarketWorld, buyer: String, count: usize) {
    let buyer_id = world.user(&buyer).id;
    let orders = world.system().orders.orders_for_buyer(buyer_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the checkout created {int} orders")]
async fn check_checkout_count(world: &mut MarketWorld, count: usize) {
    assert_eq!(world.last_checkout.len(), count);
}

#[then(expr = "the cart of {word} is empty")]
async fn check_cart_empty(world: &mut MarketWorld, buyer: String) {
    let buyer_id = world.user(&buyer).id;
    let cart = world.system().cart.cart(buyer_id).await.expect("Error fetching cart");
    assert!(cart.is_empty(), "Cart still has {} rows", cart.item_count());
}
