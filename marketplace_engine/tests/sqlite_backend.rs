use marketplace_engine::{
    db_types::{Money, NewNotification, NewOrder, NewOrderItem, NotificationType, OrderUpdate, Product, ShippingMethod},
    CartManagement,
    CatalogManagement,
    CheckoutResult,
    InsertOrderResult,
    MarketplaceConfig,
    NotificationManagement,
    OrderFlowDatabase,
    OrderManagement,
    OrderQueryFilter,
    SqliteDatabase,
};

use crate::support::prepare_env::{add_product, seed_marketplace, stock_of, tear_down};

mod support;

fn item(product: &Product, quantity: i64) -> NewOrderItem {
    NewOrderItem { product_id: product.id, product_name: product.name.clone(), quantity, unit_price: product.price }
}

#[tokio::test]
async fn inserted_rows_are_visible_to_every_connection() {
    let mkt = seed_marketplace().await;
    for i in 0..50 {
        let product = add_product(&mkt.db, &mkt.kopi_jawa, &format!("Blend {i}"), 50_000, 5).await;
        for _ in 0..3 {
            let stored = mkt.db.fetch_product(product.id).await.expect("Error fetching product");
            assert_eq!(stored.as_ref(), Some(&product));
        }
        let note = NewNotification::new(mkt.siti.id, "Restock", "A new blend is in", NotificationType::ProductUpdate);
        let note = mkt.db.insert_notification(note).await.expect("Error saving notification");
        let stored = mkt.db.fetch_notification(note.id).await.expect("Error fetching notification");
        assert_eq!(stored.map(|n| n.id), Some(note.id));
    }
    let user = mkt.db.fetch_user(mkt.budi.id).await.expect("Error fetching user");
    assert_eq!(user, Some(mkt.budi.clone()));
    assert_eq!(mkt.db.count_unread_notifications(mkt.siti.id).await.unwrap(), 50);
    tear_down(mkt.db).await;
}

#[tokio::test]
async fn checkout_orders_roll_back_together() {
    let mkt = seed_marketplace().await;
    let db = &mkt.db;
    db.add_cart_item(mkt.siti.id, mkt.batik_shirt.id, 1, mkt.batik_shirt.price).await.unwrap();
    db.add_cart_item(mkt.siti.id, mkt.arabica_beans.id, 25, mkt.arabica_beans.price).await.unwrap();
    let batik = NewOrder::new(mkt.siti.id, mkt.batik_house.id, vec![item(&mkt.batik_shirt, 1)]);
    let coffee = NewOrder::new(mkt.siti.id, mkt.kopi_jawa.id, vec![item(&mkt.arabica_beans, 25)]);
    let batch = vec![(batik, OrderUpdate::default()), (coffee, OrderUpdate::default())];

    let result = db.insert_checkout_orders(mkt.siti.id, batch).await.expect("Error running checkout");
    match result {
        CheckoutResult::InsufficientStock(shortfall) => {
            assert_eq!(shortfall.product_id, mkt.arabica_beans.id);
            assert_eq!(shortfall.available, 20);
            assert_eq!(shortfall.requested, 25);
        },
        CheckoutResult::Placed(orders) => panic!("Checkout should have failed, but placed {} orders", orders.len()),
    }
    let orders = db.fetch_orders(OrderQueryFilter::default().with_buyer_id(mkt.siti.id)).await.unwrap();
    assert!(orders.is_empty(), "The first supplier's order must not survive a failed checkout");
    assert_eq!(stock_of(db, &mkt.batik_shirt).await, 10);
    assert_eq!(stock_of(db, &mkt.arabica_beans).await, 20);
    assert_eq!(db.fetch_cart_items(mkt.siti.id).await.unwrap().len(), 2);
    tear_down(mkt.db).await;
}

#[tokio::test]
async fn checkout_orders_apply_updates_and_clear_the_cart() {
    let mkt = seed_marketplace().await;
    let db = &mkt.db;
    db.add_cart_item(mkt.siti.id, mkt.batik_shirt.id, 2, mkt.batik_shirt.price).await.unwrap();
    db.add_cart_item(mkt.siti.id, mkt.arabica_beans.id, 1, mkt.arabica_beans.price).await.unwrap();
    let batik = NewOrder::new(mkt.siti.id, mkt.batik_house.id, vec![item(&mkt.batik_shirt, 2)]);
    let coffee = NewOrder::new(mkt.siti.id, mkt.kopi_jawa.id, vec![item(&mkt.arabica_beans, 1)]);
    let batik_update = OrderUpdate::default().with_shipping(ShippingMethod::Express, batik.subtotal());
    let coffee_update = OrderUpdate::default().with_shipping(ShippingMethod::Express, coffee.subtotal());
    let batch = vec![(batik, batik_update), (coffee, coffee_update)];

    let orders = match db.insert_checkout_orders(mkt.siti.id, batch).await.expect("Error running checkout") {
        CheckoutResult::Placed(orders) => orders,
        CheckoutResult::InsufficientStock(s) => panic!("Checkout should have succeeded: {s}"),
    };
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].supplier_id, mkt.batik_house.id);
    assert_eq!(orders[0].shipping_method, Some(ShippingMethod::Express));
    assert_eq!(orders[0].total, orders[0].subtotal + ShippingMethod::Express.cost());
    assert_eq!(orders[1].supplier_id, mkt.kopi_jawa.id);
    assert_eq!(db.fetch_order(orders[1].id).await.unwrap().as_ref(), Some(&orders[1]));
    assert!(db.fetch_cart_items(mkt.siti.id).await.unwrap().is_empty());
    assert_eq!(stock_of(db, &mkt.batik_shirt).await, 8);
    assert_eq!(stock_of(db, &mkt.arabica_beans).await, 19);
    tear_down(mkt.db).await;
}

#[tokio::test]
async fn repeated_lines_are_checked_as_one_quantity() {
    let mkt = seed_marketplace().await;
    let order = NewOrder::new(mkt.siti.id, mkt.batik_house.id, vec![item(&mkt.silk_scarf, 2), item(&mkt.silk_scarf, 2)]);
    match mkt.db.insert_order(order).await.expect("Error inserting order") {
        InsertOrderResult::InsufficientStock(shortfall) => {
            assert_eq!(shortfall.product_name, "Silk Scarf");
            assert_eq!(shortfall.available, 3);
            assert_eq!(shortfall.requested, 4);
        },
        InsertOrderResult::Inserted(order) => panic!("Order {} should have been rejected", order.id),
    }
    assert_eq!(stock_of(&mkt.db, &mkt.silk_scarf).await, 3);

    let order = NewOrder::new(mkt.siti.id, mkt.batik_house.id, vec![item(&mkt.silk_scarf, 1), item(&mkt.silk_scarf, 2)]);
    let InsertOrderResult::Inserted(order) = mkt.db.insert_order(order).await.expect("Error inserting order") else {
        panic!("Order for exactly the available stock should be accepted");
    };
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.subtotal, Money::from(255_000));
    assert_eq!(stock_of(&mkt.db, &mkt.silk_scarf).await, 0);
    tear_down(mkt.db).await;
}

#[tokio::test]
async fn database_is_opened_from_the_configuration() {
    let url = support::prepare_env::random_db_path();
    let config = MarketplaceConfig { database_url: url.clone(), db_max_connections: 2, ..MarketplaceConfig::default() };
    let db = SqliteDatabase::from_config(&config).await.expect("Error opening database");
    assert_eq!(db.url(), url);
    assert_eq!(db.pool().options().get_max_connections(), 2);
    db.migrate().await.expect("Error running DB migrations");
    tear_down(db).await;
}
