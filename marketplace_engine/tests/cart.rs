use marketplace_engine::{db_types::Money, CartApi, CartApiError, SqliteDatabase, ValidationError};

use crate::support::prepare_env::{seed_marketplace, tear_down, Marketplace};

mod support;

async fn setup() -> (Marketplace, CartApi<SqliteDatabase>) {
    let mkt = seed_marketplace().await;
    let api = CartApi::new(mkt.db.clone());
    (mkt, api)
}

#[tokio::test]
async fn adding_a_product_twice_increases_the_quantity() {
    let (mkt, api) = setup().await;
    let item = api.add(mkt.siti.id, mkt.batik_shirt.id, 1).await.expect("Error adding to cart");
    assert_eq!(item.quantity, 1);
    assert_eq!(item.unit_price, Money::from(150_000));
    assert_eq!(item.supplier_id, mkt.batik_house.id);
    let item = api.add(mkt.siti.id, mkt.batik_shirt.id, 2).await.expect("Error adding to cart");
    assert_eq!(item.quantity, 3);

    let cart = api.cart(mkt.siti.id).await.unwrap();
    assert_eq!(cart.item_count(), 1);
    assert_eq!(cart.total_quantity(), 3);
    assert_eq!(cart.total_price(), Money::from(450_000));
    tear_down(mkt.db).await;
}

#[tokio::test]
async fn carts_belong_to_buyers() {
    let (mkt, api) = setup().await;
    let err = api.add(mkt.kopi_jawa.id, mkt.batik_shirt.id, 1).await.expect_err("Suppliers have no cart");
    assert!(matches!(err, CartApiError::AuthorizationError(_)));
    let err = api.add(mkt.siti.id, 9_999.into(), 1).await.expect_err("No such product");
    assert!(matches!(err, CartApiError::ValidationError(ValidationError::ProductNotFound(_))));
    let err = api.add(mkt.siti.id, mkt.batik_shirt.id, 0).await.expect_err("Nothing to add");
    assert!(matches!(err, CartApiError::ValidationError(ValidationError::InvalidQuantity(0))));

    api.add(mkt.budi.id, mkt.silk_scarf.id, 1).await.unwrap();
    assert!(api.cart(mkt.siti.id).await.unwrap().is_empty());
    assert_eq!(api.cart(mkt.budi.id).await.unwrap().item_count(), 1);
    tear_down(mkt.db).await;
}

#[tokio::test]
async fn update_sets_or_removes() {
    let (mkt, api) = setup().await;
    api.add(mkt.siti.id, mkt.arabica_beans.id, 1).await.unwrap();
    let item = api.update(mkt.siti.id, mkt.arabica_beans.id, 4).await.unwrap().expect("Row should remain");
    assert_eq!(item.quantity, 4);

    let removed = api.update(mkt.siti.id, mkt.arabica_beans.id, 0).await.unwrap();
    assert!(removed.is_none());
    assert!(api.cart(mkt.siti.id).await.unwrap().is_empty());

    let err = api.update(mkt.siti.id, mkt.arabica_beans.id, 2).await.expect_err("Not in the cart");
    assert!(matches!(err, CartApiError::NotFoundError(_)));
    tear_down(mkt.db).await;
}

#[tokio::test]
async fn remove_and_clear() {
    let (mkt, api) = setup().await;
    api.add(mkt.siti.id, mkt.batik_shirt.id, 1).await.unwrap();
    api.add(mkt.siti.id, mkt.silk_scarf.id, 1).await.unwrap();
    api.add(mkt.siti.id, mkt.arabica_beans.id, 1).await.unwrap();
    assert!(api.remove(mkt.siti.id, mkt.silk_scarf.id).await.unwrap());
    assert!(!api.remove(mkt.siti.id, mkt.silk_scarf.id).await.unwrap());

    let cart = api.cart(mkt.siti.id).await.unwrap();
    let groups = cart.group_by_supplier();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, mkt.batik_house.id);
    assert_eq!(groups[1].0, mkt.kopi_jawa.id);

    assert_eq!(api.clear(mkt.siti.id).await.unwrap(), 2);
    assert_eq!(api.clear(mkt.siti.id).await.unwrap(), 0);
    tear_down(mkt.db).await;
}
