//! Basket engine behavior against the in-process store.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use boutique::catalog::MemoryCatalog;
use boutique::domain::product::{Color, Product, Size};
use boutique::service::basket::{AddItemOutcome, AddItemRequest, BasketService, BasketView};
use boutique::store::MemoryBasketStore;
use boutique::Error;

fn product(price: Decimal, colors: &[Color], sizes: &[Size]) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: "Test Product".into(),
        slug: format!("test-product-{}", Uuid::new_v4()),
        description: None,
        price,
        colors: colors.to_vec(),
        sizes: sizes.to_vec(),
        category_id: Uuid::new_v4(),
        brand_id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

fn tenner() -> Product {
    product(Decimal::new(1000, 2), &[Color::Red], &[Size::M])
}

fn service(
    products: impl IntoIterator<Item = Product>,
) -> BasketService<MemoryBasketStore, MemoryCatalog> {
    BasketService::new(MemoryBasketStore::new(), MemoryCatalog::new(products))
}

fn add(color: Color, size: Size, quantity: i32) -> AddItemRequest {
    AddItemRequest {
        color,
        size,
        quantity,
    }
}

/// The cached totals must equal the sums over the returned lines.
fn assert_totals_match(view: &BasketView) {
    let quantity: i32 = view.items.iter().map(|i| i.quantity).sum();
    let price: Decimal = view.items.iter().map(|i| i.price).sum();
    assert_eq!(view.total_items, quantity);
    assert_eq!(view.total_price, price);
}

#[tokio::test]
async fn get_basket_for_unknown_user_is_not_found() {
    let svc = service([tenner()]);
    let err = svc.get_basket(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::BasketNotFound));
}

#[tokio::test]
async fn first_add_prices_line_as_unit_times_quantity() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    let outcome = svc
        .add_item(user, p.id, add(Color::Red, Size::M, 3))
        .await
        .unwrap();
    let item = match outcome {
        AddItemOutcome::Upserted(item) => item,
        other => panic!("expected upsert, got {other:?}"),
    };
    assert_eq!(item.quantity, 3);
    assert_eq!(item.price, Decimal::new(3000, 2));

    let view = svc.get_basket(user).await.unwrap();
    assert_eq!(view.total_items, 3);
    assert_eq!(view.total_price, Decimal::new(3000, 2));
    assert_totals_match(&view);

    svc.remove_item(user, item.id).await.unwrap();
    let view = svc.get_basket(user).await.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.total_items, 0);
    assert_eq!(view.total_price, Decimal::ZERO);
}

#[tokio::test]
async fn merge_add_prices_line_as_unit_times_quantity() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    svc.add_item(user, p.id, add(Color::Red, Size::M, 2))
        .await
        .unwrap();
    let outcome = svc
        .add_item(user, p.id, add(Color::Red, Size::M, 3))
        .await
        .unwrap();
    let item = match outcome {
        AddItemOutcome::Upserted(item) => item,
        other => panic!("expected upsert, got {other:?}"),
    };
    assert_eq!(item.quantity, 5);
    assert_eq!(item.price, Decimal::new(5000, 2));

    let view = svc.get_basket(user).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.total_items, 5);
    assert_eq!(view.total_price, Decimal::new(5000, 2));
    assert_totals_match(&view);
}

#[tokio::test]
async fn negative_delta_decrements_in_place() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    svc.add_item(user, p.id, add(Color::Red, Size::M, 5))
        .await
        .unwrap();
    let outcome = svc
        .add_item(user, p.id, add(Color::Red, Size::M, -2))
        .await
        .unwrap();
    let item = match outcome {
        AddItemOutcome::Upserted(item) => item,
        other => panic!("expected upsert, got {other:?}"),
    };
    assert_eq!(item.quantity, 3);
    assert_eq!(item.price, Decimal::new(3000, 2));

    let view = svc.get_basket(user).await.unwrap();
    assert_totals_match(&view);
}

#[tokio::test]
async fn merge_cancel_deletes_line_and_restores_totals() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    svc.add_item(user, p.id, add(Color::Red, Size::M, 2))
        .await
        .unwrap();
    let outcome = svc
        .add_item(user, p.id, add(Color::Red, Size::M, -2))
        .await
        .unwrap();
    assert!(matches!(outcome, AddItemOutcome::Removed { .. }));

    let view = svc.get_basket(user).await.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.total_items, 0);
    assert_eq!(view.total_price, Decimal::ZERO);
}

#[tokio::test]
async fn decrement_past_zero_deletes_rather_than_storing_negative() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    svc.add_item(user, p.id, add(Color::Red, Size::M, 1))
        .await
        .unwrap();
    let outcome = svc
        .add_item(user, p.id, add(Color::Red, Size::M, -5))
        .await
        .unwrap();
    assert!(matches!(outcome, AddItemOutcome::Removed { .. }));

    let view = svc.get_basket(user).await.unwrap();
    assert!(view.items.is_empty());
    assert_totals_match(&view);
}

#[tokio::test]
async fn invalid_color_is_rejected_without_writes() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    let err = svc
        .add_item(user, p.id, add(Color::Green, Size::M, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidColor(Color::Green)));

    // The transaction rolled back, so not even the lazily-created basket
    // row survives the failed add.
    let err = svc.get_basket(user).await.unwrap_err();
    assert!(matches!(err, Error::BasketNotFound));
}

#[tokio::test]
async fn invalid_size_is_rejected_without_writes() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    let err = svc
        .add_item(user, p.id, add(Color::Red, Size::Xxl, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSize(Size::Xxl)));
    assert!(matches!(
        svc.get_basket(user).await.unwrap_err(),
        Error::BasketNotFound
    ));
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let svc = service([tenner()]);
    let err = svc
        .add_item(Uuid::new_v4(), Uuid::new_v4(), add(Color::Red, Size::M, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProductNotFound));
}

#[tokio::test]
async fn first_add_with_non_positive_delta_is_rejected() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    for quantity in [0, -3] {
        let err = svc
            .add_item(user, p.id, add(Color::Red, Size::M, quantity))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuantity));
    }
    assert!(matches!(
        svc.get_basket(user).await.unwrap_err(),
        Error::BasketNotFound
    ));
}

#[tokio::test]
async fn distinct_variants_of_one_product_are_separate_lines() {
    let p = product(
        Decimal::new(1500, 2),
        &[Color::Red, Color::Blue],
        &[Size::M, Size::L],
    );
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    svc.add_item(user, p.id, add(Color::Red, Size::M, 1))
        .await
        .unwrap();
    svc.add_item(user, p.id, add(Color::Blue, Size::M, 2))
        .await
        .unwrap();
    svc.add_item(user, p.id, add(Color::Red, Size::L, 1))
        .await
        .unwrap();
    // Repeat of an existing key merges instead of adding a fourth line.
    svc.add_item(user, p.id, add(Color::Blue, Size::M, 1))
        .await
        .unwrap();

    let view = svc.get_basket(user).await.unwrap();
    assert_eq!(view.items.len(), 3);
    assert_eq!(view.total_items, 5);
    assert_totals_match(&view);
}

#[tokio::test]
async fn remove_item_requires_an_existing_basket_and_item() {
    let p = tenner();
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    let err = svc.remove_item(user, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::BasketNotFound));

    let outcome = svc
        .add_item(user, p.id, add(Color::Red, Size::M, 1))
        .await
        .unwrap();
    let item = match outcome {
        AddItemOutcome::Upserted(item) => item,
        other => panic!("expected upsert, got {other:?}"),
    };

    let err = svc.remove_item(user, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::BasketItemNotFound));

    // Another user's basket does not see the item either.
    let other_user = Uuid::new_v4();
    svc.add_item(other_user, p.id, add(Color::Red, Size::M, 1))
        .await
        .unwrap();
    let err = svc.remove_item(other_user, item.id).await.unwrap_err();
    assert!(matches!(err, Error::BasketItemNotFound));

    svc.remove_item(user, item.id).await.unwrap();
    let err = svc.remove_item(user, item.id).await.unwrap_err();
    assert!(matches!(err, Error::BasketItemNotFound));
}

#[tokio::test]
async fn basket_view_narrows_product_to_selected_variant() {
    let p = product(
        Decimal::new(2000, 2),
        &[Color::Red, Color::Blue],
        &[Size::M, Size::L],
    );
    let svc = service([p.clone()]);
    let user = Uuid::new_v4();

    svc.add_item(user, p.id, add(Color::Blue, Size::L, 1))
        .await
        .unwrap();

    let view = svc.get_basket(user).await.unwrap();
    let line = &view.items[0];
    assert_eq!(line.product.id, p.id);
    assert_eq!(line.product.colors, vec![Color::Blue]);
    assert_eq!(line.product.sizes, vec![Size::L]);
}

#[tokio::test]
async fn concurrent_first_adds_share_one_basket_without_lost_updates() {
    let p1 = product(Decimal::new(1000, 2), &[Color::Red], &[Size::M]);
    let p2 = product(Decimal::new(2500, 2), &[Color::Black], &[Size::L]);
    let svc = Arc::new(service([p1.clone(), p2.clone()]));
    let user = Uuid::new_v4();

    let a = tokio::spawn({
        let svc = Arc::clone(&svc);
        async move {
            svc.add_item(user, p1.id, add(Color::Red, Size::M, 1))
                .await
                .unwrap()
        }
    });
    let b = tokio::spawn({
        let svc = Arc::clone(&svc);
        async move {
            svc.add_item(user, p2.id, add(Color::Black, Size::L, 1))
                .await
                .unwrap()
        }
    });
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let (a, b) = match (a, b) {
        (AddItemOutcome::Upserted(a), AddItemOutcome::Upserted(b)) => (a, b),
        other => panic!("expected two upserts, got {other:?}"),
    };
    // Both first-adds resolved the same basket row.
    assert_eq!(a.basket_id, b.basket_id);

    let view = svc.get_basket(user).await.unwrap();
    assert_eq!(view.id, a.basket_id);
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.total_items, 2);
    assert_eq!(view.total_price, Decimal::new(3500, 2));
    assert_totals_match(&view);
}
