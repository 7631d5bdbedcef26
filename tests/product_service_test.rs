//! Integration tests for the product service
//!
//! Tests cover:
//! - Image staging before the record write, and cleanup when the write fails
//! - Image replacement on update, with the old asset removed only on success
//! - Category liveness checks on create and update
//! - Soft deletion removing the asset while keeping the flagged row
//! - Validation messages surfacing in field order

mod common;

use assert_matches::assert_matches;
use catalog_admin::errors::CatalogError;
use catalog_admin::validation::ProductInput;
use common::{category_input, product_input, upload, TestCatalog};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed_category(catalog: &TestCatalog, name: &str) -> Uuid {
    catalog
        .categories
        .add(category_input(name))
        .await
        .expect("seed category")
        .id
}

#[tokio::test]
async fn add_requires_an_uploaded_image() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let err = catalog
        .products
        .add(product_input("Trail Boots", &category.to_string()), None)
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::MissingImage);
    assert_eq!(catalog.store.product_count(), 0);
    assert_eq!(catalog.images.asset_count(), 0);
}

#[tokio::test]
async fn add_stages_the_image_then_writes_the_record() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");

    assert!(product.image.ends_with(".png"));
    assert!(catalog.images.contains(&product.image));

    let raw = catalog.store.raw_product(product.id).expect("raw row");
    assert_eq!(raw.name, "Trail Boots");
    assert_eq!(raw.category_id, category);
    assert_eq!(raw.price, dec!(19.99));
    assert!(!raw.is_deleted);
}

#[tokio::test]
async fn add_removes_the_staged_image_when_the_insert_fails() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    catalog.flaky.fail_next_product_insert();

    let err = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::PersistenceError(_));
    // The staged asset was rolled back along with the failed write.
    assert_eq!(catalog.images.asset_count(), 0);
    assert_eq!(catalog.store.product_count(), 0);
}

#[tokio::test]
async fn add_with_unknown_category_cleans_up_the_staged_image() {
    let catalog = TestCatalog::new();

    let err = catalog
        .products
        .add(
            product_input("Trail Boots", &Uuid::new_v4().to_string()),
            Some(upload("boots.png")),
        )
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::InvalidCategory(_));
    assert_eq!(catalog.images.asset_count(), 0);
}

#[tokio::test]
async fn add_into_soft_deleted_category_is_rejected() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;
    catalog
        .categories
        .remove(category)
        .await
        .expect("remove category");

    let err = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::InvalidCategory(_));
    assert_eq!(catalog.images.asset_count(), 0);
}

#[tokio::test]
async fn price_is_normalized_to_two_decimal_places() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let mut input = product_input("Trail Boots", &category.to_string());
    input.price = "10.005".into();

    let product = catalog
        .products
        .add(input, Some(upload("boots.png")))
        .await
        .expect("create product");

    let raw = catalog.store.raw_product(product.id).expect("raw row");
    assert_eq!(raw.price, dec!(10.01));
}

#[tokio::test]
async fn update_swaps_the_image_assets() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");
    let old_image = product.image.clone();

    let updated = catalog
        .products
        .update(
            product.id,
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots-v2.jpg")),
        )
        .await
        .expect("update product");

    assert!(updated.image.ends_with(".jpg"));
    assert!(catalog.images.contains(&updated.image));
    assert!(!catalog.images.contains(&old_image));
    assert_eq!(catalog.images.asset_count(), 1);
}

#[tokio::test]
async fn update_without_upload_keeps_the_image() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");

    let mut input = product_input("Summit Boots", &category.to_string());
    input.price = "129.00".into();

    let updated = catalog
        .products
        .update(product.id, input, None)
        .await
        .expect("update product");

    assert_eq!(updated.name, "Summit Boots");
    assert_eq!(updated.price, dec!(129.00));
    assert_eq!(updated.image, product.image);
    assert!(catalog.images.contains(&product.image));
}

#[tokio::test]
async fn update_failure_keeps_the_record_and_its_image() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");

    catalog.flaky.fail_next_product_update();

    let err = catalog
        .products
        .update(
            product.id,
            product_input("Summit Boots", &category.to_string()),
            Some(upload("boots-v2.jpg")),
        )
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::PersistenceError(_));

    // The staged replacement is gone; the record still points at the
    // original asset and keeps its original fields.
    assert_eq!(catalog.images.asset_count(), 1);
    assert!(catalog.images.contains(&product.image));

    let raw = catalog.store.raw_product(product.id).expect("raw row");
    assert_eq!(raw.name, "Trail Boots");
    assert_eq!(raw.image, product.image);
}

#[tokio::test]
async fn update_unknown_product_stages_nothing() {
    let catalog = TestCatalog::new();

    let err = catalog
        .products
        .update(
            Uuid::new_v4(),
            product_input("Trail Boots", &Uuid::new_v4().to_string()),
            Some(upload("boots.png")),
        )
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::NotFound(_));
    assert_eq!(catalog.images.asset_count(), 0);
}

#[tokio::test]
async fn update_into_soft_deleted_category_is_rejected() {
    let catalog = TestCatalog::new();
    let shoes = seed_category(&catalog, "Shoes").await;
    let retired = seed_category(&catalog, "Retired").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &shoes.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");

    catalog
        .categories
        .remove(retired)
        .await
        .expect("remove category");

    let err = catalog
        .products
        .update(
            product.id,
            product_input("Trail Boots", &retired.to_string()),
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::InvalidCategory(_));

    let raw = catalog.store.raw_product(product.id).expect("raw row");
    assert_eq!(raw.category_id, shoes);
}

#[tokio::test]
async fn remove_deletes_the_image_and_hides_the_record() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");

    catalog
        .products
        .remove(product.id)
        .await
        .expect("remove product");

    assert_eq!(catalog.images.asset_count(), 0);
    assert!(catalog
        .products
        .list()
        .await
        .expect("list after remove")
        .is_empty());

    let err = catalog.products.get(product.id).await.unwrap_err();
    assert_matches!(err, CatalogError::NotFound(_));

    // The flagged row keeps its data, including the asset name it once had.
    let raw = catalog.store.raw_product(product.id).expect("raw row");
    assert!(raw.is_deleted);
    assert_eq!(raw.image, product.image);
}

#[tokio::test]
async fn removing_twice_reports_not_found() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");

    catalog
        .products
        .remove(product.id)
        .await
        .expect("first remove");

    let err = catalog.products.remove(product.id).await.unwrap_err();
    assert_matches!(err, CatalogError::NotFound(_));
}

#[tokio::test]
async fn listing_resolves_the_category_after_it_is_deleted() {
    let catalog = TestCatalog::new();
    let category = seed_category(&catalog, "Shoes").await;

    let product = catalog
        .products
        .add(
            product_input("Trail Boots", &category.to_string()),
            Some(upload("boots.png")),
        )
        .await
        .expect("create product");

    catalog
        .categories
        .remove(category)
        .await
        .expect("remove category");

    let listed = catalog.products.list().await.expect("list products");
    assert_eq!(listed.len(), 1);
    let resolved = listed[0].category.as_ref().expect("category resolves");
    assert_eq!(resolved.name, "Shoes");
    assert!(resolved.is_deleted);

    let fetched = catalog.products.get(product.id).await.expect("get product");
    assert!(fetched.category.is_some());
}

#[tokio::test]
async fn validation_messages_follow_field_order() {
    let catalog = TestCatalog::new();

    let input = ProductInput {
        name: "X".into(),
        category: "".into(),
        description: "too short".into(),
        price: "-2".into(),
    };

    let err = catalog
        .products
        .add(input, Some(upload("boots.png")))
        .await
        .unwrap_err();

    assert_matches!(err, CatalogError::ValidationFailed(messages) => {
        assert_eq!(
            messages,
            vec![
                "Product name must be at least 2 characters long".to_string(),
                "Category is required".to_string(),
                "Description must be at least 10 characters long".to_string(),
                "Price must be greater than 0".to_string(),
            ]
        );
    });
    assert_eq!(catalog.images.asset_count(), 0);
}
