use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pimsync_assets::AssetStore;
use pimsync_core::{LocalizedContent, SiteKey, SiteMap};

use super::*;
use crate::test_support::mock_client;

fn com() -> SiteKey {
    SiteKey::from("com")
}

fn home_shirt() -> Product {
    Product {
        sku: "RM-2425-HOM-A3X7K".to_owned(),
        name: Some("Real Madrid Home Shirt 24/25".to_owned()),
        categories: vec!["Real Madrid".to_owned()],
        attributes: ProductAttributes {
            team: Some("Real Madrid".to_owned()),
            season: Some("24/25".to_owned()),
            gender: Some("Men's".to_owned()),
            ..ProductAttributes::default()
        },
        remote_ids: SiteMap::single(com(), 9),
        prices: SiteMap::single(com(), Decimal::new(2999, 2)),
        stock_quantities: SiteMap::single(com(), 100),
        stock_statuses: SiteMap::single(com(), "instock".to_owned()),
        statuses: SiteMap::single(com(), "publish".to_owned()),
        content: SiteMap::single(
            com(),
            LocalizedContent {
                name: "Real Madrid Home Shirt 24/25".to_owned(),
                description: "The 24/25 home shirt.".to_owned(),
                short_description: "Home shirt.".to_owned(),
            },
        ),
        ..Product::default()
    }
}

/// Remote state exactly matching [`home_shirt`] on the `com` site.
fn converged_remote() -> serde_json::Value {
    json!({
        "id": 9,
        "sku": "RM-2425-HOM-A3X7K",
        "name": "Real Madrid Home Shirt 24/25",
        "type": "variable",
        "status": "publish",
        "sale_price": "29.99",
        "regular_price": "59.98",
        "stock_quantity": 100,
        "stock_status": "instock",
        "description": "The 24/25 home shirt.",
        "short_description": "Home shirt.",
        "categories": [{"id": 7, "name": "Real Madrid"}]
    })
}

fn store(server: &MockServer) -> AssetStore {
    AssetStore::new(&format!("{}/storage/v1", server.uri()), "product-images", "svc_test")
        .unwrap()
}

async fn mount_category(server: &MockServer, name: &str, id: i64) {
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/categories"))
        .and(query_param("search", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": id, "name": name}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn converged_product_produces_no_write() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(converged_remote()))
        .expect(1)
        .mount(&server)
        .await;
    mount_category(&server, "Real Madrid", 7).await;
    // Idempotence: a second identical run must not write anything.
    Mock::given(method("PUT"))
        .and(path_regex(r"^/wp-json/wc/v3/products/\d+$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let assets = store(&server);
    let categories = CategoryCache::new();
    let reconciler = Reconciler {
        client: &client,
        assets: &assets,
        categories: &categories,
    };

    let push = reconciler
        .push(&home_shirt(), FieldSelection::default())
        .await
        .unwrap();

    assert_eq!(push.outcome, SyncOutcome::Skipped { remote_id: 9 });
    assert!(push.variations.is_none());
}

#[tokio::test]
async fn product_created_out_of_band_is_linked_not_duplicated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("sku", "RM-2425-HOM-A3X7K"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 77, "name": "Real Madrid Home Shirt 24/25"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json({
            let mut remote = converged_remote();
            remote["id"] = json!(77);
            remote
        }))
        .expect(1)
        .mount(&server)
        .await;
    mount_category(&server, "Real Madrid", 7).await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let assets = store(&server);
    let categories = CategoryCache::new();
    let reconciler = Reconciler {
        client: &client,
        assets: &assets,
        categories: &categories,
    };

    let mut product = home_shirt();
    product.remote_ids = SiteMap::default();

    let push = reconciler
        .push(&product, FieldSelection::default())
        .await
        .unwrap();

    assert_eq!(push.outcome, SyncOutcome::Skipped { remote_id: 77 });
}

#[tokio::test]
async fn absent_product_is_created_with_its_size_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("sku", "RM-2425-HOM-A3X7K"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    mount_category(&server, "Real Madrid", 7).await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products"))
        .and(body_partial_json(json!({
            "sku": "RM-2425-HOM-A3X7K",
            "type": "variable",
            "sale_price": "29.99",
            "regular_price": "59.98",
            "categories": [{"id": 7}]
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 501, "type": "variable", "sku": "RM-2425-HOM-A3X7K"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/501/variations/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "create": [
                {"id": 1, "sku": "RM-2425-HOM-A3X7K-S"},
                {"id": 2, "sku": "RM-2425-HOM-A3X7K-M"},
                {"id": 3, "sku": "RM-2425-HOM-A3X7K-L"},
                {"id": 4, "sku": "RM-2425-HOM-A3X7K-XL"},
                {"id": 5, "sku": "RM-2425-HOM-A3X7K-2XL"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let assets = store(&server);
    let categories = CategoryCache::new();
    let reconciler = Reconciler {
        client: &client,
        assets: &assets,
        categories: &categories,
    };

    let mut product = home_shirt();
    product.remote_ids = SiteMap::default();

    let push = reconciler
        .push(&product, FieldSelection::default())
        .await
        .unwrap();

    assert_eq!(push.outcome, SyncOutcome::Created { remote_id: 501 });
    assert_eq!(push.variations.unwrap().len(), 5);
}

#[tokio::test]
async fn stale_remote_id_falls_back_to_sku_resolution() {
    let server = MockServer::start().await;

    // The recorded id 9 is gone; the product was recreated remotely as 88.
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/9"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("sku", "RM-2425-HOM-A3X7K"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 88, "name": "x"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/88"))
        .respond_with(ResponseTemplate::new(200).set_body_json({
            let mut remote = converged_remote();
            remote["id"] = json!(88);
            remote
        }))
        .expect(1)
        .mount(&server)
        .await;
    mount_category(&server, "Real Madrid", 7).await;

    let client = mock_client("com", &server);
    let assets = store(&server);
    let categories = CategoryCache::new();
    let reconciler = Reconciler {
        client: &client,
        assets: &assets,
        categories: &categories,
    };

    let push = reconciler
        .push(&home_shirt(), FieldSelection::default())
        .await
        .unwrap();

    assert_eq!(push.outcome, SyncOutcome::Skipped { remote_id: 88 });
}

#[tokio::test]
async fn price_drift_is_fixed_through_variations_not_the_parent() {
    let server = MockServer::start().await;

    let mut remote = converged_remote();
    remote["sale_price"] = json!("24.99");
    remote["regular_price"] = json!("49.98");
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote))
        .expect(1)
        .mount(&server)
        .await;
    mount_category(&server, "Real Madrid", 7).await;
    // Prices live on the variations; the parent product is not written at all.
    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/products/9"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/9/variations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 41}, {"id": 42}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/9/variations/batch"))
        .and(body_partial_json(json!({
            "update": [{"id": 41, "sale_price": "29.99"}, {"id": 42, "sale_price": "29.99"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "update": [{"id": 41, "sale_price": "29.99"}, {"id": 42, "sale_price": "29.99"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let assets = store(&server);
    let categories = CategoryCache::new();
    let reconciler = Reconciler {
        client: &client,
        assets: &assets,
        categories: &categories,
    };

    let push = reconciler
        .push(&home_shirt(), FieldSelection::default())
        .await
        .unwrap();

    assert_eq!(push.outcome, SyncOutcome::Updated { remote_id: 9 });
    assert_eq!(push.variations.unwrap().len(), 2);
}

/// Mounts the full relocation flow for one source image: absent on the first
/// existence check, downloadable, uploadable, and verifying as a jpeg after.
async fn mount_relocation(server: &MockServer, object: &str) {
    Mock::given(method("HEAD"))
        .and(path(format!(
            "/storage/v1/object/public/product-images/{object}"
        )))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(format!(
            "/storage/v1/object/public/product-images/{object}"
        )))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cdn/shirt.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/storage/v1/object/product-images/{object}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn staging_copies_are_purged_after_a_successful_create() {
    let server = MockServer::start().await;

    let source = format!("{}/cdn/shirt.jpg", server.uri());
    let object = AssetStore::object_path(&source);
    mount_relocation(&server, &object).await;

    // Once the site has ingested the image, the staging copy is deleted.
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/product-images"))
        .and(body_partial_json(json!({ "prefixes": [object.clone()] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("sku", "RM-2425-HOM-A3X7K"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_category(&server, "Real Madrid", 7).await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 502, "type": "variable", "sku": "RM-2425-HOM-A3X7K"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/502/variations/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "create": [{"id": 1, "sku": "RM-2425-HOM-A3X7K-S"}]
        })))
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let assets = store(&server);
    let categories = CategoryCache::new();
    let reconciler = Reconciler {
        client: &client,
        assets: &assets,
        categories: &categories,
    };

    let mut product = home_shirt();
    product.remote_ids = SiteMap::default();
    product.images = vec![source];

    let push = reconciler
        .push(&product, FieldSelection::all())
        .await
        .unwrap();

    assert_eq!(push.outcome, SyncOutcome::Created { remote_id: 502 });
}

#[tokio::test]
async fn failed_create_leaves_staging_copies_in_place() {
    let server = MockServer::start().await;

    let source = format!("{}/cdn/shirt.jpg", server.uri());
    let object = AssetStore::object_path(&source);
    mount_relocation(&server, &object).await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/product-images"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("sku", "RM-2425-HOM-A3X7K"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_category(&server, "Real Madrid", 7).await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "rejected"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let assets = store(&server);
    let categories = CategoryCache::new();
    let reconciler = Reconciler {
        client: &client,
        assets: &assets,
        categories: &categories,
    };

    let mut product = home_shirt();
    product.remote_ids = SiteMap::default();
    product.images = vec![source];

    let result = reconciler.push(&product, FieldSelection::all()).await;
    assert!(result.is_err());
}

#[test]
fn diff_is_empty_when_remote_matches() {
    let remote: RemoteProduct = serde_json::from_value(converged_remote()).unwrap();
    let payload = diff_fields(&home_shirt(), &remote, &com(), FieldSelection::default());
    assert!(payload.is_empty());
}

#[test]
fn diff_reports_only_the_drifted_field() {
    let mut remote_value = converged_remote();
    remote_value["stock_quantity"] = json!(3);
    let remote: RemoteProduct = serde_json::from_value(remote_value).unwrap();

    let payload = diff_fields(&home_shirt(), &remote, &com(), FieldSelection::default());

    assert_eq!(payload.stock_quantity, Some(100));
    assert!(payload.name.is_none());
    assert!(payload.sale_price.is_none());
    assert!(payload.status.is_none());
}

#[test]
fn diff_honors_the_field_selection() {
    let mut remote_value = converged_remote();
    remote_value["stock_quantity"] = json!(3);
    remote_value["name"] = json!("Stale name");
    let remote: RemoteProduct = serde_json::from_value(remote_value).unwrap();

    let only_stock: FieldSelection = "stock".parse().unwrap();
    let payload = diff_fields(&home_shirt(), &remote, &com(), only_stock);

    assert_eq!(payload.stock_quantity, Some(100));
    assert!(payload.name.is_none());
}

#[test]
fn price_drift_never_lands_in_the_parent_payload() {
    let mut remote_value = converged_remote();
    remote_value["sale_price"] = json!("19.99");
    let remote: RemoteProduct = serde_json::from_value(remote_value).unwrap();

    let payload = diff_fields(&home_shirt(), &remote, &com(), FieldSelection::default());

    assert!(payload.sale_price.is_none());
    assert!(payload.regular_price.is_none());
    assert!(price_drifted(&home_shirt(), &remote, &com()));
}

#[test]
fn trailing_zero_prices_compare_equal() {
    let mut remote_value = converged_remote();
    remote_value["sale_price"] = json!("29.990");
    let remote: RemoteProduct = serde_json::from_value(remote_value).unwrap();

    assert!(!price_drifted(&home_shirt(), &remote, &com()));
}

#[test]
fn attribute_panel_always_carries_the_size_attribute() {
    let attrs = ProductAttributes {
        team: Some("Real Madrid".to_owned()),
        ..ProductAttributes::default()
    };
    let payloads = attribute_payloads(&attrs, "Men's");

    let size = payloads.last().unwrap();
    assert_eq!(size.name, SIZE_ATTRIBUTE);
    assert!(size.variation);
    assert_eq!(size.options, vec!["S", "M", "L", "XL", "2XL"]);
    assert!(payloads.iter().any(|a| a.name == "Team" && !a.variation));
}
