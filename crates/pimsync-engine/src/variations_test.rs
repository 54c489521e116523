use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::test_support::mock_client;

fn spec() -> VariationSpec<'static> {
    VariationSpec {
        sku: "RM-2425-HOM-A3X7K",
        gender: "Men's",
        sale_price: Decimal::new(2999, 2),
        stock_quantity: Some(50),
        stock_status: "instock",
    }
}

fn remote_product(id: i64, product_type: &str) -> RemoteProduct {
    serde_json::from_value(json!({
        "id": id,
        "sku": "RM-2425-HOM-A3X7K",
        "type": product_type
    }))
    .unwrap()
}

fn created_batch_body() -> serde_json::Value {
    json!({
        "create": [
            {"id": 101, "sku": "RM-2425-HOM-A3X7K-S", "regular_price": "59.98", "sale_price": "29.99"},
            {"id": 102, "sku": "RM-2425-HOM-A3X7K-M", "regular_price": "59.98", "sale_price": "29.99"},
            {"id": 103, "sku": "RM-2425-HOM-A3X7K-L", "regular_price": "59.98", "sale_price": "29.99"},
            {"id": 104, "sku": "RM-2425-HOM-A3X7K-XL", "regular_price": "59.98", "sale_price": "29.99"},
            {"id": 105, "sku": "RM-2425-HOM-A3X7K-2XL", "regular_price": "59.98", "sale_price": "29.99"}
        ]
    })
}

#[tokio::test]
async fn simple_product_is_converted_before_variations_are_created() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/products/9"))
        .and(body_partial_json(json!({"type": "variable"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 9, "type": "variable"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/9/variations/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_batch_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let variations = ensure_priced(&client, &remote_product(9, "simple"), &spec())
        .await
        .unwrap();

    assert_eq!(variations.len(), 5);
    assert_eq!(variations[0].sku, "RM-2425-HOM-A3X7K-S");
    assert_eq!(variations[4].sku, "RM-2425-HOM-A3X7K-2XL");
}

#[tokio::test]
async fn existing_variations_are_updated_in_place_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/9/variations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 41, "sku": "RM-2425-HOM-A3X7K-S"},
            {"id": 42, "sku": "RM-2425-HOM-A3X7K-M"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/9/variations/batch"))
        .and(body_partial_json(json!({
            "update": [
                {"id": 41, "sale_price": "29.99", "regular_price": "59.98"},
                {"id": 42, "sale_price": "29.99", "regular_price": "59.98"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "update": [
                {"id": 41, "sku": "RM-2425-HOM-A3X7K-S", "sale_price": "29.99"},
                {"id": 42, "sku": "RM-2425-HOM-A3X7K-M", "sale_price": "29.99"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let variations = ensure_priced(&client, &remote_product(9, "variable"), &spec())
        .await
        .unwrap();

    assert_eq!(variations.len(), 2);
    assert_eq!(variations[0].remote_id, 41);
    assert_eq!(variations[0].sale_price, "29.99");
}

#[tokio::test]
async fn variable_product_with_no_variations_gets_the_size_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/9/variations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/9/variations/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_batch_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let variations = ensure_priced(&client, &remote_product(9, "variable"), &spec())
        .await
        .unwrap();

    assert_eq!(variations.len(), 5);
}

#[tokio::test]
async fn rebuild_deletes_the_old_run_then_creates_a_fresh_one() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/9/variations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 41}, {"id": 42}, {"id": 43}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/9/variations/batch"))
        .and(body_partial_json(json!({"delete": [41, 42, 43]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delete": [{"id": 41}, {"id": 42}, {"id": 43}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products/9/variations/batch"))
        .and(body_partial_json(json!({
            "create": [{"sku": "RM-2425-HOM-A3X7K-S"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_batch_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client("com", &server);
    let (deleted, created) = rebuild(&client, &remote_product(9, "variable"), &spec())
        .await
        .unwrap();

    assert_eq!(deleted, 3);
    assert_eq!(created.len(), 5);
}
