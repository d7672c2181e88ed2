//! HTTP API tests against the in-memory storage adapters

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use core_kernel::{CatalogItemId, Currency, CurrencyRegistry, ExchangeRate};
use domain_billing::{
    BillingService, DirectoryStore, ExchangeRateService, MalformedRowPolicy, RateQuote, RateStore,
};
use interface_api::{create_router, AppState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use test_utils::{seed_directory, InMemoryBillingStore, SeededDirectory};

struct TestApp {
    server: TestServer,
    store: Arc<InMemoryBillingStore>,
    seeded: SeededDirectory,
}

async fn spawn_app(policy: MalformedRowPolicy) -> TestApp {
    let store = Arc::new(InMemoryBillingStore::new(CurrencyRegistry::default()));
    let seeded = seed_directory(store.as_ref()).await;

    let mut usd = RateQuote::new(ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0.85)).unwrap());
    store.record_rate(&mut usd).await.unwrap();

    let billing = BillingService::new(store.clone(), store.clone()).with_row_policy(policy);
    let rates = ExchangeRateService::new(store.clone());
    let directory: Arc<dyn DirectoryStore> = store.clone();

    let server =
        TestServer::new(create_router(AppState::new(billing, rates, directory))).unwrap();
    TestApp {
        server,
        store,
        seeded,
    }
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

fn id(value: &CatalogItemId) -> String {
    value.get().to_string()
}

fn bill_body(seeded: &SeededDirectory, line_items: Value) -> Value {
    json!({
        "due_date": "2025-03-31",
        "issuer_id": seeded.issuer_id.get(),
        "receiver_id": seeded.receiver_id.get(),
        "line_items": line_items,
    })
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_and_readiness() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let health = app.server.get("/health").await;
        health.assert_status_ok();
        assert_eq!(health.json::<Value>()["status"], "healthy");

        let ready = app.server.get("/health/ready").await;
        ready.assert_status_ok();
        assert_eq!(ready.json::<Value>()["checks"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_currencies() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let body: Value = app.server.get("/api/v1/currencies").await.json();
        assert_eq!(body["default"], "EUR");
        assert_eq!(body["supported"].as_array().unwrap().len(), 10);
    }
}

mod bills {
    use super::*;

    #[tokio::test]
    async fn test_create_mixed_currency_bill() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;
        let items = &app.seeded.item_ids;

        let response = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&items[1]), id(&items[0])],
                    "quantities": ["2", "1"],
                    "prices": ["100", "50"],
                    "currencies": ["USD", "EUR"],
                    "exchange_rates": ["0.85", ""],
                }),
            ))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let bill = &body["bill"];
        assert_eq!(bill["currency"], "EUR");
        assert_eq!(bill["paid"], "unpaid");
        assert_eq!(decimal(&bill["base_total"]), dec!(220));
        assert_eq!(decimal(&bill["original_total"]), dec!(220));
        assert_eq!(decimal(&bill["items"][0]["base_amount"]), dec!(170));
        assert_eq!(decimal(&bill["items"][1]["exchange_rate"]), dec!(1));
        assert!(body.get("skipped_rows").is_none());
        assert_eq!(app.store.bill_count(), 1);
    }

    #[tokio::test]
    async fn test_single_currency_bill_uses_looked_up_rate() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[1])],
                    "quantities": ["4"],
                    "prices": ["25.50"],
                    "currencies": ["USD"],
                }),
            ))
            .await;

        response.assert_status(StatusCode::CREATED);
        let bill = &response.json::<Value>()["bill"];
        assert_eq!(bill["currency"], "USD");
        assert_eq!(decimal(&bill["original_total"]), dec!(102));
        assert_eq!(decimal(&bill["base_total"]), dec!(86.70));
    }

    #[tokio::test]
    async fn test_malformed_row_is_rejected() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[0]), id(&app.seeded.item_ids[0])],
                    "quantities": ["1", "many"],
                    "prices": ["10", "10"],
                }),
            ))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"].as_array().unwrap().len(), 1);
        assert_eq!(app.store.bill_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_row_is_skipped_under_lenient_policy() {
        let app = spawn_app(MalformedRowPolicy::Skip).await;

        let response = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[0]), id(&app.seeded.item_ids[0])],
                    "quantities": ["1", "many"],
                    "prices": ["10", "10"],
                }),
            ))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["bill"]["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["skipped_rows"][0]["row"], 1);
    }

    #[tokio::test]
    async fn test_unknown_item_is_a_conflict() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[0]), "9999"],
                    "quantities": ["1", "1"],
                    "prices": ["10", "10"],
                }),
            ))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(app.store.bill_count(), 0);
        assert_eq!(app.store.assignment_count(), 0);
    }

    #[tokio::test]
    async fn test_over_precise_price_is_rejected() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[1])],
                    "quantities": ["1"],
                    "prices": ["0.123456"],
                    "currencies": ["USD"],
                    "exchange_rates": ["0.8500000001"],
                }),
            ))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let details = response.json::<Value>()["details"].as_array().unwrap().clone();
        assert_eq!(details.len(), 2);
        assert!(details[0].as_str().unwrap().contains("price"));
        assert!(details[1].as_str().unwrap().contains("exchange_rate"));
        assert_eq!(app.store.bill_count(), 0);
    }

    #[tokio::test]
    async fn test_amount_out_of_range_is_rejected() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[0])],
                    "quantities": ["2000000"],
                    "prices": ["999999999.9999"],
                }),
            ))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
        assert_eq!(app.store.bill_count(), 0);
    }

    async fn create_simple_bill(app: &TestApp) -> i64 {
        let body: Value = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[0]), id(&app.seeded.item_ids[2])],
                    "quantities": ["1", "1"],
                    "prices": ["5", "10"],
                    "currencies": ["EUR", "GBP"],
                    "exchange_rates": ["", "1.17"],
                }),
            ))
            .await
            .json();
        body["bill"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_toggle_paid_twice_restores_state() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;
        let bill_id = create_simple_bill(&app).await;
        let path = format!("/api/v1/bills/{}/toggle-paid", bill_id);

        let first: Value = app.server.post(&path).await.json();
        assert_eq!(first["paid"], "paid");

        let second: Value = app.server.post(&path).await.json();
        assert_eq!(second["paid"], "unpaid");
        assert_eq!(decimal(&second["base_total"]), dec!(16.70));
    }

    #[tokio::test]
    async fn test_missing_bill_is_not_found() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        app.server
            .get("/api/v1/bills/4242")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .post("/api/v1/bills/4242/toggle-paid")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .delete("/api/v1/bills/4242")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_remove_line_item_and_reschedule() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;
        let bill_id = create_simple_bill(&app).await;

        let bill: Value = app.server.get(&format!("/api/v1/bills/{}", bill_id)).await.json();
        let gbp_line = bill["items"][1]["id"].as_i64().unwrap();

        let response = app
            .server
            .delete(&format!("/api/v1/bills/{}/items/{}", bill_id, gbp_line))
            .await;
        response.assert_status_ok();
        let updated: Value = response.json();
        assert_eq!(updated["currency"], "EUR");
        assert_eq!(decimal(&updated["base_total"]), dec!(5));

        let rescheduled: Value = app
            .server
            .put(&format!("/api/v1/bills/{}/due-date", bill_id))
            .json(&json!({ "due_date": "2025-06-30" }))
            .await
            .json();
        assert_eq!(rescheduled["due_date"], "2025-06-30");
    }

    #[tokio::test]
    async fn test_delete_bill_removes_line_items() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;
        let bill_id = create_simple_bill(&app).await;
        assert_eq!(app.store.assignment_count(), 2);

        app.server
            .delete(&format!("/api/v1/bills/{}", bill_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(app.store.bill_count(), 0);
        assert_eq!(app.store.assignment_count(), 0);

        let list: Value = app.server.get("/api/v1/bills").await.json();
        assert!(list.as_array().unwrap().is_empty());
    }
}

mod exchange_rates {
    use super::*;

    #[tokio::test]
    async fn test_recorded_rate_applies_to_new_bills() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/exchange-rates")
            .json(&json!({ "from": "GBP", "to": "EUR", "rate": "1.17" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let quote: Value = response.json();
        assert!(quote["id"].as_i64().is_some());
        assert_eq!(quote["from"], "GBP");
        assert_eq!(decimal(&quote["rate"]), dec!(1.17));

        let created: Value = app
            .server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[2])],
                    "quantities": ["2"],
                    "prices": ["10"],
                    "currencies": ["GBP"],
                }),
            ))
            .await
            .json();
        assert_eq!(decimal(&created["bill"]["items"][0]["exchange_rate"]), dec!(1.17));
        assert_eq!(decimal(&created["bill"]["base_total"]), dec!(23.4));
    }

    #[tokio::test]
    async fn test_overview_shows_current_rate_and_history() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        app.server
            .post("/api/v1/exchange-rates")
            .json(&json!({ "from": "USD", "to": "EUR", "rate": "0.9" }))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = app
            .server
            .get("/api/v1/exchange-rates?from=USD&to=EUR")
            .await
            .json();
        assert_eq!(decimal(&body["current"]), dec!(0.9));
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(decimal(&history[1]["rate"]), dec!(0.85));

        let limited: Value = app
            .server
            .get("/api/v1/exchange-rates?from=USD&to=EUR&limit=1")
            .await
            .json();
        assert_eq!(limited["history"].as_array().unwrap().len(), 1);

        let unknown: Value = app
            .server
            .get("/api/v1/exchange-rates?from=JPY&to=EUR")
            .await
            .json();
        assert!(unknown["current"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_rates_are_rejected() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        for body in [
            json!({ "from": "BTC", "to": "EUR", "rate": "1" }),
            json!({ "from": "EUR", "to": "EUR", "rate": "1" }),
            json!({ "from": "USD", "to": "EUR", "rate": "0" }),
            json!({ "from": "USD", "to": "EUR", "rate": "0.123456789" }),
            json!({ "from": "US", "to": "EUR", "rate": "1" }),
        ] {
            app.server
                .post("/api/v1/exchange-rates")
                .json(&body)
                .await
                .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        }

        let history = app
            .store
            .rate_history(Currency::USD, Currency::EUR, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }
}

mod directory {
    use super::*;

    #[tokio::test]
    async fn test_item_crud() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/items")
            .json(&json!({ "name": "Training day", "price": "800", "currency": "chf" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Value = response.json();
        assert_eq!(created["currency"], "CHF");
        let path = format!("/api/v1/items/{}", created["id"]);

        let updated: Value = app
            .server
            .put(&path)
            .json(&json!({ "name": "Training day", "price": "750", "currency": "" }))
            .await
            .json();
        assert_eq!(updated["currency"], "EUR");
        assert_eq!(decimal(&updated["price"]), dec!(750));

        app.server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        app.server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_item_validation() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let blank = app
            .server
            .post("/api/v1/items")
            .json(&json!({ "name": "", "price": "1" }))
            .await;
        blank.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let negative = app
            .server
            .post("/api/v1/items")
            .json(&json!({ "name": "Refund", "price": "-1" }))
            .await;
        negative.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_assigned_item_cannot_be_deleted() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;
        app.server
            .post("/api/v1/bills")
            .json(&bill_body(
                &app.seeded,
                json!({
                    "item_ids": [id(&app.seeded.item_ids[0])],
                    "quantities": ["1"],
                    "prices": ["10"],
                }),
            ))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .delete(&format!("/api/v1/items/{}", app.seeded.item_ids[0].get()))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "conflict");
    }

    #[tokio::test]
    async fn test_party_crud() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let created: Value = app
            .server
            .post("/api/v1/receivers")
            .json(&json!({
                "name": "Initech",
                "vat_number": "US12-3456789",
                "address": { "city": "Austin", "country": "US" }
            }))
            .await
            .json();
        let path = format!("/api/v1/receivers/{}", created["id"]);
        assert_eq!(created["address"]["city"], "Austin");

        let updated: Value = app
            .server
            .put(&path)
            .json(&json!({ "name": "Initech LLC" }))
            .await
            .json();
        assert_eq!(updated["name"], "Initech LLC");
        assert_eq!(updated["address"]["city"], "");

        let receivers: Value = app.server.get("/api/v1/receivers").await.json();
        assert_eq!(receivers.as_array().unwrap().len(), 2);

        app.server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        app.server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_party_name_is_rejected() {
        let app = spawn_app(MalformedRowPolicy::Reject).await;

        let response = app
            .server
            .post("/api/v1/issuers")
            .json(&json!({ "name": "" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.json::<Value>()["details"].is_array());
    }
}
