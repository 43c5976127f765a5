#![allow(dead_code)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use rust_decimal_macros::dec;
use serde_json::Value;

use betboard::models::{BetAggregate, NewBet, NewOdd};
use betboard::store::{MemoryStore, Store};
use betboard::utils::jwt::JwtKeys;
use betboard::AppState;

pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: web::Data<AppState>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = web::Data::new(AppState::new(
            store.clone(),
            JwtKeys::new(JWT_SECRET, 1),
            4,
        ));
        Self { store, state }
    }

    pub fn token(&self) -> String {
        JwtKeys::new(JWT_SECRET, 1)
            .create_jwt(1, "root")
            .expect("token")
    }

    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token()))
    }

    pub async fn category(&self, title: &str) -> i64 {
        self.store
            .create_category(title)
            .await
            .expect("category")
            .category
            .id
    }

    pub async fn bet(&self, category_id: i64, title: &str, odds: &[&str]) -> BetAggregate {
        let new_bet = NewBet {
            title: title.to_string(),
            description: None,
            category_id,
            odds: odds
                .iter()
                .map(|t| NewOdd {
                    title: t.to_string(),
                    value: dec!(2.5),
                })
                .collect(),
        };
        self.store.create_bet(&new_bet).await.expect("bet")
    }
}

/// Calls the service and decodes the JSON body (`Value::Null` when empty).
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn odds_payload(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| serde_json::json!({ "title": format!("Outcome {i}"), "value": 1.5 }))
        .collect()
}
