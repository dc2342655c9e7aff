//! CRUD endpoints for users, transactions and debts.

use super::{ApiError, AppState};
use crate::db::DEFAULT_PAGE_LIMIT;
use crate::models::{
    DebtCreate, DebtResponse, TransactionCreate, TransactionResponse, UserCreate, UserResponse,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct RootMessage {
    pub message: &'static str,
}

pub async fn read_root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "SmartFinance Core Service is Running!",
    })
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Owner of a newly created record
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<UserCreate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.db.create_user(input.email.trim())?;
    log::info!("Created user {}", user.id);
    Ok(Json(user.into()))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Json(input): Json<TransactionCreate>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let txn = state.db.create_transaction(owner.user_id, &input)?;
    Ok(Json(txn.into()))
}

pub async fn read_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let txns = state.db.get_transactions(user_id, page.skip, page.limit)?;
    Ok(Json(txns.into_iter().map(TransactionResponse::from).collect()))
}

pub async fn create_debt(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
    Json(input): Json<DebtCreate>,
) -> Result<Json<DebtResponse>, ApiError> {
    let debt = state.db.create_debt(owner.user_id, &input)?;
    Ok(Json(debt.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::advisor::tests::FakeGenerator;
    use crate::ai::{Advisor, AdvisorOptions};
    use crate::db::Database;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn state() -> AppState {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let advisor = Advisor::new(
            db.clone(),
            Arc::new(FakeGenerator::replying("ok")),
            AdvisorOptions::default(),
        );
        AppState {
            db,
            advisor: Arc::new(advisor),
        }
    }

    #[tokio::test]
    async fn test_root_message() {
        let Json(body) = read_root().await;
        assert_eq!(body.message, "SmartFinance Core Service is Running!");
    }

    #[tokio::test]
    async fn test_duplicate_user_is_bad_request() {
        let state = state();
        let email = UserCreate {
            email: "demo@smartfinance.com".to_string(),
        };
        create_user(State(state.clone()), Json(email.clone())).await.unwrap();

        let err = create_user(State(state), Json(email)).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Email already registered");
    }

    #[tokio::test]
    async fn test_create_and_list_transactions() {
        let state = state();
        let Json(user) = create_user(
            State(state.clone()),
            Json(UserCreate {
                email: "t@example.com".to_string(),
            }),
        )
        .await
        .unwrap();

        for (day, amount) in [(1, 120.5), (2, 6.5)] {
            create_transaction(
                State(state.clone()),
                Query(OwnerQuery { user_id: user.id }),
                Json(TransactionCreate {
                    amount,
                    description: Some("Test".to_string()),
                    date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                    kind: "expense".to_string(),
                    category_id: None,
                }),
            )
            .await
            .unwrap();
        }

        let Json(txns) = read_transactions(
            State(state),
            Path(user.id),
            Query(Pagination { skip: 0, limit: 1 }),
        )
        .await
        .unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, 120.5);
        assert_eq!(txns[0].user_id, user.id);
    }

    #[tokio::test]
    async fn test_transaction_for_unknown_user_is_not_found() {
        let err = create_transaction(
            State(state()),
            Query(OwnerQuery {
                user_id: Uuid::new_v4(),
            }),
            Json(TransactionCreate {
                amount: 1.0,
                description: None,
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                kind: "expense".to_string(),
                category_id: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_amount_is_rejected() {
        let state = state();
        let user = state.db.create_user("huge@example.com").unwrap();

        let err = create_transaction(
            State(state.clone()),
            Query(OwnerQuery { user_id: user.id }),
            Json(TransactionCreate {
                amount: 9.0e16,
                description: Some("Yacht".to_string()),
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                kind: "expense".to_string(),
                category_id: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.db.get_transactions(user.id, 0, DEFAULT_PAGE_LIMIT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_debt() {
        let state = state();
        let user = state.db.create_user("debt@example.com").unwrap();

        let Json(debt) = create_debt(
            State(state),
            Query(OwnerQuery { user_id: user.id }),
            Json(DebtCreate {
                name: "Chase Sapphire Reserve".to_string(),
                current_balance: 4500.0,
                apr: 22.99,
                min_payment: 150.0,
            }),
        )
        .await
        .unwrap();

        assert_eq!(debt.current_balance, 4500.0);
        assert_eq!(debt.apr, 22.99);
    }

    #[test]
    fn test_pagination_defaults() {
        let page: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
    }
}
