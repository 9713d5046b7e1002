use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::handler::{health_check, AppState},
    chores::handlers::{
        accept_chore, create_chore, finish_chore, get_chore, list_chores, withdraw_chore,
    },
    household::handlers::{create_household, get_household, join_household, list_members},
    settlement::handlers::settle_reward,
    users::handlers::{create_user, get_user},
};

pub fn create_app(state: AppState) -> Router {
    info!("setting up HTTP routes");

    Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                // User endpoints
                .route("/users", post(create_user))
                .route("/users/:id", get(get_user))
                // Household endpoints
                .route("/households", post(create_household))
                .route("/households/:id", get(get_household))
                .route("/households/:id/members", get(list_members))
                .route("/households/:id/join", post(join_household))
                // Chore endpoints
                .route(
                    "/households/:id/chores",
                    get(list_chores).post(create_chore),
                )
                .route("/households/:id/chores/:chore_id", get(get_chore))
                .route("/households/:id/chores/:chore_id/accept", post(accept_chore))
                .route(
                    "/households/:id/chores/:chore_id/withdraw",
                    post(withdraw_chore),
                )
                .route("/households/:id/chores/:chore_id/finish", post(finish_chore)),
        )
        // Settlement endpoint
        .route("/api/v1/settlement", post(settle_reward))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(app: Router, bind_address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        create_app(AppState::new(Arc::new(MemoryStore::new())))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_req(uri: &str, bearer: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
            .body(Body::empty())
            .unwrap()
    }

    async fn sign_up(app: &Router, name: &str) -> String {
        let (status, body) = send(
            app,
            post_json("/api/v1/users", None, json!({"name": name, "role": "parent"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app();
        let (status, body) = send(
            &app,
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn settlement_without_auth_is_rejected() {
        let app = app();
        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/settlement",
                None,
                json!({"household_id": "hh", "chore_id": "c"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn settlement_of_missing_chore_is_chore_not_found() {
        let app = app();
        let caller = sign_up(&app, "Alice").await;
        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/settlement",
                Some(&caller),
                json!({"household_id": "hh", "chore_id": "missing"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_code"], "CHORE_NOT_FOUND");
    }

    #[tokio::test]
    async fn full_chore_lifecycle_credits_the_acceptor() {
        let app = app();
        let alice = sign_up(&app, "Alice").await;
        let bob = sign_up(&app, "Bob").await;

        let (status, household) = send(
            &app,
            post_json("/api/v1/households", Some(&alice), json!({"tag": "home"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let hh = household["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            post_json(&format!("/api/v1/households/{}/join", hh), Some(&bob), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, chore) = send(
            &app,
            post_json(
                &format!("/api/v1/households/{}/chores", hh),
                Some(&alice),
                json!({"name": "dishes", "reward": 25.0}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(chore["status"], "");
        assert_eq!(chore["action"], "withdraw");
        let chore_id = chore["id"].as_str().unwrap().to_string();

        // Bob sees an open chore he can accept
        let (_, listed) = send(
            &app,
            get_req(&format!("/api/v1/households/{}/chores", hh), &bob),
        )
        .await;
        assert_eq!(listed[0]["action"], "accept");

        let (status, accepted) = send(
            &app,
            post_json(
                &format!("/api/v1/households/{}/chores/{}/accept", hh, chore_id),
                Some(&bob),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["status"], "Pending");
        assert_eq!(accepted["action"], "finish");

        let (status, finished) = send(
            &app,
            post_json(
                &format!("/api/v1/households/{}/chores/{}/finish", hh, chore_id),
                Some(&bob),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(finished["status"], "Finished");
        assert_eq!(finished["action"], "nothing");

        let (status, receipt) = send(
            &app,
            post_json(
                "/api/v1/settlement",
                Some(&alice),
                json!({"household_id": hh, "chore_id": chore_id}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(receipt["message"].as_str().unwrap().contains(&bob));

        let (_, user) = send(&app, get_req(&format!("/api/v1/users/{}", bob), &bob)).await;
        let balance: rust_decimal::Decimal =
            serde_json::from_value(user["balance"].clone()).unwrap();
        assert_eq!(balance, dec!(25));
    }

    #[tokio::test]
    async fn accepting_your_own_chore_is_forbidden() {
        let app = app();
        let alice = sign_up(&app, "Alice").await;

        let (_, household) = send(
            &app,
            post_json("/api/v1/households", Some(&alice), json!({"tag": "home"})),
        )
        .await;
        let hh = household["id"].as_str().unwrap().to_string();

        let (_, chore) = send(
            &app,
            post_json(
                &format!("/api/v1/households/{}/chores", hh),
                Some(&alice),
                json!({"name": "dishes", "reward": 5.0}),
            ),
        )
        .await;
        let chore_id = chore["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            post_json(
                &format!("/api/v1/households/{}/chores/{}/accept", hh, chore_id),
                Some(&alice),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn negative_reward_is_rejected() {
        let app = app();
        let alice = sign_up(&app, "Alice").await;

        let (_, household) = send(
            &app,
            post_json("/api/v1/households", Some(&alice), json!({"tag": "home"})),
        )
        .await;
        let hh = household["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            post_json(
                &format!("/api/v1/households/{}/chores", hh),
                Some(&alice),
                json!({"name": "dishes", "reward": -1.0}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "INVALID_ARGUMENT");
    }
}
