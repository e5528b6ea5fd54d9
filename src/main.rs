// src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod ledger;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("failed to initialize application state");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("failed to run database migrations");
    tracing::info!("database migrations applied");

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route("/paged", get(handlers::customers::page_customers))
        .route(
            "/{id}",
            get(handlers::customers::get_customer).put(handlers::customers::update_customer),
        );

    let product_routes = Router::new()
        .route(
            "/",
            post(handlers::products::create_product).get(handlers::products::list_products),
        )
        .route("/paged", get(handlers::products::page_products))
        .route(
            "/{id}",
            axum::routing::put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        );

    let category_routes = Router::new()
        .route(
            "/",
            post(handlers::categories::create_category).get(handlers::categories::list_categories),
        )
        .route(
            "/{id}",
            axum::routing::patch(handlers::categories::rename_category)
                .delete(handlers::categories::delete_category),
        );

    let bill_routes = Router::new()
        .route(
            "/",
            post(handlers::bills::create_bill).get(handlers::bills::list_bills),
        )
        .route(
            "/{id}",
            axum::routing::put(handlers::bills::update_bill).delete(handlers::bills::delete_bill),
        );

    let payment_routes = Router::new()
        .route(
            "/",
            post(handlers::payments::create_payment).get(handlers::payments::list_payments),
        )
        .route("/{id}", axum::routing::delete(handlers::payments::delete_payment));

    let stock_routes = Router::new()
        .route(
            "/",
            post(handlers::stocks::create_stock).get(handlers::stocks::list_stock_levels),
        )
        .route("/{productId}", get(handlers::stocks::stock_history));

    let backup_routes = Router::new().route(
        "/",
        get(handlers::backup::export_backup).post(handlers::backup::import_backup),
    );

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/customers", customer_routes)
        .nest("/api/products", product_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/bills", bill_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/stocks", stock_routes)
        .nest("/api/backup", backup_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind TCP listener");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("server error");
}
