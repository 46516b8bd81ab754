mod auth;
mod cors;
mod download_response;
mod error;
mod handlers;
mod models;
mod schema_gate;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use common::builders::Services;
use common::db;
use common::settings::Settings;
use common::storage::policy::MAX_UPLOAD_SIZE;
use handlers::{admin, assets, categories, developers, moderation, products, reviews};
use schema_gate::SchemaGate;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A submission carries a main file plus thumbnail, license and extras.
const UPLOAD_BODY_LIMIT: usize = 4 * MAX_UPLOAD_SIZE as usize;

pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub settings: Settings,
    pub services: Services,
    pub schema: SchemaGate,
}

pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product).patch(products::update_product),
        )
        .route("/products/:id/related", get(products::related_products))
        .route("/products/:id/download", get(products::download_product))
        .route(
            "/products/:id/files/:file_id",
            get(products::download_file),
        )
        .route("/products/:id/license", get(products::download_license))
        .route(
            "/products/:id/reviews",
            get(reviews::list_reviews).post(reviews::add_review),
        )
        .route("/categories", get(categories::list_categories))
        .route("/admin/categories", post(categories::add_categories))
        .route(
            "/admin/categories/:name",
            put(categories::rename_category).delete(categories::delete_category),
        )
        .route("/admin/stats", get(admin::stats))
        .route("/admin/products", get(admin::list_products))
        .route("/admin/products/:id", delete(admin::delete_product))
        .route("/admin/developers", get(admin::list_developers))
        .route(
            "/admin/developers/:id",
            get(admin::get_developer).delete(admin::delete_developer),
        )
        .route("/moderation/queue", get(moderation::queue))
        .route("/moderation/products/:id", post(moderation::moderate))
        .route("/moderation/products/:id/history", get(moderation::history))
        .route(
            "/developers/me",
            get(developers::get_me).put(developers::update_me),
        )
        .route("/developers/:id", get(developers::get_developer))
        .route("/assets/:bucket/:id", get(assets::get_asset))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            schema_gate::schema_gate,
        ));

    Router::new()
        .route("/", get(|| async { "Modmarket API" }))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors(&state.settings))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "modmarket_api=debug,common=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Arc::new(db::establish_connection(&settings.database).await?);
    let (_repos, services) = common::build_all(db.clone(), &settings).await;

    // The gate retries on the first request if the store is down right now.
    let schema = SchemaGate::new();
    if let Err(err) = schema.ensure(db.as_ref()).await {
        tracing::warn!(error = %err, "Database not ready at startup, will retry on demand");
    }

    let state = Arc::new(AppState {
        db,
        settings: settings.clone(),
        services,
        schema,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
