use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common::services::ServiceError;
use migration::{Migrator, MigratorTrait};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Runs migrations once per process. A failed attempt leaves the gate closed
/// and the next request tries again.
#[derive(Default)]
pub struct SchemaGate {
    ready: OnceCell<()>,
}

impl SchemaGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ensure(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        self.ready
            .get_or_try_init(|| async {
                Migrator::up(db, None).await?;
                tracing::info!("Database schema is up to date");
                Ok::<(), DbErr>(())
            })
            .await
            .map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }
}

pub async fn schema_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.schema.is_ready() {
        if let Err(err) = state.schema.ensure(state.db.as_ref()).await {
            tracing::warn!(error = %err, "Schema migration still failing");
            return ApiError(ServiceError::StoreUnavailable(err.to_string())).into_response();
        }
    }
    next.run(request).await
}
