use super::ServiceError;
use crate::entities::moderation_logs::{self, ModerationAction};
use crate::entities::products;
use crate::repositories::moderation::ModerationRepository;
use async_trait::async_trait;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct TransitionResult {
    pub product: products::Model,
    pub log_entry: moderation_logs::Model,
}

#[async_trait]
pub trait ModerationService: Send + Sync {
    /// `action` is the external string form. The caller has already checked
    /// that `moderator_id` belongs to staff.
    async fn transition(
        &self,
        product_id: Uuid,
        moderator_id: i64,
        action: &str,
        reason: &str,
    ) -> Result<TransitionResult, ServiceError>;

    async fn queue(&self) -> Result<Vec<products::Model>, ServiceError>;

    async fn history(&self, product_id: Uuid) -> Result<Vec<moderation_logs::Model>, ServiceError>;
}

pub struct ModerationServiceImpl {
    moderation_repo: Arc<dyn ModerationRepository>,
}

impl ModerationServiceImpl {
    pub fn new(moderation_repo: Arc<dyn ModerationRepository>) -> Self {
        Self { moderation_repo }
    }
}

#[async_trait]
impl ModerationService for ModerationServiceImpl {
    async fn transition(
        &self,
        product_id: Uuid,
        moderator_id: i64,
        action: &str,
        reason: &str,
    ) -> Result<TransitionResult, ServiceError> {
        let action = ModerationAction::from_str(action)
            .map_err(|_| ServiceError::InvalidAction(action.to_string()))?;

        let outcome = self
            .moderation_repo
            .transition(product_id, moderator_id, action, reason)
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::NotFound(_) => ServiceError::not_found(format!("product {}", product_id)),
                other => other,
            })?;

        tracing::info!(
            %product_id,
            moderator_id,
            action = action.as_str(),
            "Moderated product"
        );

        Ok(TransitionResult {
            product: outcome.product,
            log_entry: outcome.entry,
        })
    }

    async fn queue(&self) -> Result<Vec<products::Model>, ServiceError> {
        Ok(self.moderation_repo.queue().await?)
    }

    async fn history(&self, product_id: Uuid) -> Result<Vec<moderation_logs::Model>, ServiceError> {
        Ok(self.moderation_repo.history(product_id).await?)
    }
}
