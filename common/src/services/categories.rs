use super::{ServiceError, ValidationKind};
use crate::domain::tags::clean_names;
use crate::repositories::categories::CategoryRepository;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Registers names that do not exist yet. Blank names are skipped.
    async fn ensure(&self, names: &[String], origin: Option<Uuid>)
        -> Result<Vec<String>, ServiceError>;

    /// Staff entry point. Fails when nothing usable was given.
    async fn add(&self, names: &[String]) -> Result<Vec<String>, ServiceError>;

    async fn list(&self) -> Result<Vec<String>, ServiceError>;

    async fn rename(&self, old: &str, new: &str) -> Result<u64, ServiceError>;

    async fn delete(&self, name: &str) -> Result<(), ServiceError>;
}

pub struct CategoryServiceImpl {
    category_repo: Arc<dyn CategoryRepository>,
}

impl CategoryServiceImpl {
    pub fn new(category_repo: Arc<dyn CategoryRepository>) -> Self {
        Self { category_repo }
    }
}

fn blank_category() -> ServiceError {
    ServiceError::validation(ValidationKind::BlankCategory, "category name must not be blank")
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn ensure(
        &self,
        names: &[String],
        origin: Option<Uuid>,
    ) -> Result<Vec<String>, ServiceError> {
        let names = clean_names(names);
        if names.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.category_repo.ensure(&names, origin).await?)
    }

    async fn add(&self, names: &[String]) -> Result<Vec<String>, ServiceError> {
        let names = clean_names(names);
        if names.is_empty() {
            return Err(blank_category());
        }
        let created = self.category_repo.ensure(&names, None).await?;
        tracing::info!(created = created.len(), "Added categories");
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.category_repo.list_names().await?)
    }

    async fn rename(&self, old: &str, new: &str) -> Result<u64, ServiceError> {
        let old = old.trim();
        let new = new.trim();
        if new.is_empty() {
            return Err(blank_category());
        }

        if old == new {
            if !self.category_repo.exists(old).await? {
                return Err(ServiceError::not_found(format!("category '{}'", old)));
            }
            return Ok(0);
        }

        let touched = self.category_repo.rename(old, new).await.map_err(|err| {
            match ServiceError::from(err) {
                ServiceError::NotFound(_) => {
                    ServiceError::not_found(format!("category '{}'", old))
                }
                ServiceError::Duplicate(_) => {
                    ServiceError::Duplicate(format!("category '{}' already exists", new))
                }
                other => other,
            }
        })?;

        tracing::info!(old, new, products = touched, "Renamed category");
        Ok(touched)
    }

    async fn delete(&self, name: &str) -> Result<(), ServiceError> {
        let name = name.trim();
        if !self.category_repo.delete(name).await? {
            return Err(ServiceError::not_found(format!("category '{}'", name)));
        }
        tracing::info!(name, "Deleted category");
        Ok(())
    }
}
