use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::categories::CategoryEntity;

#[automock]
#[async_trait]
pub trait CategoryRepository {
    async fn list_categories(&self) -> Result<Vec<CategoryEntity>>;
}
