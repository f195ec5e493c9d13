use anyhow::Result;
use async_trait::async_trait;
use mountainwatch_core::{Condition, ConditionSource};

use crate::OutdoorClient;

#[async_trait]
impl ConditionSource for OutdoorClient {
    async fn candidate_ids(&self) -> Result<Vec<String>> {
        Ok(self.list_condition_ids().await?)
    }

    async fn fetch_condition(&self, id: &str) -> Result<Condition> {
        Ok(self.condition(id).await?)
    }

    async fn fetch_detail(&self, id: &str) -> Result<Condition> {
        Ok(self.condition_detail(id).await?)
    }
}
