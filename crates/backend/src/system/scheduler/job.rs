use anyhow::Result;
use async_trait::async_trait;

/// Задача, которую периодически запускает [`super::ScheduledJobWorker`]
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<()>;
}
