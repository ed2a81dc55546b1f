use async_trait::async_trait;
use eyre::Result;

pub mod conversation;
pub mod preferences;
pub mod resolve;

#[async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
