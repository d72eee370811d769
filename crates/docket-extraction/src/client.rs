use async_trait::async_trait;

use crate::ExtractionError;

#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Send `document` to the model and return its raw text answer.
    async fn extract(&self, document: &[u8], mime_type: &str) -> Result<String, ExtractionError>;

    /// Short name for logs
    fn name(&self) -> &str;
}
