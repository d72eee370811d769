//! Scripted extraction client: replays queued answers in order.

use async_trait::async_trait;
use docket_extraction::{ExtractionClient, ExtractionError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct ScriptedExtractionClient {
    answers: Mutex<VecDeque<Result<String, ExtractionError>>>,
    calls: AtomicUsize,
}

impl ScriptedExtractionClient {
    pub fn push_answer(&self, answer: impl Into<String>) {
        self.answers.lock().unwrap().push_back(Ok(answer.into()));
    }

    pub fn push_error(&self, error: ExtractionError) {
        self.answers.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionClient for ScriptedExtractionClient {
    async fn extract(&self, _document: &[u8], _mime_type: &str) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ExtractionError::Status {
                    status: 503,
                    body: "no scripted answer".to_string(),
                })
            })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
