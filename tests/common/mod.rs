#![allow(dead_code)]

use async_trait::async_trait;
use dashboard_ingest::{Dataset, RetrievalError, Sink, Source};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How a scripted locator answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(&'static str),
    Status(u16),
    Hang,
}

/// In-memory source answering from a fixed script; unknown locators are 404s.
#[derive(Default)]
pub struct ScriptedSource {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, locator: &str, reply: Reply) -> Self {
        self.replies.insert(locator.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Source for ScriptedSource {
    async fn fetch(&self, locator: &str) -> Result<String, RetrievalError> {
        self.calls.lock().unwrap().push(locator.to_string());
        match self.replies.get(locator).cloned() {
            Some(Reply::Text(text)) => Ok(text.to_string()),
            Some(Reply::Status(status)) => Err(RetrievalError::Status {
                locator: locator.to_string(),
                status,
            }),
            Some(Reply::Hang) => futures::future::pending().await,
            None => Err(RetrievalError::Status {
                locator: locator.to_string(),
                status: 404,
            }),
        }
    }
}

/// Sink remembering every `(name, dataset)` it was given.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<(String, Dataset)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<(String, Dataset)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count_for(&self, name: &str) -> usize {
        self.seen.lock().unwrap().iter().filter(|(n, _)| n == name).count()
    }
}

impl Sink for RecordingSink {
    fn present(&self, name: &str, dataset: &Dataset) {
        self.seen
            .lock()
            .unwrap()
            .push((name.to_string(), dataset.clone()));
    }
}
