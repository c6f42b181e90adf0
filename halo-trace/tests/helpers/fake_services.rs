//! Scripted in-memory implementations of the service traits
//!
//! Each fake pops one scripted response per call and records what it was
//! called with. An optional gate holds the response until the test releases
//! it, which lets tests act on the session while a call is outstanding.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

use halo_trace::models::{Category, ProfileMatch};
use halo_trace::services::{Extraction, ExtractionService, ImageFile, ProfileSearchService, ServiceError};

/// Holds a call open until released
#[derive(Clone)]
pub struct Gate {
    started: Arc<Notify>,
    permits: Arc<Semaphore>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            started: Arc::new(Notify::new()),
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Wait until a gated call has started
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let one gated call return
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    async fn pass(&self) {
        self.started.notify_one();
        let permit = self.permits.acquire().await.unwrap();
        permit.forget();
    }
}

pub struct FakeExtraction {
    responses: Mutex<VecDeque<Result<Extraction, ServiceError>>>,
    calls: AtomicUsize,
    seen_categories: Mutex<Vec<Category>>,
    gate: Option<Gate>,
}

impl FakeExtraction {
    pub fn new(responses: Vec<Result<Extraction, ServiceError>>) -> Arc<Self> {
        Arc::new(Self::build(responses, None))
    }

    pub fn gated(responses: Vec<Result<Extraction, ServiceError>>, gate: Gate) -> Arc<Self> {
        Arc::new(Self::build(responses, Some(gate)))
    }

    fn build(responses: Vec<Result<Extraction, ServiceError>>, gate: Option<Gate>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            seen_categories: Mutex::new(Vec::new()),
            gate,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_categories(&self) -> Vec<Category> {
        self.seen_categories.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionService for FakeExtraction {
    async fn extract(&self, _image: &ImageFile, category: Category) -> Result<Extraction, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_categories.lock().unwrap().push(category);
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::NetworkError("no scripted response".to_string())))
    }
}

pub struct FakeSearch {
    responses: Mutex<VecDeque<Result<Vec<ProfileMatch>, ServiceError>>>,
    calls: AtomicUsize,
    seen_names: Mutex<Vec<Vec<String>>>,
    gate: Option<Gate>,
}

impl FakeSearch {
    pub fn new(responses: Vec<Result<Vec<ProfileMatch>, ServiceError>>) -> Arc<Self> {
        Arc::new(Self::build(responses, None))
    }

    pub fn gated(responses: Vec<Result<Vec<ProfileMatch>, ServiceError>>, gate: Gate) -> Arc<Self> {
        Arc::new(Self::build(responses, Some(gate)))
    }

    /// Search that must never be reached
    pub fn unused() -> Arc<Self> {
        Self::new(Vec::new())
    }

    fn build(responses: Vec<Result<Vec<ProfileMatch>, ServiceError>>, gate: Option<Gate>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            seen_names: Mutex::new(Vec::new()),
            gate,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_names(&self) -> Vec<Vec<String>> {
        self.seen_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileSearchService for FakeSearch {
    async fn search(&self, names: &[String], _category: Category) -> Result<Vec<ProfileMatch>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_names.lock().unwrap().push(names.to_vec());
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::NetworkError("no scripted response".to_string())))
    }
}

/// Extraction response with optional candidate URLs
pub fn extraction(names: &[&str], candidates: &[(&str, &str)]) -> Extraction {
    Extraction {
        names: names.iter().map(|n| n.to_string()).collect(),
        candidate_urls: candidates
            .iter()
            .map(|(n, u)| (n.to_string(), u.to_string()))
            .collect(),
    }
}

/// Minimal PNG signature, enough for content sniffing
pub fn png_image(name: &str) -> ImageFile {
    let bytes = vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    ];
    ImageFile::new(name, bytes).unwrap()
}
