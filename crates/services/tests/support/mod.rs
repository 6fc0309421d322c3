#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use services::{ProviderError, QuestionBatchProvider};
use storage::{InMemoryStore, KeyValueStore, StorageError};
use trivia_core::model::{Difficulty, TriviaItem, TriviaItemDraft};

/// Correct option for every item built by `item`.
pub const RIGHT: &str = "Palestrina";
pub const WRONG: &str = "Monteverdi";

pub fn item(id: usize, difficulty: Difficulty) -> TriviaItem {
    TriviaItemDraft {
        id: Some(format!("q{id}")),
        question: format!("Question {id}: who wrote the Missa Papae Marcelli?"),
        options: vec![
            RIGHT.into(),
            WRONG.into(),
            "Josquin".into(),
            "Lassus".into(),
        ],
        answer: RIGHT.into(),
        context: "A model of Renaissance polyphony.".into(),
        difficulty,
        category: "Renaissance".into(),
    }
    .validate()
    .expect("valid test item")
}

pub fn batch(difficulties: &[Difficulty]) -> Vec<TriviaItem> {
    difficulties
        .iter()
        .enumerate()
        .map(|(i, d)| item(i, *d))
        .collect()
}

pub fn easy_batch(len: usize) -> Vec<TriviaItem> {
    (0..len).map(|i| item(i, Difficulty::Easy)).collect()
}

/// Replays queued responses, one per request; fails once the queue is empty.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Vec<TriviaItem>, ProviderError>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<Vec<TriviaItem>, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionBatchProvider for ScriptedProvider {
    async fn request_batch(&self, _count: usize) -> Result<Vec<TriviaItem>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyBatch))
    }
}

/// In-memory store that counts writes and can be told to fail them.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    puts: Arc<AtomicUsize>,
    fail_puts: bool,
}

impl CountingStore {
    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(StorageError::Connection("read-only".into()));
        }
        self.inner.put(key, value).await
    }
}
