// src/testing.rs
//! Scripted transport shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{oneshot, watch};

use crate::error::{FetchError, Result};
use crate::transport::Transport;

/// Answers each path from a queue of canned results. The last queued result
/// for a path is sticky. While the gate is closed, requests are counted and
/// then park until `open()` is called.
///
/// After `hold()`, every request parks on its own slot instead and is
/// answered by `release(path, n, ..)`, so tests pick the completion order.
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    calls: Mutex<HashMap<String, usize>>,
    gate: watch::Sender<bool>,
    holding: AtomicBool,
    held: Mutex<HashMap<String, Vec<Option<oneshot::Sender<Result<Value>>>>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            gate: watch::channel(true).0,
            holding: AtomicBool::new(false),
            held: Mutex::new(HashMap::new()),
        }
    }

    pub fn respond(&self, path: &str, result: Result<Value>) -> &Self {
        self.responses
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(result);
        self
    }

    pub fn hold(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    /// Answers the `nth` held request for `path` (0-based, arrival order).
    /// False if there is no such request or it was already answered.
    pub fn release(&self, path: &str, nth: usize, result: Result<Value>) -> bool {
        let slot = self
            .held
            .lock()
            .get_mut(path)
            .and_then(|slots| slots.get_mut(nth))
            .and_then(Option::take);
        match slot {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    pub fn close(&self) {
        self.gate.send_replace(false);
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    fn next_response(&self, path: &str) -> Result<Value> {
        let mut responses = self.responses.lock();
        match responses.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(unrouted),
            Some(queue) => queue.front().cloned().unwrap_or_else(unrouted),
            None => unrouted(),
        }
    }
}

fn unrouted() -> Result<Value> {
    Err(FetchError::Network("no scripted response".into()))
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(&self, path: &str) -> Result<Value> {
        *self.calls.lock().entry(path.to_string()).or_insert(0) += 1;
        if self.holding.load(Ordering::SeqCst) {
            let (tx, rx) = oneshot::channel();
            self.held
                .lock()
                .entry(path.to_string())
                .or_default()
                .push(Some(tx));
            return rx.await.unwrap_or_else(|_| unrouted());
        }
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        self.next_response(path)
    }
}

pub fn server_json(ip: &str, name: &str, players: u32) -> Value {
    json!({ "serverIP": ip, "serverName": name, "players": players })
}

pub fn list_ok(servers: Vec<Value>) -> Result<Value> {
    Ok(json!({ "status": "ok", "data": servers }))
}

/// Lets spawned tasks run until they park again.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
