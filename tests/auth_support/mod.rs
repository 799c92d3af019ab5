#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use devicegrant::auth::{Credential, DeviceSession, PollOutcome, Sleeper, TokenExchange};
use serde_json::{json, Value};

/// Token exchange that replays a fixed script, then repeats `fallback`.
pub struct ScriptedExchange {
    script: Mutex<VecDeque<PollOutcome>>,
    fallback: PollOutcome,
    calls: AtomicUsize,
    seen_codes: Mutex<Vec<String>>,
}

impl ScriptedExchange {
    pub fn new(script: Vec<PollOutcome>) -> Self {
        Self::with_fallback(script, PollOutcome::Pending)
    }

    pub fn with_fallback(script: Vec<PollOutcome>, fallback: PollOutcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            seen_codes: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_codes(&self) -> Vec<String> {
        self.seen_codes.lock().expect("codes lock poisoned").clone()
    }
}

#[async_trait]
impl TokenExchange for ScriptedExchange {
    async fn exchange(&self, device_code: &str) -> PollOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_codes
            .lock()
            .expect("codes lock poisoned")
            .push(device_code.to_string());
        self.script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Token exchange whose request never completes.
#[derive(Default)]
pub struct HangingExchange {
    calls: AtomicUsize,
}

impl HangingExchange {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchange for HangingExchange {
    async fn exchange(&self, _device_code: &str) -> PollOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<PollOutcome>().await
    }
}

/// Sleeper that records each requested wait and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().expect("waits lock poisoned").clone()
    }

    pub fn wait_secs(&self) -> Vec<u64> {
        self.waits().iter().map(Duration::as_secs).collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits
            .lock()
            .expect("waits lock poisoned")
            .push(duration);
    }
}

pub fn session(interval: u64) -> DeviceSession {
    DeviceSession::new(
        "D1",
        "ABCD-1234",
        "https://auth.example/device",
        None,
        Some(600),
        Some(interval),
    )
}

pub fn credential(access_token: &str) -> Credential {
    Credential::new(access_token, None, "Bearer", 3600)
}

pub fn success_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600
    })
}

pub fn error_body(code: &str) -> Value {
    json!({ "error": code })
}
