#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use weedle_query::{HttpRequest, Mutation, Params, Query, RetryTier, Tag, Transport, TransportError};

type Handler = Box<dyn Fn(&HttpRequest, usize) -> Result<Value, TransportError> + Send + Sync>;

/// In-memory transport answering from a closure after a fixed latency.
pub struct Scripted {
    handler: Handler,
    latency: Duration,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new<F>(latency: Duration, handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest, usize) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self { handler: Box::new(handler), latency, calls: AtomicUsize::new(0), log: Mutex::new(Vec::new()) })
    }

    /// Answers `{"n": <call number>}` to everything.
    pub fn counting(latency: Duration) -> Arc<Self> {
        Self::new(latency, |_, n| Ok(json!({ "n": n })))
    }

    pub fn failing(latency: Duration, code: u16, body: &str) -> Arc<Self> {
        let body = body.to_string();
        Self::new(latency, move |_, _| Err(TransportError::Status { code, message: body.clone() }))
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn paths(&self) -> Vec<String> { self.log.lock().unwrap().clone() }
}

#[async_trait::async_trait]
impl Transport for Scripted {
    async fn send(&self, req: HttpRequest) -> Result<Value, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.lock().unwrap().push(format!("{} {}", req.method, req.path));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.handler)(&req, n)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Counted {
    pub n: usize,
}

pub struct GetItem;

impl Query for GetItem {
    const NAME: &'static str = "item";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = u32;
    type Output = Counted;

    fn request(id: &u32) -> HttpRequest { HttpRequest::get(format!("/items/{id}")) }
    fn params(id: &u32) -> Params { Params::new().with("id", id) }
    fn provides(id: &u32) -> Vec<Tag> { vec![Tag::with_id("Item", id.to_string())] }
}

pub struct ListItems;

impl Query for ListItems {
    const NAME: &'static str = "items";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = ();
    type Output = Counted;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/items") }
    fn provides(_: &()) -> Vec<Tag> { vec![Tag::with_id("Item", "LIST")] }
}

pub struct GetOther;

impl Query for GetOther {
    const NAME: &'static str = "other";
    const TIER: RetryTier = RetryTier::Light;
    type Args = ();
    type Output = Counted;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/other") }
    fn provides(_: &()) -> Vec<Tag> { vec![Tag::kind("Other")] }
}

pub struct Critical;

impl Query for Critical {
    const NAME: &'static str = "critical";
    const TIER: RetryTier = RetryTier::Critical;
    type Args = ();
    type Output = Counted;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/critical") }
}

pub struct TouchItem;

impl Mutation for TouchItem {
    const NAME: &'static str = "touch_item";
    const TIER: RetryTier = RetryTier::Light;
    type Args = u32;
    type Output = Value;

    fn request(id: &u32) -> HttpRequest { HttpRequest::post(format!("/items/{id}"), json!({})) }
    fn invalidates(id: &u32) -> Vec<Tag> { vec![Tag::with_id("Item", id.to_string())] }
}

pub struct TouchAll;

impl Mutation for TouchAll {
    const NAME: &'static str = "touch_all";
    const TIER: RetryTier = RetryTier::Light;
    type Args = ();
    type Output = Value;

    fn request(_: &()) -> HttpRequest { HttpRequest::post("/items", json!({})) }
    fn invalidates(_: &()) -> Vec<Tag> { vec![Tag::kind("Item")] }
}
