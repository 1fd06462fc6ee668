#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use sibyl_core::common::events::{EnrichedEvent, PageInfo};
use sibyl_core::runtime::context::TraceProvider;
use sibyl_core::runtime::diagnostics::Diagnostics;
use sibyl_core::runtime::gate::GateEnvironment;
use sibyl_core::runtime::monitor::{Monitor, MonitorConfig};
use sibyl_core::runtime::sink::DeliverySink;

pub struct FakeTraceProvider {
    pub calls: AtomicUsize,
    body: Option<String>,
    delay: Duration,
}

impl FakeTraceProvider {
    pub fn ok(body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            body: Some(body.to_string()),
            delay: Duration::ZERO,
        })
    }

    pub fn slow(body: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            body: Some(body.to_string()),
            delay,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            body: None,
            delay: Duration::ZERO,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TraceProvider for FakeTraceProvider {
    async fn fetch(&self) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.body
            .clone()
            .ok_or_else(|| anyhow::anyhow!("trace provider unreachable"))
    }
}

pub struct RecordingSink {
    pub posted: Mutex<Vec<EnrichedEvent>>,
    response: Value,
}

impl RecordingSink {
    pub fn responding(response: Value) -> Arc<Self> {
        Arc::new(Self {
            posted: Mutex::new(Vec::new()),
            response,
        })
    }

    pub fn posted(&self) -> Vec<EnrichedEvent> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DeliverySink for RecordingSink {
    async fn post(&self, event: &EnrichedEvent) -> anyhow::Result<Value> {
        self.posted.lock().unwrap().push(event.clone());
        Ok(self.response.clone())
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    pub logs: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    /// 被抑制事件以 JSON 形式写入本地日志
    pub fn local_payloads(&self) -> Vec<Value> {
        self.logs()
            .iter()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter(Value::is_object)
            .collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn log(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub fn page() -> PageInfo {
    PageInfo {
        href: "https://shop.example.fr/cart".into(),
        hostname: "shop.example.fr".into(),
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".into(),
    }
}

pub fn open_gate() -> GateEnvironment {
    GateEnvironment {
        is_local: false,
        is_robot: false,
        allowed_country: "FR".into(),
        has_endpoint: true,
    }
}

pub fn build_monitor(
    gate: GateEnvironment,
    trace: Arc<FakeTraceProvider>,
    sink: Arc<RecordingSink>,
    diagnostics: Arc<RecordingDiagnostics>,
) -> Monitor {
    Monitor::new(MonitorConfig {
        page: page(),
        gate,
        rate_to: 100,
        rate_per: Duration::from_millis(1000),
        trace_provider: trace,
        sink,
        diagnostics,
    })
    .expect("monitor")
}

pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
