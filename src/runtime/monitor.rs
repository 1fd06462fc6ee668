use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Context as _;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::common::events::{CapturedEvent, EnrichedEvent, EventType, PageInfo};
use crate::config::Settings;
use crate::runtime::context::{ContextEnricher, HttpTraceProvider, TraceProvider};
use crate::runtime::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::runtime::gate::{should_suppress, GateEnvironment};
use crate::runtime::limiter::RateLimiter;
use crate::runtime::normalizer::{
    normalize_console, normalize_network, normalize_rejection, normalize_uncaught,
    RawConsoleError, RawNetworkFailure, RawRejection, RawUncaughtError,
};
use crate::runtime::sink::{DeliveryOutcome, DeliverySink, HttpSink};

/// 构造 Monitor 所需的全部协作者
pub struct MonitorConfig {
    pub page: PageInfo,
    pub gate: GateEnvironment,
    pub rate_to: u32,
    pub rate_per: Duration,
    pub trace_provider: Arc<dyn TraceProvider>,
    pub sink: Arc<dyn DeliverySink>,
    pub diagnostics: Arc<dyn Diagnostics>,
}

struct MonitorInner {
    page: PageInfo,
    gate: GateEnvironment,
    limiter: RateLimiter,
    enricher: ContextEnricher,
    sink: Arc<dyn DeliverySink>,
    diagnostics: Arc<dyn Diagnostics>,
    data: RwLock<Option<Value>>,
    handle: Handle,
}

/// 错误上报管线：限流 → 上下文增强 → 闸门 → 投递
///
/// 持有限流器队列与 trace 缓存，整个进程共享同一个实例（克隆只增加引用计数）。
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Monitor {
    /// 必须在 tokio runtime 内调用
    pub fn new(config: MonitorConfig) -> anyhow::Result<Self> {
        let handle = Handle::try_current()
            .context("monitor must be created inside a tokio runtime")?;
        let limiter = RateLimiter::new(config.rate_to, config.rate_per, handle.clone());
        Ok(Self {
            inner: Arc::new(MonitorInner {
                page: config.page,
                gate: config.gate,
                limiter,
                enricher: ContextEnricher::new(config.trace_provider),
                sink: config.sink,
                diagnostics: config.diagnostics,
                data: RwLock::new(None),
                handle,
            }),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::from_settings_with(settings, Arc::new(TracingDiagnostics))
    }

    /// 与 `from_settings` 相同，但由调用方提供本地诊断通道
    pub fn from_settings_with(
        settings: &Settings,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> anyhow::Result<Self> {
        let endpoint = settings.resolve_endpoint();
        if endpoint.is_none() {
            diagnostics.error("missing endpoint");
        }

        let page = settings.page.to_page_info();
        let gate = GateEnvironment::classify(
            &page,
            &settings.monitor.allowed_country,
            endpoint.is_some(),
            settings.monitor.force_local,
            settings.monitor.force_robot,
        );
        info!(
            "[Monitor] Gate: local={}, robot={}, allowed_country={}, endpoint={}",
            gate.is_local,
            gate.is_robot,
            gate.allowed_country,
            endpoint.as_ref().map(|u| u.as_str()).unwrap_or("<none>")
        );

        let trace_provider = Arc::new(HttpTraceProvider::new(
            settings.trace.url.clone(),
            Duration::from_millis(settings.trace.timeout_ms),
        )?);
        let sink = Arc::new(HttpSink::new(endpoint)?);

        Self::new(MonitorConfig {
            page,
            gate,
            rate_to: settings.rate_limit.to,
            rate_per: Duration::from_millis(settings.rate_limit.per_ms),
            trace_provider,
            sink,
            diagnostics,
        })
    }

    /// 排队上报一个事件（fire-and-forget）
    pub fn send(&self, event: CapturedEvent) {
        let inner = self.inner.clone();
        let handle = self.inner.handle.clone();
        self.inner.limiter.enqueue(Box::new(move || {
            handle.spawn(deliver(inner, event));
        }));
    }

    pub fn capture_uncaught(&self, raw: RawUncaughtError) -> EventType {
        self.dispatch(normalize_uncaught(raw))
    }

    pub fn capture_rejection(&self, raw: RawRejection) -> EventType {
        self.dispatch(normalize_rejection(raw))
    }

    pub fn capture_console(&self, raw: RawConsoleError) -> EventType {
        self.dispatch(normalize_console(raw))
    }

    pub fn capture_network(&self, raw: RawNetworkFailure) -> EventType {
        self.dispatch(normalize_network(raw))
    }

    /// 设置调用方附带的诊断数据，发送时读取；`None` 清除
    pub fn set_data(&self, data: Option<Value>) {
        let mut guard = self
            .inner
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data;
    }

    pub fn prefetch_context(&self) {
        self.inner.enricher.prefetch(&self.inner.handle);
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.inner.diagnostics
    }

    fn dispatch(&self, event: CapturedEvent) -> EventType {
        let event_type = event.event_type;
        self.send(event);
        event_type
    }
}

impl MonitorInner {
    fn encoded_data(&self) -> Option<String> {
        let guard = self
            .data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        encode_data(guard.as_ref())
    }
}

/// 仅结构化值（对象或数组）会被编码进 `data`
pub fn encode_data(data: Option<&Value>) -> Option<String> {
    match data {
        Some(value @ (Value::Object(_) | Value::Array(_))) => Some(value.to_string()),
        _ => None,
    }
}

async fn deliver(inner: Arc<MonitorInner>, event: CapturedEvent) {
    inner.diagnostics.log("Error Reporting...");
    let trace = inner.enricher.get_context().await;
    let data = inner.encoded_data();
    let enriched = EnrichedEvent::new(event, &inner.page, trace.ip(), trace.country(), data);
    let payload = serde_json::to_string(&enriched).unwrap_or_default();

    if should_suppress(&enriched, &inner.gate) {
        inner.diagnostics.log(&payload);
        return;
    }

    match inner.sink.post(&enriched).await {
        Ok(body) => match DeliveryOutcome::from_response(&body) {
            DeliveryOutcome::Rejected(messages) => {
                for message in messages {
                    inner.diagnostics.error(&message);
                }
            }
            DeliveryOutcome::Acknowledged => {
                inner.diagnostics.log(&format!("sent {}", payload));
            }
            DeliveryOutcome::Ignored => {}
        },
        Err(e) => debug!(
            "[Monitor] Delivery of {} event failed: {:#}",
            enriched.event_type.as_str(),
            e
        ),
    }
}
