use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// 客户端网络/地理追踪信息（`key=value` 扁平映射）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    entries: HashMap<String, String>,
}

impl TraceContext {
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn ip(&self) -> Option<String> {
        self.get("ip").map(str::to_string)
    }

    /// 国家代码（trace 中的 `loc` 字段）
    pub fn country(&self) -> Option<String> {
        self.get("loc").map(str::to_string)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 解析 trace 文本：每行一个 `key=value`，按第一个 `=` 切分
pub fn parse_trace(body: &str) -> TraceContext {
    let entries = body
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    TraceContext::from_entries(entries)
}

/// 外部 trace 服务的抽象，便于在测试中替换
#[async_trait::async_trait]
pub trait TraceProvider: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<String>;
}

pub struct HttpTraceProvider {
    client: Client,
    url: String,
}

impl HttpTraceProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("trace client init failed")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl TraceProvider for HttpTraceProvider {
    async fn fetch(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("trace request failed")?
            .error_for_status()
            .context("trace provider returned an error status")?;
        response.text().await.context("failed to read trace body")
    }
}

/// 上下文增强器
///
/// 整个生命周期内最多发起一次 trace 请求；并发的首次调用方共享同一个进行中的初始化。
/// 失败时返回空上下文，不会向调用方传播错误。
#[derive(Clone)]
pub struct ContextEnricher {
    provider: Arc<dyn TraceProvider>,
    cell: Arc<OnceCell<TraceContext>>,
}

impl ContextEnricher {
    pub fn new(provider: Arc<dyn TraceProvider>) -> Self {
        Self {
            provider,
            cell: Arc::new(OnceCell::new()),
        }
    }

    pub async fn get_context(&self) -> TraceContext {
        self.cell
            .get_or_init(|| async {
                match self.provider.fetch().await {
                    Ok(body) => {
                        let trace = parse_trace(&body);
                        debug!("[Context] Trace resolved with {} entries", trace.entries.len());
                        trace
                    }
                    Err(e) => {
                        warn!("[Context] Trace fetch failed, continuing without it: {:#}", e);
                        TraceContext::default()
                    }
                }
            })
            .await
            .clone()
    }

    /// 启动时提前发起 trace 请求
    pub fn prefetch(&self, handle: &tokio::runtime::Handle) {
        let enricher = self.clone();
        handle.spawn(async move {
            enricher.get_context().await;
        });
    }

    pub fn resolved(&self) -> Option<&TraceContext> {
        self.cell.get()
    }
}
