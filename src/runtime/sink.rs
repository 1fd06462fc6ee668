use anyhow::Context as _;
use reqwest::{header, Client};
use serde_json::Value;
use url::Url;

use crate::common::events::EnrichedEvent;

/// 投递端点的抽象
#[async_trait::async_trait]
pub trait DeliverySink: Send + Sync {
    /// 发送事件并返回解析后的 JSON 响应
    async fn post(&self, event: &EnrichedEvent) -> anyhow::Result<Value>;
}

pub struct HttpSink {
    client: Client,
    endpoint: Option<Url>,
}

impl HttpSink {
    pub fn new(endpoint: Option<Url>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("delivery client init failed")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait::async_trait]
impl DeliverySink for HttpSink {
    async fn post(&self, event: &EnrichedEvent) -> anyhow::Result<Value> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no delivery endpoint configured"))?;
        let response = self
            .client
            .post(endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(event)?)
            .send()
            .await
            .context("delivery request failed")?;
        let body = response
            .json::<Value>()
            .await
            .context("delivery response is not JSON")?;
        Ok(body)
    }
}

/// 远端响应的解读结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 端点返回了 `errors` 列表
    Rejected(Vec<String>),
    /// 端点返回了 `data`
    Acknowledged,
    Ignored,
}

impl DeliveryOutcome {
    pub fn from_response(body: &Value) -> Self {
        if let Some(errors) = body.get("errors").filter(|v| is_truthy(v)) {
            let messages = match errors {
                Value::Array(items) => items.iter().map(error_message).collect(),
                other => vec![error_message(other)],
            };
            return DeliveryOutcome::Rejected(messages);
        }
        if body.get("data").map(is_truthy).unwrap_or(false) {
            return DeliveryOutcome::Acknowledged;
        }
        DeliveryOutcome::Ignored
    }
}

fn error_message(entry: &Value) -> String {
    match entry.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => match entry {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        },
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
