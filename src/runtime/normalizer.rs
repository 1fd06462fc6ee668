use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::common::events::{CapturedEvent, EventType};

/// 原始错误对象（`error` 字段）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorObject {
    pub name: Option<String>,
    pub message: Option<String>,
    pub stack: Option<String>,
}

/// 未捕获异常的原始形态
///
/// `src` 为加载失败的资源地址（如 img / script），仅在没有 message 时作为兜底。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUncaughtError {
    pub error: Option<ErrorObject>,
    pub name: Option<String>,
    pub message: Option<String>,
    pub stack: Option<String>,
    pub src: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum RejectionKind {
    #[default]
    #[serde(rename = "unhandledrejection")]
    Unhandled,
    #[serde(rename = "rejectionhandled")]
    Handled,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRejection {
    #[serde(rename = "type")]
    pub kind: RejectionKind,
    /// `None` 表示未提供 reason（区别于显式的 `null`）
    #[serde(deserialize_with = "present_value")]
    pub reason: Option<Value>,
}

/// 显式错误日志：`stack` 为页面侧调用 console.error 时抓取的调用栈
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConsoleError {
    pub args: Vec<Value>,
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTrigger {
    #[default]
    Error,
    Timeout,
}

impl NetworkTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkTrigger::Error => "error",
            NetworkTrigger::Timeout => "timeout",
        }
    }
}

/// 网络请求失败的原始形态：`args` 为请求构造参数（method、url ...）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNetworkFailure {
    pub args: Vec<Value>,
    pub event: NetworkTrigger,
}

pub fn normalize_uncaught(raw: RawUncaughtError) -> CapturedEvent {
    let error = raw.error.unwrap_or_default();
    let name = non_empty(error.name).or(raw.name).unwrap_or_default();
    let message = non_empty(error.message)
        .or(non_empty(raw.message))
        .or(raw.src)
        .unwrap_or_default();
    let stack = non_empty(error.stack).or(raw.stack).unwrap_or_default();
    CapturedEvent::new(EventType::Error, name, message, stack)
}

pub fn normalize_rejection(raw: RawRejection) -> CapturedEvent {
    let event_type = match raw.kind {
        RejectionKind::Unhandled => EventType::UnhandledRejection,
        RejectionKind::Handled => EventType::RejectionHandled,
    };
    let Some(reason) = raw.reason else {
        return CapturedEvent::new(event_type, "", "undefined", "");
    };
    let message = display_value(&reason);
    let (name, stack) = if is_error_shaped(&reason) {
        (string_field(&reason, "name"), string_field(&reason, "stack"))
    } else {
        (String::new(), String::new())
    };
    CapturedEvent::new(event_type, name, message, stack)
}

/// 优先使用页面传来的调用栈；缺失时退化为 `Error: <message>`
pub fn normalize_console(raw: RawConsoleError) -> CapturedEvent {
    let message = raw
        .args
        .iter()
        .map(stringify_arg)
        .collect::<Vec<_>>()
        .join("\n");
    let stack = non_empty(raw.stack).unwrap_or_else(|| format!("Error: {}", message));
    CapturedEvent::new(EventType::Error, "Error", message, stack)
}

pub fn normalize_network(raw: RawNetworkFailure) -> CapturedEvent {
    let name = raw
        .args
        .iter()
        .map(|arg| match arg {
            Value::Null => String::new(),
            other => display_value(other),
        })
        .collect::<Vec<_>>()
        .join(", ");
    CapturedEvent::new(EventType::Network, name, raw.event.as_str(), "")
}

/// 供 Rust 宿主使用：把 reqwest 的失败请求转换为网络事件
pub fn network_failure_from_reqwest(
    method: &str,
    url: &str,
    err: &reqwest::Error,
) -> CapturedEvent {
    let event = if err.is_timeout() {
        NetworkTrigger::Timeout
    } else {
        NetworkTrigger::Error
    };
    normalize_network(RawNetworkFailure {
        args: vec![Value::from(method), Value::from(url)],
        event,
    })
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn is_error_shaped(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => ["name", "message", "stack"]
            .iter()
            .any(|key| map.get(*key).map(Value::is_string).unwrap_or(false)),
        None => false,
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// 值的字符串形式：Error 形态为 `Name: message`，其余结构化值编码为 JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(_) if is_error_shaped(value) => {
            let name = value.get("name").and_then(Value::as_str).unwrap_or("Error");
            match value.get("message").and_then(Value::as_str) {
                Some(message) if !message.is_empty() => format!("{}: {}", name, message),
                _ => name.to_string(),
            }
        }
        other => other.to_string(),
    }
}

fn stringify_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => value.to_string(),
        other => display_value(other),
    }
}
