use serde::{Deserialize, Serialize};

/// 事件来源标签（每个事件恰好一个）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "rejectionhandled")]
    RejectionHandled,
    #[serde(rename = "unhandledrejection")]
    UnhandledRejection,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Error => "error",
            EventType::Network => "network",
            EventType::RejectionHandled => "rejectionhandled",
            EventType::UnhandledRejection => "unhandledrejection",
        }
    }
}

/// 规范化后的捕获事件
///
/// 构造后不可变；缺失字段一律为空字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: String,
    pub message: String,
    pub stack: String,
}

impl CapturedEvent {
    pub fn new(
        event_type: EventType,
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }
}

/// 页面上下文（由启动配置提供）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub href: String,
    pub hostname: String,
    pub user_agent: String,
}

/// 上报载荷：CapturedEvent 合并页面与网络上下文
///
/// 字段为显式白名单，不会转发任意对象图。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: String,
    pub message: String,
    pub stack: String,
    pub stacktrace: String,
    pub href: String,
    pub user_agent: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl EnrichedEvent {
    pub fn new(
        event: CapturedEvent,
        page: &PageInfo,
        ip: Option<String>,
        country: Option<String>,
        data: Option<String>,
    ) -> Self {
        let stacktrace = if event.stack.is_empty() {
            event.message.clone()
        } else {
            event.stack.clone()
        };
        Self {
            event_type: event.event_type,
            name: event.name,
            message: event.message,
            stack: event.stack,
            stacktrace,
            href: page.href.clone(),
            user_agent: page.user_agent.clone(),
            hostname: page.hostname.clone(),
            ip,
            country,
            data,
        }
    }
}
