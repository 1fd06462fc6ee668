use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use crate::common::events::PageInfo;

pub const DEFAULT_TRACE_URL: &str = "https://www.cloudflare.com/cdn-cgi/trace";

/// 应用配置总结构
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub ingress: IngressSettings,
    pub monitor: MonitorSettings,
    pub page: PageSettings,
    pub trace: TraceSettings,
    pub rate_limit: RateLimitSettings,
}

/// 采集入口监听地址
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// 采集入口请求体限制
#[derive(Debug, Deserialize, Clone)]
pub struct IngressSettings {
    pub max_body_bytes: usize,
    pub max_depth: usize,
}

/// 上报相关配置
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorSettings {
    /// 上报地址；为空时尝试从 `script_url` 的 `endpoint` 查询参数中解析
    pub endpoint: Option<String>,
    /// 加载监控脚本时使用的 URL
    pub script_url: Option<String>,
    /// 允许上报的国家代码
    pub allowed_country: String,
    /// 覆盖本地环境判定
    pub force_local: Option<bool>,
    /// 覆盖爬虫判定
    pub force_robot: Option<bool>,
}

/// 被监控页面的信息
#[derive(Debug, Deserialize, Clone)]
pub struct PageSettings {
    pub href: String,
    pub hostname: String,
    pub user_agent: String,
}

impl PageSettings {
    pub fn to_page_info(&self) -> PageInfo {
        PageInfo {
            href: self.href.clone(),
            hostname: self.hostname.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TraceSettings {
    pub url: String,
    pub timeout_ms: u64,
}

/// 限流：每 `per_ms` 毫秒最多 `to` 次上报
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    pub to: u32,
    pub per_ms: u64,
}

impl Settings {
    /// 加载配置：支持默认值、可选配置文件、环境变量覆盖
    pub fn new() -> anyhow::Result<Self> {
        let builder = Self::defaults()?
            .add_source(File::with_name("sibyl").required(false))
            .add_source(Environment::with_prefix("SIBYL").separator("__"));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 从指定文件加载（不读取环境变量）
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config = Self::defaults()?
            .add_source(File::from(path))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn defaults() -> anyhow::Result<ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 7070)?
            .set_default("ingress.max_body_bytes", 64 * 1024)?
            .set_default("ingress.max_depth", 32)?
            .set_default::<&str, Option<String>>("monitor.endpoint", None)?
            .set_default::<&str, Option<String>>("monitor.script_url", None)?
            .set_default("monitor.allowed_country", "FR")?
            .set_default::<&str, Option<bool>>("monitor.force_local", None)?
            .set_default::<&str, Option<bool>>("monitor.force_robot", None)?
            .set_default("page.href", "")?
            .set_default("page.hostname", "")?
            .set_default("page.user_agent", "")?
            .set_default("trace.url", DEFAULT_TRACE_URL)?
            // trace 请求超时 5 秒
            .set_default("trace.timeout_ms", 5000)?
            .set_default("rate_limit.to", 3)?
            .set_default("rate_limit.per_ms", 30_000)?)
    }

    /// 解析上报地址：优先 `monitor.endpoint`，其次脚本 URL 的 `endpoint` 参数
    pub fn resolve_endpoint(&self) -> Option<Url> {
        let explicit = self
            .monitor
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        let raw = explicit.or_else(|| {
            self.monitor
                .script_url
                .as_deref()
                .and_then(endpoint_from_script_url)
        })?;
        match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("[Config] Ignoring invalid endpoint {}: {}", raw, e);
                None
            }
        }
    }
}

/// 从脚本 URL 的查询参数中取出 `endpoint`（已做百分号解码）
pub fn endpoint_from_script_url(script_url: &str) -> Option<String> {
    let url = Url::parse(script_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "endpoint")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
