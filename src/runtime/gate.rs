use regex::Regex;
use std::sync::OnceLock;

use crate::common::events::{EnrichedEvent, PageInfo};

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]", "::1"];

/// 投递闸门所需的环境分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateEnvironment {
    pub is_local: bool,
    pub is_robot: bool,
    /// 允许上报的国家代码；未知国家同样视为允许
    pub allowed_country: String,
    pub has_endpoint: bool,
}

impl GateEnvironment {
    /// 根据页面信息推断 `is_local` / `is_robot`，`force_*` 可覆盖推断结果
    pub fn classify(
        page: &PageInfo,
        allowed_country: &str,
        has_endpoint: bool,
        force_local: Option<bool>,
        force_robot: Option<bool>,
    ) -> Self {
        Self {
            is_local: force_local.unwrap_or_else(|| is_local_host(&page.hostname)),
            is_robot: force_robot.unwrap_or_else(|| is_robot(&page.user_agent)),
            allowed_country: allowed_country.to_string(),
            has_endpoint,
        }
    }
}

/// 没有页面上下文、回环地址或 192.* 内网地址均视为本地
pub fn is_local_host(hostname: &str) -> bool {
    let host = hostname.trim().to_ascii_lowercase();
    host.is_empty() || LOOPBACK_HOSTS.contains(&host.as_str()) || host.contains("192.")
}

pub fn is_robot(user_agent: &str) -> bool {
    static ROBOT_PATTERN: OnceLock<Regex> = OnceLock::new();
    ROBOT_PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)bot|googlebot|crawler|spider|robot|crawling")
                .expect("robot pattern is valid")
        })
        .is_match(user_agent)
}

pub fn country_eligible(country: Option<&str>, allowed_country: &str) -> bool {
    match country {
        None => true,
        Some(code) if code.is_empty() => true,
        Some(code) => code.eq_ignore_ascii_case(allowed_country),
    }
}

/// 是否抑制网络投递（改为本地诊断输出）
///
/// 任一条件成立即抑制：本地环境、爬虫、国家不符、未配置上报地址。
pub fn should_suppress(event: &EnrichedEvent, env: &GateEnvironment) -> bool {
    env.is_local
        || env.is_robot
        || !country_eligible(event.country.as_deref(), &env.allowed_country)
        || !env.has_endpoint
}
