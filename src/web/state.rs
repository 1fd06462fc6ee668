use crate::config::IngressSettings;
use crate::runtime::monitor::Monitor;

/// 采集入口全局状态
///
/// 职责：持有唯一的 Monitor 实例，通过 Arc 注入到 Axum 的 Handler 中。
#[derive(Clone)]
pub struct AppState {
    pub monitor: Monitor,
    pub limits: IngressSettings,
}
