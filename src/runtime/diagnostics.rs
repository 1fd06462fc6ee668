pub const APP_NAME: &str = "[Sibyl Monitoring System]";

/// 本地诊断输出通道（被抑制的事件、远端返回的错误等）
pub trait Diagnostics: Send + Sync {
    fn log(&self, message: &str);
    fn error(&self, message: &str);
}

/// 本地输出行统一带上产品前缀
pub fn prefixed(message: &str) -> String {
    format!("{} {}", APP_NAME, message)
}

pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log(&self, message: &str) {
        tracing::info!(target: "sibyl_core::dev", "{}", prefixed(message));
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "sibyl_core::dev", "{}", prefixed(message));
    }
}
