use serde_json::Value;

pub const CODE_INGRESS_BAD_REQUEST: &str = "SIBYL-INGRESS-400";
pub const CODE_INGRESS_TOO_LARGE: &str = "SIBYL-INGRESS-413";

pub fn bad_request_json(details: &str) -> Value {
    error_json(CODE_INGRESS_BAD_REQUEST, "Invalid capture payload", Some(details))
}

pub fn payload_too_large_json(details: &str) -> Value {
    error_json(CODE_INGRESS_TOO_LARGE, "Capture payload too large", Some(details))
}

/// 调试构建返回详细信息，发布构建只返回安全提示
pub fn error_json(code: &str, safe_message: &str, details: Option<&str>) -> Value {
    let message = if cfg!(debug_assertions) {
        details.unwrap_or(safe_message)
    } else {
        safe_message
    };
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}
