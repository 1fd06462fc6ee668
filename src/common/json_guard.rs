/// 采集入口的请求体预检：在交给 serde 之前拒绝超长、空白或嵌套过深的上报
///
/// 返回的错误文本直接写进 400 / 413 响应，`"payload too large"` 对应 413。
pub fn check_json_limits(
    input: &str,
    max_len: usize,
    max_depth: usize,
) -> Result<(), &'static str> {
    if input.len() > max_len {
        return Err("payload too large");
    }
    if input.trim().is_empty() {
        return Err("payload is empty");
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for byte in input.bytes() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match byte {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > max_depth {
                    return Err("payload nested too deeply");
                }
            }
            b'}' | b']' => {
                if depth == 0 {
                    return Err("payload structure invalid");
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    if depth != 0 || in_string {
        return Err("payload structure invalid");
    }

    Ok(())
}
