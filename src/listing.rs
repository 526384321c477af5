//! 静态文件回退：无 index.html 的目录输出 HTML 列表，其余回 404。

use axum::http::{Method, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use std::fmt::Write as _;

use crate::error::ApiError;
use crate::storage::Storage;

/// 仅对 GET/HEAD 且目标为目录的请求生成列表。
pub async fn serve_listing(storage: &Storage, method: Method, uri: Uri) -> Result<Response, ApiError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(not_found());
    }
    let path = percent_decode(uri.path()).ok_or_else(not_found)?;
    let entries = storage
        .list_dir(path.trim_start_matches('/'))
        .await
        .map_err(|_| not_found())?;
    if !path.ends_with('/') {
        return Ok(Redirect::permanent(&format!("{}/", uri.path())).into_response());
    }

    let title = format!("Directory listing for {}", escape_html(&path));
    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for entry in entries {
        let name = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name
        };
        let _ = writeln!(
            page,
            "<li><a href=\"{}\">{}</a></li>",
            escape_html(&encode_href(&name)),
            escape_html(&name)
        );
    }
    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(Html(page).into_response())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".into())
}

/// 解码 URL 路径中的 `%XX`；非法序列或非 UTF-8 返回 `None`。
fn percent_decode(path: &str) -> Option<String> {
    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let hex = path.get(index + 1..index + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

fn encode_href(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '%' => encoded.push_str("%25"),
            ' ' => encoded.push_str("%20"),
            '#' => encoded.push_str("%23"),
            '?' => encoded.push_str("%3F"),
            _ => encoded.push(ch),
        }
    }
    encoded
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
