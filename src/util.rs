// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 通用工具函数
//!
//! 1. URL 编解码：`url_encode`（空格编码为 `+`）、`raw_url_encode`（空格编码为 `%20`）、`url_decode`。
//! 2. URI 组件过滤：对允许字符集之外的字符做百分号编码，但不重复编码已有的 `%XX`。
//! 3. Cookie 日期：时间戳格式化与宽松的日期字符串解析。
//! 4. 查询字符串解码：支持 `a[]=1&a[k]=2` 形式的嵌套键。

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref PATH_FILTER: Regex = Regex::new(r"[^a-zA-Z0-9_\-\.~:@&=\+\$,/;%]+|%").unwrap();
    static ref QUERY_FILTER: Regex =
        Regex::new(r"[^a-zA-Z0-9_\-\.~!\$&'\(\)\*\+,;=%:@/\?]+|%").unwrap();
    static ref MEDIA_TYPE_SEPARATOR: Regex = Regex::new(r"\s*[;,]\s*").unwrap();
    static ref RELATIVE_TIME: Regex =
        Regex::new(r"(?i)^([+-]?\d+)\s*(second|sec|minute|min|hour|day|week)s?$").unwrap();
    static ref BRACKET_SEGMENT: Regex = Regex::new(r"\[([^\]]*)\]").unwrap();
}

/// Set-Cookie 中 `expires` 的输出格式，形如 `Thu, 01-Jan-2026 00:00:00 UTC`
const COOKIE_DATE_FORMAT: &str = "%a, %d-%b-%Y %H:%M:%S UTC";

/// 把每个以 `delimiter` 分隔的单词首字母转为大写，其余字符保持原样。
pub fn ucwords(input: &str, delimiter: char) -> String {
    let mut output = String::with_capacity(input.len());
    let mut capitalize = true;
    for c in input.chars() {
        if capitalize {
            output.extend(c.to_uppercase());
        } else {
            output.push(c);
        }
        capitalize = c == delimiter;
    }
    output
}

fn encode_with(input: &str, keep: impl Fn(u8) -> bool, space_as_plus: bool) -> String {
    let mut output = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if keep(b) {
            output.push(b as char);
        } else if b == b' ' && space_as_plus {
            output.push('+');
        } else {
            output.push_str(&format!("%{:02X}", b));
        }
    }
    output
}

/// 表单风格的 URL 编码，空格编码为 `+`。
pub fn url_encode(input: &str) -> String {
    encode_with(
        input,
        |b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'),
        true,
    )
}

/// RFC 3986 风格的 URL 编码，空格编码为 `%20`。
pub fn raw_url_encode(input: &str) -> String {
    encode_with(
        input,
        |b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'),
        false,
    )
}

/// URL 解码：`+` 还原为空格，非法的 `%` 转义原样保留。
pub fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => output.push(b' '),
            b'%' if is_hex_pair(&bytes[i + 1..]) => {
                let hex = &input[i + 1..i + 3];
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => output.push(b),
                    Err(_) => output.extend_from_slice(&bytes[i..i + 3]),
                }
                i += 2;
            }
            b => output.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&output).into_owned()
}

fn is_hex_pair(rest: &[u8]) -> bool {
    rest.len() >= 2 && rest[0].is_ascii_hexdigit() && rest[1].is_ascii_hexdigit()
}

fn filter_component(input: &str, filter: &Regex) -> String {
    let mut output = String::with_capacity(input.len());
    let mut last = 0;
    for m in filter.find_iter(input) {
        output.push_str(&input[last..m.start()]);
        if m.as_str() == "%" && is_hex_pair(&input.as_bytes()[m.end()..]) {
            output.push('%');
        } else {
            output.push_str(&raw_url_encode(m.as_str()));
        }
        last = m.end();
    }
    output.push_str(&input[last..]);
    output
}

/// 过滤 URI 路径：允许字符集之外的字符以及孤立的 `%` 会被编码。
pub fn filter_path(path: &str) -> String {
    filter_component(path, &PATH_FILTER)
}

/// 过滤 URI 查询串或片段。
pub fn filter_query(query: &str) -> String {
    filter_component(query, &QUERY_FILTER)
}

/// 以 `;` 或 `,` 切分 Content-Type，第一个元素是媒体类型，其余为参数。
pub fn split_media_type(content_type: &str) -> Vec<&str> {
    MEDIA_TYPE_SEPARATOR.split(content_type).collect()
}

/// 将 Unix 时间戳格式化为 Set-Cookie 的 `expires` 值。
pub fn format_cookie_date(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|date| date.format(COOKIE_DATE_FORMAT).to_string())
}

/// 把日期字符串转换为 Unix 时间戳，无法识别时返回 0。
///
/// 依次尝试：RFC 2822、RFC 3339、Cookie 日期格式、`YYYY-MM-DD HH:MM:SS`、
/// `YYYY-MM-DD`，以及 `+1 day` 这类相对当前时间的偏移量。
pub fn parse_timestamp(text: &str) -> i64 {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return date.timestamp();
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return date.timestamp();
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(text, COOKIE_DATE_FORMAT) {
        return date.and_utc().timestamp();
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return date.and_utc().timestamp();
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return midnight.and_utc().timestamp();
        }
    }
    if let Some(caps) = RELATIVE_TIME.captures(text) {
        let amount: i64 = caps[1].parse().unwrap_or(0);
        let offset = match caps[2].to_lowercase().as_str() {
            "second" | "sec" => Duration::seconds(amount),
            "minute" | "min" => Duration::minutes(amount),
            "hour" => Duration::hours(amount),
            "day" => Duration::days(amount),
            _ => Duration::weeks(amount),
        };
        return (Utc::now() + offset).timestamp();
    }
    debug!("无法识别的日期字符串：{}", text);
    0
}

/// HTML 特殊字符转义
pub fn html_escape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#039;"),
            c => output.push(c),
        }
    }
    output
}

/// 解码 `application/x-www-form-urlencoded` 文本。
///
/// 同名键后者覆盖前者；`a[]` 追加到数组，`a[k]` 写入嵌套对象；
/// 顶层键名中的 `.` 和空格会被替换为 `_`。
pub fn parse_query_string(input: &str) -> Map<String, Value> {
    let mut root = Value::Object(Map::new());
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(input) {
        Ok(pairs) => pairs,
        Err(e) => {
            debug!("查询字符串解码失败：{}", e);
            return Map::new();
        }
    };
    for (key, value) in pairs {
        if key.is_empty() {
            continue;
        }
        let (base, segments) = split_bracket_key(&key);
        let mut path = Vec::with_capacity(segments.len() + 1);
        path.push(base.replace(['.', ' '], "_"));
        path.extend(segments);
        assign_nested(&mut root, &path, value);
    }
    match root {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn split_bracket_key(key: &str) -> (String, Vec<String>) {
    let Some(open) = key.find('[') else {
        return (key.to_string(), Vec::new());
    };
    if open == 0 || !key.ends_with(']') {
        return (key.to_string(), Vec::new());
    }
    let segments = BRACKET_SEGMENT
        .captures_iter(&key[open..])
        .map(|caps| caps[1].to_string())
        .collect();
    (key[..open].to_string(), segments)
}

fn assign_nested(slot: &mut Value, path: &[String], value: String) {
    let Some((head, rest)) = path.split_first() else {
        *slot = Value::String(value);
        return;
    };
    if head.is_empty() {
        if !slot.is_array() && !slot.is_object() {
            *slot = Value::Array(Vec::new());
        }
        match slot {
            Value::Array(items) => {
                items.push(Value::Null);
                if let Some(last) = items.last_mut() {
                    assign_nested(last, rest, value);
                }
            }
            Value::Object(map) => {
                let key = map.len().to_string();
                let entry = map.entry(key).or_insert(Value::Null);
                assign_nested(entry, rest, value);
            }
            _ => {}
        }
        return;
    }
    if let Value::Array(items) = slot {
        let map: Map<String, Value> = items
            .drain(..)
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *slot = Value::Object(map);
    }
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        let entry = map.entry(head.clone()).or_insert(Value::Null);
        assign_nested(entry, rest, value);
    }
}
