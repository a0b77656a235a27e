// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 环境变量适配
//!
//! 把 CGI 风格的服务器环境变量表转换为 `ServerRequest`：
//! 1. `HTTP_` 前缀的变量以及少数特殊变量（`CONTENT_TYPE` 等）成为请求头部。
//! 2. `HTTPS`、`HTTP_HOST`/`SERVER_NAME`、`SERVER_PORT`、`REQUEST_URI`、`QUERY_STRING` 组成 URI。
//! 3. 整张环境变量表作为服务器参数保留在请求中。

use bytes::Bytes;
use chrono::Utc;
use log::debug;
use serde_json::{Map, Value};

use crate::{
    cookies::CookieBag,
    exception::Exception,
    headers::HeaderBag,
    message::BodySource,
    param::SPECIAL_ENV_HEADERS,
    server_request::{ServerRequest, ServerRequestParts},
    stream::ByteStream,
    uri::{split_host_port, Uri, UriParts},
};

const DEFAULT_PORT: u16 = 80;

/// 有序的环境变量表，键区分大小写。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    entries: Vec<(String, String)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut env = Self::new();
        for (key, value) in pairs {
            env.set(key.as_ref(), value.as_ref());
        }
        env
    }

    /// 模拟一次本地 `GET` 请求的环境，`overrides` 中的键覆盖默认值。
    pub fn mock<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let now = Utc::now();
        let request_time = now.timestamp().to_string();
        let request_time_float = format!("{:.4}", now.timestamp_micros() as f64 / 1_000_000.0);
        let mut env = Self::from_pairs([
            ("SERVER_PROTOCOL", "HTTP/1.1"),
            ("REQUEST_METHOD", "GET"),
            ("SCRIPT_NAME", ""),
            ("REQUEST_URI", ""),
            ("QUERY_STRING", ""),
            ("SERVER_NAME", "localhost"),
            ("SERVER_PORT", "80"),
            ("HTTP_HOST", "localhost"),
            (
                "HTTP_ACCEPT",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
            ("HTTP_ACCEPT_LANGUAGE", "en-US,en;q=0.8"),
            ("HTTP_ACCEPT_CHARSET", "utf-8;q=0.7,*;q=0.3"),
            ("HTTP_USER_AGENT", "MY Framework"),
            ("REMOTE_ADDR", "127.0.0.1"),
            ("REQUEST_TIME", request_time.as_str()),
            ("REQUEST_TIME_FLOAT", request_time_float.as_str()),
        ]);
        for (key, value) in overrides {
            env.set(key.as_ref(), value.as_ref());
        }
        env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(i) => self.entries[i].1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn all(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 转为服务器参数表
    pub fn to_server_params(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

/// 从环境变量中挑出请求头部，`HTTP_CONTENT_LENGTH` 除外。
pub fn create_headers_from_env(env: &Environment) -> HeaderBag {
    let mut headers = HeaderBag::new();
    for (key, value) in env.all() {
        let upper = key.to_uppercase();
        let is_header = SPECIAL_ENV_HEADERS.contains(&upper.as_str()) || upper.starts_with("HTTP_");
        if is_header && upper != "HTTP_CONTENT_LENGTH" {
            headers.set(&upper, value);
        }
    }
    headers
}

/// 由环境变量还原请求 URI。
///
/// # 错误处理
/// `SERVER_PORT` 或主机中的端口不是合法端口号时返回 `InvalidPort`。
pub fn create_uri_from_env(env: &Environment) -> Result<Uri, Exception> {
    let scheme = match env.get("HTTPS") {
        None | Some("") | Some("off") => "http",
        Some(_) => "https",
    };

    let raw_host = env
        .get("HTTP_HOST")
        .or_else(|| env.get("SERVER_NAME"))
        .unwrap_or_default();
    let (host, host_port) = split_host_port(raw_host);
    let port_text = host_port.or_else(|| env.get("SERVER_PORT").filter(|p| !p.is_empty()));
    let port = match port_text {
        Some(text) => text
            .trim()
            .parse::<u16>()
            .map_err(|_| Exception::InvalidPort(text.to_string()))?,
        None => DEFAULT_PORT,
    };

    let request_uri = env.get("REQUEST_URI").unwrap_or_default();
    let request_uri = request_uri.split('#').next().unwrap_or_default();
    let (path, uri_query) = match request_uri.split_once('?') {
        Some((path, query)) => (path, query),
        None => (request_uri, ""),
    };
    let query = match env.get("QUERY_STRING") {
        Some(query) if !query.is_empty() => query,
        _ => uri_query,
    };
    debug!("由环境变量还原 URI：host={}, port={}, path={}", host, port, path);

    Uri::new(UriParts {
        scheme: scheme.to_string(),
        user: env.get("PHP_AUTH_USER").unwrap_or_default().to_string(),
        password: env.get("PHP_AUTH_PW").unwrap_or_default().to_string(),
        host: host.to_string(),
        port: Some(port),
        path: path.to_string(),
        query: query.to_string(),
        fragment: String::new(),
    })
}

/// 由环境变量与请求输入构造服务端请求，整张环境变量表作为服务器参数。
pub fn server_request_from_env(
    env: &Environment,
    body: impl Into<Bytes>,
) -> Result<ServerRequest, Exception> {
    let mut headers = create_headers_from_env(env);
    let cookies = match headers.get("Cookie") {
        Some(raw) => CookieBag::from_values(CookieBag::parse_from_raw_lines(raw)),
        None => CookieBag::new(),
    };
    if !cookies.is_empty() {
        headers.remove("Cookie");
    }
    ServerRequest::from_parts(ServerRequestParts {
        method: env.get("REQUEST_METHOD").unwrap_or("GET").to_string(),
        uri: create_uri_from_env(env)?,
        headers,
        cookies,
        server_params: env.to_server_params(),
        body: BodySource::Stream(ByteStream::input(body)),
        ..Default::default()
    })
}
