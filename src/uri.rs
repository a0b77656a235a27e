// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # URI 值对象
//!
//! `Uri` 由协议、用户名、密码、主机、端口、路径、查询串、片段组成。
//! 所有 `with_*` 方法都返回新值，原值保持不变；路径、查询串与片段在写入时
//! 完成百分号编码，已经合法的 `%XX` 转义不会被重复编码。

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    exception::Exception,
    param::VALID_SCHEMES,
    util::{filter_path, filter_query},
};

lazy_static! {
    /// RFC 3986 附录 B 给出的分解正则
    static ref URI_PARTS: Regex =
        Regex::new(r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$").unwrap();
}

/// 构造 `Uri` 时使用的各组成部分，字段均为未经过滤的原始值。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UriParts {
    pub scheme: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    user: String,
    password: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
    fragment: String,
}

impl Default for Uri {
    fn default() -> Self {
        Self {
            scheme: String::new(),
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: None,
            path: "/".to_string(),
            query: String::new(),
            fragment: String::new(),
        }
    }
}

impl Uri {
    /// 由各组成部分构造，逐一校验与编码；空路径补为 `/`。
    pub fn new(parts: UriParts) -> Result<Self, Exception> {
        let scheme = if parts.scheme.is_empty() {
            String::new()
        } else {
            filter_scheme(&parts.scheme)?
        };
        let path = if parts.path.is_empty() {
            "/".to_string()
        } else {
            filter_path(&parts.path)
        };
        Ok(Self {
            scheme,
            user: parts.user,
            password: parts.password,
            host: parts.host,
            port: filter_port(parts.port)?,
            path,
            query: filter_query(&parts.query),
            fragment: filter_query(&parts.fragment),
        })
    }

    /// 从字符串分解出各组成部分。
    pub fn parse(text: &str) -> Result<Self, Exception> {
        let caps = URI_PARTS
            .captures(text)
            .ok_or_else(|| Exception::InvalidUri(text.to_string()))?;
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let mut parts = UriParts {
            scheme: group(1).to_string(),
            path: group(3).to_string(),
            query: group(4).to_string(),
            fragment: group(5).to_string(),
            ..Default::default()
        };

        if let Some(authority) = caps.get(2).map(|m| m.as_str()) {
            let host_port = match authority.rsplit_once('@') {
                Some((user_info, rest)) => {
                    match user_info.split_once(':') {
                        Some((user, password)) => {
                            parts.user = user.to_string();
                            parts.password = password.to_string();
                        }
                        None => parts.user = user_info.to_string(),
                    }
                    rest
                }
                None => authority,
            };
            let (host, port) = split_host_port(host_port);
            parts.host = host.to_string();
            if let Some(port) = port {
                parts.port = Some(parse_port(port)?);
            }
        }

        Self::new(parts)
    }

    /// 路径与查询串，即请求行中的请求目标
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            [self.path.as_str(), "?", self.query.as_str()].concat()
        }
    }

    pub fn with_scheme(&self, scheme: &str) -> Result<Self, Exception> {
        let scheme = filter_scheme(scheme)?;
        let mut clone = self.clone();
        clone.scheme = scheme;
        Ok(clone)
    }

    /// `[user[:password]@]host[:port]`
    pub fn authority(&self) -> String {
        let user_info = self.user_info();
        let mut authority = String::new();
        if !user_info.is_empty() {
            authority.push_str(&user_info);
            authority.push('@');
        }
        authority.push_str(&self.host);
        if let Some(port) = self.port() {
            authority.push(':');
            authority.push_str(&port.to_string());
        }
        authority
    }

    pub fn user_info(&self) -> String {
        if self.password.is_empty() {
            self.user.clone()
        } else {
            [self.user.as_str(), ":", self.password.as_str()].concat()
        }
    }

    pub fn with_user_info(&self, user: &str, password: Option<&str>) -> Self {
        let mut clone = self.clone();
        clone.user = user.to_string();
        clone.password = password.unwrap_or_default().to_string();
        clone
    }

    pub fn with_host(&self, host: &str) -> Self {
        let mut clone = self.clone();
        clone.host = host.to_string();
        clone
    }

    /// 端口；等于协议标准端口（http:80、https:443）时返回 `None`。
    pub fn port(&self) -> Option<u16> {
        match self.port {
            Some(port) if !self.has_standard_port() => Some(port),
            _ => None,
        }
    }

    /// 未经标准端口折叠的原始端口
    pub fn raw_port(&self) -> Option<u16> {
        self.port
    }

    pub fn with_port(&self, port: Option<u16>) -> Result<Self, Exception> {
        let port = filter_port(port)?;
        let mut clone = self.clone();
        clone.port = port;
        Ok(clone)
    }

    fn has_standard_port(&self) -> bool {
        matches!(
            (self.scheme.as_str(), self.port),
            ("http", Some(80)) | ("https", Some(443))
        )
    }

    pub fn with_path(&self, path: &str) -> Self {
        let mut clone = self.clone();
        clone.path = filter_path(path);
        clone
    }

    /// 开头的 `?` 会被去掉
    pub fn with_query(&self, query: &str) -> Self {
        let mut clone = self.clone();
        clone.query = filter_query(query.trim_start_matches('?'));
        clone
    }

    /// 开头的 `#` 会被去掉
    pub fn with_fragment(&self, fragment: &str) -> Self {
        let mut clone = self.clone();
        clone.fragment = filter_query(fragment.trim_start_matches('#'));
        clone
    }

    /// `scheme:` 加 `//authority`，不含路径
    pub fn base_url(&self) -> String {
        let mut url = String::new();
        if !self.scheme.is_empty() {
            url.push_str(&self.scheme);
            url.push(':');
        }
        let authority = self.authority();
        if !authority.is_empty() {
            url.push_str("//");
            url.push_str(&authority);
        }
        url
    }
}

// --- Getter 访问器实现 ---
impl Uri {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base_url(), self.path.trim_start_matches('/'))?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Uri {
    type Err = Exception;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::parse(s)
    }
}

fn filter_scheme(scheme: &str) -> Result<String, Exception> {
    let scheme = scheme.to_lowercase().replace("://", "");
    if VALID_SCHEMES.contains(&scheme.as_str()) {
        Ok(scheme)
    } else {
        Err(Exception::InvalidScheme(scheme))
    }
}

fn filter_port(port: Option<u16>) -> Result<Option<u16>, Exception> {
    match port {
        Some(0) => Err(Exception::InvalidPort("0".to_string())),
        other => Ok(other),
    }
}

fn parse_port(text: &str) -> Result<u16, Exception> {
    match text.parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(port as u16),
        _ => Err(Exception::InvalidPort(text.to_string())),
    }
}

/// 拆分 `host[:port]`，兼容 `[v6]:port` 形式；端口为空时视为没有端口。
pub(crate) fn split_host_port(text: &str) -> (&str, Option<&str>) {
    if text.starts_with('[') {
        if let Some(end) = text.find(']') {
            let host = &text[..=end];
            return match text[end + 1..].strip_prefix(':') {
                Some(port) if !port.is_empty() => (host, Some(port)),
                _ => (host, None),
            };
        }
    }
    match text.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() => (host, Some(port)),
        Some((host, _)) => (host, None),
        None => (text, None),
    }
}
