// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Cookie 集合
//!
//! 1. 每个 Cookie 的属性都与集合级别的默认值合并，未显式给出的属性取默认值。
//! 2. 响应侧序列化为 `Set-Cookie` 值，属性顺序固定：domain、path、expires、secure、HostOnly、HttpOnly。
//! 3. 请求侧序列化为单行 `Cookie` 值：`a=1; b=2`。
//! 4. 解析原始 `Cookie` 头时，同名 Cookie 只保留第一次出现的值。

use lazy_static::lazy_static;
use regex::Regex;

use crate::util::{format_cookie_date, parse_timestamp, url_decode, url_encode};

lazy_static! {
    static ref COOKIE_SEPARATOR: Regex = Regex::new(r";\s*").unwrap();
}

/// Cookie 过期时间：时间戳或日期字符串。
#[derive(Debug, Clone, PartialEq)]
pub enum CookieExpires {
    Timestamp(i64),
    Date(String),
}

impl CookieExpires {
    /// 折算为 Unix 时间戳；无法识别的日期字符串折算为 0。
    pub fn timestamp(&self) -> i64 {
        match self {
            CookieExpires::Timestamp(ts) => *ts,
            CookieExpires::Date(text) => parse_timestamp(text),
        }
    }
}

/// 一个 Cookie 的完整属性集。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cookie {
    pub value: String,
    pub domain: Option<String>,
    pub host_only: Option<bool>,
    pub path: Option<String>,
    pub expires: Option<CookieExpires>,
    pub secure: bool,
    pub http_only: bool,
}

/// 部分属性，`None` 的字段在合并时取默认值。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CookieOptions {
    pub value: Option<String>,
    pub domain: Option<String>,
    pub host_only: Option<bool>,
    pub path: Option<String>,
    pub expires: Option<CookieExpires>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
}

impl From<&str> for CookieOptions {
    fn from(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Default::default()
        }
    }
}

impl From<String> for CookieOptions {
    fn from(value: String) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }
}

impl From<Cookie> for CookieOptions {
    fn from(cookie: Cookie) -> Self {
        Self {
            value: Some(cookie.value),
            domain: cookie.domain,
            host_only: cookie.host_only,
            path: cookie.path,
            expires: cookie.expires,
            secure: Some(cookie.secure),
            http_only: Some(cookie.http_only),
        }
    }
}

impl Cookie {
    /// 以 `defaults` 为底，用 `options` 中给出的字段覆盖。
    pub fn merged(defaults: &Cookie, options: CookieOptions) -> Cookie {
        Cookie {
            value: options.value.unwrap_or_else(|| defaults.value.clone()),
            domain: options.domain.or_else(|| defaults.domain.clone()),
            host_only: options.host_only.or(defaults.host_only),
            path: options.path.or_else(|| defaults.path.clone()),
            expires: options.expires.or_else(|| defaults.expires.clone()),
            secure: options.secure.unwrap_or(defaults.secure),
            http_only: options.http_only.unwrap_or(defaults.http_only),
        }
    }
}

/// 有序的 Cookie 集合。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CookieBag {
    defaults: Cookie,
    entries: Vec<(String, Cookie)>,
}

impl CookieBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 `(名称, 值)` 序列构造。
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut bag = Self::new();
        for (name, value) in values {
            bag.set(name.as_ref(), value.as_ref());
        }
        bag
    }

    /// 覆盖集合级别的默认属性，只影响之后写入的 Cookie。
    pub fn set_defaults(&mut self, settings: CookieOptions) {
        self.defaults = Cookie::merged(&self.defaults, settings);
    }

    pub fn defaults(&self) -> &Cookie {
        &self.defaults
    }

    /// 写入或替换一个 Cookie。
    pub fn set(&mut self, name: &str, value: impl Into<CookieOptions>) {
        let cookie = Cookie::merged(&self.defaults, value.into());
        match self.entries.iter().position(|(k, _)| k == name) {
            Some(i) => self.entries[i].1 = cookie,
            None => self.entries.push((name.to_string(), cookie)),
        }
    }

    /// 写入一个属性完整的 Cookie，不与默认值合并。
    pub fn set_cookie(&mut self, name: &str, cookie: Cookie) {
        match self.entries.iter().position(|(k, _)| k == name) {
            Some(i) => self.entries[i].1 = cookie,
            None => self.entries.push((name.to_string(), cookie)),
        }
    }

    /// 仅当名称不存在时写入。
    pub fn add(&mut self, name: &str, value: impl Into<CookieOptions>) {
        if !self.has(name) {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, c)| c)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|c| c.value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(k, _)| k != name);
    }

    /// 名称到值的列表
    pub fn all(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|(k, c)| (k.as_str(), c.value.as_str()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cookie)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 每个 Cookie 一条 `Set-Cookie` 值
    pub fn to_headers(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(name, cookie)| Self::to_header_line(name, cookie))
            .collect()
    }

    /// 渲染单条 `Set-Cookie` 值。
    pub fn to_header_line(name: &str, cookie: &Cookie) -> String {
        let mut result = [url_encode(name), "=".to_string(), url_encode(&cookie.value)].concat();
        if let Some(domain) = &cookie.domain {
            result.push_str("; domain=");
            result.push_str(domain);
        }
        if let Some(path) = &cookie.path {
            result.push_str("; path=");
            result.push_str(path);
        }
        if let Some(expires) = &cookie.expires {
            let timestamp = expires.timestamp();
            if timestamp != 0 {
                if let Some(date) = format_cookie_date(timestamp) {
                    result.push_str("; expires=");
                    result.push_str(&date);
                }
            }
        }
        if cookie.secure {
            result.push_str("; secure");
        }
        if cookie.host_only == Some(true) {
            result.push_str("; HostOnly");
        }
        if cookie.http_only {
            result.push_str("; HttpOnly");
        }
        result
    }

    /// 渲染请求侧的 `Cookie` 值，没有 Cookie 时返回空串。
    pub fn to_request_header(&self) -> String {
        self.entries
            .iter()
            .map(|(name, cookie)| [url_encode(name), "=".to_string(), url_encode(&cookie.value)].concat())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// 解析原始 `Cookie` 头文本，返回按出现顺序排列的 `(名称, 值)`。
    ///
    /// 没有 `=` 的片段被忽略；同名 Cookie 只保留第一次出现的值。
    pub fn parse_from_raw_header(text: &str) -> Vec<(String, String)> {
        let mut cookies: Vec<(String, String)> = Vec::new();
        let text = text.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            return cookies;
        }
        for piece in COOKIE_SEPARATOR.split(text) {
            let Some((key, value)) = piece.split_once('=') else {
                continue;
            };
            let key = url_decode(key);
            if cookies.iter().any(|(k, _)| *k == key) {
                continue;
            }
            cookies.push((key, url_decode(value)));
        }
        cookies
    }

    /// 以头部值列表为输入，只解析第一个值。
    pub fn parse_from_raw_lines(lines: &[String]) -> Vec<(String, String)> {
        match lines.first() {
            Some(first) => Self::parse_from_raw_header(first),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_value_merges_defaults() {
        let mut cookies = CookieBag::new();
        cookies.set_defaults(CookieOptions {
            path: Some("/".to_string()),
            http_only: Some(true),
            ..Default::default()
        });
        cookies.set("sid", "abc");
        let cookie = cookies.get("sid").unwrap();
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert!(cookie.http_only);
        assert!(!cookie.secure);
        assert_eq!(cookie.domain, None);
    }

    #[test]
    fn test_set_cookie_skips_defaults() {
        let mut cookies = CookieBag::new();
        cookies.set_defaults(CookieOptions {
            secure: Some(true),
            ..Default::default()
        });
        cookies.set_cookie(
            "t",
            Cookie {
                value: "1".to_string(),
                ..Default::default()
            },
        );
        assert!(!cookies.get("t").unwrap().secure);
    }

    #[test]
    fn test_add_does_not_replace() {
        let mut cookies = CookieBag::new();
        cookies.add("a", "1");
        cookies.add("a", "2");
        assert_eq!(cookies.value("a"), Some("1"));
        cookies.set("a", "3");
        assert_eq!(cookies.value("a"), Some("3"));
    }

    #[test]
    fn test_set_cookie_attribute_order() {
        let cookie = Cookie {
            value: "a b".to_string(),
            domain: Some("example.com".to_string()),
            host_only: Some(true),
            path: Some("/app".to_string()),
            expires: Some(CookieExpires::Timestamp(1_700_000_000)),
            secure: true,
            http_only: true,
        };
        assert_eq!(
            CookieBag::to_header_line("session id", &cookie),
            "session+id=a+b; domain=example.com; path=/app; expires=Tue, 14-Nov-2023 22:13:20 UTC; secure; HostOnly; HttpOnly"
        );
    }

    #[test]
    fn test_zero_or_unparsable_expires_is_suppressed() {
        let mut cookie = Cookie {
            value: "v".to_string(),
            expires: Some(CookieExpires::Timestamp(0)),
            ..Default::default()
        };
        assert_eq!(CookieBag::to_header_line("k", &cookie), "k=v");
        cookie.expires = Some(CookieExpires::Date("someday".to_string()));
        assert_eq!(CookieBag::to_header_line("k", &cookie), "k=v");
        cookie.expires = Some(CookieExpires::Date("2023-11-14 22:13:20".to_string()));
        assert_eq!(
            CookieBag::to_header_line("k", &cookie),
            "k=v; expires=Tue, 14-Nov-2023 22:13:20 UTC"
        );
    }

    #[test]
    fn test_to_request_header() {
        let cookies = CookieBag::from_values([("a", "1"), ("b", "x y")]);
        assert_eq!(cookies.to_request_header(), "a=1; b=x+y");
        assert_eq!(CookieBag::new().to_request_header(), "");
    }

    #[test]
    fn test_parse_keeps_first_duplicate() {
        let parsed = CookieBag::parse_from_raw_header("a=1; b=2; a=3");
        assert_eq!(
            parsed,
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_parse_decodes_and_skips_bare_pieces() {
        let parsed = CookieBag::parse_from_raw_header("flag;name=J%C3%BCrgen+K;eq=a=b\r\n");
        assert_eq!(
            parsed,
            vec![
                ("name".to_string(), "Jürgen K".to_string()),
                ("eq".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_list_uses_first_element() {
        let lines = vec!["a=1".to_string(), "b=2".to_string()];
        assert_eq!(
            CookieBag::parse_from_raw_lines(&lines),
            vec![("a".to_string(), "1".to_string())]
        );
        assert!(CookieBag::parse_from_raw_lines(&[]).is_empty());
    }
}
