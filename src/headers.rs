// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求头/响应头集合
//!
//! `HeaderBag` 以规范化后的键保存头部，保证 `Content-Type`、`content-type`、
//! `CONTENT_TYPE` 与 `HTTP_CONTENT_TYPE` 指向同一个条目。
//! 规范化规则：转小写、`_` 替换为 `-`、去掉开头的 `http-`。

use crate::{param::CRLF, util::ucwords};

/// 单个头部条目：首次写入时使用的原始键名，以及按顺序排列的值列表。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderEntry {
    original_key: String,
    values: Vec<String>,
}

impl HeaderEntry {
    pub fn original_key(&self) -> &str {
        &self.original_key
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// 有序的头部集合，插入顺序即序列化顺序。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderBag {
    entries: Vec<(String, HeaderEntry)>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 `(名称, 值)` 序列构造，后出现的同名头部覆盖先出现的。
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut bag = Self::new();
        for (key, value) in pairs {
            bag.set(key.as_ref(), value.as_ref());
        }
        bag
    }

    /// 头部名称规范化，重复的 `http-` 前缀会被全部去掉
    pub fn normalize_key(key: &str) -> String {
        let key = key.to_lowercase().replace('_', "-");
        let mut rest = key.as_str();
        while let Some(stripped) = rest.strip_prefix("http-") {
            rest = stripped;
        }
        rest.to_string()
    }

    fn position(&self, key: &str) -> Option<usize> {
        let normalized = Self::normalize_key(key);
        self.entries.iter().position(|(k, _)| *k == normalized)
    }

    /// 写入单个值，替换该名称原有的全部值。
    pub fn set(&mut self, key: &str, value: &str) {
        self.set_values(key, vec![value.to_string()]);
    }

    /// 写入一组值，替换该名称原有的全部值。
    pub fn set_values(&mut self, key: &str, values: Vec<String>) {
        let entry = HeaderEntry {
            original_key: key.to_string(),
            values,
        };
        match self.position(key) {
            Some(i) => self.entries[i].1 = entry,
            None => self.entries.push((Self::normalize_key(key), entry)),
        }
    }

    /// 追加一个值；只有空串被忽略（`"0"` 照常追加），名称不存在时等同于 `set`。
    pub fn add(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        match self.position(key) {
            Some(i) => self.entries[i].1.values.push(value.to_string()),
            None => self.set(key, value),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.position(key).map(|i| self.entries[i].1.values.as_slice())
    }

    /// 以 `,` 连接的值，名称不存在或没有值时返回 `None`。
    pub fn line(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(values) if !values.is_empty() => Some(values.join(",")),
            _ => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn remove(&mut self, key: &str) {
        if let Some(i) = self.position(key) {
            self.entries.remove(i);
        }
    }

    /// 以原始键名列出全部头部。
    pub fn all(&self) -> Vec<(&str, &[String])> {
        self.entries
            .iter()
            .map(|(_, e)| (e.original_key.as_str(), e.values.as_slice()))
            .collect()
    }

    /// 以规范化后再首字母大写的名称列出全部头部，值以 `,` 连接。
    pub fn lines(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, e)| (ucwords(k, '-'), e.values.join(",")))
            .collect()
    }

    /// 序列化为报文中的头部行，每行以 CRLF 结尾。
    pub fn to_header_lines(&self) -> String {
        self.lines()
            .into_iter()
            .map(|(name, value)| [name.as_str(), ": ", value.as_str(), CRLF].concat())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `Accept-Language` 中的语言列表，忽略第一个 `;` 之后的权重部分。
    pub fn accept_languages(&self) -> Vec<String> {
        self.comma_list("Accept-Language")
    }

    /// `Accept-Encoding` 中的编码列表，忽略第一个 `;` 之后的权重部分。
    pub fn accept_encodings(&self) -> Vec<String> {
        self.comma_list("Accept-Encoding")
    }

    fn comma_list(&self, key: &str) -> Vec<String> {
        let Some(value) = self.line(key) else {
            return Vec::new();
        };
        let value = match value.find(';') {
            Some(i) if i > 0 => &value[..i],
            _ => value.as_str(),
        };
        value.replace(' ', "").split(',').map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lookup_is_case_and_underscore_insensitive() {
        let mut headers = HeaderBag::new();
        headers.set("Content-Type", "text/html");
        assert!(headers.has("content-type"));
        assert!(headers.has("CONTENT_TYPE"));
        assert!(headers.has("HTTP_CONTENT_TYPE"));
        assert_eq!(headers.line("content_type").as_deref(), Some("text/html"));
    }

    #[test]
    fn test_set_replaces_and_keeps_position() {
        let mut headers = HeaderBag::from_pairs([("A", "1"), ("B", "2")]);
        headers.set("a", "3");
        let all = headers.all();
        assert_eq!(all[0].0, "a");
        assert_eq!(all[0].1, ["3".to_string()]);
        assert_eq!(all[1].0, "B");
    }

    #[test]
    fn test_add_appends_and_ignores_empty() {
        let mut headers = HeaderBag::new();
        headers.add("Accept", "");
        assert!(!headers.has("Accept"));
        headers.add("Accept", "text/html");
        headers.add("accept", "application/json");
        assert_eq!(headers.line("Accept").unwrap(), "text/html,application/json");
    }

    #[test]
    fn test_add_keeps_zero_value() {
        let mut headers = HeaderBag::new();
        headers.add("Max-Forwards", "0");
        assert_eq!(headers.line("Max-Forwards").unwrap(), "0");
        headers.add("Max-Forwards", "0");
        assert_eq!(headers.get("max-forwards").unwrap(), ["0", "0"]);
    }

    #[test]
    fn test_remove() {
        let mut headers = HeaderBag::from_pairs([("X-Token", "abc")]);
        headers.remove("x_token");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_to_header_lines_uses_canonical_names() {
        let mut headers = HeaderBag::new();
        headers.set("HTTP_USER_AGENT", "curl");
        headers.set_values("x-forwarded-for", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            headers.to_header_lines(),
            "User-Agent: curl\r\nX-Forwarded-For: a,b\r\n"
        );
    }

    #[test]
    fn test_accept_lists() {
        let headers = HeaderBag::from_pairs([
            ("Accept-Language", "zh-CN, en;q=0.8"),
            ("Accept-Encoding", "gzip, deflate, br"),
        ]);
        assert_eq!(headers.accept_languages(), vec!["zh-CN", "en"]);
        assert_eq!(headers.accept_encodings(), vec!["gzip", "deflate", "br"]);
        assert!(HeaderBag::new().accept_languages().is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(name in "(HTTP_|http-)?[A-Za-z_\\-]{0,24}") {
            let once = HeaderBag::normalize_key(&name);
            let twice = HeaderBag::normalize_key(&once);
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn prop_lookup_equivalence(name in "[a-z]{1,8}(-[a-z]{1,8}){0,2}") {
            let mut headers = HeaderBag::new();
            headers.set(&name, "v");
            prop_assert!(headers.has(&name.to_uppercase()));
            prop_assert!(headers.has(&name.replace('-', "_")));
            prop_assert!(headers.has(&ucwords(&name, '-')));
        }
    }
}
