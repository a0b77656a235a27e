// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求模块
//!
//! 该模块定义客户端视角的 `Request` 以及请求类消息共享的 `RequestMessage` 特征：
//! 1. 请求方法：原始方法与经过 `X-Http-Method-Override` 覆盖后的方法。
//! 2. 请求 URI 与 `Host` 头部的同步。
//! 3. 请求目标（request-target）：默认为 `path?query`，可显式替换。
//! 4. 常用请求头辅助方法：内容类型、字符集、长度、Ajax/PJAX/WebSocket 识别等。

use std::fmt;

use log::warn;

use crate::{
    exception::Exception,
    headers::HeaderBag,
    message::{BodySource, Message, MessageCore},
    param::{HttpRequestMethod, CRLF, METHOD_OVERRIDE_HEADER},
    uri::Uri,
    util::split_media_type,
};

/// 请求类消息共有的字段
#[derive(Debug, Clone, Default)]
pub struct RequestCore {
    original_method: HttpRequestMethod,
    /// 由 `with_method` 显式设置的方法，优先于任何覆盖规则
    method: Option<HttpRequestMethod>,
    uri: Uri,
    request_target: Option<String>,
}

impl RequestCore {
    pub fn new(method: &str, uri: Uri) -> Result<Self, Exception> {
        Ok(Self {
            original_method: method.parse()?,
            method: None,
            uri,
            request_target: None,
        })
    }

    pub fn original_method(&self) -> HttpRequestMethod {
        self.original_method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// `with_method` 显式设置的方法
    pub fn explicit_method(&self) -> Option<HttpRequestMethod> {
        self.method
    }

    /// 构造时同步 `Host`：URI 主机非空时以 URI 为准，否则保留原有头部。
    pub(crate) fn sync_host(&self, headers: &mut HeaderBag) {
        if let Some(host) = host_header(&self.uri) {
            headers.set("Host", &host);
        }
    }
}

/// URI 对应的 `Host` 值，非标准端口会附加在主机之后；主机为空时返回 `None`。
pub(crate) fn host_header(uri: &Uri) -> Option<String> {
    let host = uri.host();
    if host.is_empty() {
        return None;
    }
    Some(match uri.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// 请求与服务端请求共有的行为。
pub trait RequestMessage: Message {
    fn request_core(&self) -> &RequestCore;

    fn request_core_mut(&mut self) -> &mut RequestCore;

    fn original_method(&self) -> HttpRequestMethod {
        self.request_core().original_method
    }

    /// 生效的请求方法。
    ///
    /// `with_method` 设置的方法优先；否则 `X-Http-Method-Override` 头部中的方法覆盖原始方法。
    ///
    /// # 错误处理
    /// 覆盖头部中的方法不在允许列表中时返回 `UnSupportedRequestMethod`。
    fn method(&self) -> Result<HttpRequestMethod, Exception> {
        let core = self.request_core();
        if let Some(method) = core.method {
            return Ok(method);
        }
        Ok(header_override(self.headers())?.unwrap_or(core.original_method))
    }

    /// 方法名比较不区分大小写
    fn is_method(&self, method: &str) -> Result<bool, Exception> {
        Ok(self.method()?.to_string() == method.to_uppercase())
    }

    fn with_method(&self, method: &str) -> Result<Self, Exception> {
        let method: HttpRequestMethod = method.parse()?;
        let mut clone = self.clone();
        let core = clone.request_core_mut();
        core.original_method = method;
        core.method = Some(method);
        Ok(clone)
    }

    fn uri(&self) -> &Uri {
        &self.request_core().uri
    }

    /// 返回使用新 URI 的副本，并按需同步 `Host` 头部。
    ///
    /// `preserve_host` 为真时，只有在原 `Host` 缺失或为空、且新 URI 主机非空时才更新。
    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let host = host_header(&uri).filter(|_| !preserve_host || self.header_line("Host").is_empty());
        let mut clone = self.clone();
        let core = clone.request_core_mut();
        core.uri = uri;
        core.request_target = None;
        if let Some(host) = host {
            clone.core_mut().headers_mut().set("Host", &host);
        }
        clone
    }

    fn request_target(&self) -> String {
        let core = self.request_core();
        match &core.request_target {
            Some(target) if !target.is_empty() => target.clone(),
            _ => core.uri.path_and_query(),
        }
    }

    /// # 错误处理
    /// 目标中含有任何空白字符时返回 `InvalidRequestTarget`。
    fn with_request_target(&self, target: &str) -> Result<Self, Exception> {
        if target.chars().any(char::is_whitespace) {
            return Err(Exception::InvalidRequestTarget(target.to_string()));
        }
        let mut clone = self.clone();
        clone.request_core_mut().request_target = Some(target.to_string());
        Ok(clone)
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    /// 起始行：`METHOD request-target PROTOCOL/VERSION`
    ///
    /// 方法覆盖非法时输出原始方法，覆盖头部仍保留在头部中。
    fn start_line(&self) -> String {
        let method = self.method().unwrap_or_else(|e| {
            warn!("起始行使用原始方法：{}", e);
            self.original_method()
        });
        format!(
            "{} {} {}/{}",
            method,
            self.request_target(),
            self.protocol(),
            self.protocol_version()
        )
    }

    fn is_websocket(&self) -> bool {
        self.header_line("Upgrade").to_lowercase() == "websocket"
    }

    fn is_xhr(&self) -> bool {
        self.header_line("X-Requested-With") == "XMLHttpRequest"
    }

    fn is_ajax(&self) -> bool {
        self.is_xhr()
    }

    fn is_pjax(&self) -> bool {
        self.is_ajax() && self.header_line("X-PJAX") == "true"
    }

    fn pjax_container(&self) -> String {
        self.header_line("X-PJAX-Container")
    }

    fn origin(&self) -> String {
        self.header_line("Origin")
    }

    fn referrer(&self, default: &str) -> String {
        let referrer = self.header_line("Referer");
        if referrer.is_empty() {
            default.to_string()
        } else {
            referrer
        }
    }

    /// `Content-Type` 的第一个值
    fn content_type(&self) -> String {
        self.headers()
            .get("Content-Type")
            .and_then(|values| values.first().cloned())
            .unwrap_or_default()
    }

    /// 去掉参数后的小写媒体类型
    fn media_type(&self) -> String {
        let content_type = self.content_type();
        split_media_type(&content_type)
            .first()
            .map(|s| s.to_lowercase())
            .unwrap_or_default()
    }

    /// 媒体类型参数，参数名转小写；没有 `=` 的参数值为空串。
    fn media_type_params(&self) -> Vec<(String, String)> {
        let content_type = self.content_type();
        split_media_type(&content_type)
            .into_iter()
            .skip(1)
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((name, value)) => (name.to_lowercase(), value.to_string()),
                None => (part.to_lowercase(), String::new()),
            })
            .collect()
    }

    fn content_charset(&self) -> String {
        self.media_type_params()
            .into_iter()
            .find(|(name, _)| name == "charset")
            .map(|(_, value)| value)
            .unwrap_or_default()
    }

    /// `Content-Length` 的整数值，缺失或非法时为 0。
    fn content_length(&self) -> u64 {
        self.headers()
            .get("Content-Length")
            .and_then(|values| values.first())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    fn accept_languages(&self) -> Vec<String> {
        self.headers().accept_languages()
    }

    fn accept_encodings(&self) -> Vec<String> {
        self.headers().accept_encodings()
    }
}

/// 读取 `X-Http-Method-Override` 中的方法，头部缺失或为空时为 `None`。
pub(crate) fn header_override(
    headers: &HeaderBag,
) -> Result<Option<HttpRequestMethod>, Exception> {
    match headers.line(METHOD_OVERRIDE_HEADER) {
        Some(value) if !value.is_empty() => value.parse().map(Some),
        _ => Ok(None),
    }
}

/// 客户端视角的 HTTP 请求，不携带 Cookie 集合。
#[derive(Debug, Clone, Default)]
pub struct Request {
    core: MessageCore,
    request: RequestCore,
}

impl Request {
    /// # 错误处理
    /// 方法不在允许列表中，或消息体引用无法打开时返回参数错误。
    pub fn new(
        method: &str,
        uri: Uri,
        headers: HeaderBag,
        body: BodySource,
    ) -> Result<Self, Exception> {
        let request = RequestCore::new(method, uri)?;
        let mut core = MessageCore::new(headers, body)?;
        request.sync_host(core.headers_mut());
        Ok(Self { core, request })
    }

    /// 以 URI 文本快速构造无头部、无消息体的请求。
    pub fn from_uri_str(method: &str, uri: &str) -> Result<Self, Exception> {
        Self::new(method, Uri::parse(uri)?, HeaderBag::new(), BodySource::default())
    }
}

impl Message for Request {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }

    fn head(&self) -> String {
        [
            self.start_line().as_str(),
            CRLF,
            &self.headers().to_header_lines(),
            CRLF,
        ]
        .concat()
    }
}

impl RequestMessage for Request {
    fn request_core(&self) -> &RequestCore {
        &self.request
    }

    fn request_core_mut(&mut self) -> &mut RequestCore {
        &mut self.request
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}
