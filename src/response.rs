// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应模块
//!
//! `Response` 在消息公共部分之上维护状态码、原因短语与 `Set-Cookie` 集合：
//! 1. 状态码必须在 100 到 599 之间；原因短语缺省时查状态表，表中没有时必须显式给出。
//! 2. 序列化格式：`PROTOCOL/VERSION CODE REASON`、头部行、每个 Cookie 一行 `Set-Cookie`、空行、消息体。
//! 3. 提供 JSON、纯文本与重定向响应的便捷构造。
//! 4. `respond` 把响应按块写入任意 `Write`，可选补齐 `Content-Length`。

use std::{
    fmt,
    io::{self, Write},
};

use log::{debug, warn};
use serde::Serialize;

use crate::{
    cookies::{CookieBag, CookieOptions},
    exception::Exception,
    headers::HeaderBag,
    message::{BodySource, Message, MessageCore, MessageDefaults},
    param::{reason_phrase, CRLF, EMPTY_BODY_STATUSES},
    stream::ByteStream,
};

/// JSON 响应的默认 Content-Type
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";
/// 纯文本响应的默认 Content-Type
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// 输出响应时的选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RespondOptions {
    /// 每次写出的消息体字节数
    pub chunk_size: usize,
    /// 消息体大小已知且没有 `Content-Length` 时自动补上
    pub add_content_length_header: bool,
}

impl Default for RespondOptions {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            add_content_length_header: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    core: MessageCore,
    status: u16,
    reason_phrase: String,
    cookies: CookieBag,
}

impl Default for Response {
    fn default() -> Self {
        Self::from_defaults(&MessageDefaults::default())
    }
}

impl Response {
    /// # 错误处理
    /// 状态码不在 100 到 599 之间时返回 `InvalidStatusCode`；
    /// 状态表中没有该状态码时返回 `MissingReasonPhrase`。
    pub fn new(status: u16) -> Result<Self, Exception> {
        Self::default().with_status(status, "")
    }

    /// 200 响应，协议取给定默认值
    pub fn from_defaults(defaults: &MessageDefaults) -> Self {
        Self {
            core: MessageCore::from_parts(defaults.clone(), HeaderBag::new(), ByteStream::temp()),
            status: 200,
            reason_phrase: "OK".to_string(),
            cookies: CookieBag::new(),
        }
    }

    pub fn make(
        status: u16,
        headers: HeaderBag,
        cookies: CookieBag,
        body: BodySource,
    ) -> Result<Self, Exception> {
        let mut response = Self::new(status)?;
        response.core = MessageCore::new(headers, body)?;
        response.cookies = cookies;
        Ok(response)
    }

    /// JSON 响应：`<`、`>`、`&`、`'`、`"` 在字符串中以 `\u00XX` 形式输出，`/` 不转义。
    /// 调用方没有给出 Content-Type 时补为 `application/json`。
    pub fn json<T: Serialize + ?Sized>(
        data: &T,
        status: u16,
        mut headers: HeaderBag,
    ) -> Result<Self, Exception> {
        let json = encode_json(data)?;
        if !headers.has("Content-Type") {
            headers.set("Content-Type", "application/json");
        }
        Self::make(status, headers, CookieBag::new(), BodySource::Bytes(json.into()))
    }

    /// 纯文本响应，调用方没有给出 Content-Type 时补为 `text/plain; charset=utf-8`。
    pub fn text(text: &str, status: u16, mut headers: HeaderBag) -> Result<Self, Exception> {
        if !headers.has("Content-Type") {
            headers.set("Content-Type", TEXT_CONTENT_TYPE);
        }
        Self::make(
            status,
            headers,
            CookieBag::new(),
            BodySource::Bytes(text.to_string().into()),
        )
    }

    /// 返回使用新状态码的副本；`reason` 为空时查状态表。
    pub fn with_status(&self, code: u16, reason: &str) -> Result<Self, Exception> {
        if !(100..=599).contains(&code) {
            return Err(Exception::InvalidStatusCode(code));
        }
        let reason = if reason.is_empty() {
            reason_phrase(code).ok_or(Exception::MissingReasonPhrase(code))?
        } else {
            reason
        };
        let mut clone = self.clone();
        clone.status = code;
        clone.reason_phrase = reason.to_string();
        Ok(clone)
    }

    pub fn with_cookie(&self, name: &str, value: impl Into<CookieOptions>) -> Self {
        let mut clone = self.clone();
        clone.cookies.set(name, value);
        clone
    }

    pub fn with_cookies(&self, cookies: CookieBag) -> Self {
        let mut clone = self.clone();
        clone.cookies = cookies;
        clone
    }

    /// 之后写入的 Cookie 使用的默认属性
    pub fn with_cookie_defaults(&self, defaults: CookieOptions) -> Self {
        let mut clone = self.clone();
        clone.cookies.set_defaults(defaults);
        clone
    }

    /// 设置 `Location`；未指定状态码且当前为 200 时改为 302。
    pub fn with_redirect(&self, url: &str, status: Option<u16>) -> Result<Self, Exception> {
        let redirected = self.with_header("Location", url);
        let status = match status {
            None if self.status == 200 => Some(302),
            other => other,
        };
        match status {
            Some(code) => redirected.with_status(code, ""),
            None => Ok(redirected),
        }
    }

    /// 以 JSON 替换消息体，并设置 `application/json;charset=utf-8`。
    pub fn with_json<T: Serialize + ?Sized>(
        &self,
        data: &T,
        status: Option<u16>,
    ) -> Result<Self, Exception> {
        let body = ByteStream::from_bytes(encode_json(data)?);
        let response = self
            .with_body(body)
            .with_header("Content-Type", JSON_CONTENT_TYPE);
        match status {
            Some(code) => response.with_status(code, ""),
            None => Ok(response),
        }
    }

    /// 把完整响应按块写入 `writer`。
    ///
    /// # 逻辑步骤
    /// 1. 需要时补齐 `Content-Length`。
    /// 2. 204、205、304 响应去掉 `Content-Type` 与 `Content-Length`，且不写消息体。
    /// 3. 写出起始行与头部，然后从消息体开头按 `chunk_size` 分块写出。
    pub fn respond<W: Write>(&self, writer: &mut W, options: &RespondOptions) -> Result<(), Exception> {
        let mut response = self.clone();
        if response.is_empty() {
            response = response
                .without_header("Content-Type")
                .without_header("Content-Length");
        } else if options.add_content_length_header && !response.has_header("Content-Length") {
            if let Some(size) = response.body().size() {
                response = response.with_header("Content-Length", &size.to_string());
            }
        }
        writer.write_all(response.head().as_bytes())?;
        if response.is_empty() {
            writer.flush()?;
            return Ok(());
        }

        let body = response.body_mut();
        if body.is_seekable() {
            body.rewind()?;
        }
        let chunk_size = options.chunk_size.max(1);
        let mut written = 0;
        loop {
            let chunk = body.read(chunk_size)?;
            if chunk.is_empty() {
                break;
            }
            writer.write_all(&chunk)?;
            written += chunk.len();
        }
        writer.flush()?;
        debug!("响应 {} 已输出，消息体 {} 字节", self.status, written);
        Ok(())
    }
}

// --- Getter 访问器实现 ---
impl Response {
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    pub fn cookies(&self) -> &CookieBag {
        &self.cookies
    }

    /// 204、205、304 响应不携带消息体
    pub fn is_empty(&self) -> bool {
        EMPTY_BODY_STATUSES.contains(&self.status)
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 带 `Location` 语义的重定向状态码
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

impl Message for Response {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }

    fn head(&self) -> String {
        let mut head = format!(
            "{}/{} {} {}{}",
            self.protocol(),
            self.protocol_version(),
            self.status,
            self.reason_phrase,
            CRLF
        );
        head.push_str(&self.headers().to_header_lines());
        for value in self.cookies.to_headers() {
            head.push_str("Set-Cookie: ");
            head.push_str(&value);
            head.push_str(CRLF);
        }
        head.push_str(CRLF);
        head
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

/// 把字符串中的 HTML 敏感字符写成 `\u00XX`
struct HexFormatter;

impl serde_json::ser::Formatter for HexFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003C",
                '>' => "\\u003E",
                '&' => "\\u0026",
                '\'' => "\\u0027",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + 1;
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_char_escape<W>(
        &mut self,
        writer: &mut W,
        char_escape: serde_json::ser::CharEscape,
    ) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        use serde_json::ser::CharEscape;
        let escaped: Vec<u8> = match char_escape {
            CharEscape::Quote => b"\\u0022".to_vec(),
            CharEscape::ReverseSolidus => b"\\\\".to_vec(),
            CharEscape::Solidus => b"\\/".to_vec(),
            CharEscape::Backspace => b"\\b".to_vec(),
            CharEscape::FormFeed => b"\\f".to_vec(),
            CharEscape::LineFeed => b"\\n".to_vec(),
            CharEscape::CarriageReturn => b"\\r".to_vec(),
            CharEscape::Tab => b"\\t".to_vec(),
            CharEscape::AsciiControl(byte) => format!("\\u{:04x}", byte).into_bytes(),
        };
        writer.write_all(&escaped)
    }
}

fn encode_json<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>, Exception> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, HexFormatter);
    data.serialize(&mut serializer).map_err(|e| {
        warn!("JSON 编码失败：{}", e);
        Exception::JsonEncode(e.to_string())
    })?;
    Ok(buffer)
}
