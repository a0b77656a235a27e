// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 原始报文解析
//!
//! 把原始 HTTP 报文字节解析为 `ServerRequest` 或 `Response`：
//! 1. 在第一个 `\r\n\r\n` 处切分头部与消息体。
//! 2. 头部按 `\n` 切行并去除首尾空白，第一行为起始行，其余为 `Name: Value`。
//! 3. 请求的 `Cookie` 头部交给 Cookie 解析器，`Host` 头部用于还原 URI 的主机与端口。
//! 4. 响应的每一行 `Set-Cookie` 还原为一个带属性的 Cookie。

use bytes::Bytes;
use log::debug;

use crate::{
    cookies::{Cookie, CookieBag, CookieExpires},
    exception::Exception,
    headers::HeaderBag,
    message::{BodySource, Message, MessageDefaults},
    param::{HttpVersion, HEADER_END},
    request::RequestMessage,
    response::Response,
    server_request::{ServerRequest, ServerRequestParts},
    stream::ByteStream,
    uri::{split_host_port, Uri, UriParts},
    util::url_decode,
};

const DEFAULT_PORT: u16 = 80;
/// `OPTIONS *` 的请求目标，原样保留而不当作路径编码
const ASTERISK_TARGET: &str = "*";

/// 报文是否以响应状态行开头
pub fn is_response(raw: &[u8]) -> bool {
    let trimmed = raw
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map_or(&raw[..0], |start| &raw[start..]);
    trimmed.starts_with(b"HTTP/")
}

/// 头部文本、消息体字节
fn split_message(raw: &[u8]) -> Result<(String, Bytes), Exception> {
    let end = HEADER_END.as_bytes();
    let (head, body) = match raw.windows(end.len()).position(|w| w == end) {
        Some(i) => (&raw[..i], &raw[i + end.len()..]),
        None => (raw, &raw[..0]),
    };
    let head = match std::str::from_utf8(head) {
        Ok(head) => head.trim().to_string(),
        Err(_) => {
            debug!("报文头部不是合法的 UTF-8");
            return Err(Exception::RequestIsNotUtf8);
        }
    };
    Ok((head, Bytes::copy_from_slice(body)))
}

/// `Name: Value`，值去除首尾空白
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(": ").or_else(|| line.split_once(':'))?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// 同名头部追加，空值也保留
fn push_header(headers: &mut HeaderBag, name: &str, value: &str) {
    match headers.get(name) {
        Some(values) => {
            let mut values = values.to_vec();
            values.push(value.to_string());
            headers.set_values(name, values);
        }
        None => headers.set(name, value),
    }
}

/// `PROTOCOL/VERSION`
fn split_protocol(text: &str, start_line: &str) -> Result<(String, HttpVersion), Exception> {
    let (protocol, version) = text
        .split_once('/')
        .ok_or_else(|| Exception::MalformedStartLine(start_line.to_string()))?;
    Ok((protocol.to_uppercase(), version.parse()?))
}

fn body_source(body: Bytes) -> BodySource {
    if body.is_empty() {
        BodySource::default()
    } else {
        BodySource::Stream(ByteStream::from_bytes(body))
    }
}

/// 解析原始请求报文。
///
/// 输入为空或头部为空时返回默认的 `GET /` 请求。
///
/// # 错误处理
/// - 头部不是合法 UTF-8：`RequestIsNotUtf8`。
/// - 起始行不是 `METHOD target PROTOCOL/VERSION`：`MalformedStartLine`。
/// - 方法、版本、协议或 `Host` 端口非法：对应的参数错误。
pub fn parse_request(raw: &[u8]) -> Result<ServerRequest, Exception> {
    let (head, body) = split_message(raw)?;
    if head.is_empty() {
        return ServerRequest::new("GET", Uri::parse("/")?, HeaderBag::new(), BodySource::default());
    }

    let mut lines = head.split('\n').map(str::trim);
    let start_line = lines.next().unwrap_or_default();
    let parts: Vec<&str> = start_line.split_whitespace().collect();
    let &[method, target, protocol] = parts.as_slice() else {
        debug!("请求行格式不正确：{}", start_line);
        return Err(Exception::MalformedStartLine(start_line.to_string()));
    };
    let (protocol, version) = split_protocol(protocol, start_line)?;

    let mut headers = HeaderBag::new();
    for line in lines.filter(|line| !line.is_empty()) {
        match split_header_line(line) {
            Some((name, value)) => push_header(&mut headers, name, value),
            None => debug!("忽略无法解析的头部行：{}", line),
        }
    }

    let mut cookies = CookieBag::new();
    if let Some(raw_cookie) = headers.get("Cookie") {
        cookies = CookieBag::from_values(CookieBag::parse_from_raw_lines(raw_cookie));
        headers.remove("Cookie");
    }

    let (host, port) = match headers.line("Host") {
        Some(value) if !value.is_empty() => {
            let (host, port) = split_host_port(&value);
            let port = match port {
                Some(port) => port
                    .parse::<u16>()
                    .map_err(|_| Exception::InvalidPort(port.to_string()))?,
                None => DEFAULT_PORT,
            };
            (host.to_string(), port)
        }
        _ => (String::new(), DEFAULT_PORT),
    };

    let mut uri_parts = UriParts {
        scheme: protocol.to_lowercase(),
        host,
        port: Some(port),
        path: target.to_string(),
        ..Default::default()
    };
    if target == ASTERISK_TARGET {
        uri_parts.path = String::new();
    } else if target.len() > 1 {
        let target_uri = Uri::parse(target)?;
        uri_parts.path = target_uri.path().to_string();
        uri_parts.query = target_uri.query().to_string();
        uri_parts.fragment = target_uri.fragment().to_string();
    }

    let mut request = ServerRequest::from_parts(ServerRequestParts {
        method: method.to_string(),
        uri: Uri::new(uri_parts)?,
        headers,
        cookies,
        body: body_source(body),
        ..Default::default()
    })?;
    if target == ASTERISK_TARGET {
        request = request.with_request_target(ASTERISK_TARGET)?;
    }
    Ok(request.with_message_defaults(&MessageDefaults {
        protocol,
        protocol_version: version,
    }))
}

/// 解析单个 `Set-Cookie` 值
pub fn parse_set_cookie(value: &str) -> Option<(String, Cookie)> {
    let mut pieces = value.split(';').map(str::trim);
    let (name, cookie_value) = pieces.next()?.split_once('=')?;
    let mut cookie = Cookie {
        value: url_decode(cookie_value),
        ..Default::default()
    };
    for piece in pieces {
        let (key, attr) = match piece.split_once('=') {
            Some((key, attr)) => (key.trim(), attr.trim()),
            None => (piece, ""),
        };
        match key.to_lowercase().as_str() {
            "domain" => cookie.domain = Some(attr.to_string()),
            "path" => cookie.path = Some(attr.to_string()),
            "expires" => cookie.expires = Some(CookieExpires::Date(attr.to_string())),
            "secure" => cookie.secure = true,
            "hostonly" => cookie.host_only = Some(true),
            "httponly" => cookie.http_only = true,
            other => debug!("忽略未知的 Cookie 属性：{}", other),
        }
    }
    Some((url_decode(name), cookie))
}

/// 解析原始响应报文，`Set-Cookie` 行还原到 Cookie 集合中。
///
/// # 错误处理
/// 状态行不是 `PROTOCOL/VERSION CODE [REASON]` 时返回 `MalformedStartLine`；
/// 状态码越界或缺少原因短语时返回对应的参数错误。
pub fn parse_response(raw: &[u8]) -> Result<Response, Exception> {
    let (head, body) = split_message(raw)?;
    let mut lines = head.split('\n').map(str::trim);
    let start_line = lines.next().unwrap_or_default();
    let mut parts = start_line.splitn(3, ' ');
    let (Some(protocol), Some(code)) = (parts.next(), parts.next()) else {
        debug!("状态行格式不正确：{}", start_line);
        return Err(Exception::MalformedStartLine(start_line.to_string()));
    };
    let reason = parts.next().unwrap_or_default().trim();
    let (protocol, version) = split_protocol(protocol, start_line)?;
    let code: u16 = code
        .parse()
        .map_err(|_| Exception::MalformedStartLine(start_line.to_string()))?;

    let mut headers = HeaderBag::new();
    let mut cookies = CookieBag::new();
    for line in lines.filter(|line| !line.is_empty()) {
        let Some((name, value)) = split_header_line(line) else {
            debug!("忽略无法解析的头部行：{}", line);
            continue;
        };
        if name.eq_ignore_ascii_case("Set-Cookie") {
            match parse_set_cookie(value) {
                Some((cookie_name, cookie)) => cookies.set_cookie(&cookie_name, cookie),
                None => debug!("忽略无法解析的 Set-Cookie：{}", value),
            }
        } else {
            push_header(&mut headers, name, value);
        }
    }

    let response = Response::make(200, headers, cookies, body_source(body))?
        .with_status(code, reason)?;
    Ok(response.with_message_defaults(&MessageDefaults {
        protocol,
        protocol_version: version,
    }))
}
