// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 消息公共部分
//!
//! 请求、服务端请求与响应共享同一个 `MessageCore`：
//! 1. 协议名（默认 `HTTP`）与协议版本（默认 1.1）。
//! 2. 规范化的头部集合。
//! 3. 消息体字节流。
//!
//! `Message` 特征在 `core()` / `core_mut()` 之上提供全部公共访问器与写时复制的
//! `with_*` 方法：先克隆自身，再只修改副本。

use std::io::SeekFrom;

use bytes::{BufMut, Bytes, BytesMut};
use log::debug;

use crate::{
    exception::Exception,
    headers::HeaderBag,
    param::{HttpVersion, DEFAULT_PROTOCOL},
    stream::{ByteStream, MEMORY_REFERENCE, TEMP_REFERENCE},
};

/// 构造消息时的消息体来源
#[derive(Debug)]
pub enum BodySource {
    /// 流引用：`memory`、`temp` 或文件路径
    Reference(String),
    Bytes(Bytes),
    Stream(ByteStream),
}

impl BodySource {
    /// 统一转换为 `ByteStream`。
    ///
    /// 内存与临时引用以 `w+b` 打开；文件路径以 `r+b` 打开，不会截断已有文件。
    pub fn into_stream(self) -> Result<ByteStream, Exception> {
        match self {
            BodySource::Reference(reference) => {
                let mode = if reference == MEMORY_REFERENCE || reference == TEMP_REFERENCE {
                    "w+b"
                } else {
                    "r+b"
                };
                ByteStream::open(&reference, mode)
            }
            BodySource::Bytes(bytes) => Ok(ByteStream::from_bytes(bytes)),
            BodySource::Stream(stream) => Ok(stream),
        }
    }
}

impl Default for BodySource {
    fn default() -> Self {
        BodySource::Bytes(Bytes::new())
    }
}

impl From<ByteStream> for BodySource {
    fn from(stream: ByteStream) -> Self {
        BodySource::Stream(stream)
    }
}

impl From<Bytes> for BodySource {
    fn from(bytes: Bytes) -> Self {
        BodySource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for BodySource {
    fn from(bytes: Vec<u8>) -> Self {
        BodySource::Bytes(Bytes::from(bytes))
    }
}

/// 新建消息时使用的协议默认值，通常来自配置文件。
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefaults {
    pub protocol: String,
    pub protocol_version: HttpVersion,
}

impl Default for MessageDefaults {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            protocol_version: HttpVersion::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageCore {
    protocol: String,
    protocol_version: HttpVersion,
    headers: HeaderBag,
    body: ByteStream,
}

impl Default for MessageCore {
    fn default() -> Self {
        Self::from_parts(MessageDefaults::default(), HeaderBag::new(), ByteStream::temp())
    }
}

impl MessageCore {
    /// 以给定头部与消息体构造，协议取默认值。
    pub fn new(headers: HeaderBag, body: BodySource) -> Result<Self, Exception> {
        Ok(Self::from_parts(
            MessageDefaults::default(),
            headers,
            body.into_stream()?,
        ))
    }

    pub fn from_parts(defaults: MessageDefaults, headers: HeaderBag, body: ByteStream) -> Self {
        Self {
            protocol: defaults.protocol,
            protocol_version: defaults.protocol_version,
            headers,
            body,
        }
    }

    pub(crate) fn set_protocol(&mut self, protocol: &str) {
        self.protocol = protocol.to_string();
    }

    pub(crate) fn set_protocol_version(&mut self, version: HttpVersion) {
        self.protocol_version = version;
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderBag {
        &mut self.headers
    }

    pub(crate) fn set_body(&mut self, body: ByteStream) {
        self.body = body;
    }
}

// --- Getter 访问器实现 ---
impl MessageCore {
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn protocol_version(&self) -> HttpVersion {
        self.protocol_version
    }

    pub fn headers(&self) -> &HeaderBag {
        &self.headers
    }

    pub fn body(&self) -> &ByteStream {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ByteStream {
        &mut self.body
    }
}

/// 所有 HTTP 消息共有的行为。
pub trait Message: Clone {
    fn core(&self) -> &MessageCore;

    fn core_mut(&mut self) -> &mut MessageCore;

    /// 起始行与头部，以空行结尾
    fn head(&self) -> String;

    /// 消息体被替换或写入后调用，用于清除依赖消息体的缓存。
    fn body_changed(&mut self) {}

    fn protocol(&self) -> &str {
        self.core().protocol()
    }

    fn protocol_version(&self) -> HttpVersion {
        self.core().protocol_version()
    }

    /// 返回使用新协议版本的副本。
    ///
    /// # 错误处理
    /// 版本不是 `1.0`、`1.1`、`2.0` 之一时返回 `UnsupportedHttpVersion`。
    fn with_protocol_version(&self, version: &str) -> Result<Self, Exception> {
        let version: HttpVersion = version.parse()?;
        let mut clone = self.clone();
        clone.core_mut().set_protocol_version(version);
        Ok(clone)
    }

    /// 返回使用新协议默认值的副本
    fn with_message_defaults(&self, defaults: &MessageDefaults) -> Self {
        let mut clone = self.clone();
        clone.core_mut().set_protocol(&defaults.protocol);
        clone.core_mut().set_protocol_version(defaults.protocol_version);
        clone
    }

    fn headers(&self) -> &HeaderBag {
        self.core().headers()
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().has(name)
    }

    /// 头部的全部值，不存在时为空列表。
    fn header(&self, name: &str) -> Vec<String> {
        self.headers()
            .get(name)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// 以 `,` 连接的头部值，不存在时为空串。
    fn header_line(&self, name: &str) -> String {
        self.headers().line(name).unwrap_or_default()
    }

    fn with_header(&self, name: &str, value: &str) -> Self {
        let mut clone = self.clone();
        clone.core_mut().headers_mut().set(name, value);
        clone
    }

    fn with_header_values(&self, name: &str, values: Vec<String>) -> Self {
        let mut clone = self.clone();
        clone.core_mut().headers_mut().set_values(name, values);
        clone
    }

    fn without_header(&self, name: &str) -> Self {
        let mut clone = self.clone();
        clone.core_mut().headers_mut().remove(name);
        clone
    }

    fn with_added_header(&self, name: &str, value: &str) -> Self {
        let mut clone = self.clone();
        clone.core_mut().headers_mut().add(name, value);
        clone
    }

    fn body(&self) -> &ByteStream {
        self.core().body()
    }

    fn body_mut(&mut self) -> &mut ByteStream {
        self.core_mut().body_mut()
    }

    fn with_body(&self, body: ByteStream) -> Self {
        let mut clone = self.clone();
        clone.core_mut().set_body(body);
        clone.body_changed();
        clone
    }

    /// 在消息体末尾追加内容，原地修改。
    fn write(&mut self, data: &[u8]) -> Result<usize, Exception> {
        let body = self.body_mut();
        if body.is_seekable() {
            body.seek(SeekFrom::End(0))?;
        }
        let written = body.write(data)?;
        self.body_changed();
        Ok(written)
    }

    /// 完整报文：起始行、头部、空行与消息体。消息体不可读时按空处理。
    fn to_bytes(&self) -> Bytes {
        let head = self.head();
        let body = match self.body().snapshot() {
            Ok(body) => body,
            Err(e) => {
                debug!("序列化时无法读取消息体：{}", e);
                Bytes::new()
            }
        };
        let mut buffer = BytesMut::with_capacity(head.len() + body.len());
        buffer.put_slice(head.as_bytes());
        buffer.put_slice(&body);
        buffer.freeze()
    }
}
