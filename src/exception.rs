// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了 HTTP 消息层在构造、变换、解析与序列化过程中可能抛出的各类异常。
//!
//! ## 设计意图
//! - **错误分类**：分为参数错误（构造或 `with_*` 时立即失败）、运行时错误（流操作失败）
//!   以及解析结果形态错误（请求体解析器返回了非数组/对象的值）。
//! - **快速失败**：所有变体都直接返回给调用方，库内部不做重试，也不做静默修正。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志中。

use std::fmt;

/// HTTP 消息层操作失败时返回的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 原始报文的头部无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 原始报文的起始行格式不正确。
    MalformedStartLine(String),
    /// 使用了不在允许列表中的 HTTP 方法。
    UnSupportedRequestMethod(String),
    /// 使用了不支持的 HTTP 协议版本。
    UnsupportedHttpVersion(String),
    /// 状态码不在 100 到 599 之间。
    InvalidStatusCode(u16),
    /// 状态码在状态表中没有对应的原因短语，且调用方也没有提供。
    MissingReasonPhrase(u16),
    /// 请求目标（request-target）包含空白字符。
    InvalidRequestTarget(String),
    /// URI 协议不是 ""、http、https、ws、wss 之一。
    InvalidScheme(String),
    /// URI 端口不在 1 到 65535 之间。
    InvalidPort(String),
    /// URI 文本无法被分解。
    InvalidUri(String),
    /// 流引用无法打开，或者打开模式非法。
    InvalidStreamReference(String),
    /// 通过 `with_parsed_body` 设置的值不是数组、对象或 null。
    InvalidParsedBody,
    /// 请求体解析器返回了数组、对象、null 之外的值。
    ParserReturnedScalar(String),
    /// 流已经被分离（detach）或关闭。
    StreamDetached,
    /// 流不可读。
    StreamNotReadable,
    /// 流不可写。
    StreamNotWritable,
    /// 流不可定位。
    StreamNotSeekable,
    /// 底层 I/O 调用失败。
    StreamIo(String),
    /// JSON 编码失败。
    JsonEncode(String),
    /// 配置文件无法读取。
    ConfigUnreadable(String),
    /// 未知的参数过滤器名称。
    UnknownFilter(String),
}

use Exception::*;

impl Exception {
    /// 是否属于参数错误（在构造或变换时立即失败的一类）。
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            RequestIsNotUtf8
                | MalformedStartLine(_)
                | UnSupportedRequestMethod(_)
                | UnsupportedHttpVersion(_)
                | InvalidStatusCode(_)
                | MissingReasonPhrase(_)
                | InvalidRequestTarget(_)
                | InvalidScheme(_)
                | InvalidPort(_)
                | InvalidUri(_)
                | InvalidStreamReference(_)
                | InvalidParsedBody
                | UnknownFilter(_)
        )
    }

    /// 是否属于运行时错误（流操作、编码、解析结果形态等）。
    pub fn is_runtime(&self) -> bool {
        !self.is_invalid_argument()
    }
}

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedStartLine(line) => write!(f, "Malformed HTTP start line: {:?}", line),
            UnSupportedRequestMethod(method) => {
                write!(f, "Unsupported HTTP method \"{}\" provided", method)
            }
            UnsupportedHttpVersion(_) => {
                write!(f, "Invalid HTTP version. Must be one of: 1.0, 1.1, 2.0")
            }
            InvalidStatusCode(code) => write!(f, "Invalid HTTP status code: {}", code),
            MissingReasonPhrase(code) => {
                write!(f, "ReasonPhrase must be supplied for this code: {}", code)
            }
            InvalidRequestTarget(_) => write!(
                f,
                "Invalid request target provided; must be a string and cannot contain whitespace"
            ),
            InvalidScheme(_) => write!(
                f,
                "Uri scheme must be one of: \"\", \"https\", \"http\", \"ws\", \"wss\""
            ),
            InvalidPort(_) => write!(
                f,
                "Uri port must be null or an integer between 1 and 65535 (inclusive)"
            ),
            InvalidUri(uri) => write!(f, "Invalid URI provided: {:?}", uri),
            InvalidStreamReference(reference) => {
                write!(f, "Invalid stream reference provided: {}", reference)
            }
            InvalidParsedBody => {
                write!(f, "Parsed body value must be an array, an object, or null")
            }
            ParserReturnedScalar(media_type) => write!(
                f,
                "Request body media type parser return value must be an array, an object, or null ({})",
                media_type
            ),
            StreamDetached => write!(f, "Stream is detached"),
            StreamNotReadable => write!(f, "Could not read from stream"),
            StreamNotWritable => write!(f, "Could not write to stream"),
            StreamNotSeekable => write!(f, "Could not seek in stream"),
            StreamIo(e) => write!(f, "Stream I/O failed: {}", e),
            JsonEncode(e) => write!(f, "JSON encoding failed: {}", e),
            ConfigUnreadable(e) => write!(f, "Couldn't read config file: {}", e),
            UnknownFilter(name) => write!(f, "Unknown parameter filter: {}", name),
        }
    }
}

impl std::error::Error for Exception {}

impl From<std::io::Error> for Exception {
    fn from(e: std::io::Error) -> Self {
        StreamIo(e.to_string())
    }
}
