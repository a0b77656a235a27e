// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 协议参数与常量模块
//!
//! 该模块定义了消息层遵循的 HTTP 协议相关常量和数据结构，包括：
//! - HTTP 状态码及其原因短语（Reason Phrase）。
//! - 常用媒体类型（Media Type）常量。
//! - HTTP 方法、版本的强类型枚举。
//! - 从 CGI 风格环境变量中提取请求头时需要特殊对待的键。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::exception::Exception;

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 报文头部与正文之间的分隔符
pub const HEADER_END: &str = "\r\n\r\n";

/// 默认的协议名
pub const DEFAULT_PROTOCOL: &str = "HTTP";

/// 允许的协议版本，顺序即错误信息中的枚举顺序
pub const VALID_PROTOCOL_VERSIONS: [&str; 3] = ["1.0", "1.1", "2.0"];

/// 允许的 URI 协议
pub const VALID_SCHEMES: [&str; 5] = ["", "http", "https", "ws", "wss"];

/// 方法覆盖请求头
pub const METHOD_OVERRIDE_HEADER: &str = "X-Http-Method-Override";

/// 表单中携带覆盖方法的字段
pub const METHOD_OVERRIDE_FIELD: &str = "_METHOD";

/// 常用媒体类型
pub mod media_type {
    pub const TEXT_XML: &str = "text/xml";
    pub const APP_XML: &str = "application/xml";
    pub const APP_JSON: &str = "application/json";
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
}

/// 环境变量中不带 `HTTP_` 前缀、但仍应视为请求头的键
pub const SPECIAL_ENV_HEADERS: [&str; 6] = [
    "CONTENT_TYPE",
    "CONTENT_LENGTH",
    "PHP_AUTH_USER",
    "PHP_AUTH_PW",
    "PHP_AUTH_DIGEST",
    "AUTH_TYPE",
];

/// 不应进入响应体的状态码
pub const EMPTY_BODY_STATUSES: [u16; 3] = [204, 205, 304];

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 不在表中的状态码（例如 299）必须由调用方显式提供原因短语。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 1xx: 信息响应 (Informational)
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");
        map.insert(102, "Processing");

        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(203, "Non-Authoritative Information");
        map.insert(204, "No Content");
        map.insert(205, "Reset Content");
        map.insert(206, "Partial Content");
        map.insert(207, "Multi-Status");
        map.insert(208, "Already Reported");
        map.insert(226, "IM Used");

        // 3xx: 重定向 (Redirection)
        map.insert(300, "Multiple Choices");
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(305, "Use Proxy");
        map.insert(306, "(Unused)");
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");

        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(402, "Payment Required");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(407, "Proxy Authentication Required");
        map.insert(408, "Request Timeout");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(411, "Length Required");
        map.insert(412, "Precondition Failed");
        map.insert(413, "Request Entity Too Large");
        map.insert(414, "Request-URI Too Long");
        map.insert(415, "Unsupported Media Type");
        map.insert(416, "Requested Range Not Satisfiable");
        map.insert(417, "Expectation Failed");
        map.insert(418, "I'm a teapot");
        map.insert(421, "Misdirected Request");
        map.insert(422, "Unprocessable Entity");
        map.insert(423, "Locked");
        map.insert(424, "Failed Dependency");
        map.insert(426, "Upgrade Required");
        map.insert(428, "Precondition Required");
        map.insert(429, "Too Many Requests");
        map.insert(431, "Request Header Fields Too Large");
        map.insert(444, "Connection Closed Without Response");
        map.insert(451, "Unavailable For Legal Reasons");
        map.insert(499, "Client Closed Request");

        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map.insert(506, "Variant Also Negotiates");
        map.insert(507, "Insufficient Storage");
        map.insert(508, "Loop Detected");
        map.insert(510, "Not Extended");
        map.insert(511, "Network Authentication Required");
        map.insert(599, "Network Connect Timeout Error");
        map
    };
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    /// HTTP/1.0 版本
    V1_0,
    /// HTTP/1.1 版本
    #[default]
    V1_1,
    /// HTTP/2.0 版本
    V2_0,
}

/// 标准 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpRequestMethod {
    /// 建立隧道
    Connect,
    /// 删除资源
    Delete,
    /// 获取资源
    #[default]
    Get,
    /// 获取资源的元数据（不包含响应体）
    Head,
    /// 查询服务器支持的选项
    Options,
    /// 局部修改资源
    Patch,
    /// 提交数据或执行操作
    Post,
    /// 替换资源
    Put,
    /// 回显请求，用于诊断
    Trace,
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "1.0"),
            HttpVersion::V1_1 => write!(f, "1.1"),
            HttpVersion::V2_0 => write!(f, "2.0"),
        }
    }
}

impl FromStr for HttpVersion {
    type Err = Exception;

    /// 只接受 `1.0`、`1.1`、`2.0` 三种写法，不接受 `HTTP/` 前缀。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(HttpVersion::V1_0),
            "1.1" => Ok(HttpVersion::V1_1),
            "2.0" => Ok(HttpVersion::V2_0),
            other => Err(Exception::UnsupportedHttpVersion(other.to_string())),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Connect => write!(f, "CONNECT"),
            HttpRequestMethod::Delete => write!(f, "DELETE"),
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Patch => write!(f, "PATCH"),
            HttpRequestMethod::Post => write!(f, "POST"),
            HttpRequestMethod::Put => write!(f, "PUT"),
            HttpRequestMethod::Trace => write!(f, "TRACE"),
        }
    }
}

impl FromStr for HttpRequestMethod {
    type Err = Exception;

    /// 方法名不区分大小写，先转大写再与允许列表比对。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CONNECT" => Ok(HttpRequestMethod::Connect),
            "DELETE" => Ok(HttpRequestMethod::Delete),
            "GET" => Ok(HttpRequestMethod::Get),
            "HEAD" => Ok(HttpRequestMethod::Head),
            "OPTIONS" => Ok(HttpRequestMethod::Options),
            "PATCH" => Ok(HttpRequestMethod::Patch),
            "POST" => Ok(HttpRequestMethod::Post),
            "PUT" => Ok(HttpRequestMethod::Put),
            "TRACE" => Ok(HttpRequestMethod::Trace),
            _ => Err(Exception::UnSupportedRequestMethod(s.to_string())),
        }
    }
}

/// 查询状态码对应的原因短语
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    STATUS_CODES.get(&code).copied()
}
