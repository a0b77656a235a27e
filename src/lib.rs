// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # http-message
//!
//! 不可变的 HTTP 消息值对象：
//! 1. `Request`、`ServerRequest`、`Response` 共享 `Message` 特性，所有 `with_*` 方法返回新副本。
//! 2. `ByteStream` 统一内存、临时与文件消息体。
//! 3. `parser` 把原始报文还原为消息，`environment` 把 CGI 风格的环境变量表还原为服务端请求。

pub mod config;
pub mod cookies;
pub mod environment;
pub mod exception;
pub mod filter;
pub mod headers;
pub mod message;
pub mod param;
pub mod parser;
pub mod request;
pub mod response;
pub mod server_request;
pub mod stream;
pub mod transport;
pub mod uri;
pub mod util;

pub use config::Config;
pub use cookies::{Cookie, CookieBag, CookieExpires, CookieOptions};
pub use environment::Environment;
pub use exception::Exception;
pub use filter::Filter;
pub use headers::HeaderBag;
pub use message::{BodySource, Message, MessageDefaults};
pub use param::{HttpRequestMethod, HttpVersion};
pub use request::{Request, RequestMessage};
pub use response::{RespondOptions, Response};
pub use server_request::{ServerRequest, ServerRequestParts};
pub use stream::ByteStream;
pub use transport::{Transport, TransportResult};
pub use uri::{Uri, UriParts};
