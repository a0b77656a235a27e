// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 客户端发送请求的边界：具体的网络实现由调用方提供，这里只约定返回的元数据。

use bytes::Bytes;
use log::warn;

use crate::{
    cookies::CookieBag,
    exception::Exception,
    headers::HeaderBag,
    message::BodySource,
    request::Request,
    response::Response,
};

/// 一次发送的结果。`error_code` 为 0 表示传输层没有出错。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransportResult {
    pub status_code: u16,
    pub body: Bytes,
    pub headers: Vec<(String, String)>,
    pub error_code: i32,
    pub error_message: String,
}

impl TransportResult {
    /// 传输成功且状态码为 2xx
    pub fn is_ok(&self) -> bool {
        self.error_code == 0 && (200..300).contains(&self.status_code)
    }

    pub fn is_fail(&self) -> bool {
        !self.is_ok()
    }

    /// 转为响应，同名头部依次追加。
    ///
    /// # 错误处理
    /// 状态码不在 100 到 599 之间或没有原因短语时返回参数错误。
    pub fn into_response(self) -> Result<Response, Exception> {
        if self.error_code != 0 {
            warn!(
                "传输层返回错误 {}：{}，仍按状态码 {} 构造响应",
                self.error_code, self.error_message, self.status_code
            );
        }
        let mut headers = HeaderBag::new();
        for (name, value) in &self.headers {
            headers.add(name, value);
        }
        Response::make(
            self.status_code,
            headers,
            CookieBag::new(),
            BodySource::Bytes(self.body),
        )
    }
}

/// 发送请求的实现者，例如基于某个 HTTP 客户端库的适配层。
pub trait Transport {
    fn send(&self, request: &Request) -> Result<TransportResult, Exception>;
}
