// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;

use crate::{
    cookies::CookieOptions,
    exception::Exception,
    message::MessageDefaults,
    param::HttpVersion,
    response::RespondOptions,
};

/// 新建 Cookie 的默认属性
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CookieConfig {
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
    host_only: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_protocol")]
    protocol: String,
    #[serde(default = "default_protocol_version")]
    protocol_version: String,
    #[serde(default)]
    cookie: CookieConfig,
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
    #[serde(default = "default_add_content_length_header")]
    add_content_length_header: bool,
    #[serde(default = "default_log_config")]
    log_config: String,
}

fn default_protocol() -> String {
    "HTTP".to_string()
}

fn default_protocol_version() -> String {
    "1.1".to_string()
}

fn default_chunk_size() -> usize {
    4096
}

fn default_add_content_length_header() -> bool {
    true
}

fn default_log_config() -> String {
    "config/log4rs.yaml".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            protocol: default_protocol(),
            protocol_version: default_protocol_version(),
            cookie: CookieConfig::default(),
            chunk_size: default_chunk_size(),
            add_content_length_header: default_add_content_length_header(),
            log_config: default_log_config(),
        }
    }

    /// 读取 TOML 配置文件。
    ///
    /// # 错误处理
    /// 文件无法读取时返回 `ConfigUnreadable`；内容无法解析时记录错误并使用默认配置。
    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = File::open(filename)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename, e)))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename, e)))?;
        Ok(Self::from_toml_str(&str_val))
    }

    /// 从 TOML 文本构建配置，解析失败时使用默认配置。
    pub fn from_toml_str(text: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(text) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.protocol_version.parse::<HttpVersion>().is_err() {
            warn!(
                "protocol_version被设置为{}，该版本不受支持，因此该值将被改为1.1。",
                raw_config.protocol_version
            );
            raw_config.protocol_version = default_protocol_version();
        }
        if raw_config.chunk_size == 0 {
            warn!("chunk_size被设置为0，无法按块输出响应体，因此该值将被改为4096。");
            raw_config.chunk_size = default_chunk_size();
        }
        raw_config
    }

    /// 新建消息使用的协议默认值
    pub fn message_defaults(&self) -> MessageDefaults {
        MessageDefaults {
            protocol: self.protocol.to_uppercase(),
            protocol_version: self.protocol_version.parse().unwrap_or_default(),
        }
    }

    /// 响应 Cookie 集合的默认属性
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            value: None,
            domain: self.cookie.domain.clone(),
            host_only: self.cookie.host_only,
            path: self.cookie.path.clone(),
            expires: None,
            secure: Some(self.cookie.secure),
            http_only: Some(self.cookie.http_only),
        }
    }

    pub fn respond_options(&self) -> RespondOptions {
        RespondOptions {
            chunk_size: self.chunk_size,
            add_content_length_header: self.add_content_length_header,
        }
    }
}

impl Config {
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn cookie(&self) -> &CookieConfig {
        &self.cookie
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn add_content_length_header(&self) -> bool {
        self.add_content_length_header
    }

    pub fn log_config(&self) -> &str {
        &self.log_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml_str("chunk_size = 1024\n[cookie]\npath = \"/\"\nhttp_only = true\n");
        assert_eq!(config.chunk_size(), 1024);
        assert_eq!(config.protocol(), "HTTP");
        assert_eq!(config.message_defaults().protocol_version, HttpVersion::V1_1);
        let cookie = config.cookie_options();
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(cookie.http_only, Some(true));
        assert_eq!(cookie.secure, Some(false));
    }

    #[test]
    fn test_invalid_values_are_corrected() {
        let config = Config::from_toml_str("protocol_version = \"3.0\"\nchunk_size = 0\n");
        assert_eq!(config.protocol_version(), "1.1");
        assert_eq!(config.chunk_size(), 4096);
    }

    #[test]
    fn test_unparsable_text_falls_back() {
        assert_eq!(Config::from_toml_str("chunk_size = ["), Config::new());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "protocol_version = \"2.0\"\nadd_content_length_header = false").unwrap();
        let config = Config::from_toml(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.message_defaults().protocol_version, HttpVersion::V2_0);
        assert!(!config.respond_options().add_content_length_header);

        assert!(matches!(
            Config::from_toml("/nonexistent/http-message.toml"),
            Err(Exception::ConfigUnreadable(_))
        ));
    }
}
