// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # httpmsg 命令行工具
//!
//! 读取原始 HTTP 报文文件（`-` 或不给参数时读取标准输入），解析后输出规范化的报文：
//! 1. 起始行以 `HTTP/` 开头的按响应解析，并按配置分块输出。
//! 2. 其余按请求解析；`--summary` 时输出请求的 JSON 摘要（方法、URI、头部、Cookie、参数）。
//! 3. 解析失败时输出一个 400 响应，进程以非零状态退出。

use std::{
    fs,
    io::{self, Read, Write},
    process,
};

use http_message::{
    parser, Config, Exception, HeaderBag, Message, RequestMessage, Response, ServerRequest,
};
use log::{debug, error, info, warn, LevelFilter};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};
use serde_json::json;

const CONFIG_FILE: &str = "config/development.toml";

/// # 程序入口点
///
/// 加载配置、初始化日志，然后逐个处理输入。
fn main() {
    let loaded = Config::from_toml(CONFIG_FILE);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::new(),
    };
    init_logging(config.log_config());
    match loaded {
        Ok(_) => info!("配置文件已载入"),
        Err(e) => warn!("{}，使用默认配置", e),
    }

    let mut summary = false;
    let mut inputs = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--summary" => summary = true,
            "-h" | "--help" => {
                println!("用法：httpmsg [--summary] [FILE|-]...");
                return;
            }
            _ => inputs.push(arg),
        }
    }
    if inputs.is_empty() {
        inputs.push("-".to_string());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;
    for input in &inputs {
        let raw = match read_input(input) {
            Ok(raw) => raw,
            Err(e) => {
                error!("无法读取输入{}：{}", input, e);
                failed = true;
                continue;
            }
        };
        debug!("读取{}完毕，共{}字节", input, raw.len());
        if let Err(e) = process_message(&raw, &config, summary, &mut out) {
            error!("处理{}失败：{}", input, e);
            failed = true;
            let written = bad_request(&config, &e)
                .and_then(|response| response.respond(&mut out, &config.respond_options()));
            if let Err(e) = written {
                error!("无法输出400响应：{}", e);
            }
        }
    }
    if let Err(e) = out.flush() {
        error!("刷新标准输出失败：{}", e);
    }
    if failed {
        process::exit(1);
    }
}

/// 按配置文件初始化 log4rs，失败时退回到输出到标准错误的控制台日志。
fn init_logging(log_config: &str) {
    if log4rs::init_file(log_config, Default::default()).is_ok() {
        return;
    }
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("无法初始化日志系统：{}", e);
            }
        }
        Err(e) => eprintln!("无法构建日志配置：{}", e),
    }
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut raw = Vec::new();
        io::stdin().read_to_end(&mut raw)?;
        Ok(raw)
    } else {
        fs::read(input)
    }
}

fn process_message<W: Write>(
    raw: &[u8],
    config: &Config,
    summary: bool,
    out: &mut W,
) -> Result<(), Exception> {
    if parser::is_response(raw) {
        let response = parser::parse_response(raw)?;
        info!(
            "响应：{} {}，{}个Cookie",
            response.status_code(),
            response.reason_phrase(),
            response.cookies().len()
        );
        return response.respond(out, &config.respond_options());
    }

    let mut request = ServerRequest::make_by_parse_raw_data(raw)?;
    let method = request.resolve_method()?;
    info!("请求：{} {}", method, request.request_target());
    let bytes = if summary {
        let mut text = serde_json::to_string_pretty(&summarize(&request)?)
            .map_err(|e| Exception::JsonEncode(e.to_string()))?;
        text.push('\n');
        text.into_bytes()
    } else {
        request.to_bytes().to_vec()
    };
    out.write_all(&bytes)?;
    Ok(())
}

fn summarize(request: &ServerRequest) -> Result<serde_json::Value, Exception> {
    let headers: serde_json::Map<String, serde_json::Value> = request
        .headers()
        .lines()
        .into_iter()
        .map(|(name, value)| (name, json!(value)))
        .collect();
    let cookies: serde_json::Map<String, serde_json::Value> = request
        .cookie_params()
        .into_iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();
    Ok(json!({
        "method": request.method()?.to_string(),
        "uri": request.uri().to_string(),
        "protocol_version": request.protocol_version().to_string(),
        "media_type": request.media_type(),
        "headers": headers,
        "cookies": cookies,
        "query": request.query_params(),
        "body": request.parsed_body()?,
    }))
}

fn bad_request(config: &Config, e: &Exception) -> Result<Response, Exception> {
    let response = Response::text(&format!("Bad Request: {}", e), 400, HeaderBag::new())?;
    Ok(response
        .with_message_defaults(&config.message_defaults())
        .with_cookie_defaults(config.cookie_options()))
}
