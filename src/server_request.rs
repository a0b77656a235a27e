// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务端请求模块
//!
//! `ServerRequest` 是服务端收到的请求，在 `Request` 的基础上增加：
//! 1. 查询参数、解析后的请求体以及二者合并后的参数视图。
//! 2. 按媒体类型注册的请求体解析器（每个实例独立持有）。
//! 3. 属性、服务器参数、上传文件与请求 Cookie。
//! 4. 对 `POST` 请求，请求体中的 `_METHOD` 字段可以覆盖请求方法。
//!
//! 解析请求体读取的是消息体快照，不会移动消息体的读写位置。

use std::{cell::OnceCell, collections::HashMap, fmt, sync::Arc};

use log::{debug, warn};
use roxmltree::{Document, Node};
use serde_json::{Map, Value};

use crate::{
    cookies::CookieBag,
    exception::Exception,
    filter::Filter,
    headers::HeaderBag,
    message::{BodySource, Message, MessageCore},
    param::{media_type, HttpRequestMethod, HttpVersion, CRLF, METHOD_OVERRIDE_FIELD},
    parser,
    request::{header_override, RequestCore, RequestMessage},
    uri::Uri,
    util::parse_query_string,
};

/// 请求体解析器：输入原始请求体文本，返回数组、对象或 null。
pub type BodyParser = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// 媒体类型到解析器的映射
#[derive(Clone, Default)]
pub struct BodyParsers {
    parsers: HashMap<String, BodyParser>,
}

impl BodyParsers {
    /// 内置 JSON、XML 与表单解析器
    pub fn with_defaults() -> Self {
        let mut parsers = Self::default();
        parsers.register(media_type::APP_JSON, Arc::new(parse_json));
        parsers.register(media_type::TEXT_XML, Arc::new(parse_xml));
        parsers.register(media_type::APP_XML, Arc::new(parse_xml));
        parsers.register(
            media_type::FORM_URLENCODED,
            Arc::new(|input: &str| Value::Object(parse_query_string(input))),
        );
        parsers
    }

    pub fn register(&mut self, media_type: &str, parser: BodyParser) {
        self.parsers.insert(media_type.to_string(), parser);
    }

    pub fn get(&self, media_type: &str) -> Option<&BodyParser> {
        self.parsers.get(media_type)
    }
}

impl fmt::Debug for BodyParsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.parsers.keys().collect();
        keys.sort();
        f.debug_struct("BodyParsers").field("media_types", &keys).finish()
    }
}

fn parse_json(input: &str) -> Value {
    match serde_json::from_str::<Value>(input) {
        Ok(value @ (Value::Array(_) | Value::Object(_))) => value,
        Ok(_) => Value::Null,
        Err(e) => {
            debug!("JSON 请求体解析失败：{}", e);
            Value::Null
        }
    }
}

/// 解析 XML 请求体。文档类型声明（DTD）一律拒绝，外部实体因此永远不会被加载。
fn parse_xml(input: &str) -> Value {
    let document = match Document::parse(input) {
        Ok(document) => document,
        Err(e) => {
            debug!("XML 请求体解析失败：{}", e);
            return Value::Null;
        }
    };
    match xml_element_to_value(document.root_element()) {
        Value::Object(map) => Value::Object(map),
        Value::String(text) if text.is_empty() => Value::Object(Map::new()),
        scalar => {
            let mut map = Map::new();
            map.insert("0".to_string(), scalar);
            Value::Object(map)
        }
    }
}

/// 元素转换规则：属性放在 `@attributes` 下，同名子元素合并为数组，纯文本元素转换为字符串。
fn xml_element_to_value(node: Node) -> Value {
    let mut map = Map::new();
    let attributes: Map<String, Value> = node
        .attributes()
        .map(|a| (a.name().to_string(), Value::String(a.value().to_string())))
        .collect();
    if !attributes.is_empty() {
        map.insert("@attributes".to_string(), Value::Object(attributes));
    }
    for child in node.children().filter(Node::is_element) {
        let name = child.tag_name().name().to_string();
        let value = xml_element_to_value(child);
        match map.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    if map.is_empty() {
        let text: String = node
            .children()
            .filter(Node::is_text)
            .filter_map(|n| n.text())
            .collect();
        return Value::String(text.trim().to_string());
    }
    Value::Object(map)
}

/// 构造服务端请求的全部组成部分
#[derive(Debug, Default)]
pub struct ServerRequestParts {
    pub method: String,
    pub uri: Uri,
    pub headers: HeaderBag,
    pub cookies: CookieBag,
    pub server_params: Map<String, Value>,
    pub body: BodySource,
    pub uploaded_files: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ServerRequest {
    core: MessageCore,
    request: RequestCore,
    cookies: CookieBag,
    query_params: Option<Map<String, Value>>,
    parsed_body: OnceCell<Value>,
    /// 解析结果是否由调用方显式给出
    parsed_body_explicit: bool,
    uploaded_files: Map<String, Value>,
    attributes: Map<String, Value>,
    server_params: Map<String, Value>,
    body_parsers: BodyParsers,
}

impl Default for ServerRequest {
    fn default() -> Self {
        Self {
            core: MessageCore::default(),
            request: RequestCore::default(),
            cookies: CookieBag::new(),
            query_params: None,
            parsed_body: OnceCell::new(),
            parsed_body_explicit: false,
            uploaded_files: Map::new(),
            attributes: Map::new(),
            server_params: Map::new(),
            body_parsers: BodyParsers::with_defaults(),
        }
    }
}

impl ServerRequest {
    pub fn new(
        method: &str,
        uri: Uri,
        headers: HeaderBag,
        body: BodySource,
    ) -> Result<Self, Exception> {
        Self::from_parts(ServerRequestParts {
            method: method.to_string(),
            uri,
            headers,
            body,
            ..Default::default()
        })
    }

    /// # 错误处理
    /// 方法非法、消息体引用无法打开，或 `SERVER_PROTOCOL` 中的版本不受支持时返回参数错误。
    pub fn from_parts(parts: ServerRequestParts) -> Result<Self, Exception> {
        let request = RequestCore::new(&parts.method, parts.uri)?;
        let mut core = MessageCore::new(parts.headers, parts.body)?;
        if let Some(protocol) = parts
            .server_params
            .get("SERVER_PROTOCOL")
            .and_then(Value::as_str)
        {
            let version: HttpVersion = protocol.trim_start_matches("HTTP/").parse()?;
            core.set_protocol_version(version);
        }
        request.sync_host(core.headers_mut());
        Ok(Self {
            core,
            request,
            cookies: parts.cookies,
            server_params: parts.server_params,
            uploaded_files: parts.uploaded_files,
            ..Default::default()
        })
    }

    /// 由原始 HTTP 请求报文构造
    pub fn make_by_parse_raw_data(raw: &[u8]) -> Result<Self, Exception> {
        parser::parse_request(raw)
    }

    /// 为某个媒体类型注册解析器，已缓存的解析结果随之失效。
    pub fn register_media_type_parser(&mut self, media_type: &str, parser: BodyParser) {
        self.body_parsers.register(media_type, parser);
        if !self.parsed_body_explicit {
            self.parsed_body = OnceCell::new();
        }
    }

    /// 生效的请求方法，并在请求体已读到末尾时把它倒回开头。
    ///
    /// # 错误处理
    /// 覆盖的方法不在允许列表中时返回 `UnSupportedRequestMethod`。
    pub fn resolve_method(&mut self) -> Result<HttpRequestMethod, Exception> {
        let method = self.method()?;
        if self.request.explicit_method().is_none()
            && header_override(self.headers())?.is_none()
            && self.original_method() == HttpRequestMethod::Post
            && self.body().eof()
        {
            if let Err(e) = self.body_mut().rewind() {
                debug!("无法倒回请求体：{}", e);
            }
        }
        Ok(method)
    }

    /// 解析后的请求体，首次调用时按媒体类型解析并缓存。
    ///
    /// 没有对应解析器或请求体不可读时返回空对象；解析器返回 null 时同样视为空对象。
    ///
    /// 缓存随 `with_*` 副本一起复制，只有更换消息体、写入或注册解析器时才失效；
    /// 之后通过 `with_header` 修改 `Content-Type` 不会触发重新解析。
    ///
    /// # 错误处理
    /// 解析器返回了数组、对象、null 之外的值时返回 `ParserReturnedScalar`。
    pub fn parsed_body(&self) -> Result<&Value, Exception> {
        if let Some(parsed) = self.parsed_body.get() {
            return Ok(parsed);
        }
        let parsed = self.parse_body()?;
        Ok(self.parsed_body.get_or_init(|| parsed))
    }

    fn parse_body(&self) -> Result<Value, Exception> {
        let mut media_type = self.media_type();
        if let Some((_, suffix)) = media_type.rsplit_once('+') {
            media_type = ["application/", suffix].concat();
        }
        let Some(parser) = self.body_parsers.get(&media_type) else {
            return Ok(Value::Object(Map::new()));
        };
        let raw = match self.body().snapshot() {
            Ok(raw) => raw,
            Err(e) => {
                debug!("请求体不可读，按空处理：{}", e);
                return Ok(Value::Object(Map::new()));
            }
        };
        match parser(&String::from_utf8_lossy(&raw)) {
            Value::Null => Ok(Value::Object(Map::new())),
            value @ (Value::Array(_) | Value::Object(_)) => Ok(value),
            _ => Err(Exception::ParserReturnedScalar(media_type)),
        }
    }

    /// # 错误处理
    /// 值不是数组、对象或 null 时返回 `InvalidParsedBody`。
    pub fn with_parsed_body(&self, data: Value) -> Result<Self, Exception> {
        let mut clone = self.clone();
        clone.set_parsed_body(data)?;
        Ok(clone)
    }

    pub fn set_parsed_body(&mut self, data: Value) -> Result<(), Exception> {
        if !matches!(data, Value::Null | Value::Array(_) | Value::Object(_)) {
            return Err(Exception::InvalidParsedBody);
        }
        self.parsed_body = OnceCell::from(data);
        self.parsed_body_explicit = true;
        Ok(())
    }

    /// 请求体中的单个字段，对象按键查找，数组按下标查找。
    pub fn parsed_body_param(&self, key: &str) -> Option<Value> {
        match self.parsed_body() {
            Ok(parsed) => lookup(parsed, key),
            Err(e) => {
                warn!("请求体解析失败：{}", e);
                None
            }
        }
    }

    /// 查询参数；未显式设置时从 URI 查询串解码。
    pub fn query_params(&self) -> Map<String, Value> {
        match &self.query_params {
            Some(params) => params.clone(),
            None => parse_query_string(self.uri().query()),
        }
    }

    pub fn with_query_params(&self, params: Map<String, Value>) -> Self {
        let mut clone = self.clone();
        clone.query_params = Some(params);
        clone
    }

    pub fn query_param(&self, key: &str) -> Option<Value> {
        match &self.query_params {
            Some(params) => params.get(key).cloned(),
            None => self.query_params().remove(key),
        }
    }

    /// 查询参数与请求体字段合并，同名时请求体优先。
    pub fn params(&self) -> Map<String, Value> {
        let mut params = self.query_params();
        match self.parsed_body() {
            Ok(Value::Object(body)) => {
                for (k, v) in body {
                    params.insert(k.clone(), v.clone());
                }
            }
            Ok(Value::Array(items)) => {
                for (i, v) in items.iter().enumerate() {
                    params.insert(i.to_string(), v.clone());
                }
            }
            Ok(_) => {}
            Err(e) => warn!("请求体解析失败：{}", e),
        }
        params
    }

    /// 单个参数，请求体优先于查询参数。
    pub fn param(&self, key: &str) -> Option<Value> {
        self.parsed_body_param(key)
            .or_else(|| self.query_param(key))
    }

    /// 取参数并应用过滤器，参数不存在时返回 `default`。
    pub fn get(&self, name: &str, default: Value, filter: Filter) -> Value {
        match self.param(name) {
            Some(value) => filter.apply(&value),
            None => default,
        }
    }

    pub fn uploaded_files(&self) -> &Map<String, Value> {
        &self.uploaded_files
    }

    pub fn with_uploaded_files(&self, files: Map<String, Value>) -> Self {
        let mut clone = self.clone();
        clone.uploaded_files = files;
        clone
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Self {
        let mut clone = self.clone();
        clone.attributes.insert(name.to_string(), value.into());
        clone
    }

    /// 批量写入属性，与已有属性合并。
    pub fn with_attributes(&self, values: Map<String, Value>) -> Self {
        let mut clone = self.clone();
        clone.attributes.extend(values);
        clone
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        let mut clone = self.clone();
        clone.attributes.shift_remove(name);
        clone
    }

    pub fn server_params(&self) -> &Map<String, Value> {
        &self.server_params
    }

    /// 服务器参数，键名转大写后查找。
    pub fn server_param(&self, key: &str) -> Option<&Value> {
        self.server_params.get(&key.to_uppercase())
    }

    pub fn cookies(&self) -> &CookieBag {
        &self.cookies
    }

    pub fn cookie_params(&self) -> Vec<(&str, &str)> {
        self.cookies.all()
    }

    pub fn cookie_param(&self, name: &str) -> Option<&str> {
        self.cookies.value(name)
    }

    /// 以新的 Cookie 值替换全部请求 Cookie
    pub fn with_cookie_params<I, K, V>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut clone = self.clone();
        clone.cookies = CookieBag::from_values(values);
        clone
    }
}

fn lookup(value: &Value, key: &str) -> Option<Value> {
    match value {
        Value::Object(map) => map.get(key).cloned(),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
        _ => None,
    }
}

impl Message for ServerRequest {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }

    fn head(&self) -> String {
        let mut head = [
            self.start_line().as_str(),
            CRLF,
            &self.headers().to_header_lines(),
        ]
        .concat();
        let cookie = self.cookies.to_request_header();
        if !cookie.is_empty() {
            head.push_str("Cookie: ");
            head.push_str(&cookie);
            head.push_str(CRLF);
        }
        head.push_str(CRLF);
        head
    }

    fn body_changed(&mut self) {
        if !self.parsed_body_explicit {
            self.parsed_body = OnceCell::new();
        }
    }
}

impl RequestMessage for ServerRequest {
    fn request_core(&self) -> &RequestCore {
        &self.request
    }

    fn request_core_mut(&mut self) -> &mut RequestCore {
        &mut self.request
    }

    /// 头部覆盖优先；否则原始方法为 `POST` 时，请求体中的 `_METHOD` 字段可以覆盖。
    ///
    /// # 错误处理
    /// 覆盖的方法不在允许列表中，或 `_METHOD` 不是字符串时返回 `UnSupportedRequestMethod`；
    /// 请求体解析失败时返回解析器的错误。
    fn method(&self) -> Result<HttpRequestMethod, Exception> {
        if let Some(method) = self.request.explicit_method() {
            return Ok(method);
        }
        if let Some(method) = header_override(self.headers())? {
            return Ok(method);
        }
        let original = self.request.original_method();
        if original != HttpRequestMethod::Post {
            return Ok(original);
        }
        match self.parsed_body()? {
            Value::Object(map) => match map.get(METHOD_OVERRIDE_FIELD) {
                None | Some(Value::Null) => Ok(original),
                Some(Value::String(name)) => name.parse(),
                Some(other) => Err(Exception::UnSupportedRequestMethod(other.to_string())),
            },
            _ => Ok(original),
        }
    }
}

impl fmt::Display for ServerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{param::METHOD_OVERRIDE_HEADER, stream::ByteStream};
    use serde_json::json;

    fn post(content_type: &str, body: &str) -> ServerRequest {
        ServerRequest::new(
            "POST",
            Uri::parse("http://example.com/submit?page=2&tag=a").unwrap(),
            HeaderBag::from_pairs([("Content-Type", content_type)]),
            BodySource::Stream(ByteStream::from_bytes(body.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_default_is_get_root() {
        let req = ServerRequest::default();
        assert_eq!(req.method().unwrap(), HttpRequestMethod::Get);
        assert_eq!(req.request_target(), "/");
        assert!(req.cookies().is_empty());
    }

    #[test]
    fn test_json_body_and_structured_suffix() {
        let req = post("application/vnd.api+json; charset=utf-8", r#"{"name":"ann","n":3}"#);
        assert_eq!(req.parsed_body().unwrap(), &json!({"name": "ann", "n": 3}));
        assert_eq!(req.parsed_body_param("name"), Some(json!("ann")));
        let scalar = post("application/json", "42");
        assert_eq!(scalar.parsed_body().unwrap(), &json!({}));
    }

    #[test]
    fn test_form_body_and_param_precedence() {
        let req = post(media_type::FORM_URLENCODED, "page=9&items[]=a&items[]=b");
        assert_eq!(req.param("page"), Some(json!("9")));
        assert_eq!(req.param("tag"), Some(json!("a")));
        assert_eq!(req.param("items"), Some(json!(["a", "b"])));
        assert_eq!(req.query_param("page"), Some(json!("2")));
        let params = req.params();
        assert_eq!(params.get("page"), Some(&json!("9")));
        assert_eq!(params.get("tag"), Some(&json!("a")));
        assert_eq!(req.get("page", json!(0), Filter::Int), json!(9));
        assert_eq!(req.get("missing", json!("dflt"), Filter::Int), json!("dflt"));
    }

    #[test]
    fn test_xml_body() {
        let req = post(
            "text/xml",
            r#"<user id="7"><name>ann</name><tag>a</tag><tag>b</tag></user>"#,
        );
        assert_eq!(
            req.parsed_body().unwrap(),
            &json!({"@attributes": {"id": "7"}, "name": "ann", "tag": ["a", "b"]})
        );
        let broken = post("application/xml", "<open>");
        assert_eq!(broken.parsed_body().unwrap(), &json!({}));
    }

    #[test]
    fn test_unknown_media_type_yields_empty_body() {
        let req = post("text/plain", "whatever");
        assert_eq!(req.parsed_body().unwrap(), &json!({}));
    }

    #[test]
    fn test_parser_returning_scalar_is_an_error() {
        let mut req = post("text/csv", "a,b");
        req.register_media_type_parser("text/csv", Arc::new(|_: &str| json!("oops")));
        let err = req.parsed_body().unwrap_err();
        assert!(matches!(err, Exception::ParserReturnedScalar(ref m) if m == "text/csv"));
        assert!(err.is_runtime());
    }

    #[test]
    fn test_with_parsed_body_rejects_scalars() {
        let req = post("application/json", "{}");
        assert!(matches!(
            req.with_parsed_body(json!(1)),
            Err(Exception::InvalidParsedBody)
        ));
        let overridden = req.with_parsed_body(json!({"k": "v"})).unwrap();
        assert_eq!(overridden.parsed_body_param("k"), Some(json!("v")));
        assert_eq!(req.parsed_body_param("k"), None);
        let nulled = req.with_parsed_body(Value::Null).unwrap();
        assert_eq!(nulled.parsed_body().unwrap(), &Value::Null);
    }

    #[test]
    fn test_body_method_override_keeps_body_readable() {
        let mut req = post(media_type::FORM_URLENCODED, "_METHOD=PUT&x=1");
        assert_eq!(req.method().unwrap(), HttpRequestMethod::Put);
        assert_eq!(req.original_method(), HttpRequestMethod::Post);
        assert_eq!(req.body().tell().unwrap(), 0);
        req.body_mut().get_contents().unwrap();
        assert!(req.body().eof());
        assert_eq!(req.resolve_method().unwrap(), HttpRequestMethod::Put);
        assert_eq!(req.body().tell().unwrap(), 0);
        let header_wins = req.with_header(METHOD_OVERRIDE_HEADER, "PATCH");
        assert_eq!(header_wins.method().unwrap(), HttpRequestMethod::Patch);
    }

    #[test]
    fn test_invalid_method_override_is_an_error() {
        let mut req = post(media_type::FORM_URLENCODED, "_METHOD=BREW&x=1");
        assert_eq!(
            req.method().unwrap_err(),
            Exception::UnSupportedRequestMethod("BREW".to_string())
        );
        assert!(req.resolve_method().unwrap_err().is_invalid_argument());
        assert!(post("application/json", r#"{"_METHOD":7}"#).method().is_err());
        assert_eq!(
            post("application/json", r#"{"_METHOD":null}"#).method().unwrap(),
            HttpRequestMethod::Post
        );
        let header = post("text/plain", "").with_header(METHOD_OVERRIDE_HEADER, "BREW");
        assert!(header.method().is_err());
    }

    #[test]
    fn test_body_override_ignored_for_get() {
        let req = ServerRequest::new(
            "GET",
            Uri::parse("/").unwrap(),
            HeaderBag::from_pairs([("Content-Type", media_type::FORM_URLENCODED)]),
            BodySource::Bytes("_METHOD=DELETE".into()),
        )
        .unwrap();
        assert_eq!(req.method().unwrap(), HttpRequestMethod::Get);
        assert_eq!(req.parsed_body_param("_METHOD"), Some(json!("DELETE")));
    }

    #[test]
    fn test_parsed_cache_survives_content_type_change() {
        let req = post("application/json", r#"{"a":1}"#);
        assert_eq!(req.parsed_body_param("a"), Some(json!(1)));
        let retyped = req.with_header("Content-Type", "text/plain");
        assert_eq!(retyped.parsed_body_param("a"), Some(json!(1)));
        let fresh =
            post("application/json", r#"{"a":1}"#).with_header("Content-Type", "text/plain");
        assert_eq!(fresh.parsed_body().unwrap(), &json!({}));
    }

    #[test]
    fn test_with_body_resets_parsed_cache() {
        let req = post("application/json", r#"{"a":1}"#);
        assert_eq!(req.parsed_body_param("a"), Some(json!(1)));
        let replaced = req.with_body(ByteStream::from_bytes(r#"{"a":2}"#));
        assert_eq!(replaced.parsed_body_param("a"), Some(json!(2)));
        assert_eq!(req.parsed_body_param("a"), Some(json!(1)));
    }

    #[test]
    fn test_attributes_are_copy_on_write() {
        let req = ServerRequest::default();
        let with = req.with_attribute("route", "home").with_attribute("id", 5);
        assert!(req.attributes().is_empty());
        assert_eq!(with.attribute("id"), Some(&json!(5)));
        let keys: Vec<&String> = with.attributes().keys().collect();
        assert_eq!(keys, ["route", "id"]);
        let without = with.without_attribute("route");
        assert_eq!(without.attribute("route"), None);
        assert_eq!(with.attribute("route"), Some(&json!("home")));
        let mut extra = Map::new();
        extra.insert("lang".to_string(), json!("zh"));
        assert_eq!(with.with_attributes(extra).attributes().len(), 3);
    }

    #[test]
    fn test_server_protocol_overrides_version() {
        let mut server_params = Map::new();
        server_params.insert("SERVER_PROTOCOL".to_string(), json!("HTTP/1.0"));
        server_params.insert("REMOTE_ADDR".to_string(), json!("127.0.0.1"));
        let req = ServerRequest::from_parts(ServerRequestParts {
            method: "GET".to_string(),
            server_params,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(req.protocol_version(), HttpVersion::V1_0);
        assert_eq!(req.server_param("remote_addr"), Some(&json!("127.0.0.1")));
    }

    #[test]
    fn test_cookies_are_serialized() {
        let req = ServerRequest::new(
            "GET",
            Uri::parse("http://x.com/a").unwrap(),
            HeaderBag::new(),
            BodySource::default(),
        )
        .unwrap()
        .with_cookie_params([("s", "abc"), ("t", "1")]);
        assert_eq!(req.cookie_param("s"), Some("abc"));
        assert_eq!(req.cookie_params(), vec![("s", "abc"), ("t", "1")]);
        assert_eq!(
            req.to_string(),
            "GET /a HTTP/1.1\r\nHost: x.com\r\nCookie: s=abc; t=1\r\n\r\n"
        );
    }

    #[test]
    fn test_query_params_override() {
        let req = post("text/plain", "");
        let mut params = Map::new();
        params.insert("only".to_string(), json!("me"));
        let replaced = req.with_query_params(params);
        assert_eq!(replaced.query_param("page"), None);
        assert_eq!(replaced.query_param("only"), Some(json!("me")));
        assert_eq!(req.query_param("page"), Some(json!("2")));
    }
}
