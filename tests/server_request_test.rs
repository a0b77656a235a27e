// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

#[cfg(test)]
mod server_request_tests {
    //! # 服务端请求测试套件
    //!
    //! 覆盖范围包括：
    //! - 请求体按媒体类型分派解析器（含 `+json` 结构化后缀）
    //! - XML 外部实体不会被展开
    //! - 环境变量适配
    //! - 参数过滤器
    //! - 客户端传输边界（以 mockall 模拟）

    use std::sync::Arc;

    use http_message::{
        environment::{create_uri_from_env, server_request_from_env},
        BodySource, ByteStream, Environment, Exception, Filter, HeaderBag, HttpRequestMethod,
        Message, Request, RequestMessage, ServerRequest, Transport, TransportResult, Uri,
    };
    use mockall::mock;
    use serde_json::{json, Value};

    fn post(content_type: &str, body: &str) -> ServerRequest {
        ServerRequest::new(
            "POST",
            Uri::parse("https://api.example.com/things?page=2").unwrap(),
            HeaderBag::from_pairs([("Content-Type", content_type)]),
            BodySource::Stream(ByteStream::from_bytes(body.to_string())),
        )
        .unwrap()
    }

    /// ## 场景：结构化后缀
    /// `application/vnd.api+json` 按 `application/json` 解析，参数中的字符集被忽略。
    #[test]
    fn test_structured_suffix_dispatch() {
        let request = post(
            "application/vnd.api+json; charset=utf-8",
            r#"{"data":{"type":"things","id":"1"}}"#,
        );
        assert_eq!(
            request.parsed_body().unwrap(),
            &json!({"data": {"type": "things", "id": "1"}})
        );
        assert_eq!(request.content_charset(), "utf-8");
    }

    /// ## 场景：XML 请求体
    /// 属性、重复子元素与纯文本元素按固定规则转换。
    #[test]
    fn test_xml_body() {
        let request = post(
            "text/xml",
            r#"<order id="7"><item>a</item><item>b</item><note>fast</note></order>"#,
        );
        assert_eq!(
            request.parsed_body().unwrap(),
            &json!({
                "@attributes": {"id": "7"},
                "item": ["a", "b"],
                "note": "fast"
            })
        );
    }

    /// ## 攻击向量：XML 外部实体（XXE）
    /// 带有 DTD 的文档被拒绝，实体内容不会出现在解析结果中。
    #[test]
    fn test_xml_external_entity_is_not_expanded() {
        let body = r#"<?xml version="1.0"?>
<!DOCTYPE data [<!ENTITY secret SYSTEM "file:///etc/passwd">]>
<data><value>&secret;</value></data>"#;
        let request = post("application/xml", body);
        let parsed = request.parsed_body().unwrap();
        assert_eq!(parsed, &json!({}));
        assert!(!parsed.to_string().contains("root:"));
    }

    /// ## 场景：自定义解析器
    /// 返回标量的解析器属于运行时错误；重新注册解析器后缓存的解析结果失效。
    #[test]
    fn test_custom_parser_contract() {
        let mut request = post("text/csv", "a,b\n1,2");
        assert_eq!(request.parsed_body().unwrap(), &json!({}));

        request.register_media_type_parser("text/csv", Arc::new(|_: &str| json!(42)));
        let error = request.parsed_body().unwrap_err();
        assert!(matches!(error, Exception::ParserReturnedScalar(ref t) if t == "text/csv"));
        assert!(error.is_runtime());

        request.register_media_type_parser(
            "text/csv",
            Arc::new(|input: &str| {
                Value::Array(input.lines().map(|line| json!(line)).collect())
            }),
        );
        assert_eq!(request.parsed_body().unwrap(), &json!(["a,b", "1,2"]));
        assert_eq!(request.param("1"), Some(json!("1,2")));

        assert_eq!(
            request.with_parsed_body(json!("scalar")).unwrap_err(),
            Exception::InvalidParsedBody
        );
    }

    /// ## 场景：参数合并与过滤器
    #[test]
    fn test_params_and_filters() {
        let request = post(
            "application/x-www-form-urlencoded",
            "page=9&qty=12abc&email=jo%20e%40example.com&bio=%3Cb%3Ehi%3C%2Fb%3E",
        );
        assert_eq!(request.query_param("page"), Some(json!("2")));
        assert_eq!(request.param("page"), Some(json!("9")));
        assert_eq!(request.get("qty", json!(0), Filter::Int), json!(12));
        assert_eq!(request.get("email", json!(""), Filter::Email), json!("joe@example.com"));
        assert_eq!(
            request.get("bio", json!(""), "escape".parse().unwrap()),
            json!("&lt;b&gt;hi&lt;/b&gt;")
        );
        assert_eq!(request.get("missing", json!("dflt"), Filter::Trimmed), json!("dflt"));
        assert_eq!(request.params().len(), 4);
    }

    /// ## 场景：属性不影响原对象
    #[test]
    fn test_attributes_are_copy_on_write() {
        let request = post("text/plain", "");
        let tagged = request
            .with_attribute("user", json!({"id": 1}))
            .with_attribute("role", "admin");
        assert!(request.attributes().is_empty());
        assert_eq!(tagged.attribute("role"), Some(&json!("admin")));
        assert_eq!(tagged.without_attribute("user").attributes().len(), 1);
    }

    /// ## 场景：环境变量适配
    #[test]
    fn test_environment_adapter() {
        let env = Environment::mock([
            ("REQUEST_METHOD", "POST"),
            ("REQUEST_URI", "/login?next=%2Fhome"),
            ("HTTP_HOST", "shop.example.com:8080"),
            ("CONTENT_TYPE", "application/x-www-form-urlencoded"),
            ("HTTP_X_HTTP_METHOD_OVERRIDE", "PATCH"),
            ("HTTP_COOKIE", "sid=s1; sid=s2"),
        ]);
        let uri = create_uri_from_env(&env).unwrap();
        assert_eq!(uri.to_string(), "http://shop.example.com:8080/login?next=%2Fhome");

        let request = server_request_from_env(&env, "user=ann").unwrap();
        assert_eq!(request.original_method(), HttpRequestMethod::Post);
        assert_eq!(request.method().unwrap(), HttpRequestMethod::Patch);
        assert_eq!(request.header_line("Host"), "shop.example.com:8080");
        assert_eq!(request.cookie_param("sid"), Some("s1"));
        assert_eq!(request.param("user"), Some(json!("ann")));
        assert_eq!(request.query_param("next"), Some(json!("/home")));
        assert_eq!(request.accept_languages(), vec!["en-US", "en"]);
        assert_eq!(request.server_param("server_name"), Some(&json!("localhost")));
    }

    mock! {
        pub Client {}

        impl Transport for Client {
            fn send(&self, request: &Request) -> Result<TransportResult, Exception>;
        }
    }

    fn fetch(transport: &dyn Transport, url: &str) -> Result<http_message::Response, Exception> {
        let request = Request::from_uri_str("GET", url)?.with_header("Accept", "application/json");
        transport.send(&request)?.into_response()
    }

    /// ## 场景：客户端传输边界
    /// 传输层只负责返回元数据，响应由 `TransportResult` 构造。
    #[test]
    fn test_transport_result_into_response() {
        let mut client = MockClient::new();
        client
            .expect_send()
            .withf(|request: &Request| {
                request.header_line("Host") == "api.example.com"
                    && request.header_line("Accept") == "application/json"
            })
            .times(1)
            .returning(|_| {
                Ok(TransportResult {
                    status_code: 200,
                    body: r#"{"ok":true}"#.into(),
                    headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                    ..Default::default()
                })
            });

        let response = fetch(&client, "https://api.example.com/status").unwrap();
        assert!(response.is_ok());
        assert_eq!(response.header_line("content-type"), "application/json");
        assert_eq!(response.body().to_string(), r#"{"ok":true}"#);
    }

    /// ## 场景：传输失败
    #[test]
    fn test_transport_error_propagates() {
        let mut client = MockClient::new();
        client
            .expect_send()
            .returning(|_| Err(Exception::StreamIo("connection reset".to_string())));
        let error = fetch(&client, "http://down.example.com/").unwrap_err();
        assert!(error.is_runtime());
    }
}
