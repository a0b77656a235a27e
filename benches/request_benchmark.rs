// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use http_message::{parser, Environment, ServerRequest};

fn simple_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET / HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Test\r\n\r\n";

    c.bench_function("simple_request_parse", |b| {
        b.iter(|| {
            let _ = parser::parse_request(black_box(request)).unwrap();
        });
    });
}

fn complex_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET /path/to/resource?id=123&name=test HTTP/1.1\r\n\
                    Host: localhost:7878\r\n\
                    User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64)\r\n\
                    Accept: text/html,application/xhtml+xml\r\n\
                    Accept-Language: en-US,en;q=0.9\r\n\
                    Accept-Encoding: gzip, deflate, br\r\n\
                    Cookie: sid=abc123; theme=dark; lang=en\r\n\
                    Connection: keep-alive\r\n\
                    \r\n";

    c.bench_function("complex_request_parse", |b| {
        b.iter(|| {
            let _ = parser::parse_request(black_box(request)).unwrap();
        });
    });
}

fn request_body_parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_body_parse");

    let requests = [
        (
            "form",
            b"POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\n\r\nname=test&tags[]=a&tags[]=b&page=2".as_slice(),
        ),
        (
            "json",
            b"POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\r\n{\"name\":\"test\",\"tags\":[\"a\",\"b\"],\"page\":2}".as_slice(),
        ),
        (
            "xml",
            b"POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/xml\r\n\r\n<form><name>test</name><tag>a</tag><tag>b</tag></form>".as_slice(),
        ),
    ];

    for (name, request) in requests.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), request, |b, request| {
            b.iter(|| {
                let request = ServerRequest::make_by_parse_raw_data(black_box(request)).unwrap();
                let _ = request.params();
            });
        });
    }

    group.finish();
}

fn request_parse_different_path_lengths_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse_path_length");

    let paths = [
        ("short", "/"),
        ("medium", "/path/to/resource"),
        ("long", "/very/long/path/to/some/resource/with/many/segments/and/a/query?param1=value1&param2=value2&param3=value3"),
    ];

    for (name, path) in paths.iter() {
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
        group.bench_with_input(BenchmarkId::from_parameter(name), &request, |b, request| {
            b.iter(|| {
                let _ = parser::parse_request(black_box(request.as_bytes())).unwrap();
            });
        });
    }

    group.finish();
}

fn request_parse_batch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse_batch");

    for count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let request = b"GET / HTTP/1.1\r\nHost: localhost\r\nUser-Agent: Test\r\nAccept-Encoding: gzip\r\n\r\n";

            b.iter(|| {
                for _ in 0..count {
                    let _ = parser::parse_request(black_box(request)).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn server_request_from_env_benchmark(c: &mut Criterion) {
    let env = Environment::mock([
        ("REQUEST_METHOD", "POST"),
        ("REQUEST_URI", "/login?next=%2Fhome"),
        ("HTTP_HOST", "shop.example.com:8080"),
        ("HTTP_COOKIE", "sid=s1; theme=dark"),
    ]);

    c.bench_function("server_request_from_env", |b| {
        b.iter(|| {
            let _ = http_message::environment::server_request_from_env(black_box(&env), "user=ann")
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    simple_request_parse_benchmark,
    complex_request_parse_benchmark,
    request_body_parse_benchmark,
    request_parse_different_path_lengths_benchmark,
    request_parse_batch_benchmark,
    server_request_from_env_benchmark
);
criterion_main!(benches);
