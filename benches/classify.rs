use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use vortex::context::{InboundRequest, RequestContext};
use vortex::RouteTable;

/// Prefix classification over the standard table
fn bench_classify(c: &mut Criterion) {
    let routes = RouteTable::standard();
    let mut group = c.benchmark_group("classify");

    for path in [
        "/router/rest/user/profile",
        "/router/cas/login",
        "/router/llm",
        "/not/routed/at/all",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(path), path, |b, path| {
            b.iter(|| routes.classify(black_box(path)));
        });
    }

    group.finish();
}

/// Context construction including query decoding and format negotiation
fn bench_context_from_request(c: &mut Criterion) {
    let routes = RouteTable::standard();
    let request = InboundRequest::from_target(
        http::Method::GET,
        "/router/rest/user/profile?method=user.get&v=2.0&format=xml&api_key=k",
    )
    .with_header("X-Access-Token", "s3cret")
    .with_header("X-Request-ID", "01ARZ3NDEKTSV4RRFFQ69G5FAV");

    c.bench_function("context_from_request", |b| {
        b.iter(|| {
            let matched = routes.route(&request.path);
            RequestContext::from_request(black_box(&request), matched.family, matched.remainder)
        });
    });
}

criterion_group!(benches, bench_classify, bench_context_from_request);
criterion_main!(benches);
