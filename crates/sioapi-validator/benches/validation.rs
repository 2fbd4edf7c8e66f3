//! Validation benchmarks for the event validation chain.
//!
//! Run with: cargo bench -p sioapi-validator

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use sioapi_spec::{DocShape, ShapeDescriptor, StructuralSchema};
use sioapi_validator::{CompiledShape, EventArgs, Reply, ValidationChain};

/// Request shape of the downloader example, with a nested options object.
fn download_request() -> ShapeDescriptor {
    ShapeDescriptor::new(
        "DownloadFileRequest",
        StructuralSchema::from_value(json!({
            "type": "object",
            "required": ["url", "location"],
            "properties": {
                "url": { "type": "string", "format": "uri" },
                "location": { "type": "string", "minLength": 1 },
                "check_hash": { "type": "boolean", "default": false },
                "options": { "$ref": "#/definitions/Options" }
            },
            "definitions": {
                "Options": {
                    "type": "object",
                    "properties": {
                        "retries": { "type": "integer", "minimum": 0, "maximum": 10 },
                        "tags": { "type": "array", "items": { "type": "string" }, "maxItems": 10 }
                    }
                }
            }
        })),
    )
}

fn download_accepted() -> ShapeDescriptor {
    ShapeDescriptor::new(
        "DownloadAccepted",
        StructuralSchema::from_value(json!({
            "type": "object",
            "required": ["data"],
            "properties": {
                "success": { "type": "boolean" },
                "data": {
                    "type": "object",
                    "properties": { "is_accepted": { "type": "boolean" } }
                }
            }
        })),
    )
}

fn bench_shape_compilation(c: &mut Criterion) {
    let request = download_request();

    c.bench_function("shape_compilation", |b| {
        b.iter(|| {
            black_box(CompiledShape::compile(&request).ok());
        });
    });
}

fn bench_request_validation(c: &mut Criterion) {
    let shape = CompiledShape::compile(&download_request()).unwrap();

    let small = json!({
        "url": "https://cdn.example.com/tree.jpg",
        "location": "/tmp/tree.jpg"
    });
    let nested = json!({
        "url": "https://cdn.example.com/tree.jpg",
        "location": "/tmp/tree.jpg",
        "check_hash": true,
        "options": { "retries": 3, "tags": ["a", "b", "c", "d", "e"] }
    });
    let invalid = json!({
        "url": "not a uri",
        "options": { "retries": 99 }
    });

    let mut group = c.benchmark_group("request_validation");

    for (name, payload) in [("small_valid", &small), ("nested_valid", &nested), ("invalid", &invalid)] {
        group.bench_with_input(BenchmarkId::new("payload", name), payload, |b, payload| {
            b.iter(|| {
                black_box(shape.validate(payload).is_ok());
            });
        });
    }

    group.finish();
}

fn bench_chain_invoke(c: &mut Criterion) {
    let request = DocShape::Explicit(download_request());
    let response = DocShape::Explicit(download_accepted());
    let enabled =
        ValidationChain::from_shapes("download_file", &request, &response, true).unwrap();
    let disabled =
        ValidationChain::from_shapes("download_file", &request, &response, false).unwrap();

    let args = EventArgs::payload(json!({
        "url": "https://cdn.example.com/tree.jpg",
        "location": "/tmp/tree.jpg"
    }));
    let handler = |_: &EventArgs| -> anyhow::Result<Reply> {
        Ok(Reply::value(json!({ "success": true, "data": { "is_accepted": true } })))
    };

    let mut group = c.benchmark_group("chain_invoke");

    group.bench_function("validation_enabled", |b| {
        b.iter(|| {
            black_box(enabled.invoke(&args, handler).ok());
        });
    });

    group.bench_function("validation_disabled", |b| {
        b.iter(|| {
            black_box(disabled.invoke(&args, handler).ok());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_shape_compilation,
    bench_request_validation,
    bench_chain_invoke,
);
criterion_main!(benches);
