//! Benchmarks for capture-side helpers.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nutrivision_image::{compute_label_crop, infer_content_type, uri::normalize_uri};

fn bench_label_crop(c: &mut Criterion) {
    c.bench_function("compute_label_crop", |b| {
        b.iter(|| compute_label_crop(black_box(3024), black_box(4032)))
    });
}

fn bench_upload_metadata(c: &mut Criterion) {
    c.bench_function("infer_content_type", |b| {
        b.iter(|| infer_content_type(black_box("IMG_20240101_120000.HEIC")))
    });

    c.bench_function("normalize_uri", |b| {
        b.iter(|| normalize_uri(black_box("file:///storage/emulated/0//DCIM/My%20Label.jpg")))
    });
}

criterion_group!(benches, bench_label_crop, bench_upload_metadata);
criterion_main!(benches);
