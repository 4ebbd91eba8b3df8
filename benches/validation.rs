//! Benchmarks for well-formedness checking.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use svgpad::validate::validate;

fn nested_document(shapes: usize) -> String {
    let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1000 1000">"#);
    for i in 0..shapes {
        svg.push_str(&format!(
            r#"<g transform="translate({i} {i})"><rect width="10" height="10" fill="&#x23;f00"/></g>"#
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn bench_validate(c: &mut Criterion) {
    let doc = nested_document(1_000);
    c.bench_function("validate_1000_shapes", |b| {
        b.iter(|| validate(black_box(&doc)))
    });

    let broken = doc.replacen("</g>", "</h>", 1);
    c.bench_function("validate_early_error", |b| {
        b.iter(|| validate(black_box(&broken)))
    });
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
