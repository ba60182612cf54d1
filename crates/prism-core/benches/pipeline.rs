//! Benchmarks for the Prism transformation pipeline.
//!
//! Run with: cargo bench -p prism-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::DynamicImage;
use prism_core::config::TransformConfig;
use prism_core::pipeline::{ImageTransformer, NoopSink};
use prism_core::{BoundedChannel, Config, Pipeline, PipelineResult, RunRequest, TransformKind};
use std::path::Path;
use std::sync::Arc;
use std::thread;

fn benchmark_channel_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_handoff_10k");

    for capacity in [1, 5, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &cap| {
            b.iter(|| {
                let channel = Arc::new(BoundedChannel::<u64>::new(cap).unwrap());
                let consumer = {
                    let channel = Arc::clone(&channel);
                    thread::spawn(move || {
                        let mut sum = 0u64;
                        while let Some(v) = channel.get() {
                            sum += v;
                        }
                        sum
                    })
                };
                for i in 0..10_000u64 {
                    channel.put(black_box(i)).unwrap();
                }
                channel.close();
                consumer.join().unwrap()
            })
        });
    }
    group.finish();
}

fn benchmark_noop_pipeline(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("a.png"), b"x").unwrap();

    let noop = |_: TransformKind, _: &Path, _: &Path| -> PipelineResult<()> { Ok(()) };
    let pipeline = Pipeline::new(Config::default())
        .with_transform(Arc::new(noop))
        .with_events(Arc::new(NoopSink));

    let mut group = c.benchmark_group("noop_pipeline_1k_tasks");
    for workers in [1, 3, 8] {
        let request = RunRequest {
            input_dir: input.clone(),
            output_dir: dir.path().join("out"),
            kind: TransformKind::Invert,
            num_tasks: 1_000,
            workers,
            seed: Some(0),
        };
        group.bench_with_input(BenchmarkId::from_parameter(workers), &request, |b, req| {
            b.iter(|| pipeline.run_blocking(black_box(req)).unwrap())
        });
    }
    group.finish();
}

fn benchmark_transforms(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(300, 200);
    let transformer = ImageTransformer::new(TransformConfig::default());

    for kind in TransformKind::ALL {
        c.bench_function(&format!("transform_{kind}_300x200"), |b| {
            b.iter(|| transformer.apply_to_image(kind, black_box(img.clone())))
        });
    }
}

criterion_group!(
    benches,
    benchmark_channel_handoff,
    benchmark_noop_pipeline,
    benchmark_transforms,
);
criterion_main!(benches);
