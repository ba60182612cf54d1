//! End-to-end runs of the pipeline through its public API.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use prism_core::pipeline::{MemorySink, PipelineEvent};
use prism_core::{
    assets, Config, InputStatus, Pipeline, PipelineError, PipelineResult, RunRequest,
    TransformKind,
};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn workspace(asset_names: &[&str]) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input_images");
    let output = dir.path().join("output_images");
    std::fs::create_dir(&input).unwrap();
    for name in asset_names {
        std::fs::write(input.join(name), b"placeholder").unwrap();
    }
    Workspace {
        _dir: dir,
        input,
        output,
    }
}

fn request(ws: &Workspace, kind: TransformKind, num_tasks: usize, workers: usize) -> RunRequest {
    RunRequest {
        input_dir: ws.input.clone(),
        output_dir: ws.output.clone(),
        kind,
        num_tasks,
        workers,
        seed: Some(1),
    }
}

fn always_ok(_: TransformKind, _: &Path, _: &Path) -> PipelineResult<()> {
    Ok(())
}

#[test]
fn no_assets_yields_empty_report() {
    let ws = workspace(&[]);
    let pipeline = Pipeline::new(Config::default()).with_transform(Arc::new(always_ok));

    let summary = pipeline
        .run_blocking(&request(&ws, TransformKind::Invert, 5, 3))
        .unwrap();

    assert_eq!(summary.input, InputStatus::Empty);
    assert_eq!(summary.tasks_emitted, 0);
    assert_eq!(summary.report.expected, 0);
    assert_eq!(summary.report.total, 0);
    assert_eq!(summary.report.successful, 0);
    assert_eq!(summary.report.failed, 0);
    assert!(summary.report.complete);
}

#[test]
fn single_asset_ten_tasks_three_workers() {
    let ws = workspace(&["photo.png"]);
    let pipeline = Pipeline::new(Config::default()).with_transform(Arc::new(always_ok));

    let summary = pipeline
        .run_blocking(&request(&ws, TransformKind::Mirror, 10, 3))
        .unwrap();

    assert_eq!(summary.input, InputStatus::Found { assets: 1 });
    assert_eq!(summary.report.total, 10);
    assert_eq!(summary.report.successful, 10);
    assert_eq!(summary.report.failed, 0);
    assert_eq!(summary.report.task_ids(), (0..10).collect::<Vec<_>>());
    assert!(summary.report.per_worker().keys().all(|id| *id < 3));
    assert!(ws.output.is_dir());
}

#[test]
fn failure_for_one_task_is_isolated() {
    let ws = workspace(&["asset.png"]);
    let fail_task_two = |kind: TransformKind, src: &Path, dst: &Path| -> PipelineResult<()> {
        let name = dst.file_name().unwrap().to_string_lossy();
        if name.starts_with(&format!("asset_{kind}_2_")) {
            Err(PipelineError::transform_failure(
                src,
                "decode: truncated file",
            ))
        } else {
            Ok(())
        }
    };
    let pipeline = Pipeline::new(Config::default()).with_transform(Arc::new(fail_task_two));

    let summary = pipeline
        .run_blocking(&request(&ws, TransformKind::Invert, 4, 2))
        .unwrap();

    assert_eq!(summary.report.total, 4);
    assert_eq!(summary.report.successful, 3);
    assert_eq!(summary.report.failed, 1);

    let failures: Vec<_> = summary.report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].task_id, 2);
    assert!(failures[0].message.contains("truncated file"));
}

#[test]
fn panicking_transform_does_not_stop_the_pool() {
    let ws = workspace(&["asset.png"]);
    let panic_on_even = |_: TransformKind, _: &Path, dst: &Path| -> PipelineResult<()> {
        let name = dst.file_name().unwrap().to_string_lossy().into_owned();
        let index: u64 = name.split('_').nth(2).unwrap().parse().unwrap();
        if index % 2 == 0 {
            panic!("simulated crash on {name}");
        }
        Ok(())
    };
    let pipeline = Pipeline::new(Config::default()).with_transform(Arc::new(panic_on_even));

    let summary = pipeline
        .run_blocking(&request(&ws, TransformKind::Blur, 8, 2))
        .unwrap();

    assert_eq!(summary.report.total, 8);
    assert_eq!(summary.report.failed, 4);
    let failed: HashSet<u64> = summary.report.failures().map(|o| o.task_id).collect();
    assert_eq!(failed, HashSet::from([0, 2, 4, 6]));
}

#[test]
fn missing_input_is_reported_not_fatal() {
    let ws = workspace(&[]);
    let missing = ws.input.join("does-not-exist");
    let pipeline = Pipeline::new(Config::default()).with_transform(Arc::new(always_ok));

    let mut req = request(&ws, TransformKind::Invert, 5, 2);
    req.input_dir = missing.clone();
    let summary = pipeline.run_blocking(&req).unwrap();

    assert_eq!(summary.input, InputStatus::NotFound { path: missing });
    assert!(summary.input.is_no_input());
    assert_eq!(summary.report.total, 0);
}

#[test]
fn more_workers_than_tasks() {
    let ws = workspace(&["a.png", "b.jpg"]);
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::new(Config::default())
        .with_transform(Arc::new(always_ok))
        .with_events(sink.clone());

    let summary = pipeline
        .run_blocking(&request(&ws, TransformKind::Invert, 2, 8))
        .unwrap();

    assert_eq!(summary.report.task_ids(), vec![0, 1]);
    assert_eq!(
        sink.count(|e| matches!(e, PipelineEvent::WorkerStarted { .. })),
        8
    );
    assert_eq!(
        sink.count(|e| matches!(e, PipelineEvent::WorkerStopped { .. })),
        8
    );
}

#[test]
fn tiny_buffers_do_not_deadlock() {
    let ws = workspace(&["a.png"]);
    let mut config = Config::default();
    config.pipeline.task_buffer_size = 1;
    config.pipeline.result_buffer_size = 1;
    let pipeline = Pipeline::new(config).with_transform(Arc::new(always_ok));

    let summary = pipeline
        .run_blocking(&request(&ws, TransformKind::Invert, 200, 4))
        .unwrap();

    assert_eq!(summary.report.total, 200);
    assert!(summary.report.complete);
}

#[test]
fn real_images_through_every_transform() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input_images");
    assets::generate(&input).unwrap();
    let pipeline = Pipeline::new(Config::default());

    for kind in TransformKind::ALL {
        let output = dir.path().join(format!("out_{kind}"));
        let summary = pipeline
            .run_blocking(&RunRequest {
                input_dir: input.clone(),
                output_dir: output.clone(),
                kind,
                num_tasks: 6,
                workers: 3,
                seed: Some(3),
            })
            .unwrap();

        assert_eq!(summary.input, InputStatus::Found { assets: 6 });
        assert_eq!(
            summary.report.successful, 6,
            "{kind}: {:?}",
            summary.report.outcomes
        );
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 6);
    }
}
