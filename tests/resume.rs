// tests/resume.rs

use std::error::Error;
use std::sync::Arc;

use chrono::Utc;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use fleetdeploy::context::ExecutionContext;
use fleetdeploy::fs::mock::MockFileSystem;
use fleetdeploy::runner::Runner;
use fleetdeploy::task::{Task, TaskFuture};
use fleetdeploy::DeploymentProgress;
use fleetdeploy_test_utils::builders::ConfigFileBuilder;
use fleetdeploy_test_utils::fake_tasks::{entries, new_log, ExecutionLog, FakeTask};
use fleetdeploy_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn abc(log: &ExecutionLog) -> Vec<Box<dyn Task>> {
    ["A", "B", "C"]
        .iter()
        .map(|n| FakeTask::succeed(n, log).boxed())
        .collect()
}

/// Progress where `completed` tasks finished and `started` tasks began but
/// never finished.
fn prior_progress(completed: &[&str], started: &[&str]) -> DeploymentProgress {
    let mut p = DeploymentProgress::new();
    p.total_tasks = 3;
    for name in completed {
        p.mark_started(name, name, Utc::now());
        p.mark_completed(name, Utc::now());
    }
    for name in started {
        p.mark_started(name, name, Utc::now());
        p.current_task = name.to_string();
    }
    p
}

#[tokio::test]
async fn resume_skips_completed_tasks() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("state/progress.json");
    prior_progress(&["A"], &[]).persist(&path)?;

    let log = new_log();
    let cfg = ConfigFileBuilder::new().resume(true).progress_file(&path).build();
    let mut runner = Runner::new(cfg, abc(&log));
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    // FakeTask fails if current_task is not its own name, so A never became current.
    assert_eq!(entries(&log, "run:"), vec!["B", "C"]);
    assert_eq!(entries(&log, "init:"), vec!["A", "B", "C"]);

    let on_disk = DeploymentProgress::restore(&path)?;
    assert_eq!(on_disk.completed_tasks, 3);
    assert_eq!(on_disk.total_tasks, 3);
    assert!(on_disk.end_time.is_some());
    assert_eq!(on_disk, runner.progress().unwrap());
    Ok(())
}

#[tokio::test]
async fn interrupted_task_is_rerun_on_resume() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("progress.json");
    prior_progress(&["A"], &["B"]).persist(&path)?;

    let log = new_log();
    let cfg = ConfigFileBuilder::new().resume(true).progress_file(&path).build();
    let mut runner = Runner::new(cfg, abc(&log));
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    assert_eq!(entries(&log, "run:"), vec!["B", "C"]);
    assert_eq!(DeploymentProgress::restore(&path)?.completed_tasks, 3);
    Ok(())
}

#[tokio::test]
async fn resume_after_failure_continues_from_failed_task() -> TestResult {
    let dir = tempdir()?;
    let cfg = || ConfigFileBuilder::new().work_dir(dir.path()).resume(true).build();

    let first = new_log();
    let mut runner = Runner::new(
        cfg(),
        vec![
            FakeTask::succeed("A", &first).boxed(),
            FakeTask::fail("B", "node unreachable", &first).boxed(),
            FakeTask::succeed("C", &first).boxed(),
        ],
    );
    runner.initialize()?;
    assert!(runner.run(CancellationToken::new()).await.is_err());
    drop(runner);

    let second = new_log();
    let mut runner = Runner::new(cfg(), abc(&second));
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    assert_eq!(entries(&second, "run:"), vec!["B", "C"]);
    assert_eq!(runner.progress().unwrap().completed_tasks, 3);
    Ok(())
}

#[tokio::test]
async fn resume_disabled_ignores_existing_file() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("deployment_progress.json");
    prior_progress(&["A", "B", "C"], &[]).persist(&path)?;
    let before = std::fs::read_to_string(&path)?;

    let log = new_log();
    let cfg = ConfigFileBuilder::new().work_dir(dir.path()).resume(false).build();
    let mut runner = Runner::new(cfg, abc(&log));
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    assert_eq!(entries(&log, "run:"), vec!["A", "B", "C"]);
    assert_eq!(std::fs::read_to_string(&path)?, before, "file untouched");
    Ok(())
}

#[tokio::test]
async fn malformed_progress_file_falls_back_to_fresh_run() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/deploy/progress.json", "{\"startTime\": 42");

    let log = new_log();
    let cfg = ConfigFileBuilder::new()
        .resume(true)
        .progress_file("/deploy/progress.json")
        .build();
    let mut runner = Runner::new(cfg, abc(&log)).with_file_system(Arc::new(fs.clone()));
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    assert_eq!(entries(&log, "run:"), vec!["A", "B", "C"]);
    let saved: DeploymentProgress =
        serde_json::from_str(&fs.contents("/deploy/progress.json").unwrap())?;
    assert_eq!(saved.completed_tasks, 3);
    Ok(())
}

#[tokio::test]
async fn unwritable_progress_file_does_not_abort_the_run() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.set_fail_writes(true);

    let log = new_log();
    let cfg = ConfigFileBuilder::new().resume(true).progress_file("/ro/p.json").build();
    let mut runner = Runner::new(cfg, abc(&log)).with_file_system(Arc::new(fs.clone()));
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    assert_eq!(entries(&log, "run:"), vec!["A", "B", "C"]);
    assert_eq!(fs.write_count(), 0);
    assert_eq!(runner.progress().unwrap().completed_tasks, 3);
    Ok(())
}

#[tokio::test]
async fn progress_is_saved_around_every_transition() -> TestResult {
    let fs = MockFileSystem::new();
    let log = new_log();
    let cfg = ConfigFileBuilder::new().resume(true).progress_file("/p.json").build();
    let mut runner = Runner::new(cfg, abc(&log)).with_file_system(Arc::new(fs.clone()));
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    // start + completion per task, plus the final save.
    assert_eq!(fs.write_count(), 3 * 2 + 1);
    Ok(())
}

/// Reads the on-disk progress file while running and records what it saw.
struct DiskSnapshotTask {
    path: std::path::PathBuf,
    seen: Arc<std::sync::Mutex<Option<DeploymentProgress>>>,
}

impl Task for DiskSnapshotTask {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn init(&mut self, _ctx: Arc<ExecutionContext>, _span: tracing::Span) {}

    fn run(&self, _cancel: CancellationToken) -> TaskFuture<'_> {
        Box::pin(async move {
            let progress = DeploymentProgress::restore(&self.path)?;
            *self.seen.lock().unwrap() = Some(progress);
            Ok(())
        })
    }
}

#[tokio::test]
async fn start_marker_is_on_disk_before_the_task_runs() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("progress.json");
    let seen = Arc::new(std::sync::Mutex::new(None));

    let log = new_log();
    let tasks: Vec<Box<dyn Task>> = vec![
        FakeTask::succeed("A", &log).boxed(),
        Box::new(DiskSnapshotTask {
            path: path.clone(),
            seen: Arc::clone(&seen),
        }),
    ];
    let cfg = ConfigFileBuilder::new().resume(true).progress_file(&path).build();
    let mut runner = Runner::new(cfg, tasks);
    runner.initialize()?;
    runner.run(CancellationToken::new()).await?;

    let seen = seen.lock().unwrap().clone().expect("snapshot task ran");
    assert!(seen.task_progress["A"].completed);
    let record = &seen.task_progress["snapshot"];
    assert!(!record.completed);
    assert!(record.end_time.is_none());
    assert_eq!(seen.current_task, "snapshot");
    assert_eq!(seen.completed_tasks, 1);
    Ok(())
}
