// tests/progress_file.rs

use std::error::Error;
use std::fs;

use chrono::{TimeDelta, Utc};
use tempfile::tempdir;

use fleetdeploy::errors::DeployError;
use fleetdeploy::DeploymentProgress;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn persist_then_restore_is_lossless_on_disk() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("a/b/deployment_progress.json");

    let mut progress = DeploymentProgress::new();
    progress.total_tasks = 4;
    progress.current_task = "install-storage".into();
    progress.mark_started("prepare-artifact", "prepare-artifact", Utc::now());
    progress.mark_completed("prepare-artifact", Utc::now() + TimeDelta::milliseconds(1500));
    progress.mark_started("install-storage", "install-storage", Utc::now());
    progress
        .task_progress
        .get_mut("install-storage")
        .unwrap()
        .total_steps = 5;

    progress.persist(&path)?;
    let restored = DeploymentProgress::restore(&path)?;

    assert_eq!(restored, progress);
    Ok(())
}

#[test]
fn restore_of_missing_file_is_fresh() -> TestResult {
    let dir = tempdir()?;
    let restored = DeploymentProgress::restore(dir.path().join("nope.json"))?;
    assert_eq!(restored.total_tasks, 0);
    assert_eq!(restored.completed_tasks, 0);
    assert!(restored.task_progress.is_empty());
    Ok(())
}

#[test]
fn restore_of_garbage_is_a_json_error() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("progress.json");
    fs::write(&path, "not json at all")?;

    match DeploymentProgress::restore(&path) {
        Err(DeployError::JsonError(_)) => Ok(()),
        other => panic!("expected JsonError, got {other:?}"),
    }
}

#[test]
fn file_uses_documented_field_names() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("progress.json");

    let mut progress = DeploymentProgress::new();
    progress.total_tasks = 1;
    progress.mark_started("push-config", "Push config", Utc::now());
    progress.persist(&path)?;

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    for field in ["startTime", "totalTasks", "completedTasks", "currentTask", "taskProgress"] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
    assert!(json.get("endTime").is_none());

    let record = &json["taskProgress"]["push-config"];
    for field in ["taskId", "name", "completed", "totalSteps", "completedSteps", "startTime"] {
        assert!(record.get(field).is_some(), "missing record field {field}");
    }
    assert_eq!(record["name"], "Push config");
    assert_eq!(record["completed"], false);
    Ok(())
}

#[test]
fn accepts_files_without_optional_fields() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("progress.json");
    fs::write(
        &path,
        r#"{
  "startTime": "2025-03-01T10:00:00Z",
  "totalTasks": 2,
  "completedTasks": 1,
  "currentTask": "b",
  "taskProgress": {
    "a": {
      "taskId": "a",
      "name": "a",
      "completed": true,
      "startTime": "2025-03-01T10:00:01Z",
      "endTime": "2025-03-01T10:00:09Z"
    }
  }
}"#,
    )?;

    let restored = DeploymentProgress::restore(&path)?;
    assert!(restored.is_completed("a"));
    assert!(!restored.is_completed("b"));
    assert_eq!(restored.task_progress["a"].total_steps, 0);
    assert!(restored.end_time.is_none());
    Ok(())
}
