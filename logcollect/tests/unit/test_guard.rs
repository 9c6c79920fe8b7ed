//! Singleton guard and full-run tests

use std::sync::Arc;

use logcollect::app::abort::AbortHandle;
use logcollect::app::guard::SingletonGuard;
use logcollect::app::options::AppOptions;
use logcollect::app::run::{run, run_until};
use logcollect::collect::Selection;
use logcollect::errors::CollectError;
use logcollect::exit::codes;
use logcollect::filesys::file::File;
use logcollect::storage::layout::StorageLayout;
use logcollect::storage::settings::Settings;

use tokio::sync::Notify;

use crate::support::{Call, FakeCluster};

const DEAD_PID: u32 = 999_999_999;

#[tokio::test]
async fn test_second_acquire_fails_while_owner_alive() {
    let home = tempfile::tempdir().unwrap();
    let lock_file = File::new(home.path().join(".lock"));

    let first = SingletonGuard::new(lock_file.clone());
    first.acquire().await.unwrap();

    let second = SingletonGuard::with_pid(lock_file.clone(), DEAD_PID);
    let result = second.acquire().await;
    assert!(
        matches!(result, Err(CollectError::AlreadyRunning { pid }) if pid == std::process::id())
    );

    first.release().await.unwrap();
    assert!(!lock_file.exists().await);
}

#[tokio::test]
async fn test_stale_lock_is_reclaimed() {
    let home = tempfile::tempdir().unwrap();
    let lock_file = File::new(home.path().join(".lock"));
    lock_file.write_string(&DEAD_PID.to_string()).await.unwrap();

    let guard = SingletonGuard::new(lock_file.clone());
    guard.acquire().await.unwrap();

    assert_eq!(
        lock_file.read_string().await.unwrap(),
        std::process::id().to_string()
    );
}

#[tokio::test]
async fn test_garbage_lock_is_reclaimed() {
    let home = tempfile::tempdir().unwrap();
    let lock_file = File::new(home.path().join(".lock"));
    lock_file.write_string("not a pid\n").await.unwrap();

    SingletonGuard::new(lock_file.clone())
        .acquire()
        .await
        .unwrap();
}

#[test]
fn test_abort_fire_removes_published_working_dir() {
    let staging_root = tempfile::tempdir().unwrap();
    let working_dir = staging_root.path().join("fed-x");
    std::fs::create_dir_all(&working_dir).unwrap();
    std::fs::write(working_dir.join("fed-x-podsInformation.txt"), "NAME").unwrap();

    let handle = AbortHandle::new();
    assert!(!handle.fire());
    handle.publish(&working_dir);

    assert!(handle.fire());
    assert!(!working_dir.exists());
}

fn app_options(home: &std::path::Path, selection: Selection) -> AppOptions {
    let settings = Settings {
        supported_federation: "fed-x".to_string(),
        staging_root: home.join("staging"),
        output_dir: home.to_path_buf(),
        ..Settings::default()
    };
    AppOptions::new(settings, selection, &StorageLayout::new(home))
}

#[tokio::test]
async fn test_run_releases_lock_on_success() {
    let home = tempfile::tempdir().unwrap();
    let selection = Selection {
        federation: Some("fed-x".to_string()),
        ..Default::default()
    };
    let options = app_options(home.path(), selection);
    let lock_file = options.lock_file.clone();

    let code = run(options, Arc::new(FakeCluster::new())).await;

    assert_eq!(code, codes::SUCCESS);
    assert!(!lock_file.exists().await);
    let archives: Vec<_> = crate::support::file_names(home.path())
        .into_iter()
        .filter(|name| name.starts_with("fed-x-Logs_") && name.ends_with(".tar.gz"))
        .collect();
    assert_eq!(archives.len(), 1);
}

#[tokio::test]
async fn test_run_releases_lock_on_invalid_selection() {
    let home = tempfile::tempdir().unwrap();
    let options = app_options(home.path(), Selection::default());
    let lock_file = options.lock_file.clone();

    let code = run(options, Arc::new(FakeCluster::new())).await;

    assert_eq!(code, codes::INVALID_SELECTION);
    assert!(!lock_file.exists().await);
}

#[tokio::test]
async fn test_run_refuses_when_lock_held() {
    let home = tempfile::tempdir().unwrap();
    let options = app_options(
        home.path(),
        Selection {
            federation: Some("fed-x".to_string()),
            ..Default::default()
        },
    );
    let lock_file = options.lock_file.clone();
    lock_file
        .write_string(&std::process::id().to_string())
        .await
        .unwrap();
    let cluster = Arc::new(FakeCluster::new());

    let code = run(options, cluster.clone()).await;

    assert_eq!(code, codes::ALREADY_RUNNING);
    assert!(cluster.calls().is_empty());
    // Another run's lock is left alone
    assert!(lock_file.exists().await);
}

#[tokio::test]
async fn test_interrupt_cancels_collection_and_keeps_lock() {
    let home = tempfile::tempdir().unwrap();
    let options = app_options(
        home.path(),
        Selection {
            federation: Some("fed-x".to_string()),
            ..Default::default()
        },
    );
    let lock_file = options.lock_file.clone();
    let working_dir = home.path().join("staging").join("fed-x");

    let stalled = Arc::new(Notify::new());
    let mut fake = FakeCluster::new();
    fake.stall_copy = Some(stalled.clone());
    let cluster = Arc::new(fake);

    let interrupted = async move {
        stalled.notified().await;
        libc::SIGINT
    };
    let code = run_until(options, cluster.clone(), interrupted).await;
    tokio::task::yield_now().await;

    assert_eq!(code, 128 + libc::SIGINT);
    assert!(!working_dir.exists());
    // Left for the next run to reclaim as stale
    assert!(lock_file.exists().await);
    assert!(!crate::support::file_names(home.path())
        .iter()
        .any(|name| name.ends_with(".tar.gz")));

    let calls = cluster.calls();
    assert!(matches!(calls.last(), Some(Call::Copy { .. })));
    assert!(!calls
        .iter()
        .any(|call| matches!(call, Call::Exec { method, .. } if method == "DELETE")));
}
