//! Orchestrator tests against an in-memory cluster

use std::sync::Arc;

use logcollect::collect::fsm::RunPhase;
use logcollect::collect::Selection;
use logcollect::errors::CollectError;

use crate::support::{self, Call, FakeCluster};

fn selection() -> Selection {
    Selection {
        federation: Some("fed-x".to_string()),
        ..Default::default()
    }
}

fn exec_calls(calls: &[Call], wanted: &str) -> Vec<(String, String)> {
    calls
        .iter()
        .filter_map(|call| match call {
            Call::Exec {
                instance,
                method,
                url,
            } if method == wanted => Some((instance.clone(), url.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_default_run_fetches_common_once_per_kind() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );
    let mut state = support::locked_state();

    let report = orchestrator.run(&selection(), &mut state).await.unwrap();

    // amf-cc-0: common + default, amf-cc-1: default, amf-n2-0: common + default
    assert_eq!(report.bundles, 5);
    assert_eq!(report.container_logs, 0);
    assert_eq!(report.manifests, 0);
    assert_eq!(state.phase(), RunPhase::Archiving);
    assert_eq!(state.common.fetched_kinds(), vec!["amf-cc", "amf-n2"]);

    let gets = exec_calls(&cluster.calls(), "GET");
    let common: Vec<_> = gets
        .iter()
        .filter(|(_, url)| url.ends_with("/debug/v1/logCollect/common"))
        .collect();
    assert_eq!(common.len(), 2);
    assert_eq!(common[0].0, "amf-cc-0");
    assert_eq!(common[1].0, "amf-n2-0");

    assert!(report.archive.exists());
    assert!(!staging_root.path().join("fed-x").exists());
    assert_eq!(
        abort.working_dir(),
        Some(staging_root.path().join("fed-x").as_path())
    );
}

#[tokio::test]
async fn test_delete_only_after_copy() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, _abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );

    orchestrator
        .run(&selection(), &mut support::locked_state())
        .await
        .unwrap();

    let calls = cluster.calls();
    for (position, call) in calls.iter().enumerate() {
        let Call::Exec { method, url, .. } = call else {
            continue;
        };
        if method != "DELETE" {
            continue;
        }
        let file_name = url.rsplit('/').next().unwrap();
        let copied_before = calls[..position].iter().any(|earlier| {
            matches!(earlier, Call::Copy { remote, .. } if remote == &format!("/tmp/{}", file_name))
        });
        assert!(copied_before, "{} deleted before it was copied", file_name);
    }
    assert_eq!(exec_calls(&calls, "DELETE").len(), 5);
}

#[tokio::test]
async fn test_copy_failure_skips_delete_and_purges() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut fake = FakeCluster::new();
    fake.fail_copy = true;
    let cluster = Arc::new(fake);
    let (orchestrator, _abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );

    let result = orchestrator
        .run(&selection(), &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::ClusterCommand { .. })));
    assert!(exec_calls(&cluster.calls(), "DELETE").is_empty());
    assert!(!staging_root.path().join("fed-x").exists());
    assert!(support::file_names(output.path()).is_empty());
}

#[tokio::test]
async fn test_container_log_failure_purges() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut fake = FakeCluster::new();
    fake.fail_logs = true;
    let cluster = Arc::new(fake);
    let (orchestrator, _abort) = support::orchestrator(
        cluster,
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        deployment: Some("amf-cc".to_string()),
        ..selection()
    };

    let result = orchestrator
        .run(&selection, &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::ClusterCommand { .. })));
    assert!(!staging_root.path().join("fed-x").exists());
}

#[tokio::test]
async fn test_unknown_deployment_collects_nothing() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, _abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        deployment: Some("ghost".to_string()),
        ..selection()
    };

    let result = orchestrator
        .run(&selection, &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::InvalidSelection(_))));
    assert!(cluster.calls().iter().all(|call| matches!(
        call,
        Call::ListNamespaces | Call::ListPods | Call::PodInventory | Call::ListDeployments
    )));
    assert!(!staging_root.path().join("fed-x").exists());
}

#[tokio::test]
async fn test_container_without_deployment_rejected() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, _abort) = support::orchestrator(
        cluster,
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        container: Some("infra".to_string()),
        ..selection()
    };

    let result = orchestrator
        .run(&selection, &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::InvalidSelection(_))));
}

#[tokio::test]
async fn test_unsupported_federation_never_stages() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut fake = FakeCluster::new();
    fake.namespaces.push("fed-y".to_string());
    let cluster = Arc::new(fake);
    let (orchestrator, abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        federation: Some("fed-y".to_string()),
        ..Default::default()
    };

    let result = orchestrator
        .run(&selection, &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::InvalidSelection(_))));
    assert_eq!(cluster.calls(), vec![Call::ListNamespaces]);
    assert!(abort.working_dir().is_none());
}

#[tokio::test]
async fn test_namespace_listing_failure() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut fake = FakeCluster::new();
    fake.fail_namespaces = true;
    let (orchestrator, _abort) = support::orchestrator(
        Arc::new(fake),
        support::options(staging_root.path(), output.path()),
    );

    let result = orchestrator
        .run(&selection(), &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::ClusterCommand { .. })));
    assert!(support::file_names(staging_root.path()).is_empty());
}

#[tokio::test]
async fn test_all_deployments_only_debug() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, _abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        deployment: Some("all".to_string()),
        only_debug: true,
        ..selection()
    };

    let report = orchestrator
        .run(&selection, &mut support::locked_state())
        .await
        .unwrap();

    let calls = cluster.calls();
    let workers: Vec<_> = calls
        .iter()
        .filter(|call| matches!(call, Call::Workers(_)))
        .collect();
    assert_eq!(
        workers,
        vec![
            &Call::Workers("amf-cc".to_string()),
            &Call::Workers("amf-n2".to_string())
        ]
    );
    // amf-cc-0 and amf-cc-1 with two containers each, amf-n2-0 with one
    assert_eq!(report.container_logs, 5);
    assert_eq!(report.manifests, 2);
    assert_eq!(report.bundles, 0);
    assert!(!calls.iter().any(|call| matches!(call, Call::Exec { .. })));
}

#[tokio::test]
async fn test_single_container_dump() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, _abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        deployment: Some("amf-cc".to_string()),
        container: Some("infra".to_string()),
        only_debug: true,
        ..selection()
    };

    let report = orchestrator
        .run(&selection, &mut support::locked_state())
        .await
        .unwrap();

    assert_eq!(report.container_logs, 2);
    let logs: Vec<_> = cluster
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Logs {
                instance,
                container,
            } => Some((instance, container)),
            _ => None,
        })
        .collect();
    assert_eq!(
        logs,
        vec![
            ("amf-cc-0".to_string(), "infra".to_string()),
            ("amf-cc-1".to_string(), "infra".to_string())
        ]
    );
}

#[tokio::test]
async fn test_missing_container_rejected_and_purged() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, _abort) = support::orchestrator(
        cluster,
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        deployment: Some("amf-cc".to_string()),
        container: Some("sidecar".to_string()),
        ..selection()
    };

    let result = orchestrator
        .run(&selection, &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::InvalidSelection(_))));
    assert!(!staging_root.path().join("fed-x").exists());
}

#[tokio::test]
async fn test_no_workers_still_dumps_manifest() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut fake = FakeCluster::new();
    fake.workers.insert("amf-n2".to_string(), Vec::new());
    let cluster = Arc::new(fake);
    let (orchestrator, _abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        deployment: Some("amf-n2".to_string()),
        only_debug: true,
        ..selection()
    };

    let report = orchestrator
        .run(&selection, &mut support::locked_state())
        .await
        .unwrap();

    assert_eq!(report.container_logs, 0);
    assert_eq!(report.manifests, 1);
    let calls = cluster.calls();
    assert!(!calls.iter().any(|call| matches!(call, Call::Logs { .. })));
    assert!(calls.contains(&Call::Manifest("amf-n2".to_string())));
}

#[tokio::test]
async fn test_verbose_uses_verbose_endpoint() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let cluster = Arc::new(FakeCluster::new());
    let (orchestrator, _abort) = support::orchestrator(
        cluster.clone(),
        support::options(staging_root.path(), output.path()),
    );
    let selection = Selection {
        workload_kind: Some("amf-n2".to_string()),
        verbose: true,
        ..selection()
    };

    orchestrator
        .run(&selection, &mut support::locked_state())
        .await
        .unwrap();

    let urls: Vec<String> = exec_calls(&cluster.calls(), "GET")
        .into_iter()
        .map(|(_, url)| url)
        .collect();
    assert_eq!(
        urls,
        vec![
            "http://127.0.0.1:8080/debug/v1/logCollect/common".to_string(),
            "http://127.0.0.1:8080/debug/v1/logCollect/verbose".to_string()
        ]
    );
}

#[tokio::test]
async fn test_archive_failure_purges() {
    let staging_root = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let missing_output = output.path().join("does-not-exist");
    let (orchestrator, _abort) = support::orchestrator(
        Arc::new(FakeCluster::new()),
        support::options(staging_root.path(), &missing_output),
    );

    let result = orchestrator
        .run(&selection(), &mut support::locked_state())
        .await;

    assert!(matches!(result, Err(CollectError::Archive(_))));
    assert!(!staging_root.path().join("fed-x").exists());
    assert!(!missing_output.exists());
}
