//! Top-level run: lock, orchestration raced against abort signals, unlock

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app::abort::{self, AbortHandle, AbortSignals};
use crate::app::guard::SingletonGuard;
use crate::app::options::AppOptions;
use crate::cluster::ClusterClient;
use crate::collect::fsm::RunEvent;
use crate::collect::state::RunState;
use crate::collect::{CollectionReport, Orchestrator, OrchestratorOptions};
use crate::console;
use crate::errors::CollectError;
use crate::exit::{codes, exit_code};

enum Outcome {
    Finished(Result<CollectionReport, CollectError>),
    Interrupted { code: i32 },
}

/// Run one collection and return the process exit code. Console output is
/// complete when this returns, including the closing line.
pub async fn run(options: AppOptions, cluster: Arc<dyn ClusterClient>) -> i32 {
    match AbortSignals::install() {
        Ok(mut signals) => run_until(options, cluster, signals.recv()).await,
        Err(e) => {
            let result = Err(e);
            report(&result);
            console::farewell();
            exit_code_of(&result)
        }
    }
}

/// Like [`run`], with the abort request supplied by the caller.
/// `interrupted` resolves to the signal number that cancels the run.
pub async fn run_until<F>(
    options: AppOptions,
    cluster: Arc<dyn ClusterClient>,
    interrupted: F,
) -> i32
where
    F: Future<Output = i32>,
{
    let code = match run_impl(options, cluster, interrupted).await {
        Outcome::Finished(result) => {
            report(&result);
            exit_code_of(&result)
        }
        Outcome::Interrupted { code } => code,
    };
    console::farewell();
    code
}

async fn run_impl<F>(options: AppOptions, cluster: Arc<dyn ClusterClient>, interrupted: F) -> Outcome
where
    F: Future<Output = i32>,
{
    let mut state = RunState::new(options.settings.workload_kinds.iter().cloned());
    let guard = SingletonGuard::new(options.lock_file.clone());

    // Not ours to release if someone else holds it
    if let Err(e) = guard.acquire().await {
        transition(&mut state, RunEvent::Abort(e.to_string()));
        return Outcome::Finished(Err(e));
    }
    transition(&mut state, RunEvent::Lock);

    let abort = AbortHandle::new();
    let orchestrator = Orchestrator::new(
        cluster,
        OrchestratorOptions::from(&options.settings),
        abort.clone(),
    );

    // select! drops both futures before a branch handler runs, so the purge
    // in the signal branch cannot race with a staged write.
    let result = tokio::select! {
        result = orchestrator.run(&options.selection, &mut state) => result,
        signum = interrupted => {
            warn!("Run cancelled by signal {}", signum);
            transition(&mut state, RunEvent::Abort(format!("signal {}", signum)));
            return Outcome::Interrupted {
                code: abort::terminate(&abort, signum),
            };
        }
    };

    if let Err(e) = &result {
        transition(&mut state, RunEvent::Abort(e.to_string()));
    }

    if let Err(e) = guard.release().await {
        error!("Failed to release lock: {}", e);
    }
    transition(&mut state, RunEvent::Unlock);

    info!("Run finished in phase {}", state.phase());
    Outcome::Finished(result)
}

fn transition(state: &mut RunState, event: RunEvent) {
    if let Err(e) = state.advance(event) {
        error!("{}", e);
    }
}

fn exit_code_of(result: &Result<CollectionReport, CollectError>) -> i32 {
    match result {
        Ok(_) => codes::SUCCESS,
        Err(e) => exit_code(e),
    }
}

fn report(result: &Result<CollectionReport, CollectError>) {
    match result {
        Ok(report) => {
            console::success(format!("Logs stored in {}", report.archive.display()));
        }
        Err(e @ CollectError::AlreadyRunning { .. }) => console::failure(e.to_string()),
        Err(e) => console::failure(format!("Error: {}\nCleaning up and exiting...", e)),
    }
}
