//! Command-line options

use std::path::PathBuf;

use clap::Parser;

use crate::collect::Selection;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

const LONG_ABOUT: &str = "\
Automated retrieval and storage of log data to improve debuggability.

Collects debug API bundles from the workload pods of a federation, and
optionally raw container logs plus deployment manifests, into a single
timestamped .tar.gz archive in the current directory.

The federation must be provided with '-n'. '-p' restricts debug API
collection to one workload kind. '-d' adds container logs and deployment
manifests for one deployment (or 'all'); '-c' narrows that to one
container.";

const EXAMPLES: &str = "\
Examples:
    # Collect debug API logs of all workload kinds in fed-amf
    kubectl logCollect -n fed-amf

    # Collect debug API logs of one workload kind
    kubectl logCollect -n fed-amf -p amf-cc

    # Additionally dump container logs and the manifest of a deployment
    kubectl logCollect -n fed-amf -d amf-cc

    # Dump the logs of one container only
    kubectl logCollect -n fed-amf -d amf-n2 -c infra

    # Container logs and manifests of every deployment
    kubectl logCollect -n fed-amf -d all

    # Container logs and manifests only, no debug API logs
    kubectl logCollect -n fed-amf -d all --onlydebug";

/// Collect workload logs and manifests from a federation into one archive.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "kubectl-logCollect", bin_name = "kubectl logCollect")]
#[command(version, long_version = LONG_VERSION, long_about = LONG_ABOUT, after_long_help = EXAMPLES)]
pub struct Cli {
    /// Name of the federation
    #[arg(short = 'n', long = "namespace")]
    pub namespace: Option<String>,

    /// Workload kind to collect debug API logs for
    #[arg(short = 'p', long = "pod")]
    pub pod: Option<String>,

    /// Deployment to dump container logs and manifest for, or 'all'
    #[arg(short = 'd', long = "debuglogs")]
    pub debuglogs: Option<String>,

    /// Container to dump logs for (requires --debuglogs)
    #[arg(short = 'c', long = "container")]
    pub container: Option<String>,

    /// Collect the verbose debug API bundle per instance
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Store only container logs and manifests, without debug API logs
    #[arg(long = "onlydebug")]
    pub only_debug: bool,

    /// Settings file (defaults to ~/.logcollect/settings.json)
    #[arg(long = "settings", env = "LOGCOLLECT_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Log level for diagnostics on stderr
    #[arg(long = "log-level")]
    pub log_level: Option<LogLevel>,

    /// Directory the archive is written to
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// The operator's selection, unvalidated
    pub fn selection(&self) -> Selection {
        Selection {
            federation: self.namespace.clone(),
            workload_kind: self.pod.clone(),
            deployment: self.debuglogs.clone(),
            container: self.container.clone(),
            verbose: self.verbose,
            only_debug: self.only_debug,
        }
    }

    /// Settings file to load
    pub fn settings_file(&self, layout: &StorageLayout) -> File {
        match &self.settings {
            Some(path) => File::new(path),
            None => layout.settings_file(),
        }
    }

    /// Apply command-line overrides on top of file settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
    }
}

/// Everything a run needs
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub settings: Settings,
    pub selection: Selection,
    pub lock_file: File,
}

impl AppOptions {
    pub fn new(settings: Settings, selection: Selection, layout: &StorageLayout) -> Self {
        let lock_file = layout.lock_file(&settings.lock_file_name);
        Self {
            settings,
            selection,
            lock_file,
        }
    }
}
