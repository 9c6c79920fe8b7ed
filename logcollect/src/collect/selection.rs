//! Operator selection and its resolution against live cluster state

use tracing::warn;

use crate::errors::CollectError;

/// Deployment selector value meaning every deployment
pub const ALL_DEPLOYMENTS: &str = "all";

/// What the operator asked for, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Federation (namespace) to collect from
    pub federation: Option<String>,

    /// Restrict debug API collection to one workload kind
    pub workload_kind: Option<String>,

    /// Deployment whose container logs and manifest are dumped, or `all`
    pub deployment: Option<String>,

    /// Restrict container log dumps to one container
    pub container: Option<String>,

    /// Use the verbose per-instance bundle
    pub verbose: bool,

    /// Skip debug API collection entirely
    pub only_debug: bool,
}

/// Cluster state read during discovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub pods: Vec<String>,
    pub deployments: Vec<String>,
    pub inventory: String,
}

/// Container log and manifest dumps to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLogPlan {
    pub deployments: Vec<String>,
    /// Only this container; all worker containers when unset
    pub container: Option<String>,
}

/// Debug API bundles to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugCliPlan {
    pub kinds: Vec<String>,
    pub verbose: bool,
}

/// A validated selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPlan {
    pub federation: String,
    pub debug_logs: Option<DebugLogPlan>,
    pub debug_cli: Option<DebugCliPlan>,
}

/// Check the requested federation against the live namespace list and the
/// supported target
pub fn validate_federation(
    selection: &Selection,
    namespaces: &[String],
    supported: &str,
) -> Result<String, CollectError> {
    match selection.federation.as_deref() {
        None => Err(CollectError::invalid_selection(format!(
            "No federation argument was entered. Please provide one of {:?} as argument to '-n'.",
            namespaces
        ))),
        Some(federation) if !namespaces.iter().any(|ns| ns == federation) => {
            Err(CollectError::invalid_selection(format!(
                "The fed '{}' doesn't exist in this cluster. Please provide one of {:?} as argument to '-n'.",
                federation, namespaces
            )))
        }
        Some(federation) if federation != supported => {
            Err(CollectError::invalid_selection(format!(
                "This tool doesn't provide support for {} at the moment. Supported federation: {}.",
                federation, supported
            )))
        }
        Some(federation) => Ok(federation.to_string()),
    }
}

/// Resolve deployment, container and workload-kind selectors. Worker
/// containers are not known yet; a named container is checked against them
/// during collection.
pub fn resolve(
    selection: &Selection,
    federation: &str,
    discovery: &Discovery,
    workload_kinds: &[String],
) -> Result<CollectionPlan, CollectError> {
    let deployments = &discovery.deployments;

    if selection.only_debug && selection.deployment.is_none() {
        return Err(CollectError::invalid_selection(format!(
            "Please specify a deployment from {:?} as argument to '-d' if you wish to store debug logs.",
            deployments
        )));
    }

    let debug_logs = match selection.deployment.as_deref() {
        Some(name) if deployments.iter().any(|d| d == name) => Some(DebugLogPlan {
            deployments: vec![name.to_string()],
            container: selection.container.clone(),
        }),
        Some(ALL_DEPLOYMENTS) => {
            if let Some(container) = &selection.container {
                warn!(
                    "Container '{}' ignored: '-d {}' collects every container",
                    container, ALL_DEPLOYMENTS
                );
            }
            Some(DebugLogPlan {
                deployments: deployments.clone(),
                container: None,
            })
        }
        Some(name) => {
            return Err(CollectError::invalid_selection(format!(
                "{} is not supported at the moment. Please specify a deployment from {:?} or '{}' as argument to '-d'.",
                name, deployments, ALL_DEPLOYMENTS
            )));
        }
        None if selection.container.is_some() => {
            return Err(CollectError::invalid_selection(format!(
                "A container was given without a deployment. Please specify a deployment from {:?} as argument to '-d'.",
                deployments
            )));
        }
        None => None,
    };

    let debug_cli = if selection.only_debug {
        None
    } else {
        let kinds = match selection.workload_kind.as_deref() {
            Some(kind) if workload_kinds.iter().any(|k| k == kind) => vec![kind.to_string()],
            Some(kind) => {
                return Err(CollectError::invalid_selection(format!(
                    "The pod '{}' is not supported. Please specify one of {:?} as argument to '-p'.",
                    kind, workload_kinds
                )));
            }
            None => workload_kinds.to_vec(),
        };
        Some(DebugCliPlan {
            kinds,
            verbose: selection.verbose,
        })
    };

    Ok(CollectionPlan {
        federation: federation.to_string(),
        debug_logs,
        debug_cli,
    })
}
