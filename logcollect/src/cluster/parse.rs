//! Parsers for kubectl's tabular and YAML output
//!
//! kubectl prints a header row on every `get` listing. Each function here
//! takes the raw stdout of one call and returns typed values; none of them
//! fail, an unusable output simply yields nothing.

/// Data rows of a kubectl listing: header dropped, blank lines skipped
pub fn data_rows(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// First column of every data row
pub fn first_column(output: &str) -> Vec<String> {
    data_rows(output)
        .filter_map(|row| row.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// First token on any `containerPort` line that is a valid port number
pub fn container_port(manifest: &str) -> Option<u16> {
    manifest
        .lines()
        .filter(|line| line.contains("containerPort"))
        .flat_map(str::split_whitespace)
        .find_map(|token| token.parse::<u16>().ok())
}

/// Container names of the first pod belonging to `deployment`.
///
/// Expects `POD CONTAINER` custom columns where the container column is a
/// comma-joined list. Only the first matching pod is read, so the result
/// carries each container once.
pub fn worker_containers(output: &str, deployment: &str) -> Vec<String> {
    data_rows(output)
        .filter_map(|row| {
            let mut columns = row.split_whitespace();
            Some((columns.next()?, columns.next()?))
        })
        .find(|(pod, _)| pod.starts_with(deployment))
        .map(|(_, containers)| {
            containers
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty() && *name != "<none>")
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
