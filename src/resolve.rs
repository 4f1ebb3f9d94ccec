use std::collections::HashSet;

use crate::model::Repository;

/// Parse a comma-separated name list, trimming whitespace and dropping
/// empty items.
pub fn parse_name_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep repositories whose traffic the authenticated identity can see
/// (push or admin permission), minus `ignore`; when `include` is
/// non-empty, restrict to it. Upstream order is preserved.
pub fn filter_repos(
    repos: Vec<Repository>,
    ignore: &HashSet<String>,
    include: &HashSet<String>,
) -> Vec<Repository> {
    repos
        .into_iter()
        .filter(|r| r.can_see_traffic())
        .filter(|r| !ignore.contains(&r.name))
        .filter(|r| include.is_empty() || include.contains(&r.name))
        .collect()
}
