//! Picks the source a session runs against.
//!
//! The API lists sources in its own priority order; the first one is the
//! default. A user's preferred-repository hint can override that default when
//! it names one of the listed sources.

use crate::Source;

/// Namespace prefix the API puts in front of GitHub source ids.
const GITHUB_ID_PREFIX: &str = "github.com/";

/// Selects a source from `sources`, honouring the optional `preferred` hint.
///
/// Candidates are examined in list order and the first that matches wins. A
/// candidate matches when any of these holds, checked in this order:
///
/// 1. its id equals `preferred`;
/// 2. its id equals `"github.com/" + preferred`;
/// 3. its name equals `preferred`;
/// 4. its name ends with `"/" + preferred`.
///
/// Without a hint, or when nothing matches, the first source is returned.
/// Returns `None` only when `sources` is empty; callers report that as
/// [`crate::OrchestratorError::NoSourcesAvailable`] before getting here.
pub fn select_source<'a>(sources: &'a [Source], preferred: Option<&str>) -> Option<&'a Source> {
    let preferred = preferred.map(str::trim).filter(|p| !p.is_empty());
    if let Some(preferred) = preferred {
        if let Some(found) = sources.iter().find(|s| matches_preference(s, preferred)) {
            return Some(found);
        }
    }
    sources.first()
}

fn matches_preference(source: &Source, preferred: &str) -> bool {
    let id = source.id.as_str();
    let name = source.name.as_str();
    id == preferred
        || id
            .strip_prefix(GITHUB_ID_PREFIX)
            .is_some_and(|rest| rest == preferred)
        || name == preferred
        || name
            .strip_suffix(preferred)
            .is_some_and(|head| head.ends_with('/'))
}
