// src/view/suggest.rs
use std::collections::HashSet;

use crate::models::mod_info::ModShortMetadata;
use crate::utils::locale_cmp;

pub const MAX_SUGGESTIONS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModSuggestion {
    /// Id to put in the mod filter.
    pub value: String,
    /// Display name of the mod it belongs to.
    pub description: Option<String>,
}

/// Autocomplete candidates for the mod filter.
///
/// Candidates are each catalog entry's url alias and secondary ids. Ids
/// already in `selected` are skipped, the rest must contain `query`
/// (ignoring case). Results are unique ignoring case, sorted and capped at
/// `limit`.
pub fn suggest_mods(
    catalog: &[ModShortMetadata],
    query: &str,
    selected: &[String],
    limit: usize,
) -> Vec<ModSuggestion> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let selected: HashSet<String> = selected
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<ModSuggestion> = Vec::new();
    for entry in catalog {
        let description = entry
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        for candidate in entry.aliases() {
            let normalized = candidate.to_lowercase();
            if selected.contains(&normalized) || !normalized.contains(&query) {
                continue;
            }
            if seen.insert(normalized) {
                out.push(ModSuggestion {
                    value: candidate.to_string(),
                    description: description.clone(),
                });
            }
        }
    }

    out.sort_by(|a, b| locale_cmp(&a.value, &b.value));
    out.truncate(limit);
    out
}
