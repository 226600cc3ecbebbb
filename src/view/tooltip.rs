// src/view/tooltip.rs
use crate::models::mod_info::ModShortMetadata;
use crate::models::server::Mod;
use crate::utils::logo_url;

/// Text shown when hovering a mod chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModTooltip {
    pub title: String,
    pub meta: Option<String>,
    pub summary: Option<String>,
    pub stats: Vec<String>,
    pub logo_url: Option<String>,
}

impl ModTooltip {
    /// Builds the tooltip for a manifest entry. Without catalog info the
    /// chip still shows its id and declared version.
    pub fn build(m: &Mod, info: Option<&ModShortMetadata>, api_base: &str) -> Self {
        let title = info
            .and_then(|i| non_empty(i.name.as_deref()))
            .unwrap_or_else(|| m.id.trim().to_string());

        let meta_parts: Vec<String> = [
            info.and_then(|i| non_empty(i.author.as_deref()))
                .map(|a| format!("by {}", a)),
            non_empty(Some(m.version.as_str())).map(|v| format!("v{}", v)),
        ]
        .into_iter()
        .flatten()
        .collect();
        let meta = (!meta_parts.is_empty()).then(|| meta_parts.join(" • "));

        Self {
            title,
            meta,
            summary: info.and_then(|i| non_empty(i.summary.as_deref())),
            stats: info.map(stats_lines).unwrap_or_default(),
            logo_url: info.and_then(|i| logo_url(api_base, i.logo.as_deref())),
        }
    }

    /// Single accessible label: heading line, summary, stats.
    pub fn label(&self) -> String {
        let heading = match &self.meta {
            Some(meta) => format!("{} • {}", self.title, meta),
            None => self.title.clone(),
        };
        let stats = (!self.stats.is_empty()).then(|| self.stats.join(" • "));
        [Some(heading), self.summary.clone(), stats]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn stats_lines(info: &ModShortMetadata) -> Vec<String> {
    [
        info.downloads.map(|d| format!("Downloads: {}", d)),
        info.follows.map(|f| format!("Follows: {}", f)),
        non_empty(info.lastreleased.as_deref()).map(|t| format!("Last release: {}", t)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
