// src/models/mod_info.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Full metadata for one mod, as served by `/m/mod/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModMetadata {
    #[serde(default, deserialize_with = "loose_string")]
    pub modid: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub assetid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub logofile: Option<String>,
    #[serde(default)]
    pub urlalias: Option<String>,
    #[serde(default)]
    pub modidstrs: Vec<String>,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub follows: Option<u64>,
    #[serde(default)]
    pub lastreleased: Option<String>,
}

/// One row of the `/m/mods` catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModShortMetadata {
    #[serde(default, deserialize_with = "loose_string")]
    pub modid: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub assetid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub urlalias: Option<String>,
    #[serde(default)]
    pub modidstrs: Vec<String>,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub follows: Option<u64>,
    #[serde(default)]
    pub lastreleased: Option<String>,
}

impl ModShortMetadata {
    /// Url alias followed by the secondary id strings, trimmed, non-empty and
    /// without repeats.
    pub fn aliases(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let candidates = self
            .urlalias
            .iter()
            .map(String::as_str)
            .chain(self.modidstrs.iter().map(String::as_str));
        for candidate in candidates.map(str::trim).filter(|c| !c.is_empty()) {
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }

    /// True if `id` names this mod by canonical id or any alias, ignoring case.
    pub fn answers_to(&self, id: &str) -> bool {
        let target = id.trim().to_lowercase();
        if target.is_empty() {
            return false;
        }
        self.modid
            .iter()
            .map(|m| m.trim())
            .chain(self.aliases())
            .any(|candidate| candidate.to_lowercase() == target)
    }
}

/// Envelope returned by `/m/mod/{id}`.
#[derive(Debug, Deserialize)]
pub struct ModResponse {
    #[serde(deserialize_with = "loose_status")]
    pub statuscode: String,
    #[serde(rename = "mod")]
    pub info: Option<ModMetadata>,
}

/// Envelope returned by `/m/mods`.
#[derive(Debug, Deserialize)]
pub struct ModListResponse {
    #[serde(deserialize_with = "loose_status")]
    pub statuscode: String,
    #[serde(default)]
    pub mods: Vec<ModShortMetadata>,
}

// The mod database sends ids and status codes as either numbers or strings.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn loose_status<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_string(deserializer)?.unwrap_or_default())
}
