// src/models/server.rs
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::{eq_ignore_case, locale_cmp};

/// A mod as declared in a server's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mod {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(rename = "serverIP")]
    pub ip: String,
    #[serde(rename = "serverName", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "gameDescription", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_players: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_password: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub whitelisted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mods: Vec<Mod>,
}

impl Server {
    pub fn mod_count(&self) -> usize {
        self.mods.len()
    }

    /// Manifest ordered by mod id, the way it is listed to players.
    pub fn sorted_mods(&self) -> Vec<&Mod> {
        let mut mods: Vec<&Mod> = self.mods.iter().collect();
        mods.sort_by(|a, b| locale_cmp(&a.id, &b.id));
        mods
    }

    pub fn carries_mod(&self, id: &str) -> bool {
        self.mods.iter().any(|m| eq_ignore_case(&m.id, id))
    }
}

// Feeds send `null` for fields a server never reported.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope returned by `/s/servers/list`.
#[derive(Debug, Deserialize)]
pub struct ServerListResponse {
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Server>,
}
