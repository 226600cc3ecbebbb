// src/view/selection.rs
use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::models::mod_info::ModMetadata;
use crate::models::server::Mod;
use crate::utils::mod_detail_url;

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Idle,
    Loading,
    Ready(Arc<ModMetadata>),
    Failed(String),
}

/// Identifies one lookup started by [`ModSelection::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    id: String,
}

impl Ticket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// The mod currently open in the detail pane.
///
/// Lookups are never cancelled; a result that arrives for a mod that is no
/// longer selected is simply dropped.
#[derive(Debug)]
pub struct ModSelection {
    detail_base: String,
    selected: Option<Mod>,
    generation: u64,
    state: LookupState,
}

impl ModSelection {
    pub fn new(detail_base: impl Into<String>) -> Self {
        Self {
            detail_base: detail_base.into(),
            selected: None,
            generation: 0,
            state: LookupState::Idle,
        }
    }

    /// Opens `m`. Returns the ticket for the lookup the caller should run,
    /// or `None` when there is nothing to fetch (blank id, or the same mod
    /// is already loaded).
    pub fn select(&mut self, m: Mod) -> Option<Ticket> {
        let id = m.id.trim().to_string();
        if id.is_empty() {
            return None;
        }

        let same = self
            .selected
            .as_ref()
            .is_some_and(|current| current.id.trim() == id);
        self.selected = Some(m);
        if same && matches!(self.state, LookupState::Ready(_)) {
            return None;
        }

        self.generation += 1;
        self.state = LookupState::Loading;
        Some(Ticket {
            generation: self.generation,
            id,
        })
    }

    /// Applies a finished lookup. Returns false if the ticket is stale.
    pub fn resolve(&mut self, ticket: &Ticket, result: Result<Arc<ModMetadata>>) -> bool {
        if ticket.generation != self.generation || self.selected.is_none() {
            debug!("Ignoring stale lookup for {}", ticket.id);
            return false;
        }
        self.state = match result {
            Ok(info) => LookupState::Ready(info),
            Err(e) => LookupState::Failed(e.to_string()),
        };
        true
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.generation += 1;
        self.state = LookupState::Idle;
    }

    pub fn selected(&self) -> Option<&Mod> {
        self.selected.as_ref()
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn info(&self) -> Option<&Arc<ModMetadata>> {
        match &self.state {
            LookupState::Ready(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == LookupState::Loading
    }

    /// Link to the mod's page, once its asset id is known.
    pub fn detail_url(&self) -> Option<String> {
        let info = self.info()?;
        mod_detail_url(&self.detail_base, info.assetid.as_deref())
    }
}
