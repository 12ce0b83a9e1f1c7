//! Local JSON event store.
//!
//! Stand-in for the external document store: one pretty-printed JSON file
//! of event templates. The engine only produces `Mutation` payloads; this
//! is where they get applied.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempo_core::{EventTemplate, Mutation};
use tracing::warn;

pub struct Store {
    path: PathBuf,
    pub events: Vec<EventTemplate>,
}

impl Store {
    /// Open the store, starting empty if the file doesn't exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Store {
                path: path.to_path_buf(),
                events: Vec::new(),
            });
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event store at {}", path.display()))?;
        let events: Vec<EventTemplate> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse event store at {}", path.display()))?;

        Ok(Store {
            path: path.to_path_buf(),
            events,
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory at {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(&self.events).context("Failed to serialize event store")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write event store at {}", self.path.display()))?;

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&EventTemplate> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Apply one engine mutation. Orphaned exceptions and updates for
    /// unknown events are logged and ignored.
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Create { event } => self.events.push(event),
            Mutation::Update {
                id,
                starts_at,
                ends_at,
            } => match self.events.iter_mut().find(|event| event.id == id) {
                Some(event) => {
                    event.starts_at = starts_at;
                    event.ends_at = ends_at;
                }
                None => warn!(%id, "update for unknown event ignored"),
            },
            Mutation::AddException { parent_id, date } => {
                match self.events.iter_mut().find(|event| event.id == parent_id) {
                    Some(parent) => {
                        parent.recurrence_exceptions.insert(date);
                    }
                    None => warn!(parent = %parent_id, "exception for missing parent ignored"),
                }
            }
        }
    }

    /// Remove a stored template outright. Returns false if absent.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        self.events.len() < before
    }
}
