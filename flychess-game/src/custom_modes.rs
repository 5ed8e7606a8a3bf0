//! User-authored task lists, stored together as one JSON array.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::clock::Clock;
use crate::constants::CUSTOM_MODES_KEY_FRAGMENT;
use crate::kv::KvStore;

/// Where a custom mode's tasks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomModeKind {
    Ai,
    #[default]
    Custom,
}

impl CustomModeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for CustomModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomModeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" => Ok(Self::Ai),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CustomModeKind,
    #[serde(default)]
    pub description: String,
    pub tasks: Vec<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// User input for creating or replacing a custom mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomModeDraft {
    pub name: String,
    pub kind: CustomModeKind,
    pub description: String,
    pub tasks: Vec<String>,
}

impl CustomModeDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, tasks: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tasks,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: CustomModeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Trimmed copy with blank tasks removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or the task list ends up empty.
    fn normalized(&self) -> Result<Self, RegistryError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let tasks: Vec<String> = self
            .tasks
            .iter()
            .map(|task| task.trim().to_string())
            .filter(|task| !task.is_empty())
            .collect();
        if tasks.is_empty() {
            return Err(RegistryError::EmptyTasks);
        }
        Ok(Self {
            name,
            kind: self.kind,
            description: self.description.trim().to_string(),
            tasks,
        })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("custom mode name must not be empty")]
    EmptyName,
    #[error("custom mode needs at least one task")]
    EmptyTasks,
    #[error("no custom mode with id {0}")]
    NotFound(String),
    #[error("custom mode storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
    #[error("stored custom modes are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("import document has no usable name")]
    MissingName,
    #[error("import document has no task array")]
    MissingTasks,
    #[error("task entries must be strings")]
    InvalidTask,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// What to do when an imported mode's name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    #[default]
    Skip,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Created(CustomMode),
    Overwritten(CustomMode),
    Skipped(CustomMode),
}

impl ImportOutcome {
    #[must_use]
    pub const fn mode(&self) -> &CustomMode {
        match self {
            Self::Created(mode) | Self::Overwritten(mode) | Self::Skipped(mode) => mode,
        }
    }
}

/// Exported shape: everything but the id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedMode<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: CustomModeKind,
    description: &'a str,
    tasks: &'a [String],
    created_at: u64,
}

/// Create, update, delete and list custom modes.
///
/// Every mutation reads the stored list, changes it, and writes the whole
/// list back.
#[derive(Debug, Clone)]
pub struct CustomModeRegistry<K, C> {
    store: K,
    clock: C,
    key: String,
}

impl<K: KvStore, C: Clock> CustomModeRegistry<K, C> {
    pub fn new(store: K, clock: C, namespace: &str) -> Self {
        Self {
            store,
            clock,
            key: format!("{namespace}-{CUSTOM_MODES_KEY_FRAGMENT}"),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn read_all(&self) -> Result<Vec<CustomMode>, RegistryError> {
        let stored = self
            .store
            .get(&self.key)
            .map_err(|err| RegistryError::Storage(Box::new(err)))?;
        match stored {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_all(&self, modes: &[CustomMode]) -> Result<(), RegistryError> {
        let json = serde_json::to_string(modes)?;
        self.store
            .set(&self.key, &json)
            .map_err(|err| RegistryError::Storage(Box::new(err)))
    }

    /// Every stored mode in creation order. Unreadable storage reads as empty.
    #[must_use]
    pub fn list(&self) -> Vec<CustomMode> {
        self.read_all().unwrap_or_else(|err| {
            log::warn!("failed to read custom modes: {err}");
            Vec::new()
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<CustomMode> {
        self.list().into_iter().find(|mode| mode.id == id)
    }

    /// Case-sensitive lookup on the trimmed name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<CustomMode> {
        let name = name.trim();
        self.list().into_iter().find(|mode| mode.name == name)
    }

    fn fresh_id(&self, modes: &[CustomMode]) -> String {
        let base = format!("custom-{}", self.clock.now_millis());
        let taken = |candidate: &str| modes.iter().any(|mode| mode.id == candidate);
        if !taken(&base) {
            return base;
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Validate `draft`, give it an id and creation time, and append it.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty name or task list (nothing is stored),
    /// or when storage cannot be read or written.
    pub fn create(&self, draft: &CustomModeDraft) -> Result<CustomMode, RegistryError> {
        self.insert(draft, None)
    }

    fn insert(
        &self,
        draft: &CustomModeDraft,
        created_at: Option<u64>,
    ) -> Result<CustomMode, RegistryError> {
        let draft = draft.normalized()?;
        let mut modes = self.read_all()?;
        let mode = CustomMode {
            id: self.fresh_id(&modes),
            name: draft.name,
            kind: draft.kind,
            description: draft.description,
            tasks: draft.tasks,
            created_at: created_at.unwrap_or_else(|| self.clock.now_millis()),
        };
        modes.push(mode.clone());
        self.write_all(&modes)?;
        log::debug!("created custom mode {} ({})", mode.id, mode.name);
        Ok(mode)
    }

    /// Replace name, type, description and tasks of mode `id`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid draft, an unknown id, or a storage
    /// failure.
    pub fn update(&self, id: &str, draft: &CustomModeDraft) -> Result<CustomMode, RegistryError> {
        let draft = draft.normalized()?;
        let mut modes = self.read_all()?;
        let mode = modes
            .iter_mut()
            .find(|mode| mode.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        mode.name = draft.name;
        mode.kind = draft.kind;
        mode.description = draft.description;
        mode.tasks = draft.tasks;
        let updated = mode.clone();
        self.write_all(&modes)?;
        Ok(updated)
    }

    /// Remove mode `id`, returning it.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a storage failure.
    pub fn delete(&self, id: &str) -> Result<CustomMode, RegistryError> {
        let mut modes = self.read_all()?;
        let index = modes
            .iter()
            .position(|mode| mode.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let removed = modes.remove(index);
        self.write_all(&modes)?;
        Ok(removed)
    }

    /// Pretty JSON for sharing mode `id`, without its id.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id.
    pub fn export(&self, id: &str) -> Result<String, RegistryError> {
        let mode = self
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let exported = ExportedMode {
            name: &mode.name,
            kind: mode.kind,
            description: &mode.description,
            tasks: &mode.tasks,
            created_at: mode.created_at,
        };
        Ok(serde_json::to_string_pretty(&exported)?)
    }

    /// Add a mode from an exported document.
    ///
    /// When a mode with the same name exists, `policy` decides between
    /// leaving it alone and replacing its contents in place.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is malformed or storage fails.
    pub fn import(&self, json: &str, policy: ConflictPolicy) -> Result<ImportOutcome, ImportError> {
        let (draft, created_at) = parse_import(json)?;
        match (self.find_by_name(&draft.name), policy) {
            (Some(existing), ConflictPolicy::Skip) => Ok(ImportOutcome::Skipped(existing)),
            (Some(existing), ConflictPolicy::Overwrite) => {
                let updated = self.update(&existing.id, &draft)?;
                Ok(ImportOutcome::Overwritten(updated))
            }
            (None, _) => Ok(ImportOutcome::Created(self.insert(&draft, created_at)?)),
        }
    }
}

fn parse_import(json: &str) -> Result<(CustomModeDraft, Option<u64>), ImportError> {
    let doc: Value = serde_json::from_str(json)?;
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ImportError::MissingName)?;
    let tasks = doc
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or(ImportError::MissingTasks)?
        .iter()
        .map(|task| task.as_str().map(ToString::to_string).ok_or(ImportError::InvalidTask))
        .collect::<Result<Vec<_>, _>>()?;
    let kind = doc
        .get("type")
        .and_then(Value::as_str)
        .and_then(|kind| kind.parse::<CustomModeKind>().ok())
        .unwrap_or_default();
    let description = doc
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let created_at = doc.get("createdAt").and_then(Value::as_u64);
    let draft = CustomModeDraft::new(name, tasks)
        .with_kind(kind)
        .with_description(description);
    Ok((draft, created_at))
}
