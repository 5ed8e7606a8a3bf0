//! Task content sources and the shared content cache.
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::mode::GameMode;

/// Supplies the raw task list for a built-in mode in a given language.
/// Platform-specific implementations fetch from bundled assets or the network.
pub trait TaskSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch every task description for `mode` in `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be fetched or parsed.
    fn fetch_tasks(&self, mode: GameMode, language: &str) -> Result<Vec<String>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no task content for mode {mode} in language {language}")]
    Missing { mode: GameMode, language: String },
    #[error("task content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read task content: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted shapes of a task content document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TaskDocument {
    List(Vec<String>),
    Object { tasks: Vec<String> },
}

impl TaskDocument {
    /// Parse a JSON document into its task list, dropping blank entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is neither an array of strings nor an
    /// object with a `tasks` array of strings.
    pub fn parse(json: &str) -> Result<Vec<String>, ContentError> {
        let doc: Self = serde_json::from_str(json)?;
        let tasks = match doc {
            Self::List(tasks) | Self::Object { tasks } => tasks,
        };
        Ok(tasks
            .into_iter()
            .map(|task| task.trim().to_string())
            .filter(|task| !task.is_empty())
            .collect())
    }
}

/// Task lists registered up front, keyed by mode and language.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskSource {
    lists: Rc<RefCell<HashMap<(GameMode, String), Vec<String>>>>,
}

impl MemoryTaskSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mode: GameMode, language: &str, tasks: Vec<String>) {
        self.lists
            .borrow_mut()
            .insert((mode, language.to_string()), tasks);
    }

    /// Register a JSON task document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse.
    pub fn insert_json(
        &self,
        mode: GameMode,
        language: &str,
        json: &str,
    ) -> Result<usize, ContentError> {
        let tasks = TaskDocument::parse(json)?;
        let count = tasks.len();
        self.insert(mode, language, tasks);
        Ok(count)
    }
}

impl TaskSource for MemoryTaskSource {
    type Error = ContentError;

    fn fetch_tasks(&self, mode: GameMode, language: &str) -> Result<Vec<String>, Self::Error> {
        self.lists
            .borrow()
            .get(&(mode, language.to_string()))
            .cloned()
            .ok_or_else(|| ContentError::Missing {
                mode,
                language: language.to_string(),
            })
    }
}

/// Memoizing wrapper around a [`TaskSource`].
///
/// One instance is created per engine and handed to whatever needs task
/// content; [`CachedTaskSource::clear`] drops everything on teardown or when
/// the language changes.
#[derive(Debug)]
pub struct CachedTaskSource<S> {
    inner: S,
    cache: RefCell<HashMap<(GameMode, String), Vec<String>>>,
}

impl<S: TaskSource> CachedTaskSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: TaskSource> TaskSource for CachedTaskSource<S> {
    type Error = S::Error;

    fn fetch_tasks(&self, mode: GameMode, language: &str) -> Result<Vec<String>, Self::Error> {
        let key = (mode, language.to_string());
        if let Some(hit) = self.cache.borrow().get(&key) {
            return Ok(hit.clone());
        }
        let tasks = self.inner.fetch_tasks(mode, language)?;
        self.cache.borrow_mut().insert(key, tasks.clone());
        Ok(tasks)
    }
}
