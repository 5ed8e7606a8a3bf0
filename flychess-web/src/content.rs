//! Task content bundled into the wasm binary, with page-supplied overrides.
use flychess_game::{ContentError, GameMode, MemoryTaskSource, TaskDocument, TaskSource};

/// Bundled lists first consult anything the page registered at runtime.
#[derive(Debug, Clone, Default)]
pub struct WebTaskSource {
    registered: MemoryTaskSource,
}

impl WebTaskSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the list for `mode` in `language` from a JSON
    /// document, returning how many tasks it holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse.
    pub fn register_json(
        &self,
        mode: GameMode,
        language: &str,
        json: &str,
    ) -> Result<usize, ContentError> {
        self.registered.insert_json(mode, language, json)
    }

    fn bundled(mode: GameMode, language: &str) -> Option<&'static str> {
        match (mode, language) {
            (GameMode::Love, "zh") => Some(include_str!("../static/assets/tasks/zh/love.json")),
            (GameMode::Daily, "zh") => Some(include_str!("../static/assets/tasks/zh/daily.json")),
            (GameMode::Love, "en") => Some(include_str!("../static/assets/tasks/en/love.json")),
            (GameMode::Daily, "en") => Some(include_str!("../static/assets/tasks/en/daily.json")),
            _ => None,
        }
    }
}

impl TaskSource for WebTaskSource {
    type Error = ContentError;

    fn fetch_tasks(&self, mode: GameMode, language: &str) -> Result<Vec<String>, Self::Error> {
        match self.registered.fetch_tasks(mode, language) {
            Ok(tasks) => Ok(tasks),
            Err(ContentError::Missing { .. }) => {
                let json = Self::bundled(mode, language).ok_or_else(|| ContentError::Missing {
                    mode,
                    language: language.to_string(),
                })?;
                TaskDocument::parse(json)
            }
            Err(err) => Err(err),
        }
    }
}
