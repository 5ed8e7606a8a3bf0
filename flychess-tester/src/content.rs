use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use flychess_game::{ContentError, GameMode, TaskDocument, TaskSource};

/// Default location of the bundled task lists, relative to the workspace root.
pub const DEFAULT_TASKS_DIR: &str = "flychess-web/static/assets/tasks";

/// Reads task lists from `<root>/<language>/<mode>.json`.
#[derive(Debug, Clone)]
pub struct DirTaskSource {
    root: PathBuf,
}

impl DirTaskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The bundled lists, found relative to the crate when run through cargo.
    #[must_use]
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(DEFAULT_TASKS_DIR))
    }

    /// Lists under `cwd` when it is a workspace checkout, otherwise the
    /// build-time location from [`DirTaskSource::bundled`].
    #[must_use]
    pub fn locate(cwd: &Path) -> Self {
        let local = cwd.join(DEFAULT_TASKS_DIR);
        if local.is_dir() {
            Self::new(local)
        } else {
            Self::bundled()
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, mode: GameMode, language: &str) -> PathBuf {
        self.root
            .join(language)
            .join(format!("{}.json", mode.as_str()))
    }
}

impl TaskSource for DirTaskSource {
    type Error = ContentError;

    fn fetch_tasks(&self, mode: GameMode, language: &str) -> Result<Vec<String>, Self::Error> {
        let path = self.path_for(mode, language);
        let json = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ContentError::Missing {
                    mode,
                    language: language.to_string(),
                }
            } else {
                ContentError::Io(err)
            }
        })?;
        log::debug!("loaded tasks from {}", path.display());
        TaskDocument::parse(&json)
    }
}
