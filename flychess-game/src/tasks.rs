//! Task queue rotation, task records and executor assignment.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::{EMPTY_QUEUE_TASK, FALLBACK_TASKS, FALLBACK_WIN_TASKS, TIME_MARKER};
use crate::content::TaskSource;
use crate::mode::GameMode;
use crate::player::PlayerColor;

/// What triggered a task. `Normal` only occurs on the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Star,
    Trap,
    Collision,
    Normal,
}

impl TaskType {
    /// Who performs the task triggered by `trigger`.
    ///
    /// Traps punish whoever landed on them; stars and collisions dare the
    /// opponent instead.
    #[must_use]
    pub const fn executor(self, trigger: PlayerColor) -> PlayerColor {
        match self {
            Self::Trap | Self::Normal => trigger,
            Self::Star | Self::Collision => trigger.opponent(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Star => "star",
            Self::Trap => "trap",
            Self::Collision => "collision",
            Self::Normal => "normal",
        }
    }
}

/// Externally supplied judgement on the active task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskVerdict {
    Completed,
    Failed,
}

/// The task currently shown to the players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTask {
    pub description: String,
    pub executor: PlayerColor,
    pub target: PlayerColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// One of the bonus tasks offered to the winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinTaskOption {
    pub id: usize,
    pub description: String,
}

/// Remove every timer marker and surrounding whitespace from a task text.
#[must_use]
pub fn strip_time_marker(text: &str) -> String {
    text.replace(TIME_MARKER, "").trim().to_string()
}

#[must_use]
pub fn has_time_marker(text: &str) -> bool {
    text.contains(TIME_MARKER)
}

/// Circular queue of task descriptions.
///
/// Taking the head moves it to the tail, so tasks repeat round-robin
/// instead of running out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskQueue {
    tasks: VecDeque<String>,
}

impl TaskQueue {
    /// Queue the tasks in the given order.
    #[must_use]
    pub fn from_ordered(tasks: Vec<String>) -> Self {
        Self {
            tasks: tasks.into(),
        }
    }

    /// Queue the tasks in a uniformly random order.
    pub fn shuffled<R: Rng + ?Sized>(mut tasks: Vec<String>, rng: &mut R) -> Self {
        tasks.shuffle(rng);
        Self::from_ordered(tasks)
    }

    /// Short built-in list used when content cannot be loaded.
    pub fn fallback<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::shuffled(FALLBACK_TASKS.iter().map(ToString::to_string).collect(), rng)
    }

    /// Load and shuffle the task list for `mode`.
    ///
    /// Tries `language`, then `default_language`, then the built-in
    /// fallback list. Failures are logged and never reach the caller.
    pub fn load<S, R>(
        source: &S,
        mode: GameMode,
        language: &str,
        default_language: &str,
        rng: &mut R,
    ) -> Self
    where
        S: TaskSource + ?Sized,
        R: Rng + ?Sized,
    {
        let mut languages = vec![language];
        if default_language != language {
            languages.push(default_language);
        }
        for lang in languages {
            match source.fetch_tasks(mode, lang) {
                Ok(tasks) if !tasks.is_empty() => return Self::shuffled(tasks, rng),
                Ok(_) => log::warn!("task list for {mode}/{lang} is empty"),
                Err(err) => log::warn!("failed to load tasks for {mode}/{lang}: {err}"),
            }
        }
        log::warn!("using built-in fallback tasks for {mode}");
        Self::fallback(rng)
    }

    /// Replace the contents with a freshly shuffled list.
    pub fn reload<R: Rng + ?Sized>(&mut self, tasks: Vec<String>, rng: &mut R) {
        *self = Self::shuffled(tasks, rng);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&str> {
        self.tasks.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(String::as_str)
    }

    /// Take the head and rotate it to the tail. `None` when empty.
    pub fn consume_head(&mut self) -> Option<String> {
        let head = self.tasks.pop_front()?;
        self.tasks.push_back(head.clone());
        Some(head)
    }

    /// The next task text, or the empty-queue notice without touching the
    /// queue when there is nothing to rotate.
    pub fn next_description(&mut self) -> String {
        self.consume_head()
            .unwrap_or_else(|| EMPTY_QUEUE_TASK.to_string())
    }

    /// Sample `count` distinct win-task options in random order.
    ///
    /// Draws from a shuffled copy of the queue, or from the fixed fallback
    /// trio when the queue is empty. Ids are 1-based.
    pub fn generate_win_options<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Vec<WinTaskOption> {
        let mut pool: Vec<String> = if self.tasks.is_empty() {
            FALLBACK_WIN_TASKS.iter().map(ToString::to_string).collect()
        } else {
            self.tasks.iter().cloned().collect()
        };
        pool.shuffle(rng);
        pool.into_iter()
            .take(count)
            .enumerate()
            .map(|(idx, description)| WinTaskOption {
                id: idx + 1,
                description: strip_time_marker(&description),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryTaskSource;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn tasks(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn executor_law_holds_for_both_colors() {
        for trigger in PlayerColor::ALL {
            assert_eq!(TaskType::Trap.executor(trigger), trigger);
            assert_eq!(TaskType::Star.executor(trigger), trigger.opponent());
            assert_eq!(TaskType::Collision.executor(trigger), trigger.opponent());
            assert_eq!(TaskType::Normal.executor(trigger), trigger);
        }
    }

    #[test]
    fn consuming_len_times_visits_each_task_once() {
        let mut queue = TaskQueue::from_ordered(tasks(&["a", "b", "c", "d"]));
        let seen: Vec<String> = (0..queue.len())
            .filter_map(|_| queue.consume_head())
            .collect();
        assert_eq!(seen, tasks(&["a", "b", "c", "d"]));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
        assert_eq!(queue.consume_head().as_deref(), Some("a"));
        assert_eq!(queue.peek(), Some("b"));
    }

    #[test]
    fn empty_queue_yields_notice_without_mutation() {
        let mut queue = TaskQueue::default();
        assert_eq!(queue.consume_head(), None);
        assert_eq!(queue.next_description(), EMPTY_QUEUE_TASK);
        assert!(queue.is_empty());
    }

    #[test]
    fn shuffle_preserves_contents() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let original = tasks(&["1", "2", "3", "4", "5", "6", "7", "8"]);
        let queue = TaskQueue::shuffled(original.clone(), &mut rng);
        let mut sorted: Vec<String> = queue.iter().map(ToString::to_string).collect();
        sorted.sort();
        assert_eq!(sorted, original);
    }

    #[test]
    fn load_falls_back_through_languages() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let source = MemoryTaskSource::new();
        source.insert(GameMode::Love, "zh", tasks(&["拥抱"]));

        let queue = TaskQueue::load(&source, GameMode::Love, "en", "zh", &mut rng);
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec!["拥抱"]);

        let queue = TaskQueue::load(&source, GameMode::Food, "en", "zh", &mut rng);
        assert_eq!(queue.len(), FALLBACK_TASKS.len());
    }

    #[test]
    fn load_treats_empty_lists_as_missing() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let source = MemoryTaskSource::new();
        source.insert(GameMode::Daily, "en", Vec::new());
        let queue = TaskQueue::load(&source, GameMode::Daily, "en", "en", &mut rng);
        assert_eq!(queue.len(), FALLBACK_TASKS.len());
    }

    #[test]
    fn win_options_are_distinct_and_numbered() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let queue = TaskQueue::from_ordered(tasks(&["a", "b", "c", "d", "e $time"]));
        let options = queue.generate_win_options(3, &mut rng);
        assert_eq!(options.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        let mut descriptions: Vec<&str> = options.iter().map(|o| o.description.as_str()).collect();
        descriptions.sort_unstable();
        descriptions.dedup();
        assert_eq!(descriptions.len(), 3);
        assert!(descriptions.iter().all(|d| !d.contains(TIME_MARKER)));
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn win_options_use_fallback_when_queue_empty() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let options = TaskQueue::default().generate_win_options(3, &mut rng);
        assert_eq!(options.len(), 3);
        for option in &options {
            assert!(FALLBACK_WIN_TASKS.contains(&option.description.as_str()));
        }
    }

    #[test]
    fn win_options_cap_at_pool_size() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let queue = TaskQueue::from_ordered(tasks(&["only"]));
        assert_eq!(queue.generate_win_options(3, &mut rng).len(), 1);
    }

    #[test]
    fn strips_time_marker() {
        assert_eq!(strip_time_marker("按摩 $time"), "按摩");
        assert_eq!(strip_time_marker("$time hug $time"), "hug");
        assert!(has_time_marker("x $time"));
        assert!(!has_time_marker("x"));
    }
}
