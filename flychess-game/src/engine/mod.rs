//! Turn state machines for the board game and the spinner wheel.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::player::PlayerColor;
use crate::tasks::{
    CurrentTask, TaskQueue, TaskType, TaskVerdict, has_time_marker, strip_time_marker,
};
use crate::timing::TimeSettings;

pub mod board_game;
pub mod movement;
pub mod timeline;
pub mod wheel;

pub use board_game::BoardGame;
pub use movement::{backward_path, forward_path, resolve_target};
pub use timeline::{Scheduled, Timeline};
pub use wheel::{SectionKind, Tally, WheelGame, default_sections};

/// Screen-level state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    #[default]
    Start,
    Playing,
    Moving,
    Task,
    Win,
    WinTask,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Playing => "playing",
            Self::Moving => "moving",
            Self::Task => "task",
            Self::Win => "win",
            Self::WinTask => "winTask",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cannot {action} while in the {phase} state")]
    InvalidPhase {
        action: &'static str,
        phase: GamePhase,
    },
    #[error("an animation is still running")]
    Busy,
    #[error("die value {0} is outside 1..=6")]
    InvalidRoll(u8),
    #[error("there is no task to resolve")]
    NoActiveTask,
    #[error("no win task with id {0}")]
    UnknownWinTask(usize),
    #[error("the win task has already been completed")]
    WinTaskDone,
    #[error("wheel has no section {0}")]
    InvalidSection(usize),
    #[error("a wheel needs at least one section")]
    EmptyWheel,
}

/// Things that happened, in order, for the host to animate or play cues for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GameEvent {
    Started,
    Rolled {
        player: PlayerColor,
        value: u8,
    },
    Spun {
        player: PlayerColor,
        section: usize,
        outcome: SectionKind,
    },
    Stepped {
        player: PlayerColor,
        position: usize,
    },
    Bounced {
        player: PlayerColor,
    },
    Collision {
        mover: PlayerColor,
        position: usize,
    },
    TaskAssigned {
        task_type: TaskType,
        executor: PlayerColor,
        target: PlayerColor,
    },
    TaskResolved {
        task_type: TaskType,
        executor: PlayerColor,
        verdict: TaskVerdict,
        steps: usize,
    },
    SentHome {
        player: PlayerColor,
    },
    TurnSwitched {
        player: PlayerColor,
    },
    ExtraTurn {
        player: PlayerColor,
    },
    TurnSkipped {
        player: PlayerColor,
    },
    Won {
        player: PlayerColor,
    },
    WinTaskSelected {
        id: usize,
    },
    WinTaskCompleted,
    Restarted,
}

/// Per-turn fields shared by both variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Turn {
    pub current: PlayerColor,
    pub dice_value: Option<u8>,
    pub is_rolling: bool,
    pub current_task: Option<CurrentTask>,
    pub task_type: Option<TaskType>,
}

impl Turn {
    /// Reset the transient fields, keeping the current player.
    pub fn clear(&mut self) {
        self.dice_value = None;
        self.is_rolling = false;
        self.current_task = None;
        self.task_type = None;
    }

    /// Reset the transient fields and hand the turn to the other player.
    pub fn switch(&mut self) -> PlayerColor {
        self.clear();
        self.current = self.current.opponent();
        self.current
    }
}

/// Take the next task from the queue and address it per the executor rule.
///
/// Texts carrying the timer marker get a suggested countdown.
pub(crate) fn draw_task<R: Rng + ?Sized>(
    queue: &mut TaskQueue,
    settings: &TimeSettings,
    rng: &mut R,
    task_type: TaskType,
    trigger: PlayerColor,
) -> CurrentTask {
    let raw = queue.next_description();
    let description = strip_time_marker(&raw);
    let duration_ms = has_time_marker(&raw)
        .then(|| u64::from(settings.suggest(&description, rng).time) * 1000);
    CurrentTask {
        description,
        executor: task_type.executor(trigger),
        target: trigger,
        duration_ms,
    }
}
