//! Centralized balance and tuning constants for Flying Chess game logic.
//!
//! Durations that hosts may want to tune at runtime live in
//! [`GameConfig`](crate::config::GameConfig); the values here are the rules
//! of the game itself.

// Storage -------------------------------------------------------------------
pub const DEFAULT_NAMESPACE: &str = "flying-chess";
pub(crate) const SAVE_KEY_FRAGMENT: &str = "save";
pub(crate) const CUSTOM_KEY_FRAGMENT: &str = "custom";
pub(crate) const CUSTOM_MODES_KEY_FRAGMENT: &str = "custom-modes";
pub(crate) const TIME_SETTINGS_KEY_FRAGMENT: &str = "time-settings";
pub const SAVE_EXPIRY_MS: u64 = 24 * 60 * 60 * 1000;

// Content -------------------------------------------------------------------
pub const DEFAULT_LANGUAGE: &str = "zh";
pub const TIME_MARKER: &str = "$time";
pub const EMPTY_QUEUE_TASK: &str = "The task list is empty. Add some tasks and play again!";
pub const FALLBACK_TASKS: [&str; 5] = [
    "Give your partner a warm hug $time",
    "Say three things you love about your partner",
    "Hold hands and look into each other's eyes $time",
    "Share your favourite memory together",
    "Give your partner a gentle shoulder massage $time",
];
pub const FALLBACK_WIN_TASKS: [&str; 3] = [
    "The loser makes the winner a drink of their choice",
    "The loser gives the winner a five minute massage",
    "The winner picks tonight's movie",
];

// Board ---------------------------------------------------------------------
pub const BOARD_GRID_SIZE: i32 = 7;
pub const STAR_CELLS: [usize; 7] = [4, 10, 17, 23, 30, 36, 43];
pub const TRAP_CELLS: [usize; 7] = [7, 14, 20, 27, 33, 40, 46];

// Dice and task outcomes ------------------------------------------------------
pub const DIE_FACES: u8 = 6;
pub const REWARD_STEPS_MIN: usize = 0;
pub const REWARD_STEPS_MAX: usize = 3;
pub const PENALTY_STEPS_MIN: usize = 3;
pub const PENALTY_STEPS_MAX: usize = 6;

// Timing ----------------------------------------------------------------------
pub const MIN_TASK_SECONDS: u32 = 5;
pub const DEFAULT_TASK_SECONDS: u32 = 60;
pub const DEFAULT_KEYWORD_TIMES: [(&str, u32); 12] = [
    ("亲吻", 10),
    ("拥抱", 15),
    ("对视", 30),
    ("挠痒", 30),
    ("耳语", 20),
    ("唱歌", 60),
    ("深蹲", 60),
    ("俯卧撑", 60),
    ("平板支撑", 60),
    ("跳舞", 90),
    ("按摩", 120),
    ("冥想", 180),
];

// Animation defaults (milliseconds) -------------------------------------------
pub const MOVE_STEP_MS: u32 = 300;
pub const DICE_ROLL_MS: u32 = 800;
pub const COLLISION_REVEAL_MS: u32 = 600;
pub const WHEEL_SPIN_MS: u32 = 3000;
pub const WIN_TASK_OPTIONS: usize = 3;

// Guard against a runaway timeline when draining it synchronously.
pub(crate) const MAX_IDLE_TICKS: usize = 512;
