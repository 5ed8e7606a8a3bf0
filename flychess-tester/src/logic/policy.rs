use std::fmt;

use flychess_game::{CurrentTask, TaskType, TaskVerdict};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Decides how the players react to each task during automated play.
pub trait VerdictPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    fn judge(&mut self, task_type: TaskType, task: &CurrentTask) -> TaskVerdict;
}

/// Built-in verdict strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictStrategy {
    AlwaysComplete,
    AlwaysFail,
    CoinFlip,
}

impl VerdictStrategy {
    pub const ALL: [Self; 3] = [Self::AlwaysComplete, Self::AlwaysFail, Self::CoinFlip];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AlwaysComplete => "always-complete",
            Self::AlwaysFail => "always-fail",
            Self::CoinFlip => "coin-flip",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn VerdictPolicy> {
        match self {
            Self::AlwaysComplete => Box::new(Fixed {
                name: "always-complete",
                verdict: TaskVerdict::Completed,
            }),
            Self::AlwaysFail => Box::new(Fixed {
                name: "always-fail",
                verdict: TaskVerdict::Failed,
            }),
            Self::CoinFlip => Box::new(CoinFlip {
                rng: ChaCha20Rng::seed_from_u64(seed ^ 0xC01F),
            }),
        }
    }
}

impl fmt::Display for VerdictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct Fixed {
    name: &'static str,
    verdict: TaskVerdict,
}

impl VerdictPolicy for Fixed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn judge(&mut self, _task_type: TaskType, _task: &CurrentTask) -> TaskVerdict {
        self.verdict
    }
}

struct CoinFlip {
    rng: ChaCha20Rng,
}

impl VerdictPolicy for CoinFlip {
    fn name(&self) -> &'static str {
        "coin-flip"
    }

    fn judge(&mut self, _task_type: TaskType, _task: &CurrentTask) -> TaskVerdict {
        if self.rng.gen_bool(0.5) {
            TaskVerdict::Completed
        } else {
            TaskVerdict::Failed
        }
    }
}
