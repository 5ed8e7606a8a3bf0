use anyhow::{Result, ensure};
use flychess_game::{GameMode, PlayerColor};
use serde::Serialize;

use crate::logic::policy::VerdictStrategy;
use crate::logic::simulation::{GameMetrics, GameTester, SimulationConfig};

/// Highest share of games allowed to hit the roll cap under any policy.
pub const MAX_STALL_RATE: f64 = 0.05;

#[derive(Debug, Clone, Serialize)]
pub struct PlayabilityRecord {
    pub mode: GameMode,
    pub strategy: VerdictStrategy,
    pub seed: u64,
    pub metrics: GameMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayabilityAggregate {
    pub mode: GameMode,
    pub strategy: VerdictStrategy,
    pub iterations: usize,
    pub mean_rolls: f64,
    pub std_rolls: f64,
    pub red_win_pct: f64,
    pub blue_win_pct: f64,
    pub mean_collisions: f64,
    pub mean_stars: f64,
    pub mean_traps: f64,
    pub mean_bounces: f64,
    pub stall_rate: f64,
}

/// Play `iterations` games per seed under every verdict strategy.
///
/// # Errors
///
/// Returns an error if any simulated game fails outright.
pub fn run_playability_analysis(
    tester: &GameTester,
    mode: GameMode,
    seeds: &[u64],
    iterations: usize,
) -> Result<Vec<PlayabilityRecord>> {
    let mut records = Vec::with_capacity(seeds.len() * iterations * VerdictStrategy::ALL.len());
    for strategy in VerdictStrategy::ALL {
        for &base in seeds {
            for i in 0..iterations {
                let seed = base.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                let summary = tester.simulate(&SimulationConfig::new(mode, strategy, seed))?;
                records.push(PlayabilityRecord {
                    mode,
                    strategy,
                    seed,
                    metrics: summary.metrics,
                });
            }
        }
    }
    Ok(records)
}

#[must_use]
pub fn aggregate_playability(records: &[PlayabilityRecord]) -> Vec<PlayabilityAggregate> {
    VerdictStrategy::ALL
        .iter()
        .filter_map(|&strategy| {
            let group: Vec<&GameMetrics> = records
                .iter()
                .filter(|record| record.strategy == strategy)
                .map(|record| &record.metrics)
                .collect();
            let mode = records
                .iter()
                .find(|record| record.strategy == strategy)?
                .mode;
            Some(aggregate_group(mode, strategy, &group))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn aggregate_group(
    mode: GameMode,
    strategy: VerdictStrategy,
    group: &[&GameMetrics],
) -> PlayabilityAggregate {
    let n = group.len().max(1) as f64;
    let mean = |f: fn(&GameMetrics) -> u32| group.iter().map(|m| f64::from(f(*m))).sum::<f64>() / n;
    let share = |pred: &dyn Fn(&GameMetrics) -> bool| {
        group.iter().filter(|m| pred(**m)).count() as f64 / n
    };

    let mean_rolls = mean(|m| m.rolls);
    let variance = group
        .iter()
        .map(|m| (f64::from(m.rolls) - mean_rolls).powi(2))
        .sum::<f64>()
        / n;

    PlayabilityAggregate {
        mode,
        strategy,
        iterations: group.len(),
        mean_rolls,
        std_rolls: variance.sqrt(),
        red_win_pct: share(&|m: &GameMetrics| m.winner == Some(PlayerColor::Red)),
        blue_win_pct: share(&|m: &GameMetrics| m.winner == Some(PlayerColor::Blue)),
        mean_collisions: mean(|m| m.collisions),
        mean_stars: mean(|m| m.stars),
        mean_traps: mean(|m| m.traps),
        mean_bounces: mean(|m| m.bounces),
        stall_rate: share(&|m: &GameMetrics| m.stalled),
    }
}

/// # Errors
///
/// Returns an error naming the first strategy whose games stall too often.
pub fn validate_playability_targets(aggregates: &[PlayabilityAggregate]) -> Result<()> {
    for aggregate in aggregates {
        ensure!(
            aggregate.stall_rate <= MAX_STALL_RATE,
            "{} stalled in {:.1}% of games (limit {:.1}%)",
            aggregate.strategy,
            aggregate.stall_rate * 100.0,
            MAX_STALL_RATE * 100.0
        );
    }
    Ok(())
}
