use anyhow::{Result, bail};
use chrono::Utc;

/// Seed used when the command line names none.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve the CLI seed tokens into a deduplicated, ordered seed list.
///
/// Accepts literal integers (negative values use their magnitude) and the
/// keyword `now`, which seeds from the current wall-clock milliseconds.
///
/// # Errors
///
/// Returns an error for any other token.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("now") {
            Utc::now().timestamp_millis().unsigned_abs()
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}
