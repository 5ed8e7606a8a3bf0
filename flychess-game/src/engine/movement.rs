//! Token movement arithmetic, including the bounce off the end cell.

/// Final cell after moving `steps` forward from `position` on a track whose
/// end cell is `last`.
///
/// Overshooting the end reflects back by the excess, never below the start.
#[must_use]
pub const fn resolve_target(position: usize, steps: usize, last: usize) -> usize {
    let raw = position + steps;
    if raw > last {
        last.saturating_sub(raw - last)
    } else {
        raw
    }
}

/// Every cell visited, in order, when walking `steps` forward from `from`.
///
/// The walk turns around at `last` and stops early if it is pushed back to
/// the start. The final element equals [`resolve_target`].
#[must_use]
pub fn forward_path(from: usize, steps: usize, last: usize) -> Vec<usize> {
    let mut path = Vec::with_capacity(steps);
    let mut position = from.min(last);
    let mut forward = true;
    for _ in 0..steps {
        if forward && position == last {
            forward = false;
        }
        if !forward && position == 0 {
            break;
        }
        position = if forward { position + 1 } else { position - 1 };
        path.push(position);
    }
    path
}

/// Every cell visited walking `steps` backward from `from`, stopping at 0.
#[must_use]
pub fn backward_path(from: usize, steps: usize) -> Vec<usize> {
    (1..=steps.min(from)).map(|offset| from - offset).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overshoot_reflects_off_the_end() {
        assert_eq!(resolve_target(7, 5, 9), 6);
        assert_eq!(forward_path(7, 5, 9), vec![8, 9, 8, 7, 6]);
    }

    #[test]
    fn exact_roll_lands_on_end() {
        assert_eq!(resolve_target(5, 4, 9), 9);
        assert_eq!(forward_path(5, 4, 9), vec![6, 7, 8, 9]);
    }

    #[test]
    fn reflection_clamps_at_start() {
        assert_eq!(resolve_target(0, 7, 2), 0);
        assert_eq!(forward_path(0, 7, 2), vec![1, 2, 1, 0]);
    }

    #[test]
    fn path_end_always_matches_target() {
        for last in 1..12 {
            for from in 0..=last {
                for steps in 0..=8 {
                    let path = forward_path(from, steps, last);
                    let end = path.last().copied().unwrap_or(from);
                    assert_eq!(end, resolve_target(from, steps, last), "from {from} steps {steps} last {last}");
                }
            }
        }
    }

    #[test]
    fn backward_path_stops_at_start() {
        assert_eq!(backward_path(5, 3), vec![4, 3, 2]);
        assert_eq!(backward_path(2, 6), vec![1, 0]);
        assert!(backward_path(0, 4).is_empty());
    }
}
