//! Wall-clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch. Timestamps on snapshots and outcome
/// records use this; it never fails, a pre-epoch clock reads as zero.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_secs_returns_reasonable_value() {
        // After 2024-01-01.
        assert!(epoch_secs() > 1_704_067_200);
    }
}
