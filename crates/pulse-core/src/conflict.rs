//! Capacity conflict detection.
//!
//! A space is in conflict when its predicted occupancy exceeds 85% of
//! capacity. The check is a pure function with no state and no I/O;
//! `capacity > 0` is a precondition (every stored space has positive
//! capacity), not something handled here.

/// Utilization percentage above which a space is considered in conflict.
pub const CONFLICT_THRESHOLD_PCT: u64 = 85;

/// Whether `predicted_count` exceeds the safety threshold for `capacity`.
///
/// Defined as `predicted_count / capacity * 100 > 85`, evaluated in exact
/// integer arithmetic so the threshold itself (exactly 85%) is never a
/// conflict regardless of float rounding.
pub fn is_conflict(predicted_count: u32, capacity: u32) -> bool {
    u64::from(predicted_count).saturating_mul(100)
        > u64::from(capacity).saturating_mul(CONFLICT_THRESHOLD_PCT)
}

/// Utilization as a fraction of capacity (0.0 to 1.0 for counts within
/// capacity).
pub fn utilization_fraction(predicted_count: u32, capacity: u32) -> f64 {
    f64::from(predicted_count) / f64::from(capacity)
}

/// Utilization as a rounded whole percentage, for reason strings.
pub fn utilization_pct(predicted_count: u32, capacity: u32) -> u32 {
    round_to_count(utilization_fraction(predicted_count, capacity) * 100.0)
}

/// Round a non-negative float to a `u32`, saturating at the type bounds.
///
/// The clamp establishes the cast is lossless in range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_to_count(value: f64) -> u32 {
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        // Exactly 85% is safe; anything above is a conflict.
        assert!(!is_conflict(85, 100));
        assert!(is_conflict(86, 100));
        assert!(!is_conflict(17, 20));
        assert!(is_conflict(18, 20));
    }

    #[test]
    fn extremes() {
        assert!(!is_conflict(0, 100));
        assert!(is_conflict(100, 100));
        assert!(is_conflict(400, 100));
    }

    #[test]
    fn matches_percentage_definition_across_range() {
        for capacity in [1_u32, 7, 50, 100, 333, 1000] {
            for predicted in 0..=capacity {
                let expected =
                    f64::from(predicted) / f64::from(capacity) * 100.0 > 85.000_000_1;
                // The float formulation is ambiguous within one ulp of the
                // threshold; away from it both definitions agree.
                let pct100 = u64::from(predicted).saturating_mul(100);
                if pct100 != u64::from(capacity).saturating_mul(85) {
                    assert_eq!(
                        is_conflict(predicted, capacity),
                        expected,
                        "capacity={capacity} predicted={predicted}"
                    );
                }
            }
        }
    }

    #[test]
    fn utilization_pct_rounds() {
        assert_eq!(utilization_pct(89, 100), 89);
        assert_eq!(utilization_pct(1, 3), 33);
        assert_eq!(utilization_pct(2, 3), 67);
        assert_eq!(utilization_pct(0, 50), 0);
    }
}
