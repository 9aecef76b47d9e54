//! Sample-size planning.
//!
//! Picks the integer downscale factor applied at decode time. The factor keeps
//! the limiting dimension close to (and not below) the target where the source
//! allows it, then grows until the decoded pixel count is at most twice the
//! requested budget so that panoramas don't blow up memory.

use crate::types::{ProbedBounds, SamplePlan};

/// Decoded pixel count may exceed `target²` by at most this multiple.
pub const PIXEL_BUDGET_MULTIPLIER: u64 = 2;

/// Compute the sample plan for `bounds` against a square `target_dimension`.
pub fn plan(bounds: ProbedBounds, target_dimension: u32) -> SamplePlan {
    SamplePlan {
        sample_factor: sample_factor(bounds.width, bounds.height, target_dimension),
    }
}

/// Integer form of the planner. Pure, no I/O.
pub fn sample_factor(width: u32, height: u32, target: u32) -> u32 {
    let target = u64::from(target.max(1));
    let (w, h) = (u64::from(width), u64::from(height));

    if w <= target && h <= target {
        return 1;
    }

    let height_ratio = round_half_up_div(h, target);
    let width_ratio = round_half_up_div(w, target);
    let mut factor = height_ratio.min(width_ratio).max(1);

    let total_pixels = w * h;
    let cap = target * target * PIXEL_BUDGET_MULTIPLIER;
    // total / factor² > cap, without the float division
    while total_pixels > cap.saturating_mul(factor * factor) {
        factor += 1;
    }

    u32::try_from(factor).unwrap_or(u32::MAX)
}

/// `round(n / d)` with halves rounded up.
fn round_half_up_div(n: u64, d: u64) -> u64 {
    (2 * n + d) / (2 * d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_photo() {
        // 4000x3000 at 1000: ratios 3 and 4, 12e6/9 fits under the 2e6 cap
        assert_eq!(sample_factor(4000, 3000, 1000), 3);
    }

    #[test]
    fn test_small_source_is_untouched() {
        assert_eq!(sample_factor(500, 400, 1000), 1);
        assert_eq!(sample_factor(1000, 1000, 1000), 1);
    }

    #[test]
    fn test_panorama_hits_pixel_cap() {
        // Ratios 1 and 20; 5e6/9 > 5e5 but 5e6/16 fits
        assert_eq!(sample_factor(10000, 500, 500), 4);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up_div(1500, 1000), 2);
        assert_eq!(round_half_up_div(1499, 1000), 1);
        assert_eq!(round_half_up_div(2500, 1000), 3);
    }

    #[test]
    fn test_one_dimension_just_over_target() {
        // 1001/1000 rounds to 1, and 1001*800 is well under the cap
        assert_eq!(sample_factor(1001, 800, 1000), 1);
    }

    #[test]
    fn test_huge_dimensions_do_not_overflow() {
        let factor = sample_factor(u32::MAX, u32::MAX, 1);
        assert!(factor > 1);
    }

    #[test]
    fn test_zero_target_treated_as_one() {
        assert_eq!(sample_factor(1, 1, 0), 1);
        assert_eq!(sample_factor(4, 1, 0), 2);
    }

    #[test]
    fn test_plan_wraps_factor() {
        let bounds = ProbedBounds {
            width: 4000,
            height: 3000,
        };
        assert_eq!(plan(bounds, 1000).sample_factor, 3);
    }

    #[test]
    fn test_factor_is_monotonic_in_each_dimension() {
        for target in [7u32, 50, 128] {
            for h in (1..=600).step_by(13) {
                let mut previous = 1;
                for w in (1..=600).step_by(7) {
                    let factor = sample_factor(w, h, target);
                    assert!(
                        factor >= previous,
                        "factor dropped at {}x{} (T={})",
                        w,
                        h,
                        target
                    );
                    previous = factor;
                }
            }
            for w in (1..=600).step_by(13) {
                let mut previous = 1;
                for h in (1..=600).step_by(7) {
                    let factor = sample_factor(w, h, target);
                    assert!(
                        factor >= previous,
                        "factor dropped at {}x{} (T={})",
                        w,
                        h,
                        target
                    );
                    previous = factor;
                }
            }
        }
    }

    #[test]
    fn test_factor_respects_cap_and_is_tight() {
        for target in [10u32, 64, 333] {
            for (w, h) in [(4000, 3000), (10000, 500), (640, 480), (3000, 3000), (12345, 67)] {
                let factor = u64::from(sample_factor(w, h, target));
                let total = u64::from(w) * u64::from(h);
                let cap = u64::from(target) * u64::from(target) * 2;
                assert!(total <= cap * factor * factor);

                // One step smaller either undershoots the rounded ratio or breaks the cap
                if factor > 1 {
                    let t = u64::from(target);
                    let start = round_half_up_div(u64::from(h), t)
                        .min(round_half_up_div(u64::from(w), t))
                        .max(1);
                    let smaller = factor - 1;
                    assert!(smaller < start || total > cap * smaller * smaller);
                }
            }
        }
    }
}
