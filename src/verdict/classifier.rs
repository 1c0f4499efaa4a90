use crate::config::verdict_thresholds as t;
use crate::types::Verdict;

/// Map a combined score onto the seven-level ladder.
/// Bullish rungs are checked first, then bearish; everything left is neutral.
pub fn classify(score: f64) -> Verdict {
    if score >= t::EXTREMELY_BULLISH_MIN {
        Verdict::ExtremelyBullish
    } else if score >= t::BULLISH_MIN {
        Verdict::Bullish
    } else if score >= t::SLIGHTLY_BULLISH_MIN {
        Verdict::SlightlyBullish
    } else if score <= t::EXTREMELY_BEARISH_MAX {
        Verdict::ExtremelyBearish
    } else if score <= t::BEARISH_MAX {
        Verdict::Bearish
    } else if score <= t::SLIGHTLY_BEARISH_MAX {
        Verdict::SlightlyBearish
    } else {
        Verdict::Neutral
    }
}

/// Distance from neutral, doubled: 1..=100.
pub fn strength(score: f64) -> u8 {
    let raw = ((score - 50.0).abs() * 2.0).round();
    if !raw.is_finite() {
        return 1;
    }
    raw.clamp(1.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eighty_is_extremely_bullish() {
        assert_eq!(classify(80.0), Verdict::ExtremelyBullish);
        assert_eq!(classify(79.9), Verdict::Bullish);
    }

    #[test]
    fn boundaries_land_on_the_expected_rung() {
        let cases = [
            (100.0, Verdict::ExtremelyBullish),
            (65.0, Verdict::Bullish),
            (64.9, Verdict::SlightlyBullish),
            (55.0, Verdict::SlightlyBullish),
            (54.9, Verdict::Neutral),
            (50.0, Verdict::Neutral),
            (45.1, Verdict::Neutral),
            (45.0, Verdict::SlightlyBearish),
            (35.0, Verdict::Bearish),
            (20.1, Verdict::Bearish),
            (20.0, Verdict::ExtremelyBearish),
            (0.0, Verdict::ExtremelyBearish),
        ];
        for (score, expected) in cases {
            assert_eq!(classify(score), expected, "score {score}");
        }
    }

    #[test]
    fn ladder_is_monotone_over_the_whole_range() {
        let mut previous = classify(0.0);
        for tenth in 0..=1000 {
            let v = classify(tenth as f64 / 10.0);
            assert!(v >= previous, "ladder stepped down at {}", tenth as f64 / 10.0);
            previous = v;
        }
        assert_eq!(previous, Verdict::ExtremelyBullish);
    }

    #[test]
    fn strength_stays_in_range() {
        assert_eq!(strength(50.0), 1);
        assert_eq!(strength(50.2), 1);
        assert_eq!(strength(75.0), 50);
        assert_eq!(strength(25.0), 50);
        assert_eq!(strength(100.0), 100);
        assert_eq!(strength(0.0), 100);
        assert_eq!(strength(62.3), 25);
        for tenth in 0..=1000 {
            let s = strength(tenth as f64 / 10.0);
            assert!((1..=100).contains(&s));
        }
    }
}
