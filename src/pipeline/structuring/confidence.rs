/// Reported when the text's quality was never assessed.
pub const DEFAULT_CONFIDENCE: u8 = 85;

/// Record confidence from an optional 0.0-1.0 quality score.
///
/// Direct precedence: the quality score when present, else the default.
/// Out-of-range scores are clamped; NaN counts as absent.
pub fn record_confidence(quality_score: Option<f32>) -> u8 {
    match quality_score {
        Some(score) if !score.is_nan() => (score.clamp(0.0, 1.0) * 100.0).round() as u8,
        _ => DEFAULT_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_score_takes_precedence() {
        assert_eq!(record_confidence(Some(0.734)), 73);
        assert_eq!(record_confidence(Some(0.735)), 74);
        assert_eq!(record_confidence(Some(0.0)), 0);
        assert_eq!(record_confidence(Some(1.0)), 100);
    }

    #[test]
    fn absent_score_uses_default() {
        assert_eq!(record_confidence(None), 85);
        assert_eq!(record_confidence(Some(f32::NAN)), 85);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(record_confidence(Some(72.0)), 100);
        assert_eq!(record_confidence(Some(-0.5)), 0);
    }
}
