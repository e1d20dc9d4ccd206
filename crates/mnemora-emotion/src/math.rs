//! Pure Valence/Arousal arithmetic. No I/O — this is the deterministic half
//! of C3, kept separate from the LLM-backed judge.

/// Clamp both axes into `[-1, 1]` after applying a delta.
pub fn update(valence: f64, arousal: f64, delta_valence: f64, delta_arousal: f64) -> (f64, f64) {
    (
        (valence + delta_valence).clamp(-1.0, 1.0),
        (arousal + delta_arousal).clamp(-1.0, 1.0),
    )
}

/// Discrete label for a point in VA space. Extreme regions (|A| >= 0.5) are
/// checked before the base regions (|V| >= 0.3 and |A| >= 0.3) so a strongly
/// aroused state is never mislabeled as a milder base emotion.
pub fn label(valence: f64, arousal: f64) -> &'static str {
    const BASE: f64 = 0.3;
    const EXTREME: f64 = 0.5;

    if valence >= BASE && arousal >= EXTREME {
        return "excited";
    }
    if valence <= -BASE && arousal >= EXTREME {
        return "anxious";
    }
    if valence <= -BASE && arousal <= -EXTREME {
        return "bored";
    }
    if valence >= BASE && arousal <= -EXTREME {
        return "calm";
    }

    if valence >= BASE && arousal >= BASE {
        return "joy";
    }
    if valence <= -BASE && arousal >= BASE {
        return "anger";
    }
    if valence <= -BASE && arousal <= -BASE {
        return "sadness";
    }
    if valence >= BASE && arousal < 0.0 {
        return "relaxation";
    }

    "neutral"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_both_axes_on_overflow() {
        let (v, a) = update(0.9, -0.9, 0.5, -0.5);
        assert_eq!(v, 1.0);
        assert_eq!(a, -1.0);
    }

    #[test]
    fn clamps_within_bounds_for_any_input() {
        for vs in [-2.0, -1.0, -0.1, 0.0, 0.4, 1.0, 2.0] {
            for as_ in [-2.0, -1.0, -0.1, 0.0, 0.4, 1.0, 2.0] {
                for dv in [-0.5, 0.0, 0.5] {
                    for da in [-0.5, 0.0, 0.5] {
                        let (v, a) = update(vs, as_, dv, da);
                        assert!((-1.0..=1.0).contains(&v));
                        assert!((-1.0..=1.0).contains(&a));
                    }
                }
            }
        }
    }

    #[test]
    fn small_praise_delta_stays_below_base_threshold() {
        let (v, a) = update(0.0, 0.0, 0.2, 0.1);
        assert_eq!(label(v, a), "neutral");
    }

    #[test]
    fn neutral_at_origin() {
        assert_eq!(label(0.0, 0.0), "neutral");
    }

    #[test]
    fn extreme_excited_beats_base_joy() {
        assert_eq!(label(0.4, 0.6), "excited");
    }

    #[test]
    fn extreme_anxious_beats_base_anger() {
        assert_eq!(label(-0.4, 0.6), "anxious");
    }
}
