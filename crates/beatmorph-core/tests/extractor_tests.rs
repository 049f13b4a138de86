use beatmorph_core::{AudioFeatures, ExtractorConfig, FeatureExtractor, TemperatureEstimator};
use proptest::prelude::*;

fn spectrum(bass: u8, rest: u8) -> Vec<u8> {
    let mut bins = vec![rest; 1024];
    bins[0..=6].fill(bass);
    bins
}

proptest! {
    #[test]
    fn onsets_never_closer_than_debounce(
        frames in prop::collection::vec((any::<u8>(), 1u32..80), 1..600)
    ) {
        let mut extractor = FeatureExtractor::default();
        let mut t = 0.0f64;
        let mut last_onset: Option<f64> = None;

        for (bass, step_ms) in frames {
            t += step_ms as f64 / 1000.0;
            let f = extractor.process(Some(&spectrum(bass, 0)), t);
            if f.is_onset {
                if let Some(last) = last_onset {
                    prop_assert!(t - last > 0.1, "onsets {:.4}s apart", t - last);
                }
                last_onset = Some(t);
            }
        }
    }

    #[test]
    fn epoch_tracks_every_sixteenth_beat(
        frames in prop::collection::vec((any::<u8>(), any::<bool>()), 1..800)
    ) {
        let mut extractor = FeatureExtractor::default();
        let mut t = 0.0f64;
        let mut prev = AudioFeatures::default();

        for (bass, dropout) in frames {
            t += 0.05;
            let bins = spectrum(bass, 40);
            let f = extractor.process(if dropout { None } else { Some(&bins) }, t);

            prop_assert_eq!(f.scene_epoch, f.beat_count / 16);
            if f.is_onset {
                prop_assert_eq!(f.beat_count, prev.beat_count + 1);
            } else {
                prop_assert_eq!(f.beat_count, prev.beat_count);
                prop_assert_eq!(f.scene_epoch, prev.scene_epoch);
            }
            prev = f;
        }
    }

    #[test]
    fn smoothed_energies_stay_in_unit_range(
        frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..700), 1..100)
    ) {
        let mut extractor = FeatureExtractor::default();
        for (i, bins) in frames.iter().enumerate() {
            let f = extractor.process(Some(bins), i as f64 * 0.016);
            for v in [f.bass, f.mid, f.high, f.energy] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn temperature_stays_bounded(
        inputs in prop::collection::vec((0.0f32..=1.0, any::<bool>()), 1..5000)
    ) {
        let mut estimator = TemperatureEstimator::default();
        for (energy, is_onset) in inputs {
            let features = AudioFeatures { energy, is_onset, ..Default::default() };
            let t = estimator.update(&features);
            prop_assert!((0.0..=1.0).contains(&t));
        }
    }
}

#[test]
fn test_custom_bands() {
    let config = ExtractorConfig {
        beats_per_epoch: 4,
        debounce_s: 0.0,
        ..Default::default()
    };
    let mut extractor = FeatureExtractor::new(config);
    let quiet = spectrum(0, 0);
    let kick = spectrum(255, 0);

    let mut t = 0.0;
    for _ in 0..30 {
        extractor.process(Some(&quiet), t);
        t += 0.01;
    }
    for _ in 0..8 {
        for _ in 0..10 {
            extractor.process(Some(&quiet), t);
            t += 0.01;
        }
        assert!(extractor.process(Some(&kick), t).is_onset);
        t += 0.01;
    }
    assert_eq!(extractor.latest().beat_count, 8);
    assert_eq!(extractor.latest().scene_epoch, 2);
}

#[test]
fn test_first_onset_fires_without_prior_history() {
    // No prior onset, so the debounce window does not apply at t = 0
    let mut extractor = FeatureExtractor::default();
    let mut f = extractor.process(Some(&spectrum(0, 0)), 0.0);
    for _ in 0..29 {
        f = extractor.process(Some(&spectrum(0, 0)), 0.0);
    }
    assert!(!f.is_onset);
    assert!(extractor.process(Some(&spectrum(255, 0)), 0.0).is_onset);
}
