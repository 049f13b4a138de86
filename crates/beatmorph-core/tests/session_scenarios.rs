use beatmorph_core::{
    BufferSource, CameraMode, EngineConfig, NullSink, Session, ShapeKind, Silence,
};

const DT: f32 = 1.0 / 60.0;

fn config(particle_count: usize) -> EngineConfig {
    EngineConfig {
        particle_count,
        ..Default::default()
    }
}

/// Mid and high bands held at 0.9 of full scale, bass silent
fn loud_bed() -> Vec<u8> {
    let level = (0.9f32 * 255.0).round() as u8;
    let mut bins = vec![0u8; 1024];
    bins[8..=512].fill(level);
    bins
}

#[test]
fn scenario_a_sixteen_rising_kicks_reach_the_drop() {
    let mut session = Session::with_seed(config(512), 42).unwrap();
    let mut source = BufferSource::new(loud_bed());

    let mut onsets = Vec::new();
    let mut tick = 0u32;
    let mut kick = 0u32;
    while kick < 16 {
        let is_kick_tick = tick % 15 == 14;
        let height = if is_kick_tick {
            0.5 + 0.03 * kick as f32
        } else {
            0.0
        };
        source.bins[0..=6].fill((height * 255.0) as u8);

        let summary = session.tick(DT, &mut source, &mut NullSink);
        if summary.features.is_onset {
            onsets.push((tick, summary.features.beat_count, summary.features.scene_epoch));
        }
        if is_kick_tick {
            kick += 1;
        }
        tick += 1;
    }

    assert_eq!(onsets.len(), 16, "onsets: {:?}", onsets);
    // Every kick tick fired, and only those
    assert!(onsets.iter().all(|(t, _, _)| t % 15 == 14));
    // Epoch moves exactly once, on the sixteenth beat
    assert!(onsets[..15].iter().all(|(_, _, epoch)| *epoch == 0));
    assert_eq!(onsets[15], (239, 16, 1));

    assert_eq!(session.features().scene_epoch, 1);
    assert!(session.temperature() >= 0.9, "temperature {}", session.temperature());
    assert_eq!(session.visuals().camera_mode, CameraMode::Glitchy);
    assert_eq!(session.camera().mode(), CameraMode::Glitchy);
}

#[test]
fn scenario_b_silence_cools_monotonically() {
    let mut cfg = config(256);
    cfg.temperature.initial = 1.0;
    let mut session = Session::with_seed(cfg, 7).unwrap();
    let mut source = BufferSource::new(vec![0u8; 1024]);

    let mut previous = session.temperature();
    assert_eq!(previous, 1.0);

    // 20 seconds of silent spectra
    for _ in 0..(20 * 60) {
        let summary = session.tick(DT, &mut source, &mut NullSink);
        let t = summary.temperature;
        assert!(t >= 0.0);
        assert!(t <= previous, "temperature rose from {} to {}", previous, t);
        if previous > 0.0 {
            assert!(t < previous, "temperature stalled at {}", t);
        }
        previous = t;
    }
    assert_eq!(previous, 0.0);
    assert_eq!(session.visuals().camera_mode, CameraMode::Steady);
}

#[test]
fn scenario_b_missing_spectrum_also_cools() {
    let mut cfg = config(256);
    cfg.temperature.initial = 0.5;
    let mut session = Session::with_seed(cfg, 8).unwrap();
    for _ in 0..600 {
        session.tick(DT, &mut Silence, &mut NullSink);
    }
    assert!((session.temperature() - 0.0).abs() < 1e-6);
}

#[test]
fn scenario_c_dt_spike_is_clamped() {
    let mut session = Session::with_seed(config(2000), 9).unwrap();
    for _ in 0..10 {
        session.tick(DT, &mut Silence, &mut NullSink);
    }

    let target = session
        .particles()
        .library()
        .get(session.visuals().target_shape())
        .to_vec();
    let before = session.particles().positions().to_vec();
    let camera_before = session.camera().pose().position;

    let summary = session.tick(5.0, &mut Silence, &mut NullSink);
    assert_eq!(summary.dt, 0.1);

    // One clamped tick covers at most 0.1 * 1.5 of the remaining distance
    for ((b, a), t) in before.iter().zip(session.particles().positions()).zip(&target) {
        let moved = (*a - *b).length();
        let remaining = (*t - *b).length();
        assert!(moved <= remaining * 0.15 + 1e-4, "moved {} of {}", moved, remaining);
    }

    let camera_moved = (summary.camera.position - camera_before).length();
    assert!(camera_moved < 5.0, "camera jumped {}", camera_moved);
    assert!(summary.camera.position.is_finite());
}

#[test]
fn test_morph_converges_to_target() {
    let mut session = Session::with_seed(config(1000), 10).unwrap();
    for _ in 0..(30 * 60) {
        session.tick(DT, &mut Silence, &mut NullSink);
    }
    assert_eq!(session.visuals().target_shape(), ShapeKind::Sphere);
    let target = session.particles().library().get(ShapeKind::Sphere);
    for (p, t) in session.particles().positions().iter().zip(target) {
        assert!((*p - *t).length() < 1e-3);
    }
}

#[test]
fn test_independent_sessions_do_not_share_state() {
    let mut hot = Session::with_seed(config(128), 11).unwrap();
    let mut cold = Session::with_seed(config(128), 11).unwrap();
    let mut loud = BufferSource::new(vec![230u8; 1024]);

    for _ in 0..300 {
        hot.tick(DT, &mut loud, &mut NullSink);
        cold.tick(DT, &mut Silence, &mut NullSink);
    }
    assert!(hot.temperature() > 0.5);
    assert_eq!(cold.temperature(), 0.0);
    assert_eq!(cold.features().beat_count, 0);
}
