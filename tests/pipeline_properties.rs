// End-to-end behaviour of the auto-framing pipeline over whole frame sequences.

use image::{Rgba, RgbaImage};
use waldo_focus::core_modules::audio::{AudioBand, AudioModulation, SilentAudio};
use waldo_focus::core_modules::focus_resolver::PrecisionMode;
use waldo_focus::core_modules::point::Point;
use waldo_focus::pipeline::{FocusPipeline, PipelineState, step};
use waldo_focus::{FocusConfig, FocusError};

const SIZE: u32 = 64;
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A square that slides right along the top of the frame.
fn sliding_square(frame: u32) -> RgbaImage {
    let left = 34 + frame % 14;
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        if (left..left + 8).contains(&x) && (6..14).contains(&y) { WHITE } else { BLACK }
    })
}

/// Deterministic per-pixel noise, different for every frame.
fn noise(frame: u32) -> RgbaImage {
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let mut state = (x + 1).wrapping_mul(73_856_093)
            ^ (y + 1).wrapping_mul(19_349_663)
            ^ (frame + 1).wrapping_mul(83_492_791);
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgba([r, g, b, 255])
    })
}

#[test]
fn zero_motion_keeps_the_identity_frame() {
    let mut pipeline = FocusPipeline::new(FocusConfig::default()).expect("valid config");
    let frame = RgbaImage::from_pixel(SIZE, SIZE, Rgba([40, 80, 120, 255]));
    // The first frame differs from the implicit black previous frame; after that the
    // input never changes.
    pipeline.process_frame(&frame);
    let mut last = None;
    for _ in 0..400 {
        last = Some(pipeline.process_frame(&frame));
    }
    let output = last.expect("frames were processed");
    assert!(output.report.focus_point().distance(Point::SCREEN_CENTER) < 1e-3);
    assert!(output.report.zoom.amount < 1e-4);
}

#[test]
fn idle_frames_settle_back_to_center() {
    let mut pipeline = FocusPipeline::new(FocusConfig::default()).expect("valid config");
    for index in 0..40 {
        pipeline.process_frame(&sliding_square(index));
    }
    let busy = pipeline.focus();
    assert!(busy.x > 0.55 && busy.y < 0.45, "focus never left the center: {busy:?}");

    let still = sliding_square(40);
    let mut last = None;
    for _ in 0..400 {
        last = Some(pipeline.process_frame(&still));
    }
    let report = last.expect("frames were processed").report;

    assert!(
        pipeline
            .state()
            .previous_motion()
            .is_some_and(|field| field.peak() < 1e-6),
        "motion never faded"
    );
    assert!(
        report.focus_point().distance(Point::SCREEN_CENTER) < 1e-3,
        "focus stuck at {:?}",
        report.focus_point()
    );
    assert!((report.zoom.scale - 1.0).abs() < 1e-4, "zoom stuck at {}", report.zoom.scale);
}

#[test]
fn zoom_never_exceeds_its_ceiling() {
    let loud = |_: AudioBand| -> f32 { 1.0 };
    for max_zoom_level in [0.05, 0.2, 0.5, 0.85] {
        let config = FocusConfig {
            zoom_strength: 5.0,
            zoom_intensity: 5.0,
            max_zoom_level,
            global_motion_sensitivity: 1.0,
            zoom_audio: AudioModulation::new(AudioBand::Volume, 10.0),
            ..FocusConfig::default()
        };
        let mut state = PipelineState::new();
        for index in 0..12 {
            let frame = if index % 3 == 0 { noise(index) } else { sliding_square(index) };
            let (next, output) = step(state, &frame, &config, &loud);
            state = next;
            let zoom = output.report.zoom;
            assert!(zoom.amount >= 0.0);
            assert!(
                zoom.amount <= max_zoom_level,
                "zoom {} above {max_zoom_level}",
                zoom.amount
            );
            assert!((zoom.scale - (1.0 - zoom.amount)).abs() < 1e-6);
        }
    }
}

#[test]
fn any_viewport_the_pipeline_picks_samples_inside_the_frame() {
    let mut pipeline = FocusPipeline::new(FocusConfig {
        focus_strength: 5.0,
        zoom_strength: 5.0,
        max_zoom_level: 0.85,
        ..FocusConfig::default()
    })
    .expect("valid config");

    for index in 0..30 {
        let report = pipeline.process_frame(&sliding_square(index)).report;
        let viewport = report.viewport();
        for j in 0..=10 {
            for i in 0..=10 {
                let source = viewport.to_source(Point::new(i as f32 / 10.0, j as f32 / 10.0));
                assert!((0.0..=1.0).contains(&source.x) && (0.0..=1.0).contains(&source.y));
            }
        }
    }
}

#[test]
fn quadrant_mode_jumps_straight_to_a_busy_quadrant() {
    // No history blending and a saturating strength; the first frame's motion is the
    // whole top-right quadrant against the implicit black previous frame.
    let config = FocusConfig {
        precision_mode: PrecisionMode::Quadrant,
        focus_smoothness: 0.0,
        focus_strength: 5.0,
        ..FocusConfig::default()
    };
    let frame = RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        if x >= SIZE / 2 && y < SIZE / 2 { WHITE } else { BLACK }
    });

    let (_, output) = step(PipelineState::new(), &frame, &config, &SilentAudio);
    let focus = output.report.focus;
    assert!(focus.candidate.distance(Point::new(0.75, 0.25)) < 1e-4, "{focus:?}");
    assert_eq!(focus.center_blend, 1.0);
    assert!(focus.focus.distance(Point::new(0.75, 0.25)) < 1e-4, "{focus:?}");
}

#[test]
fn step_and_pipeline_agree() {
    let config = FocusConfig::default();
    let mut pipeline = FocusPipeline::new(config.clone()).expect("valid config");
    let mut state = PipelineState::new();
    for index in 0..8 {
        let frame = sliding_square(index);
        let (next, stepped) = step(state, &frame, &config, &SilentAudio);
        state = next;
        let owned = pipeline.process_frame(&frame);
        assert_eq!(stepped.report.frame_index, owned.report.frame_index);
        assert!(stepped.report.focus_point().distance(owned.report.focus_point()) < 1e-5);
    }
    assert_eq!(state.frames_processed(), 8);
}

#[test]
fn configs_survive_a_json_round_trip() {
    let config = FocusConfig {
        precision_mode: PrecisionMode::NineZone,
        focus_audio: AudioModulation::new(AudioBand::Treble, 3.0),
        aggregation_grid: 48,
        ..FocusConfig::default()
    };
    let json = serde_json::to_string_pretty(&config).expect("config serializes");
    let parsed: FocusConfig = serde_json::from_str(&json).expect("config parses");
    assert_eq!(parsed, config);
}

#[test]
fn bad_json_values_are_caught_by_validation() {
    let parsed: FocusConfig =
        serde_json::from_str(r#"{ "zoom_intensity": 9.0 }"#).expect("config parses");
    assert!(matches!(
        FocusPipeline::new(parsed),
        Err(FocusError::OutOfRange { name: "zoom_intensity", .. })
    ));
}
