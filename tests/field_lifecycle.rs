//! End-to-end runs of the public API: emit, tick, composite, settle

use glam::Vec2;
use ripple_field::compositor::render_cpu;
use ripple_field::config::{EmitPolicy, RippleParameters};
use ripple_field::renderer::KernelResolver;
use ripple_field::{
    Compositor, CompositorKind, EmitOutcome, FieldPhase, RgbaImage, RippleConfig, RippleField, RippleStore,
};

const DARK: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const LIGHT: [f32; 4] = [0.9, 0.9, 0.9, 1.0];

fn checkerboard() -> RgbaImage {
    RgbaImage::checkerboard(128, 128, 8, DARK, LIGHT)
}

#[test]
fn test_tap_animates_then_settles() {
    let config = RippleConfig::default();
    let source = checkerboard();
    let mut field = RippleField::new(&config, source.size());
    assert!(field.tick(0.0).is_none());

    assert!(field.emit(Vec2::new(64.0, 64.0), 0.0).is_accepted());

    let mut frames = 0usize;
    let mut saw_animating = false;
    let mut saw_idle = false;
    let mut now = 0.0;
    while let Some(frame) = field.tick(now) {
        match frame.transition {
            Some(FieldPhase::Animating) => saw_animating = true,
            Some(FieldPhase::Idle) => {
                saw_idle = true;
                assert!(frame.packed.is_empty());
            }
            None => {}
        }
        frames += 1;
        now += 1.0 / 60.0;
        assert!(frames < 1000, "field never settled");
    }

    // Default lifetime is ln(12 / 0.15) / 1.6 ≈ 2.74 s
    assert!(saw_animating && saw_idle);
    assert!((160..=170).contains(&frames), "settled after {} frames", frames);
    assert!(field.is_idle());
    assert!(field.store().is_idle());
}

#[test]
fn test_every_compositor_distorts_then_passes_through() {
    let config = RippleConfig::default();
    let source = checkerboard();
    let mut field = RippleField::new(&config, source.size());
    field.emit(Vec2::new(64.0, 64.0), 0.0);

    let live = field.tick(0.08).unwrap();
    for kind in [CompositorKind::Distortion, CompositorKind::Prismatic, CompositorKind::Luminous] {
        let compositor = Compositor::of_kind(kind, &config);
        let out = render_cpu(&compositor, &live.context, &source, &live.packed);
        assert!(out.mean_abs_difference(&source).unwrap() > 0.0, "{}", kind.as_str());
        assert!(out.pixels().iter().flatten().all(|c| c.is_finite()));
    }

    let settled = field.tick(10.0).unwrap();
    assert!(settled.went_idle());
    let compositor = Compositor::from_config(&config);
    let out = render_cpu(&compositor, &settled.context, &source, &settled.packed);
    assert_eq!(out, source);
}

#[test]
fn test_default_decay_scenario() {
    let params = RippleParameters::default();
    let mut store = RippleStore::default();
    store.emit(Vec2::ZERO, 0.0);

    let at_two = store.snapshot(2.0, &params);
    assert_eq!(at_two.len(), 1);
    assert!((at_two[0].amplitude - 12.0 * (-3.2f32).exp()).abs() < 1e-4);

    assert!(store.snapshot(3.0, &params).is_empty());
    assert!(store.is_idle());
}

#[test]
fn test_capacity_keeps_most_recent() {
    let mut config = RippleConfig::default();
    config.emit = EmitPolicy {
        max_simultaneous: 3,
        ..EmitPolicy::default()
    };
    let mut field = RippleField::new(&config, Vec2::new(800.0, 600.0));

    let points: Vec<Vec2> = (0..5).map(|i| Vec2::new(100.0 * i as f32, 50.0)).collect();
    for (i, &p) in points.iter().enumerate() {
        assert!(field.emit(p, i as f64 * 0.1).is_accepted());
    }

    let centers: Vec<Vec2> = field.store().events().iter().map(|e| e.center).collect();
    assert_eq!(centers, points[2..].to_vec());
}

#[test]
fn test_repeated_tap_is_debounced() {
    let mut field = RippleField::new(&RippleConfig::default(), Vec2::new(200.0, 200.0));
    let first = field.emit(Vec2::new(20.0, 20.0), 1.0);
    let second = field.emit(Vec2::new(21.0, 20.0), 1.01);
    assert!(first.is_accepted());
    assert_eq!(second, EmitOutcome::Debounced);
    assert_eq!(field.store().len(), 1);
}

#[test]
fn test_config_file_drives_field() {
    let path = std::env::temp_dir().join(format!("ripple-field-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "compositor": "Luminous", "emit": { "max_simultaneous": 2 } }"#).unwrap();

    let config = RippleConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(config.compositor, CompositorKind::Luminous);
    assert_eq!(config.emit.max_simultaneous, 2);
    assert_eq!(config.parameters, RippleParameters::default());

    let mut field = RippleField::new(&config, Vec2::new(300.0, 300.0));
    field.emit_batch(&[Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0)], 0.0);
    assert_eq!(field.store().len(), 2);
    assert_eq!(Compositor::from_config(&config).kind(), CompositorKind::Luminous);
}

#[test]
fn test_embedded_kernel_serves_every_compositor() {
    let kernel = KernelResolver::default().resolve().unwrap();
    for kind in [CompositorKind::Distortion, CompositorKind::Prismatic, CompositorKind::Luminous] {
        assert!(kernel.has_entry_point(kind.entry_point()));
    }
}
