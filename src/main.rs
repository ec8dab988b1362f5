//! Ripple Field demo
//!
//! Headless run of the full pipeline: seeded taps on a checkerboard, ticked
//! at 60 Hz through the CPU compositor until the field settles.
//!
//! Usage: `ripple-field [config.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Ripple Field (native) starting...");

    if let Err(e) = demo::run(std::env::args().nth(1)) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts drive the library directly on the web
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use ripple_field::compositor::render_cpu;
    use ripple_field::renderer::KernelResolver;
    use ripple_field::{Compositor, CompositorKind, RgbaImage, RippleConfig, RippleField};

    const WIDTH: u32 = 160;
    const HEIGHT: u32 = 120;
    const FRAME_DT: f64 = 1.0 / 60.0;
    const TAP_COUNT: usize = 4;
    const SEED: u64 = 0x5eed;
    /// Hard stop in case a config never decays
    const MAX_FRAMES: usize = 60 * 30;

    pub fn run(config_path: Option<String>) -> ripple_field::Result<()> {
        let config = match config_path {
            Some(path) => RippleConfig::load(path)?,
            None => RippleConfig::default(),
        };
        log::info!(
            "Preset {}, compositor {}, lifetime {:?}s",
            config.preset.as_str(),
            config.compositor.as_str(),
            config.parameters.lifetime()
        );

        // Validate the GPU kernel even though this run composites on the CPU
        let kernel = KernelResolver::embedded().resolve()?;
        log::info!("Kernel entry points: {:?}", kernel.entry_points());

        let source = RgbaImage::checkerboard(WIDTH, HEIGHT, 8, [0.1, 0.1, 0.15, 1.0], [0.9, 0.9, 0.85, 1.0]);
        let mut field = RippleField::new(&config, source.size());

        let mut rng = Pcg32::seed_from_u64(SEED);
        let mut now = 0.0;
        for _ in 0..TAP_COUNT {
            let tap = Vec2::new(
                rng.random_range(0.0..WIDTH as f32),
                rng.random_range(0.0..HEIGHT as f32),
            );
            let outcome = field.emit(tap, now);
            log::info!("Tap at ({:.1}, {:.1}) at t={:.3}: {:?}", tap.x, tap.y, now, outcome);
            now += rng.random_range(0.05..0.3);
        }

        for kind in [CompositorKind::Distortion, CompositorKind::Prismatic, CompositorKind::Luminous] {
            let compositor = Compositor::of_kind(kind, &config);
            let mut replay = field.clone();
            let (frames, peak) = animate(&mut replay, &compositor, &source, now);
            println!(
                "{:<10} {:>4} frames, peak mean difference {:.4}",
                kind.as_str(),
                frames,
                peak
            );
        }
        Ok(())
    }

    /// Tick until idle, returning the frame count and largest per-frame change
    fn animate(field: &mut RippleField, compositor: &Compositor, source: &RgbaImage, start: f64) -> (usize, f32) {
        let mut frames = 0;
        let mut peak = 0.0f32;
        let mut now = start;
        while frames < MAX_FRAMES {
            let Some(frame) = field.tick(now) else {
                break;
            };
            let out = render_cpu(compositor, &frame.context, source, &frame.packed);
            if let Some(diff) = out.mean_abs_difference(source) {
                peak = peak.max(diff);
            }
            if let Some(phase) = frame.transition {
                log::debug!("{} frame {}: {:?}", compositor.kind().as_str(), frames, phase);
            }
            frames += 1;
            now += FRAME_DT;
        }
        (frames, peak)
    }
}
