//! Kernel resolution
//!
//! Finds the WGSL program holding the GPU compositors. Candidates are tried
//! in order; the first one that loads, passes naga validation and declares
//! every required entry point wins and is memoized. Failures are not memoized,
//! so a later call retries.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use wgpu::naga;

use crate::error::{Result, RippleError};

/// Kernel compiled into the crate
pub const EMBEDDED_KERNEL: &str = include_str!("ripple_shader.wgsl");

/// Vertex stage shared by every compositor
pub const VERTEX_ENTRY_POINT: &str = "vs_main";

/// Entry points a kernel must declare
pub const REQUIRED_ENTRY_POINTS: [&str; 4] = [VERTEX_ENTRY_POINT, "fs_distortion", "fs_prismatic", "fs_luminous"];

/// Where a kernel may come from
#[derive(Debug, Clone)]
pub enum KernelSource {
    Embedded(&'static str),
    File(PathBuf),
}

impl KernelSource {
    fn describe(&self) -> String {
        match self {
            KernelSource::Embedded(_) => "embedded".to_string(),
            KernelSource::File(path) => path.display().to_string(),
        }
    }

    fn load(&self) -> Result<Cow<'static, str>> {
        match self {
            KernelSource::Embedded(source) => Ok(Cow::Borrowed(source)),
            KernelSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| RippleError::KernelIo {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// A validated kernel program
#[derive(Debug, Clone)]
pub struct RippleKernel {
    source: Cow<'static, str>,
    entry_points: Vec<String>,
    origin: String,
}

impl RippleKernel {
    /// Validate `source`, requiring every entry point in [`REQUIRED_ENTRY_POINTS`]
    pub fn from_source(source: Cow<'static, str>, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let entry_points = entry_points(&source).map_err(|message| RippleError::KernelInvalid {
            origin: origin.clone(),
            message,
        })?;
        for expected in REQUIRED_ENTRY_POINTS {
            if !entry_points.iter().any(|name| name == expected) {
                return Err(RippleError::KernelNotFound {
                    expected: expected.to_string(),
                    available: entry_points,
                });
            }
        }
        Ok(Self {
            source,
            entry_points,
            origin,
        })
    }

    /// WGSL text
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_points(&self) -> &[String] {
        &self.entry_points
    }

    pub fn has_entry_point(&self, name: &str) -> bool {
        self.entry_points.iter().any(|n| n == name)
    }

    /// Which candidate this kernel was loaded from
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Parse and validate `wgsl`, returning its entry point names in declaration order
pub fn entry_points(wgsl: &str) -> std::result::Result<Vec<String>, String> {
    let module = naga::front::wgsl::parse_str(wgsl).map_err(|e| e.to_string())?;
    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::default())
        .validate(&module)
        .map_err(|e| e.to_string())?;
    Ok(module.entry_points.iter().map(|ep| ep.name.clone()).collect())
}

/// Lazily resolves and memoizes the kernel
#[derive(Debug)]
pub struct KernelResolver {
    candidates: Vec<KernelSource>,
    resolved: Mutex<Option<Arc<RippleKernel>>>,
}

impl Default for KernelResolver {
    fn default() -> Self {
        Self::embedded()
    }
}

impl KernelResolver {
    pub fn new(candidates: Vec<KernelSource>) -> Self {
        Self {
            candidates,
            resolved: Mutex::new(None),
        }
    }

    /// Resolver that only knows the built-in kernel
    pub fn embedded() -> Self {
        Self::new(vec![KernelSource::Embedded(EMBEDDED_KERNEL)])
    }

    /// Override files are tried first, then the built-in kernel
    pub fn with_overrides(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut candidates: Vec<KernelSource> = paths.into_iter().map(KernelSource::File).collect();
        candidates.push(KernelSource::Embedded(EMBEDDED_KERNEL));
        Self::new(candidates)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// The kernel, loading it on first use
    pub fn resolve(&self) -> Result<Arc<RippleKernel>> {
        let mut slot = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(kernel) = slot.as_ref() {
            return Ok(Arc::clone(kernel));
        }

        let mut last_error = None;
        for candidate in &self.candidates {
            let origin = candidate.describe();
            let attempt = candidate
                .load()
                .and_then(|source| RippleKernel::from_source(source, origin.clone()));
            match attempt {
                Ok(kernel) => {
                    log::info!("Resolved ripple kernel from {} ({:?})", origin, kernel.entry_points());
                    let kernel = Arc::new(kernel);
                    *slot = Some(Arc::clone(&kernel));
                    return Ok(kernel);
                }
                Err(e) => {
                    log::warn!("Kernel candidate {} rejected: {}", origin, e);
                    last_error = Some(e);
                }
            }
        }

        let err = last_error.unwrap_or(RippleError::NoKernelSource {
            tried: self.candidates.len(),
        });
        log::error!("Ripple kernel unavailable: {}", err);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::prismatic::{CREST_MIX, MOTION_MIX};
    use crate::consts::*;

    const TWO_STAGE: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }\n\
        @fragment fn fs_distortion() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";

    fn wgsl_constant(module: &naga::Module, name: &str) -> f32 {
        let (_, constant) = module
            .constants
            .iter()
            .find(|(_, c)| c.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("kernel lacks const {}", name));
        match module.global_expressions[constant.init] {
            naga::Expression::Literal(naga::Literal::F32(v)) => v,
            naga::Expression::Literal(naga::Literal::U32(v)) => v as f32,
            ref other => panic!("const {} is not a literal: {:?}", name, other),
        }
    }

    #[test]
    fn test_embedded_kernel_validates() {
        let names = entry_points(EMBEDDED_KERNEL).unwrap();
        for expected in REQUIRED_ENTRY_POINTS {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
        // Helpers are not entry points
        assert!(!names.iter().any(|n| n == "sample_field"));
    }

    #[test]
    fn test_embedded_constants_match_cpu() {
        let module = naga::front::wgsl::parse_str(EMBEDDED_KERNEL).unwrap();
        assert_eq!(wgsl_constant(&module, "MAX_RIPPLES"), MAX_PACKED_RIPPLES as f32);
        assert_eq!(wgsl_constant(&module, "SOURCE_CLAMP_FRACTION"), SOURCE_CLAMP_FRACTION);
        assert_eq!(wgsl_constant(&module, "TOTAL_CLAMP_FRACTION"), TOTAL_CLAMP_FRACTION);
        assert_eq!(wgsl_constant(&module, "CENTER_EPSILON"), CENTER_EPSILON);
        assert_eq!(wgsl_constant(&module, "CREST_MIX"), CREST_MIX);
        assert_eq!(wgsl_constant(&module, "MOTION_MIX"), MOTION_MIX);
        assert!((wgsl_constant(&module, "TAU") - std::f32::consts::TAU).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_kernel_rejected() {
        let src = "@vertex fn vs_main( {{ @fragment fn fs_distortion @fragment fn fs_prismatic @fragment fn fs_luminous garbage";
        let err = RippleKernel::from_source(Cow::Borrowed(src), "broken").unwrap_err();
        match err {
            RippleError::KernelInvalid { origin, .. } => assert_eq!(origin, "broken"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_invalid_kernel_rejected() {
        // Parses, but a vertex stage must produce a position
        let src = "@vertex fn vs_main() {}";
        assert!(entry_points(src).is_err());
        assert!(matches!(
            RippleKernel::from_source(Cow::Borrowed(src), "test"),
            Err(RippleError::KernelInvalid { .. })
        ));
    }

    #[test]
    fn test_missing_entry_point_is_descriptive() {
        let err = RippleKernel::from_source(Cow::Borrowed(TWO_STAGE), "test").unwrap_err();
        match &err {
            RippleError::KernelNotFound { expected, available } => {
                assert_eq!(expected, "fs_prismatic");
                assert_eq!(available, &vec!["vs_main".to_string(), "fs_distortion".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("not found among available names"));
    }

    #[test]
    fn test_resolve_memoizes() {
        let resolver = KernelResolver::embedded();
        assert!(!resolver.is_resolved());
        let a = resolver.resolve().unwrap();
        let b = resolver.resolve().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(resolver.is_resolved());
        assert_eq!(a.origin(), "embedded");
    }

    #[test]
    fn test_falls_back_past_missing_file() {
        let resolver = KernelResolver::with_overrides([PathBuf::from("/no/such/ripple.wgsl")]);
        let kernel = resolver.resolve().unwrap();
        assert_eq!(kernel.origin(), "embedded");
    }

    #[test]
    fn test_falls_back_past_invalid_file() {
        let path = std::env::temp_dir().join(format!("ripple-kernel-{}.wgsl", std::process::id()));
        std::fs::write(&path, "fn broken( {").unwrap();
        let resolver = KernelResolver::with_overrides([path.clone()]);
        let kernel = resolver.resolve().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(kernel.origin(), "embedded");
    }

    #[test]
    fn test_failure_not_memoized() {
        let resolver = KernelResolver::new(vec![KernelSource::Embedded(TWO_STAGE)]);
        assert!(matches!(resolver.resolve(), Err(RippleError::KernelNotFound { .. })));
        assert!(!resolver.is_resolved());
        assert!(resolver.resolve().is_err());
    }

    #[test]
    fn test_no_candidates() {
        let resolver = KernelResolver::new(Vec::new());
        assert!(matches!(resolver.resolve(), Err(RippleError::NoKernelSource { tried: 0 })));
    }
}
