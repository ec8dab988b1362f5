//! WebGPU ripple compositing pipeline
//!
//! Draws a fullscreen triangle that samples a host-provided source texture
//! through one of the kernel's fragment compositors.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::kernel::{RippleKernel, VERTEX_ENTRY_POINT};
use crate::compositor::{CompositorKind, RippleData};
use crate::config::{LuminousStyle, PrismaticStyle};
use crate::consts::MAX_PACKED_RIPPLES;
use crate::field::FrameUpdate;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct RippleGlobals {
    resolution: [f32; 2],       // offset 0
    ripple_count: u32,          // offset 8
    _pad0: u32,                 // offset 12
    wavelength: f32,            // offset 16
    speed: f32,                 // offset 20
    ring_width: f32,            // offset 24
    falloff_radius: f32,        // offset 28
    reference_amplitude: f32,   // offset 32
    max_sample_offset: f32,     // offset 36
    refraction_strength: f32,   // offset 40
    dispersion: f32,            // offset 44
    tint: [f32; 4],             // offset 48 (16-byte aligned for WGSL vec4)
    tint_strength: f32,         // offset 64
    glow_strength: f32,         // offset 68
    highlight_power: f32,       // offset 72
    highlight_boost: f32,       // offset 76
    glow_color: [f32; 4],       // offset 80, total 96
}

impl RippleGlobals {
    pub(crate) fn from_frame(frame: &FrameUpdate, prismatic: &PrismaticStyle, luminous: &LuminousStyle) -> Self {
        let wave = &frame.context.wave;
        let prismatic = prismatic.sanitized();
        let luminous = luminous.sanitized();
        let size = frame.context.size;
        Self {
            resolution: [size.x.max(1.0), size.y.max(1.0)],
            ripple_count: frame.packed.len().min(MAX_PACKED_RIPPLES) as u32,
            _pad0: 0,
            wavelength: wave.wavelength,
            speed: wave.speed,
            ring_width: wave.ring_width,
            falloff_radius: wave.falloff_radius,
            reference_amplitude: wave.reference_amplitude,
            max_sample_offset: frame.packed.max_sample_offset,
            refraction_strength: prismatic.refraction_strength,
            dispersion: prismatic.dispersion,
            tint: prismatic.tint,
            tint_strength: prismatic.tint_strength,
            glow_strength: luminous.glow_strength,
            highlight_power: luminous.highlight_power,
            highlight_boost: luminous.highlight_boost,
            glow_color: luminous.glow_color,
        }
    }
}

// ============================================================================
// RIPPLE PIPELINE
// ============================================================================

pub struct RipplePipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,

    // Uniform buffers
    globals_buffer: wgpu::Buffer,
    ripples_buffer: wgpu::Buffer,

    kind: CompositorKind,
    ripple_count: u32,
}

impl RipplePipeline {
    pub fn new(
        device: &wgpu::Device,
        kernel: &RippleKernel,
        kind: CompositorKind,
        source: &wgpu::TextureView,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        log::info!("Creating ripple pipeline ({}) from {} kernel", kind.as_str(), kernel.origin());
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ripple_kernel"),
            source: wgpu::ShaderSource::Wgsl(kernel.source().into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ripple_globals"),
            contents: bytemuck::bytes_of(&RippleGlobals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let ripples_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ripple_data"),
            size: (std::mem::size_of::<RippleData>() * MAX_PACKED_RIPPLES) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ripple_source_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ripple_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = Self::create_bind_group(
            device,
            &bind_group_layout,
            &globals_buffer,
            &ripples_buffer,
            source,
            &sampler,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ripple_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ripple_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY_POINT),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(kind.entry_point()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
            bind_group,
            sampler,
            globals_buffer,
            ripples_buffer,
            kind,
            ripple_count: 0,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        globals: &wgpu::Buffer,
        ripples: &wgpu::Buffer,
        source: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ripple_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ripples.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn kind(&self) -> CompositorKind {
        self.kind
    }

    /// Ripples uploaded by the last `update`
    pub fn ripple_count(&self) -> u32 {
        self.ripple_count
    }

    /// Point the pipeline at a new source texture (e.g. after a resize)
    pub fn set_source(&mut self, device: &wgpu::Device, source: &wgpu::TextureView) {
        self.bind_group = Self::create_bind_group(
            device,
            &self.bind_group_layout,
            &self.globals_buffer,
            &self.ripples_buffer,
            source,
            &self.sampler,
        );
    }

    /// Upload one frame's scalars and ripple buffer
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        frame: &FrameUpdate,
        prismatic: &PrismaticStyle,
        luminous: &LuminousStyle,
    ) {
        let globals = RippleGlobals::from_frame(frame, prismatic, luminous);
        self.ripple_count = globals.ripple_count;
        self.queue_write(queue, &globals, &frame.packed.padded());
    }

    fn queue_write(&self, queue: &wgpu::Queue, globals: &RippleGlobals, ripples: &[RippleData]) {
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(globals));
        queue.write_buffer(&self.ripples_buffer, 0, bytemuck::cast_slice(ripples));
    }

    /// Record the compositing pass into `encoder`
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ripple_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }
}
