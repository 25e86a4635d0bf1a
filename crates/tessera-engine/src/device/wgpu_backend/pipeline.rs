//! Draw pipelines, the per-draw uniform block and their bind group layouts.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::coords::Mat4;
use crate::device::{AlphaTest, BlendMode, CompareFunc, StencilTest, Topology};
use crate::paint::Color;
use crate::render::Vertex;

/// Color format of every render target (screens and texture targets).
pub(super) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub(super) const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Distance between two uniform blocks in the uniform buffer. 256 is the
/// largest `min_uniform_buffer_offset_alignment` wgpu allows.
pub(super) const UNIFORM_STRIDE: u64 = 256;

// ── uniform ───────────────────────────────────────────────────────────────

const MODE_TEXTURE: u32 = 0;
const MODE_TINT: u32 = 1;
const MODE_FLAT: u32 = 2;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct DrawUniform {
    pub projection: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub mode: u32,
    pub alpha_func: u32,
    pub alpha_ref: f32,
    pub _pad: u32,
}

impl DrawUniform {
    pub fn new(projection: &Mat4, mode: BlendMode, color: Color, alpha: AlphaTest) -> Self {
        let mode = match mode {
            BlendMode::TintTexture => MODE_TINT,
            BlendMode::FlatColor => MODE_FLAT,
            BlendMode::TextureReplace | BlendMode::Off => MODE_TEXTURE,
        };
        Self {
            projection: projection.to_cols_array_2d(),
            color: color.to_f32_array(),
            mode,
            alpha_func: if alpha.enabled { compare_code(alpha.compare) } else { 0 },
            alpha_ref: alpha.reference as f32,
            _pad: 0,
        }
    }
}

/// Comparison codes understood by `draw.wgsl`; 0 means "no test".
fn compare_code(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Never => 1,
        CompareFunc::Always => 2,
        CompareFunc::Equal => 3,
        CompareFunc::NotEqual => 4,
        CompareFunc::Less => 5,
        CompareFunc::LessEqual => 6,
        CompareFunc::Greater => 7,
        CompareFunc::GreaterEqual => 8,
    }
}

// ── pipeline key ──────────────────────────────────────────────────────────

/// Stencil configuration minus the reference, which is set per draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct StencilKey {
    pub enabled: bool,
    pub compare: CompareFunc,
    pub read_mask: u8,
    pub write_mask: u8,
}

impl From<StencilTest> for StencilKey {
    fn from(t: StencilTest) -> Self {
        if !t.enabled {
            return Self { enabled: false, compare: CompareFunc::Always, read_mask: 0, write_mask: 0 };
        }
        Self { enabled: true, compare: t.compare, read_mask: t.read_mask, write_mask: t.write_mask }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct PipelineKey {
    pub format: wgpu::TextureFormat,
    pub topology: Topology,
    pub stencil: StencilKey,
}

fn compare_function(func: CompareFunc) -> wgpu::CompareFunction {
    match func {
        CompareFunc::Never => wgpu::CompareFunction::Never,
        CompareFunc::Always => wgpu::CompareFunction::Always,
        CompareFunc::Equal => wgpu::CompareFunction::Equal,
        CompareFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunc::Less => wgpu::CompareFunction::Less,
        CompareFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunc::Greater => wgpu::CompareFunction::Greater,
        CompareFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
    }
}

fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

fn stencil_state(key: StencilKey) -> wgpu::StencilState {
    if !key.enabled {
        return wgpu::StencilState::default();
    }
    let face = wgpu::StencilFaceState {
        compare: compare_function(key.compare),
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Replace,
    };
    wgpu::StencilState {
        front: face,
        back: face,
        read_mask: key.read_mask as u32,
        write_mask: key.write_mask as u32,
    }
}

/// Straight alpha blending, as the fixed-function combiner does it.
fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── pipelines ─────────────────────────────────────────────────────────────

/// Shader, layouts and a lazily filled pipeline cache.
pub(super) struct DrawPipelines {
    shader: wgpu::ShaderModule,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl DrawPipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessera draw shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/draw.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera draw uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                },
                count: None,
            }],
        });

        let texture_layout = texture_bind_group_layout(device, "tessera draw texture bgl");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessera draw pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        Self { shader, uniform_layout, texture_layout, layout, cache: HashMap::new() }
    }

    #[inline]
    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    #[inline]
    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Builds the pipeline for `key` unless it is cached already.
    pub fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.cache.contains_key(&key) {
            return;
        }
        log::debug!("creating draw pipeline {key:?}");

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessera draw pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: primitive_topology(key.topology),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_STENCIL_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: stencil_state(key.stencil),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.cache.insert(key, pipeline);
    }

    #[inline]
    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(key)
    }
}

/// `texture_2d<f32>` at binding 0 plus its sampler at binding 1.
pub(super) fn texture_bind_group_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_fits_one_stride() {
        assert_eq!(std::mem::size_of::<DrawUniform>(), 96);
        assert!(std::mem::size_of::<DrawUniform>() as u64 <= UNIFORM_STRIDE);
    }

    #[test]
    fn modes_map_to_shader_codes() {
        let p = Mat4::IDENTITY;
        let off = AlphaTest::DISABLED;
        assert_eq!(DrawUniform::new(&p, BlendMode::TextureReplace, Color::WHITE, off).mode, MODE_TEXTURE);
        assert_eq!(DrawUniform::new(&p, BlendMode::TintTexture, Color::WHITE, off).mode, MODE_TINT);
        assert_eq!(DrawUniform::new(&p, BlendMode::FlatColor, Color::WHITE, off).mode, MODE_FLAT);
    }

    #[test]
    fn alpha_test_is_encoded_only_when_enabled() {
        let p = Mat4::IDENTITY;
        let u = DrawUniform::new(&p, BlendMode::TextureReplace, Color::WHITE, AlphaTest::greater_than(0x20));
        assert_eq!(u.alpha_func, 7);
        assert_eq!(u.alpha_ref, 32.0);

        let u = DrawUniform::new(&p, BlendMode::TextureReplace, Color::WHITE, AlphaTest::DISABLED);
        assert_eq!(u.alpha_func, 0);
    }

    #[test]
    fn color_is_normalized() {
        let u = DrawUniform::new(&Mat4::IDENTITY, BlendMode::FlatColor, Color::rgba(255, 0, 51, 255), AlphaTest::DISABLED);
        assert_eq!(u.color, [1.0, 0.0, 0.2, 1.0]);
    }

    #[test]
    fn disabled_stencils_share_one_key() {
        let a = StencilKey::from(StencilTest::DISABLED);
        let b = StencilKey::from(StencilTest { enabled: false, ..StencilTest::outside(1) });
        assert_eq!(a, b);
        assert_ne!(StencilKey::from(StencilTest::stamp(1)), StencilKey::from(StencilTest::outside(1)));
    }

    #[test]
    fn stamp_writes_and_outside_only_reads() {
        let stamp = stencil_state(StencilTest::stamp(1).into());
        assert_eq!(stamp.front.compare, wgpu::CompareFunction::Always);
        assert_eq!(stamp.write_mask, 0xFF);

        let outside = stencil_state(StencilTest::outside(1).into());
        assert_eq!(outside.front.compare, wgpu::CompareFunction::NotEqual);
        assert_eq!(outside.write_mask, 0);
        assert!(!stencil_state(StencilTest::DISABLED.into()).is_enabled());
    }
}
