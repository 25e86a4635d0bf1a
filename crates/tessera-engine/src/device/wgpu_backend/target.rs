//! GPU-side storage for textures and render targets.

use crate::device::{GpuTexture, TextureWrap};
use crate::paint::Color;

use super::pipeline::{DEPTH_STENCIL_FORMAT, TARGET_FORMAT};

/// A sampled texture together with the bind group draws use to read it.
pub(super) struct TextureSlot {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
    pub render_target: bool,
}

impl TextureSlot {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
        render_target: bool,
        label: &str,
    ) -> Self {
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if render_target {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        Self { texture, view, bind_group, width, height, render_target }
    }

    /// Writes native ABGR words as RGBA bytes into the top-left
    /// `width` x `height` region.
    pub fn upload(&self, queue: &wgpu::Queue, texels: &[u32], width: u32, height: u32) {
        let width = width.min(self.width);
        let height = height.min(self.height);
        let needed = (width * height) as usize;
        if width == 0 || height == 0 || texels.len() < needed {
            log::warn!("texture upload skipped: {} words for {width}x{height}", texels.len());
            return;
        }

        let bytes: Vec<u8> = texels[..needed].iter().flat_map(|w| w.to_be_bytes()).collect();

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
    }
}

/// Where a target's color output goes.
pub(super) enum TargetColor {
    /// One of the fixed screens, owned by the target.
    Screen(TextureSlot),
    /// A texture from the texture table.
    Texture(GpuTexture),
}

pub(super) struct RenderTarget {
    pub color: TargetColor,
    pub depth_stencil: wgpu::TextureView,
    pub clear: Color,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, color: TargetColor, width: u32, height: u32) -> Self {
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessera target depth-stencil"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            color,
            depth_stencil: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            clear: Color::TRANSPARENT,
        }
    }
}

pub(super) fn create_sampler(device: &wgpu::Device, wrap: TextureWrap, filter: wgpu::FilterMode) -> wgpu::Sampler {
    let address = match wrap {
        TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("tessera sampler"),
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// Linear clear value for a packed color.
pub(super) fn clear_color(color: Color) -> wgpu::Color {
    let [r, g, b, a] = color.to_f32_array();
    wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 }
}
