//! Places the screen textures on the window surface.
//!
//! The top screen sits above the bottom one, both centered horizontally.
//! With stereo on, the right-eye top screen is shown next to the left eye.
//! The arrangement is scaled uniformly to fit the surface.

use crate::device::ScreenTarget;

use super::pipeline::texture_bind_group_layout;

/// A viewport rectangle on the surface, in physical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(super) struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Viewports of every visible screen for a surface of the given size.
pub(super) fn screen_viewports(surface_width: u32, surface_height: u32, stereo: bool) -> Vec<(ScreenTarget, Viewport)> {
    let top_w = ScreenTarget::TOP_WIDTH as f32;
    let bottom_w = ScreenTarget::BOTTOM_WIDTH as f32;
    let screen_h = ScreenTarget::HEIGHT as f32;

    let layout_w = if stereo { 2.0 * top_w } else { top_w };
    let layout_h = 2.0 * screen_h;

    let (sw, sh) = (surface_width as f32, surface_height as f32);
    let scale = (sw / layout_w).min(sh / layout_h);
    if scale <= 0.0 {
        return Vec::new();
    }

    let ox = (sw - layout_w * scale) / 2.0;
    let oy = (sh - layout_h * scale) / 2.0;
    let rect = |x: f32, y: f32, w: f32| Viewport {
        x: ox + x * scale,
        y: oy + y * scale,
        width: w * scale,
        height: screen_h * scale,
    };

    let mut out = vec![(ScreenTarget::TopLeft, rect(0.0, 0.0, top_w))];
    if stereo {
        out.push((ScreenTarget::TopRight, rect(top_w, 0.0, top_w)));
    }
    out.push((ScreenTarget::Bottom, rect((layout_w - bottom_w) / 2.0, screen_h, bottom_w)));
    out
}

/// Maps a surface position onto bottom-screen pixels, if it lies on it.
pub(super) fn bottom_screen_point(
    surface_width: u32,
    surface_height: u32,
    stereo: bool,
    x: f32,
    y: f32,
) -> Option<(f32, f32)> {
    let (_, vp) = screen_viewports(surface_width, surface_height, stereo)
        .into_iter()
        .find(|(t, _)| *t == ScreenTarget::Bottom)?;

    let u = (x - vp.x) / vp.width;
    let v = (y - vp.y) / vp.height;
    if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
        return None;
    }
    Some((u * ScreenTarget::BOTTOM_WIDTH as f32, v * ScreenTarget::HEIGHT as f32))
}

/// Blit pipeline writing into the surface format.
pub(super) struct Compositor {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl Compositor {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessera composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let texture_layout = texture_bind_group_layout(device, "tessera composite bgl");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessera composite pipeline layout"),
            bind_group_layouts: &[&texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessera composite pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessera composite sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self { pipeline, texture_layout, sampler }
    }

    #[inline]
    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    #[inline]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Clears `view` to black and draws each screen into its viewport.
    pub fn draw<'a>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        screens: impl IntoIterator<Item = (&'a wgpu::BindGroup, Viewport)>,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessera composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        for (bind_group, vp) in screens {
            rpass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_size_stacks_top_over_bottom() {
        let v = screen_viewports(400, 480, false);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0], (ScreenTarget::TopLeft, Viewport { x: 0.0, y: 0.0, width: 400.0, height: 240.0 }));
        assert_eq!(v[1], (ScreenTarget::Bottom, Viewport { x: 40.0, y: 240.0, width: 320.0, height: 240.0 }));
    }

    #[test]
    fn stereo_puts_eyes_side_by_side() {
        let v = screen_viewports(800, 480, true);
        let targets: Vec<_> = v.iter().map(|(t, _)| *t).collect();
        assert_eq!(targets, vec![ScreenTarget::TopLeft, ScreenTarget::TopRight, ScreenTarget::Bottom]);
        assert_eq!(v[1].1.x, 400.0);
        assert_eq!(v[2].1.x, 240.0);
    }

    #[test]
    fn layout_scales_uniformly_and_centers() {
        // twice as large, with 100 spare pixels on each side
        let v = screen_viewports(1000, 960, false);
        assert_eq!(v[0].1, Viewport { x: 100.0, y: 0.0, width: 800.0, height: 480.0 });
        assert_eq!(v[1].1, Viewport { x: 180.0, y: 480.0, width: 640.0, height: 480.0 });
    }

    #[test]
    fn points_map_into_bottom_screen_pixels() {
        assert_eq!(bottom_screen_point(400, 480, false, 40.0, 240.0), Some((0.0, 0.0)));
        assert_eq!(bottom_screen_point(800, 960, false, 180.0, 580.0), Some((50.0, 50.0)));
        // on the top screen, or beside the bottom one
        assert_eq!(bottom_screen_point(400, 480, false, 100.0, 100.0), None);
        assert_eq!(bottom_screen_point(400, 480, false, 10.0, 300.0), None);
    }

    #[test]
    fn empty_surface_shows_nothing() {
        assert!(screen_viewports(0, 480, false).is_empty());
    }
}
