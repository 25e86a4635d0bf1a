use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::device::{GpuBackend, GpuTexture, TargetId, TextureDesc};

use super::{decode, DecodedImage, TextureError};

/// Smallest stored texture edge.
pub const MIN_TEXTURE_SIZE: u32 = 64;

/// Largest image edge the registry accepts. Backends may allow less.
pub const MAX_TEXTURE_SIZE: u32 = 1 << 15;

/// Rounds `v` up to a power of two, at least [`MIN_TEXTURE_SIZE`].
/// Saturates at 2^31.
#[inline]
pub fn padded_size(v: u32) -> u32 {
    v.min(1 << 31).next_power_of_two().max(MIN_TEXTURE_SIZE)
}

/// Checks an image size and returns its padded storage size.
fn stored_size(width: u32, height: u32) -> Result<(u32, u32), TextureError> {
    if width == 0 || height == 0 || width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
        return Err(TextureError::InvalidSize { width, height });
    }
    Ok((padded_size(width), padded_size(height)))
}

/// Byte length of a `width` x `height` RGBA8 buffer, `None` on overflow.
#[inline]
fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

/// Converts straight RGBA8 pixels to native ABGR words inside a
/// `padded_w` x `padded_h` canvas. Padding texels are transparent black.
pub fn to_native_texels(
    width: u32,
    height: u32,
    rgba: &[u8],
    padded_w: u32,
    padded_h: u32,
) -> Vec<u32> {
    debug_assert!(width <= padded_w && height <= padded_h);
    let mut out = vec![0u32; padded_w as usize * padded_h as usize];
    if width == 0 || height == 0 {
        return out;
    }
    let row_bytes = width as usize * 4;

    for (y, src_row) in rgba.chunks_exact(row_bytes).take(height as usize).enumerate() {
        let dst_row = &mut out[y * padded_w as usize..][..width as usize];
        for (dst, px) in dst_row.iter_mut().zip(src_row.chunks_exact(4)) {
            *dst = u32::from_le_bytes([px[0], px[1], px[2], px[3]]).swap_bytes();
        }
    }
    out
}

// ── handles ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct TextureShared {
    /// 0 once destroyed.
    uid: AtomicU32,
    ref_count: AtomicU32,
    gpu: GpuTexture,
    /// Stored (padded) size.
    width: u32,
    height: u32,
    /// Size of the source image inside the stored texture.
    image_width: u32,
    image_height: u32,
}

/// Shared handle to a registry texture.
///
/// Cloning the handle does not touch the reference count; the count tracks
/// *users* (sprites, the glyph cache) and is adjusted with
/// [`retain`](Self::retain) / [`release`](Self::release) or a
/// [`TextureLease`]. Every operation on an invalid handle is a no-op.
#[derive(Debug, Clone, Default)]
pub struct TextureRef(Option<Arc<TextureShared>>);

impl TextureRef {
    /// The null texture (identity 0).
    pub const fn invalid() -> Self {
        TextureRef(None)
    }

    /// Stable identity, or 0 for a null or destroyed texture.
    pub fn uid(&self) -> u32 {
        self.0.as_ref().map_or(0, |s| s.uid.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.uid() != 0
    }

    pub fn ref_count(&self) -> u32 {
        self.0.as_ref().map_or(0, |s| s.ref_count.load(Ordering::SeqCst))
    }

    pub fn retain(&self) {
        if let Some(s) = self.live() {
            s.ref_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Decrements the count, never below zero.
    pub fn release(&self) {
        if let Some(s) = self.live() {
            let _ = s
                .ref_count
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1));
        }
    }

    /// Retains the texture for as long as the returned lease lives.
    pub fn lease(&self) -> TextureLease {
        self.retain();
        TextureLease(self.clone())
    }

    /// Stored size `(width, height)`, power-of-two padded.
    pub fn size(&self) -> (u32, u32) {
        self.0.as_ref().map_or((0, 0), |s| (s.width, s.height))
    }

    /// Size of the image that was uploaded into the texture.
    pub fn image_size(&self) -> (u32, u32) {
        self.0.as_ref().map_or((0, 0), |s| (s.image_width, s.image_height))
    }

    /// Backend handle, if the texture is still alive.
    pub fn gpu(&self) -> Option<GpuTexture> {
        self.live().map(|s| s.gpu)
    }

    fn live(&self) -> Option<&TextureShared> {
        self.0.as_deref().filter(|s| s.uid.load(Ordering::SeqCst) != 0)
    }
}

impl PartialEq for TextureRef {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// A counted use of a texture; releases it on drop.
#[derive(Debug)]
pub struct TextureLease(TextureRef);

impl TextureLease {
    #[inline]
    pub fn texture(&self) -> &TextureRef {
        &self.0
    }
}

impl Drop for TextureLease {
    fn drop(&mut self) {
        self.0.release();
    }
}

// ── registry ──────────────────────────────────────────────────────────────

/// Owns every texture the renderer created.
#[derive(Debug)]
pub struct TextureRegistry {
    next_uid: u32,
    live: HashMap<u32, TextureRef>,
    targets: HashMap<u32, TargetId>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self {
            next_uid: 1,
            live: HashMap::new(),
            targets: HashMap::new(),
        }
    }

    /// Number of textures not yet destroyed.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Render target attached to `texture`, if it was created as one.
    pub fn target_of(&self, texture: &TextureRef) -> Option<TargetId> {
        self.targets.get(&texture.uid()).copied()
    }

    /// Drops the render target of `texture`, leaving a sample-only texture.
    pub fn detach_target<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, texture: &TextureRef) {
        if let Some(target) = self.targets.remove(&texture.uid()) {
            gpu.delete_target(target);
        }
    }

    /// Uploads straight RGBA8 pixels into a new power-of-two texture.
    pub fn load<B: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureRef, TextureError> {
        let (pw, ph) = stored_size(width, height)?;
        if rgba_len(width, height) != Some(rgba.len()) {
            return Err(TextureError::InvalidSize { width, height });
        }

        let texture = gpu.create_texture(&TextureDesc::sampled(pw, ph))?;
        gpu.upload_texture(texture, &to_native_texels(width, height, rgba, pw, ph), pw, ph);

        Ok(self.register(texture, (pw, ph), (width, height)))
    }

    pub fn load_image<B: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        image: &DecodedImage,
    ) -> Result<TextureRef, TextureError> {
        self.load(gpu, image.width, image.height, &image.pixels)
    }

    /// Decodes `bytes` and uploads the result.
    pub fn load_encoded<B: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        bytes: &[u8],
    ) -> Result<TextureRef, TextureError> {
        let image = decode(bytes)?;
        self.load_image(gpu, &image)
    }

    pub fn load_file<B: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        path: &Path,
    ) -> Result<TextureRef, TextureError> {
        let bytes = std::fs::read(path)?;
        self.load_encoded(gpu, &bytes)
    }

    /// Allocates a cleared texture that can be drawn into.
    pub fn create_render_texture<B: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut B,
        width: u32,
        height: u32,
    ) -> Result<(TextureRef, TargetId), TextureError> {
        let (pw, ph) = stored_size(width, height)?;
        let texture = gpu.create_texture(&TextureDesc::render_target(pw, ph))?;
        let target = match gpu.create_texture_target(texture) {
            Ok(t) => t,
            Err(e) => {
                gpu.delete_texture(texture);
                return Err(e.into());
            }
        };

        let tex = self.register(texture, (pw, ph), (pw, ph));
        self.targets.insert(tex.uid(), target);
        Ok((tex, target))
    }

    /// Frees `texture` if nothing references it.
    ///
    /// While the reference count is non-zero this is a silent no-op, so it is
    /// always safe to call speculatively. Returns whether the texture was
    /// freed.
    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, texture: &TextureRef) -> bool {
        let uid = texture.uid();
        if uid == 0 {
            return false;
        }
        let count = texture.ref_count();
        if count > 0 {
            log::debug!("texture {uid} still referenced {count} time(s); destroy ignored");
            return false;
        }
        self.free(gpu, uid);
        true
    }

    /// Frees every remaining texture, referenced or not.
    pub fn destroy_all<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B) {
        let uids: Vec<u32> = self.live.keys().copied().collect();
        for uid in uids {
            self.free(gpu, uid);
        }
    }

    fn register(&mut self, gpu: GpuTexture, stored: (u32, u32), image: (u32, u32)) -> TextureRef {
        let uid = self.next_uid;
        self.next_uid += 1;

        let tex = TextureRef(Some(Arc::new(TextureShared {
            uid: AtomicU32::new(uid),
            ref_count: AtomicU32::new(0),
            gpu,
            width: stored.0,
            height: stored.1,
            image_width: image.0,
            image_height: image.1,
        })));
        self.live.insert(uid, tex.clone());
        log::debug!("texture {uid} created ({}x{})", stored.0, stored.1);
        tex
    }

    fn free<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, uid: u32) {
        let Some(tex) = self.live.remove(&uid) else { return };
        let Some(shared) = tex.0.as_ref() else { return };

        if let Some(target) = self.targets.remove(&uid) {
            gpu.delete_target(target);
        }
        gpu.delete_texture(shared.gpu);
        shared.uid.store(0, Ordering::SeqCst);
        log::debug!("texture {uid} destroyed");
    }
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessBackend;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
        px.repeat((w * h) as usize)
    }

    // ── sizing & texels ───────────────────────────────────────────────────

    #[test]
    fn padded_size_rounds_up_with_floor() {
        assert_eq!(padded_size(1), 64);
        assert_eq!(padded_size(64), 64);
        assert_eq!(padded_size(65), 128);
        assert_eq!(padded_size(400), 512);
        assert_eq!(padded_size(u32::MAX), 1 << 31);
    }

    #[test]
    fn huge_dimensions_are_rejected() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();

        for (w, h) in [(70_000, 70_000), (u32::MAX, 1), (1, MAX_TEXTURE_SIZE + 1)] {
            assert!(matches!(
                reg.load(&mut gpu, w, h, &[]),
                Err(TextureError::InvalidSize { .. })
            ));
            assert!(matches!(
                reg.create_render_texture(&mut gpu, w, h),
                Err(TextureError::InvalidSize { .. })
            ));
        }
        // 65536 * 65536 * 4 wraps to 0 in u32
        assert!(reg.load(&mut gpu, 1 << 16, 1 << 16, &[]).is_err());
        assert!(reg.is_empty());
        assert!(gpu.calls().is_empty());
    }

    #[test]
    fn texels_are_byte_swapped() {
        let words = to_native_texels(1, 1, &[0x11, 0x22, 0x33, 0x44], 1, 1);
        assert_eq!(words[0].to_le_bytes(), [0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn rows_land_on_padded_stride() {
        let mut rgba = solid(2, 2, [1, 2, 3, 4]);
        rgba[8..].copy_from_slice(&[9, 9, 9, 9, 9, 9, 9, 9]);
        let words = to_native_texels(2, 2, &rgba, 4, 4);
        assert_ne!(words[0], 0);
        assert_eq!(words[2], 0);
        assert_eq!(words[4].to_le_bytes(), [9, 9, 9, 9]);
    }

    // ── load ──────────────────────────────────────────────────────────────

    #[test]
    fn load_pads_and_assigns_increasing_ids() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();

        let a = reg.load(&mut gpu, 40, 70, &solid(40, 70, [255; 4])).unwrap();
        let b = reg.load(&mut gpu, 8, 8, &solid(8, 8, [255; 4])).unwrap();

        assert_eq!(a.size(), (64, 128));
        assert_eq!(a.image_size(), (40, 70));
        assert!(b.uid() > a.uid());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();
        let err = reg.load(&mut gpu, 4, 4, &[0; 10]).unwrap_err();
        assert!(matches!(err, TextureError::InvalidSize { .. }));
        assert_eq!(gpu.live_textures(), 0);
    }

    #[test]
    fn bad_bytes_surface_a_decode_error() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();
        let err = reg.load_encoded(&mut gpu, b"nope").unwrap_err();
        assert!(matches!(err, TextureError::Decode(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn allocation_failure_surfaces_backend_error() {
        let mut gpu = HeadlessBackend::new().with_max_texture_size(64);
        let mut reg = TextureRegistry::new();
        let err = reg.load(&mut gpu, 100, 10, &solid(100, 10, [0; 4])).unwrap_err();
        assert!(matches!(err, TextureError::Backend(_)));
    }

    // ── reference counting ────────────────────────────────────────────────

    #[test]
    fn destroy_waits_for_every_release() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();
        let tex = reg.load(&mut gpu, 8, 8, &solid(8, 8, [255; 4])).unwrap();

        let leases: Vec<_> = (0..3).map(|_| tex.lease()).collect();
        assert_eq!(tex.ref_count(), 3);

        let mut leases = leases.into_iter();
        for remaining in (0..3).rev() {
            assert!(!reg.destroy(&mut gpu, &tex));
            assert!(tex.is_valid());
            drop(leases.next());
            assert_eq!(tex.ref_count(), remaining);
        }

        assert!(reg.destroy(&mut gpu, &tex));
        assert_eq!(tex.uid(), 0);
        assert_eq!(gpu.live_textures(), 0);
    }

    #[test]
    fn invalid_handles_are_inert() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();
        let null = TextureRef::invalid();

        null.retain();
        null.release();
        assert_eq!(null.ref_count(), 0);
        assert!(!reg.destroy(&mut gpu, &null));
        assert!(null.gpu().is_none());
    }

    #[test]
    fn destroyed_texture_ignores_further_calls() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();
        let tex = reg.load(&mut gpu, 8, 8, &solid(8, 8, [255; 4])).unwrap();
        assert!(reg.destroy(&mut gpu, &tex));

        tex.retain();
        assert_eq!(tex.ref_count(), 0);
        assert!(!reg.destroy(&mut gpu, &tex));
    }

    #[test]
    fn release_saturates_at_zero() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();
        let tex = reg.load(&mut gpu, 8, 8, &solid(8, 8, [255; 4])).unwrap();
        tex.release();
        assert_eq!(tex.ref_count(), 0);
    }

    // ── render textures ───────────────────────────────────────────────────

    #[test]
    fn render_texture_gets_a_target_that_dies_with_it() {
        let mut gpu = HeadlessBackend::new();
        let mut reg = TextureRegistry::new();
        let (tex, target) = reg.create_render_texture(&mut gpu, 100, 30).unwrap();

        assert_eq!(tex.size(), (128, 64));
        assert_eq!(reg.target_of(&tex), Some(target));
        reg.destroy(&mut gpu, &tex);
        assert!(gpu
            .calls()
            .iter()
            .any(|c| *c == crate::device::BackendCall::DeleteTarget(target)));
    }
}
