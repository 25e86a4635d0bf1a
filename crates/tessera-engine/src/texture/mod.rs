//! Texture registry and the image decode boundary.
//!
//! Textures are shared between sprites through reference-counted handles.
//! Destruction is a request honored only once nothing references the texture.

mod decode;
mod error;
mod registry;

pub use decode::{decode, DecodedImage};
pub use error::{DecodeError, TextureError};
pub use registry::{
    padded_size, to_native_texels, TextureLease, TextureRef, TextureRegistry, MAX_TEXTURE_SIZE, MIN_TEXTURE_SIZE,
};
