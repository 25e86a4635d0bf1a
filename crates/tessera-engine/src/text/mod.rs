//! System font text: UTF-8 decoding, glyph atlas, layout, measure and draw.
//!
//! ASCII glyphs are drawn from one atlas texture built at startup; any other
//! codepoint is drawn straight from the font's source sheets.

mod atlas;
mod draw;
mod font;
mod fontdue_font;
mod layout;
mod system;
mod utf8;

#[cfg(test)]
pub(crate) mod test_font;

pub use atlas::{Glyph, GlyphAtlas, ATLAS_COLUMNS, ATLAS_ROWS, CACHED_GLYPHS};
pub use font::{
    CharWidthInfo, FontError, FontInfo, GlyphPos, SystemFont, REFERENCE_CODEPOINT,
    REFERENCE_WIDTH,
};
pub use fontdue_font::{default_charset, FontConfig, FontdueSystemFont, SYSTEM_FONT_PATHS};
pub use layout::{LayoutStyle, LayoutWalker, PlacedGlyph};
pub use system::SystemText;
pub use utf8::decode_one;
