//! Two-pass stencil outline protocol.
//!
//! Pass one stamps the silhouette of everything drawn into the stencil buffer;
//! pass two redraws the same shapes inflated and only the fringe outside the
//! stamp survives the stencil test.

use crate::device::{AlphaTest, StencilTest};
use crate::paint::Color;

/// Stencil value written by the silhouette pass.
pub const OUTLINE_STAMP: u8 = 1;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum OutlinePhase {
    #[default]
    Normal,
    /// Silhouette pass: draws stamp the stencil buffer.
    Armed,
    /// Fringe pass: draws are inflated and masked by the stamp.
    Active,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OutlineState {
    pub phase: OutlinePhase,
    /// Extra scale added to both sprite axes in the fringe pass.
    pub thickness: f32,
    pub color: Color,
}

impl Default for OutlineState {
    fn default() -> Self {
        Self {
            phase: OutlinePhase::Normal,
            thickness: 0.0,
            color: Color::BLACK,
        }
    }
}

/// Fixed-function state for one phase.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OutlineTests {
    pub stencil: StencilTest,
    pub alpha: AlphaTest,
}

impl OutlineState {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == OutlinePhase::Active
    }

    /// Normal -> Armed.
    pub fn begin(&mut self) -> OutlineTests {
        if self.phase != OutlinePhase::Normal {
            log::warn!("outline begin called in phase {:?}", self.phase);
        }
        self.phase = OutlinePhase::Armed;
        OutlineTests {
            stencil: StencilTest::stamp(OUTLINE_STAMP),
            // fully transparent texels must not stamp
            alpha: AlphaTest::greater_than(0),
        }
    }

    /// Armed -> Active. `thickness` is a percentage of the sprite size.
    pub fn apply(&mut self, color: Color, thickness: f32) -> OutlineTests {
        if self.phase != OutlinePhase::Armed {
            log::warn!("outline apply called in phase {:?}", self.phase);
        }
        self.phase = OutlinePhase::Active;
        self.thickness = thickness / 100.0;
        self.color = color;
        OutlineTests {
            stencil: StencilTest::outside(OUTLINE_STAMP),
            alpha: AlphaTest::DISABLED,
        }
    }

    /// Active -> Normal.
    pub fn end(&mut self) -> OutlineTests {
        if self.phase != OutlinePhase::Active {
            log::warn!("outline end called in phase {:?}", self.phase);
        }
        self.phase = OutlinePhase::Normal;
        OutlineTests {
            stencil: StencilTest::DISABLED,
            alpha: AlphaTest::DISABLED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CompareFunc;

    #[test]
    fn full_cycle_walks_three_phases() {
        let mut s = OutlineState::default();

        let armed = s.begin();
        assert_eq!(s.phase, OutlinePhase::Armed);
        assert_eq!(armed.stencil.compare, CompareFunc::Always);
        assert_eq!(armed.stencil.write_mask, 0xFF);
        assert!(armed.alpha.enabled);

        let active = s.apply(Color::WHITE, 10.0);
        assert!(s.is_active());
        assert_eq!(active.stencil.compare, CompareFunc::NotEqual);
        assert_eq!(active.stencil.write_mask, 0);
        assert!(!active.alpha.enabled);
        assert!((s.thickness - 0.1).abs() < 1e-6);

        let normal = s.end();
        assert_eq!(s.phase, OutlinePhase::Normal);
        assert!(!normal.stencil.enabled);
    }

    #[test]
    fn out_of_order_calls_still_transition() {
        let mut s = OutlineState::default();
        s.apply(Color::BLACK, 5.0);
        assert!(s.is_active());
        s.end();
        s.end();
        assert_eq!(s.phase, OutlinePhase::Normal);
    }
}
