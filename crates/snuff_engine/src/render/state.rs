//! Fixed-function pass state
//!
//! Blend, depth and cull settings a pass applies before drawing. The types
//! are plain data so effect loaders can deserialize them straight from a
//! technique description.

use serde::{Deserialize, Serialize};

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendOp {
    /// `src + dst`
    Add,
    /// `src - dst`
    Subtract,
    /// `dst - src`
    ReverseSubtract,
    /// Component-wise minimum
    Min,
    /// Component-wise maximum
    Max,
}

/// Blend factor applied to the source or destination colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum BlendFactor {
    One,
    Zero,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    SrcColor,
    InvSrcColor,
    DestColor,
    InvDestColor,
    ConstantColor,
    InvConstantColor,
    ConstantAlpha,
    InvConstantAlpha,
}

bitflags::bitflags! {
    /// Colour channels written by a pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ColorMask: u8 {
        /// Red channel
        const RED = 1 << 0;
        /// Green channel
        const GREEN = 1 << 1;
        /// Blue channel
        const BLUE = 1 << 2;
        /// Alpha channel
        const ALPHA = 1 << 3;
        /// Every channel
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blend configuration of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendState {
    /// Whether blending is enabled at all
    pub enabled: bool,
    /// Source factor
    pub src_factor: BlendFactor,
    /// Destination factor
    pub dst_factor: BlendFactor,
    /// Blend equation
    pub op: BlendOp,
    /// Channels written
    pub color_mask: ColorMask,
}

impl BlendState {
    /// Blending disabled, source replaces destination
    pub const OPAQUE: Self = Self {
        enabled: false,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        op: BlendOp::Add,
        color_mask: ColorMask::ALL,
    };

    /// Classic `src * a + dst * (1 - a)`
    pub const ALPHA: Self = Self {
        enabled: true,
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::InvSrcAlpha,
        op: BlendOp::Add,
        color_mask: ColorMask::ALL,
    };

    /// `src + dst`, for particles and light accumulation
    pub const ADDITIVE: Self = Self {
        enabled: true,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::One,
        op: BlendOp::Add,
        color_mask: ColorMask::ALL,
    };
}

impl Default for BlendState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum CompareFunc {
    Never,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Always,
}

/// Depth test configuration of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthState {
    /// Whether the depth test runs
    pub enabled: bool,
    /// Whether passing fragments write depth
    pub write_enabled: bool,
    /// Comparison against the stored depth
    pub compare: CompareFunc,
}

impl DepthState {
    /// Test and write, nearer fragments win
    pub const DEFAULT: Self = Self {
        enabled: true,
        write_enabled: true,
        compare: CompareFunc::Less,
    };

    /// No depth testing
    pub const NONE: Self = Self {
        enabled: false,
        write_enabled: false,
        compare: CompareFunc::Always,
    };
}

impl Default for DepthState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Face culling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    #[default]
    Back,
    /// Cull every polygon, only points and lines survive
    Both,
}

/// Complete fixed-function state of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassState {
    /// Blending
    pub blend: BlendState,
    /// Depth testing
    pub depth: DepthState,
    /// Face culling
    pub cull: CullMode,
}

impl PassState {
    /// Builder: replace blending
    pub fn with_blend(mut self, blend: BlendState) -> Self {
        self.blend = blend;
        self
    }

    /// Builder: replace depth testing
    pub fn with_depth(mut self, depth: DepthState) -> Self {
        self.depth = depth;
        self
    }

    /// Builder: replace culling
    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }
}
