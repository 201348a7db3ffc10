//! HDR-to-LDR tone mapping.
//!
//! [`ImageBuffer::apply_tone_mapping`] runs one of the built-in curves
//! over every pixel and produces a new 8-bit buffer; the source is left
//! untouched and may be in any domain (fixed-point sources are decoded
//! through float first). Custom curves plug in through
//! [`ImageBuffer::apply_tone_mapping_with`].
//!
//! The built-in operators are the usual suspects from real-time
//! rendering: Reinhard, Hejl-Richard, Hable's Uncharted 2 filmic curve,
//! Narkowicz's ACES fit and Uchimura's Gran Turismo curve, plus plain
//! gamma correction. All except Hejl-Richard (whose fit bakes the gamma
//! in) finish with a 1/2.2 gamma encode.

use alloc::rc::Rc;

use libm::{expf, powf};
use rgb::{Rgb, Rgba};

use crate::buffer::ImageBuffer;
use crate::error::BufferError;
use crate::value::float_to_ldr;

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Built-in tone mapping operator.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToneMapping {
    /// Clamp and encode with gamma 1/2.2. No range compression.
    GammaCorrection,
    /// Reinhard `x / (1 + x)` per channel, then gamma.
    Reinhard,
    /// Hejl & Burgess-Dawson's filmic fit. Gamma is baked into the fit.
    HejlRichard,
    /// Hable's Uncharted 2 filmic curve with white point 11.2, then
    /// gamma.
    Uncharted,
    /// Narkowicz's ACES approximation, then gamma.
    Aces,
    /// Uchimura's Gran Turismo curve, then gamma.
    GranTurismo,
}

impl ToneMapping {
    /// Canonical snake_case name, accepted by [`tone_mapping_from_name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GammaCorrection => "gamma_correction",
            Self::Reinhard => "reinhard",
            Self::HejlRichard => "hejl_richard",
            Self::Uncharted => "uncharted",
            Self::Aces => "aces",
            Self::GranTurismo => "gran_turismo",
        }
    }

    /// Map one linear color to its 8-bit tone mapped result.
    #[must_use]
    pub fn map(self, color: Rgb<f32>) -> Rgb<u8> {
        let mapped = match self {
            Self::GammaCorrection => color,
            Self::Reinhard => per_channel(color, reinhard),
            Self::HejlRichard => per_channel(color, hejl_richard),
            Self::Uncharted => per_channel(color, uncharted),
            Self::Aces => per_channel(color, aces),
            Self::GranTurismo => per_channel(color, gran_turismo),
        };
        let encoded = match self {
            // The Hejl-Richard fit already produces gamma space.
            Self::HejlRichard => mapped,
            _ => per_channel(mapped, gamma_encode),
        };
        Rgb {
            r: float_to_ldr(encoded.r),
            g: float_to_ldr(encoded.g),
            b: float_to_ldr(encoded.b),
        }
    }
}

/// Look up an operator by its snake_case name, ASCII case-insensitive.
///
/// Recognized names: `gamma_correction`, `reinhard`, `hejl_richard`,
/// `uncharted`, `aces`, `gran_turismo`.
#[must_use]
pub fn tone_mapping_from_name(name: &str) -> Option<ToneMapping> {
    const ALL: [ToneMapping; 6] = [
        ToneMapping::GammaCorrection,
        ToneMapping::Reinhard,
        ToneMapping::HejlRichard,
        ToneMapping::Uncharted,
        ToneMapping::Aces,
        ToneMapping::GranTurismo,
    ];
    ALL.into_iter().find(|m| m.name().eq_ignore_ascii_case(name))
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

const GAMMA: f32 = 2.2;

fn per_channel(c: Rgb<f32>, f: impl Fn(f32) -> f32) -> Rgb<f32> {
    Rgb { r: f(c.r), g: f(c.g), b: f(c.b) }
}

fn gamma_encode(x: f32) -> f32 {
    powf(x.max(0.0), 1.0 / GAMMA)
}

fn reinhard(x: f32) -> f32 {
    x / (1.0 + x)
}

fn hejl_richard(c: f32) -> f32 {
    let x = (c - 0.004).max(0.0);
    (x * (6.2 * x + 0.5)) / (x * (6.2 * x + 1.7) + 0.06)
}

// Hable's partial curve with his published constants.
fn hable(x: f32) -> f32 {
    const A: f32 = 0.15;
    const B: f32 = 0.50;
    const C: f32 = 0.10;
    const D: f32 = 0.20;
    const E: f32 = 0.02;
    const F: f32 = 0.30;
    ((x * (A * x + C * B) + D * E) / (x * (A * x + B) + D * F)) - E / F
}

fn uncharted(x: f32) -> f32 {
    const EXPOSURE_BIAS: f32 = 2.0;
    const WHITE: f32 = 11.2;
    hable(EXPOSURE_BIAS * x) / hable(WHITE)
}

fn aces(x: f32) -> f32 {
    (x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// Uchimura's curve with the Gran Turismo presentation defaults:
// peak 1, slope 1, linear start 0.22, linear length 0.4, black 1.33.
fn gran_turismo(x: f32) -> f32 {
    const P: f32 = 1.0;
    const A: f32 = 1.0;
    const M: f32 = 0.22;
    const L: f32 = 0.4;
    const C: f32 = 1.33;
    const B: f32 = 0.0;

    let l0 = ((P - M) * L) / A;
    let s0 = M + l0;
    let s1 = M + A * l0;
    let c2 = (A * P) / (P - s1);
    let cp = -c2 / P;

    let w0 = 1.0 - smoothstep(0.0, M, x);
    let w2 = if x < M + l0 { 0.0 } else { 1.0 };
    let w1 = 1.0 - w0 - w2;

    let toe = M * powf(x / M, C) + B;
    let shoulder = P - (P - s1) * expf(cp * (x - s0));
    let linear = M + A * (x - M);

    toe * w0 + linear * w1 + shoulder * w2
}

// ---------------------------------------------------------------------------
// Buffer application
// ---------------------------------------------------------------------------

impl ImageBuffer {
    /// Tone map into a new 8-bit buffer with a built-in operator.
    ///
    /// The result has the same dimensions and channel count as the
    /// source ([`Format::Rgb8`](crate::Format::Rgb8) or
    /// [`Format::Rgba8`](crate::Format::Rgba8)); alpha passes through
    /// the usual value conversion. The source is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn apply_tone_mapping(&self, method: ToneMapping) -> Result<Rc<Self>, BufferError> {
        self.apply_tone_mapping_with(move |c| method.map(c))
    }

    /// Tone map into a new 8-bit buffer with a caller-provided curve.
    ///
    /// `map` receives each pixel's linear color and returns the 8-bit
    /// result; alpha is carried over independently.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn apply_tone_mapping_with(
        &self,
        map: impl Fn(Rgb<f32>) -> Rgb<u8>,
    ) -> Result<Rc<Self>, BufferError> {
        let ldr = self.format().to_ldr();
        let target = if self.has_alpha() { ldr.to_rgba() } else { ldr.to_rgb() };
        let out = ImageBuffer::new(self.width(), self.height(), target)?;
        let write_alpha = target.has_alpha();
        for (src, dst) in self.pixels()?.zip(out.pixels()?) {
            let color = src.color_float();
            let ldr = map(Rgb { r: color.r, g: color.g, b: color.b });
            dst.put_ldr(Rgba {
                r: ldr.r,
                g: ldr.g,
                b: ldr.b,
                a: if write_alpha { float_to_ldr(color.a) } else { 255 },
            })?;
        }
        Ok(out)
    }
}
