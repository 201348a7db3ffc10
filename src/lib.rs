//! In-memory pixel buffer for zen* image codecs.
//!
//! This crate provides the mutable, byte-addressed image store the
//! codecs decode into and encode from:
//!
//! - [`ImageBuffer`] — 2D pixel storage with owned, caller-provided or
//!   callback-released backing bytes
//! - [`Format`] — 8/16-bit fixed point and 32-bit float, RGB/RGBA
//! - [`PixelView`] / [`Pixels`] — per-pixel cursor and iteration with
//!   value conversion across the LDR/HDR/float domains
//! - sub-views — rectangular windows sharing the parent's storage,
//!   usable anywhere a buffer is
//! - [`ToneMapping`] — HDR-to-LDR operators (Reinhard, filmic, ACES,
//!   Gran Turismo and friends)
//! - whole-buffer operations — convert, flip, resize, clear, blit,
//!   cubemap assembly
//!
//! Codecs exchange typed images as `imgref::ImgVec` of `rgb` pixels;
//! the [`ImageBuffer::from_rgba8`] / [`ImageBuffer::to_rgba8`] family
//! of adapters bridges those to and from buffers.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod buffer;
mod error;
mod format;
mod interop;
mod ops;
mod tonemap;
mod value;
mod view;

pub use buffer::{CubemapSide, ImageBuffer};
pub use error::BufferError;
pub use format::{Channel, Domain, Format};
pub use tonemap::{ToneMapping, tone_mapping_from_name};
pub use value::{
    FloatValue, HdrValue, LdrValue, float_to_hdr, float_to_ldr, hdr_to_float, hdr_to_ldr,
    ldr_to_float, ldr_to_hdr,
};
pub use view::{PixelView, Pixels};

// Re-exports for codec implementors and users.
pub use imgref::{Img, ImgRef, ImgRefMut, ImgVec};
pub use rgb;
pub use rgb::{Rgb, Rgba};
