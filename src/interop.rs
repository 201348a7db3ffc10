//! Conversions to and from `imgref` typed images.
//!
//! Codecs in this family speak `ImgRef`/`ImgVec` of `rgb` pixel types;
//! these adapters bridge them to the byte-oriented [`ImageBuffer`].
//! Imports are stride-aware (padding pixels in the source image are
//! skipped); exports always produce a packed `ImgVec`.

use alloc::rc::Rc;
use alloc::vec::Vec;

use imgref::{ImgRef, ImgVec};
use rgb::{Rgb, Rgba};

use crate::buffer::ImageBuffer;
use crate::error::BufferError;
use crate::format::Format;

macro_rules! impl_img_interop {
    (rgb: $from:ident, $to:ident, $c:ty, $format:expr, $color:ident, $put:ident, $opaque:expr) => {
        impl ImageBuffer {
            #[doc = concat!("Copy a typed image into a new `", stringify!($format), "` buffer.")]
            ///
            /// # Errors
            ///
            /// Returns [`BufferError::InvalidArgument`] when the image
            /// dimensions do not fit in `u32`.
            pub fn $from(img: ImgRef<'_, Rgb<$c>>) -> Result<Rc<Self>, BufferError> {
                let buf = Self::new(import_dim(img.width())?, import_dim(img.height())?, $format)?;
                for (view, px) in buf.pixels()?.zip(img.pixels()) {
                    view.$put(Rgba { r: px.r, g: px.g, b: px.b, a: $opaque })?;
                }
                Ok(buf)
            }

            #[doc = concat!(
                "Extract a packed typed image; the buffer must be `",
                stringify!($format),
                "`."
            )]
            ///
            /// # Errors
            ///
            /// Returns [`BufferError::FormatMismatch`] for any other
            /// format and [`BufferError::DanglingParent`] for dropped
            /// ancestors.
            pub fn $to(&self) -> Result<ImgVec<Rgb<$c>>, BufferError> {
                if self.format() != $format {
                    return Err(BufferError::FormatMismatch);
                }
                let mut pixels = Vec::with_capacity(self.pixel_count());
                for view in self.pixels()? {
                    let c = view.$color();
                    pixels.push(Rgb { r: c.r, g: c.g, b: c.b });
                }
                Ok(ImgVec::new(
                    pixels,
                    self.width() as usize,
                    self.height() as usize,
                ))
            }
        }
    };
    (rgba: $from:ident, $to:ident, $c:ty, $format:expr, $color:ident, $put:ident) => {
        impl ImageBuffer {
            #[doc = concat!("Copy a typed image into a new `", stringify!($format), "` buffer.")]
            ///
            /// # Errors
            ///
            /// Returns [`BufferError::InvalidArgument`] when the image
            /// dimensions do not fit in `u32`.
            pub fn $from(img: ImgRef<'_, Rgba<$c>>) -> Result<Rc<Self>, BufferError> {
                let buf = Self::new(import_dim(img.width())?, import_dim(img.height())?, $format)?;
                for (view, px) in buf.pixels()?.zip(img.pixels()) {
                    view.$put(px)?;
                }
                Ok(buf)
            }

            #[doc = concat!(
                "Extract a packed typed image; the buffer must be `",
                stringify!($format),
                "`."
            )]
            ///
            /// # Errors
            ///
            /// Returns [`BufferError::FormatMismatch`] for any other
            /// format and [`BufferError::DanglingParent`] for dropped
            /// ancestors.
            pub fn $to(&self) -> Result<ImgVec<Rgba<$c>>, BufferError> {
                if self.format() != $format {
                    return Err(BufferError::FormatMismatch);
                }
                let mut pixels = Vec::with_capacity(self.pixel_count());
                for view in self.pixels()? {
                    pixels.push(view.$color());
                }
                Ok(ImgVec::new(
                    pixels,
                    self.width() as usize,
                    self.height() as usize,
                ))
            }
        }
    };
}

fn import_dim(dim: usize) -> Result<u32, BufferError> {
    u32::try_from(dim).map_err(|_| BufferError::InvalidArgument)
}

impl_img_interop!(rgb: from_rgb8, to_rgb8, u8, Format::Rgb8, color_ldr, put_ldr, 255);
impl_img_interop!(rgba: from_rgba8, to_rgba8, u8, Format::Rgba8, color_ldr, put_ldr);
impl_img_interop!(rgb: from_rgb16, to_rgb16, u16, Format::Rgb16, color_hdr, put_hdr, 65535);
impl_img_interop!(rgba: from_rgba16, to_rgba16, u16, Format::Rgba16, color_hdr, put_hdr);
impl_img_interop!(rgb: from_rgb_f32, to_rgb_f32, f32, Format::Rgb32F, color_float, put_float, 1.0);
impl_img_interop!(rgba: from_rgba_f32, to_rgba_f32, f32, Format::Rgba32F, color_float, put_float);

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use imgref::Img;

    #[test]
    fn rgb8_round_trip() {
        let img = ImgVec::new(
            vec![
                Rgb { r: 1u8, g: 2, b: 3 },
                Rgb { r: 4, g: 5, b: 6 },
                Rgb { r: 7, g: 8, b: 9 },
                Rgb { r: 10, g: 11, b: 12 },
            ],
            2,
            2,
        );
        let buf = ImageBuffer::from_rgb8(img.as_ref()).unwrap();
        assert_eq!(buf.format(), Format::Rgb8);
        assert_eq!(buf.to_vec().unwrap(), (1u8..=12).collect::<Vec<_>>());
        let out = buf.to_rgb8().unwrap();
        assert_eq!(out.buf(), img.buf());
    }

    #[test]
    fn import_skips_stride_padding() {
        // 2x2 image carved out of a 4-wide backing row.
        let backing = vec![
            Rgba { r: 1u8, g: 1, b: 1, a: 1 },
            Rgba { r: 2, g: 2, b: 2, a: 2 },
            Rgba { r: 0, g: 0, b: 0, a: 0 },
            Rgba { r: 0, g: 0, b: 0, a: 0 },
            Rgba { r: 3, g: 3, b: 3, a: 3 },
            Rgba { r: 4, g: 4, b: 4, a: 4 },
            Rgba { r: 0, g: 0, b: 0, a: 0 },
            Rgba { r: 0, g: 0, b: 0, a: 0 },
        ];
        let img = Img::new_stride(backing, 2, 2, 4);
        let buf = ImageBuffer::from_rgba8(img.as_ref()).unwrap();
        assert_eq!(
            buf.to_vec().unwrap(),
            vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4]
        );
    }

    #[test]
    fn export_requires_matching_format() {
        let buf = ImageBuffer::new(1, 1, Format::Rgb8).unwrap();
        assert_eq!(buf.to_rgba8().unwrap_err(), BufferError::FormatMismatch);
        assert_eq!(buf.to_rgb_f32().unwrap_err(), BufferError::FormatMismatch);
    }

    #[test]
    fn float_import_preserves_unclamped_values() {
        let img = ImgVec::new(vec![Rgb { r: 4.5f32, g: -1.0, b: 0.25 }], 1, 1);
        let buf = ImageBuffer::from_rgb_f32(img.as_ref()).unwrap();
        let out = buf.to_rgb_f32().unwrap();
        assert_eq!(out.buf()[0], Rgb { r: 4.5, g: -1.0, b: 0.25 });
    }

    #[test]
    fn hdr_round_trip_is_exact() {
        let img = ImgVec::new(vec![Rgba { r: 9u16, g: 0, b: 65535, a: 1234 }], 1, 1);
        let buf = ImageBuffer::from_rgba16(img.as_ref()).unwrap();
        let out = buf.to_rgba16().unwrap();
        assert_eq!(out.buf()[0], Rgba { r: 9, g: 0, b: 65535, a: 1234 });
    }

    #[test]
    fn export_of_sub_view_is_packed() {
        let parent = ImageBuffer::from_vec((0u8..48).collect(), 4, 4, Format::Rgb8).unwrap();
        let view = parent.sub_view(1, 1, 2, 2).unwrap();
        let img = view.to_rgb8().unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        assert_eq!(img.stride(), 2);
        assert_eq!(img.buf()[0], Rgb { r: 15u8, g: 16, b: 17 });
    }
}
