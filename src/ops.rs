//! Whole-buffer operations: format conversion, channel swizzles,
//! fills, flips, resize and copies.
//!
//! Everything here is synchronous CPU work proportional to pixel count.
//! Operations that reallocate storage ([`convert`](ImageBuffer::convert),
//! [`resize`](ImageBuffer::resize)) detach a sub-view from its parent
//! and invalidate outstanding pixel views; in-place operations (fills,
//! flips, [`swap_channels`](ImageBuffer::swap_channels)) do not.

use alloc::rc::Rc;
use alloc::vec;

use rgb::Rgba;

use crate::buffer::ImageBuffer;
use crate::error::BufferError;
use crate::format::{Channel, Format};
use crate::value::{LdrValue, decode_channel, encode_channel, ldr_to_float};

impl ImageBuffer {
    // Format conversion -------------------------------------------------------

    /// Rewrite every pixel into `target`, reallocating storage.
    ///
    /// Converting to the current format is a no-op (byte-identical).
    /// When the channel count changes, added alpha is full opaque and
    /// removed alpha is dropped; when the domain changes, values follow
    /// the scalar conversion rules ([`ldr_to_float`](crate::ldr_to_float)
    /// and friends). A sub-view is detached into its own storage by this
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] for [`Format::None`] and
    /// [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn convert(&self, target: Format) -> Result<(), BufferError> {
        let source = self.format();
        if target == source {
            return Ok(());
        }
        let src_domain = source.domain().ok_or(BufferError::InvalidArgument)?;
        let dst_domain = target.domain().ok_or(BufferError::InvalidArgument)?;
        let geometry = self.resolve_root()?;
        let (width, height) = (self.width(), self.height());
        let (src_size, dst_size) = (source.pixel_size(), target.pixel_size());
        let (src_chan, dst_chan) = (source.channel_size(), target.channel_size());
        let shared = source.channel_count().min(target.channel_count());

        let mut out = vec![0u8; Self::required_bytes(width, height, target)?];
        {
            let storage = self.storage();
            let storage = storage.borrow();
            for y in 0..height {
                let mut src_off = geometry.offset_of(0, y, src_size);
                let mut dst_off = y as usize * width as usize * dst_size;
                for _ in 0..width {
                    for c in 0..shared {
                        let v = decode_channel(&storage.bytes, src_off + c * src_chan, src_domain);
                        encode_channel(&mut out, dst_off + c * dst_chan, dst_domain, v);
                    }
                    if target.has_alpha() && !source.has_alpha() {
                        encode_channel(&mut out, dst_off + 3 * dst_chan, dst_domain, 1.0);
                    }
                    src_off += src_size;
                    dst_off += dst_size;
                }
            }
        }
        self.replace_storage(out, width, height, target);
        Ok(())
    }

    /// Convert to the LDR sibling of the current format.
    ///
    /// # Errors
    ///
    /// Same conditions as [`convert`](Self::convert).
    pub fn to_ldr_domain(&self) -> Result<(), BufferError> {
        self.convert(self.format().to_ldr())
    }

    /// Convert to the HDR sibling of the current format.
    ///
    /// # Errors
    ///
    /// Same conditions as [`convert`](Self::convert).
    pub fn to_hdr_domain(&self) -> Result<(), BufferError> {
        self.convert(self.format().to_hdr())
    }

    /// Convert to the float sibling of the current format.
    ///
    /// # Errors
    ///
    /// Same conditions as [`convert`](Self::convert).
    pub fn to_float_domain(&self) -> Result<(), BufferError> {
        self.convert(self.format().to_float())
    }

    /// Exchange two channels in every pixel, in place, no allocation.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when either channel is not
    /// present in the format and [`BufferError::DanglingParent`] for
    /// dropped ancestors.
    pub fn swap_channels(&self, c0: Channel, c1: Channel) -> Result<(), BufferError> {
        let format = self.format();
        let count = format.channel_count();
        if c0.index() >= count || c1.index() >= count {
            return Err(BufferError::OutOfRange);
        }
        if c0 == c1 {
            return Ok(());
        }
        let geometry = self.resolve_root()?;
        let pixel_size = format.pixel_size();
        let chan_size = format.channel_size();
        let (width, height) = (self.width(), self.height());
        let storage = self.storage();
        let mut storage = storage.borrow_mut();
        for y in 0..height {
            let mut offset = geometry.offset_of(0, y, pixel_size);
            for _ in 0..width {
                let a = offset + c0.index() * chan_size;
                let b = offset + c1.index() * chan_size;
                for k in 0..chan_size {
                    storage.bytes.swap(a + k, b + k);
                }
                offset += pixel_size;
            }
        }
        Ok(())
    }

    // Fills -------------------------------------------------------------------

    fn fill_with_template(&self, template: &[u8]) -> Result<(), BufferError> {
        let geometry = self.resolve_root()?;
        let pixel_size = self.pixel_size();
        let (width, height) = (self.width(), self.height());
        let storage = self.storage();
        let mut storage = storage.borrow_mut();
        for y in 0..height {
            let mut offset = geometry.offset_of(0, y, pixel_size);
            for _ in 0..width {
                storage.bytes[offset..offset + pixel_size].copy_from_slice(template);
                offset += pixel_size;
            }
        }
        Ok(())
    }

    /// Fill every pixel with a float color, value-converted to the
    /// buffer's domain. Alpha is only written for alpha formats.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn clear(&self, color: Rgba<f32>) -> Result<(), BufferError> {
        let format = self.format();
        let domain = format.domain().ok_or(BufferError::InvalidArgument)?;
        let chan_size = format.channel_size();
        let mut template = vec![0u8; format.pixel_size()];
        encode_channel(&mut template, 0, domain, color.r);
        encode_channel(&mut template, chan_size, domain, color.g);
        encode_channel(&mut template, 2 * chan_size, domain, color.b);
        if format.has_alpha() {
            encode_channel(&mut template, 3 * chan_size, domain, color.a);
        }
        self.fill_with_template(&template)
    }

    /// Fill every pixel with an 8-bit color, value-converted to the
    /// buffer's domain.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn clear_ldr(&self, color: Rgba<u8>) -> Result<(), BufferError> {
        self.clear(Rgba {
            r: ldr_to_float(color.r),
            g: ldr_to_float(color.g),
            b: ldr_to_float(color.b),
            a: ldr_to_float(color.a),
        })
    }

    /// Fill every pixel's alpha channel with a constant, value-converted
    /// to the buffer's domain. Color channels are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] when the format has no
    /// alpha channel and [`BufferError::DanglingParent`] for dropped
    /// ancestors.
    pub fn clear_alpha(&self, alpha: LdrValue) -> Result<(), BufferError> {
        let format = self.format();
        if !format.has_alpha() {
            return Err(BufferError::InvalidArgument);
        }
        let domain = format.domain().ok_or(BufferError::InvalidArgument)?;
        let chan_size = format.channel_size();
        let mut encoded = [0u8; 4];
        encode_channel(&mut encoded, 0, domain, ldr_to_float(alpha));
        let geometry = self.resolve_root()?;
        let pixel_size = format.pixel_size();
        let (width, height) = (self.width(), self.height());
        let storage = self.storage();
        let mut storage = storage.borrow_mut();
        for y in 0..height {
            let mut offset = geometry.offset_of(0, y, pixel_size);
            for _ in 0..width {
                let a = offset + 3 * chan_size;
                storage.bytes[a..a + chan_size].copy_from_slice(&encoded[..chan_size]);
                offset += pixel_size;
            }
        }
        Ok(())
    }

    // Flips -------------------------------------------------------------------

    /// Reverse each row in place. Involutive, no reallocation.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn flip_horizontally(&self) -> Result<(), BufferError> {
        let geometry = self.resolve_root()?;
        let pixel_size = self.pixel_size();
        let (width, height) = (self.width() as usize, self.height());
        let storage = self.storage();
        let mut storage = storage.borrow_mut();
        for y in 0..height {
            let base = geometry.offset_of(0, y, pixel_size);
            for x in 0..width / 2 {
                let left = base + x * pixel_size;
                let right = base + (width - 1 - x) * pixel_size;
                for k in 0..pixel_size {
                    storage.bytes.swap(left + k, right + k);
                }
            }
        }
        Ok(())
    }

    /// Reverse the row order in place. Involutive, no reallocation.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn flip_vertically(&self) -> Result<(), BufferError> {
        let geometry = self.resolve_root()?;
        let pixel_size = self.pixel_size();
        let (width, height) = (self.width(), self.height());
        let row_bytes = width as usize * pixel_size;
        let storage = self.storage();
        let mut storage = storage.borrow_mut();
        for y in 0..height / 2 {
            let top = geometry.offset_of(0, y, pixel_size);
            let bottom = geometry.offset_of(0, height - 1 - y, pixel_size);
            for k in 0..row_bytes {
                storage.bytes.swap(top + k, bottom + k);
            }
        }
        Ok(())
    }

    // Resize ------------------------------------------------------------------

    /// Resample to new dimensions, reallocating storage.
    ///
    /// Policy: nearest-neighbor with `src = dst * src_dim / dst_dim`
    /// (floor). Deterministic; enlarging duplicates pixels, shrinking
    /// drops them. A sub-view is detached into its own storage.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] when the new dimensions
    /// overflow the address space and [`BufferError::DanglingParent`]
    /// for dropped ancestors.
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<(), BufferError> {
        let format = self.format();
        let (width, height) = (self.width(), self.height());
        if (new_width, new_height) == (width, height) {
            return Ok(());
        }
        let pixel_size = format.pixel_size();
        let mut out = vec![0u8; Self::required_bytes(new_width, new_height, format)?];
        if width > 0 && height > 0 {
            let geometry = self.resolve_root()?;
            let storage = self.storage();
            let storage = storage.borrow();
            for y_dst in 0..new_height {
                let y_src = (y_dst as u64 * height as u64 / new_height as u64) as u32;
                let src_base = geometry.offset_of(0, y_src, pixel_size);
                let dst_base = y_dst as usize * new_width as usize * pixel_size;
                for x_dst in 0..new_width {
                    let x_src = (x_dst as u64 * width as u64 / new_width as u64) as usize;
                    let src = src_base + x_src * pixel_size;
                    let dst = dst_base + x_dst as usize * pixel_size;
                    out[dst..dst + pixel_size]
                        .copy_from_slice(&storage.bytes[src..src + pixel_size]);
                }
            }
        }
        self.replace_storage(out, new_width, new_height, format);
        Ok(())
    }

    // Copies ------------------------------------------------------------------

    /// Byte-exact rectangular blit into `dst`.
    ///
    /// Copies `width × height` pixels from `(x_src, y_src)` here to
    /// `(x_dst, y_dst)` in `dst`. Safe when the two buffers share
    /// storage (parent and sub-view): the rows are staged through a
    /// temporary.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::FormatMismatch`] when formats differ,
    /// [`BufferError::OutOfRange`] when either rectangle exceeds its
    /// buffer, and [`BufferError::DanglingParent`] for dropped
    /// ancestors.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_region(
        &self,
        dst: &ImageBuffer,
        x_src: u32,
        y_src: u32,
        x_dst: u32,
        y_dst: u32,
        width: u32,
        height: u32,
    ) -> Result<(), BufferError> {
        if self.format() != dst.format() {
            return Err(BufferError::FormatMismatch);
        }
        let src_ok = x_src.checked_add(width).is_some_and(|e| e <= self.width())
            && y_src.checked_add(height).is_some_and(|e| e <= self.height());
        let dst_ok = x_dst.checked_add(width).is_some_and(|e| e <= dst.width())
            && y_dst.checked_add(height).is_some_and(|e| e <= dst.height());
        if !src_ok || !dst_ok {
            return Err(BufferError::OutOfRange);
        }
        let pixel_size = self.pixel_size();
        let row_bytes = width as usize * pixel_size;
        let src_geo = self.resolve_root()?;
        let dst_geo = dst.resolve_root()?;
        let src_storage = self.storage();
        let dst_storage = dst.storage();
        if Rc::ptr_eq(&src_storage, &dst_storage) {
            let mut staged = vec![0u8; row_bytes * height as usize];
            {
                let bytes = &src_storage.borrow().bytes;
                for y in 0..height {
                    let from = src_geo.offset_of(x_src, y_src + y, pixel_size);
                    let to = y as usize * row_bytes;
                    staged[to..to + row_bytes].copy_from_slice(&bytes[from..from + row_bytes]);
                }
            }
            let mut storage = dst_storage.borrow_mut();
            for y in 0..height {
                let from = y as usize * row_bytes;
                let to = dst_geo.offset_of(x_dst, y_dst + y, pixel_size);
                storage.bytes[to..to + row_bytes].copy_from_slice(&staged[from..from + row_bytes]);
            }
        } else {
            let src = src_storage.borrow();
            let mut dstb = dst_storage.borrow_mut();
            for y in 0..height {
                let from = src_geo.offset_of(x_src, y_src + y, pixel_size);
                let to = dst_geo.offset_of(x_dst, y_dst + y, pixel_size);
                dstb.bytes[to..to + row_bytes].copy_from_slice(&src.bytes[from..from + row_bytes]);
            }
        }
        Ok(())
    }

    /// Deep clone into a new buffer with its own storage.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn copy(&self) -> Result<Rc<ImageBuffer>, BufferError> {
        ImageBuffer::from_vec(self.to_vec()?, self.width(), self.height(), self.format())
    }

    /// Deep clone, converting to `format` in the same pass.
    ///
    /// # Errors
    ///
    /// Same conditions as [`copy`](Self::copy) and
    /// [`convert`](Self::convert).
    pub fn copy_with_format(&self, format: Format) -> Result<Rc<ImageBuffer>, BufferError> {
        let clone = self.copy()?;
        clone.convert(format)?;
        Ok(clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use crate::format::Domain;
    use crate::value::FloatValue;

    fn float_pixels(buf: &ImageBuffer) -> Vec<FloatValue> {
        let bytes = buf.to_vec().unwrap();
        let chan = buf.channel_size();
        (0..buf.pixel_count() * buf.channel_count())
            .map(|i| decode_channel(&bytes, i * chan, Domain::Float))
            .collect()
    }

    #[test]
    fn convert_to_same_format_is_identity() {
        let buf = ImageBuffer::from_vec((0u8..48).collect(), 4, 4, Format::Rgb8).unwrap();
        let before = buf.to_vec().unwrap();
        buf.convert(Format::Rgb8).unwrap();
        assert_eq!(buf.to_vec().unwrap(), before);
    }

    #[test]
    fn rgb_rgba_round_trip() {
        let buf = ImageBuffer::from_vec(vec![10, 20, 30, 40, 50, 60], 2, 1, Format::Rgb8).unwrap();
        buf.convert(Format::Rgba8).unwrap();
        assert_eq!(buf.format(), Format::Rgba8);
        // Added alpha is fully opaque.
        assert_eq!(buf.to_vec().unwrap(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
        buf.convert(Format::Rgb8).unwrap();
        assert_eq!(buf.to_vec().unwrap(), vec![10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn ldr_to_float_and_back_preserves_values() {
        let buf = ImageBuffer::from_vec(vec![0, 128, 255], 1, 1, Format::Rgb8).unwrap();
        buf.to_float_domain().unwrap();
        assert_eq!(buf.format(), Format::Rgb32F);
        let px = float_pixels(&buf);
        assert_eq!(px[0], 0.0);
        assert_eq!(px[2], 1.0);
        buf.to_ldr_domain().unwrap();
        assert_eq!(buf.to_vec().unwrap(), vec![0, 128, 255]);
    }

    #[test]
    fn ldr_to_hdr_scales_through_float() {
        let buf = ImageBuffer::from_vec(vec![255, 0, 128], 1, 1, Format::Rgb8).unwrap();
        buf.to_hdr_domain().unwrap();
        let bytes = buf.to_vec().unwrap();
        let red = u16::from_le_bytes([bytes[0], bytes[1]]);
        let blue = u16::from_le_bytes([bytes[4], bytes[5]]);
        assert_eq!(red, 65535);
        assert_eq!(blue, 32896); // round(128 * 65535 / 255)
    }

    #[test]
    fn convert_detaches_sub_view() {
        let parent = ImageBuffer::new(4, 4, Format::Rgb8).unwrap();
        let view = parent.sub_view(1, 1, 2, 2).unwrap();
        view.convert(Format::Rgba8).unwrap();
        assert!(!view.is_sub_image());
        // Parent keeps its format and storage.
        assert_eq!(parent.format(), Format::Rgb8);
        assert_eq!(view.pixel_count(), 4);
    }

    #[test]
    fn swap_channels_in_place() {
        let buf = ImageBuffer::from_vec(vec![1, 2, 3, 4, 5, 6], 2, 1, Format::Rgb8).unwrap();
        buf.swap_channels(Channel::Red, Channel::Blue).unwrap();
        assert_eq!(buf.to_vec().unwrap(), vec![3, 2, 1, 6, 5, 4]);
        assert_eq!(
            buf.swap_channels(Channel::Red, Channel::Alpha).unwrap_err(),
            BufferError::OutOfRange
        );
    }

    #[test]
    fn clear_fills_every_pixel() {
        let buf = ImageBuffer::new(2, 2, Format::Rgba8).unwrap();
        buf.clear(Rgba { r: 1.0, g: 0.0, b: 0.5, a: 1.0 }).unwrap();
        let bytes = buf.to_vec().unwrap();
        for px in bytes.chunks_exact(4) {
            assert_eq!(px, &[255, 0, 128, 255]);
        }
    }

    #[test]
    fn clear_ldr_matches_bytes_exactly() {
        let buf = ImageBuffer::new(2, 1, Format::Rgb8).unwrap();
        buf.clear_ldr(Rgba { r: 11, g: 22, b: 33, a: 255 }).unwrap();
        assert_eq!(buf.to_vec().unwrap(), vec![11, 22, 33, 11, 22, 33]);
    }

    #[test]
    fn clear_alpha_only_touches_alpha() {
        let buf = ImageBuffer::from_vec(vec![1u8; 16], 2, 2, Format::Rgba8).unwrap();
        buf.clear_alpha(200).unwrap();
        for px in buf.to_vec().unwrap().chunks_exact(4) {
            assert_eq!(px, &[1, 1, 1, 200]);
        }
        let rgb = ImageBuffer::new(1, 1, Format::Rgb8).unwrap();
        assert_eq!(
            rgb.clear_alpha(0).unwrap_err(),
            BufferError::InvalidArgument
        );
    }

    #[test]
    fn clear_alpha_hdr_domain() {
        let buf = ImageBuffer::new(1, 1, Format::Rgba16).unwrap();
        buf.clear_alpha(255).unwrap();
        let bytes = buf.to_vec().unwrap();
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 65535);
    }

    #[test]
    fn horizontal_flip_involution_odd_width() {
        let buf = ImageBuffer::from_vec((0u8..9).collect(), 3, 1, Format::Rgb8).unwrap();
        let before = buf.to_vec().unwrap();
        buf.flip_horizontally().unwrap();
        assert_eq!(buf.to_vec().unwrap(), vec![6, 7, 8, 3, 4, 5, 0, 1, 2]);
        buf.flip_horizontally().unwrap();
        assert_eq!(buf.to_vec().unwrap(), before);
    }

    #[test]
    fn vertical_flip_involution_odd_height() {
        let buf = ImageBuffer::from_vec((0u8..18).collect(), 2, 3, Format::Rgb8).unwrap();
        let before = buf.to_vec().unwrap();
        buf.flip_vertically().unwrap();
        let after = buf.to_vec().unwrap();
        assert_eq!(&after[0..6], &before[12..18]);
        assert_eq!(&after[6..12], &before[6..12]);
        assert_eq!(&after[12..18], &before[0..6]);
        buf.flip_vertically().unwrap();
        assert_eq!(buf.to_vec().unwrap(), before);
    }

    #[test]
    fn flipping_a_sub_view_leaves_surroundings_alone() {
        let parent = ImageBuffer::from_vec((0u8..48).collect(), 4, 4, Format::Rgb8).unwrap();
        let before = parent.to_vec().unwrap();
        let view = parent.sub_view(1, 1, 2, 2).unwrap();
        view.flip_horizontally().unwrap();
        let after = parent.to_vec().unwrap();
        // First row of the parent is untouched.
        assert_eq!(&after[0..12], &before[0..12]);
        // Inside the view, pixels (1,1) and (2,1) exchanged.
        assert_eq!(
            &after[parent.pixel_offset(1, 1).unwrap()..parent.pixel_offset(1, 1).unwrap() + 3],
            &before[parent.pixel_offset(2, 1).unwrap()..parent.pixel_offset(2, 1).unwrap() + 3]
        );
    }

    #[test]
    fn resize_nearest_neighbor_doubles_pixels() {
        let buf = ImageBuffer::from_vec(vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4], 2, 2, Format::Rgb8)
            .unwrap();
        buf.resize(4, 4).unwrap();
        assert_eq!((buf.width(), buf.height()), (4, 4));
        let bytes = buf.to_vec().unwrap();
        // Row 0: src row 0 duplicated per column pair.
        assert_eq!(&bytes[0..12], &[1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2]);
        // Row 2 samples src row 1.
        assert_eq!(&bytes[24..36], &[3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4]);
    }

    #[test]
    fn resize_shrink_and_noop() {
        let buf = ImageBuffer::from_vec((0u8..48).collect(), 4, 4, Format::Rgb8).unwrap();
        let before = buf.to_vec().unwrap();
        buf.resize(4, 4).unwrap();
        assert_eq!(buf.to_vec().unwrap(), before);
        buf.resize(2, 2).unwrap();
        let bytes = buf.to_vec().unwrap();
        // (0,0) samples src (0,0); (1,1) samples src (2,2).
        assert_eq!(&bytes[0..3], &before[0..3]);
        assert_eq!(&bytes[9..12], &before[(2 * 4 + 2) * 3..(2 * 4 + 2) * 3 + 3]);
    }

    #[test]
    fn resize_rejects_dimension_overflow() {
        let buf = ImageBuffer::new(2, 2, Format::Rgb8).unwrap();
        assert_eq!(
            buf.resize(u32::MAX, u32::MAX).unwrap_err(),
            BufferError::InvalidArgument
        );
        // The buffer is untouched after the rejection.
        assert_eq!((buf.width(), buf.height()), (2, 2));
        assert_eq!(buf.to_vec().unwrap(), vec![0u8; 12]);
    }

    #[test]
    fn resize_from_empty_zero_fills() {
        let buf = ImageBuffer::new(0, 0, Format::Rgb8).unwrap();
        buf.resize(2, 2).unwrap();
        assert_eq!(buf.to_vec().unwrap(), vec![0u8; 12]);
    }

    #[test]
    fn copy_region_blits_bytes() {
        let src = ImageBuffer::from_vec((0u8..48).collect(), 4, 4, Format::Rgb8).unwrap();
        let dst = ImageBuffer::new(4, 4, Format::Rgb8).unwrap();
        src.copy_region(&dst, 1, 1, 0, 0, 2, 2).unwrap();
        let out = dst.to_vec().unwrap();
        let expect_first = src.to_vec().unwrap();
        let s = src.pixel_offset(1, 1).unwrap();
        assert_eq!(&out[0..6], &expect_first[s..s + 6]);
    }

    #[test]
    fn copy_region_validates() {
        let src = ImageBuffer::new(4, 4, Format::Rgb8).unwrap();
        let dst = ImageBuffer::new(4, 4, Format::Rgba8).unwrap();
        assert_eq!(
            src.copy_region(&dst, 0, 0, 0, 0, 1, 1).unwrap_err(),
            BufferError::FormatMismatch
        );
        let dst = ImageBuffer::new(4, 4, Format::Rgb8).unwrap();
        assert_eq!(
            src.copy_region(&dst, 3, 0, 0, 0, 2, 1).unwrap_err(),
            BufferError::OutOfRange
        );
        assert_eq!(
            src.copy_region(&dst, 0, 0, 0, 3, 1, 2).unwrap_err(),
            BufferError::OutOfRange
        );
    }

    #[test]
    fn copy_region_between_parent_and_view_shares_storage() {
        let parent = ImageBuffer::from_vec((0u8..48).collect(), 4, 4, Format::Rgb8).unwrap();
        let view = parent.sub_view(2, 2, 2, 2).unwrap();
        // Blit the parent's top-left 2x2 into the view through shared bytes.
        parent.copy_region(&view, 0, 0, 0, 0, 2, 2).unwrap();
        let expected_px = parent.to_vec().unwrap()[..3].to_vec();
        let mut actual = [0u8; 3];
        parent
            .read(parent.pixel_offset(2, 2).unwrap(), &mut actual)
            .unwrap();
        assert_eq!(actual.as_slice(), expected_px.as_slice());
    }

    #[test]
    fn deep_copy_is_independent() {
        let buf = ImageBuffer::from_vec(vec![5u8; 12], 2, 2, Format::Rgb8).unwrap();
        let clone = buf.copy().unwrap();
        clone.clear_ldr(Rgba { r: 0, g: 0, b: 0, a: 0 }).unwrap();
        assert_eq!(buf.to_vec().unwrap(), vec![5u8; 12]);
        assert_eq!(clone.to_vec().unwrap(), vec![0u8; 12]);
    }

    #[test]
    fn copy_with_format_converts() {
        let buf = ImageBuffer::from_vec(vec![10, 20, 30], 1, 1, Format::Rgb8).unwrap();
        let rgba = buf.copy_with_format(Format::Rgba8).unwrap();
        assert_eq!(rgba.to_vec().unwrap(), vec![10, 20, 30, 255]);
        assert_eq!(buf.format(), Format::Rgb8);
    }
}
