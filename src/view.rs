//! Per-pixel cursor and iteration.
//!
//! [`PixelView`] binds to one pixel's byte range and exposes typed
//! get/set in all three value domains regardless of the buffer's stored
//! domain — conversion happens at the access boundary. [`Pixels`]
//! walks every pixel in ascending row-major order.
//!
//! Validity contract: views and iterators stay valid across operations
//! that mutate bytes in place ([`clear`](crate::ImageBuffer::clear),
//! [`swap_channels`](crate::ImageBuffer::swap_channels), flips) but are
//! invalidated by anything that reallocates or changes geometry
//! ([`convert`](crate::ImageBuffer::convert),
//! [`resize`](crate::ImageBuffer::resize)) — re-acquire them afterwards.

use rgb::Rgba;

use crate::buffer::{ImageBuffer, RootGeometry};
use crate::error::BufferError;
use crate::format::{Channel, Domain};
use crate::value::{
    FloatValue, HdrValue, LdrValue, decode_channel, encode_channel, float_to_hdr, float_to_ldr,
    hdr_to_float, ldr_to_float,
};

/// Transient cursor over one pixel.
///
/// Holds the pixel's local offset plus its resolved offset into the
/// root storage (parent-chain translation happens once, when the view
/// is created).
pub struct PixelView<'a> {
    buffer: &'a ImageBuffer,
    index: usize,
    local_offset: usize,
    absolute_offset: usize,
    domain: Domain,
    channel_count: usize,
    channel_size: usize,
}

impl<'a> PixelView<'a> {
    fn new(
        buffer: &'a ImageBuffer,
        geometry: RootGeometry,
        index: usize,
    ) -> Result<Self, BufferError> {
        let format = buffer.format();
        let domain = format.domain().ok_or(BufferError::InvalidArgument)?;
        let local_offset = buffer.pixel_offset_at(index)?;
        let width = buffer.width();
        let x = (index % width as usize) as u32;
        let y = (index / width as usize) as u32;
        Ok(Self {
            buffer,
            index,
            local_offset,
            absolute_offset: geometry.offset_of(x, y, format.pixel_size()),
            domain,
            channel_count: format.channel_count(),
            channel_size: format.channel_size(),
        })
    }

    /// Linear pixel index within the owning buffer.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Local byte offset within the owning buffer's pixel grid.
    #[inline]
    pub fn offset(&self) -> usize {
        self.local_offset
    }

    /// Resolved byte offset into the root storage.
    #[inline]
    pub fn absolute_offset(&self) -> usize {
        self.absolute_offset
    }

    /// X coordinate of this pixel.
    #[inline]
    pub fn x(&self) -> u32 {
        (self.index % self.buffer.width() as usize) as u32
    }

    /// Y coordinate of this pixel.
    #[inline]
    pub fn y(&self) -> u32 {
        (self.index / self.buffer.width() as usize) as u32
    }

    /// The buffer this view reads from and writes to.
    #[inline]
    pub fn buffer(&self) -> &'a ImageBuffer {
        self.buffer
    }

    #[inline]
    fn channel_offset(&self, channel: Channel) -> Option<usize> {
        if channel.index() >= self.channel_count {
            return None;
        }
        Some(self.absolute_offset + channel.index() * self.channel_size)
    }

    /// Channel value as float, converted from the stored domain.
    ///
    /// Reading the alpha channel of an alpha-less format yields full
    /// opacity (`1.0`).
    pub fn get_float(&self, channel: Channel) -> FloatValue {
        let Some(offset) = self.channel_offset(channel) else {
            return 1.0;
        };
        let storage = self.buffer.storage();
        let storage = storage.borrow();
        decode_channel(&storage.bytes, offset, self.domain)
    }

    /// Channel value as 8-bit fixed point, converted from the stored
    /// domain. Missing alpha reads as `255`.
    pub fn get_ldr(&self, channel: Channel) -> LdrValue {
        let Some(offset) = self.channel_offset(channel) else {
            return LdrValue::MAX;
        };
        match self.domain {
            Domain::Ldr => {
                let storage = self.buffer.storage();
                let byte = storage.borrow().bytes[offset];
                byte
            }
            _ => float_to_ldr(self.get_float(channel)),
        }
    }

    /// Channel value as 16-bit fixed point, converted from the stored
    /// domain. Missing alpha reads as `65535`.
    pub fn get_hdr(&self, channel: Channel) -> HdrValue {
        let Some(offset) = self.channel_offset(channel) else {
            return HdrValue::MAX;
        };
        match self.domain {
            Domain::Hdr => {
                let storage = self.buffer.storage();
                let bytes = &storage.borrow().bytes;
                u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
            }
            _ => float_to_hdr(self.get_float(channel)),
        }
    }

    /// Store a float value, converted into the stored domain.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the format does not have
    /// `channel`.
    pub fn set_float(&self, channel: Channel, value: FloatValue) -> Result<(), BufferError> {
        let offset = self.channel_offset(channel).ok_or(BufferError::OutOfRange)?;
        let storage = self.buffer.storage();
        let mut storage = storage.borrow_mut();
        encode_channel(&mut storage.bytes, offset, self.domain, value);
        Ok(())
    }

    /// Store an 8-bit fixed-point value, converted into the stored
    /// domain.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the format does not have
    /// `channel`.
    pub fn set_ldr(&self, channel: Channel, value: LdrValue) -> Result<(), BufferError> {
        let offset = self.channel_offset(channel).ok_or(BufferError::OutOfRange)?;
        if self.domain == Domain::Ldr {
            let storage = self.buffer.storage();
            storage.borrow_mut().bytes[offset] = value;
            return Ok(());
        }
        self.set_float(channel, ldr_to_float(value))
    }

    /// Store a 16-bit fixed-point value, converted into the stored
    /// domain.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the format does not have
    /// `channel`.
    pub fn set_hdr(&self, channel: Channel, value: HdrValue) -> Result<(), BufferError> {
        let offset = self.channel_offset(channel).ok_or(BufferError::OutOfRange)?;
        if self.domain == Domain::Hdr {
            let storage = self.buffer.storage();
            storage.borrow_mut().bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
            return Ok(());
        }
        self.set_float(channel, hdr_to_float(value))
    }

    /// Copy one channel from another view, converting across domains.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when this format does not
    /// have `channel`.
    pub fn copy_channel(&self, channel: Channel, other: &PixelView<'_>) -> Result<(), BufferError> {
        self.set_float(channel, other.get_float(channel))
    }

    /// Copy all of this format's channels from another view.
    ///
    /// Channels the source lacks (alpha from an RGB view) come through
    /// as full opacity.
    pub fn copy_from(&self, other: &PixelView<'_>) -> Result<(), BufferError> {
        for channel in [Channel::Red, Channel::Green, Channel::Blue] {
            self.copy_channel(channel, other)?;
        }
        if self.channel_count == 4 {
            self.copy_channel(Channel::Alpha, other)?;
        }
        Ok(())
    }

    /// Whole pixel as a float color. Missing alpha reads as `1.0`.
    #[must_use]
    pub fn color_float(&self) -> Rgba<FloatValue> {
        Rgba {
            r: self.get_float(Channel::Red),
            g: self.get_float(Channel::Green),
            b: self.get_float(Channel::Blue),
            a: self.get_float(Channel::Alpha),
        }
    }

    /// Whole pixel as an 8-bit color. Missing alpha reads as `255`.
    #[must_use]
    pub fn color_ldr(&self) -> Rgba<LdrValue> {
        Rgba {
            r: self.get_ldr(Channel::Red),
            g: self.get_ldr(Channel::Green),
            b: self.get_ldr(Channel::Blue),
            a: self.get_ldr(Channel::Alpha),
        }
    }

    /// Whole pixel as a 16-bit color. Missing alpha reads as `65535`.
    #[must_use]
    pub fn color_hdr(&self) -> Rgba<HdrValue> {
        Rgba {
            r: self.get_hdr(Channel::Red),
            g: self.get_hdr(Channel::Green),
            b: self.get_hdr(Channel::Blue),
            a: self.get_hdr(Channel::Alpha),
        }
    }

    /// Write a whole float color. Alpha is only written for alpha
    /// formats.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the stored bytes are
    /// shorter than the pixel, which cannot happen for buffers built
    /// through the public constructors.
    pub fn put_float(&self, color: Rgba<FloatValue>) -> Result<(), BufferError> {
        self.set_float(Channel::Red, color.r)?;
        self.set_float(Channel::Green, color.g)?;
        self.set_float(Channel::Blue, color.b)?;
        if self.channel_count == 4 {
            self.set_float(Channel::Alpha, color.a)?;
        }
        Ok(())
    }

    /// Write a whole 8-bit color. Alpha is only written for alpha
    /// formats.
    ///
    /// # Errors
    ///
    /// Same conditions as [`put_float`](Self::put_float).
    pub fn put_ldr(&self, color: Rgba<LdrValue>) -> Result<(), BufferError> {
        self.set_ldr(Channel::Red, color.r)?;
        self.set_ldr(Channel::Green, color.g)?;
        self.set_ldr(Channel::Blue, color.b)?;
        if self.channel_count == 4 {
            self.set_ldr(Channel::Alpha, color.a)?;
        }
        Ok(())
    }

    /// Write a whole 16-bit color. Alpha is only written for alpha
    /// formats.
    ///
    /// # Errors
    ///
    /// Same conditions as [`put_float`](Self::put_float).
    pub fn put_hdr(&self, color: Rgba<HdrValue>) -> Result<(), BufferError> {
        self.set_hdr(Channel::Red, color.r)?;
        self.set_hdr(Channel::Green, color.g)?;
        self.set_hdr(Channel::Blue, color.b)?;
        if self.channel_count == 4 {
            self.set_hdr(Channel::Alpha, color.a)?;
        }
        Ok(())
    }
}

/// Forward row-major iterator over a buffer's pixels.
///
/// Restart by calling [`ImageBuffer::pixels`] again. Geometry and
/// format are resolved once in [`ImageBuffer::pixels`]; iteration
/// itself cannot fail.
pub struct Pixels<'a> {
    buffer: &'a ImageBuffer,
    geometry: RootGeometry,
    index: usize,
    count: usize,
    width: u32,
    domain: Domain,
    pixel_size: usize,
    channel_count: usize,
    channel_size: usize,
}

impl<'a> Iterator for Pixels<'a> {
    type Item = PixelView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        // count > 0 implies width > 0.
        let x = (self.index % self.width as usize) as u32;
        let y = (self.index / self.width as usize) as u32;
        let view = PixelView {
            buffer: self.buffer,
            index: self.index,
            local_offset: self.index * self.pixel_size,
            absolute_offset: self.geometry.offset_of(x, y, self.pixel_size),
            domain: self.domain,
            channel_count: self.channel_count,
            channel_size: self.channel_size,
        };
        self.index += 1;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pixels<'_> {}

impl ImageBuffer {
    /// Cursor for the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for coordinates outside the
    /// buffer and [`BufferError::DanglingParent`] when an ancestor of a
    /// sub-view has been dropped.
    pub fn pixel_view(&self, x: u32, y: u32) -> Result<PixelView<'_>, BufferError> {
        let index = self.pixel_index(x, y)?;
        PixelView::new(self, self.resolve_root()?, index)
    }

    /// Cursor for the pixel at a linear index.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when `index >= pixel_count`
    /// and [`BufferError::DanglingParent`] for dropped ancestors.
    pub fn pixel_view_at(&self, index: usize) -> Result<PixelView<'_>, BufferError> {
        if index >= self.pixel_count() {
            return Err(BufferError::OutOfRange);
        }
        PixelView::new(self, self.resolve_root()?, index)
    }

    /// Iterate all pixels in ascending row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] when an ancestor of a
    /// sub-view has been dropped.
    pub fn pixels(&self) -> Result<Pixels<'_>, BufferError> {
        let format = self.format();
        let domain = format.domain().ok_or(BufferError::InvalidArgument)?;
        Ok(Pixels {
            buffer: self,
            geometry: self.resolve_root()?,
            index: 0,
            count: self.pixel_count(),
            width: self.width(),
            domain,
            pixel_size: format.pixel_size(),
            channel_count: format.channel_count(),
            channel_size: format.channel_size(),
        })
    }

    /// Write a float color to the pixel at `(x, y)`.
    ///
    /// Alpha is only written when the format has an alpha channel.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for coordinates outside the
    /// buffer.
    pub fn set_pixel(&self, x: u32, y: u32, color: Rgba<f32>) -> Result<(), BufferError> {
        let view = self.pixel_view(x, y)?;
        view.set_float(Channel::Red, color.r)?;
        view.set_float(Channel::Green, color.g)?;
        view.set_float(Channel::Blue, color.b)?;
        if self.has_alpha() {
            view.set_float(Channel::Alpha, color.a)?;
        }
        Ok(())
    }

    /// Write an 8-bit color to the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for coordinates outside the
    /// buffer.
    pub fn set_pixel_ldr(&self, x: u32, y: u32, color: Rgba<u8>) -> Result<(), BufferError> {
        let view = self.pixel_view(x, y)?;
        view.set_ldr(Channel::Red, color.r)?;
        view.set_ldr(Channel::Green, color.g)?;
        view.set_ldr(Channel::Blue, color.b)?;
        if self.has_alpha() {
            view.set_ldr(Channel::Alpha, color.a)?;
        }
        Ok(())
    }

    /// Write a 16-bit color to the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for coordinates outside the
    /// buffer.
    pub fn set_pixel_hdr(&self, x: u32, y: u32, color: Rgba<u16>) -> Result<(), BufferError> {
        let view = self.pixel_view(x, y)?;
        view.set_hdr(Channel::Red, color.r)?;
        view.set_hdr(Channel::Green, color.g)?;
        view.set_hdr(Channel::Blue, color.b)?;
        if self.has_alpha() {
            view.set_hdr(Channel::Alpha, color.a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use alloc::vec;

    #[test]
    fn get_set_in_native_domain() {
        let buf = ImageBuffer::new(2, 2, Format::Rgba8).unwrap();
        let view = buf.pixel_view(1, 0).unwrap();
        view.set_ldr(Channel::Red, 200).unwrap();
        view.set_ldr(Channel::Alpha, 7).unwrap();
        assert_eq!(view.get_ldr(Channel::Red), 200);
        assert_eq!(view.get_ldr(Channel::Alpha), 7);
        assert_eq!(view.get_ldr(Channel::Green), 0);
    }

    #[test]
    fn cross_domain_access() {
        let buf = ImageBuffer::new(1, 1, Format::Rgb16).unwrap();
        let view = buf.pixel_view(0, 0).unwrap();
        // Write LDR into an HDR buffer: scaled through float.
        view.set_ldr(Channel::Red, 255).unwrap();
        assert_eq!(view.get_hdr(Channel::Red), 65535);
        assert_eq!(view.get_ldr(Channel::Red), 255);
        assert_eq!(view.get_float(Channel::Red), 1.0);

        // Write float into the HDR buffer: clamped and rounded.
        view.set_float(Channel::Green, 0.5).unwrap();
        assert_eq!(view.get_hdr(Channel::Green), 32768);
    }

    #[test]
    fn float_buffer_keeps_unclamped_values() {
        let buf = ImageBuffer::new(1, 1, Format::Rgb32F).unwrap();
        let view = buf.pixel_view(0, 0).unwrap();
        view.set_float(Channel::Blue, 3.5).unwrap();
        assert_eq!(view.get_float(Channel::Blue), 3.5);
        // LDR read clamps on the way out.
        assert_eq!(view.get_ldr(Channel::Blue), 255);
    }

    #[test]
    fn missing_alpha_reads_opaque_and_rejects_writes() {
        let buf = ImageBuffer::new(1, 1, Format::Rgb8).unwrap();
        let view = buf.pixel_view(0, 0).unwrap();
        assert_eq!(view.get_ldr(Channel::Alpha), 255);
        assert_eq!(view.get_hdr(Channel::Alpha), 65535);
        assert_eq!(view.get_float(Channel::Alpha), 1.0);
        assert_eq!(
            view.set_ldr(Channel::Alpha, 0).unwrap_err(),
            BufferError::OutOfRange
        );
    }

    #[test]
    fn view_coordinates() {
        let buf = ImageBuffer::new(4, 3, Format::Rgb8).unwrap();
        let view = buf.pixel_view(3, 2).unwrap();
        assert_eq!(view.index(), 11);
        assert_eq!((view.x(), view.y()), (3, 2));
        assert_eq!(view.offset(), 33);
        assert_eq!(view.absolute_offset(), 33);
    }

    #[test]
    fn sub_view_pixel_access_hits_parent_storage() {
        let buf = ImageBuffer::new(4, 4, Format::Rgb8).unwrap();
        let view = buf.sub_view(2, 1, 2, 2).unwrap();
        view.pixel_view(0, 0)
            .unwrap()
            .set_ldr(Channel::Red, 99)
            .unwrap();
        assert_eq!(buf.pixel_view(2, 1).unwrap().get_ldr(Channel::Red), 99);
    }

    #[test]
    fn iterator_is_row_major_and_exact() {
        let buf = ImageBuffer::new(3, 2, Format::Rgba16).unwrap();
        let pixels = buf.pixels().unwrap();
        assert_eq!(pixels.len(), 6);
        let coords: vec::Vec<(u32, u32)> = pixels.map(|px| (px.x(), px.y())).collect();
        assert_eq!(
            coords,
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn sub_view_iteration_visits_every_pixel() {
        let parent = ImageBuffer::new(4, 4, Format::Rgb8).unwrap();
        let view = parent.sub_view(1, 2, 2, 2).unwrap();
        let offsets: vec::Vec<usize> =
            view.pixels().unwrap().map(|px| px.absolute_offset()).collect();
        assert_eq!(
            offsets,
            vec![
                parent.pixel_offset(1, 2).unwrap(),
                parent.pixel_offset(2, 2).unwrap(),
                parent.pixel_offset(1, 3).unwrap(),
                parent.pixel_offset(2, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn iterator_restartable() {
        let buf = ImageBuffer::new(2, 2, Format::Rgb8).unwrap();
        assert_eq!(buf.pixels().unwrap().count(), 4);
        assert_eq!(buf.pixels().unwrap().count(), 4);
    }

    #[test]
    fn copy_from_converts_and_fills_alpha() {
        let src = ImageBuffer::new(1, 1, Format::Rgb8).unwrap();
        src.set_pixel_ldr(0, 0, rgb::Rgba { r: 10, g: 20, b: 30, a: 0 })
            .unwrap();
        let dst = ImageBuffer::new(1, 1, Format::Rgba16).unwrap();
        let dst_view = dst.pixel_view(0, 0).unwrap();
        dst_view.copy_from(&src.pixel_view(0, 0).unwrap()).unwrap();
        assert_eq!(dst_view.get_ldr(Channel::Red), 10);
        assert_eq!(dst_view.get_ldr(Channel::Green), 20);
        assert_eq!(dst_view.get_ldr(Channel::Blue), 30);
        // Source had no alpha channel: comes through opaque.
        assert_eq!(dst_view.get_hdr(Channel::Alpha), 65535);
    }

    #[test]
    fn set_pixel_variants() {
        let buf = ImageBuffer::new(2, 1, Format::Rgba32F).unwrap();
        buf.set_pixel(0, 0, rgb::Rgba { r: 0.25, g: 0.5, b: 2.0, a: 1.0 })
            .unwrap();
        let view = buf.pixel_view(0, 0).unwrap();
        assert_eq!(view.get_float(Channel::Blue), 2.0);
        buf.set_pixel_hdr(1, 0, rgb::Rgba { r: 65535, g: 0, b: 0, a: 65535 })
            .unwrap();
        assert_eq!(buf.pixel_view(1, 0).unwrap().get_float(Channel::Red), 1.0);
        assert_eq!(
            buf.set_pixel(2, 0, rgb::Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 })
                .unwrap_err(),
            BufferError::OutOfRange
        );
    }

    #[test]
    fn whole_pixel_accessors() {
        let buf = ImageBuffer::new(1, 1, Format::Rgb8).unwrap();
        let view = buf.pixel_view(0, 0).unwrap();
        view.put_ldr(rgb::Rgba { r: 10, g: 20, b: 30, a: 40 }).unwrap();
        let c = view.color_ldr();
        // No alpha channel to write; it reads back opaque.
        assert_eq!((c.r, c.g, c.b, c.a), (10, 20, 30, 255));
        let f = view.color_float();
        assert_eq!(f.a, 1.0);
    }
}
