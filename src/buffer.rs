//! Pixel buffer store: ownership, factories and addressing.
//!
//! [`ImageBuffer`] owns or shares a flat byte storage for a 2D pixel
//! grid. Storage is reference-counted so a parent buffer and its
//! sub-views can share bytes; the parent relation itself is a weak
//! link that never owns, so parent/child view graphs cannot cycle.
//!
//! Offsets come in two flavors. *Local* offsets address the buffer's
//! own logical pixel grid (`index * pixel_size`). For sub-views,
//! [`absolute_offset`](ImageBuffer::absolute_offset) composes the
//! origin chain up to the root ancestor and yields the offset into the
//! shared storage; for root buffers the two coincide.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::mem;

use crate::error::BufferError;
use crate::format::Format;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Byte storage with an optional release callback.
///
/// When the last sharing buffer drops, the bytes are either freed here
/// or handed back to an external owner through `release` (exactly once).
pub(crate) struct Storage {
    pub(crate) bytes: Vec<u8>,
    release: Option<Box<dyn FnOnce(Vec<u8>)>>,
}

impl Storage {
    fn owned(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            release: None,
        }
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(mem::take(&mut self.bytes));
        }
    }
}

pub(crate) type SharedStorage = Rc<RefCell<Storage>>;

// ---------------------------------------------------------------------------
// ImageBuffer
// ---------------------------------------------------------------------------

pub(crate) struct Core {
    pub(crate) data: SharedStorage,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: Format,
}

struct ParentLink {
    buffer: Weak<ImageBuffer>,
    origin: (u64, u64),
}

/// In-memory 2D pixel buffer.
///
/// Constructed through the factory functions, which all hand out
/// `Rc<ImageBuffer>` so that sub-views can hold weak references to
/// their parent. Mutating operations take `&self` and go through
/// interior mutability; the buffer is single-threaded (`Rc`-based)
/// and never synchronizes internally.
pub struct ImageBuffer {
    pub(crate) core: RefCell<Core>,
    parent: RefCell<Option<ParentLink>>,
}

/// Cubemap face order used by [`ImageBuffer::cubemap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CubemapSide {
    Right = 0,
    Left = 1,
    Up = 2,
    Down = 3,
    Forward = 4,
    Backward = 5,
}

impl CubemapSide {
    /// Zero-based face index in storage order.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Geometry of a buffer resolved against its root ancestor.
#[derive(Clone, Copy)]
pub(crate) struct RootGeometry {
    root_width: u64,
    origin: (u64, u64),
}

impl RootGeometry {
    /// Byte offset of local pixel `(x, y)` in the root storage.
    #[inline]
    pub(crate) fn offset_of(&self, x: u32, y: u32, pixel_size: usize) -> usize {
        let row = self.origin.1 + y as u64;
        let col = self.origin.0 + x as u64;
        ((row * self.root_width + col) as usize) * pixel_size
    }
}

impl ImageBuffer {
    fn from_storage(data: SharedStorage, width: u32, height: u32, format: Format) -> Rc<Self> {
        Rc::new(Self {
            core: RefCell::new(Core {
                data,
                width,
                height,
                format,
            }),
            parent: RefCell::new(None),
        })
    }

    pub(crate) fn required_bytes(
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<usize, BufferError> {
        if format == Format::None {
            return Err(BufferError::InvalidArgument);
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.pixel_size()))
            .ok_or(BufferError::InvalidArgument)
    }

    // Factories ---------------------------------------------------------------

    /// Allocate a zero-initialized buffer.
    ///
    /// Fresh storage is always zero-filled so that tests and callers see
    /// deterministic content. `0x0` is a valid empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] for [`Format::None`] or
    /// dimension overflow.
    pub fn new(width: u32, height: u32, format: Format) -> Result<Rc<Self>, BufferError> {
        let size = Self::required_bytes(width, height, format)?;
        let data = Rc::new(RefCell::new(Storage::owned(vec![0u8; size])));
        Ok(Self::from_storage(data, width, height, format))
    }

    /// Take ownership of an existing allocation.
    ///
    /// Extra trailing bytes beyond `width * height * pixel_size` are
    /// kept but never addressed.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] for [`Format::None`] or
    /// when `data` is too small for the dimensions.
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<Rc<Self>, BufferError> {
        let size = Self::required_bytes(width, height, format)?;
        if data.len() < size {
            return Err(BufferError::InvalidArgument);
        }
        let data = Rc::new(RefCell::new(Storage::owned(data)));
        Ok(Self::from_storage(data, width, height, format))
    }

    /// Copy external const data into a fresh owned allocation.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] for [`Format::None`] or
    /// when `data` is too small for the dimensions.
    pub fn from_bytes(
        data: &[u8],
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<Rc<Self>, BufferError> {
        let size = Self::required_bytes(width, height, format)?;
        if data.len() < size {
            return Err(BufferError::InvalidArgument);
        }
        Self::from_vec(data[..size].to_vec(), width, height, format)
    }

    /// Wrap externally-owned bytes with a release callback.
    ///
    /// The buffer never frees the bytes itself: when the last buffer
    /// sharing this storage drops, `release` receives them back exactly
    /// once (e.g. to return them to a pool or foreign allocator).
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] for [`Format::None`] or
    /// when `data` is too small for the dimensions.
    pub fn with_release(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: Format,
        release: impl FnOnce(Vec<u8>) + 'static,
    ) -> Result<Rc<Self>, BufferError> {
        let size = Self::required_bytes(width, height, format)?;
        if data.len() < size {
            return Err(BufferError::InvalidArgument);
        }
        let data = Rc::new(RefCell::new(Storage {
            bytes: data,
            release: Some(Box::new(release)),
        }));
        Ok(Self::from_storage(data, width, height, format))
    }

    /// Create a sub-image view of a rectangle within this buffer.
    ///
    /// The view shares this buffer's storage (no bytes are copied) and
    /// records a weak link to `self` plus the origin `(x, y)`. The view
    /// outlives the parent object independently; resolving addresses
    /// through a dropped parent yields [`BufferError::DanglingParent`].
    ///
    /// Operations that reallocate the parent's storage
    /// ([`convert`](Self::convert), [`resize`](Self::resize)) detach the
    /// parent from the bytes this view still addresses; create views
    /// anew after those, the same as for pixel cursors and iterators.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if the rectangle does not lie
    /// within this buffer.
    pub fn sub_view(
        self: &Rc<Self>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Rc<Self>, BufferError> {
        let in_x = x.checked_add(width).is_some_and(|end| end <= self.width());
        let in_y = y.checked_add(height).is_some_and(|end| end <= self.height());
        if !in_x || !in_y {
            return Err(BufferError::OutOfRange);
        }
        Ok(Rc::new(Self {
            core: RefCell::new(Core {
                data: self.storage(),
                width,
                height,
                format: self.format(),
            }),
            parent: RefCell::new(Some(ParentLink {
                buffer: Rc::downgrade(self),
                origin: (x as u64, y as u64),
            })),
        }))
    }

    /// Assemble six cubemap faces into one contiguous buffer.
    ///
    /// Faces must be square and share dimensions and format; the order
    /// is fixed: right, left, up, down, forward, backward. The result
    /// is a plain `width × 6·height` buffer with face-major storage —
    /// a memory container only, no projection math happens here.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if the faces disagree in
    /// dimensions or format, are not square, or use [`Format::None`].
    pub fn cubemap(faces: &[Rc<ImageBuffer>; 6]) -> Result<Rc<Self>, BufferError> {
        let width = faces[0].width();
        let height = faces[0].height();
        let format = faces[0].format();
        if format == Format::None || width != height {
            return Err(BufferError::InvalidArgument);
        }
        for face in faces.iter() {
            if face.width() != width || face.height() != height || face.format() != format {
                return Err(BufferError::InvalidArgument);
            }
        }
        let face_bytes = Self::required_bytes(width, height, format)?;
        let mut bytes = Vec::with_capacity(face_bytes * 6);
        for face in faces.iter() {
            bytes.extend_from_slice(&face.to_vec()?);
        }
        let total_height = height.checked_mul(6).ok_or(BufferError::InvalidArgument)?;
        Self::from_vec(bytes, width, total_height, format)
    }

    /// Sub-view of one face of an assembled cubemap.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if this buffer does not
    /// have cubemap proportions (`height == 6 * width`, square faces).
    pub fn cubemap_face(self: &Rc<Self>, side: CubemapSide) -> Result<Rc<Self>, BufferError> {
        let width = self.width();
        if width == 0 || self.height() != width.checked_mul(6).unwrap_or(0) {
            return Err(BufferError::InvalidArgument);
        }
        self.sub_view(0, side.index() as u32 * width, width, width)
    }

    // Accessors ---------------------------------------------------------------

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.core.borrow().width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.core.borrow().height
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> Format {
        self.core.borrow().format
    }

    /// Number of channels per pixel.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.format().channel_count()
    }

    /// Byte size of one channel value.
    #[inline]
    pub fn channel_size(&self) -> usize {
        self.format().channel_size()
    }

    /// Byte size of one pixel.
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.format().pixel_size()
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        let core = self.core.borrow();
        core.width as usize * core.height as usize
    }

    /// Logical byte size (`pixel_count * pixel_size`).
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.pixel_count() * self.pixel_size()
    }

    /// Whether the buffer holds no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Whether the format has an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.format().has_alpha()
    }

    /// Whether channel values are 8-bit fixed point.
    #[inline]
    pub fn is_ldr(&self) -> bool {
        self.format().is_ldr()
    }

    /// Whether channel values are 16-bit fixed point.
    #[inline]
    pub fn is_hdr(&self) -> bool {
        self.format().is_hdr()
    }

    /// Whether channel values are 32-bit float.
    #[inline]
    pub fn is_float(&self) -> bool {
        self.format().is_float()
    }

    /// Whether this buffer was created as a sub-image view.
    ///
    /// The link may dangle once the parent object drops; combine with
    /// [`parent`](Self::parent) to detect that case.
    #[inline]
    pub fn is_sub_image(&self) -> bool {
        self.parent.borrow().is_some()
    }

    /// Parent buffer of a sub-image view, if it still exists.
    pub fn parent(&self) -> Option<Rc<ImageBuffer>> {
        self.parent
            .borrow()
            .as_ref()
            .and_then(|link| link.buffer.upgrade())
    }

    /// Origin of this view within its immediate parent's pixel grid.
    pub fn parent_origin(&self) -> Option<(u64, u64)> {
        self.parent.borrow().as_ref().map(|link| link.origin)
    }

    // Addressing --------------------------------------------------------------

    /// Linear row-major pixel index of `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the coordinate lies
    /// outside the buffer; coordinates are never clamped.
    pub fn pixel_index(&self, x: u32, y: u32) -> Result<usize, BufferError> {
        let core = self.core.borrow();
        if x >= core.width || y >= core.height {
            return Err(BufferError::OutOfRange);
        }
        Ok(y as usize * core.width as usize + x as usize)
    }

    /// Local byte offset of pixel `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for coordinates outside the
    /// buffer.
    pub fn pixel_offset(&self, x: u32, y: u32) -> Result<usize, BufferError> {
        Ok(self.pixel_index(x, y)? * self.pixel_size())
    }

    /// Local byte offset of the pixel at a linear index.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when `index >= pixel_count`.
    pub fn pixel_offset_at(&self, index: usize) -> Result<usize, BufferError> {
        if index >= self.pixel_count() {
            return Err(BufferError::OutOfRange);
        }
        Ok(index * self.pixel_size())
    }

    /// Invert a local byte offset back to `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for offsets that are not
    /// pixel-aligned or lie outside the buffer.
    pub fn pixel_coordinates(&self, offset: usize) -> Result<(u32, u32), BufferError> {
        let pixel_size = self.pixel_size();
        if pixel_size == 0 || offset % pixel_size != 0 {
            return Err(BufferError::OutOfRange);
        }
        let index = offset / pixel_size;
        if index >= self.pixel_count() {
            return Err(BufferError::OutOfRange);
        }
        let width = self.width() as usize;
        Ok(((index % width) as u32, (index / width) as u32))
    }

    /// Resolve geometry against the root ancestor by composing the
    /// parent origin chain.
    pub(crate) fn resolve_root(&self) -> Result<RootGeometry, BufferError> {
        let mut origin = (0u64, 0u64);
        let mut root_width = self.width() as u64;
        let mut next = self
            .parent
            .borrow()
            .as_ref()
            .map(|link| (link.buffer.clone(), link.origin));
        while let Some((weak, step)) = next {
            let parent = weak.upgrade().ok_or(BufferError::DanglingParent)?;
            origin.0 += step.0;
            origin.1 += step.1;
            root_width = parent.width() as u64;
            next = parent
                .parent
                .borrow()
                .as_ref()
                .map(|link| (link.buffer.clone(), link.origin));
        }
        Ok(RootGeometry { root_width, origin })
    }

    /// Translate a local byte offset into the root storage.
    ///
    /// For root buffers this is the identity.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for invalid local offsets and
    /// [`BufferError::DanglingParent`] when an ancestor has been dropped.
    pub fn absolute_offset(&self, local: usize) -> Result<usize, BufferError> {
        let (x, y) = self.pixel_coordinates(local)?;
        let geometry = self.resolve_root()?;
        Ok(geometry.offset_of(x, y, self.pixel_size()))
    }

    // Raw storage access ------------------------------------------------------

    pub(crate) fn storage(&self) -> SharedStorage {
        self.core.borrow().data.clone()
    }

    /// Replace the backing storage, detaching from any parent.
    pub(crate) fn replace_storage(&self, bytes: Vec<u8>, width: u32, height: u32, format: Format) {
        let mut core = self.core.borrow_mut();
        core.data = Rc::new(RefCell::new(Storage::owned(bytes)));
        core.width = width;
        core.height = height;
        core.format = format;
        drop(core);
        *self.parent.borrow_mut() = None;
    }

    /// Read raw bytes from the backing storage.
    ///
    /// Offsets address the storage directly; use
    /// [`absolute_offset`](Self::absolute_offset) first for sub-views.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the range exceeds the
    /// storage.
    pub fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), BufferError> {
        let storage = self.storage();
        let storage = storage.borrow();
        let end = offset
            .checked_add(out.len())
            .ok_or(BufferError::OutOfRange)?;
        if end > storage.bytes.len() {
            return Err(BufferError::OutOfRange);
        }
        out.copy_from_slice(&storage.bytes[offset..end]);
        Ok(())
    }

    /// Write raw bytes into the backing storage.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the range exceeds the
    /// storage.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), BufferError> {
        let storage = self.storage();
        let mut storage = storage.borrow_mut();
        let end = offset
            .checked_add(data.len())
            .ok_or(BufferError::OutOfRange)?;
        if end > storage.bytes.len() {
            return Err(BufferError::OutOfRange);
        }
        storage.bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Copy the buffer's logical content into a tightly-packed vec.
    ///
    /// For sub-views the rows are gathered from the shared storage.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::DanglingParent`] when an ancestor of a
    /// sub-view has been dropped.
    pub fn to_vec(&self) -> Result<Vec<u8>, BufferError> {
        let geometry = self.resolve_root()?;
        let pixel_size = self.pixel_size();
        let width = self.width();
        let height = self.height();
        let row_bytes = width as usize * pixel_size;
        let mut out = Vec::with_capacity(row_bytes * height as usize);
        let storage = self.storage();
        let storage = storage.borrow();
        for y in 0..height {
            let start = geometry.offset_of(0, y, pixel_size);
            out.extend_from_slice(&storage.bytes[start..start + row_bytes]);
        }
        Ok(out)
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageBuffer({}x{}, {})",
            self.width(),
            self.height(),
            self.format()
        )
    }
}
