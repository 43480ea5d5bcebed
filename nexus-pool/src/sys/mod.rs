//! Platform-specific region allocation (internal).
//!
//! Two paths, picked by size:
//!
//! ```text
//! size <  page_size  ──▶ heap, aligned to CACHE_LINE (or more if the type needs it)
//! size >= page_size  ──▶ whole pages from the OS, advised "will need" + huge pages
//! ```
//!
//! A [`Region`] remembers which path produced it and frees through the same
//! one on drop.

#[cfg(not(unix))]
mod alloc;

#[cfg(unix)]
mod unix;

use std::alloc::Layout;
use std::io;
use std::ptr::NonNull;

#[cfg(not(unix))]
use alloc::{map_pages, page_size, unmap_pages};

#[cfg(unix)]
use unix::{map_pages, page_size, unmap_pages};

/// Alignment used for sub-page blocks.
#[cfg(target_pointer_width = "64")]
pub const CACHE_LINE: usize = 64;

/// Alignment used for sub-page blocks.
#[cfg(not(target_pointer_width = "64"))]
pub const CACHE_LINE: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Backing {
    Heap(Layout),
    Pages,
}

/// An owned, aligned memory region.
pub(crate) struct Region {
    ptr: NonNull<u8>,
    size: usize,
    backing: Backing,
}

impl Region {
    /// Allocate at least `size` bytes aligned to at least `align`.
    ///
    /// Sizes of a page or more come straight from the OS, rounded up to the
    /// page boundary. Smaller sizes are cache-line aligned heap allocations.
    pub(crate) fn alloc(size: usize, align: usize) -> io::Result<Self> {
        if size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "region size must be non-zero",
            ));
        }

        let page = page_size();
        if size >= page && align <= page {
            let (ptr, size) = map_pages(size)?;
            return Ok(Self {
                ptr,
                size,
                backing: Backing::Pages,
            });
        }

        let layout = Layout::from_size_align(size, align.max(CACHE_LINE))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Self::heap(layout)
    }

    /// Allocate exactly `layout` from the global allocator, no rounding.
    pub(crate) fn heap(layout: Layout) -> io::Result<Self> {
        if layout.size() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "region size must be non-zero",
            ));
        }

        let ptr = unsafe { std::alloc::alloc(layout) };
        let ptr = NonNull::new(ptr)
            .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "allocation failed"))?;

        Ok(Self {
            ptr,
            size: layout.size(),
            backing: Backing::Heap(layout),
        })
    }

    /// Returns a pointer to the start of the region.
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Usable size in bytes (after any rounding).
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the region came from the page path.
    #[inline]
    pub(crate) fn is_mapped(&self) -> bool {
        self.backing == Backing::Pages
    }
}

unsafe impl Send for Region {}

impl Drop for Region {
    fn drop(&mut self) {
        match self.backing {
            Backing::Heap(layout) => unsafe { std::alloc::dealloc(self.ptr.as_ptr(), layout) },
            Backing::Pages => unsafe { unmap_pages(self.ptr, self.size) },
        }
    }
}
