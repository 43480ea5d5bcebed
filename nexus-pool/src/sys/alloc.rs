//! Non-unix targets: "pages" are page-aligned global allocations.

use std::alloc::{self, Layout};
use std::io;
use std::ptr::NonNull;

const PAGE: usize = 4096;

pub(crate) fn page_size() -> usize {
    PAGE
}

fn page_layout(size: usize) -> io::Result<Layout> {
    Layout::from_size_align(size, PAGE)
        .map(|layout| layout.pad_to_align())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

pub(crate) fn map_pages(size: usize) -> io::Result<(NonNull<u8>, usize)> {
    let layout = page_layout(size)?;
    // Safety: non-zero size, Region::alloc rejects empty requests
    let ptr = unsafe { alloc::alloc(layout) };
    NonNull::new(ptr)
        .map(|ptr| (ptr, layout.size()))
        .ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))
}

/// # Safety
/// `ptr` and `size` must come from `map_pages`.
pub(crate) unsafe fn unmap_pages(ptr: NonNull<u8>, size: usize) {
    // size is already page-rounded, so this is the layout map_pages used
    if let Ok(layout) = page_layout(size) {
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
    }
}
