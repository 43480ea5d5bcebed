//! Unix page mapping via mmap.

use std::io;
use std::ptr::NonNull;

// =============================================================================
// Page Size
// =============================================================================

pub(crate) fn page_size() -> usize {
    #[cfg(miri)]
    {
        4096
    }

    #[cfg(not(miri))]
    {
        static PAGE_SIZE: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
        *PAGE_SIZE.get_or_init(|| {
            let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
            if size > 0 { size as usize } else { 4096 }
        })
    }
}

#[inline]
fn round_to_page(size: usize) -> usize {
    let page = page_size();
    (size + page - 1) & !(page - 1)
}

// =============================================================================
// Mapping
// =============================================================================

#[cfg(miri)]
pub(crate) fn map_pages(size: usize) -> io::Result<(NonNull<u8>, usize)> {
    let size = round_to_page(size);
    let layout = std::alloc::Layout::from_size_align(size, page_size())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let ptr = unsafe { std::alloc::alloc(layout) };
    let ptr = NonNull::new(ptr)
        .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "allocation failed"))?;

    Ok((ptr, size))
}

/// Map `size` bytes (rounded up to whole pages) of private anonymous memory.
#[cfg(not(miri))]
pub(crate) fn map_pages(size: usize) -> io::Result<(NonNull<u8>, usize)> {
    let size = round_to_page(size);

    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };

    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    let ptr = NonNull::new(ptr as *mut u8)
        .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "mmap returned null"))?;

    // Hints only; a refusal leaves a perfectly usable mapping.
    let rc = unsafe { libc::madvise(ptr.as_ptr() as *mut libc::c_void, size, libc::MADV_WILLNEED) };
    if rc != 0 {
        tracing::trace!(size, error = %io::Error::last_os_error(), "madvise(WILLNEED) refused");
    }

    #[cfg(target_os = "linux")]
    {
        let rc =
            unsafe { libc::madvise(ptr.as_ptr() as *mut libc::c_void, size, libc::MADV_HUGEPAGE) };
        if rc != 0 {
            tracing::trace!(size, error = %io::Error::last_os_error(), "madvise(HUGEPAGE) refused");
        }
    }

    Ok((ptr, size))
}

// =============================================================================
// Unmapping
// =============================================================================

/// # Safety
/// ptr and size must be from a previous map_pages call.
pub(crate) unsafe fn unmap_pages(ptr: NonNull<u8>, size: usize) {
    #[cfg(miri)]
    {
        if let Ok(layout) = std::alloc::Layout::from_size_align(size, page_size()) {
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }

    #[cfg(not(miri))]
    unsafe {
        libc::munmap(ptr.as_ptr() as *mut libc::c_void, size);
    }
}
