//! Opaque handle wrapper for matrix instances.

use crate::matrix::DMatrix;
use std::sync::atomic::{AtomicUsize, Ordering};

static LIVE_HANDLES: AtomicUsize = AtomicUsize::new(0);

/// Opaque handle to a matrix instance.
///
/// This struct exclusively owns the underlying matrix and is exposed to C as
/// an opaque pointer. The handle must be freed with `dmatrix_free()`; dropping
/// it on the Rust side releases the matrix as well.
///
/// # Thread Safety
///
/// A handle may be moved to another thread, but it must never be used from
/// two threads at once. No locking is performed.
pub struct DMatrixHandle {
    inner: DMatrix,
}

impl DMatrixHandle {
    /// Create a new handle wrapping a matrix.
    pub fn new(dmat: DMatrix) -> Box<Self> {
        LIVE_HANDLES.fetch_add(1, Ordering::Relaxed);
        Box::new(Self { inner: dmat })
    }

    /// Get a reference to the inner matrix.
    pub fn as_ref(&self) -> &DMatrix {
        &self.inner
    }

    /// Get a mutable reference to the inner matrix.
    pub fn as_mut(&mut self) -> &mut DMatrix {
        &mut self.inner
    }

    /// Convert a raw pointer to a mutable reference.
    ///
    /// # Safety
    ///
    /// The pointer must be null or point to a live handle.
    pub unsafe fn from_ptr_mut<'a>(ptr: *mut DMatrixHandle) -> Option<&'a mut Self> {
        unsafe { ptr.as_mut() }
    }

    /// Number of handles currently alive in this process.
    pub fn live_count() -> usize {
        LIVE_HANDLES.load(Ordering::Relaxed)
    }
}

impl Drop for DMatrixHandle {
    fn drop(&mut self) {
        LIVE_HANDLES.fetch_sub(1, Ordering::Relaxed);
    }
}
