#![cfg_attr(target_arch = "nvptx64", no_std)]

//! Kernels that check their own preconditions with `kernel_assert!`.
//!
//! Each one gets the trailing `assertions_data`/`assertion_caller_id`
//! parameters from `#[dsa_kernel]`.

use core::sync::atomic::Ordering;

use gpu_macro::dsa_kernel;
use gpu_native::{atomic::DeviceCounter, kernel_assert, thread_layout::Thread3D};

/// Adds `values[i]` into `total`, one element per thread. The launch must not
/// have more threads than `values` has elements.
#[dsa_kernel]
pub fn checked_sum(values: &[u32], total: &DeviceCounter) {
    let idx = Thread3D::global_linear_idx();
    kernel_assert!(idx < values.len());
    total.fetch_add(values[idx], Ordering::Relaxed);
}

/// `dst[i] += src[indices[i]]`. Every index must be in bounds for `src`.
#[dsa_kernel]
pub fn checked_gather(src: &[u32], indices: &[u32], dst: &[DeviceCounter]) {
    let idx = Thread3D::global_linear_idx();
    if idx >= indices.len() {
        return;
    }
    let from = indices[idx] as usize;
    kernel_assert!(from < src.len());
    kernel_assert!(idx < dst.len());
    dst[idx].fetch_add(src[from], Ordering::Relaxed);
}

/// Each thread checks one adjacent pair of `values` for ascending order.
#[dsa_kernel]
pub fn check_sorted(values: &[u32]) {
    let idx = Thread3D::global_linear_idx();
    if idx + 1 < values.len() {
        kernel_assert!(values[idx] <= values[idx + 1]);
    }
}

/// Counts the threads of the launch into `seen`. Has nothing to check.
#[dsa_kernel]
pub fn count_threads(seen: &DeviceCounter) {
    seen.fetch_add(1, Ordering::Relaxed);
}
