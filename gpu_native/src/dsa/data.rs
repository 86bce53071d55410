use core::cell::UnsafeCell;
use core::sync::atomic::Ordering;

use super::bounded::until_nul;
use super::{DEVICE_SIDE_ASSERTION_COUNT, DEVICE_SIDE_MAX_STR_LEN};
use crate::atomic::DeviceCounter;

/// One recorded assertion failure.
///
/// The layout is shared with whatever decodes the buffer on the host, so
/// fields keep their order and C representation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceAssertion<const L: usize = DEVICE_SIDE_MAX_STR_LEN> {
    pub assertion_msg: [u8; L],
    pub filename: [u8; L],
    pub function_name: [u8; L],
    pub line_number: i32,
    pub caller: u32,
    pub block_id: [u32; 3],
    pub thread_id: [u32; 3],
}

impl<const L: usize> DeviceAssertion<L> {
    pub const fn zeroed() -> Self {
        Self {
            assertion_msg: [0; L],
            filename: [0; L],
            function_name: [0; L],
            line_number: 0,
            caller: 0,
            block_id: [0; 3],
            thread_id: [0; 3],
        }
    }

    pub fn message(&self) -> &[u8] {
        until_nul(&self.assertion_msg)
    }

    pub fn filename(&self) -> &[u8] {
        until_nul(&self.filename)
    }

    pub fn function_name(&self) -> &[u8] {
        until_nul(&self.function_name)
    }
}

/// Failure buffer shared by every thread of one launch.
///
/// `C` is the number of slots and `L` the capacity of each string field.
/// Threads only touch it through [`super::record_failure`]; the host reads
/// it back through `&mut self`, which can only exist once the launch has
/// released the buffer.
#[repr(C)]
pub struct DeviceAssertionsData<
    const C: usize = DEVICE_SIDE_ASSERTION_COUNT,
    const L: usize = DEVICE_SIDE_MAX_STR_LEN,
> {
    /// Slot reservations. Can run past `C`, saturates at `u32::MAX`.
    pub(crate) assertion_count: DeviceCounter,
    /// Records fully written.
    pub(crate) assertion_failure_written: DeviceCounter,
    pub(crate) assertions: [UnsafeCell<DeviceAssertion<L>>; C],
}

// SAFETY: the counters are atomic, and slot `i` is written only by the one
// thread whose reservation returned `i`.
unsafe impl<const C: usize, const L: usize> Sync for DeviceAssertionsData<C, L> {}

impl<const C: usize, const L: usize> DeviceAssertionsData<C, L> {
    /// An empty buffer. Slot indices are `u32` on the device, so `C` must
    /// fit in one:
    ///
    /// ```compile_fail
    /// # use gpu_native::dsa::DeviceAssertionsData;
    /// const TOO_MANY: usize = u32::MAX as usize + 1;
    /// let data = DeviceAssertionsData::<TOO_MANY, 1>::zeroed();
    /// ```
    pub const fn zeroed() -> Self {
        const { assert!(C <= u32::MAX as usize, "assertion buffer capacity must fit in a u32") };
        Self {
            assertion_count: DeviceCounter::new(0),
            assertion_failure_written: DeviceCounter::new(0),
            assertions: [const { UnsafeCell::new(DeviceAssertion::zeroed()) }; C],
        }
    }

    pub const fn capacity(&self) -> usize {
        C
    }

    /// Number of slot reservations, including ones dropped for lack of space.
    pub fn assertion_count(&self) -> u32 {
        self.assertion_count.load(Ordering::Acquire)
    }

    /// Number of records completely written.
    pub fn failures_written(&self) -> u32 {
        self.assertion_failure_written.load(Ordering::Acquire)
    }

    /// Reservations a full writer set will eventually publish.
    pub(crate) fn publish_target(&self) -> u32 {
        self.assertion_count
            .load(Ordering::Relaxed)
            .min(C as u32)
    }

    /// The recorded failures, at most `C` of them.
    pub fn failures(&mut self) -> impl Iterator<Item = &DeviceAssertion<L>> {
        let recorded = (*self.assertion_count.get_mut() as usize).min(C);
        self.assertions[..recorded]
            .iter_mut()
            .map(|slot| &*slot.get_mut())
    }
}

impl<const C: usize, const L: usize> Default for DeviceAssertionsData<C, L> {
    fn default() -> Self {
        Self::zeroed()
    }
}
