//! Device-side assertions.
//!
//! A kernel thread that fails a check reserves a slot in a launch-wide
//! [`DeviceAssertionsData`] buffer with one atomic increment, fills it, and
//! publishes it with a second increment. When the buffer is full the report
//! is dropped, but the thread still waits for every in-bounds writer to
//! publish before it is allowed to trap.

/// Fixed-capacity string copy used for the string fields of a record.
pub mod bounded;
/// `#[repr(C)]` layout of the shared buffer and its records.
pub mod data;
/// The reserve → write → publish protocol.
pub mod record;

pub use bounded::copy_bounded;
pub use data::{DeviceAssertion, DeviceAssertionsData};
pub use record::record_failure;

/// Number of record slots in a launch's buffer.
pub const DEVICE_SIDE_ASSERTION_COUNT: usize = 10;

/// Capacity of each string field of a record, terminator included.
pub const DEVICE_SIDE_MAX_STR_LEN: usize = 512;
