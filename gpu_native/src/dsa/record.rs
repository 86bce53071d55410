use core::sync::atomic::Ordering;

use super::bounded::copy_bounded;
use super::data::DeviceAssertionsData;
use crate::cuda::intrinsics::spin_wait_hint;
use crate::thread_layout::{BlockIdx3D, ThreadIdx3D};

/// Records one assertion failure into `assertions_data`.
///
/// `None` means recording is disabled at run time and nothing happens.
/// Otherwise the caller atomically reserves the next slot. If that slot is
/// within capacity the record is written and then published by bumping
/// `assertion_failure_written`. If the buffer is already full the report is
/// dropped, and the caller spins until every in-bounds writer has published,
/// so that a wave of overflowing threads cannot trap the device before the
/// recorded diagnostics are visible.
///
/// String arguments are NUL-terminated; a string that does not fit in `L - 1`
/// bytes is stored as the empty string.
#[allow(clippy::too_many_arguments)]
#[inline(never)]
#[cold]
pub fn record_failure<const C: usize, const L: usize>(
    assertions_data: Option<&DeviceAssertionsData<C, L>>,
    assertion_msg: &[u8],
    filename: &[u8],
    function_name: &[u8],
    line_number: i32,
    caller: u32,
    block_id: BlockIdx3D,
    thread_id: ThreadIdx3D,
) {
    let Some(data) = assertions_data else {
        return;
    };

    // Saturating, so a long-lived buffer never hands out slot 0 again.
    let nid = data.assertion_count.fetch_add_saturating(1, Ordering::Relaxed) as usize;

    if nid >= C {
        // Out of slots. Staying quiet avoids a flood of identical reports,
        // but returning now would let this thread trap while in-bounds
        // writers are still filling their records.
        while data.assertion_failure_written.load(Ordering::Acquire) < data.publish_target() {
            spin_wait_hint();
        }
        return;
    }

    // SAFETY: `nid < C`, and no other thread received `nid` from the
    // reservation counter. The host only reads slots after the launch.
    let slot = unsafe { &mut *data.assertions[nid].get() };
    copy_bounded(&mut slot.assertion_msg, assertion_msg);
    copy_bounded(&mut slot.filename, filename);
    copy_bounded(&mut slot.function_name, function_name);
    slot.line_number = line_number;
    slot.caller = caller;
    slot.block_id = block_id.into();
    slot.thread_id = thread_id.into();

    // Publish only after every field write.
    data.assertion_failure_written.fetch_add(1, Ordering::Release);
}
