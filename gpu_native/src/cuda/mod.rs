/// PTX assembly wrappers + syscalls
pub mod intrinsics;

/// Host-side stand-in for a kernel launch: one OS thread per lane.
#[cfg(not(any(target_arch = "nvptx64")))]
pub mod emulator;

/// Halts the calling thread's instruction stream. Sibling threads keep running.
///
/// On the device this is the PTX `trap;` instruction. On the host it unwinds
/// the calling thread only, carrying a [`emulator::Trapped`] payload.
#[inline(always)]
pub fn trap() -> ! {
    #[cfg(target_arch = "nvptx64")]
    unsafe {
        intrinsics::__trap()
    }
    #[cfg(not(any(target_arch = "nvptx64")))]
    std::panic::resume_unwind(Box::new(emulator::Trapped))
}
