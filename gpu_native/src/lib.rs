#![cfg_attr(target_arch = "nvptx64", no_std)]
// Necessary because PTX + kernels are not really stable
#![cfg_attr(target_arch = "nvptx64", feature(abi_ptx))]
#![cfg_attr(target_arch = "nvptx64", feature(asm_experimental_arch))]
// LLVM intrinsics are used for e.g. getting blockIdx.x from a special register.
#![cfg_attr(target_arch = "nvptx64", allow(internal_features))]
#![cfg_attr(target_arch = "nvptx64", feature(link_llvm_intrinsics))]

// Lets `#[dsa_kernel]` expansions (which name `::gpu_native`) work inside this crate.
extern crate self as gpu_native;

/// Atomic primitives, particularly because some core::sync::atomic types
/// do not link well on nvptx64.
pub mod atomic;
/// Wrappers around PTX assembly + syscalls, the thread trap, and the host
/// launch emulator.
pub mod cuda;
/// Device-side assertions: the shared failure buffer and the recorder that
/// fills it.
pub mod dsa;
/// Declarative macros, especially `kernel_assert!` and `assert_universal!`
pub mod macros;
/// Thread layout primitives like `ThreadIdx3D` and the `Thread3D` accessors.
pub mod thread_layout;
