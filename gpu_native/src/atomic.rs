use core::{cell::UnsafeCell, sync::atomic::Ordering};

macro_rules! impl_atomic_op {
    ($name:ident, $op:ident, $type:ty, $reg_ty: ident) => {
        #[cfg(target_arch = "nvptx64")]
        #[inline(always)]
        #[allow(unused)]
        pub unsafe fn $name(ptr: *mut $type, val: $type, order: Ordering) -> $type {
            let old_val: $type;
            match order {
                Ordering::Relaxed => unsafe {
                    core::arch::asm!(
                        concat!("atom.relaxed.global.", stringify!($op), ".", stringify!($type), " {0}, [{1}], {2};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) val,
                    )
                },
                Ordering::Acquire => unsafe {
                    core::arch::asm!(
                        concat!("atom.acquire.global.", stringify!($op), ".", stringify!($type), " {0}, [{1}], {2};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) val,
                    )
                },
                Ordering::Release => unsafe {
                    core::arch::asm!(
                        concat!("atom.release.global.", stringify!($op), ".", stringify!($type), " {0}, [{1}], {2};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) val,
                    )
                },
                Ordering::AcqRel => unsafe {
                    core::arch::asm!(
                        concat!("atom.acq_rel.global.", stringify!($op), ".", stringify!($type), " {0}, [{1}], {2};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) val,
                    )
                },
                Ordering::SeqCst => {
                    crate::cu_panic!("SeqCst is not supported on CUDA devices.");
                },
                _ => {
                    crate::cu_panic!("Unsupported ordering!");
                },
            };
            old_val
        }
    };
}

macro_rules! impl_atomic_load {
    ($name:ident, $type:ty, $reg_ty: ident) => {
        #[cfg(target_arch = "nvptx64")]
        #[inline(always)]
        #[allow(unused)]
        pub unsafe fn $name(ptr: *const $type, order: Ordering) -> $type {
            let val: $type;
            match order {
                Ordering::Relaxed => unsafe {
                    core::arch::asm!(
                        concat!("ld.relaxed.gpu.global.", stringify!($type), " {0}, [{1}];"),
                        out($reg_ty) val,
                        in(reg64) ptr,
                    )
                },
                Ordering::Acquire => unsafe {
                    core::arch::asm!(
                        concat!("ld.acquire.gpu.global.", stringify!($type), " {0}, [{1}];"),
                        out($reg_ty) val,
                        in(reg64) ptr,
                    )
                },
                _ => {
                    crate::cu_panic!("Loads only support Relaxed and Acquire.");
                },
            };
            val
        }
    };
}

macro_rules! impl_atomic_cas {
    ($name:ident, $type:ty, $bits:ident, $reg_ty: ident) => {
        #[cfg(target_arch = "nvptx64")]
        #[inline(always)]
        #[allow(unused)]
        pub unsafe fn $name(ptr: *mut $type, current: $type, new: $type, order: Ordering) -> $type {
            let old_val: $type;
            match order {
                Ordering::Relaxed => unsafe {
                    core::arch::asm!(
                        concat!("atom.relaxed.global.cas.", stringify!($bits), " {0}, [{1}], {2}, {3};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) current,
                        in($reg_ty) new,
                    )
                },
                Ordering::Acquire => unsafe {
                    core::arch::asm!(
                        concat!("atom.acquire.global.cas.", stringify!($bits), " {0}, [{1}], {2}, {3};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) current,
                        in($reg_ty) new,
                    )
                },
                Ordering::Release => unsafe {
                    core::arch::asm!(
                        concat!("atom.release.global.cas.", stringify!($bits), " {0}, [{1}], {2}, {3};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) current,
                        in($reg_ty) new,
                    )
                },
                Ordering::AcqRel => unsafe {
                    core::arch::asm!(
                        concat!("atom.acq_rel.global.cas.", stringify!($bits), " {0}, [{1}], {2}, {3};"),
                        out($reg_ty) old_val,
                        in(reg64) ptr,
                        in($reg_ty) current,
                        in($reg_ty) new,
                    )
                },
                _ => {
                    crate::cu_panic!("Unsupported ordering!");
                },
            };
            old_val
        }
    };
}

impl_atomic_op!(atomic_add_u32, add, u32, reg32);
impl_atomic_load!(atomic_load_u32, u32, reg32);
impl_atomic_cas!(atomic_cas_u32, u32, b32, reg32);

/// A `u32` counter living in memory shared by every thread of a launch.
///
/// The layout is a bare `u32`, so a buffer containing counters can be
/// decoded on the host as plain integers.
#[repr(C, align(4))]
pub struct DeviceCounter {
    v: UnsafeCell<u32>,
}

// SAFETY: every access goes through an atomic instruction.
unsafe impl Sync for DeviceCounter {}

impl DeviceCounter {
    #[inline(always)]
    pub const fn new(v: u32) -> Self {
        Self {
            v: UnsafeCell::new(v),
        }
    }

    /// # Safety
    ///
    /// * `ptr` must be aligned to align_of::<DeviceCounter>
    /// * `ptr` must be [valid] for both reads and writes for the whole lifetime `'a`.
    /// * You must adhere to the [Memory model for atomic accesses]. In particular, it is not
    ///   allowed to mix atomic and non-atomic accesses, or atomic accesses of different sizes,
    ///   without synchronization.
    ///
    /// [Memory model for atomic accesses]: https://doc.rust-lang.org/std/sync/atomic/#memory-model-for-atomic-accesses
    #[inline(always)]
    #[allow(unused)]
    pub const unsafe fn from_ptr<'a>(ptr: *mut u32) -> &'a Self {
        // SAFETY: guaranteed by the caller
        unsafe { &*ptr.cast() }
    }

    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut u32 {
        self.v.get_mut()
    }

    #[inline(always)]
    pub fn into_inner(self) -> u32 {
        self.v.into_inner()
    }

    /// Adds to the counter, returning the previous value.
    #[inline(always)]
    pub fn fetch_add(&self, val: u32, order: Ordering) -> u32 {
        #[cfg(target_arch = "nvptx64")]
        unsafe {
            return atomic_add_u32(self.v.get(), val, order);
        }
        #[cfg(not(any(target_arch = "nvptx64")))]
        unsafe { core::sync::atomic::AtomicU32::from_ptr(self.v.get()) }.fetch_add(val, order)
    }

    /// Stores `new` if the counter still holds `current`. Returns the
    /// previous value, as `Ok` when the store happened. Failed comparisons
    /// load with `Relaxed`.
    #[inline(always)]
    pub fn compare_exchange(&self, current: u32, new: u32, order: Ordering) -> Result<u32, u32> {
        #[cfg(target_arch = "nvptx64")]
        {
            let prev = unsafe { atomic_cas_u32(self.v.get(), current, new, order) };
            return if prev == current { Ok(prev) } else { Err(prev) };
        }
        #[cfg(not(any(target_arch = "nvptx64")))]
        unsafe { core::sync::atomic::AtomicU32::from_ptr(self.v.get()) }.compare_exchange(
            current,
            new,
            order,
            Ordering::Relaxed,
        )
    }

    /// Like [`Self::fetch_add`], but sticks at `u32::MAX` instead of wrapping.
    pub fn fetch_add_saturating(&self, val: u32, order: Ordering) -> u32 {
        let mut current = self.load(Ordering::Relaxed);
        loop {
            let new = current.saturating_add(val);
            if new == current {
                return current;
            }
            match self.compare_exchange(current, new, order) {
                Ok(prev) => return prev,
                Err(actual) => current = actual,
            }
        }
    }

    /// `order` must be `Relaxed` or `Acquire`.
    #[inline(always)]
    pub fn load(&self, order: Ordering) -> u32 {
        #[cfg(target_arch = "nvptx64")]
        unsafe {
            return atomic_load_u32(self.v.get(), order);
        }
        #[cfg(not(any(target_arch = "nvptx64")))]
        unsafe { core::sync::atomic::AtomicU32::from_ptr(self.v.get()) }.load(order)
    }
}

impl Default for DeviceCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl core::fmt::Debug for DeviceCounter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("DeviceCounter")
            .field(&self.load(Ordering::Relaxed))
            .finish()
    }
}
