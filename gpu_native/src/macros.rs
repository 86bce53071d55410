#[inline]
#[cold]
pub fn __cold() {}

/// Checks `condition` inside a kernel.
///
/// On failure the thread records `stringify!(condition)`, `file!()`,
/// `line!()`, the given function name, the caller id and its block/thread
/// coordinates into the launch's assertion buffer, then traps. Everything
/// the launch produces must be treated as garbage once this fires.
///
/// `#[dsa_kernel]` rewrites the short form `kernel_assert!(condition)` into
/// the full `kernel_assert!(data, caller_id, function_name; condition)`.
///
/// The condition is evaluated exactly once.
#[cfg(feature = "device-side-assertions")]
#[macro_export]
macro_rules! kernel_assert {
    ($assertions_data: expr, $caller_id: expr, $function_name: expr; $cond: expr $(,)?) => {
        if !($cond) {
            $crate::macros::__cold();
            $crate::dsa::record_failure(
                $assertions_data,
                stringify!($cond).as_bytes(),
                file!().as_bytes(),
                $function_name.as_bytes(),
                line!() as i32,
                $caller_id,
                $crate::thread_layout::Thread3D::block_idx(),
                $crate::thread_layout::Thread3D::idx(),
            );
            // No second evaluation of `$cond` for a nicer trap message: it may
            // have side effects.
            $crate::cuda::trap();
        }
    };
    ($cond: expr $(,)?) => {
        compile_error!(
            "`kernel_assert!(condition)` needs an assertion context: use it inside a \
             `#[dsa_kernel]` function or write `kernel_assert!(data, caller_id, function_name; condition)`"
        )
    };
}

/// Device-side assertions compiled out: a plain local assertion that halts
/// the whole program. The buffer and caller id are ignored.
#[cfg(not(feature = "device-side-assertions"))]
#[macro_export]
macro_rules! kernel_assert {
    ($assertions_data: expr, $caller_id: expr, $function_name: expr; $cond: expr $(,)?) => {{
        let _ = (&$assertions_data, &$caller_id, &$function_name);
        $crate::assert_universal!($cond);
    }};
    ($cond: expr $(,)?) => {
        compile_error!(
            "`kernel_assert!(condition)` needs an assertion context: use it inside a \
             `#[dsa_kernel]` function or write `kernel_assert!(data, caller_id, function_name; condition)`"
        )
    };
}

#[macro_export]
macro_rules! assert_universal {
    ($expr: expr) => {{
        #[cfg(target_arch = "nvptx64")]
        $crate::cu_assert!($expr);
        #[cfg(not(target_arch = "nvptx64"))]
        assert!($expr);
    }};
    ($expr: expr, $($arg:tt)+) => {{
        #[cfg(target_arch = "nvptx64")]
        $crate::cu_assert!($expr);
        #[cfg(not(target_arch = "nvptx64"))]
        assert!($expr, $($arg)+);
    }};
}

#[macro_export]
macro_rules! cu_assert {
    ($expr: expr) => {
        #[cfg(target_arch = "nvptx64")]
        if !($expr) {
            $crate::macros::__cold();
            unsafe {
                $crate::cuda::intrinsics::__assert_fail(
                    concat!(stringify!($expr), "\0").as_ptr(),
                    concat!(file!(), "\0").as_ptr(),
                    line!(),
                    "[fn cannot be captured]\0".as_ptr(),
                )
            };
        }
        #[cfg(not(target_arch = "nvptx64"))]
        compile_error!("Cannot call cu_assert outside PTX!");
    };
}

#[macro_export]
macro_rules! cu_panic {
    ($msg: literal) => {
        #[cfg(target_arch = "nvptx64")]
        unsafe {
            $crate::cuda::intrinsics::vprintf(concat!($msg, "\n\0").as_ptr(), core::ptr::null());
            $crate::cuda::intrinsics::__trap();
        }
        #[cfg(not(target_arch = "nvptx64"))]
        {
            compile_error!("Cannot call cu_panic outside PTX!");
        }
    };
}
