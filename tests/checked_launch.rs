use core::sync::atomic::Ordering;

use gpu_native::atomic::DeviceCounter;
use kernel_dsa::{LaunchConfig, RuntimeMode, launch_checked};

#[test]
fn passing_launch_keeps_its_output() {
    let values: Vec<u32> = (0..16).collect();
    let total = DeviceCounter::default();
    let launch = launch_checked(LaunchConfig::new(4, 4), 1, RuntimeMode::Recording, |data, caller| {
        kernel_dsa::kernels::checked_sum(&values, &total, data, caller)
    })
    .expect("launch failed");

    assert!(!launch.is_poisoned());
    assert_eq!(total.load(Ordering::Relaxed), 120);
}

#[cfg(feature = "device-side-assertions")]
mod recording {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn failures_come_back_with_their_context() {
        let values = vec![3u32; 5];
        let total = DeviceCounter::default();
        let mut launch = launch_checked(LaunchConfig::new(2, 4), 9, RuntimeMode::Recording, |data, caller| {
            kernel_dsa::kernels::checked_sum(&values, &total, data, caller)
        })
        .expect("launch failed");

        assert!(launch.is_poisoned());
        assert_eq!(launch.report.trapped.len(), 3);
        assert_eq!(launch.assertion_count(), 3);
        assert_eq!(launch.dropped(), 0);

        let mut sites: Vec<([u32; 3], [u32; 3])> = launch
            .failures()
            .map(|rec| {
                assert_eq!(rec.message(), b"idx < values.len()");
                assert_eq!(rec.function_name(), b"checked_sum");
                assert_eq!(rec.caller, 9);
                (rec.block_id, rec.thread_id)
            })
            .collect();
        sites.sort_unstable();
        assert_eq!(
            sites,
            vec![([1, 0, 0], [1, 0, 0]), ([1, 0, 0], [2, 0, 0]), ([1, 0, 0], [3, 0, 0])]
        );
    }

    #[test]
    fn overflow_is_counted_as_dropped() {
        let values: Vec<u32> = (0..32).rev().collect();
        let mut launch = launch_checked(LaunchConfig::new(2, 16), 4, RuntimeMode::Recording, |data, caller| {
            kernel_dsa::kernels::check_sorted(&values, data, caller)
        })
        .expect("launch failed");

        let capacity = gpu_native::dsa::DEVICE_SIDE_ASSERTION_COUNT;
        assert_eq!(launch.report.trapped.len(), 31);
        assert_eq!(launch.assertion_count(), 31);
        assert_eq!(launch.dropped() as usize, 31 - capacity);
        assert_eq!(launch.failures().count(), capacity);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn dropped_failures_are_the_overflow(lanes in 1u32..48) {
            // One more element than lanes, all out of order: every lane fails.
            let values: Vec<u32> = (0..=lanes).rev().collect();
            let mut launch = launch_checked(LaunchConfig::new(1, lanes), 0, RuntimeMode::Recording, |data, caller| {
                kernel_dsa::kernels::check_sorted(&values, data, caller)
            })
            .expect("launch failed");

            let capacity = gpu_native::dsa::DEVICE_SIDE_ASSERTION_COUNT as u32;
            prop_assert_eq!(launch.assertion_count(), lanes);
            prop_assert_eq!(launch.dropped(), lanes.saturating_sub(capacity));
            prop_assert_eq!(launch.failures().count() as u32, lanes.min(capacity));
            prop_assert_eq!(launch.report.trapped.len() as u32, lanes);
        }
    }

    #[test]
    fn disabled_at_run_time_records_nothing_but_still_traps() {
        let values = vec![1u32; 2];
        let total = DeviceCounter::default();
        let mut launch = launch_checked(LaunchConfig::new(1, 4), 2, RuntimeMode::Disabled, |data, caller| {
            kernel_dsa::kernels::checked_sum(&values, &total, data, caller)
        })
        .expect("launch failed");

        assert_eq!(launch.report.trapped.len(), 2);
        assert!(launch.is_poisoned());
        assert_eq!(launch.assertion_count(), 0);
        assert_eq!(launch.failures().count(), 0);
    }
}

#[cfg(not(feature = "device-side-assertions"))]
#[test]
fn compiled_out_assertions_fail_locally() {
    let values = vec![1u32; 2];
    let total = DeviceCounter::default();
    let err = launch_checked(LaunchConfig::new(1, 4), 2, RuntimeMode::Recording, |data, caller| {
        kernel_dsa::kernels::checked_sum(&values, &total, data, caller)
    })
    .expect_err("out-of-bounds lanes passed");
    assert!(matches!(err, kernel_dsa::LaunchError::LanePanicked { .. }));
}
