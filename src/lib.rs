//! Host-side harness for kernels with device-side assertions.
//!
//! [`launch_checked`] allocates a zeroed assertion buffer for one launch,
//! runs the kernel under the host emulator with that buffer (or without it
//! when recording is disabled at run time) and hands the buffer back for
//! inspection once every lane has finished.

pub use gpu_macro::dsa_kernel;
pub use gpu_native::cuda::emulator::{Lane, LaunchConfig, LaunchError, LaunchReport};
pub use gpu_native::dsa::{DeviceAssertion, DeviceAssertionsData};
pub use gpu_native::kernel_assert;
pub use kernels;

/// Whether a checked launch passes its assertion buffer to the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Failed assertions are recorded, then trap.
    #[default]
    Recording,
    /// Kernels receive no buffer: failed assertions only trap.
    Disabled,
}

/// A finished launch together with the failures it recorded.
pub struct CheckedLaunch {
    pub report: LaunchReport,
    data: Box<DeviceAssertionsData>,
}

impl CheckedLaunch {
    /// Failures recorded by the launch, at most
    /// [`gpu_native::dsa::DEVICE_SIDE_ASSERTION_COUNT`] of them.
    pub fn failures(&mut self) -> impl Iterator<Item = &DeviceAssertion> {
        self.data.failures()
    }

    /// Every failure reported by a thread, whether or not it found a slot.
    pub fn assertion_count(&self) -> u32 {
        self.data.assertion_count()
    }

    /// Failures that were reported but did not fit in the buffer.
    pub fn dropped(&self) -> u32 {
        self.data
            .assertion_count()
            .saturating_sub(self.data.failures_written())
    }

    /// True once any thread of the launch failed an assertion. Nothing the
    /// launch wrote can be trusted then.
    pub fn is_poisoned(&self) -> bool {
        self.report.any_trapped() || self.data.assertion_count() > 0
    }
}

impl std::fmt::Debug for CheckedLaunch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckedLaunch")
            .field("report", &self.report)
            .field("assertion_count", &self.data.assertion_count())
            .field("failures_written", &self.data.failures_written())
            .finish()
    }
}

/// Runs `kernel` on every lane of `config`, handing it the launch's
/// assertion context.
///
/// `kernel` receives the buffer (`None` under [`RuntimeMode::Disabled`]) and
/// `caller_id`, which is the shape of the two trailing parameters
/// `#[dsa_kernel]` adds:
///
/// ```ignore
/// let mut launch = launch_checked(LaunchConfig::new(1, 8), 42, RuntimeMode::Recording, |data, caller| {
///     kernels::checked_sum(&values, &total, data, caller)
/// })?;
/// ```
pub fn launch_checked<F>(
    config: LaunchConfig,
    caller_id: u32,
    mode: RuntimeMode,
    kernel: F,
) -> Result<CheckedLaunch, LaunchError>
where
    F: Fn(Option<&DeviceAssertionsData>, u32) + Sync,
{
    let data: Box<DeviceAssertionsData> = Box::new(DeviceAssertionsData::zeroed());
    let assertions_data = match mode {
        RuntimeMode::Recording => Some(&*data),
        RuntimeMode::Disabled => {
            tracing::debug!(caller_id, "device-side assertion recording disabled for launch");
            None
        }
    };

    let report = gpu_native::cuda::emulator::launch(config, || kernel(assertions_data, caller_id))?;

    let launch = CheckedLaunch { report, data };
    if launch.assertion_count() > 0 {
        tracing::warn!(
            caller_id,
            recorded = launch.data.failures_written(),
            dropped = launch.dropped(),
            trapped_lanes = launch.report.trapped.len(),
            "kernel launch failed device-side assertions"
        );
    } else if launch.report.any_trapped() {
        tracing::warn!(
            caller_id,
            trapped_lanes = launch.report.trapped.len(),
            "kernel launch trapped without recording a failure"
        );
    }
    Ok(launch)
}
