use std::any::Any;
use std::cell::Cell;
use std::thread;

use crate::thread_layout::{BlockDim3D, BlockIdx3D, GridDim3D, ThreadIdx3D};

/// Upper bound on grid × block for one emulated launch. Every lane is a real
/// OS thread.
pub const MAX_EMULATED_LANES: u64 = 1024;

/// Unwind payload of [`crate::cuda::trap`] on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trapped;

/// Coordinates of one emulated hardware thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    pub block: BlockIdx3D,
    pub thread: ThreadIdx3D,
    pub block_dim: BlockDim3D,
    pub grid_dim: GridDim3D,
}

thread_local! {
    static CURRENT_LANE: Cell<Option<Lane>> = const { Cell::new(None) };
}

/// The lane the calling OS thread is emulating, if any.
pub fn current_lane() -> Option<Lane> {
    CURRENT_LANE.with(Cell::get)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid_dim: GridDim3D,
    pub block_dim: BlockDim3D,
}

impl LaunchConfig {
    pub fn new(grid_dim: impl Into<GridDim3D>, block_dim: impl Into<BlockDim3D>) -> Self {
        Self {
            grid_dim: grid_dim.into(),
            block_dim: block_dim.into(),
        }
    }

    pub fn lanes(&self) -> u64 {
        self.grid_dim.size() * self.block_dim.size()
    }

    fn validate(&self) -> Result<(), LaunchError> {
        let axes = [
            ("gridDim", 'x', self.grid_dim.x),
            ("gridDim", 'y', self.grid_dim.y),
            ("gridDim", 'z', self.grid_dim.z),
            ("blockDim", 'x', self.block_dim.x),
            ("blockDim", 'y', self.block_dim.y),
            ("blockDim", 'z', self.block_dim.z),
        ];
        if let Some(&(what, axis, _)) = axes.iter().find(|(_, _, n)| *n == 0) {
            return Err(LaunchError::EmptyDimension { what, axis });
        }
        if self.lanes() > MAX_EMULATED_LANES {
            return Err(LaunchError::TooManyLanes {
                requested: self.lanes(),
                limit: MAX_EMULATED_LANES,
            });
        }
        Ok(())
    }

    fn iter_lanes(&self) -> impl Iterator<Item = Lane> + '_ {
        let (g, b) = (self.grid_dim, self.block_dim);
        let blocks = (0..g.z).flat_map(move |z| {
            (0..g.y).flat_map(move |y| (0..g.x).map(move |x| BlockIdx3D::new(x, y, z)))
        });
        blocks.flat_map(move |block| {
            (0..b.z).flat_map(move |z| {
                (0..b.y).flat_map(move |y| {
                    (0..b.x).map(move |x| Lane {
                        block,
                        thread: ThreadIdx3D::new(x, y, z),
                        block_dim: b,
                        grid_dim: g,
                    })
                })
            })
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("{what}.{axis} is zero")]
    EmptyDimension { what: &'static str, axis: char },

    #[error("launch of {requested} lanes exceeds the emulator limit of {limit}")]
    TooManyLanes { requested: u64, limit: u64 },

    #[error("unable to spawn lane thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("lane {lane:?} panicked: {message}")]
    LanePanicked { lane: Lane, message: String },
}

/// What happened to the lanes of a finished launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub lanes: u64,
    /// Lanes that ended in [`crate::cuda::trap`], in spawn order.
    pub trapped: Vec<Lane>,
}

impl LaunchReport {
    pub fn any_trapped(&self) -> bool {
        !self.trapped.is_empty()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "[non-string panic payload]".to_string()
    }
}

/// Runs `kernel` once per lane of `config`, all lanes concurrently.
///
/// A lane that traps ends on its own; the rest of the launch keeps going.
/// Any other panic in a lane is reported as [`LaunchError::LanePanicked`]
/// once every lane has finished.
pub fn launch<F>(config: LaunchConfig, kernel: F) -> Result<LaunchReport, LaunchError>
where
    F: Fn() + Sync,
{
    config.validate()?;
    tracing::debug!(
        lanes = config.lanes(),
        grid = ?config.grid_dim,
        block = ?config.block_dim,
        "emulating kernel launch"
    );

    let kernel = &kernel;
    let outcomes = thread::scope(|s| {
        let mut handles = Vec::with_capacity(config.lanes() as usize);
        let mut spawn_error = None;
        for lane in config.iter_lanes() {
            let spawned = thread::Builder::new()
                .name(format!(
                    "lane-b{},{},{}-t{},{},{}",
                    lane.block.x, lane.block.y, lane.block.z, lane.thread.x, lane.thread.y, lane.thread.z
                ))
                .spawn_scoped(s, move || {
                    CURRENT_LANE.with(|c| c.set(Some(lane)));
                    kernel();
                });
            match spawned {
                Ok(handle) => handles.push((lane, handle)),
                Err(e) => {
                    spawn_error = Some(e);
                    break;
                }
            }
        }
        // Join explicitly: an unjoined trapped lane would make `scope` panic.
        let joined: Vec<_> = handles
            .into_iter()
            .map(|(lane, handle)| (lane, handle.join()))
            .collect();
        match spawn_error {
            Some(e) => Err(LaunchError::from(e)),
            None => Ok(joined),
        }
    })?;

    let mut report = LaunchReport {
        lanes: config.lanes(),
        trapped: vec![],
    };
    let mut first_panic = None;
    for (lane, outcome) in outcomes {
        match outcome {
            Ok(()) => {}
            Err(payload) if payload.is::<Trapped>() => {
                tracing::debug!(?lane, "lane trapped");
                report.trapped.push(lane);
            }
            Err(payload) => {
                first_panic.get_or_insert(LaunchError::LanePanicked {
                    lane,
                    message: panic_message(payload.as_ref()),
                });
            }
        }
    }
    if let Some(err) = first_panic {
        return Err(err);
    }
    tracing::debug!(
        lanes = report.lanes,
        trapped = report.trapped.len(),
        "emulated launch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::atomic::DeviceCounter;
    use crate::thread_layout::Thread3D;
    use core::sync::atomic::Ordering;

    #[test]
    fn every_lane_runs_once() {
        let ran = DeviceCounter::default();
        let report = launch(LaunchConfig::new(4, (8, 2)), || {
            ran.fetch_add(1, Ordering::Relaxed);
        })
        .expect("launch failed");
        assert_eq!(report.lanes, 64);
        assert!(!report.any_trapped());
        assert_eq!(ran.load(Ordering::Relaxed), 64);
    }

    #[test]
    fn trap_ends_only_the_calling_lane() {
        let finished = DeviceCounter::default();
        let report = launch(LaunchConfig::new(2, 4), || {
            if Thread3D::idx().x == 1 {
                crate::cuda::trap();
            }
            finished.fetch_add(1, Ordering::Relaxed);
        })
        .expect("launch failed");
        assert_eq!(finished.load(Ordering::Relaxed), 6);
        assert_eq!(report.trapped.len(), 2);
        assert!(report.trapped.iter().all(|lane| lane.thread.x == 1));
        assert_eq!(report.trapped[0].block, BlockIdx3D::new(0, 0, 0));
        assert_eq!(report.trapped[1].block, BlockIdx3D::new(1, 0, 0));
    }

    #[test]
    fn lane_coordinates_are_installed() {
        launch(LaunchConfig::new((1, 2), (1, 1)), || {
            let lane = current_lane().expect("no lane installed");
            assert_eq!(lane.thread, Thread3D::idx());
            assert_eq!(lane.block, Thread3D::block_idx());
        })
        .expect("launch failed");
        assert_eq!(current_lane(), None);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let err = launch(LaunchConfig::new(GridDim3D::new(1, 0, 1), 1), || {}).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::EmptyDimension {
                what: "gridDim",
                axis: 'y'
            }
        ));
    }

    #[test]
    fn oversized_launch_is_rejected() {
        let err = launch(LaunchConfig::new(2, 1024), || {}).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::TooManyLanes {
                requested: 2048,
                limit: MAX_EMULATED_LANES
            }
        ));
    }

    #[test]
    fn ordinary_panics_are_errors() {
        let err = launch(LaunchConfig::new(1, 2), || {
            if Thread3D::idx().x == 1 {
                panic!("boom");
            }
        })
        .unwrap_err();
        match err {
            LaunchError::LanePanicked { lane, message } => {
                assert_eq!(lane.thread, ThreadIdx3D::new(1, 0, 0));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
