// threadIdx, blockIdx, blockDim, gridDim objects. Assertion records always
// carry all three axes, so only the 3D forms exist.

#[allow(unused)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ThreadIdx3D {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[allow(unused)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockIdx3D {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[allow(unused)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockDim3D {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[allow(unused)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDim3D {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl ThreadIdx3D {
    #[allow(unused)]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

impl BlockIdx3D {
    #[allow(unused)]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

impl BlockDim3D {
    #[allow(unused)]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub const fn size(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}

impl GridDim3D {
    #[allow(unused)]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub const fn size(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}

impl From<u32> for BlockDim3D {
    fn from(value: u32) -> Self {
        Self::new(value, 1, 1)
    }
}

impl From<(u32, u32)> for BlockDim3D {
    fn from(value: (u32, u32)) -> Self {
        Self::new(value.0, value.1, 1)
    }
}

impl From<u32> for GridDim3D {
    fn from(value: u32) -> Self {
        Self::new(value, 1, 1)
    }
}

impl From<(u32, u32)> for GridDim3D {
    fn from(value: (u32, u32)) -> Self {
        Self::new(value.0, value.1, 1)
    }
}

impl From<ThreadIdx3D> for [u32; 3] {
    fn from(value: ThreadIdx3D) -> Self {
        [value.x, value.y, value.z]
    }
}

impl From<BlockIdx3D> for [u32; 3] {
    fn from(value: BlockIdx3D) -> Self {
        [value.x, value.y, value.z]
    }
}

pub struct ThreadIdx<const DIM: usize>;

#[allow(unused)]
pub type Thread3D = ThreadIdx<3>;

#[cfg(target_arch = "nvptx64")]
impl Thread3D {
    #[inline(always)]
    #[allow(unused)]
    pub fn idx() -> ThreadIdx3D {
        unsafe {
            ThreadIdx3D {
                x: crate::cuda::intrinsics::__thread_idx_x() as u32,
                y: crate::cuda::intrinsics::__thread_idx_y() as u32,
                z: crate::cuda::intrinsics::__thread_idx_z() as u32,
            }
        }
    }
    #[inline(always)]
    #[allow(unused)]
    pub fn block_idx() -> BlockIdx3D {
        unsafe {
            BlockIdx3D {
                x: crate::cuda::intrinsics::__block_idx_x() as u32,
                y: crate::cuda::intrinsics::__block_idx_y() as u32,
                z: crate::cuda::intrinsics::__block_idx_z() as u32,
            }
        }
    }
    #[inline(always)]
    #[allow(unused)]
    pub fn block() -> BlockDim3D {
        unsafe {
            BlockDim3D {
                x: crate::cuda::intrinsics::__block_dim_x() as u32,
                y: crate::cuda::intrinsics::__block_dim_y() as u32,
                z: crate::cuda::intrinsics::__block_dim_z() as u32,
            }
        }
    }
    #[inline(always)]
    #[allow(unused)]
    pub fn grid() -> GridDim3D {
        unsafe {
            GridDim3D {
                x: crate::cuda::intrinsics::__grid_dim_x() as u32,
                y: crate::cuda::intrinsics::__grid_dim_y() as u32,
                z: crate::cuda::intrinsics::__grid_dim_z() as u32,
            }
        }
    }
}

// On the host the "special registers" are the coordinates the emulator
// installed for the current lane.
#[cfg(not(any(target_arch = "nvptx64")))]
impl Thread3D {
    fn lane() -> crate::cuda::emulator::Lane {
        crate::cuda::emulator::current_lane()
            .unwrap_or_else(|| panic!("Attempting to read thread coordinates from host code outside an emulated launch!"))
    }
    #[allow(unused)]
    pub fn idx() -> ThreadIdx3D {
        Self::lane().thread
    }
    #[allow(unused)]
    pub fn block_idx() -> BlockIdx3D {
        Self::lane().block
    }
    #[allow(unused)]
    pub fn block() -> BlockDim3D {
        Self::lane().block_dim
    }
    #[allow(unused)]
    pub fn grid() -> GridDim3D {
        Self::lane().grid_dim
    }
}

impl Thread3D {
    /// Flat index of the calling thread across the whole grid, x fastest.
    #[inline(always)]
    pub fn global_linear_idx() -> usize {
        let (t, b, bd, gd) = (Self::idx(), Self::block_idx(), Self::block(), Self::grid());
        let in_block = t.x as usize
            + t.y as usize * bd.x as usize
            + t.z as usize * bd.x as usize * bd.y as usize;
        let block = b.x as usize
            + b.y as usize * gd.x as usize
            + b.z as usize * gd.x as usize * gd.y as usize;
        block * bd.size() as usize + in_block
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cuda::emulator::{LaunchConfig, launch};
    use std::sync::Mutex;

    #[test]
    fn global_linear_idx_covers_grid_once() {
        let seen = Mutex::new(Vec::new());
        let config = LaunchConfig::new(GridDim3D::new(2, 2, 1), BlockDim3D::new(3, 1, 2));
        launch(config, || {
            seen.lock().unwrap().push(Thread3D::global_linear_idx());
        })
        .expect("launch failed");
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn dims_are_visible_inside_a_lane() {
        let config = LaunchConfig::new(GridDim3D::from(3), BlockDim3D::from((2, 2)));
        launch(config, || {
            assert_eq!(Thread3D::grid(), GridDim3D::new(3, 1, 1));
            assert_eq!(Thread3D::block(), BlockDim3D::new(2, 2, 1));
            assert!(Thread3D::block_idx().x < 3);
            assert!(Thread3D::idx().y < 2);
        })
        .expect("launch failed");
    }

    #[test]
    #[should_panic(expected = "outside an emulated launch")]
    fn reading_coordinates_outside_a_launch_panics() {
        let _ = Thread3D::idx();
    }

    #[test]
    fn coordinates_flatten_in_axis_order() {
        assert_eq!(<[u32; 3]>::from(BlockIdx3D::new(1, 2, 3)), [1, 2, 3]);
        assert_eq!(<[u32; 3]>::from(ThreadIdx3D::new(4, 5, 6)), [4, 5, 6]);
    }
}
