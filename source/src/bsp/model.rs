use glam::Vec3;

use super::{
    consts::{LumpType, MAX_MAP_MODELS},
    Lump,
};

/// Model 0 is the world, the rest are brush entities referenced as `"model" "*N"`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPModel {
    mins: Vec3,
    maxs: Vec3,
    origin: Vec3,
    headnode: i32,
    firstface: i32,
    numfaces: i32,
}

impl BSPModel {
    pub fn maxs(&self) -> Vec3 {
        self.maxs
    }

    pub fn mins(&self) -> Vec3 {
        self.mins
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn faces(&self) -> std::ops::Range<usize> {
        let first = self.firstface.max(0) as usize;
        first..first + self.numfaces.max(0) as usize
    }
}

impl Lump for BSPModel {
    fn max() -> usize {
        MAX_MAP_MODELS
    }

    fn lump_type() -> LumpType {
        LumpType::Models
    }
}
