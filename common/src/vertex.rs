use glam::{Vec2, Vec3};

/// Anything a mesh builder can collect.
pub trait Vertex: Copy + Default {
    fn position(&self) -> Vec3;
    /// Vertices without a normal attribute ignore this.
    fn set_normal(&mut self, _normal: Vec3) {}
}

/// Render vertex of an imported map surface.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UVVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Displacement blend alpha, 1.0 on brush faces
    pub alpha: f32,
}

impl Vertex for UVVertex {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_normal(&mut self, normal: Vec3) {
        self.normal = normal;
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionVertex {
    pub position: Vec3,
}

impl Vertex for PositionVertex {
    fn position(&self) -> Vec3 {
        self.position
    }
}
