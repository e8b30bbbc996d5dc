use ahash::{AHashMap, AHashSet};
use common::prelude::*;
use flagset::FlagSet;
use glam::{Vec2, Vec3};

use crate::{
    bsp::{
        consts::SurfaceFlags, displacement::BSPDispInfo, BspFile, FaceVertex, FacePolygon,
    },
    materials::MaterialMap,
    settings::ImporterSettings,
};

/// Surfaces that are never drawn in game.
fn tool_surfaces() -> FlagSet<SurfaceFlags> {
    SurfaceFlags::NoDraw
        | SurfaceFlags::Sky
        | SurfaceFlags::Sky2d
        | SurfaceFlags::Skip
        | SurfaceFlags::Hint
        | SurfaceFlags::Trigger
}

/// Surfaces with no collision.
fn non_solid_surfaces() -> FlagSet<SurfaceFlags> {
    SurfaceFlags::Hint | SurfaceFlags::Skip | SurfaceFlags::Trigger
}

#[derive(Clone, Debug, Default)]
pub struct MeshBuilder<V: Vertex> {
    tris: Vec<u32>,
    verts: Vec<V>,
}

impl<V: Vertex> MeshBuilder<V> {
    pub fn push_vert(&mut self, vert: V) -> u32 {
        self.verts.push(vert);
        self.verts.len() as u32 - 1
    }

    pub fn add_tri(&mut self, tri: [u32; 3]) {
        self.tris.extend(tri);
    }

    /// Adds a polygon given in clockwise order as a fan that is counter clockwise from the front.
    pub fn add_polygon(&mut self, verts: impl IntoIterator<Item = V>) {
        let first = self.verts.len() as u32;
        self.verts.extend(verts);
        let count = self.verts.len() as u32 - first;
        for t in 0..count.saturating_sub(2) {
            self.add_tri([first, first + t + 2, first + t + 1]);
        }
    }

    /// Copies `other` in after the current contents.
    pub fn append(&mut self, other: &MeshBuilder<V>) {
        let base = self.verts.len() as u32;
        self.verts.extend_from_slice(&other.verts);
        self.tris.extend(other.tris.iter().map(|i| i + base));
    }

    /// Sets the normal of every vertex from `first_vert` on to the area weighted average of
    /// the triangles using it.
    pub fn compute_smooth_normals(&mut self, first_vert: usize) {
        let mut normals = vec![Vec3::ZERO; self.verts.len().saturating_sub(first_vert)];
        for tri in self.tris.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
            if a < first_vert || b < first_vert || c < first_vert {
                continue;
            }
            let pa = self.verts[a].position();
            let n = (self.verts[b].position() - pa).cross(self.verts[c].position() - pa);
            for i in [a, b, c] {
                normals[i - first_vert] += n;
            }
        }
        for (vert, n) in self.verts[first_vert..].iter_mut().zip(normals) {
            vert.set_normal(n.normalize_or_zero());
        }
    }

    pub fn tris(&self) -> &[u32] {
        &self.tris
    }

    pub fn verts(&self) -> &[V] {
        &self.verts
    }

    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }
}

/// Triangles sharing one Source texture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshSection {
    pub texture: String,
    /// Host material from the material map.
    pub material: Option<String>,
    pub reflectivity: Vec3,
    pub vertices: Vec<UVVertex>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionMesh {
    pub vertices: Vec<PositionVertex>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticMesh {
    pub sections: Vec<MeshSection>,
    pub collision: Option<CollisionMesh>,
}

impl StaticMesh {
    /// Axis aligned bounds of every render vertex, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.sections
            .iter()
            .flat_map(|s| &s.vertices)
            .map(|v| v.position)
            .fold(None, |bounds, p| match bounds {
                None => Some((p, p)),
                Some((min, max)) => Some((min.min(p), max.max(p))),
            })
    }

    pub fn vertex_count(&self) -> usize {
        self.sections.iter().map(|s| s.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.sections.iter().map(|s| s.indices.len() / 3).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

struct SectionBuilder {
    texture: String,
    tex_data: Option<usize>,
    mesh: MeshBuilder<UVVertex>,
}

/// Collects sections in the order their textures are first seen.
#[derive(Default)]
struct Sections {
    lookup: AHashMap<String, usize>,
    sections: Vec<SectionBuilder>,
}

impl Sections {
    fn get(&mut self, polygon: &FacePolygon) -> &mut MeshBuilder<UVVertex> {
        let index = *self
            .lookup
            .entry(polygon.texture_name.clone())
            .or_insert_with(|| {
                self.sections.push(SectionBuilder {
                    texture: polygon.texture_name.clone(),
                    tex_data: polygon.tex_data,
                    mesh: MeshBuilder::default(),
                });
                self.sections.len() - 1
            });
        &mut self.sections[index].mesh
    }
}

fn render_vertex(transform: &SourceTransform, v: &FaceVertex, normal: Vec3) -> UVVertex {
    UVVertex {
        position: transform.point(v.position),
        normal,
        uv: v.uv,
        alpha: 1.0,
    }
}

/// Front facing normal of a clockwise polygon.
fn polygon_normal(mut points: impl Iterator<Item = Vec3>) -> Vec3 {
    let Some(first) = points.next() else {
        return Vec3::ZERO;
    };
    let rest: Vec<Vec3> = points.collect();
    let sum = rest
        .windows(2)
        .map(|w| (w[0] - first).cross(w[1] - first))
        .fold(Vec3::ZERO, |a, b| a + b);
    (-sum).normalize_or_zero()
}

/// The displaced grid in Source units, along with the face it replaces.
fn build_displacement<'a>(
    bsp: &'a BspFile,
    index: usize,
    disp: &BSPDispInfo,
) -> Option<(MeshBuilder<UVVertex>, &'a FacePolygon)> {
    let Some(side) = disp.side_len() else {
        log::warn!("Displacement {index} has power {}, skipping it", disp.power);
        return None;
    };
    let Some(disp_verts) = disp.verts(bsp.disp_verts()) else {
        log::warn!(
            "Displacement {index} vertices start at {} past the {} disp verts, skipping it",
            disp.disp_vert_start,
            bsp.disp_verts().len()
        );
        return None;
    };
    let Some(polygon) = bsp.polygon_for_face(disp.map_face as usize) else {
        log::warn!(
            "Displacement {index} uses face {} which does not exist, skipping it",
            disp.map_face
        );
        return None;
    };
    let corners = bsp.polygon_vertices(polygon);
    if corners.len() != 4 {
        log::warn!(
            "Displacement {index} face has {} corners instead of 4, skipping it",
            corners.len()
        );
        return None;
    }

    let start = (0..4)
        .min_by(|&a, &b| {
            let da = corners[a].position.distance_squared(disp.start_position);
            let db = corners[b].position.distance_squared(disp.start_position);
            da.total_cmp(&db)
        })
        .unwrap_or(0);
    let c: [Vec3; 4] = std::array::from_fn(|k| corners[(start + k) % 4].position);

    let step = (side - 1) as f32;
    let flat = |x: usize, y: usize| {
        let ty = y as f32 / step;
        let left = c[0].lerp(c[1], ty);
        let right = c[3].lerp(c[2], ty);
        left.lerp(right, x as f32 / step)
    };

    let mut mesh = MeshBuilder::default();
    for y in 0..side {
        for x in 0..side {
            let base = flat(x, y);
            let dv = &disp_verts[y * side + x];
            mesh.push_vert(UVVertex {
                position: base + dv.offset(),
                normal: Vec3::ZERO,
                uv: bsp.texture_uv(base, polygon.tex_info),
                alpha: dv.alpha / 255.0,
            });
        }
    }

    let front = polygon_normal(corners.iter().map(|v| v.position));
    let flat_normal = (flat(1, 0) - flat(0, 0)).cross(flat(1, 1) - flat(0, 0));
    let flip = flat_normal.dot(front) < 0.0;

    let at = |x: usize, y: usize| (y * side + x) as u32;
    for y in 0..side - 1 {
        for x in 0..side - 1 {
            let (a, b, c, d) = (at(x, y), at(x + 1, y), at(x, y + 1), at(x + 1, y + 1));
            if flip {
                mesh.add_tri([a, d, b]);
                mesh.add_tri([a, c, d]);
            } else {
                mesh.add_tri([a, b, d]);
                mesh.add_tri([a, d, c]);
            }
        }
    }

    Some((mesh, polygon))
}

/// Builds the render sections and collision of a whole map.
pub fn build_static_mesh(
    bsp: &BspFile,
    settings: &ImporterSettings,
    materials: &MaterialMap,
) -> StaticMesh {
    let transform = settings.transform();
    let mut sections = Sections::default();
    let mut collision = MeshBuilder::<PositionVertex>::default();

    // A face belongs to a displacement when either side of the link names the other.
    let displaced_faces: AHashSet<usize> = bsp
        .disp_infos()
        .iter()
        .map(|d| d.map_face as usize)
        .collect();
    let is_displacement = |p: &FacePolygon| {
        p.disp_info.is_some_and(|d| d < bsp.disp_infos().len())
            || displaced_faces.contains(&p.source_face)
    };

    for polygon in bsp.polygons().iter().filter(|p| !is_displacement(p)) {
        let verts = bsp.polygon_vertices(polygon);

        if settings.import_collision && (polygon.flags & non_solid_surfaces()).is_empty() {
            collision.add_polygon(verts.iter().map(|v| PositionVertex {
                position: transform.point(v.position),
            }));
        }

        if settings.skip_tool_surfaces && !(polygon.flags & tool_surfaces()).is_empty() {
            continue;
        }

        let normal = transform.normal(polygon_normal(verts.iter().map(|v| v.position)));
        sections
            .get(polygon)
            .add_polygon(verts.iter().map(|v| render_vertex(&transform, v, normal)));
    }

    let mut displacements = 0;
    for (index, disp) in bsp.disp_infos().iter().enumerate() {
        let Some((mut mesh, polygon)) = build_displacement(bsp, index, disp)
        else {
            continue;
        };
        displacements += 1;

        for v in &mut mesh.verts {
            v.position = transform.point(v.position);
        }
        mesh.compute_smooth_normals(0);

        if settings.import_collision {
            let first = collision.verts.len() as u32;
            collision.verts.extend(mesh.verts.iter().map(|v| PositionVertex {
                position: v.position,
            }));
            collision.tris.extend(mesh.tris.iter().map(|i| i + first));
        }

        if settings.skip_tool_surfaces && !(polygon.flags & tool_surfaces()).is_empty() {
            continue;
        }
        sections.get(polygon).append(&mesh);
    }

    let sections: Vec<MeshSection> = sections
        .sections
        .into_iter()
        .filter(|s| !s.mesh.is_empty())
        .map(|s| MeshSection {
            material: materials.resolve(&s.texture).map(str::to_owned),
            reflectivity: s
                .tex_data
                .and_then(|d| bsp.textures().get(d))
                .map_or(Vec3::ONE, |t| t.reflectivity),
            texture: s.texture,
            vertices: s.mesh.verts,
            indices: s.mesh.tris,
        })
        .collect();

    let collision = (settings.import_collision && !collision.is_empty()).then(|| CollisionMesh {
        vertices: collision.verts,
        indices: collision.tris,
    });

    let mesh = StaticMesh {
        sections,
        collision,
    };
    log::info!(
        "Built static mesh: Sections={} Verts={} Tris={} Displacements={} Collision={}",
        mesh.sections.len(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        displacements,
        mesh.collision.as_ref().map_or(0, |c| c.indices.len() / 3)
    );
    mesh
}

impl MeshSection {
    /// Texture coordinates of every vertex, for hosts that store attributes separately.
    pub fn uvs(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.vertices.iter().map(|v| v.uv)
    }
}

#[cfg(test)]
mod meshes_tests {
    use glam::vec3;

    use crate::{
        bsp::consts::{num_disp_power_tris, num_disp_power_verts},
        test_util::TestMap,
    };

    use super::*;

    const S: [f32; 4] = [1.0, 0.0, 0.0, 0.0];
    const T: [f32; 4] = [0.0, 1.0, 0.0, 0.0];

    fn floor(z: f32) -> [Vec3; 4] {
        [
            vec3(0.0, 0.0, z),
            vec3(0.0, 64.0, z),
            vec3(64.0, 64.0, z),
            vec3(64.0, 0.0, z),
        ]
    }

    fn raw_settings() -> ImporterSettings {
        ImporterSettings {
            world_scale: 1.0,
            flip_yz: false,
            ..Default::default()
        }
    }

    fn build(map: &TestMap, settings: &ImporterSettings) -> StaticMesh {
        let bsp = BspFile::from_bytes(&map.build()).unwrap();
        build_static_mesh(&bsp, settings, &MaterialMap::default())
    }

    fn tri_normal(verts: &[UVVertex], tri: &[u32]) -> Vec3 {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| verts[i as usize].position);
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn fan_triangulates_and_faces_front() {
        let mut map = TestMap::new();
        let tex = map.texture("concrete/floor01", 64, 64, S, T, 0);
        // a pentagon
        map.face(
            &[
                vec3(0.0, 0.0, 0.0),
                vec3(0.0, 64.0, 0.0),
                vec3(32.0, 96.0, 0.0),
                vec3(64.0, 64.0, 0.0),
                vec3(64.0, 0.0, 0.0),
            ],
            tex,
        );
        let mesh = build(&map, &raw_settings());

        assert_eq!(mesh.sections.len(), 1);
        let section = &mesh.sections[0];
        assert_eq!(section.vertices.len(), 5);
        assert_eq!(section.indices.len(), 3 * 3);
        for tri in section.indices.chunks(3) {
            assert!(tri_normal(&section.vertices, tri).dot(Vec3::Z) > 0.99);
        }
        assert!(section
            .vertices
            .iter()
            .all(|v| v.normal.abs_diff_eq(Vec3::Z, 1e-6)));
        assert_eq!(section.reflectivity, vec3(0.5, 0.25, 0.125));
    }

    #[test]
    fn sections_follow_first_seen_texture_order() {
        let mut map = TestMap::new();
        let b = map.texture("b", 64, 64, S, T, 0);
        let a = map.texture("a", 64, 64, S, T, 0);
        map.face(&floor(0.0), b);
        map.face(&floor(1.0), a);
        map.face(&floor(2.0), b);
        let mesh = build(&map, &raw_settings());

        let names: Vec<_> = mesh.sections.iter().map(|s| s.texture.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(mesh.sections[0].indices.len(), 12);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 6);
    }

    #[test]
    fn tool_surfaces_are_collision_only() {
        let mut map = TestMap::new();
        let wall = map.texture("brick/wall", 64, 64, S, T, 0);
        let nodraw = map.texture("tools/toolsnodraw", 64, 64, S, T, 0x80);
        let trigger = map.texture("tools/toolstrigger", 64, 64, S, T, 0x40);
        map.face(&floor(0.0), wall);
        map.face(&floor(1.0), nodraw);
        map.face(&floor(2.0), trigger);

        let mesh = build(&map, &raw_settings());
        assert_eq!(mesh.sections.len(), 1);
        assert_eq!(mesh.sections[0].texture, "brick/wall");
        let collision = mesh.collision.unwrap();
        assert_eq!(collision.indices.len(), 2 * 2 * 3);

        let keep_all = ImporterSettings {
            skip_tool_surfaces: false,
            import_collision: false,
            ..raw_settings()
        };
        let mesh = build(&map, &keep_all);
        assert_eq!(mesh.sections.len(), 3);
        assert!(mesh.collision.is_none());
    }

    #[test]
    fn settings_transform_every_position() {
        let mut map = TestMap::new();
        map.face(&floor(10.0), -1);
        let settings = ImporterSettings::default();
        let mesh = build(&map, &settings);

        let (min, max) = mesh.bounds().unwrap();
        let t = settings.transform();
        assert!(min.abs_diff_eq(t.point(vec3(0.0, 64.0, 10.0)), 1e-4));
        assert!(max.abs_diff_eq(t.point(vec3(64.0, 0.0, 10.0)), 1e-4));
        // Z up becomes Y up
        let section = &mesh.sections[0];
        assert!(section.vertices[0].normal.abs_diff_eq(Vec3::Y, 1e-5));
        for tri in section.indices.chunks(3) {
            assert!(tri_normal(&section.vertices, tri).dot(Vec3::Y) > 0.99);
        }
        assert_eq!(section.texture, "");
    }

    #[test]
    fn displacement_grid_replaces_its_face() {
        let mut map = TestMap::new();
        let grass = map.texture("nature/grass", 64, 64, S, T, 0);
        let face = map.face(&floor(0.0), grass);
        // start at the (64, 0) corner and raise everything by 8
        map.displacement(face, 2, vec3(63.0, 1.0, 0.0), |_, _| (Vec3::Z, 8.0));
        let mesh = build(&map, &raw_settings());

        assert_eq!(mesh.sections.len(), 1);
        let section = &mesh.sections[0];
        assert_eq!(section.vertices.len(), num_disp_power_verts(2));
        assert_eq!(section.indices.len(), num_disp_power_tris(2) * 3);
        assert!(section.vertices.iter().all(|v| v.position.z == 8.0));
        assert_eq!(section.vertices[0].position, vec3(64.0, 0.0, 8.0));
        // texture coordinates come from the undisplaced surface
        assert_eq!(section.vertices[0].uv, Vec2::new(1.0, 0.0));
        for tri in section.indices.chunks(3) {
            assert!(tri_normal(&section.vertices, tri).dot(Vec3::Z) > 0.99);
        }
        assert!(section
            .vertices
            .iter()
            .all(|v| v.normal.abs_diff_eq(Vec3::Z, 1e-5)));

        let collision = mesh.collision.unwrap();
        assert_eq!(collision.vertices.len(), 25);
        assert_eq!(collision.indices.len(), num_disp_power_tris(2) * 3);
    }

    #[test]
    fn displacement_offsets_follow_the_grid() {
        let mut map = TestMap::new();
        let face = map.face(&floor(0.0), -1);
        map.displacement(face, 3, Vec3::ZERO, |x, y| (Vec3::Z, (x + 10 * y) as f32));
        let mesh = build(&map, &raw_settings());

        let verts = &mesh.sections[0].vertices;
        assert_eq!(verts.len(), 81);
        // rows run from corner 0 towards corner 1, columns towards corner 3
        assert_eq!(verts[0].position, vec3(0.0, 0.0, 0.0));
        assert_eq!(verts[1].position, vec3(8.0, 0.0, 1.0));
        assert_eq!(verts[9].position, vec3(0.0, 8.0, 10.0));
        assert_eq!(verts[80].position, vec3(64.0, 64.0, 88.0));
    }

    #[test]
    fn broken_displacements_are_skipped() {
        let mut map = TestMap::new();
        let ok = map.face(&floor(0.0), -1);
        let bad_power = map.face(&floor(1.0), -1);
        let triangle = map.face(&floor(2.0)[..3], -1);
        map.displacement(ok, 2, Vec3::ZERO, |_, _| (Vec3::Z, 0.0));
        map.displacement(bad_power, 5, Vec3::ZERO, |_, _| (Vec3::Z, 0.0));
        map.displacement(triangle, 2, Vec3::ZERO, |_, _| (Vec3::Z, 0.0));
        let mesh = build(&map, &raw_settings());

        assert_eq!(mesh.vertex_count(), 25);
    }

    #[test]
    fn face_named_only_by_its_displacement_is_replaced() {
        let mut map = TestMap::new();
        let face = map.face(&floor(0.0), -1);
        map.displacement(face, 2, Vec3::ZERO, |_, _| (Vec3::Z, 4.0));
        map.unlink_face_displacement(face);
        let mesh = build(&map, &raw_settings());

        assert_eq!(mesh.vertex_count(), num_disp_power_verts(2));
        assert_eq!(mesh.triangle_count(), num_disp_power_tris(2));
        let collision = mesh.collision.unwrap();
        assert_eq!(collision.indices.len(), num_disp_power_tris(2) * 3);
    }

    #[test]
    fn materials_resolve_per_section() {
        let mut map = TestMap::new();
        let tex = map.texture("BRICK\\Wall01", 64, 64, S, T, 0);
        map.face(&floor(0.0), tex);
        let bsp = BspFile::from_bytes(&map.build()).unwrap();
        let materials = MaterialMap::from_json(
            r#"[{ "TextureName": "brick/wall01", "MaterialPath": "materials/brick.png" }]"#,
        )
        .unwrap();
        let mesh = build_static_mesh(&bsp, &raw_settings(), &materials);
        assert_eq!(
            mesh.sections[0].material.as_deref(),
            Some("materials/brick.png")
        );
    }

    #[test]
    fn smooth_normals_average_shared_vertices() {
        let mut builder = MeshBuilder::<UVVertex>::default();
        let at = |position| UVVertex {
            position,
            ..Default::default()
        };
        let a = builder.push_vert(at(vec3(0.0, 0.0, 0.0)));
        let b = builder.push_vert(at(vec3(1.0, 0.0, 0.0)));
        let c = builder.push_vert(at(vec3(0.0, 1.0, 0.0)));
        let d = builder.push_vert(at(vec3(0.0, 0.0, 1.0)));
        builder.add_tri([a, b, c]);
        builder.add_tri([a, d, b]);
        builder.compute_smooth_normals(0);

        let n = builder.verts()[a as usize].normal;
        assert!(n.abs_diff_eq(vec3(0.0, 1.0, 1.0).normalize(), 1e-5));
        assert!(builder.verts()[c as usize].normal.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(builder.verts()[d as usize].normal.abs_diff_eq(Vec3::Y, 1e-6));
        assert_eq!(builder.tris(), &[0, 1, 2, 0, 3, 1]);
    }

    #[test]
    fn empty_map_has_no_bounds() {
        let mesh = build(&TestMap::new(), &raw_settings());
        assert!(mesh.is_empty());
        assert_eq!(mesh.bounds(), None);
        assert!(mesh.collision.is_none());
    }
}
