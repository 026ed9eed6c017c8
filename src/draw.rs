use glam::{Mat2, Vec2};

/// GPU-aligned triangle instance (32 bytes, copied straight into the instance buffer)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TriangleInstance {
    pub center: [f32; 2],  // Surface position (x, y)
    pub size: f32,         // Base width
    pub angle: f32,        // Rotation in radians
    pub color: [f32; 4],   // RGBA, alpha carries the opacity
}

impl TriangleInstance {
    pub fn new(center: Vec2, size: f32, angle: f32, rgb: [u8; 3], opacity: f32) -> Self {
        Self {
            center: center.to_array(),
            size,
            angle,
            color: [
                rgb[0] as f32 / 255.0,
                rgb[1] as f32 / 255.0,
                rgb[2] as f32 / 255.0,
                opacity,
            ],
        }
    }

    pub fn opacity(&self) -> f32 {
        self.color[3]
    }
}

/// Equilateral triangle, apex up before rotation: base width = size, height = size * sqrt(3) / 2.
/// Mirrors the vertex shader so tests can check the geometry on the CPU.
pub fn triangle_vertices(instance: &TriangleInstance) -> [Vec2; 3] {
    let size = instance.size;
    let height = size * (3.0f32.sqrt() / 2.0);
    let rotation = Mat2::from_angle(instance.angle);
    let center = Vec2::from_array(instance.center);

    [
        Vec2::new(0.0, -height / 2.0),
        Vec2::new(-size / 2.0, height / 2.0),
        Vec2::new(size / 2.0, height / 2.0),
    ]
    .map(|corner| center + rotation * corner)
}

/// Anything the field can paint triangles onto
pub trait DrawSurface {
    /// Start a new frame
    fn clear(&mut self);

    fn fill_triangle(&mut self, triangle: TriangleInstance);
}

/// Records a frame's triangles in paint order
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    pub triangles: Vec<TriangleInstance>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Instances as a byte slice for GPU upload (zero-copy)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}

impl DrawSurface for DrawList {
    fn clear(&mut self) {
        self.triangles.clear();
    }

    fn fill_triangle(&mut self, triangle: TriangleInstance) {
        self.triangles.push(triangle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_instance_is_gpu_aligned() {
        assert_eq!(std::mem::size_of::<TriangleInstance>(), 32);
    }

    #[test]
    fn test_unrotated_triangle_points_up() {
        let t = TriangleInstance::new(Vec2::new(100.0, 100.0), 50.0, 0.0, [255, 255, 255], 1.0);
        let [apex, left, right] = triangle_vertices(&t);
        let h = 50.0 * 3.0f32.sqrt() / 2.0;

        assert!(approx(apex, Vec2::new(100.0, 100.0 - h / 2.0)));
        assert!(approx(left, Vec2::new(75.0, 100.0 + h / 2.0)));
        assert!(approx(right, Vec2::new(125.0, 100.0 + h / 2.0)));
    }

    #[test]
    fn test_sides_are_equal_after_rotation() {
        let t = TriangleInstance::new(Vec2::new(-20.0, 40.0), 80.0, 1.234, [96, 96, 96], 0.5);
        let [a, b, c] = triangle_vertices(&t);
        let ab = (a - b).length();
        let bc = (b - c).length();
        let ca = (c - a).length();
        assert!((ab - 80.0).abs() < 1e-3);
        assert!((bc - 80.0).abs() < 1e-3);
        assert!((ca - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_half_turn_flips_apex() {
        let t = TriangleInstance::new(Vec2::ZERO, 40.0, PI, [255, 255, 255], 1.0);
        let [apex, _, _] = triangle_vertices(&t);
        assert!(apex.y > 0.0);
    }

    #[test]
    fn test_color_normalization() {
        let t = TriangleInstance::new(Vec2::ZERO, 1.0, 0.0, [255, 0, 51], 0.25);
        assert_eq!(t.color, [1.0, 0.0, 0.2, 0.25]);
        assert_eq!(t.opacity(), 0.25);
    }

    #[test]
    fn test_draw_list_records_in_order() {
        let mut list = DrawList::new();
        list.fill_triangle(TriangleInstance::new(Vec2::ZERO, 1.0, 0.0, [0, 0, 0], 1.0));
        list.fill_triangle(TriangleInstance::new(Vec2::ONE, 2.0, 0.0, [0, 0, 0], 1.0));
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_bytes().len(), 64);
        list.clear();
        assert!(list.is_empty());
    }
}
