//! Math type aliases and helper functions.
//!
//! All UI math is f32 for positions and i32 for pixel rectangles.

pub use nalgebra;

// ===== Rendering math =====

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// 2D integer vector, used for pixel coordinates.
pub type IVec2 = nalgebra::Vector2<i32>;

/// Pixel rectangle given by its top-left `p0` and exclusive bottom-right `p1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub p0: IVec2,
    pub p1: IVec2,
}

impl Rect {
    /// Create a rectangle from two corners.
    pub fn new(p0: IVec2, p1: IVec2) -> Self {
        Self { p0, p1 }
    }

    /// Create a rectangle from position and size.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            p0: IVec2::new(x, y),
            p1: IVec2::new(x + width, y + height),
        }
    }

    pub fn left(&self) -> i32 {
        self.p0.x
    }

    pub fn top(&self) -> i32 {
        self.p0.y
    }

    pub fn width(&self) -> i32 {
        self.p1.x - self.p0.x
    }

    pub fn height(&self) -> i32 {
        self.p1.y - self.p0.y
    }

    /// Returns true if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Express the rectangle as `(left, top, width, height)` fractions of a
    /// target of the given size, each clamped to `[0, 1]`.
    ///
    /// A zero-sized target yields the full region.
    pub fn normalized(&self, target_width: u32, target_height: u32) -> Vec4 {
        if target_width == 0 || target_height == 0 {
            return FULL_REGION;
        }
        let w = target_width as f32;
        let h = target_height as f32;
        Vec4::new(
            self.left() as f32 / w,
            self.top() as f32 / h,
            self.width() as f32 / w,
            self.height() as f32 / h,
        )
        .map(|v| v.clamp(0.0, 1.0))
    }
}

/// Normalized region covering the whole target.
pub const FULL_REGION: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

// ===== Helper functions =====

/// Orthographic projection mapping pixel coordinates (origin top-left, y down)
/// to clip space with depth range [0, 1].
pub fn ortho_2d(width: f32, height: f32) -> Mat4 {
    let sx = if width > 0.0 { 2.0 / width } else { 1.0 };
    let sy = if height > 0.0 { -2.0 / height } else { -1.0 };
    #[rustfmt::skip]
    let result = Mat4::new(
        sx,  0.0, 0.0, -1.0,
        0.0, sy,  0.0,  1.0,
        0.0, 0.0, 1.0,  0.0,
        0.0, 0.0, 0.0,  1.0,
    );
    result
}

/// Translation matrix in the XY plane.
pub fn translation_2d(translation: Vec2) -> Mat4 {
    Mat4::new_translation(&Vec3::new(translation.x, translation.y, 0.0))
}

/// Build a matrix from rows written in reading order.
pub fn mat4_from_rows(rows: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_fn(|r, c| rows[r][c])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let rect = Rect::from_xywh(10, 20, 30, 40);
        assert_eq!(rect.left(), 10);
        assert_eq!(rect.top(), 20);
        assert_eq!(rect.width(), 30);
        assert_eq!(rect.height(), 40);
        assert!(!rect.is_empty());
        assert!(Rect::from_xywh(0, 0, 0, 5).is_empty());
    }

    #[test]
    fn test_rect_normalized() {
        let rect = Rect::from_xywh(100, 50, 200, 100);
        let region = rect.normalized(400, 200);
        assert_eq!(region, Vec4::new(0.25, 0.25, 0.5, 0.5));
    }

    #[test]
    fn test_rect_normalized_clamps() {
        let rect = Rect::from_xywh(-10, 0, 1000, 50);
        let region = rect.normalized(100, 100);
        assert_eq!(region.x, 0.0);
        assert_eq!(region.z, 1.0);
        assert_eq!(Rect::default().normalized(0, 0), FULL_REGION);
    }

    #[test]
    fn test_ortho_maps_corners() {
        let proj = ortho_2d(800.0, 600.0);
        let top_left = proj * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = proj * nalgebra::Vector4::new(800.0, 600.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-6 && (top_left.y - 1.0).abs() < 1e-6);
        assert!((bottom_right.x - 1.0).abs() < 1e-6 && (bottom_right.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mat4_from_rows_is_row_major() {
        let m = mat4_from_rows([
            [1.0, 0.0, 0.0, 5.0],
            [0.0, 1.0, 0.0, 6.0],
            [0.0, 0.0, 1.0, 7.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert_eq!(m[(0, 3)], 5.0);
        assert_eq!(m, translation_2d(Vec2::new(5.0, 6.0)) * Mat4::new_translation(&Vec3::new(0.0, 0.0, 7.0)));
    }
}
