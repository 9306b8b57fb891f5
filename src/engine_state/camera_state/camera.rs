//! # Camera Transforms
//!
//! The two transforms of the voxel program:
//! - `Projection`: perspective projection tracking the surface aspect ratio
//! - `model_view_at`: the scene's placement and time-driven spin
//!
//! `TransformUniform` is the packed GPU layout of both matrices.

use cgmath::*;
use web_time::Duration;

use crate::engine_state::config::{ProjectionConfig, ViewConfig};

/// Transformation matrix to convert from OpenGL's coordinate system to WGPU's.
///
/// OpenGL clip space has depth in `[-1, 1]`, WGPU in `[0, 1]`. Only the Z row
/// changes, so the aspect ratio read from the X and Y scales is unaffected.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,  // Scale Z from [-1,1] to [-0.5,0.5]
    0.0, 0.0, 0.5, 1.0,  // Translate Z from [-0.5,0.5] to [0,1]
);

/// A perspective projection and the parameters it is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Vertical field of view in radians
    fovy: Rad<f32>,
    /// Near clipping plane distance
    znear: f32,
    /// Far clipping plane distance
    zfar: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels, non-zero
    /// * `height` - Viewport height in pixels, non-zero
    /// * `fovy` - Vertical field of view (can be any type convertible to `Rad<f32>`)
    /// * `znear` - Near clipping plane distance
    /// * `zfar` - Far clipping plane distance
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_config(width: u32, height: u32, config: &ProjectionConfig) -> Self {
        Self::new(
            width,
            height,
            Deg(config.fov_y_degrees),
            config.z_near,
            config.z_far,
        )
    }

    /// Updates the aspect ratio for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    /// The perspective matrix in WGPU clip space.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Model-view transform after `elapsed` time since the loop started.
///
/// `translate(0, 0, -distance) * rotate_y(elapsed * rate)`. Always computed from the
/// absolute elapsed time, so irregular frame timing never accumulates error. The angle
/// is reduced to one turn in `f64` before narrowing to `f32`.
pub fn model_view_at(elapsed: Duration, view: &ViewConfig) -> Matrix4<f32> {
    let radians = elapsed.as_secs_f64() * f64::from(view.rotation_rate);
    let angle = Rad((radians % std::f64::consts::TAU) as f32);
    Matrix4::from_translation(Vector3::new(0.0, 0.0, -view.camera_distance))
        * Matrix4::from_angle_y(angle)
}

/// GPU layout of the transform uniform block.
///
/// Field order matches `UniformBinding::offset`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    // We can't use cgmath with bytemuck directly so we'll have to convert the Matrix4 into a 4x4 f32 array
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::engine_state::rendering::UniformBinding;

    #[test]
    fn aspect_tracks_resize() {
        let mut projection = Projection::from_config(800, 600, &ProjectionConfig::default());
        assert_eq!(projection.aspect(), 800.0 / 600.0);

        projection.resize(1920, 1080);
        assert_eq!(projection.aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn matrix_encodes_aspect_and_field_of_view() {
        let projection = Projection::from_config(800, 600, &ProjectionConfig::default());
        let matrix = projection.calc_matrix();

        let focal = 1.0 / (Rad::from(Deg(45.0f32)).0 / 2.0).tan();
        assert_relative_eq!(matrix.y.y, focal, epsilon = 1e-5);
        assert_relative_eq!(matrix.y.y / matrix.x.x, 800.0 / 600.0, epsilon = 1e-5);
    }

    #[test]
    fn near_and_far_planes_map_to_wgpu_depth_range() {
        let projection = Projection::new(4, 3, Deg(45.0), 0.1, 100.0);
        let matrix = projection.calc_matrix();

        let depth = |distance: f32| {
            let clip = matrix * Vector4::new(0.0, 0.0, -distance, 1.0);
            clip.z / clip.w
        };
        assert_relative_eq!(depth(0.1), 0.0, epsilon = 1e-4);
        assert_relative_eq!(depth(100.0), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn model_view_at_zero_is_pure_translation() {
        let matrix = model_view_at(Duration::ZERO, &ViewConfig::default());
        assert_eq!(
            matrix,
            Matrix4::from_translation(Vector3::new(0.0, 0.0, -6.0))
        );
    }

    #[test]
    fn model_view_rotates_one_radian_per_second() {
        let view = ViewConfig::default();
        for seconds in [0.5f32, 1.0, 2.5, 100.0] {
            let matrix = model_view_at(Duration::from_secs_f32(seconds), &view);
            let expected = Matrix4::from_translation(Vector3::new(0.0, 0.0, -6.0))
                * Matrix4::from_angle_y(Rad(seconds));
            assert_relative_eq!(matrix, expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn rotation_keeps_frame_steps_after_days_of_runtime() {
        let view = ViewConfig::default();
        let start = Duration::from_secs(10 * 24 * 60 * 60);
        let angle = |elapsed: Duration| {
            let matrix = model_view_at(elapsed, &view);
            (-matrix.x.z).atan2(matrix.x.x)
        };

        let step = angle(start + Duration::from_millis(16)) - angle(start);
        assert_relative_eq!(
            step.rem_euclid(std::f32::consts::TAU),
            0.016,
            epsilon = 1e-4
        );
    }

    #[test]
    fn rotation_turns_the_x_axis_toward_negative_z() {
        let matrix = model_view_at(
            Duration::from_secs_f32(std::f32::consts::FRAC_PI_2),
            &ViewConfig::default(),
        );
        let moved = matrix * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(moved, Vector4::new(0.0, 0.0, -7.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn uniform_layout_matches_bindings() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 128);
        assert_eq!(
            std::mem::offset_of!(TransformUniform, model_view) as u64,
            UniformBinding::ModelView.offset()
        );
        assert_eq!(
            std::mem::offset_of!(TransformUniform, projection) as u64,
            UniformBinding::Projection.offset()
        );
    }
}
