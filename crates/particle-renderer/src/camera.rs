//! Camera system for the point experiments

use glam::{Mat4, Quat, Vec3};

/// Vertical field of view of the orbiting camera, in degrees
pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
pub const DEFAULT_ZNEAR: f32 = 0.1;
pub const DEFAULT_ZFAR: f32 = 100.0;
/// Distance of the screen-space camera from the z = 0 plane
pub const SCREEN_CAMERA_Z: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective { fovy: f32, znear: f32, zfar: f32 },
    /// Pixel-sized box centred on the origin: one world unit is one pixel
    Orthographic { znear: f32, zfar: f32 },
}

/// Orbit camera around `target`
#[derive(Clone, Debug)]
pub struct Camera {
    pub distance: f32,
    pub rotation: Quat,
    pub target: Vec3,
    pub width: f32,
    pub height: f32,
    pub projection: Projection,
    home_distance: f32,
    home_rotation: Quat,
}

impl Camera {
    /// Perspective camera placed at `eye`, looking at the origin with Y up.
    pub fn perspective(width: f32, height: f32, eye: Vec3) -> Self {
        let distance = eye.length().max(DEFAULT_ZNEAR);
        let yaw = eye.x.atan2(eye.z);
        let pitch = -(eye.y / distance).clamp(-1.0, 1.0).asin();
        let rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch);

        Self {
            distance,
            rotation,
            target: Vec3::ZERO,
            width,
            height,
            projection: Projection::Perspective {
                fovy: DEFAULT_FOV_DEGREES.to_radians(),
                znear: DEFAULT_ZNEAR,
                zfar: DEFAULT_ZFAR,
            },
            home_distance: distance,
            home_rotation: rotation,
        }
    }

    /// Screen-space camera on +Z for fields laid out in logical pixels.
    pub fn orthographic(width: f32, height: f32) -> Self {
        Self {
            distance: SCREEN_CAMERA_Z,
            rotation: Quat::IDENTITY,
            target: Vec3::ZERO,
            width,
            height,
            projection: Projection::Orthographic {
                znear: DEFAULT_ZNEAR,
                zfar: DEFAULT_ZFAR,
            },
            home_distance: SCREEN_CAMERA_Z,
            home_rotation: Quat::IDENTITY,
        }
    }

    pub fn is_orbiting(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }

    pub fn position(&self) -> Vec3 {
        let offset = self.rotation * Vec3::new(0.0, 0.0, self.distance);
        self.target + offset
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        if !self.is_orbiting() {
            return;
        }

        // Yaw about world up keeps the horizon level.
        let yaw_rotation = Quat::from_rotation_y(delta_x);

        let right = self.rotation * Vec3::X;
        let pitch_rotation = Quat::from_axis_angle(right, -delta_y);

        self.rotation = yaw_rotation * pitch_rotation * self.rotation;
        self.rotation = self.rotation.normalize();
    }

    pub fn zoom(&mut self, delta: f32) {
        if let Projection::Perspective { znear, zfar, .. } = self.projection {
            self.distance = (self.distance + delta).clamp(znear * 5.0, zfar * 0.5);
        }
    }

    /// Back to the pose the camera was created with.
    pub fn reset(&mut self) {
        self.distance = self.home_distance;
        self.rotation = self.home_rotation;
        self.target = Vec3::ZERO;
    }

    pub fn view_matrix(&self) -> Mat4 {
        let rotation_matrix = Mat4::from_quat(self.rotation.conjugate());
        let translation_matrix = Mat4::from_translation(-self.position());
        rotation_matrix * translation_matrix
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fovy, znear, zfar } => {
                Mat4::perspective_rh(fovy, self.aspect(), znear, zfar)
            }
            Projection::Orthographic { znear, zfar } => {
                let half_width = self.width / 2.0;
                let half_height = self.height / 2.0;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    znear,
                    zfar,
                )
            }
        }
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_perspective_camera_starts_at_eye() {
        let eye = Vec3::new(-4.0, 2.0, 7.0);
        let camera = Camera::perspective(1920.0, 1080.0, eye);
        assert!((camera.position() - eye).length() < 1e-4);
    }

    #[test]
    fn test_origin_projects_to_screen_centre() {
        let camera = Camera::perspective(800.0, 600.0, Vec3::new(4.0, 0.0, 7.0));
        let clip = camera.build_view_projection_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_orthographic_maps_pixels_to_ndc() {
        let camera = Camera::orthographic(800.0, 600.0);
        let m = camera.build_view_projection_matrix();

        let corner = m * Vec4::new(400.0, -300.0, 0.0, 1.0);
        assert!((corner.x - 1.0).abs() < 1e-5);
        assert!((corner.y + 1.0).abs() < 1e-5);
        assert!(corner.z > 0.0 && corner.z < 1.0);
    }

    #[test]
    fn test_orthographic_ignores_orbit_input() {
        let mut camera = Camera::orthographic(800.0, 600.0);
        camera.rotate(1.0, 1.0);
        camera.zoom(5.0);
        assert_eq!(camera.rotation, Quat::IDENTITY);
        assert_eq!(camera.distance, SCREEN_CAMERA_Z);
    }

    #[test]
    fn test_reset_restores_home_pose() {
        let eye = Vec3::new(-4.0, 2.0, 7.0);
        let mut camera = Camera::perspective(800.0, 600.0, eye);
        camera.rotate(0.7, -0.3);
        camera.zoom(10.0);
        camera.reset();
        assert!((camera.position() - eye).length() < 1e-4);
    }
}
