use std::{cell::RefCell, rc::Rc};

use cgmath::{vec3, Matrix4, Quaternion, Vector3};

use crate::beam_log;

/// Where beam visuals go. Implemented by the host's renderer.
pub trait BeamRenderer {
    fn set_curve_points(&mut self, points: &[Vector3<f32>]);

    fn set_cursor_transform(&mut self, position: Vector3<f32>, rotation: Quaternion<f32>);

    fn set_beam_color(&mut self, color: Vector3<f32>);

    fn set_visible(&mut self, visible: bool);

    fn set_cursor_visible(&mut self, _visible: bool) {}
}

impl<R: BeamRenderer> BeamRenderer for Rc<RefCell<R>> {
    fn set_curve_points(&mut self, points: &[Vector3<f32>]) {
        self.borrow_mut().set_curve_points(points);
    }

    fn set_cursor_transform(&mut self, position: Vector3<f32>, rotation: Quaternion<f32>) {
        self.borrow_mut().set_cursor_transform(position, rotation);
    }

    fn set_beam_color(&mut self, color: Vector3<f32>) {
        self.borrow_mut().set_beam_color(color);
    }

    fn set_visible(&mut self, visible: bool) {
        self.borrow_mut().set_visible(visible);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.borrow_mut().set_cursor_visible(visible);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl BeamRenderer for NullRenderer {
    fn set_curve_points(&mut self, _points: &[Vector3<f32>]) {}

    fn set_cursor_transform(&mut self, _position: Vector3<f32>, _rotation: Quaternion<f32>) {}

    fn set_beam_color(&mut self, _color: Vector3<f32>) {}

    fn set_visible(&mut self, _visible: bool) {}
}

#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub cursor_scale: Vector3<f32>,
    pub cursor_height_offset: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cursor_scale: vec3(0.3, 0.02, 0.3),
            cursor_height_offset: 0.02,
        }
    }
}

/// Keeps the beam as a line list plus a cursor transform, ready to upload as a
/// lines mesh and a scaled landing marker.
#[derive(Clone, Debug)]
pub struct LineBeamRenderer {
    pub config: RenderConfig,
    pub segments: Vec<[Vector3<f32>; 2]>,
    pub cursor_transform: Matrix4<f32>,
    pub color: Vector3<f32>,
    pub visible: bool,
    pub cursor_visible: bool,
}

impl LineBeamRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            segments: Vec::new(),
            cursor_transform: Matrix4::from_scale(1.0),
            color: vec3(1.0, 1.0, 1.0),
            visible: false,
            cursor_visible: true,
        }
    }

    /// Vertex pairs for a line-list mesh. Empty while hidden.
    pub fn line_vertices(&self) -> Vec<Vector3<f32>> {
        if !self.visible {
            return Vec::new();
        }
        self.segments.iter().flat_map(|segment| *segment).collect()
    }
}

impl Default for LineBeamRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl BeamRenderer for LineBeamRenderer {
    fn set_curve_points(&mut self, points: &[Vector3<f32>]) {
        self.segments.clear();
        self.segments
            .extend(points.windows(2).map(|pair| [pair[0], pair[1]]));
    }

    fn set_cursor_transform(&mut self, position: Vector3<f32>, rotation: Quaternion<f32>) {
        let translation =
            Matrix4::from_translation(position + vec3(0.0, self.config.cursor_height_offset, 0.0));
        let scale = Matrix4::from_nonuniform_scale(
            self.config.cursor_scale.x,
            self.config.cursor_scale.y,
            self.config.cursor_scale.z,
        );
        self.cursor_transform = translation * Matrix4::from(rotation) * scale;
    }

    fn set_beam_color(&mut self, color: Vector3<f32>) {
        self.color = color;
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            beam_log!(DEBUG, "beam visible={}", visible);
        }
        self.visible = visible;
        if !visible {
            self.segments.clear();
        }
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }
}
