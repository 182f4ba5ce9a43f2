//! Headless stand-ins for the GPU collaborators.
//!
//! `HeadlessSurface` and `RecordingProgram` let the plugin run without a GL
//! context: the CLI uses them to print draw orders and the tests use them to
//! observe uniform uploads. `Marker` is the simplest possible drawable.

use glam::{Mat4, Vec2, Vec3, Vec4};
use hum_common::Transform;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::color::Color;
use crate::drawable::Drawable;
use crate::error::RenderError;
use crate::shader::{ShaderProgram, SharedProgram};
use crate::surface::RenderSurface;

/// Surface that only counts what it is asked to do.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    prepared: bool,
    clear_color: Color,
    clears: u64,
    presented: u64,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn clears(&self) -> u64 {
        self.clears
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }
}

impl RenderSurface for HeadlessSurface {
    fn prepare(&mut self) -> Result<(), RenderError> {
        self.prepared = true;
        Ok(())
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.presented += 1;
        Ok(())
    }
}

/// One call received by a [`RecordingProgram`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramCall {
    Use,
    Mat4 { name: String, value: Mat4 },
    Vec4 { name: String, value: Vec4 },
}

/// Program that records uniform uploads instead of talking to a GPU.
///
/// With [`with_uniforms`](Self::with_uniforms) it only records the listed
/// names and drops the rest, like a real program ignoring unknown uniforms.
#[derive(Debug, Default)]
pub struct RecordingProgram {
    label: String,
    uniforms: Option<BTreeSet<String>>,
    attributes: Vec<String>,
    calls: RefCell<Vec<ProgramCall>>,
}

impl RecordingProgram {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_uniforms<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.uniforms = Some(names.into_iter().map(str::to_owned).collect());
        self
    }

    /// Vertex attributes, located in the order given.
    pub fn with_attributes<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.attributes = names.into_iter().map(str::to_owned).collect();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn calls(&self) -> Vec<ProgramCall> {
        self.calls.borrow().clone()
    }

    /// How many times a uniform called `name` was set.
    pub fn uniform_sets(&self, name: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| match call {
                ProgramCall::Mat4 { name: n, .. } | ProgramCall::Vec4 { name: n, .. } => n == name,
                ProgramCall::Use => false,
            })
            .count()
    }

    pub fn last_mat4(&self, name: &str) -> Option<Mat4> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            ProgramCall::Mat4 { name: n, value } if n == name => Some(*value),
            _ => None,
        })
    }

    pub fn use_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, ProgramCall::Use))
            .count()
    }

    pub fn reset(&self) {
        self.calls.borrow_mut().clear();
    }

    fn declares(&self, name: &str) -> bool {
        self.uniforms
            .as_ref()
            .is_none_or(|uniforms| uniforms.contains(name))
    }

    fn record_vec4(&self, name: &str, value: Vec4) {
        if self.declares(name) {
            self.calls.borrow_mut().push(ProgramCall::Vec4 {
                name: name.to_owned(),
                value,
            });
        }
    }
}

impl ShaderProgram for RecordingProgram {
    fn use_program(&self) {
        self.calls.borrow_mut().push(ProgramCall::Use);
    }

    fn set_uniform_mat4(&self, name: &str, value: &Mat4) {
        if self.declares(name) {
            self.calls.borrow_mut().push(ProgramCall::Mat4 {
                name: name.to_owned(),
                value: *value,
            });
        }
    }

    fn set_uniform_vec2(&self, name: &str, value: Vec2) {
        self.record_vec4(name, value.extend(0.0).extend(0.0));
    }

    fn set_uniform_vec3(&self, name: &str, value: Vec3) {
        self.record_vec4(name, value.extend(0.0));
    }

    fn set_uniform_vec4(&self, name: &str, value: Vec4) {
        self.record_vec4(name, value);
    }

    fn attribute_location(&self, name: &str) -> Option<u32> {
        let index = self.attributes.iter().position(|a| a == name)?;
        u32::try_from(index).ok()
    }
}

/// Shared log of drawn labels, in draw order.
pub type DrawLog = Rc<RefCell<Vec<String>>>;

/// Minimal drawable: a labelled point that appends its label to a log when
/// drawn.
pub struct Marker {
    label: String,
    transform: Transform,
    origin: Vec3,
    program: Option<SharedProgram>,
    log: DrawLog,
    draws: Cell<u32>,
}

impl Marker {
    pub fn new(label: impl Into<String>, program: Option<SharedProgram>, log: DrawLog) -> Self {
        Self {
            label: label.into(),
            transform: Transform::default(),
            origin: Vec3::ZERO,
            program,
            log,
            draws: Cell::new(0),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn draws(&self) -> u32 {
        self.draws.get()
    }
}

impl Drawable for Marker {
    fn draw(&self) {
        self.draws.set(self.draws.get() + 1);
        self.log.borrow_mut().push(self.label.clone());
    }

    fn shader_program(&self) -> Option<&SharedProgram> {
        self.program.as_ref()
    }

    fn set_shader_program(&mut self, program: Option<SharedProgram>) {
        self.program = program;
    }

    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn origin(&self) -> Vec3 {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_uniforms_are_ignored() {
        let program = RecordingProgram::new("plain").with_uniforms(["model", "color"]);
        program.set_uniform_mat4("model", &Mat4::IDENTITY);
        program.set_uniform_mat4("does_not_exist", &Mat4::IDENTITY);
        program.set_uniform_vec4("color", Vec4::ONE);
        program.set_uniform_vec2("offset", Vec2::ONE);
        assert_eq!(program.uniform_sets("model"), 1);
        assert_eq!(program.uniform_sets("does_not_exist"), 0);
        assert_eq!(program.uniform_sets("color"), 1);
        assert_eq!(program.calls().len(), 2);
    }

    #[test]
    fn attributes_are_located_in_order() {
        let program = RecordingProgram::new("plain").with_attributes(["uv", "position"]);
        assert_eq!(program.attribute_location("position"), Some(1));
        assert_eq!(program.attribute_location("normal"), None);
        assert_eq!(RecordingProgram::new("bare").attribute_location("position"), None);
    }

    #[test]
    fn last_mat4_returns_latest_upload() {
        let program = RecordingProgram::new("plain");
        program.set_uniform_mat4("view", &Mat4::IDENTITY);
        let moved = Mat4::from_translation(Vec3::X);
        program.set_uniform_mat4("view", &moved);
        assert_eq!(program.last_mat4("view"), Some(moved));
        assert_eq!(program.last_mat4("projection"), None);
    }

    #[test]
    fn marker_logs_draws() {
        let log = DrawLog::default();
        let marker = Marker::new("a", None, Rc::clone(&log));
        marker.draw();
        marker.draw();
        assert_eq!(marker.draws(), 2);
        assert_eq!(*log.borrow(), vec!["a".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn headless_surface_counts() {
        let mut surface = HeadlessSurface::new();
        surface.prepare().unwrap();
        surface.clear();
        surface.present().unwrap();
        surface.set_clear_color(Color::WHITE);
        assert!(surface.is_prepared());
        assert_eq!(surface.clears(), 1);
        assert_eq!(surface.frames_presented(), 1);
        assert_eq!(surface.clear_color(), Color::WHITE);
    }
}
