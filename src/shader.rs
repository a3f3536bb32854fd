//! Shader program lookup table.
//!
//! The engine never inspects shader source. A [`ShaderProgram`] carries the WGSL
//! text for the backend plus the table the registry validates object schemas
//! against: attribute name to location and kind, uniform name to bind group.

use std::{borrow::Cow, collections::HashMap};

use crate::data_structures::attribute::AttributeKind;

/// Uniform name under which a program declares the camera's bind group.
pub const CAMERA_UNIFORM: &str = "camera";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderAttribute {
    pub location: u32,
    pub kind: AttributeKind,
}

#[derive(Clone, Debug)]
pub struct ShaderProgram {
    pub label: String,
    pub source: Cow<'static, str>,
    attributes: HashMap<String, ShaderAttribute>,
    uniforms: HashMap<String, u32>,
}

impl ShaderProgram {
    pub fn new(label: &str, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.to_string(),
            source: source.into(),
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, location: u32, kind: AttributeKind) -> Self {
        self.attributes
            .insert(name.to_string(), ShaderAttribute { location, kind });
        self
    }

    pub fn with_uniform(mut self, name: &str, group: u32) -> Self {
        self.uniforms.insert(name.to_string(), group);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<ShaderAttribute> {
        self.attributes.get(name).copied()
    }

    pub fn uniform(&self, name: &str) -> Option<u32> {
        self.uniforms.get(name).copied()
    }

    /// The program every maze object is drawn with.
    ///
    /// Locations match `pipelines/maze.wgsl`: the transform occupies 1..=4.
    pub fn maze() -> Self {
        ShaderProgram::new("Maze Shader", include_str!("pipelines/maze.wgsl"))
            .with_attribute("position", 0, AttributeKind::Vec3)
            .with_attribute("transform", 1, AttributeKind::Mat4)
            .with_attribute("color", 5, AttributeKind::Vec3)
            .with_attribute("luminance", 6, AttributeKind::Scalar)
            .with_uniform(CAMERA_UNIFORM, 0)
    }
}
