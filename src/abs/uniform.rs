//! Tagged uniform values.
//!
//! [`UniformValue`] is what a [`crate::abs::Material`] stores and what a
//! [`crate::abs::Shader`] uploads. Plain values convert into it through [`From`].

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use super::Gpu;

/// A single uniform value tagged with its GLSL type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// The GLSL type name of the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat2(_) => "mat2",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
        }
    }

    /// Whether the value may be assigned to a uniform declared with the given GL type.
    ///
    /// Integers are also accepted by sampler uniforms, which hold a texture unit.
    pub fn matches(&self, gl_type: u32) -> bool {
        match self {
            Self::Bool(_) => gl_type == glow::BOOL,
            Self::Int(_) => gl_type == glow::INT || is_sampler(gl_type),
            Self::Float(_) => gl_type == glow::FLOAT,
            Self::Vec2(_) => gl_type == glow::FLOAT_VEC2,
            Self::Vec3(_) => gl_type == glow::FLOAT_VEC3,
            Self::Vec4(_) => gl_type == glow::FLOAT_VEC4,
            Self::Mat2(_) => gl_type == glow::FLOAT_MAT2,
            Self::Mat3(_) => gl_type == glow::FLOAT_MAT3,
            Self::Mat4(_) => gl_type == glow::FLOAT_MAT4,
        }
    }

    /// Uploads the value to the given location of the currently bound program.
    pub fn upload(&self, gpu: &dyn Gpu, location: Option<&glow::UniformLocation>) {
        match self {
            Self::Bool(v) => gpu.uniform_1_i32(location, *v as i32),
            Self::Int(v) => gpu.uniform_1_i32(location, *v),
            Self::Float(v) => gpu.uniform_1_f32(location, *v),
            Self::Vec2(v) => gpu.uniform_2_f32_slice(location, &v.to_array()),
            Self::Vec3(v) => gpu.uniform_3_f32_slice(location, &v.to_array()),
            Self::Vec4(v) => gpu.uniform_4_f32_slice(location, &v.to_array()),
            Self::Mat2(m) => gpu.uniform_matrix_2_f32_slice(location, &m.to_cols_array()),
            Self::Mat3(m) => gpu.uniform_matrix_3_f32_slice(location, &m.to_cols_array()),
            Self::Mat4(m) => gpu.uniform_matrix_4_f32_slice(location, &m.to_cols_array()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    f32 => Float,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
}

/// Whether the GL type is one of the sampler types.
pub fn is_sampler(gl_type: u32) -> bool {
    matches!(
        gl_type,
        glow::SAMPLER_1D
            | glow::SAMPLER_2D
            | glow::SAMPLER_3D
            | glow::SAMPLER_CUBE
            | glow::SAMPLER_1D_SHADOW
            | glow::SAMPLER_2D_SHADOW
            | glow::SAMPLER_1D_ARRAY
            | glow::SAMPLER_2D_ARRAY
            | glow::SAMPLER_1D_ARRAY_SHADOW
            | glow::SAMPLER_2D_ARRAY_SHADOW
            | glow::SAMPLER_CUBE_SHADOW
            | glow::SAMPLER_2D_MULTISAMPLE
            | glow::SAMPLER_2D_MULTISAMPLE_ARRAY
            | glow::SAMPLER_BUFFER
            | glow::SAMPLER_2D_RECT
            | glow::SAMPLER_2D_RECT_SHADOW
            | glow::SAMPLER_CUBE_MAP_ARRAY
            | glow::SAMPLER_CUBE_MAP_ARRAY_SHADOW
            | glow::INT_SAMPLER_1D
            | glow::INT_SAMPLER_2D
            | glow::INT_SAMPLER_3D
            | glow::INT_SAMPLER_CUBE
            | glow::INT_SAMPLER_1D_ARRAY
            | glow::INT_SAMPLER_2D_ARRAY
            | glow::INT_SAMPLER_2D_MULTISAMPLE
            | glow::INT_SAMPLER_2D_MULTISAMPLE_ARRAY
            | glow::INT_SAMPLER_BUFFER
            | glow::INT_SAMPLER_2D_RECT
            | glow::INT_SAMPLER_CUBE_MAP_ARRAY
            | glow::UNSIGNED_INT_SAMPLER_1D
            | glow::UNSIGNED_INT_SAMPLER_2D
            | glow::UNSIGNED_INT_SAMPLER_3D
            | glow::UNSIGNED_INT_SAMPLER_CUBE
            | glow::UNSIGNED_INT_SAMPLER_1D_ARRAY
            | glow::UNSIGNED_INT_SAMPLER_2D_ARRAY
            | glow::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE
            | glow::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY
            | glow::UNSIGNED_INT_SAMPLER_BUFFER
            | glow::UNSIGNED_INT_SAMPLER_2D_RECT
            | glow::UNSIGNED_INT_SAMPLER_CUBE_MAP_ARRAY
    )
}

/// GLSL name of a GL uniform type, for diagnostics.
pub fn gl_type_name(gl_type: u32) -> &'static str {
    match gl_type {
        glow::BOOL => "bool",
        glow::INT => "int",
        glow::UNSIGNED_INT => "uint",
        glow::FLOAT => "float",
        glow::FLOAT_VEC2 => "vec2",
        glow::FLOAT_VEC3 => "vec3",
        glow::FLOAT_VEC4 => "vec4",
        glow::INT_VEC2 => "ivec2",
        glow::INT_VEC3 => "ivec3",
        glow::INT_VEC4 => "ivec4",
        glow::BOOL_VEC2 => "bvec2",
        glow::BOOL_VEC3 => "bvec3",
        glow::BOOL_VEC4 => "bvec4",
        glow::FLOAT_MAT2 => "mat2",
        glow::FLOAT_MAT3 => "mat3",
        glow::FLOAT_MAT4 => "mat4",
        glow::SAMPLER_1D => "sampler1D",
        glow::SAMPLER_2D => "sampler2D",
        glow::SAMPLER_3D => "sampler3D",
        glow::SAMPLER_CUBE => "samplerCube",
        glow::SAMPLER_2D_ARRAY => "sampler2DArray",
        glow::SAMPLER_2D_SHADOW => "sampler2DShadow",
        glow::SAMPLER_2D_ARRAY_SHADOW => "sampler2DArrayShadow",
        glow::SAMPLER_CUBE_SHADOW => "samplerCubeShadow",
        glow::SAMPLER_2D_MULTISAMPLE => "sampler2DMS",
        glow::INT_SAMPLER_3D => "isampler3D",
        glow::UNSIGNED_INT_SAMPLER_2D_ARRAY => "usampler2DArray",
        glow::INT_SAMPLER_2D => "isampler2D",
        glow::UNSIGNED_INT_SAMPLER_2D => "usampler2D",
        _ => "unknown",
    }
}
