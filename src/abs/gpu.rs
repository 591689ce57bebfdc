//! The graphics backend seam.
//!
//! Every GPU call made by the resource types goes through the [`Gpu`] trait instead of
//! calling [`glow::HasContext`] directly. [`glow::Context`] implements it for real rendering,
//! which keeps the `unsafe` in one place and lets the loaders run against a mock in tests.

use std::rc::Rc;

use glow::HasContext;

/// Shared handle to the single graphics context.
pub type GpuContext = Rc<dyn Gpu>;

/// The subset of OpenGL the workbench uses.
///
/// Handles and enums are glow's, so the trait maps 1:1 onto [`glow::HasContext`].
pub trait Gpu {
    // Shader stages
    fn create_shader(&self, stage: u32) -> Result<glow::Shader, String>;
    fn shader_source(&self, shader: glow::Shader, source: &str);
    fn compile_shader(&self, shader: glow::Shader);
    fn get_shader_compile_status(&self, shader: glow::Shader) -> bool;
    fn get_shader_info_log(&self, shader: glow::Shader) -> String;
    fn delete_shader(&self, shader: glow::Shader);

    // Programs
    fn create_program(&self) -> Result<glow::Program, String>;
    fn attach_shader(&self, program: glow::Program, shader: glow::Shader);
    fn detach_shader(&self, program: glow::Program, shader: glow::Shader);
    fn link_program(&self, program: glow::Program);
    fn get_program_link_status(&self, program: glow::Program) -> bool;
    fn get_program_info_log(&self, program: glow::Program) -> String;
    fn delete_program(&self, program: glow::Program);
    fn use_program(&self, program: Option<glow::Program>);

    /// Returns every active uniform of a linked program.
    fn get_active_uniforms(&self, program: glow::Program) -> Vec<glow::ActiveUniform>;
    fn get_uniform_location(
        &self,
        program: glow::Program,
        name: &str,
    ) -> Option<glow::UniformLocation>;

    // Uniforms
    fn uniform_1_i32(&self, location: Option<&glow::UniformLocation>, x: i32);
    fn uniform_1_f32(&self, location: Option<&glow::UniformLocation>, x: f32);
    fn uniform_2_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]);
    fn uniform_3_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]);
    fn uniform_4_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]);
    fn uniform_matrix_2_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]);
    fn uniform_matrix_3_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]);
    fn uniform_matrix_4_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]);

    // Textures
    fn create_texture(&self) -> Result<glow::Texture, String>;
    fn delete_texture(&self, texture: glow::Texture);
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Option<glow::Texture>);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        data_type: u32,
        pixels: Option<&[u8]>,
    );
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    fn generate_mipmap(&self, target: u32);
    fn pixel_store_i32(&self, parameter: u32, value: i32);

    // Buffers and vertex arrays
    fn create_vertex_array(&self) -> Result<glow::VertexArray, String>;
    fn delete_vertex_array(&self, vertex_array: glow::VertexArray);
    fn bind_vertex_array(&self, vertex_array: Option<glow::VertexArray>);
    fn create_buffer(&self) -> Result<glow::Buffer, String>;
    fn delete_buffer(&self, buffer: glow::Buffer);
    fn bind_buffer(&self, target: u32, buffer: Option<glow::Buffer>);
    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);
    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);

    // Frame state
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn enable(&self, capability: u32);
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear(&self, mask: u32);
}

impl Gpu for glow::Context {
    fn create_shader(&self, stage: u32) -> Result<glow::Shader, String> {
        unsafe { HasContext::create_shader(self, stage) }
    }

    fn shader_source(&self, shader: glow::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: glow::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn get_shader_compile_status(&self, shader: glow::Shader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    fn get_shader_info_log(&self, shader: glow::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: glow::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<glow::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: glow::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn get_program_link_status(&self, program: glow::Program) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    fn get_program_info_log(&self, program: glow::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<glow::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn get_active_uniforms(&self, program: glow::Program) -> Vec<glow::ActiveUniform> {
        unsafe {
            let count = HasContext::get_active_uniforms(self, program);
            (0..count)
                .filter_map(|index| HasContext::get_active_uniform(self, program, index))
                .collect()
        }
    }

    fn get_uniform_location(
        &self,
        program: glow::Program,
        name: &str,
    ) -> Option<glow::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn uniform_1_i32(&self, location: Option<&glow::UniformLocation>, x: i32) {
        unsafe { HasContext::uniform_1_i32(self, location, x) }
    }

    fn uniform_1_f32(&self, location: Option<&glow::UniformLocation>, x: f32) {
        unsafe { HasContext::uniform_1_f32(self, location, x) }
    }

    fn uniform_2_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        unsafe { HasContext::uniform_2_f32_slice(self, location, v) }
    }

    fn uniform_3_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        unsafe { HasContext::uniform_3_f32_slice(self, location, v) }
    }

    fn uniform_4_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        unsafe { HasContext::uniform_4_f32_slice(self, location, v) }
    }

    fn uniform_matrix_2_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        unsafe { HasContext::uniform_matrix_2_f32_slice(self, location, false, v) }
    }

    fn uniform_matrix_3_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        unsafe { HasContext::uniform_matrix_3_f32_slice(self, location, false, v) }
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        unsafe { HasContext::uniform_matrix_4_f32_slice(self, location, false, v) }
    }

    fn create_texture(&self) -> Result<glow::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, unit) }
    }

    fn bind_texture(&self, target: u32, texture: Option<glow::Texture>) {
        unsafe { HasContext::bind_texture(self, target, texture) }
    }

    fn tex_image_2d(
        &self,
        target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        data_type: u32,
        pixels: Option<&[u8]>,
    ) {
        unsafe {
            HasContext::tex_image_2d(
                self,
                target,
                0,
                internal_format,
                width,
                height,
                0,
                format,
                data_type,
                glow::PixelUnpackData::Slice(pixels),
            )
        }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { HasContext::tex_parameter_i32(self, target, parameter, value) }
    }

    fn generate_mipmap(&self, target: u32) {
        unsafe { HasContext::generate_mipmap(self, target) }
    }

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        unsafe { HasContext::pixel_store_i32(self, parameter, value) }
    }

    fn create_vertex_array(&self) -> Result<glow::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn delete_vertex_array(&self, vertex_array: glow::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<glow::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn create_buffer(&self) -> Result<glow::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<glow::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self,
                index,
                size,
                glow::FLOAT,
                false,
                stride,
                offset,
            )
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { HasContext::draw_elements(self, mode, count, element_type, offset) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn enable(&self, capability: u32) {
        unsafe { HasContext::enable(self, capability) }
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { HasContext::clear_color(self, red, green, blue, alpha) }
    }

    fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }
}
