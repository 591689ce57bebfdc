//! A software stand-in for the OpenGL context, used by unit tests.
//!
//! It hands out handles and tracks which objects are alive. Sources containing `#error`
//! fail to compile, programs missing a stage or a `main` fail to link, and `uniform`
//! declarations are parsed for introspection. State-changing calls are recorded so
//! tests can assert on what reached the "GPU".

use std::{cell::RefCell, num::NonZeroU32, rc::Rc};

use fxhash::{FxHashMap, FxHashSet};

use super::{Gpu, GpuContext};

/// A recorded state-changing call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UseProgram(Option<u32>),
    Uniform { location: u32, values: Vec<f32> },
    UniformInt { location: u32, value: i32 },
    ActiveTexture(u32),
    BindTexture { target: u32, texture: Option<u32> },
    TexImage {
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        has_data: bool,
    },
    TexParameter { parameter: u32, value: i32 },
    GenerateMipmap,
    BufferData { target: u32, len: usize },
    BindVertexArray(Option<u32>),
    DrawElements { mode: u32, count: i32 },
    Viewport(i32, i32, i32, i32),
    Clear(u32),
}

struct MockShader {
    stage: u32,
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct MockProgram {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    // (name, type, size, first location)
    uniforms: Vec<(String, u32, i32, u32)>,
}

#[derive(Default)]
struct MockState {
    next_id: u32,
    shaders: FxHashMap<u32, MockShader>,
    programs: FxHashMap<u32, MockProgram>,
    textures: FxHashSet<u32>,
    buffers: FxHashSet<u32>,
    vertex_arrays: FxHashSet<u32>,
    calls: Vec<Call>,
}

impl MockState {
    fn allocate(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::new(self.next_id).expect("ids start at one")
    }
}

#[derive(Default)]
pub struct MockGpu {
    state: RefCell<MockState>,
}

impl MockGpu {
    /// Creates a mock and a type-erased handle to the same instance.
    pub fn new() -> (Rc<MockGpu>, GpuContext) {
        let mock = Rc::new(MockGpu::default());
        let gpu: GpuContext = mock.clone();
        (mock, gpu)
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn record_floats(&self, location: Option<&glow::UniformLocation>, values: &[f32]) {
        if let Some(location) = location {
            self.record(Call::Uniform {
                location: location.0,
                values: values.to_vec(),
            });
        }
    }
}

fn uniform_type(glsl: &str) -> Option<u32> {
    Some(match glsl {
        "bool" => glow::BOOL,
        "int" => glow::INT,
        "float" => glow::FLOAT,
        "vec2" => glow::FLOAT_VEC2,
        "vec3" => glow::FLOAT_VEC3,
        "vec4" => glow::FLOAT_VEC4,
        "mat2" => glow::FLOAT_MAT2,
        "mat3" => glow::FLOAT_MAT3,
        "mat4" => glow::FLOAT_MAT4,
        "sampler2D" => glow::SAMPLER_2D,
        "samplerCube" => glow::SAMPLER_CUBE,
        "samplerCubeShadow" => glow::SAMPLER_CUBE_SHADOW,
        "sampler2DArrayShadow" => glow::SAMPLER_2D_ARRAY_SHADOW,
        "isampler3D" => glow::INT_SAMPLER_3D,
        _ => return None,
    })
}

/// Parses `uniform <type> <name>;` and `uniform <type> <name>[N];` declarations.
fn declared_uniforms(source: &str) -> Vec<(String, u32, i32)> {
    source
        .lines()
        .filter_map(|line| {
            let decl = line.trim().strip_prefix("uniform ")?.trim_end_matches(';');
            let mut parts = decl.split_whitespace();
            let utype = uniform_type(parts.next()?)?;
            let name = parts.next()?;
            match name.split_once('[') {
                Some((base, rest)) => {
                    let size = rest.trim_end_matches(']').parse().ok()?;
                    Some((format!("{base}[0]"), utype, size))
                }
                None => Some((name.to_string(), utype, 1)),
            }
        })
        .collect()
}

impl Gpu for MockGpu {
    fn create_shader(&self, stage: u32) -> Result<glow::Shader, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.shaders.insert(
            id.get(),
            MockShader {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        Ok(glow::NativeShader(id))
    }

    fn shader_source(&self, shader: glow::Shader, source: &str) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader.0.get()) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: glow::Shader) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader.0.get()) {
            s.compiled = !s.source.contains("#error");
        }
    }

    fn get_shader_compile_status(&self, shader: glow::Shader) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader.0.get())
            .is_some_and(|s| s.compiled)
    }

    fn get_shader_info_log(&self, shader: glow::Shader) -> String {
        match self.state.borrow().shaders.get(&shader.0.get()) {
            Some(s) if !s.compiled => "0:1(1): error: #error directive".to_string(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: glow::Shader) {
        self.state.borrow_mut().shaders.remove(&shader.0.get());
    }

    fn create_program(&self) -> Result<glow::Program, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.programs.insert(id.get(), MockProgram::default());
        Ok(glow::NativeProgram(id))
    }

    fn attach_shader(&self, program: glow::Program, shader: glow::Shader) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program.0.get()) {
            p.attached.push(shader.0.get());
        }
    }

    fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program.0.get()) {
            p.attached.retain(|&s| s != shader.0.get());
        }
    }

    fn link_program(&self, program: glow::Program) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let Some(p) = state.programs.get_mut(&program.0.get()) else {
            return;
        };
        let stages: Vec<&MockShader> = p
            .attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .collect();

        let has_stage = |stage| stages.iter().any(|s| s.stage == stage && s.compiled);
        if !has_stage(glow::VERTEX_SHADER) || !has_stage(glow::FRAGMENT_SHADER) {
            p.linked = false;
            p.log = "error: program lacks a compiled vertex or fragment stage".to_string();
            return;
        }
        if let Some(s) = stages.iter().find(|s| !s.source.contains("main(")) {
            p.linked = false;
            p.log = format!("error: shader of type {:#x} lacks a main function", s.stage);
            return;
        }

        let mut next_location = 0;
        p.uniforms.clear();
        for s in &stages {
            for (name, utype, size) in declared_uniforms(&s.source) {
                if p.uniforms.iter().any(|(n, ..)| *n == name) {
                    continue;
                }
                p.uniforms.push((name, utype, size, next_location));
                next_location += size as u32;
            }
        }
        p.linked = true;
        p.log.clear();
    }

    fn get_program_link_status(&self, program: glow::Program) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program.0.get())
            .is_some_and(|p| p.linked)
    }

    fn get_program_info_log(&self, program: glow::Program) -> String {
        self.state
            .borrow()
            .programs
            .get(&program.0.get())
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: glow::Program) {
        self.state.borrow_mut().programs.remove(&program.0.get());
    }

    fn use_program(&self, program: Option<glow::Program>) {
        self.record(Call::UseProgram(program.map(|p| p.0.get())));
    }

    fn get_active_uniforms(&self, program: glow::Program) -> Vec<glow::ActiveUniform> {
        self.state
            .borrow()
            .programs
            .get(&program.0.get())
            .map(|p| {
                p.uniforms
                    .iter()
                    .map(|(name, utype, size, _)| glow::ActiveUniform {
                        size: *size,
                        utype: *utype,
                        name: name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn get_uniform_location(
        &self,
        program: glow::Program,
        name: &str,
    ) -> Option<glow::UniformLocation> {
        let state = self.state.borrow();
        let p = state.programs.get(&program.0.get())?;
        let (base, index) = match name.split_once('[') {
            Some((base, rest)) => (base, Some(rest.trim_end_matches(']').parse::<i32>().ok()?)),
            None => (name, None),
        };
        // Like GL, `name[i]` only resolves for arrays.
        p.uniforms.iter().find_map(|(n, _, size, location)| {
            let (declared, is_array) = match n.strip_suffix("[0]") {
                Some(declared) => (declared, true),
                None => (n.as_str(), false),
            };
            let offset = match index {
                Some(index) if is_array && index < *size => index,
                Some(_) => return None,
                None => 0,
            };
            (declared == base).then(|| glow::NativeUniformLocation(location + offset as u32))
        })
    }

    fn uniform_1_i32(&self, location: Option<&glow::UniformLocation>, x: i32) {
        if let Some(location) = location {
            self.record(Call::UniformInt {
                location: location.0,
                value: x,
            });
        }
    }

    fn uniform_1_f32(&self, location: Option<&glow::UniformLocation>, x: f32) {
        self.record_floats(location, &[x]);
    }

    fn uniform_2_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        self.record_floats(location, v);
    }

    fn uniform_3_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        self.record_floats(location, v);
    }

    fn uniform_4_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        self.record_floats(location, v);
    }

    fn uniform_matrix_2_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        self.record_floats(location, v);
    }

    fn uniform_matrix_3_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        self.record_floats(location, v);
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&glow::UniformLocation>, v: &[f32]) {
        self.record_floats(location, v);
    }

    fn create_texture(&self) -> Result<glow::Texture, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.textures.insert(id.get());
        Ok(glow::NativeTexture(id))
    }

    fn delete_texture(&self, texture: glow::Texture) {
        self.state.borrow_mut().textures.remove(&texture.0.get());
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: u32, texture: Option<glow::Texture>) {
        self.record(Call::BindTexture {
            target,
            texture: texture.map(|t| t.0.get()),
        });
    }

    fn tex_image_2d(
        &self,
        _target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        _data_type: u32,
        pixels: Option<&[u8]>,
    ) {
        self.record(Call::TexImage {
            internal_format,
            width,
            height,
            format,
            has_data: pixels.is_some(),
        });
    }

    fn tex_parameter_i32(&self, _target: u32, parameter: u32, value: i32) {
        self.record(Call::TexParameter { parameter, value });
    }

    fn generate_mipmap(&self, _target: u32) {
        self.record(Call::GenerateMipmap);
    }

    fn pixel_store_i32(&self, _parameter: u32, _value: i32) {}

    fn create_vertex_array(&self) -> Result<glow::VertexArray, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.vertex_arrays.insert(id.get());
        Ok(glow::NativeVertexArray(id))
    }

    fn delete_vertex_array(&self, vertex_array: glow::VertexArray) {
        self.state
            .borrow_mut()
            .vertex_arrays
            .remove(&vertex_array.0.get());
    }

    fn bind_vertex_array(&self, vertex_array: Option<glow::VertexArray>) {
        self.record(Call::BindVertexArray(vertex_array.map(|v| v.0.get())));
    }

    fn create_buffer(&self) -> Result<glow::Buffer, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate();
        state.buffers.insert(id.get());
        Ok(glow::NativeBuffer(id))
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        self.state.borrow_mut().buffers.remove(&buffer.0.get());
    }

    fn bind_buffer(&self, _target: u32, _buffer: Option<glow::Buffer>) {}

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], _usage: u32) {
        self.record(Call::BufferData {
            target,
            len: data.len(),
        });
    }

    fn vertex_attrib_pointer_f32(&self, _index: u32, _size: i32, _stride: i32, _offset: i32) {}

    fn enable_vertex_attrib_array(&self, _index: u32) {}

    fn draw_elements(&self, mode: u32, count: i32, _element_type: u32, _offset: i32) {
        self.record(Call::DrawElements { mode, count });
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn enable(&self, _capability: u32) {}

    fn clear_color(&self, _red: f32, _green: f32, _blue: f32, _alpha: f32) {}

    fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }
}
