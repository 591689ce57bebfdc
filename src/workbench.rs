//! The resources and per-frame drawing of the workbench: one textured, spinning
//! tetrahedron.

use glam::{Mat4, Vec3, Vec4};

use crate::{
    abs::{
        GpuContext, Material, MeshLoader, ShaderLoader, TextureLoader, TextureParams,
        checkerboard,
    },
    config::Config,
    error::Result,
};

pub const SHADER_KEY: &str = "tetrahedron";
pub const TEXTURE_KEY: &str = "tetrahedron";
pub const MESH_KEY: &str = "tetrahedron";

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.2, 1.0];

/// Owns the loaders and the material used to draw each frame.
pub struct Workbench {
    gpu: GpuContext,
    shaders: ShaderLoader,
    textures: TextureLoader,
    meshes: MeshLoader,
    material: Option<Material>,
    projection: Mat4,
    elapsed: f32,
}

impl Workbench {
    /// Loads the shader, texture and mesh and builds the material.
    pub fn setup(gpu: &GpuContext, config: &Config) -> Result<Self> {
        gpu.enable(glow::DEPTH_TEST);

        let root = &config.assets.root;
        let mut shaders = ShaderLoader::new(gpu, config.uniform_policy);
        config
            .assets
            .shader
            .load_into(&mut shaders, SHADER_KEY, root)?;

        let mut textures = TextureLoader::new(gpu);
        match &config.assets.texture {
            Some(path) => textures.load(TEXTURE_KEY, root.join(path), TextureParams::default())?,
            None => textures.load_image(
                TEXTURE_KEY,
                &checkerboard(64, 8, [235, 235, 235, 255], [200, 80, 60, 255]),
                TextureParams::pixelated(),
            )?,
        };

        let mut meshes = MeshLoader::new(gpu);
        meshes.load_tetrahedron(MESH_KEY)?;

        let mut material = Material::new(Some(SHADER_KEY));
        material.set("u_tint", Vec4::new(1.0, 0.95, 0.9, 1.0));
        material.set_texture("u_texture", TEXTURE_KEY, 0);

        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let projection = Mat4::perspective_rh_gl(60f32.to_radians(), aspect, 0.1, 100.0)
            * Mat4::look_at_rh(Vec3::new(0.0, 0.4, 1.6), Vec3::ZERO, Vec3::Y);

        Ok(Self {
            gpu: GpuContext::clone(gpu),
            shaders,
            textures,
            meshes,
            material: Some(material),
            projection,
            elapsed: 0.0,
        })
    }

    /// Clears the frame and draws the tetrahedron with the current material.
    pub fn update(&mut self, delta_time: f32) -> Result<()> {
        self.elapsed += delta_time;

        let [r, g, b, a] = CLEAR_COLOR;
        self.gpu.clear_color(r, g, b, a);
        self.gpu.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

        let Some(material) = &mut self.material else {
            return Ok(());
        };
        let model = Mat4::from_rotation_y(self.elapsed) * Mat4::from_rotation_x(0.35);
        material.set("u_mvp", self.projection * model);
        material.set("u_time", self.elapsed);

        material.attach(&self.shaders, &self.textures, None)?;
        self.meshes.get(MESH_KEY)?.draw();
        Ok(())
    }

    /// Releases the material. GPU resources stay loaded until the workbench is dropped.
    pub fn teardown(&mut self) {
        if self.material.take().is_some() {
            log::debug!("released material");
        }
    }

    pub fn shaders(&self) -> &ShaderLoader {
        &self.shaders
    }

    pub fn textures(&self) -> &TextureLoader {
        &self.textures
    }

    pub fn meshes(&self) -> &MeshLoader {
        &self.meshes
    }

    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    /// Seconds accumulated over every update.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
