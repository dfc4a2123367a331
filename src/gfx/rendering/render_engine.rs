//! Multi-mode scene renderer
//!
//! The [`Renderer`] draws a [`Scene`] through one of three pipelines chosen by its
//! [`RenderMode`]:
//!
//! - forward shading (Solid, Wireframe), each object with its own shader
//! - deferred shading (Deferred), a G-buffer geometry pass resolved by a full-screen lighting pass
//! - tessellated forward shading (Tessellation, TessellationWithWireframe), drawn as patches
//!
//! Pipelines that need extra shaders load them lazily by name and fall back to forward shading
//! for the frame when they cannot. Selected objects get a forward-rendered highlight overlay in
//! every mode.
//!
//! A frame is bracketed by [`begin_frame`](Renderer::begin_frame) and
//! [`end_frame`](Renderer::end_frame); external UI drawing is bracketed by
//! [`prepare_for_ui`](Renderer::prepare_for_ui) and [`restore_after_ui`](Renderer::restore_after_ui).

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gfx::backend::{Capability, GraphicsApi, PolygonMode};
use crate::gfx::camera::Camera;
use crate::gfx::resources::{Material, ResourceManager, Shader, ShaderHandle};
use crate::gfx::scene::{DrawMode, Light, Scene};

use super::gbuffer::{GBuffer, ScreenQuad, ALBEDO_SPEC_UNIT, NORMAL_UNIT, POSITION_UNIT};

pub const GBUFFER_SHADER: &str = "gbuffer";
pub const DEFERRED_LIGHTING_SHADER: &str = "deferred_lighting";
pub const TESSELLATION_SHADER: &str = "tessellation";

/// Size of the `lights` uniform array in the built-in shaders.
pub const MAX_LIGHTS: usize = 8;

pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
pub const DEFAULT_TESS_LEVEL: f32 = 4.0;
pub const DEFAULT_DISPLACEMENT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderMode {
    #[default]
    Solid,
    Wireframe,
    Deferred,
    Tessellation,
    TessellationWithWireframe,
}

impl RenderMode {
    pub const ALL: [RenderMode; 5] = [
        RenderMode::Solid,
        RenderMode::Wireframe,
        RenderMode::Deferred,
        RenderMode::Tessellation,
        RenderMode::TessellationWithWireframe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Solid => "Solid",
            RenderMode::Wireframe => "Wireframe",
            RenderMode::Deferred => "Deferred",
            RenderMode::Tessellation => "Tessellation",
            RenderMode::TessellationWithWireframe => "Tessellation + Wireframe",
        }
    }

    pub fn is_tessellated(self) -> bool {
        matches!(
            self,
            RenderMode::Tessellation | RenderMode::TessellationWithWireframe
        )
    }

    /// Polygon mode established at the start of a frame.
    fn baseline_polygon_mode(self) -> PolygonMode {
        match self {
            RenderMode::Wireframe => PolygonMode::Line,
            _ => PolygonMode::Fill,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of the `lightingModel` uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightingModel {
    Flat = 0,
    #[default]
    Phong = 1,
}

impl LightingModel {
    pub const ALL: [LightingModel; 2] = [LightingModel::Flat, LightingModel::Phong];

    pub fn name(self) -> &'static str {
        match self {
            LightingModel::Flat => "Flat",
            LightingModel::Phong => "Phong",
        }
    }
}

/// Pipeline a frame actually went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPath {
    #[default]
    Forward,
    Deferred,
    Tessellated,
    /// The pipeline could not run and nothing was drawn.
    Aborted,
}

/// Counters from the last [`Renderer::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub path: RenderPath,
    pub objects_drawn: usize,
    pub highlights_drawn: usize,
}

pub struct Renderer {
    gl: Rc<dyn GraphicsApi>,
    render_mode: RenderMode,
    lighting_model: LightingModel,
    clear_color: [f32; 4],
    depth_test: bool,
    tess_level_outer: f32,
    tess_level_inner: f32,
    displacement_amount: f32,
    width: u32,
    height: u32,
    time: f32,
    gbuffer: Option<GBuffer>,
    screen_quad: Option<ScreenQuad>,
    stats: RenderStats,
}

impl Renderer {
    pub fn new(gl: Rc<dyn GraphicsApi>, width: u32, height: u32) -> Self {
        Self {
            gl,
            render_mode: RenderMode::Solid,
            lighting_model: LightingModel::Phong,
            clear_color: DEFAULT_CLEAR_COLOR,
            depth_test: true,
            tess_level_outer: DEFAULT_TESS_LEVEL,
            tess_level_inner: DEFAULT_TESS_LEVEL,
            displacement_amount: DEFAULT_DISPLACEMENT,
            width,
            height,
            time: 0.0,
            gbuffer: None,
            screen_quad: None,
            stats: RenderStats::default(),
        }
    }

    /// Establishes the initial context state.
    pub fn initialize(&mut self) {
        self.gl
            .set_capability(Capability::DepthTest, self.depth_test);
        self.gl.set_capability(Capability::Multisample, true);
        self.gl
            .viewport(0, 0, self.width as i32, self.height as i32);
        log::info!(
            "Renderer initialized ({}x{}, OpenGL {})",
            self.width,
            self.height,
            self.gl.api_version()
        );
    }

    /// Updates the viewport. The G-buffer is rebuilt at the new size on its next use.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.gl.viewport(0, 0, width as i32, height as i32);
        if self.gbuffer.is_some() {
            self.cleanup_deferred_rendering();
        }
    }

    /// Advances the clock fed to the `time` uniform.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
    }

    // Frame

    pub fn begin_frame(&self) {
        self.gl.clear(self.clear_color);
        self.gl
            .set_capability(Capability::DepthTest, self.depth_test);
        self.gl
            .set_polygon_mode(self.render_mode.baseline_polygon_mode());
    }

    /// Draws `scene` as seen from `camera` with the current mode.
    ///
    /// Shaders the mode needs are loaded through `resources` on first use.
    pub fn render(&mut self, scene: &Scene, camera: &Camera, resources: &mut ResourceManager) {
        self.stats = match self.render_mode {
            RenderMode::Solid | RenderMode::Wireframe => {
                self.render_forward(scene, camera, resources)
            }
            RenderMode::Deferred => match self.deferred_shaders(resources) {
                Some((geometry, lighting)) => {
                    self.render_deferred(scene, camera, resources, geometry, lighting)
                }
                None => self.render_forward(scene, camera, resources),
            },
            RenderMode::Tessellation | RenderMode::TessellationWithWireframe => {
                let version = self.gl.api_version();
                if !version.supports_tessellation() {
                    log::warn!(
                        "Tessellation needs OpenGL 4.0 or newer (context is {}); switching to {}",
                        version,
                        RenderMode::Solid
                    );
                    self.render_mode = RenderMode::Solid;
                    self.gl.set_polygon_mode(PolygonMode::Fill);
                    self.render_forward(scene, camera, resources)
                } else {
                    match resources.ensure_shader(TESSELLATION_SHADER) {
                        Ok(shader) => self.render_tessellated(scene, camera, resources, shader),
                        Err(err) => {
                            log::error!(
                                "Tessellation shader unavailable, rendering forward: {}",
                                err
                            );
                            self.render_forward(scene, camera, resources)
                        }
                    }
                }
            }
        };
    }

    /// Leaves fill mode and depth testing on for whatever draws next.
    pub fn end_frame(&self) {
        self.gl.set_polygon_mode(PolygonMode::Fill);
        self.gl.set_capability(Capability::DepthTest, true);
    }

    /// State for drawing a 2D overlay on top of the frame.
    pub fn prepare_for_ui(&self) {
        self.gl.set_capability(Capability::DepthTest, false);
        self.gl.set_capability(Capability::Blend, true);
        self.gl.set_alpha_blending();
        self.gl.set_capability(Capability::CullFace, false);
    }

    /// Undoes [`prepare_for_ui`](Self::prepare_for_ui) back to the frame baseline.
    pub fn restore_after_ui(&self) {
        self.gl
            .set_capability(Capability::DepthTest, self.depth_test);
        self.gl.set_capability(Capability::Blend, false);
        self.gl
            .set_polygon_mode(self.render_mode.baseline_polygon_mode());
    }

    /// Releases the G-buffer and screen quad. Safe to call when neither exists.
    pub fn cleanup_deferred_rendering(&mut self) {
        if self.gbuffer.take().is_some() {
            log::debug!("Released G-buffer");
        }
        self.screen_quad = None;
    }

    // Pipelines

    fn render_forward(
        &self,
        scene: &Scene,
        camera: &Camera,
        resources: &ResourceManager,
    ) -> RenderStats {
        let mut stats = RenderStats {
            path: RenderPath::Forward,
            ..Default::default()
        };

        for object in scene.objects() {
            if !object.is_visible() {
                continue;
            }
            let Some(shader) = object.shader().and_then(|h| resources.shader(h)) else {
                continue;
            };

            shader.use_program();
            self.upload_scene_uniforms(shader, scene.lights(), camera);
            upload_material(shader, object.material());
            shader.set_mat4("model", &object.transform());
            object.draw(resources, DrawMode::Triangles);
            stats.objects_drawn += 1;

            if object.draw_highlight(resources, camera, self.time) {
                stats.highlights_drawn += 1;
            }
        }
        stats
    }

    fn deferred_shaders(
        &self,
        resources: &mut ResourceManager,
    ) -> Option<(ShaderHandle, ShaderHandle)> {
        let geometry = resources.ensure_shader(GBUFFER_SHADER);
        let lighting = resources.ensure_shader(DEFERRED_LIGHTING_SHADER);
        match (geometry, lighting) {
            (Ok(geometry), Ok(lighting)) => Some((geometry, lighting)),
            (Err(err), _) | (_, Err(err)) => {
                log::error!("Deferred shaders unavailable, rendering forward: {}", err);
                None
            }
        }
    }

    fn render_deferred(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        resources: &ResourceManager,
        geometry: ShaderHandle,
        lighting: ShaderHandle,
    ) -> RenderStats {
        let (Some(geometry), Some(lighting)) = (resources.shader(geometry), resources.shader(lighting))
        else {
            return self.render_forward(scene, camera, resources);
        };

        // Blending on any G-buffer target accumulates garbage across frames.
        self.gl.set_capability(Capability::Blend, false);

        if let Err(err) = self.setup_deferred_rendering() {
            log::error!("Deferred rendering aborted: {}", err);
            self.gl.bind_framebuffer(None);
            return RenderStats {
                path: RenderPath::Aborted,
                ..Default::default()
            };
        }
        let (Some(gbuffer), Some(quad)) = (&self.gbuffer, &self.screen_quad) else {
            return RenderStats {
                path: RenderPath::Aborted,
                ..Default::default()
            };
        };

        let mut stats = RenderStats {
            path: RenderPath::Deferred,
            ..Default::default()
        };

        // Geometry pass
        gbuffer.bind();
        self.gl.clear([0.0, 0.0, 0.0, 1.0]);
        geometry.use_program();
        geometry.set_mat4("view", &camera.view_matrix());
        geometry.set_mat4("projection", &camera.projection_matrix());
        for object in scene.objects() {
            if !object.is_visible() || object.shader().is_none() {
                continue;
            }
            geometry.set_mat4("model", &object.transform());
            upload_material(geometry, object.material());
            object.draw(resources, DrawMode::Triangles);
            stats.objects_drawn += 1;
        }

        // Lighting pass
        self.gl.bind_framebuffer(None);
        self.gl.clear(self.clear_color);
        lighting.use_program();
        lighting.set_int("gPosition", POSITION_UNIT as i32);
        lighting.set_int("gNormal", NORMAL_UNIT as i32);
        lighting.set_int("gAlbedoSpec", ALBEDO_SPEC_UNIT as i32);
        gbuffer.bind_textures();
        self.upload_lights(lighting, scene.lights());
        lighting.set_int("lightingModel", self.lighting_model as i32);
        lighting.set_vec3("viewPos", camera.position());
        lighting.set_float("time", self.time);
        self.gl.set_capability(Capability::DepthTest, false);
        quad.draw();
        self.gl
            .set_capability(Capability::DepthTest, self.depth_test);

        // Highlight pass, straight into the default framebuffer
        for object in scene.objects() {
            if object.draw_highlight(resources, camera, self.time) {
                stats.highlights_drawn += 1;
            }
        }

        self.gl.set_capability(Capability::Blend, false);
        stats
    }

    /// Creates the G-buffer and screen quad if they do not exist yet.
    fn setup_deferred_rendering(&mut self) -> Result<()> {
        if let Some(gbuffer) = &self.gbuffer {
            if gbuffer.size() == (self.width, self.height) && self.screen_quad.is_some() {
                return Ok(());
            }
        }
        self.cleanup_deferred_rendering();

        let gbuffer = GBuffer::new(self.gl.clone(), self.width, self.height)?;
        let quad = ScreenQuad::new(self.gl.clone())?;
        self.gbuffer = Some(gbuffer);
        self.screen_quad = Some(quad);
        Ok(())
    }

    fn render_tessellated(
        &self,
        scene: &Scene,
        camera: &Camera,
        resources: &ResourceManager,
        shader: ShaderHandle,
    ) -> RenderStats {
        let Some(shader) = resources.shader(shader) else {
            return self.render_forward(scene, camera, resources);
        };

        let polygon_mode = match self.render_mode {
            RenderMode::TessellationWithWireframe => PolygonMode::Line,
            _ => PolygonMode::Fill,
        };
        self.gl.set_polygon_mode(polygon_mode);

        let mut stats = RenderStats {
            path: RenderPath::Tessellated,
            ..Default::default()
        };

        shader.use_program();
        shader.set_float("tessLevelOuter", self.tess_level_outer);
        shader.set_float("tessLevelInner", self.tess_level_inner);
        shader.set_float("displacementAmount", self.displacement_amount);
        self.upload_scene_uniforms(shader, scene.lights(), camera);

        for object in scene.objects() {
            if !object.is_visible() || object.shader().is_none() {
                continue;
            }
            shader.use_program();
            upload_material(shader, object.material());
            shader.set_mat4("model", &object.transform());
            object.draw(resources, DrawMode::Patches);
            stats.objects_drawn += 1;
        }

        self.gl.set_polygon_mode(PolygonMode::Fill);
        for object in scene.objects() {
            if object.draw_highlight(resources, camera, self.time) {
                stats.highlights_drawn += 1;
            }
        }
        self.gl.set_polygon_mode(polygon_mode);
        stats
    }

    fn upload_scene_uniforms(&self, shader: &Shader, lights: &[Light], camera: &Camera) {
        shader.set_int("lightingModel", self.lighting_model as i32);
        self.upload_lights(shader, lights);
        shader.set_vec3("viewPos", camera.position());
        shader.set_float("time", self.time);
        shader.set_mat4("view", &camera.view_matrix());
        shader.set_mat4("projection", &camera.projection_matrix());
    }

    fn upload_lights(&self, shader: &Shader, lights: &[Light]) {
        if lights.len() > MAX_LIGHTS {
            log::debug!("{} lights in scene, only {} are shaded", lights.len(), MAX_LIGHTS);
        }
        let count = lights.len().min(MAX_LIGHTS);
        shader.set_int("numLights", count as i32);
        for (i, light) in lights.iter().take(count).enumerate() {
            shader.set_vec3(&format!("lights[{i}].position"), light.position);
            shader.set_vec3(&format!("lights[{i}].color"), light.color);
            shader.set_float(&format!("lights[{i}].intensity"), light.intensity);
        }
    }

    // Settings

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode != self.render_mode {
            log::info!("Render mode: {}", mode);
        }
        self.render_mode = mode;
    }

    pub fn lighting_model(&self) -> LightingModel {
        self.lighting_model
    }

    pub fn set_lighting_model(&mut self, model: LightingModel) {
        self.lighting_model = model;
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    pub fn is_depth_test_enabled(&self) -> bool {
        self.depth_test
    }

    pub fn enable_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    pub fn tess_level_outer(&self) -> f32 {
        self.tess_level_outer
    }

    pub fn set_tess_level_outer(&mut self, level: f32) {
        self.tess_level_outer = level.max(1.0);
    }

    pub fn tess_level_inner(&self) -> f32 {
        self.tess_level_inner
    }

    pub fn set_tess_level_inner(&mut self, level: f32) {
        self.tess_level_inner = level.max(1.0);
    }

    pub fn displacement_amount(&self) -> f32 {
        self.displacement_amount
    }

    pub fn set_displacement_amount(&mut self, amount: f32) {
        self.displacement_amount = amount;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn has_gbuffer(&self) -> bool {
        self.gbuffer.is_some()
    }

    pub fn gl(&self) -> &Rc<dyn GraphicsApi> {
        &self.gl
    }
}

fn upload_material(shader: &Shader, material: &Material) {
    shader.set_vec3("material.ambient", material.ambient);
    shader.set_vec3("material.diffuse", material.diffuse);
    shader.set_vec3("material.specular", material.specular);
    shader.set_float("material.shininess", material.shininess);
}
