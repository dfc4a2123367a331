//! Editor context
//!
//! [`Editor`] owns everything one editor window needs and threads it through each frame
//! explicitly: resources, scene, camera, renderer and UI state. The host owns the window, the
//! OpenGL context and the ImGui context, and drives the editor once per frame:
//!
//! ```no_run
//! # fn frame(editor: &mut thistle::Editor, ui: &imgui::Ui, dt: f32) {
//! editor.update(dt);
//! editor.render();
//! editor.build_ui(ui);
//! editor.compose_ui(|| {
//!     // draw the ImGui frame here
//! });
//! # }
//! ```

use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use cgmath::Vector3;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::config::EditorConfig;
use crate::error::Result;
use crate::gfx::{
    backend::GraphicsApi,
    camera::{Camera, CameraController},
    geometry::{create_primitive_object, PrimitiveKind, DEFAULT_SHADER},
    rendering::Renderer,
    resources::{Material, ResourceManager},
    scene::{
        object::HIGHLIGHT_SHADER, serialization::model_name_from_path, ObjectId, Scene,
        SceneObject,
    },
};
use crate::performance::FrameStats;
use crate::ui::{self, UiRequest, UiState};

pub struct Editor {
    config: EditorConfig,
    resources: ResourceManager,
    scene: Scene,
    camera: Camera,
    controller: CameraController,
    renderer: Renderer,
    ui_state: UiState,
    frame_stats: FrameStats,
    exit_requested: bool,
}

impl Editor {
    /// Loads shaders, sets up the renderer and builds the starter scene.
    ///
    /// Only a missing `default` shader is fatal; everything else degrades with a warning.
    pub fn new(gl: Rc<dyn GraphicsApi>, config: EditorConfig) -> anyhow::Result<Self> {
        let mut resources = ResourceManager::new(gl.clone(), &config.shader_dir);
        if config.shader_dir.is_dir() {
            if !resources.load_all_shaders_from_directory(&config.shader_dir) {
                log::warn!(
                    "Some shaders in {} failed to load",
                    config.shader_dir.display()
                );
            }
        } else {
            log::warn!(
                "Shader directory {} does not exist",
                config.shader_dir.display()
            );
        }

        resources.ensure_shader(DEFAULT_SHADER).with_context(|| {
            format!(
                "failed to load the '{}' shader from {}",
                DEFAULT_SHADER,
                config.shader_dir.display()
            )
        })?;
        if let Err(err) = resources.ensure_shader(HIGHLIGHT_SHADER) {
            log::warn!("Selection highlight disabled: {}", err);
        }

        let camera = config.camera.build(config.aspect_ratio());
        let mut renderer = Renderer::new(gl, config.window_width, config.window_height);
        config.apply_to_renderer(&mut renderer);
        renderer.initialize();

        let mut editor = Self {
            config,
            resources,
            scene: Scene::new(),
            camera,
            controller: CameraController::new(),
            renderer,
            ui_state: UiState::new(),
            frame_stats: FrameStats::new(),
            exit_requested: false,
        };
        editor
            .populate_default_scene()
            .context("failed to build the default scene")?;
        Ok(editor)
    }

    fn populate_default_scene(&mut self) -> Result<()> {
        for (kind, x) in [(PrimitiveKind::Cube, -1.5), (PrimitiveKind::Sphere, 1.5)] {
            let name = format!("{}_1", kind);
            let mut object = create_primitive_object(kind, &name, &mut self.resources)?;
            object.set_position(Vector3::new(x, 0.0, 0.0));
            self.scene.add_object(object);
        }
        Ok(())
    }

    // Scene editing

    /// Adds a primitive named `<Kind>_<n>` at the origin.
    pub fn add_primitive(&mut self, kind: PrimitiveKind) -> Result<ObjectId> {
        let name = format!("{}_{}", kind, self.scene.object_count() + 1);
        let object = create_primitive_object(kind, &name, &mut self.resources)?;
        let id = self.scene.add_object(object).id();
        log::info!("Added {}", name);
        Ok(id)
    }

    /// Imports a model file and adds an object named `Model_<stem>_<n>` that draws it.
    pub fn import_model(&mut self, path: impl AsRef<Path>) -> Result<ObjectId> {
        let path = path.as_ref();
        let stem = model_name_from_path(&path.to_string_lossy());
        let handle = self.resources.load_model(&stem, path)?;

        let name = format!("Model_{}_{}", stem, self.scene.object_count() + 1);
        let mut object = SceneObject::new(name.as_str());
        object.set_model(handle);
        object.set_material(Material::editor_default());
        object.set_shader(self.resources.shader_handle(DEFAULT_SHADER));
        let id = self.scene.add_object(object).id();
        log::info!("Imported {} as {}", path.display(), name);
        Ok(id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let removed = self.scene.remove_object(id);
        self.ui_state.validate_selection(&self.scene);
        removed
    }

    /// Replaces the scene with an empty one lit by the default light.
    pub fn new_scene(&mut self) {
        self.scene = Scene::new();
        self.ui_state.select(&mut self.scene, None);
        log::info!("New scene");
    }

    pub fn save_scene(&self, path: impl AsRef<Path>) -> Result<()> {
        self.scene.save_to_file(path, &self.resources)
    }

    /// Loads a scene file. On failure the current scene is kept.
    pub fn load_scene(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.scene.load_from_file(path, &mut self.resources)?;
        self.ui_state.select(&mut self.scene, None);
        Ok(())
    }

    // Frame

    /// Routes a window event. Camera input is ignored while the UI captures it.
    ///
    /// Returns true when the event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent, ui_captures_input: bool) -> bool {
        match event {
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.resize(*width, *height);
                true
            }
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                true
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !ui_captures_input => {
                self.exit_requested = true;
                true
            }
            WindowEvent::Focused(false) => {
                self.controller.release_all();
                false
            }
            _ if ui_captures_input => {
                // Keys held before the UI took focus must not keep the camera moving.
                self.controller.release_all();
                false
            }
            _ => self.controller.handle_window_event(event, &mut self.camera),
        }
    }

    /// Resizes the viewport. Minimised (zero-sized) windows are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        self.renderer.resize(width, height);
    }

    pub fn update(&mut self, dt: f32) {
        self.controller.update_camera(&mut self.camera, dt);
        self.scene.update(dt);
        self.renderer.update(dt);
        self.frame_stats.record_frame(dt);
    }

    pub fn render(&mut self) {
        self.renderer.begin_frame();
        self.renderer
            .render(&self.scene, &self.camera, &mut self.resources);
        self.renderer.end_frame();
        self.frame_stats.set_render_stats(self.renderer.stats());
    }

    /// Runs an external UI draw with UI-friendly state, then restores the frame state.
    pub fn compose_ui<R>(&self, draw: impl FnOnce() -> R) -> R {
        self.renderer.prepare_for_ui();
        let result = draw();
        self.renderer.restore_after_ui();
        result
    }

    /// Builds all panels for this frame and carries out what they requested.
    pub fn build_ui(&mut self, ui: &imgui::Ui) {
        ui::build_editor_ui(
            ui,
            &mut self.ui_state,
            &mut self.scene,
            &mut self.resources,
            &mut self.renderer,
            &self.frame_stats,
        );
        for request in self.ui_state.take_requests() {
            self.apply_request(request);
        }
    }

    /// Carries out one panel request. Failures are logged; the editor keeps running.
    pub fn apply_request(&mut self, request: UiRequest) {
        let result = match &request {
            UiRequest::NewScene => {
                self.new_scene();
                Ok(())
            }
            UiRequest::OpenScene(path) => self.load_scene(path),
            UiRequest::SaveScene(path) => self.save_scene(path),
            UiRequest::AddPrimitive(kind) => self.add_primitive(*kind).map(|_| ()),
            UiRequest::ImportModel(path) => self.import_model(path).map(|_| ()),
            UiRequest::DeleteObject(id) => {
                self.remove_object(*id);
                Ok(())
            }
            UiRequest::Exit => {
                self.exit_requested = true;
                Ok(())
            }
        };
        if let Err(err) = result {
            log::error!("{:?} failed: {}", request, err);
        }
    }

    // Accessors

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn ui_state(&self) -> &UiState {
        &self.ui_state
    }

    pub fn ui_state_mut(&mut self) -> &mut UiState {
        &mut self.ui_state
    }

    /// Selects an object and moves the highlight to it.
    pub fn select(&mut self, id: Option<ObjectId>) {
        self.ui_state.select(&mut self.scene, id);
    }

    pub fn frame_stats(&self) -> &FrameStats {
        &self.frame_stats
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}
