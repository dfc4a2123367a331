//! # User Interface Module
//!
//! Dear ImGui panels for the editor. The panels only build widgets against an [`imgui::Ui`]
//! frame; creating the ImGui context and drawing its output is left to the host, which must
//! bracket that draw with [`Renderer::prepare_for_ui`] and [`Renderer::restore_after_ui`].
//!
//! ## Panels
//!
//! - **Main menu** ([`menu`]) - File, View, Add and Renderer menus
//! - **Object Properties** ([`panel::object_properties_panel`]) - Selection, transform, material
//!   and shader of one object
//! - **Scene Settings** ([`panel::scene_settings_panel`]) - Clear color, lights and tessellation
//! - **Shader Editor** ([`ShaderEditor`]) - Live editing and recompiling of shader sources
//! - **Performance** ([`FrameStats::render_ui`]) - Frame times and render statistics
//!
//! Panels change scene values directly. Anything that replaces the scene or touches the file
//! system is queued as a [`UiRequest`] for the editor to carry out after the frame.
//!
//! [`Renderer::prepare_for_ui`]: crate::gfx::rendering::Renderer::prepare_for_ui
//! [`Renderer::restore_after_ui`]: crate::gfx::rendering::Renderer::restore_after_ui

pub mod menu;
pub mod panel;
pub mod shader_editor;

use std::path::PathBuf;

use crate::gfx::geometry::PrimitiveKind;
use crate::gfx::rendering::Renderer;
use crate::gfx::resources::ResourceManager;
use crate::gfx::scene::{ObjectId, Scene};
use crate::performance::FrameStats;

pub use shader_editor::{CompileStatus, ShaderEditor};

/// Actions raised by the panels and carried out by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum UiRequest {
    NewScene,
    OpenScene(PathBuf),
    SaveScene(PathBuf),
    AddPrimitive(PrimitiveKind),
    ImportModel(PathBuf),
    DeleteObject(ObjectId),
    Exit,
}

/// Panel visibility, selection and text fields that live across frames.
#[derive(Debug)]
pub struct UiState {
    pub show_object_properties: bool,
    pub show_scene_settings: bool,
    pub show_shader_editor: bool,
    pub show_performance: bool,
    pub scene_path: String,
    pub model_path: String,
    pub shader_editor: ShaderEditor,
    selected: Option<ObjectId>,
    requests: Vec<UiRequest>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_object_properties: true,
            show_scene_settings: true,
            show_shader_editor: false,
            show_performance: true,
            scene_path: "scene.json".to_string(),
            model_path: String::new(),
            shader_editor: ShaderEditor::default(),
            selected: None,
            requests: Vec::new(),
        }
    }
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    /// Moves the selection, highlighting the new object and clearing the old highlight.
    pub fn select(&mut self, scene: &mut Scene, id: Option<ObjectId>) {
        if let Some(previous) = self.selected.and_then(|id| scene.object_mut(id)) {
            previous.set_highlighted(false);
        }
        self.selected = id.filter(|id| scene.object(*id).is_some());
        if let Some(current) = self.selected.and_then(|id| scene.object_mut(id)) {
            current.set_highlighted(true);
        }
    }

    /// Drops a selection whose object no longer exists.
    pub fn validate_selection(&mut self, scene: &Scene) {
        if self.selected.is_some_and(|id| scene.object(id).is_none()) {
            self.selected = None;
        }
    }

    pub fn request(&mut self, request: UiRequest) {
        self.requests.push(request);
    }

    /// Requests raised since the last call, oldest first.
    pub fn take_requests(&mut self) -> Vec<UiRequest> {
        std::mem::take(&mut self.requests)
    }
}

/// Builds every editor panel for one frame.
pub fn build_editor_ui(
    ui: &imgui::Ui,
    state: &mut UiState,
    scene: &mut Scene,
    resources: &mut ResourceManager,
    renderer: &mut Renderer,
    frame_stats: &FrameStats,
) {
    menu::main_menu_bar(ui, state, renderer);

    if state.show_object_properties {
        panel::object_properties_panel(ui, state, scene, resources);
    }
    if state.show_scene_settings {
        panel::scene_settings_panel(ui, state, scene, renderer);
    }
    if state.show_shader_editor {
        let mut open = true;
        state.shader_editor.render_ui(ui, &mut open, resources);
        state.show_shader_editor = open;
    }
    if state.show_performance {
        frame_stats.render_ui(ui, &mut state.show_performance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::SceneObject;

    #[test]
    fn test_selection_moves_highlight() {
        let mut scene = Scene::new();
        let a = scene.add_object(SceneObject::new("a")).id();
        let b = scene.add_object(SceneObject::new("b")).id();
        let mut state = UiState::new();

        state.select(&mut scene, Some(a));
        assert!(scene.object(a).unwrap().is_highlighted());

        state.select(&mut scene, Some(b));
        assert!(!scene.object(a).unwrap().is_highlighted());
        assert!(scene.object(b).unwrap().is_highlighted());
        assert_eq!(state.selected(), Some(b));

        state.select(&mut scene, None);
        assert!(!scene.object(b).unwrap().is_highlighted());
    }

    #[test]
    fn test_selection_of_removed_object_is_dropped() {
        let mut scene = Scene::new();
        let a = scene.add_object(SceneObject::new("a")).id();
        let mut state = UiState::new();
        state.select(&mut scene, Some(a));
        scene.remove_object(a);
        state.validate_selection(&scene);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_requests_are_drained() {
        let mut state = UiState::new();
        state.request(UiRequest::NewScene);
        state.request(UiRequest::AddPrimitive(PrimitiveKind::Cone));
        assert_eq!(
            state.take_requests(),
            vec![UiRequest::NewScene, UiRequest::AddPrimitive(PrimitiveKind::Cone)]
        );
        assert!(state.take_requests().is_empty());
    }
}
