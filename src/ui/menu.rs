//! Main menu bar

use std::path::PathBuf;

use crate::gfx::geometry::PrimitiveKind;
use crate::gfx::rendering::{LightingModel, RenderMode, Renderer};

use super::{UiRequest, UiState};

pub fn main_menu_bar(ui: &imgui::Ui, state: &mut UiState, renderer: &mut Renderer) {
    ui.main_menu_bar(|| {
        ui.menu("File", || file_menu(ui, state));

        ui.menu("View", || {
            ui.menu_item_config("Object Properties")
                .build_with_ref(&mut state.show_object_properties);
            ui.menu_item_config("Scene Settings")
                .build_with_ref(&mut state.show_scene_settings);
            ui.menu_item_config("Shader Editor")
                .build_with_ref(&mut state.show_shader_editor);
            ui.menu_item_config("Performance")
                .build_with_ref(&mut state.show_performance);
        });

        ui.menu("Add", || {
            for kind in PrimitiveKind::ALL {
                if ui.menu_item(kind.name()) {
                    state.request(UiRequest::AddPrimitive(kind));
                }
            }
        });

        ui.menu("Renderer", || renderer_menu(ui, renderer));
    });
}

fn file_menu(ui: &imgui::Ui, state: &mut UiState) {
    if ui.menu_item("New Scene") {
        state.request(UiRequest::NewScene);
    }

    ui.separator();
    ui.text("Scene file");
    ui.input_text("##scene_path", &mut state.scene_path).build();
    let has_scene_path = !state.scene_path.trim().is_empty();
    if ui
        .menu_item_config("Open Scene")
        .enabled(has_scene_path)
        .build()
    {
        let path = PathBuf::from(state.scene_path.trim());
        state.request(UiRequest::OpenScene(path));
    }
    if ui
        .menu_item_config("Save Scene")
        .enabled(has_scene_path)
        .build()
    {
        let path = PathBuf::from(state.scene_path.trim());
        state.request(UiRequest::SaveScene(path));
    }

    ui.separator();
    ui.text("Model file");
    ui.input_text("##model_path", &mut state.model_path).build();
    if ui
        .menu_item_config("Import Model")
        .enabled(!state.model_path.trim().is_empty())
        .build()
    {
        let path = PathBuf::from(state.model_path.trim());
        state.request(UiRequest::ImportModel(path));
    }

    ui.separator();
    if ui.menu_item("Exit") {
        state.request(UiRequest::Exit);
    }
}

fn renderer_menu(ui: &imgui::Ui, renderer: &mut Renderer) {
    ui.text_disabled("Render mode");
    for mode in RenderMode::ALL {
        if ui
            .menu_item_config(mode.name())
            .selected(renderer.render_mode() == mode)
            .build()
        {
            renderer.set_render_mode(mode);
        }
    }

    ui.separator();
    ui.text_disabled("Lighting");
    for model in LightingModel::ALL {
        if ui
            .menu_item_config(model.name())
            .selected(renderer.lighting_model() == model)
            .build()
        {
            renderer.set_lighting_model(model);
        }
    }

    ui.separator();
    let mut depth_test = renderer.is_depth_test_enabled();
    if ui
        .menu_item_config("Depth Test")
        .build_with_ref(&mut depth_test)
    {
        renderer.enable_depth_test(depth_test);
    }
}
