//! Object Properties and Scene Settings panels

use cgmath::Vector3;

use crate::gfx::rendering::Renderer;
use crate::gfx::resources::ResourceManager;
use crate::gfx::scene::{Geometry, ObjectId, Scene, SceneObject};

use super::{UiRequest, UiState};

/// Object list plus editors for the selected object's properties.
pub fn object_properties_panel(
    ui: &imgui::Ui,
    state: &mut UiState,
    scene: &mut Scene,
    resources: &ResourceManager,
) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }
    let panel_height = (display_size[1] * 0.6).max(400.0);

    let mut open = state.show_object_properties;
    ui.window("Object Properties")
        .opened(&mut open)
        .size([340.0, panel_height], imgui::Condition::FirstUseEver)
        .position([10.0, 30.0], imgui::Condition::FirstUseEver)
        .build(|| {
            if let Some(clicked) = render_object_list(ui, scene, state.selected()) {
                state.select(scene, Some(clicked));
            }
            ui.separator();

            let Some(id) = state.selected() else {
                ui.text_disabled("Select an object to edit it");
                return;
            };
            if let Some(object) = scene.object_mut(id) {
                render_object_editor(ui, object, resources);
                ui.spacing();
                if ui.button("Delete Object") {
                    state.request(UiRequest::DeleteObject(id));
                }
            }
        });
    state.show_object_properties = open;
}

/// Returns the id of a clicked entry.
fn render_object_list(
    ui: &imgui::Ui,
    scene: &Scene,
    selected: Option<ObjectId>,
) -> Option<ObjectId> {
    ui.text(format!("Objects ({})", scene.object_count()));
    let mut clicked = None;
    ui.child_window("object_list")
        .size([0.0, 150.0])
        .border(true)
        .build(|| {
            if scene.object_count() == 0 {
                ui.text_disabled("Scene is empty. Use Add to create objects.");
            }
            for object in scene.objects() {
                let label = format!("{}##{}", object.name(), object.id().0);
                if ui
                    .selectable_config(&label)
                    .selected(selected == Some(object.id()))
                    .build()
                {
                    clicked = Some(object.id());
                }
            }
        });
    clicked
}

fn render_object_editor(ui: &imgui::Ui, object: &mut SceneObject, resources: &ResourceManager) {
    let mut name = object.name().to_string();
    if ui.input_text("Name", &mut name).build() && !name.is_empty() {
        object.set_name(name);
    }

    let mut visible = object.is_visible();
    if ui.checkbox("Visible", &mut visible) {
        object.set_visible(visible);
    }
    ui.same_line();
    let mut highlighted = object.is_highlighted();
    if ui.checkbox("Highlight", &mut highlighted) {
        object.set_highlighted(highlighted);
    }

    if ui.collapsing_header("Transform", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        if let Some(position) = drag_vec3(ui, "Position", object.position(), 0.05) {
            object.set_position(position);
        }
        if let Some(rotation) = drag_vec3(ui, "Rotation", object.rotation(), 1.0) {
            object.set_rotation(rotation);
        }
        if let Some(scale) = drag_vec3(ui, "Scale", object.scale(), 0.01) {
            object.set_scale(scale);
        }
        if ui.button("Reset Transform") {
            object.set_position(Vector3::new(0.0, 0.0, 0.0));
            object.set_rotation(Vector3::new(0.0, 0.0, 0.0));
            object.set_scale(Vector3::new(1.0, 1.0, 1.0));
        }
    }

    if ui.collapsing_header("Material", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        let material = object.material_mut();
        edit_color(ui, "Ambient", &mut material.ambient);
        edit_color(ui, "Diffuse", &mut material.diffuse);
        edit_color(ui, "Specular", &mut material.specular);
        ui.slider("Shininess", 1.0, 256.0, &mut material.shininess);
    }

    if ui.collapsing_header("Shader", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        let names = resources.shader_names();
        let current = object
            .shader()
            .and_then(|handle| resources.shader_name(handle))
            .and_then(|name| names.iter().position(|n| n == name));
        let mut index = current.unwrap_or(0);
        if names.is_empty() {
            ui.text_disabled("No shaders loaded");
        } else if ui.combo_simple_string("Shader", &mut index, names.as_slice()) && Some(index) != current {
            object.set_shader(resources.shader_handle(&names[index]));
        }
        if current.is_none() {
            ui.text_colored([1.0, 0.6, 0.0, 1.0], "No shader bound; object is not drawn");
        }
    }

    if ui.collapsing_header("Geometry", imgui::TreeNodeFlags::empty()) {
        match object.geometry() {
            Geometry::Mesh(mesh) => {
                if let Some(kind) = object.primitive() {
                    ui.text(format!("Primitive: {}", kind));
                }
                ui.text(format!("Vertices: {}", mesh.vertex_count()));
                ui.text(format!("Triangles: {}", mesh.triangle_count()));
            }
            Geometry::Model(handle) => {
                let name = resources.model_name(*handle).unwrap_or("<released>");
                ui.text(format!("Model: {}", name));
                if let Some(model) = resources.model(*handle) {
                    ui.text(format!("Meshes: {}", model.meshes().len()));
                    ui.text(format!("Vertices: {}", model.vertex_count()));
                    ui.text(format!("Triangles: {}", model.triangle_count()));
                }
            }
            Geometry::None => ui.text_disabled("No geometry"),
        }
    }
}

/// Clear color, light list and tessellation parameters.
pub fn scene_settings_panel(
    ui: &imgui::Ui,
    state: &mut UiState,
    scene: &mut Scene,
    renderer: &mut Renderer,
) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    let mut open = state.show_scene_settings;
    ui.window("Scene Settings")
        .opened(&mut open)
        .size([320.0, 420.0], imgui::Condition::FirstUseEver)
        .position(
            [display_size[0] - 330.0, 150.0],
            imgui::Condition::FirstUseEver,
        )
        .build(|| {
            let mut clear_color = renderer.clear_color();
            if ui.color_edit4("Background", &mut clear_color) {
                renderer.set_clear_color(clear_color);
            }

            if ui.collapsing_header("Lights", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                render_light_list(ui, scene);
            }

            if ui.collapsing_header("Tessellation", imgui::TreeNodeFlags::empty()) {
                let mut outer = renderer.tess_level_outer();
                if ui.slider("Outer Level", 1.0, 64.0, &mut outer) {
                    renderer.set_tess_level_outer(outer);
                }
                let mut inner = renderer.tess_level_inner();
                if ui.slider("Inner Level", 1.0, 64.0, &mut inner) {
                    renderer.set_tess_level_inner(inner);
                }
                let mut displacement = renderer.displacement_amount();
                if ui.slider("Displacement", 0.0, 1.0, &mut displacement) {
                    renderer.set_displacement_amount(displacement);
                }
            }
        });
    state.show_scene_settings = open;
}

fn render_light_list(ui: &imgui::Ui, scene: &mut Scene) {
    let mut remove = None;
    for index in 0..scene.lights().len() {
        let _id = ui.push_id_usize(index);
        let Some(light) = scene.light_mut(index) else {
            continue;
        };

        if ui.collapsing_header(format!("Light {}", index), imgui::TreeNodeFlags::empty()) {
            if let Some(position) = drag_vec3(ui, "Position", light.position, 0.1) {
                light.position = position;
            }
            edit_color(ui, "Color", &mut light.color);
            ui.slider("Intensity", 0.0, 10.0, &mut light.intensity);
            if ui.button("Remove") {
                remove = Some(index);
            }
        }
    }

    if let Some(index) = remove {
        scene.remove_light(index);
    }
    if ui.button("Add Light") {
        scene.add_default_light();
    }
}

fn drag_vec3(ui: &imgui::Ui, label: &str, value: Vector3<f32>, speed: f32) -> Option<Vector3<f32>> {
    let mut values: [f32; 3] = value.into();
    imgui::Drag::new(label)
        .speed(speed)
        .build_array(ui, &mut values)
        .then(|| values.into())
}

fn edit_color(ui: &imgui::Ui, label: &str, color: &mut Vector3<f32>) {
    let mut values: [f32; 3] = (*color).into();
    if ui.color_edit3(label, &mut values) {
        *color = values.into();
    }
}
