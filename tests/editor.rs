use std::rc::Rc;

use thistle::gfx::backend::{Capability, HeadlessBackend};
use thistle::gfx::geometry::PrimitiveKind;
use thistle::gfx::rendering::{RenderMode, RenderPath};
use thistle::ui::UiRequest;
use thistle::{Editor, EditorConfig};
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

const SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/shaders");

fn editor() -> (Rc<HeadlessBackend>, Editor) {
    let headless = Rc::new(HeadlessBackend::new());
    let config = EditorConfig {
        shader_dir: SHADER_DIR.into(),
        ..Default::default()
    };
    let editor = Editor::new(headless.clone(), config).unwrap();
    (headless, editor)
}

#[test]
fn test_starts_with_default_scene() {
    let (_, editor) = editor();
    let names: Vec<&str> = editor.scene().objects().iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["Cube_1", "Sphere_1"]);
    assert_eq!(editor.scene().lights().len(), 1);
    assert!(editor.resources().shader_handle("highlight").is_some());
    assert_eq!(editor.renderer().size(), (1280, 720));
    assert!(!editor.exit_requested());
}

#[test]
fn test_missing_default_shader_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig {
        shader_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let err = Editor::new(Rc::new(HeadlessBackend::new()), config).err().unwrap();
    assert!(format!("{err:#}").contains("default"));
}

#[test]
fn test_frame_draws_every_object() {
    let (headless, mut editor) = editor();
    headless.clear_calls();
    editor.update(1.0 / 60.0);
    editor.render();

    let stats = editor.frame_stats().last_render();
    assert_eq!(stats.path, RenderPath::Forward);
    assert_eq!(stats.objects_drawn, 2);
    assert_eq!(headless.draw_calls().len(), 2);
    assert_eq!(editor.frame_stats().total_frames(), 1);
}

#[test]
fn test_selection_draws_highlight() {
    let (_, mut editor) = editor();
    let cube = editor.scene().objects()[0].id();
    editor.select(Some(cube));
    editor.render();
    assert_eq!(editor.frame_stats().last_render().highlights_drawn, 1);

    editor.select(None);
    editor.render();
    assert_eq!(editor.frame_stats().last_render().highlights_drawn, 0);
}

#[test]
fn test_requests_edit_the_scene() {
    let (_, mut editor) = editor();
    editor.apply_request(UiRequest::AddPrimitive(PrimitiveKind::Cone));
    assert_eq!(editor.scene().objects()[2].name(), "Cone_3");

    let cube = editor.scene().objects()[0].id();
    editor.select(Some(cube));
    editor.apply_request(UiRequest::DeleteObject(cube));
    assert_eq!(editor.scene().object_count(), 2);
    assert_eq!(editor.ui_state().selected(), None);

    editor.apply_request(UiRequest::NewScene);
    assert_eq!(editor.scene().object_count(), 0);
    assert_eq!(editor.scene().lights().len(), 1);

    editor.apply_request(UiRequest::Exit);
    assert!(editor.exit_requested());
}

#[test]
fn test_save_and_open_requests() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");
    let (_, mut editor) = editor();

    editor.apply_request(UiRequest::SaveScene(path.clone()));
    editor.apply_request(UiRequest::NewScene);
    editor.apply_request(UiRequest::OpenScene(path));
    assert_eq!(editor.scene().object_count(), 2);

    // A failed open is logged and keeps the current scene.
    editor.apply_request(UiRequest::OpenScene(dir.path().join("missing.json")));
    assert_eq!(editor.scene().object_count(), 2);
}

#[test]
fn test_import_model_names_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tri.obj");
    std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

    let (_, mut editor) = editor();
    let id = editor.import_model(&path).unwrap();
    let object = editor.scene().object(id).unwrap();
    assert_eq!(object.name(), "Model_tri_3");
    assert!(object.has_model());
    assert!(object.shader().is_some());

    assert!(editor.import_model(dir.path().join("missing.obj")).is_err());
    assert_eq!(editor.scene().object_count(), 3);
}

#[test]
fn test_window_events() {
    let (_, mut editor) = editor();
    assert!(editor.handle_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600)), false));
    assert_eq!(editor.renderer().size(), (800, 600));
    assert!((editor.camera().aspect_ratio() - 800.0 / 600.0).abs() < 1e-6);

    // Minimised windows report zero size.
    editor.resize(0, 0);
    assert_eq!(editor.renderer().size(), (800, 600));

    assert!(editor.handle_window_event(&WindowEvent::CloseRequested, true));
    assert!(editor.exit_requested());
}

#[test]
fn test_ui_composition_restores_state() {
    let (headless, mut editor) = editor();
    editor.renderer_mut().set_render_mode(RenderMode::Wireframe);
    editor.render();

    let blended = editor.compose_ui(|| {
        assert!(!headless.is_enabled(Capability::DepthTest));
        headless.is_enabled(Capability::Blend)
    });
    assert!(blended);
    assert!(headless.is_enabled(Capability::DepthTest));
    assert!(!headless.is_enabled(Capability::Blend));
}
