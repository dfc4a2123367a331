use std::rc::Rc;

use cgmath::Vector3;
use thistle::gfx::backend::{
    ApiVersion, Capability, GlCall, HeadlessBackend, PolygonMode, Primitive, UniformValue,
};
use thistle::gfx::camera::Camera;
use thistle::gfx::geometry::{create_primitive_object, PrimitiveKind};
use thistle::gfx::rendering::{RenderMode, RenderPath, Renderer};
use thistle::gfx::resources::ResourceManager;
use thistle::gfx::scene::{Light, Mesh, Scene, SceneObject};

const SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/shaders");

const VERTEX: &str = "#version 330 core\nuniform mat4 model;\nuniform mat4 view;\nuniform mat4 projection;\nvoid main() {}\n";
const FRAGMENT: &str = "#version 330 core\nuniform int numLights;\nout vec4 color;\nvoid main() {}\n";

fn setup(headless: &Rc<HeadlessBackend>) -> (ResourceManager, Scene, Camera, Renderer) {
    let resources = ResourceManager::new(headless.clone(), SHADER_DIR);
    let camera = Camera::new(45.0, 4.0 / 3.0, 0.1, 100.0);
    let mut renderer = Renderer::new(headless.clone(), 640, 480);
    renderer.initialize();
    (resources, Scene::new(), camera, renderer)
}

fn frame(renderer: &mut Renderer, scene: &Scene, camera: &Camera, resources: &mut ResourceManager) {
    renderer.begin_frame();
    renderer.render(scene, camera, resources);
    renderer.end_frame();
}

fn draws(headless: &HeadlessBackend) -> Vec<(Primitive, usize, bool)> {
    headless
        .draw_calls()
        .into_iter()
        .filter_map(|call| match call {
            GlCall::Draw {
                primitive,
                count,
                indexed,
                ..
            } => Some((primitive, count, indexed)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_cube_is_one_indexed_draw() {
    let headless = Rc::new(HeadlessBackend::new());
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);
    let cube = create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap();
    scene.add_object(cube);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);

    assert_eq!(draws(&headless), vec![(Primitive::Triangles, 36, true)]);
    let stats = renderer.stats();
    assert_eq!(stats.path, RenderPath::Forward);
    assert_eq!(stats.objects_drawn, 1);
    assert_eq!(stats.highlights_drawn, 0);
    assert_eq!(headless.polygon_mode(), PolygonMode::Fill);
    assert!(headless.is_enabled(Capability::DepthTest));
}

#[test]
fn test_hidden_and_shaderless_objects_are_skipped() {
    let headless = Rc::new(HeadlessBackend::new());
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);

    let mut hidden = create_primitive_object(PrimitiveKind::Plane, "Plane_1", &mut resources).unwrap();
    hidden.set_visible(false);
    scene.add_object(hidden);
    let mut bare = create_primitive_object(PrimitiveKind::Cube, "Cube_2", &mut resources).unwrap();
    bare.set_shader(None);
    scene.add_object(bare);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);
    assert!(draws(&headless).is_empty());
    assert_eq!(renderer.stats().objects_drawn, 0);
}

#[test]
fn test_empty_mesh_issues_no_draw() {
    let headless = Rc::new(HeadlessBackend::new());
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);
    resources.ensure_shader("default").unwrap();

    let mut object = SceneObject::new("Empty");
    object.set_mesh(Mesh::new(headless.clone()));
    object.set_shader(resources.shader_handle("default"));
    scene.add_object(object);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);
    assert!(draws(&headless).is_empty());
}

#[test]
fn test_highlight_pass_blends_and_restores() {
    let headless = Rc::new(HeadlessBackend::new());
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);
    resources.ensure_shader("highlight").unwrap();
    let mut cube = create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap();
    cube.set_highlighted(true);
    scene.add_object(cube);

    headless.clear_calls();
    renderer.update(0.5);
    frame(&mut renderer, &scene, &camera, &mut resources);

    assert_eq!(draws(&headless).len(), 2);
    assert_eq!(renderer.stats().highlights_drawn, 1);
    assert!(!headless.is_enabled(Capability::Blend));
    assert_eq!(
        headless.last_uniform("highlightPulse"),
        Some(UniformValue::Float(1.5))
    );
}

#[test]
fn test_light_count_is_capped() {
    let headless = Rc::new(HeadlessBackend::new());
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);
    let cube = create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap();
    scene.add_object(cube);
    for i in 0..10 {
        scene.add_light(Light::new(
            Vector3::new(i as f32, 2.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            1.0,
        ));
    }

    frame(&mut renderer, &scene, &camera, &mut resources);
    assert_eq!(headless.last_uniform("numLights"), Some(UniformValue::Int(8)));
}

#[test]
fn test_deferred_falls_back_to_forward_without_shaders() {
    let headless = Rc::new(HeadlessBackend::new());
    let empty_dir = tempfile::tempdir().unwrap();
    let mut resources = ResourceManager::new(headless.clone(), empty_dir.path());
    resources
        .load_shader_from_source("default", VERTEX, FRAGMENT)
        .unwrap();

    let mut scene = Scene::new();
    scene.add_object(create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap());
    let camera = Camera::new(45.0, 1.0, 0.1, 100.0);
    let mut renderer = Renderer::new(headless.clone(), 320, 240);
    renderer.set_render_mode(RenderMode::Deferred);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);

    assert_eq!(renderer.stats().path, RenderPath::Forward);
    assert_eq!(draws(&headless), vec![(Primitive::Triangles, 36, true)]);
    assert!(!renderer.has_gbuffer());
}

#[test]
fn test_gbuffer_lifecycle() {
    let headless = Rc::new(HeadlessBackend::new());
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);
    scene.add_object(create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap());
    renderer.set_render_mode(RenderMode::Deferred);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);

    assert_eq!(renderer.stats().path, RenderPath::Deferred);
    assert!(renderer.has_gbuffer());
    assert_eq!(headless.bound_framebuffer(), None);
    let live = headless.live_objects();
    assert_eq!(live.textures, 3);
    assert_eq!(live.renderbuffers, 1);
    assert_eq!(live.framebuffers, 1);
    assert_eq!(
        draws(&headless),
        vec![
            (Primitive::Triangles, 36, true),
            (Primitive::TriangleStrip, 4, false)
        ]
    );

    // A second frame reuses the same targets.
    frame(&mut renderer, &scene, &camera, &mut resources);
    assert_eq!(headless.live_objects().textures, 3);

    renderer.resize(800, 600);
    assert!(!renderer.has_gbuffer());
    let live = headless.live_objects();
    assert_eq!(live.textures, 0);
    assert_eq!(live.framebuffers, 0);

    frame(&mut renderer, &scene, &camera, &mut resources);
    assert!(renderer.has_gbuffer());
    renderer.cleanup_deferred_rendering();
    renderer.cleanup_deferred_rendering();
    assert_eq!(headless.live_objects().renderbuffers, 0);
}

#[test]
fn test_incomplete_gbuffer_aborts_frame() {
    let headless = Rc::new(HeadlessBackend::new());
    let mut resources = ResourceManager::new(headless.clone(), SHADER_DIR);
    let mut scene = Scene::new();
    scene.add_object(create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap());
    let camera = Camera::new(45.0, 1.0, 0.1, 100.0);
    let mut renderer = Renderer::new(headless.clone(), 0, 0);
    renderer.set_render_mode(RenderMode::Deferred);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);

    assert_eq!(renderer.stats().path, RenderPath::Aborted);
    assert!(!renderer.has_gbuffer());
    assert_eq!(headless.bound_framebuffer(), None);
    assert!(draws(&headless).is_empty());
    assert_eq!(headless.live_objects().framebuffers, 0);
    assert_eq!(headless.live_objects().textures, 0);
}

#[test]
fn test_tessellation_needs_gl4() {
    let headless = Rc::new(HeadlessBackend::with_version(ApiVersion::new(3, 3)));
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);
    scene.add_object(create_primitive_object(PrimitiveKind::Sphere, "Sphere_1", &mut resources).unwrap());
    renderer.set_render_mode(RenderMode::Tessellation);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);

    assert_eq!(renderer.render_mode(), RenderMode::Solid);
    assert_eq!(renderer.stats().path, RenderPath::Forward);
    assert_eq!(renderer.stats().objects_drawn, 1);
    let draws = draws(&headless);
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].0, Primitive::Triangles);
    assert!(resources.shader_by_name("tessellation").is_none());
}

#[test]
fn test_tessellation_without_shader_renders_forward() {
    let headless = Rc::new(HeadlessBackend::new());
    let dir = tempfile::tempdir().unwrap();
    for file in ["default.vert", "default.frag"] {
        std::fs::copy(
            std::path::Path::new(SHADER_DIR).join(file),
            dir.path().join(file),
        )
        .unwrap();
    }
    let mut resources = ResourceManager::new(headless.clone(), dir.path());
    let mut scene = Scene::new();
    scene.add_object(create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap());
    let camera = Camera::new(45.0, 1.0, 0.1, 100.0);
    let mut renderer = Renderer::new(headless.clone(), 320, 240);
    renderer.initialize();
    renderer.set_render_mode(RenderMode::Tessellation);

    headless.clear_calls();
    frame(&mut renderer, &scene, &camera, &mut resources);

    // A capable context keeps the mode and retries the shader next frame.
    assert_eq!(renderer.stats().path, RenderPath::Forward);
    assert_eq!(renderer.render_mode(), RenderMode::Tessellation);
    assert_eq!(draws(&headless), vec![(Primitive::Triangles, 36, true)]);
    assert!(resources.shader_by_name("tessellation").is_none());
}

#[test]
fn test_tessellated_wireframe_draws_patches() {
    let headless = Rc::new(HeadlessBackend::new());
    let (mut resources, mut scene, camera, mut renderer) = setup(&headless);
    scene.add_object(create_primitive_object(PrimitiveKind::Cube, "Cube_1", &mut resources).unwrap());
    renderer.set_render_mode(RenderMode::TessellationWithWireframe);
    renderer.set_tess_level_outer(8.0);

    headless.clear_calls();
    renderer.begin_frame();
    renderer.render(&scene, &camera, &mut resources);

    assert_eq!(renderer.stats().path, RenderPath::Tessellated);
    assert_eq!(draws(&headless), vec![(Primitive::Patches, 36, true)]);
    assert_eq!(headless.patch_vertices(), 3);
    assert_eq!(headless.polygon_mode(), PolygonMode::Line);
    assert_eq!(
        headless.last_uniform("tessLevelOuter"),
        Some(UniformValue::Float(8.0))
    );

    renderer.end_frame();
    assert_eq!(headless.polygon_mode(), PolygonMode::Fill);
}
