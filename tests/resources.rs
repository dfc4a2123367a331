use std::fs;
use std::rc::Rc;

use thistle::gfx::backend::HeadlessBackend;
use thistle::gfx::resources::ResourceManager;
use thistle::Error;

const SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/shaders");

const VERTEX: &str = "#version 330 core\nuniform mat4 model;\nvoid main() {}\n";
const FRAGMENT: &str = "#version 330 core\nout vec4 color;\nvoid main() {}\n";

const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";

fn manager(dir: impl Into<std::path::PathBuf>) -> ResourceManager {
    ResourceManager::new(Rc::new(HeadlessBackend::new()), dir)
}

#[test]
fn test_repeated_loads_return_same_handle() {
    let mut resources = manager(SHADER_DIR);
    let first = resources.ensure_shader("default").unwrap();
    let second = resources.ensure_shader("default").unwrap();
    assert_eq!(first, second);
    assert_eq!(resources.shader_count(), 1);
}

#[test]
fn test_failed_reload_keeps_running_program() {
    let mut resources = manager(SHADER_DIR);
    let handle = resources
        .load_shader_from_source("flat", VERTEX, FRAGMENT)
        .unwrap();
    let program = resources.shader(handle).unwrap().program();

    let err = resources
        .load_shader_from_source("flat", VERTEX, "out vec4 color;")
        .unwrap_err();
    assert!(matches!(err, Error::ShaderCompile { .. }));

    let shader = resources.shader(handle).unwrap();
    assert!(shader.is_valid());
    assert_eq!(shader.program(), program);
    assert_eq!(resources.shader_handle("flat"), Some(handle));
}

#[test]
fn test_failed_first_load_registers_nothing() {
    let mut resources = manager(SHADER_DIR);
    assert!(resources
        .load_shader_from_source("broken", "void mian() {}", FRAGMENT)
        .is_err());
    assert!(resources.shader_handle("broken").is_none());
    assert_eq!(resources.shader_count(), 0);
}

#[test]
fn test_release_invalidates_handles() {
    let mut resources = manager(SHADER_DIR);
    let handle = resources
        .load_shader_from_source("flat", VERTEX, FRAGMENT)
        .unwrap();
    assert!(resources.release_shader("flat"));
    assert!(resources.shader(handle).is_none());
    assert!(!resources.release_shader("flat"));

    // Re-registering under the same name gives a fresh handle.
    let again = resources
        .load_shader_from_source("flat", VERTEX, FRAGMENT)
        .unwrap();
    assert_ne!(again, handle);
    assert!(resources.shader(handle).is_none());
}

#[test]
fn test_directory_discovery() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("plain.vert"),
        format!("// Description: Plain colour\n{VERTEX}"),
    )
    .unwrap();
    fs::write(dir.path().join("plain.frag"), FRAGMENT).unwrap();
    fs::create_dir(dir.path().join("post")).unwrap();
    fs::write(dir.path().join("post/blur.vert"), VERTEX).unwrap();
    fs::write(dir.path().join("post/blur.frag"), FRAGMENT).unwrap();
    fs::write(dir.path().join("lonely.vert"), VERTEX).unwrap();

    let mut resources = manager(dir.path());
    assert!(!resources.load_all_shaders_from_directory(dir.path()));

    assert_eq!(resources.shader_names(), vec!["plain", "post/blur"]);
    assert_eq!(resources.shader_category("post/blur"), "post");
    assert_eq!(resources.shader_info("plain").description, "Plain colour");
    assert!(resources.shader_info("lonely").is_empty());
}

#[test]
fn test_nested_directory_category_is_innermost() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("lit/pbr")).unwrap();
    fs::write(dir.path().join("lit/pbr/metal.vert"), VERTEX).unwrap();
    fs::write(dir.path().join("lit/pbr/metal.frag"), FRAGMENT).unwrap();

    let mut resources = manager(dir.path());
    assert!(resources.load_all_shaders_from_directory(dir.path()));
    assert_eq!(resources.shader_names(), vec!["pbr/metal"]);
    assert_eq!(resources.shader_category("pbr/metal"), "pbr");
}

#[test]
fn test_single_tessellation_stage_is_incomplete() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("terrain.vert"), VERTEX).unwrap();
    fs::write(dir.path().join("terrain.frag"), FRAGMENT).unwrap();
    fs::write(dir.path().join("terrain.tesc"), "#version 410 core\nvoid main() {}\n").unwrap();

    let mut resources = manager(dir.path());
    assert!(!resources.load_all_shaders_from_directory(dir.path()));

    // The vertex and fragment pair still loads.
    assert!(resources.shader_handle("terrain").is_some());
    let info = resources.shader_info("terrain");
    assert!(!info.has_tessellation());
    assert!(info.tess_control_path.is_none());
}

#[test]
fn test_bundled_shaders_all_load() {
    let mut resources = manager(SHADER_DIR);
    assert!(resources.load_all_shaders_from_directory(SHADER_DIR));
    for name in ["default", "highlight", "gbuffer", "deferred_lighting", "tessellation"] {
        assert!(resources.shader_handle(name).is_some(), "{name} missing");
        assert!(!resources.shader_info(name).description.is_empty());
    }
    assert!(resources.shader_info("tessellation").has_tessellation());
}

#[test]
fn test_model_import_and_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tri.obj");
    fs::write(&path, TRIANGLE_OBJ).unwrap();

    let mut resources = manager(SHADER_DIR);
    let handle = resources.load_model("tri", &path).unwrap();
    let model = resources.model(handle).unwrap();
    assert!(model.is_loaded());
    assert_eq!(model.vertex_count(), 3);
    assert_eq!(model.triangle_count(), 1);
    // Normals were missing from the file and are generated.
    let normal = model.meshes()[0].vertices()[0].normal;
    assert!((normal[2].abs() - 1.0).abs() < 1e-5);

    assert_eq!(resources.load_model("tri", &path).unwrap(), handle);
    assert_eq!(resources.model_count(), 1);
    assert_eq!(resources.model_name(handle), Some("tri"));

    assert!(resources.release_model("tri"));
    assert!(resources.model(handle).is_none());
}

#[test]
fn test_missing_model_is_an_import_error() {
    let mut resources = manager(SHADER_DIR);
    let err = resources
        .load_model("ghost", "/nonexistent/ghost.obj")
        .unwrap_err();
    assert!(matches!(err, Error::Import { .. }));
    assert!(resources.model_handle("ghost").is_none());
}

#[test]
fn test_failed_model_reload_keeps_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tri.obj");
    fs::write(&path, TRIANGLE_OBJ).unwrap();

    let mut resources = manager(SHADER_DIR);
    let handle = resources.load_model("tri", &path).unwrap();
    assert!(resources
        .load_model("tri", dir.path().join("missing.obj"))
        .is_err());

    let model = resources.model(handle).unwrap();
    assert!(model.is_loaded());
    assert_eq!(model.triangle_count(), 1);
    assert_eq!(model.file_path(), path.as_path());
}
