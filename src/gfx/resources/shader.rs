//! GPU shader programs
//!
//! A [`Shader`] owns one linked program built from vertex and fragment sources, optionally with
//! tessellation control and evaluation stages in between. Reloading compiles the new sources
//! first and only swaps programs when linking succeeds, so a typo in the editor never leaves an
//! object without a working program.
//!
//! Uniform locations are cached per name, including misses. The cache is dropped whenever the
//! program is replaced.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::error::{Error, Result};
use crate::gfx::backend::{GraphicsApi, ProgramId, ShaderStage, UniformLocation, UniformValue};

/// Uniforms many shader variants legitimately omit; missing them is not worth a warning.
const OPTIONAL_UNIFORMS: &[&str] = &[
    "lightPos",
    "lightColor",
    "lightIntensity",
    "lights",
    "numLights",
    "lightingModel",
    "time",
];

/// Source text of every stage in a program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderSources {
    pub vertex: String,
    pub tess_control: Option<String>,
    pub tess_evaluation: Option<String>,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            ..Default::default()
        }
    }

    pub fn with_tessellation(
        vertex: impl Into<String>,
        tess_control: impl Into<String>,
        tess_evaluation: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            vertex: vertex.into(),
            tess_control: Some(tess_control.into()),
            tess_evaluation: Some(tess_evaluation.into()),
            fragment: fragment.into(),
        }
    }

    pub fn has_tessellation(&self) -> bool {
        self.tess_control.is_some() && self.tess_evaluation.is_some()
    }

    /// Stages in pipeline order.
    fn stages(&self) -> Vec<(ShaderStage, &str)> {
        let mut stages = vec![(ShaderStage::Vertex, self.vertex.as_str())];
        if let (Some(control), Some(evaluation)) = (&self.tess_control, &self.tess_evaluation) {
            stages.push((ShaderStage::TessControl, control.as_str()));
            stages.push((ShaderStage::TessEvaluation, evaluation.as_str()));
        }
        stages.push((ShaderStage::Fragment, self.fragment.as_str()));
        stages
    }
}

pub struct Shader {
    gl: Rc<dyn GraphicsApi>,
    name: String,
    program: Option<ProgramId>,
    uniform_cache: RefCell<HashMap<String, Option<UniformLocation>>>,
    compilation_log: String,
    sources: Option<ShaderSources>,
}

impl Shader {
    /// An unnamed, unusable shader. Load sources before binding it.
    pub fn new(gl: Rc<dyn GraphicsApi>, name: impl Into<String>) -> Self {
        Self {
            gl,
            name: name.into(),
            program: None,
            uniform_cache: RefCell::new(HashMap::new()),
            compilation_log: String::new(),
            sources: None,
        }
    }

    pub fn load_from_file(
        &mut self,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<()> {
        let vertex = self.read_source(vertex_path.as_ref())?;
        let fragment = self.read_source(fragment_path.as_ref())?;
        self.load_from_source(&vertex, &fragment)
    }

    pub fn load_from_source(&mut self, vertex: &str, fragment: &str) -> Result<()> {
        self.build(ShaderSources::new(vertex, fragment))
    }

    pub fn load_with_tessellation_from_file(
        &mut self,
        vertex_path: impl AsRef<Path>,
        tess_control_path: impl AsRef<Path>,
        tess_evaluation_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<()> {
        let vertex = self.read_source(vertex_path.as_ref())?;
        let control = self.read_source(tess_control_path.as_ref())?;
        let evaluation = self.read_source(tess_evaluation_path.as_ref())?;
        let fragment = self.read_source(fragment_path.as_ref())?;
        self.load_with_tessellation_from_source(&vertex, &control, &evaluation, &fragment)
    }

    pub fn load_with_tessellation_from_source(
        &mut self,
        vertex: &str,
        tess_control: &str,
        tess_evaluation: &str,
        fragment: &str,
    ) -> Result<()> {
        self.build(ShaderSources::with_tessellation(
            vertex,
            tess_control,
            tess_evaluation,
            fragment,
        ))
    }

    /// Compiles and links `sources`, replacing the current program only on success.
    ///
    /// The compilation log is reset on every attempt and holds the driver's text on failure.
    pub fn build(&mut self, sources: ShaderSources) -> Result<()> {
        self.compilation_log.clear();

        match link_sources(self.gl.as_ref(), &sources) {
            Ok(program) => {
                if let Some(previous) = self.program.replace(program) {
                    self.gl.delete_program(previous);
                }
                self.uniform_cache.borrow_mut().clear();
                self.sources = Some(sources);
                log::debug!("Shader '{}' linked as program {}", self.name, program.get());
                Ok(())
            }
            Err(err) => {
                self.compilation_log = err.to_string();
                log::error!("Shader '{}': {}", self.name, self.compilation_log);
                Err(err)
            }
        }
    }

    fn read_source(&mut self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| {
            self.compilation_log = format!(
                "ERROR::SHADER::FILE_NOT_SUCCESSFULLY_READ: {}: {}",
                path.display(),
                source
            );
            log::error!("{}", self.compilation_log);
            Error::FileRead {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Binds the program. Does nothing while no program has linked.
    pub fn use_program(&self) {
        if let Some(program) = self.program {
            self.gl.use_program(Some(program));
        }
    }

    /// Deletes the program and forgets cached locations.
    pub fn delete(&mut self) {
        if let Some(program) = self.program.take() {
            self.gl.delete_program(program);
        }
        self.uniform_cache.borrow_mut().clear();
    }

    /// Cached lookup; misses are cached too.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        let program = self.program?;
        if let Some(location) = self.uniform_cache.borrow().get(name) {
            return *location;
        }

        let location = self.gl.uniform_location(program, name);
        if location.is_none() && !is_optional_uniform(name) {
            log::warn!("Uniform '{}' not found in shader {}", name, self.name);
        }
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_string(), location);
        location
    }

    /// Uploads `value` if the uniform exists; unknown names are skipped silently.
    pub fn set_uniform(&self, name: &str, value: UniformValue) {
        if let Some(location) = self.uniform_location(name) {
            self.gl.set_uniform(location, value);
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    pub fn set_vec2(&self, name: &str, value: Vector2<f32>) {
        self.set_uniform(name, UniformValue::Vec2(value.into()));
    }

    pub fn set_vec3(&self, name: &str, value: Vector3<f32>) {
        self.set_uniform(name, UniformValue::Vec3(value.into()));
    }

    pub fn set_vec4(&self, name: &str, value: Vector4<f32>) {
        self.set_uniform(name, UniformValue::Vec4(value.into()));
    }

    pub fn set_mat2(&self, name: &str, value: &Matrix2<f32>) {
        let data: &[f32; 4] = value.as_ref();
        self.set_uniform(name, UniformValue::Mat2(*data));
    }

    pub fn set_mat3(&self, name: &str, value: &Matrix3<f32>) {
        let data: &[f32; 9] = value.as_ref();
        self.set_uniform(name, UniformValue::Mat3(*data));
    }

    pub fn set_mat4(&self, name: &str, value: &Matrix4<f32>) {
        let data: &[f32; 16] = value.as_ref();
        self.set_uniform(name, UniformValue::Mat4(*data));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_some()
    }

    pub fn compilation_log(&self) -> &str {
        &self.compilation_log
    }

    /// Sources of the currently linked program.
    pub fn sources(&self) -> Option<&ShaderSources> {
        self.sources.as_ref()
    }

    pub fn has_tessellation(&self) -> bool {
        self.sources
            .as_ref()
            .is_some_and(ShaderSources::has_tessellation)
    }

    /// Number of names in the uniform location cache.
    pub fn cached_uniform_count(&self) -> usize {
        self.uniform_cache.borrow().len()
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.delete();
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("program", &self.program)
            .field("tessellation", &self.has_tessellation())
            .finish()
    }
}

fn is_optional_uniform(name: &str) -> bool {
    let base = name.split(['[', '.']).next().unwrap_or(name);
    OPTIONAL_UNIFORMS.contains(&base)
}

/// Compiles every stage, failing fast; stage objects never outlive this call.
fn link_sources(gl: &dyn GraphicsApi, sources: &ShaderSources) -> Result<ProgramId> {
    let mut compiled = Vec::with_capacity(4);
    for (stage, source) in sources.stages() {
        match gl.compile_stage(stage, source) {
            Ok(id) => compiled.push(id),
            Err(log) => {
                for id in compiled {
                    gl.delete_stage(id);
                }
                return Err(Error::ShaderCompile { stage, log });
            }
        }
    }

    let linked = gl.link_program(&compiled);
    for id in compiled {
        gl.delete_stage(id);
    }
    linked.map_err(|log| Error::ShaderLink { log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{ApiVersion, HeadlessBackend};

    const VERT: &str = "#version 330 core\nuniform mat4 model;\nuniform mat4 view;\nvoid main() {}";
    const FRAG: &str = "#version 330 core\nuniform vec3 viewPos;\nvoid main() {}";
    const TESC: &str = "#version 400 core\nuniform float tessLevelOuter;\nvoid main() {}";
    const TESE: &str = "#version 400 core\nuniform float displacementAmount;\nvoid main() {}";

    #[test]
    fn test_load_from_source() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut shader = Shader::new(gl.clone(), "basic");
        shader.load_from_source(VERT, FRAG).unwrap();
        assert!(shader.is_valid());
        assert!(shader.compilation_log().is_empty());
        // Stage objects are released after linking.
        assert_eq!(gl.live_objects().stages, 0);
        assert_eq!(gl.live_objects().programs, 1);
    }

    #[test]
    fn test_failed_compile_reports_stage_and_log() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut shader = Shader::new(gl.clone(), "broken");
        let err = shader.load_from_source(VERT, "int x;").unwrap_err();
        assert!(matches!(
            err,
            Error::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert!(!shader.is_valid());
        assert!(shader.compilation_log().contains("COMPILATION_FAILED"));
        assert_eq!(gl.live_objects().stages, 0);
    }

    #[test]
    fn test_failed_reload_keeps_previous_program() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut shader = Shader::new(gl.clone(), "hot");
        shader.load_from_source(VERT, FRAG).unwrap();
        let program = shader.program();

        assert!(shader.load_from_source("oops", FRAG).is_err());
        assert_eq!(shader.program(), program);
        assert!(!shader.compilation_log().is_empty());

        // A later successful load clears the log again.
        shader.load_from_source(VERT, FRAG).unwrap();
        assert!(shader.compilation_log().is_empty());
        assert_ne!(shader.program(), program);
        assert_eq!(gl.live_objects().programs, 1);
    }

    #[test]
    fn test_uniform_cache_includes_misses_and_resets_on_reload() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut shader = Shader::new(gl.clone(), "cache");
        shader.load_from_source(VERT, FRAG).unwrap();

        assert!(shader.uniform_location("model").is_some());
        assert!(shader.uniform_location("lightPos").is_none());
        assert_eq!(shader.cached_uniform_count(), 2);

        shader.set_mat4("model", &Matrix4::from_scale(2.0));
        shader.set_float("doesNotExist", 1.0);
        assert!(gl.last_uniform("model").is_some());
        assert!(gl.last_uniform("doesNotExist").is_none());

        shader.load_from_source(VERT, FRAG).unwrap();
        assert_eq!(shader.cached_uniform_count(), 0);
    }

    #[test]
    fn test_missing_file_sets_log() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut shader = Shader::new(gl, "missing");
        let err = shader
            .load_from_file("/nonexistent/a.vert", "/nonexistent/a.frag")
            .unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(shader
            .compilation_log()
            .starts_with("ERROR::SHADER::FILE_NOT_SUCCESSFULLY_READ"));
    }

    #[test]
    fn test_tessellation_program() {
        let gl = Rc::new(HeadlessBackend::with_version(ApiVersion::new(4, 1)));
        let mut shader = Shader::new(gl.clone(), "tess");
        shader
            .load_with_tessellation_from_source(VERT, TESC, TESE, FRAG)
            .unwrap();
        assert!(shader.has_tessellation());
        assert!(shader.uniform_location("displacementAmount").is_some());
    }

    #[test]
    fn test_tessellation_failure_releases_every_stage() {
        let gl = Rc::new(HeadlessBackend::with_version(ApiVersion::new(3, 3)));
        let mut shader = Shader::new(gl.clone(), "tess");
        let err = shader
            .load_with_tessellation_from_source(VERT, TESC, TESE, FRAG)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ShaderCompile {
                stage: ShaderStage::TessControl,
                ..
            }
        ));
        assert_eq!(gl.live_objects().stages, 0);
    }

    #[test]
    fn test_use_without_program_is_noop() {
        let gl = Rc::new(HeadlessBackend::new());
        let shader = Shader::new(gl.clone(), "empty");
        shader.use_program();
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_optional_uniform_names() {
        assert!(is_optional_uniform("lights[3].intensity"));
        assert!(is_optional_uniform("lightPos"));
        assert!(!is_optional_uniform("model"));
    }
}
