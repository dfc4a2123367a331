//! Named shader and model registry
//!
//! The [`ResourceManager`] owns every [`Shader`] and [`Model`] the editor uses. Callers keep
//! generation-checked handles instead of references, so releasing a resource can never leave a
//! dangling pointer behind: lookups through a stale handle simply return `None`.
//!
//! Loading under a name that already exists reloads in place and keeps the handle. A failed
//! reload leaves the previous program or meshes untouched.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::error::{Error, Result};
use crate::gfx::backend::{GraphicsApi, ShaderStage};

use super::model::Model;
use super::shader::Shader;

new_key_type! {
    pub struct ShaderHandle;
    pub struct ModelHandle;
}

const DESCRIPTION_MARKER: &str = "// Description:";

/// Metadata recorded for shaders discovered on disk.
///
/// Unknown names produce the empty value from [`ResourceManager::shader_info`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInfo {
    pub name: String,
    /// Directory the sources were found in; empty at the top level.
    pub category: String,
    pub description: String,
    pub vertex_path: PathBuf,
    pub fragment_path: PathBuf,
    pub tess_control_path: Option<PathBuf>,
    pub tess_evaluation_path: Option<PathBuf>,
}

impl ShaderInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn has_tessellation(&self) -> bool {
        self.tess_control_path.is_some() && self.tess_evaluation_path.is_some()
    }
}

pub struct ResourceManager {
    gl: Rc<dyn GraphicsApi>,
    shader_dir: PathBuf,
    shaders: SlotMap<ShaderHandle, Shader>,
    shader_names: HashMap<String, ShaderHandle>,
    shader_info: HashMap<String, ShaderInfo>,
    models: SlotMap<ModelHandle, Model>,
    model_names: HashMap<String, ModelHandle>,
}

impl ResourceManager {
    /// An empty registry. `shader_dir` is where [`ensure_shader`](Self::ensure_shader) looks for
    /// sources of shaders that have not been loaded yet.
    pub fn new(gl: Rc<dyn GraphicsApi>, shader_dir: impl Into<PathBuf>) -> Self {
        Self {
            gl,
            shader_dir: shader_dir.into(),
            shaders: SlotMap::with_key(),
            shader_names: HashMap::new(),
            shader_info: HashMap::new(),
            models: SlotMap::with_key(),
            model_names: HashMap::new(),
        }
    }

    pub fn gl(&self) -> &Rc<dyn GraphicsApi> {
        &self.gl
    }

    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }

    // Shaders

    pub fn shader_handle(&self, name: &str) -> Option<ShaderHandle> {
        self.shader_names.get(name).copied()
    }

    pub fn shader(&self, handle: ShaderHandle) -> Option<&Shader> {
        self.shaders.get(handle)
    }

    pub fn shader_mut(&mut self, handle: ShaderHandle) -> Option<&mut Shader> {
        self.shaders.get_mut(handle)
    }

    pub fn shader_by_name(&self, name: &str) -> Option<&Shader> {
        self.shader_handle(name).and_then(|h| self.shaders.get(h))
    }

    pub fn load_shader_from_file(
        &mut self,
        name: &str,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ShaderHandle> {
        self.load_shader_with(name, |shader| {
            shader.load_from_file(vertex_path.as_ref(), fragment_path.as_ref())
        })
    }

    pub fn load_shader_from_source(
        &mut self,
        name: &str,
        vertex: &str,
        fragment: &str,
    ) -> Result<ShaderHandle> {
        self.load_shader_with(name, |shader| shader.load_from_source(vertex, fragment))
    }

    pub fn load_tessellation_shader_from_file(
        &mut self,
        name: &str,
        vertex_path: impl AsRef<Path>,
        tess_control_path: impl AsRef<Path>,
        tess_evaluation_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ShaderHandle> {
        self.load_shader_with(name, |shader| {
            shader.load_with_tessellation_from_file(
                vertex_path.as_ref(),
                tess_control_path.as_ref(),
                tess_evaluation_path.as_ref(),
                fragment_path.as_ref(),
            )
        })
    }

    pub fn load_tessellation_shader_from_source(
        &mut self,
        name: &str,
        vertex: &str,
        tess_control: &str,
        tess_evaluation: &str,
        fragment: &str,
    ) -> Result<ShaderHandle> {
        self.load_shader_with(name, |shader| {
            shader.load_with_tessellation_from_source(
                vertex,
                tess_control,
                tess_evaluation,
                fragment,
            )
        })
    }

    /// Reloads the named shader in place, or builds and registers a new one.
    ///
    /// New shaders are registered only when they link.
    fn load_shader_with(
        &mut self,
        name: &str,
        load: impl FnOnce(&mut Shader) -> Result<()>,
    ) -> Result<ShaderHandle> {
        if let Some(handle) = self.shader_handle(name) {
            if let Some(shader) = self.shaders.get_mut(handle) {
                return match load(shader) {
                    Ok(()) => {
                        log::info!("Reloaded shader '{}'", name);
                        Ok(handle)
                    }
                    Err(err) => {
                        log::error!("Failed to reload shader '{}': {}", name, err);
                        Err(err)
                    }
                };
            }
        }

        let mut shader = Shader::new(self.gl.clone(), name);
        if let Err(err) = load(&mut shader) {
            log::error!("Failed to load shader '{}': {}", name, err);
            return Err(err);
        }

        let handle = self.shaders.insert(shader);
        self.shader_names.insert(name.to_string(), handle);
        log::info!("Loaded shader '{}'", name);
        Ok(handle)
    }

    /// Returns the named shader, loading `<shader_dir>/<name>.vert|.frag` on first use.
    ///
    /// When `.tesc` and `.tese` files sit next to the pair the four-stage program is built.
    pub fn ensure_shader(&mut self, name: &str) -> Result<ShaderHandle> {
        if let Some(handle) = self.shader_handle(name) {
            return Ok(handle);
        }

        let base = self.shader_dir.join(name);
        let info = ShaderInfo {
            name: name.to_string(),
            category: Path::new(name)
                .parent()
                .map(category_of)
                .unwrap_or_default(),
            description: String::new(),
            vertex_path: stage_path(&base, ShaderStage::Vertex),
            fragment_path: stage_path(&base, ShaderStage::Fragment),
            tess_control_path: existing(stage_path(&base, ShaderStage::TessControl)),
            tess_evaluation_path: existing(stage_path(&base, ShaderStage::TessEvaluation)),
        };
        self.load_described(info)
    }

    fn load_described(&mut self, mut info: ShaderInfo) -> Result<ShaderHandle> {
        let handle = match (&info.tess_control_path, &info.tess_evaluation_path) {
            (Some(control), Some(evaluation)) => self.load_tessellation_shader_from_file(
                &info.name,
                &info.vertex_path,
                control.clone(),
                evaluation.clone(),
                &info.fragment_path,
            )?,
            _ => self.load_shader_from_file(&info.name, &info.vertex_path, &info.fragment_path)?,
        };

        if info.description.is_empty() {
            info.description = read_description(&info);
        }
        self.shader_info.insert(info.name.clone(), info);
        Ok(handle)
    }

    /// Loads every `.vert`/`.frag` pair below `dir`.
    ///
    /// Pairs share a basename; the immediate subdirectory becomes the category and the shader is
    /// registered as `category/basename`. Optional `.tesc`/`.tese` files with the same basename
    /// add tessellation stages. Loading is best effort: the result is `false` if any pair is
    /// incomplete or fails to build, but every valid pair is still loaded.
    pub fn load_all_shaders_from_directory(&mut self, dir: impl AsRef<Path>) -> bool {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        if let Err(err) = collect_files(dir, &mut files) {
            log::error!("Cannot scan shader directory {}: {}", dir.display(), err);
            return false;
        }

        // name -> stage paths found for it, in sorted order for stable logs
        let mut groups: BTreeMap<String, (String, HashMap<ShaderStage, PathBuf>)> = BTreeMap::new();
        for path in files {
            let Some(stage) = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(stage_for_extension)
            else {
                continue;
            };
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let category = path
                .parent()
                .filter(|parent| *parent != dir)
                .map(category_of)
                .unwrap_or_default();
            let name = if category.is_empty() {
                stem.to_string()
            } else {
                format!("{category}/{stem}")
            };

            groups
                .entry(name)
                .or_insert_with(|| (category, HashMap::new()))
                .1
                .insert(stage, path);
        }

        let mut all_ok = true;
        for (name, (category, mut stages)) in groups {
            let (Some(vertex_path), Some(fragment_path)) = (
                stages.remove(&ShaderStage::Vertex),
                stages.remove(&ShaderStage::Fragment),
            ) else {
                log::warn!("Shader '{}' is missing its vertex or fragment stage", name);
                all_ok = false;
                continue;
            };

            let tess_control_path = stages.remove(&ShaderStage::TessControl);
            let tess_evaluation_path = stages.remove(&ShaderStage::TessEvaluation);
            let paired = tess_control_path.is_some() && tess_evaluation_path.is_some();
            if !paired && (tess_control_path.is_some() || tess_evaluation_path.is_some()) {
                log::warn!(
                    "Shader '{}' has only one tessellation stage; loading it without tessellation",
                    name
                );
                all_ok = false;
            }

            let info = ShaderInfo {
                name: name.clone(),
                category,
                description: String::new(),
                vertex_path,
                fragment_path,
                tess_control_path: tess_control_path.filter(|_| paired),
                tess_evaluation_path: tess_evaluation_path.filter(|_| paired),
            };
            if self.load_described(info).is_err() {
                all_ok = false;
            }
        }

        log::info!(
            "Shader directory {} scanned: {} shaders registered",
            dir.display(),
            self.shaders.len()
        );
        all_ok
    }

    /// Removes the shader. Handles to it stop resolving.
    pub fn release_shader(&mut self, name: &str) -> bool {
        self.shader_info.remove(name);
        match self.shader_names.remove(name) {
            Some(handle) => self.shaders.remove(handle).is_some(),
            None => false,
        }
    }

    pub fn release_all_shaders(&mut self) {
        self.shader_names.clear();
        self.shader_info.clear();
        self.shaders.clear();
    }

    /// Registered shader names, sorted.
    pub fn shader_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shader_names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Category of a discovered shader; empty for top-level or unknown names.
    pub fn shader_category(&self, name: &str) -> &str {
        self.shader_info
            .get(name)
            .map(|info| info.category.as_str())
            .unwrap_or("")
    }

    pub fn shader_info(&self, name: &str) -> ShaderInfo {
        self.shader_info.get(name).cloned().unwrap_or_default()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    // Models

    pub fn model_handle(&self, name: &str) -> Option<ModelHandle> {
        self.model_names.get(name).copied()
    }

    pub fn model(&self, handle: ModelHandle) -> Option<&Model> {
        self.models.get(handle)
    }

    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.model_handle(name).and_then(|h| self.models.get(h))
    }

    /// Reloads the named model in place, or imports and registers a new one.
    pub fn load_model(&mut self, name: &str, path: impl AsRef<Path>) -> Result<ModelHandle> {
        let path = path.as_ref();
        if let Some(handle) = self.model_handle(name) {
            if let Some(model) = self.models.get_mut(handle) {
                model.load_from_file(path).map_err(|err| {
                    log::error!(
                        "Failed to reload model '{}' from file {}: {}",
                        name,
                        path.display(),
                        err
                    );
                    err
                })?;
                return Ok(handle);
            }
        }

        let mut model = Model::new(self.gl.clone());
        if let Err(err) = model.load_from_file(path) {
            log::error!(
                "Failed to load model '{}' from file {}: {}",
                name,
                path.display(),
                err
            );
            return Err(err);
        }

        let handle = self.models.insert(model);
        self.model_names.insert(name.to_string(), handle);
        Ok(handle)
    }

    pub fn release_model(&mut self, name: &str) -> bool {
        match self.model_names.remove(name) {
            Some(handle) => self.models.remove(handle).is_some(),
            None => false,
        }
    }

    pub fn release_all_models(&mut self) {
        self.model_names.clear();
        self.models.clear();
    }

    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.model_names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name a model was registered under.
    pub fn model_name(&self, handle: ModelHandle) -> Option<&str> {
        self.model_names
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(name, _)| name.as_str())
    }

    /// Name a shader was registered under.
    pub fn shader_name(&self, handle: ShaderHandle) -> Option<&str> {
        self.shaders.get(handle).map(Shader::name)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Looks up a shader that must exist.
    pub fn require_shader(&self, name: &str) -> Result<ShaderHandle> {
        self.shader_handle(name)
            .ok_or_else(|| Error::NotFound(format!("shader '{name}'")))
    }
}

fn stage_for_extension(ext: &str) -> Option<ShaderStage> {
    [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Fragment,
    ]
    .into_iter()
    .find(|stage| stage.extension() == ext)
}

fn stage_path(base: &Path, stage: ShaderStage) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(stage.extension());
    PathBuf::from(path)
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Name of the directory holding a shader's sources.
fn category_of(parent: &Path) -> String {
    parent
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// First `// Description:` line of the vertex source, else of the fragment source.
fn read_description(info: &ShaderInfo) -> String {
    [&info.vertex_path, &info.fragment_path]
        .into_iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .find_map(|source| {
            source.lines().find_map(|line| {
                line.trim()
                    .strip_prefix(DESCRIPTION_MARKER)
                    .map(|text| text.trim().to_string())
            })
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::HeadlessBackend;

    const VERT: &str = "#version 330 core\n// Description: Flat test shader\nvoid main() {}";
    const FRAG: &str = "#version 330 core\nvoid main() {}";

    fn manager() -> ResourceManager {
        ResourceManager::new(Rc::new(HeadlessBackend::new()), "resources/shaders")
    }

    #[test]
    fn test_reload_keeps_handle() {
        let mut resources = manager();
        let first = resources.load_shader_from_source("s", VERT, FRAG).unwrap();
        let second = resources.load_shader_from_source("s", VERT, FRAG).unwrap();
        assert_eq!(first, second);
        assert_eq!(resources.shader_count(), 1);
    }

    #[test]
    fn test_failed_new_shader_is_not_registered() {
        let mut resources = manager();
        assert!(resources.load_shader_from_source("bad", "x", FRAG).is_err());
        assert!(resources.shader_handle("bad").is_none());
        assert_eq!(resources.shader_count(), 0);
    }

    #[test]
    fn test_release_invalidates_handle() {
        let mut resources = manager();
        let handle = resources.load_shader_from_source("s", VERT, FRAG).unwrap();
        assert!(resources.release_shader("s"));
        assert!(resources.shader(handle).is_none());
        assert!(!resources.release_shader("s"));

        // A new shader under the same name never revives the stale handle.
        let fresh = resources.load_shader_from_source("s", VERT, FRAG).unwrap();
        assert_ne!(handle, fresh);
        assert!(resources.shader(handle).is_none());
    }

    #[test]
    fn test_unknown_info_is_empty() {
        let resources = manager();
        assert!(resources.shader_info("nope").is_empty());
        assert_eq!(resources.shader_category("nope"), "");
    }

    #[test]
    fn test_stage_extensions() {
        assert_eq!(stage_for_extension("tese"), Some(ShaderStage::TessEvaluation));
        assert_eq!(stage_for_extension("glsl"), None);
        assert_eq!(
            stage_path(Path::new("dir/effects/glow"), ShaderStage::Fragment),
            PathBuf::from("dir/effects/glow.frag")
        );
    }

    #[test]
    fn test_category_is_innermost_directory() {
        let nested: PathBuf = ["shaders", "effects", "post"].iter().collect();
        assert_eq!(category_of(&nested), "post");
        assert_eq!(category_of(Path::new("")), "");
    }
}
