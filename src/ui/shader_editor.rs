//! Live shader editing
//!
//! The editor works on a copy of a shader's vertex and fragment sources. Compiling sends the
//! copy through [`ResourceManager::load_shader_from_source`], which keeps the running program if
//! the new sources fail, and shows the driver's log unchanged.

use std::fs;

use crate::error::{Error, Result};
use crate::gfx::resources::ResourceManager;

/// Outcome of the last compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStatus {
    Success,
    /// Driver log or I/O error text.
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct ShaderEditor {
    shader_name: String,
    pub vertex_source: String,
    pub fragment_source: String,
    status: Option<CompileStatus>,
}

impl ShaderEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    pub fn status(&self) -> Option<&CompileStatus> {
        self.status.as_ref()
    }

    /// Copies the running sources of `name` into the editor.
    pub fn open(&mut self, name: &str, resources: &ResourceManager) -> Result<()> {
        let shader = resources
            .shader_by_name(name)
            .ok_or_else(|| Error::NotFound(format!("shader '{name}'")))?;
        let sources = shader
            .sources()
            .ok_or_else(|| Error::NotFound(format!("sources of shader '{name}'")))?;

        self.shader_name = name.to_string();
        self.vertex_source = sources.vertex.clone();
        self.fragment_source = sources.fragment.clone();
        self.status = None;
        Ok(())
    }

    /// Rebuilds the open shader from the edited sources.
    ///
    /// Tessellation stages, if the shader has them, are reused unchanged.
    pub fn compile(&mut self, resources: &mut ResourceManager) -> bool {
        if self.shader_name.is_empty() {
            return false;
        }

        let tessellation = resources
            .shader_by_name(&self.shader_name)
            .and_then(|shader| shader.sources())
            .and_then(|sources| {
                Some((sources.tess_control.clone()?, sources.tess_evaluation.clone()?))
            });

        let result = match tessellation {
            Some((control, evaluation)) => resources.load_tessellation_shader_from_source(
                &self.shader_name,
                &self.vertex_source,
                &control,
                &evaluation,
                &self.fragment_source,
            ),
            None => resources.load_shader_from_source(
                &self.shader_name,
                &self.vertex_source,
                &self.fragment_source,
            ),
        };

        let compiled = result.is_ok();
        self.status = Some(match result {
            Ok(_) => CompileStatus::Success,
            Err(err) => CompileStatus::Failed(err.to_string()),
        });
        compiled
    }

    /// Replaces the edited text with the sources on disk. The running program is not touched.
    pub fn reset(&mut self, resources: &ResourceManager) -> Result<()> {
        let info = resources.shader_info(&self.shader_name);
        if info.is_empty() {
            return Err(Error::NotFound(format!(
                "on-disk sources of shader '{}'",
                self.shader_name
            )));
        }

        let read = |path: &std::path::Path| {
            fs::read_to_string(path).map_err(|source| Error::FileRead {
                path: path.to_path_buf(),
                source,
            })
        };
        self.vertex_source = read(info.vertex_path.as_path())?;
        self.fragment_source = read(info.fragment_path.as_path())?;
        self.status = None;
        Ok(())
    }

    pub fn render_ui(&mut self, ui: &imgui::Ui, open: &mut bool, resources: &mut ResourceManager) {
        ui.window("Shader Editor")
            .opened(open)
            .size([640.0, 560.0], imgui::Condition::FirstUseEver)
            .build(|| {
                let names = resources.shader_names();
                let current = names.iter().position(|n| *n == self.shader_name);
                let mut index = current.unwrap_or(0);
                if ui.combo_simple_string("Shader", &mut index, names.as_slice())
                    || (current.is_none() && !names.is_empty())
                {
                    if let Some(name) = names.get(index) {
                        if let Err(err) = self.open(name, resources) {
                            self.status = Some(CompileStatus::Failed(err.to_string()));
                        }
                    }
                }
                if self.shader_name.is_empty() {
                    ui.text_disabled("No shader selected");
                    return;
                }

                let info = resources.shader_info(&self.shader_name);
                if !info.description.is_empty() {
                    ui.text_wrapped(&info.description);
                }

                let width = ui.content_region_avail()[0];
                ui.text("Vertex");
                ui.input_text_multiline("##vertex", &mut self.vertex_source, [width, 180.0])
                    .build();
                ui.text("Fragment");
                ui.input_text_multiline("##fragment", &mut self.fragment_source, [width, 180.0])
                    .build();

                if ui.button("Compile") {
                    self.compile(resources);
                }
                ui.same_line();
                if ui.button("Reset") {
                    if let Err(err) = self.reset(resources) {
                        self.status = Some(CompileStatus::Failed(err.to_string()));
                    }
                }

                match &self.status {
                    Some(CompileStatus::Success) => {
                        ui.text_colored([0.2, 0.9, 0.2, 1.0], "Compiled successfully")
                    }
                    Some(CompileStatus::Failed(log)) => {
                        ui.text_colored([1.0, 0.3, 0.3, 1.0], "Compilation failed");
                        ui.text_wrapped(log);
                    }
                    None => {}
                }
            });
    }
}
