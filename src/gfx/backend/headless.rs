//! A GPU-less [`GraphicsApi`] that records every call.
//!
//! The headless backend keeps just enough state to behave like a strict driver from the caller's
//! point of view:
//!
//! - stages without an entry point fail to compile, with a driver-style log
//! - tessellation stages fail to compile when the reported version is below 4.0
//! - uniform locations resolve only for names that occur in the linked sources
//! - framebuffers with zero-sized attachments report `IncompleteAttachment`
//! - fixed-function toggles, the polygon mode and bindings are tracked
//!
//! It is used by the integration tests and by tooling that wants to exercise a scene without a
//! window.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use super::{
    ApiVersion, BufferId, Capability, FramebufferId, FramebufferStatus, GraphicsApi, MeshBuffers,
    PolygonMode, Primitive, ProgramId, RenderbufferId, ShaderStage, StageId, TextureFormat,
    TextureId, UniformLocation, UniformValue, VertexArrayId, VertexLayout,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CompileStage {
        stage: ShaderStage,
        success: bool,
    },
    DeleteStage(StageId),
    LinkProgram {
        program: Option<ProgramId>,
        stage_count: usize,
    },
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
    CreateVertexBuffers {
        vertex_array: VertexArrayId,
        vertex_bytes: usize,
        index_count: Option<usize>,
    },
    DeleteVertexBuffers(VertexArrayId),
    Draw {
        vertex_array: VertexArrayId,
        primitive: Primitive,
        count: usize,
        indexed: bool,
        program: Option<ProgramId>,
        framebuffer: Option<FramebufferId>,
    },
    SetPatchVertices(i32),
    Clear {
        color: [f32; 4],
        framebuffer: Option<FramebufferId>,
    },
    SetCapability(Capability, bool),
    SetAlphaBlending,
    SetPolygonMode(PolygonMode),
    Viewport(i32, i32, i32, i32),
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    DeleteTexture(TextureId),
    CreateRenderbuffer(RenderbufferId),
    DeleteRenderbuffer(RenderbufferId),
    CreateFramebuffer {
        framebuffer: FramebufferId,
        color_attachments: usize,
    },
    DeleteFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    BindTextureUnit {
        unit: u32,
        texture: Option<TextureId>,
    },
}

/// Counts of GPU objects that have been created and not yet deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveObjects {
    pub stages: usize,
    pub programs: usize,
    pub vertex_arrays: usize,
    pub buffers: usize,
    pub textures: usize,
    pub renderbuffers: usize,
    pub framebuffers: usize,
}

impl LiveObjects {
    pub fn total(&self) -> usize {
        self.stages
            + self.programs
            + self.vertex_arrays
            + self.buffers
            + self.textures
            + self.renderbuffers
            + self.framebuffers
    }
}

struct ProgramRecord {
    source: String,
    locations: HashMap<String, UniformLocation>,
}

struct State {
    version: ApiVersion,
    next_id: u32,
    calls: Vec<GlCall>,
    stages: HashMap<StageId, String>,
    programs: HashMap<ProgramId, ProgramRecord>,
    location_names: HashMap<UniformLocation, (ProgramId, String)>,
    current_program: Option<ProgramId>,
    bound_framebuffer: Option<FramebufferId>,
    capabilities: HashSet<Capability>,
    polygon_mode: PolygonMode,
    patch_vertices: i32,
    vertex_arrays: HashSet<VertexArrayId>,
    buffers: HashSet<BufferId>,
    textures: HashMap<TextureId, (u32, u32)>,
    renderbuffers: HashMap<RenderbufferId, (u32, u32)>,
    framebuffers: HashMap<FramebufferId, FramebufferStatus>,
}

impl State {
    fn next(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        // next_id starts at 0 and only grows
        NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN)
    }
}

/// Recording backend with no GPU behind it.
pub struct HeadlessBackend {
    state: RefCell<State>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// A 4.1 core context, the most common desktop target.
    pub fn new() -> Self {
        Self::with_version(ApiVersion::new(4, 1))
    }

    pub fn with_version(version: ApiVersion) -> Self {
        let mut capabilities = HashSet::new();
        capabilities.insert(Capability::Multisample);
        Self {
            state: RefCell::new(State {
                version,
                next_id: 0,
                calls: Vec::new(),
                stages: HashMap::new(),
                programs: HashMap::new(),
                location_names: HashMap::new(),
                current_program: None,
                bound_framebuffer: None,
                capabilities,
                polygon_mode: PolygonMode::Fill,
                patch_vertices: 3,
                vertex_arrays: HashSet::new(),
                buffers: HashSet::new(),
                textures: HashMap::new(),
                renderbuffers: HashMap::new(),
                framebuffers: HashMap::new(),
            }),
        }
    }

    pub fn set_version(&self, version: ApiVersion) {
        self.state.borrow_mut().version = version;
    }

    /// Every call recorded so far, oldest first.
    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Only the draw calls, oldest first.
    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, GlCall::Draw { .. }))
            .cloned()
            .collect()
    }

    /// The last value uploaded to the uniform called `name` in any program.
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.state.borrow().calls.iter().rev().find_map(|call| match call {
            GlCall::SetUniform { name: n, value, .. } if n == name => Some(*value),
            _ => None,
        })
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.state.borrow().polygon_mode
    }

    pub fn patch_vertices(&self) -> i32 {
        self.state.borrow().patch_vertices
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.borrow().bound_framebuffer
    }

    pub fn live_objects(&self) -> LiveObjects {
        let state = self.state.borrow();
        LiveObjects {
            stages: state.stages.len(),
            programs: state.programs.len(),
            vertex_arrays: state.vertex_arrays.len(),
            buffers: state.buffers.len(),
            textures: state.textures.len(),
            renderbuffers: state.renderbuffers.len(),
            framebuffers: state.framebuffers.len(),
        }
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

/// Uniform names resolve against the identifier before any `[` or `.` suffix.
fn uniform_base_name(name: &str) -> &str {
    let end = name.find(['[', '.']).unwrap_or(name.len());
    &name[..end]
}

impl GraphicsApi for HeadlessBackend {
    fn api_version(&self) -> ApiVersion {
        self.state.borrow().version
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<StageId, String> {
        let version = self.api_version();
        let result = if stage.is_tessellation() && !version.supports_tessellation() {
            Err(format!(
                "0:1(1): error: {} shaders require GLSL 4.00 (context is {})",
                stage, version
            ))
        } else if !source.contains("void main") {
            Err("0:1(1): error: no function with name 'main'".to_string())
        } else {
            Ok(())
        };

        self.record(GlCall::CompileStage {
            stage,
            success: result.is_ok(),
        });

        result.map(|()| {
            let mut state = self.state.borrow_mut();
            let id = StageId(state.next());
            state.stages.insert(id, source.to_string());
            id
        })
    }

    fn delete_stage(&self, stage: StageId) {
        self.state.borrow_mut().stages.remove(&stage);
        self.record(GlCall::DeleteStage(stage));
    }

    fn link_program(&self, stages: &[StageId]) -> Result<ProgramId, String> {
        let mut state = self.state.borrow_mut();
        let mut source = String::new();
        for stage in stages {
            match state.stages.get(stage) {
                Some(text) => {
                    source.push_str(text);
                    source.push('\n');
                }
                None => {
                    state.calls.push(GlCall::LinkProgram {
                        program: None,
                        stage_count: stages.len(),
                    });
                    return Err(format!("error: stage {} is not a shader object", stage.get()));
                }
            }
        }
        if stages.is_empty() {
            state.calls.push(GlCall::LinkProgram {
                program: None,
                stage_count: 0,
            });
            return Err("error: no shaders attached to program".to_string());
        }

        let id = ProgramId(state.next());
        state.programs.insert(
            id,
            ProgramRecord {
                source,
                locations: HashMap::new(),
            },
        );
        state.calls.push(GlCall::LinkProgram {
            program: Some(id),
            stage_count: stages.len(),
        });
        Ok(id)
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        if let Some(record) = state.programs.remove(&program) {
            for location in record.locations.values() {
                state.location_names.remove(location);
            }
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.calls.push(GlCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut state = self.state.borrow_mut();
        state.current_program = program;
        state.calls.push(GlCall::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        let present = state
            .programs
            .get(&program)
            .is_some_and(|record| record.source.contains(uniform_base_name(name)));
        if !present {
            return None;
        }

        if let Some(location) = state
            .programs
            .get(&program)
            .and_then(|record| record.locations.get(name))
        {
            return Some(*location);
        }

        let location = UniformLocation(state.next().get());
        state
            .location_names
            .insert(location, (program, name.to_string()));
        if let Some(record) = state.programs.get_mut(&program) {
            record.locations.insert(name.to_string(), location);
        }
        Some(location)
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        if let Some((program, name)) = state.location_names.get(&location).cloned() {
            state.calls.push(GlCall::SetUniform {
                program,
                name,
                value,
            });
        }
    }

    fn create_vertex_buffers(
        &self,
        vertex_bytes: &[u8],
        indices: Option<&[u32]>,
        _layout: VertexLayout,
    ) -> Result<MeshBuffers, String> {
        let mut state = self.state.borrow_mut();
        let vertex_array = VertexArrayId(state.next());
        let vertex_buffer = BufferId(state.next());
        let index_buffer = indices.map(|_| BufferId(state.next()));

        state.vertex_arrays.insert(vertex_array);
        state.buffers.insert(vertex_buffer);
        if let Some(ebo) = index_buffer {
            state.buffers.insert(ebo);
        }
        state.calls.push(GlCall::CreateVertexBuffers {
            vertex_array,
            vertex_bytes: vertex_bytes.len(),
            index_count: indices.map(<[u32]>::len),
        });

        Ok(MeshBuffers {
            vertex_array,
            vertex_buffer,
            index_buffer,
        })
    }

    fn delete_vertex_buffers(&self, buffers: MeshBuffers) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&buffers.vertex_array);
        state.buffers.remove(&buffers.vertex_buffer);
        if let Some(ebo) = buffers.index_buffer {
            state.buffers.remove(&ebo);
        }
        state
            .calls
            .push(GlCall::DeleteVertexBuffers(buffers.vertex_array));
    }

    fn draw(&self, vertex_array: VertexArrayId, primitive: Primitive, count: usize, indexed: bool) {
        let mut state = self.state.borrow_mut();
        let call = GlCall::Draw {
            vertex_array,
            primitive,
            count,
            indexed,
            program: state.current_program,
            framebuffer: state.bound_framebuffer,
        };
        state.calls.push(call);
    }

    fn set_patch_vertices(&self, count: i32) {
        let mut state = self.state.borrow_mut();
        state.patch_vertices = count;
        state.calls.push(GlCall::SetPatchVertices(count));
    }

    fn clear(&self, color: [f32; 4]) {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound_framebuffer;
        state.calls.push(GlCall::Clear { color, framebuffer });
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        let mut state = self.state.borrow_mut();
        if enabled {
            state.capabilities.insert(capability);
        } else {
            state.capabilities.remove(&capability);
        }
        state
            .calls
            .push(GlCall::SetCapability(capability, enabled));
    }

    fn set_alpha_blending(&self) {
        self.record(GlCall::SetAlphaBlending);
    }

    fn set_polygon_mode(&self, mode: PolygonMode) {
        let mut state = self.state.borrow_mut();
        state.polygon_mode = mode;
        state.calls.push(GlCall::SetPolygonMode(mode));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport(x, y, width, height));
    }

    fn create_texture_2d(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, String> {
        let mut state = self.state.borrow_mut();
        let texture = TextureId(state.next());
        state.textures.insert(texture, (width, height));
        state.calls.push(GlCall::CreateTexture {
            texture,
            width,
            height,
            format,
        });
        Ok(texture)
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        state.calls.push(GlCall::DeleteTexture(texture));
    }

    fn create_depth_renderbuffer(
        &self,
        width: u32,
        height: u32,
    ) -> Result<RenderbufferId, String> {
        let mut state = self.state.borrow_mut();
        let renderbuffer = RenderbufferId(state.next());
        state.renderbuffers.insert(renderbuffer, (width, height));
        state.calls.push(GlCall::CreateRenderbuffer(renderbuffer));
        Ok(renderbuffer)
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
        let mut state = self.state.borrow_mut();
        state.renderbuffers.remove(&renderbuffer);
        state.calls.push(GlCall::DeleteRenderbuffer(renderbuffer));
    }

    fn create_framebuffer(
        &self,
        color_attachments: &[TextureId],
        depth_attachment: Option<RenderbufferId>,
    ) -> Result<FramebufferId, String> {
        let mut state = self.state.borrow_mut();

        let mut sizes: Vec<(u32, u32)> = Vec::new();
        let mut missing = false;
        for texture in color_attachments {
            match state.textures.get(texture) {
                Some(size) => sizes.push(*size),
                None => missing = true,
            }
        }
        if let Some(depth) = depth_attachment {
            match state.renderbuffers.get(&depth) {
                Some(size) => sizes.push(*size),
                None => missing = true,
            }
        }

        let status = if sizes.is_empty() {
            FramebufferStatus::MissingAttachment
        } else if missing || sizes.iter().any(|&(w, h)| w == 0 || h == 0) {
            FramebufferStatus::IncompleteAttachment
        } else {
            FramebufferStatus::Complete
        };

        let framebuffer = FramebufferId(state.next());
        state.framebuffers.insert(framebuffer, status);
        state.calls.push(GlCall::CreateFramebuffer {
            framebuffer,
            color_attachments: color_attachments.len(),
        });
        Ok(framebuffer)
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer)
            .copied()
            .unwrap_or(FramebufferStatus::Undefined)
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        let mut state = self.state.borrow_mut();
        state.framebuffers.remove(&framebuffer);
        if state.bound_framebuffer == Some(framebuffer) {
            state.bound_framebuffer = None;
        }
        state.calls.push(GlCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        let mut state = self.state.borrow_mut();
        state.bound_framebuffer = framebuffer;
        state.calls.push(GlCall::BindFramebuffer(framebuffer));
    }

    fn bind_texture_unit(&self, unit: u32, texture: Option<TextureId>) {
        self.record(GlCall::BindTextureUnit { unit, texture });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERT: &str = "#version 330 core\nuniform mat4 model;\nvoid main() {}";
    const FRAG: &str = "#version 330 core\nuniform vec3 lightColor;\nvoid main() {}";

    #[test]
    fn test_compile_requires_entry_point() {
        let gl = HeadlessBackend::new();
        assert!(gl.compile_stage(ShaderStage::Vertex, VERT).is_ok());
        let err = gl
            .compile_stage(ShaderStage::Fragment, "#version 330 core\n")
            .unwrap_err();
        assert!(err.contains("main"));
    }

    #[test]
    fn test_tessellation_stage_rejected_below_4_0() {
        let gl = HeadlessBackend::with_version(ApiVersion::new(3, 3));
        assert!(gl.compile_stage(ShaderStage::TessControl, VERT).is_err());
        gl.set_version(ApiVersion::new(4, 0));
        assert!(gl.compile_stage(ShaderStage::TessControl, VERT).is_ok());
    }

    #[test]
    fn test_uniforms_resolve_against_sources() {
        let gl = HeadlessBackend::new();
        let v = gl.compile_stage(ShaderStage::Vertex, VERT).unwrap();
        let f = gl.compile_stage(ShaderStage::Fragment, FRAG).unwrap();
        let program = gl.link_program(&[v, f]).unwrap();

        let model = gl.uniform_location(program, "model");
        assert!(model.is_some());
        assert_eq!(model, gl.uniform_location(program, "model"));
        assert!(gl.uniform_location(program, "projection").is_none());

        gl.set_uniform(model.unwrap(), UniformValue::Float(1.5));
        assert_eq!(gl.last_uniform("model"), Some(UniformValue::Float(1.5)));
    }

    #[test]
    fn test_zero_sized_attachment_is_incomplete() {
        let gl = HeadlessBackend::new();
        let texture = gl.create_texture_2d(0, 64, TextureFormat::Rgba16F).unwrap();
        let framebuffer = gl.create_framebuffer(&[texture], None).unwrap();
        assert_eq!(
            gl.framebuffer_status(framebuffer),
            FramebufferStatus::IncompleteAttachment
        );
    }

    #[test]
    fn test_live_object_tracking() {
        let gl = HeadlessBackend::new();
        let buffers = gl
            .create_vertex_buffers(&[0u8; 32], Some(&[0, 1, 2]), crate::gfx::scene::Vertex::LAYOUT)
            .unwrap();
        assert_eq!(gl.live_objects().buffers, 2);
        gl.delete_vertex_buffers(buffers);
        assert_eq!(gl.live_objects().total(), 0);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(uniform_base_name("lights[2].color"), "lights");
        assert_eq!(uniform_base_name("material.diffuse"), "material");
        assert_eq!(uniform_base_name("model"), "model");
    }
}
