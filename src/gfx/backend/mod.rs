//! # Graphics Backend
//!
//! Every GPU call the editor makes goes through [`GraphicsApi`]. The trait mirrors the small
//! slice of the OpenGL state machine the renderer needs: shader stages and programs, vertex
//! buffers, fixed-function toggles, textures and framebuffers.
//!
//! Two implementations are provided:
//!
//! - [`GlowBackend`] drives a live OpenGL context through `glow`
//! - [`HeadlessBackend`] records calls and emulates observable state without a GPU
//!
//! GPU-owning values (`Mesh`, `Shader`, `GBuffer`) hold an `Rc<dyn GraphicsApi>` and release
//! their objects on drop.

pub mod glow_backend;
pub mod headless;

use std::fmt;
use std::num::NonZeroU32;

pub use glow_backend::GlowBackend;
pub use headless::{GlCall, HeadlessBackend};

macro_rules! gpu_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub NonZeroU32);

            impl $name {
                pub fn get(self) -> u32 {
                    self.0.get()
                }
            }
        )*
    };
}

gpu_id! {
    /// A compiled, not yet linked, shader stage object.
    StageId,
    /// A linked shader program.
    ProgramId,
    /// A vertex or index buffer object.
    BufferId,
    /// A vertex array object.
    VertexArrayId,
    /// A 2D texture object.
    TextureId,
    /// A framebuffer object. The default framebuffer is `None` wherever one is accepted.
    FramebufferId,
    /// A renderbuffer object.
    RenderbufferId,
}

/// Driver-assigned uniform location. Absent uniforms are `None`, never `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Programmable pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Fragment,
}

impl ShaderStage {
    pub fn is_tessellation(self) -> bool {
        matches!(self, ShaderStage::TessControl | ShaderStage::TessEvaluation)
    }

    /// Conventional file extension for sources of this stage.
    pub fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::TessControl => "tesc",
            ShaderStage::TessEvaluation => "tese",
            ShaderStage::Fragment => "frag",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::TessControl => "TESS_CONTROL",
            ShaderStage::TessEvaluation => "TESS_EVALUATION",
            ShaderStage::Fragment => "FRAGMENT",
        };
        f.write_str(label)
    }
}

/// Reported context version, compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Tessellation stages are core from 4.0 on.
    pub fn supports_tessellation(self) -> bool {
        self >= ApiVersion::new(4, 0)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Typed uniform payload. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

/// Assembly of vertices into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    /// Tessellation patches; the patch size is set with [`GraphicsApi::set_patch_vertices`].
    Patches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    Blend,
    CullFace,
    Multisample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba16F,
    Rgba8,
}

/// Result of a framebuffer completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    Undefined,
    IncompleteAttachment,
    MissingAttachment,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    Unsupported,
    IncompleteMultisample,
    Unknown(u32),
}

impl FramebufferStatus {
    pub fn is_complete(self) -> bool {
        self == FramebufferStatus::Complete
    }
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramebufferStatus::Complete => f.write_str("complete"),
            FramebufferStatus::Undefined => f.write_str("default framebuffer does not exist"),
            FramebufferStatus::IncompleteAttachment => {
                f.write_str("an attachment is incomplete (zero size or unrenderable format)")
            }
            FramebufferStatus::MissingAttachment => f.write_str("no image is attached"),
            FramebufferStatus::IncompleteDrawBuffer => {
                f.write_str("a draw buffer names an attachment point with no image")
            }
            FramebufferStatus::IncompleteReadBuffer => {
                f.write_str("the read buffer names an attachment point with no image")
            }
            FramebufferStatus::Unsupported => {
                f.write_str("the combination of internal formats is unsupported")
            }
            FramebufferStatus::IncompleteMultisample => {
                f.write_str("attachments disagree on sample count")
            }
            FramebufferStatus::Unknown(code) => write!(f, "unknown status 0x{code:04X}"),
        }
    }
}

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset: i32,
}

/// Interleaved vertex layout description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: i32,
    pub attributes: &'static [VertexAttribute],
}

/// GPU objects backing one vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex_array: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: Option<BufferId>,
}

/// The subset of OpenGL used by the editor.
///
/// Methods take `&self`: the context is a single-threaded state machine, and implementations keep
/// any bookkeeping behind interior mutability.
pub trait GraphicsApi {
    fn api_version(&self) -> ApiVersion;

    // Shaders
    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<StageId, String>;
    fn delete_stage(&self, stage: StageId);
    fn link_program(&self, stages: &[StageId]) -> Result<ProgramId, String>;
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: Option<ProgramId>);
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, location: UniformLocation, value: UniformValue);

    // Geometry
    fn create_vertex_buffers(
        &self,
        vertex_bytes: &[u8],
        indices: Option<&[u32]>,
        layout: VertexLayout,
    ) -> Result<MeshBuffers, String>;
    fn delete_vertex_buffers(&self, buffers: MeshBuffers);
    fn draw(&self, vertex_array: VertexArrayId, primitive: Primitive, count: usize, indexed: bool);
    fn set_patch_vertices(&self, count: i32);

    // Fixed-function state
    fn clear(&self, color: [f32; 4]);
    fn set_capability(&self, capability: Capability, enabled: bool);
    fn set_alpha_blending(&self);
    fn set_polygon_mode(&self, mode: PolygonMode);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    // Render targets
    fn create_texture_2d(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, String>;
    fn delete_texture(&self, texture: TextureId);
    fn create_depth_renderbuffer(&self, width: u32, height: u32)
        -> Result<RenderbufferId, String>;
    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId);
    fn create_framebuffer(
        &self,
        color_attachments: &[TextureId],
        depth_attachment: Option<RenderbufferId>,
    ) -> Result<FramebufferId, String>;
    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus;
    fn delete_framebuffer(&self, framebuffer: FramebufferId);
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>);
    fn bind_texture_unit(&self, unit: u32, texture: Option<TextureId>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        assert!(ApiVersion::new(4, 0).supports_tessellation());
        assert!(ApiVersion::new(4, 6).supports_tessellation());
        assert!(!ApiVersion::new(3, 3).supports_tessellation());
        assert!(ApiVersion::new(3, 3) < ApiVersion::new(4, 1));
        assert_eq!(ApiVersion::new(4, 1).to_string(), "4.1");
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(ShaderStage::Vertex.to_string(), "VERTEX");
        assert_eq!(ShaderStage::TessEvaluation.extension(), "tese");
        assert!(ShaderStage::TessControl.is_tessellation());
        assert!(!ShaderStage::Fragment.is_tessellation());
    }
}
