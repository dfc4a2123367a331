//! OpenGL implementation of [`GraphicsApi`] on top of `glow`.
//!
//! The context must be current on the calling thread for the lifetime of the backend; context
//! and window creation belong to the embedding application.

use glow::HasContext;

use super::{
    ApiVersion, BufferId, Capability, FramebufferId, FramebufferStatus, GraphicsApi, MeshBuffers,
    PolygonMode, Primitive, ProgramId, RenderbufferId, ShaderStage, StageId, TextureFormat,
    TextureId, UniformLocation, UniformValue, VertexArrayId, VertexLayout,
};

pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Wraps a context whose function pointers have already been loaded.
    pub fn new(gl: glow::Context) -> Self {
        let version = gl.version();
        log::info!(
            "OpenGL {}.{}{} ({})",
            version.major,
            version.minor,
            if version.is_embedded { " ES" } else { "" },
            version.vendor_info
        );
        Self { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

fn stage_kind(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
        ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
        Capability::Multisample => glow::MULTISAMPLE,
    }
}

fn primitive_enum(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
        Primitive::Patches => glow::PATCHES,
    }
}

fn decode_status(code: u32) -> FramebufferStatus {
    match code {
        glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        glow::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
        glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
        other => FramebufferStatus::Unknown(other),
    }
}

impl GraphicsApi for GlowBackend {
    fn api_version(&self) -> ApiVersion {
        let version = self.gl.version();
        ApiVersion::new(version.major, version.minor)
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<StageId, String> {
        unsafe {
            let shader = self.gl.create_shader(stage_kind(stage))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(StageId(shader.0))
        }
    }

    fn delete_stage(&self, stage: StageId) {
        unsafe { self.gl.delete_shader(glow::NativeShader(stage.0)) }
    }

    fn link_program(&self, stages: &[StageId]) -> Result<ProgramId, String> {
        unsafe {
            let program = self.gl.create_program()?;
            for stage in stages {
                self.gl.attach_shader(program, glow::NativeShader(stage.0));
            }
            self.gl.link_program(program);
            for stage in stages {
                self.gl.detach_shader(program, glow::NativeShader(stage.0));
            }
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            Ok(ProgramId(program.0))
        }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe { self.gl.use_program(program.map(|p| glow::NativeProgram(p.0))) }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match value {
                UniformValue::Bool(v) => self.gl.uniform_1_i32(location, v as i32),
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(location, v[0], v[1]),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v[0], v[1], v[2]),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(location, v[0], v[1], v[2], v[3]),
                UniformValue::Mat2(m) => self.gl.uniform_matrix_2_f32_slice(location, false, &m),
                UniformValue::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(location, false, &m),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(location, false, &m),
            }
        }
    }

    fn create_vertex_buffers(
        &self,
        vertex_bytes: &[u8],
        indices: Option<&[u32]>,
        layout: VertexLayout,
    ) -> Result<MeshBuffers, String> {
        unsafe {
            let vao = self.gl.create_vertex_array()?;
            let vbo = self.gl.create_buffer()?;

            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, vertex_bytes, glow::STATIC_DRAW);

            let ebo = match indices {
                Some(indices) => {
                    let ebo = self.gl.create_buffer()?;
                    self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                    self.gl.buffer_data_u8_slice(
                        glow::ELEMENT_ARRAY_BUFFER,
                        bytemuck::cast_slice(indices),
                        glow::STATIC_DRAW,
                    );
                    Some(ebo)
                }
                None => None,
            };

            for attribute in layout.attributes {
                self.gl.enable_vertex_attrib_array(attribute.location);
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    layout.stride,
                    attribute.offset,
                );
            }

            self.gl.bind_vertex_array(None);

            Ok(MeshBuffers {
                vertex_array: VertexArrayId(vao.0),
                vertex_buffer: BufferId(vbo.0),
                index_buffer: ebo.map(|b| BufferId(b.0)),
            })
        }
    }

    fn delete_vertex_buffers(&self, buffers: MeshBuffers) {
        unsafe {
            if let Some(ebo) = buffers.index_buffer {
                self.gl.delete_buffer(glow::NativeBuffer(ebo.0));
            }
            self.gl
                .delete_buffer(glow::NativeBuffer(buffers.vertex_buffer.0));
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(buffers.vertex_array.0));
        }
    }

    fn draw(&self, vertex_array: VertexArrayId, primitive: Primitive, count: usize, indexed: bool) {
        let mode = primitive_enum(primitive);
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(vertex_array.0)));
            if indexed {
                self.gl
                    .draw_elements(mode, count as i32, glow::UNSIGNED_INT, 0);
            } else {
                self.gl.draw_arrays(mode, 0, count as i32);
            }
            self.gl.bind_vertex_array(None);
        }
    }

    fn set_patch_vertices(&self, count: i32) {
        unsafe { self.gl.patch_parameter_i32(glow::PATCH_VERTICES, count) }
    }

    fn clear(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        let cap = capability_enum(capability);
        unsafe {
            if enabled {
                self.gl.enable(cap);
            } else {
                self.gl.disable(cap);
            }
        }
    }

    fn set_alpha_blending(&self) {
        unsafe {
            self.gl.blend_equation(glow::FUNC_ADD);
            self.gl
                .blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        }
    }

    fn set_polygon_mode(&self, mode: PolygonMode) {
        let mode = match mode {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Line => glow::LINE,
        };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn create_texture_2d(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, String> {
        let (internal, ty) = match format {
            TextureFormat::Rgba16F => (glow::RGBA16F, glow::FLOAT),
            TextureFormat::Rgba8 => (glow::RGBA8, glow::UNSIGNED_BYTE),
        };
        unsafe {
            let texture = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                ty,
                glow::PixelUnpackData::Slice(None),
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(TextureId(texture.0))
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn create_depth_renderbuffer(
        &self,
        width: u32,
        height: u32,
    ) -> Result<RenderbufferId, String> {
        unsafe {
            let renderbuffer = self.gl.create_renderbuffer()?;
            self.gl
                .bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH_COMPONENT24,
                width as i32,
                height as i32,
            );
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            Ok(RenderbufferId(renderbuffer.0))
        }
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
        unsafe {
            self.gl
                .delete_renderbuffer(glow::NativeRenderbuffer(renderbuffer.0))
        }
    }

    fn create_framebuffer(
        &self,
        color_attachments: &[TextureId],
        depth_attachment: Option<RenderbufferId>,
    ) -> Result<FramebufferId, String> {
        unsafe {
            let framebuffer = self.gl.create_framebuffer()?;
            self.gl
                .bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));

            let mut draw_buffers = Vec::with_capacity(color_attachments.len());
            for (i, texture) in color_attachments.iter().enumerate() {
                let attachment = glow::COLOR_ATTACHMENT0 + i as u32;
                self.gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    attachment,
                    glow::TEXTURE_2D,
                    Some(glow::NativeTexture(texture.0)),
                    0,
                );
                draw_buffers.push(attachment);
            }
            self.gl.draw_buffers(&draw_buffers);

            if let Some(depth) = depth_attachment {
                self.gl.framebuffer_renderbuffer(
                    glow::FRAMEBUFFER,
                    glow::DEPTH_ATTACHMENT,
                    glow::RENDERBUFFER,
                    Some(glow::NativeRenderbuffer(depth.0)),
                );
            }

            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            Ok(FramebufferId(framebuffer.0))
        }
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        unsafe {
            self.gl
                .bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            decode_status(status)
        }
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        unsafe {
            self.gl
                .delete_framebuffer(glow::NativeFramebuffer(framebuffer.0))
        }
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                framebuffer.map(|f| glow::NativeFramebuffer(f.0)),
            )
        }
    }

    fn bind_texture_unit(&self, unit: u32, texture: Option<TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)));
        }
    }
}
