//! Deferred shading targets
//!
//! [`GBuffer`] is the off-screen framebuffer the geometry pass writes into: view-space position,
//! normal and albedo+specular, each in an RGBA16F texture, plus a depth renderbuffer.
//! [`ScreenQuad`] is the full-screen triangle strip the lighting pass resolves it with.
//!
//! Both release their GPU objects on drop.

use std::mem;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx::backend::{
    FramebufferId, GraphicsApi, MeshBuffers, Primitive, RenderbufferId, TextureFormat, TextureId,
    VertexAttribute, VertexLayout,
};

/// Texture units the lighting pass samples the attachments from.
pub const POSITION_UNIT: u32 = 0;
pub const NORMAL_UNIT: u32 = 1;
pub const ALBEDO_SPEC_UNIT: u32 = 2;

pub struct GBuffer {
    gl: Rc<dyn GraphicsApi>,
    framebuffer: FramebufferId,
    position: TextureId,
    normal: TextureId,
    albedo_spec: TextureId,
    depth: RenderbufferId,
    width: u32,
    height: u32,
}

impl GBuffer {
    /// Creates and validates the framebuffer.
    ///
    /// Nothing is leaked on failure: every object created so far is deleted before the error is
    /// returned.
    pub fn new(gl: Rc<dyn GraphicsApi>, width: u32, height: u32) -> Result<Self> {
        let mut textures = Vec::with_capacity(3);
        for _ in 0..3 {
            match gl.create_texture_2d(width, height, TextureFormat::Rgba16F) {
                Ok(texture) => textures.push(texture),
                Err(err) => {
                    textures.into_iter().for_each(|t| gl.delete_texture(t));
                    return Err(Error::Backend(err));
                }
            }
        }

        let depth = match gl.create_depth_renderbuffer(width, height) {
            Ok(depth) => depth,
            Err(err) => {
                textures.into_iter().for_each(|t| gl.delete_texture(t));
                return Err(Error::Backend(err));
            }
        };

        let framebuffer = match gl.create_framebuffer(&textures, Some(depth)) {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                textures.into_iter().for_each(|t| gl.delete_texture(t));
                gl.delete_renderbuffer(depth);
                return Err(Error::Backend(err));
            }
        };

        let gbuffer = Self {
            gl,
            framebuffer,
            position: textures[0],
            normal: textures[1],
            albedo_spec: textures[2],
            depth,
            width,
            height,
        };

        let status = gbuffer.gl.framebuffer_status(framebuffer);
        if !status.is_complete() {
            log::error!(
                "G-buffer framebuffer {}x{} is not complete: {}",
                width,
                height,
                status
            );
            // Dropping releases the attachments.
            return Err(Error::FramebufferIncomplete(status));
        }

        log::debug!("Created {}x{} G-buffer", width, height);
        Ok(gbuffer)
    }

    /// Makes the G-buffer the draw target.
    pub fn bind(&self) {
        self.gl.bind_framebuffer(Some(self.framebuffer));
    }

    /// Binds the three attachments to their sampling units.
    pub fn bind_textures(&self) {
        self.gl.bind_texture_unit(POSITION_UNIT, Some(self.position));
        self.gl.bind_texture_unit(NORMAL_UNIT, Some(self.normal));
        self.gl
            .bind_texture_unit(ALBEDO_SPEC_UNIT, Some(self.albedo_spec));
    }

    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    /// Position, normal and albedo+specular textures, in unit order.
    pub fn textures(&self) -> [TextureId; 3] {
        [self.position, self.normal, self.albedo_spec]
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for GBuffer {
    fn drop(&mut self) {
        self.gl.delete_framebuffer(self.framebuffer);
        for texture in self.textures() {
            self.gl.delete_texture(texture);
        }
        self.gl.delete_renderbuffer(self.depth);
    }
}

/// Quad vertex: position (x, y, z) then texture coordinate (u, v).
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 20] = [
    -1.0,  1.0, 0.0,  0.0, 1.0,
    -1.0, -1.0, 0.0,  0.0, 0.0,
     1.0,  1.0, 0.0,  1.0, 1.0,
     1.0, -1.0, 0.0,  1.0, 0.0,
];

const FLOAT: i32 = mem::size_of::<f32>() as i32;

const QUAD_ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute {
        location: 0,
        components: 3,
        offset: 0,
    },
    VertexAttribute {
        location: 1,
        components: 2,
        offset: 3 * FLOAT,
    },
];

const QUAD_LAYOUT: VertexLayout = VertexLayout {
    stride: 5 * FLOAT,
    attributes: &QUAD_ATTRIBUTES,
};

/// Full-screen quad drawn as a 4-vertex triangle strip.
pub struct ScreenQuad {
    gl: Rc<dyn GraphicsApi>,
    buffers: MeshBuffers,
}

impl ScreenQuad {
    pub const VERTEX_COUNT: usize = 4;

    pub fn new(gl: Rc<dyn GraphicsApi>) -> Result<Self> {
        let buffers = gl
            .create_vertex_buffers(bytemuck::cast_slice(&QUAD_VERTICES), None, QUAD_LAYOUT)
            .map_err(Error::Backend)?;
        Ok(Self { gl, buffers })
    }

    pub fn draw(&self) {
        self.gl.draw(
            self.buffers.vertex_array,
            Primitive::TriangleStrip,
            Self::VERTEX_COUNT,
            false,
        );
    }
}

impl Drop for ScreenQuad {
    fn drop(&mut self) {
        self.gl.delete_vertex_buffers(self.buffers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{FramebufferStatus, HeadlessBackend};

    #[test]
    fn test_gbuffer_lifecycle() {
        let headless = Rc::new(HeadlessBackend::new());
        let gl: Rc<dyn GraphicsApi> = headless.clone();

        let gbuffer = GBuffer::new(gl, 800, 600).unwrap();
        let live = headless.live_objects();
        assert_eq!(live.textures, 3);
        assert_eq!(live.renderbuffers, 1);
        assert_eq!(live.framebuffers, 1);
        assert_eq!(gbuffer.size(), (800, 600));

        drop(gbuffer);
        assert_eq!(headless.live_objects().total(), 0);
    }

    #[test]
    fn test_incomplete_gbuffer_is_released() {
        let headless = Rc::new(HeadlessBackend::new());
        let gl: Rc<dyn GraphicsApi> = headless.clone();

        let result = GBuffer::new(gl, 0, 600);
        assert!(matches!(
            result,
            Err(Error::FramebufferIncomplete(FramebufferStatus::IncompleteAttachment))
        ));
        assert_eq!(headless.live_objects().total(), 0);
    }

    #[test]
    fn test_screen_quad_draws_strip() {
        let headless = Rc::new(HeadlessBackend::new());
        let gl: Rc<dyn GraphicsApi> = headless.clone();

        let quad = ScreenQuad::new(gl).unwrap();
        quad.draw();
        let draws = headless.draw_calls();
        assert!(matches!(
            draws.as_slice(),
            [crate::gfx::backend::GlCall::Draw {
                primitive: Primitive::TriangleStrip,
                count: 4,
                indexed: false,
                ..
            }]
        ));
        drop(quad);
        assert_eq!(headless.live_objects().total(), 0);
    }
}
