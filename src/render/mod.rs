use anyhow::Result;

use crate::render::layout::CrossLayout;
use crate::render::state::RenderSystemState;
use crate::resource::cross::CrossImageLoader;

mod crossmap;
mod cubemap;
mod diagnostics;
pub mod image;
pub mod layout;
mod shader;
mod skybox;
mod state;
mod texture;

pub struct RenderSystem {
    state: RenderSystemState,
    pointer_position: [f32; 2],
    elapsed_time: f32,
}

impl RenderSystem {
    pub async fn from_window(window: std::sync::Arc<winit::window::Window>) -> Result<Self> {
        let state = RenderSystemState::from_window(window).await?;

        Ok(Self {
            state,
            pointer_position: [0.0, 0.0],
            elapsed_time: 0.0,
        })
    }

    pub fn sync_view_dimensions(&mut self) {
        self.set_view_dimensions(self.state.view_dimensions);
    }

    pub fn set_view_dimensions(&mut self, view_dimensions: winit::dpi::PhysicalSize<u32>) {
        if view_dimensions.width == 0 || view_dimensions.height == 0 {
            return;
        }

        self.state.set_view_dimensions(view_dimensions);
    }

    /// Records the pointer position in window coordinates. The shader wants a
    /// bottom-left origin, so the vertical axis is inverted here.
    pub fn set_pointer_position(&mut self, x: f32, y: f32) {
        self.pointer_position = [x, self.state.view_dimensions.height as f32 - y];
    }

    pub fn advance_time(&mut self, delta_time: std::time::Duration) {
        self.elapsed_time += delta_time.as_secs_f32();
    }

    pub fn render(&mut self) -> Result<()> {
        self.state.skybox.update_params(
            [
                self.state.surface_config.width as f32,
                self.state.surface_config.height as f32,
            ],
            self.pointer_position,
            self.elapsed_time,
        );

        let output = self.state.surface.get_current_texture()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        #[cfg(debug_assertions)]
        let scope = diagnostics::GpuErrorScope::push(&self.state.device, "frame rendering");

        let mut encoder =
            self.state
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("RENDER_SYSTEM_COMMAND_ENCODER"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("RENDER_SYSTEM_RENDER_PASS"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.5,
                            g: 0.5,
                            b: 0.5,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.state.depth_texture.gpu_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.state
                .skybox_renderer
                .render_skybox(&self.state.skybox, &mut render_pass);
        }

        self.state.queue.submit(std::iter::once(encoder.finish()));

        #[cfg(debug_assertions)]
        scope.finish();

        output.present();

        Ok(())
    }

    /// Converts the loaded cross image into a cubemap and swaps it in as the
    /// active skybox. On failure the previous skybox stays active, so a
    /// partially written cubemap is never displayed.
    pub fn load_cross_environment(
        &mut self,
        cross_image_loader: &impl CrossImageLoader,
        layout: CrossLayout,
        face_size: u32,
    ) -> Result<()> {
        let cross_image = cross_image_loader.load_cross_image()?;

        log::info!(
            "Converting a {:?} cross image into a {face_size}x{face_size} cubemap (layout: {layout:?}, hdr: {})",
            cross_image.dimensions(),
            cross_image.is_hdr(),
        );

        let cubemap_texture = self.state.cross_to_cubemap_renderer.render_cubemap_texture(
            "CROSS_ENVIRONMENT_SKYBOX_CUBEMAP",
            &cross_image,
            layout,
            face_size,
        )?;

        self.state.skybox = self.state.skybox_renderer.create_skybox_from_texture(
            cubemap_texture,
            "CROSS_ENVIRONMENT_SKYBOX_CUBEMAP",
            cross_image.is_hdr(),
        )?;

        Ok(())
    }
}
