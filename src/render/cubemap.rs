use anyhow::Result;

use crate::error::Error;

pub struct CubeMap {
    #[allow(dead_code)]
    pub gpu_texture: wgpu::Texture,
    pub gpu_texture_view: wgpu::TextureView,
    pub gpu_sampler: wgpu::Sampler,
}

impl CubeMap {
    /// Wraps a populated 6-layer texture as a sampleable cubemap. The texture
    /// must hold six square faces of equal size; anything else cannot be
    /// bound as a cube view.
    pub fn from_texture(
        gpu_texture: wgpu::Texture,
        name: &str,
        device: &wgpu::Device,
    ) -> Result<Self> {
        if gpu_texture.dimension() != wgpu::TextureDimension::D2 {
            return Err(Error::Initialization {
                message: format!(
                    "The given texture does not have the required dimension (required=D2): {:?}",
                    gpu_texture.dimension(),
                ),
            }
            .into());
        }

        if gpu_texture.depth_or_array_layers() != 6 {
            return Err(Error::Initialization {
                message: format!(
                    "The given texture does not have the required number of depth/array layers (required=6): {}",
                    gpu_texture.depth_or_array_layers(),
                ),
            }
            .into());
        }

        if gpu_texture.width() != gpu_texture.height() {
            return Err(Error::Initialization {
                message: format!(
                    "The given texture does not have square faces: {}x{}",
                    gpu_texture.width(),
                    gpu_texture.height(),
                ),
            }
            .into());
        }

        let gpu_texture_view = gpu_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{name}_TEXTURE_VIEW")),
            format: Some(gpu_texture.format()),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(gpu_texture.mip_level_count()),
            base_array_layer: 0,
            array_layer_count: Some(6),
        });

        let gpu_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{name}_SAMPLER")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            gpu_texture,
            gpu_texture_view,
            gpu_sampler,
        })
    }

    /// A 1x1 white cubemap used until a cross image has been converted.
    pub fn create_default_cubemap(
        name: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<CubeMap> {
        let image_data: [u8; 4] = [255, 255, 255, 255];
        let image_size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 6,
        };

        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{name}_TEXTURE")),
            size: image_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for layer in 0..6 {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &gpu_texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(&image_data),
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4),
                    rows_per_image: Some(1),
                },
                wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
            );
        }

        queue.submit([]);

        CubeMap::from_texture(gpu_texture, name, device)
    }
}
