use anyhow::Result;
use half::vec::HalfFloatVecExt;

use crate::error::Error;
use crate::render::diagnostics::GpuErrorScope;
use crate::render::image::{CrossImage, CrossImageData};
use crate::render::layout::{CrossLayout, CubeFace};
use crate::render::shader::ShaderModulePackage;
use crate::render::texture::{DepthTexture2DPackage, Texture2DPackage};

pub const LDR_FACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const HDR_FACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

pub struct CrossToCubeMapRenderer {
    device: std::rc::Rc<wgpu::Device>,
    queue: std::rc::Rc<wgpu::Queue>,
    gpu_ldr_pipeline: wgpu::RenderPipeline,
    gpu_hdr_pipeline: wgpu::RenderPipeline,
    source_bind_group_layout: wgpu::BindGroupLayout,
    face_extract_bindings: Vec<FaceExtractBinding>,
}

impl CrossToCubeMapRenderer {
    pub fn from_device(
        device: std::rc::Rc<wgpu::Device>,
        queue: std::rc::Rc<wgpu::Queue>,
        tera: &tera::Tera,
    ) -> Result<Self> {
        let source_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("CROSS_TO_CUBEMAP_BIND_GROUP_LAYOUT"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let face_extract_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("CROSS_TO_CUBEMAP_FACE_BIND_GROUP_LAYOUT"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("CROSS_TO_CUBEMAP_RENDER_PIPELINE_LAYOUT"),
                bind_group_layouts: &[&source_bind_group_layout, &face_extract_bind_group_layout],
                push_constant_ranges: &[],
            });

        let shader_module_package = ShaderModulePackage::from_templates(
            "common/fullscreen.vert",
            "crossmap/crossmap.frag",
            "CROSS_TO_CUBEMAP",
            &device,
            tera,
            Some(&CrossExtractTemplateConfiguration::from_layout_tables()),
        )?;

        let scope = GpuErrorScope::push(&device, "cross extraction pipeline creation");

        let gpu_ldr_pipeline = CrossToCubeMapRenderer::create_extract_pipeline(
            "CROSS_TO_CUBEMAP_LDR_RENDER_PIPELINE",
            &device,
            &render_pipeline_layout,
            &shader_module_package,
            LDR_FACE_FORMAT,
        );

        let gpu_hdr_pipeline = CrossToCubeMapRenderer::create_extract_pipeline(
            "CROSS_TO_CUBEMAP_HDR_RENDER_PIPELINE",
            &device,
            &render_pipeline_layout,
            &shader_module_package,
            HDR_FACE_FORMAT,
        );

        let errors = scope.finish();
        if !errors.is_empty() {
            return Err(Error::ShaderLink {
                name: String::from("CROSS_TO_CUBEMAP_RENDER_PIPELINE"),
                message: errors.join("; "),
            }
            .into());
        }

        // One binding per (layout, face) table entry, indexed layout-major.
        let mut face_extract_bindings =
            Vec::with_capacity(CrossLayout::ALL.len() * CubeFace::ALL.len());
        for layout_id in 0..CrossLayout::ALL.len() {
            let layout = CrossLayout::from_id(layout_id as i32)?;
            for face_index in 0..CubeFace::ALL.len() {
                let face = CubeFace::from_index(face_index)?;
                face_extract_bindings.push(FaceExtractBinding::from_uniform(
                    FaceExtractUniform::new(layout, face),
                    &format!("{layout:?}_{face:?}").to_uppercase(),
                    &face_extract_bind_group_layout,
                    &device,
                    &queue,
                ));
            }
        }

        Ok(Self {
            device,
            queue,
            gpu_ldr_pipeline,
            gpu_hdr_pipeline,
            source_bind_group_layout,
            face_extract_bindings,
        })
    }

    fn create_extract_pipeline(
        name: &str,
        device: &wgpu::Device,
        render_pipeline_layout: &wgpu::PipelineLayout,
        shader_module_package: &ShaderModulePackage,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(name),
            layout: Some(render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module_package.vertex_shader_module,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module_package.fragment_shader_module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent::REPLACE,
                        alpha: wgpu::BlendComponent::REPLACE,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    /// Converts one cross image into a 6-face cubemap texture.
    ///
    /// The six faces are rendered in layer order into a freshly allocated
    /// texture; any GPU error along the way aborts the whole conversion and
    /// no handle escapes. The returned texture is complete once this
    /// function returns.
    pub fn render_cubemap_texture(
        &self,
        name: &str,
        cross_image: &CrossImage,
        layout: CrossLayout,
        face_size: u32,
    ) -> Result<wgpu::Texture> {
        if face_size == 0 {
            return Err(Error::InvalidLayout {
                message: String::from("cubemap face size must be a positive number of texels"),
            }
            .into());
        }

        let (image_width, image_height) = cross_image.dimensions();
        if !layout.matches_image_dimensions(image_width, image_height) {
            let (columns, rows) = layout.grid_dimensions();
            return Err(Error::InvalidLayout {
                message: format!(
                    "a {image_width}x{image_height} image does not split into the {columns}x{rows} cell grid of {layout:?}",
                ),
            }
            .into());
        }

        let maximum_dimension = self.device.limits().max_texture_dimension_2d;
        if face_size > maximum_dimension {
            return Err(Error::FramebufferIncomplete {
                message: format!(
                    "face size {face_size} exceeds the device's maximum texture dimension {maximum_dimension}",
                ),
            }
            .into());
        }

        let scope = GpuErrorScope::push(&self.device, "cross image upload");
        let source = self.upload_source_texture(name, cross_image);
        let errors = scope.finish();
        if !errors.is_empty() {
            return Err(Error::Gpu {
                message: errors.join("; "),
            }
            .into());
        }

        let gpu_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("CROSS_TO_CUBEMAP_BIND_GROUP"),
            layout: &self.source_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.gpu_texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&source.gpu_sampler),
                },
            ],
        });

        let face_format = if cross_image.is_hdr() {
            HDR_FACE_FORMAT
        } else {
            LDR_FACE_FORMAT
        };

        // The cubemap plus a face-sized depth attachment; the depth texture
        // is owned by this call and dropped once the six passes are encoded.
        let scope = GpuErrorScope::push(&self.device, "cubemap render target allocation");

        let gpu_cubemap_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{name}_TEXTURE")),
            size: wgpu::Extent3d {
                width: face_size,
                height: face_size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: face_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth_texture = DepthTexture2DPackage::from_device(
            &self.device,
            name,
            wgpu::Extent3d {
                width: face_size,
                height: face_size,
                depth_or_array_layers: 1,
            },
        );

        let errors = scope.finish();
        if !errors.is_empty() {
            return Err(Error::FramebufferIncomplete {
                message: errors.join("; "),
            }
            .into());
        }

        let gpu_pipeline = if cross_image.is_hdr() {
            &self.gpu_hdr_pipeline
        } else {
            &self.gpu_ldr_pipeline
        };

        let scope = GpuErrorScope::push(&self.device, "cubemap face extraction");

        for face in CubeFace::ALL {
            let face_index = face.index();

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some(&format!("CROSS_TO_CUBEMAP_FACE_{face_index}_COMMAND_ENCODER")),
                });

            let texture_view = gpu_cubemap_texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{name}_FACE_{face_index}_TEXTURE_VIEW")),
                format: Some(face_format),
                dimension: Some(wgpu::TextureViewDimension::D2),
                aspect: wgpu::TextureAspect::All,
                base_mip_level: 0,
                mip_level_count: None,
                base_array_layer: face_index as u32,
                array_layer_count: Some(1),
            });

            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(&format!("CROSS_TO_CUBEMAP_FACE_{face_index}_RENDER_PASS")),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &texture_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &depth_texture.gpu_texture_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

                render_pass.set_pipeline(gpu_pipeline);
                render_pass.set_bind_group(0, &gpu_bind_group, &[]);
                render_pass.set_bind_group(
                    1,
                    &self.face_extract_bindings[CrossToCubeMapRenderer::binding_index(
                        layout, face,
                    )]
                    .gpu_bind_group,
                    &[],
                );
                render_pass.draw(0..3, 0..1);
            }

            self.queue.submit(std::iter::once(encoder.finish()));
        }

        let errors = scope.finish();
        if !errors.is_empty() {
            return Err(Error::Gpu {
                message: errors.join("; "),
            }
            .into());
        }

        // Block until the six face draws have completed; only then is the
        // handle safe to sample from.
        let _ = self.device.poll(wgpu::Maintain::Wait);

        Ok(gpu_cubemap_texture)
    }

    fn binding_index(layout: CrossLayout, face: CubeFace) -> usize {
        layout.id() as usize * CubeFace::ALL.len() + face.index()
    }

    fn upload_source_texture(&self, name: &str, cross_image: &CrossImage) -> Texture2DPackage {
        let (image_width, image_height) = cross_image.dimensions();
        let image_size = wgpu::Extent3d {
            width: image_width,
            height: image_height,
            depth_or_array_layers: 1,
        };

        let (source_format, image_data, bytes_per_texel): (wgpu::TextureFormat, Vec<u8>, u32) =
            match cross_image.data() {
                CrossImageData::Ldr(rgba_image) => {
                    (LDR_FACE_FORMAT, rgba_image.as_raw().clone(), 4)
                }
                CrossImageData::Hdr(rgba_image) => {
                    let half_data = Vec::<half::f16>::from_f32_slice(rgba_image);
                    (
                        HDR_FACE_FORMAT,
                        bytemuck::cast_slice(&half_data).to_vec(),
                        4 * std::mem::size_of::<u16>() as u32,
                    )
                }
            };

        let gpu_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{name}_SOURCE_TEXTURE")),
            size: image_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: source_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image_data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_texel * image_width),
                rows_per_image: Some(image_height),
            },
            image_size,
        );

        self.queue.submit([]);

        let gpu_texture_view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let gpu_sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{name}_SOURCE_SAMPLER")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Texture2DPackage {
            gpu_texture,
            gpu_texture_view,
            gpu_sampler,
        }
    }
}

pub struct FaceExtractBinding {
    pub gpu_bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    pub gpu_uniform_buffer: wgpu::Buffer,
}

impl FaceExtractBinding {
    pub fn from_uniform(
        uniform: FaceExtractUniform,
        name: &str,
        bind_group_layout: &wgpu::BindGroupLayout,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Self {
        let gpu_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("CROSS_TO_CUBEMAP_FACE_{name}_UNIFORM_BUFFER")),
            size: std::mem::size_of::<FaceExtractUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(&gpu_uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
        queue.submit([]);

        let gpu_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("CROSS_TO_CUBEMAP_FACE_{name}_BIND_GROUP")),
            layout: bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: gpu_uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            gpu_bind_group,
            gpu_uniform_buffer,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FaceExtractUniform {
    pub face_index: i32,
    pub layout_id: i32,
    _padding: [i32; 2],
}

impl FaceExtractUniform {
    pub fn new(layout: CrossLayout, face: CubeFace) -> Self {
        Self {
            face_index: face.index() as i32,
            layout_id: layout.id(),
            _padding: [0; 2],
        }
    }
}

/// Bakes the per-layout face rectangles into the extraction shader source so
/// the shader and `CrossLayout::face_region` cannot drift apart.
#[derive(Debug, serde::Serialize)]
pub struct CrossExtractTemplateConfiguration {
    regions: Vec<RegionTemplateEntry>,
}

#[derive(Debug, serde::Serialize)]
struct RegionTemplateEntry {
    u0: f32,
    v0: f32,
    u1: f32,
    v1: f32,
    flip_u: bool,
    flip_v: bool,
}

impl CrossExtractTemplateConfiguration {
    pub fn from_layout_tables() -> Self {
        let mut regions = Vec::with_capacity(CrossLayout::ALL.len() * CubeFace::ALL.len());
        for layout in CrossLayout::ALL {
            for face in CubeFace::ALL {
                let region = layout.face_region(face);
                regions.push(RegionTemplateEntry {
                    u0: region.min[0],
                    v0: region.min[1],
                    u1: region.max[0],
                    v1: region.max[1],
                    flip_u: region.flip_u,
                    flip_v: region.flip_v,
                });
            }
        }

        Self { regions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader_templates() -> tera::Tera {
        tera::Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/**/*")).unwrap()
    }

    #[test]
    fn face_extract_uniform_is_pod_and_padded() {
        assert_eq!(std::mem::size_of::<FaceExtractUniform>(), 16);

        let uniform = FaceExtractUniform::new(CrossLayout::VerticalCross, CubeFace::NegativeZ);
        let bytes: &[u8] = bytemuck::cast_slice(std::slice::from_ref(&uniform));
        assert_eq!(bytes.len(), 16);
        assert_eq!(uniform.face_index, 5);
        assert_eq!(uniform.layout_id, 1);
    }

    #[test]
    fn template_configuration_is_layout_major() {
        let config = CrossExtractTemplateConfiguration::from_layout_tables();
        assert_eq!(config.regions.len(), 12);

        let region = CrossLayout::HorizontalCross.face_region(CubeFace::PositiveX);
        assert_eq!(config.regions[0].u0, region.min[0]);
        assert_eq!(config.regions[0].v1, region.max[1]);

        // Vertical cross -Z sits last and carries the rotation flags.
        let entry = &config.regions[11];
        assert!(entry.flip_u && entry.flip_v);
    }

    #[test]
    fn extraction_templates_render() {
        let tera = shader_templates();
        let context = tera::Context::from_serialize(
            CrossExtractTemplateConfiguration::from_layout_tables(),
        )
        .unwrap();

        let vertex_source = tera.render("common/fullscreen.vert", &context).unwrap();
        assert!(vertex_source.contains("fn vs_main"));

        let fragment_source = tera.render("crossmap/crossmap.frag", &context).unwrap();
        assert!(fragment_source.contains("fn fs_main"));
        assert!(fragment_source.contains("REGION_RECTS"));
        assert!(fragment_source.contains("REGION_FLIPS"));
        // The horizontal +X cell starts at u = 0.5.
        assert!(fragment_source.contains("vec4<f32>(0.5,"));
        // No unexpanded template markers survive.
        assert!(!fragment_source.contains("{{"));
        assert!(!fragment_source.contains("{%"));
    }
}
