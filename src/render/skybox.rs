use anyhow::Result;

use crate::error::Error;
use crate::render::cubemap::CubeMap;
use crate::render::diagnostics::GpuErrorScope;
use crate::render::shader::ShaderModulePackage;

pub struct SkyboxRenderer {
    device: std::rc::Rc<wgpu::Device>,
    queue: std::rc::Rc<wgpu::Queue>,
    gpu_pipeline: wgpu::RenderPipeline,
    gpu_tone_map_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl SkyboxRenderer {
    pub fn from_device(
        device: std::rc::Rc<wgpu::Device>,
        queue: std::rc::Rc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        tera: &tera::Tera,
    ) -> Result<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SKYBOX_BIND_GROUP_LAYOUT"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("SKYBOX_RENDER_PIPELINE_LAYOUT"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let shader_module_package = ShaderModulePackage::from_templates(
            "common/fullscreen.vert",
            "skybox/skybox.frag",
            "SKYBOX",
            &device,
            tera,
            Some(&SkyboxTemplateConfiguration { tone_map: false }),
        )?;

        let tone_map_shader_module_package = ShaderModulePackage::from_templates(
            "common/fullscreen.vert",
            "skybox/skybox.frag",
            "SKYBOX_TONE_MAP",
            &device,
            tera,
            Some(&SkyboxTemplateConfiguration { tone_map: true }),
        )?;

        let scope = GpuErrorScope::push(&device, "skybox pipeline creation");

        let gpu_pipeline = SkyboxRenderer::create_skybox_pipeline(
            "SKYBOX_RENDER_PIPELINE",
            &device,
            &render_pipeline_layout,
            &shader_module_package,
            format,
        );

        let gpu_tone_map_pipeline = SkyboxRenderer::create_skybox_pipeline(
            "SKYBOX_TONE_MAP_RENDER_PIPELINE",
            &device,
            &render_pipeline_layout,
            &tone_map_shader_module_package,
            format,
        );

        let errors = scope.finish();
        if !errors.is_empty() {
            return Err(Error::ShaderLink {
                name: String::from("SKYBOX_RENDER_PIPELINE"),
                message: errors.join("; "),
            }
            .into());
        }

        Ok(Self {
            device,
            queue,
            gpu_pipeline,
            gpu_tone_map_pipeline,
            bind_group_layout,
        })
    }

    fn create_skybox_pipeline(
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

    pub fn create_skybox_from_texture(
        &self,
        gpu_texture: wgpu::Texture,
        name: &str,
        tone_mapped: bool,
    ) -> Result<Skybox> {
        let cubemap = CubeMap::from_texture(gpu_texture, name, &self.device)?;

        Ok(Skybox::from_device(
            &self.device,
            self.queue.clone(),
            name,
            cubemap,
            tone_mapped,
            &self.bind_group_layout,
        ))
    }

    pub fn create_default_skybox(&self, name: &str) -> Result<Skybox> {
        let cubemap = CubeMap::create_default_cubemap(name, &self.device, &self.queue)?;

        Ok(Skybox::from_device(
            &self.device,
            self.queue.clone(),
            name,
            cubemap,
            false,
            &self.bind_group_layout,
        ))
    }

    pub fn render_skybox(&self, skybox: &Skybox, render_pass: &mut wgpu::RenderPass) {
        if skybox.tone_mapped {
            render_pass.set_pipeline(&self.gpu_tone_map_pipeline);
        } else {
            render_pass.set_pipeline(&self.gpu_pipeline);
        }
        render_pass.set_bind_group(0, &skybox.gpu_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

pub struct Skybox {
    #[allow(dead_code)]
    pub cubemap: CubeMap,
    pub gpu_params_uniform_buffer: wgpu::Buffer,
    pub gpu_bind_group: wgpu::BindGroup,
    tone_mapped: bool,
    queue: std::rc::Rc<wgpu::Queue>,
}

impl Skybox {
    fn from_device(
        device: &wgpu::Device,
        queue: std::rc::Rc<wgpu::Queue>,
        name: &str,
        cubemap: CubeMap,
        tone_mapped: bool,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let gpu_params_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{name}_PARAMS_UNIFORM_BUFFER")),
            size: std::mem::size_of::<SkyboxParamsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gpu_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}_BIND_GROUP")),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: gpu_params_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cubemap.gpu_texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&cubemap.gpu_sampler),
                },
            ],
        });

        Self {
            cubemap,
            gpu_params_uniform_buffer,
            gpu_bind_group,
            tone_mapped,
            queue,
        }
    }

    /// Refreshes the view parameters sampled by the skybox shader. Pointer
    /// coordinates use a bottom-left origin.
    pub fn update_params(&self, resolution: [f32; 2], pointer: [f32; 2], time: f32) {
        self.queue.write_buffer(
            &self.gpu_params_uniform_buffer,
            0,
            bytemuck::cast_slice(&[SkyboxParamsUniform::new(resolution, pointer, time)]),
        );
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxParamsUniform {
    pub resolution: [f32; 2],
    pub pointer: [f32; 2],
    pub time: f32,
    _padding: [f32; 3],
}

impl SkyboxParamsUniform {
    pub fn new(resolution: [f32; 2], pointer: [f32; 2], time: f32) -> Self {
        Self {
            resolution,
            pointer,
            time,
            _padding: [0.0; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub struct SkyboxTemplateConfiguration {
    pub tone_map: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader_templates() -> tera::Tera {
        tera::Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/**/*")).unwrap()
    }

    #[test]
    fn skybox_params_uniform_is_pod_and_padded() {
        assert_eq!(std::mem::size_of::<SkyboxParamsUniform>(), 32);

        let uniform = SkyboxParamsUniform::new([1280.0, 720.0], [12.0, 708.0], 1.5);
        let bytes: &[u8] = bytemuck::cast_slice(std::slice::from_ref(&uniform));
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn tone_map_flag_selects_the_tone_mapping_block() {
        let tera = shader_templates();

        let plain = tera
            .render(
                "skybox/skybox.frag",
                &tera::Context::from_serialize(SkyboxTemplateConfiguration { tone_map: false })
                    .unwrap(),
            )
            .unwrap();
        let tone_mapped = tera
            .render(
                "skybox/skybox.frag",
                &tera::Context::from_serialize(SkyboxTemplateConfiguration { tone_map: true })
                    .unwrap(),
            )
            .unwrap();

        assert!(plain.contains("fn fs_main"));
        assert!(!plain.contains("tone_mapped"));
        assert!(tone_mapped.contains("tone_mapped"));
    }
}
