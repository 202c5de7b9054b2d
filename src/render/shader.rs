use anyhow::Result;

use crate::error::Error;
use crate::render::diagnostics::GpuErrorScope;

pub struct ShaderModulePackage {
    pub vertex_shader_module: wgpu::ShaderModule,
    pub fragment_shader_module: wgpu::ShaderModule,
}

impl ShaderModulePackage {
    pub fn from_templates<C: serde::Serialize + std::fmt::Debug>(
        vertex_template_name: &str,
        fragment_template_name: &str,
        name: &str,
        device: &wgpu::Device,
        tera: &tera::Tera,
        shader_template_config: Option<&C>,
    ) -> Result<Self> {
        let shader_template_context = match shader_template_config {
            Some(shader_template_config) => tera::Context::from_serialize(shader_template_config)?,
            None => tera::Context::new(),
        };

        let vertex_shader_source = ShaderModulePackage::render_shader(
            vertex_template_name,
            name,
            tera,
            &shader_template_context,
        )?;

        let fragment_shader_source = ShaderModulePackage::render_shader(
            fragment_template_name,
            name,
            tera,
            &shader_template_context,
        )?;

        if shader_template_config.is_some() {
            log::debug!(
                "Creating shader module package {name} from config: {:?}",
                shader_template_config
            );
        } else {
            log::debug!("Creating shader module package {name}");
        }

        let scope = GpuErrorScope::push(device, "shader module creation");

        let package = ShaderModulePackage {
            vertex_shader_module: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}_VERTEX_SHADER_MODULE", name)),
                source: wgpu::ShaderSource::Wgsl(vertex_shader_source.into()),
            }),
            fragment_shader_module: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}_FRAGMENT_SHADER_MODULE", name)),
                source: wgpu::ShaderSource::Wgsl(fragment_shader_source.into()),
            }),
        };

        let errors = scope.finish();
        if !errors.is_empty() {
            return Err(Error::ShaderCompile {
                name: String::from(name),
                message: errors.join("; "),
            }
            .into());
        }

        Ok(package)
    }

    fn render_shader(
        template_name: &str,
        name: &str,
        tera: &tera::Tera,
        template_context: &tera::Context,
    ) -> Result<String> {
        match tera.render(template_name, template_context) {
            Ok(shader_source) => Ok(shader_source),
            Err(error) => Err(Error::ShaderCompile {
                name: String::from(name),
                message: format!("template {template_name}: {error}"),
            }
            .into()),
        }
    }
}
