//! Point renderer.
//!
//! Presents the particle positions as fixed-size screen-space quads in a
//! single colour, then blends the exit overlay over them. Positions are
//! uploaded only when the simulation marked the buffer dirty; the vertex
//! buffer is reallocated when the particle capacity grows.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use winit::window::Window;

use crate::config::RenderStyle;
use crate::error::GpuError;

const SHADER_SOURCE: &str = include_str!("points.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    color: [f32; 4],
    viewport: [f32; 2],
    point_size: f32,
    fade: f32,
}

/// GPU state for drawing the particle field.
pub struct PointRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    points_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    position_buffer: wgpu::Buffer,
    position_capacity: usize,
    point_count: u32,
    style: RenderStyle,
}

impl PointRenderer {
    pub async fn new(
        window: Arc<Window>,
        capacity: usize,
        style: RenderStyle,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("pmorph device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let position_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vec3>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        };

        let points_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            ("vs_points", "fs_points"),
            &[position_layout],
            None,
        );
        let overlay_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            ("vs_overlay", "fs_overlay"),
            &[],
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        let position_buffer = create_position_buffer(&device, capacity);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            points_pipeline,
            overlay_pipeline,
            uniform_buffer,
            uniform_bind_group,
            position_buffer,
            position_capacity: capacity,
            point_count: 0,
            style,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Copy the latest particle positions to the GPU.
    pub fn upload_positions(&mut self, positions: &[Vec3]) {
        if positions.len() > self.position_capacity {
            log::debug!(
                "growing position buffer {} -> {}",
                self.position_capacity,
                positions.len()
            );
            self.position_buffer = create_position_buffer(&self.device, positions.len());
            self.position_capacity = positions.len();
        }
        if !positions.is_empty() {
            self.queue
                .write_buffer(&self.position_buffer, 0, bytemuck::cast_slice(positions));
        }
        self.point_count = positions.len() as u32;
    }

    pub fn render(&mut self, view_proj: Mat4, fade: f32) -> Result<(), wgpu::SurfaceError> {
        let [r, g, b] = self.style.color;
        let uniforms = Uniforms {
            view_proj: view_proj.to_cols_array_2d(),
            color: [r, g, b, 1.0],
            viewport: [self.config.width as f32, self.config.height as f32],
            point_size: self.style.point_size,
            fade: fade.clamp(0.0, 1.0),
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [br, bg, bb] = self.style.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Points Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: br as f64,
                            g: bg as f64,
                            b: bb as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if self.point_count > 0 {
                render_pass.set_pipeline(&self.points_pipeline);
                render_pass.set_vertex_buffer(0, self.position_buffer.slice(..));
                render_pass.draw(0..6, 0..self.point_count);
            }

            if uniforms.fade > 0.0 {
                render_pass.set_pipeline(&self.overlay_pipeline);
                render_pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_position_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Position Buffer"),
        size: (capacity.max(1) * std::mem::size_of::<Vec3>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    (vs, fs): (&str, &str),
    buffers: &[wgpu::VertexBufferLayout],
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(vs),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: blend.or(Some(wgpu::BlendState::REPLACE)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        // mat4 (64) + vec4 (16) + vec2 (8) + 2 * f32 (8)
        assert_eq!(std::mem::size_of::<Uniforms>(), 96);
    }

    #[test]
    fn test_positions_are_tightly_packed() {
        let positions = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)];
        let bytes: &[u8] = bytemuck::cast_slice(&positions);
        assert_eq!(bytes.len(), 24);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_shader_declares_all_entry_points() {
        for entry in ["vs_points", "fs_points", "vs_overlay", "fs_overlay"] {
            assert!(SHADER_SOURCE.contains(&format!("fn {entry}(")), "missing {entry}");
        }
    }
}
