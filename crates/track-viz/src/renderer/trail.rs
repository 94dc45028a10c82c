//! Persistent trail surface for dream mode.
//!
//! Uses ping-pong textures: each frame the previous trail is redrawn slightly
//! zoomed and faded, the dream layers draw on top, and the result is
//! alpha-composited onto the window over the scene.

use nannou::prelude::*;
use nannou::wgpu;

/// Vertex for fullscreen quad
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct TrailVertex {
    position: [f32; 2],
    tex_coords: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    retain: f32,
    zoom: f32,
    _padding: [f32; 2],
}

const FULLSCREEN_QUAD: [TrailVertex; 6] = [
    TrailVertex {
        position: [-1.0, -1.0],
        tex_coords: [0.0, 1.0],
    },
    TrailVertex {
        position: [1.0, -1.0],
        tex_coords: [1.0, 1.0],
    },
    TrailVertex {
        position: [1.0, 1.0],
        tex_coords: [1.0, 0.0],
    },
    TrailVertex {
        position: [-1.0, -1.0],
        tex_coords: [0.0, 1.0],
    },
    TrailVertex {
        position: [1.0, 1.0],
        tex_coords: [1.0, 0.0],
    },
    TrailVertex {
        position: [-1.0, 1.0],
        tex_coords: [0.0, 0.0],
    },
];

const TRAIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

pub struct TrailRenderer {
    textures: [wgpu::Texture; 2],
    texture_views: [wgpu::TextureView; 2],
    current_idx: usize,

    // Draws the dream layers into the current texture
    draw_renderer: nannou::draw::Renderer,

    fade_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_groups: [wgpu::BindGroup; 2],
    fullscreen_quad: wgpu::Buffer,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,

    /// Outward drift applied to the old trail each frame
    pub zoom: f32,
    // Drop the old trail on the next fade
    clear_pending: bool,

    size: [u32; 2],
}

impl TrailRenderer {
    /// Create a trail renderer.
    ///
    /// # Arguments
    /// * `size` - texture dimensions in physical pixels
    /// * `window_sample_count` - MSAA sample count of the window
    /// * `window_format` - texture format of the window frame
    pub fn new(
        device: &wgpu::Device,
        size: [u32; 2],
        zoom: f32,
        window_sample_count: u32,
        window_format: wgpu::TextureFormat,
    ) -> Self {
        let size = [size[0].max(1), size[1].max(1)];
        let textures = [
            Self::create_texture(device, size),
            Self::create_texture(device, size),
        ];
        let texture_views = [textures[0].view().build(), textures[1].view().build()];

        let draw_renderer = nannou::draw::RendererBuilder::new()
            .build_from_texture_descriptor(device, textures[0].descriptor());

        let sampler_desc = wgpu::SamplerBuilder::new()
            .mag_filter(wgpu::FilterMode::Linear)
            .min_filter(wgpu::FilterMode::Linear)
            .address_mode(wgpu::AddressMode::ClampToEdge)
            .into_descriptor();
        let sampler = device.create_sampler(&sampler_desc);

        let uniforms = Uniforms {
            retain: 0.0,
            zoom,
            _padding: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::BufferInitDescriptor {
            label: Some("Trail Uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Trail Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu_types::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_groups = Self::create_bind_groups(
            device,
            &bind_group_layout,
            &texture_views,
            &sampler,
            &uniform_buffer,
        );

        let fullscreen_quad = device.create_buffer_init(&wgpu::BufferInitDescriptor {
            label: Some("Trail Quad"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Trail Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/trail.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Trail Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let fade_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_fade",
            TRAIL_FORMAT,
            None,
            1,
        );
        let composite_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_composite",
            window_format,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            window_sample_count,
        );

        Self {
            textures,
            texture_views,
            current_idx: 0,
            draw_renderer,
            fade_pipeline,
            composite_pipeline,
            bind_group_layout,
            bind_groups,
            fullscreen_quad,
            sampler,
            uniform_buffer,
            zoom,
            clear_pending: true,
            size,
        }
    }

    fn create_texture(device: &wgpu::Device, size: [u32; 2]) -> wgpu::Texture {
        wgpu::TextureBuilder::new()
            .size(size)
            .usage(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
            .sample_count(1)
            .format(TRAIL_FORMAT)
            .build(device)
    }

    fn create_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        views: &[wgpu::TextureView; 2],
        sampler: &wgpu::Sampler,
        uniform_buffer: &wgpu::Buffer,
    ) -> [wgpu::BindGroup; 2] {
        let make = |view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Trail Bind Group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        [make(&views[0]), make(&views[1])]
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        fragment_entry: &str,
        format: wgpu::TextureFormat,
        blend: Option<wgpu::BlendState>,
        sample_count: u32,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(fragment_entry),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<TrailVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                        wgpu::VertexAttribute {
                            offset: 8,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: fragment_entry,
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            multiview: None,
        })
    }

    /// Forget the accumulated trail; the next frame starts from empty.
    pub fn reset(&mut self) {
        self.clear_pending = true;
    }

    /// Handle window resize by recreating textures. Resets the trail.
    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        let size = [size[0].max(1), size[1].max(1)];
        if size == self.size {
            return;
        }
        self.size = size;

        self.textures = [
            Self::create_texture(device, size),
            Self::create_texture(device, size),
        ];
        self.texture_views = [
            self.textures[0].view().build(),
            self.textures[1].view().build(),
        ];
        self.draw_renderer = nannou::draw::RendererBuilder::new()
            .build_from_texture_descriptor(device, self.textures[0].descriptor());
        self.bind_groups = Self::create_bind_groups(
            device,
            &self.bind_group_layout,
            &self.texture_views,
            &self.sampler,
            &self.uniform_buffer,
        );

        self.current_idx = 0;
        self.clear_pending = true;
    }

    /// Fade the previous trail by `retain`, draw `trail_draw` on top and
    /// composite the result onto `frame_view`.
    ///
    /// Everything is encoded into `encoder` so it lands between whatever the
    /// caller recorded before and after.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        trail_draw: &nannou::Draw,
        retain: f32,
        frame_view: &wgpu::TextureView,
    ) {
        let retain = if self.clear_pending { 0.0 } else { retain.clamp(0.0, 1.0) };
        self.clear_pending = false;
        let uniforms = Uniforms {
            retain,
            zoom: self.zoom,
            _padding: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let prev_idx = self.current_idx;
        let curr_idx = 1 - prev_idx;

        // Pass 1: previous trail, zoomed and faded, into the current texture
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Trail Fade Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.texture_views[curr_idx],
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.fade_pipeline);
            render_pass.set_bind_group(0, &self.bind_groups[prev_idx], &[]);
            render_pass.set_vertex_buffer(0, self.fullscreen_quad.slice(..));
            render_pass.draw(0..6, 0..1);
        }

        // Pass 2: this frame's dream layers on top
        self.draw_renderer
            .render_to_texture(device, encoder, trail_draw, &self.textures[curr_idx]);

        // Pass 3: blend the trail over the scene already in the frame
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Trail Composite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.composite_pipeline);
            render_pass.set_bind_group(0, &self.bind_groups[curr_idx], &[]);
            render_pass.set_vertex_buffer(0, self.fullscreen_quad.slice(..));
            render_pass.draw(0..6, 0..1);
        }

        self.current_idx = curr_idx;
    }
}
