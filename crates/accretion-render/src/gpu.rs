//! wgpu implementation of the device traits
//!
//! [`WgpuDevice`] is the explicit render context: device, queue, compiled
//! kernel, parameter buffer, bind group and pipeline all live here and are
//! released together when it is dropped. Output goes either to a window
//! surface or to an offscreen sRGB texture that can be read back.

use crate::device::{DeviceProvider, KernelDevice};
use crate::error::{FrameError, InitError, RenderError};
use crate::overlay::HudOverlay;
use crate::shader::{Diagnostic, FRAGMENT_ENTRY, Severity, VERTEX_ENTRY};
use accretion_core::ParameterBlock;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use winit::window::Window;

/// Format of offscreen targets; sRGB like the window surface
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

enum Target {
    Window(Arc<Window>),
    Offscreen,
}

/// Acquires high-performance wgpu devices for a window or for offscreen use
pub struct WgpuProvider {
    instance: wgpu::Instance,
    target: Target,
    hud: bool,
}

impl WgpuProvider {
    /// Render into `window`, with the HUD overlay on
    pub fn for_window(window: Arc<Window>) -> Self {
        Self {
            instance: new_instance(),
            target: Target::Window(window),
            hud: true,
        }
    }

    /// Render into an offscreen texture, HUD off
    pub fn headless() -> Self {
        Self {
            instance: new_instance(),
            target: Target::Offscreen,
            hud: false,
        }
    }

    #[must_use]
    pub fn with_hud(mut self, enabled: bool) -> Self {
        self.hud = enabled;
        self
    }
}

fn new_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

impl DeviceProvider for WgpuProvider {
    type Device = WgpuDevice;

    fn acquire(&mut self) -> impl Future<Output = Result<WgpuDevice, InitError>> {
        async move {
            if wgpu::Instance::enabled_backend_features().is_empty() {
                return Err(InitError::UnsupportedDevice(
                    "no graphics backend is available on this host".into(),
                ));
            }

            let surface = match &self.target {
                Target::Window(window) => Some(
                    self.instance
                        .create_surface(Arc::clone(window))
                        .map_err(|err| InitError::UnsupportedDevice(err.to_string()))?,
                ),
                Target::Offscreen => None,
            };

            let adapter = self
                .instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: surface.as_ref(),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|err| {
                    tracing::warn!(%err, "Adapter request failed");
                    InitError::NoAdapter
                })?;
            let info = adapter.get_info();
            tracing::info!(adapter = %info.name, backend = ?info.backend, "Using adapter");

            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("Accretion Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                    trace: wgpu::Trace::Off,
                })
                .await
                .map_err(|err| InitError::DeviceRequest(err.to_string()))?;

            let lost = Arc::new(AtomicBool::new(false));
            let lost_flag = Arc::clone(&lost);
            device.set_device_lost_callback(move |reason, message| {
                // Dropping the device on teardown also reports a loss
                if !matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                    tracing::error!(?reason, %message, "Device lost");
                    lost_flag.store(true, Ordering::SeqCst);
                }
            });

            let (output, format) = match surface {
                Some(surface) => {
                    let caps = surface.get_capabilities(&adapter);
                    let format = caps
                        .formats
                        .iter()
                        .copied()
                        .find(wgpu::TextureFormat::is_srgb)
                        .or_else(|| caps.formats.first().copied())
                        .ok_or_else(|| {
                            InitError::UnsupportedDevice("surface reports no usable format".into())
                        })?;
                    (
                        Output::Surface {
                            surface,
                            config: None,
                        },
                        format,
                    )
                }
                None => (Output::Offscreen { texture: None }, OFFSCREEN_FORMAT),
            };
            tracing::debug!(?format, "Output format selected");

            Ok(WgpuDevice {
                device,
                queue,
                output,
                format,
                module: None,
                resources: None,
                size: (0, 0),
                lost,
                hud_enabled: self.hud,
                hud: None,
            })
        }
    }
}

enum Output {
    Surface {
        surface: wgpu::Surface<'static>,
        config: Option<wgpu::SurfaceConfiguration>,
    },
    Offscreen {
        texture: Option<wgpu::Texture>,
    },
}

struct Resources {
    parameter_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

/// A wgpu device with the raymarching pipeline
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    output: Output,
    format: wgpu::TextureFormat,
    module: Option<wgpu::ShaderModule>,
    resources: Option<Resources>,
    size: (u32, u32),
    lost: Arc<AtomicBool>,
    hud_enabled: bool,
    hud: Option<HudOverlay>,
}

fn to_diagnostic(message: &wgpu::CompilationMessage) -> Diagnostic {
    let severity = match message.message_type {
        wgpu::CompilationMessageType::Error => Severity::Error,
        wgpu::CompilationMessageType::Warning => Severity::Warning,
        wgpu::CompilationMessageType::Info => Severity::Info,
    };
    Diagnostic {
        severity,
        message: message.message.clone(),
        line: message.location.as_ref().map(|location| location.line_number),
    }
}

impl KernelDevice for WgpuDevice {
    fn compile_kernel(&mut self, source: &str) -> impl Future<Output = Vec<Diagnostic>> {
        async move {
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = self
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Raymarching Kernel"),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });
            let info = module.get_compilation_info().await;
            let mut diagnostics: Vec<Diagnostic> =
                info.messages.iter().map(to_diagnostic).collect();

            if let Some(err) = self.device.pop_error_scope().await {
                if !diagnostics.iter().any(Diagnostic::is_error) {
                    diagnostics.push(Diagnostic::error(err.to_string()));
                }
            }
            if !diagnostics.iter().any(Diagnostic::is_error) {
                self.module = Some(module);
            }
            diagnostics
        }
    }

    fn create_resources(&mut self, block_size: u64) -> Result<(), InitError> {
        let module = self
            .module
            .as_ref()
            .ok_or(InitError::InvalidState("the kernel is not compiled"))?;

        let parameter_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Parameter Block"),
            size: block_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Parameter Block Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(block_size),
                        },
                        count: None,
                    }],
                });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Parameter Block Binding"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: parameter_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Raymarching Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Raymarching Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
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
            });

        self.resources = Some(Resources {
            parameter_buffer,
            bind_group,
            pipeline,
        });
        if self.hud_enabled {
            self.hud = Some(HudOverlay::new(&self.device, &self.queue, self.format));
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let max = self.device.limits().max_texture_dimension_2d;
        let (width, height) = (width.clamp(1, max), height.clamp(1, max));
        self.size = (width, height);
        let format = self.format;

        match &mut self.output {
            Output::Surface { surface, config } => {
                let config = config.get_or_insert_with(|| wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width,
                    height,
                    present_mode: wgpu::PresentMode::AutoVsync,
                    alpha_mode: wgpu::CompositeAlphaMode::Auto,
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                });
                config.width = width;
                config.height = height;
                surface.configure(&self.device, config);
            }
            Output::Offscreen { texture } => {
                *texture = Some(self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("Offscreen Target"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                }));
            }
        }
    }

    fn submit_frame(&mut self, block: &ParameterBlock) -> Result<(), FrameError> {
        if self.is_lost() {
            return Err(FrameError::DeviceLost("device reported lost".into()));
        }
        let Some(resources) = &self.resources else {
            return Err(FrameError::Skipped("render resources not created".into()));
        };

        let (frame, view) = match &self.output {
            Output::Surface {
                surface,
                config: Some(config),
            } => match surface.get_current_texture() {
                Ok(frame) => {
                    let view = frame
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    (Some(frame), view)
                }
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    surface.configure(&self.device, config);
                    return Err(FrameError::Skipped("surface outdated, reconfigured".into()));
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    return Err(FrameError::DeviceLost("out of memory".into()));
                }
                Err(err) => return Err(FrameError::Skipped(err.to_string())),
            },
            Output::Offscreen {
                texture: Some(texture),
            } => (
                None,
                texture.create_view(&wgpu::TextureViewDescriptor::default()),
            ),
            _ => return Err(FrameError::Skipped("output not sized yet".into())),
        };

        self.queue
            .write_buffer(&resources.parameter_buffer, 0, bytemuck::bytes_of(block));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Raymarching Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&resources.pipeline);
            render_pass.set_bind_group(0, &resources.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Full-screen triangle
        }

        if let Some(hud) = self.hud.as_mut() {
            let (width, height) = self.size;
            hud.update(block);
            hud.render(&self.device, &self.queue, &mut encoder, &view, width, height);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
        Ok(())
    }

    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}

impl WgpuDevice {
    /// Block until all submitted work has finished
    pub fn wait_idle(&self) {
        if let Err(err) = self.device.poll(wgpu::PollType::Wait) {
            tracing::warn!(%err, "Waiting for the device failed");
        }
    }

    /// Copy the offscreen target back into host memory
    pub fn read_pixels(&self) -> Result<image::RgbaImage, RenderError> {
        let Output::Offscreen {
            texture: Some(texture),
        } = &self.output
        else {
            return Err(RenderError::Readback(
                "only sized offscreen targets can be read back".into(),
            ));
        };
        let (width, height) = self.size;

        let bytes_per_pixel = 4u32;
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let buffer_size = u64::from(padded_bytes_per_row) * u64::from(height);

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| RenderError::Readback(err.to_string()))?;
        rx.recv()
            .map_err(|err| RenderError::Readback(err.to_string()))?
            .map_err(|err| RenderError::Readback(err.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        {
            let data = buffer_slice.get_mapped_range();
            // Strip the row padding
            for row in data.chunks_exact(padded_bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
            }
        }
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::Readback("pixel buffer does not match output size".into()))
    }
}
