//! HUD overlay rendering using glyphon
//!
//! Draws frame rate, view mode, wavelength band and simulated time on top of
//! the kernel output.

// u32 to i32 cast is safe for reasonable screen sizes
#![allow(clippy::cast_possible_wrap)]

use accretion_core::ParameterBlock;
use glyphon::{
    Attrs, Buffer, Cache, Color, Family, FontSystem, Metrics, Shaping, SwashCache, TextArea,
    TextAtlas, TextBounds, TextRenderer, Viewport,
};
use std::time::Instant;

/// Weight of the newest frame interval in the running average
const SMOOTHING: f32 = 0.1;

/// Distance of the HUD from the top-left corner, in pixels
const HUD_MARGIN: f32 = 10.0;

const HUD_COLOR: Color = Color::rgb(230, 230, 230);

/// Frame interval tracker with an exponentially smoothed frame time
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    last_frame: Option<Instant>,
    smoothed_ms: Option<f32>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a frame is being drawn now
    pub fn record(&mut self) {
        self.record_at(Instant::now());
    }

    fn record_at(&mut self, now: Instant) {
        if let Some(last) = self.last_frame.replace(now) {
            let ms = now.saturating_duration_since(last).as_secs_f32() * 1000.0;
            self.smoothed_ms = Some(match self.smoothed_ms {
                Some(avg) => avg + (ms - avg) * SMOOTHING,
                None => ms,
            });
        }
    }

    /// Smoothed frame time, once two frames have been seen
    pub fn frame_time_ms(&self) -> Option<f32> {
        self.smoothed_ms
    }

    pub fn fps(&self) -> Option<f32> {
        self.smoothed_ms.filter(|ms| *ms > 0.0).map(|ms| 1000.0 / ms)
    }
}

/// HUD text for one frame
pub fn hud_text(stats: &FrameStats, block: &ParameterBlock) -> String {
    let rate = match (stats.fps(), stats.frame_time_ms()) {
        (Some(fps), Some(ms)) => format!("{fps:.0} FPS ({ms:.1} ms)"),
        _ => "-- FPS".to_string(),
    };
    format!(
        "{rate}\n{} | {}\nt = {:.1}s",
        block.view_mode(),
        block.wavelength_band(),
        block.time
    )
}

/// Frame statistics overlay drawn with glyphon
pub struct HudOverlay {
    stats: FrameStats,
    fonts: FontSystem,
    glyphs: SwashCache,
    atlas: TextAtlas,
    renderer: TextRenderer,
    viewport: Viewport,
    text: Buffer,
    // Owns the pipelines shared by the atlas and viewport
    _cache: Cache,
}

impl HudOverlay {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let mut fonts = FontSystem::new();
        let cache = Cache::new(device);
        let mut atlas = TextAtlas::new(device, queue, &cache, format);
        let renderer =
            TextRenderer::new(&mut atlas, device, wgpu::MultisampleState::default(), None);
        let viewport = Viewport::new(device, &cache);

        // Unbounded: the HUD is as large as its three lines
        let mut text = Buffer::new(&mut fonts, Metrics::new(16.0, 20.0));
        text.set_size(&mut fonts, None, None);

        Self {
            stats: FrameStats::new(),
            fonts,
            glyphs: SwashCache::new(),
            atlas,
            renderer,
            viewport,
            text,
            _cache: cache,
        }
    }

    /// Count a frame and refresh the text from the block being rendered
    pub fn update(&mut self, block: &ParameterBlock) {
        self.stats.record();
        self.text.set_text(
            &mut self.fonts,
            &hud_text(&self.stats, block),
            &Attrs::new().family(Family::Monospace),
            Shaping::Advanced,
        );
        self.text.shape_until_scroll(&mut self.fonts, false);
    }

    /// Draw on top of `view` without clearing it
    ///
    /// Text failures only cost the overlay for this frame, so they are logged
    /// and swallowed.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        self.viewport
            .update(queue, glyphon::Resolution { width, height });

        let area = TextArea {
            buffer: &self.text,
            left: HUD_MARGIN,
            top: HUD_MARGIN,
            scale: 1.0,
            bounds: TextBounds {
                left: 0,
                top: 0,
                right: width as i32,
                bottom: height as i32,
            },
            default_color: HUD_COLOR,
            custom_glyphs: &[],
        };
        if let Err(err) = self.renderer.prepare(
            device,
            queue,
            &mut self.fonts,
            &mut self.atlas,
            &self.viewport,
            [area],
            &mut self.glyphs,
        ) {
            tracing::warn!(%err, "Failed to prepare HUD text");
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("HUD Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if let Err(err) = self.renderer.render(&self.atlas, &self.viewport, &mut pass) {
            tracing::warn!(%err, "Failed to render HUD text");
        }
        drop(pass);

        self.atlas.trim();
    }
}
