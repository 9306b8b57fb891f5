//! # Graphics Resources Builder
//!
//! Creates the window and the WGPU context the renderer draws with.
//!
//! The main components are:
//! - `Graphics`: the window, surface and device handed to the engine
//! - `GraphicsBuilder`: builds `Graphics` once and sends it through the event loop
//! - `MaybeGraphics`: the states of graphics initialization

use std::future::Future;
use std::sync::Arc;

use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::Window,
};

use crate::engine_state::error::InitializationError;

/// Result of graphics initialization, delivered as the event loop's user event.
pub type GraphicsEvent = Result<Graphics, InitializationError>;

/// Graphics resources the engine takes ownership of.
pub struct Graphics {
    pub window: Arc<Window>,
    pub surface: Surface<'static>,
    pub surface_config: SurfaceConfiguration,
    pub device: Device,
    pub queue: Queue,
}

/// Picks a surface format that stores vertex colors as given.
///
/// Non-sRGB formats are preferred so colors are written without gamma encoding.
fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

/// Creates the window, then asynchronously the adapter, device and configured surface.
fn create_graphics(
    event_loop: &ActiveEventLoop,
    window_title: &str,
) -> Result<impl Future<Output = GraphicsEvent> + 'static, InitializationError> {
    let window_attrs = Window::default_attributes().with_title(window_title);
    let window = Arc::new(
        event_loop
            .create_window(window_attrs)
            .map_err(|error| InitializationError::Window(error.to_string()))?,
    );

    // The instance is a handle to our GPU
    // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        flags: wgpu::InstanceFlags::empty(),
        backend_options: wgpu::BackendOptions::from_env_or_default(),
    });

    let surface = instance
        .create_surface(window.clone())
        .map_err(|error| InitializationError::Window(error.to_string()))?;

    Ok(async move {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|error| InitializationError::NoAdapter(error.to_string()))?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                label: None,
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|error| InitializationError::Device(error.to_string()))?;

        let size = window.inner_size();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&surface_caps.formats)
            .ok_or(InitializationError::UnsupportedSurface)?;
        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok::<_, InitializationError>(Graphics {
            window,
            surface,
            surface_config,
            device,
            queue,
        })
    })
}

/// Builds the graphics resources once and sends them back through the event loop.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<GraphicsEvent>>,
    window_title: String,
}

/// Represents the possible states of the graphics initialization process.
pub enum MaybeGraphics {
    /// Waiting for the first `resumed`
    Builder(GraphicsBuilder),
    /// Graphics handed to the engine, or initialization failed
    Moved,
}

impl GraphicsBuilder {
    pub fn new(event_loop_proxy: EventLoopProxy<GraphicsEvent>, window_title: &str) -> Self {
        Self {
            event_loop_proxy: Some(event_loop_proxy),
            window_title: window_title.to_string(),
        }
    }

    /// Blocks on graphics initialization and sends the result to the event loop.
    pub fn build_and_send(&mut self, event_loop: &ActiveEventLoop) {
        let Some(event_loop_proxy) = self.event_loop_proxy.take() else {
            // event_loop_proxy is already spent - we already constructed Graphics
            return;
        };

        let gfx = match create_graphics(event_loop, &self.window_title) {
            Ok(gfx_fut) => pollster::block_on(gfx_fut),
            Err(error) => Err(error),
        };
        if event_loop_proxy.send_event(gfx).is_err() {
            log::error!("Event loop closed before graphics were delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn prefers_linear_formats() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [TextureFormat::Rgba8UnormSrgb, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(
            choose_surface_format(&formats),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(choose_surface_format(&[]), None);
    }
}
