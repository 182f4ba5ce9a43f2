use std::num::NonZeroU32;
use std::rc::Rc;

use glow::HasContext;
use glutin::{
    config::{ConfigTemplateBuilder, GlConfig},
    context::{
        ContextApi, ContextAttributesBuilder, NotCurrentGlContext, PossiblyCurrentContext, Version,
    },
    display::{GetGlDisplay, GlDisplay},
    surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use glutin_winit::DisplayBuilder;
use hum_render::{Color, RenderError, RenderSurface};
use raw_window_handle::HasWindowHandle;
use serde::{Deserialize, Serialize};
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes},
};

use crate::error::GlError;

/// Window creation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
    /// Synchronize presents with the display refresh.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Playground".to_owned(),
            width: 512,
            height: 512,
            vsync: true,
        }
    }
}

/// Desktop window with a current OpenGL 3.3 core context.
pub struct GlWindow {
    window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    gl: Rc<glow::Context>,
}

impl GlWindow {
    pub fn new(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Self, GlError> {
        let window_attrs = WindowAttributes::default()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height));

        let config_template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(24);

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attrs))
            .build(event_loop, config_template, |configs| {
                // glutin only calls the picker with at least one config
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() { config } else { accum }
                    })
                    .expect("no GL config offered")
            })
            .map_err(GlError::window)?;

        let window = window.ok_or_else(|| GlError::window("display builder created no window"))?;
        let raw_handle = window.window_handle().map_err(GlError::window)?.as_raw();
        let gl_display = gl_config.display();

        let context_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_handle));
        let not_current_context = unsafe { gl_display.create_context(&gl_config, &context_attrs) }
            .map_err(GlError::window)?;

        let (width, height) = non_zero(window.inner_size())
            .ok_or_else(|| GlError::window("window has zero size"))?;
        let surface_attrs =
            SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_handle, width, height);
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attrs) }
            .map_err(GlError::window)?;

        let gl_context = not_current_context
            .make_current(&gl_surface)
            .map_err(GlError::window)?;

        let interval = if config.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = gl_surface.set_swap_interval(&gl_context, interval) {
            tracing::warn!(%err, "failed to set swap interval");
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| gl_display.get_proc_address(name))
        };
        tracing::info!(
            title = %config.title,
            width = width.get(),
            height = height.get(),
            "GL window created"
        );

        Ok(Self {
            window,
            gl_context,
            gl_surface,
            gl: Rc::new(gl),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn gl(&self) -> &Rc<glow::Context> {
        &self.gl
    }

    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Resize the surface and viewport. Zero sizes (minimized) are ignored.
    pub fn resize(&self, new_size: PhysicalSize<u32>) {
        let Some((width, height)) = non_zero(new_size) else {
            return;
        };
        self.gl_surface.resize(&self.gl_context, width, height);
        unsafe {
            self.gl
                .viewport(0, 0, new_size.width as i32, new_size.height as i32)
        };
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl RenderSurface for GlWindow {
    fn prepare(&mut self) -> Result<(), RenderError> {
        let (width, height) = self.physical_size();
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
            self.gl.enable(glow::DEPTH_TEST);
            // equal depths keep painter's order for coplanar drawables
            self.gl.depth_func(glow::LEQUAL);
            self.gl.enable(glow::BLEND);
            self.gl
                .blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        }
        Ok(())
    }

    fn set_clear_color(&mut self, color: Color) {
        let [r, g, b, a] = opaque(color);
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&mut self) {
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT)
        };
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .map_err(|err| RenderError::Surface(err.to_string()))
    }
}

/// The window is never composited translucently, so clears are opaque.
fn opaque(color: Color) -> [f32; 4] {
    let c = color.to_vec4();
    [c.x, c.y, c.z, 1.0]
}

fn non_zero(size: PhysicalSize<u32>) -> Option<(NonZeroU32, NonZeroU32)> {
    Some((NonZeroU32::new(size.width)?, NonZeroU32::new(size.height)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_matches_playground() {
        let config = WindowConfig::default();
        assert_eq!((config.width, config.height), (512, 512));
        assert!(config.vsync);
    }

    #[test]
    fn clear_color_ignores_alpha() {
        let [r, _, _, a] = opaque(Color::new(0xff, 0, 0, 0x40));
        assert_eq!(r, 1.0);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(non_zero(PhysicalSize::new(0, 10)).is_none());
        assert!(non_zero(PhysicalSize::new(10, 0)).is_none());
        let (w, h) = non_zero(PhysicalSize::new(3, 4)).unwrap();
        assert_eq!((w.get(), h.get()), (3, 4));
    }
}
