//! SDL2 and OpenGL window management.
//!
//! Bring-up happens in two steps. [`Window::new`] initialises SDL and opens the window,
//! then [`Window::load_opengl`] creates the context and loads the GL function pointers,
//! producing a [`GlWindow`], the SDL implementation of [`FrameWindow`].

use std::rc::Rc;

use sdl2::{event::Event, keyboard::Keycode, video::GLProfile};

use super::{Gpu, GpuContext};
use crate::{
    config::WindowConfig,
    error::{Error, Result},
};

/// An SDL window without an OpenGL context yet.
pub struct Window {
    sdl: sdl2::Sdl,
    video: sdl2::VideoSubsystem,
    window: sdl2::video::Window,
    event_pump: sdl2::EventPump,
}

impl Window {
    /// Initialises SDL and creates the window described by `config`.
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let sdl = sdl2::init().map_err(Error::Window)?;
        let video = sdl.video().map_err(Error::Window)?;

        {
            let gl_attr = video.gl_attr();
            gl_attr.set_context_profile(GLProfile::Core);
            gl_attr.set_context_version(config.gl_major, config.gl_minor);
            gl_attr.set_context_flags().forward_compatible().set();
            gl_attr.set_double_buffer(true);
            gl_attr.set_depth_size(24);
        }

        let mut builder = video.window(&config.title, config.width, config.height);
        builder.opengl().position_centered();
        if config.resizable {
            builder.resizable();
        }
        let window = builder
            .build()
            .map_err(|e| Error::Window(e.to_string()))?;
        let event_pump = sdl.event_pump().map_err(Error::Window)?;

        Ok(Self {
            sdl,
            video,
            window,
            event_pump,
        })
    }

    /// Creates the OpenGL context, loads the function pointers and sets the viewport.
    ///
    /// Fails if the driver only provides an older version than `config` asks for.
    pub fn load_opengl(self, config: &WindowConfig) -> Result<GlWindow> {
        let gl_context = self
            .window
            .gl_create_context()
            .map_err(Error::OpenGlLoad)?;
        self.window
            .gl_make_current(&gl_context)
            .map_err(Error::OpenGlLoad)?;

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                self.video.gl_get_proc_address(s) as *const _
            })
        };

        let version = glow::HasContext::version(&gl);
        let requested = (u32::from(config.gl_major), u32::from(config.gl_minor));
        if version.is_embedded || (version.major, version.minor) < requested {
            return Err(Error::OpenGlLoad(format!(
                "OpenGL {}.{} core is required, the driver provides {}.{}{}",
                requested.0,
                requested.1,
                version.major,
                version.minor,
                if version.is_embedded { " ES" } else { "" }
            )));
        }
        log::info!(
            "loaded OpenGL {}.{} ({})",
            version.major,
            version.minor,
            version.vendor_info
        );

        if config.vsync {
            if let Err(e) = self
                .video
                .gl_set_swap_interval(sdl2::video::SwapInterval::VSync)
            {
                log::warn!("vsync unavailable: {}", e);
            }
        }

        let gl = Rc::new(gl);
        let (width, height) = self.window.drawable_size();
        gl.viewport(0, 0, width as i32, height as i32);

        Ok(GlWindow {
            gl,
            _gl_context: gl_context,
            window: self.window,
            event_pump: self.event_pump,
            _video: self.video,
            _sdl: self.sdl,
        })
    }
}

/// What the frame loop needs from a window with a current OpenGL context.
pub trait FrameWindow {
    /// A handle to the context for the resource loaders.
    fn gpu(&self) -> GpuContext;

    /// Drains pending events. Returns `true` once the window has been asked to close.
    fn poll_events(&mut self) -> bool;

    /// Presents the back buffer. May block on vsync.
    fn swap_buffers(&self);

    /// Destroys the context and the window.
    ///
    /// Every resource created through [`FrameWindow::gpu`] must be dropped first.
    fn close(self)
    where
        Self: Sized;
}

/// A window with a current OpenGL context.
///
/// Fields drop in declaration order, so the context goes before the window and SDL
/// shuts down last.
pub struct GlWindow {
    gl: Rc<glow::Context>,
    _gl_context: sdl2::video::GLContext,
    window: sdl2::video::Window,
    event_pump: sdl2::EventPump,
    _video: sdl2::VideoSubsystem,
    _sdl: sdl2::Sdl,
}

impl FrameWindow for GlWindow {
    fn gpu(&self) -> GpuContext {
        self.gl.clone()
    }

    fn poll_events(&mut self) -> bool {
        let mut close = false;
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => close = true,
                Event::KeyDown { keycode, .. } if keycode == Some(Keycode::Escape) => {
                    close = true
                }
                Event::Window {
                    win_event: sdl2::event::WindowEvent::Resized(width, height),
                    ..
                } => {
                    self.gl.viewport(0, 0, width, height);
                }
                _ => {}
            }
        }
        close
    }

    fn swap_buffers(&self) {
        self.window.gl_swap_window();
    }

    fn close(self) {
        if Rc::strong_count(&self.gl) > 1 {
            log::warn!("closing the window while GPU resources are still alive");
        }
        drop(self);
    }
}
