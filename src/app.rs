//! Application lifecycle.

use std::fmt;

use crate::{
    abs::{FrameWindow, GlWindow, Window},
    config::Config,
    error::Result,
    time::Time,
    workbench::Workbench,
};

/// The stages the application moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    InitWindow,
    LoadOpenGl,
    Setup,
    MainLoop,
    Teardown,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::InitWindow => "init window",
            Phase::LoadOpenGl => "load OpenGL",
            Phase::Setup => "setup",
            Phase::MainLoop => "main loop",
            Phase::Teardown => "teardown",
            Phase::Cleanup => "cleanup",
        })
    }
}

/// Drives the window, the GL context and the workbench from start to exit.
pub struct MainApp {
    config: Config,
    phases: Vec<Phase>,
    time: Time,
}

impl MainApp {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            phases: Vec::new(),
            time: Time::new(),
        }
    }

    /// The phase currently running, `None` before [`MainApp::run`].
    pub fn phase(&self) -> Option<Phase> {
        self.phases.last().copied()
    }

    /// Every phase entered so far, in order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Opens the SDL window, runs every phase and returns once the window closes.
    pub fn run(mut self) -> Result<()> {
        let window = self.open_window()?;
        self.run_in(window)
    }

    fn open_window(&mut self) -> Result<GlWindow> {
        self.enter(Phase::InitWindow);
        let window = Window::new(&self.config.window)?;
        self.enter(Phase::LoadOpenGl);
        window.load_opengl(&self.config.window)
    }

    /// Setup, frame loop, teardown and cleanup on an open window.
    ///
    /// The window is closed whatever happens. Once setup has succeeded, teardown runs
    /// even if the loop fails.
    fn run_in<W: FrameWindow>(&mut self, mut window: W) -> Result<()> {
        self.enter(Phase::Setup);
        let mut workbench = match Workbench::setup(&window.gpu(), &self.config) {
            Ok(workbench) => workbench,
            Err(e) => {
                self.enter(Phase::Cleanup);
                window.close();
                return Err(e);
            }
        };

        let result = self.main_loop(&mut window, &mut workbench);
        if let Err(e) = &result {
            log::error!("main loop stopped: {}", e);
        }

        self.enter(Phase::Teardown);
        workbench.teardown();

        self.enter(Phase::Cleanup);
        drop(workbench);
        window.close();
        result
    }

    fn enter(&mut self, phase: Phase) {
        log::info!("{}", phase);
        self.phases.push(phase);
    }

    fn main_loop<W: FrameWindow>(
        &mut self,
        window: &mut W,
        workbench: &mut Workbench,
    ) -> Result<()> {
        self.enter(Phase::MainLoop);
        self.time.init();
        let mut frames: u64 = 0;
        while !window.poll_events() {
            self.time.update();
            workbench.update(self.time.delta_time())?;
            window.swap_buffers();
            frames += 1;
        }
        log::debug!("rendered {} frames in {:.1}s", frames, workbench.elapsed());
        Ok(())
    }
}
