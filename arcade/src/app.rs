//! Glue between the frame loop and the hub.

use std::time::Duration;

use engine::FrameApp;
use engine::graphics::Renderer2d;
use engine::input::InputEvent;
use engine::surface::SurfaceSize;
use log::info;

use crate::env::ArcadeEnv;
use crate::hub::{Activity, HubScene};

pub struct ArcadeApp {
    env: ArcadeEnv,
    hub: HubScene,
    quit: bool,
}

impl ArcadeApp {
    /// Starts at the hub and runs the daily sign-in.
    pub fn new(mut env: ArcadeEnv) -> Self {
        let mut hub = HubScene::new();
        let today = env.today();
        if let Some(reward) = env.profile_mut().sign_in(today) {
            let streak = env.profile().record().sign_in_streak;
            info!("signed in for {today}: streak {streak}, +{reward} coins");
            hub.show_banner(format!("DAY {streak} SIGN-IN +{reward} COINS"));
        }
        Self {
            env,
            hub,
            quit: false,
        }
    }

    pub fn env(&self) -> &ArcadeEnv {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut ArcadeEnv {
        &mut self.env
    }

    pub fn hub(&self) -> &HubScene {
        &self.hub
    }

    pub fn launch(&mut self, activity: Activity) -> bool {
        self.hub.launch(activity, &mut self.env)
    }
}

impl FrameApp for ArcadeApp {
    fn handle_input(&mut self, event: InputEvent) {
        if matches!(event, InputEvent::Quit) {
            self.quit = true;
        }
        self.hub.handle_event(&event, &mut self.env);
    }

    fn update(&mut self, dt: Duration) {
        self.hub.update(dt, &mut self.env);
    }

    fn render(&mut self, gfx: &mut dyn Renderer2d) {
        self.hub.render(gfx, &mut self.env);
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.env.set_surface_size(size);
    }

    fn should_exit(&self) -> bool {
        self.quit || !self.hub.is_active()
    }
}
