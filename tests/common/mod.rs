#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use bevy_app::App;
use bevy_math::prelude::*;
use bevy_sphere_cam::prelude::*;
use bevy_time::{TimePlugin, TimeUpdateStrategy};

/// Frame length used by the test apps.
pub const FRAME: Duration = Duration::from_millis(50);

/// A headless app with the controller plugins and a manually stepped clock.
pub fn app() -> App {
    let mut app = App::new();
    app.add_plugins((TimePlugin, DefaultSphereCamPlugins))
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app
}

/// Run enough frames for `duration` of app time to pass.
pub fn run_for(app: &mut App, duration: Duration) {
    let frames = duration.as_millis().div_ceil(FRAME.as_millis()) + 1;
    for _ in 0..frames {
        app.update();
    }
}

/// Records everything that happens to a player and its surfaces.
#[derive(Default, Clone)]
pub struct FakePlayer {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub playing: Arc<AtomicBool>,
}

impl FakePlayer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

struct FakeSurface {
    player: FakePlayer,
}

impl VideoSurface for FakeSurface {
    fn play(&mut self) {
        self.player.calls.lock().unwrap().push("surface play".into());
        self.player.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&mut self) {
        self.player.calls.lock().unwrap().push("surface pause".into());
        self.player.playing.store(false, Ordering::SeqCst);
    }
}

impl PlaybackHandle for FakePlayer {
    fn create_surface(&self, video_size: UVec2) -> Box<dyn VideoSurface> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("surface {}x{}", video_size.x, video_size.y));
        Box::new(FakeSurface {
            player: self.clone(),
        })
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn log(&self, event: PlaybackEvent) {
        self.calls.lock().unwrap().push(format!("log {event:?}"));
    }
}

/// Attach a fresh fake player and run one frame.
pub fn attach(app: &mut App) -> FakePlayer {
    let player = FakePlayer::default();
    app.world_mut()
        .send_event(PlaybackRequest::attach(Arc::new(player.clone())));
    app.update();
    player
}
