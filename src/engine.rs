//! Fixed-tick driver for a [`SceneGraph`].
//!
//! Every tick runs under the scene lock: `update`, which applies posted
//! jobs first, and then `render`. The display list is copied out before the
//! lock is released and handed to the [`Presenter`]. The loop sleeps until
//! the next due time, so a slow frame shortens the following sleep instead
//! of shifting every later frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::jobs::SceneJob;
use crate::render::DrawCommand;
use crate::scene::SceneGraph;

/// Shared access to the scene for hosts and collaborators.
pub type SceneHandle = Arc<Mutex<SceneGraph>>;

/// Lock a scene handle. A panic on another thread does not make the scene
/// unusable.
pub fn lock_scene(scene: &SceneHandle) -> MutexGuard<'_, SceneGraph> {
    scene.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Receives each finished frame.
pub trait Presenter {
    fn present(&mut self, commands: &[DrawCommand]);
}

impl<F: FnMut(&[DrawCommand])> Presenter for F {
    fn present(&mut self, commands: &[DrawCommand]) {
        self(commands)
    }
}

/// Frames per second, measured over one-second windows.
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    pub frames: u64,
    pub fps: u32,
    window_start: Instant,
    window_frames: u32,
}

impl FrameStats {
    fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            fps: 0,
            window_start: now,
            window_frames: 0,
        }
    }

    fn frame(&mut self, now: Instant) {
        self.frames += 1;
        self.window_frames += 1;
        if now.duration_since(self.window_start) >= Duration::from_secs(1) {
            self.fps = self.window_frames;
            self.window_frames = 0;
            self.window_start = now;
            log::debug!("{} fps", self.fps);
        }
    }
}

/// Cloneable flag that ends [`Engine::run`] after the current tick.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Engine {
    scene: SceneHandle,
    stop: StopHandle,
    frame_interval: Duration,
    max_frames: Option<u64>,
}

impl Engine {
    pub fn new(scene: SceneGraph) -> Self {
        let frame_interval = Duration::from_millis(scene.config().frame_interval_ms());
        Self {
            scene: Arc::new(Mutex::new(scene)),
            stop: StopHandle::default(),
            frame_interval,
            max_frames: None,
        }
    }

    /// Stop on its own after `frames` ticks.
    pub fn max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn scene(&self) -> SceneHandle {
        Arc::clone(&self.scene)
    }

    /// Post a job from any thread. It is applied at the start of the next
    /// tick.
    pub fn post(&self, job: SceneJob) {
        lock_scene(&self.scene).post(job);
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// One locked update and render. Returns the frame's display list.
    pub fn tick(&self, now_ms: u64) -> Vec<DrawCommand> {
        let mut scene = lock_scene(&self.scene);
        scene.update(now_ms);
        scene.render().to_vec()
    }

    /// Run until stopped. Initializes logging if the host has not.
    pub fn run<P: Presenter>(&self, presenter: &mut P) -> FrameStats {
        let _ = env_logger::try_init();
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        let mut due = start;
        log::info!(
            "Engine running at {} ms per frame",
            self.frame_interval.as_millis()
        );

        loop {
            if self.stop.is_stopped() || self.max_frames.is_some_and(|max| stats.frames >= max) {
                break;
            }
            let now_ms = start.elapsed().as_millis() as u64;
            let commands = self.tick(now_ms);
            presenter.present(&commands);
            stats.frame(Instant::now());

            due += self.frame_interval;
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            } else {
                // Behind schedule: start counting again from now.
                due = now;
            }
        }
        log::info!("Engine stopped after {} frames", stats.frames);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::StatusMessage;
    use crate::text::MonospaceMeasurer;

    fn engine() -> Engine {
        let mut scene =
            SceneGraph::new(SceneConfig::default()).with_measurer(MonospaceMeasurer::default());
        scene.set_window_size(1400.0, 800.0);
        Engine::new(scene).frame_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_run_stops_after_max_frames() {
        let engine = engine().max_frames(5);
        let mut presented = 0;
        let stats = engine.run(&mut |commands: &[DrawCommand]| {
            assert!(!commands.is_empty());
            presented += 1;
        });
        assert_eq!(stats.frames, 5);
        assert_eq!(presented, 5);
    }

    #[test]
    fn test_jobs_are_applied_inside_the_tick() {
        let engine = engine();
        let scene = engine.scene();
        std::thread::spawn(move || {
            lock_scene(&scene).post(SceneJob::Import("Feature: Jobs\n    Scenario: s\n".into()));
        })
        .join()
        .unwrap();
        assert!(lock_scene(&engine.scene()).find_node("Jobs").is_none());
        engine.tick(0);
        engine.post(SceneJob::Status("Run queued".into()));
        engine.tick(20);
        let scene = engine.scene();
        let scene = lock_scene(&scene);
        assert_eq!(scene.features().len(), 1);
        assert!(scene.find_node("Jobs").is_some());
        assert_eq!(scene.status().map(StatusMessage::text), Some("Run queued"));
    }

    #[test]
    fn test_stop_handle_ends_the_loop() {
        let engine = engine();
        let stop = engine.stop_handle();
        let stats = engine.run(&mut |_: &[DrawCommand]| stop.stop());
        assert_eq!(stats.frames, 1);
    }
}
