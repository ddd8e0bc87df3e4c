//! Thread-driven render loop.
//!
//! ```text
//!  Combined (one thread):
//!    loop { p.tick(t) p.render() c.tick(t) c.render() p.present(0) c.present(vsync) }
//!
//!  Split (two threads, coupled only through the SurfaceQueue):
//!    producer: loop { p.tick(t) p.render() p.present(0) }
//!    consumer: loop { c.tick(t) c.render() c.present(vsync) }
//! ```
//!
//! Cancellation is cooperative: the token is checked once per iteration,
//! so a blocked queue or fence wait is observed within its own timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::clock::Clock;
use crate::error::CoreError;
use crate::scene::{Scene, NO_VSYNC};

/// A scene moved onto a render thread.
pub type BoxedScene = Box<dyn Scene>;

/// How scenes are scheduled onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// One thread drives both scenes in lockstep.
    #[default]
    Combined,
    /// Each scene runs on its own thread at its own cadence.
    Split,
}

/// Shared abort flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// State handed to every loop thread: the shared clock, the abort token
/// and the consumer's vsync setting.
#[derive(Debug, Clone)]
pub struct RenderContext {
    clock: Arc<Clock>,
    cancel: CancellationToken,
    vsync: Arc<AtomicBool>,
}

impl RenderContext {
    pub fn new(vsync: bool) -> Self {
        Self {
            clock: Arc::new(Clock::new()),
            cancel: CancellationToken::new(),
            vsync: Arc::new(AtomicBool::new(vsync)),
        }
    }

    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Pause a running clock or resume a paused one. Returns `true` when
    /// the clock is now paused.
    pub fn toggle_pause(&self) -> bool {
        let paused = self.clock.toggle_pause();
        log::info!(
            "Clock {} at {:.3}s",
            if paused { "paused" } else { "running" },
            self.clock.seconds()
        );
        paused
    }

    pub fn set_vsync(&self, on: bool) {
        self.vsync.store(on, Ordering::Relaxed);
    }

    /// Flip the consumer's vsync. Returns the new setting.
    pub fn toggle_vsync(&self) -> bool {
        let on = !self.vsync.fetch_xor(true, Ordering::Relaxed);
        log::info!("Consumer vsync {}", if on { "on" } else { "off" });
        on
    }

    pub fn consumer_sync_interval(&self) -> u32 {
        u32::from(self.vsync.load(Ordering::Relaxed))
    }
}

/// Running render thread(s). Dropping without [`RenderLoop::shutdown`]
/// still cancels and joins, but discards the scenes on this thread.
pub struct RenderLoop {
    ctx: RenderContext,
    mode: LoopMode,
    threads: Vec<JoinHandle<Vec<BoxedScene>>>,
}

impl RenderLoop {
    /// Start the clock (if stopped) and spawn the loop thread(s).
    pub fn spawn(
        ctx: RenderContext,
        mode: LoopMode,
        producer: BoxedScene,
        consumer: BoxedScene,
    ) -> Result<Self, CoreError> {
        if !ctx.clock.is_running() && !ctx.clock.is_paused() {
            ctx.clock.start();
        }

        let mut threads = Vec::with_capacity(2);
        match mode {
            LoopMode::Combined => {
                let loop_ctx = ctx.clone();
                threads.push(
                    thread::Builder::new()
                        .name("tandem-render".into())
                        .spawn(move || run_combined(&loop_ctx, producer, consumer))?,
                );
            }
            LoopMode::Split => {
                let producer_ctx = ctx.clone();
                threads.push(
                    thread::Builder::new()
                        .name("tandem-producer".into())
                        .spawn(move || run_single(&producer_ctx, producer, Role::Producer))?,
                );
                let consumer_ctx = ctx.clone();
                let spawned = thread::Builder::new()
                    .name("tandem-consumer".into())
                    .spawn(move || run_single(&consumer_ctx, consumer, Role::Consumer));
                match spawned {
                    Ok(handle) => threads.push(handle),
                    Err(e) => {
                        // Don't leave the producer thread spinning.
                        ctx.cancel.cancel();
                        for handle in threads.drain(..) {
                            let _ = handle.join();
                        }
                        return Err(e.into());
                    }
                }
            }
        }

        log::info!("Render loop started ({mode:?}, {} thread(s))", threads.len());
        Ok(Self { ctx, mode, threads })
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Whether any loop thread is still running.
    pub fn is_running(&self) -> bool {
        self.threads.iter().any(|h| !h.is_finished())
    }

    /// Cancel, join every thread, and hand the scenes back as
    /// `[producer, consumer]` so their devices are released by the caller.
    ///
    /// A scene whose thread panicked is lost; the panic is logged.
    pub fn shutdown(mut self) -> Vec<BoxedScene> {
        self.join_all()
    }

    fn join_all(&mut self) -> Vec<BoxedScene> {
        self.ctx.cancel.cancel();
        let mut scenes = Vec::with_capacity(2);
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("render").to_string();
            match handle.join() {
                Ok(mut returned) => scenes.append(&mut returned),
                Err(_) => log::error!("Render thread {name} panicked"),
            }
        }
        if !scenes.is_empty() {
            log::info!("Render loop stopped");
        }
        scenes
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        if !self.threads.is_empty() {
            drop(self.join_all());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Producer,
    Consumer,
}

fn run_combined(
    ctx: &RenderContext,
    mut producer: BoxedScene,
    mut consumer: BoxedScene,
) -> Vec<BoxedScene> {
    while !ctx.is_cancelled() {
        let t = ctx.clock.seconds();

        producer.tick(t);
        producer.render();

        consumer.tick(t);
        consumer.render();

        producer.present(NO_VSYNC);
        consumer.present(ctx.consumer_sync_interval());
    }
    vec![producer, consumer]
}

fn run_single(ctx: &RenderContext, mut scene: BoxedScene, role: Role) -> Vec<BoxedScene> {
    while !ctx.is_cancelled() {
        let t = ctx.clock.seconds();
        scene.tick(t);
        scene.render();
        match role {
            Role::Producer => scene.present(NO_VSYNC),
            Role::Consumer => scene.present(ctx.consumer_sync_interval()),
        }
    }
    vec![scene]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{SharedSurfaceQueue, SurfaceQueue};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every call as `"<name>.<op>"`.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        queue: SharedSurfaceQueue,
        last_t: f64,
    }

    impl Recorder {
        fn boxed(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> BoxedScene {
            Box::new(Self {
                name,
                log: Arc::clone(log),
                queue: Arc::new(SurfaceQueue::new([])),
                last_t: -1.0,
            })
        }

        fn record(&self, op: &str) {
            self.log.lock().unwrap().push(format!("{}.{op}", self.name));
            thread::sleep(Duration::from_micros(200));
        }
    }

    impl Scene for Recorder {
        fn gpu(&self) -> String {
            "recorder".into()
        }
        fn width(&self) -> u32 {
            1
        }
        fn height(&self) -> u32 {
            1
        }
        fn set_background(&mut self, _spec: &str) {}
        fn tick(&mut self, t: f64) {
            assert!(t >= self.last_t, "clock went backwards");
            self.last_t = t;
            self.record("tick");
        }
        fn render(&mut self) {
            self.record("render");
        }
        fn present(&mut self, sync: u32) {
            self.record(&format!("present({sync})"));
        }
        fn queue(&self) -> SharedSurfaceQueue {
            Arc::clone(&self.queue)
        }
    }

    #[test]
    fn test_combined_call_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let lp = RenderLoop::spawn(
            RenderContext::new(true),
            LoopMode::Combined,
            Recorder::boxed("p", &log),
            Recorder::boxed("c", &log),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(30));
        let scenes = lp.shutdown();
        assert_eq!(scenes.len(), 2);

        let calls = log.lock().unwrap().clone();
        let expected = [
            "p.tick",
            "p.render",
            "c.tick",
            "c.render",
            "p.present(0)",
            "c.present(1)",
        ];
        assert!(calls.len() >= expected.len());
        for (i, call) in calls.iter().enumerate() {
            assert_eq!(call, expected[i % expected.len()], "call #{i}");
        }
    }

    #[test]
    fn test_split_runs_each_scene_on_its_own_thread() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ctx = RenderContext::new(false);
        let lp = RenderLoop::spawn(
            ctx,
            LoopMode::Split,
            Recorder::boxed("p", &log),
            Recorder::boxed("c", &log),
        )
        .unwrap();
        assert!(lp.is_running());
        thread::sleep(Duration::from_millis(30));
        let scenes = lp.shutdown();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].gpu(), "recorder");

        let calls = log.lock().unwrap().clone();
        assert!(calls.iter().any(|c| c == "p.present(0)"));
        assert!(calls.iter().any(|c| c == "c.present(0)"));
    }

    #[test]
    fn test_spawn_starts_clock() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ctx = RenderContext::new(true);
        let clock = Arc::clone(ctx.clock());
        let lp = RenderLoop::spawn(
            ctx,
            LoopMode::Combined,
            Recorder::boxed("p", &log),
            Recorder::boxed("c", &log),
        )
        .unwrap();
        assert!(clock.is_running());
        drop(lp);
    }

    #[test]
    fn test_toggles() {
        let ctx = RenderContext::new(true);
        assert_eq!(ctx.consumer_sync_interval(), 1);
        assert!(!ctx.toggle_vsync());
        assert_eq!(ctx.consumer_sync_interval(), 0);
        ctx.set_vsync(true);
        assert_eq!(ctx.consumer_sync_interval(), 1);

        // Stopped clock: nothing to pause.
        assert!(!ctx.toggle_pause());
        assert!(!ctx.clock().is_paused());

        ctx.clock().start();
        assert!(ctx.toggle_pause());
        assert!(ctx.clock().is_paused());
        assert!(!ctx.toggle_pause());
        assert!(ctx.clock().is_running());
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
