//! Cross-thread handoff tests.
//!
//! A producer and a consumer run on separate threads at different rates and
//! exchange surfaces only through the `SurfaceQueue`. An ownership ledger
//! asserts that no surface is ever held twice and none goes missing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tandem_core::{
    publish, FencePolicy, Handoff, LoopMode, RenderContext, RenderLoop, Scene, ShareHandle,
    SharedSurfaceQueue, SignalToken, Surface, SurfaceQueue, DEFAULT_WAIT,
};

const POOL: usize = 3;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn triple_buffered() -> (SharedSurfaceQueue, HashSet<ShareHandle>) {
    let surfaces: Vec<_> = (0..POOL)
        .map(|_| Surface::new(ShareHandle::new(), 64, 64))
        .collect();
    let handles = surfaces.iter().map(Surface::share_handle).collect();
    (Arc::new(SurfaceQueue::new(surfaces)), handles)
}

/// Surfaces currently held by a caller.
#[derive(Default)]
struct Ledger {
    held: Mutex<HashSet<ShareHandle>>,
}

impl Ledger {
    fn acquire(&self, h: ShareHandle) {
        assert!(self.held.lock().unwrap().insert(h), "{h} held twice");
    }

    fn release(&self, h: ShareHandle) {
        assert!(self.held.lock().unwrap().remove(&h), "{h} released but not held");
    }

    fn count(&self) -> usize {
        self.held.lock().unwrap().len()
    }
}

fn run_handoff(cycles: u64, consumer_period: Duration) {
    init_logger();
    let (queue, handles) = triple_buffered();
    let ledger = Arc::new(Ledger::default());
    let consumed = Arc::new(AtomicU64::new(0));

    let producer = {
        let queue = Arc::clone(&queue);
        let ledger = Arc::clone(&ledger);
        let consumed = Arc::clone(&consumed);
        thread::spawn(move || {
            let mut produced = 0u64;
            while consumed.load(Ordering::Acquire) < cycles {
                let Some(surface) = queue.checkout(Duration::from_millis(10)) else {
                    continue;
                };
                ledger.acquire(surface.share_handle());
                ledger.release(surface.share_handle());
                queue.produce(surface);
                produced += 1;
            }
            produced
        })
    };

    let consumer = {
        let queue = Arc::clone(&queue);
        let ledger = Arc::clone(&ledger);
        let consumed = Arc::clone(&consumed);
        thread::spawn(move || {
            let mut order = Vec::with_capacity(cycles as usize);
            while consumed.load(Ordering::Acquire) < cycles {
                let Some(surface) = queue.consume(DEFAULT_WAIT) else {
                    continue;
                };
                ledger.acquire(surface.share_handle());
                order.push(surface.share_handle());
                if !consumer_period.is_zero() {
                    thread::sleep(consumer_period);
                }
                ledger.release(surface.share_handle());
                queue.checkin(surface);
                consumed.fetch_add(1, Ordering::AcqRel);
            }
            order
        })
    };

    let produced = producer.join().unwrap();
    let order = consumer.join().unwrap();

    assert_eq!(order.len() as u64, cycles);
    assert!(produced >= cycles);
    // Everything still in `due` is accounted for by the difference.
    assert_eq!(produced - cycles, queue.due_count() as u64);
    assert_eq!(ledger.count(), 0);
    assert_eq!(queue.free_count() + queue.due_count(), POOL);

    // With one slow consumer the pool rotates: every surface was seen and
    // no foreign handle ever appeared.
    let seen: HashSet<_> = order.iter().copied().collect();
    assert_eq!(seen, handles);
}

#[test]
fn test_handoff_10k_cycles_unthrottled() {
    run_handoff(10_000, Duration::ZERO);
}

#[test]
fn test_handoff_throttled_consumer() {
    run_handoff(2_000, Duration::from_micros(250));
}

#[test]
#[ignore = "takes ~3 minutes: 10k cycles at 60 Hz"]
fn test_handoff_10k_cycles_consumer_at_60hz() {
    run_handoff(10_000, Duration::from_micros(16_667));
}

// ── Split render loop with CPU-backed scenes ────────────────────────

/// Stand-in for GPU memory addressed by share handle.
type Memory = Arc<Mutex<HashMap<ShareHandle, u64>>>;

struct CpuProducer {
    queue: SharedSurfaceQueue,
    memory: Memory,
    frame: u64,
}

impl Scene for CpuProducer {
    fn gpu(&self) -> String {
        "cpu".into()
    }
    fn width(&self) -> u32 {
        64
    }
    fn height(&self) -> u32 {
        64
    }
    fn set_background(&mut self, _spec: &str) {}
    fn tick(&mut self, _t: f64) {
        self.frame += 1;
    }
    fn render(&mut self) {
        let Some(surface) = self.queue.checkout(Duration::from_millis(20)) else {
            return;
        };
        self.memory
            .lock()
            .unwrap()
            .insert(surface.share_handle(), self.frame);
        let fence = SignalToken::signaled();
        let out = publish(&self.queue, surface, &fence, DEFAULT_WAIT, FencePolicy::DropFrame);
        assert_eq!(out, Handoff::Published);
    }
    fn present(&mut self, sync: u32) {
        assert_eq!(sync, 0);
    }
    fn queue(&self) -> SharedSurfaceQueue {
        Arc::clone(&self.queue)
    }
}

struct CpuConsumer {
    queue: SharedSurfaceQueue,
    memory: Memory,
    last_frame: Arc<AtomicU64>,
    frames: Arc<AtomicU64>,
}

impl Scene for CpuConsumer {
    fn gpu(&self) -> String {
        "cpu".into()
    }
    fn width(&self) -> u32 {
        64
    }
    fn height(&self) -> u32 {
        64
    }
    fn set_background(&mut self, _spec: &str) {}
    fn tick(&mut self, _t: f64) {}
    fn render(&mut self) {
        let Some(surface) = self.queue.consume(Duration::from_millis(20)) else {
            return;
        };
        let frame = self.memory.lock().unwrap()[&surface.share_handle()];
        let last = self.last_frame.swap(frame, Ordering::AcqRel);
        assert!(frame > last, "frame {frame} after {last}");
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.queue.checkin(surface);
    }
    fn present(&mut self, _sync: u32) {
        thread::sleep(Duration::from_micros(500));
    }
    fn queue(&self) -> SharedSurfaceQueue {
        Arc::clone(&self.queue)
    }
}

#[test]
fn test_split_loop_delivers_frames_in_order() {
    init_logger();
    let (queue, _) = triple_buffered();
    let memory: Memory = Arc::default();
    let frames = Arc::new(AtomicU64::new(0));

    let producer = Box::new(CpuProducer {
        queue: Arc::clone(&queue),
        memory: Arc::clone(&memory),
        frame: 0,
    });
    let consumer = Box::new(CpuConsumer {
        queue: producer.queue(),
        memory,
        last_frame: Arc::new(AtomicU64::new(0)),
        frames: Arc::clone(&frames),
    });

    let lp = RenderLoop::spawn(RenderContext::new(true), LoopMode::Split, producer, consumer)
        .unwrap();
    thread::sleep(Duration::from_millis(200));
    let scenes = lp.shutdown();

    assert_eq!(scenes.len(), 2);
    assert!(frames.load(Ordering::Relaxed) > 10);
    assert_eq!(queue.free_count() + queue.due_count(), POOL);
}

#[test]
fn test_combined_loop_conserves_pool() {
    init_logger();
    let (queue, _) = triple_buffered();
    let memory: Memory = Arc::default();
    let frames = Arc::new(AtomicU64::new(0));

    let producer = Box::new(CpuProducer {
        queue: Arc::clone(&queue),
        memory: Arc::clone(&memory),
        frame: 0,
    });
    let consumer = Box::new(CpuConsumer {
        queue: Arc::clone(&queue),
        memory,
        last_frame: Arc::new(AtomicU64::new(0)),
        frames: Arc::clone(&frames),
    });

    let ctx = RenderContext::new(true);
    let lp = RenderLoop::spawn(ctx, LoopMode::Combined, producer, consumer).unwrap();
    thread::sleep(Duration::from_millis(100));
    drop(lp.shutdown());

    assert!(frames.load(Ordering::Relaxed) > 0);
    // Lockstep: each iteration produces one frame and consumes it.
    assert_eq!(queue.due_count(), 0);
    assert_eq!(queue.free_count(), POOL);
}
