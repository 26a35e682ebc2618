use pixel_converge::paint::persist::{self, SessionSnapshot, SessionStore};
use pixel_converge::paint::signals::{self, SignalFeed};
use pixel_converge::paint::status::{self, Level};
use pixel_converge::paint::{
    drive, ManualClock, MemorySessionStore, OrderMode, Rgba, RgbaBuffer, RunLifecycle, Runner,
    SignalHandler, SignalKind, SimulatedSurface, SurfacePoint, FRAME,
};
use pixel_converge::settings::RunSettings;
use std::rc::Rc;
use std::time::{Duration, Instant};

type SimRunner = Runner<SimulatedSurface, MemorySessionStore>;

fn settings() -> RunSettings {
    RunSettings {
        rate: 10,
        cooldown_minutes: 1,
        order: OrderMode::Scanline,
        ..RunSettings::default()
    }
}

fn runner_with(surface: SimulatedSurface, target: RgbaBuffer, settings: RunSettings) -> SimRunner {
    let mut runner = Runner::new(surface, MemorySessionStore::new(), settings, "test-canvas");
    runner
        .set_target(target, SurfacePoint::new(0, 0))
        .expect("target accepted");
    runner
}

#[test]
fn late_dispatch_is_rolled_back_to_cursor() {
    let clock = Rc::new(ManualClock::new());
    let surface = SimulatedSurface::blank(8, 8, clock);
    let mut runner = runner_with(surface, RgbaBuffer::new(3, 1, Rgba::BLACK), settings());
    runner.start().expect("start");

    let t0 = Instant::now();
    runner.tick(t0 + Duration::from_millis(50));
    runner.tick(t0 + Duration::from_millis(150));
    assert_eq!(runner.context().applied.pending_len(), 2);

    let observed = t0 + Duration::from_millis(100);
    runner.on_signal(SignalKind::ResourceDepleted, observed);

    assert_eq!(runner.lifecycle(), RunLifecycle::Paused);
    assert!(runner.holds().depletion);
    assert!(runner.is_committing());
    let ctx = runner.context();
    assert_eq!(
        ctx.queue.current().map(|item| item.target),
        Some(SurfacePoint::new(1, 0))
    );
    assert_eq!(ctx.applied.pending_len(), 1);
    assert_eq!(ctx.applied.pending()[0].key, SurfacePoint::new(0, 0));
    let notices = runner.take_notices();
    assert!(notices
        .iter()
        .any(|n| n.message == "Out of paint!" && n.level == Level::Warn));

    let settled = observed + Duration::from_millis(200);
    runner.tick(settled);
    let ctx = runner.context();
    assert!(ctx.applied.confirmed().contains(&SurfacePoint::new(0, 0)));
    assert!(!ctx.applied.is_processed(SurfacePoint::new(1, 0)));
    assert_eq!(runner.progress().done, 1);

    let reopened = settled + Duration::from_secs(35);
    runner.tick(reopened);
    assert!(runner.is_cooling_down());
    assert_eq!(runner.status().message, "Cooldown 1min... 1:00 left");
    runner.tick(reopened + Duration::from_millis(1500));
    assert_eq!(runner.status().message, "Cooldown 1min... 0:59 left");

    let resumed = reopened + Duration::from_secs(60);
    runner.tick(resumed);
    assert_eq!(runner.lifecycle(), RunLifecycle::Running);
    assert!(!runner.holds().depletion);

    let paints_before = runner.surface().paint_calls;
    runner.tick(resumed + Duration::from_millis(16));
    assert_eq!(runner.surface().paint_calls, paints_before + 1);
    assert!(runner
        .context()
        .applied
        .is_processed(SurfacePoint::new(1, 0)));
}

#[test]
fn repeated_signals_inside_window_are_handled_once() {
    let clock = Rc::new(ManualClock::new());
    let surface = SimulatedSurface::blank(8, 8, clock);
    let mut runner = runner_with(surface, RgbaBuffer::new(3, 1, Rgba::BLACK), settings());
    runner.start().expect("start");

    let t0 = Instant::now();
    runner.tick(t0);
    runner.on_signal(SignalKind::ResourceDepleted, t0 + Duration::from_millis(10));
    let commits = runner.surface().commit_calls;
    runner.on_signal(SignalKind::ResourceDepleted, t0 + Duration::from_millis(20));
    assert_eq!(runner.surface().commit_calls, commits);
}

#[test]
fn signal_after_stop_is_ignored() {
    let clock = Rc::new(ManualClock::new());
    let surface = SimulatedSurface::blank(8, 8, clock);
    let mut runner = runner_with(surface, RgbaBuffer::new(3, 1, Rgba::BLACK), settings());
    runner.start().expect("start");
    runner.tick(Instant::now());
    assert!(runner.stop());

    runner.on_signal(SignalKind::ResourceDepleted, Instant::now());
    assert_eq!(runner.lifecycle(), RunLifecycle::Stopped);
    assert!(!runner.is_committing());
}

#[test]
fn stop_during_cooldown_ends_the_run_for_good() {
    let clock = Rc::new(ManualClock::new());
    let surface = SimulatedSurface::blank(8, 8, clock);
    let mut runner = runner_with(surface, RgbaBuffer::new(3, 1, Rgba::BLACK), settings());
    runner.start().expect("start");

    let t0 = Instant::now();
    runner.tick(t0);
    let observed = t0 + Duration::from_millis(10);
    runner.on_signal(SignalKind::ResourceDepleted, observed);
    let settled = observed + Duration::from_millis(200);
    runner.tick(settled);
    let reopened = settled + Duration::from_secs(35);
    runner.tick(reopened);
    assert!(runner.is_cooling_down());

    assert!(runner.stop());
    assert_eq!(runner.lifecycle(), RunLifecycle::Stopped);
    assert!(!runner.is_cooling_down());
    assert!(!runner.has_session());

    let paints = runner.surface().paint_calls;
    let commits = runner.surface().commit_calls;
    for secs in [1, 30, 61, 120] {
        runner.tick(reopened + Duration::from_secs(secs));
    }
    assert_eq!(runner.lifecycle(), RunLifecycle::Stopped);
    assert_eq!(runner.surface().paint_calls, paints);
    assert_eq!(runner.surface().commit_calls, commits);
    assert_eq!(runner.status().message, status::STOPPED);
}

fn stored_snapshot(runner: &SimRunner) -> SessionSnapshot {
    let text = runner
        .store()
        .get(&persist::session_key("test-canvas"))
        .expect("store read")
        .expect("snapshot present");
    serde_json::from_str(&text).expect("snapshot json")
}

#[test]
fn autosave_runs_silently_every_few_dispatches() {
    let clock = Rc::new(ManualClock::new());
    let surface = SimulatedSurface::blank(8, 8, clock);
    let mut runner = runner_with(
        surface,
        RgbaBuffer::new(5, 1, Rgba::BLACK),
        RunSettings {
            rate: 1000,
            autosave_every: 3,
            ..settings()
        },
    );
    runner.start().expect("start");
    runner.take_notices();

    let t0 = Instant::now();
    runner.tick(t0);
    runner.tick(t0 + Duration::from_millis(16));
    assert_eq!(runner.surface().paint_calls, 2);
    assert_eq!(stored_snapshot(&runner).queue_ptr, 0);

    runner.tick(t0 + Duration::from_millis(32));
    assert_eq!(stored_snapshot(&runner).queue_ptr, 3);
    assert_eq!(runner.status().message, status::STARTED);
    assert!(runner.take_notices().is_empty());

    runner.tick(t0 + Duration::from_millis(48));
    runner.tick(t0 + Duration::from_millis(64));
    assert_eq!(runner.surface().paint_calls, 5);
    assert_eq!(stored_snapshot(&runner).queue_ptr, 3);
}

fn charged_run(feed_settings: RunSettings) -> (SimRunner, SignalFeed, Rc<ManualClock>) {
    let clock = Rc::new(ManualClock::new());
    let (tx, feed) = signals::channel();
    let surface = SimulatedSurface::blank(8, 8, clock.clone())
        .with_signals(tx)
        .with_charges(5, Some(Duration::from_secs(1)));
    let runner = runner_with(surface, RgbaBuffer::new(4, 4, Rgba::BLACK), feed_settings);
    (runner, feed, clock)
}

#[test]
fn every_pixel_lands_exactly_once_across_depletions() {
    let (mut runner, feed, clock) = charged_run(RunSettings {
        rate: 1000,
        ..settings()
    });
    runner.start().expect("start");

    let end = drive(&mut runner, &feed, clock.as_ref(), FRAME);
    assert_eq!(end, RunLifecycle::Finished);

    let surface = runner.surface();
    assert_eq!(surface.rejected_paints, 3);
    assert_eq!(surface.paint_calls - surface.rejected_paints, 16);
    assert_eq!(
        surface.canvas().crop(0, 0, 4, 4),
        RgbaBuffer::new(4, 4, Rgba::BLACK)
    );
    assert_eq!(runner.context().applied.confirmed_len(), 16);
}
