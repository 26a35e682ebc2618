use pixel_converge::paint::driver::step;
use pixel_converge::paint::signals::{self, SignalFeed};
use pixel_converge::paint::{
    drive, ManualClock, MemorySessionStore, OrderMode, Rgb, Rgba, RgbaBuffer, RunLifecycle, Runner,
    SimulatedSurface, StartOutcome, SurfacePoint, FRAME,
};
use pixel_converge::settings::RunSettings;
use std::rc::Rc;
use std::time::{Duration, Instant};

type SimRunner = Runner<SimulatedSurface, MemorySessionStore>;

fn setup(target: RgbaBuffer, settings: RunSettings) -> (SimRunner, SignalFeed, Rc<ManualClock>) {
    let clock = Rc::new(ManualClock::new());
    let (tx, feed) = signals::channel();
    let surface = SimulatedSurface::blank(8, 8, clock.clone()).with_signals(tx);
    let mut runner = Runner::new(surface, MemorySessionStore::new(), settings, "test-canvas");
    runner
        .set_target(target, SurfacePoint::new(0, 0))
        .expect("target accepted");
    (runner, feed, clock)
}

fn fast() -> RunSettings {
    RunSettings {
        rate: 1000,
        autosave_every: 5,
        ..RunSettings::default()
    }
}

fn mixed_target() -> RgbaBuffer {
    let colors = [
        Rgba::rgba(19, 230, 123, 255),
        Rgba::BLACK,
        Rgba::rgba(64, 147, 228, 255),
        Rgba::rgba(237, 28, 36, 255),
        Rgba::BLACK,
        Rgba::rgba(240, 30, 40, 255),
        Rgba::WHITE,
        Rgba::rgba(19, 230, 123, 255),
        Rgba::rgba(10, 10, 10, 20),
        Rgba::rgba(64, 147, 228, 255),
        Rgba::BLACK,
        Rgba::rgba(237, 28, 36, 255),
    ];
    let mut image = RgbaBuffer::new(4, 3, Rgba::WHITE);
    for (i, color) in colors.iter().enumerate() {
        image.set(i as u32 % 4, i as u32 / 4, *color);
    }
    image
}

#[test]
fn run_converges_and_second_pass_is_empty() {
    let (mut runner, feed, clock) = setup(mixed_target(), fast());
    assert_eq!(runner.start(), Ok(StartOutcome::Started));
    assert_eq!(runner.progress().total, 10);

    let end = drive(&mut runner, &feed, clock.as_ref(), FRAME);
    assert_eq!(end, RunLifecycle::Finished);
    assert_eq!(runner.context().applied.confirmed_len(), 10);

    let canvas = runner.surface().canvas();
    assert_eq!(canvas.get(1, 0), Some(Rgba::BLACK));
    assert_eq!(canvas.get(1, 1), Some(Rgba::rgba(237, 28, 36, 255)));
    assert_eq!(canvas.get(2, 1), Some(Rgba::WHITE));
    assert_eq!(canvas.get(0, 2), Some(Rgba::WHITE));

    assert_eq!(runner.start(), Ok(StartOutcome::NothingToPaint));
    assert_eq!(runner.lifecycle(), RunLifecycle::Finished);
}

#[test]
fn white_pixel_is_skipped_above_threshold() {
    let mut target = RgbaBuffer::new(2, 1, Rgba::WHITE);
    target.set(1, 0, Rgba::BLACK);
    let settings = RunSettings {
        skip_white: true,
        white_threshold: 250,
        ..fast()
    };
    let (mut runner, _feed, _clock) = setup(target, settings);
    runner.start().expect("start");

    let items = runner.context().queue.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].target, SurfacePoint::new(1, 0));
    assert_eq!(items[0].color_id, 1);
    assert_eq!(items[0].rgb, Rgb::new(0, 0, 0));
}

#[test]
fn by_color_groups_are_contiguous_and_ascending() {
    let (mut runner, _feed, _clock) = setup(mixed_target(), fast());
    runner.start().expect("start");

    let ids: Vec<u32> = runner
        .context()
        .queue
        .items()
        .iter()
        .map(|item| item.color_id)
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] <= pair[1]), "{ids:?}");
    assert_eq!(ids, vec![1, 1, 1, 7, 7, 7, 13, 13, 19, 19]);
}

#[test]
fn scanline_keeps_raster_order() {
    let settings = RunSettings {
        order: OrderMode::Scanline,
        ..fast()
    };
    let (mut runner, _feed, _clock) = setup(mixed_target(), settings);
    runner.start().expect("start");

    let points: Vec<(i32, i32)> = runner
        .context()
        .queue
        .items()
        .iter()
        .map(|item| (item.target.y, item.target.x))
        .collect();
    assert!(points.windows(2).all(|pair| pair[0] <= pair[1]), "{points:?}");
}

#[test]
fn progress_never_exceeds_total() {
    let (mut runner, feed, clock) = setup(mixed_target(), fast());
    runner.start().expect("start");
    while runner.is_active() {
        step(&mut runner, &feed, clock.as_ref(), FRAME);
        let progress = runner.progress();
        assert!(progress.done <= progress.total, "{progress:?}");
        assert!(progress.percent() <= 100.0);
    }
    assert_eq!(runner.progress().percent(), 100.0);
}

#[test]
fn new_rate_applies_to_next_dispatch() {
    let settings = RunSettings {
        rate: 1,
        ..fast()
    };
    let (mut runner, _feed, _clock) = setup(mixed_target(), settings);
    runner.start().expect("start");

    let t0 = Instant::now();
    runner.tick(t0);
    runner.tick(t0 + Duration::from_millis(500));
    assert_eq!(runner.surface().paint_calls, 1);

    runner.apply_settings(RunSettings {
        turbo: true,
        ..runner.context().settings.clone()
    });
    runner.tick(t0 + Duration::from_millis(501));
    assert_eq!(runner.surface().paint_calls, 2);
}

#[test]
fn pixel_size_maps_to_cell_centres() {
    let mut target = RgbaBuffer::new(2, 1, Rgba::BLACK);
    target.set(1, 0, Rgba::rgba(237, 28, 36, 255));
    let settings = RunSettings {
        pixel_size: 3,
        order: OrderMode::Scanline,
        ..fast()
    };
    let (mut runner, _feed, _clock) = setup(target, settings);
    runner.start().expect("start");

    let points: Vec<SurfacePoint> = runner
        .context()
        .queue
        .items()
        .iter()
        .map(|item| item.target)
        .collect();
    assert_eq!(points, vec![SurfacePoint::new(1, 1), SurfacePoint::new(4, 1)]);
}

#[test]
fn cells_past_the_right_edge_are_never_queued() {
    let clock = Rc::new(ManualClock::new());
    let (tx, feed) = signals::channel();
    let surface = SimulatedSurface::blank(4, 1, clock.clone()).with_signals(tx);
    let mut runner = Runner::new(surface, MemorySessionStore::new(), fast(), "test-canvas");
    let red = Rgba::rgba(237, 28, 36, 255);
    runner
        .set_target(RgbaBuffer::new(2, 1, red), SurfacePoint::new(3, 0))
        .expect("target accepted");

    assert_eq!(runner.start(), Ok(StartOutcome::Started));
    let queued: Vec<SurfacePoint> = runner
        .context()
        .queue
        .items()
        .iter()
        .map(|item| item.target)
        .collect();
    assert_eq!(queued, vec![SurfacePoint::new(3, 0)]);

    let end = drive(&mut runner, &feed, clock.as_ref(), FRAME);
    assert_eq!(end, RunLifecycle::Finished);
    assert_eq!(runner.context().applied.confirmed_len(), 1);
    assert_eq!(runner.surface().canvas().get(3, 0), Some(red));
    assert_eq!(runner.surface().paint_calls, 1);
}
