use anyhow::{bail, Context, Result};
use pixel_converge::logging;
use pixel_converge::paint::{
    self, FileSessionStore, RgbaBuffer, RunLifecycle, Runner, SimulatedSurface, StartOutcome,
    SurfacePoint, SystemClock,
};
use pixel_converge::settings::{self, SETTINGS_FILE_NAME};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

const USAGE: &str = "usage: pixel_converge <target.png> [output.png] [settings.json]";
/// Free space around the target on the simulated canvas.
const MARGIN: u32 = 4;
const CHARGES: u32 = 200;
const CHARGE_REGEN: Duration = Duration::from_millis(500);

fn default_settings_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pixel_converge")
        .join(SETTINGS_FILE_NAME)
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(target_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| target_path.with_extension("converged.png"));
    let settings_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(default_settings_path);

    let run_settings = settings::load_from_path(&settings_path)?;
    logging::init(run_settings.debug_logging, run_settings.log_file.clone());
    tracing::info!(path = %settings_path.display(), "settings loaded");

    let bytes = std::fs::read(&target_path)
        .with_context(|| format!("read target image {}", target_path.display()))?;
    let target = RgbaBuffer::from_png(&bytes)?;
    let cell = run_settings.pixel_size.max(1);

    let clock = Rc::new(SystemClock);
    let (sender, feed) = paint::signals::channel();
    let surface = SimulatedSurface::blank(
        target.width.saturating_mul(cell).saturating_add(MARGIN),
        target.height.saturating_mul(cell).saturating_add(MARGIN),
        clock.clone(),
    )
    .with_signals(sender)
    .with_charges(CHARGES, Some(CHARGE_REGEN));

    let mut runner = Runner::new(
        surface,
        FileSessionStore::in_data_dir(),
        run_settings,
        "simulated-canvas",
    );
    runner.set_target(target, SurfacePoint::new(0, 0))?;

    match runner.start()? {
        StartOutcome::Started => {}
        outcome => {
            tracing::info!(?outcome, "nothing to do");
            return Ok(());
        }
    }

    let lifecycle = paint::drive(&mut runner, &feed, clock.as_ref(), paint::FRAME);
    for notice in runner.take_notices() {
        tracing::info!(level = ?notice.level, "{}", notice.message);
    }
    let progress = runner.progress();
    tracing::info!(
        ?lifecycle,
        done = progress.done,
        total = progress.total,
        "run ended: {}",
        runner.status().message
    );
    if lifecycle != RunLifecycle::Finished {
        bail!("run did not finish: {}", runner.status().message);
    }

    let png = runner.surface().canvas().to_png()?;
    std::fs::write(&output_path, png)
        .with_context(|| format!("write output image {}", output_path.display()))?;
    tracing::info!(path = %output_path.display(), "converged canvas written");
    Ok(())
}
