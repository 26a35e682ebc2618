//! Execution runner: a tick-driven state machine that drains the action
//! queue against a drawing surface.

use crate::paint::capture::{capture_live, capture_target, Selection};
use crate::paint::context::RunContext;
use crate::paint::depletion::{self, Cooldown, CooldownTick, DepletionHandler, FULL_DEPLETION_REOPEN};
use crate::paint::error::RunError;
use crate::paint::model::{ActionItem, PaletteEntry, SurfaceBounds, SurfacePoint};
use crate::paint::persist::{self, SessionStore};
use crate::paint::queue::{build_queue, ActionQueue, QueueInputs};
use crate::paint::raster::RgbaBuffer;
use crate::paint::signals::{SignalHandler, SignalKind};
use crate::paint::state::{can_transition, Holds, RunLifecycle};
use crate::paint::status::{self, Level, Notice, Progress, StatusLine};
use crate::paint::supervisor::{HoldChange, InterruptionSupervisor};
use crate::paint::surface::DrawingSurface;
use crate::settings::RunSettings;
use std::time::{Duration, Instant};

/// Wait between pressing commit and trusting that pending intents landed.
pub const COMMIT_SETTLE: Duration = Duration::from_millis(200);
/// Wait before reopening the paint mode after a regular commit.
pub const REOPEN_DELAY: Duration = Duration::from_secs(2);
const CAPTCHA_NOTICE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
    NothingToPaint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitStep {
    Settle,
    Reopen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommitCycle {
    step: CommitStep,
    until: Instant,
    reopen: Duration,
    cooldown_after: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Draining,
    Committing(CommitCycle),
    Cooldown(Cooldown),
}

pub struct Runner<S: DrawingSurface, P: SessionStore> {
    surface: S,
    store: P,
    session_key: String,
    ctx: RunContext,
    lifecycle: RunLifecycle,
    holds: Holds,
    phase: Phase,
    depletion: DepletionHandler,
    supervisor: InterruptionSupervisor,
    status: StatusLine,
    notices: Vec<Notice>,
}

impl<S: DrawingSurface, P: SessionStore> Runner<S, P> {
    /// `origin` scopes the durable snapshot, one per surface origin.
    pub fn new(surface: S, store: P, settings: RunSettings, origin: &str) -> Self {
        Self {
            surface,
            store,
            session_key: persist::session_key(origin),
            ctx: RunContext::new(settings),
            lifecycle: RunLifecycle::Idle,
            holds: Holds::default(),
            phase: Phase::Draining,
            depletion: DepletionHandler::default(),
            supervisor: InterruptionSupervisor::default(),
            status: StatusLine::default(),
            notices: Vec::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn lifecycle(&self) -> RunLifecycle {
        self.lifecycle
    }

    pub fn holds(&self) -> Holds {
        self.holds
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn progress(&self) -> Progress {
        Progress {
            done: self.ctx.applied.done(),
            total: self.ctx.total_target,
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Held by something only the user can lift: a pause or a dispatch
    /// failure.
    pub fn needs_user(&self) -> bool {
        self.is_active() && self.holds.paused
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.phase, Phase::Committing(_))
    }

    pub fn is_cooling_down(&self) -> bool {
        matches!(self.phase, Phase::Cooldown(_))
    }

    /// Replaces the tunables. A new rate applies to the next dispatch.
    pub fn apply_settings(&mut self, settings: RunSettings) {
        self.ctx.settings = settings.sanitized();
        tracing::debug!(
            rate = self.ctx.settings.effective_rate(),
            cooldown_minutes = self.ctx.settings.cooldown_minutes,
            "run settings applied"
        );
    }

    /// Restores the snapshot for this origin if one exists.
    pub fn boot(&mut self) -> bool {
        matches!(self.load_session(), Ok(true))
    }

    pub fn has_session(&self) -> bool {
        match self.store.get(&self.session_key) {
            Ok(value) => value.is_some(),
            Err(err) => {
                tracing::warn!(?err, "session store lookup failed");
                false
            }
        }
    }

    pub fn save_session(&mut self) -> bool {
        let saved = self.persist("manual");
        if saved {
            self.set_status(status::SESSION_SAVED, Level::Info);
            self.notify(status::SESSION_SAVED, Level::Info);
        }
        saved
    }

    /// Replaces the context with the stored snapshot. Refused while a run is
    /// active. `Ok(false)` when nothing usable is stored.
    pub fn load_session(&mut self) -> Result<bool, RunError> {
        if self.is_active() {
            return Err(RunError::Busy);
        }
        let text = match self.store.get(&self.session_key) {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(false),
            Err(err) => {
                tracing::warn!(?err, "session store read failed");
                return Ok(false);
            }
        };
        if !persist::restore_from_text(&mut self.ctx, &text) {
            return Ok(false);
        }
        tracing::info!(
            confirmed = self.ctx.applied.confirmed_len(),
            cursor = self.ctx.cursor_hint,
            "session restored"
        );
        self.set_status(status::SESSION_LOADED, Level::Info);
        self.notify(status::SESSION_LOADED, Level::Info);
        Ok(true)
    }

    /// Sets the position and size from two clicked corners.
    pub fn select_area(&mut self, a: SurfacePoint, b: SurfacePoint) -> Result<Selection, RunError> {
        if self.is_active() {
            return Err(RunError::Busy);
        }
        let selection = Selection::from_corners(a, b);
        self.ctx.origin = Some(selection.origin);
        self.ctx.width = selection.width;
        self.ctx.height = selection.height;
        self.set_status(
            status::aligned(
                selection.origin.x,
                selection.origin.y,
                selection.width,
                selection.height,
            ),
            Level::Info,
        );
        self.persist("select");
        Ok(selection)
    }

    /// Grabs the selected area of the surface as the new target.
    pub fn capture(&mut self) -> Result<(), RunError> {
        if self.is_active() {
            return Err(RunError::Busy);
        }
        let Some(origin) = self.ctx.origin else {
            return Err(self.report(RunError::NoPosition));
        };
        let selection = Selection {
            origin,
            width: self.ctx.width,
            height: self.ctx.height,
        };
        let image = match capture_target(&self.surface, selection) {
            Ok(image) => image,
            Err(err) => return Err(self.report(err)),
        };
        self.install_target(image);
        self.persist("capture");
        Ok(())
    }

    /// Loads an externally provided target placed at `origin`.
    pub fn set_target(&mut self, image: RgbaBuffer, origin: SurfacePoint) -> Result<(), RunError> {
        if self.is_active() {
            return Err(RunError::Busy);
        }
        if image.is_empty() {
            return Err(RunError::NoTargetImage);
        }
        self.ctx.origin = Some(origin);
        self.install_target(image);
        self.persist("target");
        Ok(())
    }

    fn install_target(&mut self, image: RgbaBuffer) {
        self.ctx.width = image.width;
        self.ctx.height = image.height;
        self.set_status(status::image_loaded(image.width, image.height), Level::Info);
        self.ctx.target = Some(image);
        self.ctx.reset_progress();
    }

    /// Validates every precondition, builds the queue against the live
    /// surface and starts draining. Nothing is mutated when a precondition
    /// fails.
    pub fn start(&mut self) -> Result<StartOutcome, RunError> {
        if self.is_active() {
            self.notify(status::ALREADY_RUNNING, Level::Warn);
            return Ok(StartOutcome::AlreadyActive);
        }
        let (palette, items) = match self.prepare_queue() {
            Ok(prepared) => prepared,
            Err(err) => return Err(self.report(err)),
        };
        if items.is_empty() {
            tracing::info!("queue build found nothing to paint");
            self.set_status(status::NOTHING_TO_PAINT, Level::Info);
            self.notify(status::NOTHING_TO_PAINT, Level::Info);
            return Ok(StartOutcome::NothingToPaint);
        }

        let mut queue = ActionQueue::new(items);
        let cursor = self
            .ctx
            .settings
            .manual_start
            .resolve(queue.len())
            .unwrap_or(self.ctx.cursor_hint);
        queue.set_cursor(cursor);

        let ctx = &mut self.ctx;
        ctx.palette = palette;
        ctx.total_target = ctx.applied.confirmed_len() + queue.len();
        ctx.queue = queue;
        ctx.cursor_hint = 0;
        ctx.since_save = 0;
        ctx.last_color = None;
        ctx.last_dispatch = None;
        tracing::info!(
            queued = ctx.queue.len(),
            cursor = ctx.queue.cursor(),
            total = ctx.total_target,
            "queue built"
        );

        self.holds = Holds::default();
        self.phase = Phase::Draining;
        self.depletion.reset();
        if self.supervisor.challenge_visible() {
            self.holds.captcha = true;
        }
        self.transition(RunLifecycle::Running);
        self.sync_lifecycle();
        self.set_status(status::STARTED, Level::Info);
        let built = status::queue_built(self.ctx.queue.len());
        self.notify(built, Level::Info);
        Ok(StartOutcome::Started)
    }

    /// Pauses an active run, keeping all state.
    pub fn pause(&mut self) -> bool {
        if !self.is_active() || self.holds.paused {
            return false;
        }
        self.holds.paused = true;
        self.sync_lifecycle();
        self.set_status(status::PAUSED, Level::Info);
        self.persist("pause");
        true
    }

    /// Lifts a pause after checking that the surface and palette are still
    /// there. Stays paused on failure.
    pub fn resume(&mut self) -> Result<bool, RunError> {
        if !self.is_active() || !self.holds.paused {
            return Ok(false);
        }
        let (_, palette) = match self.check_surface() {
            Ok(found) => found,
            Err(err) => return Err(self.report(err)),
        };
        self.ctx.palette = palette;
        self.ctx.last_color = None;
        self.holds.paused = false;
        self.sync_lifecycle();
        self.set_status(status::RESUMED, Level::Info);
        Ok(true)
    }

    pub fn toggle_pause(&mut self) -> Result<bool, RunError> {
        match self.lifecycle {
            RunLifecycle::Running => Ok(self.pause()),
            _ if self.holds.paused => self.resume(),
            _ => Ok(false),
        }
    }

    /// Halts the run and discards the queue, tracking sets and snapshot.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.ctx.reset_progress();
        self.holds = Holds::default();
        self.phase = Phase::Draining;
        self.depletion.reset();
        self.supervisor.reset();
        self.discard_snapshot();
        self.transition(RunLifecycle::Stopped);
        self.set_status(status::STOPPED, Level::Info);
        tracing::info!("run stopped");
        true
    }

    /// Advances the run by one step.
    pub fn tick(&mut self, now: Instant) {
        if !self.is_active() {
            return;
        }
        match self.phase {
            Phase::Committing(cycle) => self.advance_commit(cycle, now),
            Phase::Cooldown(cooldown) => self.advance_cooldown(cooldown, now),
            Phase::Draining if !self.holds.any() => self.drain_step(now),
            Phase::Draining => {}
        }
    }

    fn drain_step(&mut self, now: Instant) {
        while let Some(item) = self.ctx.queue.current() {
            if !self.ctx.applied.is_processed(item.target) {
                break;
            }
            self.ctx.queue.advance();
        }
        let Some(item) = self.ctx.queue.current().copied() else {
            if self.ctx.applied.has_pending() {
                self.begin_commit(now, REOPEN_DELAY, false);
            } else {
                self.finish();
            }
            return;
        };

        if let Some(last) = self.ctx.last_dispatch {
            if now.saturating_duration_since(last) < self.ctx.settings.dispatch_interval() {
                return;
            }
        }

        if self.ctx.last_color != Some(item.color_id) {
            if !self.surface.select(item.color_id) {
                self.fail_dispatch(RunError::ColorMissing { id: item.color_id });
                return;
            }
            self.ctx.last_color = Some(item.color_id);
        }

        self.ctx.applied.record_pending(item, now);
        self.surface.paint(item.target);
        self.ctx.last_dispatch = Some(now);
        self.ctx.queue.advance();

        self.ctx.since_save += 1;
        let every = self.ctx.settings.autosave_every;
        if every > 0 && self.ctx.since_save >= every {
            self.ctx.since_save = 0;
            self.persist("autosave");
        }
    }

    fn fail_dispatch(&mut self, err: RunError) {
        tracing::error!(error = %err, "dispatch failed");
        self.holds.paused = true;
        self.sync_lifecycle();
        self.set_status(err.to_string(), Level::Error);
        self.notify(err.to_string(), Level::Error);
        self.persist("dispatch failure");
    }

    fn begin_commit(&mut self, now: Instant, reopen: Duration, cooldown_after: bool) {
        if !self.surface.commit() {
            tracing::warn!("commit control not found");
        }
        self.set_status(status::COMMITTING, Level::Info);
        self.phase = Phase::Committing(CommitCycle {
            step: CommitStep::Settle,
            until: now + COMMIT_SETTLE,
            reopen,
            cooldown_after,
        });
    }

    fn advance_commit(&mut self, cycle: CommitCycle, now: Instant) {
        if now < cycle.until {
            return;
        }
        match cycle.step {
            CommitStep::Settle => {
                let committed = self.ctx.applied.commit_pending();
                tracing::info!(
                    committed,
                    confirmed = self.ctx.applied.confirmed_len(),
                    "pending actions confirmed"
                );
                self.persist("commit");
                self.phase = Phase::Committing(CommitCycle {
                    step: CommitStep::Reopen,
                    until: now + cycle.reopen,
                    ..cycle
                });
            }
            CommitStep::Reopen => {
                if !self.surface.commit() {
                    tracing::warn!("commit control not found on reopen");
                }
                self.set_status(status::COMMITTED, Level::Info);
                if cycle.cooldown_after {
                    let settings = &self.ctx.settings;
                    let cooldown = Cooldown::new(settings.cooldown_minutes, settings.cooldown(), now);
                    tracing::info!(minutes = cooldown.minutes, "cooldown started");
                    self.set_status(cooldown.status_text(now), Level::Info);
                    self.phase = Phase::Cooldown(cooldown);
                } else {
                    self.phase = Phase::Draining;
                }
            }
        }
    }

    fn advance_cooldown(&mut self, mut cooldown: Cooldown, now: Instant) {
        match cooldown.tick(now) {
            CooldownTick::Waiting => self.phase = Phase::Cooldown(cooldown),
            CooldownTick::Report(_) => {
                self.set_status(cooldown.status_text(now), Level::Info);
                self.phase = Phase::Cooldown(cooldown);
            }
            CooldownTick::Done => self.end_cooldown(),
        }
    }

    fn end_cooldown(&mut self) {
        self.phase = Phase::Draining;
        self.depletion.finish();
        self.holds.depletion = false;
        match self.check_surface() {
            Ok((_, palette)) => {
                self.ctx.palette = palette;
                self.ctx.last_color = None;
                self.set_status(status::RESUMED, Level::Info);
                tracing::info!("cooldown over, resuming");
            }
            Err(err) => {
                self.holds.paused = true;
                self.report(err);
            }
        }
        self.sync_lifecycle();
    }

    fn finish(&mut self) {
        self.ctx.queue.clear();
        self.ctx.cursor_hint = 0;
        self.holds = Holds::default();
        self.phase = Phase::Draining;
        self.discard_snapshot();
        self.transition(RunLifecycle::Finished);
        self.set_status(status::DONE, Level::Info);
        self.notify(status::DONE, Level::Info);
        tracing::info!(confirmed = self.ctx.applied.confirmed_len(), "run finished");
    }

    fn on_depleted(&mut self, at: Instant) {
        if !self.is_active() || self.phase != Phase::Draining {
            tracing::debug!("depletion signal ignored outside draining");
            return;
        }
        if !self.depletion.try_begin(at) {
            tracing::debug!("depletion signal debounced");
            return;
        }
        self.holds.depletion = true;
        self.sync_lifecycle();
        let outcome = depletion::reconcile(&mut self.ctx, at);
        tracing::warn!(
            kept = outcome.kept,
            rolled_back = outcome.rolled_back.len(),
            cursor = self.ctx.queue.cursor(),
            "paint depleted"
        );
        self.set_status(status::OUT_OF_PAINT, Level::Warn);
        self.notify(status::OUT_OF_PAINT, Level::Warn);
        self.begin_commit(at, FULL_DEPLETION_REOPEN, true);
    }

    fn on_challenge(&mut self, shown: bool) {
        let active = self.is_active();
        match self.supervisor.on_challenge(shown, active, &mut self.holds) {
            HoldChange::Engaged => {
                tracing::warn!("verification challenge shown, holding run");
                self.sync_lifecycle();
                self.set_status(status::CAPTCHA_DETECTED, Level::Warn);
                self.notices.push(
                    Notice::new(status::CAPTCHA_DETECTED, Level::Warn).lasting(CAPTCHA_NOTICE),
                );
                self.persist("pause");
            }
            HoldChange::Released => {
                tracing::info!("verification challenge cleared");
                self.sync_lifecycle();
                if self.lifecycle == RunLifecycle::Running {
                    self.set_status(status::RESUMED, Level::Info);
                }
            }
            HoldChange::Unchanged => {}
        }
    }

    fn prepare_queue(&self) -> Result<(Vec<PaletteEntry>, Vec<ActionItem>), RunError> {
        let (bounds, palette) = self.check_surface()?;
        let target = self
            .ctx
            .target
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or(RunError::NoTargetImage)?;
        let placement = self.ctx.placement().ok_or(RunError::NoPosition)?;
        let live = capture_live(&self.surface, placement, target.width, target.height)?;
        let items = build_queue(&QueueInputs {
            target,
            live: &live,
            palette: &palette,
            filters: self.ctx.settings.filters(),
            placement,
            bounds,
            confirmed: self.ctx.applied.confirmed(),
            order: self.ctx.settings.order,
        });
        Ok((palette, items))
    }

    fn check_surface(&self) -> Result<(SurfaceBounds, Vec<PaletteEntry>), RunError> {
        let bounds = self.surface.bounds().ok_or(RunError::NoSurface)?;
        let palette = self.surface.list();
        if palette.is_empty() {
            return Err(RunError::PaletteUnavailable);
        }
        Ok((bounds, palette))
    }

    fn report(&mut self, err: RunError) -> RunError {
        tracing::warn!(error = %err, "operation aborted");
        self.set_status(err.to_string(), Level::Error);
        self.notify(err.to_string(), Level::Error);
        err
    }

    fn persist(&mut self, reason: &str) -> bool {
        let text = match persist::snapshot(&self.ctx)
            .and_then(|snap| serde_json::to_string(&snap).map_err(Into::into))
        {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(?err, reason, "session snapshot failed");
                return false;
            }
        };
        match self.store.set(&self.session_key, &text) {
            Ok(()) => {
                tracing::debug!(reason, bytes = text.len(), "session saved");
                true
            }
            Err(err) => {
                tracing::warn!(?err, reason, "session store write failed");
                false
            }
        }
    }

    fn discard_snapshot(&mut self) {
        if let Err(err) = self.store.remove(&self.session_key) {
            tracing::warn!(?err, "session store remove failed");
        }
    }

    fn sync_lifecycle(&mut self) {
        if self.is_active() {
            self.transition(self.holds.lifecycle());
        }
    }

    fn transition(&mut self, next: RunLifecycle) {
        if !can_transition(self.lifecycle, next) {
            tracing::debug!(from = ?self.lifecycle, to = ?next, "lifecycle transition refused");
            return;
        }
        if self.lifecycle != next {
            tracing::debug!(from = ?self.lifecycle, to = ?next, "lifecycle transition");
        }
        self.lifecycle = next;
    }

    fn set_status(&mut self, message: impl Into<String>, level: Level) {
        self.status = StatusLine {
            message: message.into(),
            level,
        };
    }

    fn notify(&mut self, message: impl Into<String>, level: Level) {
        self.notices.push(Notice::new(message, level));
    }
}

impl<S: DrawingSurface, P: SessionStore> SignalHandler for Runner<S, P> {
    fn on_signal(&mut self, kind: SignalKind, at: Instant) {
        match kind {
            SignalKind::ResourceDepleted => self.on_depleted(at),
            SignalKind::ChallengeShown => self.on_challenge(true),
            SignalKind::ChallengeCleared => self.on_challenge(false),
        }
    }
}
