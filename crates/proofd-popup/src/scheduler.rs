use crate::timer::{TimerId, Timers};
use chrono::{DateTime, TimeZone};
use proofd_core::config::{Config, TimingConfig};
use proofd_core::event::PurchaseEvent;
use proofd_core::position::SlideVector;
use proofd_core::view::{self, ViewModel};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupId(pub(crate) u64);

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of one popup. `Idle` is the absence of a popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Sliding in.
    Entering,
    /// Fully shown, waiting out the display duration.
    Visible,
    /// Sliding out.
    Exiting,
    Removed,
}

/// Timer kinds. Transitions sort before ticks so a popup due for removal is
/// gone before a tick at the same instant checks the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TimerKind {
    Transition(PopupId),
    Tick,
}

/// Work the scheduler wants the caller to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fetch one purchase event and hand it back via `deliver` or `fetch_failed`.
    FetchEvent,
    /// Materialize a new popup at its entrance offset.
    Mount { id: PopupId, view: Box<ViewModel> },
    /// Entrance finished; popup is at rest.
    Reveal { id: PopupId },
    /// Start the exit animation.
    BeginExit { id: PopupId },
    /// Exit finished; drop the popup.
    Unmount { id: PopupId },
}

#[derive(Debug, Clone)]
pub struct PopupInstance {
    pub id: PopupId,
    pub event: PurchaseEvent,
    pub view: ViewModel,
    pub lifecycle: Lifecycle,
    /// When the current lifecycle phase began.
    pub phase_started: Instant,
    timing: TimingConfig,
    allow_close: bool,
}

/// Animation state of the live popup at some instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub opacity: f64,
    pub offset_x: f64,
}

pub struct Scheduler {
    config: Config,
    timers: Timers<TimerKind>,
    tick: Option<TimerId>,
    /// The occupancy lock: at most one popup between Entering and Exiting.
    active: Option<PopupInstance>,
    /// Pending transition of the active popup.
    transition: Option<TimerId>,
    next_id: u64,
}

impl Scheduler {
    pub fn new(config: Config) -> Self {
        warn_on_overlap(&config);
        Self {
            config,
            timers: Timers::default(),
            tick: None,
            active: None,
            transition: None,
            next_id: 1,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn active(&self) -> Option<&PopupInstance> {
        self.active.as_ref()
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Arm the tick timer so the first cycle runs right away.
    pub fn start(&mut self, now: Instant) -> Vec<Action> {
        if let Some(id) = self.tick.take() {
            self.timers.cancel(id);
        }
        self.tick = Some(self.timers.schedule(now, TimerKind::Tick));
        self.check_timer(now)
    }

    /// Replace the config. The popup on screen keeps the timing it started with.
    pub fn reload(&mut self, config: Config) {
        warn_on_overlap(&config);
        self.config = config;
    }

    /// Earliest instant at which `check_timer` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn check_timer(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Some((id, due, kind)) = self.timers.pop_due(now) {
            match kind {
                TimerKind::Tick => actions.extend(self.on_tick(due, now)),
                TimerKind::Transition(popup) => actions.extend(self.on_transition(id, popup, due)),
            }
        }
        actions
    }

    fn on_tick(&mut self, due: Instant, now: Instant) -> Vec<Action> {
        let interval = self.config.timing.interval.max(Duration::from_millis(1));
        let mut next = due + interval;
        while next <= now {
            debug!("skipping missed tick");
            next += interval;
        }
        self.tick = Some(self.timers.schedule(next, TimerKind::Tick));

        if let Some(active) = &self.active {
            debug!(id = %active.id, state = ?active.lifecycle, "tick while popup is showing, dropped");
            return Vec::new();
        }
        vec![Action::FetchEvent]
    }

    fn on_transition(&mut self, timer: TimerId, popup: PopupId, at: Instant) -> Vec<Action> {
        if self.transition == Some(timer) {
            self.transition = None;
        }
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        if active.id != popup {
            return Vec::new();
        }

        match active.lifecycle {
            Lifecycle::Entering => {
                active.lifecycle = Lifecycle::Visible;
                active.phase_started = at;
                let due = at + active.timing.display_duration;
                debug!(id = %popup, "popup visible");
                self.transition = Some(self.timers.schedule(due, TimerKind::Transition(popup)));
                vec![Action::Reveal { id: popup }]
            }
            Lifecycle::Visible => {
                debug!(id = %popup, "display time elapsed");
                self.begin_exit(at)
            }
            Lifecycle::Exiting => {
                active.lifecycle = Lifecycle::Removed;
                debug!(id = %popup, "popup removed");
                self.active = None;
                vec![Action::Unmount { id: popup }]
            }
            Lifecycle::Removed => Vec::new(),
        }
    }

    fn begin_exit(&mut self, at: Instant) -> Vec<Action> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        if let Some(pending) = self.transition.take() {
            self.timers.cancel(pending);
        }
        active.lifecycle = Lifecycle::Exiting;
        active.phase_started = at;
        let id = active.id;
        let due = at + active.timing.animation_duration;
        self.transition = Some(self.timers.schedule(due, TimerKind::Transition(id)));
        vec![Action::BeginExit { id }]
    }

    /// A fetched event arrived. Takes the lock and starts the entrance, or
    /// drops the event when a popup is already showing.
    pub fn deliver<Tz>(&mut self, event: PurchaseEvent, now: Instant, wall_clock: &DateTime<Tz>) -> Vec<Action>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if let Some(active) = &self.active {
            debug!(id = %active.id, customer = %event.customer, "popup busy, dropping event");
            return Vec::new();
        }

        let id = PopupId(self.next_id);
        self.next_id += 1;

        let view = view::build(&self.config, &event, wall_clock);
        let timing = self.config.timing.clone();
        let due = now + timing.animation_duration;
        self.active = Some(PopupInstance {
            id,
            event,
            view: view.clone(),
            lifecycle: Lifecycle::Entering,
            phase_started: now,
            timing,
            allow_close: self.config.display.allow_close,
        });
        self.transition = Some(self.timers.schedule(due, TimerKind::Transition(id)));
        debug!(id = %id, "popup entering");

        vec![Action::Mount { id, view: Box::new(view) }]
    }

    /// A fetch failed. The cycle is skipped; the next tick tries again.
    pub fn fetch_failed(&mut self, error: &dyn fmt::Display) -> Vec<Action> {
        warn!(error = %error, "failed to fetch purchase event, skipping cycle");
        Vec::new()
    }

    /// Explicit close from the shopper. Only honoured while the popup is
    /// fully visible and closing is allowed.
    pub fn close(&mut self, id: PopupId, now: Instant) -> Vec<Action> {
        let allow_close = match &self.active {
            Some(active) if active.id == id && active.lifecycle == Lifecycle::Visible => active.allow_close,
            _ => return Vec::new(),
        };
        if !allow_close {
            debug!(id = %id, "close requested but closing is disabled");
            return Vec::new();
        }
        debug!(id = %id, "popup closed");
        self.begin_exit(now)
    }

    /// Animation frame of the active popup at `now`.
    pub fn frame(&self, now: Instant) -> Option<Frame> {
        let active = self.active.as_ref()?;
        let slide: SlideVector = active.view.placement.slide_in;
        let elapsed = now.saturating_duration_since(active.phase_started);
        let animation = active.timing.animation_duration.as_secs_f64();
        let progress = if animation > 0.0 {
            (elapsed.as_secs_f64() / animation).min(1.0)
        } else {
            1.0
        };
        let eased = 1.0 - (1.0 - progress).powi(2);

        let frame = match active.lifecycle {
            Lifecycle::Entering => Frame {
                opacity: eased,
                offset_x: slide.entering_offset(eased),
            },
            Lifecycle::Visible => Frame { opacity: 1.0, offset_x: 0.0 },
            Lifecycle::Exiting => Frame {
                opacity: 1.0 - eased,
                offset_x: slide.exiting_offset(eased),
            },
            Lifecycle::Removed => return None,
        };
        Some(frame)
    }
}

fn warn_on_overlap(config: &Config) {
    if config.cycles_overlap() {
        warn!(
            interval_ms = config.timing.interval.as_millis() as u64,
            cycle_ms = config.timing.cycle_length().as_millis() as u64,
            "interval is shorter than one popup cycle; some ticks will be skipped"
        );
    }
}
