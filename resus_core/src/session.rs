//! Session controller: tick scheduling and screen retention.
//!
//! The controller owns the `ResusSession` and the resources that follow
//! its active flag: a one-second `Ticker` delivering tick callbacks, and
//! a `ScreenRetention` collaborator (platform wake lock). Both are
//! best-effort externals; retention failures are logged and never
//! propagated.

use crate::state::ResusSession;
use crate::types::{Drug, Rhythm};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Repeating background task calling a closure at a fixed period
///
/// The thread is detached on stop; at most one extra callback can fire
/// after `stop()`, which is harmless because `tick()` no-ops while the
/// session is inactive.
pub struct Ticker {
    stop: Arc<AtomicBool>,
}

impl Ticker {
    /// Spawn a ticker firing `f` every `period`
    pub fn spawn<F>(period: Duration, mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        thread::spawn(move || loop {
            thread::sleep(period);
            if flag.load(Ordering::Relaxed) {
                break;
            }
            f();
        });
        Self { stop }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Platform screen-wake-lock seam
///
/// Implementations keep the display on while a resuscitation is running.
pub trait ScreenRetention {
    fn acquire(&mut self) -> std::io::Result<()>;
    fn release(&mut self) -> std::io::Result<()>;
}

/// Default no-op retention for platforms without a wake-lock API
#[derive(Debug, Default)]
pub struct NoopScreenRetention;

impl ScreenRetention for NoopScreenRetention {
    fn acquire(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn release(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Owns the session plus its tick source and screen retention
pub struct SessionController<R: ScreenRetention = NoopScreenRetention> {
    session: ResusSession,
    retention: R,
    on_tick: Option<TickCallback>,
    ticker: Option<Ticker>,
}

impl SessionController<NoopScreenRetention> {
    pub fn new() -> Self {
        Self::with_retention(NoopScreenRetention)
    }
}

impl Default for SessionController<NoopScreenRetention> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ScreenRetention> SessionController<R> {
    pub fn with_retention(retention: R) -> Self {
        Self {
            session: ResusSession::new(),
            retention,
            on_tick: None,
            ticker: None,
        }
    }

    /// Install the tick delivery callback; without one the controller
    /// runs untimed (ticks arrive via explicit `tick()` calls only)
    pub fn with_ticker<F>(mut self, on_tick: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_tick = Some(Arc::new(on_tick));
        self
    }

    pub fn session(&self) -> &ResusSession {
        &self.session
    }

    /// Start or resume; spawns the ticker and acquires the wake lock
    pub fn start(&mut self) {
        self.session.start();
        self.acquire_retention();
        if self.ticker.is_none() {
            if let Some(on_tick) = self.on_tick.clone() {
                self.ticker = Some(Ticker::spawn(Duration::from_secs(1), move || on_tick()));
            }
        }
    }

    /// Pause; cancels the ticker and releases the wake lock
    pub fn pause(&mut self) {
        self.session.pause();
        self.teardown_timing();
    }

    /// End the resuscitation; timer resources are torn down, records
    /// remain legal
    pub fn end(&mut self) {
        self.session.end();
        self.teardown_timing();
    }

    /// Full reset; destructive, caller confirms
    pub fn reset_all(&mut self) {
        self.session.reset_all();
        self.teardown_timing();
    }

    /// Advance timers by one second (delivered by the ticker or a
    /// scripted driver)
    pub fn tick(&mut self) {
        self.session.tick();
    }

    /// Re-acquire the wake lock after the display regained visibility
    pub fn refresh_retention(&mut self) {
        if self.session.state().active {
            self.acquire_retention();
        }
    }

    pub fn reset_cycle(&mut self) {
        self.session.reset_cycle();
    }

    pub fn record_shock(&mut self) {
        self.session.record_shock();
    }

    pub fn record_rhythm(&mut self, rhythm: Rhythm) {
        self.session.record_rhythm(rhythm);
    }

    pub fn record_drug(&mut self, drug: Drug) {
        self.session.record_drug(drug);
    }

    pub fn record_procedure(&mut self, action: impl Into<String>, action_cn: impl Into<String>) {
        self.session.record_procedure(action, action_cn);
    }

    pub fn record_airway(&mut self) {
        self.session.record_airway();
    }

    fn acquire_retention(&mut self) {
        if let Err(e) = self.retention.acquire() {
            tracing::warn!("screen retention acquire failed: {}", e);
        }
    }

    fn teardown_timing(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        if let Err(e) = self.retention.release() {
            tracing::warn!("screen retention release failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRetention {
        fail: bool,
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScreenRetention for RecordingRetention {
        fn acquire(&mut self) -> std::io::Result<()> {
            self.events.lock().unwrap().push("acquire");
            if self.fail {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "denied"));
            }
            Ok(())
        }

        fn release(&mut self) -> std::io::Result<()> {
            self.events.lock().unwrap().push("release");
            Ok(())
        }
    }

    #[test]
    fn test_ticker_fires_and_stops() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let ticker = Ticker::spawn(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        thread::sleep(Duration::from_millis(100));
        ticker.stop();
        let at_stop = count.load(Ordering::Relaxed);
        assert!(at_stop >= 1);

        // Allow at most one in-flight callback after stop
        thread::sleep(Duration::from_millis(50));
        assert!(count.load(Ordering::Relaxed) <= at_stop + 1);
    }

    #[test]
    fn test_retention_follows_active_flag() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let retention = RecordingRetention {
            events: Arc::clone(&events),
            ..Default::default()
        };
        let mut controller = SessionController::with_retention(retention);

        controller.start();
        controller.pause();
        controller.start();
        controller.end();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["acquire", "release", "acquire", "release"]
        );
    }

    #[test]
    fn test_retention_failure_is_non_fatal() {
        let retention = RecordingRetention {
            fail: true,
            ..Default::default()
        };
        let mut controller = SessionController::with_retention(retention);

        controller.start();
        assert!(controller.session().state().active);
    }

    #[test]
    fn test_refresh_only_while_active() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let retention = RecordingRetention {
            events: Arc::clone(&events),
            ..Default::default()
        };
        let mut controller = SessionController::with_retention(retention);

        controller.refresh_retention();
        assert!(events.lock().unwrap().is_empty());

        controller.start();
        controller.refresh_retention();
        assert_eq!(*events.lock().unwrap(), vec!["acquire", "acquire"]);
    }

    #[test]
    fn test_untimed_controller_ticks_manually() {
        let mut controller = SessionController::new();
        controller.start();
        for _ in 0..3 {
            controller.tick();
        }
        assert_eq!(controller.session().state().elapsed_seconds, 3);
    }
}
