//! Idle monitor background task and its handle

use std::{
    future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::config::IdleSettings;

use super::{
    activity::{ActivityKind, ActivityThrottle, InputSurface},
    controller::{MonitorSnapshot, TimerController, TimerFire},
    policy::ExpiryPolicy,
};

/// Callback invoked by the warning surface
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked by the monitor with the epoch the firing deadline was
/// armed under; compare it with [`IdleMonitor::epoch`] to spot stale fires
pub type FireCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Options supplied by the hosting session layer
#[derive(Clone)]
pub struct IdleOptions {
    pub settings: IdleSettings,
    pub on_idle: FireCallback,
    pub on_warning: Option<FireCallback>,
    pub enabled: bool,
}

impl IdleOptions {
    pub fn new(settings: IdleSettings, on_idle: FireCallback) -> Self {
        Self {
            settings,
            on_idle,
            on_warning: None,
            enabled: false,
        }
    }

    pub fn with_warning(mut self, on_warning: FireCallback) -> Self {
        self.on_warning = Some(on_warning);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug)]
enum MonitorCommand {
    Reset,
    Clear,
    SetEnabled(bool),
    Shutdown,
}

/// Handle to a running idle monitor.
///
/// All timer state lives inside the monitor task, so every command is
/// applied within one loop turn and a cancelled deadline can never fire.
/// Every command also advances the epoch before it is queued, so a fire
/// that was already in flight carries an older epoch than [`IdleMonitor::epoch`].
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    commands: mpsc::UnboundedSender<MonitorCommand>,
    epoch: Arc<AtomicU64>,
    snapshot_rx: watch::Receiver<MonitorSnapshot>,
    policy: ExpiryPolicy,
}

impl IdleMonitor {
    /// Spawn the monitor task on the current runtime
    pub fn spawn(options: IdleOptions, input: InputSurface) -> (Self, JoinHandle<()>) {
        let policy = ExpiryPolicy::new(options.settings, options.on_warning.is_some());
        let controller = TimerController::new(policy);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let epoch = Arc::new(AtomicU64::new(0));

        let handle = tokio::spawn(idle_monitor_task(
            controller,
            options,
            input,
            command_rx,
            snapshot_tx,
            Arc::clone(&epoch),
        ));

        (
            Self {
                commands,
                epoch,
                snapshot_rx,
                policy,
            },
            handle,
        )
    }

    /// Force a fresh countdown; ignored while disabled
    pub fn reset_timer(&self) {
        self.send(MonitorCommand::Reset);
    }

    /// Disarm both pending callbacks
    pub fn clear_timeouts(&self) {
        self.send(MonitorCommand::Clear);
    }

    /// Enabling an already enabled monitor starts a fresh idle period
    pub fn set_enabled(&self, enabled: bool) {
        self.send(MonitorCommand::SetEnabled(enabled));
    }

    /// Latest epoch; a fire tagged with anything else has been superseded
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.send(MonitorCommand::Shutdown);
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    fn send(&self, command: MonitorCommand) {
        advance(&self.epoch);
        if let Err(e) = self.commands.send(command) {
            warn!("Idle monitor is no longer running, dropped {:?}", e.0);
        }
    }
}

async fn idle_monitor_task(
    mut controller: TimerController,
    options: IdleOptions,
    input: InputSurface,
    mut command_rx: mpsc::UnboundedReceiver<MonitorCommand>,
    snapshot_tx: watch::Sender<MonitorSnapshot>,
    epoch: Arc<AtomicU64>,
) {
    info!(
        "Starting idle monitor: idle={:?}, warning lead={:?}",
        options.settings.idle_duration, options.settings.warning_lead_time
    );

    let mut throttle = ActivityThrottle::new();
    let mut listener: Option<broadcast::Receiver<ActivityKind>> = None;

    if options.enabled {
        controller.set_epoch(epoch.load(Ordering::SeqCst));
        apply_enabled(&mut controller, &mut throttle, &mut listener, &input, true);
        publish(&snapshot_tx, &controller);
    }

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else {
                    debug!("All monitor handles dropped");
                    break;
                };
                // The sender advanced the epoch before queueing; anything
                // queued after this command has advanced it further
                controller.set_epoch(epoch.load(Ordering::SeqCst));
                match command {
                    MonitorCommand::Reset => controller.reset_timer(Instant::now()),
                    MonitorCommand::Clear => controller.clear_timeouts(),
                    MonitorCommand::SetEnabled(enabled) => {
                        apply_enabled(&mut controller, &mut throttle, &mut listener, &input, enabled);
                    }
                    MonitorCommand::Shutdown => break,
                }
                publish(&snapshot_tx, &controller);
            }

            event = next_activity(&mut listener) => {
                match event {
                    Ok(kind) => {
                        if throttle.observe(Instant::now()) {
                            debug!("Activity detected: {}", kind);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Activity listener lagged by {} events", skipped);
                        throttle.observe(Instant::now());
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Input surface closed, detaching activity listener");
                        listener = None;
                    }
                }
            }

            _ = sleep_until_opt(throttle.window_end()) => {
                let now = Instant::now();
                if throttle.due(now) {
                    controller.set_epoch(advance(&epoch));
                    controller.reset_timer(now);
                    publish(&snapshot_tx, &controller);
                }
            }

            _ = sleep_until_opt(controller.next_deadline()) => {
                let fired = controller.fire_due(Instant::now());
                let fired_epoch = controller.epoch();
                publish(&snapshot_tx, &controller);
                for fire in fired {
                    match fire {
                        TimerFire::Warning => {
                            info!("Idle warning reached");
                            if let Some(on_warning) = &options.on_warning {
                                on_warning(fired_epoch);
                            }
                        }
                        TimerFire::Idle => {
                            info!("Session idle timeout reached");
                            (options.on_idle)(fired_epoch);
                        }
                    }
                }
            }
        }
    }

    controller.clear_timeouts();
    publish(&snapshot_tx, &controller);
    info!("Idle monitor stopped");
}

fn apply_enabled(
    controller: &mut TimerController,
    throttle: &mut ActivityThrottle,
    listener: &mut Option<broadcast::Receiver<ActivityKind>>,
    input: &InputSurface,
    enabled: bool,
) {
    let now = Instant::now();
    if !controller.set_enabled(enabled, now) {
        // Re-enabling still starts over so the new epoch owns the deadlines
        if enabled {
            controller.reset_timer(now);
        }
        return;
    }

    if enabled {
        *listener = Some(input.subscribe());
        info!("Idle monitoring enabled");
    } else {
        *listener = None;
        throttle.cancel();
        info!("Idle monitoring disabled");
    }
}

fn advance(epoch: &AtomicU64) -> u64 {
    epoch.fetch_add(1, Ordering::SeqCst) + 1
}

fn publish(snapshot_tx: &watch::Sender<MonitorSnapshot>, controller: &TimerController) {
    snapshot_tx.send_replace(controller.snapshot());
}

async fn next_activity(
    listener: &mut Option<broadcast::Receiver<ActivityKind>>,
) -> Result<ActivityKind, broadcast::error::RecvError> {
    match listener {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Mutex,
        time::Duration,
    };

    use tokio::time::sleep;

    use super::*;

    type Log = Arc<Mutex<Vec<(TimerFire, Duration)>>>;

    fn recording(settings: IdleSettings, start: Instant) -> (IdleOptions, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));

        let idle_log = Arc::clone(&log);
        let on_idle: FireCallback = Arc::new(move |_epoch| {
            idle_log.lock().unwrap().push((TimerFire::Idle, start.elapsed()));
        });
        let warning_log = Arc::clone(&log);
        let on_warning: FireCallback = Arc::new(move |_epoch| {
            warning_log.lock().unwrap().push((TimerFire::Warning, start.elapsed()));
        });

        (IdleOptions::new(settings, on_idle).with_warning(on_warning), log)
    }

    fn entries(log: &Log) -> Vec<(TimerFire, Duration)> {
        log.lock().unwrap().clone()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn untouched_session_warns_then_expires_once() {
        let start = Instant::now();
        let (options, log) = recording(IdleSettings::from_millis(5000, 2000), start);
        let (_monitor, _task) = IdleMonitor::spawn(options.enabled(true), InputSurface::new());

        sleep(ms(20_000)).await;

        assert_eq!(
            entries(&log),
            vec![(TimerFire::Warning, ms(3000)), (TimerFire::Idle, ms(5000))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_postpones_both_callbacks() {
        let start = Instant::now();
        let (options, log) = recording(IdleSettings::from_millis(5000, 2000), start);
        let (monitor, _task) = IdleMonitor::spawn(options.enabled(true), InputSurface::new());

        sleep(ms(2000)).await;
        monitor.reset_timer();
        monitor.reset_timer();
        monitor.reset_timer();
        sleep(ms(20_000)).await;

        assert_eq!(
            entries(&log),
            vec![(TimerFire::Warning, ms(5000)), (TimerFire::Idle, ms(7000))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_lead_time_only_expires() {
        let start = Instant::now();
        let (options, log) = recording(IdleSettings::from_millis(5000, 0), start);
        let (_monitor, _task) = IdleMonitor::spawn(options.enabled(true), InputSurface::new());

        sleep(ms(10_000)).await;

        assert_eq!(entries(&log), vec![(TimerFire::Idle, ms(5000))]);
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_cancels_until_reenabled() {
        let start = Instant::now();
        let input = InputSurface::new();
        let (options, log) = recording(IdleSettings::from_millis(5000, 2000), start);
        let (monitor, _task) = IdleMonitor::spawn(options.enabled(true), input.clone());

        sleep(ms(1000)).await;
        assert_eq!(input.listener_count(), 1);
        monitor.set_enabled(false);
        monitor.reset_timer();
        sleep(ms(30_000)).await;
        assert!(entries(&log).is_empty());
        assert_eq!(input.listener_count(), 0);
        assert!(!monitor.snapshot().enabled);

        monitor.set_enabled(true);
        sleep(ms(10_000)).await;
        assert_eq!(
            entries(&log),
            vec![(TimerFire::Warning, ms(34_000)), (TimerFire::Idle, ms(36_000))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn activity_burst_yields_single_reset() {
        let start = Instant::now();
        let input = InputSurface::new();
        let (options, log) = recording(IdleSettings::from_millis(5000, 2000), start);
        let (monitor, _task) = IdleMonitor::spawn(options.enabled(true), input.clone());

        sleep(ms(1000)).await;
        for kind in ActivityKind::ALL {
            input.emit(kind);
            sleep(ms(100)).await;
        }
        // Window opened by the first event at 1000ms closes at 2000ms
        sleep(ms(400)).await;
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.last_activity, Some(start + ms(2000)));
        assert_eq!(snapshot.warning_deadline, Some(start + ms(5000)));
        assert_eq!(snapshot.idle_deadline, Some(start + ms(7000)));

        sleep(ms(20_000)).await;
        assert_eq!(
            entries(&log),
            vec![(TimerFire::Warning, ms(5000)), (TimerFire::Idle, ms(7000))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn activity_is_ignored_while_disabled() {
        let start = Instant::now();
        let input = InputSurface::new();
        let (options, log) = recording(IdleSettings::from_millis(5000, 2000), start);
        let (monitor, _task) = IdleMonitor::spawn(options, input.clone());

        sleep(ms(10)).await;
        assert_eq!(input.emit(ActivityKind::KeyPress), 0);
        sleep(ms(10_000)).await;

        assert!(entries(&log).is_empty());
        assert_eq!(monitor.snapshot().last_activity, None);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_timeouts_disarms_without_disabling() {
        let start = Instant::now();
        let (options, log) = recording(IdleSettings::from_millis(5000, 2000), start);
        let (monitor, _task) = IdleMonitor::spawn(options.enabled(true), InputSurface::new());

        sleep(ms(1000)).await;
        monitor.clear_timeouts();
        monitor.clear_timeouts();
        sleep(ms(10_000)).await;

        let snapshot = monitor.snapshot();
        assert!(snapshot.enabled);
        assert_eq!(snapshot.idle_deadline, None);
        assert!(entries(&log).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_task() {
        let (options, _log) = recording(IdleSettings::default(), Instant::now());
        let (monitor, task) = IdleMonitor::spawn(options.enabled(true), InputSurface::new());

        monitor.shutdown();
        task.await.unwrap();
        assert_eq!(monitor.snapshot().idle_deadline, None);
    }

    #[tokio::test(start_paused = true)]
    async fn lead_beyond_idle_warns_immediately() {
        let start = Instant::now();
        let (options, log) = recording(IdleSettings::from_millis(2000, 5000), start);
        let (_monitor, _task) = IdleMonitor::spawn(options.enabled(true), InputSurface::new());

        sleep(ms(10_000)).await;

        assert_eq!(
            entries(&log),
            vec![(TimerFire::Warning, ms(0)), (TimerFire::Idle, ms(2000))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fires_carry_the_epoch_they_were_armed_under() {
        let input = InputSurface::new();
        let epochs = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&epochs);
        let on_idle: FireCallback = Arc::new(move |epoch| seen.lock().unwrap().push(epoch));
        let options = IdleOptions::new(IdleSettings::from_millis(5000, 0), on_idle).enabled(true);
        let (monitor, _task) = IdleMonitor::spawn(options, input.clone());

        sleep(ms(6000)).await;
        assert_eq!(*epochs.lock().unwrap(), vec![0]);

        monitor.reset_timer();
        let armed = monitor.epoch();
        assert_eq!(armed, 1);
        sleep(ms(6000)).await;
        assert_eq!(*epochs.lock().unwrap(), vec![0, 1]);
        assert_eq!(monitor.snapshot().epoch, 1);

        // Throttled activity resets advance the epoch as well
        input.emit(ActivityKind::PointerMove);
        sleep(ms(1500)).await;
        assert_eq!(monitor.epoch(), 2);
        assert_eq!(monitor.snapshot().epoch, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn enabling_twice_restarts_the_period() {
        let start = Instant::now();
        let (options, log) = recording(IdleSettings::from_millis(5000, 2000), start);
        let (monitor, _task) = IdleMonitor::spawn(options.enabled(true), InputSurface::new());

        sleep(ms(2000)).await;
        monitor.set_enabled(true);
        sleep(ms(20_000)).await;

        assert_eq!(
            entries(&log),
            vec![(TimerFire::Warning, ms(5000)), (TimerFire::Idle, ms(7000))]
        );
    }
}
