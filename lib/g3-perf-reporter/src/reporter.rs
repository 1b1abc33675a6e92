/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use foldhash::fast::FixedState;
use log::{debug, log, warn};

use g3_metrics::{Metric, MetricName, MetricsRegistry, MetricsRegistryListener};
use g3_perf_data::SlotFacility;

use crate::{ExportRegistry, ExportedMetric, PerfExportError, PerfReporterConfig, Registered};

const MIN_EMIT_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Stopped,
    Running,
}

type NameSet = HashSet<MetricName, FixedState>;

fn new_name_set() -> NameSet {
    HashSet::with_hasher(FixedState::with_seed(0))
}

struct TickState {
    // names already warned for
    muted: NameSet,
    // names found missing in the last tick only, their add notification
    // may still be on the way
    pending: NameSet,
}

impl TickState {
    fn new() -> Self {
        TickState {
            muted: new_name_set(),
            pending: new_name_set(),
        }
    }
}

/// State shared with the registry listener and the worker thread.
struct ReporterInner {
    facility: Arc<dyn SlotFacility>,
    config: PerfReporterConfig,
    exports: ExportRegistry,
    running: AtomicBool,
    // metrics that will never be exported
    rejected: Mutex<NameSet>,
    // held during a tick
    tick_state: Mutex<TickState>,
}

impl ReporterInner {
    fn register(&self, name: &MetricName, metric: &Metric) {
        let r = self.exports.register_with(name, || {
            ExportedMetric::build(self.facility.as_ref(), &self.config, name, metric)
        });
        match r {
            Ok(Registered::New) => debug!("perf data export added for {} {name}", metric.kind()),
            Ok(Registered::Existing) => {}
            Err(e) => {
                log!(e.severity(), "{e}");
                self.rejected.lock().unwrap().insert(name.clone());
            }
        }
    }

    fn tick(&self, metrics: &MetricsRegistry) {
        let mut state = self.tick_state.lock().unwrap();
        if !self.running.load(Ordering::Acquire) {
            return;
        }

        let mut missing = new_name_set();
        for (name, metric) in metrics.all_metrics() {
            match self.exports.lookup(&name) {
                Some(exported) => {
                    if !exported.refresh(&metric) && state.muted.insert(name.clone()) {
                        warn!(
                            "metric {name} changed kind from {} to {}, export stays unchanged",
                            exported.kind(),
                            metric.kind()
                        );
                    }
                }
                None => {
                    if self.rejected.lock().unwrap().contains(&name) {
                        continue;
                    }
                    // only warn if still missing one tick later
                    if state.pending.contains(&name) && state.muted.insert(name.clone()) {
                        let e = PerfExportError::MissingExportEntry(name.clone());
                        log!(e.severity(), "{e}");
                    }
                    missing.insert(name);
                }
            }
        }
        state.pending = missing;
    }
}

impl MetricsRegistryListener for ReporterInner {
    fn on_metric_added(&self, name: &MetricName, metric: &Metric) {
        self.register(name, metric);
    }

    fn on_metric_removed(&self, _name: &MetricName) {
        // slots are permanent
    }
}

struct Worker {
    quit_sender: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Control {
    listener: Option<Arc<dyn MetricsRegistryListener>>,
    worker: Option<Worker>,
    warned_unavailable: bool,
}

/// Periodic exporter of registry metrics to perf data slots.
///
/// Metrics are mapped to slots when they are added to the registry, and the
/// slots are refreshed on every tick. Mapped slots are kept until the process
/// exits, even after shutdown.
///
/// If the perf data facility is unavailable the reporter never leaves the
/// stopped state, and start calls only log a warning the first time.
pub struct PerfReporter {
    inner: Arc<ReporterInner>,
    metrics: Arc<MetricsRegistry>,
    control: Mutex<Control>,
}

impl PerfReporter {
    /// Create a reporter with a facility set up from `config`.
    pub fn new(config: PerfReporterConfig, metrics: Arc<MetricsRegistry>) -> Self {
        let facility = g3_perf_data::facility::init(&config.perf_data);
        PerfReporter::with_facility(config, metrics, facility)
    }

    pub fn with_facility(
        config: PerfReporterConfig,
        metrics: Arc<MetricsRegistry>,
        facility: Arc<dyn SlotFacility>,
    ) -> Self {
        let inner = ReporterInner {
            facility,
            config,
            exports: ExportRegistry::new(),
            running: AtomicBool::new(false),
            rejected: Mutex::new(new_name_set()),
            tick_state: Mutex::new(TickState::new()),
        };
        PerfReporter {
            inner: Arc::new(inner),
            metrics,
            control: Mutex::new(Control::default()),
        }
    }

    pub fn state(&self) -> ReporterState {
        if self.inner.running.load(Ordering::Acquire) {
            ReporterState::Running
        } else {
            ReporterState::Stopped
        }
    }

    #[inline]
    pub fn config(&self) -> &PerfReporterConfig {
        &self.inner.config
    }

    #[inline]
    pub fn exports(&self) -> &ExportRegistry {
        &self.inner.exports
    }

    /// Start exporting, ticking at the configured emit interval.
    pub fn start(&self) -> Result<(), PerfExportError> {
        self.start_with_period(self.inner.config.emit_interval)
    }

    /// Start exporting, with a worker thread that ticks every `period`.
    ///
    /// Periods shorter than 1ms are raised to 1ms. The only error is a
    /// failure to spawn the worker thread.
    pub fn start_with_period(&self, period: Duration) -> Result<(), PerfExportError> {
        let period = period.max(MIN_EMIT_INTERVAL);
        let mut control = self.control.lock().unwrap();
        if !self.subscribe(&mut control) {
            return Ok(());
        }

        let (quit_sender, quit_receiver) = mpsc::channel::<()>();
        let inner = Arc::clone(&self.inner);
        let metrics = Arc::clone(&self.metrics);
        let spawned = std::thread::Builder::new()
            .name("perf-reporter".to_string())
            .spawn(move || {
                let mut wait = period;
                loop {
                    match quit_receiver.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(_) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let instant_start = Instant::now();
                    inner.tick(&metrics);
                    wait = period.saturating_sub(instant_start.elapsed());
                }
            });
        match spawned {
            Ok(handle) => {
                control.worker = Some(Worker {
                    quit_sender,
                    handle,
                });
                Ok(())
            }
            Err(e) => {
                self.unsubscribe(&mut control);
                Err(PerfExportError::WorkerSpawn(e))
            }
        }
    }

    /// Start exporting without a worker thread. [`PerfReporter::tick`] is
    /// then to be called by an external scheduler.
    pub fn start_manual(&self) {
        let mut control = self.control.lock().unwrap();
        self.subscribe(&mut control);
    }

    /// Returns true if newly subscribed.
    fn subscribe(&self, control: &mut Control) -> bool {
        if control.listener.is_some() {
            return false;
        }
        if !self.inner.facility.is_available() {
            if !control.warned_unavailable {
                let e = PerfExportError::PlatformUnsupported(
                    "perf data facility is unavailable".to_string(),
                );
                log!(e.severity(), "{e}, metrics will not be exported");
                control.warned_unavailable = true;
            }
            return false;
        }

        self.inner.running.store(true, Ordering::Release);
        let listener: Arc<dyn MetricsRegistryListener> = self.inner.clone();
        self.metrics.add_listener(Arc::clone(&listener));
        control.listener = Some(listener);
        true
    }

    fn unsubscribe(&self, control: &mut Control) {
        self.inner.running.store(false, Ordering::Release);
        if let Some(listener) = control.listener.take() {
            self.metrics.remove_listener(&listener);
        }
    }

    /// Refresh the slots of all live metrics. Does nothing unless running.
    pub fn tick(&self) {
        self.inner.tick(&self.metrics);
    }

    /// Stop exporting and wait for the worker thread to quit.
    pub fn shutdown(&self) {
        let mut control = self.control.lock().unwrap();
        self.unsubscribe(&mut control);
        if let Some(worker) = control.worker.take() {
            let _ = worker.quit_sender.send(());
            if worker.handle.join().is_err() {
                warn!("perf reporter worker thread panicked");
            }
        }
    }
}

impl Drop for PerfReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use g3_perf_data::{
        FieldSlot, PerfData, SlotError, SlotSpec, SlotValue, SlotValueKind, Unavailable,
    };

    fn perf_data() -> Arc<PerfData> {
        Arc::new(PerfData::anonymous(256 * 1024).unwrap())
    }

    fn read_slot(perf: &PerfData, name: &str) -> Option<SlotValue> {
        perf.entries()
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.value)
    }

    fn wait_for_slot(perf: &PerfData, name: &str, value: SlotValue) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while read_slot(perf, name) != Some(value) {
            assert!(Instant::now() < deadline, "slot {name} never became {value}");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Fails every allocation after the first `limit` ones.
    struct LimitedFacility {
        inner: PerfData,
        limit: usize,
        count: AtomicUsize,
    }

    impl SlotFacility for LimitedFacility {
        fn is_available(&self) -> bool {
            true
        }

        fn allocate(&self, spec: SlotSpec) -> Result<FieldSlot, SlotError> {
            if self.count.fetch_add(1, Ordering::Relaxed) >= self.limit {
                return Err(SlotError::Exhausted {
                    name: spec.name,
                    requested: 0,
                    available: 0,
                });
            }
            self.inner.allocate(spec)
        }
    }

    #[test]
    fn counter_requests() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let requests = metrics.counter("requests").unwrap();
        let reporter =
            PerfReporter::with_facility(PerfReporterConfig::default(), metrics, perf.clone());
        reporter.start_manual();
        assert_eq!(reporter.state(), ReporterState::Running);

        reporter.tick();
        assert_eq!(
            read_slot(&perf, "metric.requests.count"),
            Some(SlotValue::Long(0))
        );

        requests.inc_by(5);
        reporter.tick();
        assert_eq!(
            read_slot(&perf, "metric.requests.count"),
            Some(SlotValue::Long(5))
        );
    }

    fn latency_mean(value_kind: SlotValueKind) -> Option<SlotValue> {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let mut config = PerfReporterConfig::default();
        config.value_kind = value_kind;
        let reporter = PerfReporter::with_facility(config, metrics.clone(), perf.clone());
        reporter.start_manual();

        let latency = metrics.timer("latency").unwrap();
        for _ in 0..10 {
            latency.update(Duration::from_micros(2500));
        }
        reporter.tick();
        assert_eq!(
            read_slot(&perf, "metric.latency.count"),
            Some(SlotValue::Long(10))
        );
        read_slot(&perf, "metric.latency.mean")
    }

    #[test]
    fn timer_latency() {
        assert_eq!(
            latency_mean(SlotValueKind::Double),
            Some(SlotValue::Double(2.5))
        );
        assert_eq!(latency_mean(SlotValueKind::Long), Some(SlotValue::Long(2)));
    }

    #[test]
    fn facility_unavailable() {
        let metrics = Arc::new(MetricsRegistry::new());
        metrics.counter("requests").unwrap();
        let reporter = PerfReporter::with_facility(
            PerfReporterConfig::default(),
            metrics.clone(),
            Arc::new(Unavailable::new("test")),
        );

        assert!(reporter.start().is_ok());
        assert!(reporter.start_with_period(Duration::from_millis(10)).is_ok());
        reporter.start_manual();
        assert_eq!(reporter.state(), ReporterState::Stopped);
        assert_eq!(metrics.listener_count(), 0);
        {
            let control = reporter.control.lock().unwrap();
            assert!(control.worker.is_none());
            assert!(control.warned_unavailable);
        }

        reporter.tick();
        assert!(reporter.exports().is_empty());
        reporter.shutdown();
    }

    #[test]
    fn unsupported_kinds() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        metrics.meter("marks").unwrap().mark(3);
        metrics.histogram("sizes").unwrap().update(100);
        let requests = metrics.counter("requests").unwrap();
        let reporter =
            PerfReporter::with_facility(PerfReporterConfig::default(), metrics, perf.clone());
        reporter.start_manual();

        requests.inc_by(7);
        reporter.tick();

        assert_eq!(reporter.exports().names(), vec![MetricName::new("requests")]);
        assert_eq!(perf.entry_count(), 1);
        assert_eq!(
            read_slot(&perf, "metric.requests.count"),
            Some(SlotValue::Long(7))
        );
        let state = reporter.inner.tick_state.lock().unwrap();
        assert!(state.muted.is_empty());
        assert!(state.pending.is_empty());
    }

    #[test]
    fn non_numeric_gauge() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let reporter = PerfReporter::with_facility(
            PerfReporterConfig::default(),
            metrics.clone(),
            perf.clone(),
        );
        reporter.start_manual();
        metrics.gauge("version", || "1.2.3").unwrap();

        reporter.tick();
        reporter.tick();
        assert_eq!(perf.entry_count(), 0);
        assert!(!reporter.exports().contains(&MetricName::new("version")));
        assert!(reporter.inner.tick_state.lock().unwrap().muted.is_empty());
    }

    #[test]
    fn idempotent_registration() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let name = MetricName::new("requests");
        let metric = Metric::Counter(metrics.counter(name.clone()).unwrap());
        let reporter =
            PerfReporter::with_facility(PerfReporterConfig::default(), metrics, perf.clone());
        reporter.start_manual();
        let first = reporter.exports().lookup(&name).unwrap();

        reporter.inner.on_metric_added(&name, &metric);
        reporter.inner.on_metric_added(&name, &metric);
        assert_eq!(perf.entry_count(), 1);
        assert!(Arc::ptr_eq(
            &first,
            &reporter.exports().lookup(&name).unwrap()
        ));
    }

    #[test]
    fn missing_entry_muted() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let reporter =
            PerfReporter::with_facility(PerfReporterConfig::default(), metrics.clone(), perf);
        reporter.start_manual();

        // added behind the listener's back
        metrics.remove_listener(reporter.control.lock().unwrap().listener.as_ref().unwrap());
        metrics.counter("late").unwrap();

        reporter.tick();
        {
            let state = reporter.inner.tick_state.lock().unwrap();
            assert!(state.muted.is_empty());
            assert!(state.pending.contains(&MetricName::new("late")));
        }

        reporter.tick();
        reporter.tick();
        let state = reporter.inner.tick_state.lock().unwrap();
        assert_eq!(state.muted.len(), 1);
        assert!(state.muted.contains(&MetricName::new("late")));
    }

    #[test]
    fn late_notification_not_warned() {
        let metrics = Arc::new(MetricsRegistry::new());
        let reporter = PerfReporter::with_facility(
            PerfReporterConfig::default(),
            metrics.clone(),
            perf_data(),
        );
        reporter.start_manual();

        // the tick runs between publishing and notifying
        let listener = reporter.control.lock().unwrap().listener.clone().unwrap();
        metrics.remove_listener(&listener);
        let name = MetricName::new("requests");
        let metric = Metric::Counter(metrics.counter(name.clone()).unwrap());
        reporter.tick();
        listener.on_metric_added(&name, &metric);

        reporter.tick();
        let state = reporter.inner.tick_state.lock().unwrap();
        assert!(state.muted.is_empty());
        assert!(state.pending.is_empty());
        drop(state);
        assert!(reporter.exports().contains(&name));
    }

    #[test]
    fn allocation_failure() {
        let facility = Arc::new(LimitedFacility {
            inner: PerfData::anonymous(64 * 1024).unwrap(),
            limit: 3,
            count: AtomicUsize::new(0),
        });
        let metrics = Arc::new(MetricsRegistry::new());
        let reporter = PerfReporter::with_facility(
            PerfReporterConfig::default(),
            metrics.clone(),
            facility.clone(),
        );
        reporter.start_manual();

        metrics.timer("latency").unwrap();
        assert!(!reporter.exports().contains(&MetricName::new("latency")));
        reporter.tick();
        reporter.tick();
        assert!(reporter.inner.tick_state.lock().unwrap().muted.is_empty());
        assert_eq!(facility.inner.entry_count(), 3);
    }

    #[test]
    fn concurrent_add_and_tick() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let reporter = PerfReporter::with_facility(
            PerfReporterConfig::default(),
            metrics.clone(),
            perf.clone(),
        );
        reporter.start_manual();

        let adder = {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for i in 0..40 {
                    metrics.timer(format!("timer{i}")).unwrap().update(Duration::from_millis(1));
                    metrics.counter(format!("counter{i}")).unwrap().inc();
                }
            })
        };

        let check = |reporter: &PerfReporter| {
            for name in reporter.exports().names() {
                let exported = reporter.exports().lookup(&name).unwrap();
                let expected = if name.name().starts_with("timer") {
                    16
                } else {
                    1
                };
                assert_eq!(exported.field_count(), expected, "metric {name}");
            }
        };
        while !adder.is_finished() {
            reporter.tick();
            check(&reporter);
        }
        adder.join().unwrap();
        reporter.tick();
        check(&reporter);

        assert_eq!(reporter.exports().len(), 80);
        assert_eq!(perf.entry_count(), 40 * 16 + 40);
        assert_eq!(
            read_slot(&perf, "metric.timer39.count"),
            Some(SlotValue::Long(1))
        );
    }

    #[test]
    fn worker_thread() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let requests = metrics.counter("requests").unwrap();
        let reporter = PerfReporter::with_facility(
            PerfReporterConfig::default(),
            metrics.clone(),
            perf.clone(),
        );
        reporter.start_with_period(Duration::from_millis(5)).unwrap();
        // already running
        reporter.start_with_period(Duration::from_millis(5)).unwrap();
        assert_eq!(metrics.listener_count(), 1);

        requests.inc_by(3);
        wait_for_slot(&perf, "metric.requests.count", SlotValue::Long(3));

        reporter.shutdown();
        assert_eq!(reporter.state(), ReporterState::Stopped);
        assert_eq!(metrics.listener_count(), 0);
        assert!(reporter.control.lock().unwrap().worker.is_none());

        requests.inc_by(3);
        reporter.tick();
        assert_eq!(
            read_slot(&perf, "metric.requests.count"),
            Some(SlotValue::Long(3))
        );
        // shut down twice
        reporter.shutdown();
    }

    #[test]
    fn configured_emit_interval() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let requests = metrics.counter("requests").unwrap();
        let mut config = PerfReporterConfig::default();
        config.emit_interval = Duration::from_millis(5);
        let reporter = PerfReporter::with_facility(config, metrics, perf.clone());
        reporter.start().unwrap();

        requests.inc_by(4);
        wait_for_slot(&perf, "metric.requests.count", SlotValue::Long(4));
        reporter.shutdown();
    }

    #[test]
    fn zero_period() {
        let perf = perf_data();
        let metrics = Arc::new(MetricsRegistry::new());
        let requests = metrics.counter("requests").unwrap();
        let reporter =
            PerfReporter::with_facility(PerfReporterConfig::default(), metrics, perf.clone());
        reporter.start_with_period(Duration::ZERO).unwrap();

        requests.inc_by(2);
        wait_for_slot(&perf, "metric.requests.count", SlotValue::Long(2));
        reporter.shutdown();
        assert!(reporter.control.lock().unwrap().worker.is_none());
    }

    #[test]
    fn file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf").join("app.perf");
        let mut config = PerfReporterConfig::with_prefix("app");
        config.perf_data.set_path(path.clone());
        config.perf_data.set_capacity(8192);

        let metrics = Arc::new(MetricsRegistry::new());
        let reporter = PerfReporter::new(config, metrics.clone());
        reporter.start_manual();
        metrics.counter("requests").unwrap().inc_by(42);
        reporter.tick();
        reporter.shutdown();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 8192);
        assert_eq!(&data[..6], b"G3PERF");
        let name = b"app.requests.count\0";
        let pos = data
            .windows(name.len())
            .position(|w| w == name)
            .unwrap();
        // value follows the name padded to 8 bytes
        let value_at = pos + 24;
        let value = i64::from_ne_bytes(data[value_at..value_at + 8].try_into().unwrap());
        assert_eq!(value, 42);
    }
}
