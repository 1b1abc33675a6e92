/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use foldhash::fast::FixedState;
use thiserror::Error;

use crate::{Counter, Gauge, GaugeValue, Histogram, Meter, Metric, MetricKind, MetricName, Timer};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric {name} has already been registered as a {existing}")]
    KindConflict { name: MetricName, existing: MetricKind },
}

/// Receiver of registry change notifications.
///
/// Notifications are delivered on the thread that changed the registry,
/// with no registry lock held.
pub trait MetricsRegistryListener: Send + Sync {
    fn on_metric_added(&self, name: &MetricName, metric: &Metric);
    fn on_metric_removed(&self, name: &MetricName);
}

type ArcListener = Arc<dyn MetricsRegistryListener>;

pub struct MetricsRegistry {
    metrics: Mutex<HashMap<MetricName, Metric, FixedState>>,
    listeners: Mutex<Vec<ArcListener>>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        MetricsRegistry::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        MetricsRegistry {
            metrics: Mutex::new(HashMap::with_hasher(FixedState::with_seed(0))),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn counter<N: Into<MetricName>>(&self, name: N) -> Result<Arc<Counter>, MetricsError> {
        self.get_or_add(
            name.into(),
            || Metric::Counter(Arc::new(Counter::new())),
            |m| m.as_counter().cloned(),
        )
    }

    /// Get the gauge with `name`, or register one computed by `f`.
    pub fn gauge<N, F, T>(&self, name: N, f: F) -> Result<Arc<Gauge>, MetricsError>
    where
        N: Into<MetricName>,
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<GaugeValue>,
    {
        self.get_or_add(
            name.into(),
            || Metric::Gauge(Arc::new(Gauge::new(f))),
            |m| m.as_gauge().cloned(),
        )
    }

    pub fn meter<N: Into<MetricName>>(&self, name: N) -> Result<Arc<Meter>, MetricsError> {
        self.get_or_add(
            name.into(),
            || Metric::Meter(Arc::new(Meter::new())),
            |m| m.as_meter().cloned(),
        )
    }

    pub fn histogram<N: Into<MetricName>>(
        &self,
        name: N,
    ) -> Result<Arc<Histogram>, MetricsError> {
        self.get_or_add(
            name.into(),
            || Metric::Histogram(Arc::new(Histogram::new())),
            |m| m.as_histogram().cloned(),
        )
    }

    pub fn timer<N: Into<MetricName>>(&self, name: N) -> Result<Arc<Timer>, MetricsError> {
        self.get_or_add(
            name.into(),
            || Metric::Timer(Arc::new(Timer::new())),
            |m| m.as_timer().cloned(),
        )
    }

    fn get_or_add<T, F, G>(
        &self,
        name: MetricName,
        create: F,
        extract: G,
    ) -> Result<Arc<T>, MetricsError>
    where
        F: FnOnce() -> Metric,
        G: Fn(&Metric) -> Option<Arc<T>>,
    {
        let mut ht = self.metrics.lock().unwrap();
        if let Some(metric) = ht.get(&name) {
            return extract(metric).ok_or_else(|| MetricsError::KindConflict {
                existing: metric.kind(),
                name,
            });
        }
        let metric = create();
        ht.insert(name.clone(), metric.clone());
        drop(ht);

        self.notify_added(&name, &metric);
        extract(&metric).ok_or(MetricsError::KindConflict {
            existing: metric.kind(),
            name,
        })
    }

    pub fn get(&self, name: &MetricName) -> Option<Metric> {
        let ht = self.metrics.lock().unwrap();
        ht.get(name).cloned()
    }

    pub fn remove(&self, name: &MetricName) -> Option<Metric> {
        let mut ht = self.metrics.lock().unwrap();
        let metric = ht.remove(name)?;
        drop(ht);

        for listener in self.listeners() {
            listener.on_metric_removed(name);
        }
        Some(metric)
    }

    /// All live metrics, ordered by name.
    pub fn all_metrics(&self) -> Vec<(MetricName, Metric)> {
        let ht = self.metrics.lock().unwrap();
        let mut all: Vec<_> = ht.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        drop(ht);
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.metrics.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe `listener`, which is notified of all existing metrics first.
    ///
    /// A metric added concurrently may be notified twice.
    pub fn add_listener(&self, listener: ArcListener) {
        self.listeners.lock().unwrap().push(Arc::clone(&listener));
        for (name, metric) in self.all_metrics() {
            listener.on_metric_added(&name, &metric);
        }
    }

    pub fn remove_listener(&self, listener: &ArcListener) {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.retain(|l| !std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    fn listeners(&self) -> Vec<ArcListener> {
        self.listeners.lock().unwrap().clone()
    }

    fn notify_added(&self, name: &MetricName, metric: &Metric) {
        for listener in self.listeners() {
            listener.on_metric_added(name, metric);
        }
    }
}
