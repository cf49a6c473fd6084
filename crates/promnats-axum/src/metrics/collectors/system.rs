//! Process statistics, collected on every scrape

use crate::error::{registration_error, MetricsError, Result};
use crate::metrics::definition::{
    MetricDefinition, SYSTEM_CPU_USAGE_PERCENT, SYSTEM_GC_STATS, SYSTEM_MEMORY_TOTAL_BYTES,
    SYSTEM_MEMORY_USAGE_BYTES, SYSTEM_SUBSYSTEM, SYSTEM_WORKER_COUNT,
};
use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{
    MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, System,
    MINIMUM_CPU_UPDATE_INTERVAL,
};

/// One reading of the process statistics.
///
/// `None` means the value could not be read; the family is omitted from
/// that scrape rather than reported as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSample {
    /// Process CPU utilization since the previous reading
    pub cpu_usage_percent: Option<f64>,
    /// Process resident set size
    pub resident_memory_bytes: Option<u64>,
    /// Host physical memory
    pub total_memory_bytes: Option<u64>,
    /// Cumulative garbage collector pause time
    pub gc_pause_seconds: Option<f64>,
    /// Live async tasks
    pub worker_count: Option<usize>,
}

/// Read API for process and host statistics.
pub trait ProcessStats: Send + Sync {
    fn sample(&self) -> StatsSample;
}

/// [`ProcessStats`] backed by `sysinfo` and the tokio runtime metrics.
///
/// CPU usage is a delta between two process refreshes. The baseline is taken
/// on construction; a sample taken sooner than
/// [`MINIMUM_CPU_UPDATE_INTERVAL`] after the previous refresh has no CPU
/// reading.
pub struct SysinfoProcessStats {
    pid: Pid,
    state: Mutex<SysinfoState>,
}

struct SysinfoState {
    system: System,
    last_cpu_refresh: Instant,
}

impl SysinfoState {
    fn refresh_process(&mut self, pid: Pid) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        self.last_cpu_refresh = Instant::now();
    }
}

impl SysinfoProcessStats {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| MetricsError::StatsUnavailable(e.to_string()))?;

        let mut state = SysinfoState {
            system: System::new(),
            last_cpu_refresh: Instant::now(),
        };
        state.refresh_process(pid);

        Ok(Self {
            pid,
            state: Mutex::new(state),
        })
    }
}

impl ProcessStats for SysinfoProcessStats {
    fn sample(&self) -> StatsSample {
        let mut state = self.state.lock();
        let cpu_ready = state.last_cpu_refresh.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL;
        state.refresh_process(self.pid);
        state
            .system
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        let process = state.system.process(self.pid);
        if process.is_none() {
            tracing::warn!(pid = %self.pid, "current process not visible to sysinfo");
        }
        let total_memory = state.system.total_memory();

        StatsSample {
            cpu_usage_percent: process
                .filter(|_| cpu_ready)
                .map(|p| f64::from(p.cpu_usage())),
            resident_memory_bytes: process.map(|p| p.memory()),
            total_memory_bytes: (total_memory > 0).then_some(total_memory),
            // No tracing garbage collector in this process.
            gc_pause_seconds: Some(0.0),
            worker_count: tokio::runtime::Handle::try_current()
                .ok()
                .map(|handle| handle.metrics().num_alive_tasks()),
        }
    }
}

/// Pull collector for the five `system` families.
///
/// Values are read from the [`ProcessStats`] source on every `collect`;
/// nothing is retained between scrapes.
#[derive(Clone)]
pub struct SystemMetricsCollector {
    source: Arc<dyn ProcessStats>,
    cpu_usage: Gauge,
    memory_usage: Gauge,
    memory_total: Gauge,
    gc_stats: Gauge,
    worker_count: Gauge,
    // Serializes set-then-collect across concurrent scrapes.
    collect_lock: Arc<Mutex<()>>,
}

impl SystemMetricsCollector {
    pub fn new(namespace: &str, source: Arc<dyn ProcessStats>) -> Result<Self> {
        let gauge = |definition: &MetricDefinition| {
            Gauge::with_opts(definition.opts(namespace))
                .map_err(|e| registration_error(&definition.fq_name(namespace), e))
        };

        Ok(Self {
            source,
            cpu_usage: gauge(&SYSTEM_CPU_USAGE_PERCENT)?,
            memory_usage: gauge(&SYSTEM_MEMORY_USAGE_BYTES)?,
            memory_total: gauge(&SYSTEM_MEMORY_TOTAL_BYTES)?,
            gc_stats: gauge(&SYSTEM_GC_STATS)?,
            worker_count: gauge(&SYSTEM_WORKER_COUNT)?,
            collect_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create the collector and register it against `registry`.
    pub fn register(
        registry: &Registry,
        namespace: &str,
        source: Arc<dyn ProcessStats>,
    ) -> Result<Self> {
        let collector = Self::new(namespace, source)?;
        let name = [namespace, SYSTEM_SUBSYSTEM, "*"]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_");
        super::register_as(registry, &name, collector.clone())?;
        Ok(collector)
    }

    /// The declared families, independent of current values.
    pub fn describe(&self) -> Vec<MetricDefinition> {
        vec![
            SYSTEM_CPU_USAGE_PERCENT,
            SYSTEM_MEMORY_USAGE_BYTES,
            SYSTEM_MEMORY_TOTAL_BYTES,
            SYSTEM_GC_STATS,
            SYSTEM_WORKER_COUNT,
        ]
    }

    fn gauges(&self) -> [&Gauge; 5] {
        [
            &self.cpu_usage,
            &self.memory_usage,
            &self.memory_total,
            &self.gc_stats,
            &self.worker_count,
        ]
    }
}

impl Collector for SystemMetricsCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.gauges()
            .into_iter()
            .flat_map(|gauge| gauge.desc())
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let _guard = self.collect_lock.lock();
        let sample = self.source.sample();

        let readings = [
            (&self.cpu_usage, &SYSTEM_CPU_USAGE_PERCENT, sample.cpu_usage_percent),
            (
                &self.memory_usage,
                &SYSTEM_MEMORY_USAGE_BYTES,
                sample.resident_memory_bytes.map(|v| v as f64),
            ),
            (
                &self.memory_total,
                &SYSTEM_MEMORY_TOTAL_BYTES,
                sample.total_memory_bytes.map(|v| v as f64),
            ),
            (&self.gc_stats, &SYSTEM_GC_STATS, sample.gc_pause_seconds),
            (
                &self.worker_count,
                &SYSTEM_WORKER_COUNT,
                sample.worker_count.map(|v| v as f64),
            ),
        ];

        let mut families = Vec::with_capacity(readings.len());
        for (gauge, definition, value) in readings {
            match value {
                Some(value) => {
                    gauge.set(value);
                    families.extend(gauge.collect());
                }
                None => {
                    tracing::warn!(
                        metric = definition.name,
                        "statistic unavailable, omitting sample"
                    );
                }
            }
        }
        families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStats(StatsSample);

    impl ProcessStats for FixedStats {
        fn sample(&self) -> StatsSample {
            self.0
        }
    }

    fn full_sample() -> StatsSample {
        StatsSample {
            cpu_usage_percent: Some(12.5),
            resident_memory_bytes: Some(64 * 1024 * 1024),
            total_memory_bytes: Some(8 * 1024 * 1024 * 1024),
            gc_pause_seconds: Some(0.0),
            worker_count: Some(7),
        }
    }

    fn gauge_value(families: &[MetricFamily], name: &str) -> Option<f64> {
        families
            .iter()
            .find(|family| family.get_name() == name)
            .map(|family| family.get_metric()[0].get_gauge().get_value())
    }

    #[test]
    fn test_describe_is_stable() {
        let collector =
            SystemMetricsCollector::new("orders", Arc::new(FixedStats(full_sample()))).unwrap();

        let first = collector.describe();
        let second = collector.describe();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);

        let names: Vec<&str> = collector.desc().iter().map(|d| d.fq_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "orders_system_system_cpu_usage_percent",
                "orders_system_system_memory_usage_bytes",
                "orders_system_system_memory_total_bytes",
                "orders_system_system_gc_stats",
                "orders_system_system_worker_count",
            ]
        );
    }

    #[test]
    fn test_collect_emits_one_sample_per_family() {
        let collector =
            SystemMetricsCollector::new("orders", Arc::new(FixedStats(full_sample()))).unwrap();

        let families = collector.collect();
        assert_eq!(families.len(), 5);
        assert_eq!(
            gauge_value(&families, "orders_system_system_cpu_usage_percent"),
            Some(12.5)
        );
        assert_eq!(
            gauge_value(&families, "orders_system_system_worker_count"),
            Some(7.0)
        );
    }

    #[test]
    fn test_collect_omits_unreadable_statistics() {
        let sample = StatsSample {
            cpu_usage_percent: None,
            worker_count: None,
            ..full_sample()
        };
        let collector =
            SystemMetricsCollector::new("orders", Arc::new(FixedStats(sample))).unwrap();

        let families = collector.collect();
        assert_eq!(families.len(), 3);
        assert_eq!(gauge_value(&families, "orders_system_system_cpu_usage_percent"), None);
        assert_eq!(
            gauge_value(&families, "orders_system_system_memory_usage_bytes"),
            Some((64 * 1024 * 1024) as f64)
        );
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = Registry::new();
        let source: Arc<dyn ProcessStats> = Arc::new(FixedStats(full_sample()));
        SystemMetricsCollector::register(&registry, "orders", source.clone()).unwrap();

        let err = SystemMetricsCollector::register(&registry, "orders", source)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MetricsError::DuplicateRegistration(name) if name == "orders_system_*"
        ));
    }

    #[test]
    fn test_collision_on_any_family_names_the_collector() {
        let registry = Registry::new();
        let worker_count = Gauge::with_opts(SYSTEM_WORKER_COUNT.opts("orders")).unwrap();
        registry.register(Box::new(worker_count)).unwrap();

        let source: Arc<dyn ProcessStats> = Arc::new(FixedStats(full_sample()));
        let err = SystemMetricsCollector::register(&registry, "orders", source)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MetricsError::DuplicateRegistration(name) if name == "orders_system_*"
        ));
    }

    #[test]
    fn test_sysinfo_cpu_omitted_until_interval_elapsed() {
        let stats = SysinfoProcessStats::new().unwrap();
        assert_eq!(stats.sample().cpu_usage_percent, None);
    }

    #[test]
    fn test_sysinfo_first_cpu_reading_is_measured() {
        let stats = SysinfoProcessStats::new().unwrap();

        let busy_until = Instant::now() + MINIMUM_CPU_UPDATE_INTERVAL * 2;
        let spinner = std::thread::spawn(move || {
            let mut n: u64 = 0;
            while Instant::now() < busy_until {
                n = std::hint::black_box(n.wrapping_add(1));
            }
        });
        spinner.join().unwrap();

        let cpu = stats.sample().cpu_usage_percent.unwrap();
        assert!(cpu > 0.0, "expected a measured CPU reading, got {cpu}");
    }

    #[tokio::test]
    async fn test_sysinfo_sample_inside_runtime() {
        let stats = SysinfoProcessStats::new().unwrap();
        let sample = stats.sample();

        assert!(sample.resident_memory_bytes.unwrap() > 0);
        assert!(sample.total_memory_bytes.unwrap() > 0);
        assert_eq!(sample.gc_pause_seconds, Some(0.0));
        assert!(sample.worker_count.is_some());
    }

    #[test]
    fn test_sysinfo_sample_outside_runtime_omits_workers() {
        let stats = SysinfoProcessStats::new().unwrap();
        assert_eq!(stats.sample().worker_count, None);
    }
}
