use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::TwoTierMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Writes snapshots in the Prometheus text exposition format.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn metric_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.prefix, name)
        }
    }

    fn write_counter(&self, name: &str, value: u64) {
        let name = self.metric_name(name);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} counter", name);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_gauge(&self, name: &str, value: u64) {
        let name = self.metric_name(name);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} gauge", name);
        let _ = writeln!(writer, "{} {}", name, value);
    }
}

impl<W: Write + Send> MetricsExporter<TwoTierMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &TwoTierMetricsSnapshot) {
        let counters = [
            ("get_calls_total", snapshot.get_calls),
            ("get_hits_total", snapshot.get_hits),
            ("get_watched_hits_total", snapshot.get_watched_hits),
            ("get_misses_total", snapshot.get_misses),
            ("set_calls_total", snapshot.set_calls),
            ("set_updates_total", snapshot.set_updates),
            ("admissions_total", snapshot.admissions),
            ("promotions_total", snapshot.promotions),
            ("rejected_admissions_total", snapshot.rejected_admissions),
            ("cached_evictions_total", snapshot.cached_evictions),
            ("watched_inserts_total", snapshot.watched_inserts),
            ("watched_replacements_total", snapshot.watched_replacements),
            ("watched_drops_total", snapshot.watched_drops),
            ("expirations_total", snapshot.expirations),
            ("invalidations_total", snapshot.invalidations),
            ("rotations_total", snapshot.rotations),
            ("clears_total", snapshot.clears),
            ("peek_calls_total", snapshot.peek_calls),
            ("peek_found_total", snapshot.peek_found),
        ];
        for (name, value) in counters {
            self.write_counter(name, value);
        }
        self.write_gauge("cached_len", snapshot.cached_len as u64);
        self.write_gauge("watched_len", snapshot.watched_len as u64);
        self.write_gauge("memory_bytes", snapshot.memory_bytes as u64);
        self.write_gauge("watched_max_items", snapshot.watched_max_items as u64);
        if let Some(max) = snapshot.cached_max_items {
            self.write_gauge("cached_max_items", max as u64);
        }
    }
}
