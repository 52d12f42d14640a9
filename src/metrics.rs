//! Prometheus metrics for lead submissions

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

/// Process-wide lead pipeline metrics
pub struct LeadMetrics {
    registry: Registry,

    // Counters
    pub submissions_total: IntCounter,
    pub submissions_succeeded: IntCounter,
    pub submissions_failed: IntCounter,
    pub validation_rejections: IntCounter,
    pub retries_total: IntCounter,
    pub results_discarded: IntCounter,

    // Histograms
    pub submit_latency: Histogram,
}

impl LeadMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let submissions_total = IntCounter::with_opts(Opts::new(
            "lead_submissions_total",
            "Network attempts made for lead submissions (including retries)",
        ))?;

        let submissions_succeeded = IntCounter::with_opts(Opts::new(
            "lead_submissions_succeeded",
            "Lead submissions acknowledged with a 2xx response",
        ))?;

        let submissions_failed = IntCounter::with_opts(Opts::new(
            "lead_submissions_failed",
            "Lead submissions that ended in a transport error or non-2xx response",
        ))?;

        let validation_rejections = IntCounter::with_opts(Opts::new(
            "lead_validation_rejections",
            "Submit calls stopped by field validation",
        ))?;

        let retries_total = IntCounter::with_opts(Opts::new(
            "lead_retries_total",
            "User-initiated retries after a failed submission",
        ))?;

        let results_discarded = IntCounter::with_opts(Opts::new(
            "lead_results_discarded",
            "Responses that arrived after the form was reset or unmounted",
        ))?;

        let submit_latency = Histogram::with_opts(
            HistogramOpts::new("lead_submit_latency_seconds", "Lead POST round-trip latency")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;

        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(submissions_succeeded.clone()))?;
        registry.register(Box::new(submissions_failed.clone()))?;
        registry.register(Box::new(validation_rejections.clone()))?;
        registry.register(Box::new(retries_total.clone()))?;
        registry.register(Box::new(results_discarded.clone()))?;
        registry.register(Box::new(submit_latency.clone()))?;

        Ok(Self {
            registry,
            submissions_total,
            submissions_succeeded,
            submissions_failed,
            validation_rejections,
            retries_total,
            results_discarded,
            submit_latency,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the Prometheus text exposition format
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static LeadMetrics {
    static METRICS: once_cell::sync::Lazy<LeadMetrics> =
        once_cell::sync::Lazy::new(|| LeadMetrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let m = metrics();
        let before = m.retries_total.get();
        m.retries_total.inc();
        assert!(m.retries_total.get() > before);
    }

    #[test]
    fn test_gather_text_lists_metrics() {
        let m = LeadMetrics::new().unwrap();
        m.submissions_total.inc();
        m.submit_latency.observe(0.2);

        let text = m.gather_text().unwrap();
        assert!(text.contains("lead_submissions_total 1"));
        assert!(text.contains("lead_submit_latency_seconds_count 1"));
        assert!(text.contains("lead_results_discarded 0"));
    }
}
