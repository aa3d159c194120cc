use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Game lifecycle (created, finished by outcome)
// - Moves by kind (honest / cheat)
// - Event store appends (events by type, conflicts, latency)
//
// Rendered in the Prometheus text format by `Metrics::render`.
// ============================================================================

/// Central metrics registry for the game service
pub struct Metrics {
    registry: Registry,

    // Game Metrics
    pub games_created: IntCounter,
    pub games_finished: IntCounterVec,
    pub moves_total: IntCounterVec,

    // Event Store Metrics
    pub events_appended: IntCounterVec,
    pub version_conflicts: IntCounter,
    pub append_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Game Metrics
        let games_created = IntCounter::new("games_created_total", "Total games created")?;
        registry.register(Box::new(games_created.clone()))?;

        let games_finished = IntCounterVec::new(
            Opts::new("games_finished_total", "Total games finished"),
            &["outcome"],
        )?;
        registry.register(Box::new(games_finished.clone()))?;

        let moves_total = IntCounterVec::new(
            Opts::new("moves_total", "Total accepted moves"),
            &["kind"],
        )?;
        registry.register(Box::new(moves_total.clone()))?;

        // Event Store Metrics
        let events_appended = IntCounterVec::new(
            Opts::new("events_appended_total", "Total events appended to the event store"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_appended.clone()))?;

        let version_conflicts = IntCounter::new(
            "version_conflicts_total",
            "Total appends rejected with a version conflict",
        )?;
        registry.register(Box::new(version_conflicts.clone()))?;

        let append_duration = HistogramVec::new(
            HistogramOpts::new("append_duration_seconds", "Event store append duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(append_duration.clone()))?;

        Ok(Self {
            registry,
            games_created,
            games_finished,
            moves_total,
            events_appended,
            version_conflicts,
            append_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a successful append
    pub fn record_append<'a>(
        &self,
        operation: &str,
        event_types: impl IntoIterator<Item = &'a str>,
        duration_secs: f64,
    ) {
        for event_type in event_types {
            self.events_appended.with_label_values(&[event_type]).inc();
        }
        self.append_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_conflict(&self) {
        self.version_conflicts.inc();
    }

    /// Helper to record an accepted move
    pub fn record_move(&self, cheat: bool) {
        let kind = if cheat { "cheat" } else { "move" };
        self.moves_total.with_label_values(&[kind]).inc();
    }

    pub fn record_finish(&self, outcome: &str) {
        self.games_finished.with_label_values(&[outcome]).inc();
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
