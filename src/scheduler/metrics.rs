/// Performance metrics for scheduler updates
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    /// Total number of update ticks processed
    pub ticks: u64,
    /// Processes alive after the last tick
    pub live_processes: usize,
    /// Total number of processes created
    pub processes_created: u64,
    /// Processes that reached their terminal state naturally
    pub processes_completed: u64,
    /// Processes removed by an explicit kill
    pub processes_killed: u64,
    /// Events handed to the dispatch phase
    pub events_dispatched: u64,
    /// Callbacks actually invoked
    pub callbacks_invoked: u64,
    /// Callback entries discarded because their owner died
    pub dead_owner_drops: u64,
    /// Easing evaluations that produced a non-finite sample
    pub easing_faults: u64,
    /// Duration of the last tick (in microseconds)
    pub last_tick_micros: u64,
    /// Total time spent ticking (in microseconds)
    pub total_tick_micros: u64,
    /// Average tick duration (in microseconds)
    pub average_tick_micros: f64,
}

impl EngineMetrics {
    /// Create new metrics
    #[inline]
    pub fn new() -> Self {
        Self {
            ticks: 0,
            live_processes: 0,
            processes_created: 0,
            processes_completed: 0,
            processes_killed: 0,
            events_dispatched: 0,
            callbacks_invoked: 0,
            dead_owner_drops: 0,
            easing_faults: 0,
            last_tick_micros: 0,
            total_tick_micros: 0,
            average_tick_micros: 0.0,
        }
    }

    /// Record one completed update tick
    #[inline]
    pub fn record_tick(&mut self, tick_micros: u64, live_processes: usize) {
        self.ticks += 1;
        self.live_processes = live_processes;
        self.last_tick_micros = tick_micros;
        self.total_tick_micros += tick_micros;
        self.average_tick_micros = self.total_tick_micros as f64 / self.ticks as f64;
    }

    /// Reset metrics
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
