use std::collections::VecDeque;

/// Largest number of samples a recorder keeps.
pub const MAX_CAPACITY: usize = 1023;

const DEFAULT_LIMIT: f32 = 0.2;
const DEFAULT_MAX: f32 = 1.0;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Overwrite in place at a rotating cursor.
    #[default]
    Add,
    /// Append, evicting the oldest sample once full.
    Push,
}

/// Classification of a normalized sample against the recorder thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Good,
    Caution,
    Critical,
}

/// Raw-unit statistics over the recorded samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterSummary {
    pub count: usize,
    pub min: f32,
    pub mean: f32,
    pub max: f32,
}

/// Fixed capacity sample buffer for a strip chart.
///
/// Samples are stored raw and normalized by `max` when read, so changing the
/// scale rescales the whole history.
#[derive(Debug, Clone)]
pub struct GraphRecorder {
    capacity: usize,
    limit: f32,
    max: f32,
    good_threshold: f32,
    caution_threshold: f32,
    slots: Vec<f32>,
    cursor: usize,
    written: usize,
    fifo: VecDeque<f32>,
    active: IngestMode,
}

impl GraphRecorder {
    /// `capacity` is clamped to `1..=MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        let mut recorder = GraphRecorder {
            capacity,
            limit: DEFAULT_LIMIT,
            max: DEFAULT_MAX,
            good_threshold: 0.0,
            caution_threshold: 0.0,
            slots: vec![0.0; capacity],
            cursor: 0,
            written: 0,
            fifo: VecDeque::with_capacity(capacity + 1),
            active: IngestMode::default(),
        };
        recorder.update_thresholds();
        recorder
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Highest raw value still drawn as good.
    pub fn set_limit(&mut self, limit: f32) {
        if limit != self.limit && limit.is_finite() {
            self.limit = limit;
            self.update_thresholds();
        }
    }

    /// Full scale of the chart. Non-positive values are ignored.
    pub fn set_max(&mut self, max: f32) {
        if max != self.max && max.is_finite() && max > 0.0 {
            self.max = max;
            self.update_thresholds();
        }
    }

    /// Normalized (good, caution) thresholds.
    pub fn thresholds(&self) -> (f32, f32) {
        (self.good_threshold, self.caution_threshold)
    }

    fn update_thresholds(&mut self) {
        self.good_threshold = self.limit / self.max;
        self.caution_threshold = 1.0;
    }

    pub fn record(&mut self, mode: IngestMode, value: f32) {
        match mode {
            IngestMode::Add => self.add(value),
            IngestMode::Push => self.push(value),
        }
    }

    pub fn add(&mut self, value: f32) {
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.capacity;
        self.written = self.written.saturating_add(1);
        self.active = IngestMode::Add;
    }

    pub fn push(&mut self, value: f32) {
        self.fifo.push_back(value);
        if self.fifo.len() > self.capacity {
            self.fifo.pop_front();
        }
        self.active = IngestMode::Push;
    }

    fn raw(&self) -> Vec<f32> {
        match self.active {
            IngestMode::Add => self.slots.clone(),
            IngestMode::Push => self.fifo.iter().copied().collect(),
        }
    }

    fn recorded(&self) -> Vec<f32> {
        match self.active {
            IngestMode::Add => self.slots[..self.written.min(self.capacity)].to_vec(),
            IngestMode::Push => self.fifo.iter().copied().collect(),
        }
    }

    /// Normalized samples as laid out on the chart.
    ///
    /// In add mode this is the whole ring, unwritten slots reading zero, with
    /// the newest sample just before the cursor. In push mode it is oldest first.
    pub fn samples(&self) -> Vec<f32> {
        self.raw().into_iter().map(|v| v / self.max).collect()
    }

    pub fn classify(&self, normalized: f32) -> Band {
        if normalized <= self.good_threshold {
            Band::Good
        } else if normalized <= self.caution_threshold {
            Band::Caution
        } else {
            Band::Critical
        }
    }

    pub fn bands(&self) -> Vec<Band> {
        self.samples().into_iter().map(|v| self.classify(v)).collect()
    }

    pub fn summary(&self) -> Option<JitterSummary> {
        let values = self.recorded();
        let count = values.len();
        if count == 0 {
            return None;
        }
        let (min, max, sum) = values.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0_f64),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + f64::from(v)),
        );
        Some(JitterSummary {
            count,
            min,
            mean: (sum / count as f64) as f32,
            max,
        })
    }

    /// One character per sample, full scale at the top level.
    pub fn sparkline(&self) -> String {
        let top = (SPARK_LEVELS.len() - 1) as f32;
        self.samples()
            .into_iter()
            .map(|v| SPARK_LEVELS[(v.clamp(0.0, 1.0) * top).round() as usize])
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots.fill(0.0);
        self.cursor = 0;
        self.written = 0;
        self.fifo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_clamped() {
        assert_eq!(GraphRecorder::new(0).capacity(), 1);
        assert_eq!(GraphRecorder::new(50).capacity(), 50);
        assert_eq!(GraphRecorder::new(5_000).capacity(), MAX_CAPACITY);
    }

    #[test]
    fn test_add_overwrites_at_rotating_cursor() {
        let mut recorder = GraphRecorder::new(3);
        recorder.set_max(10.0);
        for v in [1.0, 2.0, 3.0, 4.0] {
            recorder.add(v);
        }
        assert_eq!(recorder.samples(), vec![0.4, 0.2, 0.3]);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut recorder = GraphRecorder::new(3);
        recorder.set_max(10.0);
        for v in [1.0, 2.0] {
            recorder.push(v);
        }
        assert_eq!(recorder.samples(), vec![0.1, 0.2]);
        for v in [3.0, 4.0] {
            recorder.record(IngestMode::Push, v);
        }
        assert_eq!(recorder.samples(), vec![0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_thresholds_follow_scale() {
        let mut recorder = GraphRecorder::new(10);
        assert_eq!(recorder.thresholds(), (0.2, 1.0));

        recorder.set_limit(1_000.0);
        recorder.set_max(5_000.0);
        assert_eq!(recorder.thresholds(), (0.2, 1.0));

        recorder.set_limit(2_500.0);
        assert_eq!(recorder.thresholds(), (0.5, 1.0));

        recorder.set_max(0.0);
        assert_eq!(recorder.max(), 5_000.0);
    }

    #[test]
    fn test_bands() {
        let mut recorder = GraphRecorder::new(3);
        recorder.set_limit(1_000.0);
        recorder.set_max(5_000.0);
        for v in [900.0, 3_000.0, 6_000.0] {
            recorder.push(v);
        }
        assert_eq!(
            recorder.bands(),
            vec![Band::Good, Band::Caution, Band::Critical]
        );
    }

    #[test]
    fn test_summary_ignores_unwritten_slots() {
        let mut recorder = GraphRecorder::new(10);
        assert_eq!(recorder.summary(), None);

        for v in [900.0, 1_000.0, 1_100.0] {
            recorder.add(v);
        }
        let summary = recorder.summary().unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 900.0);
        assert_eq!(summary.max, 1_100.0);
        assert!((summary.mean - 1_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_sparkline_levels() {
        let mut recorder = GraphRecorder::new(3);
        for v in [0.0, 1.0, 2.0] {
            recorder.push(v);
        }
        assert_eq!(recorder.sparkline(), "▁██");
    }

    #[test]
    fn test_clear() {
        let mut recorder = GraphRecorder::new(4);
        recorder.add(1.0);
        recorder.push(2.0);
        recorder.clear();
        assert_eq!(recorder.summary(), None);
    }
}
