use std::time::Duration;

use crate::{
    error::TimerError,
    timer::{Timer, WaitPolicy, clock::as_micros},
};

const DEFAULT_INTERVAL_MICROS: i64 = 1_000;
const DEFAULT_CLOCK_RESTART: Duration = Duration::from_secs(60 * 60);
const DEFAULT_THREAD_NAME: &str = "microtimer";

#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Tick period. Non-positive values leave the timer inert.
    pub interval_micros: i64,
    /// Ticks at least this late are not delivered. `None` delivers every tick.
    pub late_threshold_micros: Option<i64>,
    pub wait_policy: WaitPolicy,
    /// Period after which the tick thread restarts its stopwatch. `None` never restarts.
    pub clock_restart: Option<Duration>,
    pub thread_name: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            interval_micros: DEFAULT_INTERVAL_MICROS,
            late_threshold_micros: None,
            wait_policy: WaitPolicy::default(),
            clock_restart: Some(DEFAULT_CLOCK_RESTART),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TimerBuilder {
    config: TimerConfig,
}

impl TimerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval_micros(&mut self, interval_micros: i64) -> &mut Self {
        self.config.interval_micros = interval_micros;
        self
    }

    pub fn with_interval(&mut self, interval: Duration) -> &mut Self {
        self.config.interval_micros = as_micros(interval);
        self
    }

    /// Non-positive thresholds disable suppression.
    pub fn with_late_threshold_micros(&mut self, threshold_micros: i64) -> &mut Self {
        self.config.late_threshold_micros = (threshold_micros > 0).then_some(threshold_micros);
        self
    }

    pub fn with_wait_policy(&mut self, wait_policy: WaitPolicy) -> &mut Self {
        self.config.wait_policy = wait_policy;
        self
    }

    pub fn with_clock_restart(&mut self, period: Option<Duration>) -> &mut Self {
        self.config.clock_restart = period;
        self
    }

    pub fn with_thread_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn build(&self) -> Result<Timer, TimerError> {
        Timer::with_config(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TimerConfig::default();
        assert_eq!(config.interval_micros, 1_000);
        assert_eq!(config.late_threshold_micros, None);
        assert_eq!(config.wait_policy, WaitPolicy::Balanced);
        assert_eq!(config.clock_restart, Some(Duration::from_secs(3600)));
        assert_eq!(config.thread_name, "microtimer");
    }

    #[test]
    fn test_builder_sets_fields() {
        let mut builder = TimerBuilder::new();
        builder
            .with_interval(Duration::from_millis(2))
            .with_late_threshold_micros(250)
            .with_wait_policy(WaitPolicy::Spin)
            .with_clock_restart(None)
            .with_thread_name("haptic-loop");

        let config = builder.config();
        assert_eq!(config.interval_micros, 2_000);
        assert_eq!(config.late_threshold_micros, Some(250));
        assert_eq!(config.wait_policy, WaitPolicy::Spin);
        assert_eq!(config.clock_restart, None);
        assert_eq!(config.thread_name, "haptic-loop");
    }

    #[test]
    fn test_non_positive_late_threshold_disables() {
        let mut builder = TimerBuilder::new();
        builder.with_late_threshold_micros(100).with_late_threshold_micros(0);
        assert_eq!(builder.config().late_threshold_micros, None);
        builder.with_late_threshold_micros(-5);
        assert_eq!(builder.config().late_threshold_micros, None);
    }

    #[test]
    fn test_build_keeps_interval() {
        let timer = TimerBuilder::new().with_interval_micros(750).build().unwrap();
        assert_eq!(timer.interval_micros(), 750);
        assert!(!timer.is_running());
    }
}
