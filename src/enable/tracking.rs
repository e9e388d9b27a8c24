//! Per-strategy performance telemetry: counters, adaptive ordering,
//! insights and the diagnostics report.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::error::EngineError;

/// The enable procedures, in their static default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EnableStrategy {
    CcdTargeted,
    CcdModePopulation,
    CcdMinimalPaths,
    CcdDirectPath,
    CcdTopologyExtend,
    DevmodeDirect,
    DevmodeWithReset,
    HardwareReset,
    DisplaySwitchFallback,
}

impl EnableStrategy {
    /// Static priority order, used whenever no telemetry exists.
    pub const DEFAULT_ORDER: [EnableStrategy; 9] = [
        EnableStrategy::CcdTargeted,
        EnableStrategy::CcdModePopulation,
        EnableStrategy::CcdMinimalPaths,
        EnableStrategy::CcdDirectPath,
        EnableStrategy::CcdTopologyExtend,
        EnableStrategy::DevmodeDirect,
        EnableStrategy::DevmodeWithReset,
        EnableStrategy::HardwareReset,
        EnableStrategy::DisplaySwitchFallback,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnableStrategy::CcdTargeted => "CcdTargeted",
            EnableStrategy::CcdModePopulation => "CcdModePopulation",
            EnableStrategy::CcdMinimalPaths => "CcdMinimalPaths",
            EnableStrategy::CcdDirectPath => "CcdDirectPath",
            EnableStrategy::CcdTopologyExtend => "CcdTopologyExtend",
            EnableStrategy::DevmodeDirect => "DevmodeDirect",
            EnableStrategy::DevmodeWithReset => "DevmodeWithReset",
            EnableStrategy::HardwareReset => "HardwareReset",
            EnableStrategy::DisplaySwitchFallback => "DisplaySwitchFallback",
        }
    }
}

impl std::fmt::Display for EnableStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one strategy attempt.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyResult {
    pub strategy: EnableStrategy,
    pub operation: String,
    pub logical_id: String,
    pub success: bool,
    pub duration: Duration,
    pub error: Option<String>,
    pub attempt_index: u32,
    pub timestamp: SystemTime,
}

const RECENT_FAILURE_LIMIT: usize = 10;

/// Aggregated counters for one strategy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrategyStats {
    pub attempts: u64,
    pub successes: u64,
    pub total_duration: Duration,
    pub last_used: Option<SystemTime>,
    pub recent_failures: VecDeque<String>,
}

impl StrategyStats {
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    pub fn average_duration(&self) -> Duration {
        if self.attempts == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.attempts as u32
        }
    }

    fn absorb(&mut self, result: &StrategyResult) {
        self.attempts += 1;
        if result.success {
            self.successes += 1;
        } else if let Some(error) = &result.error {
            if self.recent_failures.len() == RECENT_FAILURE_LIMIT {
                self.recent_failures.pop_front();
            }
            self.recent_failures.push_back(error.clone());
        }
        self.total_duration += result.duration;
        self.last_used = Some(result.timestamp);
    }
}

/// What the telemetry says about a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsightKind {
    /// Success rate above 80%.
    MostReliable,
    /// Success rate above 50% with sub-second average duration.
    FastReliable,
    /// Success rate below 30% after more than five attempts.
    Problematic,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyInsight {
    pub strategy: EnableStrategy,
    pub kind: InsightKind,
    pub detail: String,
}

/// Sort strategies by success rate descending, then average duration
/// ascending. The sort is stable over the static order, so untouched
/// telemetry reproduces the static order exactly.
pub fn recommended_order_from(
    stats: &HashMap<EnableStrategy, StrategyStats>,
) -> Vec<EnableStrategy> {
    if stats.values().all(|s| s.attempts == 0) || stats.is_empty() {
        return EnableStrategy::DEFAULT_ORDER.to_vec();
    }
    let mut order = EnableStrategy::DEFAULT_ORDER.to_vec();
    order.sort_by(|a, b| {
        let sa = stats.get(a).cloned().unwrap_or_default();
        let sb = stats.get(b).cloned().unwrap_or_default();
        sb.success_rate()
            .total_cmp(&sa.success_rate())
            .then(sa.average_duration().cmp(&sb.average_duration()))
    });
    order
}

/// Derive insights from the aggregated counters.
pub fn insights_from(stats: &HashMap<EnableStrategy, StrategyStats>) -> Vec<StrategyInsight> {
    let mut insights = Vec::new();
    for strategy in EnableStrategy::DEFAULT_ORDER {
        let Some(s) = stats.get(&strategy).filter(|s| s.attempts > 0) else {
            continue;
        };
        let rate = s.success_rate();
        let average = s.average_duration();
        if rate > 0.8 {
            insights.push(StrategyInsight {
                strategy,
                kind: InsightKind::MostReliable,
                detail: format!("{:.0}% success over {} attempts", rate * 100.0, s.attempts),
            });
        }
        if rate > 0.5 && average < Duration::from_secs(1) {
            insights.push(StrategyInsight {
                strategy,
                kind: InsightKind::FastReliable,
                detail: format!("{:.0}% success, {} ms average", rate * 100.0, average.as_millis()),
            });
        }
        if rate < 0.3 && s.attempts > 5 {
            insights.push(StrategyInsight {
                strategy,
                kind: InsightKind::Problematic,
                detail: format!("{:.0}% success after {} attempts", rate * 100.0, s.attempts),
            });
        }
    }
    insights
}

/// Thread-safe strategy telemetry: a bounded result ring plus aggregated
/// counters. Appends come from the engine; snapshots may be taken from
/// observer threads at any time.
#[derive(Debug)]
pub struct PerformanceTracker {
    enabled: AtomicBool,
    capacity: usize,
    history: Mutex<VecDeque<StrategyResult>>,
    stats: Mutex<HashMap<EnableStrategy, StrategyStats>>,
}

impl PerformanceTracker {
    pub fn new(capacity: usize, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            capacity: capacity.max(1),
            history: Mutex::new(VecDeque::new()),
            stats: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record one attempt. A no-op while tracking is disabled.
    pub fn record(&self, result: StrategyResult) {
        if !self.is_enabled() {
            return;
        }
        {
            let mut stats = self.stats.lock().expect("stats lock poisoned");
            stats.entry(result.strategy).or_default().absorb(&result);
        }
        let mut history = self.history.lock().expect("history lock poisoned");
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(result);
    }

    pub fn snapshot(&self) -> Vec<StrategyResult> {
        self.history
            .lock()
            .expect("history lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn purge(&self) {
        self.history.lock().expect("history lock poisoned").clear();
        self.stats.lock().expect("stats lock poisoned").clear();
    }

    /// Strategy order for the next enable run.
    pub fn recommended_order(&self) -> Vec<EnableStrategy> {
        let stats = self.stats.lock().expect("stats lock poisoned");
        recommended_order_from(&stats)
    }

    pub fn insights(&self) -> Vec<StrategyInsight> {
        let stats = self.stats.lock().expect("stats lock poisoned");
        insights_from(&stats)
    }

    /// Multi-line diagnostics report.
    pub fn report(&self) -> String {
        let stats = self.stats.lock().expect("stats lock poisoned");
        let mut lines = vec![
            "Display enable strategy performance".to_string(),
            "===================================".to_string(),
        ];
        if stats.values().all(|s| s.attempts == 0) {
            lines.push("No strategy attempts recorded.".to_string());
            return lines.join("\n");
        }
        for strategy in EnableStrategy::DEFAULT_ORDER {
            let Some(s) = stats.get(&strategy).filter(|s| s.attempts > 0) else {
                continue;
            };
            let age = s
                .last_used
                .and_then(|t| t.elapsed().ok())
                .map(|e| format!("{}s ago", e.as_secs()))
                .unwrap_or_else(|| "never".to_string());
            lines.push(format!(
                "{}: {} attempts, {:.1}% success, avg {} ms, last used {}",
                strategy,
                s.attempts,
                s.success_rate() * 100.0,
                s.average_duration().as_millis(),
                age,
            ));
            for failure in &s.recent_failures {
                lines.push(format!("    recent failure: {}", failure));
            }
        }
        let order = recommended_order_from(&stats)
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" -> ");
        lines.push(format!("Recommended order: {}", order));
        for insight in insights_from(&stats) {
            lines.push(format!("Insight: {} is {:?} ({})", insight.strategy, insight.kind, insight.detail));
        }
        lines.join("\n")
    }

    /// JSON export of the raw result history, for diagnostics clients.
    pub fn export_history_json(&self) -> Result<String, EngineError> {
        let snapshot = self.snapshot();
        serde_json::to_string_pretty(&snapshot).map_err(|e| EngineError::Unknown {
            source_name: "performance-tracker".to_string(),
            message: e.to_string(),
        })
    }
}
