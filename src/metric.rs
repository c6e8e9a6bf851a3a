//! # Metric
//!
//! Metric definitions that alarms can be created on

use metrics::Unit;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// CloudWatch uses a 5 minute period unless told otherwise
pub const DEFAULT_METRIC_PERIOD: Duration = Duration::from_secs(300);

/// Metric aggregation statistic
///
/// <https://docs.aws.amazon.com/AmazonCloudWatch/latest/monitoring/Statistics-definitions.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricStatistic {
    P50,
    P70,
    P90,
    P95,
    P99,
    P999,
    P9999,
    P100,
    /// Trimmed means, removing the highest values
    Tm50,
    Tm70,
    Tm90,
    Tm95,
    Tm99,
    Tm999,
    Tm9999,
    /// Trimmed means, removing the lowest and the highest values
    Tm99Both,
    Tm95Both,
    Tm90Both,
    Tm85Both,
    Tm80Both,
    Tm75Both,
    Tm70Both,
    /// Trimmed means, keeping the top of the distribution only
    Tm95Top,
    Tm99Top,
    Tm999Top,
    Tm9999Top,
    /// Winsorized means
    Wm50,
    Wm70,
    Wm90,
    Wm95,
    Wm99,
    Wm999,
    Wm9999,
    Wm99Both,
    Wm95Both,
    Wm90Both,
    Wm85Both,
    Wm80Both,
    Wm75Both,
    Wm70Both,
    Min,
    Max,
    Sum,
    Average,
    /// Number of datapoints
    N,
}

impl MetricStatistic {
    /// Statistic string as CloudWatch expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P50 => "p50",
            Self::P70 => "p70",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
            Self::P999 => "p99.9",
            Self::P9999 => "p99.99",
            Self::P100 => "p100",
            Self::Tm50 => "tm50",
            Self::Tm70 => "tm70",
            Self::Tm90 => "tm90",
            Self::Tm95 => "tm95",
            Self::Tm99 => "tm99",
            Self::Tm999 => "tm99.9",
            Self::Tm9999 => "tm99.99",
            Self::Tm99Both => "TM(1%:99%)",
            Self::Tm95Both => "TM(5%:95%)",
            Self::Tm90Both => "TM(10%:90%)",
            Self::Tm85Both => "TM(15%:85%)",
            Self::Tm80Both => "TM(20%:80%)",
            Self::Tm75Both => "TM(25%:75%)",
            Self::Tm70Both => "TM(30%:70%)",
            Self::Tm95Top => "TM(95%:100%)",
            Self::Tm99Top => "TM(99%:100%)",
            Self::Tm999Top => "TM(99.9%:100%)",
            Self::Tm9999Top => "TM(99.99%:100%)",
            Self::Wm50 => "wm50",
            Self::Wm70 => "wm70",
            Self::Wm90 => "wm90",
            Self::Wm95 => "wm95",
            Self::Wm99 => "wm99",
            Self::Wm999 => "wm99.9",
            Self::Wm9999 => "wm99.99",
            Self::Wm99Both => "WM(1%:99%)",
            Self::Wm95Both => "WM(5%:95%)",
            Self::Wm90Both => "WM(10%:90%)",
            Self::Wm85Both => "WM(15%:85%)",
            Self::Wm80Both => "WM(20%:80%)",
            Self::Wm75Both => "WM(25%:75%)",
            Self::Wm70Both => "WM(30%:70%)",
            Self::Min => "Minimum",
            Self::Max => "Maximum",
            Self::Sum => "Sum",
            Self::Average => "Average",
            Self::N => "SampleCount",
        }
    }
}

impl fmt::Display for MetricStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MetricStatistic> for String {
    fn from(statistic: MetricStatistic) -> Self {
        statistic.as_str().to_string()
    }
}

/// True for the statistics CloudWatch treats as simple (non-extended) statistics
pub fn is_simple_statistic(statistic: &str) -> bool {
    [
        MetricStatistic::Average,
        MetricStatistic::Min,
        MetricStatistic::Max,
        MetricStatistic::Sum,
        MetricStatistic::N,
    ]
    .iter()
    .any(|s| s.as_str() == statistic)
}

/// A single CloudWatch metric
///
/// Values are never mutated once handed to an alarm, the `with_*` methods return modified copies.
///
/// # Example
/// ```
/// use cdk_monitoring_alarms::{Metric, MetricStatistic};
///
/// let metric = Metric::new("MyNamespace", "Latency")
///     .with_dimension("Api", "Orders")
///     .with_statistic(MetricStatistic::P99);
/// assert_eq!(metric.statistic, "p99");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub statistic: String,
    pub unit: Option<Unit>,
    pub period: Duration,
    pub account: Option<String>,
    pub region: Option<String>,
    pub label: Option<String>,
    pub color: Option<String>,
}

impl Metric {
    pub fn new(namespace: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Metric {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimensions: BTreeMap::new(),
            statistic: MetricStatistic::Average.into(),
            unit: None,
            period: DEFAULT_METRIC_PERIOD,
            account: None,
            region: None,
            label: None,
            color: None,
        }
    }

    /// Adds a dimension, a repeated name replaces the previous value
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    pub fn with_statistic(self, statistic: impl Into<String>) -> Self {
        Self {
            statistic: statistic.into(),
            ..self
        }
    }

    pub fn with_unit(self, unit: Unit) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    pub fn with_period(self, period: Duration) -> Self {
        Self { period, ..self }
    }

    pub fn with_account(self, account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            ..self
        }
    }

    pub fn with_region(self, region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..self
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn with_color(self, color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..self
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label.as_deref().unwrap_or(&self.metric_name))
    }
}

/// Metric math expression over named metrics
#[derive(Debug, Clone, PartialEq)]
pub struct MathExpression {
    pub expression: String,
    /// Metrics referenced by the expression, keyed by their expression id
    pub using_metrics: BTreeMap<String, Metric>,
    pub period: Duration,
    pub label: Option<String>,
    pub color: Option<String>,
}

impl MathExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        MathExpression {
            expression: expression.into(),
            using_metrics: BTreeMap::new(),
            period: DEFAULT_METRIC_PERIOD,
            label: None,
            color: None,
        }
    }

    pub fn using_metric(mut self, id: impl Into<String>, metric: Metric) -> Self {
        self.using_metrics.insert(id.into(), metric);
        self
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn with_period(self, period: Duration) -> Self {
        Self { period, ..self }
    }
}

impl fmt::Display for MathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label.as_deref().unwrap_or(&self.expression))
    }
}

/// Any metric an alarm can be created on
#[derive(Debug, Clone, PartialEq)]
pub enum AlarmMetric {
    Metric(Metric),
    MathExpression(MathExpression),
}

impl AlarmMetric {
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Metric(metric) => metric.label.as_deref(),
            Self::MathExpression(expression) => expression.label.as_deref(),
        }
    }

    pub fn period(&self) -> Duration {
        match self {
            Self::Metric(metric) => metric.period,
            Self::MathExpression(expression) => expression.period,
        }
    }

    /// Statistic of a plain metric, math expressions have none
    pub fn statistic(&self) -> Option<&str> {
        match self {
            Self::Metric(metric) => Some(&metric.statistic),
            Self::MathExpression(_) => None,
        }
    }

    pub fn with_period(&self, period: Duration) -> Self {
        match self {
            Self::Metric(metric) => Self::Metric(metric.clone().with_period(period)),
            Self::MathExpression(expression) => Self::MathExpression(expression.clone().with_period(period)),
        }
    }

    pub fn with_label(&self, label: impl Into<String>) -> Self {
        match self {
            Self::Metric(metric) => Self::Metric(metric.clone().with_label(label)),
            Self::MathExpression(expression) => Self::MathExpression(expression.clone().with_label(label)),
        }
    }
}

impl From<Metric> for AlarmMetric {
    fn from(metric: Metric) -> Self {
        Self::Metric(metric)
    }
}

impl From<MathExpression> for AlarmMetric {
    fn from(expression: MathExpression) -> Self {
        Self::MathExpression(expression)
    }
}

impl fmt::Display for AlarmMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric(metric) => metric.fmt(f),
            Self::MathExpression(expression) => expression.fmt(f),
        }
    }
}

/// Deployment environment alarms are created in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmScope {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl AlarmScope {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        AlarmScope {
            account: Some(account.into()),
            region: Some(region.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_defaults() {
        let metric = Metric::new("Namespace", "Errors");
        assert_eq!(metric.statistic, "Average");
        assert_eq!(metric.period, DEFAULT_METRIC_PERIOD);
        assert_eq!(metric.to_string(), "Errors");
        assert_eq!(metric.with_label("Error count").to_string(), "Error count");
    }

    #[test]
    fn with_copies_leave_source_untouched() {
        let metric: AlarmMetric = Metric::new("Namespace", "Errors").into();
        let adjusted = metric.with_period(Duration::from_secs(60));
        assert_eq!(metric.period(), DEFAULT_METRIC_PERIOD);
        assert_eq!(adjusted.period(), Duration::from_secs(60));
    }

    #[test]
    fn simple_statistics() {
        assert!(is_simple_statistic("SampleCount"));
        assert!(is_simple_statistic("Sum"));
        assert!(!is_simple_statistic("p99"));
        assert!(!is_simple_statistic("TM(1%:99%)"));
    }

    #[test]
    fn math_expression_has_no_statistic() {
        let expression: AlarmMetric = MathExpression::new("m1 + m2").into();
        assert_eq!(expression.statistic(), None);
        assert_eq!(expression.to_string(), "m1 + m2");
    }
}
