//! # Metric adjusters
//!
//! Transforms applied to a metric right before an alarm is created from it. An adjuster that
//! has nothing to change returns the very same [Arc], so callers can tell with [Arc::ptr_eq]
//! whether anything happened.

use super::alarm::AddAlarmProps;
use super::error::{Error, Result};
use super::metric::{AlarmMetric, AlarmScope, Metric, MetricStatistic};
use super::strings::remove_brackets_with_dynamic_labels;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Adjusts a metric before an alarm is added to it
///
/// Implemented for any `Fn(Arc<AlarmMetric>, &AlarmScope, &AddAlarmProps) -> Result<Arc<AlarmMetric>>`
pub trait MetricAdjuster: Send + Sync {
    fn adjust_metric(
        &self,
        metric: Arc<AlarmMetric>,
        alarm_scope: &AlarmScope,
        props: &AddAlarmProps,
    ) -> Result<Arc<AlarmMetric>>;
}

impl<F> MetricAdjuster for F
where
    F: Fn(Arc<AlarmMetric>, &AlarmScope, &AddAlarmProps) -> Result<Arc<AlarmMetric>> + Send + Sync,
{
    fn adjust_metric(
        &self,
        metric: Arc<AlarmMetric>,
        alarm_scope: &AlarmScope,
        props: &AddAlarmProps,
    ) -> Result<Arc<AlarmMetric>> {
        self(metric, alarm_scope, props)
    }
}

/// Applies a list of adjusters in order, each one receiving the output of the previous
#[derive(Clone, Default)]
pub struct CompositeMetricAdjuster {
    adjusters: Vec<Arc<dyn MetricAdjuster>>,
}

impl CompositeMetricAdjuster {
    pub fn of(adjusters: impl IntoIterator<Item = Arc<dyn MetricAdjuster>>) -> Self {
        CompositeMetricAdjuster {
            adjusters: adjusters.into_iter().collect(),
        }
    }
}

impl MetricAdjuster for CompositeMetricAdjuster {
    fn adjust_metric(
        &self,
        metric: Arc<AlarmMetric>,
        alarm_scope: &AlarmScope,
        props: &AddAlarmProps,
    ) -> Result<Arc<AlarmMetric>> {
        self.adjusters
            .iter()
            .try_fold(metric, |metric, adjuster| adjuster.adjust_metric(metric, alarm_scope, props))
    }
}

/// Default adjustments, always applied last when an alarm is added
///
/// * The alarm's period override replaces the metric period
/// * Bracketed dynamic labels such as `(avg: ${AVG})` are stripped, annotations can't render them
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetricAdjuster;

impl MetricAdjuster for DefaultMetricAdjuster {
    fn adjust_metric(
        &self,
        metric: Arc<AlarmMetric>,
        _alarm_scope: &AlarmScope,
        props: &AddAlarmProps,
    ) -> Result<Arc<AlarmMetric>> {
        let mut adjusted = metric;

        if let Some(period) = props.period {
            if adjusted.period() != period {
                adjusted = Arc::new(adjusted.with_period(period));
            }
        }

        if let Some(label) = adjusted.label() {
            let stripped = remove_brackets_with_dynamic_labels(label);
            if stripped != label {
                debug!("Stripped dynamic labels from metric label {label:?}");
                adjusted = Arc::new(adjusted.with_label(stripped));
            }
        }

        Ok(adjusted)
    }
}

/// Statistics Route53 health checks can evaluate
const ROUTE53_SUPPORTED_STATISTICS: [MetricStatistic; 5] = [
    MetricStatistic::Average,
    MetricStatistic::Min,
    MetricStatistic::Max,
    MetricStatistic::Sum,
    MetricStatistic::N,
];

/// Route53 health checks do not support high resolution metrics
const ROUTE53_MIN_PERIOD: Duration = Duration::from_secs(60);

/// Makes alarms usable by Route53 health checks
///
/// Rejects anything a health check can't evaluate and drops the label, since a labelled metric
/// renders the alarm in its `Metrics` (metric math) form which Route53 refuses.
///
/// <https://docs.aws.amazon.com/Route53/latest/DeveloperGuide/health-checks-types.html>
#[derive(Debug, Clone, Copy, Default)]
pub struct Route53HealthCheckMetricAdjuster;

impl MetricAdjuster for Route53HealthCheckMetricAdjuster {
    fn adjust_metric(
        &self,
        metric: Arc<AlarmMetric>,
        alarm_scope: &AlarmScope,
        props: &AddAlarmProps,
    ) -> Result<Arc<AlarmMetric>> {
        if props.min_metric_samples_to_alarm.is_some() {
            return Err(unsupported("Alarms with 'minMetricSamplesToAlarm' are not supported."));
        }

        let AlarmMetric::Metric(metric) = metric.as_ref() else {
            return Err(unsupported("The specified metric must be a Metric instance."));
        };

        if let Some(account) = &metric.account {
            if alarm_scope.account.as_ref() != Some(account) {
                return Err(unsupported("Cross-account metrics are not supported."));
            }
        }

        if metric.period < ROUTE53_MIN_PERIOD {
            return Err(unsupported("High resolution metrics are not supported."));
        }

        if !ROUTE53_SUPPORTED_STATISTICS
            .iter()
            .any(|supported| supported.as_str() == metric.statistic)
        {
            return Err(unsupported(format!(
                "Metrics with statistic '{}' are not supported.",
                metric.statistic
            )));
        }

        Ok(Arc::new(AlarmMetric::Metric(Metric {
            label: None,
            ..metric.clone()
        })))
    }
}

fn unsupported(message: impl Into<String>) -> Error {
    Error::UnsupportedAlarmConfiguration(message.into())
}
