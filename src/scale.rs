//! # Scale alarms
//!
//! Clones alarms with thresholds and evaluation windows scaled by multiplication factors, e.g.
//! tighter copies of the critical alarms to drive automatic rollbacks.

use super::alarm::{AddAlarmProps, AlarmWithAnnotation, ComparisonOperator};
use super::error::Result;
use super::metric::MetricStatistic;
use std::time::Duration;

/// Periods a cloned alarm may fall back to, ascending
const SUPPORTED_METRIC_PERIODS: [Duration; 7] = [
    Duration::from_secs(60),
    Duration::from_secs(5 * 60),
    Duration::from_secs(15 * 60),
    Duration::from_secs(60 * 60),
    Duration::from_secs(6 * 60 * 60),
    Duration::from_secs(24 * 60 * 60),
    Duration::from_secs(7 * 24 * 60 * 60),
];

/// Below this many datapoints a window is too small to alarm on
const MIN_DATAPOINTS: f64 = 2.0;

/// Configuration for [scale_alarms]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleAlarmsProps {
    /// Disambiguator assigned to every clone
    pub disambiguator: String,
    /// Applied to thresholds, inverted for less-than operators, ignored for anomaly detection.
    /// Defaults to 1.0
    pub threshold_multiplier: Option<f64>,
    /// Applied to datapoints to alarm. Defaults to 1.0
    pub datapoints_to_alarm_multiplier: Option<f64>,
    /// Applied to evaluation periods. Defaults to `datapoints_to_alarm_multiplier`
    pub evaluation_periods_multiplier: Option<f64>,
}

/// Function turning an existing alarm into the request for its clone
pub type AlarmCloneFunction = Box<dyn Fn(&AlarmWithAnnotation) -> Result<AddAlarmProps> + Send + Sync>;

/// Creates a function that clones alarms scaled by the given factors
///
/// When the scaled datapoints to alarm (or evaluation periods) drop below 2, the clone moves to the
/// next smaller supported period and scales both counts up by the period ratio so the alarm keeps
/// the same window. `Sum` and `SampleCount` thresholds are scaled down by the same ratio.
///
/// # Example
/// ```
/// use cdk_monitoring_alarms::{scale_alarms, ScaleAlarmsProps};
///
/// let clone = scale_alarms(ScaleAlarmsProps {
///     disambiguator: "Rollback".into(),
///     threshold_multiplier: Some(0.9),
///     ..Default::default()
/// });
/// ```
pub fn scale_alarms(props: ScaleAlarmsProps) -> AlarmCloneFunction {
    Box::new(move |alarm: &AlarmWithAnnotation| scale_alarm(&props, alarm))
}

/// Builds the clone request for one alarm, see [scale_alarms]
///
/// Every [ComparisonOperator] has a scaling rule, so this never fails. The `Result` matches
/// [AlarmCloneFunction], whose other implementations may reject an alarm.
pub fn scale_alarm(props: &ScaleAlarmsProps, alarm: &AlarmWithAnnotation) -> Result<AddAlarmProps> {
    let definition = &alarm.alarm_definition;
    let source = &definition.add_alarm_props;

    let threshold_multiplier = match props.threshold_multiplier.filter(|m| *m != 0.0) {
        Some(multiplier) => threshold_multiplier_for(source.comparison_operator, multiplier),
        None => 1.0,
    };
    let mut threshold = source.threshold * threshold_multiplier;

    let datapoints_to_alarm_multiplier = props.datapoints_to_alarm_multiplier.unwrap_or(1.0);
    let evaluation_periods_multiplier = props
        .evaluation_periods_multiplier
        .or(props.datapoints_to_alarm_multiplier)
        .unwrap_or(1.0);

    let mut evaluation_periods = f64::from(definition.evaluation_periods) * evaluation_periods_multiplier;
    let mut datapoints_to_alarm = f64::from(definition.datapoints_to_alarm) * datapoints_to_alarm_multiplier;

    let mut period = source.period;
    if evaluation_periods < MIN_DATAPOINTS || datapoints_to_alarm < MIN_DATAPOINTS {
        let original_period = source.period.unwrap_or_else(|| definition.metric.period());

        if let Some(smaller_period) = next_smaller_period(original_period) {
            period = Some(smaller_period);
            let scale_factor = original_period.as_secs_f64() / smaller_period.as_secs_f64();
            evaluation_periods *= scale_factor;
            datapoints_to_alarm *= scale_factor;

            // Additive statistics grow with the period
            if let Some(statistic) = definition.metric.statistic() {
                if statistic == MetricStatistic::Sum.as_str() || statistic == MetricStatistic::N.as_str() {
                    threshold /= scale_factor;
                }
            }
        }
    }

    Ok(AddAlarmProps {
        disambiguator: Some(props.disambiguator.clone()),
        threshold,
        evaluation_periods: Some(round_datapoints(evaluation_periods)),
        datapoints_to_alarm: Some(round_datapoints(datapoints_to_alarm)),
        period,
        ..source.clone()
    })
}

/// Multiplier that tightens (or relaxes) the alarm in the direction of its operator
fn threshold_multiplier_for(operator: ComparisonOperator, multiplier: f64) -> f64 {
    match operator {
        ComparisonOperator::GreaterThanOrEqualToThreshold | ComparisonOperator::GreaterThanThreshold => multiplier,
        ComparisonOperator::LessThanOrEqualToThreshold | ComparisonOperator::LessThanThreshold => 1.0 / multiplier,
        // Anomaly detection bands are not plain thresholds
        ComparisonOperator::GreaterThanUpperThreshold
        | ComparisonOperator::LessThanLowerThreshold
        | ComparisonOperator::LessThanLowerOrGreaterThanUpperThreshold => 1.0,
    }
}

/// Largest supported period strictly smaller than the given one
fn next_smaller_period(period: Duration) -> Option<Duration> {
    SUPPORTED_METRIC_PERIODS.iter().rev().find(|p| **p < period).copied()
}

/// Rounds half away from zero, never below 1
fn round_datapoints(value: f64) -> u32 {
    value.round().max(1.0) as u32
}
