//! # Alarm
//!
//! Alarm requests and the alarm definitions built from them

use super::action::{AlarmActionStrategy, AlarmActions};
use super::adjuster::MetricAdjuster;
use super::error::Error;
use super::metric::AlarmMetric;
use super::naming::AlarmNamingInput;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// How the metric value is compared against the threshold
///
/// <https://docs.aws.amazon.com/AmazonCloudWatch/latest/APIReference/API_PutMetricAlarm.html>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    #[default]
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
    /// Anomaly detection, outside of the band in either direction
    LessThanLowerOrGreaterThanUpperThreshold,
    /// Anomaly detection, above the band
    GreaterThanUpperThreshold,
    /// Anomaly detection, below the band
    LessThanLowerThreshold,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterThanOrEqualToThreshold => "GreaterThanOrEqualToThreshold",
            Self::GreaterThanThreshold => "GreaterThanThreshold",
            Self::LessThanThreshold => "LessThanThreshold",
            Self::LessThanOrEqualToThreshold => "LessThanOrEqualToThreshold",
            Self::LessThanLowerOrGreaterThanUpperThreshold => "LessThanLowerOrGreaterThanUpperThreshold",
            Self::GreaterThanUpperThreshold => "GreaterThanUpperThreshold",
            Self::LessThanLowerThreshold => "LessThanLowerThreshold",
        }
    }

    /// Symbol used in annotation labels, anomaly detection operators have none
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::GreaterThanOrEqualToThreshold => Some(">="),
            Self::GreaterThanThreshold => Some(">"),
            Self::LessThanOrEqualToThreshold => Some("<="),
            Self::LessThanThreshold => Some("<"),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GreaterThanOrEqualToThreshold" => Ok(Self::GreaterThanOrEqualToThreshold),
            "GreaterThanThreshold" => Ok(Self::GreaterThanThreshold),
            "LessThanThreshold" => Ok(Self::LessThanThreshold),
            "LessThanOrEqualToThreshold" => Ok(Self::LessThanOrEqualToThreshold),
            "LessThanLowerOrGreaterThanUpperThreshold" => Ok(Self::LessThanLowerOrGreaterThanUpperThreshold),
            "GreaterThanUpperThreshold" => Ok(Self::GreaterThanUpperThreshold),
            "LessThanLowerThreshold" => Ok(Self::LessThanLowerThreshold),
            _ => Err(Error::UnsupportedComparisonOperator(s.to_string())),
        }
    }
}

/// How the alarm treats periods without data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    Breaching,
    NotBreaching,
    Ignore,
    #[default]
    Missing,
}

impl TreatMissingData {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breaching => "breaching",
            Self::NotBreaching => "notBreaching",
            Self::Ignore => "ignore",
            Self::Missing => "missing",
        }
    }
}

/// Logical description of a single alarm, before any resource is built
///
/// Only `alarm_name_suffix`, `alarm_description`, `threshold`, `comparison_operator` and
/// `treat_missing_data` are required, everything else falls back to the factory defaults.
#[derive(Clone, Default)]
pub struct AddAlarmProps {
    /// Used as the dedupe string verbatim (after processing), ignoring suffix and disambiguator
    pub dedupe_string_override: Option<String>,
    /// Used as the alarm name verbatim
    pub alarm_name_override: Option<String>,
    /// Fully replaces `alarm_description`
    pub alarm_description_override: Option<String>,
    /// Differentiates this alarm from similar ones on the same resource, e.g. `Critical`
    pub disambiguator: Option<String>,
    pub alarm_description: String,
    pub documentation_link: Option<String>,
    pub runbook_link: Option<String>,
    pub alarm_name_suffix: String,
    /// Enables dedupe for the alarm, shared by a family of alarms
    pub alarm_dedupe_string_suffix: Option<String>,
    pub actions_enabled: Option<bool>,
    pub threshold: f64,
    pub comparison_operator: ComparisonOperator,
    pub treat_missing_data: TreatMissingData,
    pub datapoints_to_alarm: Option<u32>,
    pub evaluation_periods: Option<u32>,
    /// Period override for the metric the alarm is created on
    pub period: Option<Duration>,
    pub evaluate_low_sample_count_percentile: Option<bool>,
    pub min_metric_samples_to_alarm: Option<u32>,
    /// Datapoints with fewer samples are treated as missing data, plain metrics only
    pub min_sample_count_to_evaluate_datapoint: Option<u32>,
    pub custom_tags: Vec<String>,
    pub custom_params: BTreeMap<String, Value>,
    pub fill_alarm_range: bool,
    pub override_annotation_color: Option<String>,
    pub override_annotation_label: Option<String>,
    pub override_annotation_visibility: Option<bool>,
    /// Applied before the default adjustments
    pub metric_adjuster: Option<Arc<dyn MetricAdjuster>>,
    /// Replaces the factory's action strategy
    pub action_override: Option<Arc<dyn AlarmActionStrategy>>,
}

impl AddAlarmProps {
    pub fn naming_input(&self) -> AlarmNamingInput<'_> {
        AlarmNamingInput {
            alarm_name_suffix: &self.alarm_name_suffix,
            alarm_name_override: self.alarm_name_override.as_deref(),
            alarm_dedupe_string_suffix: self.alarm_dedupe_string_suffix.as_deref(),
            dedupe_string_override: self.dedupe_string_override.as_deref(),
            disambiguator: self.disambiguator.as_deref(),
        }
    }
}

impl fmt::Debug for AddAlarmProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddAlarmProps")
            .field("alarm_name_suffix", &self.alarm_name_suffix)
            .field("alarm_name_override", &self.alarm_name_override)
            .field("disambiguator", &self.disambiguator)
            .field("threshold", &self.threshold)
            .field("comparison_operator", &self.comparison_operator)
            .field("treat_missing_data", &self.treat_missing_data)
            .field("datapoints_to_alarm", &self.datapoints_to_alarm)
            .field("evaluation_periods", &self.evaluation_periods)
            .field("period", &self.period)
            .field("action_override", &self.action_override)
            .finish_non_exhaustive()
    }
}

/// Customization shared by all alarm helpers that take a threshold
#[derive(Clone, Default)]
pub struct CustomAlarmThreshold {
    pub dedupe_string_override: Option<String>,
    pub alarm_name_override: Option<String>,
    pub alarm_description_override: Option<String>,
    pub min_metric_samples_to_alarm: Option<u32>,
    pub min_sample_count_to_evaluate_datapoint: Option<u32>,
    pub custom_tags: Vec<String>,
    pub custom_params: BTreeMap<String, Value>,
    pub comparison_operator_override: Option<ComparisonOperator>,
    pub treat_missing_data_override: Option<TreatMissingData>,
    pub evaluate_low_sample_count_percentile: Option<bool>,
    pub actions_enabled: Option<bool>,
    pub datapoints_to_alarm: Option<u32>,
    pub evaluation_periods: Option<u32>,
    pub period: Option<Duration>,
    pub documentation_link: Option<String>,
    pub runbook_link: Option<String>,
    pub fill_alarm_range: bool,
    pub override_annotation_color: Option<String>,
    pub override_annotation_label: Option<String>,
    pub override_annotation_visibility: Option<bool>,
    pub metric_adjuster: Option<Arc<dyn MetricAdjuster>>,
    pub action_override: Option<Arc<dyn AlarmActionStrategy>>,
}

impl CustomAlarmThreshold {
    /// Alarm request carrying these customizations, operator and missing-data overrides win over
    /// the helper's defaults
    pub fn to_add_alarm_props(
        &self,
        default_comparison_operator: ComparisonOperator,
        default_treat_missing_data: TreatMissingData,
    ) -> AddAlarmProps {
        AddAlarmProps {
            dedupe_string_override: self.dedupe_string_override.clone(),
            alarm_name_override: self.alarm_name_override.clone(),
            alarm_description_override: self.alarm_description_override.clone(),
            documentation_link: self.documentation_link.clone(),
            runbook_link: self.runbook_link.clone(),
            actions_enabled: self.actions_enabled,
            comparison_operator: self.comparison_operator_override.unwrap_or(default_comparison_operator),
            treat_missing_data: self.treat_missing_data_override.unwrap_or(default_treat_missing_data),
            datapoints_to_alarm: self.datapoints_to_alarm,
            evaluation_periods: self.evaluation_periods,
            period: self.period,
            evaluate_low_sample_count_percentile: self.evaluate_low_sample_count_percentile,
            min_metric_samples_to_alarm: self.min_metric_samples_to_alarm,
            min_sample_count_to_evaluate_datapoint: self.min_sample_count_to_evaluate_datapoint,
            custom_tags: self.custom_tags.clone(),
            custom_params: self.custom_params.clone(),
            fill_alarm_range: self.fill_alarm_range,
            override_annotation_color: self.override_annotation_color.clone(),
            override_annotation_label: self.override_annotation_label.clone(),
            override_annotation_visibility: self.override_annotation_visibility,
            metric_adjuster: self.metric_adjuster.clone(),
            action_override: self.action_override.clone(),
            ..Default::default()
        }
    }
}

/// Which side of an annotation line is shaded on a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shading {
    Above,
    Below,
}

impl Shading {
    /// Alarming range for an operator, none for the two sided anomaly band
    pub fn for_operator(operator: ComparisonOperator) -> Option<Self> {
        match operator {
            ComparisonOperator::GreaterThanOrEqualToThreshold
            | ComparisonOperator::GreaterThanThreshold
            | ComparisonOperator::GreaterThanUpperThreshold => Some(Self::Above),
            ComparisonOperator::LessThanOrEqualToThreshold
            | ComparisonOperator::LessThanThreshold
            | ComparisonOperator::LessThanLowerThreshold => Some(Self::Below),
            ComparisonOperator::LessThanLowerOrGreaterThanUpperThreshold => None,
        }
    }
}

/// Threshold line drawn on graph widgets for an alarm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizontalAnnotation {
    pub value: f64,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Shading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

/// Alarm resource as it will be deployed
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    pub alarm_name: String,
    pub alarm_description: String,
    pub metric: Arc<AlarmMetric>,
    pub threshold: f64,
    pub comparison_operator: ComparisonOperator,
    pub treat_missing_data: TreatMissingData,
    pub evaluation_periods: u32,
    pub datapoints_to_alarm: u32,
    /// `Some("ignore")` when low sample count percentiles should not be evaluated
    pub evaluate_low_sample_count_percentile: Option<&'static str>,
    pub actions_enabled: bool,
    pub actions: AlarmActions,
}

impl Alarm {
    /// Default threshold annotation, e.g. `"Errors > 10 for 3 datapoints within 15 minutes"`
    pub fn to_annotation(&self) -> HorizontalAnnotation {
        let window = u64::from(self.evaluation_periods) * self.metric.period().as_secs();
        let label = match self.comparison_operator.symbol() {
            Some(symbol) => format!(
                "{} {} {} for {} datapoints within {}",
                self.metric,
                symbol,
                self.threshold,
                self.datapoints_to_alarm,
                describe_period(window)
            ),
            None => format!(
                "{} for {} datapoints within {}",
                self.metric,
                self.datapoints_to_alarm,
                describe_period(window)
            ),
        };

        HorizontalAnnotation {
            value: self.threshold,
            label,
            color: None,
            fill: None,
            visible: None,
        }
    }
}

fn describe_period(seconds: u64) -> String {
    match seconds {
        1 => "1 second".to_string(),
        60 => "1 minute".to_string(),
        s if s > 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        s if s > 60 => format!("{} minutes", s as f64 / 60.0),
        s => format!("{s} seconds"),
    }
}

/// Everything needed to rebuild an alarm, e.g. when cloning it
#[derive(Debug, Clone)]
pub struct AlarmDefinition {
    pub add_alarm_props: AddAlarmProps,
    /// Metric as passed in, before any adjustment
    pub metric: Arc<AlarmMetric>,
    pub evaluation_periods: u32,
    pub datapoints_to_alarm: u32,
}

/// A built alarm together with its naming and annotation
#[derive(Debug, Clone)]
pub struct AlarmWithAnnotation {
    pub alarm: Alarm,
    pub alarm_name: String,
    pub alarm_name_suffix: String,
    pub alarm_label: String,
    pub alarm_description: String,
    pub dedupe_string: Option<String>,
    pub disambiguator: Option<String>,
    pub custom_tags: Vec<String>,
    pub custom_params: BTreeMap<String, Value>,
    pub annotation: HorizontalAnnotation,
    pub alarm_definition: AlarmDefinition,
}

impl AlarmWithAnnotation {
    /// Composite alarm rule term that is true while this alarm is in ALARM
    pub fn alarm_rule_when_alarming(&self) -> String {
        format!("ALARM(\"{}\")", self.alarm_name)
    }

    pub fn alarm_rule_when_ok(&self) -> String {
        format!("OK(\"{}\")", self.alarm_name)
    }

    pub fn alarm_rule_when_insufficient_data(&self) -> String {
        format!("INSUFFICIENT_DATA(\"{}\")", self.alarm_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;

    #[test]
    fn parse_comparison_operator() {
        assert_eq!(
            "LessThanThreshold".parse::<ComparisonOperator>().unwrap(),
            ComparisonOperator::LessThanThreshold
        );
        let err = "Equals".parse::<ComparisonOperator>().unwrap_err();
        assert_eq!(err.to_string(), "Comparison operator Equals is not supported.");
    }

    #[test]
    fn custom_threshold_overrides_win() {
        let custom = CustomAlarmThreshold {
            comparison_operator_override: Some(ComparisonOperator::LessThanThreshold),
            datapoints_to_alarm: Some(4),
            min_sample_count_to_evaluate_datapoint: Some(15),
            action_override: Some(crate::action::notify_sns("arn:alarm", None, None)),
            ..Default::default()
        };
        let props = custom.to_add_alarm_props(ComparisonOperator::GreaterThanThreshold, TreatMissingData::NotBreaching);
        assert_eq!(props.comparison_operator, ComparisonOperator::LessThanThreshold);
        assert_eq!(props.treat_missing_data, TreatMissingData::NotBreaching);
        assert_eq!(props.datapoints_to_alarm, Some(4));
        assert_eq!(props.min_sample_count_to_evaluate_datapoint, Some(15));
        assert!(props.action_override.is_some());
    }

    #[test]
    fn annotation_label() {
        let alarm = Alarm {
            alarm_name: "a".into(),
            alarm_description: "d".into(),
            metric: Arc::new(Metric::new("Namespace", "Errors").into()),
            threshold: 10.0,
            comparison_operator: ComparisonOperator::GreaterThanThreshold,
            treat_missing_data: TreatMissingData::Missing,
            evaluation_periods: 3,
            datapoints_to_alarm: 3,
            evaluate_low_sample_count_percentile: None,
            actions_enabled: false,
            actions: AlarmActions::default(),
        };
        let annotation = alarm.to_annotation();
        assert_eq!(annotation.value, 10.0);
        assert_eq!(annotation.label, "Errors > 10 for 3 datapoints within 15 minutes");
    }

    #[test]
    fn shading_follows_operator() {
        assert_eq!(Shading::for_operator(ComparisonOperator::GreaterThanUpperThreshold), Some(Shading::Above));
        assert_eq!(Shading::for_operator(ComparisonOperator::LessThanThreshold), Some(Shading::Below));
        assert_eq!(
            Shading::for_operator(ComparisonOperator::LessThanLowerOrGreaterThanUpperThreshold),
            None
        );
    }
}
