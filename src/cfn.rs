//! # CloudFormation
//!
//! Helpers for serializing built alarms as CloudFormation resources via serde_json
//!
//! <https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-resource-cloudwatch-alarm.html>

use super::action::AlarmActions;
use super::alarm::{Alarm, AlarmWithAnnotation};
use super::error::Result;
use super::factory::CompositeAlarm;
use super::metric::{is_simple_statistic, AlarmMetric, MathExpression, Metric};
use super::strings::get_short_hash;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Id of the single query a labelled or cross-account metric renders as
const METRIC_QUERY_ID: &str = "m1";
/// Id of the returned query of a math expression
const EXPRESSION_QUERY_ID: &str = "expr_1";

#[derive(Serialize)]
#[serde(tag = "Type", content = "Properties")]
pub enum Resource<'a> {
    #[serde(rename = "AWS::CloudWatch::Alarm")]
    Alarm(AlarmProperties<'a>),
    #[serde(rename = "AWS::CloudWatch::CompositeAlarm")]
    CompositeAlarm(CompositeAlarmProperties<'a>),
}

impl<'a> Resource<'a> {
    pub fn alarm_name(&self) -> &'a str {
        match self {
            Resource::Alarm(properties) => properties.alarm_name,
            Resource::CompositeAlarm(properties) => properties.alarm_name,
        }
    }
}

/// Action ARNs per target state, empty lists are left out
#[derive(Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ActionProperties<'a> {
    #[serde(skip_serializing_if = "no_actions")]
    pub alarm_actions: &'a [String],
    #[serde(rename = "OKActions", skip_serializing_if = "no_actions")]
    pub ok_actions: &'a [String],
    #[serde(skip_serializing_if = "no_actions")]
    pub insufficient_data_actions: &'a [String],
}

fn no_actions(actions: &&[String]) -> bool {
    actions.is_empty()
}

impl<'a> From<&'a AlarmActions> for ActionProperties<'a> {
    fn from(actions: &'a AlarmActions) -> Self {
        ActionProperties {
            alarm_actions: &actions.alarm_actions,
            ok_actions: &actions.ok_actions,
            insufficient_data_actions: &actions.insufficient_data_actions,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmProperties<'a> {
    pub alarm_name: &'a str,
    pub alarm_description: &'a str,
    pub actions_enabled: bool,
    #[serde(flatten)]
    pub actions: ActionProperties<'a>,
    pub comparison_operator: &'static str,
    pub threshold: f64,
    pub evaluation_periods: u32,
    pub datapoints_to_alarm: u32,
    pub treat_missing_data: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluate_low_sample_count_percentile: Option<&'static str>,
    #[serde(flatten)]
    pub metric: MetricProperties<'a>,
}

/// Single metric form, used for plain metrics without label or account
#[derive(Serialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct MetricProperties<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<Dimension<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_statistic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<MetricDataQuery<'a>>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataQuery<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_stat: Option<MetricStat<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u64>,
    pub return_data: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricStat<'a> {
    pub metric: MetricIdentity<'a>,
    pub period: u64,
    pub stat: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricIdentity<'a> {
    pub metric_name: &'a str,
    pub namespace: &'a str,
    pub dimensions: Vec<Dimension<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompositeAlarmProperties<'a> {
    pub alarm_name: &'a str,
    pub alarm_description: &'a str,
    pub alarm_rule: &'a str,
    pub actions_enabled: bool,
    #[serde(flatten)]
    pub actions: ActionProperties<'a>,
}

/// Convert a metrics::Unit into the cloudwatch string
///
/// CloudWatch has no binary byte units, binary units map to the decimal unit of the same rank.
///
/// <https://docs.aws.amazon.com/AmazonCloudWatch/latest/APIReference/API_MetricDatum.html>
pub fn unit_to_str(unit: &metrics::Unit) -> &'static str {
    match unit {
        metrics::Unit::Count => "Count",
        metrics::Unit::Percent => "Percent",
        metrics::Unit::Seconds => "Seconds",
        metrics::Unit::Milliseconds => "Milliseconds",
        metrics::Unit::Microseconds => "Microseconds",
        metrics::Unit::Nanoseconds => "Nanoseconds",
        metrics::Unit::Tebibytes => "Terabytes",
        metrics::Unit::Gibibytes => "Gigabytes",
        metrics::Unit::Mebibytes => "Megabytes",
        metrics::Unit::Kibibytes => "Kilobytes",
        metrics::Unit::Bytes => "Bytes",
        metrics::Unit::TerabitsPerSecond => "Terabits/Second",
        metrics::Unit::GigabitsPerSecond => "Gigabits/Second",
        metrics::Unit::MegabitsPerSecond => "Megabits/Second",
        metrics::Unit::KilobitsPerSecond => "Kilobits/Second",
        metrics::Unit::BitsPerSecond => "Bits/Second",
        metrics::Unit::CountPerSecond => "Count/Second",
    }
}

fn dimensions(metric: &Metric) -> Vec<Dimension<'_>> {
    metric
        .dimensions
        .iter()
        .map(|(name, value)| Dimension { name, value })
        .collect()
}

fn metric_stat(metric: &Metric) -> MetricStat<'_> {
    MetricStat {
        metric: MetricIdentity {
            metric_name: &metric.metric_name,
            namespace: &metric.namespace,
            dimensions: dimensions(metric),
        },
        period: metric.period.as_secs(),
        stat: &metric.statistic,
        unit: metric.unit.as_ref().map(unit_to_str),
    }
}

fn metric_properties(metric: &Metric) -> MetricProperties<'_> {
    if metric.label.is_none() && metric.account.is_none() {
        let simple = is_simple_statistic(&metric.statistic);
        return MetricProperties {
            metric_name: Some(&metric.metric_name),
            namespace: Some(&metric.namespace),
            dimensions: Some(dimensions(metric)),
            period: Some(metric.period.as_secs()),
            statistic: simple.then_some(metric.statistic.as_str()),
            extended_statistic: (!simple).then_some(metric.statistic.as_str()),
            unit: metric.unit.as_ref().map(unit_to_str),
            metrics: None,
        };
    }

    MetricProperties {
        metrics: Some(vec![MetricDataQuery {
            id: METRIC_QUERY_ID,
            account_id: metric.account.as_deref(),
            expression: None,
            label: metric.label.as_deref(),
            metric_stat: Some(metric_stat(metric)),
            period: None,
            return_data: true,
        }]),
        ..Default::default()
    }
}

fn expression_properties(expression: &MathExpression) -> MetricProperties<'_> {
    let mut queries = vec![MetricDataQuery {
        id: EXPRESSION_QUERY_ID,
        account_id: None,
        expression: Some(&expression.expression),
        label: expression.label.as_deref(),
        metric_stat: None,
        period: Some(expression.period.as_secs()),
        return_data: true,
    }];
    queries.extend(expression.using_metrics.iter().map(|(id, metric)| MetricDataQuery {
        id,
        account_id: metric.account.as_deref(),
        expression: None,
        label: None,
        metric_stat: Some(metric_stat(metric)),
        period: None,
        return_data: false,
    }));

    MetricProperties {
        metrics: Some(queries),
        ..Default::default()
    }
}

/// CloudFormation properties of a built alarm
pub fn alarm_properties(alarm: &Alarm) -> AlarmProperties<'_> {
    AlarmProperties {
        alarm_name: &alarm.alarm_name,
        alarm_description: &alarm.alarm_description,
        actions_enabled: alarm.actions_enabled,
        actions: (&alarm.actions).into(),
        comparison_operator: alarm.comparison_operator.as_str(),
        threshold: alarm.threshold,
        evaluation_periods: alarm.evaluation_periods,
        datapoints_to_alarm: alarm.datapoints_to_alarm,
        treat_missing_data: alarm.treat_missing_data.as_str(),
        evaluate_low_sample_count_percentile: alarm.evaluate_low_sample_count_percentile,
        metric: match alarm.metric.as_ref() {
            AlarmMetric::Metric(metric) => metric_properties(metric),
            AlarmMetric::MathExpression(expression) => expression_properties(expression),
        },
    }
}

/// CloudFormation properties of a composite alarm
pub fn composite_alarm_properties(alarm: &CompositeAlarm) -> CompositeAlarmProperties<'_> {
    CompositeAlarmProperties {
        alarm_name: &alarm.alarm_name,
        alarm_description: &alarm.alarm_description,
        alarm_rule: &alarm.alarm_rule,
        actions_enabled: alarm.actions_enabled,
        actions: (&alarm.actions).into(),
    }
}

/// Logical id of an alarm resource, the alphanumeric characters of its name
fn logical_id(alarm_name: &str) -> String {
    alarm_name.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// A CloudFormation template fragment holding alarm resources
///
/// # Example
/// ```
/// use cdk_monitoring_alarms::{AddAlarmProps, AlarmTemplate, Builder, Metric};
/// use std::sync::Arc;
///
/// let factory = Builder::new().alarm_name_prefix("MyApp").build().unwrap();
/// let alarm = factory
///     .add_alarm(
///         Arc::new(Metric::new("MyNamespace", "Errors").into()),
///         AddAlarmProps {
///             alarm_name_suffix: "Errors".into(),
///             alarm_description: "Too many errors".into(),
///             threshold: 5.0,
///             ..Default::default()
///         },
///     )
///     .unwrap();
///
/// let mut template = AlarmTemplate::new();
/// template.add_alarm(&alarm);
///
/// let mut output = Vec::new();
/// template.write(&mut output).unwrap();
/// assert!(std::str::from_utf8(&output).unwrap().starts_with(r#"{"Resources":{"MyAppErrors":"#));
/// ```
#[derive(Serialize, Default)]
pub struct AlarmTemplate<'a> {
    #[serde(rename = "Resources")]
    resources: BTreeMap<String, Resource<'a>>,
}

impl<'a> AlarmTemplate<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an alarm, replacing an earlier alarm of the same name
    pub fn add_alarm(&mut self, alarm: &'a AlarmWithAnnotation) -> &mut Self {
        self.insert(Resource::Alarm(alarm_properties(&alarm.alarm)));
        self
    }

    /// Adds a composite alarm, replacing an earlier alarm of the same name
    pub fn add_composite_alarm(&mut self, alarm: &'a CompositeAlarm) -> &mut Self {
        self.insert(Resource::CompositeAlarm(composite_alarm_properties(alarm)));
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Alarm names differing only in punctuation share a logical id, the later one gets the hash
    /// of its name appended
    fn insert(&mut self, resource: Resource<'a>) {
        let alarm_name = resource.alarm_name();
        let mut id = logical_id(alarm_name);

        if let Some(existing) = self.resources.get(&id) {
            if existing.alarm_name() != alarm_name {
                warn!(
                    alarm_name,
                    existing = existing.alarm_name(),
                    "Logical id {id} already taken, appending name hash"
                );
                id.push_str(&get_short_hash(alarm_name));
            }
        }

        self.resources.insert(id, resource);
    }

    /// Write the template as a single line of JSON
    pub fn write(&self, mut writer: impl std::io::Write) -> Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AddAlarmProps, ComparisonOperator, TreatMissingData};
    use crate::builder::Builder;
    use crate::metric::MetricStatistic;
    use std::sync::Arc;
    use std::time::Duration;

    fn alarm(metric: AlarmMetric) -> Alarm {
        Alarm {
            alarm_name: "MyApp-Orders-Errors".into(),
            alarm_description: "Too many errors".into(),
            metric: Arc::new(metric),
            threshold: 5.0,
            comparison_operator: ComparisonOperator::GreaterThanThreshold,
            treat_missing_data: TreatMissingData::NotBreaching,
            evaluation_periods: 3,
            datapoints_to_alarm: 3,
            evaluate_low_sample_count_percentile: None,
            actions_enabled: true,
            actions: Default::default(),
        }
    }

    #[test]
    fn single_metric_form() {
        let alarm = alarm(
            Metric::new("MyNamespace", "Errors")
                .with_dimension("Api", "Orders")
                .with_statistic(MetricStatistic::Sum)
                .with_unit(metrics::Unit::Count)
                .into(),
        );
        assert_eq!(
            serde_json::to_string(&alarm_properties(&alarm)).unwrap(),
            r#"{"AlarmName":"MyApp-Orders-Errors","AlarmDescription":"Too many errors","ActionsEnabled":true,"ComparisonOperator":"GreaterThanThreshold","Threshold":5.0,"EvaluationPeriods":3,"DatapointsToAlarm":3,"TreatMissingData":"notBreaching","MetricName":"Errors","Namespace":"MyNamespace","Dimensions":[{"Name":"Api","Value":"Orders"}],"Period":300,"Statistic":"Sum","Unit":"Count"}"#
        );
    }

    #[test]
    fn extended_statistic() {
        let mut alarm = alarm(
            Metric::new("MyNamespace", "Latency")
                .with_statistic(MetricStatistic::P99)
                .with_period(Duration::from_secs(60))
                .into(),
        );
        alarm.evaluate_low_sample_count_percentile = Some("ignore");
        assert_eq!(
            serde_json::to_string(&alarm_properties(&alarm)).unwrap(),
            r#"{"AlarmName":"MyApp-Orders-Errors","AlarmDescription":"Too many errors","ActionsEnabled":true,"ComparisonOperator":"GreaterThanThreshold","Threshold":5.0,"EvaluationPeriods":3,"DatapointsToAlarm":3,"TreatMissingData":"notBreaching","EvaluateLowSampleCountPercentile":"ignore","MetricName":"Latency","Namespace":"MyNamespace","Dimensions":[],"Period":60,"ExtendedStatistic":"p99"}"#
        );
    }

    #[test]
    fn labelled_metric_uses_metrics_form() {
        let alarm = alarm(Metric::new("MyNamespace", "Errors").with_label("Errors").into());
        assert_eq!(
            serde_json::to_string(&alarm_properties(&alarm).metric).unwrap(),
            r#"{"Metrics":[{"Id":"m1","Label":"Errors","MetricStat":{"Metric":{"MetricName":"Errors","Namespace":"MyNamespace","Dimensions":[]},"Period":300,"Stat":"Average"},"ReturnData":true}]}"#
        );
    }

    #[test]
    fn math_expression() {
        let alarm = alarm(
            MathExpression::new("errors / requests")
                .using_metric("errors", Metric::new("MyNamespace", "Errors").with_statistic(MetricStatistic::Sum))
                .using_metric("requests", Metric::new("MyNamespace", "Requests").with_statistic(MetricStatistic::N))
                .with_label("Error rate")
                .into(),
        );
        assert_eq!(
            serde_json::to_string(&alarm_properties(&alarm).metric).unwrap(),
            r#"{"Metrics":[{"Id":"expr_1","Expression":"errors / requests","Label":"Error rate","Period":300,"ReturnData":true},{"Id":"errors","MetricStat":{"Metric":{"MetricName":"Errors","Namespace":"MyNamespace","Dimensions":[]},"Period":300,"Stat":"Sum"},"ReturnData":false},{"Id":"requests","MetricStat":{"Metric":{"MetricName":"Requests","Namespace":"MyNamespace","Dimensions":[]},"Period":300,"Stat":"SampleCount"},"ReturnData":false}]}"#
        );
    }

    #[test]
    fn logical_ids() {
        assert_eq!(logical_id("MyApp-Orders-Latency-TM(99%:100%)"), "MyAppOrdersLatencyTM99100");
    }

    #[test]
    fn actions_per_state() {
        let mut alarm = alarm(Metric::new("MyNamespace", "Errors").into());
        alarm.actions.add_alarm_action("arn:aws:sns:eu-west-1:123456789012:alarm");
        alarm.actions.add_ok_action("arn:aws:sns:eu-west-1:123456789012:ok");
        let json = serde_json::to_string(&alarm_properties(&alarm)).unwrap();
        assert!(json.contains(
            r#""ActionsEnabled":true,"AlarmActions":["arn:aws:sns:eu-west-1:123456789012:alarm"],"OKActions":["arn:aws:sns:eu-west-1:123456789012:ok"],"ComparisonOperator""#
        ));
        assert!(!json.contains("InsufficientDataActions"));

        let composite = CompositeAlarm {
            alarm_name: "MyApp-Orders-Composite".into(),
            alarm_description: "Composite alarm".into(),
            alarm_rule: r#"(ALARM("MyApp-Orders-Errors"))"#.into(),
            actions_enabled: true,
            actions: AlarmActions {
                insufficient_data_actions: vec!["arn:insufficient".into()],
                ..Default::default()
            },
            dedupe_string: None,
            disambiguator: None,
            custom_tags: vec![],
            custom_params: BTreeMap::new(),
        };
        assert_eq!(
            serde_json::to_string(&composite_alarm_properties(&composite)).unwrap(),
            r#"{"AlarmName":"MyApp-Orders-Composite","AlarmDescription":"Composite alarm","AlarmRule":"(ALARM(\"MyApp-Orders-Errors\"))","ActionsEnabled":true,"InsufficientDataActions":["arn:insufficient"]}"#
        );
    }

    #[test]
    fn names_differing_in_punctuation_keep_both_resources() {
        let factory = Builder::new().alarm_name_prefix("MyApp").build().unwrap();
        let add = |name: &str| {
            factory
                .add_alarm(
                    Arc::new(Metric::new("MyNamespace", "Errors").into()),
                    AddAlarmProps {
                        alarm_name_suffix: "Errors".into(),
                        alarm_name_override: Some(name.into()),
                        threshold: 1.0,
                        ..Default::default()
                    },
                )
                .unwrap()
        };
        let dashed = add("MyApp-Api-Errors-5xx");
        let plain = add("MyApp-Api-Errors5xx");

        let mut template = AlarmTemplate::new();
        template.add_alarm(&dashed).add_alarm(&plain);
        assert_eq!(template.len(), 2);
        assert_eq!(template.resources["MyAppApiErrors5xx"].alarm_name(), "MyApp-Api-Errors-5xx");
        let hashed = format!("MyAppApiErrors5xx{}", get_short_hash("MyApp-Api-Errors5xx"));
        assert_eq!(template.resources[&hashed].alarm_name(), "MyApp-Api-Errors5xx");

        template.add_alarm(&dashed);
        assert_eq!(template.len(), 2);
    }
}
