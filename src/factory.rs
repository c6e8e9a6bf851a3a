//! # Alarm factory
//!
//! Turns alarm requests into alarms: adjusts the metric, derives the names, resolves the
//! evaluation window and builds the annotation.

use super::action::{AlarmActionStrategy, AlarmActionStrategyProps, AlarmActions};
use super::adjuster::{DefaultMetricAdjuster, MetricAdjuster};
use super::alarm::{
    AddAlarmProps, Alarm, AlarmDefinition, AlarmWithAnnotation, HorizontalAnnotation, Shading,
};
use super::error::{Error, Result};
use super::metric::{AlarmMetric, AlarmScope, MathExpression, Metric, MetricStatistic};
use super::naming::{AlarmNamingInput, AlarmNamingStrategy};
use super::scale::AlarmCloneFunction;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Datapoints to alarm when neither the request nor the defaults set one
pub const DEFAULT_DATAPOINTS_TO_ALARM: u32 = 3;

const DESCRIPTION_PART_SEPARATOR: &str = " \r\n";
const DEFAULT_COMPOSITE_ALARM_NAME_SUFFIX: &str = "Composite";
const DEFAULT_COMPOSITE_ALARM_DESCRIPTION: &str = "Composite alarm";

/// Whether alarm actions are enabled, for all alarms or per disambiguator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ActionsEnabled {
    All(bool),
    /// Alarms without a disambiguator, or with one missing from the map, are disabled
    PerDisambiguator(BTreeMap<String, bool>),
}

impl Default for ActionsEnabled {
    fn default() -> Self {
        ActionsEnabled::All(false)
    }
}

impl ActionsEnabled {
    pub fn for_disambiguator(&self, disambiguator: Option<&str>) -> bool {
        match self {
            ActionsEnabled::All(enabled) => *enabled,
            ActionsEnabled::PerDisambiguator(map) => disambiguator
                .filter(|d| !d.is_empty())
                .and_then(|d| map.get(d).copied())
                .unwrap_or(false),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Defaults shared by every alarm of an application, loadable from JSON
///
/// # Example
/// ```
/// use cdk_monitoring_alarms::{ActionsEnabled, AlarmFactoryDefaults};
///
/// let defaults = AlarmFactoryDefaults::from_json(
///     r#"{"alarmNamePrefix": "MyApp", "actionsEnabled": {"Critical": true}}"#,
/// )
/// .unwrap();
/// assert_eq!(defaults.alarm_name_prefix, "MyApp");
/// assert!(defaults.actions_enabled.for_disambiguator(Some("Critical")));
/// assert!(defaults.use_default_dedupe_for_latency);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmFactoryDefaults {
    pub alarm_name_prefix: String,
    #[serde(default)]
    pub actions_enabled: ActionsEnabled,
    #[serde(default)]
    pub datapoints_to_alarm: Option<u32>,
    #[serde(default)]
    pub evaluation_periods: Option<u32>,
    #[serde(default)]
    pub documentation_link: Option<String>,
    #[serde(default)]
    pub runbook_link: Option<String>,
    #[serde(default = "default_true")]
    pub use_default_dedupe_for_error: bool,
    #[serde(default = "default_true")]
    pub use_default_dedupe_for_latency: bool,
}

impl AlarmFactoryDefaults {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// How the child alarms of a composite alarm are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompositeAlarmOperator {
    And,
    #[default]
    Or,
}

impl CompositeAlarmOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Request for a composite alarm, naming works the same as for [AddAlarmProps]
#[derive(Debug, Clone, Default)]
pub struct AddCompositeAlarmProps {
    /// Defaults to `Composite`
    pub alarm_name_suffix: Option<String>,
    pub alarm_name_override: Option<String>,
    pub alarm_dedupe_string_suffix: Option<String>,
    pub dedupe_string_override: Option<String>,
    pub disambiguator: Option<String>,
    /// Defaults to `Composite alarm`
    pub alarm_description: Option<String>,
    pub alarm_description_override: Option<String>,
    pub documentation_link: Option<String>,
    pub runbook_link: Option<String>,
    pub actions_enabled: Option<bool>,
    /// Replaces the factory's action strategy
    pub action_override: Option<Arc<dyn AlarmActionStrategy>>,
    pub composite_operator: CompositeAlarmOperator,
    pub custom_tags: Vec<String>,
    pub custom_params: BTreeMap<String, Value>,
}

/// Composite alarm resource as it will be deployed
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeAlarm {
    pub alarm_name: String,
    pub alarm_description: String,
    /// e.g. `(ALARM("a") OR ALARM("b"))`
    pub alarm_rule: String,
    pub actions_enabled: bool,
    pub actions: AlarmActions,
    pub dedupe_string: Option<String>,
    pub disambiguator: Option<String>,
    pub custom_tags: Vec<String>,
    pub custom_params: BTreeMap<String, Value>,
}

/// Creates the alarms of one monitored resource
///
/// Use the [Builder](crate::Builder) to create one.
pub struct AlarmFactory {
    pub(crate) alarm_scope: AlarmScope,
    pub(crate) naming: AlarmNamingStrategy,
    pub(crate) actions_enabled: ActionsEnabled,
    pub(crate) action: Arc<dyn AlarmActionStrategy>,
    pub(crate) datapoints_to_alarm: Option<u32>,
    pub(crate) evaluation_periods: Option<u32>,
    pub(crate) documentation_link: Option<String>,
    pub(crate) runbook_link: Option<String>,
    pub(crate) use_default_dedupe_for_error: bool,
    pub(crate) use_default_dedupe_for_latency: bool,
}

impl AlarmFactory {
    pub fn alarm_scope(&self) -> &AlarmScope {
        &self.alarm_scope
    }

    pub fn naming(&self) -> &AlarmNamingStrategy {
        &self.naming
    }

    /// Adds an alarm on the given metric
    ///
    /// The request's `metric_adjuster` runs first, then the default adjustments (period override,
    /// dynamic label removal). Fails if an adjuster rejects the metric or if the evaluation periods
    /// are fewer than the datapoints to alarm.
    pub fn add_alarm(&self, metric: Arc<AlarmMetric>, props: AddAlarmProps) -> Result<AlarmWithAnnotation> {
        let adjusted_metric = match &props.metric_adjuster {
            Some(adjuster) => adjuster.adjust_metric(metric.clone(), &self.alarm_scope, &props)?,
            None => metric.clone(),
        };
        let adjusted_metric = DefaultMetricAdjuster.adjust_metric(adjusted_metric, &self.alarm_scope, &props)?;
        let adjusted_metric = match props.min_sample_count_to_evaluate_datapoint {
            Some(min_sample_count) => Arc::new(with_min_sample_count(&adjusted_metric, min_sample_count)?),
            None => adjusted_metric,
        };

        let naming_input = props.naming_input();
        let identity = self.naming.get_identity(&naming_input);

        let datapoints_to_alarm = props
            .datapoints_to_alarm
            .or(self.datapoints_to_alarm)
            .unwrap_or(DEFAULT_DATAPOINTS_TO_ALARM);
        let evaluation_periods = props
            .evaluation_periods
            .or(self.evaluation_periods)
            .unwrap_or(datapoints_to_alarm);

        if evaluation_periods < datapoints_to_alarm {
            return Err(Error::InvalidAlarmConfiguration(format!(
                "evaluationPeriods must be greater than or equal to datapointsToAlarm for {}",
                identity.alarm_name
            )));
        }

        let alarm_description = self.generate_description(
            &props.alarm_description,
            props.alarm_description_override.as_deref(),
            props.runbook_link.as_deref(),
            props.documentation_link.as_deref(),
        );

        let actions = self.determine_actions(
            props.action_override.as_ref(),
            &AlarmActionStrategyProps {
                alarm_name: &identity.alarm_name,
                alarm_scope: &self.alarm_scope,
                dedupe_string: identity.dedupe_string.as_deref(),
                disambiguator: props.disambiguator.as_deref(),
                custom_tags: &props.custom_tags,
                custom_params: &props.custom_params,
            },
        );

        let alarm = Alarm {
            alarm_name: identity.alarm_name.clone(),
            alarm_description: alarm_description.clone(),
            metric: adjusted_metric,
            threshold: props.threshold,
            comparison_operator: props.comparison_operator,
            treat_missing_data: props.treat_missing_data,
            evaluation_periods,
            datapoints_to_alarm,
            // unset means "evaluate"
            evaluate_low_sample_count_percentile: match props.evaluate_low_sample_count_percentile {
                Some(false) => Some("ignore"),
                _ => None,
            },
            actions_enabled: self.determine_actions_enabled(props.actions_enabled, props.disambiguator.as_deref()),
            actions,
        };

        let annotation = create_annotation(&alarm, &props);

        debug!(
            alarm_name = %alarm.alarm_name,
            dedupe_string = ?identity.dedupe_string,
            "Added alarm"
        );

        Ok(AlarmWithAnnotation {
            alarm,
            alarm_name: identity.alarm_name,
            alarm_name_suffix: props.alarm_name_suffix.clone(),
            alarm_label: identity.widget_label,
            alarm_description,
            dedupe_string: identity.dedupe_string,
            disambiguator: props.disambiguator.clone(),
            custom_tags: props.custom_tags.clone(),
            custom_params: props.custom_params.clone(),
            annotation,
            alarm_definition: AlarmDefinition {
                add_alarm_props: props,
                metric,
                evaluation_periods,
                datapoints_to_alarm,
            },
        })
    }

    /// Adds a composite alarm that is in ALARM when any (OR) or all (AND) of the alarms are
    pub fn add_composite_alarm(
        &self,
        alarms: &[AlarmWithAnnotation],
        props: AddCompositeAlarmProps,
    ) -> Result<CompositeAlarm> {
        let naming_input = AlarmNamingInput {
            alarm_name_suffix: props
                .alarm_name_suffix
                .as_deref()
                .unwrap_or(DEFAULT_COMPOSITE_ALARM_NAME_SUFFIX),
            alarm_name_override: props.alarm_name_override.as_deref(),
            alarm_dedupe_string_suffix: props.alarm_dedupe_string_suffix.as_deref(),
            dedupe_string_override: props.dedupe_string_override.as_deref(),
            disambiguator: props.disambiguator.as_deref(),
        };
        let alarm_name = self.naming.get_name(&naming_input);

        if alarms.is_empty() {
            return Err(Error::InvalidAlarmConfiguration(format!(
                "Composite alarm {alarm_name} needs at least one alarm"
            )));
        }

        let alarm_description = self.generate_description(
            props
                .alarm_description
                .as_deref()
                .unwrap_or(DEFAULT_COMPOSITE_ALARM_DESCRIPTION),
            props.alarm_description_override.as_deref(),
            props.runbook_link.as_deref(),
            props.documentation_link.as_deref(),
        );
        let dedupe_string = self.naming.get_dedupe_string(&naming_input);

        let separator = format!(" {} ", props.composite_operator.as_str());
        let alarm_rule = format!(
            "({})",
            alarms
                .iter()
                .map(AlarmWithAnnotation::alarm_rule_when_alarming)
                .collect::<Vec<_>>()
                .join(&separator)
        );

        let actions = self.determine_actions(
            props.action_override.as_ref(),
            &AlarmActionStrategyProps {
                alarm_name: &alarm_name,
                alarm_scope: &self.alarm_scope,
                dedupe_string: dedupe_string.as_deref(),
                disambiguator: props.disambiguator.as_deref(),
                custom_tags: &props.custom_tags,
                custom_params: &props.custom_params,
            },
        );

        debug!(alarm_name = %alarm_name, alarm_rule = %alarm_rule, "Added composite alarm");

        Ok(CompositeAlarm {
            alarm_description,
            alarm_rule,
            actions_enabled: self.determine_actions_enabled(props.actions_enabled, props.disambiguator.as_deref()),
            actions,
            dedupe_string,
            alarm_name,
            disambiguator: props.disambiguator,
            custom_tags: props.custom_tags,
            custom_params: props.custom_params,
        })
    }

    /// Adds a copy of each alarm as described by the clone function, on the alarm's original metric
    pub fn clone_alarms(
        &self,
        alarms: &[AlarmWithAnnotation],
        clone_function: &AlarmCloneFunction,
    ) -> Result<Vec<AlarmWithAnnotation>> {
        alarms
            .iter()
            .map(|alarm| {
                let props = clone_function(alarm)?;
                debug!(alarm_name = %alarm.alarm_name, "Cloning alarm");
                self.add_alarm(alarm.alarm_definition.metric.clone(), props)
            })
            .collect()
    }

    /// Error alarms share a dedupe string across error types unless turned off
    pub fn should_use_default_dedupe_for_error(&self) -> bool {
        self.use_default_dedupe_for_error
    }

    /// Latency alarms share a dedupe string across latency types unless turned off
    pub fn should_use_default_dedupe_for_latency(&self) -> bool {
        self.use_default_dedupe_for_latency
    }

    /// Request override, then the factory default
    fn determine_actions(
        &self,
        action_override: Option<&Arc<dyn AlarmActionStrategy>>,
        props: &AlarmActionStrategyProps<'_>,
    ) -> AlarmActions {
        let mut actions = AlarmActions::default();
        action_override
            .unwrap_or(&self.action)
            .add_alarm_actions(&mut actions, props);
        actions
    }

    /// Request override, then the global boolean, then the disambiguator map
    fn determine_actions_enabled(&self, actions_enabled: Option<bool>, disambiguator: Option<&str>) -> bool {
        actions_enabled.unwrap_or_else(|| self.actions_enabled.for_disambiguator(disambiguator))
    }

    fn generate_description(
        &self,
        alarm_description: &str,
        alarm_description_override: Option<&str>,
        runbook_link_override: Option<&str>,
        documentation_link_override: Option<&str>,
    ) -> String {
        let mut parts = vec![alarm_description_override.unwrap_or(alarm_description).to_string()];

        let runbook_link = runbook_link_override.or(self.runbook_link.as_deref());
        let documentation_link = documentation_link_override.or(self.documentation_link.as_deref());

        if let Some(link) = runbook_link.filter(|l| !l.is_empty()) {
            parts.push(format!("Runbook: {link}"));
        }
        if let Some(link) = documentation_link.filter(|l| !l.is_empty()) {
            parts.push(format!("Documentation: {link}"));
        }

        parts.join(DESCRIPTION_PART_SEPARATOR)
    }
}

/// Wraps a plain metric so that datapoints with fewer samples than `min_sample_count` are missing
fn with_min_sample_count(metric: &AlarmMetric, min_sample_count: u32) -> Result<AlarmMetric> {
    let AlarmMetric::Metric(metric) = metric else {
        return Err(Error::InvalidAlarmConfiguration(
            "minSampleCountToEvaluateDatapoint is only supported for plain metrics".into(),
        ));
    };

    let mut expression = MathExpression::new(format!("IF(sampleCount >= {min_sample_count}, metric)"))
        .using_metric("metric", metric.clone())
        .using_metric(
            "sampleCount",
            Metric {
                label: None,
                ..metric.clone()
            }
            .with_statistic(MetricStatistic::N),
        )
        .with_label(metric.to_string())
        .with_period(metric.period);
    expression.color = metric.color.clone();

    Ok(expression.into())
}

/// Threshold annotation with the request's fill and overrides applied
fn create_annotation(alarm: &Alarm, props: &AddAlarmProps) -> HorizontalAnnotation {
    let mut annotation = alarm.to_annotation();
    if props.fill_alarm_range {
        annotation.fill = Shading::for_operator(alarm.comparison_operator);
    }
    if let Some(color) = &props.override_annotation_color {
        annotation.color = Some(color.clone());
    }
    if let Some(label) = &props.override_annotation_label {
        annotation.label = label.clone();
    }
    if let Some(visible) = props.override_annotation_visibility {
        annotation.visible = Some(visible);
    }
    annotation
}
