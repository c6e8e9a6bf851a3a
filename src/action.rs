//! # Alarm actions
//!
//! What happens when an alarm changes state. Every alarm built by the factory goes through exactly
//! one [AlarmActionStrategy], the request's override or the factory default.

use super::metric::AlarmScope;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Action ARNs attached to an alarm, per target state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmActions {
    pub alarm_actions: Vec<String>,
    pub ok_actions: Vec<String>,
    pub insufficient_data_actions: Vec<String>,
}

impl AlarmActions {
    pub fn add_alarm_action(&mut self, arn: impl Into<String>) {
        self.alarm_actions.push(arn.into());
    }

    pub fn add_ok_action(&mut self, arn: impl Into<String>) {
        self.ok_actions.push(arn.into());
    }

    pub fn add_insufficient_data_action(&mut self, arn: impl Into<String>) {
        self.insufficient_data_actions.push(arn.into());
    }

    pub fn is_empty(&self) -> bool {
        self.alarm_actions.is_empty() && self.ok_actions.is_empty() && self.insufficient_data_actions.is_empty()
    }
}

/// The alarm an action strategy is applied to
#[derive(Debug, Clone, Copy)]
pub struct AlarmActionStrategyProps<'a> {
    pub alarm_name: &'a str,
    pub alarm_scope: &'a AlarmScope,
    pub dedupe_string: Option<&'a str>,
    pub disambiguator: Option<&'a str>,
    pub custom_tags: &'a [String],
    pub custom_params: &'a BTreeMap<String, Value>,
}

/// Adds the actions of one alarm
pub trait AlarmActionStrategy: fmt::Debug + Send + Sync {
    fn add_alarm_actions(&self, actions: &mut AlarmActions, props: &AlarmActionStrategyProps<'_>);
}

/// Adds no actions, the factory default
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlarmActionStrategy;

impl AlarmActionStrategy for NoopAlarmActionStrategy {
    fn add_alarm_actions(&self, _actions: &mut AlarmActions, _props: &AlarmActionStrategyProps<'_>) {}
}

pub fn noop_action() -> Arc<dyn AlarmActionStrategy> {
    Arc::new(NoopAlarmActionStrategy)
}

/// Publishes state changes to SNS topics, the OK and insufficient data topics are optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnsAlarmActionStrategy {
    pub on_alarm_topic_arn: String,
    pub on_ok_topic_arn: Option<String>,
    pub on_insufficient_data_topic_arn: Option<String>,
}

impl AlarmActionStrategy for SnsAlarmActionStrategy {
    fn add_alarm_actions(&self, actions: &mut AlarmActions, _props: &AlarmActionStrategyProps<'_>) {
        actions.add_alarm_action(&self.on_alarm_topic_arn);

        if let Some(arn) = &self.on_ok_topic_arn {
            actions.add_ok_action(arn);
        }
        if let Some(arn) = &self.on_insufficient_data_topic_arn {
            actions.add_insufficient_data_action(arn);
        }
    }
}

/// # Example
/// ```
/// use cdk_monitoring_alarms::action::notify_sns;
///
/// let action = notify_sns("arn:aws:sns:eu-west-1:123456789012:alarms", None, None);
/// ```
pub fn notify_sns(
    on_alarm_topic_arn: impl Into<String>,
    on_ok_topic_arn: Option<&str>,
    on_insufficient_data_topic_arn: Option<&str>,
) -> Arc<dyn AlarmActionStrategy> {
    Arc::new(SnsAlarmActionStrategy {
        on_alarm_topic_arn: on_alarm_topic_arn.into(),
        on_ok_topic_arn: on_ok_topic_arn.map(str::to_string),
        on_insufficient_data_topic_arn: on_insufficient_data_topic_arn.map(str::to_string),
    })
}

/// Invokes a Lambda function (or alias or version) when the alarm fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaAlarmActionStrategy {
    pub function_arn: String,
}

impl AlarmActionStrategy for LambdaAlarmActionStrategy {
    fn add_alarm_actions(&self, actions: &mut AlarmActions, _props: &AlarmActionStrategyProps<'_>) {
        actions.add_alarm_action(&self.function_arn);
    }
}

pub fn trigger_lambda(function_arn: impl Into<String>) -> Arc<dyn AlarmActionStrategy> {
    Arc::new(LambdaAlarmActionStrategy {
        function_arn: function_arn.into(),
    })
}

/// Severity of an OpsCenter item created by an alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpsItemSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl OpsItemSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "1",
            Self::High => "2",
            Self::Medium => "3",
            Self::Low => "4",
        }
    }
}

/// Creates an OpsCenter item in the alarm's account and region when the alarm fires
///
/// Scopes without account or region fall back to CloudFormation pseudo parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsItemAlarmActionStrategy {
    pub severity: OpsItemSeverity,
    /// e.g. `Availability`, `Performance`, `Security`
    pub category: Option<String>,
}

impl AlarmActionStrategy for OpsItemAlarmActionStrategy {
    fn add_alarm_actions(&self, actions: &mut AlarmActions, props: &AlarmActionStrategyProps<'_>) {
        let region = props.alarm_scope.region.as_deref().unwrap_or("${AWS::Region}");
        let account = props.alarm_scope.account.as_deref().unwrap_or("${AWS::AccountId}");
        let mut arn = format!("arn:aws:ssm:{region}:{account}:opsitem:{}", self.severity.as_str());
        if let Some(category) = &self.category {
            arn.push_str("#CATEGORY=");
            arn.push_str(category);
        }
        actions.add_alarm_action(arn);
    }
}

pub fn create_ops_item(severity: OpsItemSeverity, category: Option<&str>) -> Arc<dyn AlarmActionStrategy> {
    Arc::new(OpsItemAlarmActionStrategy {
        severity,
        category: category.map(str::to_string),
    })
}

/// Applies several strategies in order
#[derive(Debug, Clone, Default)]
pub struct MultipleAlarmActionStrategy {
    pub actions: Vec<Arc<dyn AlarmActionStrategy>>,
}

impl AlarmActionStrategy for MultipleAlarmActionStrategy {
    fn add_alarm_actions(&self, actions: &mut AlarmActions, props: &AlarmActionStrategyProps<'_>) {
        for action in &self.actions {
            action.add_alarm_actions(actions, props);
        }
    }
}

pub fn multiple_actions(actions: impl IntoIterator<Item = Arc<dyn AlarmActionStrategy>>) -> Arc<dyn AlarmActionStrategy> {
    Arc::new(MultipleAlarmActionStrategy {
        actions: actions.into_iter().collect(),
    })
}
