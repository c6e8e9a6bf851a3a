pub use {
    action::{
        create_ops_item, multiple_actions, noop_action, notify_sns, trigger_lambda, AlarmActionStrategy,
        AlarmActionStrategyProps, AlarmActions, OpsItemSeverity,
    },
    adjuster::{CompositeMetricAdjuster, DefaultMetricAdjuster, MetricAdjuster, Route53HealthCheckMetricAdjuster},
    alarm::{
        AddAlarmProps, Alarm, AlarmDefinition, AlarmWithAnnotation, ComparisonOperator, CustomAlarmThreshold,
        HorizontalAnnotation, Shading, TreatMissingData,
    },
    builder::Builder,
    cfn::AlarmTemplate,
    error::{Error, Result},
    error_alarm::{ErrorAlarmFactory, ErrorCountThreshold, ErrorRateThreshold, ErrorType},
    factory::{
        ActionsEnabled, AddCompositeAlarmProps, AlarmFactory, AlarmFactoryDefaults, CompositeAlarm,
        CompositeAlarmOperator, DEFAULT_DATAPOINTS_TO_ALARM,
    },
    latency::{DurationThreshold, LatencyAlarmFactory, LatencyThreshold, LatencyType},
    metric::{AlarmMetric, AlarmScope, MathExpression, Metric, MetricStatistic, DEFAULT_METRIC_PERIOD},
    naming::{
        AlarmDedupeStringProcessor, AlarmIdentity, AlarmNamingInput, AlarmNamingStrategy, DoNotModifyDedupeString,
        ExtendDedupeString,
    },
    scale::{scale_alarm, scale_alarms, AlarmCloneFunction, ScaleAlarmsProps},
    strings::{
        capitalize_first_letter, capitalize_first_letter_only, get_hash_for_metric_expression_id,
        remove_brackets_with_dynamic_labels,
    },
};

pub mod action;
pub mod adjuster;
pub mod alarm;
mod builder;
pub mod cfn;
mod error;
pub mod error_alarm;
mod factory;
pub mod latency;
pub mod metric;
pub mod naming;
mod scale;
pub mod strings;
#[cfg(test)]
mod test;
