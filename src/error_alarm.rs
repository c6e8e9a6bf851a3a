//! # Error alarms
//!
//! Count and rate alarms for the different kinds of errors a service reports. All error alarms of
//! a resource dedupe to `AnyError` unless the factory turns that off.

use super::alarm::{AlarmWithAnnotation, ComparisonOperator, CustomAlarmThreshold, TreatMissingData};
use super::error::Result;
use super::factory::AlarmFactory;
use super::metric::AlarmMetric;
use std::fmt;
use std::sync::Arc;

const DEFAULT_ERROR_DEDUPE: &str = "AnyError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    Fault,
    Error,
    SystemError,
    UserError,
    Failure,
    Aborted,
    Throttled,
    TimedOut,
    ReadError,
    WriteError,
    Expired,
    Killed,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fault => "Fault",
            Self::Error => "Error",
            Self::SystemError => "SystemError",
            Self::UserError => "UserError",
            Self::Failure => "Failure",
            Self::Aborted => "Aborted",
            Self::Throttled => "Throttled",
            Self::TimedOut => "TimedOut",
            Self::ReadError => "ReadError",
            Self::WriteError => "WriteError",
            Self::Expired => "Expired",
            Self::Killed => "Killed",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum error count before alarming
#[derive(Clone, Default)]
pub struct ErrorCountThreshold {
    pub max_error_count: f64,
    pub custom: CustomAlarmThreshold,
}

/// Maximum error rate before alarming, in the unit of the metric
#[derive(Clone, Default)]
pub struct ErrorRateThreshold {
    pub max_error_rate: f64,
    pub custom: CustomAlarmThreshold,
}

/// Creates error count and error rate alarms through an [AlarmFactory]
pub struct ErrorAlarmFactory<'a> {
    alarm_factory: &'a AlarmFactory,
}

impl<'a> ErrorAlarmFactory<'a> {
    pub fn new(alarm_factory: &'a AlarmFactory) -> Self {
        ErrorAlarmFactory { alarm_factory }
    }

    /// Alarm named `<type>-Count`, e.g. `MyApp-Orders-Fault-Count-Critical`
    pub fn add_error_count_alarm(
        &self,
        metric: Arc<AlarmMetric>,
        error_type: ErrorType,
        props: &ErrorCountThreshold,
        disambiguator: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        self.add(
            metric,
            &props.custom,
            props.max_error_count,
            format!("{error_type}-Count"),
            format!("{error_type} count is too high."),
            disambiguator,
        )
    }

    /// Alarm named `<type>-Rate`, e.g. `MyApp-Orders-Fault-Rate`
    pub fn add_error_rate_alarm(
        &self,
        metric: Arc<AlarmMetric>,
        error_type: ErrorType,
        props: &ErrorRateThreshold,
        disambiguator: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        self.add(
            metric,
            &props.custom,
            props.max_error_rate,
            format!("{error_type}-Rate"),
            format!("{error_type} rate is too high."),
            disambiguator,
        )
    }

    fn add(
        &self,
        metric: Arc<AlarmMetric>,
        custom: &CustomAlarmThreshold,
        threshold: f64,
        alarm_name_suffix: String,
        alarm_description: String,
        disambiguator: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        let alarm_dedupe_string_suffix = if self.alarm_factory.should_use_default_dedupe_for_error() {
            DEFAULT_ERROR_DEDUPE.to_string()
        } else {
            alarm_name_suffix.clone()
        };

        let mut props = custom.to_add_alarm_props(ComparisonOperator::GreaterThanThreshold, TreatMissingData::NotBreaching);
        props.disambiguator = disambiguator.map(str::to_string);
        props.threshold = threshold;
        props.alarm_name_suffix = alarm_name_suffix;
        props.alarm_dedupe_string_suffix = Some(alarm_dedupe_string_suffix);
        props.alarm_description = alarm_description;

        self.alarm_factory.add_alarm(metric, props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::metric::{Metric, MetricStatistic};

    fn factory(use_default_dedupe: bool) -> AlarmFactory {
        Builder::new()
            .alarm_name_prefix("DummyServiceAlarms")
            .local_alarm_name_prefix("prefix")
            .use_default_dedupe_for_error(use_default_dedupe)
            .build()
            .unwrap()
    }

    fn metric() -> Arc<AlarmMetric> {
        Arc::new(
            Metric::new("DummyCustomNamespace", "Faults")
                .with_statistic(MetricStatistic::Sum)
                .into(),
        )
    }

    #[test]
    fn error_count_alarm() {
        let factory = factory(true);
        let alarm = ErrorAlarmFactory::new(&factory)
            .add_error_count_alarm(
                metric(),
                ErrorType::Fault,
                &ErrorCountThreshold {
                    max_error_count: 5.0,
                    ..Default::default()
                },
                Some("Critical"),
            )
            .unwrap();

        assert_eq!(alarm.alarm_name, "DummyServiceAlarms-prefix-Fault-Count-Critical");
        assert_eq!(alarm.dedupe_string.as_deref(), Some("DummyServiceAlarms-prefix-AnyError-Critical"));
        assert_eq!(alarm.alarm_description, "Fault count is too high.");
        assert_eq!(alarm.alarm.threshold, 5.0);
        assert_eq!(alarm.alarm.comparison_operator, ComparisonOperator::GreaterThanThreshold);
        assert_eq!(alarm.alarm.treat_missing_data, TreatMissingData::NotBreaching);
    }

    #[test]
    fn error_rate_alarm_with_overrides() {
        let factory = factory(true);
        let alarm = ErrorAlarmFactory::new(&factory)
            .add_error_rate_alarm(
                metric(),
                ErrorType::Throttled,
                &ErrorRateThreshold {
                    max_error_rate: 0.5,
                    custom: CustomAlarmThreshold {
                        comparison_operator_override: Some(ComparisonOperator::GreaterThanOrEqualToThreshold),
                        treat_missing_data_override: Some(TreatMissingData::Missing),
                        ..Default::default()
                    },
                },
                None,
            )
            .unwrap();

        assert_eq!(alarm.alarm_name, "DummyServiceAlarms-prefix-Throttled-Rate");
        assert_eq!(alarm.dedupe_string.as_deref(), Some("DummyServiceAlarms-prefix-AnyError"));
        assert_eq!(alarm.alarm_description, "Throttled rate is too high.");
        assert_eq!(alarm.alarm.threshold, 0.5);
        assert_eq!(alarm.alarm.comparison_operator, ComparisonOperator::GreaterThanOrEqualToThreshold);
        assert_eq!(alarm.alarm.treat_missing_data, TreatMissingData::Missing);
    }

    #[test]
    fn dedupe_per_error_type_without_default_dedupe() {
        let factory = factory(false);
        let errors = ErrorAlarmFactory::new(&factory);

        let count = errors
            .add_error_count_alarm(metric(), ErrorType::UserError, &ErrorCountThreshold::default(), None)
            .unwrap();
        assert_eq!(count.dedupe_string.as_deref(), Some("DummyServiceAlarms-prefix-UserError-Count"));

        let rate = errors
            .add_error_rate_alarm(metric(), ErrorType::UserError, &ErrorRateThreshold::default(), None)
            .unwrap();
        assert_eq!(rate.dedupe_string.as_deref(), Some("DummyServiceAlarms-prefix-UserError-Rate"));
    }
}
