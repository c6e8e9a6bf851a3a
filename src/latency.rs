//! # Latency
//!
//! Latency and duration alarms. Thresholds are durations converted to fractional milliseconds,
//! so sub-millisecond values such as 0.5ms are valid thresholds.

use super::alarm::{AlarmWithAnnotation, ComparisonOperator, CustomAlarmThreshold, TreatMissingData};
use super::error::Result;
use super::factory::AlarmFactory;
use super::metric::{AlarmMetric, MetricStatistic};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Statistic a latency alarm or graph is based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatencyType {
    P50,
    P70,
    P90,
    P95,
    P99,
    P999,
    P9999,
    P100,
    Tm50,
    Tm70,
    Tm90,
    Tm95,
    Tm99,
    Tm999,
    Tm9999,
    Tm95Top,
    Tm99Top,
    Tm999Top,
    Tm9999Top,
    Average,
    Max,
}

impl LatencyType {
    pub const ALL: [LatencyType; 21] = [
        Self::P50,
        Self::P70,
        Self::P90,
        Self::P95,
        Self::P99,
        Self::P999,
        Self::P9999,
        Self::P100,
        Self::Tm50,
        Self::Tm70,
        Self::Tm90,
        Self::Tm95,
        Self::Tm99,
        Self::Tm999,
        Self::Tm9999,
        Self::Tm95Top,
        Self::Tm99Top,
        Self::Tm999Top,
        Self::Tm9999Top,
        Self::Average,
        Self::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P50 => "P50",
            Self::P70 => "P70",
            Self::P90 => "P90",
            Self::P95 => "P95",
            Self::P99 => "P99",
            Self::P999 => "P999",
            Self::P9999 => "P9999",
            Self::P100 => "P100",
            Self::Tm50 => "TM50",
            Self::Tm70 => "TM70",
            Self::Tm90 => "TM90",
            Self::Tm95 => "TM95",
            Self::Tm99 => "TM99",
            Self::Tm999 => "TM999",
            Self::Tm9999 => "TM9999",
            Self::Tm95Top => "TM(95%:100%)",
            Self::Tm99Top => "TM(99%:100%)",
            Self::Tm999Top => "TM(99.9%:100%)",
            Self::Tm9999Top => "TM(99.99%:100%)",
            Self::Average => "Average",
            Self::Max => "Maximum",
        }
    }

    pub fn statistic(&self) -> MetricStatistic {
        match self {
            Self::P50 => MetricStatistic::P50,
            Self::P70 => MetricStatistic::P70,
            Self::P90 => MetricStatistic::P90,
            Self::P95 => MetricStatistic::P95,
            Self::P99 => MetricStatistic::P99,
            Self::P999 => MetricStatistic::P999,
            Self::P9999 => MetricStatistic::P9999,
            Self::P100 => MetricStatistic::P100,
            Self::Tm50 => MetricStatistic::Tm50,
            Self::Tm70 => MetricStatistic::Tm70,
            Self::Tm90 => MetricStatistic::Tm90,
            Self::Tm95 => MetricStatistic::Tm95,
            Self::Tm99 => MetricStatistic::Tm99,
            Self::Tm999 => MetricStatistic::Tm999,
            Self::Tm9999 => MetricStatistic::Tm9999,
            Self::Tm95Top => MetricStatistic::Tm95Top,
            Self::Tm99Top => MetricStatistic::Tm99Top,
            Self::Tm999Top => MetricStatistic::Tm999Top,
            Self::Tm9999Top => MetricStatistic::Tm9999Top,
            Self::Average => MetricStatistic::Average,
            Self::Max => MetricStatistic::Max,
        }
    }

    /// Id used for this latency type in metric math expressions
    pub fn expression_id(&self) -> &'static str {
        match self {
            Self::P50 | Self::P70 | Self::P90 | Self::P95 | Self::P99 | Self::P999 | Self::P9999 | Self::P100 => {
                &self.as_str()[1..]
            }
            // Kept short for existing dashboards
            Self::Average => "Avg",
            Self::Max => "Max",
            _ => self.as_str(),
        }
    }

    /// Graph label, percentiles get their decimal point and an average placeholder
    pub fn label(&self) -> String {
        const AVERAGE_SUFFIX: &str = " (avg: ${AVG})";

        match self {
            Self::P999 | Self::Tm999 => self.as_str().replacen("999", "99.9", 1) + AVERAGE_SUFFIX,
            Self::P9999 | Self::Tm9999 | Self::Tm95Top | Self::Tm99Top | Self::Tm999Top | Self::Tm9999Top => {
                self.as_str().replacen("9999", "99.99", 1) + AVERAGE_SUFFIX
            }
            Self::Average => "Average".to_string(),
            Self::Max => "Maximum".to_string(),
            _ => self.as_str().to_string() + AVERAGE_SUFFIX,
        }
    }
}

impl fmt::Display for LatencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum latency before alarming
#[derive(Clone, Default)]
pub struct LatencyThreshold {
    pub max_latency: Duration,
    pub custom: CustomAlarmThreshold,
}

/// Maximum duration before alarming
#[derive(Clone, Default)]
pub struct DurationThreshold {
    pub max_duration: Duration,
    pub custom: CustomAlarmThreshold,
}

/// Duration as fractional milliseconds, exact for whole microseconds
pub fn duration_to_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Creates latency and duration alarms through an [AlarmFactory]
pub struct LatencyAlarmFactory<'a> {
    alarm_factory: &'a AlarmFactory,
}

impl<'a> LatencyAlarmFactory<'a> {
    pub fn new(alarm_factory: &'a AlarmFactory) -> Self {
        LatencyAlarmFactory { alarm_factory }
    }

    pub fn add_latency_alarm(
        &self,
        metric: Arc<AlarmMetric>,
        latency_type: LatencyType,
        props: &LatencyThreshold,
        disambiguator: Option<&str>,
        additional_alarm_name_suffix: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        self.add(
            metric,
            &props.custom,
            props.max_latency,
            AlarmKind {
                name: "Latency",
                default_dedupe: "AnyLatency",
                use_default_dedupe: self.alarm_factory.should_use_default_dedupe_for_latency(),
                description: format!("{latency_type} latency is too high."),
            },
            latency_type,
            disambiguator,
            additional_alarm_name_suffix,
        )
    }

    pub fn add_integration_latency_alarm(
        &self,
        metric: Arc<AlarmMetric>,
        latency_type: LatencyType,
        props: &LatencyThreshold,
        disambiguator: Option<&str>,
        additional_alarm_name_suffix: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        self.add(
            metric,
            &props.custom,
            props.max_latency,
            AlarmKind {
                name: "IntegrationLatency",
                default_dedupe: "AnyLatency",
                use_default_dedupe: self.alarm_factory.should_use_default_dedupe_for_latency(),
                description: format!("{latency_type} integration latency is too high."),
            },
            latency_type,
            disambiguator,
            additional_alarm_name_suffix,
        )
    }

    pub fn add_duration_alarm(
        &self,
        metric: Arc<AlarmMetric>,
        latency_type: LatencyType,
        props: &DurationThreshold,
        disambiguator: Option<&str>,
        additional_alarm_name_suffix: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        self.add(
            metric,
            &props.custom,
            props.max_duration,
            AlarmKind {
                name: "Duration",
                default_dedupe: "AnyDuration",
                use_default_dedupe: self.alarm_factory.should_use_default_dedupe_for_latency(),
                description: format!("{latency_type} duration is too long."),
            },
            latency_type,
            disambiguator,
            additional_alarm_name_suffix,
        )
    }

    pub fn add_jvm_garbage_collection_duration_alarm(
        &self,
        metric: Arc<AlarmMetric>,
        latency_type: LatencyType,
        props: &DurationThreshold,
        disambiguator: Option<&str>,
        additional_alarm_name_suffix: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        self.add(
            metric,
            &props.custom,
            props.max_duration,
            AlarmKind {
                name: "Garbage-Collection-Time",
                default_dedupe: "AnyDuration",
                use_default_dedupe: self.alarm_factory.should_use_default_dedupe_for_latency(),
                description: format!("{latency_type} duration is too long."),
            },
            latency_type,
            disambiguator,
            additional_alarm_name_suffix,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn add(
        &self,
        metric: Arc<AlarmMetric>,
        custom: &CustomAlarmThreshold,
        threshold: Duration,
        kind: AlarmKind,
        latency_type: LatencyType,
        disambiguator: Option<&str>,
        additional_alarm_name_suffix: Option<&str>,
    ) -> Result<AlarmWithAnnotation> {
        let alarm_name_suffix = [Some(kind.name), Some(latency_type.as_str()), additional_alarm_name_suffix]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("-");

        let alarm_dedupe_string_suffix = if kind.use_default_dedupe {
            kind.default_dedupe.to_string()
        } else {
            alarm_name_suffix.clone()
        };

        let mut props = custom.to_add_alarm_props(ComparisonOperator::GreaterThanThreshold, TreatMissingData::NotBreaching);
        props.disambiguator = disambiguator.map(str::to_string);
        props.threshold = duration_to_millis(threshold);
        props.alarm_name_suffix = alarm_name_suffix;
        props.alarm_dedupe_string_suffix = Some(alarm_dedupe_string_suffix);
        props.alarm_description = kind.description;

        self.alarm_factory.add_alarm(metric, props)
    }
}

/// What differs between the latency alarm flavours
struct AlarmKind {
    name: &'static str,
    default_dedupe: &'static str,
    use_default_dedupe: bool,
    description: String,
}
