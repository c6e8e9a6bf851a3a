#![allow(non_snake_case)]
use cdk_monitoring_alarms::{
    noop_action, notify_sns, scale_alarms, AddCompositeAlarmProps, AlarmFactoryDefaults, AlarmTemplate, Builder,
    CustomAlarmThreshold, Error, ErrorAlarmFactory, ErrorCountThreshold, ErrorType, LatencyAlarmFactory,
    LatencyThreshold, LatencyType, Metric, MetricStatistic, ScaleAlarmsProps,
};
use std::sync::Arc;
use std::time::Duration;

const DEFAULTS: &str = r#"{
    "alarmNamePrefix": "AlarmsTest",
    "actionsEnabled": {"Critical": true, "Rollback": true},
    "runbookLink": "https://example.com/runbook"
}"#;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .compact()
        .init();

    let defaults = match std::env::var("ALARM_DEFAULTS") {
        Ok(path) => AlarmFactoryDefaults::from_json(&std::fs::read_to_string(path)?)?,
        Err(_) => AlarmFactoryDefaults::from_json(DEFAULTS)?,
    };

    let action = match std::env::var("ALARM_TOPIC_ARN") {
        Ok(topic_arn) => notify_sns(topic_arn, None, None),
        Err(_) => noop_action(),
    };

    let factory = Builder::new()
        .defaults(defaults)
        .local_alarm_name_prefix("Orders")
        .action(action)
        .build()?;

    let latency = LatencyAlarmFactory::new(&factory).add_latency_alarm(
        Arc::new(
            Metric::new("AlarmsTest", "Latency")
                .with_dimension("Api", "Orders")
                .with_statistic(MetricStatistic::P99)
                .with_unit(metrics::Unit::Milliseconds)
                .into(),
        ),
        LatencyType::P99,
        &LatencyThreshold {
            max_latency: Duration::from_millis(500),
            ..Default::default()
        },
        Some("Critical"),
        None,
    )?;

    let errors = ErrorAlarmFactory::new(&factory).add_error_count_alarm(
        Arc::new(
            Metric::new("AlarmsTest", "Errors")
                .with_dimension("Api", "Orders")
                .with_statistic(MetricStatistic::Sum)
                .with_unit(metrics::Unit::Count)
                .into(),
        ),
        ErrorType::Fault,
        &ErrorCountThreshold {
            max_error_count: 10.0,
            custom: CustomAlarmThreshold {
                fill_alarm_range: true,
                ..Default::default()
            },
        },
        Some("Critical"),
    )?;

    let critical = [latency, errors];
    let rollback = factory.clone_alarms(
        &critical,
        &scale_alarms(ScaleAlarmsProps {
            disambiguator: "Rollback".into(),
            threshold_multiplier: Some(0.8),
            datapoints_to_alarm_multiplier: Some(0.5),
            ..Default::default()
        }),
    )?;
    let composite = factory.add_composite_alarm(
        &rollback,
        AddCompositeAlarmProps {
            disambiguator: Some("Rollback".into()),
            ..Default::default()
        },
    )?;

    for alarm in critical.iter().chain(&rollback) {
        tracing::info!(
            alarm_name = %alarm.alarm_name,
            dedupe_string = ?alarm.dedupe_string,
            annotation = %serde_json::to_string(&alarm.annotation)?,
            "alarm"
        );
    }

    let mut template = AlarmTemplate::new();
    for alarm in critical.iter().chain(&rollback) {
        template.add_alarm(alarm);
    }
    template.add_composite_alarm(&composite);
    template.write(std::io::stdout().lock())
}
