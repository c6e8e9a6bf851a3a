use super::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn simple_test() {
        init_logging();

        let factory = Builder::new()
            .alarm_name_prefix("MyApp")
            .local_alarm_name_prefix("Orders")
            .actions_enabled_for("Critical", true)
            .runbook_link("https://runbook")
            .build()
            .unwrap();

        let latency = LatencyAlarmFactory::new(&factory)
            .add_latency_alarm(
                Arc::new(
                    Metric::new("MyNamespace", "Latency")
                        .with_dimension("Api", "Orders")
                        .with_statistic(MetricStatistic::P99)
                        .with_unit(metrics::Unit::Milliseconds)
                        .with_label("P99 (avg: ${AVG})")
                        .into(),
                ),
                LatencyType::P99,
                &LatencyThreshold {
                    max_latency: Duration::from_millis(250),
                    ..Default::default()
                },
                Some("Critical"),
                None,
            )
            .unwrap();

        let errors = factory
            .add_alarm(
                Arc::new(
                    Metric::new("MyNamespace", "Errors")
                        .with_dimension("Api", "Orders")
                        .with_statistic(MetricStatistic::Sum)
                        .with_unit(metrics::Unit::Count)
                        .into(),
                ),
                AddAlarmProps {
                    alarm_name_suffix: "Errors".into(),
                    alarm_dedupe_string_suffix: Some("AnyError".into()),
                    alarm_description: "Too many errors.".into(),
                    threshold: 5.0,
                    comparison_operator: ComparisonOperator::GreaterThanOrEqualToThreshold,
                    treat_missing_data: TreatMissingData::NotBreaching,
                    datapoints_to_alarm: Some(2),
                    evaluation_periods: Some(4),
                    action_override: Some(notify_sns("arn:aws:sns:us-east-1:123456789012:orders-alarms", None, None)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(latency.alarm_name, "MyApp-Orders-Latency-P99-Critical");
        assert_eq!(latency.dedupe_string.as_deref(), Some("MyApp-Orders-AnyLatency-Critical"));
        assert_eq!(latency.alarm_label, "Orders Latency-P99 Critical");
        assert_eq!(latency.annotation.label, "P99 > 250 for 3 datapoints within 15 minutes");
        assert_eq!(errors.alarm_name, "MyApp-Orders-Errors");
        assert_eq!(errors.annotation.label, "Errors >= 5 for 2 datapoints within 20 minutes");

        let composite = factory
            .add_composite_alarm(
                &[latency.clone(), errors.clone()],
                AddCompositeAlarmProps {
                    disambiguator: Some("Critical".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let mut template = AlarmTemplate::new();
        template.add_alarm(&latency).add_alarm(&errors).add_composite_alarm(&composite);

        let mut output = Vec::new();
        template.write(&mut output).unwrap();
        let output_str = std::str::from_utf8(&output).unwrap();
        assert_eq!(
            output_str,
            r#"{"Resources":{"MyAppOrdersCompositeCritical":{"Type":"AWS::CloudWatch::CompositeAlarm","Properties":{"AlarmName":"MyApp-Orders-Composite-Critical","AlarmDescription":"Composite alarm \r\nRunbook: https://runbook","AlarmRule":"(ALARM(\"MyApp-Orders-Latency-P99-Critical\") OR ALARM(\"MyApp-Orders-Errors\"))","ActionsEnabled":true}},"MyAppOrdersErrors":{"Type":"AWS::CloudWatch::Alarm","Properties":{"AlarmName":"MyApp-Orders-Errors","AlarmDescription":"Too many errors. \r\nRunbook: https://runbook","ActionsEnabled":false,"AlarmActions":["arn:aws:sns:us-east-1:123456789012:orders-alarms"],"ComparisonOperator":"GreaterThanOrEqualToThreshold","Threshold":5.0,"EvaluationPeriods":4,"DatapointsToAlarm":2,"TreatMissingData":"notBreaching","MetricName":"Errors","Namespace":"MyNamespace","Dimensions":[{"Name":"Api","Value":"Orders"}],"Period":300,"Statistic":"Sum","Unit":"Count"}},"MyAppOrdersLatencyP99Critical":{"Type":"AWS::CloudWatch::Alarm","Properties":{"AlarmName":"MyApp-Orders-Latency-P99-Critical","AlarmDescription":"P99 latency is too high. \r\nRunbook: https://runbook","ActionsEnabled":true,"ComparisonOperator":"GreaterThanThreshold","Threshold":250.0,"EvaluationPeriods":3,"DatapointsToAlarm":3,"TreatMissingData":"notBreaching","Metrics":[{"Id":"m1","Label":"P99","MetricStat":{"Metric":{"MetricName":"Latency","Namespace":"MyNamespace","Dimensions":[{"Name":"Api","Value":"Orders"}]},"Period":300,"Stat":"p99","Unit":"Milliseconds"},"ReturnData":true}]}}}}
"#
        );
    }

    #[test]
    fn route53_health_check_alarm() {
        let factory = Builder::new()
            .alarm_name_prefix("MyApp")
            .local_alarm_name_prefix("Endpoint")
            .scope(AlarmScope::new("123456789012", "us-east-1"))
            .build()
            .unwrap();

        let metric: Arc<AlarmMetric> = Arc::new(
            Metric::new("MyNamespace", "Errors")
                .with_statistic(MetricStatistic::Sum)
                .with_label("Errors")
                .into(),
        );
        let props = AddAlarmProps {
            alarm_name_suffix: "Errors".into(),
            alarm_description: "Too many errors.".into(),
            threshold: 1.0,
            metric_adjuster: Some(Arc::new(Route53HealthCheckMetricAdjuster)),
            ..Default::default()
        };

        let alarm = factory.add_alarm(metric, props.clone()).unwrap();
        assert_eq!(alarm.alarm.metric.label(), None);

        let mut output = Vec::new();
        AlarmTemplate::new().add_alarm(&alarm).write(&mut output).unwrap();
        assert!(!std::str::from_utf8(&output).unwrap().contains("\"Metrics\""));

        let other_account: Arc<AlarmMetric> = Arc::new(
            Metric::new("MyNamespace", "Errors")
                .with_account("210987654321")
                .with_statistic(MetricStatistic::Sum)
                .into(),
        );
        let err = factory.add_alarm(other_account, props).unwrap_err();
        assert_eq!(err.to_string(), "Cross-account metrics are not supported.");
    }

    #[test]
    fn scaled_clones() {
        init_logging();

        let factory = Builder::new()
            .alarm_name_prefix("MyApp")
            .local_alarm_name_prefix("Orders")
            .build()
            .unwrap();

        let alarms = [
            factory
                .add_alarm(
                    Arc::new(Metric::new("MyNamespace", "Availability").into()),
                    AddAlarmProps {
                        alarm_name_suffix: "Availability".into(),
                        alarm_dedupe_string_suffix: Some("Availability".into()),
                        threshold: 99.0,
                        comparison_operator: ComparisonOperator::LessThanThreshold,
                        ..Default::default()
                    },
                )
                .unwrap(),
            factory
                .add_alarm(
                    Arc::new(Metric::new("MyNamespace", "Requests").with_statistic(MetricStatistic::N).into()),
                    AddAlarmProps {
                        alarm_name_suffix: "Requests".into(),
                        threshold: 1000.0,
                        period: Some(Duration::from_secs(3600)),
                        datapoints_to_alarm: Some(1),
                        ..Default::default()
                    },
                )
                .unwrap(),
        ];

        let clones = factory
            .clone_alarms(
                &alarms,
                &scale_alarms(ScaleAlarmsProps {
                    disambiguator: "Rollback".into(),
                    threshold_multiplier: Some(2.0),
                    ..Default::default()
                }),
            )
            .unwrap();

        assert_eq!(clones[0].alarm_name, "MyApp-Orders-Availability-Rollback");
        assert_eq!(
            clones[0].dedupe_string.as_deref(),
            Some("MyApp-Orders-Availability-Rollback")
        );
        assert_eq!(clones[0].alarm.threshold, 49.5);
        assert_eq!(clones[0].alarm.evaluation_periods, 3);

        assert_eq!(clones[1].alarm_name, "MyApp-Orders-Requests-Rollback");
        assert_eq!(clones[1].alarm.metric.period(), Duration::from_secs(900));
        assert_eq!(clones[1].alarm.datapoints_to_alarm, 4);
        assert_eq!(clones[1].alarm.evaluation_periods, 4);
        assert_eq!(clones[1].alarm.threshold, 500.0);
    }
}
