use super::action::{noop_action, AlarmActionStrategy};
use super::error::{Error, Result};
use super::factory::{ActionsEnabled, AlarmFactory, AlarmFactoryDefaults};
use super::metric::AlarmScope;
use super::naming::{AlarmDedupeStringProcessor, AlarmNamingStrategy, DoNotModifyDedupeString};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builder for an [AlarmFactory]
///
/// # Example
/// ```
///  let factory = cdk_monitoring_alarms::Builder::new()
///      .alarm_name_prefix("MyApplication")
///      .local_alarm_name_prefix("Orders")
///      .actions_enabled(true)
///      .build()
///      .unwrap();
/// ```
pub struct Builder {
    alarm_name_prefix: Option<String>,
    local_alarm_name_prefix: String,
    alarm_scope: AlarmScope,
    actions_enabled: ActionsEnabled,
    action: Arc<dyn AlarmActionStrategy>,
    datapoints_to_alarm: Option<u32>,
    evaluation_periods: Option<u32>,
    documentation_link: Option<String>,
    runbook_link: Option<String>,
    dedupe_string_processor: Arc<dyn AlarmDedupeStringProcessor>,
    use_default_dedupe_for_error: bool,
    use_default_dedupe_for_latency: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            alarm_name_prefix: None,
            local_alarm_name_prefix: Default::default(),
            alarm_scope: Default::default(),
            actions_enabled: Default::default(),
            action: noop_action(),
            datapoints_to_alarm: None,
            evaluation_periods: None,
            documentation_link: None,
            runbook_link: None,
            dedupe_string_processor: Arc::new(DoNotModifyDedupeString),
            use_default_dedupe_for_error: true,
            use_default_dedupe_for_latency: true,
        }
    }

    /// Takes every value from loaded defaults, later setters still override them
    pub fn defaults(self, defaults: AlarmFactoryDefaults) -> Self {
        Self {
            alarm_name_prefix: Some(defaults.alarm_name_prefix),
            actions_enabled: defaults.actions_enabled,
            datapoints_to_alarm: defaults.datapoints_to_alarm,
            evaluation_periods: defaults.evaluation_periods,
            documentation_link: defaults.documentation_link,
            runbook_link: defaults.runbook_link,
            use_default_dedupe_for_error: defaults.use_default_dedupe_for_error,
            use_default_dedupe_for_latency: defaults.use_default_dedupe_for_latency,
            ..self
        }
    }

    /// Sets the global alarm name prefix, usually the application name
    /// * Must be set or build() will return Err("alarm_name_prefix missing")
    pub fn alarm_name_prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            alarm_name_prefix: Some(prefix.into()),
            ..self
        }
    }

    /// Sets the local alarm name prefix, usually the monitored resource
    pub fn local_alarm_name_prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            local_alarm_name_prefix: prefix.into(),
            ..self
        }
    }

    /// Account and region the alarms are deployed to
    pub fn scope(self, alarm_scope: AlarmScope) -> Self {
        Self { alarm_scope, ..self }
    }

    /// Enables or disables actions for all alarms
    pub fn actions_enabled(self, enabled: bool) -> Self {
        Self {
            actions_enabled: ActionsEnabled::All(enabled),
            ..self
        }
    }

    /// Enables or disables actions for alarms with the given disambiguator
    /// * This method can be called multiple times with distinct disambiguators
    /// * Replaces a previous actions_enabled(bool)
    pub fn actions_enabled_for(mut self, disambiguator: impl Into<String>, enabled: bool) -> Self {
        let mut map = match self.actions_enabled {
            ActionsEnabled::PerDisambiguator(map) => map,
            ActionsEnabled::All(_) => BTreeMap::new(),
        };
        map.insert(disambiguator.into(), enabled);
        self.actions_enabled = ActionsEnabled::PerDisambiguator(map);
        self
    }

    /// What alarms do when they change state, unless the request overrides it
    /// * Defaults to no action
    pub fn action(self, action: Arc<dyn AlarmActionStrategy>) -> Self {
        Self { action, ..self }
    }

    pub fn datapoints_to_alarm(self, datapoints_to_alarm: u32) -> Self {
        Self {
            datapoints_to_alarm: Some(datapoints_to_alarm),
            ..self
        }
    }

    /// Defaults to datapoints_to_alarm
    pub fn evaluation_periods(self, evaluation_periods: u32) -> Self {
        Self {
            evaluation_periods: Some(evaluation_periods),
            ..self
        }
    }

    /// Link appended to every alarm description
    pub fn documentation_link(self, link: impl Into<String>) -> Self {
        Self {
            documentation_link: Some(link.into()),
            ..self
        }
    }

    /// Link appended to every alarm description, before the documentation link
    pub fn runbook_link(self, link: impl Into<String>) -> Self {
        Self {
            runbook_link: Some(link.into()),
            ..self
        }
    }

    pub fn dedupe_string_processor(self, processor: Arc<dyn AlarmDedupeStringProcessor>) -> Self {
        Self {
            dedupe_string_processor: processor,
            ..self
        }
    }

    pub fn use_default_dedupe_for_error(self, enabled: bool) -> Self {
        Self {
            use_default_dedupe_for_error: enabled,
            ..self
        }
    }

    pub fn use_default_dedupe_for_latency(self, enabled: bool) -> Self {
        Self {
            use_default_dedupe_for_latency: enabled,
            ..self
        }
    }

    /// Consumes the builder into an alarm factory
    pub fn build(self) -> Result<AlarmFactory> {
        let alarm_name_prefix = self
            .alarm_name_prefix
            .ok_or(Error::MissingConfiguration("alarm_name_prefix missing"))?;

        Ok(AlarmFactory {
            naming: AlarmNamingStrategy::with_dedupe_string_processor(
                alarm_name_prefix,
                self.local_alarm_name_prefix,
                self.dedupe_string_processor,
            ),
            alarm_scope: self.alarm_scope,
            actions_enabled: self.actions_enabled,
            action: self.action,
            datapoints_to_alarm: self.datapoints_to_alarm,
            evaluation_periods: self.evaluation_periods,
            documentation_link: self.documentation_link,
            runbook_link: self.runbook_link,
            use_default_dedupe_for_error: self.use_default_dedupe_for_error,
            use_default_dedupe_for_latency: self.use_default_dedupe_for_latency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{AlarmNamingInput, ExtendDedupeString};

    #[test]
    fn missing_prefix() {
        let result = Builder::new().local_alarm_name_prefix("Orders").build();
        assert_eq!(result.err().map(|e| e.to_string()).as_deref(), Some("alarm_name_prefix missing"));
    }

    #[test]
    fn defaults_then_overrides() {
        let defaults = AlarmFactoryDefaults::from_json(r#"{"alarmNamePrefix": "MyApp", "useDefaultDedupeForLatency": false}"#)
            .unwrap();
        let factory = Builder::new()
            .defaults(defaults)
            .local_alarm_name_prefix("Orders")
            .use_default_dedupe_for_error(false)
            .dedupe_string_processor(Arc::new(ExtendDedupeString::new(None, Some("-Prod"))))
            .build()
            .unwrap();

        assert!(!factory.should_use_default_dedupe_for_error());
        assert!(!factory.should_use_default_dedupe_for_latency());
        assert_eq!(factory.naming().global_prefix(), "MyApp");
        assert_eq!(factory.naming().local_prefix(), "Orders");

        let input = AlarmNamingInput {
            alarm_name_suffix: "Errors",
            alarm_dedupe_string_suffix: Some("AnyError"),
            ..Default::default()
        };
        assert_eq!(
            factory.naming().get_dedupe_string(&input).as_deref(),
            Some("MyApp-Orders-AnyError-Prod")
        );
    }

    #[test]
    fn actions_enabled_per_disambiguator() {
        let factory = Builder::new()
            .alarm_name_prefix("MyApp")
            .actions_enabled(true)
            .actions_enabled_for("Critical", true)
            .build()
            .unwrap();
        assert!(factory.actions_enabled.for_disambiguator(Some("Critical")));
        assert!(!factory.actions_enabled.for_disambiguator(Some("Warning")));
        assert!(!factory.actions_enabled.for_disambiguator(None));
    }
}
