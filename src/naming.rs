//! # Naming
//!
//! Alarm names, widget labels and dedupe strings
//!
//! Dedupe strings are matched verbatim by the paging and ticketing systems that receive the
//! alarms, so the composition rules here must stay stable between releases.

use std::sync::Arc;

const ALARM_NAME_PART_SEPARATOR: &str = "-";
const ALARM_LABEL_PART_SEPARATOR: &str = " ";

/// Parts of an alarm request that take part in naming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmNamingInput<'a> {
    pub alarm_name_suffix: &'a str,
    pub alarm_name_override: Option<&'a str>,
    pub alarm_dedupe_string_suffix: Option<&'a str>,
    pub dedupe_string_override: Option<&'a str>,
    pub disambiguator: Option<&'a str>,
}

/// Names derived for a single alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmIdentity {
    pub alarm_name: String,
    pub dedupe_string: Option<String>,
    pub widget_label: String,
}

/// Finalizes dedupe strings, both default methods leave the string untouched
pub trait AlarmDedupeStringProcessor: Send + Sync {
    /// Process a dedupe string the user supplied as an override
    fn process_dedupe_string_override(&self, dedupe_string: &str) -> String {
        dedupe_string.to_string()
    }

    /// Process an auto-generated dedupe string
    fn process_dedupe_string(&self, dedupe_string: &str) -> String {
        dedupe_string.to_string()
    }
}

/// Leaves dedupe strings as they are
#[derive(Debug, Clone, Copy, Default)]
pub struct DoNotModifyDedupeString;

impl AlarmDedupeStringProcessor for DoNotModifyDedupeString {}

/// Wraps every dedupe string, generated or overridden, in a prefix and suffix
#[derive(Debug, Clone, Default)]
pub struct ExtendDedupeString {
    prefix: String,
    suffix: String,
}

impl ExtendDedupeString {
    pub fn new(prefix: Option<&str>, suffix: Option<&str>) -> Self {
        ExtendDedupeString {
            prefix: prefix.unwrap_or_default().to_string(),
            suffix: suffix.unwrap_or_default().to_string(),
        }
    }
}

impl AlarmDedupeStringProcessor for ExtendDedupeString {
    fn process_dedupe_string_override(&self, dedupe_string: &str) -> String {
        format!("{}{}{}", self.prefix, dedupe_string, self.suffix)
    }

    fn process_dedupe_string(&self, dedupe_string: &str) -> String {
        format!("{}{}{}", self.prefix, dedupe_string, self.suffix)
    }
}

/// Names alarms from a global prefix (usually the application) and a local prefix (usually the
/// monitored resource)
///
/// # Example
/// ```
/// use cdk_monitoring_alarms::{AlarmNamingInput, AlarmNamingStrategy};
///
/// let naming = AlarmNamingStrategy::new("MyApp", "Orders");
/// let input = AlarmNamingInput {
///     alarm_name_suffix: "Latency-P99",
///     alarm_dedupe_string_suffix: Some("AnyLatency"),
///     ..Default::default()
/// };
/// assert_eq!(naming.get_name(&input), "MyApp-Orders-Latency-P99");
/// assert_eq!(naming.get_dedupe_string(&input).as_deref(), Some("MyApp-Orders-AnyLatency"));
/// assert_eq!(naming.get_widget_label(&input), "Orders Latency-P99");
/// ```
#[derive(Clone)]
pub struct AlarmNamingStrategy {
    global_prefix: String,
    local_prefix: String,
    dedupe_string_processor: Arc<dyn AlarmDedupeStringProcessor>,
}

impl AlarmNamingStrategy {
    pub fn new(global_prefix: impl Into<String>, local_prefix: impl Into<String>) -> Self {
        Self::with_dedupe_string_processor(global_prefix, local_prefix, Arc::new(DoNotModifyDedupeString))
    }

    pub fn with_dedupe_string_processor(
        global_prefix: impl Into<String>,
        local_prefix: impl Into<String>,
        dedupe_string_processor: Arc<dyn AlarmDedupeStringProcessor>,
    ) -> Self {
        AlarmNamingStrategy {
            global_prefix: global_prefix.into(),
            local_prefix: local_prefix.into(),
            dedupe_string_processor,
        }
    }

    pub fn global_prefix(&self) -> &str {
        &self.global_prefix
    }

    pub fn local_prefix(&self) -> &str {
        &self.local_prefix
    }

    /// `alarm_name_override` if set, otherwise `{global}-{local}-{suffix}[-{disambiguator}]`
    ///
    /// A part equal to an earlier one is left out, for all three names.
    pub fn get_name(&self, input: &AlarmNamingInput<'_>) -> String {
        if let Some(name) = present(input.alarm_name_override) {
            return name.to_string();
        }

        let mut parts = vec![
            self.global_prefix.as_str(),
            self.local_prefix.as_str(),
            input.alarm_name_suffix,
        ];
        parts.extend(present(input.disambiguator));
        join_distinct(&parts, ALARM_NAME_PART_SEPARATOR)
    }

    /// `{local} {suffix}[ {disambiguator}]`, the global prefix is left out to keep labels short
    pub fn get_widget_label(&self, input: &AlarmNamingInput<'_>) -> String {
        let mut parts = vec![self.local_prefix.as_str(), input.alarm_name_suffix];
        parts.extend(present(input.disambiguator));
        join_distinct(&parts, ALARM_LABEL_PART_SEPARATOR)
    }

    /// Resolves the dedupe string
    ///
    /// * `dedupe_string_override` wins and only goes through the override processing
    /// * with `alarm_dedupe_string_suffix`, `{global}-{local}-{suffix}[-{disambiguator}]` is processed
    /// * otherwise the alarm is not deduped at all
    pub fn get_dedupe_string(&self, input: &AlarmNamingInput<'_>) -> Option<String> {
        if let Some(dedupe_string) = present(input.dedupe_string_override) {
            return Some(
                self.dedupe_string_processor
                    .process_dedupe_string_override(dedupe_string),
            );
        }

        let suffix = present(input.alarm_dedupe_string_suffix)?;
        let mut parts = vec![self.global_prefix.as_str(), self.local_prefix.as_str(), suffix];
        parts.extend(present(input.disambiguator));
        let dedupe_string = join_distinct(&parts, ALARM_NAME_PART_SEPARATOR);
        Some(self.dedupe_string_processor.process_dedupe_string(&dedupe_string))
    }

    pub fn get_identity(&self, input: &AlarmNamingInput<'_>) -> AlarmIdentity {
        AlarmIdentity {
            alarm_name: self.get_name(input),
            dedupe_string: self.get_dedupe_string(input),
            widget_label: self.get_widget_label(input),
        }
    }
}

/// Joins the parts, skipping any part equal to an earlier one
fn join_distinct(parts: &[&str], separator: &str) -> String {
    let mut distinct: Vec<&str> = Vec::with_capacity(parts.len());
    for &part in parts {
        if !distinct.contains(&part) {
            distinct.push(part);
        }
    }
    distinct.join(separator)
}

/// Empty optional strings count as unset
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
