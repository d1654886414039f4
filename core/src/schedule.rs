// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Schedule tags stored in the shared extended properties of an event.
//!
//! A tag `Soccer` is stored as the property `31cal/Soccer = Soccer`. Any single character may
//! separate the marker from the (percent-encoded) tag when reading.

use mirrorcal_gcal::{Event, ExtendedProperties};

/// Marker prefixing every schedule property key.
pub const SCHEDULE_MARKER: &str = "31cal";

/// Extracts the schedule tags of an event, in property key order.
pub fn event_schedules(event: &Event) -> Vec<String> {
    let Some(props) = &event.extended_properties else {
        return Vec::new();
    };

    props
        .shared
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(key, _)| parse_schedule_key(key))
        .collect()
}

/// Property key holding the given tag.
pub fn schedule_key(schedule: &str) -> String {
    format!("{SCHEDULE_MARKER}/{schedule}")
}

/// Tags the event with a schedule.
pub fn add_schedule(event: &mut Event, schedule: &str) {
    event
        .extended_properties
        .get_or_insert_with(ExtendedProperties::default)
        .shared
        .insert(schedule_key(schedule), schedule.to_string());
}

/// Removes a schedule tag, returns whether it was present.
pub fn remove_schedule(event: &mut Event, schedule: &str) -> bool {
    event
        .extended_properties
        .as_mut()
        .is_some_and(|props| props.shared.remove(&schedule_key(schedule)).is_some())
}

fn parse_schedule_key(key: &str) -> Option<String> {
    let rest = key.strip_prefix(SCHEDULE_MARKER)?;
    let mut chars = rest.chars();
    chars.next()?; // separator
    let encoded = chars.as_str();
    if encoded.is_empty() {
        return None;
    }

    match urlencoding::decode(encoded) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(err) => {
            tracing::warn!(key, %err, "schedule tag is not valid UTF-8 after decoding");
            Some(encoded.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn event_with_shared(shared: &[(&str, &str)]) -> Event {
        Event {
            id: "e1".into(),
            extended_properties: Some(ExtendedProperties {
                shared: shared
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                private: BTreeMap::new(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn extracts_only_marked_non_empty_properties() {
        let event = event_with_shared(&[("31cal/Soccer", "Soccer"), ("other", "x")]);
        assert_eq!(event_schedules(&event), vec!["Soccer"]);

        let event = event_with_shared(&[("31cal/Soccer", ""), ("31cal/Chess", "Chess")]);
        assert_eq!(event_schedules(&event), vec!["Chess"]);
    }

    #[test]
    fn percent_decodes_after_any_separator() {
        let event = event_with_shared(&[("31cal:Swim%20Team", "1"), ("31cal/%E6%B0%B4", "1")]);
        assert_eq!(event_schedules(&event), vec!["水", "Swim Team"]);
    }

    #[test]
    fn ignores_bare_marker_and_missing_properties() {
        let event = event_with_shared(&[("31cal", "x"), ("31cal/", "x")]);
        assert!(event_schedules(&event).is_empty());
        assert!(event_schedules(&Event::default()).is_empty());
    }

    #[test]
    fn add_then_remove_schedule() {
        let mut event = Event::default();
        add_schedule(&mut event, "Soccer");
        assert_eq!(event_schedules(&event), vec!["Soccer"]);
        assert_eq!(
            event
                .extended_properties
                .as_ref()
                .and_then(|p| p.shared.get("31cal/Soccer"))
                .map(String::as_str),
            Some("Soccer")
        );

        assert!(remove_schedule(&mut event, "Soccer"));
        assert!(!remove_schedule(&mut event, "Soccer"));
        assert!(event_schedules(&event).is_empty());
    }
}
