//! Selection state machine and permalink encoding.

use std::collections::BTreeMap;

use crate::{
    error::Error,
    propagator::PropagatorState,
    store::RecordStore,
};

/// Permalink value meaning "no satellite selected".
pub const NO_SATELLITE: &str = "null";

const GROUP_KEY: &str = "group";
const SATELLITE_KEY: &str = "satellite";

/// Returns whether `group` can be written into a permalink verbatim.
///
/// Group IDs are limited to ASCII letters, digits, `-` and `_`.
pub fn is_valid_group(group: &str) -> bool {
    !group.is_empty()
        && group
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Which object, if any, is tracked.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Selection {
    #[default]
    Unselected,
    Selected { index: usize, norad_id: String },
}

/// Effect of a transition, for the sinks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    /// An object became selected; derived data must be recomputed.
    Selected(usize),
    /// The selection was dropped.
    Cleared,
    /// Nothing changed.
    Unchanged,
}

/// Selection within a catalog group.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SelectionState {
    group: String,
    selection: Selection,
}

impl SelectionState {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            selection: Selection::Unselected,
        }
    }

    /// Returns the catalog group identifier.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the index of the selected object.
    pub fn selected_index(&self) -> Option<usize> {
        match &self.selection {
            Selection::Unselected => None,
            Selection::Selected { index, .. } => Some(*index),
        }
    }

    /// Returns the satellite identifier shown in the permalink.
    pub fn raw_satellite_key(&self) -> &str {
        match &self.selection {
            Selection::Unselected => NO_SATELLITE,
            Selection::Selected { norad_id, .. } => norad_id,
        }
    }

    /// Selects the object at `index`.
    pub fn pick(&mut self, index: usize, norad_id: impl Into<String>) -> Transition {
        self.selection = Selection::Selected {
            index,
            norad_id: norad_id.into(),
        };
        Transition::Selected(index)
    }

    /// Switches to another catalog group, dropping the selection.
    pub fn switch_group(&mut self, group: impl Into<String>) -> Transition {
        self.group = group.into();
        self.clear()
    }

    /// Dismisses the selection.
    pub fn close(&mut self) -> Transition {
        self.clear()
    }

    fn clear(&mut self) -> Transition {
        match std::mem::take(&mut self.selection) {
            Selection::Unselected => Transition::Unchanged,
            Selection::Selected { .. } => Transition::Cleared,
        }
    }

    /// Restores the selection named by a permalink against a freshly loaded
    /// catalog.
    ///
    /// A satellite missing from the catalog leaves the state unselected; the
    /// miss is logged, never reported.
    pub fn restore<S: PropagatorState>(
        &mut self,
        params: &QueryParams,
        store: &RecordStore<S>,
    ) -> Transition {
        let Some(key) = params.get_first(SATELLITE_KEY).filter(|key| *key != NO_SATELLITE) else {
            return self.clear();
        };
        match store.find_by_norad_id(key) {
            Some(index) => self.pick(index, key),
            None => {
                log::info!("{}", Error::PermalinkMiss(key.to_owned()));
                self.clear()
            }
        }
    }

    /// Encodes the state as a query string.
    pub fn permalink(&self) -> String {
        match &self.selection {
            Selection::Unselected => format!("{GROUP_KEY}={}", self.group),
            Selection::Selected { norad_id, .. } => {
                format!("{GROUP_KEY}={}&{SATELLITE_KEY}={norad_id}", self.group)
            }
        }
    }
}

/// Value of a query parameter.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// Returns the first occurrence.
    pub fn first(&self) -> &str {
        match self {
            QueryValue::Single(value) => value,
            QueryValue::Multiple(values) => values.first().map_or("", String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                *self = QueryValue::Multiple(vec![std::mem::take(first), value]);
            }
            QueryValue::Multiple(values) => values.push(value),
        }
    }
}

/// Decoded query string.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct QueryParams(BTreeMap<String, QueryValue>);

impl QueryParams {
    /// Decodes `key=value` pairs separated by `&`.
    ///
    /// A leading `?` is ignored and a missing value decodes as empty. Repeated
    /// keys accumulate their values in order.
    pub fn decode(query: &str) -> Self {
        let mut params = BTreeMap::<String, QueryValue>::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let mut parts = pair.split('=');
            let key = parts.next().unwrap_or_default().to_owned();
            let value = parts.next().unwrap_or_default().to_owned();
            match params.get_mut(&key) {
                Some(existing) => existing.push(value),
                None => {
                    params.insert(key, QueryValue::Single(value));
                }
            }
        }
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    /// Returns the first value of `key`.
    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.get(key).map(QueryValue::first)
    }

    /// Returns the catalog group, if any.
    pub fn group(&self) -> Option<&str> {
        self.get_first(GROUP_KEY).filter(|group| !group.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::parse_catalog,
        propagator::Propagator,
        test_support::{CircularPropagator, CircularState, catalog_text, element_lines},
    };

    fn store(count: u32) -> RecordStore<CircularState> {
        store_from(&catalog_text(count))
    }

    fn store_from(text: &str) -> RecordStore<CircularState> {
        let metadata = parse_catalog(text);
        let states = metadata
            .iter()
            .map(|m| CircularPropagator::default().initialize(m.line1(), m.line2()).unwrap())
            .collect();
        let mut store = RecordStore::default();
        store.replace_catalog(metadata, states).unwrap();
        store
    }

    fn assert_consistent(state: &SelectionState) {
        assert_eq!(
            state.selected_index().is_none(),
            state.raw_satellite_key() == NO_SATELLITE
        );
    }

    #[test]
    fn transitions() {
        let mut state = SelectionState::new("SMD");
        assert_eq!(state.permalink(), "group=SMD");
        assert_consistent(&state);

        assert_eq!(state.pick(2, "10002"), Transition::Selected(2));
        assert_eq!(state.selected_index(), Some(2));
        assert_eq!(state.permalink(), "group=SMD&satellite=10002");
        assert_consistent(&state);

        assert_eq!(state.close(), Transition::Cleared);
        assert_eq!(state.close(), Transition::Unchanged);
        assert_eq!(state.permalink(), "group=SMD");

        state.pick(1, "10001");
        assert_eq!(state.switch_group("weather"), Transition::Cleared);
        assert_eq!(state.group(), "weather");
        assert_eq!(state.permalink(), "group=weather");
        assert_consistent(&state);
    }

    #[test]
    fn permalink_round_trip() {
        let store = store(5);
        let mut states = vec![SelectionState::new("SMD")];
        for index in 0..store.len() {
            let mut state = SelectionState::new("SMD");
            state.pick(index, store.metadata()[index].norad_id());
            states.push(state);
        }

        for state in states {
            assert_consistent(&state);
            let params = QueryParams::decode(&state.permalink());
            let mut restored = SelectionState::new(params.group().unwrap());
            restored.restore(&params, &store);
            assert_eq!(restored, state);
        }
    }

    #[test]
    fn restore_duplicate_norad_id_selects_last() {
        let mut text = catalog_text(2);
        let (line1, line2) = element_lines(10000, 45.0, 15.0);
        text.push_str(&format!("SAT-0 DEB\n{line1}\n{line2}\n"));
        let store = store_from(&text);
        assert_eq!(store.len(), 3);

        let mut state = SelectionState::new("SMD");
        state.pick(2, "10000");
        let params = QueryParams::decode(&state.permalink());
        let mut restored = SelectionState::new("SMD");
        assert_eq!(restored.restore(&params, &store), Transition::Selected(2));
        assert_eq!(restored, state);
    }

    #[test]
    fn restore_miss_stays_unselected() {
        let store = store(3);
        let mut state = SelectionState::new("SMD");
        let params = QueryParams::decode("?group=SMD&satellite=99999");
        assert_eq!(state.restore(&params, &store), Transition::Unchanged);
        assert_eq!(state.selected_index(), None);
        assert_eq!(state.raw_satellite_key(), NO_SATELLITE);
    }

    #[test]
    fn restore_null_sentinel() {
        let store = store(3);
        let mut state = SelectionState::new("SMD");
        state.pick(0, "10000");
        let params = QueryParams::decode("group=SMD&satellite=null");
        assert_eq!(state.restore(&params, &store), Transition::Cleared);
        assert_consistent(&state);
    }

    #[test]
    fn decode_accumulates_repeated_keys() {
        let params = QueryParams::decode("group=a&satellite=1&group=b&group=c&flag");
        assert_eq!(
            params.get("group"),
            Some(&QueryValue::Multiple(vec![
                "a".to_owned(),
                "b".to_owned(),
                "c".to_owned()
            ]))
        );
        assert_eq!(params.get("satellite"), Some(&QueryValue::Single("1".to_owned())));
        assert_eq!(params.get_first("group"), Some("a"));
        assert_eq!(params.get_first("flag"), Some(""));
        assert_eq!(params.get_first("missing"), None);
    }

    #[test]
    fn group_ids_survive_decode() {
        for group in ["SMD", "gps-ops", "last_30_days"] {
            assert!(is_valid_group(group));
            let params = QueryParams::decode(&SelectionState::new(group).permalink());
            assert_eq!(params.group(), Some(group));
        }
        for group in ["", "a&b", "a=b", "a b", "a?b", "../x"] {
            assert!(!is_valid_group(group), "{group}");
        }
    }

    #[test]
    fn decode_second_occurrence() {
        let params = QueryParams::decode("satellite=1&satellite=2");
        assert_eq!(
            params.get("satellite"),
            Some(&QueryValue::Multiple(vec!["1".to_owned(), "2".to_owned()]))
        );
        assert_eq!(QueryParams::decode(""), QueryParams::default());
    }
}
