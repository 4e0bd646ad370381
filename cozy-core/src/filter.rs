//! Multi-select filters persisted in one URL query parameter as a comma list
//! (`calendars=1,2,3`).

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use tracing::debug;

use crate::location::{Location, Navigator};
use crate::model::Identified;
use crate::query::Loadable;
use crate::selection::DefaultPick;

pub const CALENDARS_PARAM: &str = "calendars";

/// Sorted, comma-joined. `None` for an empty set: the parameter should be removed.
pub fn encode_ids(ids: &BTreeSet<i64>) -> Option<String> {
    encode_tokens(ids)
}

/// Tokens that are not positive integers are dropped.
pub fn decode_ids(raw: &str) -> BTreeSet<i64> {
    raw.split(',')
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .collect()
}

pub fn encode_tokens<T: Display>(items: impl IntoIterator<Item = T>) -> Option<String> {
    let tokens: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    (!tokens.is_empty()).then(|| tokens.join(","))
}

/// Unparsable tokens are dropped.
pub fn decode_tokens<T: FromStr + Ord>(raw: &str) -> BTreeSet<T> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse().ok())
        .collect()
}

/// Write `encoded` into `param`, or remove `param` when there is nothing to encode.
pub fn write_param(location: Location, param: &str, encoded: Option<String>) -> Location {
    match encoded {
        Some(value) => location.with_param(param, value),
        None => location.without_param(param),
    }
}

/// A set of selected ids backed by a URL parameter.
///
/// On the first load with no parameter, one default id is selected. After
/// that the set is whatever the user made it, including empty.
#[derive(Debug, Clone)]
pub struct MultiSelectFilter {
    param: &'static str,
    pick: DefaultPick,
    default_applied: bool,
}

impl MultiSelectFilter {
    pub fn new(param: &'static str) -> Self {
        MultiSelectFilter {
            param,
            pick: DefaultPick::default(),
            default_applied: false,
        }
    }

    pub fn calendars() -> Self {
        MultiSelectFilter::new(CALENDARS_PARAM)
    }

    pub fn with_pick(mut self, pick: DefaultPick) -> Self {
        self.pick = pick;
        self
    }

    /// Mark the default as already applied, e.g. when restoring a saved
    /// location where an empty selection was deliberate.
    pub fn with_default_applied(mut self, applied: bool) -> Self {
        self.default_applied = applied;
        self
    }

    pub fn default_applied(&self) -> bool {
        self.default_applied
    }

    pub fn selected(&self, location: &Location) -> BTreeSet<i64> {
        location.param(self.param).map(decode_ids).unwrap_or_default()
    }

    /// Selected ids that still name a candidate, in candidate order.
    pub fn visible<E: Identified>(&self, location: &Location, candidates: &[E]) -> Vec<i64> {
        let selected = self.selected(location);
        candidates
            .iter()
            .map(Identified::id)
            .filter(|id| selected.contains(id))
            .collect()
    }

    /// Apply the one-time default once candidates have loaded. Returns the
    /// selection afterwards.
    pub fn apply_default<E, N>(&mut self, nav: &mut N, candidates: &Loadable<Vec<E>>) -> BTreeSet<i64>
    where
        E: Identified,
        N: Navigator,
    {
        let location = nav.location();

        let Some(candidates) = candidates.as_ready() else {
            return self.selected(&location);
        };
        if self.default_applied || candidates.is_empty() {
            return self.selected(&location);
        }
        self.default_applied = true;

        if location.param(self.param).is_some() {
            return self.selected(&location);
        }

        match self.pick.choose(candidates) {
            Some(default) => {
                debug!(param = self.param, default = default.id(), "applying default filter");
                let selected = BTreeSet::from([default.id()]);
                nav.replace(write_param(location, self.param, encode_ids(&selected)));
                selected
            }
            None => BTreeSet::new(),
        }
    }

    /// Replace the whole selection.
    pub fn set_selected<N: Navigator>(&mut self, nav: &mut N, ids: &BTreeSet<i64>) {
        let location = nav.location();
        let target = write_param(location.clone(), self.param, encode_ids(ids));
        if target != location {
            nav.replace(target);
        }
        self.default_applied = true;
    }

    /// Flip one id in or out of the selection. Returns the new selection.
    pub fn toggle<N: Navigator>(&mut self, nav: &mut N, id: i64) -> BTreeSet<i64> {
        let mut selected = self.selected(&nav.location());
        if !selected.remove(&id) {
            selected.insert(id);
        }
        self.set_selected(nav, &selected);
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::MemoryHistory;
    use crate::model::{Calendar, TaskStatus};

    fn calendar(id: i64) -> Calendar {
        Calendar {
            id,
            user_id: 1,
            name: format!("Calendar {id}"),
            description: None,
            color: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn decode_drops_junk_tokens() {
        assert_eq!(decode_ids("1,2,x,3"), BTreeSet::from([1, 2, 3]));
        assert_eq!(decode_ids("0,-4, 5 ,,1.5"), BTreeSet::from([5]));
        assert!(decode_ids("").is_empty());
    }

    #[test]
    fn encode_sorts_and_removes_empty() {
        assert_eq!(encode_ids(&BTreeSet::from([3, 1, 2])).as_deref(), Some("1,2,3"));
        assert_eq!(encode_ids(&BTreeSet::new()), None);
    }

    #[test]
    fn decode_inverts_encode() {
        for ids in [BTreeSet::from([7]), BTreeSet::from([1, 20, 300]), BTreeSet::new()] {
            let decoded = encode_ids(&ids).map(|raw| decode_ids(&raw)).unwrap_or_default();
            assert_eq!(decoded, ids);
        }
    }

    #[test]
    fn token_lists_parse_enums() {
        let statuses: BTreeSet<TaskStatus> = decode_tokens("todo, in progress,bogus");
        assert_eq!(statuses, BTreeSet::from([TaskStatus::Todo, TaskStatus::InProgress]));
        assert_eq!(encode_tokens(&statuses).as_deref(), Some("todo,in progress"));
    }

    #[test]
    fn first_load_applies_default_once() {
        let mut history = MemoryHistory::at("/calendar");
        let mut filter = MultiSelectFilter::calendars();
        let calendars = Loadable::Ready(vec![calendar(2), calendar(5)]);

        assert!(filter.apply_default(&mut history, &Loadable::<Vec<Calendar>>::Pending).is_empty());
        assert_eq!(history.replaces(), 0);

        let selected = filter.apply_default(&mut history, &calendars);
        assert_eq!(selected, BTreeSet::from([2]));
        assert_eq!(history.location().param(CALENDARS_PARAM), Some("2"));
        assert_eq!(history.replaces(), 1);

        // Unchecking everything sticks: the default is not re-applied.
        filter.toggle(&mut history, 2);
        assert_eq!(history.location().param(CALENDARS_PARAM), None);
        assert!(filter.apply_default(&mut history, &calendars).is_empty());
        assert_eq!(history.replaces(), 2);
    }

    #[test]
    fn existing_param_is_respected() {
        let mut history = MemoryHistory::at("/calendar?calendars=1,2,x,3");
        let mut filter = MultiSelectFilter::calendars();
        let calendars = Loadable::Ready(vec![calendar(1), calendar(2)]);

        let selected = filter.apply_default(&mut history, &calendars);
        assert_eq!(selected, BTreeSet::from([1, 2, 3]));
        assert_eq!(history.replaces(), 0);
        assert_eq!(
            filter.visible(&history.location(), calendars.as_ready().unwrap()),
            vec![1, 2]
        );
    }

    #[test]
    fn toggling_uses_replace() {
        let mut history = MemoryHistory::at("/calendar?calendars=1&view=week");
        let mut filter = MultiSelectFilter::calendars().with_default_applied(true);

        assert_eq!(filter.toggle(&mut history, 4), BTreeSet::from([1, 4]));
        assert_eq!(history.location().to_string(), "/calendar?calendars=1%2C4&view=week");
        assert_eq!(filter.toggle(&mut history, 1), BTreeSet::from([4]));
        assert_eq!(history.pushes(), 0);
        assert_eq!(history.replaces(), 2);
    }
}
