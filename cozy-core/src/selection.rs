//! Reconciles the id in a URL query parameter with the list of entities the
//! server returned, so a view always has exactly one current entity (or none
//! when the list is empty).

use std::sync::Arc;

use tracing::debug;

use crate::error::{CozyError, CozyResult};
use crate::location::{Location, Navigator};
use crate::model::Identified;
use crate::query::Loadable;

pub const PROJECT_PARAM: &str = "projectId";
pub const CALENDAR_PARAM: &str = "calendarId";

/// Which candidate becomes the selection when the URL names none (or a stale one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultPick {
    /// Smallest id. Stable regardless of server ordering.
    #[default]
    LowestId,
    /// First element in the order the server returned.
    FirstListed,
}

impl DefaultPick {
    pub fn choose<'a, E: Identified>(&self, candidates: &'a [E]) -> Option<&'a E> {
        match self {
            DefaultPick::LowestId => candidates.iter().min_by_key(|c| c.id()),
            DefaultPick::FirstListed => candidates.first(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Resolution<E> {
    /// Candidates are still loading; nothing was decided.
    Loading,
    /// Candidates could not be loaded.
    Failed(Arc<CozyError>),
    Selected(E),
    /// No candidates exist.
    Cleared,
}

impl<E> Resolution<E> {
    pub fn selected(&self) -> Option<&E> {
        match self {
            Resolution::Selected(entity) => Some(entity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionResolver {
    param: &'static str,
    entity: &'static str,
    pick: DefaultPick,
    current: Option<i64>,
    /// Last location this resolver wrote. A navigator that has not caught up
    /// yet must not trigger the same write again.
    last_write: Option<Location>,
}

impl SelectionResolver {
    pub fn new(param: &'static str, entity: &'static str) -> Self {
        SelectionResolver {
            param,
            entity,
            pick: DefaultPick::default(),
            current: None,
            last_write: None,
        }
    }

    pub fn projects() -> Self {
        SelectionResolver::new(PROJECT_PARAM, "Project")
    }

    pub fn calendars() -> Self {
        SelectionResolver::new(CALENDAR_PARAM, "Calendar")
    }

    pub fn with_pick(mut self, pick: DefaultPick) -> Self {
        self.pick = pick;
        self
    }

    pub fn param(&self) -> &'static str {
        self.param
    }

    /// Id chosen by the last resolution pass, if any.
    pub fn selected_id(&self) -> Option<i64> {
        self.current
    }

    fn replace_once(&mut self, nav: &mut impl Navigator, target: Location) {
        if nav.location() == target || self.last_write.as_ref() == Some(&target) {
            return;
        }
        debug!(param = self.param, location = %target, "rewriting selection in URL");
        nav.replace(target.clone());
        self.last_write = Some(target);
    }

    /// Decide the current entity from the URL and `candidates`.
    ///
    /// A URL id naming a candidate wins without touching the URL. Otherwise
    /// the default candidate is selected and written back with a replace;
    /// with no candidates the selection is cleared and the parameter removed.
    pub fn resolve<E, N>(&mut self, nav: &mut N, candidates: &Loadable<Vec<E>>) -> Resolution<E>
    where
        E: Identified + Clone,
        N: Navigator,
    {
        let candidates = match candidates {
            Loadable::Pending => return Resolution::Loading,
            Loadable::Failed(err) => return Resolution::Failed(Arc::clone(err)),
            Loadable::Ready(candidates) => candidates,
        };

        let location = nav.location();
        let url_id = location.param(self.param);

        if let Some(found) = url_id.and_then(|raw| candidates.iter().find(|c| c.id().to_string() == raw)) {
            self.current = Some(found.id());
            self.last_write = None;
            return Resolution::Selected(found.clone());
        }

        match self.pick.choose(candidates) {
            Some(default) => {
                debug!(param = self.param, ?url_id, default = default.id(), "selecting default");
                self.current = Some(default.id());
                let target = location.clone().with_param(self.param, default.id().to_string());
                self.replace_once(nav, target);
                Resolution::Selected(default.clone())
            }
            None => {
                self.current = None;
                match url_id {
                    Some(_) => {
                        let target = location.clone().without_param(self.param);
                        self.replace_once(nav, target);
                    }
                    None => self.last_write = None,
                }
                Resolution::Cleared
            }
        }
    }

    /// Explicit user choice. Adds a history entry.
    pub fn select<E, N>(&mut self, nav: &mut N, candidates: &[E], id: i64) -> CozyResult<E>
    where
        E: Identified + Clone,
        N: Navigator,
    {
        let chosen = candidates
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| CozyError::NotFound(format!("{} {id}", self.entity)))?;

        let target = nav.location().with_param(self.param, id.to_string());
        if nav.location() != target {
            nav.push(target.clone());
        }
        self.current = Some(id);
        self.last_write = Some(target);
        Ok(chosen.clone())
    }
}
