//! Everything a frontend needs, wired together once: config, session,
//! service clients, the shared query cache and the invalidation router.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::calendar_view::TimeRange;
use crate::client::{http_client, AuthClient, CalendarClient, EventClient, ServiceClient, TaskClient};
use crate::config::CozyConfig;
use crate::error::{CozyError, CozyResult};
use crate::invalidate::{InvalidationRouter, Mutation, MutationKind};
use crate::model::{
    Calendar, CalendarPatch, Event, EventPatch, LoginRequest, NewCalendar, NewEvent, NewProject,
    NewTask, Project, ProjectPatch, RegisterRequest, Task, TaskPatch, TaskStatus, User,
};
use crate::notify::{Notice, Notifier};
use crate::query::{CachePolicy, QueryCache, QueryKey};
use crate::session::Session;

struct Clients {
    auth: AuthClient,
    tasks: TaskClient,
    calendars: CalendarClient,
    events: EventClient,
}

impl Clients {
    fn new(http: &reqwest::Client, config: &CozyConfig, token: Option<&str>) -> Self {
        let service = |base_url: &str| {
            ServiceClient::new(http.clone(), base_url, token.map(str::to_string))
        };
        Clients {
            auth: AuthClient::new(service(&config.services.auth)),
            tasks: TaskClient::new(service(&config.services.tasks)),
            calendars: CalendarClient::new(service(&config.services.calendars)),
            events: EventClient::new(service(&config.services.events)),
        }
    }
}

pub struct AppContext {
    config: CozyConfig,
    http: reqwest::Client,
    clients: Clients,
    session: Option<Session>,
    cache: QueryCache,
    router: InvalidationRouter,
    notifier: Arc<dyn Notifier>,
}

impl AppContext {
    pub fn new(config: CozyConfig, session: Option<Session>, notifier: Arc<dyn Notifier>) -> CozyResult<Self> {
        let http = http_client(config.cache.request_timeout)?;
        let clients = Clients::new(&http, &config, session.as_ref().map(|s| s.token.as_str()));
        let cache = QueryCache::new(CachePolicy::from(&config.cache));
        let router = InvalidationRouter::new(cache.clone(), Arc::clone(&notifier));

        Ok(AppContext {
            config,
            http,
            clients,
            session,
            cache,
            router,
            notifier,
        })
    }

    pub fn config(&self) -> &CozyConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn router(&self) -> &InvalidationRouter {
        &self.router
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn require_session(&self) -> CozyResult<&Session> {
        self.session.as_ref().ok_or(CozyError::NotAuthenticated)
    }

    fn set_session(&mut self, session: Option<Session>) {
        self.clients = Clients::new(
            &self.http,
            &self.config,
            session.as_ref().map(|s| s.token.as_str()),
        );
        self.session = session;
        self.cache.clear();
    }

    // AUTH:

    /// Log in and switch every client over to the new token. The caller
    /// decides whether to persist the returned session.
    pub async fn login(&mut self, req: &LoginRequest) -> CozyResult<Session> {
        match self.clients.auth.login(req).await {
            Ok(auth) => {
                let session = Session::new(auth, Utc::now());
                self.set_session(Some(session.clone()));
                self.cache.set(QueryKey::Me, session.user.clone());
                self.notifier.notify(Notice::success("Login successful!"));
                Ok(session)
            }
            Err(err) => {
                self.notifier.notify(Notice::error(format!("Login failed: {err}")));
                Err(err)
            }
        }
    }

    /// Register a new account. Does not log in.
    pub async fn register(&self, req: &RegisterRequest) -> CozyResult<String> {
        match self.clients.auth.register(req).await {
            Ok(message) => {
                self.notifier.notify(Notice::success(message.clone()));
                Ok(message)
            }
            Err(err) => {
                self.notifier.notify(Notice::error(format!("Registration failed: {err}")));
                Err(err)
            }
        }
    }

    pub fn logout(&mut self) {
        if let Some(session) = &self.session {
            info!(user_id = session.user.id, "logging out");
        }
        self.set_session(None);
        self.notifier.notify(Notice::success("Logged out successfully."));
    }

    // QUERIES:

    pub async fn me(&self) -> CozyResult<User> {
        self.require_session()?;
        self.cache.fetch(QueryKey::Me, || self.clients.auth.me()).await
    }

    pub async fn projects(&self) -> CozyResult<Vec<Project>> {
        self.require_session()?;
        self.cache
            .fetch(QueryKey::Projects, || self.clients.tasks.list_projects())
            .await
    }

    pub async fn tasks(&self, project_id: i64) -> CozyResult<Vec<Task>> {
        self.require_session()?;
        self.cache
            .fetch(QueryKey::Tasks(project_id), || self.clients.tasks.list_tasks(project_id))
            .await
    }

    pub async fn calendars(&self) -> CozyResult<Vec<Calendar>> {
        self.require_session()?;
        self.cache
            .fetch(QueryKey::Calendars, || self.clients.calendars.list_calendars())
            .await
    }

    /// Events of the selected calendars within `range`, ordered by start.
    pub async fn events_in_range(&self, calendar_ids: &[i64], range: &TimeRange) -> CozyResult<Vec<Event>> {
        self.require_session()?;
        let mut ids = calendar_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let key = QueryKey::event_range(ids.iter().copied(), range);
        self.cache
            .fetch(key, || self.clients.events.list_events_for(&ids, range))
            .await
    }

    pub async fn task(&self, task_id: i64) -> CozyResult<Task> {
        self.require_session()?;
        self.clients.tasks.get_task(task_id).await
    }

    pub async fn event(&self, event_id: i64) -> CozyResult<Event> {
        self.require_session()?;
        self.clients.events.get_event(event_id).await
    }

    // PROJECT MUTATIONS:

    pub async fn create_project(&self, project: &NewProject) -> CozyResult<Project> {
        let result = self.clients.tasks.create_project(project).await;
        self.router.settle(MutationKind::CreateProject, result, |p| {
            Mutation::ProjectCreated(p.clone())
        })
    }

    /// Edits go out as full records: the current project is read first and
    /// the patch merged onto it.
    pub async fn update_project(&self, project_id: i64, patch: &ProjectPatch) -> CozyResult<Project> {
        let result = async {
            let current = self.clients.tasks.get_project(project_id).await?;
            let update = patch.apply_to(&current);
            self.clients.tasks.update_project(project_id, &update).await
        }
        .await;
        self.router.settle(MutationKind::UpdateProject, result, |p| {
            Mutation::ProjectUpdated(p.clone())
        })
    }

    pub async fn delete_project(&self, project_id: i64) -> CozyResult<()> {
        let result = self.clients.tasks.delete_project(project_id).await;
        self.router.settle(MutationKind::DeleteProject, result, |_| {
            Mutation::ProjectDeleted { project_id }
        })
    }

    // TASK MUTATIONS:

    pub async fn create_task(&self, project_id: i64, task: &NewTask) -> CozyResult<Task> {
        let result = self.clients.tasks.create_task(project_id, task).await;
        self.router.settle(MutationKind::CreateTask, result, |t| {
            Mutation::TaskCreated(t.clone())
        })
    }

    pub async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> CozyResult<Task> {
        let result = async {
            let current = self.clients.tasks.get_task(task_id).await?;
            let update = patch.apply_to(&current);
            self.clients
                .tasks
                .update_task(current.project_id, task_id, &update)
                .await
        }
        .await;
        self.router.settle(MutationKind::UpdateTask, result, |t| {
            Mutation::TaskUpdated(t.clone())
        })
    }

    pub async fn update_task_status(&self, project_id: i64, task_id: i64, status: TaskStatus) -> CozyResult<()> {
        let result = self.clients.tasks.update_task_status(task_id, status).await;
        self.router.settle(MutationKind::UpdateTaskStatus, result, |_| {
            Mutation::TaskStatusChanged { task_id, project_id }
        })
    }

    pub async fn delete_task(&self, project_id: i64, task_id: i64) -> CozyResult<()> {
        let result = self.clients.tasks.delete_task(task_id).await;
        self.router.settle(MutationKind::DeleteTask, result, |_| {
            Mutation::TaskDeleted { task_id, project_id }
        })
    }

    // CALENDAR MUTATIONS:

    pub async fn create_calendar(&self, calendar: &NewCalendar) -> CozyResult<Calendar> {
        let result = self.clients.calendars.create_calendar(calendar).await;
        self.router.settle(MutationKind::CreateCalendar, result, |c| {
            Mutation::CalendarCreated(c.clone())
        })
    }

    pub async fn update_calendar(&self, calendar_id: i64, patch: &CalendarPatch) -> CozyResult<Calendar> {
        let result = async {
            let current = self.clients.calendars.get_calendar(calendar_id).await?;
            let update = patch.apply_to(&current);
            self.clients.calendars.update_calendar(calendar_id, &update).await
        }
        .await;
        self.router.settle(MutationKind::UpdateCalendar, result, |c| {
            Mutation::CalendarUpdated(c.clone())
        })
    }

    pub async fn delete_calendar(&self, calendar_id: i64) -> CozyResult<()> {
        let result = self.clients.calendars.delete_calendar(calendar_id).await;
        self.router.settle(MutationKind::DeleteCalendar, result, |_| {
            Mutation::CalendarDeleted { calendar_id }
        })
    }

    // EVENT MUTATIONS:

    pub async fn create_event(&self, event: &NewEvent) -> CozyResult<Event> {
        let result = self.clients.events.create_event(event).await;
        self.router.settle(MutationKind::CreateEvent, result, |e| {
            Mutation::EventCreated(e.clone())
        })
    }

    pub async fn update_event(&self, event_id: i64, patch: &EventPatch) -> CozyResult<Event> {
        let result = async {
            let current = self.clients.events.get_event(event_id).await?;
            let update = patch.apply_to(&current);
            self.clients.events.update_event(event_id, &update).await
        }
        .await;
        self.router.settle(MutationKind::UpdateEvent, result, |e| {
            Mutation::EventUpdated(e.clone())
        })
    }

    pub async fn delete_event(&self, calendar_id: i64, event_id: i64) -> CozyResult<()> {
        let result = self.clients.events.delete_event(event_id).await;
        self.router.settle(MutationKind::DeleteEvent, result, |_| {
            Mutation::EventDeleted { event_id, calendar_id }
        })
    }
}
