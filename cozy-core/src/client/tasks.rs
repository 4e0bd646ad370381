use reqwest::Method;

use super::ServiceClient;
use crate::error::CozyResult;
use crate::model::{
    NewProject, NewTask, Project, ProjectUpdate, StatusUpdate, Task, TaskStatus, TaskUpdate,
};
use crate::validate::Validate;

/// Task service: projects and the tasks they own.
#[derive(Clone)]
pub struct TaskClient {
    inner: ServiceClient,
}

impl TaskClient {
    pub fn new(inner: ServiceClient) -> Self {
        TaskClient { inner }
    }

    // PROJECTS:

    /// GET /projects
    pub async fn list_projects(&self) -> CozyResult<Vec<Project>> {
        self.inner.get_list("/projects", &[]).await
    }

    /// GET /projects/:id
    pub async fn get_project(&self, project_id: i64) -> CozyResult<Project> {
        self.inner.get(&format!("/projects/{project_id}")).await
    }

    /// POST /projects
    pub async fn create_project(&self, project: &NewProject) -> CozyResult<Project> {
        project.validate()?;
        self.inner.send_json(Method::POST, "/projects", project).await
    }

    /// PUT /projects/:id. Not every deployment of the service answers with
    /// the project, so it is read back afterwards.
    pub async fn update_project(&self, project_id: i64, update: &ProjectUpdate) -> CozyResult<Project> {
        update.validate()?;
        let path = format!("/projects/{project_id}");
        self.inner.send_json_unit(Method::PUT, &path, update).await?;
        self.get_project(project_id).await
    }

    /// DELETE /projects/:id. The service deletes the project's tasks with it.
    pub async fn delete_project(&self, project_id: i64) -> CozyResult<()> {
        self.inner.delete(&format!("/projects/{project_id}")).await
    }

    // TASKS:

    /// GET /projects/:id/tasks
    pub async fn list_tasks(&self, project_id: i64) -> CozyResult<Vec<Task>> {
        self.inner
            .get_list(&format!("/projects/{project_id}/tasks"), &[])
            .await
    }

    /// GET /tasks/:id
    pub async fn get_task(&self, task_id: i64) -> CozyResult<Task> {
        self.inner.get(&format!("/tasks/{task_id}")).await
    }

    /// POST /projects/:id/tasks
    pub async fn create_task(&self, project_id: i64, task: &NewTask) -> CozyResult<Task> {
        task.validate()?;
        self.inner
            .send_json(Method::POST, &format!("/projects/{project_id}/tasks"), task)
            .await
    }

    /// PUT /projects/:project_id/tasks/:task_id
    pub async fn update_task(&self, project_id: i64, task_id: i64, update: &TaskUpdate) -> CozyResult<Task> {
        update.validate()?;
        self.inner
            .send_json(
                Method::PUT,
                &format!("/projects/{project_id}/tasks/{task_id}"),
                update,
            )
            .await
    }

    /// PATCH /tasks/:id/status
    pub async fn update_task_status(&self, task_id: i64, status: TaskStatus) -> CozyResult<()> {
        self.inner
            .send_json_unit(
                Method::PATCH,
                &format!("/tasks/{task_id}/status"),
                &StatusUpdate { status },
            )
            .await
    }

    /// DELETE /tasks/:id
    pub async fn delete_task(&self, task_id: i64) -> CozyResult<()> {
        self.inner.delete(&format!("/tasks/{task_id}")).await
    }
}
