//! REST client behavior against a mock service.

use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use serde_json::json;

use cozy_core::calendar_view::TimeRange;
use cozy_core::client::{AuthClient, CalendarClient, EventClient, ServiceClient, TaskClient};
use cozy_core::model::{EventUpdate, LoginRequest, NewCalendar, NewTask, TaskStatus};
use cozy_core::CozyError;

fn service(server: &MockServer, token: Option<&str>) -> ServiceClient {
    ServiceClient::new(reqwest::Client::new(), &server.base_url(), token.map(str::to_string))
}

#[tokio::test]
async fn login_returns_token_and_user() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/login")
                .json_body(json!({"email": "ada@example.com", "password": "hunter2"}));
            then.status(200).json_body(json!({
                "token": "jwt-token",
                "user": {"id": 1, "email": "ada@example.com", "username": "ada"}
            }));
        })
        .await;

    let auth = AuthClient::new(service(&server, None));
    let resp = auth
        .login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(resp.token, "jwt-token");
    assert_eq!(resp.user.display_name(), "ada");
}

#[tokio::test]
async fn invalid_login_never_reaches_the_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/login");
            then.status(200);
        })
        .await;

    let auth = AuthClient::new(service(&server, None));
    let err = auth
        .login(&LoginRequest {
            email: "not-an-email".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CozyError::Validation { field: "email", .. }));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn wrong_credentials_surface_server_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/login");
            then.status(401).json_body(json!({"message": "Invalid credentials"}));
        })
        .await;

    let auth = AuthClient::new(service(&server, None));
    let err = auth
        .login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid credentials (HTTP 401)");
}

#[tokio::test]
async fn requests_carry_bearer_token_and_null_lists_are_empty() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/projects")
                .header("authorization", "Bearer jwt-token");
            then.status(200)
                .header("content-type", "application/json")
                .body("null");
        })
        .await;

    let tasks = TaskClient::new(service(&server, Some("jwt-token")));
    let projects = tasks.list_projects().await.unwrap();

    mock.assert_async().await;
    assert!(projects.is_empty());
}

#[tokio::test]
async fn create_task_sends_typed_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/projects/1/tasks")
                .json_body(json!({"title": "Write docs", "status": "todo", "priority": "medium"}));
            then.status(201).json_body(json!({
                "id": 11,
                "project_id": 1,
                "title": "Write docs",
                "description": "",
                "status": "todo",
                "priority": "medium",
                "label": ""
            }));
        })
        .await;

    let tasks = TaskClient::new(service(&server, Some("jwt-token")));
    let task = tasks.create_task(1, &NewTask::new("Write docs")).await.unwrap();

    mock.assert_async().await;
    assert_eq!(task.id, 11);
    assert_eq!(task.label, None);
    assert_eq!(task.description, None);
}

#[tokio::test]
async fn status_update_uses_patch() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/tasks/11/status")
                .json_body(json!({"status": "in progress"}));
            then.status(200).json_body(json!({"message": "Task status updated"}));
        })
        .await;

    let tasks = TaskClient::new(service(&server, Some("jwt-token")));
    tasks.update_task_status(11, TaskStatus::InProgress).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn error_bodies_in_any_shape_become_messages() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/calendars");
            then.status(400).json_body(json!({"error": "calendar name is required"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/calendars/9");
            then.status(404).body("Calendar not found\n");
        })
        .await;

    let calendars = CalendarClient::new(service(&server, Some("jwt-token")));

    let err = calendars
        .create_calendar(&NewCalendar {
            name: "Work".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "calendar name is required (HTTP 400)");

    let err = calendars.delete_calendar(9).await.unwrap_err();
    assert_eq!(err.to_string(), "Calendar not found (HTTP 404)");
}

#[tokio::test]
async fn multi_calendar_range_is_fetched_per_calendar_and_merged() {
    let server = MockServer::start_async().await;
    let range = TimeRange {
        start: Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 3, 23, 0, 0, 0).unwrap(),
    };

    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/calendars/1/events")
                .query_param("start", "2025-03-16T00:00:00+00:00")
                .query_param("end", "2025-03-23T00:00:00+00:00");
            then.status(200).json_body(json!([{
                "id": 5, "calendar_id": 1, "user_id": 1, "title": "Retro",
                "start_time": "2025-03-21T15:00:00Z", "end_time": "2025-03-21T16:00:00Z"
            }]));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/calendars/2/events");
            then.status(200).json_body(json!([{
                "id": 9, "calendar_id": 2, "user_id": 1, "title": "Dentist",
                "start_time": "2025-03-18T08:00:00Z", "end_time": "2025-03-18T09:00:00Z",
                "location": ""
            }]));
        })
        .await;

    let events = EventClient::new(service(&server, Some("jwt-token")));
    let merged = events.list_events_for(&[1, 2], &range).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let titles: Vec<&str> = merged.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Dentist", "Retro"]);
    assert_eq!(merged[0].location, None);
}

#[tokio::test]
async fn event_update_accepts_an_empty_ok() {
    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT).path("/events/10").json_body(json!({
                "title": "Retro",
                "start_time": "2025-03-21T15:00:00Z",
                "end_time": "2025-03-21T16:30:00Z"
            }));
            then.status(200);
        })
        .await;
    let get = server
        .mock_async(|when, then| {
            when.method(GET).path("/events/10");
            then.status(200).json_body(json!({
                "id": 10, "calendar_id": 1, "user_id": 1, "title": "Retro",
                "start_time": "2025-03-21T15:00:00Z", "end_time": "2025-03-21T16:30:00Z"
            }));
        })
        .await;

    let events = EventClient::new(service(&server, Some("jwt-token")));
    let update = EventUpdate {
        title: "Retro".into(),
        description: None,
        start_time: Utc.with_ymd_and_hms(2025, 3, 21, 15, 0, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(2025, 3, 21, 16, 30, 0).unwrap(),
        location: None,
        color: None,
    };
    let event = events.update_event(10, &update).await.unwrap();

    put.assert_async().await;
    get.assert_async().await;
    assert_eq!(event.end_time, update.end_time);
}
