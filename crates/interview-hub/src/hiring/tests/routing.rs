use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::auth::TokenKind;
use crate::hiring::choices::Verdict;
use crate::hiring::test_tasks::TestTaskItem;
use crate::hiring::users::User;
use crate::http::hub_router;
use crate::store::Tables;

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let mut tables = Tables::default();
    pipeline(&mut tables);
    let (router, state, _) = router_for(tables, 1);

    let response = router
        .clone()
        .oneshot(request(Method::GET, "/api/v1/companies", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user = state
        .store
        .read()
        .expect("store")
        .get::<User>(1)
        .cloned()
        .expect("user");
    let refresh = state
        .tokens
        .issue(&user, TokenKind::Refresh, Utc::now())
        .expect("refresh token");
    let response = router
        .oneshot(request(Method::GET, "/api/v1/companies", Some(&refresh), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_refresh_and_profile() {
    let state = hub_state(Tables::default());
    let router = hub_router(state);

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "maria",
                "email": "maria@example.com",
                "password": PASSWORD,
                "password_confirm": PASSWORD,
                "first_name": "Maria",
                "gender": "female"
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["user"]["username"], "maria");
    assert!(body["user"].get("password_hash").is_none());

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "maria",
                "email": "MARIA@example.com",
                "password": "123",
                "password_confirm": "456"
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    for field in ["username", "email", "password", "password_confirm"] {
        assert!(body["fields"][field].is_array(), "missing error for {field}");
    }

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": "maria@example.com", "password": "wrong-password" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": "maria", "password": PASSWORD })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = read_json_body(response).await;
    let refresh = tokens["refresh"].as_str().expect("refresh").to_string();

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/token/refresh",
            None,
            Some(json!({ "refresh": refresh })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let access = read_json_body(response).await["access"]
        .as_str()
        .expect("access")
        .to_string();

    let response = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            "/api/v1/users/me",
            Some(&access),
            Some(json!({ "last_name": "Lopez", "phone": "+49 30 1234" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(request(Method::GET, "/api/v1/users/me", Some(&access), None))
        .await
        .expect("response");
    let me = read_json_body(response).await;
    assert_eq!(me["last_name"], "Lopez");
    assert_eq!(me["gender"], "female");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let router = hub_router(hub_state(Tables::default()));
    let response = router
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": "maria" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["fields"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn crud_roundtrip_with_pagination() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let (router, _, token) = router_for(tables, fixture.recruiter);

    for index in 0..11 {
        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/skill",
                Some(&token),
                Some(json!({ "name": format!("Skill {index}") })),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = router
        .clone()
        .oneshot(request(Method::GET, "/api/v1/skill?page=2", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_json_body(response).await;
    assert_eq!(page["count"], 12);
    assert_eq!(page["previous"], 1);
    assert_eq!(page["results"].as_array().map(Vec::len), Some(2));

    let response = router
        .clone()
        .oneshot(request(Method::GET, "/api/v1/skill?page=3", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/api/v1/skill/{}", fixture.skill),
            Some(&token),
            Some(json!({ "description": "Systems programming" })),
        ))
        .await
        .expect("response");
    let skill = read_json_body(response).await;
    assert_eq!(skill["name"], "Rust");
    assert_eq!(skill["description"], "Systems programming");

    let response = router
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("/api/v1/skill/{}", fixture.skill),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/skill/{}", fixture.skill),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn selection_status_action_and_invalid_filters() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let (router, _, token) = router_for(tables, fixture.recruiter);

    let response = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/api/v1/company-selections/{}/update-status", fixture.selection),
            Some(&token),
            Some(json!({ "status": "accepted" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(response).await,
        json!({ "id": fixture.selection, "status": "accepted" })
    );

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/company-selections?status=rejected",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(read_json_body(response).await["count"], 0);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/company-selections/practical-filter?status=accepted",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    let page = read_json_body(response).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["candidate_email"], "ann@example.com");
    assert_eq!(page["results"][0]["interviewer_email"], "recruiter@example.com");
}

#[tokio::test]
async fn resume_actions_and_searches() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let go = skill(&mut tables, "Go");
    let (router, _, token) = router_for(tables, fixture.recruiter);

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/resumes/{}/add_skill", fixture.resume),
            Some(&token),
            Some(json!({ "skill_id": go, "proficiency_level": "intermediate" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let resume = read_json_body(response).await;
    assert_eq!(resume["skills"][1]["name"], "Go");

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/resumes/{}/remove_skill", fixture.resume),
            Some(&token),
            Some(json!({})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/resumes/filter_by_date?start_date=2024-13-01&end_date=2024-12-31",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await["error"],
        "Invalid date format. Use YYYY-MM-DD."
    );

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/resumes/top_highest_salaries",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    let top = read_json_body(response).await;
    assert_eq!(top[0]["candidate_email"], "ann@example.com");

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/resumes/filter_by_salary_expectation?percentage=10",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(read_json_body(response).await["count"], 1);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/resumes/filter_by_salary_and_experience?desired_salary=lots",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resume_searches_reject_impossible_posting_windows() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let (router, _, token) = router_for(tables, fixture.recruiter);

    for days in ["999999999999", "-3"] {
        let response = router
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/v1/resumes/filter_by_salary_and_experience?days_since_posted={days}"),
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json_body(response).await["error"],
            "Invalid number of days since posting."
        );
    }

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/resumes/filter_by_salary_expectation?percentage=9223372036854775807",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["count"], 0);
}

#[tokio::test]
async fn list_filters_cover_salaries_dates_and_search() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let (router, _, token) = router_for(tables, fixture.recruiter);

    let count = |uri: &'static str| {
        let router = router.clone();
        let token = token.clone();
        async move {
            let response = router
                .oneshot(request(Method::GET, uri, Some(&token), None))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            read_json_body(response).await["count"].clone()
        }
    };

    assert_eq!(count("/api/v1/resumes?min_salary=4500&max_salary=6000").await, 1);
    assert_eq!(count("/api/v1/resumes?max_salary=4999").await, 0);
    assert_eq!(count("/api/v1/resumes?desired_salary=5000").await, 1);
    assert_eq!(count("/api/v1/resumes/filter_by_date").await, 1);

    assert_eq!(count("/api/v1/job_experience?start_date_after=2019-03-01").await, 1);
    assert_eq!(count("/api/v1/job_experience?start_date_before=2019-02-28").await, 0);
    assert_eq!(count("/api/v1/job_experience?end_date_before=2023-06-30").await, 1);
    assert_eq!(count("/api/v1/job_experience?end_date_after=2023-07-01").await, 0);

    let response = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/api/v1/skill/{}", fixture.skill),
            Some(&token),
            Some(json!({ "description": "Ownership and lifetimes" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(count("/api/v1/skill?search=LIFETIMES").await, 1);
    assert_eq!(count("/api/v1/skill?search=rust").await, 1);
    assert_eq!(count("/api/v1/skill?search=kotlin").await, 0);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/job_experience?start_date_after=March",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn null_clears_optional_fields_on_patch() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let (router, _, token) = router_for(tables, fixture.recruiter);

    let response = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/api/v1/resumes/{}", fixture.resume),
            Some(&token),
            Some(json!({ "desired_position": "Staff engineer" })),
        ))
        .await
        .expect("response");
    assert_eq!(read_json_body(response).await["current_salary"], 4000);

    let response = router
        .oneshot(request(
            Method::PATCH,
            &format!("/api/v1/resumes/{}", fixture.resume),
            Some(&token),
            Some(json!({ "current_salary": null })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let resume = read_json_body(response).await;
    assert_eq!(resume["current_salary"], Value::Null);
    assert_eq!(resume["desired_position"], "Staff engineer");
}

#[tokio::test]
async fn candidate_count_by_city() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let other = user(&mut tables, "oleg", "Oleg");
    candidate(&mut tables, other, "Berlin");
    let (router, _, token) = router_for(tables, fixture.recruiter);

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/candidates/count-by-city?city=Berlin",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(
        read_json_body(response).await,
        json!({ "city": "Berlin", "candidate_count": 2 })
    );

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/candidates/count-by-city",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn interview_tasks_and_comments() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let interview_id = interview(&mut tables, fixture.selection, Utc::now() + Duration::days(1));
    let task_id = task_item(&mut tables, "Linked lists");
    let test_task_id = test_task(&mut tables, fixture.selection);
    tables.insert(TestTaskItem {
        id: 1,
        test_task_id,
        task_item_id: task_id,
        candidate_answer: "Two pointers".to_string(),
        interviewer_comment: Some("Readable".to_string()),
    });
    let (router, _, token) = router_for(tables, fixture.recruiter);

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/interview-tasks",
            Some(&token),
            Some(json!({
                "interview_id": interview_id,
                "task_item_id": task_id,
                "candidate_answer": "Recursion"
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/interviews/{interview_id}/tasks"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    let tasks = read_json_body(response).await;
    assert_eq!(tasks[0]["task"]["title"], "Linked lists");
    assert_eq!(tasks[0]["candidate_answer"], "Recursion");

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/test-task-items/1/comment",
            Some(&token),
            Some(json!({ "comment": "Missing edge cases" })),
        ))
        .await
        .expect("response");
    let item = read_json_body(response).await;
    assert_eq!(item["interviewer_comment"], "Readable\nMissing edge cases");

    let response = router
        .oneshot(request(
            Method::POST,
            "/api/v1/test-task-items/1/comment",
            Some(&token),
            Some(json!({ "comment": "  " })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn csv_exports_filter_and_truncate() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let task_id = task_item(&mut tables, "Linked lists");
    let accepted = test_task(&mut tables, fixture.selection);
    let pending = test_task(&mut tables, fixture.selection);
    if let Some(task) = tables.test_tasks.rows_mut().find(|task| task.id == accepted) {
        task.result = Some(Verdict::Accepted);
    }
    tables.insert(TestTaskItem {
        id: 1,
        test_task_id: accepted,
        task_item_id: task_id,
        candidate_answer: "x".repeat(150),
        interviewer_comment: None,
    });
    tables.insert(TestTaskItem {
        id: 2,
        test_task_id: pending,
        task_item_id: task_id,
        candidate_answer: "pending answer".to_string(),
        interviewer_comment: None,
    });
    let (router, _, token) = router_for(tables, fixture.recruiter);

    let response = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/export/test-task-items.csv",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    let csv = read_text_body(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("id,Candidate Email,test_task,Task Title"));
    assert!(lines[1].contains("ann@example.com"));
    assert!(lines[1].contains(&format!("{}...", "x".repeat(100))));
    assert!(!csv.contains("pending answer"));

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/export/salaries.csv",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn activity_is_buffered_flushed_and_listed() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let (router, state, token) = router_for(tables, fixture.recruiter);

    router
        .clone()
        .oneshot(request(Method::GET, "/api/v1/companies", None, None))
        .await
        .expect("response");
    router
        .clone()
        .oneshot(request(Method::GET, "/api/v1/companies", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(state.activity.pending(), 2);

    let flushed = state.activity.flush_into(&state.store).expect("flush");
    assert_eq!(flushed, 2);
    assert_eq!(state.activity.pending(), 0);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/activity?user=recruiter",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    let page: Value = read_json_body(response).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["path"], "/api/v1/companies");
    assert_eq!(page["results"][0]["method"], "GET");
}
