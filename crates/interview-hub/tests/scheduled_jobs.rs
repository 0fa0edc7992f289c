use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use interview_hub::auth::password::hash_password_with;
use interview_hub::config::JobsConfig;
use interview_hub::hiring::activity::{ActivityLog, PendingActivity};
use interview_hub::hiring::candidates::Candidate;
use interview_hub::hiring::companies::Company;
use interview_hub::hiring::interviewers::Interviewer;
use interview_hub::hiring::interviews::Interview;
use interview_hub::hiring::resumes::Resume;
use interview_hub::hiring::selections::CompanySelection;
use interview_hub::hiring::users::User;
use interview_hub::hiring::{InterviewStatus, SelectionStatus};
use interview_hub::jobs::{
    archive_rejected_selections, send_interview_reminders, JobRunner, MemoryMailer,
    ReminderWindow, DEFAULT_RETENTION_DAYS,
};
use interview_hub::store::{RecordId, Store, Tables};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn add_user(tables: &mut Tables, username: &str, first_name: &str) -> RecordId {
    let id = tables.users.next_id();
    tables.insert(User {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: first_name.to_string(),
        last_name: String::new(),
        phone: None,
        gender: None,
        password_hash: hash_password_with("lantern-Quay-17", 1_000),
        date_joined: fixed_now() - Duration::days(400),
    });
    id
}

/// Interviewer at `company_name` plus a candidate resume for `candidate_username`.
fn add_pipeline(
    tables: &mut Tables,
    company_name: &str,
    candidate_username: &str,
    first_name: &str,
    status: SelectionStatus,
    created_at: DateTime<Utc>,
) -> RecordId {
    let recruiter = add_user(tables, &format!("hr-{candidate_username}"), "Hanna");
    let company = tables.companies.next_id();
    tables.insert(Company {
        id: company,
        name: company_name.to_string(),
        description: None,
        location: "Kyiv".to_string(),
        established_date: NaiveDate::from_ymd_opt(2012, 4, 1),
    });
    let interviewer = tables.interviewers.next_id();
    tables.insert(Interviewer {
        id: interviewer,
        user_id: recruiter,
        company_id: company,
        position: "Tech lead".to_string(),
    });

    let user = add_user(tables, candidate_username, first_name);
    let candidate = tables.candidates.next_id();
    tables.insert(Candidate {
        id: candidate,
        user_id: user,
        birth_date: None,
        city: Some("Lviv".to_string()),
        social_media: None,
    });
    let resume = tables.resumes.next_id();
    tables.insert(Resume {
        id: resume,
        candidate_id: candidate,
        desired_position: "Data engineer".to_string(),
        desired_salary: 3000,
        current_salary: None,
        skills: Vec::new(),
        job_experience_ids: Vec::new(),
        additional_info: None,
        created_at,
    });

    let selection = tables.selections.next_id();
    tables.insert(CompanySelection {
        id: selection,
        interviewer_id: interviewer,
        resume_id: resume,
        status,
        created_at,
        updated_at: created_at,
    });
    selection
}

fn add_interview(tables: &mut Tables, selection_id: RecordId, start_time: DateTime<Utc>) -> RecordId {
    let id = tables.interviews.next_id();
    tables.insert(Interview {
        id,
        selection_id,
        start_time,
        end_time: start_time + Duration::minutes(60),
        duration: 60,
        kind: "hr".to_string(),
        status: InterviewStatus::Scheduled,
        feedback: None,
        notes: None,
        hard_skills_rate: None,
        soft_skills_rate: None,
        result: None,
        recording_url: None,
    });
    id
}

#[test]
fn reminders_go_only_to_interviews_inside_the_window() {
    let now = fixed_now();
    let mut tables = Tables::default();
    let due = add_pipeline(&mut tables, "Globex", "olena", "Olena", SelectionStatus::OnReview, now);
    let early = add_pipeline(&mut tables, "Initech", "taras", "Taras", SelectionStatus::OnReview, now);
    let edge = add_pipeline(&mut tables, "Umbrella", "iryna", "Iryna", SelectionStatus::OnReview, now);
    add_interview(&mut tables, due, now + Duration::minutes(60) + Duration::seconds(30));
    add_interview(&mut tables, early, now + Duration::minutes(30));
    add_interview(&mut tables, edge, now + Duration::minutes(61));
    let store = Store::from_tables(tables);
    let mailer = MemoryMailer::new();

    let report = send_interview_reminders(
        &store,
        &mailer,
        "noreply@interview-hub.test",
        ReminderWindow::default(),
        now,
    )
    .expect("reminders");

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 0);
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "olena@example.com");
    assert_eq!(sent[0].subject, "Interview reminder");
    assert!(sent[0].body.starts_with("Hello, Olena!"));
    assert!(sent[0].body.contains("\"Globex\""));
}

#[test]
fn refused_recipients_do_not_stop_other_reminders() {
    let now = fixed_now();
    let mut tables = Tables::default();
    for (company, username) in [("Globex", "olena"), ("Initech", "taras")] {
        let selection = add_pipeline(&mut tables, company, username, "Friend", SelectionStatus::OnReview, now);
        add_interview(&mut tables, selection, now + Duration::minutes(60));
    }
    let store = Store::from_tables(tables);
    let mailer = MemoryMailer::refusing(&["olena@example.com"]);

    let report = send_interview_reminders(&store, &mailer, "hub@example.com", ReminderWindow::default(), now)
        .expect("reminders");

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(mailer.sent()[0].to, "taras@example.com");
}

#[test]
fn archive_removes_only_stale_rejections_with_their_interviews() {
    let now = fixed_now();
    let mut tables = Tables::default();
    let stale = add_pipeline(
        &mut tables,
        "Globex",
        "olena",
        "Olena",
        SelectionStatus::Rejected,
        now - Duration::days(DEFAULT_RETENTION_DAYS + 1),
    );
    let recent = add_pipeline(
        &mut tables,
        "Initech",
        "taras",
        "Taras",
        SelectionStatus::Rejected,
        now - Duration::days(DEFAULT_RETENTION_DAYS - 1),
    );
    let old_accepted = add_pipeline(
        &mut tables,
        "Umbrella",
        "iryna",
        "Iryna",
        SelectionStatus::Accepted,
        now - Duration::days(365),
    );
    let at_cutoff = add_pipeline(
        &mut tables,
        "Hooli",
        "bohdan",
        "Bohdan",
        SelectionStatus::Rejected,
        now - Duration::days(DEFAULT_RETENTION_DAYS),
    );
    let old_on_review = add_pipeline(
        &mut tables,
        "Vandelay",
        "sofiia",
        "Sofiia",
        SelectionStatus::OnReview,
        now - Duration::days(365),
    );
    let stale_interview = add_interview(&mut tables, stale, now - Duration::days(200));
    let store = Store::from_tables(tables);

    let removed = archive_rejected_selections(&store, now, DEFAULT_RETENTION_DAYS).expect("archive");
    assert_eq!(removed, 1);

    let tables = store.read().expect("read");
    assert!(!tables.exists::<CompanySelection>(stale));
    assert!(!tables.exists::<Interview>(stale_interview));
    assert!(tables.exists::<CompanySelection>(recent));
    assert!(tables.exists::<CompanySelection>(old_accepted));
    assert!(
        tables.exists::<CompanySelection>(at_cutoff),
        "a rejection created exactly at the cutoff is kept"
    );
    assert!(tables.exists::<CompanySelection>(old_on_review));
    assert_eq!(tables.resumes.len(), 5, "resumes outlive archived selections");
}

#[test]
fn archive_ignores_negative_or_unrepresentable_retention() {
    let now = fixed_now();
    let mut tables = Tables::default();
    let today = add_pipeline(
        &mut tables,
        "Globex",
        "olena",
        "Olena",
        SelectionStatus::Rejected,
        now,
    );
    let store = Store::from_tables(tables);

    for retention_days in [-1, i64::MAX] {
        let removed = archive_rejected_selections(&store, now, retention_days).expect("archive");
        assert_eq!(removed, 0);
    }
    assert!(store.read().expect("read").exists::<CompanySelection>(today));
}

#[tokio::test]
async fn job_runner_flushes_activity_and_sends_reminders() {
    let now = Utc::now();
    let mut tables = Tables::default();
    let selection = add_pipeline(&mut tables, "Globex", "olena", "Olena", SelectionStatus::OnReview, now);
    add_interview(&mut tables, selection, now + Duration::minutes(60) + Duration::seconds(20));
    let store = Arc::new(Store::from_tables(tables));
    let mailer = Arc::new(MemoryMailer::new());
    let activity = ActivityLog::default();
    activity.push(PendingActivity {
        user: "olena".to_string(),
        path: "/api/v1/resumes".to_string(),
        method: "GET".to_string(),
        timestamp: now,
    });

    let runner = JobRunner::new(
        Arc::clone(&store),
        mailer.clone(),
        activity.clone(),
        "hub@example.com",
        JobsConfig {
            reminder_window_seconds: 120,
            ..JobsConfig::default()
        },
    );

    let report = runner.remind_once().await.expect("remind");
    assert_eq!(report.sent, 1);
    assert_eq!(mailer.sent().len(), 1);

    assert_eq!(runner.flush_activity_once().expect("flush"), 1);
    assert_eq!(activity.pending(), 0);
    assert_eq!(store.read().expect("read").activity.len(), 1);
    assert_eq!(runner.archive_once().expect("archive"), 0);
}

#[test]
fn snapshots_preserve_the_pipeline_and_id_sequences() {
    let now = fixed_now();
    let mut tables = Tables::default();
    let selection = add_pipeline(&mut tables, "Globex", "olena", "Olena", SelectionStatus::Accepted, now);
    add_interview(&mut tables, selection, now + Duration::days(2));
    let store = Store::from_tables(tables);

    let path = std::env::temp_dir().join(format!(
        "interview-hub-jobs-{}.json",
        std::process::id()
    ));
    store.save_snapshot(&path).expect("save");
    let restored = Store::load_snapshot(&path).expect("load");
    std::fs::remove_file(&path).ok();

    let tables = restored.read().expect("read");
    let kept = tables
        .get::<CompanySelection>(selection)
        .expect("selection restored");
    assert_eq!(kept.status, SelectionStatus::Accepted);
    assert_eq!(tables.interviews.len(), 1);
    assert_eq!(tables.selections.next_id(), selection + 1);
}
