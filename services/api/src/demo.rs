use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use interview_hub::auth::{register_user, RegisterInput};
use interview_hub::error::AppError;
use interview_hub::export::{render, ExportKind};
use interview_hub::hiring::candidates::{count_by_city, Candidate, CandidateInput};
use interview_hub::hiring::companies::{Company, CompanyInput};
use interview_hub::hiring::interviewers::{Interviewer, InterviewerInput};
use interview_hub::hiring::interviews::{Interview, InterviewInput};
use interview_hub::hiring::job_experience::{JobExperience, JobExperienceInput};
use interview_hub::hiring::resumes::{
    salary_and_experience, salary_expectation_above, top_salaries, Resume, ResumeInput,
    SalaryExperienceCriteria, DEFAULT_SALARY_MARKUP_PERCENT, TOP_SALARIES,
};
use interview_hub::hiring::selections::{
    practical_filter, update_status, CompanySelection, SelectionInput,
};
use interview_hub::hiring::skills::{Skill, SkillInput};
use interview_hub::hiring::{Choice, SelectionStatus};
use interview_hub::http::create_record;
use interview_hub::jobs::{archive_rejected_selections, due_reminders, ReminderWindow};
use interview_hub::store::{RecordId, Store, Tables};
use std::path::PathBuf;

const DEMO_PASSWORD: &str = "copper-Harbor-88";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the seeded data to this snapshot file so `serve` can load it
    #[arg(long)]
    pub(crate) save: Option<PathBuf>,
    /// Print the CSV exports after the summary
    #[arg(long)]
    pub(crate) show_exports: bool,
}

struct Applicant {
    username: &'static str,
    first_name: &'static str,
    city: &'static str,
    desired_salary: i64,
    current_salary: Option<i64>,
    previous_jobs: usize,
}

const APPLICANTS: [Applicant; 4] = [
    Applicant {
        username: "olena",
        first_name: "Olena",
        city: "Kyiv",
        desired_salary: 4200,
        current_salary: Some(3000),
        previous_jobs: 2,
    },
    Applicant {
        username: "marco",
        first_name: "Marco",
        city: "Lisbon",
        desired_salary: 3100,
        current_salary: Some(3000),
        previous_jobs: 0,
    },
    Applicant {
        username: "aiko",
        first_name: "Aiko",
        city: "Kyiv",
        desired_salary: 5600,
        current_salary: None,
        previous_jobs: 3,
    },
    Applicant {
        username: "jonas",
        first_name: "Jonas",
        city: "Berlin",
        desired_salary: 2500,
        current_salary: Some(2400),
        previous_jobs: 1,
    },
];

fn register(tables: &mut Tables, username: &str, first_name: &str) -> Result<RecordId, AppError> {
    let user = register_user(
        tables,
        RegisterInput {
            username: Some(username.to_string()),
            email: Some(format!("{username}@interview-hub.test")),
            password: Some(DEMO_PASSWORD.to_string()),
            password_confirm: Some(DEMO_PASSWORD.to_string()),
            first_name: Some(first_name.to_string()),
            ..RegisterInput::default()
        },
    )?;
    let id = user.id;
    tables.insert(user);
    Ok(id)
}

/// Seeds one company with an interviewer, four applicants and their selections.
fn seed(tables: &mut Tables) -> Result<Vec<RecordId>, AppError> {
    let now = Utc::now();
    let hr_user = register(tables, "hanna", "Hanna")?;
    let company = create_record::<Company>(
        tables,
        CompanyInput {
            name: Some("Globex Analytics".to_string()),
            location: Some("Kyiv".to_string()),
            established_date: NaiveDate::from_ymd_opt(2014, 2, 3),
            ..CompanyInput::default()
        },
        now,
    )?;
    let interviewer = create_record::<Interviewer>(
        tables,
        InterviewerInput {
            user_id: Some(hr_user),
            company_id: Some(company.id),
            position: Some("Head of data".to_string()),
        },
        now,
    )?;

    let mut skill_ids = Vec::new();
    for name in ["Rust", "SQL", "Kafka"] {
        let skill = create_record::<Skill>(
            tables,
            SkillInput {
                name: Some(name.to_string()),
                description: None,
            },
            now,
        )?;
        skill_ids.push(skill.id);
    }

    let mut selections = Vec::new();
    for applicant in &APPLICANTS {
        let user_id = register(tables, applicant.username, applicant.first_name)?;
        let candidate = create_record::<Candidate>(
            tables,
            CandidateInput {
                user_id: Some(user_id),
                city: Some(Some(applicant.city.to_string())),
                ..CandidateInput::default()
            },
            now,
        )?;

        let mut experience_ids = Vec::new();
        for index in 0..applicant.previous_jobs {
            let start = NaiveDate::from_ymd_opt(2016 + index as i32 * 2, 1, 10);
            let experience = create_record::<JobExperience>(
                tables,
                JobExperienceInput {
                    candidate_id: Some(candidate.id),
                    company: Some(format!("Previous employer {}", index + 1)),
                    position: Some("Engineer".to_string()),
                    start_date: start,
                    end_date: Some(start.map(|date| date + Duration::days(600))),
                    responsibilities: Some("Data pipelines".to_string()),
                },
                now,
            )?;
            experience_ids.push(experience.id);
        }

        let resume = create_record::<Resume>(
            tables,
            ResumeInput {
                candidate_id: Some(candidate.id),
                desired_position: Some("Data engineer".to_string()),
                desired_salary: Some(applicant.desired_salary),
                current_salary: Some(applicant.current_salary),
                skill_ids: Some(skill_ids.clone()),
                job_experience_ids: Some(experience_ids),
                additional_info: None,
            },
            now,
        )?;
        let selection = create_record::<CompanySelection>(
            tables,
            SelectionInput {
                interviewer_id: Some(interviewer.id),
                resume_id: Some(resume.id),
                status: None,
            },
            now,
        )?;
        selections.push(selection.id);
    }

    update_status(tables, selections[0], Some("accepted".to_string()), now)?;
    update_status(tables, selections[3], Some("rejected".to_string()), now)?;

    let start_time = now + Duration::minutes(60) + Duration::seconds(15);
    create_record::<Interview>(
        tables,
        InterviewInput {
            selection_id: Some(selections[0]),
            start_time: Some(start_time),
            end_time: Some(start_time + Duration::minutes(90)),
            kind: Some("technical".to_string()),
            ..InterviewInput::default()
        },
        now,
    )?;

    Ok(selections)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { save, show_exports } = args;
    let now = Utc::now();
    let store = Store::new();

    println!("InterviewHub demo");
    let selections = {
        let mut tables = store.write()?;
        seed(&mut tables)?
    };

    {
        let tables = store.read()?;
        println!(
            "Seeded {} users, {} resumes, {} company selections and {} interview(s)",
            tables.users.len(),
            tables.resumes.len(),
            tables.selections.len(),
            tables.interviews.len()
        );

        println!("\nCandidates per city");
        for city in ["Kyiv", "Lisbon", "Berlin"] {
            println!("- {city}: {}", count_by_city(&tables, city));
        }

        println!("\nTop {TOP_SALARIES} desired salaries");
        for resume in top_salaries(&tables, TOP_SALARIES) {
            println!(
                "- {} | {} | {}",
                resume.candidate_email(&tables),
                resume.desired_position,
                resume.desired_salary
            );
        }

        println!("\nAsking more than {DEFAULT_SALARY_MARKUP_PERCENT}% above current salary");
        for resume in salary_expectation_above(&tables, DEFAULT_SALARY_MARKUP_PERCENT) {
            println!(
                "- {} wants {} (currently {})",
                resume.candidate_email(&tables),
                resume.desired_salary,
                resume.current_salary.unwrap_or_default()
            );
        }

        let criteria = SalaryExperienceCriteria {
            max_desired_salary: Some(3500),
            posted_within_days: Some(7),
            min_job_experiences: Some(3),
        };
        println!("\nAffordable recent resumes or at least 3 previous jobs");
        for resume in salary_and_experience(&tables, criteria, now)? {
            println!(
                "- {} ({} previous jobs)",
                resume.candidate_email(&tables),
                resume.job_experience_ids.len()
            );
        }

        let practical = practical_filter(
            &tables,
            &[SelectionStatus::OnReview, SelectionStatus::Accepted],
            now,
        );
        println!("\nSelections ready for a practical task: {}", practical.len());
        for selection in practical {
            println!(
                "- selection #{} [{}] {}",
                selection.id,
                selection.status.label(),
                selection.candidate_email(&tables)
            );
        }

        println!("\nReminders due in the next hour");
        for reminder in due_reminders(&tables, ReminderWindow::default(), now) {
            println!("- to {}: {}", reminder.email, reminder.message().body);
        }

        println!("\nCSV exports");
        for kind in ExportKind::ALL {
            let bytes = render(&tables, kind)?;
            let rows = bytes.iter().filter(|byte| **byte == b'\n').count().saturating_sub(1);
            println!("- {}: {rows} row(s)", kind.file_name());
            if show_exports && !bytes.is_empty() {
                println!("{}", String::from_utf8_lossy(&bytes));
            }
        }
    }

    let preview = Store::from_tables(store.snapshot()?);
    let removed = archive_rejected_selections(&preview, now + Duration::days(200), 180)?;
    println!(
        "\nAn archive run 200 days from now would remove {removed} of {} selections",
        selections.len()
    );

    if let Some(path) = save {
        store.save_snapshot(&path)?;
        println!("Snapshot written to {}", path.display());
    }

    Ok(())
}
