use chrono::{Duration, Utc};

use super::common::*;
use crate::hiring::resumes::{
    attach_job_experience, attach_skill, created_between, detach_job_experience, detach_skill,
    salary_and_experience, salary_expectation_above, top_salaries, Resume, ResumeInput,
    SalaryExperienceCriteria, DEFAULT_PROFICIENCY,
};
use crate::http::{create_record, update_record, ApiError, WriteMode};
use crate::store::{RecordId, Tables};

fn ids(resumes: Vec<&Resume>) -> Vec<RecordId> {
    resumes.into_iter().map(|resume| resume.id).collect()
}

fn bad_request(err: ApiError) -> String {
    match err {
        ApiError::BadRequest(message) => message,
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[test]
fn resumes_need_at_least_one_existing_skill() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let input = |skill_ids: Option<Vec<RecordId>>| ResumeInput {
        candidate_id: Some(fixture.candidate),
        desired_position: Some("Platform engineer".to_string()),
        desired_salary: Some(7000),
        skill_ids,
        ..ResumeInput::default()
    };

    for skill_ids in [None, Some(Vec::new()), Some(vec![42])] {
        let err = create_record::<Resume>(&mut tables, input(skill_ids), Utc::now())
            .expect_err("invalid skills");
        assert!(matches!(err, ApiError::Validation(ref fields) if fields.contains("skill_ids")));
    }

    let created = create_record::<Resume>(
        &mut tables,
        input(Some(vec![fixture.skill, fixture.skill])),
        Utc::now(),
    )
    .expect("resume");
    assert_eq!(created.skills.len(), 1);
    assert_eq!(created.skills[0].proficiency_level, DEFAULT_PROFICIENCY);
}

#[test]
fn salaries_must_be_positive() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let err = update_record::<Resume>(
        &mut tables,
        fixture.resume,
        ResumeInput {
            desired_salary: Some(0),
            current_salary: Some(Some(-1)),
            ..ResumeInput::default()
        },
        WriteMode::Partial,
        Utc::now(),
    )
    .expect_err("non-positive salaries");
    let ApiError::Validation(fields) = err else {
        panic!("expected validation error");
    };
    assert!(fields.contains("desired_salary"));
    assert!(fields.contains("current_salary"));
}

#[test]
fn partial_updates_keep_existing_skill_levels() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let go = skill(&mut tables, "Go");
    let updated = update_record::<Resume>(
        &mut tables,
        fixture.resume,
        ResumeInput {
            skill_ids: Some(vec![fixture.skill, go]),
            ..ResumeInput::default()
        },
        WriteMode::Partial,
        Utc::now(),
    )
    .expect("patched");
    let levels: Vec<_> = updated
        .skills
        .iter()
        .map(|entry| (entry.skill_id, entry.proficiency_level.as_str()))
        .collect();
    assert_eq!(levels, vec![(fixture.skill, "advanced"), (go, DEFAULT_PROFICIENCY)]);
}

#[test]
fn date_range_is_inclusive_and_defaults_to_last_week() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let now = Utc::now();
    let old = resume(&mut tables, fixture.candidate, 3000, None, now - Duration::days(30));

    let recent = ids(created_between(&tables, None, now));
    assert_eq!(recent, vec![fixture.resume]);

    let old_day = (now - Duration::days(30)).date_naive();
    let ranged = ids(created_between(&tables, Some((old_day, old_day)), now));
    assert_eq!(ranged, vec![old]);
}

#[test]
fn salary_and_experience_combines_clauses_with_or() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let now = Utc::now();
    let cheap_old = resume(&mut tables, fixture.candidate, 2000, None, now - Duration::days(40));
    let pricey_new = resume(&mut tables, fixture.candidate, 9000, None, now);

    let criteria = SalaryExperienceCriteria {
        max_desired_salary: Some(5000),
        posted_within_days: Some(10),
        min_job_experiences: None,
    };
    assert_eq!(ids(salary_and_experience(&tables, criteria, now).expect("criteria")), vec![fixture.resume]);

    let with_experience = SalaryExperienceCriteria {
        min_job_experiences: Some(1),
        ..criteria
    };
    assert_eq!(
        ids(salary_and_experience(&tables, with_experience, now).expect("criteria")),
        vec![fixture.resume]
    );

    let experience_only = SalaryExperienceCriteria {
        min_job_experiences: Some(0),
        ..SalaryExperienceCriteria::default()
    };
    assert_eq!(
        ids(salary_and_experience(&tables, experience_only, now).expect("criteria")),
        vec![fixture.resume, cheap_old, pricey_new]
    );
}

#[test]
fn posting_windows_outside_the_calendar_are_rejected() {
    let mut tables = Tables::default();
    pipeline(&mut tables);
    let now = Utc::now();

    for days in [-1, 200_000_000, i64::MAX] {
        let criteria = SalaryExperienceCriteria {
            posted_within_days: Some(days),
            ..SalaryExperienceCriteria::default()
        };
        let err = salary_and_experience(&tables, criteria, now).expect_err("out of range");
        assert_eq!(bad_request(err), "Invalid number of days since posting.");
    }
}

#[test]
fn expectation_gap_handles_extreme_salaries() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let now = Utc::now();
    let huge = resume(&mut tables, fixture.candidate, i64::MAX, Some(i64::MAX / 2), now);

    assert_eq!(ids(salary_expectation_above(&tables, i64::MAX)), Vec::<RecordId>::new());
    assert_eq!(ids(salary_expectation_above(&tables, 20)), vec![fixture.resume, huge]);
    assert_eq!(
        ids(salary_expectation_above(&tables, i64::MIN)),
        vec![fixture.resume, huge]
    );
}

#[test]
fn null_clears_current_salary_and_absent_keeps_it() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);

    let kept = update_record::<Resume>(
        &mut tables,
        fixture.resume,
        ResumeInput {
            desired_salary: Some(5200),
            ..ResumeInput::default()
        },
        WriteMode::Partial,
        Utc::now(),
    )
    .expect("patched");
    assert_eq!(kept.current_salary, Some(4000));

    let cleared = update_record::<Resume>(
        &mut tables,
        fixture.resume,
        ResumeInput {
            current_salary: Some(None),
            ..ResumeInput::default()
        },
        WriteMode::Partial,
        Utc::now(),
    )
    .expect("cleared");
    assert_eq!(cleared.current_salary, None);
    assert_eq!(cleared.desired_salary, 5200);
}

#[test]
fn top_salaries_and_expectation_gap() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let now = Utc::now();
    let modest = resume(&mut tables, fixture.candidate, 4100, Some(4000), now);
    let ambitious = resume(&mut tables, fixture.candidate, 9000, None, now);

    assert_eq!(ids(top_salaries(&tables, 2)), vec![ambitious, fixture.resume]);
    // 5000 vs 4000 is a 25% raise; 4100 vs 4000 is 2.5%; no current salary never matches.
    assert_eq!(ids(salary_expectation_above(&tables, 20)), vec![fixture.resume]);
    assert_eq!(ids(salary_expectation_above(&tables, 25)), Vec::<RecordId>::new());
    assert!(!ids(salary_expectation_above(&tables, 0)).contains(&ambitious));
    assert!(ids(salary_expectation_above(&tables, 0)).contains(&modest));
}

#[test]
fn skills_attach_once_and_detach_with_clear_errors() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);
    let go = skill(&mut tables, "Go");

    let resume = attach_skill(&mut tables, fixture.resume, go, Some("junior".to_string()), Utc::now())
        .expect("attached");
    assert_eq!(resume.skills.len(), 2);
    let resume = attach_skill(&mut tables, fixture.resume, go, Some("middle".to_string()), Utc::now())
        .expect("re-attached");
    assert_eq!(resume.skills.len(), 2);
    assert_eq!(resume.skills[1].proficiency_level, "middle");

    let missing = attach_skill(&mut tables, fixture.resume, 77, None, Utc::now()).expect_err("no skill");
    assert_eq!(bad_request(missing), "Skill not found.");

    detach_skill(&mut tables, fixture.resume, go).expect("detached");
    let again = detach_skill(&mut tables, fixture.resume, go).expect_err("not attached");
    assert_eq!(bad_request(again), "Skill is not attached to this resume.");
}

#[test]
fn job_experience_links_are_idempotent() {
    let mut tables = Tables::default();
    let fixture = pipeline(&mut tables);

    let resume = attach_job_experience(&mut tables, fixture.resume, fixture.experience)
        .expect("already linked");
    assert_eq!(resume.job_experience_ids, vec![fixture.experience]);

    let resume = detach_job_experience(&mut tables, fixture.resume, fixture.experience)
        .expect("detached");
    assert!(resume.job_experience_ids.is_empty());

    let err = detach_job_experience(&mut tables, fixture.resume, fixture.experience)
        .expect_err("not linked");
    assert_eq!(bad_request(err), "Job experience is not attached to this resume.");

    let err = attach_job_experience(&mut tables, fixture.resume, 99).expect_err("unknown");
    assert_eq!(bad_request(err), "Job experience not found.");
}
