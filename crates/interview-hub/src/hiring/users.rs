use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidates::Candidate;
use super::choices::Gender;
use super::interviewers::Interviewer;
use crate::store::{Record, RecordId, Table, Tables};

/// Account that can sign in. Candidates and interviewers are profiles on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// Public projection of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            gender: self.gender,
            date_joined: self.date_joined,
        }
    }
}

impl Record for User {
    const KIND: &'static str = "user";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.users
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<Candidate, _>(|candidate| candidate.user_id == id);
        tables.delete_where::<Interviewer, _>(|interviewer| interviewer.user_id == id);
    }
}

pub fn find_by_login<'a>(tables: &'a Tables, login: &str) -> Option<&'a User> {
    let login = login.trim();
    tables
        .users
        .iter()
        .find(|user| user.username == login || user.email.eq_ignore_ascii_case(login))
}

pub fn username_taken(tables: &Tables, username: &str) -> bool {
    tables.users.iter().any(|user| user.username == username)
}

pub fn email_taken(tables: &Tables, email: &str, except: Option<RecordId>) -> bool {
    tables
        .users
        .iter()
        .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email))
}

pub fn phone_taken(tables: &Tables, phone: &str, except: Option<RecordId>) -> bool {
    tables
        .users
        .iter()
        .any(|user| Some(user.id) != except && user.phone.as_deref() == Some(phone))
}

/// Email of the user behind a profile, or an empty string for dangling ids.
pub fn email_of(tables: &Tables, user_id: RecordId) -> String {
    tables
        .get::<User>(user_id)
        .map(|user| user.email.clone())
        .unwrap_or_default()
}

/// Minimal shape check: one `@` with a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
