use std::sync::Arc;

use chrono::NaiveDate;

use crate::auth::application::domain::entities::{Session, SessionUser, UserId};
use crate::auth::application::services::session_context::SessionContext;
use crate::modules::portfolio::application::ports::outgoing::RemotePortfolio;
use crate::modules::portfolio::domain::entities::{
    BackendId, EducationDraft, ExperienceDraft, LanguageDraft, ProficiencyLevel, SkillDraft,
};
use crate::shared::storage::{KeyValueStore, MemoryStore};

pub const USER_ID: i64 = 7;

pub fn sample_session(token: &str) -> Session {
    Session {
        access_token: token.to_string(),
        user: SessionUser {
            user_id: UserId::from(USER_ID),
            email: "ada@example.com".to_string(),
            expires_in: Some(3600),
        },
    }
}

pub fn signed_in_session_on(store: Arc<dyn KeyValueStore>, token: &str) -> SessionContext {
    let session = SessionContext::new(store);
    session.establish(sample_session(token)).unwrap();
    session
}

pub fn signed_in_session(token: &str) -> SessionContext {
    signed_in_session_on(Arc::new(MemoryStore::new()), token)
}

pub fn signed_out_session() -> SessionContext {
    SessionContext::new(Arc::new(MemoryStore::new()))
}

pub fn remote_portfolio(id: i64, name: &str) -> RemotePortfolio {
    RemotePortfolio::new(BackendId::new(id).unwrap(), Some(name.to_string()))
}

pub fn experience_draft(position: &str) -> ExperienceDraft {
    ExperienceDraft {
        position: position.to_string(),
        employer: "Acme".to_string(),
        city: "Paris".to_string(),
        country: "France".to_string(),
        start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
        end_date: None,
        ongoing: true,
        description: "Building things".to_string(),
    }
}

pub fn education_draft(title: &str) -> EducationDraft {
    EducationDraft {
        title: title.to_string(),
        institution: "Sorbonne".to_string(),
        city: "Paris".to_string(),
        country: "France".to_string(),
        start_date: NaiveDate::from_ymd_opt(2015, 9, 1),
        end_date: NaiveDate::from_ymd_opt(2018, 6, 30),
        ongoing: false,
        description: String::new(),
    }
}

pub fn skill_draft(title: &str) -> SkillDraft {
    SkillDraft {
        title: title.to_string(),
        technologies: "tokio, serde".to_string(),
        description: String::new(),
    }
}

pub fn language_draft(title: &str, level: ProficiencyLevel) -> LanguageDraft {
    LanguageDraft {
        title: title.to_string(),
        level,
        description: String::new(),
    }
}
