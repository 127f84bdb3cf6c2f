use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PORTFOLIO_NAME: &str = "Main Portfolio";

/// Backends send explicit `null` for unset columns; treat it like an absent
/// field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

//
// ──────────────────────────────────────────────────────────
// Identifiers
// ──────────────────────────────────────────────────────────
//

/// Local identifier of a portfolio. Equal to the backend identifier for
/// portfolios that came from (or were adopted by) the backend, a clock value
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(i64);

impl PortfolioId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for PortfolioId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<BackendId> for PortfolioId {
    fn from(value: BackendId) -> Self {
        Self(value.value())
    }
}

impl fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier issued by the backend. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct BackendId(i64);

impl BackendId {
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for BackendId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("backend identifier must be positive, got {value}"))
    }
}

impl From<BackendId> for i64 {
    fn from(value: BackendId) -> Self {
        value.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an entry inside a portfolio: backend-issued for
/// experiences/educations, clock-issued for skills/languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ──────────────────────────────────────────────────────────
// Profile (local-only)
// ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    pub job_title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub about: String,
    pub profile_image: String,
    pub social_links: SocialLinks,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            full_name: "John Doe".to_string(),
            job_title: "Full Stack Developer".to_string(),
            email: "john.doe@example.com".to_string(),
            phone: "+33 6 12 34 56 78".to_string(),
            location: "Paris, France".to_string(),
            about: "Passionate developer with 5 years of experience in web and mobile development."
                .to_string(),
            profile_image: "https://via.placeholder.com/150".to_string(),
            social_links: SocialLinks {
                github: "https://github.com/username".to_string(),
                linkedin: "https://linkedin.com/in/username".to_string(),
                twitter: "https://twitter.com/username".to_string(),
            },
        }
    }
}

/// Partial profile update: `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
    pub profile_image: Option<String>,
    pub social_links: Option<SocialLinks>,
}

impl Profile {
    pub fn apply(&mut self, patch: ProfilePatch) {
        let ProfilePatch {
            full_name,
            job_title,
            email,
            phone,
            location,
            about,
            profile_image,
            social_links,
        } = patch;

        if let Some(v) = full_name {
            self.full_name = v;
        }
        if let Some(v) = job_title {
            self.job_title = v;
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = phone {
            self.phone = v;
        }
        if let Some(v) = location {
            self.location = v;
        }
        if let Some(v) = about {
            self.about = v;
        }
        if let Some(v) = profile_image {
            self.profile_image = v;
        }
        if let Some(v) = social_links {
            self.social_links = v;
        }
    }
}

//
// ──────────────────────────────────────────────────────────
// Experience / Education (remote-backed)
// ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(rename = "idExp", alias = "id")]
    pub id: EntryId,
    pub position: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub employer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ongoing: bool,
    #[serde(
        rename = "responsibilities",
        default,
        deserialize_with = "null_as_default"
    )]
    pub description: String,
}

/// Payload for creating or replacing an experience.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDraft {
    pub position: String,
    pub employer: String,
    pub city: String,
    pub country: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ongoing: bool,
    #[serde(rename = "responsibilities")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(rename = "idEdu", alias = "id")]
    pub id: EntryId,
    #[serde(rename = "titleOfQualification")]
    pub title: String,
    #[serde(rename = "training", default, deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ongoing: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationDraft {
    #[serde(rename = "titleOfQualification")]
    pub title: String,
    #[serde(rename = "training")]
    pub institution: String,
    pub city: String,
    pub country: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ongoing: bool,
    pub description: String,
}

/// Shared rules for dated entries. An ongoing entry has no end date.
fn check_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    ongoing: bool,
) -> Result<(), String> {
    if let (Some(start), Some(end), false) = (start, end, ongoing) {
        if end < start {
            return Err(format!("end date {end} is before start date {start}"));
        }
    }
    Ok(())
}

impl ExperienceDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.position.trim().is_empty() {
            return Err("position is required".to_string());
        }
        check_dates(self.start_date, self.end_date, self.ongoing)
    }

    pub fn normalized(mut self) -> Self {
        if self.ongoing {
            self.end_date = None;
        }
        self
    }
}

impl EducationDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title of qualification is required".to_string());
        }
        check_dates(self.start_date, self.end_date, self.ongoing)
    }

    pub fn normalized(mut self) -> Self {
        if self.ongoing {
            self.end_date = None;
        }
        self
    }
}

impl Experience {
    pub fn from_draft(id: EntryId, draft: ExperienceDraft) -> Self {
        let draft = draft.normalized();
        Self {
            id,
            position: draft.position,
            employer: draft.employer,
            city: draft.city,
            country: draft.country,
            start_date: draft.start_date,
            end_date: draft.end_date,
            ongoing: draft.ongoing,
            description: draft.description,
        }
    }

    /// End date as displayed: ongoing entries have none.
    pub fn effective_end_date(&self) -> Option<NaiveDate> {
        if self.ongoing {
            None
        } else {
            self.end_date
        }
    }
}

impl Education {
    pub fn from_draft(id: EntryId, draft: EducationDraft) -> Self {
        let draft = draft.normalized();
        Self {
            id,
            title: draft.title,
            institution: draft.institution,
            city: draft.city,
            country: draft.country,
            start_date: draft.start_date,
            end_date: draft.end_date,
            ongoing: draft.ongoing,
            description: draft.description,
        }
    }

    pub fn effective_end_date(&self) -> Option<NaiveDate> {
        if self.ongoing {
            None
        } else {
            self.end_date
        }
    }
}

//
// ──────────────────────────────────────────────────────────
// Skill / Language (local-only)
// ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: EntryId,
    pub title: String,
    #[serde(default)]
    pub technologies: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillDraft {
    pub title: String,
    pub technologies: String,
    pub description: String,
}

impl SkillDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("skill title is required".to_string());
        }
        Ok(())
    }
}

impl Skill {
    pub fn from_draft(id: EntryId, draft: SkillDraft) -> Self {
        Self {
            id,
            title: draft.title,
            technologies: draft.technologies,
            description: draft.description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    #[serde(alias = "Débutant")]
    Beginner,
    #[serde(alias = "Intermédiaire")]
    Intermediate,
    #[serde(alias = "Avancé")]
    Advanced,
    #[serde(alias = "Courant")]
    Fluent,
    #[serde(alias = "Bilingue")]
    Bilingual,
    #[serde(alias = "Natif")]
    Native,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 6] = [
        ProficiencyLevel::Beginner,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Advanced,
        ProficiencyLevel::Fluent,
        ProficiencyLevel::Bilingual,
        ProficiencyLevel::Native,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "Beginner",
            ProficiencyLevel::Intermediate => "Intermediate",
            ProficiencyLevel::Advanced => "Advanced",
            ProficiencyLevel::Fluent => "Fluent",
            ProficiencyLevel::Bilingual => "Bilingual",
            ProficiencyLevel::Native => "Native",
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown proficiency level '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: EntryId,
    pub title: String,
    pub level: ProficiencyLevel,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDraft {
    pub title: String,
    pub level: ProficiencyLevel,
    pub description: String,
}

impl LanguageDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("language title is required".to_string());
        }
        Ok(())
    }
}

impl Language {
    pub fn from_draft(id: EntryId, draft: LanguageDraft) -> Self {
        Self {
            id,
            title: draft.title,
            level: draft.level,
            description: draft.description,
        }
    }
}

//
// ──────────────────────────────────────────────────────────
// Portfolio
// ──────────────────────────────────────────────────────────
//

/// Whether a portfolio has a backend counterpart. Decided when the portfolio
/// is created or loaded, never inferred from the identifier's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioLink {
    Local,
    Synced { backend_id: BackendId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portfolio {
    pub id: PortfolioId,
    pub link: PortfolioLink,
    pub name: String,
    pub experiences: Vec<Experience>,
    pub educations: Vec<Education>,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
}

impl Portfolio {
    pub fn local(id: PortfolioId, name: impl Into<String>) -> Self {
        Self {
            id,
            link: PortfolioLink::Local,
            name: name.into(),
            experiences: Vec::new(),
            educations: Vec::new(),
            skills: Vec::new(),
            languages: Vec::new(),
        }
    }

    pub fn synced(backend_id: BackendId, name: impl Into<String>) -> Self {
        Self {
            link: PortfolioLink::Synced { backend_id },
            ..Self::local(PortfolioId::from(backend_id), name)
        }
    }

    pub fn backend_id(&self) -> Option<BackendId> {
        match self.link {
            PortfolioLink::Local => None,
            PortfolioLink::Synced { backend_id } => Some(backend_id),
        }
    }

    pub fn is_synced(&self) -> bool {
        self.backend_id().is_some()
    }

    /// Total number of entries across the four collections.
    pub fn entry_count(&self) -> usize {
        self.experiences.len() + self.educations.len() + self.skills.len() + self.languages.len()
    }
}

/// Partial portfolio update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioPatch {
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_id_rejects_non_positive_values() {
        assert!(BackendId::new(0).is_none());
        assert!(BackendId::new(-3).is_none());
        assert_eq!(BackendId::new(501).map(|b| b.value()), Some(501));
        assert!(serde_json::from_value::<BackendId>(json!(0)).is_err());
    }

    #[test]
    fn experience_accepts_backend_dto_with_nulls() {
        let exp: Experience = serde_json::from_value(json!({
            "id": 12,
            "position": "Engineer",
            "employer": null,
            "city": "Lyon",
            "country": null,
            "startDate": "2020-01-01",
            "endDate": null,
            "responsibilities": "Built things",
            "ongoing": null,
            "portfolioId": 501
        }))
        .unwrap();

        assert_eq!(exp.id, EntryId::from(12));
        assert_eq!(exp.employer, "");
        assert!(!exp.ongoing);
        assert_eq!(exp.description, "Built things");
    }

    #[test]
    fn ongoing_experience_has_no_effective_end_date() {
        let exp = Experience::from_draft(
            EntryId::from(1),
            ExperienceDraft {
                position: "Dev".into(),
                end_date: NaiveDate::from_ymd_opt(2022, 12, 31),
                ongoing: true,
                ..Default::default()
            },
        );

        assert_eq!(exp.end_date, None);
        assert_eq!(exp.effective_end_date(), None);
    }

    #[test]
    fn draft_validation_requires_title_and_ordered_dates() {
        let draft = EducationDraft {
            title: "  ".into(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());

        let draft = ExperienceDraft {
            position: "Dev".into(),
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2021, 1, 1),
            ..Default::default()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn profile_patch_only_touches_given_fields() {
        let mut profile = Profile::default();
        profile.apply(ProfilePatch {
            full_name: Some("Ada Lovelace".into()),
            ..Default::default()
        });

        assert_eq!(profile.full_name, "Ada Lovelace");
        assert_eq!(profile.job_title, Profile::default().job_title);
    }

    #[test]
    fn proficiency_level_parses_case_insensitively() {
        assert_eq!("native".parse::<ProficiencyLevel>(), Ok(ProficiencyLevel::Native));
        assert!("expert".parse::<ProficiencyLevel>().is_err());
    }

    #[test]
    fn proficiency_level_reads_french_labels_from_old_caches() {
        let level: ProficiencyLevel = serde_json::from_value(json!("Courant")).unwrap();
        assert_eq!(level, ProficiencyLevel::Fluent);
        assert_eq!(serde_json::to_value(level).unwrap(), json!("Fluent"));
    }

    #[test]
    fn synced_portfolio_uses_backend_id_as_local_id() {
        let backend_id = BackendId::new(501).unwrap();
        let portfolio = Portfolio::synced(backend_id, "Work");

        assert_eq!(portfolio.id, PortfolioId::from(501));
        assert_eq!(portfolio.backend_id(), Some(backend_id));
        assert_eq!(portfolio.entry_count(), 0);
    }
}
