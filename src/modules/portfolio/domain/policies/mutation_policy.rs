use std::fmt;

/// Every kind of record the synchronizer manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Profile,
    Portfolio,
    Experience,
    Education,
    Skill,
    Language,
}

/// How a mutation of a given kind reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Apply locally right away, push to the backend in the background.
    Optimistic,
    /// Backend first; local state changes only from the backend's answer.
    StrictRemote,
    /// Never leaves the device.
    LocalOnly,
}

impl EntityKind {
    pub const fn policy(self) -> MutationPolicy {
        match self {
            EntityKind::Portfolio => MutationPolicy::Optimistic,
            EntityKind::Experience | EntityKind::Education => MutationPolicy::StrictRemote,
            EntityKind::Profile | EntityKind::Skill | EntityKind::Language => {
                MutationPolicy::LocalOnly
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Profile => "profile",
            EntityKind::Portfolio => "portfolio",
            EntityKind::Experience => "experience",
            EntityKind::Education => "education",
            EntityKind::Skill => "skill",
            EntityKind::Language => "language",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
