use serde::{Deserialize, Serialize};

/// Candidate record owned by the profile subsystem. The assessment engine reads
/// the identity and only ever writes `badge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub badge: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            email: email.into(),
            badge: None,
        }
    }
}

/// Candidate details shown to a recruiter after a view is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub badge: Option<String>,
}

impl From<Candidate> for CandidateProfile {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            full_name: candidate.full_name,
            email: candidate.email,
            badge: candidate.badge,
        }
    }
}
