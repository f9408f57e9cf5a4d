use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days a monthly unlimited plan stays active after activation.
pub const UNLIMITED_PLAN_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    SingleCandidate,
    TenCandidates,
    MonthlyUnlimited,
}

impl PlanType {
    /// Profile views granted by the plan; `None` means unlimited until expiry.
    pub fn granted_views(&self) -> Option<u32> {
        match self {
            PlanType::SingleCandidate => Some(1),
            PlanType::TenCandidates => Some(10),
            PlanType::MonthlyUnlimited => None,
        }
    }
}

/// Recruiter account with its view entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrAccount {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub company_name: String,
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub plan: Option<PlanType>,
    #[serde(default)]
    pub remaining_views: u32,
    #[serde(default)]
    pub plan_expires_at: Option<DateTime<Utc>>,
}

impl HrAccount {
    pub fn new(id: impl Into<String>, company_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company_name: company_name.into(),
            email: email.into(),
            verified: false,
            plan: None,
            remaining_views: 0,
            plan_expires_at: None,
        }
    }

    pub fn has_active_unlimited_plan(&self, now: DateTime<Utc>) -> bool {
        self.plan == Some(PlanType::MonthlyUnlimited)
            && self.plan_expires_at.is_some_and(|expires| expires > now)
    }

    pub fn has_expired_unlimited_plan(&self, now: DateTime<Utc>) -> bool {
        self.plan == Some(PlanType::MonthlyUnlimited) && !self.has_active_unlimited_plan(now)
    }

    /// Counted plans add to the views already held; the unlimited plan
    /// restarts its expiry window.
    pub fn apply_plan(&mut self, plan: PlanType, now: DateTime<Utc>) {
        match plan.granted_views() {
            Some(views) => {
                self.remaining_views = self.remaining_views.saturating_add(views);
                if !self.has_active_unlimited_plan(now) {
                    self.plan = Some(plan);
                    self.plan_expires_at = None;
                }
            }
            None => {
                self.plan = Some(PlanType::MonthlyUnlimited);
                self.plan_expires_at = Some(now + Duration::days(UNLIMITED_PLAN_DAYS));
            }
        }
    }

    /// Drops an expired unlimited plan. Counted views bought meanwhile stay
    /// usable through `remaining_views`.
    pub fn clear_expired_plan(&mut self) {
        self.plan = None;
        self.plan_expires_at = None;
    }

    pub fn summary(&self, now: DateTime<Utc>) -> PlanSummary {
        let display_name = match self.plan {
            None if self.remaining_views > 0 => {
                format!("Prepaid Views ({} remaining)", self.remaining_views)
            }
            None => "No Active Plan".to_string(),
            Some(PlanType::MonthlyUnlimited) => match self.plan_expires_at {
                Some(expires) if expires > now => {
                    format!("Monthly Unlimited (Expires: {})", expires.date_naive())
                }
                _ => "No Active Plan (Expired)".to_string(),
            },
            Some(PlanType::TenCandidates) => format!(
                "10 Candidates Plan ({} views remaining)",
                self.remaining_views
            ),
            Some(PlanType::SingleCandidate) => format!(
                "Single Candidate Plan ({} view remaining)",
                self.remaining_views
            ),
        };

        PlanSummary {
            hr_id: self.id.clone(),
            plan: self.plan,
            display_name,
            remaining_views: self.remaining_views,
            expires_at: self.plan_expires_at,
            verified: self.verified,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub hr_id: String,
    pub plan: Option<PlanType>,
    pub display_name: String,
    pub remaining_views: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyPlanRequest {
    pub plan: PlanType,
}
