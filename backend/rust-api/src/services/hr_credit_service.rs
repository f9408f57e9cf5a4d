use chrono::Utc;
use std::sync::Arc;

use crate::error::HrCreditError;
use crate::metrics::HR_VIEWS_CONSUMED_TOTAL;
use crate::models::{
    candidate::CandidateProfile,
    hr::{HrAccount, PlanSummary, PlanType},
};
use crate::repositories::{CandidateStore, HrAccountStore};

/// Recruiter view entitlements: plan activation, view checks and decrements.
pub struct HrCreditService {
    accounts: Arc<dyn HrAccountStore>,
    candidates: Arc<dyn CandidateStore>,
}

impl HrCreditService {
    pub fn new(accounts: Arc<dyn HrAccountStore>, candidates: Arc<dyn CandidateStore>) -> Self {
        Self {
            accounts,
            candidates,
        }
    }

    async fn require_account(&self, hr_id: &str) -> Result<HrAccount, HrCreditError> {
        self.accounts
            .load(hr_id)
            .await?
            .ok_or_else(|| HrCreditError::HrNotFound(hr_id.to_string()))
    }

    /// Called once the payment collaborator has confirmed the purchase.
    pub async fn apply_plan(&self, hr_id: &str, plan: PlanType) -> Result<PlanSummary, HrCreditError> {
        let mut account = self.require_account(hr_id).await?;
        let now = Utc::now();
        account.apply_plan(plan, now);
        self.accounts.save(&account).await?;

        tracing::info!(
            "Plan {:?} applied to HR {}: remaining_views={}, expires_at={:?}",
            plan,
            hr_id,
            account.remaining_views,
            account.plan_expires_at
        );
        Ok(account.summary(now))
    }

    pub async fn plan_summary(&self, hr_id: &str) -> Result<PlanSummary, HrCreditError> {
        let account = self.require_account(hr_id).await?;
        Ok(account.summary(Utc::now()))
    }

    /// Whether the recruiter may open a profile right now. An expired
    /// unlimited plan is cleared on the way.
    pub async fn can_view(&self, hr_id: &str) -> Result<bool, HrCreditError> {
        let mut account = self.require_account(hr_id).await?;
        if !account.verified {
            return Ok(false);
        }

        let now = Utc::now();
        if account.has_active_unlimited_plan(now) {
            return Ok(true);
        }
        if account.has_expired_unlimited_plan(now) {
            tracing::info!("Unlimited plan of HR {} expired, resetting plan", hr_id);
            account.clear_expired_plan();
            self.accounts.save(&account).await?;
        }

        Ok(account.remaining_views > 0)
    }

    /// Takes one view unless an unlimited plan is active.
    pub async fn consume_view(&self, hr_id: &str) -> Result<PlanSummary, HrCreditError> {
        if !self.can_view(hr_id).await? {
            let account = self.require_account(hr_id).await?;
            return Err(if account.verified {
                HrCreditError::NoViewsRemaining
            } else {
                HrCreditError::NotVerified
            });
        }

        let now = Utc::now();
        let account = self.require_account(hr_id).await?;
        if account.has_active_unlimited_plan(now) {
            HR_VIEWS_CONSUMED_TOTAL
                .with_label_values(&["MONTHLY_UNLIMITED"])
                .inc();
            return Ok(account.summary(now));
        }

        // Conditional decrement: a concurrent view may have taken the last one.
        let updated = self
            .accounts
            .take_view(hr_id)
            .await?
            .ok_or(HrCreditError::NoViewsRemaining)?;
        HR_VIEWS_CONSUMED_TOTAL.with_label_values(&["COUNTED"]).inc();

        tracing::info!(
            "HR {} consumed a view, {} remaining",
            hr_id,
            updated.remaining_views
        );
        Ok(updated.summary(now))
    }

    /// Opens a candidate profile, charging one view.
    pub async fn view_candidate(
        &self,
        hr_id: &str,
        candidate_id: &str,
    ) -> Result<(CandidateProfile, PlanSummary), HrCreditError> {
        // Look the candidate up first so an unknown id never costs a view.
        let candidate = self
            .candidates
            .load(candidate_id)
            .await?
            .ok_or_else(|| HrCreditError::CandidateNotFound(candidate_id.to_string()))?;

        let summary = self.consume_view(hr_id).await?;
        Ok((CandidateProfile::from(candidate), summary))
    }
}
