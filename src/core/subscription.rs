//! Subscription lifecycle business logic
//!
//! A profile's subscription moves through `trial → active → expired` purely as a
//! function of the clock. There is no timer: the status is recomputed every time
//! the lifecycle is queried, and the stored record is rewritten only when the
//! recomputed status differs.
//!
//! A new profile gets a 30-day trial whose hard expiry is 60 days out, leaving a
//! 30-day window in which the subscription reports `active` without any payment.
//! Renewal is a local mutation; billing is handled elsewhere.

use crate::{
    core::clock::Clock,
    errors::{Error, Result},
    storage::{KeyValueStore, SUBSCRIPTION_KEY},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{debug, error, info, instrument, warn};

/// Subscription state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Free trial in progress
    Trial,
    /// Paid, or trial lapsed but hard expiry not reached
    Active,
    /// Past the subscription end date
    Expired,
}

impl SubscriptionStatus {
    /// Lowercase name as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terms applied when starting a trial or renewing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubscriptionPlan {
    /// Length of the free trial
    pub trial_days: u32,
    /// Days from profile creation until hard expiry
    pub initial_term_days: u32,
    /// Days added by each renewal, counted from the renewal instant
    pub renewal_days: u32,
    /// Price per renewal
    pub price: f64,
    /// ISO currency code
    pub currency: String,
}

impl Default for SubscriptionPlan {
    fn default() -> Self {
        Self {
            trial_days: 30,
            initial_term_days: 60,
            renewal_days: 30,
            price: 500.0,
            currency: "NGN".to_string(),
        }
    }
}

impl SubscriptionPlan {
    /// Longest period, in days, any plan field may span (about 100 years).
    pub const MAX_DAYS: u32 = 36_500;

    /// Checks that the plan describes usable periods.
    ///
    /// Every day count must be at most [`SubscriptionPlan::MAX_DAYS`], the hard
    /// expiry cannot come before the trial ends, renewals must add at least one
    /// day, and the price must be a non-negative number.
    ///
    /// # Errors
    /// [`Error::Config`] naming the first rule that is broken.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("trial_days", self.trial_days),
            ("initial_term_days", self.initial_term_days),
            ("renewal_days", self.renewal_days),
        ];
        if let Some((name, days)) = fields.iter().find(|(_, days)| *days > Self::MAX_DAYS) {
            return Err(plan_error(format!(
                "{name} = {days} exceeds the maximum of {} days",
                Self::MAX_DAYS
            )));
        }
        if self.initial_term_days < self.trial_days {
            return Err(plan_error(format!(
                "initial_term_days ({}) must not be shorter than trial_days ({})",
                self.initial_term_days, self.trial_days
            )));
        }
        if self.renewal_days == 0 {
            return Err(plan_error("renewal_days must be at least 1".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(plan_error(format!("price {} is not a valid amount", self.price)));
        }
        Ok(())
    }
}

fn plan_error(message: String) -> Error {
    Error::Config {
        message: format!("Invalid subscription plan: {message}"),
    }
}

/// The single subscription record of a profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Cached status, refreshed by [`Subscription::recompute`]
    pub status: SubscriptionStatus,
    /// When the trial began
    pub trial_start_date: DateTime<Utc>,
    /// When the trial ends
    pub trial_end_date: DateTime<Utc>,
    /// Hard expiry
    pub subscription_end_date: DateTime<Utc>,
    /// Price per renewal
    pub price: f64,
    /// ISO currency code
    pub currency: String,
    /// When the last renewal happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<DateTime<Utc>>,
}

impl Subscription {
    /// A fresh trial starting at `now`.
    #[must_use]
    pub fn start_trial(plan: &SubscriptionPlan, now: DateTime<Utc>) -> Self {
        Self {
            status: SubscriptionStatus::Trial,
            trial_start_date: now,
            trial_end_date: now + Duration::days(i64::from(plan.trial_days)),
            subscription_end_date: now + Duration::days(i64::from(plan.initial_term_days)),
            price: plan.price,
            currency: plan.currency.clone(),
            last_payment_date: None,
        }
    }

    /// The status this record should have at `now`.
    ///
    /// Hard expiry is checked first, so a trial whose end dates have both passed
    /// goes straight to `expired`. `active` never returns to `trial`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        if now > self.subscription_end_date {
            SubscriptionStatus::Expired
        } else if now > self.trial_end_date && self.status == SubscriptionStatus::Trial {
            SubscriptionStatus::Active
        } else {
            self.status
        }
    }

    /// Applies [`Subscription::status_at`]; returns whether the status changed.
    pub fn recompute(&mut self, now: DateTime<Utc>) -> bool {
        let next = self.status_at(now);
        let changed = next != self.status;
        self.status = next;
        changed
    }

    /// Whether premium features are available at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Trial | SubscriptionStatus::Active
        ) && now <= self.subscription_end_date
    }

    /// Marks the subscription paid for another renewal period from `now`.
    pub fn renew(&mut self, plan: &SubscriptionPlan, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Active;
        self.subscription_end_date = now + Duration::days(i64::from(plan.renewal_days));
        self.last_payment_date = Some(now);
    }

    /// Whole days left until hard expiry, never negative.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.subscription_end_date - now).num_days().max(0)
    }
}

/// Owns the persisted subscription and answers feature-gate queries.
pub struct SubscriptionLifecycle<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    plan: SubscriptionPlan,
    current: Option<Subscription>,
}

impl<S: KeyValueStore> SubscriptionLifecycle<S> {
    /// Loads the stored subscription, if any.
    ///
    /// An unreadable record is logged and treated as absent.
    ///
    /// # Errors
    /// - [`Error::Config`] if `plan` fails [`SubscriptionPlan::validate`].
    /// - [`Error::Persistence`] if the storage read fails.
    pub async fn open(storage: S, clock: Arc<dyn Clock>, plan: SubscriptionPlan) -> Result<Self> {
        plan.validate()?;
        let current: Option<Subscription> = match storage.read(SUBSCRIPTION_KEY).await? {
            None => None,
            Some(raw) => serde_json::from_str(&raw)
                .inspect_err(|e| warn!("Discarding unreadable subscription record: {}", e))
                .ok(),
        };
        debug!("Loaded subscription: {:?}", current.as_ref().map(|s| s.status));

        Ok(Self {
            storage,
            clock,
            plan,
            current,
        })
    }

    /// Terms used for new trials and renewals.
    #[must_use]
    pub const fn plan(&self) -> &SubscriptionPlan {
        &self.plan
    }

    /// Starts a new trial, replacing any existing subscription.
    ///
    /// Trial end and hard expiry are taken from the plan, counted from now.
    ///
    /// # Errors
    /// [`Error::Persistence`] if the write fails; the trial is kept in memory.
    #[instrument(skip(self))]
    pub async fn start_trial(&mut self) -> Result<Subscription> {
        let subscription = Subscription::start_trial(&self.plan, self.clock.now());
        info!(
            "Starting trial until {}, hard expiry {}",
            subscription.trial_end_date, subscription.subscription_end_date
        );
        self.current = Some(subscription.clone());
        self.persist(&subscription).await?;
        Ok(subscription)
    }

    /// The subscription with its status recomputed for the current time.
    ///
    /// # Errors
    /// [`Error::Persistence`] if a changed status cannot be written; the new status
    /// is kept in memory regardless.
    pub async fn current(&mut self) -> Result<Option<Subscription>> {
        let now = self.clock.now();
        let Some(subscription) = self.current.as_mut() else {
            return Ok(None);
        };

        let before = subscription.status;
        if subscription.recompute(now) {
            info!("Subscription moved from {} to {}", before, subscription.status);
            let snapshot = subscription.clone();
            self.persist(&snapshot).await?;
            return Ok(Some(snapshot));
        }
        Ok(Some(subscription.clone()))
    }

    /// Recomputed status, or `None` without a subscription.
    ///
    /// # Errors
    /// As [`SubscriptionLifecycle::current`].
    pub async fn status(&mut self) -> Result<Option<SubscriptionStatus>> {
        Ok(self.current().await?.map(|s| s.status))
    }

    /// Whether premium features are available right now.
    ///
    /// Never fails: a failure to persist a recomputed status is logged and the
    /// answer is given from memory.
    pub async fn is_active(&mut self) -> bool {
        let now = self.clock.now();
        match self.current().await {
            Ok(subscription) => subscription.is_some_and(|s| s.is_active_at(now)),
            Err(e) => {
                error!("Failed to persist recomputed subscription: {}", e);
                self.current.as_ref().is_some_and(|s| s.is_active_at(now))
            }
        }
    }

    /// Gate for premium features.
    ///
    /// # Errors
    /// [`Error::SubscriptionInactive`] when [`SubscriptionLifecycle::is_active`] is false.
    pub async fn require_active(&mut self) -> Result<()> {
        if self.is_active().await {
            return Ok(());
        }
        let status = self
            .current
            .as_ref()
            .map_or_else(|| "none".to_string(), |s| s.status.to_string());
        Err(Error::SubscriptionInactive { status })
    }

    /// Renews for another period starting now.
    ///
    /// # Errors
    /// [`Error::NotFound`] without a subscription; [`Error::Persistence`] if the
    /// write fails, with the renewal kept in memory.
    #[instrument(skip(self))]
    pub async fn renew(&mut self) -> Result<Subscription> {
        let now = self.clock.now();
        let subscription = self.current.as_mut().ok_or_else(|| Error::NotFound {
            kind: "subscription",
            id: SUBSCRIPTION_KEY.to_string(),
        })?;

        subscription.renew(&self.plan, now);
        info!("Subscription renewed until {}", subscription.subscription_end_date);
        let snapshot = subscription.clone();
        self.persist(&snapshot).await?;
        Ok(snapshot)
    }

    /// Whole days until hard expiry, if there is a subscription.
    #[must_use]
    pub fn days_remaining(&self) -> Option<i64> {
        let now = self.clock.now();
        self.current.as_ref().map(|s| s.days_remaining(now))
    }

    /// Forgets the subscription and removes it from storage.
    ///
    /// # Errors
    /// [`Error::Persistence`] if the removal fails; the subscription is already
    /// forgotten in memory.
    pub async fn clear(&mut self) -> Result<()> {
        self.current = None;
        self.storage.remove(SUBSCRIPTION_KEY).await
    }

    async fn persist(&self, subscription: &Subscription) -> Result<()> {
        let payload = serde_json::to_string(subscription)
            .map_err(|e| Error::persistence(format!("Failed to serialize subscription: {e}")))?;
        self.storage
            .write(SUBSCRIPTION_KEY, &payload)
            .await
            .inspect_err(|e| error!("Failed to persist subscription: {}", e))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils::{fixed_clock, test_start};

    fn trial() -> Subscription {
        Subscription::start_trial(&SubscriptionPlan::default(), test_start())
    }

    #[test]
    fn test_trial_dates() {
        let sub = trial();
        let t = test_start();
        assert_eq!(sub.status, SubscriptionStatus::Trial);
        assert_eq!(sub.trial_start_date, t);
        assert_eq!(sub.trial_end_date, t + Duration::days(30));
        assert_eq!(sub.subscription_end_date, t + Duration::days(60));
        assert_eq!(sub.currency, "NGN");
        assert!(sub.last_payment_date.is_none());
    }

    #[test]
    fn test_status_windows() {
        let t = test_start();
        let one = Duration::seconds(1);
        let cases = [
            (t, SubscriptionStatus::Trial),
            (t + Duration::days(15), SubscriptionStatus::Trial),
            (t + Duration::days(30), SubscriptionStatus::Trial),
            (t + Duration::days(30) + one, SubscriptionStatus::Active),
            (t + Duration::days(60), SubscriptionStatus::Active),
            (t + Duration::days(60) + one, SubscriptionStatus::Expired),
        ];
        for (now, expected) in cases {
            assert_eq!(trial().status_at(now), expected, "at {now}");
        }
    }

    #[test]
    fn test_lapsed_trial_skips_active() {
        let mut sub = trial();
        let now = test_start() + Duration::days(90);
        assert!(sub.recompute(now));
        assert_eq!(sub.status, SubscriptionStatus::Expired);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut sub = trial();
        let now = test_start() + Duration::days(31);
        assert!(sub.recompute(now));
        assert!(!sub.recompute(now));
        assert_eq!(sub.status, SubscriptionStatus::Active);

        // Going back in time does not restore the trial.
        assert!(!sub.recompute(test_start()));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn test_is_active_false_past_end_regardless_of_status() {
        let sub = trial();
        let past_end = sub.subscription_end_date + Duration::milliseconds(1);
        assert_eq!(sub.status, SubscriptionStatus::Trial);
        assert!(!sub.is_active_at(past_end));
        assert!(sub.is_active_at(sub.subscription_end_date));
    }

    #[test]
    fn test_renew_after_expiry() {
        let mut sub = trial();
        let now = test_start() + Duration::days(100);
        sub.recompute(now);
        assert_eq!(sub.status, SubscriptionStatus::Expired);

        sub.renew(&SubscriptionPlan::default(), now);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.subscription_end_date, now + Duration::days(30));
        assert_eq!(sub.last_payment_date, Some(now));
        assert!(sub.is_active_at(now));
        assert_eq!(sub.status_at(now + Duration::days(10)), SubscriptionStatus::Active);
    }

    #[test]
    fn test_persisted_shape() {
        let value = serde_json::to_value(trial()).unwrap();
        assert_eq!(value["status"], "trial");
        assert!(value.get("trialEndDate").is_some());
        assert!(value.get("subscriptionEndDate").is_some());
        assert!(value.get("lastPaymentDate").is_none());
    }

    #[test]
    fn test_plan_validation() {
        assert!(SubscriptionPlan::default().validate().is_ok());

        let huge = SubscriptionPlan {
            trial_days: 4_000_000_000,
            ..SubscriptionPlan::default()
        };
        assert!(matches!(huge.validate(), Err(Error::Config { .. })));

        let inverted = SubscriptionPlan {
            trial_days: 60,
            initial_term_days: 30,
            ..SubscriptionPlan::default()
        };
        assert!(matches!(inverted.validate(), Err(Error::Config { .. })));

        let no_renewal = SubscriptionPlan {
            renewal_days: 0,
            ..SubscriptionPlan::default()
        };
        assert!(matches!(no_renewal.validate(), Err(Error::Config { .. })));

        let negative_price = SubscriptionPlan {
            price: -1.0,
            ..SubscriptionPlan::default()
        };
        assert!(matches!(negative_price.validate(), Err(Error::Config { .. })));

        let longest = SubscriptionPlan {
            trial_days: SubscriptionPlan::MAX_DAYS,
            initial_term_days: SubscriptionPlan::MAX_DAYS,
            renewal_days: SubscriptionPlan::MAX_DAYS,
            ..SubscriptionPlan::default()
        };
        assert!(longest.validate().is_ok());
        let sub = Subscription::start_trial(&longest, test_start());
        assert_eq!(sub.trial_end_date, sub.subscription_end_date);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_plan() {
        let plan = SubscriptionPlan {
            renewal_days: 4_000_000_000,
            ..SubscriptionPlan::default()
        };
        let result = SubscriptionLifecycle::open(MemoryStore::new(), fixed_clock(), plan).await;
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_lifecycle_without_subscription() -> Result<()> {
        let mut lifecycle =
            SubscriptionLifecycle::open(MemoryStore::new(), fixed_clock(), SubscriptionPlan::default())
                .await?;
        assert!(lifecycle.current().await?.is_none());
        assert!(!lifecycle.is_active().await);
        assert!(matches!(
            lifecycle.require_active().await,
            Err(Error::SubscriptionInactive { .. })
        ));
        assert!(matches!(
            lifecycle.renew().await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_lifecycle_persists_transitions() -> Result<()> {
        let storage = MemoryStore::new();
        let clock = fixed_clock();
        let mut lifecycle =
            SubscriptionLifecycle::open(storage.clone(), clock.clone(), SubscriptionPlan::default())
                .await?;
        lifecycle.start_trial().await?;
        assert!(lifecycle.is_active().await);
        assert_eq!(lifecycle.days_remaining(), Some(60));

        clock.advance(Duration::days(31));
        assert_eq!(lifecycle.status().await?, Some(SubscriptionStatus::Active));

        let reopened =
            SubscriptionLifecycle::open(storage.clone(), clock.clone(), SubscriptionPlan::default())
                .await?;
        assert_eq!(
            reopened.current.as_ref().map(|s| s.status),
            Some(SubscriptionStatus::Active)
        );

        clock.advance(Duration::days(30));
        assert!(!lifecycle.is_active().await);
        assert_eq!(lifecycle.status().await?, Some(SubscriptionStatus::Expired));

        let renewed = lifecycle.renew().await?;
        assert_eq!(renewed.status, SubscriptionStatus::Active);
        lifecycle.require_active().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_is_active_survives_write_failure() -> Result<()> {
        let storage = MemoryStore::new();
        let clock = fixed_clock();
        let mut lifecycle =
            SubscriptionLifecycle::open(storage.clone(), clock.clone(), SubscriptionPlan::default())
                .await?;
        lifecycle.start_trial().await?;

        storage.set_fail_writes(true);
        clock.advance(Duration::days(61));
        assert!(!lifecycle.is_active().await);
        assert!(matches!(
            lifecycle.renew().await,
            Err(Error::Persistence { .. })
        ));
        // The renewal is still visible for this session.
        assert!(lifecycle.is_active().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_record_is_treated_as_absent() -> Result<()> {
        let storage = MemoryStore::new();
        storage.seed(SUBSCRIPTION_KEY, "not json")?;
        let mut lifecycle =
            SubscriptionLifecycle::open(storage, fixed_clock(), SubscriptionPlan::default()).await?;
        assert!(lifecycle.current().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_clear() -> Result<()> {
        let storage = MemoryStore::new();
        let mut lifecycle =
            SubscriptionLifecycle::open(storage.clone(), fixed_clock(), SubscriptionPlan::default())
                .await?;
        lifecycle.start_trial().await?;
        lifecycle.clear().await?;
        assert!(lifecycle.current().await?.is_none());
        assert_eq!(storage.read(SUBSCRIPTION_KEY).await?, None);
        Ok(())
    }
}
