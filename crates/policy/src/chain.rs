//! Policy chain
//!
//! Policies are registered once and linked by id: a head plus one `next` link
//! per policy. Relinking is validated so the chain can never contain a cycle,
//! and evaluation walks the resolved sequence front to back.

use dsp_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::anonymous::AnonymousTransactionAmountLimitPolicy;
use crate::authenticated::AuthenticatedPolicy;
use crate::balance_limit::BalanceLimitPolicy;
use crate::config::PolicyConfig;
use crate::context::TransferContext;
use crate::decision::{Outcome, PolicyRejection, Verdict};
use crate::error::{PolicyError, PolicyResult};
use crate::spending_limit::{SpendingLimitPolicy, SpendingScope};
use crate::traits::TransferPolicy;

/// Handle of a registered policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub u32);

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The policy variants a chain can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Policy {
    BalanceLimit(BalanceLimitPolicy),
    WeeklySpendingLimit(SpendingLimitPolicy),
    Authenticated(AuthenticatedPolicy),
    AnonymousTransactionAmountLimit(AnonymousTransactionAmountLimitPolicy),
    AnonymousWeeklySpendingLimit(SpendingLimitPolicy),
    AnonymousDailySpendingLimit(SpendingLimitPolicy),
}

impl Policy {
    pub fn balance_limit(cap: Amount) -> Self {
        Policy::BalanceLimit(BalanceLimitPolicy::new(cap))
    }

    pub fn weekly_spending_limit(limit: Amount) -> Self {
        Policy::WeeklySpendingLimit(SpendingLimitPolicy::new(SpendingScope::Weekly, limit))
    }

    pub fn authenticated(owner: Address, validity_secs: i64) -> Self {
        Policy::Authenticated(AuthenticatedPolicy::new(owner, validity_secs))
    }

    pub fn anonymous_transaction_amount_limit(limit: Amount) -> Self {
        Policy::AnonymousTransactionAmountLimit(AnonymousTransactionAmountLimitPolicy::new(limit))
    }

    pub fn anonymous_weekly_spending_limit(limit: Amount) -> Self {
        Policy::AnonymousWeeklySpendingLimit(SpendingLimitPolicy::new(
            SpendingScope::AnonymousWeekly,
            limit,
        ))
    }

    pub fn anonymous_daily_spending_limit(limit: Amount) -> Self {
        Policy::AnonymousDailySpendingLimit(SpendingLimitPolicy::new(
            SpendingScope::AnonymousDaily,
            limit,
        ))
    }

    fn inner(&self) -> &dyn TransferPolicy {
        match self {
            Policy::BalanceLimit(p) => p,
            Policy::WeeklySpendingLimit(p) => p,
            Policy::Authenticated(p) => p,
            Policy::AnonymousTransactionAmountLimit(p) => p,
            Policy::AnonymousWeeklySpendingLimit(p) => p,
            Policy::AnonymousDailySpendingLimit(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TransferPolicy {
        match self {
            Policy::BalanceLimit(p) => p,
            Policy::WeeklySpendingLimit(p) => p,
            Policy::Authenticated(p) => p,
            Policy::AnonymousTransactionAmountLimit(p) => p,
            Policy::AnonymousWeeklySpendingLimit(p) => p,
            Policy::AnonymousDailySpendingLimit(p) => p,
        }
    }
}

impl TransferPolicy for Policy {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn check(&self, ctx: &TransferContext) -> Verdict {
        self.inner().check(ctx)
    }

    fn record(&mut self, ctx: &TransferContext, verdict: &Verdict) {
        self.inner_mut().record(ctx, verdict)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyNode {
    pub policy: Policy,
    pub next: Option<PolicyId>,
}

/// Result of a pure chain evaluation.
///
/// Carries the verdict of every policy visited so [`PolicyChain::commit`] can
/// update exactly those policies once the transfer has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEvaluation {
    pub outcome: Outcome,
    pub visited: Vec<(PolicyId, Verdict)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyChain {
    policies: BTreeMap<PolicyId, PolicyNode>,
    head: Option<PolicyId>,
    next_id: u32,
}

impl PolicyChain {
    /// Empty chain; accepts every transfer
    pub fn new() -> Self {
        Self::default()
    }

    /// BalanceLimit -> WeeklySpendingLimit -> Authenticated ->
    /// AnonymousTransactionAmountLimit -> AnonymousWeeklySpendingLimit ->
    /// AnonymousDailySpendingLimit, with `issuer` exempt from the balance cap.
    /// Exempt senders settle at the first policy.
    pub fn regulated(issuer: Address, config: &PolicyConfig) -> PolicyResult<Self> {
        config.validate()?;
        let mut chain = Self::new();

        let mut balance_limit = BalanceLimitPolicy::new(config.balance_cap)
            .with_cap_fraction(config.balance_cap_fraction);
        balance_limit.set_exempt(issuer, true);

        let ids = [
            chain.register(Policy::BalanceLimit(balance_limit)),
            chain.register(Policy::weekly_spending_limit(config.weekly_spending_limit)),
            chain.register(Policy::authenticated(
                issuer,
                config.authentication_validity_secs,
            )),
            chain.register(Policy::anonymous_transaction_amount_limit(
                config.anonymous_transaction_limit,
            )),
            chain.register(Policy::anonymous_weekly_spending_limit(
                config.anonymous_weekly_limit,
            )),
            chain.register(Policy::anonymous_daily_spending_limit(
                config.anonymous_daily_limit,
            )),
        ];

        chain.set_default_policy(Some(ids[0]))?;
        for pair in ids.windows(2) {
            chain.set_next_policy(pair[0], Some(pair[1]))?;
        }
        Ok(chain)
    }

    /// Add a policy without linking it
    pub fn register(&mut self, policy: Policy) -> PolicyId {
        let id = PolicyId(self.next_id);
        self.next_id += 1;
        tracing::info!(policy = policy.name(), %id, "Policy registered");
        self.policies.insert(id, PolicyNode { policy, next: None });
        id
    }

    /// Set (or clear) the first policy of the chain
    pub fn set_default_policy(&mut self, id: Option<PolicyId>) -> PolicyResult<()> {
        if let Some(id) = id {
            self.node(id)?;
        }
        self.head = id;
        tracing::info!(head = ?id, "Default policy set");
        Ok(())
    }

    /// Link `next` after `id`, refusing links that would close a loop
    pub fn set_next_policy(&mut self, id: PolicyId, next: Option<PolicyId>) -> PolicyResult<()> {
        self.node(id)?;
        if let Some(target) = next {
            self.node(target)?;
            let mut cursor = Some(target);
            while let Some(current) = cursor {
                if current == id {
                    return Err(PolicyError::CycleDetected {
                        from: id,
                        to: target,
                    });
                }
                cursor = self.policies.get(&current).and_then(|n| n.next);
            }
        }

        if let Some(node) = self.policies.get_mut(&id) {
            node.next = next;
        }
        tracing::info!(%id, next = ?next, "Policy relinked");
        Ok(())
    }

    pub fn head(&self) -> Option<PolicyId> {
        self.head
    }

    /// Policy ids in evaluation order
    pub fn sequence(&self) -> Vec<PolicyId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            order.push(id);
            cursor = self.policies.get(&id).and_then(|n| n.next);
        }
        order
    }

    /// Run the chain without changing any policy state
    pub fn evaluate(&self, ctx: &TransferContext) -> ChainEvaluation {
        let mut visited = Vec::new();
        let mut immediate = ctx.amount;
        let mut held = Amount::ZERO;
        let mut pending: Option<PolicyRejection> = None;

        for id in self.sequence() {
            let Some(node) = self.policies.get(&id) else {
                continue;
            };
            let verdict = node.policy.check(ctx);
            visited.push((id, verdict.clone()));

            match verdict {
                Verdict::Continue => {
                    tracing::debug!(policy = node.policy.name(), "Policy passed");
                    pending = None;
                }
                Verdict::Settle => {
                    tracing::debug!(policy = node.policy.name(), "Policy settled transfer");
                    pending = None;
                    break;
                }
                Verdict::Fallthrough(rejection) => {
                    tracing::debug!(
                        policy = node.policy.name(),
                        reason = %rejection.reason,
                        "Policy deferred to next"
                    );
                    pending = Some(rejection);
                }
                Verdict::Overflow {
                    immediate: credited,
                    held: overflow,
                } => {
                    tracing::debug!(
                        policy = node.policy.name(),
                        %credited,
                        held = %overflow,
                        "Policy split transfer"
                    );
                    immediate = credited;
                    held = overflow;
                    pending = None;
                }
                Verdict::Reject(rejection) => {
                    return ChainEvaluation {
                        outcome: Outcome::Reject(rejection),
                        visited,
                    };
                }
            }
        }

        let outcome = match pending {
            Some(rejection) => Outcome::Reject(rejection),
            None if held.is_zero() => Outcome::Accept(immediate),
            None => Outcome::AcceptWithOverflow { immediate, held },
        };
        ChainEvaluation { outcome, visited }
    }

    /// Record an applied transfer in every policy that was visited
    pub fn commit(&mut self, ctx: &TransferContext, evaluation: &ChainEvaluation) {
        if !evaluation.outcome.is_accepted() {
            return;
        }
        for (id, verdict) in &evaluation.visited {
            if let Some(node) = self.policies.get_mut(id) {
                node.policy.record(ctx, verdict);
            }
        }
    }

    // === Lookup ===

    fn node(&self, id: PolicyId) -> PolicyResult<&PolicyNode> {
        self.policies.get(&id).ok_or(PolicyError::UnknownPolicy(id))
    }

    pub fn get(&self, id: PolicyId) -> Option<&Policy> {
        self.policies.get(&id).map(|n| &n.policy)
    }

    pub fn get_mut(&mut self, id: PolicyId) -> Option<&mut Policy> {
        self.policies.get_mut(&id).map(|n| &mut n.policy)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// First registered balance limit policy
    pub fn balance_limit(&self) -> PolicyResult<&BalanceLimitPolicy> {
        self.policies
            .values()
            .find_map(|n| match &n.policy {
                Policy::BalanceLimit(p) => Some(p),
                _ => None,
            })
            .ok_or(PolicyError::PolicyNotRegistered(
                crate::balance_limit::BALANCE_LIMIT_POLICY,
            ))
    }

    pub fn balance_limit_mut(&mut self) -> PolicyResult<&mut BalanceLimitPolicy> {
        self.policies
            .values_mut()
            .find_map(|n| match &mut n.policy {
                Policy::BalanceLimit(p) => Some(p),
                _ => None,
            })
            .ok_or(PolicyError::PolicyNotRegistered(
                crate::balance_limit::BALANCE_LIMIT_POLICY,
            ))
    }

    /// First registered authentication policy
    pub fn authenticated(&self) -> PolicyResult<&AuthenticatedPolicy> {
        self.policies
            .values()
            .find_map(|n| match &n.policy {
                Policy::Authenticated(p) => Some(p),
                _ => None,
            })
            .ok_or(PolicyError::PolicyNotRegistered(
                crate::authenticated::AUTHENTICATED_POLICY,
            ))
    }

    pub fn authenticated_mut(&mut self) -> PolicyResult<&mut AuthenticatedPolicy> {
        self.policies
            .values_mut()
            .find_map(|n| match &mut n.policy {
                Policy::Authenticated(p) => Some(p),
                _ => None,
            })
            .ok_or(PolicyError::PolicyNotRegistered(
                crate::authenticated::AUTHENTICATED_POLICY,
            ))
    }
}
