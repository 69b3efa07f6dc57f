use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pfpb_battle::{
    resolve_battle_seeded, BattleResult, CardAttributes, CombatRules, Combatant,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::challenge::{CardEntry, Challenge, ChallengeState};
use crate::participant::{Participant, ParticipantId, ScopeId};
use crate::ratelimit::{RateLimit, RateLimiter};

/// Reference challenge lifetime before the sweeper reclaims it.
pub const CHALLENGE_TIMEOUT: Duration = Duration::from_secs(600);
/// Reference interval between expiry sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Consumes a finished battle for rendering. The handle is whatever the
/// presentation layer wants to keep (a message id, an animation job);
/// the tracker drops it unread.
pub trait Presenter: Send + Sync {
    type Handle;
    fn present(&self, report: &BattleReport) -> Self::Handle;
}

/// Fire-and-forget delivery of lifecycle notices into a chat scope.
pub trait Notifier: Send + Sync {
    fn notify(&self, scope: ScopeId, message: &str);
}

impl<P: Presenter> Presenter for Arc<P> {
    type Handle = P::Handle;

    fn present(&self, report: &BattleReport) -> Self::Handle {
        (**self).present(report)
    }
}

impl<N: Notifier> Notifier for Arc<N> {
    fn notify(&self, scope: ScopeId, message: &str) {
        (**self).notify(scope, message);
    }
}

/// A resolved battle with everything presentation needs.
#[derive(Debug, Clone)]
pub struct BattleReport {
    pub scope: ScopeId,
    pub challenger: Participant,
    pub opponent: Participant,
    pub challenger_attrs: CardAttributes,
    pub opponent_attrs: CardAttributes,
    pub result: BattleResult,
}

/// Rejections from [`SessionTracker::create_challenge`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("cannot challenge yourself")]
    SelfChallenge,
    #[error("opponent name is empty")]
    EmptyOpponentName,
}

/// What a card submission (or confirmation) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored, and this many battles resolved on the spot
    Resolved { battles: usize },
    /// Stored; waiting on the other side
    Pending { challenges: usize },
    /// Stored; waiting on stat confirmation
    AwaitingConfirmation { challenges: usize },
    /// No live challenge involves this participant; nothing happened
    NoChallenge,
    /// Dropped by the per-participant rate limit
    RateLimited,
}

/// Knobs for a tracker instance.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub challenge_timeout: Duration,
    /// When set, submitted cards must be confirmed before they count
    /// toward readiness
    pub require_confirmation: bool,
    pub rules: CombatRules,
    /// `None` disables submission rate limiting
    pub rate_limit: Option<RateLimit>,
    /// Fixed seed for battle randomness; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            challenge_timeout: CHALLENGE_TIMEOUT,
            require_confirmation: false,
            rules: CombatRules::default(),
            rate_limit: Some(RateLimit::default()),
            seed: None,
        }
    }
}

struct TrackerState {
    /// Live challenges keyed by challenger: at most one outstanding
    /// challenge per challenger per scope.
    challenges: HashMap<(ScopeId, ParticipantId), Challenge>,
    seeds: StdRng,
    limiter: RateLimiter,
}

/// Tracks every challenge in flight and resolves battles as cards
/// arrive.
///
/// All state lives behind one async lock, so mutating operations
/// serialize: two simultaneous submissions cannot both observe a
/// challenge as one-card-short and both resolve it. Battle math is pure
/// and fast and runs under the lock; presenter and notifier calls run
/// after it is released, so slow rendering never blocks other chats.
/// Likewise, attribute extraction belongs before `submit_card`, never
/// inside it.
pub struct SessionTracker<P: Presenter, N: Notifier> {
    state: Mutex<TrackerState>,
    config: SessionConfig,
    presenter: P,
    notifier: N,
}

impl<P: Presenter, N: Notifier> SessionTracker<P, N> {
    pub fn new(config: SessionConfig, presenter: P, notifier: N) -> Self {
        let seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let limiter = RateLimiter::new(config.rate_limit.clone());
        Self {
            state: Mutex::new(TrackerState {
                challenges: HashMap::new(),
                seeds,
                limiter,
            }),
            config,
            presenter,
            notifier,
        }
    }

    /// Open a challenge against a named opponent, replacing any
    /// outstanding challenge by the same challenger in this scope.
    pub async fn create_challenge(
        &self,
        scope: ScopeId,
        challenger: Participant,
        opponent_name: &str,
    ) -> Result<(), ChallengeError> {
        self.create_challenge_at(scope, challenger, opponent_name, Instant::now())
            .await
    }

    /// Timestamped variant: hosts that own a clock (and tests) pass
    /// `now` explicitly.
    pub async fn create_challenge_at(
        &self,
        scope: ScopeId,
        challenger: Participant,
        opponent_name: &str,
        now: Instant,
    ) -> Result<(), ChallengeError> {
        let opponent_name = opponent_name.trim().trim_start_matches('@').trim();
        if opponent_name.is_empty() {
            return Err(ChallengeError::EmptyOpponentName);
        }
        if challenger.name_matches(opponent_name) {
            return Err(ChallengeError::SelfChallenge);
        }

        let mut state = self.state.lock().await;
        let replaced = state
            .challenges
            .insert(
                (scope, challenger.id),
                Challenge::new(challenger.clone(), opponent_name, now),
            )
            .is_some();
        log::info!(
            "@{} challenged @{} in scope {}{}",
            challenger.display_name,
            opponent_name,
            scope,
            if replaced {
                " (replacing their outstanding challenge)"
            } else {
                ""
            }
        );
        Ok(())
    }

    /// Store an extracted card for a participant.
    ///
    /// The card lands in every live challenge in this scope where the
    /// participant is the challenger or matches the opponent name; any
    /// challenge that becomes ready resolves immediately and exactly
    /// once.
    pub async fn submit_card(
        &self,
        scope: ScopeId,
        participant: Participant,
        attrs: CardAttributes,
    ) -> SubmitOutcome {
        self.submit_card_at(scope, participant, attrs, Instant::now())
            .await
    }

    /// Timestamped variant of [`SessionTracker::submit_card`].
    pub async fn submit_card_at(
        &self,
        scope: ScopeId,
        participant: Participant,
        attrs: CardAttributes,
        now: Instant,
    ) -> SubmitOutcome {
        let confirmed = !self.config.require_confirmation;
        let (outcome, reports) = {
            let mut state = self.state.lock().await;
            if !state.limiter.allow(participant.id, now) {
                log::warn!(
                    "@{} is over the submission rate limit",
                    participant.display_name
                );
                return SubmitOutcome::RateLimited;
            }

            let mut stored = 0usize;
            for ((challenge_scope, _), challenge) in state.challenges.iter_mut() {
                if *challenge_scope == scope
                    && challenge.store_card(&participant, CardEntry { attrs, confirmed })
                {
                    stored += 1;
                }
            }
            if stored == 0 {
                return SubmitOutcome::NoChallenge;
            }
            log::info!(
                "@{} submitted a card in scope {} ({} challenge(s))",
                participant.display_name,
                scope,
                stored
            );

            let reports = self.resolve_ready(&mut state, scope);
            let outcome = if !reports.is_empty() {
                SubmitOutcome::Resolved {
                    battles: reports.len(),
                }
            } else if confirmed {
                SubmitOutcome::Pending { challenges: stored }
            } else {
                SubmitOutcome::AwaitingConfirmation { challenges: stored }
            };
            (outcome, reports)
        };
        self.publish(&reports);
        outcome
    }

    /// Confirm a participant's submitted stats, resolving any challenge
    /// that completes. Idempotent; nothing pending is a benign no-op.
    pub async fn confirm_card(&self, scope: ScopeId, participant: ParticipantId) -> SubmitOutcome {
        let (outcome, reports) = {
            let mut state = self.state.lock().await;
            let mut confirmed = 0usize;
            for ((challenge_scope, _), challenge) in state.challenges.iter_mut() {
                if *challenge_scope == scope && challenge.confirm_card(participant) {
                    confirmed += 1;
                }
            }
            if confirmed == 0 {
                return SubmitOutcome::NoChallenge;
            }

            let reports = self.resolve_ready(&mut state, scope);
            let outcome = if reports.is_empty() {
                SubmitOutcome::Pending {
                    challenges: confirmed,
                }
            } else {
                SubmitOutcome::Resolved {
                    battles: reports.len(),
                }
            };
            (outcome, reports)
        };
        self.publish(&reports);
        outcome
    }

    /// Replace a participant's submitted stats with corrected,
    /// pre-validated values; correcting implies confirming.
    pub async fn update_card(
        &self,
        scope: ScopeId,
        participant: ParticipantId,
        attrs: CardAttributes,
    ) -> SubmitOutcome {
        let (outcome, reports) = {
            let mut state = self.state.lock().await;
            let mut updated = 0usize;
            for ((challenge_scope, _), challenge) in state.challenges.iter_mut() {
                if *challenge_scope == scope && challenge.update_card(participant, attrs) {
                    updated += 1;
                }
            }
            if updated == 0 {
                return SubmitOutcome::NoChallenge;
            }

            let reports = self.resolve_ready(&mut state, scope);
            let outcome = if reports.is_empty() {
                SubmitOutcome::Pending {
                    challenges: updated,
                }
            } else {
                SubmitOutcome::Resolved {
                    battles: reports.len(),
                }
            };
            (outcome, reports)
        };
        self.publish(&reports);
        outcome
    }

    /// Current stats view for a participant's uploaded card in scope.
    pub async fn card_stats(
        &self,
        scope: ScopeId,
        participant: ParticipantId,
    ) -> Option<(CardAttributes, bool)> {
        let state = self.state.lock().await;
        state
            .challenges
            .iter()
            .filter(|((challenge_scope, _), _)| *challenge_scope == scope)
            .find_map(|(_, challenge)| challenge.card_for(participant))
            .map(|entry| (entry.attrs, entry.confirmed))
    }

    /// Withdraw a challenger's outstanding challenge. Absent is fine:
    /// racing a resolution or an expiry is expected, not an error.
    pub async fn cancel(&self, scope: ScopeId, challenger: ParticipantId) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.challenges.remove(&(scope, challenger)).is_some();
        if removed {
            log::info!("challenge by {challenger} in scope {scope} cancelled");
        }
        removed
    }

    /// Reclaim challenges older than the configured timeout, notifying
    /// each challenge's chat. Returns how many were removed.
    pub async fn sweep_expired(&self, now: Instant) -> usize {
        let notices: Vec<(ScopeId, String)> = {
            let mut state = self.state.lock().await;
            let expired: Vec<(ScopeId, ParticipantId)> = state
                .challenges
                .iter()
                .filter(|(_, challenge)| challenge.expired(now, self.config.challenge_timeout))
                .map(|(key, _)| *key)
                .collect();
            expired
                .into_iter()
                .filter_map(|key| {
                    state.challenges.remove(&key).map(|challenge| {
                        log::info!(
                            "challenge @{} -> @{} in scope {} expired",
                            challenge.challenger.display_name,
                            challenge.opponent_name,
                            key.0
                        );
                        (
                            key.0,
                            format!(
                                "Challenge from @{} to @{} timed out.",
                                challenge.challenger.display_name, challenge.opponent_name
                            ),
                        )
                    })
                })
                .collect()
        };
        for (scope, message) in &notices {
            self.notifier.notify(*scope, message);
        }
        notices.len()
    }

    /// State view of a challenger's live challenge.
    pub async fn challenge_state(
        &self,
        scope: ScopeId,
        challenger: ParticipantId,
    ) -> Option<ChallengeState> {
        let state = self.state.lock().await;
        state
            .challenges
            .get(&(scope, challenger))
            .map(Challenge::state)
    }

    /// Number of live challenges across all scopes.
    pub async fn live_challenges(&self) -> usize {
        self.state.lock().await.challenges.len()
    }

    /// Resolve every ready challenge in scope. Runs under the lock: the
    /// readiness check, the removal, and the seed draw must be atomic
    /// so each challenge resolves at most once.
    fn resolve_ready(&self, state: &mut TrackerState, scope: ScopeId) -> Vec<BattleReport> {
        let ready: Vec<(ScopeId, ParticipantId)> = state
            .challenges
            .iter()
            .filter(|((challenge_scope, _), challenge)| {
                *challenge_scope == scope && challenge.is_ready()
            })
            .map(|(key, _)| *key)
            .collect();

        let mut reports = Vec::with_capacity(ready.len());
        for key in ready {
            let Some(challenge) = state.challenges.remove(&key) else {
                continue;
            };
            let seed = state.seeds.gen();
            if let Some(report) = resolve_challenge(key.0, challenge, &self.config.rules, seed) {
                reports.push(report);
            }
        }
        reports
    }

    /// Collaborator side effects, after the lock is gone.
    fn publish(&self, reports: &[BattleReport]) {
        for report in reports {
            let _handle = self.presenter.present(report);
        }
    }
}

impl<P, N> SessionTracker<P, N>
where
    P: Presenter + 'static,
    N: Notifier + 'static,
{
    /// Run the expiry sweep on a fixed period in the background. The
    /// tracker normally lives in an `Arc`; the loop holds a clone and
    /// runs until the handle is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracker.sweep_expired(Instant::now()).await;
            }
        })
    }
}

/// Pure resolution step: vitality for both cards, then the battle.
fn resolve_challenge(
    scope: ScopeId,
    challenge: Challenge,
    rules: &CombatRules,
    seed: u64,
) -> Option<BattleReport> {
    let (challenger, challenger_card, opponent, opponent_card) = challenge.into_sides()?;
    let result = resolve_battle_seeded(
        Combatant::from_attributes(&challenger_card.attrs),
        Combatant::from_attributes(&opponent_card.attrs),
        rules,
        seed,
    );
    log::info!(
        "battle in scope {}: @{} {} -> {} vs @{} {} -> {}",
        scope,
        challenger.display_name,
        result.starting_challenger_vitality,
        result.final_challenger_vitality,
        opponent.display_name,
        result.starting_opponent_vitality,
        result.final_opponent_vitality
    );
    Some(BattleReport {
        scope,
        challenger,
        opponent,
        challenger_attrs: challenger_card.attrs,
        opponent_attrs: opponent_card.attrs,
        result,
    })
}
