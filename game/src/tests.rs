//! Session tracker behavior, end to end over the public operations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::challenge::ChallengeState;
use crate::mock::{alice, bob, carol, harness, strong_card, weak_card};
use crate::participant::ScopeId;
use crate::ratelimit::RateLimit;
use crate::session::{ChallengeError, SessionConfig, SubmitOutcome};

const SCOPE: ScopeId = 77;

#[tokio::test]
async fn test_single_submission_leaves_challenge_pending() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();

    let outcome = h.tracker.submit_card(SCOPE, alice(), strong_card()).await;
    assert_eq!(outcome, SubmitOutcome::Pending { challenges: 1 });
    assert_eq!(
        h.tracker.challenge_state(SCOPE, alice().id).await,
        Some(ChallengeState::AwaitingOpponentCard)
    );
    assert!(h.reports().is_empty());
}

#[tokio::test]
async fn test_both_submissions_resolve_exactly_once() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();
    h.tracker.submit_card(SCOPE, alice(), strong_card()).await;

    let outcome = h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
    assert_eq!(outcome, SubmitOutcome::Resolved { battles: 1 });

    let reports = h.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].scope, SCOPE);
    assert_eq!(reports[0].challenger.id, alice().id);
    assert_eq!(reports[0].opponent.id, bob().id);
    // vitality for {100, 80, Rare, 500} works out to 230
    assert_eq!(reports[0].result.starting_challenger_vitality, 230);
    assert!(reports[0].result.exchanges.len() <= 100);

    // the challenge is gone; a late card is a benign no-op
    assert_eq!(h.tracker.challenge_state(SCOPE, alice().id).await, None);
    let late = h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
    assert_eq!(late, SubmitOutcome::NoChallenge);
    assert_eq!(h.reports().len(), 1);
}

#[tokio::test]
async fn test_self_challenge_is_rejected() {
    let h = harness(SessionConfig::default());
    assert_eq!(
        h.tracker.create_challenge(SCOPE, alice(), "alice").await,
        Err(ChallengeError::SelfChallenge)
    );
    // case and the @ prefix make no difference
    assert_eq!(
        h.tracker.create_challenge(SCOPE, alice(), "@ALICE").await,
        Err(ChallengeError::SelfChallenge)
    );
    assert_eq!(h.tracker.live_challenges().await, 0);
}

#[tokio::test]
async fn test_blank_opponent_is_rejected() {
    let h = harness(SessionConfig::default());
    assert_eq!(
        h.tracker.create_challenge(SCOPE, alice(), "@").await,
        Err(ChallengeError::EmptyOpponentName)
    );
    assert_eq!(
        h.tracker.create_challenge(SCOPE, alice(), "   ").await,
        Err(ChallengeError::EmptyOpponentName)
    );
}

#[tokio::test]
async fn test_new_challenge_replaces_the_outstanding_one() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();
    h.tracker.submit_card(SCOPE, alice(), strong_card()).await;

    // re-challenging wipes the earlier card and opponent
    h.tracker
        .create_challenge(SCOPE, alice(), "carol")
        .await
        .unwrap();
    assert_eq!(h.tracker.live_challenges().await, 1);
    assert_eq!(
        h.tracker.challenge_state(SCOPE, alice().id).await,
        Some(ChallengeState::AwaitingBothCards)
    );

    // bob is no longer anyone's opponent
    let outcome = h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
    assert_eq!(outcome, SubmitOutcome::NoChallenge);
}

#[tokio::test]
async fn test_opponent_name_matching_ignores_case() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(SCOPE, alice(), "@Bob")
        .await
        .unwrap();

    let outcome = h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
    assert_eq!(outcome, SubmitOutcome::Pending { challenges: 1 });
    assert_eq!(
        h.tracker.challenge_state(SCOPE, alice().id).await,
        Some(ChallengeState::AwaitingChallengerCard)
    );
}

#[tokio::test]
async fn test_one_upload_can_settle_several_challenges() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();
    h.tracker
        .create_challenge(SCOPE, carol(), "bob")
        .await
        .unwrap();
    h.tracker.submit_card(SCOPE, alice(), strong_card()).await;
    h.tracker.submit_card(SCOPE, carol(), strong_card()).await;

    // bob's one card answers both challenges
    let outcome = h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
    assert_eq!(outcome, SubmitOutcome::Resolved { battles: 2 });
    assert_eq!(h.reports().len(), 2);
    assert_eq!(h.tracker.live_challenges().await, 0);
}

#[tokio::test]
async fn test_scopes_are_isolated() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(1, alice(), "bob")
        .await
        .unwrap();

    let outcome = h.tracker.submit_card(2, bob(), weak_card()).await;
    assert_eq!(outcome, SubmitOutcome::NoChallenge);
}

#[tokio::test]
async fn test_cancel_is_a_benign_no_op_when_absent() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();

    assert!(h.tracker.cancel(SCOPE, alice().id).await);
    assert!(!h.tracker.cancel(SCOPE, alice().id).await);
    assert_eq!(
        h.tracker.submit_card(SCOPE, alice(), strong_card()).await,
        SubmitOutcome::NoChallenge
    );
}

#[tokio::test]
async fn test_sweep_honors_the_timeout_boundary() {
    let h = harness(SessionConfig::default());
    let t0 = Instant::now();
    h.tracker
        .create_challenge_at(SCOPE, alice(), "bob", t0)
        .await
        .unwrap();

    // just short of the deadline: untouched, no notices
    let swept = h.tracker.sweep_expired(t0 + Duration::from_secs(599)).await;
    assert_eq!(swept, 0);
    assert!(h.tracker.challenge_state(SCOPE, alice().id).await.is_some());
    assert!(h.notices().is_empty());

    // past it: removed, exactly one notice into the right scope
    let swept = h.tracker.sweep_expired(t0 + Duration::from_secs(601)).await;
    assert_eq!(swept, 1);
    assert_eq!(h.tracker.challenge_state(SCOPE, alice().id).await, None);
    let notices = h.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, SCOPE);
    assert!(notices[0].1.contains("@alice"));
    assert!(notices[0].1.contains("@bob"));

    // sweeping again finds nothing
    assert_eq!(
        h.tracker.sweep_expired(t0 + Duration::from_secs(700)).await,
        0
    );
    assert_eq!(h.notices().len(), 1);
}

#[tokio::test]
async fn test_background_sweeper_reclaims_stale_challenges() {
    let config = SessionConfig {
        // everything is instantly stale, so the first sweep collects it
        challenge_timeout: Duration::ZERO,
        ..SessionConfig::default()
    };
    let h = harness(config);
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();

    let sweeper = h.tracker.spawn_sweeper(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(h.tracker.live_challenges().await, 0);
    assert_eq!(h.notices().len(), 1);
    sweeper.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_resolve_at_most_once() {
    // repeat to give the race a real chance to interleave
    for _ in 0..25 {
        let h = harness(SessionConfig::default());
        h.tracker
            .create_challenge(SCOPE, alice(), "bob")
            .await
            .unwrap();

        let first = {
            let tracker = Arc::clone(&h.tracker);
            tokio::spawn(async move { tracker.submit_card(SCOPE, alice(), strong_card()).await })
        };
        let second = {
            let tracker = Arc::clone(&h.tracker);
            tokio::spawn(async move { tracker.submit_card(SCOPE, bob(), weak_card()).await })
        };
        let outcomes = [first.await.unwrap(), second.await.unwrap()];

        let resolved = outcomes
            .iter()
            .filter(|o| matches!(o, SubmitOutcome::Resolved { .. }))
            .count();
        assert_eq!(resolved, 1, "exactly one submission may resolve");
        assert_eq!(h.reports().len(), 1);
        assert_eq!(h.tracker.live_challenges().await, 0);
    }
}

#[tokio::test]
async fn test_seeded_trackers_replay_identical_battles() {
    let config = SessionConfig {
        seed: Some(9),
        ..SessionConfig::default()
    };
    let mut results = Vec::new();
    for _ in 0..2 {
        let h = harness(config.clone());
        h.tracker
            .create_challenge(SCOPE, alice(), "bob")
            .await
            .unwrap();
        h.tracker.submit_card(SCOPE, alice(), strong_card()).await;
        h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
        results.push(h.reports().remove(0).result);
    }
    assert_eq!(results[0], results[1]);
}

#[tokio::test]
async fn test_confirmation_gates_resolution() {
    let config = SessionConfig {
        require_confirmation: true,
        ..SessionConfig::default()
    };
    let h = harness(config);
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();

    let first = h.tracker.submit_card(SCOPE, alice(), strong_card()).await;
    assert_eq!(first, SubmitOutcome::AwaitingConfirmation { challenges: 1 });
    let second = h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
    assert_eq!(second, SubmitOutcome::AwaitingConfirmation { challenges: 1 });
    assert!(h.reports().is_empty());
    assert_eq!(
        h.tracker.challenge_state(SCOPE, alice().id).await,
        Some(ChallengeState::AwaitingConfirmation)
    );

    assert_eq!(
        h.tracker.confirm_card(SCOPE, alice().id).await,
        SubmitOutcome::Pending { challenges: 1 }
    );
    assert_eq!(
        h.tracker.confirm_card(SCOPE, bob().id).await,
        SubmitOutcome::Resolved { battles: 1 }
    );
    assert_eq!(h.reports().len(), 1);

    // everything is resolved and gone; confirming again is a no-op
    assert_eq!(
        h.tracker.confirm_card(SCOPE, bob().id).await,
        SubmitOutcome::NoChallenge
    );
}

#[tokio::test]
async fn test_update_card_corrects_stats_before_the_fight() {
    let config = SessionConfig {
        require_confirmation: true,
        ..SessionConfig::default()
    };
    let h = harness(config);
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();
    h.tracker.submit_card(SCOPE, alice(), weak_card()).await;

    // the extractor misread alice's card; she corrects it
    let outcome = h.tracker.update_card(SCOPE, alice().id, strong_card()).await;
    assert_eq!(outcome, SubmitOutcome::Pending { challenges: 1 });
    assert_eq!(
        h.tracker.card_stats(SCOPE, alice().id).await,
        Some((strong_card(), true))
    );

    h.tracker.submit_card(SCOPE, bob(), weak_card()).await;
    let outcome = h.tracker.confirm_card(SCOPE, bob().id).await;
    assert_eq!(outcome, SubmitOutcome::Resolved { battles: 1 });
    assert_eq!(h.reports()[0].challenger_attrs, strong_card());
}

#[tokio::test]
async fn test_card_stats_views_the_submitted_entry() {
    let h = harness(SessionConfig::default());
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();
    assert_eq!(h.tracker.card_stats(SCOPE, alice().id).await, None);

    h.tracker.submit_card(SCOPE, alice(), strong_card()).await;
    assert_eq!(
        h.tracker.card_stats(SCOPE, alice().id).await,
        Some((strong_card(), true))
    );
}

#[tokio::test]
async fn test_rate_limit_rejects_a_burst_and_recovers() {
    let config = SessionConfig {
        rate_limit: Some(RateLimit {
            max_hits: 2,
            window: Duration::from_secs(60),
        }),
        ..SessionConfig::default()
    };
    let h = harness(config);
    h.tracker
        .create_challenge(SCOPE, alice(), "bob")
        .await
        .unwrap();

    let t0 = Instant::now();
    for _ in 0..2 {
        let outcome = h
            .tracker
            .submit_card_at(SCOPE, alice(), strong_card(), t0)
            .await;
        assert_eq!(outcome, SubmitOutcome::Pending { challenges: 1 });
    }
    let blocked = h
        .tracker
        .submit_card_at(SCOPE, alice(), strong_card(), t0)
        .await;
    assert_eq!(blocked, SubmitOutcome::RateLimited);

    // the window slides open again
    let later = t0 + Duration::from_secs(61);
    let outcome = h
        .tracker
        .submit_card_at(SCOPE, alice(), strong_card(), later)
        .await;
    assert_eq!(outcome, SubmitOutcome::Pending { challenges: 1 });
}
