use std::time::{Duration, Instant};

use pfpb_battle::CardAttributes;

use crate::participant::{Participant, ParticipantId};

/// A submitted card and whether its stats have been confirmed.
#[derive(Debug, Clone)]
pub struct CardEntry {
    pub attrs: CardAttributes,
    pub confirmed: bool,
}

/// Where a live challenge stands. Resolved, cancelled, and expired
/// challenges are removed from the tracker rather than kept around in a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    AwaitingBothCards,
    AwaitingChallengerCard,
    AwaitingOpponentCard,
    /// Both cards are in but at least one still needs `/confirm`
    AwaitingConfirmation,
    Ready,
}

/// One challenge in progress: the challenger by stable id, the opponent
/// by display name until they act, and whatever cards have come in so
/// far.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub challenger: Participant,
    pub opponent_name: String,
    pub created_at: Instant,
    challenger_card: Option<CardEntry>,
    opponent_card: Option<(Participant, CardEntry)>,
}

impl Challenge {
    pub fn new(
        challenger: Participant,
        opponent_name: impl Into<String>,
        created_at: Instant,
    ) -> Self {
        Self {
            challenger,
            opponent_name: opponent_name.into(),
            created_at,
            challenger_card: None,
            opponent_card: None,
        }
    }

    /// Store a card for whichever side the participant is on,
    /// overwriting an earlier submission from that side. Returns false
    /// when the participant has no side here.
    pub(crate) fn store_card(&mut self, participant: &Participant, entry: CardEntry) -> bool {
        if self.challenger.id == participant.id {
            self.challenger_card = Some(entry);
            true
        } else if participant.name_matches(&self.opponent_name) {
            self.opponent_card = Some((participant.clone(), entry));
            true
        } else {
            false
        }
    }

    /// Mark this participant's submitted card confirmed. Idempotent;
    /// false when they have no card here.
    pub(crate) fn confirm_card(&mut self, id: ParticipantId) -> bool {
        if self.challenger.id == id {
            if let Some(entry) = &mut self.challenger_card {
                entry.confirmed = true;
                return true;
            }
            return false;
        }
        if let Some((opponent, entry)) = &mut self.opponent_card {
            if opponent.id == id {
                entry.confirmed = true;
                return true;
            }
        }
        false
    }

    /// Replace this participant's submitted stats with corrected
    /// values; correcting implies confirming. False when they have no
    /// card here.
    pub(crate) fn update_card(&mut self, id: ParticipantId, attrs: CardAttributes) -> bool {
        if self.challenger.id == id {
            if let Some(entry) = &mut self.challenger_card {
                *entry = CardEntry {
                    attrs,
                    confirmed: true,
                };
                return true;
            }
            return false;
        }
        if let Some((opponent, entry)) = &mut self.opponent_card {
            if opponent.id == id {
                *entry = CardEntry {
                    attrs,
                    confirmed: true,
                };
                return true;
            }
        }
        false
    }

    /// The card this participant has submitted here, if any.
    pub fn card_for(&self, id: ParticipantId) -> Option<&CardEntry> {
        if self.challenger.id == id {
            return self.challenger_card.as_ref();
        }
        match &self.opponent_card {
            Some((opponent, entry)) if opponent.id == id => Some(entry),
            _ => None,
        }
    }

    /// Ready exactly when both sides hold a confirmed card: the
    /// challenger's own, and one from a participant whose display name
    /// matched the opponent slot when it was stored.
    pub fn is_ready(&self) -> bool {
        let challenger_in = self.challenger_card.as_ref().is_some_and(|e| e.confirmed);
        let opponent_in = self
            .opponent_card
            .as_ref()
            .is_some_and(|(_, e)| e.confirmed);
        challenger_in && opponent_in
    }

    pub fn state(&self) -> ChallengeState {
        if self.is_ready() {
            return ChallengeState::Ready;
        }
        match (self.challenger_card.is_some(), self.opponent_card.is_some()) {
            (false, false) => ChallengeState::AwaitingBothCards,
            (false, true) => ChallengeState::AwaitingChallengerCard,
            (true, false) => ChallengeState::AwaitingOpponentCard,
            (true, true) => ChallengeState::AwaitingConfirmation,
        }
    }

    pub fn expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > timeout
    }

    /// Split a ready challenge into its two sides for resolution.
    pub(crate) fn into_sides(self) -> Option<(Participant, CardEntry, Participant, CardEntry)> {
        let challenger_card = self.challenger_card?;
        let (opponent, opponent_card) = self.opponent_card?;
        Some((self.challenger, challenger_card, opponent, opponent_card))
    }
}
