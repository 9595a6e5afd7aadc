//! Study session state machine.
//!
//! A session runs one skill's deck a card at a time. Finishing the deck
//! triggers a re-fetch of due items: anything rated "did not know" or "hard"
//! is due again immediately and forms the next round, otherwise the session
//! is complete. The scheduler itself keeps no session state; this type is the
//! client-side policy on top of the due-items primitive.
//!
//! ```text
//! Loading --due/all--> Active --rate last--> Loading --empty--> RoundComplete
//!    |                   ^                      |
//!    +--empty--> NoItems +------non-empty-------+
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::types::{Quality, Skill};

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    NoItems,
    Active,
    RoundComplete,
}

/// What the caller should do after handing items to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A round started.
    Ready,
    /// Nothing is due at session start; fetch all items for the lesson.
    NeedsFallback,
    /// The deck is empty.
    NoItems,
    /// The re-fetch after a round found nothing left to review.
    RoundComplete,
}

/// Result of rating the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateOutcome {
    Next,
    /// Last card of the deck; re-fetch due items and pass them to `load_due`.
    RoundFinished,
}

/// Study session over cards of type `T` for one skill.
#[derive(Debug, Clone)]
pub struct StudySession<T> {
    skill: Skill,
    phase: Phase,
    deck: Vec<T>,
    index: usize,
    answer_shown: bool,
    started: bool,
    fallback_used: bool,
    round: u32,
    re_review_count: usize,
}

impl<T> StudySession<T> {
    pub fn new(skill: Skill) -> Self {
        Self {
            skill,
            phase: Phase::Loading,
            deck: Vec::new(),
            index: 0,
            answer_shown: false,
            started: false,
            fallback_used: false,
            round: 0,
            re_review_count: 0,
        }
    }

    pub fn skill(&self) -> Skill {
        self.skill
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Rounds started so far, including a restart.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Cards rated below "good" in the current round.
    pub fn re_review_count(&self) -> usize {
        self.re_review_count
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_answer_shown(&self) -> bool {
        self.answer_shown
    }

    /// Hand the session the currently due items for its skill.
    pub fn load_due(&mut self, items: Vec<T>) -> Result<LoadOutcome, SessionError> {
        self.expect_loading()?;

        if !items.is_empty() {
            self.start_round(items);
            return Ok(LoadOutcome::Ready);
        }

        if self.started {
            self.deck.clear();
            self.phase = Phase::RoundComplete;
            Ok(LoadOutcome::RoundComplete)
        } else if self.fallback_used {
            self.phase = Phase::NoItems;
            Ok(LoadOutcome::NoItems)
        } else {
            Ok(LoadOutcome::NeedsFallback)
        }
    }

    /// Hand the session every item of the lesson. Used once, when nothing
    /// was due at session start.
    pub fn load_all(&mut self, items: Vec<T>) -> Result<LoadOutcome, SessionError> {
        self.expect_loading()?;
        self.fallback_used = true;

        if items.is_empty() {
            self.phase = Phase::NoItems;
            return Ok(LoadOutcome::NoItems);
        }
        self.start_round(items);
        Ok(LoadOutcome::Ready)
    }

    /// The caller chose not to fall back to all items.
    pub fn decline_fallback(&mut self) -> Result<(), SessionError> {
        self.expect_loading()?;
        self.phase = Phase::NoItems;
        Ok(())
    }

    pub fn current(&self) -> Option<&T> {
        match self.phase {
            Phase::Active => self.deck.get(self.index),
            _ => None,
        }
    }

    /// Show the answer of the current card.
    pub fn reveal(&mut self) -> Result<&T, SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NoActiveCard);
        }
        self.answer_shown = true;
        self.deck.get(self.index).ok_or(SessionError::NoActiveCard)
    }

    /// Record the rating of the current card and move on.
    pub fn rate(&mut self, quality: Quality) -> Result<RateOutcome, SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NoActiveCard);
        }
        if !self.answer_shown {
            return Err(SessionError::AnswerHidden);
        }

        if quality.needs_re_review() {
            self.re_review_count += 1;
        }
        self.answer_shown = false;

        if self.index + 1 < self.deck.len() {
            self.index += 1;
            Ok(RateOutcome::Next)
        } else {
            self.phase = Phase::Loading;
            Ok(RateOutcome::RoundFinished)
        }
    }

    /// Review the deck again after the session completed.
    pub fn restart(&mut self, items: Vec<T>) -> Result<LoadOutcome, SessionError> {
        if self.phase != Phase::RoundComplete {
            return Err(SessionError::RoundNotComplete);
        }
        if items.is_empty() {
            self.phase = Phase::NoItems;
            return Ok(LoadOutcome::NoItems);
        }
        self.start_round(items);
        Ok(LoadOutcome::Ready)
    }

    /// Percentage of the current deck done; a revealed card counts as done.
    pub fn progress(&self) -> f64 {
        match self.phase {
            Phase::Active if !self.deck.is_empty() => {
                let done = self.index + usize::from(self.answer_shown);
                done as f64 / self.deck.len() as f64 * 100.0
            }
            Phase::RoundComplete => 100.0,
            _ => 0.0,
        }
    }

    fn expect_loading(&self) -> Result<(), SessionError> {
        if self.phase == Phase::Loading {
            Ok(())
        } else {
            Err(SessionError::NotLoading)
        }
    }

    fn start_round(&mut self, items: Vec<T>) {
        self.deck = items;
        self.index = 0;
        self.answer_shown = false;
        self.started = true;
        self.round += 1;
        self.re_review_count = 0;
        self.phase = Phase::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn study(session: &mut StudySession<&'static str>, ratings: &[Quality]) -> RateOutcome {
        let mut outcome = RateOutcome::Next;
        for quality in ratings {
            session.reveal().unwrap();
            outcome = session.rate(*quality).unwrap();
        }
        outcome
    }

    #[test]
    fn due_items_start_a_round() {
        let mut session = StudySession::new(Skill::Reading);
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.load_due(vec!["猫", "犬"]), Ok(LoadOutcome::Ready));
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.current(), Some(&"猫"));
        assert_eq!(session.round(), 1);
    }

    #[test]
    fn empty_start_asks_for_fallback_once() {
        let mut session = StudySession::new(Skill::Meaning);
        assert_eq!(session.load_due(Vec::new()), Ok(LoadOutcome::NeedsFallback));
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.load_all(vec!["水"]), Ok(LoadOutcome::Ready));
        assert_eq!(session.current(), Some(&"水"));
    }

    #[test]
    fn empty_fallback_means_no_items() {
        let mut session: StudySession<&str> = StudySession::new(Skill::Reading);
        session.load_due(Vec::new()).unwrap();
        assert_eq!(session.load_all(Vec::new()), Ok(LoadOutcome::NoItems));
        assert_eq!(session.phase(), Phase::NoItems);
        assert!(session.current().is_none());
    }

    #[test]
    fn declining_fallback_means_no_items() {
        let mut session: StudySession<&str> = StudySession::new(Skill::Reading);
        session.load_due(Vec::new()).unwrap();
        session.decline_fallback().unwrap();
        assert_eq!(session.phase(), Phase::NoItems);
    }

    #[test]
    fn rating_requires_reveal() {
        let mut session = StudySession::new(Skill::Reading);
        session.load_due(vec!["山"]).unwrap();
        assert_eq!(session.rate(Quality::Good), Err(SessionError::AnswerHidden));
        session.reveal().unwrap();
        assert!(session.is_answer_shown());
        assert_eq!(session.rate(Quality::Good), Ok(RateOutcome::RoundFinished));
    }

    #[test]
    fn finishing_deck_with_good_ratings_completes_round() {
        let mut session = StudySession::new(Skill::Reading);
        session.load_due(vec!["山", "川"]).unwrap();
        let outcome = study(&mut session, &[Quality::Good, Quality::Easy]);
        assert_eq!(outcome, RateOutcome::RoundFinished);
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.re_review_count(), 0);

        assert_eq!(session.load_due(Vec::new()), Ok(LoadOutcome::RoundComplete));
        assert_eq!(session.phase(), Phase::RoundComplete);
        assert_eq!(session.progress(), 100.0);
    }

    #[test]
    fn low_ratings_come_back_in_next_round() {
        let mut session = StudySession::new(Skill::Meaning);
        session.load_due(vec!["山", "川", "空"]).unwrap();
        study(&mut session, &[Quality::Good, Quality::Hard, Quality::DidNotKnow]);
        assert_eq!(session.re_review_count(), 2);

        // Re-fetch returns the two items rated below good
        assert_eq!(session.load_due(vec!["川", "空"]), Ok(LoadOutcome::Ready));
        assert_eq!(session.round(), 2);
        assert_eq!(session.deck_len(), 2);
        assert_eq!(session.re_review_count(), 0);

        study(&mut session, &[Quality::Good, Quality::Good]);
        assert_eq!(session.load_due(Vec::new()), Ok(LoadOutcome::RoundComplete));
    }

    #[test]
    fn restart_only_after_completion() {
        let mut session = StudySession::new(Skill::Reading);
        session.load_due(vec!["山"]).unwrap();
        assert_eq!(session.restart(vec!["山"]), Err(SessionError::RoundNotComplete));

        study(&mut session, &[Quality::Easy]);
        session.load_due(Vec::new()).unwrap();
        assert_eq!(session.restart(vec!["山"]), Ok(LoadOutcome::Ready));
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.round(), 2);
    }

    #[test]
    fn loading_outside_loading_phase_is_rejected() {
        let mut session = StudySession::new(Skill::Reading);
        session.load_due(vec!["山"]).unwrap();
        assert_eq!(session.load_due(vec!["川"]), Err(SessionError::NotLoading));
        assert_eq!(session.load_all(vec!["川"]), Err(SessionError::NotLoading));
    }

    #[test]
    fn reveal_without_active_card_fails() {
        let mut session: StudySession<&str> = StudySession::new(Skill::Reading);
        assert_eq!(session.reveal().err(), Some(SessionError::NoActiveCard));
        assert_eq!(session.rate(Quality::Good), Err(SessionError::NoActiveCard));
    }

    #[test]
    fn progress_counts_revealed_card() {
        let mut session = StudySession::new(Skill::Reading);
        session.load_due(vec!["一", "二", "三", "四"]).unwrap();
        assert_eq!(session.progress(), 0.0);
        session.reveal().unwrap();
        assert_eq!(session.progress(), 25.0);
        session.rate(Quality::Good).unwrap();
        assert_eq!(session.progress(), 25.0);
        session.reveal().unwrap();
        assert_eq!(session.progress(), 50.0);
    }
}
