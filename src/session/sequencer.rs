//! Card sequencing: constrained shuffle, decision tracking, summaries.

use std::collections::HashMap;

use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::catalog::{Card, Catalog};
use crate::tally::Decision;

/// Default number of cards drawn into a result deck.
pub const DECK_SIZE: usize = 8;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("catalog is empty")]
    EmptyCatalog,
    #[error("session already complete")]
    SessionComplete,
    #[error("no decision awaiting confirmation")]
    NoPendingDecision,
}

/// Outcome of a successfully applied decision.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub card_id: String,
    pub decision: Decision,
    pub complete: bool,
}

/// What came back from [`Session::propose`]: either the decision went
/// through, or the player is being asked to confirm it first.
#[derive(Debug, Clone)]
pub enum Proposal {
    Resolved(Resolved),
    NeedsConfirmation { card_id: String, decision: Decision },
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub accepted: Vec<Card>,
    pub rejected: Vec<Card>,
    pub total_resolved: usize,
}

/// One playthrough. Created by [`Session::start`], mutated only through
/// resolve/confirm/cancel, discarded when the player walks away.
#[derive(Debug, Clone)]
pub struct Session {
    /// Permutation of all catalog ids, fixed at start.
    order: Vec<String>,
    /// Cursor into `order`; advances by one per resolved decision.
    position: usize,
    decisions: HashMap<String, Decision>,
    /// Decision parked by a confirmation interruption, if any.
    pending: Option<Decision>,
}

impl Session {
    /// Shuffle the catalog into a fresh traversal order.
    ///
    /// Ordinary cards are Fisher-Yates shuffled; the pinned-early cards are
    /// then spliced in at distinct slots drawn from the first `pin_window`
    /// positions of the final order. Drawing the slots up front means no pin
    /// can be displaced past the window by a later insertion.
    pub fn start(
        catalog: &Catalog,
        pin_window: usize,
        rng: &mut impl Rng,
    ) -> Result<Self, SessionError> {
        if catalog.is_empty() {
            return Err(SessionError::EmptyCatalog);
        }

        let (pinned, ordinary): (Vec<&Card>, Vec<&Card>) =
            catalog.cards().iter().partition(|c| c.pinned_early);

        let mut order: Vec<String> = ordinary.iter().map(|c| c.id.clone()).collect();
        order.shuffle(rng);

        // The window shrinks to the catalog and widens to fit every pin.
        let window = pin_window.clamp(pinned.len(), catalog.len());
        let mut slots = index::sample(rng, window, pinned.len()).into_vec();
        slots.sort_unstable();
        // Ascending inserts leave already-placed pins untouched, so each pin
        // ends up exactly at its drawn slot.
        for (slot, card) in slots.into_iter().zip(&pinned) {
            order.insert(slot, card.id.clone());
        }

        Ok(Self {
            order,
            position: 0,
            decisions: HashMap::new(),
            pending: None,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.order.len()
    }

    pub fn pending(&self) -> Option<Decision> {
        self.pending
    }

    /// The card under the cursor, or `None` once the session is complete.
    pub fn current_card<'a>(&self, catalog: &'a Catalog) -> Option<&'a Card> {
        self.order.get(self.position).and_then(|id| catalog.get(id))
    }

    /// Upcoming card ids materialized for preview, current card excluded.
    pub fn lookahead(&self, n: usize) -> &[String] {
        let start = (self.position + 1).min(self.order.len());
        let end = (start + n).min(self.order.len());
        &self.order[start..end]
    }

    /// Record a decision for the current card and advance the cursor.
    pub fn resolve(&mut self, decision: Decision) -> Result<Resolved, SessionError> {
        let card_id = self
            .order
            .get(self.position)
            .cloned()
            .ok_or(SessionError::SessionComplete)?;
        self.decisions.insert(card_id.clone(), decision);
        self.position += 1;
        self.pending = None;
        Ok(Resolved {
            card_id,
            decision,
            complete: self.is_complete(),
        })
    }

    /// Like [`resolve`](Self::resolve), but with `confirm_chance` probability
    /// the decision is parked and the caller is asked to confirm it instead.
    /// A parked decision leaves `position` and `decisions` untouched.
    pub fn propose(
        &mut self,
        decision: Decision,
        confirm_chance: f64,
        rng: &mut impl Rng,
    ) -> Result<Proposal, SessionError> {
        if self.is_complete() {
            return Err(SessionError::SessionComplete);
        }
        let chance = confirm_chance.clamp(0.0, 1.0);
        if chance > 0.0 && rng.gen_bool(chance) {
            self.pending = Some(decision);
            let card_id = self.order[self.position].clone();
            return Ok(Proposal::NeedsConfirmation { card_id, decision });
        }
        self.resolve(decision).map(Proposal::Resolved)
    }

    /// Apply the parked decision.
    pub fn confirm(&mut self) -> Result<Resolved, SessionError> {
        let decision = self.pending.ok_or(SessionError::NoPendingDecision)?;
        self.resolve(decision)
    }

    /// Drop the parked decision; the current card stays up for rating.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Accepted/rejected card lists in catalog order. Pure read, valid at
    /// any point mid-session, so an exited session can show partial results
    /// and later resume by simply resolving again.
    pub fn summary(&self, catalog: &Catalog) -> Summary {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for card in catalog.cards() {
            match self.decisions.get(&card.id) {
                Some(Decision::Accept) => accepted.push(card.clone()),
                Some(Decision::Reject) => rejected.push(card.clone()),
                None => {}
            }
        }
        Summary {
            accepted,
            rejected,
            total_resolved: self.decisions.len(),
        }
    }

    /// Up to `size` cards drawn uniformly without replacement from the
    /// cards decided as `outcome`. An undersized pool is returned whole;
    /// an empty pool yields an empty deck rather than an error.
    pub fn sample_deck(
        &self,
        catalog: &Catalog,
        outcome: Decision,
        size: usize,
        rng: &mut impl Rng,
    ) -> Vec<Card> {
        let pool: Vec<&Card> = catalog
            .cards()
            .iter()
            .filter(|c| self.decisions.get(&c.id) == Some(&outcome))
            .collect();
        pool.choose_multiple(rng, size)
            .map(|c| (*c).clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::catalog::Rarity;

    fn card(id: &str, pinned: bool) -> Card {
        Card {
            id: id.to_string(),
            name: id.to_string(),
            image_url: format!("/images/{id}.png"),
            rarity: Rarity::Common,
            elixir: 3,
            description: String::new(),
            pinned_early: pinned,
        }
    }

    fn catalog_of(n: usize, pinned: &[usize]) -> Catalog {
        let cards = (0..n)
            .map(|i| card(&format!("card-{i}"), pinned.contains(&i)))
            .collect();
        Catalog::from_cards(cards).unwrap()
    }

    #[test]
    fn order_is_a_permutation_of_the_catalog() {
        let catalog = catalog_of(40, &[7]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let session = Session::start(&catalog, 25, &mut rng).unwrap();
            assert_eq!(session.order.len(), catalog.len());
            let unique: HashSet<&String> = session.order.iter().collect();
            assert_eq!(unique.len(), catalog.len());
            for c in catalog.cards() {
                assert!(unique.contains(&c.id));
            }
        }
    }

    #[test]
    fn pinned_card_lands_inside_the_window() {
        let catalog = catalog_of(60, &[13]);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let session = Session::start(&catalog, 25, &mut rng).unwrap();
            let index = session.order.iter().position(|id| id == "card-13").unwrap();
            assert!(index < 25, "seed {seed}: pinned card at {index}");
        }
    }

    #[test]
    fn every_pinned_card_lands_inside_the_window() {
        let catalog = catalog_of(60, &[3, 14, 59]);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let session = Session::start(&catalog, 25, &mut rng).unwrap();
            for pinned in ["card-3", "card-14", "card-59"] {
                let index = session.order.iter().position(|id| id == pinned).unwrap();
                assert!(index < 25, "seed {seed}: {pinned} at {index}");
            }
        }
    }

    #[test]
    fn pins_fill_a_tight_window_without_displacing_each_other() {
        // Window exactly as wide as the pin count: the pins must occupy the
        // first three slots, whatever order the draws came out in.
        let catalog = catalog_of(10, &[0, 5, 9]);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let session = Session::start(&catalog, 3, &mut rng).unwrap();
            for pinned in ["card-0", "card-5", "card-9"] {
                let index = session.order.iter().position(|id| id == pinned).unwrap();
                assert!(index < 3, "seed {seed}: {pinned} at {index}");
            }
        }
    }

    #[test]
    fn window_shrinks_to_a_small_catalog() {
        let catalog = catalog_of(3, &[0]);
        let mut rng = StdRng::seed_from_u64(1);
        let session = Session::start(&catalog, 25, &mut rng).unwrap();
        assert_eq!(session.order.len(), 3);
    }

    #[test]
    fn empty_catalog_fails_at_start() {
        let catalog = Catalog::from_cards(vec![]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            Session::start(&catalog, 25, &mut rng).unwrap_err(),
            SessionError::EmptyCatalog
        );
    }

    #[test]
    fn resolve_advances_exactly_once_per_call() {
        let catalog = catalog_of(5, &[]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = Session::start(&catalog, 25, &mut rng).unwrap();

        for step in 0..5 {
            assert_eq!(session.position(), step);
            // Every passed card has a decision, no future card does.
            assert_eq!(session.decisions.len(), step);
            let current = session.current_card(&catalog).unwrap().id.clone();
            assert!(!session.decisions.contains_key(&current));
            session.resolve(Decision::Accept).unwrap();
        }

        assert!(session.is_complete());
        assert_eq!(session.decisions.len(), 5);
        assert_eq!(
            session.resolve(Decision::Reject).unwrap_err(),
            SessionError::SessionComplete
        );
    }

    #[test]
    fn full_playthrough_of_three_cards() {
        let catalog =
            Catalog::from_cards(vec![card("a", false), card("b", false), card("c", false)])
                .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = Session::start(&catalog, 25, &mut rng).unwrap();

        // Resolve by whatever order the shuffle produced: a:accept,
        // b:reject, c:accept.
        for _ in 0..3 {
            let id = session.current_card(&catalog).unwrap().id.clone();
            let decision = if id == "b" {
                Decision::Reject
            } else {
                Decision::Accept
            };
            session.resolve(decision).unwrap();
        }

        assert!(session.is_complete());
        let summary = session.summary(&catalog);
        let accepted: Vec<&str> = summary.accepted.iter().map(|c| c.id.as_str()).collect();
        let rejected: Vec<&str> = summary.rejected.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(accepted, ["a", "c"]);
        assert_eq!(rejected, ["b"]);
        assert_eq!(summary.total_resolved, 3);
    }

    #[test]
    fn summary_is_idempotent() {
        let catalog = catalog_of(6, &[]);
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = Session::start(&catalog, 25, &mut rng).unwrap();
        session.resolve(Decision::Accept).unwrap();
        session.resolve(Decision::Reject).unwrap();

        let first = session.summary(&catalog);
        let second = session.summary(&catalog);
        let ids = |cards: &[Card]| cards.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first.accepted), ids(&second.accepted));
        assert_eq!(ids(&first.rejected), ids(&second.rejected));
        assert_eq!(first.total_resolved, second.total_resolved);
    }

    #[test]
    fn lookahead_is_a_window_over_upcoming_cards() {
        let catalog = catalog_of(5, &[]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = Session::start(&catalog, 25, &mut rng).unwrap();

        assert_eq!(session.lookahead(3), &session.order[1..4]);
        session.resolve(Decision::Accept).unwrap();
        assert_eq!(session.lookahead(3), &session.order[2..5]);
        // Window shrinks near the end and empties at the terminal state.
        session.resolve(Decision::Accept).unwrap();
        session.resolve(Decision::Accept).unwrap();
        assert_eq!(session.lookahead(3), &session.order[4..5]);
        session.resolve(Decision::Accept).unwrap();
        session.resolve(Decision::Accept).unwrap();
        assert!(session.lookahead(3).is_empty());
    }

    #[test]
    fn deck_sampling_stays_inside_the_pool() {
        let catalog = catalog_of(20, &[]);
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = Session::start(&catalog, 25, &mut rng).unwrap();
        for i in 0..20 {
            let decision = if i < 12 {
                Decision::Accept
            } else {
                Decision::Reject
            };
            session.resolve(decision).unwrap();
        }

        let deck = session.sample_deck(&catalog, Decision::Accept, DECK_SIZE, &mut rng);
        assert_eq!(deck.len(), 8);
        let unique: HashSet<&str> = deck.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(unique.len(), 8, "no duplicates");
        for c in &deck {
            assert_eq!(session.decisions.get(&c.id), Some(&Decision::Accept));
        }

        // Undersized pool comes back whole; empty pool comes back empty.
        let rejects = session.sample_deck(&catalog, Decision::Reject, DECK_SIZE, &mut rng);
        assert_eq!(rejects.len(), 8);
        let fresh_catalog = catalog_of(4, &[]);
        let mut fresh = Session::start(&fresh_catalog, 25, &mut rng).unwrap();
        assert!(fresh
            .sample_deck(&fresh_catalog, Decision::Accept, DECK_SIZE, &mut rng)
            .is_empty());
        fresh.resolve(Decision::Accept).unwrap();
        let small = fresh.sample_deck(&fresh_catalog, Decision::Accept, DECK_SIZE, &mut rng);
        assert_eq!(small.len(), 1);
    }

    #[test]
    fn confirmation_parks_the_decision() {
        let catalog = catalog_of(3, &[]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = Session::start(&catalog, 25, &mut rng).unwrap();

        // chance 1.0 always interrupts; chance 0.0 never does.
        let proposal = session.propose(Decision::Reject, 1.0, &mut rng).unwrap();
        assert!(matches!(proposal, Proposal::NeedsConfirmation { .. }));
        assert_eq!(session.position(), 0);
        assert!(session.decisions.is_empty());
        assert_eq!(session.pending(), Some(Decision::Reject));

        let resolved = session.confirm().unwrap();
        assert_eq!(resolved.decision, Decision::Reject);
        assert_eq!(session.position(), 1);
        assert!(session.pending().is_none());

        let proposal = session.propose(Decision::Accept, 1.0, &mut rng).unwrap();
        assert!(matches!(proposal, Proposal::NeedsConfirmation { .. }));
        session.cancel();
        assert_eq!(session.confirm().unwrap_err(), SessionError::NoPendingDecision);
        assert_eq!(session.position(), 1);

        match session.propose(Decision::Accept, 0.0, &mut rng).unwrap() {
            Proposal::Resolved(r) => assert_eq!(r.decision, Decision::Accept),
            Proposal::NeedsConfirmation { .. } => panic!("chance 0 must not interrupt"),
        }
    }
}
