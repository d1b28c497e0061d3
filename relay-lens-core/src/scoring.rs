//! Interaction scoring
//!
//! Scores how much a viewer interacts with each of their contacts over a
//! trailing window:
//!
//! | interaction               | weight     |
//! |---------------------------|------------|
//! | reaction to their note    | 1          |
//! | repost of their note      | 3          |
//! | zap to them (whole units) | 1 per 10   |
//! | note tagging them         | 4          |
//!
//! Arithmetic is done in tenths so the zap weight stays exact, and the
//! total is rounded half up.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::{
    Event, Filter, Identity, Kind, QueryExecutor, RelayResolver,
    decode::{Reaction, Repost, TextNote, ZapReceipt, decode_all},
    error::{Error, Result},
    query::AUTHORS_PER_QUERY,
};

pub const REACTION_WEIGHT: u64 = 1;
pub const REPOST_WEIGHT: u64 = 3;
pub const REPLY_WEIGHT: u64 = 4;
/// Zap units per score point
pub const ZAP_DIVISOR: u64 = 10;

const SECONDS_PER_DAY: u64 = 86_400;

/// Per-contact interaction counters and their weighted score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionScore {
    pub pubkey: Identity,
    pub score: u64,
    pub replies: u64,
    pub reactions: u64,
    pub reposts: u64,
    /// Total zapped, in whole units
    pub zaps: u64,
}

impl InteractionScore {
    fn empty(contact: &Identity) -> Self {
        InteractionScore {
            pubkey: contact.clone(),
            score: 0,
            replies: 0,
            reactions: 0,
            reposts: 0,
            zaps: 0,
        }
    }

    fn finish(mut self) -> Self {
        self.score = weighted_score(self.replies, self.reactions, self.reposts, self.zaps);
        self
    }
}

/// `round_half_up(reactions + reposts·3 + zaps/10 + replies·4)`
pub fn weighted_score(replies: u64, reactions: u64, reposts: u64, zaps: u64) -> u64 {
    let tenths = reactions
        .saturating_mul(REACTION_WEIGHT * ZAP_DIVISOR)
        .saturating_add(reposts.saturating_mul(REPOST_WEIGHT * ZAP_DIVISOR))
        .saturating_add(replies.saturating_mul(REPLY_WEIGHT * ZAP_DIVISOR))
        .saturating_add(zaps);
    tenths.saturating_add(ZAP_DIVISOR / 2) / ZAP_DIVISOR
}

/// Raw interaction events gathered for one scoring run
#[derive(Debug, Default, Clone)]
pub struct InteractionEvents {
    /// Viewer's notes tagging contacts
    pub mentions: Vec<Event>,
    /// Viewer's reactions
    pub reactions: Vec<Event>,
    /// Viewer's reposts
    pub reposts: Vec<Event>,
    /// Zap receipts tagging contacts
    pub zaps: Vec<Event>,
    /// Contacts' own notes, used to attribute reactions and reposts
    pub contact_notes: Vec<Event>,
}

/// Count interactions per contact; pure and total over `contacts`
pub fn tally(
    viewer: &Identity,
    contacts: &[Identity],
    events: &InteractionEvents,
) -> HashMap<Identity, InteractionScore> {
    let mut scores: HashMap<Identity, InteractionScore> = contacts
        .iter()
        .map(|contact| (contact.clone(), InteractionScore::empty(contact)))
        .collect();

    let mut seen_mentions = HashSet::new();
    for note in decode_all::<TextNote, _>(&events.mentions) {
        if note.author != *viewer || !seen_mentions.insert(note.id.clone()) {
            continue;
        }
        for mentioned in &note.mentions {
            if let Some(score) = scores.get_mut(mentioned) {
                score.replies += 1;
            }
        }
    }

    // Only notes written by a contact can attribute an interaction to them
    let authors: HashMap<String, Identity> = decode_all::<TextNote, _>(&events.contact_notes)
        .into_iter()
        .filter(|note| scores.contains_key(&note.author))
        .map(|note| (note.id, note.author))
        .collect();

    for reaction in decode_all::<Reaction, _>(&events.reactions) {
        if reaction.author != *viewer {
            continue;
        }
        match authors.get(&reaction.target).and_then(|a| scores.get_mut(a)) {
            Some(score) => score.reactions += 1,
            None => debug!("Reaction to untracked event {}", reaction.target),
        }
    }

    for repost in decode_all::<Repost, _>(&events.reposts) {
        if repost.author != *viewer {
            continue;
        }
        match authors.get(&repost.target).and_then(|a| scores.get_mut(a)) {
            Some(score) => score.reposts += 1,
            None => debug!("Repost of untracked event {}", repost.target),
        }
    }

    for zap in decode_all::<ZapReceipt, _>(&events.zaps) {
        if zap.sender.as_ref() != Some(viewer) {
            continue;
        }
        for recipient in &zap.recipients {
            if let Some(score) = scores.get_mut(recipient) {
                score.zaps = score.zaps.saturating_add(zap.amount);
            }
        }
    }

    scores
        .into_iter()
        .map(|(contact, score)| (contact, score.finish()))
        .collect()
}

/// Fetches interaction events and scores them
#[derive(Clone)]
pub struct ScoringEngine {
    executor: QueryExecutor,
    resolver: RelayResolver,
}

impl ScoringEngine {
    pub fn new(executor: QueryExecutor, resolver: RelayResolver) -> Self {
        ScoringEngine { executor, resolver }
    }

    /// Score every contact over the last `window_days` days
    pub async fn score(
        &self,
        viewer: &Identity,
        contacts: &[Identity],
        window_days: u32,
    ) -> Result<HashMap<Identity, InteractionScore>> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.score_at(viewer, contacts, window_days, now).await
    }

    /// Like [`ScoringEngine::score`] with an explicit "now"
    pub async fn score_at(
        &self,
        viewer: &Identity,
        contacts: &[Identity],
        window_days: u32,
        now: u64,
    ) -> Result<HashMap<Identity, InteractionScore>> {
        if window_days == 0 {
            return Err(Error::InvalidInput("window must be at least one day".to_string()));
        }
        if contacts.is_empty() {
            return Ok(HashMap::new());
        }

        let since = now.saturating_sub(u64::from(window_days) * SECONDS_PER_DAY);
        let relays = self.resolver.relays_for(viewer).await;
        let window = Filter::new().since(since).until(now);

        let mentions = per_chunk(contacts, |chunk| {
            window.clone().author(viewer).kind(Kind::TextNote).pubkeys(chunk)
        });
        let reactions = window.clone().author(viewer).kind(Kind::Reaction);
        let reposts = window.clone().author(viewer).kind(Kind::Repost);
        let zaps = per_chunk(contacts, |chunk| {
            window.clone().kind(Kind::ZapReceipt).pubkeys(chunk)
        });
        let contact_notes = per_chunk(contacts, |chunk| {
            window.clone().authors(chunk).kind(Kind::TextNote)
        });

        let (mentions, reactions, reposts, zaps, contact_notes) = tokio::join!(
            self.executor.query_all(&relays, &mentions),
            self.executor.query(&relays, &reactions),
            self.executor.query(&relays, &reposts),
            self.executor.query_all(&relays, &zaps),
            self.executor.query_all(&relays, &contact_notes),
        );

        let events = InteractionEvents {
            mentions: mentions.into_vec(),
            reactions: reactions.into_vec(),
            reposts: reposts.into_vec(),
            zaps: zaps.into_vec(),
            contact_notes: contact_notes.into_vec(),
        };
        let scores = tally(viewer, contacts, &events);

        info!(
            "Scored {} contacts of {} over {} days ({} relays)",
            scores.len(),
            viewer.short(),
            window_days,
            relays.len()
        );
        Ok(scores)
    }
}

/// One filter per slice of contacts small enough for a relay to accept
fn per_chunk<F>(contacts: &[Identity], build: F) -> Vec<Filter>
where
    F: Fn(&[Identity]) -> Filter,
{
    contacts.chunks(AUTHORS_PER_QUERY).map(build).collect()
}

/// Scores sorted by score (highest first), then by pubkey
pub fn ranked(scores: &HashMap<Identity, InteractionScore>) -> Vec<(&Identity, &InteractionScore)> {
    let mut ranked: Vec<_> = scores.iter().collect();
    ranked.sort_by(|(a_key, a), (b_key, b)| b.score.cmp(&a.score).then_with(|| a_key.cmp(b_key)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventBuilder;
    use serde_json::json;

    const VIEWER: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";
    const BOB: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const CAROL: &str = "32e1827635450ebb3c5a7d12c1f8e7b2b514439ac10a67eef3d9fd9c5c68e245";

    fn id(hex: &str) -> Identity {
        Identity::parse(hex).unwrap()
    }

    fn event(id: &str, author: &str, kind: Kind) -> EventBuilder {
        EventBuilder::new().id(id).pubkey(author).kind(kind).created_at(100)
    }

    fn zap(id: &str, sender: &str, recipient: &str, msats: u64) -> Event {
        let request = json!({
            "pubkey": sender,
            "created_at": 99,
            "kind": 9734,
            "tags": [["p", recipient], ["amount", msats.to_string()]],
            "content": ""
        });
        event(id, CAROL, Kind::ZapReceipt)
            .p_tag(recipient)
            .add_tag(vec!["description".to_string(), request.to_string()])
            .build()
    }

    #[test]
    fn test_weighted_score_example() {
        // 3 + 1·3 + 50/10 + 2·4 = 19
        assert_eq!(weighted_score(2, 3, 1, 50), 19);
    }

    #[test]
    fn test_weighted_score_rounds_half_up() {
        assert_eq!(weighted_score(0, 0, 0, 5), 1);
        assert_eq!(weighted_score(0, 0, 0, 4), 0);
        assert_eq!(weighted_score(0, 0, 0, 15), 2);
        assert_eq!(weighted_score(0, 0, 0, 0), 0);
        assert_eq!(weighted_score(u64::MAX, u64::MAX, 0, u64::MAX), u64::MAX / 10);
    }

    #[test]
    fn test_tally_is_total_over_contacts() {
        let contacts = vec![id(BOB), id(CAROL)];
        let scores = tally(&id(VIEWER), &contacts, &InteractionEvents::default());

        assert_eq!(scores.len(), 2);
        for contact in &contacts {
            let score = &scores[contact];
            assert_eq!(&score.pubkey, contact);
            assert_eq!(score.score, 0);
        }
    }

    #[test]
    fn test_tally_attributes_every_category() {
        let events = InteractionEvents {
            mentions: vec![
                event("m1", VIEWER, Kind::TextNote).p_tag(BOB).p_tag(CAROL).build(),
                event("m2", VIEWER, Kind::TextNote).p_tag(BOB).p_tag(BOB).build(),
                // Duplicate delivery of m2 is counted once
                event("m2", VIEWER, Kind::TextNote).p_tag(BOB).build(),
            ],
            reactions: vec![
                event("r1", VIEWER, Kind::Reaction).e_tag("bob-note-1").build(),
                event("r2", VIEWER, Kind::Reaction).e_tag("bob-note-2").build(),
                event("r3", VIEWER, Kind::Reaction).e_tag("bob-note-2").build(),
                event("r4", VIEWER, Kind::Reaction).e_tag("someone-else").build(),
            ],
            reposts: vec![event("s1", VIEWER, Kind::Repost).e_tag("bob-note-1").build()],
            zaps: vec![
                zap("z1", VIEWER, BOB, 30_000),
                zap("z2", VIEWER, BOB, 20_999),
                zap("z3", CAROL, BOB, 1_000_000),
            ],
            contact_notes: vec![
                event("bob-note-1", BOB, Kind::TextNote).build(),
                event("bob-note-2", BOB, Kind::TextNote).build(),
            ],
        };

        let scores = tally(&id(VIEWER), &[id(BOB), id(CAROL)], &events);

        let bob = &scores[&id(BOB)];
        assert_eq!(bob.replies, 2);
        assert_eq!(bob.reactions, 3);
        assert_eq!(bob.reposts, 1);
        assert_eq!(bob.zaps, 50);
        assert_eq!(bob.score, 19);

        let carol = &scores[&id(CAROL)];
        assert_eq!(carol.replies, 1);
        assert_eq!(carol.score, 4);
    }

    #[test]
    fn test_ranked_orders_by_score() {
        let mut scores = HashMap::new();
        scores.insert(id(BOB), InteractionScore { score: 1, ..InteractionScore::empty(&id(BOB)) });
        scores.insert(id(CAROL), InteractionScore { score: 9, ..InteractionScore::empty(&id(CAROL)) });

        let order: Vec<&Identity> = ranked(&scores).into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec![&id(CAROL), &id(BOB)]);
    }
}
