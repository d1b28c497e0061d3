//! Human and JSON renderings of command results

use anyhow::Result;
use relay_lens_core::{
    ContactProfile, Identity, InteractionScore, PublishReceipt, RelaySet, UserProfile,
    scoring::ranked,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Write;

use crate::comparison::ComparisonData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    pub fn profile(self, profile: &UserProfile) -> Result<String> {
        if self == OutputFormat::Json {
            return Self::json(profile);
        }

        let mut out = String::new();
        writeln!(out, "👤 {}", profile.label())?;
        writeln!(out, "  npub:        {}", profile.npub)?;
        writeln!(out, "  pubkey:      {}", profile.pubkey)?;
        if let Some(display_name) = &profile.display_name {
            writeln!(out, "  Display name: {}", display_name)?;
        }
        if let Some(about) = &profile.about {
            writeln!(out, "  About:       {}", about)?;
        }
        if let Some(picture) = &profile.picture {
            writeln!(out, "  Picture:     {}", picture)?;
        }
        writeln!(out, "  Following:   {}", profile.contacts_count)?;
        match profile.last_updated_display() {
            Some(at) => writeln!(out, "  Last updated: {}", at)?,
            None => writeln!(out, "  Last updated: never")?,
        }
        Ok(out)
    }

    pub fn relays(self, identity: &Identity, relays: &RelaySet) -> Result<String> {
        if self == OutputFormat::Json {
            return Self::json(&json!({ "pubkey": identity, "relays": relays }));
        }

        let mut out = String::new();
        writeln!(out, "📡 Relays for {} ({}):", identity.short(), relays.len())?;
        for relay in relays {
            writeln!(out, "  {}", relay)?;
        }
        Ok(out)
    }

    pub fn contacts(self, contacts: &[Identity]) -> Result<String> {
        if self == OutputFormat::Json {
            return Self::json(contacts);
        }

        let mut out = String::new();
        writeln!(out, "👥 Following {} accounts:", contacts.len())?;
        for contact in contacts {
            writeln!(out, "  {}", contact.npub().unwrap_or_else(|_| contact.to_string()))?;
        }
        Ok(out)
    }

    pub fn contact_profiles(self, profiles: &[ContactProfile]) -> Result<String> {
        if self == OutputFormat::Json {
            return Self::json(profiles);
        }

        let mut out = String::new();
        writeln!(out, "👥 Following {} accounts:", profiles.len())?;
        for profile in profiles {
            match &profile.name {
                Some(name) => writeln!(out, "  {:<24} {}", name, profile.npub)?,
                None => writeln!(out, "  {:<24} {}", "(no profile)", profile.npub)?,
            }
        }
        Ok(out)
    }

    /// Scores ranked highest first, cut to `top` entries when given
    pub fn scores(
        self,
        scores: &HashMap<Identity, InteractionScore>,
        names: &HashMap<Identity, String>,
        window_days: u32,
        top: Option<usize>,
    ) -> Result<String> {
        let ranked: Vec<&InteractionScore> = ranked(scores)
            .into_iter()
            .map(|(_, score)| score)
            .take(top.unwrap_or(usize::MAX))
            .collect();

        if self == OutputFormat::Json {
            return Self::json(&ranked);
        }

        let mut out = String::new();
        writeln!(out, "📊 Interaction scores (last {} days):", window_days)?;
        writeln!(
            out,
            "  {:<24} {:>6} {:>8} {:>10} {:>8} {:>6}",
            "contact", "score", "replies", "reactions", "reposts", "zaps"
        )?;
        for score in ranked {
            let label = names
                .get(&score.pubkey)
                .map(String::as_str)
                .unwrap_or_else(|| score.pubkey.short());
            writeln!(
                out,
                "  {:<24} {:>6} {:>8} {:>10} {:>8} {:>6}",
                label, score.score, score.replies, score.reactions, score.reposts, score.zaps
            )?;
        }
        Ok(out)
    }

    pub fn comparison(self, data: &ComparisonData) -> Result<String> {
        let overlap = data.overlap();
        if self == OutputFormat::Json {
            return Self::json(&json!({ "comparison": data, "overlap": overlap }));
        }

        let mut out = String::new();
        writeln!(
            out,
            "🔍 {} vs {}",
            data.current_user.label(),
            data.target_user.label()
        )?;
        writeln!(
            out,
            "  Following:     {} / {}",
            data.current_user.contacts_count, data.target_user.contacts_count
        )?;
        writeln!(out, "  Mutual:        {}", overlap.mutual.len())?;
        writeln!(out, "  Only {}: {}", data.current_user.label(), overlap.only_current.len())?;
        writeln!(out, "  Only {}: {}", data.target_user.label(), overlap.only_target.len())?;
        writeln!(
            out,
            "  {} follows {}: {}",
            data.current_user.label(),
            data.target_user.label(),
            if data.follows_target() { "yes" } else { "no" }
        )?;
        Ok(out)
    }

    pub fn receipt(self, receipt: &PublishReceipt, contacts: usize) -> Result<String> {
        if self == OutputFormat::Json {
            return Self::json(&json!({ "receipt": receipt, "contacts": contacts }));
        }

        Ok(format!(
            "✅ Published contact list ({} contacts) as {}\n  Accepted by {} ({} relays attempted)\n",
            contacts, receipt.event_id, receipt.relay, receipt.attempted
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";

    #[test]
    fn test_profile_human_and_json() {
        let profile = UserProfile::identity_only(&Identity::parse(ALICE).unwrap());

        let human = OutputFormat::Human.profile(&profile).unwrap();
        assert!(human.contains("Following:   0"));
        assert!(human.contains("Last updated: never"));

        let json: serde_json::Value =
            serde_json::from_str(&OutputFormat::Json.profile(&profile).unwrap()).unwrap();
        assert_eq!(json["pubkey"], ALICE);
        assert_eq!(json["contactsCount"], 0);
    }

    #[test]
    fn test_scores_respect_top() {
        let alice = Identity::parse(ALICE).unwrap();
        let bob = Identity::from(nostr_sdk::Keys::generate().public_key());
        let mut scores = HashMap::new();
        for (identity, score) in [(&alice, 3), (&bob, 7)] {
            scores.insert(
                identity.clone(),
                InteractionScore {
                    pubkey: identity.clone(),
                    score,
                    replies: 0,
                    reactions: score,
                    reposts: 0,
                    zaps: 0,
                },
            );
        }

        let json: serde_json::Value = serde_json::from_str(
            &OutputFormat::Json
                .scores(&scores, &HashMap::new(), 30, Some(1))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["score"], 7);

        let names = HashMap::from([(alice.clone(), "alice".to_string())]);
        let human = OutputFormat::Human.scores(&scores, &names, 30, None).unwrap();
        assert!(human.contains("alice"));
        assert!(human.find(bob.short()).unwrap() < human.find("alice").unwrap());
    }
}
