//! Side-by-side view of two identities and their contact sets

use relay_lens_core::{Identity, UserProfile};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonData {
    pub current_user: UserProfile,
    pub current_user_contacts: Vec<Identity>,
    pub target_user: UserProfile,
    pub target_user_contacts: Vec<Identity>,
}

/// Contact overlap, each list in the order of the side it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub mutual: Vec<Identity>,
    pub only_current: Vec<Identity>,
    pub only_target: Vec<Identity>,
}

impl ComparisonData {
    pub fn new(
        current_user: UserProfile,
        current_user_contacts: Vec<Identity>,
        target_user: UserProfile,
        target_user_contacts: Vec<Identity>,
    ) -> Self {
        Self {
            current_user,
            current_user_contacts,
            target_user,
            target_user_contacts,
        }
    }

    pub fn overlap(&self) -> Overlap {
        let current: HashSet<&Identity> = self.current_user_contacts.iter().collect();
        let target: HashSet<&Identity> = self.target_user_contacts.iter().collect();

        let mutual = self
            .current_user_contacts
            .iter()
            .filter(|c| target.contains(c))
            .cloned()
            .collect();
        let only_current = self
            .current_user_contacts
            .iter()
            .filter(|c| !target.contains(c))
            .cloned()
            .collect();
        let only_target = self
            .target_user_contacts
            .iter()
            .filter(|c| !current.contains(c))
            .cloned()
            .collect();

        Overlap {
            mutual,
            only_current,
            only_target,
        }
    }

    /// Whether the current user already follows the target
    pub fn follows_target(&self) -> bool {
        self.current_user_contacts.contains(&self.target_user.pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";
    const BOB: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const CAROL: &str = "32e1827635450ebb3c5a7d12c1f8e7b2b514439ac10a67eef3d9fd9c5c68e245";
    const DAVE: &str = "614a695bab54e8dc98946abdb8ec019599ece6dada0c23890977d0fa128081d6";

    fn id(hex: &str) -> Identity {
        Identity::parse(hex).unwrap()
    }

    #[test]
    fn test_overlap() {
        let data = ComparisonData::new(
            UserProfile::identity_only(&id(ALICE)),
            vec![id(BOB), id(CAROL)],
            UserProfile::identity_only(&id(BOB)),
            vec![id(DAVE), id(CAROL)],
        );

        let overlap = data.overlap();
        assert_eq!(overlap.mutual, vec![id(CAROL)]);
        assert_eq!(overlap.only_current, vec![id(BOB)]);
        assert_eq!(overlap.only_target, vec![id(DAVE)]);
        assert!(data.follows_target());
    }

    #[test]
    fn test_serializes_camel_case() {
        let data = ComparisonData::new(
            UserProfile::identity_only(&id(ALICE)),
            vec![],
            UserProfile::identity_only(&id(BOB)),
            vec![id(ALICE)],
        );
        let json = serde_json::to_value(&data).unwrap();

        assert_eq!(json["targetUserContacts"][0], ALICE);
        assert!(json["currentUserContacts"].as_array().unwrap().is_empty());
        assert!(!data.follows_target());
    }
}
