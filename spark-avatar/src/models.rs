use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// One entry of the bulk lookup body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarLookupItem {
    pub uuid: String,
    pub sizes: Vec<u32>,
}

/// An avatar image as reported by the avatar service.
///
/// `size` is the actual size of the image and may differ from the size it
/// was listed under in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRecord {
    pub size: u32,
    pub url: String,
}

/// Available sizes for a single user, keyed by size.
pub type AvatarSizes = BTreeMap<u32, AvatarRecord>;

/// Bulk lookup response, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarLookupResponse(pub HashMap<String, AvatarSizes>);

impl AvatarLookupResponse {
    pub fn sizes_for(&self, user_id: &str) -> Option<&AvatarSizes> {
        self.0.get(user_id)
    }
}

/// Builds the deduplicated lookup body for a set of `(user_id, size)` pairs.
///
/// Users and sizes come out sorted so the payload is stable for a given set
/// of requests.
pub fn lookup_items<'a>(requests: impl IntoIterator<Item = (&'a str, u32)>) -> Vec<AvatarLookupItem> {
    let mut by_user: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for (user_id, size) in requests {
        by_user.entry(user_id).or_default().insert(size);
    }

    by_user
        .into_iter()
        .map(|(uuid, sizes)| AvatarLookupItem {
            uuid: uuid.to_string(),
            sizes: sizes.into_iter().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_size_keys_are_parsed_from_strings() {
        let body = r#"{
            "88888888-4444-4444-4444-aaaaaaaaaaa0": {
                "35": {"size": 40, "url": "https://example.com/a0--40"}
            }
        }"#;

        let response: AvatarLookupResponse = serde_json::from_str(body).unwrap();
        let sizes = response
            .sizes_for("88888888-4444-4444-4444-aaaaaaaaaaa0")
            .unwrap();

        assert_eq!(sizes[&35].size, 40);
        assert_eq!(sizes[&35].url, "https://example.com/a0--40");
    }

    #[test]
    fn lookup_items_merge_sizes_per_user() {
        let items = lookup_items([("b", 110), ("a", 40), ("b", 40), ("b", 110)]);

        assert_eq!(
            items,
            vec![
                AvatarLookupItem {
                    uuid: "a".to_string(),
                    sizes: vec![40],
                },
                AvatarLookupItem {
                    uuid: "b".to_string(),
                    sizes: vec![40, 110],
                },
            ]
        );
    }

    #[test]
    fn lookup_item_serializes_to_wire_shape() {
        let item = AvatarLookupItem {
            uuid: "a".to_string(),
            sizes: vec![80],
        };

        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            serde_json::json!({"uuid": "a", "sizes": [80]})
        );
    }
}
