//! Property tests: feed set operations agree with `BTreeSet` on entry ids.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use feedset::feed::{Entry, Feed, FeedParts};
use proptest::prelude::*;

fn feed_of(title: &str, ids: &BTreeSet<u8>) -> Feed {
    Feed::from_parts(FeedParts {
        id: Some(format!("urn:test:{}", title)),
        title: Some(title.to_string()),
        updated: Some(Utc::now()),
        author: Some("tester".to_string()),
        entries: Some(
            ids.iter()
                .map(|id| Arc::new(Entry::new(id.to_string())))
                .collect(),
        ),
    })
    .unwrap()
}

fn ids(feed: &Feed) -> BTreeSet<u8> {
    feed.entries()
        .iter()
        .map(|entry| entry.id.parse().unwrap())
        .collect()
}

fn id_set() -> impl Strategy<Value = BTreeSet<u8>> {
    prop::collection::btree_set(0u8..24, 0..12)
}

proptest! {
    #[test]
    fn binary_operations_match_btreeset(a in id_set(), b in id_set()) {
        let (fa, fb) = (feed_of("A", &a), feed_of("B", &b));

        prop_assert_eq!(ids(&(&fa | &fb)), a.union(&b).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(ids(&(&fa & &fb)), a.intersection(&b).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(ids(&(&fa - &fb)), a.difference(&b).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(
            ids(&(&fa ^ &fb)),
            a.symmetric_difference(&b).copied().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn comparisons_match_btreeset(a in id_set(), b in id_set()) {
        let (fa, fb) = (feed_of("A", &a), feed_of("B", &b));

        prop_assert_eq!(fa.len(), a.len());
        prop_assert_eq!(fa.issubset(&fb), a.is_subset(&b));
        prop_assert_eq!(fa.issuperset(&fb), a.is_superset(&b));
        prop_assert_eq!(fa.isdisjoint(&fb), a.is_disjoint(&b));
        prop_assert_eq!(fa <= fb, a.is_subset(&b));
        prop_assert_eq!(fa < fb, a.is_subset(&b) && a != b);
        prop_assert_eq!(fa >= fb, a.is_superset(&b));
        prop_assert_eq!(fa > fb, a.is_superset(&b) && a != b);
        prop_assert_eq!(fa == fb, a == b);
    }

    #[test]
    fn n_ary_union_intersection(a in id_set(), b in id_set(), c in id_set()) {
        let (fa, fb, fc) = (feed_of("A", &a), feed_of("B", &b), feed_of("C", &c));

        let union: BTreeSet<u8> = a.iter().chain(&b).chain(&c).copied().collect();
        prop_assert_eq!(ids(&fa.union(&[&fb, &fc])), union);

        let common: BTreeSet<u8> = a.iter().filter(|&id| b.contains(id) && c.contains(id)).copied().collect();
        prop_assert_eq!(ids(&fa.intersection(&[&fb, &fc])), common);

        let rest: BTreeSet<u8> = a.iter().filter(|&id| !b.contains(id) && !c.contains(id)).copied().collect();
        prop_assert_eq!(ids(&fa.difference(&[&fb, &fc])), rest);
    }
}
