//! Display ordering

use std::collections::HashMap;

use crate::record::AlertRecord;

/// Oldest alerts first, UID breaking ties
pub fn order(records: HashMap<String, AlertRecord>) -> Vec<AlertRecord> {
    let mut sorted: Vec<AlertRecord> = records.into_values().collect();
    sorted.sort_by(|a, b| {
        a.earliest_time
            .cmp(&b.earliest_time)
            .then_with(|| a.uid.cmp(&b.uid))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(uid: &str, time: &str) -> AlertRecord {
        AlertRecord {
            uid: uid.into(),
            account: String::new(),
            hostname: String::new(),
            location: String::new(),
            source_name: String::new(),
            earliest_time: time.into(),
            services: vec!["ping".into()],
            silenced: false,
        }
    }

    fn keyed(records: Vec<AlertRecord>) -> HashMap<String, AlertRecord> {
        records.into_iter().map(|r| (r.uid.clone(), r)).collect()
    }

    #[test]
    fn test_orders_by_time_then_uid() {
        let sorted = order(keyed(vec![
            record("zeta", "2024-01-01 09:00:00"),
            record("beta", "2024-01-01 10:00:00"),
            record("alpha", "2024-01-01 10:00:00"),
            record("gamma", "2023-12-31 23:59:59"),
        ]));

        let uids: Vec<_> = sorted.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, vec!["gamma", "zeta", "alpha", "beta"]);
    }

    #[test]
    fn test_empty() {
        assert!(order(HashMap::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_ordering_is_deterministic(
            entries in prop::collection::hash_map("[a-e]{1,3}", 0u32..5, 0..30)
        ) {
            let records: Vec<_> = entries
                .iter()
                .map(|(uid, hour)| record(uid, &format!("2024-01-01 0{hour}:00:00")))
                .collect();

            let forward = order(keyed(records.clone()));
            let reversed = order(keyed(records.into_iter().rev().collect()));
            prop_assert_eq!(&forward, &reversed);

            for pair in forward.windows(2) {
                let key = |r: &AlertRecord| (r.earliest_time.clone(), r.uid.clone());
                prop_assert!(key(&pair[0]) < key(&pair[1]));
            }
        }
    }
}
