use super::*;

fn record(id: &str, name: &str, phone: &str) -> CustomerRecord {
    CustomerRecord::new(id, name, phone)
}

fn ids(records: &[CustomerRecord]) -> Vec<&str> {
    records.iter().map(|record| record.id.as_str()).collect()
}

fn seeded() -> LocalCache {
    let mut cache = LocalCache::new();
    cache.replace_all(vec![
        record("A1", "Alice Martin", "0700 111"),
        record("B2", "Bob Stone", "0700 222"),
        record("C3", "Carla Alvarez", "0800 333"),
    ]);
    cache
}

#[test]
fn empty_query_returns_everything_newest_first() {
    let cache = seeded();
    assert_eq!(ids(&cache.search("")), vec!["C3", "B2", "A1"]);
    assert_eq!(ids(&cache.search("   ")), vec!["C3", "B2", "A1"]);
}

#[test]
fn query_matches_id_name_or_phone_case_insensitively() {
    let cache = seeded();
    assert_eq!(ids(&cache.search("al")), vec!["C3", "A1"]);
    assert_eq!(ids(&cache.search("b2")), vec!["B2"]);
    assert_eq!(ids(&cache.search("0700")), vec!["B2", "A1"]);
    assert_eq!(ids(&cache.search(" STONE ")), vec!["B2"]);
    assert!(cache.search("zzz").is_empty());
}

#[test]
fn search_results_only_contain_matching_records() {
    let cache = seeded();
    for query in ["a", "0", "3", "rt", "x"] {
        let needle = query.to_lowercase();
        for found in cache.search(query) {
            assert!(
                found.id.to_lowercase().contains(&needle)
                    || found.name.to_lowercase().contains(&needle)
                    || found.phone.to_lowercase().contains(&needle),
                "query {} returned non-matching {:?}",
                query,
                found
            );
        }
    }
}

#[test]
fn contains_id_compares_normalized_values() {
    let mut cache = LocalCache::new();
    let mut legacy = record("x", "Legacy", "1");
    legacy.id = " d4 ".to_string();
    cache.replace_all(vec![legacy]);
    assert!(cache.contains_id("D4"));
    assert!(!cache.contains_id("D5"));
}

#[test]
fn staged_append_reverts_cleanly() {
    let mut cache = seeded();
    let staged = cache.stage(Change::Append(record("D4", "Dan", "9")));
    assert_eq!(cache.len(), 4);
    cache.revert(staged);
    assert_eq!(ids(cache.records()), vec!["A1", "B2", "C3"]);
}

#[test]
fn settle_reapplies_append_lost_to_a_reload() {
    let mut cache = seeded();
    let staged = cache.stage(Change::Append(record("D4", "Dan", "9")));
    cache.replace_all(vec![record("A1", "Alice Martin", "0700 111")]);
    cache.settle(staged);
    assert_eq!(ids(cache.records()), vec!["A1", "D4"]);
}

#[test]
fn staged_replace_reverts_to_previous_value() {
    let mut cache = seeded();
    let mut next = cache.get("B2").expect("cached").clone();
    next.name = "Robert Stone".to_string();
    let staged = cache.stage(Change::Replace(next));
    assert_eq!(cache.get("B2").expect("cached").name, "Robert Stone");
    let outcome: Result<(), &str> = cache.finish(staged, Err("remote down"));
    assert!(outcome.is_err());
    assert_eq!(cache.get("B2").expect("cached").name, "Bob Stone");
}

#[test]
fn staged_remove_reinserts_at_original_position() {
    let mut cache = seeded();
    let staged = cache.stage(Change::Remove("B2".to_string()));
    assert_eq!(ids(cache.records()), vec!["A1", "C3"]);
    cache.revert(staged);
    assert_eq!(ids(cache.records()), vec!["A1", "B2", "C3"]);
}

#[test]
fn staging_unknown_ids_is_untouched() {
    let mut cache = seeded();
    let staged = cache.stage(Change::Remove("nope".to_string()));
    assert!(matches!(staged, Staged::Untouched));
    cache.settle(staged);
    assert_eq!(cache.len(), 3);
}

#[test]
fn refresh_gate_is_single_flight() {
    let cache = LocalCache::new();
    let gate = cache.refresh_gate().clone();
    let ticket = gate.try_begin().expect("first claim");
    assert!(gate.is_busy());
    assert!(cache.refresh_gate().try_begin().is_none());
    drop(ticket);
    assert!(!gate.is_busy());
    assert!(gate.try_begin().is_some());
}
