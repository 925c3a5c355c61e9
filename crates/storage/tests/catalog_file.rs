use std::collections::HashSet;

use quiz_core::model::Difficulty;
use storage::load_catalog;

#[test]
fn bundled_catalog_is_valid_and_covers_every_tier() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/questions.json");
    let catalog = load_catalog(path).expect("bundled catalog loads");

    let tiers: HashSet<Difficulty> = catalog.iter().map(|q| q.difficulty).collect();
    assert_eq!(tiers.len(), 3);
    assert!(catalog.iter().all(|q| q.answer_index < q.choices.len()));
}
