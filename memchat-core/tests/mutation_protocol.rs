//! Protocol-level guarantees of parsing and applying memory mutations

use memchat_core::{
    JsonFileStore, MemoryRecord, MemorySet, MemoryStore, MutationOp, apply_mutations,
    is_clear_intent, parse_mutations,
};
use std::collections::BTreeSet;

fn sample_sets() -> Vec<MemorySet> {
    vec![
        MemorySet::new(),
        MemorySet::from_records(vec![MemoryRecord::new(1, "Likes tea")]).unwrap(),
        MemorySet::from_records(vec![
            MemoryRecord::new(12, "Plays the piano"),
            MemoryRecord::new(3, "Allergic to peanuts"),
            MemoryRecord::new(7, "Works night shifts"),
        ])
        .unwrap(),
    ]
}

#[test]
fn test_added_ids_increase_and_never_collide() {
    for set in sample_sets() {
        let existing: BTreeSet<u64> = set.ids().into_iter().collect();
        let adds: Vec<MutationOp> = (0..5).map(|i| MutationOp::add(format!("fact {i}"))).collect();

        let applied = apply_mutations(&set, &adds);

        let added = &applied.summary.added;
        assert_eq!(added.len(), 5);
        assert!(added.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(added.iter().all(|id| !existing.contains(id)));
        assert!(added.iter().all(|id| *id > set.max_id()));
    }
}

#[test]
fn test_deleting_absent_id_is_a_noop() {
    for set in sample_sets() {
        let applied = apply_mutations(&set, &[MutationOp::delete(1000)]);
        assert_eq!(applied.memories, set);
    }
}

#[test]
fn test_delete_beats_modify_regardless_of_order() {
    let set = sample_sets().pop().unwrap();
    for target in set.ids() {
        let forward = [MutationOp::modify(target, "changed"), MutationOp::delete(target)];
        let backward = [MutationOp::delete(target), MutationOp::modify(target, "changed")];
        for batch in [&forward[..], &backward[..]] {
            let applied = apply_mutations(&set, batch);
            assert!(!applied.memories.contains(target));
            assert_eq!(applied.memories.len(), set.len() - 1);
        }
    }
}

#[test]
fn test_parser_never_raises_on_garbage() {
    for output in ["not json", "{}", "null", "42", "[1, 2]", "[{\"id\": true}]", "```\n```"] {
        assert!(parse_mutations(output).is_empty(), "input {output:?}");
    }
}

#[test]
fn test_parse_then_apply() {
    let set = MemorySet::from_records(vec![
        MemoryRecord::new(1, "Likes tea"),
        MemoryRecord::new(2, "Has a cat"),
    ])
    .unwrap();
    let ops = parse_mutations(
        r#"[{"id": 1, "content": "Likes oolong tea"}, {"id": 2, "content": "Delete"}]"#,
    );
    let applied = apply_mutations(&set, &ops);
    assert_eq!(
        applied.memories,
        MemorySet::from_records(vec![MemoryRecord::new(1, "Likes oolong tea")]).unwrap()
    );
}

#[test]
fn test_clear_intent_examples() {
    assert!(is_clear_intent("请清空所有记忆"));
    assert!(is_clear_intent("please forget everything"));
    assert!(!is_clear_intent("what's the weather"));
}

#[tokio::test]
async fn test_save_load_round_trip_preserves_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("memories.json"));
    let original = r#"[
  {
    "id": 5,
    "content": "生日是三月二日"
  },
  {
    "id": 2,
    "content": "  padded\ttext with \"quotes\"  "
  }
]"#;
    std::fs::write(store.path(), original).unwrap();

    let loaded = store.load().await.unwrap();
    store.save(&loaded).await.unwrap();

    assert_eq!(store.load().await.unwrap(), loaded);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), original);
}
