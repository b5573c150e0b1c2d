use fib_rope::{OversizeInsert, Rope, StringAdapter};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(String, usize),
    Remove(usize, usize),
    Balance,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => ("[a-z]{0,12}", any::<usize>()).prop_map(|(text, at)| Op::Insert(text, at)),
        2 => (any::<usize>(), 0usize..6).prop_map(|(at, span)| Op::Remove(at, span)),
        1 => Just(Op::Balance),
    ]
}

fn adapter_strategy() -> impl Strategy<Value = StringAdapter> {
    (1usize..8, any::<bool>()).prop_map(|(max, whole)| {
        let adapter = StringAdapter::new(max);
        if whole {
            adapter.with_oversize_insert(OversizeInsert::Whole)
        } else {
            adapter
        }
    })
}

fn check_contents(rope: &Rope<StringAdapter>, model: &str) -> Result<(), TestCaseError> {
    prop_assert_eq!(rope.to_string(), model);
    prop_assert_eq!(rope.len(), model.len());
    prop_assert_eq!(rope.is_empty(), model.is_empty());
    for (offset, c) in model.chars().enumerate() {
        prop_assert_eq!(rope.get(offset), Some(c));
    }
    prop_assert_eq!(rope.get(model.len()), None);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn edits_match_string_model(adapter in adapter_strategy(), ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut rope = Rope::new(adapter);
        let mut model = String::new();
        let mut versions = Vec::new();

        for op in ops {
            versions.push((rope.clone(), model.clone()));
            match op {
                Op::Insert(text, at) => {
                    let at = at % (model.len() + 1);
                    rope = rope.insert(text.clone(), at).unwrap();
                    model.insert_str(at, &text);
                }
                Op::Remove(at, span) => {
                    if model.is_empty() {
                        continue;
                    }
                    let start = at % model.len();
                    let end = (start + span).min(model.len() - 1);
                    rope = rope.remove(start, end).unwrap();
                    model.replace_range(start..=end, "");
                }
                Op::Balance => {
                    rope = rope.balance();
                    prop_assert!(rope.is_balanced());
                }
            }
            check_contents(&rope, &model)?;
        }

        // Every earlier version still reads as it did.
        for (old, text) in &versions {
            prop_assert_eq!(old.to_string(), text.as_str());
        }
    }

    #[test]
    fn balance_keeps_contents(adapter in adapter_strategy(), inserts in prop::collection::vec(("[a-z]{1,6}", any::<usize>()), 1..80)) {
        let mut rope = Rope::new(adapter);
        let mut model = String::new();
        for (text, at) in inserts {
            let at = at % (model.len() + 1);
            rope = rope.insert(text.clone(), at).unwrap();
            model.insert_str(at, &text);
        }

        let balanced = rope.balance();
        prop_assert!(balanced.is_balanced());
        prop_assert!(balanced.weight() <= rope.weight());
        check_contents(&balanced, &model)?;
        check_contents(&rope, &model)?;
    }

    #[test]
    fn split_then_append_restores(adapter in adapter_strategy(), text in "[a-z]{0,40}", at in any::<usize>()) {
        let rope = Rope::with_root(adapter, text.clone());
        let at = at % (text.len() + 1);
        let (left, right) = rope.split(at).unwrap();
        check_contents(&left, &text[..at])?;
        check_contents(&right, &text[at..])?;
        check_contents(&left.append(&right), &text)?;
    }

    #[test]
    fn cursor_walks_chunks_both_ways(adapter in adapter_strategy(), text in "[a-z]{0,40}") {
        let rope = Rope::with_root(adapter, text.clone());
        let forward: Vec<&String> = rope.chunks().collect();

        let mut backward = Vec::new();
        let mut cursor = rope.back();
        while let Some(chunk) = cursor.get() {
            let pos = cursor.position().unwrap();
            prop_assert_eq!(&text[pos..pos + chunk.len()], chunk.as_str());
            let (found, offset) = rope.find(pos);
            prop_assert_eq!(found.get(), Some(chunk));
            prop_assert_eq!(offset, 0);
            backward.push(chunk);
            cursor.move_prev();
        }
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn long_edit_runs_without_balancing(adapter in adapter_strategy(), ops in prop::collection::vec(op_strategy(), 1000..3000)) {
        let mut rope = Rope::new(adapter);
        let mut model = String::new();

        for op in ops {
            match op {
                Op::Insert(text, at) => {
                    // Mostly typing at the end, which deepens the tree fastest.
                    let at = if at % 4 == 0 { at % (model.len() + 1) } else { model.len() };
                    rope = rope.insert(text.clone(), at).unwrap();
                    model.insert_str(at, &text);
                }
                Op::Remove(at, span) => {
                    if model.is_empty() {
                        continue;
                    }
                    let start = at % model.len();
                    let end = (start + span).min(model.len() - 1);
                    rope = rope.remove(start, end).unwrap();
                    model.replace_range(start..=end, "");
                }
                Op::Balance => {}
            }
        }

        check_contents(&rope, &model)?;
        let balanced = rope.balance();
        prop_assert!(balanced.is_balanced());
        check_contents(&balanced, &model)?;
        drop(rope);
        check_contents(&balanced, &model)?;
    }
}
