//! Property tests for the rename gates

use proptest::prelude::*;
use renamer_core::{apply_mapping, only_renames, validate_response, AttemptContext, AttemptError};
use renamer_core::IdentifierMapping;
use std::collections::BTreeSet;

/// Test method with `locals` local variables `var_0..`
fn method_source(locals: usize) -> String {
    let mut out = String::from("@Test\npublic void func_1() {\n");
    for i in 0..locals {
        out.push_str(&format!("    int var_{i} = {i};\n"));
    }
    let sum = (0..locals)
        .map(|i| format!("var_{i}"))
        .collect::<Vec<_>>()
        .join(" + ");
    out.push_str(&format!("    assertEquals({}, {sum});\n}}", locals * 10));
    out
}

fn candidate_names(locals: usize) -> Vec<String> {
    std::iter::once("func_1".to_string())
        .chain((0..locals).map(|i| format!("var_{i}")))
        .collect()
}

fn fresh_mapping(locals: usize, stems: &[String]) -> IdentifierMapping {
    candidate_names(locals)
        .into_iter()
        .zip(stems.iter().enumerate().map(|(i, s)| format!("{s}{i}")))
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    ChangeLiteral,
    InsertToken,
    DeleteToken,
    SwapOperands,
}

fn mutate(code: &str, mutation: Mutation) -> String {
    match mutation {
        Mutation::ChangeLiteral => code.replacen("= 0;", "= 7;", 1),
        Mutation::InsertToken => code.replacen(';', " + 1;", 1),
        Mutation::DeleteToken => code.replacen(';', "", 1),
        Mutation::SwapOperands => code.replacen("assertEquals(", "assertEquals(0 - ", 1),
    }
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        Just(Mutation::ChangeLiteral),
        Just(Mutation::InsertToken),
        Just(Mutation::DeleteToken),
        Just(Mutation::SwapOperands),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_restricted_mapping_always_passes(
        locals in 1usize..5,
        stems in prop::collection::vec("[a-z]{3,8}", 5),
    ) {
        let code = method_source(locals);
        let mapping = fresh_mapping(locals, &stems);
        let renamed = apply_mapping(&code, &mapping).unwrap();
        prop_assert!(only_renames(&code, &renamed));
    }

    #[test]
    fn prop_non_identifier_edit_always_fails(
        locals in 1usize..5,
        stems in prop::collection::vec("[a-z]{3,8}", 5),
        mutation in mutation_strategy(),
    ) {
        let code = method_source(locals);
        let renamed = apply_mapping(&code, &fresh_mapping(locals, &stems)).unwrap();
        let tampered = mutate(&renamed, mutation);
        prop_assert_ne!(&tampered, &renamed);
        prop_assert!(!only_renames(&code, &tampered));
    }

    #[test]
    fn prop_incomplete_mapping_is_rejected_and_extras_dropped(
        locals in 1usize..5,
        keep in prop::collection::vec(any::<bool>(), 5),
        extras in prop::collection::btree_set("[A-Z][a-z]{2,6}", 0..3),
    ) {
        let code = method_source(locals);
        let ctx = AttemptContext::new(&code).unwrap();
        let candidates = candidate_names(locals);

        let kept: BTreeSet<String> = candidates
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(c, _)| c.clone())
            .collect();

        let mut object = serde_json::Map::new();
        for key in &kept {
            object.insert(key.clone(), format!("{key}Renamed").into());
        }
        for extra in &extras {
            object.insert(extra.clone(), "ignored".into());
        }
        let reply = serde_json::Value::Object(object).to_string();

        let missing: Vec<String> = candidates
            .iter()
            .filter(|c| !kept.contains(*c))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match validate_response(&ctx, &reply) {
            Ok(accepted) => {
                prop_assert!(missing.is_empty());
                let keys: BTreeSet<String> =
                    accepted.mapping.iter().map(|(k, _)| k.to_string()).collect();
                prop_assert_eq!(keys, kept);
            }
            Err(AttemptError::MissingIdentifiers { missing: reported }) => {
                prop_assert_eq!(reported, missing);
            }
            Err(other) => prop_assert!(false, "unexpected rejection: {other}"),
        }
    }
}
