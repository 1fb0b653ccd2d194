//! Property-based tests over random matrices.
//!
//! Laminar matrices are built from a random agglomerative hierarchy over the
//! species: every merge of two clusters yields a character, so every pair of
//! characters is nested or disjoint and a perfect phylogeny exists.

use std::collections::HashSet;

use perfect_phylogeny::matrix::CharacterMatrix;
use perfect_phylogeny::partition::{check_partition, partition};
use perfect_phylogeny::tree::{build, build_with, BuildOptions, CharacterTree};
use proptest::prelude::*;

fn to_rows(columns: &[Vec<bool>], species: usize) -> Vec<String> {
    (0..species)
        .map(|s| columns.iter().map(|c| if c[s] { '1' } else { '0' }).collect())
        .collect()
}

fn laminar_columns(species: usize, merges: &[(usize, usize)], singles: &[bool], nulls: usize) -> Vec<Vec<bool>> {
    let mut clusters: Vec<Vec<bool>> = (0..species)
        .map(|s| (0..species).map(|i| i == s).collect())
        .collect();
    let mut columns: Vec<Vec<bool>> = singles
        .iter()
        .zip(&clusters)
        .filter(|(keep, _)| **keep)
        .map(|(_, c)| c.clone())
        .collect();

    for &(a, b) in merges {
        if clusters.len() < 2 {
            break;
        }
        let first = clusters.swap_remove(a % clusters.len());
        let second = clusters.swap_remove(b % clusters.len());
        let merged: Vec<bool> = first.iter().zip(&second).map(|(x, y)| *x || *y).collect();
        columns.push(merged.clone());
        clusters.push(merged);
    }

    columns.extend((0..nulls).map(|_| vec![false; species]));
    columns
}

fn laminar_rows() -> impl Strategy<Value = Vec<String>> {
    (1usize..12)
        .prop_flat_map(|species| {
            (
                Just(species),
                prop::collection::vec((any::<usize>(), any::<usize>()), species - 1),
                prop::collection::vec(any::<bool>(), species),
                1usize..3,
            )
        })
        .prop_flat_map(|(species, merges, singles, nulls)| {
            (Just(species), Just(laminar_columns(species, &merges, &singles, nulls)).prop_shuffle())
        })
        .prop_map(|(species, columns)| to_rows(&columns, species))
}

fn any_rows() -> impl Strategy<Value = Vec<String>> {
    (1usize..10, 1usize..10)
        .prop_flat_map(|(species, characters)| {
            prop::collection::vec(prop::collection::vec(any::<bool>(), characters), species)
        })
        .prop_map(|rows| {
            rows.into_iter()
                .map(|r| r.into_iter().map(|b| if b { '1' } else { '0' }).collect())
                .collect()
        })
}

fn normalized(rows: &[String]) -> CharacterMatrix {
    let mut m = CharacterMatrix::from_rows(rows, false).unwrap();
    m.remove_null_columns();
    m.sort_columns();
    m
}

fn balanced(text: &str) -> bool {
    let mut open = 0i64;
    for c in text.chars() {
        match c {
            '(' => open += 1,
            ')' => open -= 1,
            _ => {}
        }
        if open < 0 {
            return false;
        }
    }
    open == 0
}

proptest! {
    #[test]
    fn prop_sort_is_idempotent(rows in any_rows()) {
        let mut m = CharacterMatrix::from_rows(&rows, false).unwrap();
        m.sort_columns();
        let once = m.character_labels().to_vec();
        m.sort_columns();
        prop_assert_eq!(m.character_labels(), once.as_slice());

        let columns: Vec<String> = once.iter().map(|l| m.column(l).unwrap()).collect();
        prop_assert!(columns.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn prop_null_removal_is_sound(rows in any_rows()) {
        let mut m = CharacterMatrix::from_rows(&rows, false).unwrap();
        let before = m.character_count();
        let removed = m.remove_null_columns();
        prop_assert_eq!(m.character_count() + removed, before);
        for label in m.character_labels() {
            prop_assert!(m.column(label).unwrap().contains('1'));
        }
    }

    #[test]
    fn prop_laminar_matrices_have_no_conflict(rows in laminar_rows()) {
        let m = normalized(&rows);
        prop_assert_eq!(m.first_conflict(), None);
    }

    #[test]
    fn prop_partition_covers_disjointly(rows in laminar_rows(), mask in prop::collection::vec(any::<bool>(), 0..40)) {
        let m = normalized(&rows);
        let subset: Vec<String> = m
            .character_labels()
            .iter()
            .zip(mask.iter().chain(std::iter::repeat(&true)))
            .filter(|(_, keep)| **keep)
            .map(|(l, _)| l.clone())
            .collect();

        let classes = partition(&subset, &m).unwrap();
        prop_assert!(check_partition(&subset, &classes).is_ok());
        for class in &classes {
            prop_assert!(!class.is_empty());
        }
    }

    #[test]
    fn prop_tree_is_well_formed(rows in laminar_rows()) {
        let m = normalized(&rows);
        let tree = build(&m, m.character_labels()).unwrap();
        let text = tree.to_newick();

        prop_assert!(balanced(&text));
        prop_assert!(text.ends_with(';'));
        prop_assert_eq!(tree.label_count(), m.character_count());
        prop_assert!(tree.depth() <= m.character_count());

        let labels = tree.labels();
        let distinct: HashSet<&str> = labels.iter().copied().collect();
        prop_assert_eq!(distinct.len(), labels.len());
        let expected: HashSet<&str> = m.character_labels().iter().map(String::as_str).collect();
        prop_assert_eq!(distinct, expected);
    }

    #[test]
    fn prop_build_is_deterministic(rows in laminar_rows()) {
        let m = normalized(&rows);
        let first = build(&m, m.character_labels()).unwrap().to_newick();
        let second = build(&m, m.character_labels()).unwrap().to_newick();
        prop_assert_eq!(&first, &second);

        let options = BuildOptions { parallel: true, validate: true };
        let parallel = build_with(&m, m.character_labels(), &options).unwrap().to_newick();
        prop_assert_eq!(first, parallel);
    }

    #[test]
    fn prop_tree_text_parses_back(rows in laminar_rows()) {
        let m = normalized(&rows);
        let text = build(&m, m.character_labels()).unwrap().to_newick();
        let parsed = CharacterTree::parse(&text).unwrap();
        prop_assert_eq!(parsed.to_newick(), text);
    }

    #[test]
    fn prop_permissive_build_terminates(rows in any_rows()) {
        let m = normalized(&rows);
        let tree = build(&m, m.character_labels()).unwrap();
        prop_assert!(balanced(&tree.to_newick()));
        prop_assert!(tree.depth() <= m.character_count());
    }
}
