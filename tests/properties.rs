use proptest::prelude::*;
use proptest::sample::select;

use tree_semilattice::canonical::{Canonicalizer, Pair, Triple};
use tree_semilattice::cluster::{compare, restriction};
use tree_semilattice::enumerate::{all_trees, leaf_range};
use tree_semilattice::permutation::Permutation;
use tree_semilattice::tree::Tree;

fn trees_on(n: usize) -> impl Strategy<Value = Tree> {
    select(all_trees(&leaf_range(n)).collect::<Vec<_>>())
}

fn relabeling(n: usize) -> impl Strategy<Value = Permutation> {
    Just(leaf_range(n))
        .prop_shuffle()
        .prop_map(move |images| Permutation::new(&leaf_range(n), &images).unwrap())
}

prop_compose! {
    fn triple_with_relabeling()(n in 3usize..=4)(
        t in trees_on(n),
        r in trees_on(n),
        s in trees_on(n),
        sigma in relabeling(n),
    ) -> (Triple, Permutation) {
        (Triple(t, r, s), sigma)
    }
}

prop_compose! {
    fn tree_with_relabeling()(n in 1usize..=5)(t in trees_on(n), sigma in relabeling(n)) -> (Tree, Permutation) {
        (t, sigma)
    }
}

proptest! {
    #[test]
    fn tree_normal_form_is_orbit_invariant((tree, sigma) in tree_with_relabeling()) {
        let mut canon = Canonicalizer::new();
        let normal = canon.normalize_tree(&tree).unwrap();
        prop_assert_eq!(canon.normalize_tree(&normal).unwrap(), normal.clone());
        prop_assert_eq!(canon.normalize_tree(&sigma.apply(&tree).unwrap()).unwrap(), normal.clone());
        prop_assert!(normal <= tree);
    }

    #[test]
    fn triple_normal_form_is_idempotent_and_invariant((triple, sigma) in triple_with_relabeling()) {
        let mut canon = Canonicalizer::new();
        let normal = canon.normalize_tuple(&triple).unwrap();
        prop_assert_eq!(canon.normalize_tuple(&normal).unwrap(), normal.clone());

        let Triple(t, r, s) = &triple;
        let moved = Triple(sigma.apply(t).unwrap(), sigma.apply(r).unwrap(), sigma.apply(s).unwrap());
        prop_assert_eq!(canon.normalize_tuple(&moved).unwrap(), normal.clone());

        let swapped = Triple(t.clone(), s.clone(), r.clone());
        prop_assert_eq!(canon.normalize_tuple(&swapped).unwrap(), normal.clone());

        // a fresh cache agrees with a warm one
        prop_assert_eq!(Canonicalizer::new().normalize_tuple(&moved).unwrap(), normal);
    }

    #[test]
    fn pair_normal_form_is_orbit_invariant((triple, sigma) in triple_with_relabeling()) {
        let mut canon = Canonicalizer::new();
        let Triple(t, r, _) = triple;
        let normal = canon.normalize_tuple(&Pair(t.clone(), r.clone())).unwrap();
        let moved = Pair(sigma.apply(&t).unwrap(), sigma.apply(&r).unwrap());
        prop_assert_eq!(canon.normalize_tuple(&moved).unwrap(), normal);
    }

    #[test]
    fn restriction_to_own_leaves_is_identity(tree in (1usize..=5).prop_flat_map(trees_on)) {
        prop_assert_eq!(restriction(&tree, &tree.leaf_set()), Some(tree.clone()));
    }

    #[test]
    fn refinement_order_basics(
        (t, s) in (2usize..=5).prop_flat_map(|n| (trees_on(n), trees_on(n)))
    ) {
        prop_assert!(compare(&t, &t));
        let star = Tree::star(&t.leaf_set()).unwrap();
        prop_assert!(compare(&star, &t));
        if compare(&t, &s) && compare(&s, &t) {
            prop_assert_eq!(t, s);
        }
    }

    #[test]
    fn tuple_notation_round_trips(tree in (1usize..=5).prop_flat_map(trees_on)) {
        let parsed: Tree = tree.to_string().parse().unwrap();
        prop_assert_eq!(parsed, tree);
    }
}
