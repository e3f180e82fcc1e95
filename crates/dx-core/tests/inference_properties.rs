//! Property-based tests for enumeration inference.
//!
//! Random small networks are checked against a brute-force sum over the
//! full joint distribution.

use dx_core::config::{build_model, get_preset, PresetName};
use dx_core::inference::{EnumerationConfig, Enumerator, Evidence, InferenceError};
use dx_core::network::{combination_values, NetworkModel, VariableDef};
use proptest::prelude::*;

const TOL: f64 = 1e-9;

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn var_name(i: usize) -> String {
    format!("V{}", i)
}

/// Random network of up to 6 variables in topological order, at most 3
/// parents each, with CPT entries bounded away from 0 and 1.
fn network_strategy() -> impl Strategy<Value = Vec<VariableDef>> {
    (1usize..=6)
        .prop_flat_map(|n| {
            (0..n)
                .map(|i| {
                    (
                        prop::collection::vec(any::<bool>(), i),
                        prop::collection::vec(0.01f64..0.99, 8),
                    )
                })
                .collect::<Vec<_>>()
        })
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (mask, probs))| {
                    let parents: Vec<String> = mask
                        .iter()
                        .enumerate()
                        .filter(|(_, on)| **on)
                        .map(|(j, _)| var_name(j))
                        .take(3)
                        .collect();
                    let arity = parents.len();
                    let rows: Vec<(Vec<bool>, f64)> = (0..1usize << arity)
                        .map(|idx| (combination_values(idx, arity), probs[idx]))
                        .collect();
                    VariableDef::new(var_name(i), parents, rows)
                })
                .collect()
        })
}

/// P(query = true | evidence) by summing every full assignment.
fn brute_force(defs: &[VariableDef], query: usize, evidence: &[Option<bool>]) -> Option<f64> {
    let n = defs.len();
    let index_of = |name: &str| defs.iter().position(|d| d.name == name);
    let mut w_true = 0.0;
    let mut w_false = 0.0;

    for mask in 0..1usize << n {
        let values: Vec<bool> = (0..n).map(|i| mask & (1 << i) != 0).collect();
        if evidence
            .iter()
            .enumerate()
            .any(|(i, e)| e.is_some_and(|v| values[i] != v))
        {
            continue;
        }
        let mut joint = 1.0;
        for (i, def) in defs.iter().enumerate() {
            let given: Vec<bool> = def
                .parents
                .iter()
                .filter_map(|p| index_of(p))
                .map(|j| values[j])
                .collect();
            let p = def.rows.iter().find(|(g, _)| *g == given)?.1;
            joint *= if values[i] { p } else { 1.0 - p };
        }
        if values[query] {
            w_true += joint;
        } else {
            w_false += joint;
        }
    }

    let total = w_true + w_false;
    (total > 0.0).then(|| w_true / total)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn posterior_matches_full_joint(
        defs in network_strategy(),
        query in any::<prop::sample::Index>(),
        observed in prop::collection::vec(prop::option::of(any::<bool>()), 6),
    ) {
        let n = defs.len();
        let q = query.index(n);
        let evidence_values: Vec<Option<bool>> = (0..n)
            .map(|i| if i == q { None } else { observed[i] })
            .collect();
        let evidence: Evidence = evidence_values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (var_name(i), v)))
            .collect();

        let network = NetworkModel::new(defs.clone()).unwrap();
        let dist = Enumerator::default()
            .ask(&var_name(q), &evidence, &network)
            .unwrap();
        let expected = brute_force(&defs, q, &evidence_values).unwrap();

        prop_assert!(close(dist.p_true, expected, TOL), "{} vs {}", dist.p_true, expected);
        prop_assert!((0.0..=1.0).contains(&dist.p_true));
        prop_assert!(close(dist.p_true + dist.p_false, 1.0, 1e-12));
    }

    #[test]
    fn queries_are_deterministic(
        defs in network_strategy(),
        query in any::<prop::sample::Index>(),
    ) {
        let network = NetworkModel::new(defs.clone()).unwrap();
        let name = var_name(query.index(defs.len()));
        let first = Enumerator::default().ask(&name, &Evidence::new(), &network).unwrap();
        let second = Enumerator::default().ask(&name, &Evidence::new(), &network).unwrap();
        prop_assert_eq!(first.p_true.to_bits(), second.p_true.to_bits());
        prop_assert_eq!(first.p_false.to_bits(), second.p_false.to_bits());
    }

    #[test]
    fn root_without_evidence_is_its_prior(p in 0.0f64..=1.0) {
        let network = NetworkModel::new(vec![
            VariableDef::root("R", p),
            VariableDef::new("C", ["R"], vec![(vec![true], 0.7), (vec![false], 0.2)]),
        ])
        .unwrap();
        let dist = Enumerator::default().ask("R", &Evidence::new(), &network).unwrap();
        prop_assert!(close(dist.p_true, p, 1e-12));
    }

    #[test]
    fn chain_follows_bayes_rule(
        pa in 0.001f64..0.999,
        pb_a in 0.001f64..0.999,
        pb_not_a in 0.001f64..0.999,
    ) {
        let network = NetworkModel::new(vec![
            VariableDef::root("A", pa),
            VariableDef::new("B", ["A"], vec![(vec![true], pb_a), (vec![false], pb_not_a)]),
        ])
        .unwrap();
        let evidence = Evidence::new().with("B", true);
        let dist = Enumerator::default().ask("A", &evidence, &network).unwrap();
        let expected = pa * pb_a / (pa * pb_a + (1.0 - pa) * pb_not_a);
        prop_assert!(close(dist.p_true, expected, 1e-12));
    }

    #[test]
    fn asia_random_evidence_is_normalized_or_degenerate(
        query in any::<prop::sample::Index>(),
        observed in prop::collection::vec(prop::option::of(any::<bool>()), 8),
    ) {
        let network = build_model(&get_preset(PresetName::Asia)).unwrap();
        let names = network.variables();
        let q = query.index(names.len());
        let evidence: Evidence = names
            .iter()
            .zip(&observed)
            .enumerate()
            .filter(|(i, _)| *i != q)
            .filter_map(|(_, (name, v))| v.map(|v| (name.to_string(), v)))
            .collect();

        match Enumerator::default().ask(names[q], &evidence, &network) {
            Ok(dist) => {
                prop_assert!(close(dist.p_true + dist.p_false, 1.0, 1e-12));
                prop_assert!(dist.p_true >= 0.0 && dist.p_false >= 0.0);
            }
            Err(InferenceError::DegenerateEvidence { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}

#[test]
fn chain_reference_values() {
    let network = build_model(&get_preset(PresetName::Chain)).unwrap();
    let e = Enumerator::default();

    let b = e.ask("B", &Evidence::new(), &network).unwrap();
    assert!(close(b.p_true, 0.0104, 1e-12));

    let b_given_a = e.ask("B", &Evidence::new().with("A", true), &network).unwrap();
    assert!(close(b_given_a.p_true, 0.05, 1e-12));

    let a_given_b = e.ask("A", &Evidence::new().with("B", true), &network).unwrap();
    assert!(close(a_given_b.p_true, 0.0005 / 0.0104, 1e-12));
}

#[test]
fn asia_marginals() {
    let network = build_model(&get_preset(PresetName::Asia)).unwrap();
    let e = Enumerator::default();
    let none = Evidence::new();

    assert!(close(e.ask("Asia", &none, &network).unwrap().p_true, 0.01, 1e-12));
    assert!(close(e.ask("Smoking", &none, &network).unwrap().p_true, 0.5, 1e-12));
    assert!(close(
        e.ask("Tuberculosis", &none, &network).unwrap().p_true,
        0.0104,
        1e-12
    ));
    assert!(close(
        e.ask("LungCancer", &none, &network).unwrap().p_true,
        0.055,
        1e-12
    ));
    assert!(close(
        e.ask("Bronchitis", &none, &network).unwrap().p_true,
        0.45,
        1e-12
    ));
}

#[test]
fn or_node_is_deterministic() {
    let network = build_model(&get_preset(PresetName::Asia)).unwrap();
    let e = Enumerator::default();

    let either_true = [
        Evidence::new().with("Tuberculosis", true),
        Evidence::new().with("LungCancer", true),
        Evidence::new()
            .with("Tuberculosis", true)
            .with("LungCancer", false),
        Evidence::new()
            .with("Tuberculosis", false)
            .with("LungCancer", true),
        Evidence::new()
            .with("Tuberculosis", true)
            .with("LungCancer", true),
    ];
    for evidence in &either_true {
        let either = e.ask("TBorCancer", evidence, &network).unwrap();
        assert!(
            close(either.p_true, 1.0, 1e-12),
            "P(TBorCancer | {}) = {}",
            evidence,
            either.p_true
        );
    }

    let evidence = Evidence::new()
        .with("Tuberculosis", false)
        .with("LungCancer", false);
    let neither = e.ask("TBorCancer", &evidence, &network).unwrap();
    assert!(close(neither.p_true, 0.0, 1e-12));
}

#[test]
fn contradictory_or_evidence_is_degenerate() {
    let network = build_model(&get_preset(PresetName::Asia)).unwrap();
    let evidence = Evidence::new()
        .with("Tuberculosis", true)
        .with("TBorCancer", false);
    let err = Enumerator::default()
        .ask("Xray", &evidence, &network)
        .unwrap_err();
    assert!(matches!(err, InferenceError::DegenerateEvidence { .. }));
}

#[test]
fn hidden_limit_is_checked_before_work() {
    let network = build_model(&get_preset(PresetName::Asia)).unwrap();
    let strict = Enumerator::new(EnumerationConfig {
        max_hidden_variables: 2,
    });
    let err = strict.ask("Dyspnea", &Evidence::new(), &network).unwrap_err();
    assert_eq!(
        err,
        InferenceError::QueryTooExpensive {
            hidden: 7,
            limit: 2
        }
    );
}

#[test]
fn parallel_queries_share_one_network() {
    let network = build_model(&get_preset(PresetName::Asia)).unwrap();
    let evidence = Evidence::new().with("Xray", true).with("Smoking", true);
    let queries: Vec<&str> = network
        .variables()
        .into_iter()
        .filter(|name| !evidence.contains(name))
        .collect();
    let sequential = Enumerator::default()
        .ask_many(&queries, &evidence, &network)
        .unwrap();

    let parallel: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = queries
            .iter()
            .map(|name| {
                let network = &network;
                let evidence = &evidence;
                s.spawn(move || Enumerator::default().ask(name, evidence, network))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });

    assert_eq!(queries.len(), 6);
    assert_eq!(sequential, parallel);
}

#[test]
fn alternative_topological_order_gives_same_posteriors() {
    let declared = build_model(&get_preset(PresetName::Asia)).unwrap();

    let mut spec = get_preset(PresetName::Asia);
    // Smoking, Asia, Bronchitis, LungCancer, Tuberculosis, TBorCancer, Dyspnea, Xray
    let order = [1usize, 0, 4, 3, 2, 5, 7, 6];
    spec.nodes = order.iter().map(|&i| spec.nodes[i].clone()).collect();
    let permuted = build_model(&spec).unwrap();
    assert_ne!(declared.variables(), permuted.variables());

    let evidence = Evidence::new().with("Xray", true).with("Dyspnea", true);
    let e = Enumerator::default();
    for name in ["Asia", "Smoking", "Tuberculosis", "LungCancer", "Bronchitis"] {
        let a = e.ask(name, &evidence, &declared).unwrap();
        let b = e.ask(name, &evidence, &permuted).unwrap();
        assert!(close(a.p_true, b.p_true, 1e-12), "{}: {} vs {}", name, a.p_true, b.p_true);
    }
}
