use flat::{is_cnf, is_gnf, simplify, to_cnf, to_gnf, Grammar, GrammarType};

fn textbook_grammar(name: &str) -> Grammar {
    let grammar = match name {
        "balanced" => Grammar::from_rules("S", &[("S", &["a", "S", "b"]), ("S", &["ε"])]),
        "expression" => Grammar::from_rules(
            "E",
            &[
                ("E", &["E", "+", "T"]),
                ("E", &["T"]),
                ("T", &["T", "*", "F"]),
                ("T", &["F"]),
                ("F", &["(", "E", ")"]),
                ("F", &["x"]),
            ],
        ),
        "dyck" => Grammar::from_rules(
            "S",
            &[("S", &["a", "S", "b", "S"]), ("S", &["c"])],
        ),
        "nullable_chain" => Grammar::from_rules(
            "S",
            &[
                ("S", &["A", "S", "A"]),
                ("S", &["a", "B"]),
                ("A", &["B"]),
                ("A", &["S"]),
                ("B", &["b"]),
                ("B", &[]),
            ],
        ),
        _ => panic!("no grammar named {}", name),
    };
    grammar.expect("failed to build grammar")
}

fn run_vectors(grammar: &Grammar, tests: &Vec<(&str, bool)>, name: &str) {
    for (word, expected) in tests {
        let result = grammar.generates_str(word).expect("membership failed");
        assert_eq!(
            result, *expected,
            "'{}' failed on input '{}', expect member: {}, actual member: {}",
            name, word, expected, result
        );
    }
}

#[test]
fn cnf_preserves_language() {
    for (name, k) in [("balanced", 8), ("expression", 5), ("dyck", 7), ("nullable_chain", 4)] {
        let g = textbook_grammar(name);
        let cnf = to_cnf(g.clone()).expect("cnf conversion failed");
        println!("{}:\n{}", name, cnf);

        assert!(is_cnf(&cnf), "{} is not in CNF", name);
        assert_eq!(g.bounded_language(k), cnf.bounded_language(k), "{}", name);
    }
}

#[test]
fn gnf_preserves_language() {
    for (name, k) in [("balanced", 8), ("expression", 5), ("dyck", 7), ("nullable_chain", 4)] {
        let g = textbook_grammar(name);
        let gnf = to_gnf(g.clone()).expect("gnf conversion failed");
        println!("{}:\n{}", name, gnf);

        assert!(is_gnf(&gnf), "{} is not in GNF", name);
        assert_eq!(g.bounded_language(k), gnf.bounded_language(k), "{}", name);
    }
}

#[test]
fn simplify_preserves_language() {
    for (name, k) in [("balanced", 8), ("expression", 5), ("nullable_chain", 4)] {
        let g = textbook_grammar(name);
        let simplified = simplify(g.clone()).expect("simplification failed");

        assert!(!simplified.has_unit_productions(), "{}", name);
        assert_eq!(g.bounded_language(k), simplified.bounded_language(k), "{}", name);
    }
}

#[test]
fn membership_agrees_with_cnf() {
    let g = textbook_grammar("dyck");
    let cnf = to_cnf(g.clone()).unwrap();

    let test_vectors = vec![
        ("c", true),
        ("acbc", true),
        ("aacbcbc", true),
        ("acbacbc", true),
        ("", false),
        ("ab", false),
        ("acb", false),
        ("cc", false),
    ];
    run_vectors(&g, &test_vectors, "dyck");
    run_vectors(&cnf, &test_vectors, "dyck (cnf)");
}

#[test]
fn expression_membership() {
    let g = textbook_grammar("expression");
    let test_vectors = vec![
        ("x", true),
        ("x+x", true),
        ("x*x+x", true),
        ("(x+x)*x", true),
        ("((x))", true),
        ("", false),
        ("x+", false),
        ("(x", false),
        ("x y", false),
    ];
    run_vectors(&g, &test_vectors, "expression");
}

#[test]
fn empty_language() {
    let g = Grammar::from_rules("S", &[("S", &["a", "S"]), ("S", &["b", "A"]), ("A", &["A"])])
        .unwrap();

    let simplified = simplify(g.clone()).unwrap();
    assert!(simplified.productions().is_empty());
    assert!(g.bounded_language(6).is_empty());
    assert!(!g.generates_str("ab").unwrap());
    assert!(!g.generates_str("").unwrap());
}

#[test]
fn hierarchy_of_textbook_grammars() {
    let regular = Grammar::from_rules(
        "S",
        &[
            ("S", &["a", "S"]),
            ("S", &["b", "A"]),
            ("A", &["a", "A"]),
            ("A", &["b"]),
        ],
    )
    .unwrap();
    assert_eq!(regular.classify(), GrammarType::Regular);
    assert_eq!(textbook_grammar("balanced").classify(), GrammarType::ContextFree);
    assert_eq!(textbook_grammar("expression").classify(), GrammarType::ContextFree);
}

#[test]
fn serde_derives() {
    fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
    assert_serde::<Grammar>();
    assert_serde::<GrammarType>();
}
