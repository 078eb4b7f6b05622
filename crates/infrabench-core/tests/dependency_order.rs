use infrabench_core::{
    dependencies_of, dependents_of, resolve_order, scenario_order, Domain, ScenarioModel,
};

fn index_of(order: &[String], name: &str) -> usize {
    order
        .iter()
        .position(|d| d == name)
        .unwrap_or_else(|| panic!("{name} missing from {order:?}"))
}

fn assert_respects_edges(domains: &[Domain], order: &[String]) {
    assert_eq!(order.len(), domains.len());
    for domain in domains {
        for dep in &domain.depends_on {
            assert!(
                index_of(order, dep) < index_of(order, &domain.name),
                "{dep} must precede {} in {order:?}",
                domain.name
            );
        }
    }
}

// ---- acyclic graphs ----

#[test]
fn dependency_precedes_dependent() {
    let domains = vec![Domain::new("b").depends_on("a"), Domain::new("a")];
    assert_eq!(resolve_order(&domains).unwrap(), vec!["a", "b"]);
}

#[test]
fn diamond_puts_root_first_and_sink_last() {
    let domains = vec![
        Domain::new("app").depends_on("k8s").depends_on("db"),
        Domain::new("k8s").depends_on("aws"),
        Domain::new("db").depends_on("aws"),
        Domain::new("aws"),
    ];
    let order = resolve_order(&domains).unwrap();
    assert_eq!(order[0], "aws");
    assert_eq!(order[3], "app");
    assert_respects_edges(&domains, &order);
}

#[test]
fn layered_graphs_respect_every_edge() {
    // each domain in layer n depends on a varying subset of layer n-1
    for width in 1..=4 {
        let mut domains = Vec::new();
        for layer in 0..4 {
            for i in 0..width {
                let mut d = Domain::new(format!("l{layer}d{i}"));
                if layer > 0 {
                    for j in 0..width {
                        if (i + j + layer) % 2 == 0 || j == i {
                            d = d.depends_on(format!("l{}d{}", layer - 1, j));
                        }
                    }
                }
                domains.push(d);
            }
        }
        domains.reverse();
        let order = resolve_order(&domains).unwrap();
        assert_respects_edges(&domains, &order);
    }
}

#[test]
fn independent_domains_are_all_returned() {
    let domains = vec![Domain::new("x"), Domain::new("y"), Domain::new("z")];
    let mut order = resolve_order(&domains).unwrap();
    order.sort();
    assert_eq!(order, vec!["x", "y", "z"]);
}

// ---- invalid graphs ----

#[test]
fn two_cycle_is_circular() {
    let domains = vec![Domain::new("a").depends_on("b"), Domain::new("b").depends_on("a")];
    let err = resolve_order(&domains).unwrap_err();
    assert!(err.to_string().contains("circular"));
}

#[test]
fn cycle_behind_valid_prefix_is_circular() {
    let domains = vec![
        Domain::new("root"),
        Domain::new("a").depends_on("root").depends_on("c"),
        Domain::new("b").depends_on("a"),
        Domain::new("c").depends_on("b"),
    ];
    let err = resolve_order(&domains).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("circular"));
    assert!(!msg.contains("root"));
}

#[test]
fn undeclared_dependency_is_unknown() {
    let domains = vec![Domain::new("github").depends_on("aws")];
    let err = resolve_order(&domains).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("unknown"));
    assert!(msg.contains("github"));
    assert!(msg.contains("aws"));
}

// ---- scenario helpers ----

#[test]
fn scenario_helpers_follow_edges() {
    let scenario = ScenarioModel::new("s")
        .with_domain(Domain::new("aws"))
        .with_domain(Domain::new("k8s").depends_on("aws"))
        .with_domain(Domain::new("github").depends_on("aws").depends_on("k8s"));

    let order = scenario_order(&scenario).unwrap();
    assert_eq!(order, vec!["aws", "k8s", "github"]);
    assert_eq!(dependencies_of(&scenario, "github"), vec!["aws", "k8s"]);
    assert_eq!(dependents_of(&scenario, "aws"), vec!["k8s", "github"]);
    assert!(dependents_of(&scenario, "github").is_empty());
}
