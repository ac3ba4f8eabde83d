use super::*;

/// Entries are `(action, "dep_a,dep_b")`
fn deps(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(name, deps)| {
            (
                name.to_string(),
                deps.split(',')
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        })
        .collect()
}

#[test]
fn test_build_dag() {
    let dag = ActionDag::build(&deps(&[
        ("stg_orders", ""),
        ("fct_orders", "stg_orders,stg_customers"),
        ("stg_customers", ""),
    ]))
    .unwrap();
    let order = dag.topological_order().unwrap();

    let pos = |n: &str| order.iter().position(|m| m == n).unwrap();
    assert!(pos("fct_orders") > pos("stg_orders"));
    assert!(pos("fct_orders") > pos("stg_customers"));
}

#[test]
fn test_circular_dependency() {
    let result = ActionDag::build(&deps(&[("a", "b"), ("b", "c"), ("c", "a")]));
    match result {
        Err(CoreError::CircularDependency { cycle }) => {
            assert!(cycle.contains(" -> "));
        }
        other => panic!("expected circular dependency, got {:?}", other),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let result = ActionDag::build(&deps(&[("a", "a")]));
    assert!(matches!(result, Err(CoreError::CircularDependency { .. })));
}

#[test]
fn test_external_dependencies_ignored() {
    let dag = ActionDag::build(&deps(&[("stg", "raw.orders")])).unwrap();
    assert!(dag.contains("stg"));
    assert!(!dag.contains("raw.orders"));
    assert!(dag.ancestors("stg").is_empty());
}

fn sorted(names: Vec<ActionName>) -> Vec<String> {
    let mut names: Vec<String> = names.iter().map(ToString::to_string).collect();
    names.sort();
    names
}

#[test]
fn test_ancestors_are_transitive() {
    let dag = ActionDag::build(&deps(&[
        ("raw", ""),
        ("stg", "raw"),
        ("int", "stg"),
        ("fct", "int"),
        ("other", ""),
    ]))
    .unwrap();

    assert_eq!(sorted(dag.ancestors("fct")), vec!["int", "raw", "stg"]);
    assert!(dag.ancestors("raw").is_empty());
    assert!(dag.ancestors("missing").is_empty());
}

#[test]
fn test_diamond_ancestors_listed_once() {
    let dag = ActionDag::build(&deps(&[
        ("raw", ""),
        ("a", "raw"),
        ("b", "raw,raw"),
        ("fct", "a,b"),
    ]))
    .unwrap();
    assert_eq!(sorted(dag.ancestors("fct")), vec!["a", "b", "raw"]);
    assert_eq!(sorted(dag.ancestors("b")), vec!["raw"]);
}

#[test]
fn test_empty_name_rejected() {
    let result = ActionDag::build(&deps(&[("", "")]));
    assert!(matches!(result, Err(CoreError::EmptyName { .. })));
}
