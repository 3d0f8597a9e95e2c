//! Code generation tests

use pretty_assertions::assert_eq;
use treebind::*;

fn setup() -> (Forest, WorkspaceId) {
    let mut forest = Forest::new();
    let ws = forest.create_workspace(None).unwrap();
    (forest, ws)
}

#[test]
fn test_generate_literals() {
    let (mut forest, ws) = setup();
    let t = forest.create_node(ws, NodeKind::Bool(true)).unwrap();
    let n = forest.create_node(ws, NodeKind::Int(42)).unwrap();
    let x = forest.create_node(ws, NodeKind::Float(1.5)).unwrap();

    assert_eq!(forest.generate(t).unwrap(), "true");
    assert_eq!(forest.generate(n).unwrap(), "42");
    assert_eq!(forest.generate(x).unwrap(), "1.5");
}

#[test]
fn test_generate_let_with_arguments() {
    // let add a b = a + b in add
    let (mut forest, ws) = setup();
    let let_node = forest.let_binding(ws, "add", &["a", "b"]).unwrap();
    let plus = forest.create_node(ws, NodeKind::IntArith(ArithOp::Add)).unwrap();
    let a = forest.var_get(ws, "a").unwrap();
    let b = forest.var_get(ws, "b").unwrap();
    let body = forest.var_get(ws, "add").unwrap();
    forest.connect(plus, let_node, "EXP1").unwrap();
    forest.connect(a, plus, "A").unwrap();
    forest.connect(b, plus, "B").unwrap();
    forest.connect(body, let_node, "EXP2").unwrap();
    assert!(forest.resolve_subtree(let_node).unwrap().is_empty());

    assert_eq!(
        forest.generate(let_node).unwrap(),
        "let add a b = a + b in add"
    );
}

#[test]
fn test_generate_follows_renames() {
    let (mut forest, ws) = setup();
    let let_node = forest.let_binding(ws, "f", &["a"]).unwrap();
    let use_a = forest.var_get(ws, "a").unwrap();
    let use_f = forest.var_get(ws, "f").unwrap();
    forest.connect(use_a, let_node, "EXP1").unwrap();
    forest.connect(use_f, let_node, "EXP2").unwrap();
    forest.resolve_subtree(let_node).unwrap();

    let a = forest.value_of(let_node, "ARG0").unwrap();
    let f = forest.value_of(let_node, "VAR").unwrap();
    assert!(forest.rename(a, "arg").unwrap().is_renamed());
    assert!(forest.rename(f, "id").unwrap().is_renamed());
    assert_eq!(forest.generate(let_node).unwrap(), "let id arg = arg in id");
}

#[test]
fn test_generate_lambda_application() {
    // (fun x -> x) 1
    let (mut forest, ws) = setup();
    let app = forest.create_node(ws, NodeKind::App).unwrap();
    let lambda = forest.lambda(ws, "x").unwrap();
    let get = forest.var_get(ws, "x").unwrap();
    let one = forest.create_node(ws, NodeKind::Int(1)).unwrap();
    forest.connect(get, lambda, "RETURN").unwrap();
    forest.connect(lambda, app, "FUN").unwrap();
    forest.connect(one, app, "ARG").unwrap();

    assert_eq!(forest.generate(app).unwrap(), "(fun x -> x) 1");
}

#[test]
fn test_generate_match() {
    let (mut forest, ws) = setup();
    let m = forest.match_expr(ws, &[&[], &["x"], &["h", "t"]]).unwrap();
    let input = forest.create_node(ws, NodeKind::List { items: 0 }).unwrap();
    let zero = forest.create_node(ws, NodeKind::Int(0)).unwrap();
    let x = forest.var_get(ws, "x").unwrap();
    let t = forest.var_get(ws, "t").unwrap();
    forest.connect(input, m, "INPUT").unwrap();
    forest.connect(zero, m, "OUTPUT1").unwrap();
    forest.connect(x, m, "OUTPUT2").unwrap();
    forest.connect(t, m, "OUTPUT3").unwrap();
    assert!(forest.resolve_subtree(m).unwrap().is_empty());

    assert_eq!(
        forest.generate(m).unwrap(),
        "match [] with\n  | _ -> 0\n  | x -> x\n  | (h, t) -> t\n"
    );
}

#[test]
fn test_generate_collections_and_ternary() {
    let (mut forest, ws) = setup();
    let cond = forest.create_node(ws, NodeKind::Ternary).unwrap();
    let less = forest.create_node(ws, NodeKind::Compare(CompareOp::Lt)).unwrap();
    let list = forest.create_node(ws, NodeKind::List { items: 2 }).unwrap();
    let one = forest.create_node(ws, NodeKind::Int(1)).unwrap();
    let two = forest.create_node(ws, NodeKind::Int(2)).unwrap();
    let pair = forest.create_node(ws, NodeKind::Pair).unwrap();
    let fst = forest.create_node(ws, NodeKind::Fst).unwrap();

    forest.connect(less, cond, "IF").unwrap();
    forest.connect(list, cond, "THEN").unwrap();
    forest.connect(pair, cond, "ELSE").unwrap();
    forest.connect(one, list, "ADD0").unwrap();
    forest.connect(two, less, "B").unwrap();
    forest.connect(fst, pair, "FIRST").unwrap();

    assert_eq!(
        forest.generate(cond).unwrap(),
        "0 < 2 ? [1, null] : (fst (), ())"
    );
}

#[test]
fn test_generate_unresolved_reference_uses_own_name() {
    let (mut forest, ws) = setup();
    let get = forest.var_get(ws, "free").unwrap();
    assert_eq!(forest.generate(get).unwrap(), "free");
}

#[test]
fn test_generate_let_rec_is_unsupported() {
    let (mut forest, ws) = setup();
    let node = forest.create_node(ws, NodeKind::LetRec).unwrap();
    assert!(matches!(
        forest.generate(node),
        Err(BindingError::UnsupportedOperation { .. })
    ));
}

#[test]
fn test_generate_unknown_node() {
    let (mut forest, ws) = setup();
    let node = forest.create_node(ws, NodeKind::Int(1)).unwrap();
    forest.delete_subtree(node).unwrap();
    assert_eq!(forest.generate(node), Err(BindingError::UnknownNode(node)));
}
