//! Unit tests for the scope chain.

use crate::ast::ValueType;
use crate::scope::{ScopeStack, SymbolInfo};

#[test]
fn test_lookup_walks_to_outer_frames() {
    let mut scopes: ScopeStack<i64> = ScopeStack::new();
    scopes.declare("x", 1);
    scopes.push("if");
    scopes.declare("y", 2);

    assert_eq!(scopes.get("x"), Some(&1));
    assert_eq!(scopes.get("y"), Some(&2));
    assert_eq!(scopes.get("z"), None);
}

#[test]
fn test_inner_binding_shadows_outer() {
    let mut scopes: ScopeStack<i64> = ScopeStack::new();
    scopes.declare("x", 1);
    scopes.push("while");
    scopes.declare("x", 2);

    assert_eq!(scopes.get("x"), Some(&2));
    scopes.pop();
    assert_eq!(scopes.get("x"), Some(&1));
}

#[test]
fn test_pop_destroys_frame_bindings() {
    let mut scopes: ScopeStack<i64> = ScopeStack::new();
    scopes.push("for");
    scopes.declare("i", 0);
    assert!(scopes.contains("i"));
    scopes.pop();
    assert!(!scopes.contains("i"));
}

#[test]
fn test_global_frame_is_never_popped() {
    let mut scopes: ScopeStack<i64> = ScopeStack::new();
    scopes.declare("x", 1);
    scopes.pop();
    scopes.pop();
    assert_eq!(scopes.depth(), 1);
    assert_eq!(scopes.get("x"), Some(&1));
    assert_eq!(scopes.current_name(), "global");
}

#[test]
fn test_assign_updates_nearest_existing_binding() {
    let mut scopes: ScopeStack<i64> = ScopeStack::new();
    scopes.declare("x", 1);
    scopes.push("while");
    scopes.assign("x", 5);

    scopes.pop();
    // The outer binding was updated, not shadowed.
    assert_eq!(scopes.get("x"), Some(&5));
}

#[test]
fn test_assign_declares_in_innermost_when_unbound() {
    let mut scopes: ScopeStack<i64> = ScopeStack::new();
    scopes.push("if");
    scopes.assign("fresh", 3);
    assert_eq!(scopes.get("fresh"), Some(&3));
    scopes.pop();
    assert_eq!(scopes.get("fresh"), None);
}

#[test]
fn test_symbol_info_constructors() {
    let info = SymbolInfo::scalar(ValueType::Int);
    assert_eq!(info.ty, Some(ValueType::Int));
    assert_eq!(info.shape, None);

    let unresolved = SymbolInfo::unresolved();
    assert_eq!(unresolved.ty, None);
}
