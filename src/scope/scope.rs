use std::collections::HashMap;

use crate::ast::{Shape, ValueType};

/// What the static pass records about a bound name.
///
/// `ty` stays `None` when the binding came from an unresolved
/// right-hand side; lookups then propagate the unresolved state
/// instead of producing follow-on diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SymbolInfo {
    pub ty: Option<ValueType>,
    pub shape: Option<Shape>,
    pub elem: Option<ValueType>,
}

impl SymbolInfo {
    pub fn scalar(ty: ValueType) -> Self {
        SymbolInfo {
            ty: Some(ty),
            shape: None,
            elem: None,
        }
    }

    pub fn unresolved() -> Self {
        SymbolInfo::default()
    }
}

/// One frame of the scope chain: a name-to-binding map plus the label
/// of the construct that opened it.
#[derive(Debug)]
struct Frame<B> {
    name: &'static str,
    symbols: HashMap<String, B>,
}

/// An owned stack of scope frames, walked innermost-out on lookup.
///
/// Both passes use this structure: the checker with [`SymbolInfo`]
/// bindings, the interpreter with runtime values. Each pass owns its
/// own instance exclusively. The root `"global"` frame is created on
/// construction and is never popped.
#[derive(Debug)]
pub struct ScopeStack<B> {
    frames: Vec<Frame<B>>,
}

impl<B> ScopeStack<B> {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![Frame {
                name: "global",
                symbols: HashMap::new(),
            }],
        }
    }

    /// Opens a new innermost frame for a compound-statement body.
    pub fn push(&mut self, name: &'static str) {
        self.frames.push(Frame {
            name,
            symbols: HashMap::new(),
        });
    }

    /// Closes the innermost frame. The global frame stays.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of open frames, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Label of the innermost frame.
    pub fn current_name(&self) -> &'static str {
        self.frames.last().map(|f| f.name).unwrap_or("global")
    }

    /// Binds `name` in the innermost frame, shadowing any outer
    /// binding of the same name.
    pub fn declare(&mut self, name: &str, binding: B) {
        if let Some(frame) = self.frames.last_mut() {
            frame.symbols.insert(name.to_string(), binding);
        }
    }

    /// Updates the nearest existing binding of `name`; declares it in
    /// the innermost frame when no frame binds it yet.
    pub fn assign(&mut self, name: &str, binding: B) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.symbols.get_mut(name) {
                *slot = binding;
                return;
            }
        }
        self.declare(name, binding);
    }

    /// Looks `name` up, walking frames innermost-out.
    pub fn get(&self, name: &str) -> Option<&B> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.symbols.get(name))
    }

    /// Whether any frame binds `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<B> Default for ScopeStack<B> {
    fn default() -> Self {
        ScopeStack::new()
    }
}
