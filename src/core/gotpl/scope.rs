//! Local variable scopes for template emission.
//!
//! Every `if` branch, `else` branch and `list` body gets its own frame, so a
//! name assigned inside one branch is invisible to its siblings and to the
//! code after the block. Names declared in an enclosing frame stay visible.

use std::collections::HashMap;

use indexmap::IndexMap;

/// How a local name came into scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// `<#assign>` or `<#local>`.
    Assigned,
    /// The item variable of a `<#list>`.
    LoopItem,
    /// The synthesized `<item>_index` variable of a `<#list>`.
    LoopIndex,
}

/// A single scope frame (insertion ordered).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: IndexMap<String, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn get(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }
}

/// A stack of scope frames. The root frame is never popped.
#[derive(Debug, Clone)]
pub struct Scopes {
    stack: Vec<Scope>,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            stack: vec![Scope::new()],
        }
    }

    /// Push a new frame.
    pub fn enter(&mut self) {
        self.stack.push(Scope::new());
    }

    /// Pop the innermost frame.
    ///
    /// Returns the exited frame, or None if only the root frame remains.
    pub fn exit(&mut self) -> Option<Scope> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Declare a name in the innermost frame.
    pub fn define(&mut self, name: impl Into<String>, binding: Binding) {
        if let Some(scope) = self.stack.last_mut() {
            scope.define(name, binding);
        }
    }

    /// Look a name up from the innermost frame outwards.
    pub fn get(&self, name: &str) -> Option<Binding> {
        self.stack.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every visible name with its innermost binding.
    pub fn snapshot(&self) -> HashMap<String, Binding> {
        self.stack
            .iter()
            .flat_map(|scope| scope.bindings.iter())
            .map(|(name, binding)| (name.clone(), *binding))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_never_popped() {
        let mut scopes = Scopes::new();
        scopes.define("root", Binding::Assigned);
        assert!(scopes.exit().is_none());
        scopes.enter();
        assert!(scopes.exit().is_some());
        assert!(scopes.exit().is_none());
        assert!(scopes.is_local("root"));
    }

    #[test]
    fn test_inner_names_disappear_on_exit() {
        let mut scopes = Scopes::new();
        scopes.define("outer", Binding::Assigned);
        scopes.enter();
        scopes.define("inner", Binding::Assigned);
        assert!(scopes.is_local("outer"));
        assert!(scopes.is_local("inner"));
        let frame = scopes.exit().unwrap();
        assert_eq!(frame.get("inner"), Some(Binding::Assigned));
        assert_eq!(frame.get("outer"), None);
        assert!(!scopes.is_local("inner"));
        assert!(scopes.is_local("outer"));
    }

    #[test]
    fn test_innermost_binding_wins() {
        let mut scopes = Scopes::new();
        scopes.define("x", Binding::Assigned);
        scopes.enter();
        scopes.define("x", Binding::LoopItem);
        assert_eq!(scopes.get("x"), Some(Binding::LoopItem));
        scopes.exit();
        assert_eq!(scopes.get("x"), Some(Binding::Assigned));
    }

    #[test]
    fn test_snapshot_flattens_frames() {
        let mut scopes = Scopes::new();
        scopes.define("a", Binding::Assigned);
        scopes.enter();
        scopes.define("b", Binding::LoopItem);
        scopes.define("b_index", Binding::LoopIndex);
        scopes.define("a", Binding::LoopItem);
        let snapshot = scopes.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get("b_index"), Some(&Binding::LoopIndex));
        assert_eq!(snapshot.get("a"), Some(&Binding::LoopItem));
    }
}
