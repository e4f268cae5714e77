//! Identifier allocation for generated methods.
//!
//! Unnamed and `_` fields get readable names (`ctx`, `err`, `a`, `b`, ...),
//! and every method gets a span variable, none of which may collide with
//! file-scope names or with other names of the same method.

use std::collections::{HashMap, HashSet};

use crate::model::{Method, Role, Tuple};

/// Receiver identifier of every generated method
pub const RECEIVER: &str = "w";

/// Names of one method: its original names plus every assigned one
pub type LocalNames = HashMap<String, Role>;

/// Recommended name for `role`, suffixed with `1`, `2`, ... until it is free.
///
/// `index` picks the letter for fields without a recognized role.
pub fn assign_name(global: &HashSet<String>, local: &LocalNames, index: usize, role: Role) -> String {
    let recommended = match role {
        Role::Context => "ctx".to_string(),
        Role::Error => "err".to_string(),
        Role::Span => "span".to_string(),
        Role::None => char::from(b'a' + (index % 26) as u8).to_string(),
    };

    let mut candidate = recommended.clone();
    let mut retry = 1;
    while global.contains(&candidate) || local.contains_key(&candidate) {
        candidate = format!("{recommended}{retry}");
        retry += 1;
    }
    candidate
}

/// File-scope names that generated identifiers must avoid
#[derive(Debug, Clone, Default)]
pub struct IdentifierAllocator {
    global: HashSet<String>,
}

impl IdentifierAllocator {
    /// Starts with the receiver name reserved.
    pub fn new() -> Self {
        let mut allocator = Self::default();
        allocator.add_global(RECEIVER);
        allocator
    }

    pub fn add_global(&mut self, name: impl Into<String>) {
        self.global.insert(name.into());
    }

    pub fn globals(&self) -> &HashSet<String> {
        &self.global
    }

    /// Names the fields of `method` in place and returns its span variable.
    pub fn assign_method(&self, method: &mut Method) -> String {
        let mut local: LocalNames = HashMap::new();
        local.insert(method.name.clone(), Role::None);
        for field in method.params.iter().chain(&method.results) {
            if !field.has_placeholder_name() && field.name != RECEIVER {
                local.insert(field.name.clone(), field.role);
            }
        }

        // A field named after the receiver would shadow it.
        self.rename_fields(&mut local, &mut method.params, 1, |t| t.name == RECEIVER);
        self.rename_fields(&mut local, &mut method.results, 0, |t| t.name == RECEIVER);

        let global = &self.global;
        let needs_name = |t: &Tuple| t.has_placeholder_name() || global.contains(&t.name);
        self.rename_fields(&mut local, &mut method.params, 1, needs_name);
        self.rename_fields(&mut local, &mut method.results, 0, needs_name);

        let span = assign_name(&self.global, &local, 0, Role::Span);
        local.insert(span.clone(), Role::Span);
        span
    }

    /// Parameter letters start one position earlier than results so a
    /// leading context does not use up `a`.
    fn rename_fields<P>(&self, local: &mut LocalNames, fields: &mut [Tuple], offset: usize, predicate: P)
    where
        P: Fn(&Tuple) -> bool,
    {
        for (i, field) in fields.iter_mut().enumerate() {
            if !predicate(field) {
                continue;
            }
            let name = assign_name(&self.global, local, i.saturating_sub(offset), field.role);
            local.insert(name.clone(), field.role);
            field.name = name;
        }
    }
}
