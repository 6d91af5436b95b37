//! Modules: named translation units.

use crate::node::NodeId;
use crate::stmt::Statement;
use spicy_base::Id;

/// The four-part identity that uniquely names a loaded module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleUid {
    pub name: Id,
    pub canonical_path: String,
    /// Selects the front-end grammar (`.hlt` vs `.spicy`).
    pub parse_extension: String,
    /// Determines later-stage handling, e.g. linking semantics.
    pub process_extension: String,
}

impl ModuleUid {
    pub fn new(name: Id, canonical_path: impl Into<String>, parse_extension: &str, process_extension: &str) -> Self {
        ModuleUid {
            name,
            canonical_path: canonical_path.into(),
            parse_extension: parse_extension.to_string(),
            process_extension: process_extension.to_string(),
        }
    }
}

/// A named translation unit: a list of declarations, a module-init
/// statement block, and the modules it imports.
#[derive(Debug)]
pub struct Module {
    pub uid: ModuleUid,
    pub declarations: Vec<NodeId>,
    pub init: Statement,
    pub imports: Vec<Id>,
}

impl Module {
    pub fn new(uid: ModuleUid) -> Self {
        Module {
            uid,
            declarations: Vec::new(),
            init: Statement::Block(Vec::new()),
            imports: Vec::new(),
        }
    }

    pub fn add_declaration(&mut self, id: NodeId) {
        self.declarations.push(id);
    }

    pub fn add_import(&mut self, name: Id) {
        self.imports.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_uid_distinguishes_by_all_four_fields() {
        let mut interner = spicy_base::Interner::new();
        let name = Id::parse(&mut interner, "Foo");
        let a = ModuleUid::new(name.clone(), "/a.spicy", "spicy", "spicy");
        let b = ModuleUid::new(name, "/b.spicy", "spicy", "spicy");
        assert_ne!(a, b);
    }

    #[test]
    fn new_module_has_empty_declarations() {
        let mut interner = spicy_base::Interner::new();
        let name = Id::parse(&mut interner, "M");
        let module = Module::new(ModuleUid::new(name, "/m.spicy", "spicy", "spicy"));
        assert!(module.declarations.is_empty());
    }
}
