//! Local `$ref` inlining for endpoint docs

use serde_yaml::{Mapping, Value};

/// Keys whose subtrees are copied verbatim, never expanded
const SKIP_KEYS: [&str; 1] = ["examples"];

/// Inlines `#/...` references against the document they came from.
///
/// A ref that is already being expanded further up the same branch is left as
/// written, so recursive schemas are expanded once per level of nesting at most.
pub struct Dereferencer<'a> {
    /// Root of the OpenAPI document
    root: &'a Value,
    /// Maximum number of nested refs followed on one branch
    max_depth: usize,
}

impl<'a> Dereferencer<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root, max_depth: 10 }
    }

    /// Return a copy of `value` with every resolvable, non-recursive local `$ref`
    /// replaced by its target
    pub fn resolve(&self, value: &Value) -> Value {
        let mut active = Vec::new();
        self.resolve_branch(value, &mut active)
    }

    /// `active` holds the pointers being expanded between the root and `value`
    fn resolve_branch(&self, value: &Value, active: &mut Vec<String>) -> Value {
        match value {
            Value::Mapping(map) => {
                if let Some(Value::String(pointer)) = map.get("$ref") {
                    if active.len() >= self.max_depth || active.contains(pointer) {
                        return value.clone();
                    }
                    let Some(target) = self.lookup(pointer) else {
                        return value.clone();
                    };

                    active.push(pointer.clone());
                    let resolved = self.resolve_branch(target, active);
                    active.pop();
                    return resolved;
                }

                let mut result = Mapping::with_capacity(map.len());
                for (key, child) in map {
                    let skip = key.as_str().is_some_and(|k| SKIP_KEYS.contains(&k));
                    let resolved = if skip {
                        child.clone()
                    } else {
                        self.resolve_branch(child, active)
                    };
                    result.insert(key.clone(), resolved);
                }
                Value::Mapping(result)
            }
            Value::Sequence(items) => Value::Sequence(
                items
                    .iter()
                    .map(|item| self.resolve_branch(item, active))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    /// Follow a JSON pointer like `#/components/schemas/Product`
    fn lookup(&self, pointer: &str) -> Option<&'a Value> {
        let path = pointer.strip_prefix("#/")?;
        path.split('/').try_fold(self.root, |node, segment| {
            let segment = segment.replace("~1", "/").replace("~0", "~");
            node.as_mapping()?.get(segment.as_str())
        })
    }
}
