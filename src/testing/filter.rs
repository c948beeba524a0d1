//! Class inclusion and exclusion
//!
//! Resolved once before any row runs. A non-empty `only` list skips every
//! class it does not name.

use std::collections::BTreeSet;

use super::registry::{all_classes, resolve, TestClass};

#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    skipped: BTreeSet<TestClass>,
}

impl ClassFilter {
    /// Build from user-supplied class names; unknown names are logged and ignored
    pub fn new<S: AsRef<str>>(skip: &[S], only: &[S]) -> Self {
        let mut skipped: BTreeSet<TestClass> = resolve_names(skip, "skip").collect();

        // an `only` list naming no known class still excludes everything
        if !only.is_empty() {
            let only: BTreeSet<TestClass> = resolve_names(only, "only").collect();
            skipped.extend(
                all_classes()
                    .map(|info| info.class)
                    .filter(|class| !only.contains(class)),
            );
        }

        if !skipped.is_empty() {
            tracing::info!(
                skipped = ?skipped.iter().map(|c| c.name()).collect::<Vec<_>>(),
                "classes excluded from this run"
            );
        }
        Self { skipped }
    }

    pub fn allows(&self, class: TestClass) -> bool {
        !self.skipped.contains(&class)
    }

    pub fn skipped(&self) -> impl Iterator<Item = TestClass> + '_ {
        self.skipped.iter().copied()
    }
}

fn resolve_names<'a, S: AsRef<str>>(
    names: &'a [S],
    list: &'static str,
) -> impl Iterator<Item = TestClass> + 'a {
    names.iter().filter_map(move |name| {
        let name = name.as_ref();
        let class = resolve(name);
        if class.is_none() {
            tracing::warn!(name, list, "unknown test class in filter, ignoring");
        }
        class
    })
}
