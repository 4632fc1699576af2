//! Dependency Validator
//!
//! Only presence is checked: a dependency is satisfied when a mod with that id
//! is loaded at the moment of validation. Versions are not compared, and the
//! check is not repeated if the dependency is unloaded afterwards.

use crate::error::{ModError, ModResult};

pub struct DependencyValidator;

impl DependencyValidator {
    /// Fail with the first dependency that `is_loaded` does not know about.
    pub fn validate<F>(dependencies: &[String], is_loaded: F) -> ModResult<()>
    where
        F: Fn(&str) -> bool,
    {
        match dependencies.iter().find(|dep| !is_loaded(dep.as_str())) {
            Some(missing) => Err(ModError::UnsatisfiedDependency(missing.clone())),
            None => Ok(()),
        }
    }

    /// Order a batch so that each mod follows the batch members it depends on.
    ///
    /// Dependencies outside the batch are left for [`validate`](Self::validate)
    /// to judge at registration time. Mods caught in a cycle keep their input
    /// order at the end of the result.
    pub fn load_order<T>(
        batch: Vec<T>,
        id_of: impl Fn(&T) -> &str,
        deps_of: impl Fn(&T) -> &[String],
    ) -> Vec<T> {
        let batch_ids: Vec<String> = batch.iter().map(|item| id_of(item).to_string()).collect();
        let mut placed: Vec<String> = Vec::new();
        let mut remaining: Vec<T> = batch;
        let mut sorted = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let ready = remaining.iter().position(|item| {
                deps_of(item).iter().all(|dep| {
                    placed.iter().any(|p| p == dep) || !batch_ids.iter().any(|id| id == dep)
                })
            });
            match ready {
                Some(index) => {
                    let item = remaining.remove(index);
                    placed.push(id_of(&item).to_string());
                    sorted.push(item);
                }
                None => {
                    log::warn!(
                        "cyclic mod dependencies among {} mods, loading them in file order",
                        remaining.len()
                    );
                    sorted.append(&mut remaining);
                }
            }
        }

        sorted
    }
}
