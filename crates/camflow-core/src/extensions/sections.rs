//! Named, rebuilt extension sections.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::types::SharedAny;

/// Options passed along with a contribution to the section's add callback
pub type ContributionOptions = serde_json::Map<String, serde_json::Value>;

/// Callback adding one contribution: `(object, label, options)`
pub type SectionAddFn = Rc<dyn Fn(&SharedAny, &str, &ContributionOptions)>;

/// Callback removing everything the add callback produced
pub type SectionClearFn = Rc<dyn Fn()>;

/// One entry of a section
#[derive(Clone)]
pub struct Contribution {
    /// Display label.
    pub label: String,
    /// Contributed object, compared by identity.
    pub object: SharedAny,
    /// Sort weight, lower comes first.
    pub weight: i32,
    /// Free-form options for the add callback.
    pub options: ContributionOptions,
}

impl std::fmt::Debug for Contribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contribution")
            .field("label", &self.label)
            .field("weight", &self.weight)
            .field("options", &self.options)
            .finish()
    }
}

#[derive(Default)]
struct Section {
    add: Option<SectionAddFn>,
    clear: Option<SectionClearFn>,
    contributions: Vec<Contribution>,
}

/// Registry of all sections
#[derive(Default)]
pub struct SectionRegistry {
    sections: RefCell<HashMap<String, Section>>,
}

impl SectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a section (or replace its callbacks) and rebuild it immediately
    pub fn register_section(
        &self,
        section: impl Into<String>,
        add: SectionAddFn,
        clear: SectionClearFn,
    ) {
        let section = section.into();
        {
            let mut sections = self.sections.borrow_mut();
            let entry = sections.entry(section.clone()).or_default();
            if entry.add.is_some() || entry.clear.is_some() {
                warn!("Replacing the callbacks of section {}", section);
            }
            entry.add = Some(add);
            entry.clear = Some(clear);
        }
        self.rebuild(&section);
    }

    /// Drop a section with all its contributions
    ///
    /// Returns false (and logs) if the section is unknown.
    pub fn unregister_section(&self, section: &str) -> bool {
        if self.sections.borrow_mut().remove(section).is_some() {
            true
        } else {
            info!("Trying to unregister a non-existent section: {}", section);
            false
        }
    }

    /// Add an object to a section and rebuild it
    ///
    /// Undeclared sections are created without callbacks. The same object cannot be
    /// contributed twice to one section.
    pub fn contribute(
        &self,
        section: &str,
        label: impl Into<String>,
        object: SharedAny,
        weight: i32,
        options: ContributionOptions,
    ) -> Result<(), RegistryError> {
        let label = label.into();
        {
            let mut sections = self.sections.borrow_mut();
            let entry = sections.entry(section.to_string()).or_insert_with(|| {
                info!("Contribution for non-existing section: {} -> {}", label, section);
                Section::default()
            });
            if entry
                .contributions
                .iter()
                .any(|c| Rc::ptr_eq(&c.object, &object))
            {
                info!("Tried to contribute twice: {} -> {}", section, label);
                return Err(RegistryError::DuplicateContribution {
                    section: section.to_string(),
                    label,
                });
            }
            entry.contributions.push(Contribution {
                label,
                object,
                weight,
                options,
            });
            entry.contributions.sort_by_key(|c| c.weight);
        }
        self.rebuild(section);
        Ok(())
    }

    /// Remove every entry of `object` from a section and rebuild it
    ///
    /// Returns the number of removed entries.
    pub fn withdraw(&self, section: &str, object: &SharedAny) -> usize {
        let removed = {
            let mut sections = self.sections.borrow_mut();
            let Some(entry) = sections.get_mut(section) else {
                info!("Trying to withdraw from unknown section: {}", section);
                return 0;
            };
            let before = entry.contributions.len();
            entry
                .contributions
                .retain(|c| !Rc::ptr_eq(&c.object, object));
            before - entry.contributions.len()
        };
        self.rebuild(section);
        removed
    }

    /// Contributions of a section in presentation order
    pub fn contributions(&self, section: &str) -> Vec<Contribution> {
        self.sections
            .borrow()
            .get(section)
            .map(|s| s.contributions.clone())
            .unwrap_or_default()
    }

    /// Whether the section exists (declared or auto-created)
    pub fn contains(&self, section: &str) -> bool {
        self.sections.borrow().contains_key(section)
    }

    /// Clear a section through its callback and re-add all contributions
    ///
    /// Sections without callbacks are left alone. Callbacks run on a snapshot, so they may
    /// touch the registry.
    pub fn rebuild(&self, section: &str) {
        let (add, clear, contributions) = {
            let sections = self.sections.borrow();
            let Some(entry) = sections.get(section) else {
                info!("Failed to rebuild unknown section: {}", section);
                return;
            };
            (
                entry.add.clone(),
                entry.clear.clone(),
                entry.contributions.clone(),
            )
        };
        if add.is_none() && clear.is_none() {
            return;
        }
        debug!(
            "Rebuilding section {} with {} contributions",
            section,
            contributions.len()
        );
        if let Some(clear) = clear {
            clear();
        }
        if let Some(add) = add {
            for item in &contributions {
                add(&item.object, &item.label, &item.options);
            }
        }
    }
}

impl std::fmt::Debug for SectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionRegistry")
            .field("sections", &self.sections.borrow().len())
            .finish()
    }
}
