//! Weight-ordered call chains.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

/// Weight used when a contributor has no preference
pub const DEFAULT_CHAIN_WEIGHT: i32 = 100;

/// A chain member; downcasts the shared argument to what it expects
pub type ChainFn = Rc<dyn Fn(&mut dyn Any)>;

#[derive(Clone)]
struct ChainLink {
    func: ChainFn,
    weight: i32,
}

/// Registry of named chains
#[derive(Default)]
pub struct ChainRegistry {
    chains: RefCell<HashMap<String, Vec<ChainLink>>>,
}

impl ChainRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callable to a chain, keeping the chain sorted by weight
    pub fn register_chain(&self, name: impl Into<String>, func: ChainFn, weight: i32) {
        let mut chains = self.chains.borrow_mut();
        let links = chains.entry(name.into()).or_default();
        links.push(ChainLink { func, weight });
        links.sort_by_key(|link| link.weight);
    }

    /// Remove the first occurrence of `func` from a chain
    pub fn unregister_chain(&self, name: &str, func: &ChainFn) -> bool {
        let mut chains = self.chains.borrow_mut();
        let Some(links) = chains.get_mut(name) else {
            info!("Trying to unregister from unknown chain: {}", name);
            return false;
        };
        match links.iter().position(|link| Rc::ptr_eq(&link.func, func)) {
            Some(index) => {
                links.remove(index);
                true
            }
            None => {
                info!("Trying to unregister unknown function from {}", name);
                false
            }
        }
    }

    /// Run every member of a chain in order with the same argument
    ///
    /// Returns false if the chain was never declared.
    pub fn call_chain(&self, name: &str, args: &mut dyn Any) -> bool {
        let links = match self.chains.borrow().get(name) {
            Some(links) => links.clone(),
            None => {
                debug!("Called an unknown chain: {}", name);
                return false;
            }
        };
        for link in &links {
            (link.func)(args);
        }
        true
    }

    /// Number of members of a chain
    pub fn len(&self, name: &str) -> usize {
        self.chains.borrow().get(name).map_or(0, Vec::len)
    }

    /// True if no chain has been declared
    pub fn is_empty(&self) -> bool {
        self.chains.borrow().is_empty()
    }
}

impl std::fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRegistry")
            .field("chains", &self.chains.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pusher(tag: &'static str) -> ChainFn {
        Rc::new(move |args: &mut dyn Any| {
            if let Some(list) = args.downcast_mut::<Vec<&'static str>>() {
                list.push(tag);
            }
        })
    }

    #[test]
    fn test_chain_runs_by_weight() {
        let chains = ChainRegistry::new();
        chains.register_chain("toolpath_filters", pusher("late"), 200);
        chains.register_chain("toolpath_filters", pusher("default"), DEFAULT_CHAIN_WEIGHT);
        chains.register_chain("toolpath_filters", pusher("early"), 10);
        chains.register_chain("toolpath_filters", pusher("default2"), DEFAULT_CHAIN_WEIGHT);

        let mut out: Vec<&'static str> = Vec::new();
        assert!(chains.call_chain("toolpath_filters", &mut out));
        assert_eq!(out, vec!["early", "default", "default2", "late"]);
    }

    #[test]
    fn test_unknown_chain_is_noop() {
        let chains = ChainRegistry::new();
        let mut out: Vec<&'static str> = Vec::new();
        assert!(!chains.call_chain("missing", &mut out));
        assert!(out.is_empty());
        assert!(!chains.unregister_chain("missing", &pusher("x")));
    }

    #[test]
    fn test_unregister_first_match_only() {
        let chains = ChainRegistry::new();
        let func = pusher("x");
        chains.register_chain("c", func.clone(), 1);
        chains.register_chain("c", func.clone(), 2);
        assert!(chains.unregister_chain("c", &func));
        assert_eq!(chains.len("c"), 1);
        assert!(!chains.unregister_chain("c", &pusher("y")));
    }

    #[test]
    fn test_mismatched_argument_type_is_ignored() {
        let chains = ChainRegistry::new();
        chains.register_chain("c", pusher("x"), 1);
        let mut other = 5u32;
        assert!(chains.call_chain("c", &mut other));
        assert_eq!(other, 5);
    }
}
