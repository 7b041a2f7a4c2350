use crate::config::Theme;
use crate::context::Backend;
use crate::debugger::address::RelocatedAddress;
use crate::muted_error;
use crate::ui::style::{FunctionNameView, RegionValueView};
use itertools::Itertools;
use smallvec::{smallvec, SmallVec};
use std::collections::HashSet;

const ARROW: &str = " —▸ ";

/// Reason why pointer chain resolution stopped.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Termination {
    /// Last value is not an address of readable memory.
    Unreadable,
    /// Next value is already in the chain.
    Cycle,
    /// Maximum number of dereferences reached.
    HopLimit,
}

/// Sequence of values where each next value is read from memory at the previous one.
/// Never empty, the first value is the one the chain was resolved for.
#[derive(Clone, PartialEq, Debug)]
pub struct Chain {
    values: SmallVec<[u64; 8]>,
    termination: Termination,
}

impl Chain {
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }
}

/// Follows pointers through process memory.
#[derive(Clone, Copy, Debug)]
pub struct ChainResolver {
    max_hops: usize,
}

impl ChainResolver {
    pub fn new(max_hops: usize) -> Self {
        Self { max_hops }
    }

    /// Dereference `value` while it points into readable memory.
    ///
    /// Stops at an unreadable address, at a value that is already in the chain, or
    /// after `max_hops` dereferences. Read errors end the chain and are never returned.
    pub fn resolve<B: Backend>(&self, backend: &B, value: u64) -> Chain {
        let mut values: SmallVec<[u64; 8]> = smallvec![value];
        let mut visited = HashSet::from([value]);

        let termination = loop {
            let addr = RelocatedAddress::from(*values.last().expect("chain is never empty"));

            let readable = backend
                .find_region(addr)
                .map(|region| region.read)
                .unwrap_or_default();
            if !readable {
                break Termination::Unreadable;
            }
            if values.len() > self.max_hops {
                break Termination::HopLimit;
            }
            let Some(next) = muted_error!(backend.read_pointer(addr)) else {
                break Termination::Unreadable;
            };
            if !visited.insert(next) {
                break Termination::Cycle;
            }
            values.push(next);
        };

        Chain {
            values,
            termination,
        }
    }
}

/// Render a chain: values colored by memory region kind, annotated with symbols, joined by arrows.
pub fn format_chain<B: Backend>(backend: &B, chain: &Chain, theme: Theme) -> String {
    let mut text = chain
        .values()
        .iter()
        .map(|&value| {
            let addr = RelocatedAddress::from(value);
            let kind = backend.find_region(addr).map(|r| r.kind());
            let value = RegionValueView::new(addr, kind, theme);
            match backend.lookup_symbol(addr) {
                None => value.to_string(),
                Some(symbol) => format!("{value} ({})", FunctionNameView::new(symbol, theme)),
            }
        })
        .join(ARROW);

    match chain.termination() {
        Termination::Unreadable => {}
        Termination::Cycle => text.push_str(" ◂— cycle"),
        Termination::HopLimit => {
            text.push_str(ARROW);
            text.push('…');
        }
    }
    text
}
