//! String interning for identifier and literal text deduplication.
//!
//! Both the type universe (string/char literal kinds carry no payload here,
//! but diagnostics and symbol names do) and the symbol table key children by
//! name; interning keeps those comparisons and hashes cheap.

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

/// An interned string handle. Cheap to copy and compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

/// A simple append-only string interner.
///
/// Not sharded: the semantic core runs single-threaded within one analysis
/// session (spec §5), so a single `Mutex`-guarded table is sufficient and
/// matches the session-scoped, arena-owned lifetime of everything else.
pub struct Interner {
    inner: Mutex<InternerInner>,
}

struct InternerInner {
    strings: Vec<Arc<str>>,
    lookup: FxHashMap<Arc<str>, Atom>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Interner { inner: Mutex::new(InternerInner { strings: Vec::new(), lookup: FxHashMap::default() }) }
    }

    pub fn intern(&self, s: &str) -> Atom {
        let mut inner = self.inner.lock().unwrap();
        if let Some(atom) = inner.lookup.get(s) {
            return *atom;
        }
        let arc: Arc<str> = Arc::from(s);
        let atom = Atom(inner.strings.len() as u32);
        inner.strings.push(arc.clone());
        inner.lookup.insert(arc, atom);
        atom
    }

    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let inner = self.inner.lock().unwrap();
        inner.strings[atom.0 as usize].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(&*interner.resolve(a), "foo");
    }
}
