use std::{collections::HashMap, fmt, num::NonZeroU32, rc::Rc};

/// A handle to an interned identifier. To retrieve the `&str`, use
/// [`Interner::get`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(NonZeroU32);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Identifier interner, owned by a single compilation.
pub struct Interner {
    map: HashMap<Rc<str>, Name>,
    vec: Vec<Rc<str>>,
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (i, name) in self.vec.iter().enumerate() {
            map.entry(&(i + 1), name);
        }
        map.finish()
    }
}

impl Interner {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            vec: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Interns the provided identifier, returning a handle which can be used
    /// to retrieve it later. Equal strings always map to the same handle.
    pub fn intern(&mut self, value: &str) -> Name {
        if let Some(name) = self.map.get(value) {
            return *name;
        }
        let len = u32::try_from(self.vec.len()).expect("interned out of capacity");
        let name = Name(NonZeroU32::MIN.saturating_add(len));
        let key: Rc<str> = Rc::from(value);
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, name);
        name
    }

    /// Returns the handle of an already interned identifier.
    pub fn lookup(&self, value: &str) -> Option<Name> {
        self.map.get(value).copied()
    }

    /// Returns the identifier for the provided handle. Panics if the handle
    /// comes from another interner.
    pub fn get(&self, name: Name) -> &str {
        &self.vec[name.0.get() as usize - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner() {
        let mut i = Interner::with_capacity(3);

        let hello1 = i.intern("hello");
        let world1 = i.intern("world");
        let hello2 = i.intern("hello");

        assert_eq!(hello1, hello2);
        assert_ne!(hello1, world1);
        assert_eq!(i.get(hello1), "hello");
        assert_eq!(i.get(world1), "world");
        assert_eq!(i.len(), 2);

        assert_eq!(i.lookup("world"), Some(world1));
        assert_eq!(i.lookup("nope"), None);
    }
}
