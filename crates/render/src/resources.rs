use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

struct Entry<R> {
    resource: Rc<R>,
    users: usize,
}

/// Reference-counted cache of resources shared by every instance of a kind.
///
/// The first [`acquire`](Self::acquire) of a kind creates the resource; the
/// last matching [`release`](Self::release) hands it back for teardown.
pub struct SharedResources<K, R> {
    entries: HashMap<K, Entry<R>>,
}

impl<K, R> Default for SharedResources<K, R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, R> SharedResources<K, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared resource for `kind`, created with `create` if this is the first
    /// user. A failed creation registers no user.
    pub fn acquire<E>(
        &mut self,
        kind: K,
        create: impl FnOnce() -> Result<R, E>,
    ) -> Result<Rc<R>, E> {
        if let Some(entry) = self.entries.get_mut(&kind) {
            entry.users += 1;
            return Ok(Rc::clone(&entry.resource));
        }
        let resource = Rc::new(create()?);
        self.entries.insert(
            kind,
            Entry {
                resource: Rc::clone(&resource),
                users: 1,
            },
        );
        Ok(resource)
    }

    /// Drop one user of `kind`. Returns the resource when that was the last
    /// user so the caller can destroy it.
    pub fn release(&mut self, kind: &K) -> Option<Rc<R>> {
        let entry = self.entries.get_mut(kind)?;
        entry.users -= 1;
        if entry.users > 0 {
            return None;
        }
        self.entries.remove(kind).map(|entry| entry.resource)
    }

    pub fn users(&self, kind: &K) -> usize {
        self.entries.get(kind).map_or(0, |entry| entry.users)
    }

    pub fn contains(&self, kind: &K) -> bool {
        self.entries.contains_key(kind)
    }
}
