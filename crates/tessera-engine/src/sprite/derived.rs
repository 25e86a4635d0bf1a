/// A cached value derived from other state.
///
/// Mutators mark it [`Dirty`](Self::Dirty) instead of recomputing; the value
/// is rebuilt on the next [`resolve`](Self::resolve). A dirty cell still holds
/// its last value, which is what a read before resolving observes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Derived<T> {
    Clean(T),
    Dirty(T),
}

impl<T: Copy> Derived<T> {
    /// The cached value, stale if dirty.
    #[inline]
    pub fn get(&self) -> T {
        match *self {
            Self::Clean(v) | Self::Dirty(v) => v,
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty(_))
    }

    #[inline]
    pub fn invalidate(&mut self) {
        *self = Self::Dirty(self.get());
    }

    /// Edits the cached value without changing its state.
    pub fn update_in_place(&mut self, f: impl FnOnce(&mut T)) {
        match self {
            Self::Clean(v) | Self::Dirty(v) => f(v),
        }
    }

    /// Recomputes with `f` if dirty and returns the clean value.
    pub fn resolve(&mut self, f: impl FnOnce() -> T) -> T {
        if self.is_dirty() {
            *self = Self::Clean(f());
        }
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_only_recomputes_dirty_values() {
        let mut calls = 0;
        let mut d = Derived::Dirty(0);
        assert_eq!(d.resolve(|| { calls += 1; 5 }), 5);
        assert_eq!(d.resolve(|| { calls += 1; 9 }), 5);
        assert_eq!(calls, 1);

        d.invalidate();
        assert_eq!(d.get(), 5);
        assert_eq!(d.resolve(|| 9), 9);
    }

    #[test]
    fn in_place_edit_keeps_state() {
        let mut d = Derived::Clean(1);
        d.update_in_place(|v| *v += 1);
        assert_eq!(d, Derived::Clean(2));
    }
}
