// ============================================================================
// Ownership Cell
// Copy-on-write holder of a shared snapshot or an exclusively owned value
// ============================================================================

use crate::interfaces::evaluation;
use crate::interfaces::{DeepClone, Magnitude};
use std::fmt;
use std::sync::Arc;

enum Slot<T: ?Sized> {
    Empty,
    Shared(Arc<T>),
    Owned(Box<T>),
}

/// Copy-on-write container.
///
/// A cell is empty, shares an immutable snapshot, or exclusively owns its
/// value; the three states are variants of one enum so a cell can never hold
/// a snapshot and an owned value at once. Sharing is explicit through
/// [`OwnershipCell::snapshot`]; the deep copy is deferred until one side asks
/// for mutable access.
///
/// # Example
///
/// ```
/// use precise_eval::domain::OwnershipCell;
///
/// let mut a = OwnershipCell::from_owned(Box::new(1.5f64));
/// let b = a.snapshot();
/// assert!(a.is_shared() && b.is_shared());
///
/// *a.get_mut().unwrap() = 4.0;
/// assert_eq!(a.get(), Some(&4.0));
/// assert_eq!(b.get(), Some(&1.5));
/// ```
pub struct OwnershipCell<T: ?Sized> {
    slot: Slot<T>,
}

/// Cell over the polymorphic magnitude interface.
pub type MagnitudeCell = OwnershipCell<dyn Magnitude>;

impl<T: ?Sized> OwnershipCell<T> {
    pub fn new() -> Self {
        Self { slot: Slot::Empty }
    }

    pub fn from_shared(snapshot: Arc<T>) -> Self {
        Self {
            slot: Slot::Shared(snapshot),
        }
    }

    pub fn from_owned(value: Box<T>) -> Self {
        Self {
            slot: Slot::Owned(value),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.slot, Slot::Empty)
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self.slot, Slot::Shared(_))
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self.slot, Slot::Owned(_))
    }

    /// Current value, shared or owned. Never allocates.
    pub fn get(&self) -> Option<&T> {
        match &self.slot {
            Slot::Empty => None,
            Slot::Shared(snapshot) => Some(&**snapshot),
            Slot::Owned(value) => Some(&**value),
        }
    }

    /// The exclusively owned value, if the cell owns one.
    pub fn get_owned_mut(&mut self) -> Option<&mut T> {
        match &mut self.slot {
            Slot::Owned(value) => Some(&mut **value),
            _ => None,
        }
    }

    /// The snapshot handle, if the cell shares one.
    pub fn shared_handle(&self) -> Option<&Arc<T>> {
        match &self.slot {
            Slot::Shared(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Drop the held value (the snapshot survives while other holders remain).
    pub fn clear(&mut self) {
        self.slot = Slot::Empty;
    }

    /// Move the contents out, leaving the cell empty.
    pub fn take(&mut self) -> Self {
        Self {
            slot: std::mem::replace(&mut self.slot, Slot::Empty),
        }
    }

    /// Freeze-and-share. An owned value is released into a new snapshot, this
    /// cell is repointed at it, and a second cell on the same snapshot is
    /// returned. A shared cell just hands out another handle.
    pub fn snapshot(&mut self) -> Self {
        match std::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Empty => Self::new(),
            Slot::Shared(snapshot) => {
                let copy = Arc::clone(&snapshot);
                self.slot = Slot::Shared(snapshot);
                Self::from_shared(copy)
            },
            Slot::Owned(value) => {
                let snapshot: Arc<T> = Arc::from(value);
                let copy = Arc::clone(&snapshot);
                self.slot = Slot::Shared(snapshot);
                Self::from_shared(copy)
            },
        }
    }
}

impl<T: ?Sized + DeepClone> OwnershipCell<T> {
    /// Mutable access. A shared snapshot is deep-cloned first and the cell
    /// becomes its exclusive owner; other snapshot holders are unaffected.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if let Slot::Shared(snapshot) = &self.slot {
            let detached = DeepClone::deep_clone(&**snapshot);
            self.slot = Slot::Owned(detached);
        }
        self.get_owned_mut()
    }

    /// Owned copy of the current value.
    pub fn to_owned_value(&self) -> Option<Box<T>> {
        self.get().map(DeepClone::deep_clone)
    }
}

impl<T> OwnershipCell<T> {
    pub fn owned(value: T) -> Self {
        Self::from_owned(Box::new(value))
    }
}

impl<T: ?Sized> Default for OwnershipCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for OwnershipCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Empty => f.write_str("OwnershipCell::Empty"),
            Slot::Shared(snapshot) => f
                .debug_tuple("OwnershipCell::Shared")
                .field(&&**snapshot)
                .finish(),
            Slot::Owned(value) => f
                .debug_tuple("OwnershipCell::Owned")
                .field(&&**value)
                .finish(),
        }
    }
}

// ============================================================================
// Magnitude Cells
// ============================================================================

/// Typed view of a magnitude cell.
///
/// The read-only reference is always available; the mutable one only when
/// the cell exclusively owns its value, so inspecting a shared snapshot
/// never forces a clone.
pub enum TypedAccess<'a, U> {
    Writable(&'a mut U),
    ReadOnly(&'a U),
}

impl<'a, U> TypedAccess<'a, U> {
    pub fn read(&self) -> &U {
        match self {
            TypedAccess::Writable(value) => value,
            TypedAccess::ReadOnly(value) => value,
        }
    }

    pub fn writable(&mut self) -> Option<&mut U> {
        match self {
            TypedAccess::Writable(value) => Some(&mut **value),
            TypedAccess::ReadOnly(_) => None,
        }
    }

    pub fn into_writable(self) -> Option<&'a mut U> {
        match self {
            TypedAccess::Writable(value) => Some(value),
            TypedAccess::ReadOnly(_) => None,
        }
    }
}

impl OwnershipCell<dyn Magnitude> {
    pub fn from_value<M: Magnitude>(value: M) -> Self {
        Self::from_owned(Box::new(value))
    }

    /// Downcast to a concrete representation without forcing a clone.
    pub fn downcast<U: Magnitude>(&mut self) -> Option<TypedAccess<'_, U>> {
        match &mut self.slot {
            Slot::Empty => None,
            Slot::Shared(snapshot) => snapshot.downcast_ref::<U>().map(TypedAccess::ReadOnly),
            Slot::Owned(value) => value.downcast_mut::<U>().map(TypedAccess::Writable),
        }
    }

    /// Read-only downcast.
    pub fn downcast_ref<U: Magnitude>(&self) -> Option<&U> {
        self.get().and_then(|value| value.downcast_ref::<U>())
    }

    /// Replace the held value with a cheaper representation when one is
    /// registered. A shared snapshot is not cloned: the replacement is built
    /// from a read-only view and the cell takes ownership of it.
    pub fn destructive_evaluate(&mut self) -> bool {
        let replacement = match self.get() {
            Some(value) => evaluation::destructive_evaluate(value),
            None => None,
        };
        match replacement {
            Some(cheaper) => {
                self.slot = Slot::Owned(cheaper);
                true
            },
            None => false,
        }
    }

    /// In-place simplification; clones a shared snapshot only if something
    /// would change.
    pub fn simplify(&mut self) -> bool {
        let needs_work = self.get().is_some_and(evaluation::would_simplify);
        if !needs_work {
            return false;
        }
        match self.get_mut() {
            Some(value) => evaluation::simplify(value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Interval;

    #[test]
    fn test_empty_cell() {
        let mut cell: OwnershipCell<f64> = OwnershipCell::new();
        assert!(cell.is_empty());
        assert!(cell.get().is_none());
        assert!(cell.get_mut().is_none());
        assert!(cell.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_isolation() {
        let mut a = OwnershipCell::owned(10.0f64);
        let b = a.snapshot();
        assert_eq!(a.get(), b.get());
        assert!(a.is_shared());

        *a.get_mut().unwrap() += 1.0;
        assert!(a.is_owned());
        assert_eq!(a.get(), Some(&11.0));
        assert_eq!(b.get(), Some(&10.0));
    }

    #[test]
    fn test_snapshot_shares_allocation() {
        let mut a = OwnershipCell::owned(String::from("mass"));
        let b = a.snapshot();
        let c = a.snapshot();
        let handle = a.shared_handle().unwrap();
        assert!(Arc::ptr_eq(handle, b.shared_handle().unwrap()));
        assert!(Arc::ptr_eq(handle, c.shared_handle().unwrap()));
        assert_eq!(Arc::strong_count(handle), 3);
    }

    #[test]
    fn test_last_holder_keeps_value() {
        let mut a = OwnershipCell::owned(vec![1, 2, 3]);
        let b = a.snapshot();
        a.clear();
        assert_eq!(b.get(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn test_move_does_not_freeze() {
        let a = OwnershipCell::owned(2.0f64);
        let b = a;
        assert!(b.is_owned());

        let mut c = OwnershipCell::owned(3.0f64);
        let d = c.take();
        assert!(c.is_empty());
        assert!(d.is_owned());
    }

    #[test]
    fn test_magnitude_cell_clone_on_write() {
        let mut a = MagnitudeCell::from_value(0.75f64);
        let b = a.snapshot();
        {
            let value = a.get_mut().unwrap();
            assert!(value.scale_by_power_of_two(2));
        }
        assert_eq!(a.downcast_ref::<f64>(), Some(&3.0));
        assert_eq!(b.downcast_ref::<f64>(), Some(&0.75));
    }

    #[test]
    fn test_typed_access() {
        let mut owned = MagnitudeCell::from_value(2.5f64);
        match owned.downcast::<f64>() {
            Some(mut access) => {
                assert_eq!(*access.read(), 2.5);
                *access.writable().unwrap() = 5.0;
            },
            None => panic!("downcast failed"),
        }
        assert_eq!(owned.downcast_ref::<f64>(), Some(&5.0));

        let mut shared = owned.snapshot();
        let access = shared.downcast::<f64>().unwrap();
        assert_eq!(*access.read(), 5.0);
        assert!(matches!(access, TypedAccess::ReadOnly(_)));
        assert!(shared.is_shared());

        assert!(shared.downcast::<f32>().is_none());
        let mut empty = MagnitudeCell::new();
        assert!(empty.downcast::<f64>().is_none());
    }

    #[test]
    fn test_destructive_evaluate_without_clone() {
        let mut a = MagnitudeCell::from_value(Interval::point(4.0f64).unwrap());
        let b = a.snapshot();
        assert!(a.destructive_evaluate());
        assert_eq!(a.downcast_ref::<f64>(), Some(&4.0));
        assert!(b.downcast_ref::<Interval<f64>>().is_some());

        let mut scalar = MagnitudeCell::from_value(1.0f64);
        assert!(!scalar.destructive_evaluate());
    }

    #[test]
    fn test_simplify_leaves_snapshot_alone() {
        let mut a = MagnitudeCell::from_value(Interval::new(-0.0f64, 1.0).unwrap());
        let b = a.snapshot();
        assert!(a.simplify());
        let lo = a.downcast_ref::<Interval<f64>>().unwrap().lo();
        assert!(lo.is_sign_positive());
        let original = b.downcast_ref::<Interval<f64>>().unwrap().lo();
        assert!(original.is_sign_negative());

        let mut plain = MagnitudeCell::from_value(1.0f64);
        let _keep = plain.snapshot();
        assert!(!plain.simplify());
        assert!(plain.is_shared());
    }
}
