use crate::{Guard, GuardedRecord};
use std::sync::Arc;

/// What a relation accessor returned, reduced to the guards of the records
/// in it.
#[derive(Debug, Clone)]
pub enum Relation {
    /// No record, e.g. an unset optional relation.
    Empty,
    /// A single record.
    Single(Guard),
    /// A homogeneous collection of records, possibly empty.
    Collection(Vec<Guard>),
}

impl Relation {
    /// Every guard in the relation.
    pub fn into_guards(self) -> Vec<Guard> {
        match self {
            Relation::Empty => Vec::new(),
            Relation::Single(guard) => vec![guard],
            Relation::Collection(guards) => guards,
        }
    }
}

/// Values that may be the target of an access-extending relation, or of a
/// restricted type-level grant.
pub trait PhiTarget {
    /// Classify this value.
    fn classify(&self) -> Relation;
}

impl PhiTarget for Guard {
    fn classify(&self) -> Relation {
        Relation::Single(self.clone())
    }
}

impl<R: GuardedRecord> PhiTarget for &R {
    fn classify(&self) -> Relation {
        Relation::Single(self.guard().clone())
    }
}

impl<R: GuardedRecord> PhiTarget for Arc<R> {
    fn classify(&self) -> Relation {
        Relation::Single(self.guard().clone())
    }
}

impl<T: PhiTarget> PhiTarget for Option<T> {
    fn classify(&self) -> Relation {
        match self {
            Some(target) => target.classify(),
            None => Relation::Empty,
        }
    }
}

impl<T: PhiTarget> PhiTarget for [T] {
    fn classify(&self) -> Relation {
        collection(self)
    }
}

impl<T: PhiTarget, const N: usize> PhiTarget for [T; N] {
    fn classify(&self) -> Relation {
        collection(self)
    }
}

impl<T: PhiTarget> PhiTarget for Vec<T> {
    fn classify(&self) -> Relation {
        collection(self)
    }
}

fn collection<T: PhiTarget>(items: &[T]) -> Relation {
    Relation::Collection(
        items
            .iter()
            .flat_map(|item| item.classify().into_guards())
            .collect(),
    )
}
