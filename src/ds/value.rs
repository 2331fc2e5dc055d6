//! Values produced by definition blocks.
//!
//! A helper's value has no fixed type, so the cache stores it as `Rc<dyn Any>`
//! and accessors downcast at the point of use. Every read hands out the same
//! `Rc`, so a value wrapped in a `RefCell` can be mutated in place and the
//! mutation is seen by every later read in the same example.

use std::any::Any;
use std::rc::Rc;

use crate::ds::error::{HelperError, HelperResult};
use crate::helper::declaration::HelperId;

pub type HelperValue = Rc<dyn Any>;

pub fn helper_value<T: Any>(value: T) -> HelperValue {
    Rc::new(value)
}

/// Downcast a cached value, reporting the helper it came from on mismatch.
pub fn downcast_value<T: Any>(id: &HelperId, value: HelperValue) -> HelperResult<Rc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| HelperError::TypeMismatch {
            id: id.clone(),
            expected: std::any::type_name::<T>(),
        })
}

/// Do two reads refer to the very same value?
pub fn same_value(a: &HelperValue, b: &HelperValue) -> bool {
    Rc::ptr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_downcast_mismatch_names_helper() {
        let value = helper_value(5_u32);
        let err = downcast_value::<String>(&HelperId::named("count"), value).unwrap_err();
        match err {
            HelperError::TypeMismatch { id, expected } => {
                assert_eq!(id, HelperId::named("count"));
                assert!(expected.contains("String"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_shared_value_mutation_is_visible() {
        let value = helper_value(RefCell::new(vec![1]));
        let first = downcast_value::<RefCell<Vec<i32>>>(&HelperId::Default, value.clone()).unwrap();
        first.borrow_mut().push(2);
        let second = downcast_value::<RefCell<Vec<i32>>>(&HelperId::Default, value).unwrap();
        assert_eq!(*second.borrow(), vec![1, 2]);
        assert!(Rc::ptr_eq(&first, &second));
    }
}
