use downcast_rs::{DowncastSync, impl_downcast};

/// Type-erased decoded aux data value.
///
/// Any `Send + Sync + 'static` type is an [`AuxValue`]. Typed accessors recover
/// the concrete type with [`downcast_ref`](AuxValue::downcast_ref) and treat a
/// failed downcast as a schema type conflict.
pub trait AuxValue: DowncastSync {}
impl_downcast!(sync AuxValue);

impl<T: Send + Sync + 'static> AuxValue for T {}

/// Owned, type-erased decoded value as stored in an entry cache.
pub type BoxedAuxValue = Box<dyn AuxValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_matches_concrete_type_only() {
        let value: BoxedAuxValue = Box::new(5i64);
        assert_eq!((*value).downcast_ref::<i64>(), Some(&5));
        assert!((*value).downcast_ref::<i32>().is_none());
        assert!((*value).is::<i64>());
    }
}
