use std::sync::Arc;

use parking_lot::RwLock;

pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

/// Lower-cased last path segment of a type name, generics stripped.
///
/// `my_app::model::UserAccount` becomes `useraccount`, the default
/// collection name of an entity without an explicit one.
pub fn collection_name_of<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}
