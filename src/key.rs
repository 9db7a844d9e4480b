//! Type identity keys
//!
//! A [`TypeKey`] identifies the registration slot of a type. Equality uses
//! the compiler's `TypeId`, so `Box<T>` and `T` are distinct keys; pointer
//! forms meet their pointee only through [`TypeKey::of_pointee`] and the
//! container's pointer-aware entry points (`register_boxed`,
//! `register_shared`, `resolve_boxed_value`, ...). The canonical name, with
//! indirection stripped, is kept for grouping in logs; `Display` prints the
//! exact type.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// Prefixes that mark a reference or raw pointer in a type name.
const POINTER_PREFIXES: [&str; 5] = ["&mut ", "&", "*const ", "*mut ", "*"];

/// Smart pointers whose pointee is the identity of the whole type.
const POINTER_WRAPPERS: [&str; 3] = ["alloc::boxed::Box<", "alloc::sync::Arc<", "alloc::rc::Rc<"];

/// Canonical, comparable identity of a type.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    type_name: &'static str,
}

impl TypeKey {
    /// Key of `T` itself. Works for trait objects (`TypeKey::of::<dyn Trait>()`).
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: canonical_name(type_name::<T>()),
            type_name: type_name::<T>(),
        }
    }

    /// Key of a value's static type.
    #[inline]
    pub fn of_val<T: ?Sized + 'static>(_value: &T) -> Self {
        Self::of::<T>()
    }

    /// Key of the type a pointer points to.
    ///
    /// `of_pointee::<Box<User>>()`, `of_pointee::<Arc<User>>()` and
    /// `of::<User>()` are all equal.
    #[inline]
    pub fn of_pointee<P>() -> Self
    where
        P: Deref,
        P::Target: 'static,
    {
        Self::of::<P::Target>()
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully-qualified name with indirection stripped.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exact type name, indirection included.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the type carries pointer indirection (`&T`, `Box<T>`, ...).
    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.name != self.type_name
    }

    /// Whether the key names a trait object (`dyn Trait`) itself, not a
    /// pointer to one.
    #[inline]
    pub fn is_interface(&self) -> bool {
        self.type_name.starts_with("dyn ")
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.type_name).finish()
    }
}

/// Strip leading pointer markers and smart-pointer wrappers from a type name.
///
/// `&app::User`, `*const app::User` and `alloc::boxed::Box<app::User>` all
/// become `app::User`. Any input yields a name; there are no error cases.
pub fn canonical_name(name: &str) -> &str {
    let mut name = name.trim();
    loop {
        if let Some(rest) = POINTER_PREFIXES.iter().find_map(|p| name.strip_prefix(p)) {
            name = rest.trim_start();
            continue;
        }
        let unwrapped = POINTER_WRAPPERS.iter().find_map(|w| {
            name.strip_prefix(w)
                .and_then(|rest| rest.strip_suffix('>'))
        });
        match unwrapped {
            Some(inner) => name = inner,
            None => return name,
        }
    }
}
