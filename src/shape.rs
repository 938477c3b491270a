//! Static type descriptions.
//!
//! A type takes part in IDO by implementing [`Shape`], which hands the codec
//! compiler a [`Layout`]: a tagged description of the type plus type-erased
//! accessors over `dyn Any`. The compiler walks the layout once per type and
//! caches the result, so nothing here runs on the hot path.
//!
//! Records are usually described with [`record!`](crate::record), types with
//! their own byte representation with [`extension!`](crate::extension).
//! Writing a layout by hand is possible too:
//!
//! ```rust
//! use std::any::Any;
//! use ido::{Field, Layout, Shape, StructLayout, TypeRef};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Shape for Point {
//!     fn layout() -> Layout {
//!         Layout::Struct(StructLayout::new(
//!             "Point",
//!             vec![
//!                 Field::new(
//!                     "x",
//!                     false,
//!                     TypeRef::of::<i32>(),
//!                     |v| v.downcast_ref::<Point>().map(|p| &p.x as &dyn Any),
//!                     |v| v.downcast_mut::<Point>().map(|p| &mut p.x as &mut dyn Any),
//!                 ),
//!                 Field::new(
//!                     "y",
//!                     false,
//!                     TypeRef::of::<i32>(),
//!                     |v| v.downcast_ref::<Point>().map(|p| &p.y as &dyn Any),
//!                     |v| v.downcast_mut::<Point>().map(|p| &mut p.y as &mut dyn Any),
//!                 ),
//!             ],
//!         ))
//!     }
//! }
//!
//! let bytes = ido::to_vec(&Point { x: 3, y: 0 }).unwrap();
//! assert_eq!(bytes, b"{3}");
//! let point: Point = ido::from_slice(&bytes).unwrap();
//! assert_eq!(point, Point { x: 3, y: 0 });
//! ```

use crate::compile::{resolve, Coder, Compiler};
use crate::ext::Extension;
use crate::value::DynamicValue;
use crate::{Error, Result};
use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Reads a component out of a type-erased value.
pub type GetFn = fn(&dyn Any) -> Option<&dyn Any>;

/// Reaches a component of a type-erased value for writing.
pub type GetMutFn = fn(&mut dyn Any) -> Option<&mut dyn Any>;

/// A type with a static IDO layout.
pub trait Shape: Any {
    /// Describes how values of this type are laid out on the wire.
    fn layout() -> Layout;
}

/// What a type looks like to the codec compiler.
pub enum Layout {
    /// A primitive with a fixed text form.
    Scalar(Scalar),
    /// A record with positional fields.
    Struct(StructLayout),
    /// A growable sequence of one element type.
    Seq(SeqLayout),
    /// A pointer-like wrapper that may be absent (`Option<T>`) or not (`Box<T>`).
    Indirect(IndirectLayout),
    /// A value whose concrete type is only known at run time.
    Dynamic(DynamicLayout),
    /// A type that supplies its own bytes.
    Extension(ExtensionLayout),
    /// A type with no positional encoding.
    Unsupported(&'static str),
}

impl Layout {
    /// Builds the layout of a type implementing [`Extension`].
    pub fn extension<T: Extension>() -> Layout {
        Layout::Extension(ExtensionLayout {
            encode: |value, out| match value.downcast_ref::<T>() {
                Some(value) => value.encode_ido(out),
                None => Err(Error::type_mismatch(type_name::<T>())),
            },
            decode: |data, dest| match dest.downcast_mut::<T>() {
                Some(dest) => dest.decode_ido(data),
                None => Err(Error::not_addressable(type_name::<T>())),
            },
            is_zero: |value| value.downcast_ref::<T>().is_some_and(|v| v.is_zero()),
        })
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Layout::Scalar(_) => "scalar",
            Layout::Struct(_) => "struct",
            Layout::Seq(_) => "sequence",
            Layout::Indirect(_) => "indirect",
            Layout::Dynamic(_) => "dynamic",
            Layout::Extension(_) => "extension",
            Layout::Unsupported(_) => "unsupported",
        }
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Scalar(scalar) => write!(f, "Scalar({scalar:?})"),
            Layout::Struct(layout) => f
                .debug_struct("Struct")
                .field("name", &layout.name)
                .field("fields", &layout.fields)
                .finish(),
            Layout::Seq(layout) => write!(f, "Seq<{}>", layout.elem.name),
            Layout::Indirect(layout) => write!(f, "Indirect<{}>", layout.target.name),
            Layout::Unsupported(reason) => write!(f, "Unsupported({reason:?})"),
            other => f.write_str(other.kind()),
        }
    }
}

/// Primitive kinds with a built-in text form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Str,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

/// Names a child type and how to compile it.
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
    resolve: fn(&mut Compiler<'_>) -> Result<Arc<Coder>>,
}

impl TypeRef {
    pub fn of<T: Shape>() -> Self {
        TypeRef {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            resolve: resolve::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn resolve(&self, compiler: &mut Compiler<'_>) -> Result<Arc<Coder>> {
        (self.resolve)(compiler)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One field of a record.
#[derive(Clone, Copy)]
pub struct Field {
    pub(crate) name: &'static str,
    pub(crate) skip: bool,
    pub(crate) ty: TypeRef,
    pub(crate) get: GetFn,
    pub(crate) get_mut: GetMutFn,
}

impl Field {
    /// Describes a field. A skipped field takes no position on the wire.
    pub fn new(
        name: &'static str,
        skip: bool,
        ty: TypeRef,
        get: GetFn,
        get_mut: GetMutFn,
    ) -> Self {
        Field {
            name,
            skip,
            ty,
            get,
            get_mut,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("skip", &self.skip)
            .field("ty", &self.ty)
            .finish()
    }
}

/// Fields of a record, in wire order.
pub struct StructLayout {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<Field>,
}

impl StructLayout {
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        StructLayout { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// Access to a growable sequence.
#[derive(Clone, Copy)]
pub struct SeqLayout {
    pub(crate) elem: TypeRef,
    pub(crate) len: fn(&dyn Any) -> Option<usize>,
    pub(crate) item: fn(&dyn Any, usize) -> Option<&dyn Any>,
    pub(crate) clear: fn(&mut dyn Any) -> bool,
    pub(crate) push_default: GetMutFn,
}

impl SeqLayout {
    /// `push_default` appends a default element and returns it.
    pub fn new(
        elem: TypeRef,
        len: fn(&dyn Any) -> Option<usize>,
        item: fn(&dyn Any, usize) -> Option<&dyn Any>,
        clear: fn(&mut dyn Any) -> bool,
        push_default: GetMutFn,
    ) -> Self {
        SeqLayout {
            elem,
            len,
            item,
            clear,
            push_default,
        }
    }
}

/// Access to a pointer-like wrapper.
#[derive(Clone, Copy)]
pub struct IndirectLayout {
    pub(crate) target: TypeRef,
    pub(crate) get: GetFn,
    pub(crate) get_or_insert: GetMutFn,
}

impl IndirectLayout {
    /// `get` returns `None` when the referent is absent; `get_or_insert`
    /// allocates a default referent first if needed.
    pub fn new(target: TypeRef, get: GetFn, get_or_insert: GetMutFn) -> Self {
        IndirectLayout {
            target,
            get,
            get_or_insert,
        }
    }
}

/// Access to an open-typed value.
#[derive(Clone, Copy)]
pub struct DynamicLayout {
    pub(crate) get: fn(&dyn Any) -> Option<&dyn DynamicValue>,
}

impl DynamicLayout {
    pub fn new(get: fn(&dyn Any) -> Option<&dyn DynamicValue>) -> Self {
        DynamicLayout { get }
    }
}

/// Type-erased entry points of an [`Extension`].
#[derive(Clone, Copy)]
pub struct ExtensionLayout {
    pub(crate) encode: fn(&dyn Any, &mut Vec<u8>) -> Result<()>,
    pub(crate) decode: fn(&[u8], &mut dyn Any) -> Result<()>,
    pub(crate) is_zero: fn(&dyn Any) -> bool,
}

macro_rules! scalar_shape {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Shape for $ty {
                fn layout() -> Layout {
                    Layout::Scalar(Scalar::$kind)
                }
            }
        )*
    };
}

scalar_shape! {
    String => Str,
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

impl<T: Shape + Default> Shape for Vec<T> {
    fn layout() -> Layout {
        Layout::Seq(SeqLayout::new(
            TypeRef::of::<T>(),
            |v| v.downcast_ref::<Vec<T>>().map(Vec::len),
            |v, i| {
                v.downcast_ref::<Vec<T>>()
                    .and_then(|items| items.get(i))
                    .map(|item| item as &dyn Any)
            },
            |v| v.downcast_mut::<Vec<T>>().map(Vec::clear).is_some(),
            |v| {
                v.downcast_mut::<Vec<T>>()
                    .and_then(|items| {
                        items.push(T::default());
                        items.last_mut()
                    })
                    .map(|item| item as &mut dyn Any)
            },
        ))
    }
}

impl<T: Shape + Default> Shape for Option<T> {
    fn layout() -> Layout {
        Layout::Indirect(IndirectLayout::new(
            TypeRef::of::<T>(),
            |v| {
                v.downcast_ref::<Option<T>>()
                    .and_then(Option::as_ref)
                    .map(|inner| inner as &dyn Any)
            },
            |v| {
                v.downcast_mut::<Option<T>>()
                    .map(|slot| slot.get_or_insert_with(T::default) as &mut dyn Any)
            },
        ))
    }
}

impl<T: Shape> Shape for Box<T> {
    fn layout() -> Layout {
        Layout::Indirect(IndirectLayout::new(
            TypeRef::of::<T>(),
            |v| v.downcast_ref::<Box<T>>().map(|inner| &**inner as &dyn Any),
            |v| {
                v.downcast_mut::<Box<T>>()
                    .map(|inner| &mut **inner as &mut dyn Any)
            },
        ))
    }
}

impl<K: 'static, V: 'static, S: 'static> Shape for HashMap<K, V, S> {
    fn layout() -> Layout {
        Layout::Unsupported("maps have no positional encoding")
    }
}

impl<K: 'static, V: 'static> Shape for BTreeMap<K, V> {
    fn layout() -> Layout {
        Layout::Unsupported("maps have no positional encoding")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_layout_accessors() {
        let Layout::Seq(seq) = Vec::<u16>::layout() else {
            panic!("expected a sequence layout");
        };
        let mut items: Vec<u16> = vec![4, 5];
        assert_eq!((seq.len)(&items), Some(2));
        assert_eq!(
            (seq.item)(&items, 1).and_then(|v| v.downcast_ref::<u16>()),
            Some(&5)
        );
        assert!((seq.clear)(&mut items));
        let slot = (seq.push_default)(&mut items).unwrap();
        *slot.downcast_mut::<u16>().unwrap() = 9;
        assert_eq!(items, vec![9]);
        assert_eq!(seq.elem.type_id(), TypeId::of::<u16>());
    }

    #[test]
    fn test_option_layout_allocates_on_write() {
        let Layout::Indirect(indirect) = Option::<String>::layout() else {
            panic!("expected an indirect layout");
        };
        let mut value: Option<String> = None;
        assert!((indirect.get)(&value).is_none());
        let slot = (indirect.get_or_insert)(&mut value).unwrap();
        slot.downcast_mut::<String>().unwrap().push_str("set");
        assert_eq!(value.as_deref(), Some("set"));
    }

    #[test]
    fn test_accessors_reject_other_types() {
        let Layout::Seq(seq) = Vec::<u16>::layout() else {
            panic!("expected a sequence layout");
        };
        let mut wrong = 7_i64;
        assert_eq!((seq.len)(&wrong), None);
        assert!(!(seq.clear)(&mut wrong));
    }

    #[test]
    fn test_maps_are_unsupported() {
        assert!(matches!(
            HashMap::<String, i32>::layout(),
            Layout::Unsupported(_)
        ));
        assert_eq!(BTreeMap::<u8, u8>::layout().kind(), "unsupported");
    }
}
