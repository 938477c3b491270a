//! The codec compiler.
//!
//! [`Coder`]s are built once per type from its [`Layout`] and then shared by
//! every caller through the [`Registry`]. A coder is an immutable plan: every
//! child coder it needs is resolved during compilation, and fields excluded
//! with `#[ido(skip)]` are dropped from the plan altogether, so they take no
//! position on the wire in either direction.
//!
//! Resolution order, first match wins:
//!
//! 1. a type that supplies its own bytes ([`Layout::Extension`])
//! 2. primitives ([`Layout::Scalar`])
//! 3. sequences, whose element type is compiled recursively
//! 4. records, whose encodable fields are compiled recursively
//! 5. pointer-like wrappers, compiled through their referent
//! 6. open-typed values, compiled lazily from their run-time type
//!
//! Compilation fails for [`Layout::Unsupported`] types and for recursive
//! types. Failures are not cached: asking again fails again.
//!
//! [`Registry`]: crate::Registry

use crate::shape::{
    DynamicLayout, ExtensionLayout, GetFn, GetMutFn, IndirectLayout, Layout, Scalar, SeqLayout,
    Shape,
};
use crate::{Error, Registry, Result};
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A compiled encode/decode plan for one type.
///
/// Obtained from [`Registry::coder`](crate::Registry::coder); the encode and
/// decode engines drive it.
pub struct Coder {
    pub(crate) type_name: &'static str,
    pub(crate) plan: Plan,
}

pub(crate) enum Plan {
    Scalar(Scalar),
    Extension(ExtensionLayout),
    Seq {
        elem: Arc<Coder>,
        access: SeqLayout,
    },
    Struct {
        fields: Vec<CompiledField>,
    },
    Indirect {
        target: Arc<Coder>,
        access: IndirectLayout,
    },
    Dynamic(DynamicLayout),
}

pub(crate) struct CompiledField {
    pub(crate) name: &'static str,
    pub(crate) get: GetFn,
    pub(crate) get_mut: GetMutFn,
    pub(crate) coder: Arc<Coder>,
}

impl Coder {
    /// Name of the type this coder was compiled for.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The plan variant: `"scalar"`, `"struct"`, `"sequence"`, `"indirect"`,
    /// `"dynamic"` or `"extension"`.
    pub fn kind(&self) -> &'static str {
        match &self.plan {
            Plan::Scalar(_) => "scalar",
            Plan::Extension(_) => "extension",
            Plan::Seq { .. } => "sequence",
            Plan::Struct { .. } => "struct",
            Plan::Indirect { .. } => "indirect",
            Plan::Dynamic(_) => "dynamic",
        }
    }

    /// Encodable field names in wire order. Empty unless this is a struct plan.
    pub fn field_names(&self) -> Vec<&'static str> {
        match &self.plan {
            Plan::Struct { fields } => fields.iter().map(|field| field.name).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for Coder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Coder");
        out.field("type_name", &self.type_name)
            .field("kind", &self.kind());
        match &self.plan {
            Plan::Scalar(scalar) => out.field("scalar", scalar),
            Plan::Seq { elem, .. } => out.field("elem", &elem.type_name),
            Plan::Struct { .. } => out.field("fields", &self.field_names()),
            Plan::Indirect { target, .. } => out.field("target", &target.type_name),
            Plan::Extension(_) | Plan::Dynamic(_) => &mut out,
        };
        out.finish()
    }
}

/// State of one compilation: the registry to install into and the types
/// currently being compiled, innermost last.
pub(crate) struct Compiler<'r> {
    registry: &'r Registry,
    active: Vec<TypeId>,
}

impl<'r> Compiler<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Compiler {
            registry,
            active: Vec::new(),
        }
    }

    fn plan(&mut self, layout: Layout, type_name: &'static str) -> Result<Plan> {
        let plan = match layout {
            Layout::Extension(hooks) => Plan::Extension(hooks),
            Layout::Scalar(scalar) => Plan::Scalar(scalar),
            Layout::Seq(access) => Plan::Seq {
                elem: access.elem.resolve(self)?,
                access,
            },
            Layout::Struct(layout) => {
                let mut fields = Vec::with_capacity(layout.fields.len());
                for field in layout.fields.iter().filter(|field| !field.skip) {
                    fields.push(CompiledField {
                        name: field.name,
                        get: field.get,
                        get_mut: field.get_mut,
                        coder: field.ty.resolve(self)?,
                    });
                }
                Plan::Struct { fields }
            }
            Layout::Indirect(access) => Plan::Indirect {
                target: access.target.resolve(self)?,
                access,
            },
            Layout::Dynamic(access) => Plan::Dynamic(access),
            Layout::Unsupported(reason) => return Err(Error::unsupported(type_name, reason)),
        };
        Ok(plan)
    }
}

/// Returns the coder for `T`, compiling and installing it on a cache miss.
pub(crate) fn resolve<T: Shape>(compiler: &mut Compiler<'_>) -> Result<Arc<Coder>> {
    let id = TypeId::of::<T>();
    if let Some(coder) = compiler.registry.lookup(id) {
        return Ok(coder);
    }

    let type_name = type_name::<T>();
    if compiler.active.contains(&id) {
        return Err(Error::unsupported(
            type_name,
            "recursive types have no finite positional layout",
        ));
    }

    compiler.active.push(id);
    let plan = compiler.plan(T::layout(), type_name);
    compiler.active.pop();

    let coder = Coder {
        type_name,
        plan: plan?,
    };
    debug!(type_name, kind = coder.kind(), "compiled coder");
    Ok(compiler.registry.install(id, coder))
}
