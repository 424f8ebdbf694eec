//! Type resolution: oracle type graph in, documentation tree out.
//!
//! One call walks the graph from a root type, guided by three pieces of
//! policy: a [`FilterPredicate`] deciding where expansion stops, a
//! [`CallableClassifier`] deciding `Component` vs `Function`, and the
//! [`CycleGuard`] limits. Each call owns its guard, so calls are independent
//! and may run concurrently against the same oracle.
//!
//! Dispatch for a type:
//! 1. computed wrappers are simplified; nothing left means `None`
//! 2. primitives and literals become leaves
//! 3. named types the filter rejects become `Generic` (when instantiated
//!    with type arguments) or `Reference`; the checker's own anonymous
//!    `__type` symbols are never offered to the filter
//! 4. a type already being expanded, or past the depth limit, becomes
//!    `Reference`
//! 5. named wrappers with type arguments (`Promise<T>`, `Record<K, V>`)
//!    become `Generic` with resolved arguments; `Promise` is never unwrapped
//! 6. everything else is expanded per kind, then documented
pub mod callable;
mod class;
pub mod filter;
pub mod guard;

use std::collections::HashSet;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;

use crate::defaults;
use crate::ir::{IntersectionEntry, LiteralSlot, NodeKind, ParameterNode, PropertyNode, TupleElementNode, TypeNode};
use crate::metadata::{self, SymbolMetadata};
use crate::oracle::{
    DeclId, LiteralValue, OracleResult, PrimitiveKind, SnapshotOracle, SourceLocation, SymbolId, TypeClass,
    TypeId, TypeOracle,
};

pub use callable::{CallableClassifier, CallableKind, CallableShape, NamedComponents, ParameterShape, PropsConvention};
pub use filter::{DefaultFilter, ExpandAll, ExpandNamed, FilterPredicate};
pub use guard::{CycleGuard, DEFAULT_MAX_DEPTH};

// ————————————————————————————————————————————————————————————————————————————
// PUBLIC API
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub max_depth: u32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Reusable resolution settings. Cheap to copy; holds no per-call state.
#[derive(Clone, Copy)]
pub struct TypeResolver<'a> {
    filter: &'a dyn FilterPredicate,
    classifier: &'a dyn CallableClassifier,
    options: ResolveOptions,
}

impl Default for TypeResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TypeResolver<'a> {
    pub fn new() -> Self {
        Self { filter: &DefaultFilter, classifier: &PropsConvention, options: ResolveOptions::default() }
    }

    pub fn with_filter(mut self, filter: &'a dyn FilterPredicate) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_classifier(mut self, classifier: &'a dyn CallableClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve `ty`, reached from the declaration `context` (an export, a
    /// variable) when there is one. `Ok(None)` means there is nothing to
    /// document, e.g. a utility type that simplifies to nothing.
    pub fn resolve<O: TypeOracle + ?Sized>(
        &self,
        oracle: &O,
        ty: TypeId,
        context: Option<DeclId>,
    ) -> OracleResult<Option<TypeNode>> {
        let mut walk = self.walk(oracle);
        let Some(mut node) = walk.node(ty, context)? else {
            return Ok(None);
        };
        if let Some(context) = context {
            if let Some(name) = oracle.declaration(context)?.name.filter(|n| !n.is_empty()) {
                node.name = Some(name);
            }
            if let Some(doc) = metadata::find_documentation(oracle, context)? {
                node.description = doc.description;
                node.tags = doc.tags;
            }
        }
        Ok(Some(node))
    }

    /// Properties of an object-shaped type; empty for anything else.
    pub fn resolve_properties<O: TypeOracle + ?Sized>(&self, oracle: &O, ty: TypeId) -> OracleResult<Vec<PropertyNode>> {
        Ok(self.resolve(oracle, ty, None)?.map(TypeNode::into_properties).unwrap_or_default())
    }

    /// Every export of a snapshot, in export order. Exports are resolved in
    /// parallel, each with its own guard.
    pub fn resolve_exports(&self, oracle: &SnapshotOracle) -> OracleResult<IndexMap<String, Option<TypeNode>>> {
        let exports = oracle.exports().iter().collect::<Vec<_>>();
        let resolved = exports
            .par_iter()
            .map(|(name, export)| Ok(((*name).clone(), self.resolve(oracle, export.ty, export.declaration)?)))
            .collect::<OracleResult<Vec<_>>>()?;
        Ok(resolved.into_iter().collect())
    }

    fn walk<'o, O: TypeOracle + ?Sized>(&self, oracle: &'o O) -> Walk<'o, O>
    where
        'a: 'o,
    {
        Walk {
            oracle,
            filter: self.filter,
            classifier: self.classifier,
            guard: CycleGuard::new(self.options.max_depth),
        }
    }
}

/// Resolve with the default classifier and depth limit. Without a filter,
/// [`DefaultFilter`] applies.
pub fn resolve_type<O: TypeOracle + ?Sized>(
    oracle: &O,
    ty: TypeId,
    context: Option<DeclId>,
    filter: Option<&dyn FilterPredicate>,
) -> OracleResult<Option<TypeNode>> {
    let mut resolver = TypeResolver::new();
    if let Some(filter) = filter {
        resolver = resolver.with_filter(filter);
    }
    resolver.resolve(oracle, ty, context)
}

pub fn resolve_type_properties<O: TypeOracle + ?Sized>(oracle: &O, ty: TypeId) -> OracleResult<Vec<PropertyNode>> {
    TypeResolver::new().resolve_properties(oracle, ty)
}

pub fn resolve_exports(oracle: &SnapshotOracle) -> OracleResult<IndexMap<String, Option<TypeNode>>> {
    TypeResolver::new().resolve_exports(oracle)
}

// ————————————————————————————————————————————————————————————————————————————
// WALK
// ————————————————————————————————————————————————————————————————————————————

/// State of one resolution call.
struct Walk<'a, O: ?Sized> {
    oracle: &'a O,
    filter: &'a dyn FilterPredicate,
    classifier: &'a dyn CallableClassifier,
    guard: CycleGuard,
}

impl<O: TypeOracle + ?Sized> Walk<'_, O> {
    /// `fallback` is the nearest enclosing declaration; it locates nodes
    /// whose type has no declaration of its own.
    fn node(&mut self, ty: TypeId, fallback: Option<DeclId>) -> OracleResult<Option<TypeNode>> {
        self.node_with(ty, fallback, None)
    }

    /// `bindings` carries destructuring defaults down to the object
    /// properties they apply to.
    fn node_with(
        &mut self,
        ty: TypeId,
        fallback: Option<DeclId>,
        bindings: Option<&IndexMap<String, Value>>,
    ) -> OracleResult<Option<TypeNode>> {
        let Some(ty) = self.oracle.simplify_computed_type(ty)? else {
            tracing::trace!(?ty, "computed type simplifies to nothing");
            return Ok(None);
        };
        let class = self.oracle.classify(ty)?;
        let symbol = self.symbol_of(ty)?;

        let kind = match class {
            TypeClass::Primitive(kind) => primitive_kind(kind),
            TypeClass::Literal(value) => literal_kind(&value),
            class => {
                let structural = matches!(class, TypeClass::Array | TypeClass::Tuple);
                if !structural {
                    if let Some(sym) = symbol {
                        // Checker-internal `__type` symbols say nothing about who declared the shape.
                        let internal = self.oracle.symbol(sym)?.is_anonymous();
                        let meta = metadata::describe_symbol(self.oracle, sym)?;
                        if !internal && !self.filter.expand(&meta) {
                            tracing::debug!(?ty, symbol = %meta.name, "filter stops expansion");
                            return self.collapsed(ty, fallback).map(Some);
                        }
                    }
                }
                if let Err(denied) = self.guard.try_enter(ty) {
                    tracing::debug!(?ty, ?denied, depth = self.guard.depth(), "resolving as reference");
                    return self.reference(ty, fallback).map(Some);
                }
                let expanded = match self.generic_wrapper(ty, structural)? {
                    Some((type_name, type_arguments)) => self.generic(type_name, type_arguments, fallback),
                    None => self.expand(ty, class, fallback, bindings),
                };
                self.guard.leave(ty);
                expanded?
            }
        };

        let mut node = TypeNode::new(kind, self.oracle.type_to_text(ty)?);
        self.decorate(&mut node, ty, symbol, fallback, true)?;
        Ok(Some(node))
    }

    fn node_or_reference(&mut self, ty: TypeId, fallback: Option<DeclId>) -> OracleResult<TypeNode> {
        match self.node(ty, fallback)? {
            Some(node) => Ok(node),
            None => self.reference(ty, fallback),
        }
    }

    fn expand(
        &mut self,
        ty: TypeId,
        class: TypeClass,
        fallback: Option<DeclId>,
        bindings: Option<&IndexMap<String, Value>>,
    ) -> OracleResult<NodeKind> {
        tracing::trace!(?ty, ?class, depth = self.guard.depth(), "expanding");
        Ok(match class {
            TypeClass::Primitive(kind) => primitive_kind(kind),
            TypeClass::Literal(value) => literal_kind(&value),
            TypeClass::Object => NodeKind::Object { properties: self.properties(ty, fallback, bindings)? },
            TypeClass::Union => {
                let mut members = Vec::new();
                for member in self.oracle.constituent_types(ty)? {
                    if let Some(node) = self.node_with(member, fallback, bindings)? {
                        members.push(node);
                    }
                }
                NodeKind::Union { members }
            }
            TypeClass::Intersection => self.intersection(ty, fallback, bindings)?,
            TypeClass::Tuple => {
                let mut elements = Vec::new();
                for element in self.oracle.tuple_elements(ty)? {
                    let mut node = self.node_or_reference(element.ty, fallback)?;
                    node.name = element.name;
                    elements.push(TupleElementNode {
                        node,
                        is_optional: element.is_optional,
                        is_rest: element.is_rest,
                    });
                }
                NodeKind::Tuple { elements }
            }
            TypeClass::Array => {
                let element = self.oracle.array_element(ty)?;
                NodeKind::Array { element: Box::new(self.node_or_reference(element, fallback)?) }
            }
            TypeClass::Function => self.callable(ty, fallback)?,
            TypeClass::Class => self.class(ty, fallback)?,
            TypeClass::Enum => NodeKind::Enum {
                members: self
                    .oracle
                    .enum_members(ty)?
                    .into_iter()
                    .map(|member| (member.name, member.value.to_json()))
                    .collect(),
            },
        })
    }

    fn properties(
        &mut self,
        ty: TypeId,
        fallback: Option<DeclId>,
        bindings: Option<&IndexMap<String, Value>>,
    ) -> OracleResult<Vec<PropertyNode>> {
        let mut out = Vec::new();
        for sym in self.oracle.apparent_properties(ty)? {
            if let Some(property) = self.property(sym, fallback, bindings)? {
                out.push(property);
            }
        }
        Ok(out)
    }

    /// Anonymous object-literal constituents are flattened into sibling
    /// properties; other constituents nest. All-anonymous intersections
    /// collapse to one object unless two constituents declare the same
    /// name, in which case every declaration is kept side by side.
    fn intersection(
        &mut self,
        ty: TypeId,
        fallback: Option<DeclId>,
        bindings: Option<&IndexMap<String, Value>>,
    ) -> OracleResult<NodeKind> {
        let mut entries = Vec::new();
        let mut nested = false;
        for member in self.oracle.constituent_types(ty)? {
            let Some(member) = self.oracle.simplify_computed_type(member)? else { continue };
            if self.is_anonymous_object(member)? {
                for property in self.properties(member, fallback, bindings)? {
                    entries.push(IntersectionEntry::Property(property));
                }
            } else {
                nested = true;
                if let Some(node) = self.node_with(member, fallback, bindings)? {
                    entries.push(IntersectionEntry::Type(node));
                }
            }
        }
        let mut seen = HashSet::new();
        let colliding = entries.iter().any(|entry| match entry {
            IntersectionEntry::Property(property) => property.name().is_some_and(|name| !seen.insert(name)),
            IntersectionEntry::Type(_) => false,
        });
        if nested || colliding {
            return Ok(NodeKind::Intersection { properties: entries });
        }

        let properties = entries
            .into_iter()
            .filter_map(|entry| match entry {
                IntersectionEntry::Property(property) => Some(property),
                IntersectionEntry::Type(_) => None,
            })
            .collect();
        Ok(NodeKind::Object { properties })
    }

    /// A property keeps its slot even when the filter rejects it; only its
    /// type collapses to a reference.
    fn property(
        &mut self,
        sym: SymbolId,
        fallback: Option<DeclId>,
        bindings: Option<&IndexMap<String, Value>>,
    ) -> OracleResult<Option<PropertyNode>> {
        let meta = metadata::describe_symbol(self.oracle, sym)?;
        let decl = self.oracle.symbol(sym)?.primary_declaration();
        let site = decl.or(fallback);
        let ty = self.oracle.type_of_symbol(sym)?;

        let node = if self.filter.expand(&meta) {
            self.node(ty, site)?
        } else {
            tracing::debug!(property = %meta.name, "filter keeps property as a reference");
            Some(self.reference(ty, site)?)
        };
        let Some(mut node) = node else { return Ok(None) };
        apply_metadata(&mut node, &meta);

        let default_value = decl
            .and_then(|d| defaults::declaration_default(self.oracle, d))
            .or_else(|| bindings.and_then(|b| b.get(&meta.name).cloned()));
        Ok(Some(PropertyNode {
            node,
            is_optional: meta.is_optional,
            is_readonly: meta.is_readonly,
            default_value,
        }))
    }

    fn parameter(&mut self, sym: SymbolId, fallback: Option<DeclId>) -> OracleResult<(ParameterNode, ParameterShape)> {
        let meta = metadata::describe_symbol(self.oracle, sym)?;
        let decl_id = self.oracle.symbol(sym)?.primary_declaration();
        let declaration = match decl_id {
            Some(id) => Some(self.oracle.declaration(id)?),
            None => None,
        };
        let site = decl_id.or(fallback);
        let ty = self.oracle.type_of_symbol(sym)?;

        let bindings = match (decl_id, &declaration) {
            (Some(id), Some(decl)) if decl.is_binding_pattern() => Some(defaults::binding_defaults(self.oracle, id)),
            _ => None,
        };
        let node = if self.filter.expand(&meta) {
            self.node_with(ty, site, bindings.as_ref())?
        } else {
            None
        };
        let mut node = match node {
            Some(node) => node,
            None => self.reference(ty, site)?,
        };
        apply_metadata(&mut node, &meta);

        let is_rest = declaration.as_ref().is_some_and(|d| d.is_rest);
        let shape = ParameterShape { is_object_like: self.is_object_like(ty)?, is_optional: meta.is_optional, is_rest };
        let parameter = ParameterNode {
            node,
            is_optional: meta.is_optional,
            is_rest,
            default_value: decl_id.and_then(|d| defaults::declaration_default(self.oracle, d)),
        };
        Ok((parameter, shape))
    }

    /// Boundary node for a type the filter rejects: still a `Generic` when
    /// the type is a named wrapper, a `Reference` otherwise.
    fn collapsed(&mut self, ty: TypeId, fallback: Option<DeclId>) -> OracleResult<TypeNode> {
        let Some((type_name, type_arguments)) = self.generic_wrapper(ty, false)? else {
            return self.reference(ty, fallback);
        };
        if let Err(denied) = self.guard.try_enter(ty) {
            tracing::debug!(?ty, ?denied, "generic wrapper resolving as reference");
            return self.reference(ty, fallback);
        }
        let kind = self.generic(type_name, type_arguments, fallback);
        self.guard.leave(ty);
        let mut node = TypeNode::new(kind?, self.oracle.type_to_text(ty)?);
        let symbol = self.symbol_of(ty)?;
        self.decorate(&mut node, ty, symbol, fallback, false)?;
        Ok(node)
    }

    /// Name and type arguments of `Promise<T>`, `Record<K, V>`, `Box<string>`.
    /// Arrays and tuples carry type arguments too but keep their own nodes.
    fn generic_wrapper(&self, ty: TypeId, structural: bool) -> OracleResult<Option<(String, Vec<TypeId>)>> {
        if structural {
            return Ok(None);
        }
        let Some(type_name) = self.oracle.type_name(ty)? else {
            return Ok(None);
        };
        let type_arguments = self.oracle.type_arguments(ty)?;
        Ok((!type_arguments.is_empty()).then_some((type_name, type_arguments)))
    }

    fn generic(
        &mut self,
        type_name: String,
        type_arguments: Vec<TypeId>,
        fallback: Option<DeclId>,
    ) -> OracleResult<NodeKind> {
        let mut arguments = Vec::with_capacity(type_arguments.len());
        for argument in type_arguments {
            arguments.push(self.node_or_reference(argument, fallback)?);
        }
        Ok(NodeKind::Generic { type_name, arguments })
    }

    fn reference(&mut self, ty: TypeId, fallback: Option<DeclId>) -> OracleResult<TypeNode> {
        let mut node = TypeNode::new(NodeKind::Reference, self.oracle.type_to_text(ty)?);
        let symbol = self.symbol_of(ty)?;
        self.decorate(&mut node, ty, symbol, fallback, false)?;
        Ok(node)
    }

    /// Name, location and (optionally) docs. Location falls back from the
    /// symbol's declaration to the type's own location to `fallback`.
    fn decorate(
        &self,
        node: &mut TypeNode,
        ty: TypeId,
        symbol: Option<SymbolId>,
        fallback: Option<DeclId>,
        with_docs: bool,
    ) -> OracleResult<()> {
        if let Some(sym) = symbol {
            let symbol = self.oracle.symbol(sym)?;
            if !symbol.is_anonymous() {
                node.name = Some(symbol.name.clone());
            }
            if let Some(decl) = symbol.primary_declaration() {
                set_location(node, &self.oracle.declaration(decl)?.location);
                if with_docs {
                    if let Some(doc) = metadata::find_documentation(self.oracle, decl)? {
                        node.description = doc.description;
                        node.tags = doc.tags;
                    }
                }
                return Ok(());
            }
        }
        if let Some(location) = self.oracle.type_location(ty)? {
            set_location(node, &location);
        } else if let Some(decl) = fallback {
            set_location(node, &self.oracle.declaration(decl)?.location);
        }
        Ok(())
    }

    fn symbol_of(&self, ty: TypeId) -> OracleResult<Option<SymbolId>> {
        Ok(self.oracle.alias_symbol(ty)?.or(self.oracle.type_symbol(ty)?))
    }

    fn is_anonymous_object(&self, ty: TypeId) -> OracleResult<bool> {
        if self.oracle.classify(ty)? != TypeClass::Object
            || self.oracle.alias_symbol(ty)?.is_some()
            || self.oracle.type_name(ty)?.is_some()
        {
            return Ok(false);
        }
        match self.oracle.type_symbol(ty)? {
            Some(sym) => Ok(self.oracle.symbol(sym)?.is_anonymous()),
            None => Ok(true),
        }
    }

    fn is_object_like(&self, ty: TypeId) -> OracleResult<bool> {
        let Some(ty) = self.oracle.simplify_computed_type(ty)? else {
            return Ok(false);
        };
        Ok(match self.oracle.classify(ty)? {
            TypeClass::Object | TypeClass::Intersection | TypeClass::Class => true,
            TypeClass::Primitive(PrimitiveKind::NonPrimitive) => true,
            TypeClass::Union => {
                let mut any = false;
                for member in self.oracle.constituent_types(ty)? {
                    match self.oracle.classify(member)? {
                        TypeClass::Primitive(PrimitiveKind::Null | PrimitiveKind::Undefined) => {}
                        _ if self.is_object_like(member)? => any = true,
                        _ => return Ok(false),
                    }
                }
                any
            }
            _ => false,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn primitive_kind(kind: PrimitiveKind) -> NodeKind {
    match kind {
        PrimitiveKind::String => NodeKind::String(LiteralSlot::default()),
        PrimitiveKind::Number => NodeKind::Number(LiteralSlot::default()),
        PrimitiveKind::Boolean => NodeKind::Boolean(LiteralSlot::default()),
        PrimitiveKind::BigInt => NodeKind::BigInt(LiteralSlot::default()),
        PrimitiveKind::Symbol => NodeKind::Symbol,
        PrimitiveKind::Null => NodeKind::Null,
        PrimitiveKind::Undefined => NodeKind::Undefined,
        PrimitiveKind::Void => NodeKind::Void,
        PrimitiveKind::Any => NodeKind::Any,
        PrimitiveKind::Unknown => NodeKind::Unknown,
        PrimitiveKind::Never => NodeKind::Never,
        PrimitiveKind::NonPrimitive => NodeKind::Object { properties: Vec::new() },
    }
}

fn literal_kind(value: &LiteralValue) -> NodeKind {
    let slot = LiteralSlot { value: Some(value.to_json()) };
    match value {
        LiteralValue::String(_) => NodeKind::String(slot),
        LiteralValue::Number(_) => NodeKind::Number(slot),
        LiteralValue::Boolean(_) => NodeKind::Boolean(slot),
        LiteralValue::BigInt { .. } => NodeKind::BigInt(slot),
    }
}

fn set_location(node: &mut TypeNode, location: &SourceLocation) {
    node.file_path = Some(location.file_path.clone());
    node.position = Some(location.position());
}

/// Name, site and docs of the property/parameter replace the type's own.
fn apply_metadata(node: &mut TypeNode, meta: &SymbolMetadata) {
    node.name = (!meta.name.is_empty() && !meta.name.starts_with("__")).then(|| meta.name.clone());
    if let (Some(file_path), Some(position)) = (&meta.file_path, meta.position) {
        node.file_path = Some(file_path.clone());
        node.position = Some(position);
    }
    node.description = meta.description.clone();
    node.tags = meta.tags.clone();
}
