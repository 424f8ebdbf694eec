//! Type oracle contract.
//!
//! The resolver never looks at source code. Everything it knows about a type
//! comes through [`TypeOracle`], which models the query surface of a
//! type-checker: classification, members, signatures, symbols and their
//! declarations. Handles are small `Copy` ids; an id is only meaningful for
//! the oracle instance that produced it (mixing handles from two oracles is a
//! caller contract violation, and the snapshot oracle reports it as an unknown
//! id).
//!
//! - [`snapshot`] implements the contract over a pre-serialized JSON graph.
//! - [`builder`] assembles such graphs in code.
pub mod snapshot;
pub mod builder;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::ir::{Point, Position, SignatureModifier};

pub use snapshot::SnapshotOracle;
pub use builder::GraphBuilder;

// ————————————————————————————————————————————————————————————————————————————
// HANDLES
// ————————————————————————————————————————————————————————————————————————————

/// Stable identity of a type inside one oracle. Also the cycle-guard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

// ————————————————————————————————————————————————————————————————————————————
// CLASSIFICATION
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    #[serde(rename = "bigint")]
    BigInt,
    Symbol,
    Null,
    Undefined,
    Void,
    Any,
    Unknown,
    Never,
    /// The `object` keyword.
    #[serde(rename = "object")]
    NonPrimitive,
}

impl PrimitiveKind {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::BigInt => "bigint",
            PrimitiveKind::Symbol => "symbol",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Undefined => "undefined",
            PrimitiveKind::Void => "void",
            PrimitiveKind::Any => "any",
            PrimitiveKind::Unknown => "unknown",
            PrimitiveKind::Never => "never",
            PrimitiveKind::NonPrimitive => "object",
        }
    }
}

/// Value of a literal type (`'red'`, `5`, `true`, `10n`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    String(String),
    Number(OrderedFloat<f64>),
    Boolean(bool),
    BigInt { bigint: String },
}

impl LiteralValue {
    /// Source-like rendering, as a checker would print the literal type.
    pub fn to_type_text(&self) -> String {
        match self {
            LiteralValue::String(s) => format!("{s:?}"),
            LiteralValue::Number(n) => format_number(n.0),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::BigInt { bigint } => format!("{bigint}n"),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LiteralValue::String(s) => serde_json::Value::from(s.clone()),
            LiteralValue::Number(n) => number_to_json(n.0),
            LiteralValue::Boolean(b) => serde_json::Value::from(*b),
            LiteralValue::BigInt { bigint } => serde_json::Value::from(bigint.clone()),
        }
    }
}

/// Prefer integers when the value is integral; non-finite numbers become null.
pub fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Result of [`TypeOracle::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Primitive(PrimitiveKind),
    Literal(LiteralValue),
    Object,
    Union,
    Intersection,
    Tuple,
    Array,
    Function,
    Class,
    Enum,
}

// ————————————————————————————————————————————————————————————————————————————
// SYMBOLS, SIGNATURES, DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

/// Where a declaration lives. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file_path: String,
    pub start: Point,
    pub end: Point,
}

impl SourceLocation {
    pub fn position(&self) -> Position {
        Position { start: self.start, end: self.end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclKind {
    Variable,
    VariableStatement,
    Parameter,
    Property,
    Method,
    GetAccessor,
    SetAccessor,
    Constructor,
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    EnumMember,
    BindingElement,
    TypeLiteral,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modifier {
    Export,
    Default,
    Static,
    Readonly,
    Public,
    Protected,
    Private,
    Abstract,
    Async,
}

/// One element of an object binding pattern: `{ size = 'md' }: Props`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingElement {
    /// Property of the bound object this element reads.
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleDeclaration {
    pub kind: DeclKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: SourceLocation,
    /// Initializer source text (`= 5`, `= { x: 1 }`), without the `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,
    /// Raw `/** ... */` comment attached to this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<DeclId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binding_elements: Vec<BindingElement>,
    #[serde(default)]
    pub is_rest: bool,
    /// Declared in a library file (lib.d.ts, vendored typings).
    #[serde(default)]
    pub external: bool,
}

impl OracleDeclaration {
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_binding_pattern(&self) -> bool {
        !self.binding_elements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleSymbol {
    pub name: String,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_readonly: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<DeclId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_declaration: Option<DeclId>,
}

impl OracleSymbol {
    pub fn primary_declaration(&self) -> Option<DeclId> {
        self.value_declaration.or_else(|| self.declarations.first().copied())
    }

    /// Checker-internal names like `__type` or `__object`.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty() || self.name.starts_with("__")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleSignature {
    #[serde(default)]
    pub parameters: Vec<SymbolId>,
    pub return_type: TypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<DeclId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<SignatureModifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleElement {
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_rest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: LiteralValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heritage {
    pub extends: Option<TypeId>,
    pub implements: Vec<TypeId>,
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// Faults of the oracle itself. The resolver propagates these untouched.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("unknown type {0:?}")]
    UnknownType(TypeId),
    #[error("unknown symbol {0:?}")]
    UnknownSymbol(SymbolId),
    #[error("unknown signature {0:?}")]
    UnknownSignature(SignatureId),
    #[error("unknown declaration {0:?}")]
    UnknownDeclaration(DeclId),
    #[error("type {ty:?} (`{text}`) does not support `{query}`")]
    Inconsistent { ty: TypeId, text: String, query: &'static str },
    #[error("malformed declaration {decl:?}: {reason}")]
    MalformedDeclaration { decl: DeclId, reason: String },
}

pub type OracleResult<T> = Result<T, OracleError>;

// ————————————————————————————————————————————————————————————————————————————
// CONTRACT
// ————————————————————————————————————————————————————————————————————————————

/// Query surface of a type-checker, as consumed by the resolver.
///
/// Implementations must treat their type graph as immutable for the duration
/// of a resolution call.
pub trait TypeOracle {
    fn classify(&self, ty: TypeId) -> OracleResult<TypeClass>;

    /// Canonical serialized form, e.g. `Promise<{ slug: string; }>`.
    fn type_to_text(&self, ty: TypeId) -> OracleResult<String>;

    /// The symbol the type itself is declared by (interface, class, enum).
    fn type_symbol(&self, ty: TypeId) -> OracleResult<Option<SymbolId>>;

    /// The type alias symbol the type was reached through, if any.
    fn alias_symbol(&self, ty: TypeId) -> OracleResult<Option<SymbolId>>;

    /// Name of a generic type reference (`Promise`, `Record`).
    fn type_name(&self, ty: TypeId) -> OracleResult<Option<String>>;

    fn type_arguments(&self, ty: TypeId) -> OracleResult<Vec<TypeId>>;

    /// Declaration site of the type, including library declarations.
    fn type_location(&self, ty: TypeId) -> OracleResult<Option<SourceLocation>>;

    /// Collapse pass-through mapped/utility wrappers. `None` when nothing
    /// concrete is left.
    fn simplify_computed_type(&self, ty: TypeId) -> OracleResult<Option<TypeId>>;

    /// Properties in declaration order.
    fn apparent_properties(&self, ty: TypeId) -> OracleResult<Vec<SymbolId>>;

    fn call_signatures(&self, ty: TypeId) -> OracleResult<Vec<SignatureId>>;

    fn construct_signatures(&self, ty: TypeId) -> OracleResult<Vec<SignatureId>>;

    /// Members of a union or intersection, in declared order.
    fn constituent_types(&self, ty: TypeId) -> OracleResult<Vec<TypeId>>;

    fn tuple_elements(&self, ty: TypeId) -> OracleResult<Vec<TupleElement>>;

    fn array_element(&self, ty: TypeId) -> OracleResult<TypeId>;

    fn enum_members(&self, ty: TypeId) -> OracleResult<Vec<EnumMember>>;

    /// Own members of a class (properties, methods, accessors), in declaration order.
    fn class_members(&self, ty: TypeId) -> OracleResult<Vec<SymbolId>>;

    fn heritage(&self, _ty: TypeId) -> OracleResult<Heritage> {
        Ok(Heritage::default())
    }

    fn symbol(&self, id: SymbolId) -> OracleResult<OracleSymbol>;

    /// Type of a symbol at its declaration.
    fn type_of_symbol(&self, id: SymbolId) -> OracleResult<TypeId>;

    fn signature(&self, id: SignatureId) -> OracleResult<OracleSignature>;

    fn declaration(&self, id: DeclId) -> OracleResult<OracleDeclaration>;

    /// Find the declaration an identifier refers to, as seen from `from`.
    /// Used to evaluate defaults like `= DEFAULT_SIZE`.
    fn resolve_identifier(&self, _name: &str, _from: DeclId) -> OracleResult<Option<DeclId>> {
        Ok(None)
    }
}
