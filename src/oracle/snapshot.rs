//! [`TypeOracle`] over a serialized type graph.
//!
//! A snapshot is what a type-checker integration dumps after checking a
//! program: every reachable type, symbol, signature and declaration as flat
//! tables cross-referenced by numeric id, plus the exports of interest.
//!
//! ```json
//! {
//!   "types": [
//!     { "id": 0, "class": "primitive", "primitive": "string", "text": "string" },
//!     { "id": 1, "class": "object", "properties": [0], "text": "{ a: string; }" }
//!   ],
//!   "symbols": [{ "id": 0, "name": "a", "type": 0, "declarations": [0] }],
//!   "declarations": [{ "id": 0, "kind": "property", "name": "a", "location": { ... } }],
//!   "exports": { "Props": { "type": 1 } }
//! }
//! ```
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    DeclId, DeclKind, EnumMember, Heritage, LiteralValue, OracleDeclaration, OracleError,
    OracleResult, OracleSignature, OracleSymbol, PrimitiveKind, SignatureId, SourceLocation,
    SymbolId, TupleElement, TypeClass, TypeId, TypeOracle,
};
use crate::path_de::{self, PathError};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeGraph {
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub symbols: Vec<SymbolEntry>,
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
    #[serde(default)]
    pub declarations: Vec<DeclarationEntry>,
    #[serde(default)]
    pub exports: IndexMap<String, ExportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeEntry {
    pub id: TypeId,
    pub text: String,
    #[serde(flatten)]
    pub shape: TypeShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_symbol: Option<SymbolId>,
    /// Name of a generic reference (`Promise` in `Promise<T>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "camelCase")]
pub enum TypeShape {
    Primitive {
        primitive: PrimitiveKind,
    },
    Literal {
        value: LiteralValue,
    },
    Object {
        #[serde(default)]
        properties: Vec<SymbolId>,
    },
    Union {
        members: Vec<TypeId>,
    },
    Intersection {
        members: Vec<TypeId>,
    },
    Tuple {
        elements: Vec<TupleElement>,
    },
    Array {
        element: TypeId,
    },
    Function {
        signatures: Vec<SignatureId>,
    },
    Class {
        #[serde(default)]
        members: Vec<SymbolId>,
        #[serde(default)]
        constructors: Vec<SignatureId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extends: Option<TypeId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        implements: Vec<TypeId>,
    },
    Enum {
        members: Vec<EnumMember>,
    },
    /// Pass-through mapped/utility wrapper; `simplified` is what remains.
    Computed {
        #[serde(default)]
        simplified: Option<TypeId>,
    },
}

impl TypeShape {
    fn class_name(&self) -> &'static str {
        match self {
            TypeShape::Primitive { .. } => "primitive",
            TypeShape::Literal { .. } => "literal",
            TypeShape::Object { .. } => "object",
            TypeShape::Union { .. } => "union",
            TypeShape::Intersection { .. } => "intersection",
            TypeShape::Tuple { .. } => "tuple",
            TypeShape::Array { .. } => "array",
            TypeShape::Function { .. } => "function",
            TypeShape::Class { .. } => "class",
            TypeShape::Enum { .. } => "enum",
            TypeShape::Computed { .. } => "computed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolEntry {
    pub id: SymbolId,
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(flatten)]
    pub symbol: OracleSymbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub id: SignatureId,
    #[serde(flatten)]
    pub signature: OracleSignature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationEntry {
    pub id: DeclId,
    #[serde(flatten)]
    pub declaration: OracleDeclaration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<DeclId>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid type graph ({origin}): {source}")]
    Parse {
        origin: String,
        #[source]
        source: PathError,
    },
    #[error("duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: u32 },
}

/// Indexed, read-only view of a [`TypeGraph`].
#[derive(Debug, Clone)]
pub struct SnapshotOracle {
    graph: TypeGraph,
    types: HashMap<u32, usize>,
    symbols: HashMap<u32, usize>,
    signatures: HashMap<u32, usize>,
    declarations: HashMap<u32, usize>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SnapshotOracle {
    pub fn new(graph: TypeGraph) -> Result<Self, SnapshotError> {
        let types = index_ids("type", graph.types.iter().map(|t| t.id.0))?;
        let symbols = index_ids("symbol", graph.symbols.iter().map(|s| s.id.0))?;
        let signatures = index_ids("signature", graph.signatures.iter().map(|s| s.id.0))?;
        let declarations = index_ids("declaration", graph.declarations.iter().map(|d| d.id.0))?;
        Ok(Self { graph, types, symbols, signatures, declarations })
    }

    pub fn from_json_str(src: &str) -> Result<Self, SnapshotError> {
        let graph = path_de::from_str_with_path::<TypeGraph>(src)
            .map_err(|source| SnapshotError::Parse { origin: "<string>".into(), source })?;
        Self::new(graph)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })?;
        let graph = path_de::from_slice_with_path::<TypeGraph>(&bytes).map_err(|source| {
            SnapshotError::Parse { origin: path.display().to_string(), source }
        })?;
        Self::new(graph)
    }

    pub fn exports(&self) -> &IndexMap<String, ExportEntry> {
        &self.graph.exports
    }

    pub fn export(&self, name: &str) -> Option<&ExportEntry> {
        self.graph.exports.get(name)
    }

    fn type_entry(&self, ty: TypeId) -> OracleResult<&TypeEntry> {
        self.types
            .get(&ty.0)
            .map(|&ix| &self.graph.types[ix])
            .ok_or(OracleError::UnknownType(ty))
    }

    fn symbol_entry(&self, id: SymbolId) -> OracleResult<&SymbolEntry> {
        self.symbols
            .get(&id.0)
            .map(|&ix| &self.graph.symbols[ix])
            .ok_or(OracleError::UnknownSymbol(id))
    }

    fn declaration_entry(&self, id: DeclId) -> OracleResult<&DeclarationEntry> {
        self.declarations
            .get(&id.0)
            .map(|&ix| &self.graph.declarations[ix])
            .ok_or(OracleError::UnknownDeclaration(id))
    }

    fn inconsistent(entry: &TypeEntry, query: &'static str) -> OracleError {
        OracleError::Inconsistent { ty: entry.id, text: entry.text.clone(), query }
    }
}

impl TypeOracle for SnapshotOracle {
    fn classify(&self, ty: TypeId) -> OracleResult<TypeClass> {
        let entry = self.type_entry(ty)?;
        Ok(match &entry.shape {
            TypeShape::Primitive { primitive } => TypeClass::Primitive(*primitive),
            TypeShape::Literal { value } => TypeClass::Literal(value.clone()),
            TypeShape::Object { .. } => TypeClass::Object,
            TypeShape::Union { .. } => TypeClass::Union,
            TypeShape::Intersection { .. } => TypeClass::Intersection,
            TypeShape::Tuple { .. } => TypeClass::Tuple,
            TypeShape::Array { .. } => TypeClass::Array,
            TypeShape::Function { .. } => TypeClass::Function,
            TypeShape::Class { .. } => TypeClass::Class,
            TypeShape::Enum { .. } => TypeClass::Enum,
            TypeShape::Computed { .. } => {
                return match self.simplify_computed_type(ty)? {
                    Some(simplified) if simplified != ty => self.classify(simplified),
                    _ => Err(Self::inconsistent(entry, "classify")),
                };
            }
        })
    }

    fn type_to_text(&self, ty: TypeId) -> OracleResult<String> {
        Ok(self.type_entry(ty)?.text.clone())
    }

    fn type_symbol(&self, ty: TypeId) -> OracleResult<Option<SymbolId>> {
        Ok(self.type_entry(ty)?.symbol)
    }

    fn alias_symbol(&self, ty: TypeId) -> OracleResult<Option<SymbolId>> {
        Ok(self.type_entry(ty)?.alias_symbol)
    }

    fn type_name(&self, ty: TypeId) -> OracleResult<Option<String>> {
        Ok(self.type_entry(ty)?.name.clone())
    }

    fn type_arguments(&self, ty: TypeId) -> OracleResult<Vec<TypeId>> {
        Ok(self.type_entry(ty)?.type_arguments.clone())
    }

    fn type_location(&self, ty: TypeId) -> OracleResult<Option<SourceLocation>> {
        let entry = self.type_entry(ty)?;
        if let Some(location) = &entry.location {
            return Ok(Some(location.clone()));
        }
        let Some(symbol) = entry.alias_symbol.or(entry.symbol) else {
            return Ok(None);
        };
        match self.symbol_entry(symbol)?.symbol.primary_declaration() {
            Some(decl) => Ok(Some(self.declaration_entry(decl)?.declaration.location.clone())),
            None => Ok(None),
        }
    }

    fn simplify_computed_type(&self, ty: TypeId) -> OracleResult<Option<TypeId>> {
        let mut current = ty;
        // Each hop visits a distinct entry in a well-formed graph.
        for _ in 0..=self.graph.types.len() {
            let entry = self.type_entry(current)?;
            match &entry.shape {
                TypeShape::Computed { simplified: Some(next) } => current = *next,
                TypeShape::Computed { simplified: None } => return Ok(None),
                _ => return Ok(Some(current)),
            }
        }
        Err(Self::inconsistent(self.type_entry(ty)?, "simplify_computed_type"))
    }

    fn apparent_properties(&self, ty: TypeId) -> OracleResult<Vec<SymbolId>> {
        let entry = self.type_entry(ty)?;
        match &entry.shape {
            TypeShape::Object { properties } => Ok(properties.clone()),
            TypeShape::Class { members, .. } => Ok(members.clone()),
            TypeShape::Intersection { members } => {
                let mut out = Vec::new();
                for member in members {
                    for prop in self.apparent_properties(*member)? {
                        if !out.contains(&prop) {
                            out.push(prop);
                        }
                    }
                }
                Ok(out)
            }
            TypeShape::Computed { .. } => match self.simplify_computed_type(ty)? {
                Some(simplified) if simplified != ty => self.apparent_properties(simplified),
                _ => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
    }

    fn call_signatures(&self, ty: TypeId) -> OracleResult<Vec<SignatureId>> {
        match &self.type_entry(ty)?.shape {
            TypeShape::Function { signatures } => Ok(signatures.clone()),
            _ => Ok(Vec::new()),
        }
    }

    fn construct_signatures(&self, ty: TypeId) -> OracleResult<Vec<SignatureId>> {
        match &self.type_entry(ty)?.shape {
            TypeShape::Class { constructors, .. } => Ok(constructors.clone()),
            _ => Ok(Vec::new()),
        }
    }

    fn constituent_types(&self, ty: TypeId) -> OracleResult<Vec<TypeId>> {
        let entry = self.type_entry(ty)?;
        match &entry.shape {
            TypeShape::Union { members } | TypeShape::Intersection { members } => Ok(members.clone()),
            _ => Err(Self::inconsistent(entry, "constituent_types")),
        }
    }

    fn tuple_elements(&self, ty: TypeId) -> OracleResult<Vec<TupleElement>> {
        let entry = self.type_entry(ty)?;
        match &entry.shape {
            TypeShape::Tuple { elements } => Ok(elements.clone()),
            _ => Err(Self::inconsistent(entry, "tuple_elements")),
        }
    }

    fn array_element(&self, ty: TypeId) -> OracleResult<TypeId> {
        let entry = self.type_entry(ty)?;
        match &entry.shape {
            TypeShape::Array { element } => Ok(*element),
            _ => Err(Self::inconsistent(entry, "array_element")),
        }
    }

    fn enum_members(&self, ty: TypeId) -> OracleResult<Vec<EnumMember>> {
        let entry = self.type_entry(ty)?;
        match &entry.shape {
            TypeShape::Enum { members } => Ok(members.clone()),
            _ => Err(Self::inconsistent(entry, "enum_members")),
        }
    }

    fn class_members(&self, ty: TypeId) -> OracleResult<Vec<SymbolId>> {
        let entry = self.type_entry(ty)?;
        match &entry.shape {
            TypeShape::Class { members, .. } => Ok(members.clone()),
            _ => Err(Self::inconsistent(entry, "class_members")),
        }
    }

    fn heritage(&self, ty: TypeId) -> OracleResult<Heritage> {
        match &self.type_entry(ty)?.shape {
            TypeShape::Class { extends, implements, .. } => {
                Ok(Heritage { extends: *extends, implements: implements.clone() })
            }
            _ => Ok(Heritage::default()),
        }
    }

    fn symbol(&self, id: SymbolId) -> OracleResult<OracleSymbol> {
        Ok(self.symbol_entry(id)?.symbol.clone())
    }

    fn type_of_symbol(&self, id: SymbolId) -> OracleResult<TypeId> {
        Ok(self.symbol_entry(id)?.ty)
    }

    fn signature(&self, id: SignatureId) -> OracleResult<OracleSignature> {
        self.signatures
            .get(&id.0)
            .map(|&ix| self.graph.signatures[ix].signature.clone())
            .ok_or(OracleError::UnknownSignature(id))
    }

    fn declaration(&self, id: DeclId) -> OracleResult<OracleDeclaration> {
        Ok(self.declaration_entry(id)?.declaration.clone())
    }

    fn resolve_identifier(&self, name: &str, from: DeclId) -> OracleResult<Option<DeclId>> {
        let origin = self.declaration_entry(from)?;
        let candidates = self.graph.declarations.iter().filter(|d| {
            d.id != from
                && d.declaration.kind == DeclKind::Variable
                && d.declaration.name.as_deref() == Some(name)
                && d.declaration.initializer.is_some()
        });
        let mut fallback = None;
        for candidate in candidates {
            if candidate.declaration.location.file_path == origin.declaration.location.file_path {
                return Ok(Some(candidate.id));
            }
            fallback.get_or_insert(candidate.id);
        }
        Ok(fallback)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn index_ids(
    table: &'static str,
    ids: impl Iterator<Item = u32>,
) -> Result<HashMap<u32, usize>, SnapshotError> {
    let mut out = HashMap::new();
    for (ix, id) in ids.enumerate() {
        if out.insert(id, ix).is_some() {
            return Err(SnapshotError::DuplicateId { table, id });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SMALL_GRAPH: &str = r#"{
        "types": [
            { "id": 0, "class": "primitive", "primitive": "string", "text": "string" },
            { "id": 1, "class": "object", "properties": [0], "text": "{ a: string; }" },
            { "id": 2, "class": "computed", "simplified": 1, "text": "Identity<{ a: string; }>" },
            { "id": 3, "class": "computed", "text": "Partial<{}>" },
            { "id": 4, "class": "literal", "value": 5, "text": "5" }
        ],
        "symbols": [{ "id": 0, "name": "a", "type": 0, "declarations": [0] }],
        "declarations": [{
            "id": 0, "kind": "property", "name": "a",
            "location": { "filePath": "src/a.ts", "start": { "line": 1, "column": 3 }, "end": { "line": 1, "column": 13 } }
        }],
        "exports": { "Props": { "type": 1 } }
    }"#;

    #[test]
    fn loads_and_answers_queries() {
        let oracle = SnapshotOracle::from_json_str(SMALL_GRAPH).unwrap();
        assert_eq!(oracle.classify(TypeId(0)).unwrap(), TypeClass::Primitive(PrimitiveKind::String));
        assert_eq!(oracle.classify(TypeId(1)).unwrap(), TypeClass::Object);
        assert_eq!(oracle.apparent_properties(TypeId(1)).unwrap(), vec![SymbolId(0)]);
        assert_eq!(oracle.type_of_symbol(SymbolId(0)).unwrap(), TypeId(0));
        assert_eq!(oracle.export("Props").unwrap().ty, TypeId(1));
        assert_eq!(
            oracle.classify(TypeId(4)).unwrap(),
            TypeClass::Literal(LiteralValue::Number(5.0.into()))
        );
    }

    #[test]
    fn computed_types_simplify() {
        let oracle = SnapshotOracle::from_json_str(SMALL_GRAPH).unwrap();
        assert_eq!(oracle.simplify_computed_type(TypeId(2)).unwrap(), Some(TypeId(1)));
        assert_eq!(oracle.simplify_computed_type(TypeId(3)).unwrap(), None);
        assert_eq!(oracle.simplify_computed_type(TypeId(0)).unwrap(), Some(TypeId(0)));
    }

    #[test]
    fn unknown_ids_and_wrong_queries_are_oracle_faults() {
        let oracle = SnapshotOracle::from_json_str(SMALL_GRAPH).unwrap();
        assert!(matches!(oracle.classify(TypeId(99)), Err(OracleError::UnknownType(TypeId(99)))));
        assert!(matches!(
            oracle.array_element(TypeId(0)),
            Err(OracleError::Inconsistent { query: "array_element", .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let src = r#"{ "types": [
            { "id": 0, "class": "primitive", "primitive": "string", "text": "string" },
            { "id": 0, "class": "primitive", "primitive": "number", "text": "number" }
        ] }"#;
        let err = SnapshotOracle::from_json_str(src).unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateId { table: "type", id: 0 }));
    }

    #[test]
    fn parse_errors_carry_the_json_path() {
        let err = SnapshotOracle::from_json_str(r#"{ "exports": { "A": { "type": "zero" } } }"#).unwrap_err();
        match err {
            SnapshotError::Parse { source, .. } => assert!(source.path.starts_with("exports.A")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL_GRAPH.as_bytes()).unwrap();
        let oracle = SnapshotOracle::from_path(file.path()).unwrap();
        assert_eq!(oracle.exports().len(), 1);

        let missing = SnapshotOracle::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(missing, SnapshotError::Io { .. }));
    }
}
