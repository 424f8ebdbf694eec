//! Programmatic construction of a [`TypeGraph`].
//!
//! Ids are assigned sequentially and double as table indices, so the
//! accessors (`sym`, `decl`, `ty`, `sig`) index directly. Every declaration
//! gets its own line in its file, which keeps positions distinct and stable.
use std::collections::HashMap;

use super::snapshot::{
    DeclarationEntry, ExportEntry, SignatureEntry, SnapshotError, SymbolEntry, TypeEntry, TypeGraph,
    TypeShape,
};
use super::{
    DeclId, DeclKind, EnumMember, LiteralValue, Modifier, OracleDeclaration, OracleSignature,
    OracleSymbol, PrimitiveKind, SignatureId, SnapshotOracle, SourceLocation, SymbolId,
    TupleElement, TypeId,
};
use crate::ir::Point;

#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: TypeGraph,
    next_line: HashMap<String, u32>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> TypeGraph {
        self.graph
    }

    pub fn finish(self) -> Result<SnapshotOracle, SnapshotError> {
        SnapshotOracle::new(self.graph)
    }

    // ————————————————————————————————————————————————————————————————————————
    // ACCESSORS
    // ————————————————————————————————————————————————————————————————————————
    //
    // These panic on ids that were not produced by this builder.

    pub fn ty(&mut self, id: TypeId) -> &mut TypeEntry {
        &mut self.graph.types[id.0 as usize]
    }

    pub fn sym(&mut self, id: SymbolId) -> &mut OracleSymbol {
        &mut self.graph.symbols[id.0 as usize].symbol
    }

    pub fn decl(&mut self, id: DeclId) -> &mut OracleDeclaration {
        &mut self.graph.declarations[id.0 as usize].declaration
    }

    pub fn sig(&mut self, id: SignatureId) -> &mut OracleSignature {
        &mut self.graph.signatures[id.0 as usize].signature
    }

    /// Primary declaration of a symbol created by this builder.
    pub fn decl_of(&self, id: SymbolId) -> Option<DeclId> {
        self.graph.symbols[id.0 as usize].symbol.primary_declaration()
    }

    /// Text of a type; ids unknown to the builder render as `unknown`.
    fn text_of(&self, id: TypeId) -> &str {
        self.graph.types.get(id.0 as usize).map_or("unknown", |t| t.text.as_str())
    }

    // ————————————————————————————————————————————————————————————————————————
    // DECLARATIONS & SYMBOLS
    // ————————————————————————————————————————————————————————————————————————

    pub fn declaration(&mut self, kind: DeclKind, name: Option<&str>, file: &str) -> DeclId {
        let line = self.next_line.entry(file.to_string()).or_insert(0);
        *line += 1;
        let width = name.map_or(1, |n| n.chars().count() as u32);
        let location = SourceLocation {
            file_path: file.to_string(),
            start: Point { line: *line, column: 1 },
            end: Point { line: *line, column: 1 + width },
        };
        let id = DeclId(self.graph.declarations.len() as u32);
        self.graph.declarations.push(DeclarationEntry {
            id,
            declaration: OracleDeclaration {
                kind,
                name: name.map(str::to_string),
                location,
                initializer: None,
                doc_comment: None,
                parent: None,
                modifiers: Vec::new(),
                binding_elements: Vec::new(),
                is_rest: false,
                external: false,
            },
        });
        id
    }

    pub fn symbol(&mut self, name: &str, ty: TypeId, decl: Option<DeclId>) -> SymbolId {
        let id = SymbolId(self.graph.symbols.len() as u32);
        self.graph.symbols.push(SymbolEntry {
            id,
            ty,
            symbol: OracleSymbol {
                name: name.to_string(),
                is_optional: false,
                is_readonly: false,
                declarations: decl.into_iter().collect(),
                value_declaration: None,
            },
        });
        id
    }

    fn declared_symbol(&mut self, kind: DeclKind, name: &str, ty: TypeId, file: &str) -> SymbolId {
        let decl = self.declaration(kind, Some(name), file);
        self.symbol(name, ty, Some(decl))
    }

    /// Property symbol with its own `Property` declaration.
    pub fn property(&mut self, name: &str, ty: TypeId, file: &str) -> SymbolId {
        self.declared_symbol(DeclKind::Property, name, ty, file)
    }

    pub fn optional_property(&mut self, name: &str, ty: TypeId, file: &str) -> SymbolId {
        let id = self.property(name, ty, file);
        self.sym(id).is_optional = true;
        id
    }

    pub fn parameter(&mut self, name: &str, ty: TypeId, file: &str) -> SymbolId {
        self.declared_symbol(DeclKind::Parameter, name, ty, file)
    }

    /// `const name = initializer`, resolvable by identifier from defaults.
    pub fn constant(&mut self, name: &str, initializer: &str, file: &str) -> DeclId {
        let decl = self.declaration(DeclKind::Variable, Some(name), file);
        self.decl(decl).initializer = Some(initializer.to_string());
        decl
    }

    pub fn export(&mut self, name: &str, ty: TypeId, declaration: Option<DeclId>) {
        self.graph.exports.insert(name.to_string(), ExportEntry { ty, declaration });
    }

    // ————————————————————————————————————————————————————————————————————————
    // TYPES
    // ————————————————————————————————————————————————————————————————————————

    fn push_type(&mut self, text: String, shape: TypeShape) -> TypeId {
        let id = TypeId(self.graph.types.len() as u32);
        self.graph.types.push(TypeEntry {
            id,
            text,
            shape,
            symbol: None,
            alias_symbol: None,
            name: None,
            type_arguments: Vec::new(),
            location: None,
        });
        id
    }

    pub fn primitive(&mut self, kind: PrimitiveKind) -> TypeId {
        self.push_type(kind.keyword().to_string(), TypeShape::Primitive { primitive: kind })
    }

    pub fn literal(&mut self, value: LiteralValue) -> TypeId {
        self.push_type(value.to_type_text(), TypeShape::Literal { value })
    }

    /// Anonymous object literal type.
    pub fn object(&mut self, properties: &[SymbolId]) -> TypeId {
        let text = self.object_text(properties);
        self.push_type(text, TypeShape::Object { properties: properties.to_vec() })
    }

    /// Appends a property to an object type after the fact, for
    /// self-referential shapes. The type text is left as is.
    pub fn add_property(&mut self, object: TypeId, property: SymbolId) {
        if let TypeShape::Object { properties } = &mut self.ty(object).shape {
            properties.push(property);
        }
    }

    /// `interface name { ... }` declared in `file`.
    pub fn interface(&mut self, name: &str, properties: &[SymbolId], file: &str) -> TypeId {
        let ty = self.push_type(name.to_string(), TypeShape::Object { properties: properties.to_vec() });
        let sym = self.declared_symbol(DeclKind::Interface, name, ty, file);
        self.ty(ty).symbol = Some(sym);
        ty
    }

    /// `type name = <ty>`: marks `ty` as reached through the alias.
    pub fn alias(&mut self, name: &str, ty: TypeId, file: &str) -> TypeId {
        let sym = self.declared_symbol(DeclKind::TypeAlias, name, ty, file);
        let entry = self.ty(ty);
        entry.alias_symbol = Some(sym);
        entry.text = name.to_string();
        ty
    }

    /// Library interface instantiated with type arguments, e.g. `Promise<T>`.
    /// The declaration is flagged external.
    pub fn generic(&mut self, name: &str, arguments: &[TypeId], file: &str) -> TypeId {
        let args = arguments.iter().map(|a| self.text_of(*a).to_string()).collect::<Vec<_>>();
        let text = format!("{name}<{}>", args.join(", "));
        let ty = self.push_type(text, TypeShape::Object { properties: Vec::new() });
        let sym = self.declared_symbol(DeclKind::Interface, name, ty, file);
        if let Some(decl) = self.decl_of(sym) {
            self.decl(decl).external = true;
        }
        let entry = self.ty(ty);
        entry.symbol = Some(sym);
        entry.name = Some(name.to_string());
        entry.type_arguments = arguments.to_vec();
        ty
    }

    pub fn union(&mut self, members: &[TypeId]) -> TypeId {
        let text = self.joined(members, " | ");
        self.push_type(text, TypeShape::Union { members: members.to_vec() })
    }

    pub fn intersection(&mut self, members: &[TypeId]) -> TypeId {
        let text = self.joined(members, " & ");
        self.push_type(text, TypeShape::Intersection { members: members.to_vec() })
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        let inner = self.text_of(element);
        let text = if inner.contains([' ', '|', '&']) { format!("({inner})[]") } else { format!("{inner}[]") };
        self.push_type(text, TypeShape::Array { element })
    }

    pub fn tuple(&mut self, elements: Vec<TupleElement>) -> TypeId {
        let parts = elements
            .iter()
            .map(|el| {
                let inner = self.text_of(el.ty);
                let rest = if el.is_rest { "..." } else { "" };
                let opt = if el.is_optional { "?" } else { "" };
                match &el.name {
                    Some(name) => format!("{rest}{name}{opt}: {inner}"),
                    None => format!("{rest}{inner}{opt}"),
                }
            })
            .collect::<Vec<_>>();
        self.push_type(format!("[{}]", parts.join(", ")), TypeShape::Tuple { elements })
    }

    pub fn signature(&mut self, parameters: &[SymbolId], return_type: TypeId) -> SignatureId {
        let id = SignatureId(self.graph.signatures.len() as u32);
        self.graph.signatures.push(SignatureEntry {
            id,
            signature: OracleSignature {
                parameters: parameters.to_vec(),
                return_type,
                declaration: None,
                modifier: None,
            },
        });
        id
    }

    /// Function type over `signatures`; text is rendered from the first one.
    pub fn function(&mut self, signatures: &[SignatureId]) -> TypeId {
        let text = match signatures.first() {
            Some(sig) => self.signature_text(*sig),
            None => "Function".to_string(),
        };
        self.push_type(text, TypeShape::Function { signatures: signatures.to_vec() })
    }

    pub fn enumeration(&mut self, name: &str, members: &[(&str, LiteralValue)], file: &str) -> TypeId {
        let members = members
            .iter()
            .map(|(name, value)| EnumMember { name: name.to_string(), value: value.clone() })
            .collect();
        let ty = self.push_type(name.to_string(), TypeShape::Enum { members });
        let sym = self.declared_symbol(DeclKind::Enum, name, ty, file);
        self.ty(ty).symbol = Some(sym);
        ty
    }

    /// Empty class; populate with [`Self::class_member`] and [`Self::constructor`].
    pub fn class(&mut self, name: &str, file: &str) -> TypeId {
        let ty = self.push_type(
            name.to_string(),
            TypeShape::Class { members: Vec::new(), constructors: Vec::new(), extends: None, implements: Vec::new() },
        );
        let sym = self.declared_symbol(DeclKind::Class, name, ty, file);
        self.ty(ty).symbol = Some(sym);
        ty
    }

    /// Adds a member declared with `kind` (property, method, accessor).
    pub fn class_member(
        &mut self,
        class: TypeId,
        kind: DeclKind,
        name: &str,
        ty: TypeId,
        modifiers: &[Modifier],
    ) -> SymbolId {
        let file = self.class_file(class);
        let sym = self.declared_symbol(kind, name, ty, &file);
        if let Some(decl) = self.decl_of(sym) {
            self.decl(decl).modifiers = modifiers.to_vec();
        }
        if let TypeShape::Class { members, .. } = &mut self.ty(class).shape {
            members.push(sym);
        }
        sym
    }

    pub fn constructor(&mut self, class: TypeId, signature: SignatureId) {
        if let TypeShape::Class { constructors, .. } = &mut self.ty(class).shape {
            constructors.push(signature);
        }
    }

    pub fn extends(&mut self, class: TypeId, base: TypeId) {
        if let TypeShape::Class { extends, .. } = &mut self.ty(class).shape {
            *extends = Some(base);
        }
    }

    pub fn implements(&mut self, class: TypeId, iface: TypeId) {
        if let TypeShape::Class { implements, .. } = &mut self.ty(class).shape {
            implements.push(iface);
        }
    }

    /// Utility wrapper collapsing to `simplified`, or to nothing.
    pub fn computed(&mut self, text: &str, simplified: Option<TypeId>) -> TypeId {
        self.push_type(text.to_string(), TypeShape::Computed { simplified })
    }

    // ————————————————————————————————————————————————————————————————————————
    // TEXT RENDERING
    // ————————————————————————————————————————————————————————————————————————

    fn joined(&self, members: &[TypeId], sep: &str) -> String {
        members.iter().map(|m| self.text_of(*m)).collect::<Vec<_>>().join(sep)
    }

    fn object_text(&self, properties: &[SymbolId]) -> String {
        if properties.is_empty() {
            return "{}".to_string();
        }
        let fields = properties
            .iter()
            .map(|p| {
                let entry = &self.graph.symbols[p.0 as usize];
                let opt = if entry.symbol.is_optional { "?" } else { "" };
                format!("{}{opt}: {};", entry.symbol.name, self.text_of(entry.ty))
            })
            .collect::<Vec<_>>();
        format!("{{ {} }}", fields.join(" "))
    }

    fn signature_text(&self, sig: SignatureId) -> String {
        let signature = &self.graph.signatures[sig.0 as usize].signature;
        let params = signature
            .parameters
            .iter()
            .map(|p| {
                let entry = &self.graph.symbols[p.0 as usize];
                format!("{}: {}", entry.symbol.name, self.text_of(entry.ty))
            })
            .collect::<Vec<_>>();
        format!("({}) => {}", params.join(", "), self.text_of(signature.return_type))
    }

    fn class_file(&self, class: TypeId) -> String {
        self.graph.types[class.0 as usize]
            .symbol
            .and_then(|s| self.graph.symbols[s.0 as usize].symbol.primary_declaration())
            .map(|d| self.graph.declarations[d.0 as usize].declaration.location.file_path.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{TypeClass, TypeOracle};

    #[test]
    fn texts_follow_checker_conventions() {
        let mut g = GraphBuilder::new();
        let string = g.primitive(PrimitiveKind::String);
        let number = g.primitive(PrimitiveKind::Number);
        let a = g.property("a", string, "src/a.ts");
        let b = g.property("b", number, "src/a.ts");
        let obj = g.object(&[a, b]);
        let union = g.union(&[string, number]);
        let list = g.array(union);
        let promise = g.generic("Promise", &[obj], "lib.es5.d.ts");

        let oracle = g.finish().unwrap();
        assert_eq!(oracle.type_to_text(obj).unwrap(), "{ a: string; b: number; }");
        assert_eq!(oracle.type_to_text(list).unwrap(), "(string | number)[]");
        assert_eq!(oracle.type_to_text(promise).unwrap(), "Promise<{ a: string; b: number; }>");
        assert_eq!(oracle.classify(promise).unwrap(), TypeClass::Object);
    }

    #[test]
    fn declarations_get_distinct_lines_per_file() {
        let mut g = GraphBuilder::new();
        let first = g.declaration(DeclKind::Variable, Some("x"), "src/a.ts");
        let other = g.declaration(DeclKind::Variable, Some("y"), "src/b.ts");
        let second = g.declaration(DeclKind::Variable, Some("z"), "src/a.ts");
        assert_eq!(g.decl(first).location.start.line, 1);
        assert_eq!(g.decl(other).location.start.line, 1);
        assert_eq!(g.decl(second).location.start.line, 2);
    }

    #[test]
    fn class_members_land_in_the_class_file() {
        let mut g = GraphBuilder::new();
        let number = g.primitive(PrimitiveKind::Number);
        let class = g.class("Counter", "src/counter.ts");
        let count = g.class_member(class, DeclKind::Property, "count", number, &[]);
        let decl = g.decl_of(count).unwrap();
        assert_eq!(g.decl(decl).location.file_path, "src/counter.ts");

        let oracle = g.finish().unwrap();
        assert_eq!(oracle.class_members(class).unwrap(), vec![count]);
    }
}
