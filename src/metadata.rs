//! Symbol metadata provider.
//!
//! Normalizes what the oracle knows about a symbol (name, declaration site,
//! optional/readonly flags, doc comment) into [`SymbolMetadata`], the value
//! filter predicates are evaluated against.
pub mod jsdoc;

use serde::Serialize;

use crate::ir::{DocTag, Position};
use crate::oracle::{DeclId, DeclKind, Modifier, OracleDeclaration, OracleResult, SymbolId, TypeOracle};

pub use jsdoc::JsDoc;

/// Upper bound on the ancestor walk for documentation lookup.
const MAX_DOC_ANCESTORS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolMetadata {
    pub name: String,
    pub file_path: Option<String>,
    pub position: Option<Position>,
    pub is_optional: bool,
    pub is_readonly: bool,
    /// Declared outside the consumer's own source (node_modules, lib files).
    pub is_in_node_modules: bool,
    pub description: Option<String>,
    pub tags: Vec<DocTag>,
}

pub fn describe_symbol<O: TypeOracle + ?Sized>(oracle: &O, id: SymbolId) -> OracleResult<SymbolMetadata> {
    let symbol = oracle.symbol(id)?;
    let mut meta = match symbol.primary_declaration() {
        Some(decl_id) => describe_declaration(oracle, decl_id)?,
        None => SymbolMetadata {
            name: String::new(),
            file_path: None,
            position: None,
            is_optional: false,
            is_readonly: false,
            is_in_node_modules: false,
            description: None,
            tags: Vec::new(),
        },
    };
    meta.name = symbol.name;
    meta.is_optional |= symbol.is_optional;
    meta.is_readonly |= symbol.is_readonly;
    Ok(meta)
}

/// Metadata for a bare declaration (e.g. the declaration a resolution was
/// started from). `name` is empty for unnamed declarations.
pub fn describe_declaration<O: TypeOracle + ?Sized>(oracle: &O, id: DeclId) -> OracleResult<SymbolMetadata> {
    let decl = oracle.declaration(id)?;
    let doc = find_documentation(oracle, id)?.unwrap_or_default();
    Ok(SymbolMetadata {
        name: decl.name.clone().unwrap_or_default(),
        file_path: Some(decl.location.file_path.clone()),
        position: Some(decl.location.position()),
        is_optional: decl.kind == DeclKind::Parameter && (decl.initializer.is_some() || decl.is_rest),
        is_readonly: decl.has_modifier(Modifier::Readonly),
        is_in_node_modules: is_external(&decl),
        description: doc.description,
        tags: doc.tags,
    })
}

pub fn is_external(decl: &OracleDeclaration) -> bool {
    decl.external || is_node_modules_path(&decl.location.file_path)
}

pub fn is_node_modules_path(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "node_modules")
}

/// Doc comment of `id`, or of the nearest documentable ancestor when `id`
/// is a variable or binding element (`/** doc */ export const { a } = ...`).
pub fn find_documentation<O: TypeOracle + ?Sized>(oracle: &O, id: DeclId) -> OracleResult<Option<JsDoc>> {
    let mut current = Some(id);
    for _ in 0..MAX_DOC_ANCESTORS {
        let Some(decl_id) = current else { break };
        let decl = oracle.declaration(decl_id)?;
        if let Some(raw) = &decl.doc_comment {
            let doc = jsdoc::parse(raw);
            if !doc.is_empty() {
                return Ok(Some(doc));
            }
        }
        if !matches!(decl.kind, DeclKind::Variable | DeclKind::BindingElement) {
            break;
        }
        current = decl.parent;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{DeclKind, GraphBuilder, PrimitiveKind};

    #[test]
    fn describes_a_documented_property() {
        let mut g = GraphBuilder::new();
        let string = g.primitive(PrimitiveKind::String);
        let id = g.property("label", string, "src/Button.tsx");
        let decl = g.sym(id).primary_declaration().unwrap();
        g.decl(decl).doc_comment = Some("/**\n * Visible text.\n * @default 'OK'\n */".into());
        g.sym(id).is_optional = true;
        let oracle = g.finish().unwrap();

        let meta = describe_symbol(&oracle, id).unwrap();
        assert_eq!(meta.name, "label");
        assert_eq!(meta.file_path.as_deref(), Some("src/Button.tsx"));
        assert!(meta.is_optional);
        assert!(!meta.is_in_node_modules);
        assert_eq!(meta.description.as_deref(), Some("Visible text."));
        assert_eq!(meta.tags[0].tag_name, "default");
    }

    #[test]
    fn variable_borrows_doc_from_its_statement() {
        let mut g = GraphBuilder::new();
        let stmt = g.declaration(DeclKind::VariableStatement, None, "src/theme.ts");
        g.decl(stmt).doc_comment = Some("/** Theme tokens. */".into());
        let var = g.declaration(DeclKind::Variable, Some("theme"), "src/theme.ts");
        g.decl(var).parent = Some(stmt);
        let oracle = g.finish().unwrap();

        let doc = find_documentation(&oracle, var).unwrap().unwrap();
        assert_eq!(doc.description.as_deref(), Some("Theme tokens."));
    }

    #[test]
    fn properties_do_not_inherit_parent_docs() {
        let mut g = GraphBuilder::new();
        let iface = g.declaration(DeclKind::Interface, Some("Props"), "src/a.ts");
        g.decl(iface).doc_comment = Some("/** Props. */".into());
        let prop = g.declaration(DeclKind::Property, Some("a"), "src/a.ts");
        g.decl(prop).parent = Some(iface);
        let oracle = g.finish().unwrap();

        assert_eq!(find_documentation(&oracle, prop).unwrap(), None);
    }

    #[test]
    fn node_modules_and_external_flags() {
        assert!(is_node_modules_path("/repo/node_modules/react/index.d.ts"));
        assert!(is_node_modules_path("C:\\repo\\node_modules\\x.d.ts"));
        assert!(!is_node_modules_path("/repo/src/my_node_modules.ts"));

        let mut g = GraphBuilder::new();
        let lib = g.declaration(DeclKind::Interface, Some("Promise"), "lib.es5.d.ts");
        g.decl(lib).external = true;
        let oracle = g.finish().unwrap();
        assert!(describe_declaration(&oracle, lib).unwrap().is_in_node_modules);
    }
}
