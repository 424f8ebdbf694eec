//! Classes: instance and static members, accessors, constructors, heritage.
//! `private` and `#private` members are left out of the documentation.
use super::Walk;
use crate::ir::{
    AccessorKind, ClassAccessorNode, ClassMethodNode, ClassNode, ClassPropertyNode, MemberScope, NodeKind,
    ParameterNode, Visibility,
};
use crate::metadata;
use crate::oracle::{DeclId, DeclKind, Modifier, OracleDeclaration, OracleResult, TypeId, TypeOracle};

impl<O: TypeOracle + ?Sized> Walk<'_, O> {
    pub(super) fn class(&mut self, ty: TypeId, fallback: Option<DeclId>) -> OracleResult<NodeKind> {
        let mut properties = Vec::new();
        let mut methods: Vec<ClassMethodNode> = Vec::new();
        let mut accessors = Vec::new();

        for member in self.oracle.class_members(ty)? {
            let symbol = self.oracle.symbol(member)?;
            let Some(decl_id) = symbol.primary_declaration() else { continue };
            let decl = self.oracle.declaration(decl_id)?;
            if decl.has_modifier(Modifier::Private) || symbol.name.starts_with('#') {
                continue;
            }
            let scope = decl.has_modifier(Modifier::Static).then_some(MemberScope::Static);
            let visibility = visibility(&decl);

            match decl.kind {
                DeclKind::Method => {
                    let member_ty = self.oracle.type_of_symbol(member)?;
                    let sigs = self.oracle.call_signatures(member_ty)?;
                    let signatures = self.function_signatures(sigs, Some(decl_id))?;
                    if let Some(existing) = methods.iter_mut().find(|m| m.name == symbol.name && m.scope == scope) {
                        existing.signatures.extend(signatures);
                        continue;
                    }
                    let doc = metadata::find_documentation(self.oracle, decl_id)?.unwrap_or_default();
                    methods.push(ClassMethodNode {
                        name: symbol.name,
                        scope,
                        visibility,
                        signatures,
                        text: self.oracle.type_to_text(member_ty)?,
                        description: doc.description,
                        tags: doc.tags,
                    });
                }
                DeclKind::GetAccessor | DeclKind::SetAccessor => {
                    let member_ty = self.oracle.type_of_symbol(member)?;
                    let text = self.oracle.type_to_text(member_ty)?;
                    let accessor = if decl.kind == DeclKind::GetAccessor {
                        AccessorKind::Get { return_type: text.clone() }
                    } else {
                        let mut node = self.node_or_reference(member_ty, Some(decl_id))?;
                        node.name = Some("value".to_string());
                        AccessorKind::Set {
                            parameter: Box::new(ParameterNode {
                                node,
                                is_optional: false,
                                is_rest: false,
                                default_value: None,
                            }),
                        }
                    };
                    let doc = metadata::find_documentation(self.oracle, decl_id)?.unwrap_or_default();
                    accessors.push(ClassAccessorNode {
                        name: symbol.name,
                        accessor,
                        scope,
                        visibility,
                        text,
                        description: doc.description,
                        tags: doc.tags,
                    });
                }
                DeclKind::Constructor => {}
                _ => {
                    if let Some(property) = self.property(member, fallback, None)? {
                        properties.push(ClassPropertyNode { property, scope, visibility });
                    }
                }
            }
        }

        let constructors = self.oracle.construct_signatures(ty)?;
        let constructors = self.function_signatures(constructors, fallback)?;
        let heritage = self.oracle.heritage(ty)?;
        let extends = match heritage.extends {
            Some(base) => Some(Box::new(self.reference(base, fallback)?)),
            None => None,
        };
        let implements = heritage
            .implements
            .into_iter()
            .map(|iface| self.reference(iface, fallback))
            .collect::<OracleResult<Vec<_>>>()?;

        Ok(NodeKind::Class(ClassNode {
            properties,
            methods,
            accessors: (!accessors.is_empty()).then_some(accessors),
            constructors: (!constructors.is_empty()).then_some(constructors),
            extends,
            implements,
        }))
    }
}

fn visibility(decl: &OracleDeclaration) -> Option<Visibility> {
    if decl.has_modifier(Modifier::Protected) {
        Some(Visibility::Protected)
    } else if decl.has_modifier(Modifier::Public) {
        Some(Visibility::Public)
    } else {
        None
    }
}
