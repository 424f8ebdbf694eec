//! Callables: `Function` vs `Component`.
//!
//! Which callables count as components is a policy ([`CallableClassifier`]).
//! The resolver describes the first call signature as a [`CallableShape`]
//! and the classifier picks the node kind for the whole type.
use super::Walk;
use crate::ir::{ComponentSignature, FunctionSignature, NodeKind, ParameterNode};
use crate::oracle::{DeclId, OracleResult, SignatureId, TypeId, TypeOracle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    Component,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterShape {
    /// Object, intersection, class instance, or a union of those with
    /// `null`/`undefined`.
    pub is_object_like: bool,
    pub is_optional: bool,
    pub is_rest: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CallableShape<'a> {
    /// Declared name of the callable, when it has one.
    pub name: Option<&'a str>,
    pub parameters: &'a [ParameterShape],
}

pub trait CallableClassifier: Sync {
    fn classify(&self, shape: &CallableShape<'_>) -> CallableKind;
}

/// Props-object convention: at most one parameter, and that parameter (when
/// present) object-shaped, makes a component.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropsConvention;

impl CallableClassifier for PropsConvention {
    fn classify(&self, shape: &CallableShape<'_>) -> CallableKind {
        match shape.parameters {
            [] => CallableKind::Component,
            [param] if param.is_object_like && !param.is_rest => CallableKind::Component,
            _ => CallableKind::Function,
        }
    }
}

/// [`PropsConvention`], except that parameterless callables also need a
/// PascalCase name (`Header`, not `getHeader`) to count as components.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedComponents;

impl CallableClassifier for NamedComponents {
    fn classify(&self, shape: &CallableShape<'_>) -> CallableKind {
        match shape.parameters {
            [] if !shape.name.is_some_and(is_pascal_case) => CallableKind::Function,
            _ => PropsConvention.classify(shape),
        }
    }
}

pub fn is_pascal_case(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.any(char::is_lowercase)
}

struct ResolvedSignature {
    parameters: Vec<(ParameterNode, ParameterShape)>,
    return_type: String,
    modifier: Option<crate::ir::SignatureModifier>,
}

impl<O: TypeOracle + ?Sized> Walk<'_, O> {
    pub(super) fn callable(&mut self, ty: TypeId, fallback: Option<DeclId>) -> OracleResult<NodeKind> {
        let signatures = self
            .oracle
            .call_signatures(ty)?
            .into_iter()
            .map(|sig| self.signature(sig, fallback))
            .collect::<OracleResult<Vec<_>>>()?;

        let name = self.callable_name(ty, fallback)?;
        let kind = match signatures.first() {
            Some(first) => {
                let shapes = first.parameters.iter().map(|(_, shape)| *shape).collect::<Vec<_>>();
                self.classifier.classify(&CallableShape { name: name.as_deref(), parameters: &shapes })
            }
            None => CallableKind::Function,
        };
        tracing::trace!(?ty, ?kind, name = name.as_deref(), "classified callable");

        Ok(match kind {
            CallableKind::Function => NodeKind::Function {
                signatures: signatures.into_iter().map(ResolvedSignature::into_function).collect(),
            },
            CallableKind::Component => NodeKind::Component {
                signatures: signatures
                    .into_iter()
                    .map(|sig| ComponentSignature {
                        parameter: sig.parameters.into_iter().next().map(|(node, _)| node),
                        return_type: sig.return_type,
                        modifier: sig.modifier,
                    })
                    .collect(),
            },
        })
    }

    /// Function signatures of a method or constructor; no classification.
    pub(super) fn function_signatures(
        &mut self,
        signatures: Vec<SignatureId>,
        fallback: Option<DeclId>,
    ) -> OracleResult<Vec<FunctionSignature>> {
        signatures
            .into_iter()
            .map(|sig| Ok(self.signature(sig, fallback)?.into_function()))
            .collect()
    }

    fn signature(&mut self, id: SignatureId, fallback: Option<DeclId>) -> OracleResult<ResolvedSignature> {
        let signature = self.oracle.signature(id)?;
        let fallback = signature.declaration.or(fallback);
        let parameters = signature
            .parameters
            .iter()
            .map(|param| self.parameter(*param, fallback))
            .collect::<OracleResult<Vec<_>>>()?;
        Ok(ResolvedSignature {
            parameters,
            return_type: self.oracle.type_to_text(signature.return_type)?,
            modifier: signature.modifier,
        })
    }

    fn callable_name(&self, ty: TypeId, fallback: Option<DeclId>) -> OracleResult<Option<String>> {
        if let Some(sym) = self.oracle.alias_symbol(ty)?.or(self.oracle.type_symbol(ty)?) {
            let symbol = self.oracle.symbol(sym)?;
            if !symbol.is_anonymous() {
                return Ok(Some(symbol.name));
            }
        }
        match fallback {
            Some(decl) => Ok(self.oracle.declaration(decl)?.name),
            None => Ok(None),
        }
    }
}

impl ResolvedSignature {
    fn into_function(self) -> FunctionSignature {
        FunctionSignature {
            parameters: self.parameters.into_iter().map(|(node, _)| node).collect(),
            return_type: self.return_type,
            modifier: self.modifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_param() -> ParameterShape {
        ParameterShape { is_object_like: true, ..ParameterShape::default() }
    }

    fn classify(name: Option<&str>, parameters: &[ParameterShape]) -> CallableKind {
        PropsConvention.classify(&CallableShape { name, parameters })
    }

    #[test]
    fn single_object_parameter_is_a_component() {
        assert_eq!(classify(Some("button"), &[object_param()]), CallableKind::Component);
        let optional = ParameterShape { is_optional: true, ..object_param() };
        assert_eq!(classify(None, &[optional]), CallableKind::Component);
    }

    #[test]
    fn everything_else_is_a_function() {
        let number = ParameterShape::default();
        assert_eq!(classify(Some("Add"), &[number, number]), CallableKind::Function);
        assert_eq!(classify(Some("Render"), &[number]), CallableKind::Function);
        let rest = ParameterShape { is_rest: true, ..object_param() };
        assert_eq!(classify(None, &[rest]), CallableKind::Function);
        assert_eq!(classify(None, &[object_param(), object_param()]), CallableKind::Function);
    }

    #[test]
    fn parameterless_callables_are_components_by_default() {
        assert_eq!(classify(Some("Header"), &[]), CallableKind::Component);
        assert_eq!(classify(Some("getHeader"), &[]), CallableKind::Component);
        assert_eq!(classify(None, &[]), CallableKind::Component);
    }

    #[test]
    fn named_components_need_a_pascal_case_name_without_parameters() {
        let named = |name: Option<&str>, parameters: &[ParameterShape]| {
            NamedComponents.classify(&CallableShape { name, parameters })
        };
        assert_eq!(named(Some("Header"), &[]), CallableKind::Component);
        assert_eq!(named(Some("getHeader"), &[]), CallableKind::Function);
        assert_eq!(named(Some("DEFAULT"), &[]), CallableKind::Function);
        assert_eq!(named(None, &[]), CallableKind::Function);
        assert_eq!(named(Some("render"), &[object_param()]), CallableKind::Component);
        assert_eq!(named(Some("Add"), &[ParameterShape::default()]), CallableKind::Function);
    }
}
