//! Default value extraction.
//!
//! Turns initializer source text (`= 5`, `= { size: 'md' } as const`) into a
//! plain JSON value when it is a structurally evaluable literal. The text is
//! parsed with `oxc_parser`; identifiers are followed through the oracle to
//! `const` declarations with literal initializers. Every other expression
//! yields `None`; nothing here fails.
use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrayExpression, ArrayExpressionElement, Expression, ObjectExpression, ObjectPropertyKind, PropertyKey,
    PropertyKind, Statement,
};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use oxc_syntax::operator::UnaryOperator;
use serde_json::{Map, Value};

use crate::oracle::{DeclId, TypeOracle, number_to_json};

/// How many identifier hops are followed (`a = B`, `const B = C`, ...).
const MAX_IDENTIFIER_HOPS: u32 = 8;

/// Initializers are parsed as the right-hand side of this binding, so object
/// literals are not mistaken for blocks and a trailing `;` or comment is fine.
const BINDING_PREFIX: &str = "const __default = ";

/// Evaluate `initializer` without identifier resolution.
pub fn extract_default(initializer: &str) -> Option<Value> {
    Evaluator::<dyn TypeOracle> { oracle: None, from: None }.evaluate_source(initializer, 0)
}

/// Evaluate `initializer` as written at declaration `from`, resolving
/// identifiers through `oracle`.
pub fn extract_default_at<O: TypeOracle + ?Sized>(oracle: &O, initializer: &str, from: DeclId) -> Option<Value> {
    Evaluator { oracle: Some(oracle), from: Some(from) }.evaluate_source(initializer, 0)
}

/// Default of the declaration's own initializer.
pub fn declaration_default<O: TypeOracle + ?Sized>(oracle: &O, decl: DeclId) -> Option<Value> {
    let declaration = oracle.declaration(decl).ok()?;
    let initializer = declaration.initializer.as_deref()?;
    extract_default_at(oracle, initializer, decl)
}

/// Per-property defaults of a destructured parameter:
/// `({ x = 1, y = 2 }: Point = {})` gives `{x: 1, y: 2}`.
pub fn binding_defaults<O: TypeOracle + ?Sized>(oracle: &O, decl: DeclId) -> IndexMap<String, Value> {
    let Ok(declaration) = oracle.declaration(decl) else {
        return IndexMap::new();
    };
    declaration
        .binding_elements
        .iter()
        .filter_map(|element| {
            let initializer = element.initializer.as_deref()?;
            let value = extract_default_at(oracle, initializer, decl)?;
            Some((element.property.clone(), value))
        })
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// EVALUATION
// ————————————————————————————————————————————————————————————————————————————

/// Outcome of evaluating a sub-expression. `undefined` has no JSON form but
/// must be distinguished from "not evaluable".
enum Evaluated {
    Value(Value),
    Undefined,
}

struct Evaluator<'a, O: ?Sized> {
    oracle: Option<&'a O>,
    from: Option<DeclId>,
}

impl<O: TypeOracle + ?Sized> Evaluator<'_, O> {
    fn evaluate_source(&self, src: &str, hops: u32) -> Option<Value> {
        match self.evaluate(src, hops)? {
            Evaluated::Value(value) => Some(value),
            Evaluated::Undefined => None,
        }
    }

    fn evaluate(&self, src: &str, hops: u32) -> Option<Evaluated> {
        let source = format!("{BINDING_PREFIX}{src}\n");
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, &source, SourceType::ts()).parse();
        if !parsed.errors.is_empty() {
            tracing::trace!(initializer = src, errors = parsed.errors.len(), "default is not an expression");
            return None;
        }
        let mut statements = parsed.program.body.iter();
        let (Some(Statement::VariableDeclaration(binding)), None) = (statements.next(), statements.next()) else {
            tracing::trace!(initializer = src, "default spans more than one expression");
            return None;
        };
        let expr = binding.declarations.first()?.init.as_ref()?;
        self.eval(expr, &source, hops)
    }

    fn eval(&self, expr: &Expression<'_>, source: &str, hops: u32) -> Option<Evaluated> {
        let value = match expr {
            Expression::NullLiteral(_) => Value::Null,
            Expression::BooleanLiteral(lit) => Value::Bool(lit.value),
            Expression::NumericLiteral(lit) if lit.value.is_finite() => number_to_json(lit.value),
            // No JSON form keeps the digits exactly; render as a string.
            Expression::BigIntLiteral(lit) => Value::String(bigint_digits(source, lit.span)),
            Expression::StringLiteral(lit) => Value::String(lit.value.to_string()),
            Expression::TemplateLiteral(lit) if lit.expressions.is_empty() => {
                let mut out = String::new();
                for quasi in lit.quasis.iter() {
                    out.push_str(quasi.value.cooked.as_ref()?.as_str());
                }
                Value::String(out)
            }
            Expression::Identifier(ident) if ident.name.as_str() == "undefined" => {
                return Some(Evaluated::Undefined);
            }
            Expression::Identifier(ident) => return self.identifier(ident.name.as_str(), hops),
            Expression::UnaryExpression(unary) => match (unary.operator, &unary.argument) {
                (UnaryOperator::UnaryNegation, Expression::NumericLiteral(lit)) if lit.value.is_finite() => {
                    number_to_json(-lit.value)
                }
                (UnaryOperator::UnaryPlus, Expression::NumericLiteral(lit)) if lit.value.is_finite() => {
                    number_to_json(lit.value)
                }
                (UnaryOperator::UnaryNegation, Expression::BigIntLiteral(lit)) => {
                    Value::String(format!("-{}", bigint_digits(source, lit.span)))
                }
                (UnaryOperator::Void, _) => return Some(Evaluated::Undefined),
                _ => return None,
            },
            Expression::ParenthesizedExpression(inner) => return self.eval(&inner.expression, source, hops),
            Expression::TSAsExpression(inner) => return self.eval(&inner.expression, source, hops),
            Expression::TSSatisfiesExpression(inner) => return self.eval(&inner.expression, source, hops),
            Expression::TSNonNullExpression(inner) => return self.eval(&inner.expression, source, hops),
            Expression::TSTypeAssertion(inner) => return self.eval(&inner.expression, source, hops),
            Expression::ArrayExpression(array) => Value::Array(self.array(array, source, hops)?),
            Expression::ObjectExpression(object) => Value::Object(self.object(object, source, hops)?),
            _ => return None,
        };
        Some(Evaluated::Value(value))
    }

    fn array(&self, array: &ArrayExpression<'_>, source: &str, hops: u32) -> Option<Vec<Value>> {
        let mut out = Vec::with_capacity(array.elements.len());
        for element in array.elements.iter() {
            match element {
                ArrayExpressionElement::Elision(_) => out.push(Value::Null),
                ArrayExpressionElement::SpreadElement(spread) => match self.eval(&spread.argument, source, hops)? {
                    Evaluated::Value(Value::Array(values)) => out.extend(values),
                    Evaluated::Value(Value::String(s)) => out.extend(s.chars().map(|c| Value::String(c.to_string()))),
                    _ => return None,
                },
                element => out.push(match self.eval(element.as_expression()?, source, hops)? {
                    Evaluated::Value(v) => v,
                    Evaluated::Undefined => Value::Null,
                }),
            }
        }
        Some(out)
    }

    fn object(&self, object: &ObjectExpression<'_>, source: &str, hops: u32) -> Option<Map<String, Value>> {
        let mut out = Map::new();
        for property in object.properties.iter() {
            match property {
                ObjectPropertyKind::ObjectProperty(prop) => {
                    if prop.computed || prop.method || !matches!(prop.kind, PropertyKind::Init) {
                        return None;
                    }
                    let key = property_key(&prop.key)?;
                    match self.eval(&prop.value, source, hops)? {
                        Evaluated::Value(v) => {
                            out.insert(key, v);
                        }
                        Evaluated::Undefined => {
                            out.remove(&key);
                        }
                    }
                }
                ObjectPropertyKind::SpreadProperty(spread) => match self.eval(&spread.argument, source, hops)? {
                    Evaluated::Value(Value::Object(fields)) => out.extend(fields),
                    Evaluated::Value(Value::Null) | Evaluated::Undefined => {}
                    _ => return None,
                },
            }
        }
        Some(out)
    }

    fn identifier(&self, name: &str, hops: u32) -> Option<Evaluated> {
        let (oracle, from) = (self.oracle?, self.from?);
        if hops >= MAX_IDENTIFIER_HOPS {
            return None;
        }
        let target = match oracle.resolve_identifier(name, from) {
            Ok(Some(target)) => target,
            Ok(None) => return None,
            Err(err) => {
                tracing::debug!(identifier = name, error = %err, "identifier lookup failed");
                return None;
            }
        };
        let declaration = oracle.declaration(target).ok()?;
        let initializer = declaration.initializer.as_deref()?;
        Evaluator { oracle: Some(oracle), from: Some(target) }.evaluate(initializer, hops + 1)
    }
}

fn property_key(key: &PropertyKey<'_>) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        PropertyKey::NumericLiteral(lit) => match number_to_json(lit.value) {
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// `1_000n` → `1000`.
fn bigint_digits(source: &str, span: Span) -> String {
    let raw = source.get(span.start as usize..span.end as usize).unwrap_or_default();
    raw.trim_end_matches('n').replace('_', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{BindingElement, DeclKind, GraphBuilder};
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(extract_default("5"), Some(json!(5)));
        assert_eq!(extract_default("-0.5"), Some(json!(-0.5)));
        assert_eq!(extract_default("-1.5e3"), Some(json!(-1500)));
        assert_eq!(extract_default("0xff"), Some(json!(255)));
        assert_eq!(extract_default("1_000"), Some(json!(1000)));
        assert_eq!(extract_default(".5"), Some(json!(0.5)));
        assert_eq!(extract_default("10n"), Some(json!("10")));
        assert_eq!(extract_default("'md'"), Some(json!("md")));
        assert_eq!(extract_default(r#""a\"b\n""#), Some(json!("a\"b\n")));
        assert_eq!(extract_default("`plain`"), Some(json!("plain")));
        assert_eq!(extract_default("true"), Some(json!(true)));
        assert_eq!(extract_default("null"), Some(json!(null)));
    }

    #[test]
    fn literals_and_structures() {
        assert_eq!(extract_default("{}"), Some(json!({})));
        assert_eq!(
            extract_default("{ size: 'md', tags: ['a', 'b'], nested: { on: true } } as const"),
            Some(json!({ "size": "md", "tags": ["a", "b"], "nested": { "on": true } }))
        );
        assert_eq!(
            extract_default("{ a: 1, 'b-c': [1, , 2], 3: (4) } satisfies Record<string, unknown>"),
            Some(json!({ "a": 1, "b-c": [1, null, 2], "3": 4 }))
        );
        assert_eq!(extract_default("[...[1, 2], 3]"), Some(json!([1, 2, 3])));
        assert_eq!(extract_default("{ ...{ a: 1 }, b: 2, a: 3 }"), Some(json!({ "a": 3, "b": 2 })));
    }

    #[test]
    fn comments_and_trailing_semicolon() {
        assert_eq!(extract_default("/* size */ 'md'; // trailing"), Some(json!("md")));
    }

    #[test]
    fn undefined_is_absent_at_the_top_and_skipped_inside() {
        assert_eq!(extract_default("undefined"), None);
        assert_eq!(extract_default("void 0"), None);
        assert_eq!(extract_default("{ a: undefined, b: 1 }"), Some(json!({ "b": 1 })));
        assert_eq!(extract_default("[undefined]"), Some(json!([null])));
    }

    #[test]
    fn computed_initializers_have_no_default() {
        for src in [
            "() => {}",
            "useState(0)",
            "a + 1",
            "new Map()",
            "obj.prop",
            "{ [key]: 1 }",
            "{ method() {} }",
            "{ get a() { return 1 } }",
            "`${x}`",
            "-x",
            "Infinity",
            "DEFAULT",
            "",
            "1; sideEffect()",
        ] {
            assert_eq!(extract_default(src), None, "{src}");
        }
    }

    #[test]
    fn identifiers_resolve_through_the_oracle() {
        let mut g = GraphBuilder::new();
        g.constant("DEFAULT_SIZE", "'md'", "src/button.tsx");
        g.constant("BASE", "{ padding: 4 }", "src/button.tsx");
        g.constant("LOOP", "LOOP", "src/button.tsx");
        let param = g.declaration(DeclKind::Parameter, Some("size"), "src/button.tsx");
        let oracle = g.finish().unwrap();

        assert_eq!(extract_default_at(&oracle, "DEFAULT_SIZE", param), Some(json!("md")));
        assert_eq!(
            extract_default_at(&oracle, "{ ...BASE, margin: 0 }", param),
            Some(json!({ "padding": 4, "margin": 0 }))
        );
        assert_eq!(extract_default_at(&oracle, "{ BASE }", param), Some(json!({ "BASE": { "padding": 4 } })));
        assert_eq!(extract_default_at(&oracle, "LOOP", param), None);
        assert_eq!(extract_default_at(&oracle, "UNKNOWN", param), None);
    }

    #[test]
    fn binding_pattern_defaults() {
        let mut g = GraphBuilder::new();
        let param = g.declaration(DeclKind::Parameter, None, "src/point.ts");
        g.decl(param).initializer = Some("{}".into());
        g.decl(param).binding_elements = vec![
            BindingElement { property: "x".into(), initializer: Some("1".into()) },
            BindingElement { property: "y".into(), initializer: Some("2".into()) },
            BindingElement { property: "z".into(), initializer: None },
        ];
        let oracle = g.finish().unwrap();

        let defaults = binding_defaults(&oracle, param);
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults["x"], json!(1));
        assert_eq!(defaults["y"], json!(2));
        assert_eq!(declaration_default(&oracle, param), Some(json!({})));
    }
}
