use crate::ast::{Expr, Number, Program};
use crate::builtins::BUILTINS;
use crate::error::{Action, Error, Reason, Tagged};
use crate::object::Object;
use crate::types::{Key, List, Map};


/// The environment of a single evaluation run.
///
/// There is only one flat scope: a binding made by `let` is visible to
/// everything evaluated after it, and rebinding a name replaces the old
/// value.
#[derive(Debug, Default)]
pub struct Namespace {
    names: Map,
}

impl Namespace {
    pub fn new() -> Namespace {
        Namespace::default()
    }

    /// Look up a bound name.
    pub fn get(&self, key: &Key) -> Result<Object, Error> {
        self.names.get(key).cloned().ok_or_else(|| Error::new(Reason::Unbound(*key)))
    }

    /// Bind a name, replacing any earlier binding.
    pub fn set(&mut self, key: Key, value: Object) {
        self.names.insert(key, value);
    }

    /// Evaluate every statement in order. The result is the value of the
    /// last statement, or null if there are none.
    pub fn eval_program(&mut self, program: &Program) -> Result<Object, Error> {
        let mut result = Object::Null;
        for statement in &program.statements {
            result = self.eval(statement)?;
        }
        Ok(result)
    }

    pub fn eval(&mut self, node: &Tagged<Expr>) -> Result<Object, Error> {
        match node.as_ref() {
            Expr::Number(Number::Integer(x)) => Ok(Object::Integer(*x)),
            Expr::Number(Number::Float(x)) => Ok(Object::Float(*x)),
            Expr::String(x) => Ok(Object::String(x.clone())),

            Expr::Array(elements) => {
                let mut values = List::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                Ok(Object::List(values))
            }

            Expr::Dictionary(pairs) => {
                let mut values = Map::new();
                for (key, value) in pairs {
                    let value = self.eval(value)?;
                    values.insert(*key, value);
                }
                Ok(Object::Map(values))
            }

            Expr::Variable(name) => self.get(name).map_err(|err| err.tag(node, Action::LookupName)),

            Expr::Let { name, value } => {
                let value = self.eval(value)?;
                self.set(**name, value.clone());
                Ok(value)
            }

            Expr::BinOp { left, op: _, right } => {
                let x = self.eval(left)?;
                let y = self.eval(right)?;
                x.add(&y).map_err(|err| err.tag(node, Action::Evaluate))
            }

            Expr::FunctionCall { name, args } => self.call(node, name, args),
        }
    }

    fn call(&mut self, node: &Tagged<Expr>, name: &Tagged<Key>, args: &[Tagged<Expr>]) -> Result<Object, Error> {
        let func = BUILTINS.get(name.as_str()).ok_or_else(
            || Error::new(Reason::UnknownFunction(**name)).tag(name, Action::LookupFunction)
        )?;

        let mut values = List::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }

        func.call(&values).map_err(|err| err.tag(node, Action::Call))
    }
}


/// Evaluate a program in a fresh environment.
pub fn eval(program: &Program) -> Result<Object, Error> {
    Namespace::new().eval_program(program)
}
