use std::fmt::{Debug, Display};

use symbol_table::GlobalSymbol;

use crate::error::Error;
use crate::object::Object;
use crate::wrappers::OrderedMap;

/// Type used for all interned strings: variable names, dictionary keys and
/// function names.
pub type Key = GlobalSymbol;

/// Type used for lists.
pub type List = Vec<Object>;

/// Type used for mapping of strings (that is, [`Key`]) to objects.
pub type Map = OrderedMap<Key, Object>;

pub type NativeFunction = fn(&List) -> Result<Object, Error>;

/// A function implemented in Rust, callable by name.
#[derive(Copy, Clone)]
pub struct Builtin {
    func: NativeFunction,
    name: Key,
}

impl Builtin {
    pub fn new(func: NativeFunction, name: Key) -> Builtin {
        Builtin { func, name }
    }

    pub fn call(&self, args: &List) -> Result<Object, Error> {
        (self.func)(args)
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name.as_str()).finish()
    }
}

/// Enumeration of all the different types a tomlet object can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// i64
    Integer,

    /// f64
    Float,

    /// String
    String,

    /// bool
    Boolean,

    /// Vec<Object>
    List,

    /// OrderedMap<Key, Object>
    Map,

    /// The empty variant
    Null,
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("str"),
            Self::Boolean => f.write_str("bool"),
            Self::List => f.write_str("list"),
            Self::Map => f.write_str("map"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// Addition or string concatenation: `+`
    Add,
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => f.write_str("+"),
        }
    }
}
