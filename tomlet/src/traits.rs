use crate::error::{Span, Tagged};
use crate::object::Object;
use crate::types::{Key, Map};


// Boxable
// ------------------------------------------------------------------------------------------------

/// Utility trait for converting any value to a boxed value.
pub trait Boxable<T> where T: Sized {
    /// Convert self to a boxed value.
    fn to_box(self) -> Box<T>;
}

impl<T> Boxable<T> for T {
    fn to_box(self) -> Box<T> { Box::new(self) }
}


// Taggable
// ------------------------------------------------------------------------------------------------

/// This trait provides the `tag` method, for wrapping a value in a [`Tagged`]
/// wrapper, which contains information about where in the source code this
/// object originated. This is used to report error messages.
///
/// There's no need to implement this trait beyond the blanket implementation.
pub trait Taggable: Sized {
    /// Wrap this object in a tagged wrapper.
    fn tag<T>(self, loc: T) -> Tagged<Self> where Span: From<T>;
}

impl<T> Taggable for T where T: Sized {
    fn tag<U>(self, loc: U) -> Tagged<Self> where Span: From<U> {
        Tagged::new(Span::from(loc), self)
    }
}


// ToVec
// ------------------------------------------------------------------------------------------------

/// Utility trait for converting things to vectors. This is used by the Object::list constructor.
pub trait ToVec<T> {
    fn to_vec(self) -> Vec<T>;
}

impl<T> ToVec<T> for () {
    fn to_vec(self) -> Vec<T> {
        vec![]
    }
}

impl<T> ToVec<T> for Vec<T> {
    fn to_vec(self) -> Vec<T> {
        self
    }
}

macro_rules! tuple_to_vec {
    ($($name:ident),+) => {
        impl<$($name),+> ToVec<Object> for ($($name,)+)
        where
            $(Object: From<$name>),+
        {
            #[allow(non_snake_case)]
            fn to_vec(self) -> Vec<Object> {
                let ($($name,)+) = self;
                vec![$(Object::from($name)),+]
            }
        }
    };
}

tuple_to_vec!(A);
tuple_to_vec!(A, B);
tuple_to_vec!(A, B, C);
tuple_to_vec!(A, B, C, D);
tuple_to_vec!(A, B, C, D, E);


// ToMap
// ------------------------------------------------------------------------------------------------

/// Utility trait for converting things to maps. This is used by the Object::map constructor.
pub trait ToMap {
    fn to_map(self) -> Map;
}

impl ToMap for Map {
    fn to_map(self) -> Map {
        self
    }
}

impl ToMap for () {
    fn to_map(self) -> Map {
        Map::new()
    }
}

impl<A, B> ToMap for Vec<(A, B)>
where
    A: AsRef<str>,
    Object: From<B>,
{
    fn to_map(self) -> Map {
        let mut ret = Map::new();
        for (k, v) in self {
            ret.insert(Key::new(k.as_ref()), Object::from(v));
        }
        ret
    }
}
