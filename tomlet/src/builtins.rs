use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Error, TypeMismatch};
use crate::object::Object;
use crate::types::{Builtin, Key, List, Type};


macro_rules! builtin {
    ($m: ident, $e: ident) => {
        $m.insert(
            stringify!($e),
            Builtin::new($e, Key::new(stringify!($e))),
        )
    };
}


lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, Builtin> = {
        let mut m = HashMap::new();
        builtin!(m, sort);
        m
    };
}


/// Return a new list with the elements of the single list argument in
/// ascending natural order. The sort is stable.
pub fn sort(args: &List) -> Result<Object, Error> {
    match args.as_slice() {
        [Object::List(x)] => merge_sort(x.clone()).map(Object::List),
        [x] => Err(Error::new(TypeMismatch::ExpectedArg {
            index: 0,
            allowed: Type::List,
            received: x.type_of(),
        })),
        _ => Err(Error::new(TypeMismatch::ArgCount {
            low: 1,
            high: 1,
            received: args.len(),
        })),
    }
}


fn compare(x: &Object, y: &Object) -> Result<Ordering, Error> {
    x.partial_cmp(y).ok_or_else(
        || Error::new(TypeMismatch::Incomparable(x.type_of(), y.type_of()))
    )
}


// The standard library sorts may panic when the comparator is not a total
// order, so incomparable elements have to surface as errors from our own sort.
fn merge_sort(mut values: List) -> Result<List, Error> {
    if values.len() <= 1 {
        return Ok(values);
    }

    let right = values.split_off(values.len() / 2);
    let left = merge_sort(values)?;
    let right = merge_sort(right)?;

    let mut merged = List::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    while let (Some(x), Some(y)) = (left.peek(), right.peek()) {
        // Ties go to the left half
        if compare(x, y)? == Ordering::Greater {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }

    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}
