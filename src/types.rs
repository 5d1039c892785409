//! Type descriptors: `int`, `char`, pointers, and arrays.
//!
//! Types are immutable once constructed and arena-allocated, so a `&'a
//! Type<'a>` can be freely shared between every AST node and [`crate::symtab::Var`]
//! that has that type — there is never a need to clone a [`Type`].
//!
//! # Size model
//!
//! `int` and pointer are both 8 bytes on this AArch64 target. The original
//! intermediate size table used 16 for both, which conflicted with its own
//! 8-byte load/store codegen — that reads as a latent bug, not a deliberate
//! choice, so this implementation uses 8 throughout.

use subc_base::Arena;

/// A type descriptor: `int`, `char`, a pointer, or an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type<'a> {
    Int,
    Char,
    Ptr(&'a Type<'a>),
    Array(&'a Type<'a>, usize),
}

impl<'a> Type<'a> {
    /// Size in bytes of a value of this type.
    pub fn size(&self) -> usize {
        match self {
            Type::Int => 8,
            Type::Char => 1,
            Type::Ptr(_) => 8,
            Type::Array(base, count) => base.size() * count,
        }
    }

    /// The pointee type, for `Ptr` and `Array` — "is pointer-like" is
    /// simply `base().is_some()`.
    pub fn base(&self) -> Option<&'a Type<'a>> {
        match self {
            Type::Ptr(b) | Type::Array(b, _) => Some(b),
            Type::Int | Type::Char => None,
        }
    }

    /// `true` for `Ptr` and `Array` — types that decay to or already are an
    /// address, and so participate in pointer arithmetic and scaling.
    pub fn is_pointer_like(&self) -> bool {
        self.base().is_some()
    }

    /// `true` for `Array` specifically — arrays never get a load emitted
    /// when used as an lvalue; their address *is* their value.
    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_, _))
    }
}

/// Allocates the built-in scalar types and constructs compound ones.
///
/// A thin wrapper over an `Arena<Type>` so callers don't need to remember
/// to re-intern `Type::Int`/`Type::Char` — every call site just asks this
/// factory, keeping `==` on `&Type` meaningful by pointer identity where it
/// matters (it isn't required to be, since `Type` is structurally `PartialEq`
/// too, but sharing keeps arena growth down).
pub struct TypeArena<'a> {
    arena: &'a Arena<Type<'a>>,
    int: &'a Type<'a>,
    char: &'a Type<'a>,
}

impl<'a> TypeArena<'a> {
    pub fn new(arena: &'a Arena<Type<'a>>) -> Self {
        let int = arena.alloc(Type::Int);
        let char_ = arena.alloc(Type::Char);
        TypeArena { arena, int, char: char_ }
    }

    pub fn int(&self) -> &'a Type<'a> {
        self.int
    }

    pub fn char(&self) -> &'a Type<'a> {
        self.char
    }

    pub fn ptr(&self, base: &'a Type<'a>) -> &'a Type<'a> {
        self.arena.alloc(Type::Ptr(base))
    }

    pub fn array(&self, base: &'a Type<'a>, count: usize) -> &'a Type<'a> {
        self.arena.alloc(Type::Array(base, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_char_sizes() {
        assert_eq!(Type::Int.size(), 8);
        assert_eq!(Type::Char.size(), 1);
    }

    #[test]
    fn pointer_size_is_eight() {
        let arena = Arena::new();
        let types = TypeArena::new(&arena);
        assert_eq!(types.ptr(types.int()).size(), 8);
    }

    #[test]
    fn array_of_int_ten_is_eighty() {
        let arena = Arena::new();
        let types = TypeArena::new(&arena);
        let arr = types.array(types.int(), 10);
        assert_eq!(arr.size(), 80);
    }

    #[test]
    fn array_of_char_ptr_five_is_forty() {
        let arena = Arena::new();
        let types = TypeArena::new(&arena);
        let char_ptr = types.ptr(types.char());
        let arr = types.array(char_ptr, 5);
        assert_eq!(arr.size(), 40);
    }

    #[test]
    fn pointer_and_array_are_pointer_like() {
        let arena = Arena::new();
        let types = TypeArena::new(&arena);
        assert!(types.ptr(types.int()).is_pointer_like());
        assert!(types.array(types.int(), 3).is_pointer_like());
        assert!(!types.int().is_pointer_like());
        assert!(!types.char().is_pointer_like());
    }

    #[test]
    fn array_is_array_but_pointer_is_not() {
        let arena = Arena::new();
        let types = TypeArena::new(&arena);
        assert!(types.array(types.int(), 3).is_array());
        assert!(!types.ptr(types.int()).is_array());
    }
}
