//! Stack layout pass: assigns a frame offset to every local variable.
//!
//! Deliberately kept separate from the resolver and the code generator —
//! offsets are plain arithmetic over already-typed variables, with no
//! bearing on the grammar or on type correctness, so giving it its own
//! pass keeps both of those simpler to read.

use crate::ast::Function;

const STACK_ALIGN: u32 = 16;

/// Assigns each local (including parameters, which occupy a prefix of
/// `locals`) a frame offset in declaration order, then records the
/// function's total frame size rounded up to a 16-byte multiple.
pub fn assign_offsets(function: &Function<'_>) {
    let mut offset: u32 = 0;

    for var in &function.locals {
        offset += var.ty.size() as u32;
        var.offset.set(offset);
    }

    function.stack_size.set(round_up(offset, STACK_ALIGN));
}

fn round_up(value: u32, align: u32) -> u32 {
    (value + align - 1) / align * align
}
