use crate::model::{Attribute, ClassBuilder, ClassPool, LibraryClassBuilder};

/// Creates a pool holding only the library class `java/lang/Object`.
pub fn object_pool() -> ClassPool {
    let mut pool = ClassPool::new();
    pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
    pool
}

/// Creates a `Code` attribute executing a single instruction with a two-byte pool operand,
/// followed by `return`.
pub fn single_call_code(builder: &mut ClassBuilder, opcode: u8, index: u16) -> Attribute {
    let [high, low] = index.to_be_bytes();
    builder.code(2, 1, vec![opcode, high, low, 0xb1], Vec::new())
}
