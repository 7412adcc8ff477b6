//! Bytecode operand scanning.
//!
//! The shrinker never rewrites instructions; it only needs to know which constant pool
//! entries a method body references. [`constant_operands`] walks the instruction stream
//! using the operand layout of JVMS §6.5 and collects every constant pool index operand.

use crate::Result;

const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;
const LDC2_W: u8 = 0x14;
const ILOAD: u8 = 0x15;
const ALOAD: u8 = 0x19;
const ISTORE: u8 = 0x36;
const ASTORE: u8 = 0x3a;
const IINC: u8 = 0x84;
const IFEQ: u8 = 0x99;
const JSR: u8 = 0xa8;
const RET: u8 = 0xa9;
const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const GETSTATIC: u8 = 0xb2;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const INVOKEDYNAMIC: u8 = 0xba;
const NEW: u8 = 0xbb;
const NEWARRAY: u8 = 0xbc;
const ANEWARRAY: u8 = 0xbd;
const CHECKCAST: u8 = 0xc0;
const INSTANCEOF: u8 = 0xc1;
const WIDE: u8 = 0xc4;
const MULTIANEWARRAY: u8 = 0xc5;
const IFNULL: u8 = 0xc6;
const IFNONNULL: u8 = 0xc7;
const GOTO_W: u8 = 0xc8;
const JSR_W: u8 = 0xc9;
const BIPUSH: u8 = 0x10;
const SIPUSH: u8 = 0x11;

/// Returns the constant pool indices referenced by the instructions of `code`, in
/// instruction order. Duplicates are kept.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for unknown opcodes and truncated instructions.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::bytecode::constant_operands;
///
/// // aload_0; invokespecial #1; ldc #7; return
/// let code = [0x2a, 0xb7, 0x00, 0x01, 0x12, 0x07, 0xb1];
/// assert_eq!(constant_operands(&code).unwrap(), vec![1, 7]);
/// ```
pub fn constant_operands(code: &[u8]) -> Result<Vec<u16>> {
    let mut operands = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        let opcode = code[offset];
        let length = instruction_length(code, offset)?;
        if offset + length > code.len() {
            return Err(malformed_error!(
                "Truncated instruction 0x{:02x} at offset {}",
                opcode,
                offset
            ));
        }
        match opcode {
            LDC => operands.push(u16::from(code[offset + 1])),
            LDC_W | LDC2_W | GETSTATIC..=INVOKEDYNAMIC | NEW | ANEWARRAY | CHECKCAST
            | INSTANCEOF | MULTIANEWARRAY => {
                operands.push(u16::from_be_bytes([code[offset + 1], code[offset + 2]]));
            }
            _ => {}
        }
        offset += length;
    }
    Ok(operands)
}

/// Returns the length in bytes of the instruction starting at `offset`, operands and
/// switch padding included.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for unknown opcodes and switch tables that run past
/// the end of the code.
pub fn instruction_length(code: &[u8], offset: usize) -> Result<usize> {
    let opcode = code
        .get(offset)
        .copied()
        .ok_or_else(|| malformed_error!("Instruction offset {} outside code", offset))?;
    let length = match opcode {
        0x00..=0x0f | 0x1a..=0x35 | 0x3b..=0x83 | 0x85..=0x98 | 0xac..=0xb1 | 0xbe | 0xbf
        | 0xc2 | 0xc3 => 1,
        BIPUSH | LDC | ILOAD..=ALOAD | ISTORE..=ASTORE | RET | NEWARRAY => 2,
        SIPUSH | LDC_W | LDC2_W | IINC | IFEQ..=JSR | GETSTATIC..=INVOKESTATIC | NEW
        | ANEWARRAY | CHECKCAST | INSTANCEOF | IFNULL | IFNONNULL => 3,
        MULTIANEWARRAY => 4,
        INVOKEINTERFACE | INVOKEDYNAMIC | GOTO_W | JSR_W => 5,
        WIDE => match code.get(offset + 1) {
            Some(&IINC) => 6,
            Some(_) => 4,
            None => return Err(malformed_error!("Truncated wide instruction at offset {}", offset)),
        },
        TABLESWITCH => {
            let base = switch_operands_start(offset);
            let low = read_i32(code, base + 4)?;
            let high = read_i32(code, base + 8)?;
            let count = i64::from(high) - i64::from(low) + 1;
            if count < 0 {
                return Err(malformed_error!("Invalid tableswitch bounds at offset {}", offset));
            }
            base - offset + 12 + 4 * count as usize
        }
        LOOKUPSWITCH => {
            let base = switch_operands_start(offset);
            let pairs = read_i32(code, base + 4)?;
            if pairs < 0 {
                return Err(malformed_error!("Invalid lookupswitch size at offset {}", offset));
            }
            base - offset + 8 + 8 * pairs as usize
        }
        _ => {
            return Err(malformed_error!(
                "Invalid opcode 0x{:02x} at offset {}",
                opcode,
                offset
            ))
        }
    };
    Ok(length)
}

/// Offset of the first switch operand: the next 4-byte aligned offset after the opcode.
fn switch_operands_start(offset: usize) -> usize {
    (offset + 1).next_multiple_of(4)
}

fn read_i32(code: &[u8], at: usize) -> Result<i32> {
    code.get(at..at + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(i32::from_be_bytes)
        .ok_or_else(|| malformed_error!("Truncated switch table at offset {}", at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_field_and_type_operands() {
        // new #2; dup; invokespecial #3; getstatic #4; checkcast #5; areturn
        let code = [
            0xbb, 0x00, 0x02, 0x59, 0xb7, 0x00, 0x03, 0xb2, 0x00, 0x04, 0xc0, 0x00, 0x05, 0xb0,
        ];
        assert_eq!(constant_operands(&code).unwrap(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_invokeinterface_and_dynamic() {
        // invokeinterface #9 count 1; invokedynamic #10 0 0; return
        let code = [0xb9, 0x00, 0x09, 0x01, 0x00, 0xba, 0x00, 0x0a, 0x00, 0x00, 0xb1];
        assert_eq!(constant_operands(&code).unwrap(), vec![9, 10]);
    }

    #[test]
    fn test_non_constant_operands_ignored() {
        // bipush 18; sipush 0x12 0x13; iload 20; iinc 1 1; goto +3; return
        let code = [
            0x10, 0x12, 0x11, 0x12, 0x13, 0x15, 0x14, 0x84, 0x01, 0x01, 0xa7, 0x00, 0x03, 0xb1,
        ];
        assert!(constant_operands(&code).unwrap().is_empty());
    }

    #[test]
    fn test_wide_instructions() {
        // wide iload 256; wide iinc 1 1000; ldc_w #300
        let code = [
            0xc4, 0x15, 0x01, 0x00, 0xc4, 0x84, 0x00, 0x01, 0x03, 0xe8, 0x13, 0x01, 0x2c,
        ];
        assert_eq!(constant_operands(&code).unwrap(), vec![300]);
    }

    #[test]
    fn test_tableswitch_padding() {
        // nop; tableswitch (2 bytes padding) default 0, low 0, high 1, two offsets; ldc #3
        let mut code = vec![0x00, 0xaa, 0x00, 0x00];
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&[0x12, 0x03]);
        assert_eq!(instruction_length(&code, 1).unwrap(), 23);
        assert_eq!(constant_operands(&code).unwrap(), vec![3]);
    }

    #[test]
    fn test_lookupswitch() {
        // lookupswitch at 0 (3 bytes padding) default, npairs 1, one pair; return
        let mut code = vec![0xab, 0x00, 0x00, 0x00];
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes());
        code.extend_from_slice(&5i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.push(0xb1);
        assert_eq!(instruction_length(&code, 0).unwrap(), 20);
        assert!(constant_operands(&code).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_and_truncated() {
        assert!(matches!(
            constant_operands(&[0xff]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            constant_operands(&[0xb7, 0x00]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            constant_operands(&[0xaa, 0x00]),
            Err(Error::Malformed { .. })
        ));
    }
}
