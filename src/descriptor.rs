//! Method descriptor scanning (JVMS §4.3.3): counting argument slots for frame transfer.
//!
//! `program.rs` decodes types with a regex split plus a hardcoded 18-byte length for object
//! types, a heuristic that only happens to work for the fixtures it was tested against. This
//! instead performs the direct character scan the format actually calls for: `J`
//! and `D` occupy two slots, `L...;` and `[...` are scanned to their terminator and occupy one,
//! and every other primitive letter occupies one.

use crate::error::{VmError, VmResult};

/// One formal parameter's width on the operand stack / in local variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgWidth {
    Narrow,
    Wide,
}

impl ArgWidth {
    pub fn slots(self) -> usize {
        match self {
            ArgWidth::Narrow => 1,
            ArgWidth::Wide => 2,
        }
    }
}

/// Scans `descriptor`'s parenthesized argument section, left to right, returning one `ArgWidth`
/// per formal parameter in declaration order.
pub fn argument_widths(descriptor: &str) -> VmResult<Vec<ArgWidth>> {
    let open = descriptor
        .find('(')
        .ok_or_else(|| VmError::MalformedClass(format!("descriptor missing '(': {descriptor}")))?;
    let close = descriptor
        .find(')')
        .ok_or_else(|| VmError::MalformedClass(format!("descriptor missing ')': {descriptor}")))?;
    if close < open {
        return Err(VmError::MalformedClass(format!("malformed descriptor: {descriptor}")));
    }

    let args: Vec<char> = descriptor[open + 1..close].chars().collect();
    let mut widths = Vec::new();
    let mut i = 0usize;
    while i < args.len() {
        let (width, consumed) = scan_one_type(&args[i..], descriptor)?;
        widths.push(width);
        i += consumed;
    }
    Ok(widths)
}

pub fn argument_slot_count(descriptor: &str) -> VmResult<usize> {
    Ok(argument_widths(descriptor)?.iter().map(|w| w.slots()).sum())
}

/// Scans a single field-descriptor-shaped type starting at `chars[0]`, returning its width and
/// how many characters it consumed.
fn scan_one_type(chars: &[char], full_descriptor: &str) -> VmResult<(ArgWidth, usize)> {
    match chars.first() {
        Some('J') | Some('D') => Ok((ArgWidth::Wide, 1)),
        Some('I') | Some('F') | Some('B') | Some('C') | Some('S') | Some('Z') => Ok((ArgWidth::Narrow, 1)),
        Some('L') => {
            let end = chars
                .iter()
                .position(|&c| c == ';')
                .ok_or_else(|| VmError::MalformedClass(format!("unterminated object type in: {full_descriptor}")))?;
            Ok((ArgWidth::Narrow, end + 1))
        }
        Some('[') => {
            let mut depth = 0usize;
            while depth < chars.len() && chars[depth] == '[' {
                depth += 1;
            }
            let (_, inner_len) = scan_one_type(&chars[depth..], full_descriptor)?;
            Ok((ArgWidth::Narrow, depth + inner_len))
        }
        Some(other) => Err(VmError::MalformedClass(format!("unknown descriptor char '{other}' in: {full_descriptor}"))),
        None => Err(VmError::MalformedClass(format!("ran out of characters scanning: {full_descriptor}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_primitive_arguments() {
        assert_eq!(argument_slot_count("(II)I").unwrap(), 2);
    }

    #[test]
    fn longs_and_doubles_count_as_two_slots() {
        assert_eq!(argument_slot_count("(JD)V").unwrap(), 4);
    }

    #[test]
    fn object_types_count_as_one_slot_regardless_of_name_length() {
        assert_eq!(argument_slot_count("(Ljava/lang/String;I)V").unwrap(), 2);
    }

    #[test]
    fn array_types_count_as_one_slot() {
        assert_eq!(argument_slot_count("([I[[Ljava/lang/String;)V").unwrap(), 2);
    }

    #[test]
    fn no_argument_descriptor_is_zero() {
        assert_eq!(argument_slot_count("()V").unwrap(), 0);
    }

    #[test]
    fn missing_parens_is_malformed() {
        assert!(argument_slot_count("IV").is_err());
    }
}
