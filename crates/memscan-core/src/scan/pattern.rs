//! Pattern matching within a single buffer.

/// Find the first occurrence of a pattern in a buffer.
///
/// Returns the byte offset where the pattern starts, or None if not found.
///
/// # Example
///
/// ```
/// use memscan_core::scan::pattern::find_first_pattern;
///
/// let buffer = [1, 2, 3, 1, 2, 3];
/// assert_eq!(find_first_pattern(&buffer, &[2, 3]), Some(1));
/// ```
pub fn find_first_pattern(buffer: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > buffer.len() {
        return None;
    }

    buffer
        .windows(pattern.len())
        .position(|window| window == pattern)
}

/// Find the first occurrence of a pattern whose absolute address is aligned.
///
/// `buffer_base` is the address of `buffer[0]`. Only offsets `o` with
/// `(buffer_base + o) % alignment == 0` are compared, in increasing order, and
/// only where the whole pattern fits inside `buffer`.
///
/// # Example
///
/// ```
/// use memscan_core::scan::pattern::find_first_aligned;
///
/// let buffer = b"xABxxxABxx";
/// // "AB" sits at 0x1001 and 0x1006; only the second is 2-byte aligned.
/// assert_eq!(find_first_aligned(buffer, 0x1000, b"AB", 2), Some(6));
/// ```
pub fn find_first_aligned(
    buffer: &[u8],
    buffer_base: u64,
    pattern: &[u8],
    alignment: u64,
) -> Option<usize> {
    if alignment == 0 || pattern.is_empty() || pattern.len() > buffer.len() {
        return None;
    }
    if alignment == 1 {
        return find_first_pattern(buffer, pattern);
    }

    let last = (buffer.len() - pattern.len()) as u64;
    let misalignment = buffer_base % alignment;
    let mut offset = if misalignment == 0 {
        0
    } else {
        alignment - misalignment
    };

    while offset <= last {
        let start = offset as usize;
        if &buffer[start..start + pattern.len()] == pattern {
            return Some(start);
        }
        offset = offset.checked_add(alignment)?;
    }
    None
}
