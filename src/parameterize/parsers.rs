pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan a `:name` or `:name.path` placeholder whose colon sits at `colon`.
///
/// Returns the exclusive end of the name. The colon must not touch another colon on
/// either side, which keeps `::type` casts out.
pub(super) fn scan_placeholder(bytes: &[u8], colon: usize) -> Option<usize> {
    if colon > 0 && bytes[colon - 1] == b':' {
        return None;
    }

    let mut idx = scan_segment(bytes, colon + 1)?;
    while bytes.get(idx) == Some(&b'.') {
        match scan_segment(bytes, idx + 1) {
            Some(end) => idx = end,
            None => break,
        }
    }
    Some(idx)
}

fn scan_segment(bytes: &[u8], start: usize) -> Option<usize> {
    let mut idx = start;
    while idx < bytes.len() && is_ident_byte(bytes[idx]) {
        idx += 1;
    }
    if idx == start { None } else { Some(idx) }
}
