use super::Extracted;
use super::parsers::{is_line_comment_start, scan_placeholder};

#[derive(Clone, Copy)]
enum State {
    Normal,
    LineComment,
}

pub(super) fn extract_params(template: &str) -> Extracted {
    let bytes = template.as_bytes();
    let mut names: Vec<String> = Vec::new();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        match state {
            State::LineComment => {
                if bytes[idx] == b'\n' {
                    state = State::Normal;
                }
            }
            State::Normal => {
                if is_line_comment_start(bytes, idx) {
                    state = State::LineComment;
                    idx += 2;
                    continue;
                }
                if bytes[idx] == b':'
                    && let Some(end) = scan_placeholder(bytes, idx)
                {
                    let name = &template[idx + 1..end];
                    let position = match names.iter().position(|n| n == name) {
                        Some(position) => position,
                        None => {
                            names.push(name.to_string());
                            names.len() - 1
                        }
                    };

                    let buf = out.get_or_insert_with(|| String::with_capacity(template.len()));
                    buf.push_str(&template[copied..idx]);
                    buf.push('$');
                    buf.push_str(&(position + 1).to_string());
                    copied = end;
                    idx = end;
                    continue;
                }
            }
        }
        idx += 1;
    }

    let text = match out {
        Some(mut buf) => {
            buf.push_str(&template[copied..]);
            buf
        }
        None => template.to_string(),
    };

    Extracted { text, names }
}
