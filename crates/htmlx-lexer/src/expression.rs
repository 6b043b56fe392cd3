//! Balanced scanning of embedded script expressions.
//!
//! Expression text is opaque to HTMLX, but the lexer still has to find where
//! it ends: the first `}` that is not closing a nested `{`. Braces inside
//! string and template literals do not count.

/// Characters that open a block token (`{@html}`, `{#if}`, `{:else}`,
/// `{/if}`) and therefore never start expression content.
const BLOCK_SIGILS: &[u8] = b"@:/#";

/// Scan expression content starting at byte offset `start`.
///
/// Returns the exclusive end offset of the longest run that is balanced in
/// `{`/`}`, stopping just before the first `}` that would close an enclosing
/// delimiter. `"`, `'` and backtick literals are skipped as a whole, with
/// backslash escaping the next character; an unterminated literal runs to the
/// end of input, as does a run whose braces never close.
///
/// Returns `None` when the run would be empty, or when it would start with
/// whitespace or a block sigil.
pub fn scan_expression(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let first = *bytes.get(start)?;
    if BLOCK_SIGILS.contains(&first) || first.is_ascii_whitespace() {
        return None;
    }

    let mut depth = 0usize;
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            quote @ (b'"' | b'\'' | b'`') => {
                pos = skip_literal(bytes, pos, quote);
                continue;
            }
            _ => {}
        }
        pos += 1;
    }

    (pos > start).then_some(pos)
}

/// Skip a quoted literal whose opening quote is at `open`, returning the
/// offset just after the closing quote (or the end of input).
fn skip_literal(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}
