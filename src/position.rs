/// Maps a byte offset into `source` to a 1-based (line, column) pair.
///
/// The core error types only carry byte offsets; rendering them as
/// "line N, column M" is left to the caller.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}
