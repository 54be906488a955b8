//! CSV row encoding
//!
//! Minimal quoting: a field is wrapped in quotes only when it contains the
//! delimiter, the quote character, CR or LF. Embedded quotes are doubled.
//! Rows end with `\r\n`.

/// Field delimiter
pub const DELIMITER: char = ',';

/// Quote character
pub const QUOTE: char = '"';

/// Row terminator
pub const LINE_TERMINATOR: &str = "\r\n";

fn needs_quotes(field: &str) -> bool {
    field.contains(DELIMITER) || field.contains(QUOTE) || field.contains('\n') || field.contains('\r')
}

/// Encodes one complete row, terminator included
pub fn encode_row(fields: &[&str]) -> String {
    let mut row = String::with_capacity(fields.iter().map(|f| f.len() + 3).sum::<usize>() + 2);

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            row.push(DELIMITER);
        }
        if needs_quotes(field) {
            row.push(QUOTE);
            row.push_str(&field.replace(QUOTE, "\"\""));
            row.push(QUOTE);
        } else {
            row.push_str(field);
        }
    }

    row.push_str(LINE_TERMINATOR);
    row
}
