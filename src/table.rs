use unicode_width::UnicodeWidthStr;

/// Render rows as a bordered text table.
///
/// # Arguments
///
/// * `rows` - Table rows; short rows are padded with empty cells.
/// * `heading` - Whether the first row is a heading, separated from the
///   rest by a border.
///
/// # Returns
///
/// * `String` - The rendered table, one line per row plus borders, or an
///   empty string for an empty table.
pub fn render_table(rows: &[Vec<String>], heading: bool) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; columns];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let border = widths.iter().fold(String::from("+"), |mut line, width| {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
        line
    });

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');

    for (index, row) in rows.iter().enumerate() {
        out.push('|');
        for (column, width) in widths.iter().enumerate() {
            let cell = row.get(column).map(String::as_str).unwrap_or("");
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(width - cell.width()));
            out.push_str(" |");
        }
        out.push('\n');

        if heading && index == 0 && rows.len() > 1 {
            out.push_str(&border);
            out.push('\n');
        }
    }

    out.push_str(&border);
    out.push('\n');
    out
}
