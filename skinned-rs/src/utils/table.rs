//! Table formatting utilities

use prettytable::{Cell, Row, Table};

/// Create a table with bold headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).style_spec("b"))
        .collect();
    table.set_titles(Row::new(header_cells));

    table
}

/// Add a row of already formatted cells
pub fn add_table_row<I>(table: &mut Table, cells: I)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let row_cells: Vec<Cell> = cells.into_iter().map(|s| Cell::new(s.as_ref())).collect();
    table.add_row(Row::new(row_cells));
}
