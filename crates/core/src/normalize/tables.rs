// ABOUTME: Pseudo-table detection with row and cell cascades.
// ABOUTME: Also holds the border and padding styles applied to genuine tables.

use scraper::ElementRef;

use crate::dom::select;
use crate::dom::style::StyleDecls;

/// Editor table containers. Genuine `table` elements are handled separately.
pub const TABLE_SELECTORS: &[&str] = &[".lark-table", r#"[data-type="table"]"#, ".doc-table"];

pub const ROW_SELECTORS: &[&str] = &[
    ".lark-table-row",
    r#"[data-type="table-row"]"#,
    ".table-row",
    "tr",
];

pub const CELL_SELECTORS: &[&str] = &[
    ".lark-table-cell",
    r#"[data-type="table-cell"]"#,
    ".table-cell",
    "td, th",
];

pub const TABLE_STYLE: &str = "border-collapse: collapse; width: 100%";
pub const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 8px";

pub fn is_editor_table(el: &ElementRef) -> bool {
    el.value().name() != "table" && select::first_matching(el, TABLE_SELECTORS).is_some()
}

/// Rows of an editor table, then the cells of each row. Rows without cells are skipped.
pub fn find_grid<'a>(table: ElementRef<'a>) -> Vec<Vec<ElementRef<'a>>> {
    let Some(rows) = select::first_selector_match(table, ROW_SELECTORS) else {
        return Vec::new();
    };
    select::outermost(table, rows)
        .into_iter()
        .filter_map(|row| {
            select::first_selector_match(row, CELL_SELECTORS).map(|cells| select::outermost(row, cells))
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// Merge `extra` into an element's existing inline style.
pub fn merged_style(existing: Option<&str>, extra: &str) -> String {
    StyleDecls::parse(existing.unwrap_or(""))
        .merge(&StyleDecls::parse(extra))
        .to_string()
}
