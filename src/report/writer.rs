use super::formatting::{BANNER, HEADER, STYLES, Style, style_id, sum_formula};
use super::workbook::{CellValue, HEADER_ROW, Row, Sheet, Workbook};
use crate::error::{AppError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

const SPREADSHEET_NS: &str = "urn:schemas-microsoft-com:office:spreadsheet";

fn xml<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Report(e.to_string())
}

/// Serialize `workbook` as an XML Spreadsheet 2003 document.
pub fn write_workbook<W: Write>(w: W, workbook: &Workbook) -> Result<()> {
    let mut wr = Writer::new_with_indent(w, b' ', 1);
    wr.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml)?;
    wr.get_mut()
        .write_all(b"\n<?mso-application progid=\"Excel.Sheet\"?>")?;

    let root = BytesStart::new("Workbook").with_attributes([
        ("xmlns", SPREADSHEET_NS),
        ("xmlns:o", "urn:schemas-microsoft-com:office:office"),
        ("xmlns:x", "urn:schemas-microsoft-com:office:excel"),
        ("xmlns:ss", SPREADSHEET_NS),
    ]);
    wr.write_event(Event::Start(root)).map_err(xml)?;

    write_styles(&mut wr)?;
    for sheet in &workbook.sheets {
        write_sheet(&mut wr, sheet)?;
    }

    wr.write_event(Event::End(BytesEnd::new("Workbook")))
        .map_err(xml)?;
    wr.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_styles<W: Write>(wr: &mut Writer<W>) -> Result<()> {
    wr.write_event(Event::Start(BytesStart::new("Styles")))
        .map_err(xml)?;
    for style in &STYLES {
        write_style(wr, style)?;
    }
    wr.write_event(Event::End(BytesEnd::new("Styles")))
        .map_err(xml)?;
    Ok(())
}

fn write_style<W: Write>(wr: &mut Writer<W>, style: &Style) -> Result<()> {
    let start = BytesStart::new("Style").with_attributes([("ss:ID", style.id)]);
    wr.write_event(Event::Start(start)).map_err(xml)?;
    if style.bold {
        let font = BytesStart::new("Font").with_attributes([("ss:Bold", "1")]);
        wr.write_event(Event::Empty(font)).map_err(xml)?;
    }
    if style.centered {
        let align = BytesStart::new("Alignment").with_attributes([("ss:Horizontal", "Center")]);
        wr.write_event(Event::Empty(align)).map_err(xml)?;
    }
    if let Some(format) = style.number_format {
        let number = BytesStart::new("NumberFormat").with_attributes([("ss:Format", format)]);
        wr.write_event(Event::Empty(number)).map_err(xml)?;
    }
    wr.write_event(Event::End(BytesEnd::new("Style")))
        .map_err(xml)?;
    Ok(())
}

fn write_sheet<W: Write>(wr: &mut Writer<W>, sheet: &Sheet) -> Result<()> {
    let start = BytesStart::new("Worksheet").with_attributes([("ss:Name", sheet.name.as_str())]);
    wr.write_event(Event::Start(start)).map_err(xml)?;
    wr.write_event(Event::Start(BytesStart::new("Table")))
        .map_err(xml)?;

    let merge_across = (sheet.width() - 1).to_string();
    for line in &sheet.banner {
        wr.write_event(Event::Start(BytesStart::new("Row")))
            .map_err(xml)?;
        let mut cell = BytesStart::new("Cell");
        if sheet.width() > 1 {
            cell.push_attribute(("ss:MergeAcross", merge_across.as_str()));
        }
        cell.push_attribute(("ss:StyleID", BANNER.id));
        write_data_cell(wr, cell, "String", line)?;
        wr.write_event(Event::End(BytesEnd::new("Row")))
            .map_err(xml)?;
    }

    let header_index = HEADER_ROW.to_string();
    let header_row = BytesStart::new("Row").with_attributes([("ss:Index", header_index.as_str())]);
    wr.write_event(Event::Start(header_row)).map_err(xml)?;
    for header in &sheet.headers {
        let cell = BytesStart::new("Cell").with_attributes([("ss:StyleID", HEADER.id)]);
        write_data_cell(wr, cell, "String", header)?;
    }
    wr.write_event(Event::End(BytesEnd::new("Row")))
        .map_err(xml)?;

    for row in &sheet.rows {
        write_row(wr, row)?;
    }

    wr.write_event(Event::End(BytesEnd::new("Table")))
        .map_err(xml)?;
    wr.write_event(Event::End(BytesEnd::new("Worksheet")))
        .map_err(xml)?;
    Ok(())
}

fn write_row<W: Write>(wr: &mut Writer<W>, row: &Row) -> Result<()> {
    wr.write_event(Event::Start(BytesStart::new("Row")))
        .map_err(xml)?;

    for (col, value) in row.cells.iter().enumerate() {
        let mut cell = BytesStart::new("Cell").with_attributes([("ss:StyleID", style_id(value, row.kind))]);
        match value {
            CellValue::Empty => {
                wr.write_event(Event::Empty(cell)).map_err(xml)?;
            }
            CellValue::Text(text) => write_data_cell(wr, cell, "String", text)?,
            CellValue::Integer(n) => write_data_cell(wr, cell, "Number", &n.to_string())?,
            CellValue::Number(amount, _) => {
                write_data_cell(wr, cell, "Number", &amount.to_string())?
            }
            CellValue::Date(date) => {
                let stamp = format!("{}T00:00:00.000", date.format("%Y-%m-%d"));
                write_data_cell(wr, cell, "DateTime", &stamp)?
            }
            CellValue::Sum { rows, total, .. } => {
                if !rows.is_empty() {
                    let formula = sum_formula(rows, col + 1);
                    cell.push_attribute(("ss:Formula", formula.as_str()));
                }
                write_data_cell(wr, cell, "Number", &total.to_string())?
            }
        }
    }

    wr.write_event(Event::End(BytesEnd::new("Row")))
        .map_err(xml)?;
    Ok(())
}

fn write_data_cell<W: Write>(
    wr: &mut Writer<W>,
    cell: BytesStart<'_>,
    data_type: &str,
    text: &str,
) -> Result<()> {
    wr.write_event(Event::Start(cell)).map_err(xml)?;
    let data = BytesStart::new("Data").with_attributes([("ss:Type", data_type)]);
    wr.write_event(Event::Start(data)).map_err(xml)?;
    wr.write_event(Event::Text(BytesText::new(text)))
        .map_err(xml)?;
    wr.write_event(Event::End(BytesEnd::new("Data")))
        .map_err(xml)?;
    wr.write_event(Event::End(BytesEnd::new("Cell")))
        .map_err(xml)?;
    Ok(())
}
