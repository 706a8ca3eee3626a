use crate::domain::model::{Cell, Table};
use crate::utils::error::Result;
use std::io::Write;
use std::path::Path;

fn csv_field(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        other => other.to_string(),
    }
}

/// Writes a header row plus one record per table row. NULL becomes an empty field.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.columns)?;
    for row in &table.rows {
        csv_writer.write_record(row.iter().map(csv_field))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(table, file)?;
    tracing::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
