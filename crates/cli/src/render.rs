//! Plain-text rendering of store state.

use std::io::{self, Write};

use sweet_shop_core::{SessionIdentity, Sweet};

const HEADERS: [&str; 5] = ["ID", "NAME", "CATEGORY", "PRICE", "STOCK"];

fn stock_label(sweet: &Sweet) -> String {
    if sweet.is_out_of_stock() {
        "Out of stock".to_owned()
    } else {
        sweet.quantity.to_string()
    }
}

/// Catalog as an aligned table, in the order given.
pub fn sweets(out: &mut impl Write, sweets: &[Sweet]) -> io::Result<()> {
    if sweets.is_empty() {
        return writeln!(out, "No sweets found.");
    }

    let rows: Vec<[String; 5]> = sweets
        .iter()
        .map(|sweet| {
            [
                sweet.id.to_string(),
                sweet.name.clone(),
                sweet.category.clone(),
                sweet.price.display(),
                stock_label(sweet),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(out, &HEADERS.map(str::to_owned), &widths)?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row(out: &mut impl Write, cells: &[String; 5], widths: &[usize; 5]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}

/// One record with its description.
pub fn sweet(out: &mut impl Write, sweet: &Sweet) -> io::Result<()> {
    writeln!(out, "#{} {}", sweet.id, sweet.name)?;
    writeln!(out, "  Category: {}", sweet.category)?;
    writeln!(out, "  Price:    {}", sweet.price.display())?;
    writeln!(out, "  Stock:    {}", stock_label(sweet))?;
    if !sweet.description.is_empty() {
        writeln!(out, "  {}", sweet.description)?;
    }
    Ok(())
}

/// Who is signed in.
pub fn identity(out: &mut impl Write, identity: Option<&SessionIdentity>) -> io::Result<()> {
    match identity {
        Some(identity) => {
            write!(out, "Signed in as {} ({})", identity.username, identity.role)?;
            match &identity.email {
                Some(email) => writeln!(out, " <{email}>"),
                None => writeln!(out),
            }
        }
        None => writeln!(out, "Not signed in."),
    }
}
