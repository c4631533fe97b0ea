use crate::cli::Context;
use crate::error::Result;
use crate::fmt::{decimal, number};
use crate::settings::settings_path;

pub fn run(ctx: &Context) -> Result<()> {
    let path = settings_path();
    println!(
        "Settings:     {}{}",
        path.display(),
        if path.exists() { "" } else { " (not found, using defaults)" }
    );
    println!("Data file:    {}", ctx.data_file.display());
    println!("Step:         {}", ctx.settings.discount_step);

    if !ctx.data_file.exists() {
        println!();
        println!("Dataset not found. Place the CSV in the working directory or pass --file.");
        return Ok(());
    }

    let size = std::fs::metadata(&ctx.data_file)?.len();
    let dataset = ctx.dataset()?;
    let (lo, hi) = dataset.discount_bounds();

    println!("File size:    {} bytes", number(size as usize));
    println!();
    println!("Rows:         {}", number(dataset.rows.len()));
    println!("Columns:      {}", dataset.columns.join(", "));
    println!("Categories:   {}", dataset.categories.join(", "));
    println!("Regions:      {}", dataset.regions.join(", "));
    println!("Discount:     {} to {}", decimal(lo, 2), decimal(hi, 2));
    if dataset.has_order_date {
        println!("Bad dates:    {}", number(dataset.date_parse_warnings));
    }

    Ok(())
}
