use anyhow::{bail, Result};
use std::env;
use std::fs;

use finanzas_tt::{
    export_expenses, export_incomes, format_timestamp, LedgerRepository, SqliteLedger,
};

fn db_path() -> String {
    env::var("FINANZAS_DB").unwrap_or_else(|_| "finanzas.db".to_string())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(),
        Some("list") => run_list(args.get(2).map(String::as_str)),
        Some("summary") => run_summary(),
        Some("export") => run_export(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Finanzas TT - ledger CLI");
    println!();
    println!("Usage:");
    println!("  finanzas-tt init");
    println!("  finanzas-tt list incomes|expenses");
    println!("  finanzas-tt summary");
    println!("  finanzas-tt export incomes|expenses <path> [COL=NEEDLE ...]");
    println!();
    println!("Database path comes from FINANZAS_DB (default: finanzas.db).");
}

fn run_init() -> Result<()> {
    let path = db_path();
    SqliteLedger::open(&path)?;
    println!("✓ Database initialized with WAL mode: {path}");
    Ok(())
}

fn run_list(table: Option<&str>) -> Result<()> {
    let db = SqliteLedger::open(db_path())?;

    match table {
        Some("incomes") => {
            let records = db.list_incomes()?;
            for r in &records {
                println!(
                    "{}  {:>15}  {:<8} {:<18} {:<18} {} / {}",
                    format_timestamp(&r.date),
                    r.amount.format(),
                    r.semester,
                    r.account,
                    r.method,
                    r.line,
                    r.user,
                );
            }
            println!("✓ {} incomes", records.len());
        }
        Some("expenses") => {
            let records = db.list_expenses()?;
            for r in &records {
                println!(
                    "{}  {:>15}  {:>15}  {:<18} {:<16} {}",
                    format_timestamp(&r.date),
                    r.amount.format(),
                    r.real_amount.format(),
                    r.account,
                    r.category,
                    r.reason,
                );
            }
            println!("✓ {} expenses", records.len());
        }
        _ => bail!("expected: list incomes|expenses"),
    }

    Ok(())
}

fn run_summary() -> Result<()> {
    let db = SqliteLedger::open(db_path())?;

    println!("Incomes by semester:");
    for row in db.income_summary()? {
        println!(
            "  {:<8} {:>4} records  {:>18}",
            row.semester,
            row.count,
            row.total.format()
        );
    }

    println!();
    println!("Expenses by category:");
    for row in db.expense_summary()? {
        println!(
            "  {:<18} {:>4} records  {:>18}  (real {:>18})",
            row.category,
            row.count,
            row.total.format(),
            row.total_real.format()
        );
    }

    Ok(())
}

fn run_export(args: &[String]) -> Result<()> {
    let (table, path) = match (args.first(), args.get(1)) {
        (Some(table), Some(path)) => (table.as_str(), path.as_str()),
        _ => bail!("expected: export incomes|expenses <path> [COL=NEEDLE ...]"),
    };

    let filters = parse_filters(&args[2..])?;
    let db = SqliteLedger::open(db_path())?;

    let csv = match table {
        "incomes" => export_incomes(&db.list_incomes()?, &filters)?,
        "expenses" => export_expenses(&db.list_expenses()?, &filters)?,
        other => bail!("unknown table: {other}"),
    };

    fs::write(path, &csv)?;
    println!("✓ Exported {} rows to {path}", csv.lines().count() - 1);

    Ok(())
}

/// Parse `COL=NEEDLE` pairs into (column index, needle) filters.
fn parse_filters(args: &[String]) -> Result<Vec<(usize, String)>> {
    let mut filters = Vec::new();

    for arg in args {
        let Some((col, needle)) = arg.split_once('=') else {
            bail!("malformed filter (expected COL=NEEDLE): {arg}");
        };
        let col: usize = col
            .parse()
            .map_err(|_| anyhow::anyhow!("filter column must be a number: {arg}"))?;
        filters.push((col, needle.to_string()));
    }

    Ok(filters)
}
