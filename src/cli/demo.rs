use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{ReportError, Result};

const VENDORS: &[&str] = &[
    "Apex Office Supply",
    "Brightline IT Services",
    "Cascade Logistics",
    "Delta Facilities Co",
    "Evergreen Travel",
    "Fulcrum Hardware",
];

/// `None` models transactions that were never categorized upstream.
const CATEGORIES: &[(Option<&str>, f64)] = &[
    (Some("Office"), 18.0),
    (Some("IT"), 240.0),
    (Some("Logistics"), 95.0),
    (Some("Facilities"), 130.0),
    (Some("Travel"), 310.0),
    (None, 45.0),
];

const CITIES: &[&str] = &["Austin", "Chicago", "Denver", "Seattle"];

/// Months of sample history, starting January 2023. The last year is
/// deliberately partial so month selection has something to reject.
const MONTHS: u32 = 21;
const TXNS_PER_MONTH: u32 = 12;

struct DemoTxn {
    date: NaiveDate,
    vendor_id: i64,
    category: Option<&'static str>,
    city: &'static str,
    quantity: f64,
    net_amount: f64,
    discount_amount: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate_transactions() -> Vec<DemoTxn> {
    let mut txns = Vec::new();
    for i in 0..MONTHS {
        let year = 2023 + (i / 12) as i32;
        let month = i % 12 + 1;
        for t in 0..TXNS_PER_MONTH {
            let day = 1 + (t * 7 + i * 3) % 28;
            let (category, unit_price) = CATEGORIES[((t * 5 + i) as usize) % CATEGORIES.len()];
            let quantity = (1 + (t * 3 + i) % 20) as f64;
            let gross = quantity * unit_price;
            // 0%, 2.5%, 5% or 7.5% off, rotating.
            let rate = ((t + i) % 4) as f64 * 0.025;
            let discount = round2(gross * rate);
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            txns.push(DemoTxn {
                date,
                vendor_id: ((t + i) as usize % VENDORS.len()) as i64 + 1,
                category,
                city: CITIES[((t + 2 * i) as usize) % CITIES.len()],
                quantity,
                net_amount: round2(gross - discount),
                discount_amount: discount,
            });
        }
    }
    txns
}

/// Load vendors and transactions into an initialized, empty warehouse.
pub fn insert_demo_data(conn: &mut Connection) -> Result<usize> {
    let txns = generate_transactions();
    let tx = conn.transaction()?;
    for (i, name) in VENDORS.iter().enumerate() {
        tx.execute(
            "INSERT INTO DIM_VENDOR (vendor_id, vendor_name) VALUES (?1, ?2)",
            rusqlite::params![i as i64 + 1, name],
        )?;
    }
    for t in &txns {
        tx.execute(
            "INSERT INTO FACT_PROCUREMENT_SPEND \
             (transaction_date, vendor_id, category, city, quantity, net_amount, discount_amount) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                t.date.format("%Y-%m-%d").to_string(),
                t.vendor_id,
                t.category,
                t.city,
                t.quantity,
                t.net_amount,
                t.discount_amount,
            ],
        )?;
    }
    tx.commit()?;
    Ok(txns.len())
}

pub fn run(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = get_connection(path)?;
    init_db(&conn)?;

    let existing: i64 =
        conn.query_row("SELECT count(*) FROM FACT_PROCUREMENT_SPEND", [], |r| r.get(0))?;
    if existing > 0 {
        return Err(ReportError::Settings(format!(
            "{} already holds {existing} transactions; refusing to add demo data",
            path.display()
        )));
    }

    let count = insert_demo_data(&mut conn)?;
    println!("Demo warehouse created at {}", path.display());
    println!("  Vendors:      {}", VENDORS.len());
    println!("  Transactions: {count}");
    println!();
    println!("Try these next:");
    println!("  procure --db {} years", path.display());
    println!("  procure --db {} run category-spend --year 2024 --month Mar", path.display());
    println!("  procure --db {} dashboard --view history", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_generate_transactions_count() {
        assert_eq!(generate_transactions().len(), (MONTHS * TXNS_PER_MONTH) as usize);
    }

    #[test]
    fn test_generate_transactions_span() {
        let txns = generate_transactions();
        let min = txns.iter().map(|t| t.date).min().unwrap();
        let max = txns.iter().map(|t| t.date).max().unwrap();
        assert_eq!((min.year(), min.month()), (2023, 1));
        assert_eq!((max.year(), max.month()), (2024, 9));
    }

    #[test]
    fn test_amounts_respect_fact_constraints() {
        for t in generate_transactions() {
            assert!(t.quantity >= 1.0);
            assert!(t.discount_amount >= 0.0);
            assert!(t.net_amount > 0.0);
        }
    }

    #[test]
    fn test_some_transactions_are_uncategorized() {
        assert!(generate_transactions().iter().any(|t| t.category.is_none()));
    }

    #[test]
    fn test_demo_creates_data() {
        let (_dir, mut conn) = test_db();
        let count = insert_demo_data(&mut conn).unwrap();
        let vendors: i64 = conn.query_row("SELECT count(*) FROM DIM_VENDOR", [], |r| r.get(0)).unwrap();
        let facts: i64 = conn
            .query_row("SELECT count(*) FROM FACT_PROCUREMENT_SPEND", [], |r| r.get(0))
            .unwrap();
        assert_eq!(vendors, VENDORS.len() as i64);
        assert_eq!(facts, count as i64);
    }

    #[test]
    fn test_run_refuses_non_empty_warehouse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.db");
        run(&path).unwrap();
        assert!(matches!(run(&path), Err(ReportError::Settings(_))));
    }
}
