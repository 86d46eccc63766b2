use crate::config::CompanyConfig;
use crate::model::{Company, Correlation, Headline, NewCorrelation, NewsItem, PriceSample, StorageError};
use crate::utils::{format_timestamp, parse_datetime};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS companies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        ticker TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS price_samples (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(id),
        price REAL NOT NULL CHECK (price > 0),
        time TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_price_samples_company_time
        ON price_samples (company_id, time);

    CREATE TABLE IF NOT EXISTS news_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(id),
        text TEXT NOT NULL,
        time TEXT NOT NULL,
        UNIQUE (company_id, text, time)
    );
    CREATE INDEX IF NOT EXISTS idx_news_items_company_time
        ON news_items (company_id, time);

    CREATE TABLE IF NOT EXISTS correlations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(id),
        news_id INTEGER NOT NULL REFERENCES news_items(id),
        price_sample_id INTEGER NOT NULL REFERENCES price_samples(id),
        correlation_index REAL NOT NULL,
        recorded_time TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_correlations_link
        ON correlations (company_id, news_id, price_sample_id);
";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database file and creates any missing tables.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Registers companies, ignoring tickers that already exist. Returns the number inserted.
    pub fn seed_companies(&self, companies: &[CompanyConfig]) -> Result<usize, StorageError> {
        let mut stmt = self
            .conn
            .prepare("INSERT OR IGNORE INTO companies (name, ticker) VALUES (?1, ?2)")?;

        let mut inserted = 0;
        for company in companies {
            inserted += stmt.execute(params![company.name.trim(), company.ticker.trim()])?;
        }
        Ok(inserted)
    }

    pub fn get_companies(&self) -> Result<Vec<Company>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, ticker FROM companies ORDER BY id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok(Company {
                id: row.get(0)?,
                name: row.get(1)?,
                ticker: row.get(2)?,
            })
        })?;

        let mut companies = Vec::new();
        for company in rows {
            companies.push(company?);
        }
        Ok(companies)
    }

    /// Appends one price sample. No dedup: every call is a new row.
    pub fn insert_price(
        &self,
        company_id: i64,
        price: f64,
        time: DateTime<Utc>,
    ) -> Result<PriceSample, StorageError> {
        self.conn.execute(
            "INSERT INTO price_samples (company_id, price, time) VALUES (?1, ?2, ?3)",
            params![company_id, price, format_timestamp(&time)],
        )?;

        Ok(PriceSample {
            id: self.conn.last_insert_rowid(),
            company_id,
            price,
            time,
        })
    }

    /// Inserts the headlines of one company in a single transaction, skipping any
    /// (company, text, time) already stored. Returns the number of new rows.
    pub fn insert_headlines(
        &mut self,
        company_id: i64,
        headlines: &[Headline],
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO news_items (company_id, text, time) VALUES (?1, ?2, ?3)",
            )?;
            for headline in headlines {
                inserted +=
                    stmt.execute(params![company_id, headline.text, format_timestamp(&headline.time)])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Price samples strictly newer than `since`, oldest first.
    pub fn get_prices_since(
        &self,
        company_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, price, time FROM price_samples
             WHERE company_id = ?1 AND time > ?2 ORDER BY time ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![company_id, format_timestamp(&since)], Self::map_price)?;
        let mut prices = Vec::new();
        for price in rows {
            prices.push(price?);
        }
        Ok(prices)
    }

    /// News items strictly newer than `since`, oldest first.
    pub fn get_news_since(
        &self,
        company_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<NewsItem>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, text, time FROM news_items
             WHERE company_id = ?1 AND time > ?2 ORDER BY time ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![company_id, format_timestamp(&since)], Self::map_news)?;
        let mut news = Vec::new();
        for item in rows {
            news.push(item?);
        }
        Ok(news)
    }

    /// Stores a company's correlation batch atomically. With `deduplicate`, links whose
    /// (company, news, price sample) is already stored are skipped. On error nothing
    /// from the batch is kept.
    pub fn insert_correlations(
        &mut self,
        company_id: i64,
        correlations: &[NewCorrelation],
        recorded_time: DateTime<Utc>,
        deduplicate: bool,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let recorded_time = format_timestamp(&recorded_time);
        let mut inserted = 0;
        {
            let mut exists = tx.prepare(
                "SELECT 1 FROM correlations
                 WHERE company_id = ?1 AND news_id = ?2 AND price_sample_id = ?3 LIMIT 1",
            )?;
            let mut insert = tx.prepare(
                "INSERT INTO correlations
                    (company_id, news_id, price_sample_id, correlation_index, recorded_time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for corr in correlations {
                if deduplicate && exists.exists(params![company_id, corr.news_id, corr.price_sample_id])? {
                    continue;
                }
                inserted += insert.execute(params![
                    company_id,
                    corr.news_id,
                    corr.price_sample_id,
                    corr.correlation_index,
                    recorded_time,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn get_correlations(&self, company_id: i64) -> Result<Vec<Correlation>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, news_id, price_sample_id, correlation_index, recorded_time
             FROM correlations WHERE company_id = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![company_id], |row| {
            Ok(Correlation {
                id: row.get(0)?,
                company_id: row.get(1)?,
                news_id: row.get(2)?,
                price_sample_id: row.get(3)?,
                correlation_index: row.get(4)?,
                recorded_time: Self::parse_time(row, 5, "recorded_time")?,
            })
        })?;

        let mut correlations = Vec::new();
        for corr in rows {
            correlations.push(corr?);
        }
        Ok(correlations)
    }

    fn map_price(row: &Row) -> Result<PriceSample, rusqlite::Error> {
        Ok(PriceSample {
            id: row.get(0)?,
            company_id: row.get(1)?,
            price: row.get(2)?,
            time: Self::parse_time(row, 3, "time")?,
        })
    }

    fn map_news(row: &Row) -> Result<NewsItem, rusqlite::Error> {
        Ok(NewsItem {
            id: row.get(0)?,
            company_id: row.get(1)?,
            text: row.get(2)?,
            time: Self::parse_time(row, 3, "time")?,
        })
    }

    fn parse_time(row: &Row, idx: usize, column: &'static str) -> Result<DateTime<Utc>, rusqlite::Error> {
        let value: String = row.get(idx)?;
        parse_datetime(&value).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(StorageError::InvalidTimestamp { column, value }),
            )
        })
    }
}
