use crate::domain::model::CanonicalListing;
use crate::domain::ports::ListingStore;
use crate::utils::error::{JobPilotError, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;

const CREATE_JOBS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        job_title TEXT NOT NULL,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        location TEXT NOT NULL,
        created TEXT,
        description TEXT NOT NULL,
        salary_min REAL,
        salary_max REAL,
        contract_type TEXT,
        contract_time TEXT,
        apply_link TEXT NOT NULL
    )";

const INSERT_JOB: &str = "
    INSERT INTO jobs (
        job_title, title, company, location, created, description,
        salary_min, salary_max, contract_type, contract_time, apply_link
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

const SELECT_JOBS: &str = "
    SELECT job_title, title, company, location, created, description,
           salary_min, salary_max, contract_type, contract_time, apply_link
    FROM jobs
    ORDER BY id";

/// SQLite 職缺儲存。連線以互斥鎖保護，同時只有一個寫入者
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// 開啟 (必要時建立) 資料庫並確保資料表存在
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                JobPilotError::storage_unavailable(format!(
                    "cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            JobPilotError::storage_unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;

        tracing::debug!("Opened job database at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| JobPilotError::storage_unavailable(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }
}

impl ListingStore for SqliteStore {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(CREATE_JOBS_TABLE, [])
            .map_err(|e| JobPilotError::storage_unavailable(format!("cannot create jobs table: {}", e)))?;
        Ok(())
    }

    fn append(&self, records: &[CanonicalListing]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        // transaction 在 drop 時自動回滾，失敗的批次不會留下任何資料
        let tx = conn
            .transaction()
            .map_err(|e| JobPilotError::persistence(format!("cannot start transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(INSERT_JOB)
                .map_err(|e| JobPilotError::persistence(e.to_string()))?;

            for (index, record) in records.iter().enumerate() {
                stmt.execute(params![
                    record.job_title,
                    record.title,
                    record.company,
                    record.location,
                    record.posted_at,
                    record.description,
                    record.salary_min,
                    record.salary_max,
                    record.contract_type,
                    record.contract_time,
                    record.apply_link,
                ])
                .map_err(|e| {
                    JobPilotError::persistence(format!(
                        "record {} of {} rejected: {}",
                        index + 1,
                        records.len(),
                        e
                    ))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| JobPilotError::persistence(format!("commit failed: {}", e)))?;

        tracing::debug!("Appended {} listings", records.len());
        Ok(records.len())
    }

    fn all(&self) -> Result<Vec<CanonicalListing>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(SELECT_JOBS)?;

        let rows = stmt.query_map([], |row| {
            Ok(CanonicalListing {
                job_title: row.get(0)?,
                title: row.get(1)?,
                company: row.get(2)?,
                location: row.get(3)?,
                posted_at: row.get(4)?,
                description: row.get(5)?,
                salary_min: row.get(6)?,
                salary_max: row.get(7)?,
                contract_type: row.get(8)?,
                contract_time: row.get(9)?,
                apply_link: row.get(10)?,
            })
        })?;

        let listings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(listings)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
