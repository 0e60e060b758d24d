use crate::domain::model::CanonicalListing;
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

// CSV 欄位沿用資料表的 snake_case 命名
#[derive(Serialize)]
struct CsvRow<'a> {
    job_title: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    created: Option<&'a str>,
    description: &'a str,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    contract_type: Option<&'a str>,
    contract_time: Option<&'a str>,
    apply_link: &'a str,
}

impl<'a> From<&'a CanonicalListing> for CsvRow<'a> {
    fn from(listing: &'a CanonicalListing) -> Self {
        Self {
            job_title: &listing.job_title,
            title: &listing.title,
            company: &listing.company,
            location: &listing.location,
            created: listing.posted_at.as_deref(),
            description: &listing.description,
            salary_min: listing.salary_min,
            salary_max: listing.salary_max,
            contract_type: listing.contract_type.as_deref(),
            contract_time: listing.contract_time.as_deref(),
            apply_link: &listing.apply_link,
        }
    }
}

pub const CSV_HEADER: &[&str] = &[
    "job_title",
    "title",
    "company",
    "location",
    "created",
    "description",
    "salary_min",
    "salary_max",
    "contract_type",
    "contract_time",
    "apply_link",
];

/// 寫出標題列加每筆職缺一列，回傳寫出的筆數
pub fn export_csv<W: Write>(listings: &[CanonicalListing], writer: W) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // 沒有資料時 serde 不會產生標題列，所以自己寫
    csv_writer.write_record(CSV_HEADER)?;
    for listing in listings {
        csv_writer.serialize(CsvRow::from(listing))?;
    }
    csv_writer.flush()?;

    Ok(listings.len())
}

pub fn export_csv_file<P: AsRef<Path>>(listings: &[CanonicalListing], path: P) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let written = export_csv(listings, std::io::BufWriter::new(file))?;
    tracing::info!("✅ Exported {} listings to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing() -> CanonicalListing {
        CanonicalListing {
            job_title: "Data Scientist".to_string(),
            title: "Data Scientist, Risk".to_string(),
            company: "Acme".to_string(),
            location: "London".to_string(),
            posted_at: None,
            description: "Line one\nline \"two\"".to_string(),
            salary_min: Some(45000.0),
            salary_max: None,
            contract_type: Some("permanent".to_string()),
            contract_time: None,
            apply_link: "https://example.com/1".to_string(),
        }
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let mut buffer = Vec::new();
        let written = export_csv(&[listing()], &mut buffer).unwrap();
        assert_eq!(written, 1);

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, CSV_HEADER);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Data Scientist, Risk");
        assert_eq!(&rows[0][4], "");
        assert_eq!(&rows[0][5], "Line one\nline \"two\"");
        assert_eq!(&rows[0][6], "45000.0");
        assert_eq!(&rows[0][7], "");
    }

    #[test]
    fn test_export_empty_still_has_header() {
        let mut buffer = Vec::new();
        assert_eq!(export_csv(&[], &mut buffer).unwrap(), 0);

        let content = String::from_utf8(buffer).unwrap();
        assert_eq!(content.trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn test_export_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Data").join("saved_jobs.csv");

        export_csv_file(&[listing(), listing()], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("job_title,title,company"));
    }
}
