use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "jobpilot")]
#[command(about = "Search job listings, keep them in a local database and draft cover letters")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch listings for each title and store them
    Search {
        /// Job titles, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        titles: Vec<String>,

        /// Location to search in (defaults to the configured location)
        #[arg(long)]
        location: Option<String>,
    },
    /// Print every stored listing
    List,
    /// Print the number of stored listings
    Count,
    /// Export stored listings to CSV
    Export {
        #[arg(long, default_value = "./Data/saved_jobs.csv")]
        out: PathBuf,
    },
    /// Draft a cover letter for a stored listing
    Draft {
        /// Position of the listing as shown by `list` (starting at 1)
        #[arg(long)]
        index: usize,

        /// Plain-text resume
        #[arg(long)]
        resume: PathBuf,

        /// Use the language model instead of the built-in template
        #[arg(long)]
        llm: bool,

        /// Write the letter to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl CliConfig {
    /// 讀取設定檔與環境變數，再套用命令列覆蓋
    pub fn app_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(database) = &self.database {
            config.storage.database_path = database.clone();
        }
        Ok(config)
    }
}

/// 把 "Data Scientist, ML Engineer" 這類輸入拆成乾淨的搜尋詞
pub fn clean_titles(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .collect()
}
