//! 公司行动落盘
//!
//! - json：`{symbol}_corporate_actions.json`，顶层键即有数据的类型
//! - csv：每个类型一个 `{symbol}_{kind}.csv`

use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;

use crate::error::{ConfigError, PersistError};
use crate::models::{ActionKind, ActionsBundle};

use super::common::LOG_TARGET;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistFormat {
    /// 单个 JSON 文件包含全部类型
    Json,
    /// 每个类型一个 CSV 文件
    Csv,
}

impl PersistFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistFormat::Json => "json",
            PersistFormat::Csv => "csv",
        }
    }
}

impl FromStr for PersistFormat {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(PersistFormat::Json),
            "csv" => Ok(PersistFormat::Csv),
            _ => Err(PersistError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 写入固定输出目录
#[derive(Debug, Clone)]
pub struct Persister {
    output_dir: PathBuf,
}

impl Persister {
    /// 创建输出目录（幂等）
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Result<Self, ConfigError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| ConfigError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 合并文件路径
    pub fn combined_path(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{}_corporate_actions.json", symbol))
    }

    /// 单类型 CSV 路径
    pub fn kind_path(&self, symbol: &str, kind: ActionKind) -> PathBuf {
        self.output_dir.join(format!("{}_{}.csv", symbol, kind))
    }

    /// 写入结果，返回写入的文件列表
    pub fn persist(
        &self,
        bundle: &ActionsBundle,
        symbol: &str,
        format: PersistFormat,
    ) -> Result<Vec<PathBuf>, PersistError> {
        if bundle.is_empty() {
            return Err(PersistError::EmptyBundle(symbol.to_string()));
        }

        let files = match format {
            PersistFormat::Json => vec![self.write_json(bundle, symbol)?],
            PersistFormat::Csv => self.write_csv(bundle, symbol)?,
        };

        log::info!(
            target: LOG_TARGET,
            "{} 公司行动数据已保存（{}）: {:?}",
            symbol,
            format.as_str(),
            files
        );
        Ok(files)
    }

    /// 读取合并 JSON 文件
    pub fn load(&self, symbol: &str) -> Result<ActionsBundle, PersistError> {
        let path = self.combined_path(symbol);
        let file = File::open(&path).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PersistError::from_json(&path, e))
    }

    fn write_json(&self, bundle: &ActionsBundle, symbol: &str) -> Result<PathBuf, PersistError> {
        let path = self.combined_path(symbol);
        self.replace(&path, |writer| encode_json(writer, bundle, &path))?;
        Ok(path)
    }

    fn write_csv(&self, bundle: &ActionsBundle, symbol: &str) -> Result<Vec<PathBuf>, PersistError> {
        let mut files = Vec::new();

        if let Some(rows) = bundle.dividends() {
            files.push(self.write_rows(symbol, ActionKind::Dividends, rows)?);
        }
        if let Some(rows) = bundle.splits() {
            files.push(self.write_rows(symbol, ActionKind::Splits, rows)?);
        }
        if let Some(rows) = bundle.rights() {
            files.push(self.write_rows(symbol, ActionKind::Rights, rows)?);
        }
        if let Some(rows) = bundle.bonus() {
            files.push(self.write_rows(symbol, ActionKind::Bonus, rows)?);
        }

        Ok(files)
    }

    fn write_rows<T: Serialize>(
        &self,
        symbol: &str,
        kind: ActionKind,
        rows: &[T],
    ) -> Result<PathBuf, PersistError> {
        let path = self.kind_path(symbol, kind);
        self.replace(&path, |writer| encode_rows(writer, rows, &path))?;
        Ok(path)
    }

    /// 先写入输出目录下的临时文件，成功后再原子替换目标文件
    ///
    /// 写入失败时临时文件被删除，已有的目标文件保持不变
    fn replace<F>(&self, path: &Path, write: F) -> Result<(), PersistError>
    where
        F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<(), PersistError>,
    {
        let io_error = |source: io::Error| PersistError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.output_dir).map_err(io_error)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            write(&mut writer)?;
            writer.flush().map_err(io_error)?;
        }
        tmp.persist(path).map_err(|e| io_error(e.error))?;
        Ok(())
    }
}

fn encode_json<W: Write>(writer: W, bundle: &ActionsBundle, path: &Path) -> Result<(), PersistError> {
    serde_json::to_writer_pretty(writer, bundle).map_err(|e| PersistError::from_json(path, e))
}

fn encode_rows<W: Write, T: Serialize>(writer: W, rows: &[T], path: &Path) -> Result<(), PersistError> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row).map_err(|e| PersistError::from_csv(path, e))?;
    }
    writer.flush().map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}
