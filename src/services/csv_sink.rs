//! CSV 写入服务 - 业务能力层
//!
//! 每次运行一个 CSV 文件，表头只写一次，每行写入后立即落盘

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::models::row::{ExtractionRow, TRAILING_COLUMNS};

/// CSV 写入器
///
/// 职责：
/// - 按运行 ID 创建 `<export_dir>/<run_id>.csv`
/// - 表头只写一次（文件已存在则跳过）
/// - 每行单独打开、追加、flush、sync，不跨条目缓冲
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// 为运行创建写入器，必要时创建输出目录
    pub fn open_for(export_dir: impl AsRef<Path>, run_id: &Uuid) -> io::Result<Self> {
        let dir = export_dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{}.csv", run_id)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// 写入表头：字段名 + source_url / timestamp / error
    ///
    /// 文件已存在时不做任何事
    pub fn write_header_once(&self, field_names: &[String]) -> io::Result<()> {
        if self.exists() {
            debug!("CSV 已存在，跳过表头: {}", self.path.display());
            return Ok(());
        }

        let mut header: Vec<String> = field_names.to_vec();
        header.extend(TRAILING_COLUMNS.iter().map(|c| c.to_string()));

        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&self.path)?;
        file.write_all(encode_line(&header).as_bytes())?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    /// 追加一行，字段按 `field_names` 顺序排列，空值写为空单元格
    pub fn append_row(&self, field_names: &[String], row: &ExtractionRow) -> io::Result<()> {
        let mut cells: Vec<String> = field_names
            .iter()
            .map(|name| row.value(name).unwrap_or_default().to_string())
            .collect();
        cells.push(row.source_url.clone());
        cells.push(row.captured_at.timestamp().to_string());
        cells.push(row.error.clone().unwrap_or_default());

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(encode_line(&cells).as_bytes())?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// 编码一行 CSV（含结尾换行）
pub fn encode_line(cells: &[String]) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        if needs_quotes(cell) {
            line.push('"');
            line.push_str(&cell.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(cell);
        }
    }
    line.push_str("\r\n");
    line
}
