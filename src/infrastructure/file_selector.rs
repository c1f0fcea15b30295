//! 输入文件选择 - 基础设施层
//!
//! 扫描文件夹、按自然顺序排序、检测重名文件

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, FileError};

/// 可处理的扩展名（不区分大小写）
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "webp"];

/// 文件夹检查结果
#[derive(Debug, Clone)]
pub struct FolderReport {
    /// 按自然顺序排列的绝对路径
    pub files: Vec<PathBuf>,
    /// (先出现的文件, 重名文件)
    pub duplicates: Vec<(PathBuf, PathBuf)>,
}

impl FolderReport {
    /// 重名警告（没有重名时为 None）
    pub fn warning(&self) -> Option<String> {
        if self.duplicates.is_empty() {
            return None;
        }

        let lines: Vec<String> = self
            .duplicates
            .iter()
            .map(|(first, later)| format!("  - '{}' 和 '{}'", file_name(first), file_name(later)))
            .collect();
        Some(format!("检测到重名文件:\n{}", lines.join("\n")))
    }
}

/// 扩展名是否可处理
pub fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// 扫描文件夹中所有可处理的文件
///
/// 只包含普通文件（跟随符号链接），按文件名（小写）自然排序，返回绝对路径
pub async fn find_valid_files(folder: &Path) -> AppResult<Vec<PathBuf>> {
    let metadata = fs::metadata(folder).await.map_err(|_| {
        AppError::File(FileError::DirectoryNotFound {
            path: folder.display().to_string(),
        })
    })?;
    if !metadata.is_dir() {
        return Err(FileError::NotADirectory {
            path: folder.display().to_string(),
        }
        .into());
    }

    // 只规范化文件夹本身，符号链接保留自己的文件名
    let folder_abs = fs::canonicalize(folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder.display().to_string(), e))?;

    let mut files = Vec::new();
    let mut entries = fs::read_dir(&folder_abs)
        .await
        .map_err(|e| AppError::file_read_failed(folder.display().to_string(), e))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        // 跟随符号链接；失效的链接直接跳过
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => continue,
        }
        if !is_accepted(&path) {
            debug!("跳过不支持的文件: {}", path.display());
            continue;
        }
        files.push(path);
    }

    files.sort_by(|a, b| natural_cmp(&file_name(a).to_lowercase(), &file_name(b).to_lowercase()));
    Ok(files)
}

/// 检测重名文件（不区分大小写）
pub fn detect_duplicates(paths: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    let mut duplicates = Vec::new();

    for path in paths {
        let name = file_name(path).to_lowercase();
        match seen.entry(name) {
            Entry::Occupied(first) => duplicates.push(((*first.get()).clone(), path.clone())),
            Entry::Vacant(slot) => {
                slot.insert(path);
            }
        }
    }

    duplicates
}

/// 检查文件夹：至少要有一个可处理的文件，重名只作为警告
pub async fn validate_folder(folder: &Path) -> AppResult<FolderReport> {
    let files = find_valid_files(folder).await?;
    if files.is_empty() {
        return Err(FileError::NoValidFiles {
            path: folder.display().to_string(),
        }
        .into());
    }

    let duplicates = detect_duplicates(&files);
    let report = FolderReport { files, duplicates };
    if let Some(warning) = report.warning() {
        warn!("⚠️ {}", warning);
    }
    Ok(report)
}

/// 自然顺序比较："page2" 排在 "page10" 之前
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);

    for (x, y) in left.iter().zip(right.iter()) {
        let ordering = compare_chunk(x, y);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

/// 切分为数字段和非数字段
fn chunks(s: &str) -> Vec<&str> {
    static CHUNK: OnceLock<Option<Regex>> = OnceLock::new();
    match CHUNK.get_or_init(|| Regex::new(r"[0-9]+|[^0-9]+").ok()) {
        Some(re) => re.find_iter(s).map(|m| m.as_str()).collect(),
        None => vec![s],
    }
}

fn compare_chunk(x: &str, y: &str) -> Ordering {
    let x_digits = x.bytes().all(|b| b.is_ascii_digit());
    let y_digits = y.bytes().all(|b| b.is_ascii_digit());

    match (x_digits, y_digits) {
        (true, true) => {
            // 去掉前导零后先比较长度，避免大数字溢出
            let xt = x.trim_start_matches('0');
            let yt = y.trim_start_matches('0');
            xt.len()
                .cmp(&yt.len())
                .then_with(|| xt.cmp(yt))
                .then_with(|| x.len().cmp(&y.len()))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.cmp(y),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
