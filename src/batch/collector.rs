//! # 文件收集器
//!
//! 根据输入路径和 glob 模式收集待处理文件，结果按路径排序。
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob::Pattern` 匹配文件名

use crate::error::{GpawFlowError, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    input: PathBuf,
    /// 逗号分隔的多个模式，任一匹配即可
    patterns: Vec<String>,
    recursive: bool,
}

impl FileCollector {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: vec!["*".to_string()],
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.patterns.is_empty() {
            self.patterns = vec!["*".to_string()];
        }
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn is_directory(&self) -> bool {
        self.input.is_dir()
    }

    /// 收集所有匹配的文件；单文件输入直接返回自身
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }

        if !self.input.is_dir() {
            return Err(GpawFlowError::FileNotFound {
                path: self.input.display().to_string(),
            });
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    GpawFlowError::InvalidArgument(format!("Invalid pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| matches_any(&patterns, entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();

        Ok(files)
    }
}

fn matches_any(patterns: &[Pattern], path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => patterns.iter().any(|p| p.matches(name)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_band_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Si");
        fs::create_dir(&nested).unwrap();
        for name in ["graphene-3-Result-Band.dat", "graphene-2-Result-DOS.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::write(nested.join("Si-3-Result-Band.dat"), "").unwrap();

        let flat = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*-3-Result-Band.dat")
            .collect()
            .unwrap();
        assert_eq!(flat.len(), 1);

        let deep = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*-3-Result-Band.dat")
            .recursive(true)
            .collect()
            .unwrap();
        assert_eq!(deep.len(), 2);

        let both = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.dat, *.txt")
            .collect()
            .unwrap();
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_single_file_and_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bands.dat");
        fs::write(&file, "").unwrap();

        let collector = FileCollector::new(file.clone()).with_pattern("*.xyz");
        assert!(!collector.is_directory());
        assert_eq!(collector.collect().unwrap(), vec![file]);

        assert!(FileCollector::new(dir.path().join("nope")).collect().is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("[")
            .collect()
            .unwrap_err();
        assert!(matches!(err, GpawFlowError::InvalidArgument(_)));
    }
}
