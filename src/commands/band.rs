//! # band 命令实现
//!
//! - `columns`: 单文件直接转换；目录输入时收集匹配文件并行批量转换
//! - `blocks`: 列格式还原为块格式
//!
//! ## 依赖关系
//! - 使用 `cli/band.rs` 定义的参数
//! - 使用 `parsers/band.rs`, `batch/`, `engine/files.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::band::{BandArgs, BandCommands, BlocksArgs, ColumnsArgs};
use crate::commands::write_text;
use crate::engine::files::columns_path_for;
use crate::error::{GpawFlowError, Result};
use crate::parsers::band;
use crate::utils::output;

use std::path::{Path, PathBuf};

/// 执行 band 命令
pub fn execute(args: BandArgs) -> Result<()> {
    match args.command {
        BandCommands::Columns(columns_args) => columns(columns_args),
        BandCommands::Blocks(blocks_args) => blocks(blocks_args),
    }
}

fn expected_shape(args: &ColumnsArgs) -> Option<(usize, usize)> {
    args.bands.zip(args.kpoints)
}

/// 转换单个块格式文件
fn convert_to_columns(
    input: &Path,
    output_path: &Path,
    expected: Option<(usize, usize)>,
) -> Result<(usize, usize)> {
    let bands = band::read_blocks_file(input, expected)?;
    write_text(output_path, &band::to_columns_string(&bands))?;
    Ok((bands.band_count(), bands.kpoint_count()))
}

fn columns(args: ColumnsArgs) -> Result<()> {
    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive);

    if !collector.is_directory() {
        if !args.input.exists() {
            return Err(GpawFlowError::FileNotFound {
                path: args.input.display().to_string(),
            });
        }
        let target = args
            .output
            .clone()
            .unwrap_or_else(|| columns_path_for(&args.input));
        if target.exists() && !args.overwrite {
            return Err(GpawFlowError::AlreadyExists {
                path: target.display().to_string(),
            });
        }

        let (b, k) = convert_to_columns(&args.input, &target, expected_shape(&args))?;
        output::print_conversion(&args.input, &target);
        output::print_kv("Bands x k-points", &format!("{} x {}", b, k));
        return Ok(());
    }

    if args.output.is_some() {
        return Err(GpawFlowError::InvalidArgument(
            "--output only applies to a single input file".to_string(),
        ));
    }

    let files = collector.collect()?;
    if files.is_empty() {
        return Err(GpawFlowError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_header("Band Block -> Column Reshape");
    output::print_info(&format!(
        "Found {} file(s), using {} job(s)",
        files.len(),
        runner.jobs()
    ));

    let expected = expected_shape(&args);
    let overwrite = args.overwrite;
    let result = runner.run(files, |file: &PathBuf| {
        let target = columns_path_for(file);
        if target.exists() && !overwrite {
            return ProcessResult::Skipped(target.display().to_string());
        }
        match convert_to_columns(file, &target, expected) {
            Ok(_) => ProcessResult::Success(target.display().to_string()),
            Err(e) => ProcessResult::Failed(file.display().to_string(), e.to_string()),
        }
    })?;

    for (path, err) in &result.failures {
        output::print_error(&format!("{}: {}", path, err));
    }
    output::print_separator();
    output::print_done(&format!(
        "{} converted, {} skipped, {} failed (of {})",
        result.success,
        result.skipped,
        result.failed,
        result.total()
    ));

    if result.failed > 0 {
        return Err(GpawFlowError::Other(format!(
            "{} of {} band files could not be reshaped",
            result.failed,
            result.total()
        )));
    }
    Ok(())
}

fn blocks(args: BlocksArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(GpawFlowError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let target = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("band");
        args.input.with_file_name(format!("{}-blocks.dat", stem))
    });
    if target.exists() && !args.overwrite {
        return Err(GpawFlowError::AlreadyExists {
            path: target.display().to_string(),
        });
    }

    let bands = band::read_columns_file(&args.input)?;
    write_text(&target, &band::to_blocks_string(&bands))?;
    output::print_conversion(&args.input, &target);
    output::print_kv(
        "Bands x k-points",
        &format!("{} x {}", bands.band_count(), bands.kpoint_count()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BLOCKS: &str = "0 1.0\n1 2.0\n2 3.0\n\n0 4.0\n1 5.0\n2 6.0\n\n";

    fn columns_args(input: PathBuf) -> ColumnsArgs {
        ColumnsArgs {
            input,
            output: None,
            pattern: "*-3-Result-Band.dat".to_string(),
            recursive: false,
            jobs: 2,
            bands: None,
            kpoints: None,
            overwrite: false,
        }
    }

    #[test]
    fn test_single_file_columns_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Si-3-Result-Band.dat");
        fs::write(&input, BLOCKS).unwrap();

        columns(columns_args(input.clone())).unwrap();
        let cols = dir.path().join("Si-3-Result-Band-withColumns.dat");
        assert_eq!(
            fs::read_to_string(&cols).unwrap(),
            "0 1.0 4.0\n1 2.0 5.0\n2 3.0 6.0\n"
        );

        // 已存在时拒绝覆盖
        let err = columns(columns_args(input)).unwrap_err();
        assert!(matches!(err, GpawFlowError::AlreadyExists { .. }));

        blocks(BlocksArgs {
            input: cols,
            output: None,
            overwrite: false,
        })
        .unwrap();
        let back = dir.path().join("Si-3-Result-Band-withColumns-blocks.dat");
        assert_eq!(fs::read_to_string(back).unwrap(), BLOCKS);
    }

    #[test]
    fn test_expected_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Si-3-Result-Band.dat");
        fs::write(&input, BLOCKS).unwrap();

        let mut args = columns_args(input);
        args.bands = Some(3);
        args.kpoints = Some(3);
        let err = columns(args).unwrap_err();
        assert!(matches!(err, GpawFlowError::ShapeMismatch(_)));
    }

    #[test]
    fn test_directory_batch() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(dir.path().join(format!("{}-3-Result-Band.dat", name)), BLOCKS).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        columns(columns_args(dir.path().to_path_buf())).unwrap();
        for name in ["a", "b", "c"] {
            assert!(dir
                .path()
                .join(format!("{}-3-Result-Band-withColumns.dat", name))
                .exists());
        }

        // 第二次全部跳过
        columns(columns_args(dir.path().to_path_buf())).unwrap();
    }

    #[test]
    fn test_directory_batch_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok-3-Result-Band.dat"), BLOCKS).unwrap();
        fs::write(dir.path().join("bad-3-Result-Band.dat"), "0 1.0\n1 2.0\n\n0 3.0\n").unwrap();

        assert!(columns(columns_args(dir.path().to_path_buf())).is_err());
        assert!(dir.path().join("ok-3-Result-Band-withColumns.dat").exists());
        assert!(!dir.path().join("bad-3-Result-Band-withColumns.dat").exists());
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = columns(columns_args(dir.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, GpawFlowError::NoFilesFound { .. }));
    }
}
