//! # 阶段输出文件命名
//!
//! 所有文件都以结构名为前缀，按阶段编号：
//! 1 基态，2 DOS，3 能带，4 CIF，5 全电子密度；0 为初始结构与收敛扫描。
//!
//! ## 依赖关系
//! - 被 `engine/script.rs` 和 `commands/` 使用

use crate::config::PlotFormat;
use crate::models::ScanParameter;
use std::path::{Path, PathBuf};

/// 某一结构在工作目录下的全部输出文件
#[derive(Debug, Clone)]
pub struct StageFiles {
    dir: PathBuf,
    name: String,
}

impl StageFiles {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        StageFiles {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 目录中的 `<name>-<suffix>`
    pub fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(self.file_name(suffix))
    }

    /// 不含目录的 `<name>-<suffix>`，写入驱动脚本时使用
    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}-{}", self.name, suffix)
    }

    pub fn driver_script(&self) -> PathBuf {
        self.dir.join(format!("{}.py", self.name))
    }

    pub fn scan_script(&self, parameter: ScanParameter) -> PathBuf {
        self.dir
            .join(format!("{}-0-Optimize-{}.py", self.name, parameter))
    }

    pub fn sbatch_script(&self) -> PathBuf {
        self.dir.join(format!("{}.sbatch", self.name))
    }

    pub fn initial_poscar(&self) -> PathBuf {
        self.file(INITIAL_POSCAR)
    }

    /// 引擎进程的标准输出
    pub fn run_stdout(&self) -> PathBuf {
        self.file(RUN_STDOUT)
    }

    /// 扫描运行的标准输出，与主运行分开
    pub fn scan_stdout(&self, parameter: ScanParameter) -> PathBuf {
        self.dir
            .join(format!("{}-0-Optimize-{}-Stdout.txt", self.name, parameter))
    }

    pub fn ground_log(&self) -> PathBuf {
        self.file(GROUND_LOG)
    }

    pub fn relaxed_poscar(&self) -> PathBuf {
        self.file(GROUND_POSCAR)
    }

    pub fn dos_txt(&self) -> PathBuf {
        self.file(DOS_TXT)
    }

    pub fn band_dat(&self) -> PathBuf {
        self.file(BAND_DAT)
    }

    pub fn band_columns(&self) -> PathBuf {
        self.file(BAND_COLUMNS)
    }

    pub fn final_cif(&self) -> PathBuf {
        self.file(FINAL_CIF)
    }

    pub fn dos_graph(&self, format: PlotFormat) -> PathBuf {
        self.file(&format!("2-Graph-DOS.{}", format.extension()))
    }

    pub fn band_graph(&self, format: PlotFormat) -> PathBuf {
        self.file(&format!("3-Graph-Band.{}", format.extension()))
    }

    pub fn scan_table(&self, parameter: ScanParameter) -> PathBuf {
        self.file(parameter.table_suffix())
    }

    pub fn scan_graph(&self, parameter: ScanParameter, format: PlotFormat) -> PathBuf {
        self.file(&format!("0-Graph-{}.{}", parameter, format.extension()))
    }
}

pub const INITIAL_POSCAR: &str = "0-Initial.POSCAR";
pub const RUN_STDOUT: &str = "0-Run-Stdout.txt";
pub const GROUND_LOG: &str = "1-Log-Ground.txt";
pub const GROUND_TRAJ: &str = "1-Result-Ground.traj";
pub const GROUND_GPW: &str = "1-Result-Ground.gpw";
pub const GROUND_POSCAR: &str = "1-Result-Ground.POSCAR";
pub const DOS_LOG: &str = "2-Log-DOS.txt";
pub const DOS_TXT: &str = "2-Result-DOS.txt";
pub const BAND_LOG: &str = "3-Log-Band.txt";
pub const BAND_GPW: &str = "3-Result-Band.gpw";
pub const BAND_DAT: &str = "3-Result-Band.dat";
pub const BAND_COLUMNS: &str = "3-Result-Band-withColumns.dat";
pub const FINAL_CIF: &str = "4-FinalBulk.cif";
pub const DENSITY_CUBE: &str = "5-Result-Density.cube";

/// 由块格式能带文件名推出列格式文件名
pub fn columns_path_for(band_dat: &Path) -> PathBuf {
    let stem = band_dat
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("band");
    band_dat.with_file_name(format!("{}-withColumns.dat", stem))
}
