//! # 输入卡片结构定义
//!
//! 一个 TOML 卡片描述一次完整计算：结构、电子参数、各阶段开关与并行设置。
//! 所有缺省值取自常用的石墨烯/硅计算设置。
//!
//! ## 依赖关系
//! - 被 `config/mod.rs` 加载与校验
//! - 被 `engine/`, `commands/` 使用

use serde::Deserialize;
use std::collections::BTreeMap;

/// 顶层卡片
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DeckConfig {
    /// 输出文件前缀；缺省为卡片文件名
    #[serde(default)]
    pub name: String,

    pub structure: StructureConfig,

    #[serde(default)]
    pub calculation: CalculationConfig,

    #[serde(default)]
    pub relax: RelaxConfig,

    #[serde(default)]
    pub dos: DosConfig,

    #[serde(default)]
    pub band: BandConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub parallel: ParallelConfig,
}

// ─────────────────────────────────────────────────────────────
// 结构
// ─────────────────────────────────────────────────────────────

/// 周期性边界条件：单个布尔值或逐轴指定
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum PbcSpec {
    All(bool),
    PerAxis([bool; 3]),
}

impl Default for PbcSpec {
    fn default() -> Self {
        PbcSpec::All(true)
    }
}

impl PbcSpec {
    pub fn axes(&self) -> [bool; 3] {
        match *self {
            PbcSpec::All(flag) => [flag; 3],
            PbcSpec::PerAxis(axes) => axes,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StructureConfig {
    /// 晶格向量 (Å)，每行一个
    pub cell: [[f64; 3]; 3],

    #[serde(default)]
    pub pbc: PbcSpec,

    #[serde(default)]
    pub atoms: Vec<AtomSite>,
}

/// 单个原子：元素与笛卡尔坐标 (Å)
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct AtomSite {
    pub element: String,
    pub position: [f64; 3],
}

// ─────────────────────────────────────────────────────────────
// 电子结构参数
// ─────────────────────────────────────────────────────────────

/// 计算模式
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CalcMode {
    /// 平面波
    #[default]
    Pw,
    /// 原子轨道线性组合
    Lcao,
    /// 实空间有限差分
    Fd,
    /// 平面波 + 精确交换（杂化泛函）
    PwExx,
}

impl std::fmt::Display for CalcMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcMode::Pw => write!(f, "PW"),
            CalcMode::Lcao => write!(f, "LCAO"),
            CalcMode::Fd => write!(f, "FD"),
            CalcMode::PwExx => write!(f, "PW-EXX"),
        }
    }
}

/// 需要精确交换的杂化泛函
pub const HYBRID_FUNCTIONALS: &[&str] = &["HSE06", "HSE03", "PBE0", "B3LYP"];

/// 占据数展宽
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OccupationConfig {
    pub name: String,
    pub width: f64,
}

/// SCF 收敛判据，未给出的项使用引擎默认值
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScfConvergence {
    pub energy: Option<f64>,
    pub eigenstates: Option<f64>,
    pub density: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CalculationConfig {
    #[serde(default)]
    pub mode: CalcMode,

    #[serde(default = "default_xc")]
    pub xc: String,

    /// 截断能 (eV)
    #[serde(default = "default_cutoff")]
    pub cutoff_energy: f64,

    #[serde(default = "default_kpts")]
    pub kpts: [u32; 3],

    /// k 网格是否包含 Γ 点
    #[serde(default)]
    pub gamma: bool,

    #[serde(default)]
    pub spin_polarized: bool,

    #[serde(default = "default_magmom")]
    pub magmom_per_atom: f64,

    /// DFT+U，例如 `N = ":p,6.0"`
    #[serde(default)]
    pub hubbard: BTreeMap<String, String>,

    #[serde(default)]
    pub occupation: Option<OccupationConfig>,

    #[serde(default)]
    pub convergence: Option<ScfConvergence>,
}

fn default_xc() -> String {
    "PBE".to_string()
}

fn default_cutoff() -> f64 {
    340.0
}

fn default_kpts() -> [u32; 3] {
    [5, 5, 1]
}

fn default_magmom() -> f64 {
    1.0
}

impl Default for CalculationConfig {
    fn default() -> Self {
        CalculationConfig {
            mode: CalcMode::default(),
            xc: default_xc(),
            cutoff_energy: default_cutoff(),
            kpts: default_kpts(),
            gamma: false,
            spin_polarized: false,
            magmom_per_atom: default_magmom(),
            hubbard: BTreeMap::new(),
            occupation: None,
            convergence: None,
        }
    }
}

impl CalculationConfig {
    pub fn is_hybrid(&self) -> bool {
        HYBRID_FUNCTIONALS
            .iter()
            .any(|h| h.eq_ignore_ascii_case(&self.xc))
    }
}

// ─────────────────────────────────────────────────────────────
// 几何优化
// ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Minimizer {
    #[default]
    Lbfgs,
    Fire,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RelaxConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub minimizer: Minimizer,

    /// 最大力收敛阈值 (eV/Å)
    #[serde(default = "default_fmax")]
    pub fmax: f64,

    /// 单步最大位移 (Å)
    #[serde(default = "default_max_step")]
    pub max_step: f64,

    /// LBFGS 初始 Hessian 猜测
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// LBFGS 步长阻尼
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// 优化过程中保持空间群
    #[serde(default)]
    pub fix_symmetry: bool,

    /// 参与弛豫的应变分量：EpsX, EpsY, EpsZ, ShearYZ, ShearXZ, ShearXY
    #[serde(default = "default_strain_mask")]
    pub strain_mask: [bool; 6],
}

fn default_true() -> bool {
    true
}

fn default_fmax() -> f64 {
    0.05
}

fn default_max_step() -> f64 {
    0.2
}

fn default_alpha() -> f64 {
    70.0
}

fn default_damping() -> f64 {
    1.0
}

fn default_strain_mask() -> [bool; 6] {
    [true, true, false, false, false, false]
}

impl Default for RelaxConfig {
    fn default() -> Self {
        RelaxConfig {
            enabled: true,
            minimizer: Minimizer::default(),
            fmax: default_fmax(),
            max_step: default_max_step(),
            alpha: default_alpha(),
            damping: default_damping(),
            fix_symmetry: false,
            strain_mask: default_strain_mask(),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// DOS / 能带
// ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DosConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_dos_npoints")]
    pub npoints: usize,

    /// 高斯展宽；0 表示线性四面体插值
    #[serde(default)]
    pub width: f64,
}

fn default_dos_npoints() -> usize {
    500
}

impl Default for DosConfig {
    fn default() -> Self {
        DosConfig {
            enabled: true,
            npoints: default_dos_npoints(),
            width: 0.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BandConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 布里渊区高对称路径
    #[serde(default = "default_band_path")]
    pub path: String,

    /// 路径上的 k 点总数
    #[serde(default = "default_band_npoints")]
    pub npoints: usize,

    /// 需要收敛的能带数
    #[serde(default = "default_bands")]
    pub bands: usize,

    /// 能带图的能量上限 (eV)
    #[serde(default = "default_energy_max")]
    pub energy_max: f64,

    #[serde(default)]
    pub eigenstates: Option<f64>,

    #[serde(default)]
    pub density: Option<f64>,
}

fn default_band_path() -> String {
    "GMKG".to_string()
}

fn default_band_npoints() -> usize {
    40
}

fn default_bands() -> usize {
    8
}

fn default_energy_max() -> f64 {
    15.0
}

impl Default for BandConfig {
    fn default() -> Self {
        BandConfig {
            enabled: true,
            path: default_band_path(),
            npoints: default_band_npoints(),
            bands: default_bands(),
            energy_max: default_energy_max(),
            eigenstates: None,
            density: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 输出
// ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlotFormat {
    #[default]
    Png,
    Svg,
}

impl PlotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PlotFormat::Png => "png",
            PlotFormat::Svg => "svg",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// 绘制 DOS 与能带图
    #[serde(default)]
    pub draw_graphs: bool,

    /// 导出最终结构为 CIF
    #[serde(default = "default_true")]
    pub cif_export: bool,

    /// 输出全电子密度 cube 文件
    #[serde(default)]
    pub density: bool,

    /// 全电子密度网格细化倍数 (1, 2, 4)
    #[serde(default = "default_gridref")]
    pub gridref: u32,

    #[serde(default)]
    pub plot_format: PlotFormat,
}

fn default_gridref() -> u32 {
    4
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            draw_graphs: false,
            cif_export: true,
            density: false,
            gridref: default_gridref(),
            plot_format: PlotFormat::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 并行
// ─────────────────────────────────────────────────────────────

/// 引擎的进程启动方式
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Launcher {
    /// `mpirun -n N gpaw python script.py`
    #[default]
    Mpirun,
    /// `gpaw -PN python script.py`
    Gpaw,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ParallelConfig {
    /// MPI 进程数
    #[serde(default = "default_cores")]
    pub cores: u32,

    #[serde(default)]
    pub launcher: Launcher,

    /// 使用超线程 (`--use-hwthread-cpus`)
    #[serde(default)]
    pub hwthreads: bool,

    /// 引擎可执行文件
    #[serde(default = "default_engine")]
    pub engine: String,
}

fn default_cores() -> u32 {
    4
}

fn default_engine() -> String {
    "gpaw".to_string()
}

impl Default for ParallelConfig {
    fn default() -> Self {
        ParallelConfig {
            cores: default_cores(),
            launcher: Launcher::default(),
            hwthreads: false,
            engine: default_engine(),
        }
    }
}
