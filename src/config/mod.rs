//! # 输入卡片模块
//!
//! 读取、补全并校验 TOML 输入卡片，生成 `Crystal` 结构。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/structure.rs`
//! - 子模块: deck, presets

pub mod deck;
pub mod presets;

pub use deck::{
    CalcMode, DeckConfig, Launcher, Minimizer, OccupationConfig, PbcSpec, PlotFormat,
    ScfConvergence,
};

use crate::error::{GpawFlowError, Result};
use crate::models::{Crystal, Lattice};
use std::fs;
use std::path::Path;

/// 从文件加载卡片并校验
pub fn load_deck(path: &Path) -> Result<DeckConfig> {
    if !path.exists() {
        return Err(GpawFlowError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| GpawFlowError::read(path, e))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");

    parse_deck(&content, stem).map_err(|reason| GpawFlowError::ConfigError {
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串解析卡片，`default_name` 在卡片未给出 `name` 时使用
pub fn parse_deck(content: &str, default_name: &str) -> std::result::Result<DeckConfig, String> {
    let mut deck: DeckConfig = toml::from_str(content).map_err(|e| e.to_string())?;

    if deck.name.trim().is_empty() {
        deck.name = default_name.to_string();
    }

    deck.validate()?;
    Ok(deck)
}

impl DeckConfig {
    /// 校验卡片，错误信息指明出错的键
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.contains(['/', '\\']) {
            return Err(format!("name: '{}' must not contain path separators", self.name));
        }

        // structure
        if self.structure.atoms.is_empty() {
            return Err("structure.atoms: at least one atom is required".to_string());
        }
        for (i, site) in self.structure.atoms.iter().enumerate() {
            if !is_element_symbol(&site.element) {
                return Err(format!(
                    "structure.atoms[{}].element: '{}' is not an element symbol",
                    i, site.element
                ));
            }
        }
        if Lattice::from_vectors(self.structure.cell).is_singular() {
            return Err("structure.cell: lattice vectors are linearly dependent".to_string());
        }

        // calculation
        let calc = &self.calculation;
        if calc.cutoff_energy <= 0.0 {
            return Err(format!(
                "calculation.cutoff-energy: must be positive, got {}",
                calc.cutoff_energy
            ));
        }
        if calc.kpts.iter().any(|&k| k == 0) {
            return Err(format!(
                "calculation.kpts: every entry must be >= 1, got {:?}",
                calc.kpts
            ));
        }
        if calc.mode == CalcMode::PwExx && !calc.is_hybrid() {
            return Err(format!(
                "calculation.xc: mode pw-exx needs a hybrid functional, got '{}'",
                calc.xc
            ));
        }
        if calc.is_hybrid() && calc.mode != CalcMode::PwExx {
            return Err(format!(
                "calculation.mode: hybrid functional '{}' requires mode = \"pw-exx\"",
                calc.xc
            ));
        }
        if let Some(occ) = &calc.occupation {
            if occ.width < 0.0 {
                return Err("calculation.occupation.width: must not be negative".to_string());
            }
        }

        // relax
        if self.relax.fmax <= 0.0 {
            return Err("relax.fmax: must be positive".to_string());
        }
        if self.relax.max_step <= 0.0 {
            return Err("relax.max-step: must be positive".to_string());
        }

        // dos
        if self.dos.npoints < 2 {
            return Err("dos.npoints: must be >= 2".to_string());
        }
        if self.dos.width < 0.0 {
            return Err("dos.width: must not be negative".to_string());
        }

        // band
        let band = &self.band;
        if band.npoints < 2 {
            return Err("band.npoints: must be >= 2".to_string());
        }
        if band.bands == 0 {
            return Err("band.bands: must be >= 1".to_string());
        }
        if !(band.energy_max.is_finite() && band.energy_max > 0.0) {
            return Err(format!(
                "band.energy-max: must be positive, got {}",
                band.energy_max
            ));
        }
        if band.path.is_empty()
            || !band.path.chars().all(|c| c.is_ascii_alphabetic() || c == ',')
        {
            return Err(format!(
                "band.path: '{}' must consist of special-point letters",
                band.path
            ));
        }

        // output
        if ![1, 2, 4].contains(&self.output.gridref) {
            return Err(format!(
                "output.gridref: must be 1, 2 or 4, got {}",
                self.output.gridref
            ));
        }

        // parallel
        if self.parallel.cores == 0 {
            return Err("parallel.cores: must be >= 1".to_string());
        }
        if self.parallel.engine.trim().is_empty() {
            return Err("parallel.engine: must not be empty".to_string());
        }

        Ok(())
    }

    /// 卡片中定义的初始结构
    pub fn crystal(&self) -> Crystal {
        let lattice = Lattice::from_vectors(self.structure.cell);
        let mut crystal = Crystal::from_cartesian(
            self.name.clone(),
            lattice,
            self.structure.pbc.axes(),
            self.structure
                .atoms
                .iter()
                .map(|a| (a.element.as_str(), a.position)),
        );
        crystal.source_format = Some("deck".to_string());
        crystal
    }
}

/// 元素符号：大写字母开头，可跟一个小写字母
fn is_element_symbol(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), None, None) => a.is_ascii_uppercase(),
        (Some(a), Some(b), None) => a.is_ascii_uppercase() && b.is_ascii_lowercase(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SI_DECK: &str = r#"
[structure]
cell = [[0.0, 2.7153, 2.7153], [2.7153, 0.0, 2.7153], [2.7153, 2.7153, 0.0]]

[[structure.atoms]]
element = "Si"
position = [0.0, 0.0, 0.0]

[[structure.atoms]]
element = "Si"
position = [1.35765, 1.35765, 1.35765]
"#;

    #[test]
    fn test_defaults_applied() {
        let deck = parse_deck(SI_DECK, "Si-bulk").unwrap();

        assert_eq!(deck.name, "Si-bulk");
        assert_eq!(deck.calculation.mode, CalcMode::Pw);
        assert_eq!(deck.calculation.xc, "PBE");
        assert_eq!(deck.calculation.cutoff_energy, 340.0);
        assert_eq!(deck.calculation.kpts, [5, 5, 1]);
        assert!(deck.relax.enabled);
        assert_eq!(deck.relax.minimizer, Minimizer::Lbfgs);
        assert_eq!(
            deck.relax.strain_mask,
            [true, true, false, false, false, false]
        );
        assert_eq!(deck.dos.npoints, 500);
        assert_eq!(deck.band.path, "GMKG");
        assert_eq!(deck.band.npoints, 40);
        assert_eq!(deck.band.bands, 8);
        assert!(deck.output.cif_export);
        assert!(!deck.output.draw_graphs);
        assert_eq!(deck.parallel.cores, 4);
        assert_eq!(deck.parallel.launcher, Launcher::Mpirun);
        assert_eq!(deck.structure.pbc.axes(), [true; 3]);
    }

    #[test]
    fn test_explicit_values() {
        let content = r#"
name = "Si-hse"

[structure]
cell = [[0.0, 2.7153, 2.7153], [2.7153, 0.0, 2.7153], [2.7153, 2.7153, 0.0]]
pbc = [true, true, false]
atoms = [{ element = "Si", position = [0.0, 0.0, 0.0] }]

[calculation]
mode = "pw-exx"
xc = "HSE06"
cutoff-energy = 400.0
kpts = [3, 3, 3]
gamma = true
occupation = { name = "marzari-vanderbilt", width = 0.2 }
convergence = { energy = 0.1, density = 0.1 }
hubbard = { N = ":p,6.0" }

[relax]
minimizer = "fire"
fix-symmetry = true

[band]
path = "GXWKGLUWLK"
npoints = 401

[parallel]
launcher = "gpaw"
cores = 8
"#;
        let deck = parse_deck(content, "ignored").unwrap();
        assert_eq!(deck.name, "Si-hse");
        assert_eq!(deck.structure.pbc.axes(), [true, true, false]);
        assert_eq!(deck.calculation.mode, CalcMode::PwExx);
        assert!(deck.calculation.is_hybrid());
        assert!(deck.calculation.gamma);
        assert_eq!(
            deck.calculation.occupation,
            Some(OccupationConfig {
                name: "marzari-vanderbilt".to_string(),
                width: 0.2
            })
        );
        let conv = deck.calculation.convergence.clone().unwrap();
        assert_eq!(conv.energy, Some(0.1));
        assert_eq!(conv.eigenstates, None);
        assert_eq!(deck.calculation.hubbard.get("N").unwrap(), ":p,6.0");
        assert_eq!(deck.relax.minimizer, Minimizer::Fire);
        assert_eq!(deck.band.npoints, 401);
        assert_eq!(deck.parallel.launcher, Launcher::Gpaw);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let content = format!("{}\n[dos]\nnpts = 300\n", SI_DECK);
        let err = parse_deck(&content, "Si").unwrap_err();
        assert!(err.contains("npts"), "{}", err);
    }

    #[test]
    fn test_validation_errors_name_the_key() {
        let cases = [
            ("[calculation]\ncutoff-energy = 0.0\n", "calculation.cutoff-energy"),
            ("[calculation]\nkpts = [0, 1, 1]\n", "calculation.kpts"),
            ("[calculation]\nxc = \"HSE06\"\n", "calculation.mode"),
            ("[calculation]\nmode = \"pw-exx\"\n", "calculation.xc"),
            ("[band]\nnpoints = 1\n", "band.npoints"),
            ("[band]\npath = \"G-X\"\n", "band.path"),
            ("[band]\nenergy-max = -1.0\n", "band.energy-max"),
            ("[band]\nenergy-max = nan\n", "band.energy-max"),
            ("[dos]\nnpoints = 1\n", "dos.npoints"),
            ("[output]\ngridref = 3\n", "output.gridref"),
            ("[parallel]\ncores = 0\n", "parallel.cores"),
        ];

        for (extra, key) in cases {
            let content = format!("{}\n{}", SI_DECK, extra);
            let err = parse_deck(&content, "Si").unwrap_err();
            assert!(err.starts_with(key), "expected '{}' error, got '{}'", key, err);
        }
    }

    #[test]
    fn test_singular_cell_rejected() {
        let content = r#"
[structure]
cell = [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]
atoms = [{ element = "C", position = [0.0, 0.0, 0.0] }]
"#;
        let err = parse_deck(content, "bad").unwrap_err();
        assert!(err.starts_with("structure.cell"));
    }

    #[test]
    fn test_no_atoms_rejected() {
        let content = r#"
[structure]
cell = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
"#;
        let err = parse_deck(content, "empty").unwrap_err();
        assert!(err.starts_with("structure.atoms"));
    }

    #[test]
    fn test_bad_element_symbol_rejected() {
        let content = SI_DECK.replacen("\"Si\"", "\"si\"", 1);
        let err = parse_deck(&content, "Si").unwrap_err();
        assert!(err.contains("structure.atoms[0].element"));
    }

    #[test]
    fn test_crystal_from_deck() {
        let deck = parse_deck(SI_DECK, "Si").unwrap();
        let crystal = deck.crystal();

        assert_eq!(crystal.name, "Si");
        assert_eq!(crystal.formula(), "Si2");
        for f in crystal.atoms[1].position {
            assert!((f - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_load_deck_missing_file() {
        let err = load_deck(Path::new("/nonexistent/deck.toml")).unwrap_err();
        assert!(matches!(err, GpawFlowError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_deck_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphene-sheet.toml");
        fs::write(&path, SI_DECK).unwrap();

        let deck = load_deck(&path).unwrap();
        assert_eq!(deck.name, "graphene-sheet");
    }
}
