//! # CIF 导出
//!
//! 把弛豫后的结构写为 CIF 1.1 文本（P 1 对称性，分数坐标）。
//!
//! ## 依赖关系
//! - 被 `commands/cif.rs`, `commands/post.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{GpawFlowError, Result};
use crate::models::Crystal;
use std::fs;
use std::path::Path;

/// 分数坐标折回 [0, 1)
fn wrap(x: f64) -> f64 {
    let w = x - x.floor();
    if (1.0 - w).abs() < 1e-10 || w.abs() < 1e-10 {
        0.0
    } else {
        w
    }
}

/// 生成 CIF 文本
pub fn to_cif_string(crystal: &Crystal) -> String {
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();
    let formula = crystal.formula();

    let mut result = String::new();
    result.push_str(&format!("data_{}\n", crystal.name.replace(char::is_whitespace, "_")));
    result.push_str(&format!("_chemical_formula_sum            '{}'\n", formula));
    result.push_str("_symmetry_space_group_name_H-M    'P 1'\n");
    result.push_str("_symmetry_Int_Tables_number       1\n\n");

    result.push_str(&format!("_cell_length_a    {:.6}\n", a));
    result.push_str(&format!("_cell_length_b    {:.6}\n", b));
    result.push_str(&format!("_cell_length_c    {:.6}\n", c));
    result.push_str(&format!("_cell_angle_alpha {:.4}\n", alpha));
    result.push_str(&format!("_cell_angle_beta  {:.4}\n", beta));
    result.push_str(&format!("_cell_angle_gamma {:.4}\n", gamma));
    result.push_str(&format!(
        "_cell_volume      {:.4}\n\n",
        crystal.lattice.volume().abs()
    ));

    result.push_str("loop_\n");
    result.push_str("  _symmetry_equiv_pos_as_xyz\n");
    result.push_str("  'x, y, z'\n\n");

    result.push_str("loop_\n");
    result.push_str("  _atom_site_label\n");
    result.push_str("  _atom_site_type_symbol\n");
    result.push_str("  _atom_site_fract_x\n");
    result.push_str("  _atom_site_fract_y\n");
    result.push_str("  _atom_site_fract_z\n");
    result.push_str("  _atom_site_occupancy\n");

    // 标签按元素分别编号: C1 C2 ... Si1
    let mut seen: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for atom in &crystal.atoms {
        let n = seen.entry(atom.element.as_str()).or_insert(0);
        *n += 1;
        let label = format!("{}{}", atom.element, n);
        result.push_str(&format!(
            "  {:<6} {:<3} {:13.10} {:13.10} {:13.10} 1.0000\n",
            label,
            atom.element,
            wrap(atom.position[0]),
            wrap(atom.position[1]),
            wrap(atom.position[2])
        ));
    }

    result
}

/// 写出 CIF 文件
pub fn write_cif_file(crystal: &Crystal, path: &Path) -> Result<()> {
    fs::write(path, to_cif_string(crystal)).map_err(|e| GpawFlowError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn silicon() -> Crystal {
        let lattice = Lattice::from_parameters(5.43, 5.43, 5.43, 90.0, 90.0, 90.0);
        Crystal::new(
            "bulk Si",
            lattice,
            vec![
                Atom::new("Si", [0.0, 0.0, 0.0]),
                Atom::new("Si", [1.25, -0.25, 0.999999999999]),
            ],
        )
    }

    #[test]
    fn test_cif_header_and_cell() {
        let cif = to_cif_string(&silicon());
        assert!(cif.starts_with("data_bulk_Si\n"));
        assert!(cif.contains("_chemical_formula_sum            'Si2'"));
        assert!(cif.contains("_symmetry_space_group_name_H-M    'P 1'"));
        assert!(cif.contains("_cell_length_a    5.430000"));
        assert!(cif.contains("_cell_angle_gamma 90.0000"));
        assert!(cif.contains("_cell_volume      160.1030"));
    }

    #[test]
    fn test_sites_wrapped_and_labelled() {
        let cif = to_cif_string(&silicon());
        let sites: Vec<&str> = cif
            .lines()
            .filter(|l| l.trim_start().starts_with("Si"))
            .collect();
        assert_eq!(sites.len(), 2);

        let fields: Vec<&str> = sites[1].split_whitespace().collect();
        assert_eq!(fields[0], "Si2");
        assert_eq!(fields[2].parse::<f64>().unwrap(), 0.25);
        assert_eq!(fields[3].parse::<f64>().unwrap(), 0.75);
        assert_eq!(fields[4].parse::<f64>().unwrap(), 0.0);
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Si-4-FinalBulk.cif");
        write_cif_file(&silicon(), &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("loop_"));
    }
}
