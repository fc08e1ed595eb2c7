//! # VASP POSCAR 格式解析器
//!
//! 驱动脚本在弛豫结束后用 `ase.io.write(..., format='vasp', vasp5=True)`
//! 写出 `<name>-1-Result-Ground.POSCAR`，这里把它读回为 `Crystal`，
//! 供 CIF 导出使用。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/cif.rs`, `commands/post.rs`, `commands/generate.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{GpawFlowError, Result};
use crate::models::{Atom, Crystal, Lattice};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| GpawFlowError::read(path, e))?;

    parse_poscar_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

fn poscar_error(name: &str, reason: impl Into<String>) -> GpawFlowError {
    GpawFlowError::ParseError {
        format: "poscar".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

fn parse_triple(line: &str) -> Option<[f64; 3]> {
    let parts: Vec<f64> = line
        .split_whitespace()
        .take(3)
        .map_while(|s| s.parse().ok())
        .collect();
    if parts.len() == 3 {
        Some([parts[0], parts[1], parts[2]])
    } else {
        None
    }
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Crystal> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 8 {
        return Err(poscar_error(default_name, "File too short"));
    }

    let name = match lines[0].trim() {
        "" => default_name.to_string(),
        comment => comment.to_string(),
    };

    // 负的缩放因子表示目标体积
    let scale: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|_| poscar_error(&name, format!("Invalid scaling factor '{}'", lines[1].trim())))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        *row = parse_triple(lines[2 + i])
            .ok_or_else(|| poscar_error(&name, format!("Invalid lattice vector at line {}", 3 + i)))?;
    }
    let raw = Lattice::from_vectors(matrix);
    let factor = if scale < 0.0 {
        (scale.abs() / raw.volume().abs()).cbrt()
    } else {
        scale
    };
    let lattice = raw.scaled(factor);
    if lattice.is_singular() {
        return Err(poscar_error(&name, "Lattice vectors are linearly dependent"));
    }

    // Line 5: 元素符号 (VASP 5+)；VASP 4 没有元素行，无法恢复化学信息
    let line5: Vec<&str> = lines[5].split_whitespace().collect();
    if line5.is_empty() || line5[0].parse::<usize>().is_ok() {
        return Err(poscar_error(
            &name,
            "Missing element line (only VASP 5 layout is supported)",
        ));
    }
    let elements: Vec<String> = line5.iter().map(|s| s.to_string()).collect();
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|s| s.parse())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| poscar_error(&name, "Invalid atom count line"))?;
    if counts.len() != elements.len() {
        return Err(poscar_error(
            &name,
            format!(
                "{} element symbols but {} atom counts",
                elements.len(),
                counts.len()
            ),
        ));
    }

    let mut coord_line = 7;
    if lines[coord_line]
        .trim()
        .to_lowercase()
        .starts_with('s')
    {
        coord_line += 1;
    }
    let coord_type = lines
        .get(coord_line)
        .map(|l| l.trim().to_lowercase())
        .ok_or_else(|| poscar_error(&name, "Missing coordinate type line"))?;
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let mut atoms = Vec::with_capacity(counts.iter().sum());
    let mut line_idx = coord_line + 1;

    for (element, &count) in elements.iter().zip(counts.iter()) {
        for _ in 0..count {
            let position = lines
                .get(line_idx)
                .and_then(|l| parse_triple(l))
                .ok_or_else(|| {
                    poscar_error(&name, format!("Invalid atom position at line {}", line_idx + 1))
                })?;
            let position = if is_cartesian {
                lattice.cart_to_frac([
                    position[0] * factor,
                    position[1] * factor,
                    position[2] * factor,
                ])
            } else {
                position
            };
            atoms.push(Atom::new(element.clone(), position));
            line_idx += 1;
        }
    }

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.source_format = Some("poscar".to_string());

    Ok(crystal)
}

/// 将 Crystal 转换为 POSCAR 格式字符串（VASP 5，Direct 坐标）
///
/// 相邻的同种元素合并为一组，保持原子顺序不变。
pub fn to_poscar_string(crystal: &Crystal) -> String {
    let mut groups: Vec<(&str, Vec<[f64; 3]>)> = Vec::new();
    for atom in &crystal.atoms {
        match groups.last_mut() {
            Some((element, positions)) if *element == atom.element => {
                positions.push(atom.position)
            }
            _ => groups.push((atom.element.as_str(), vec![atom.position])),
        }
    }

    let mut result = String::new();
    result.push_str(&format!("{}\n", crystal.name));
    result.push_str("1.0\n");

    for row in &crystal.lattice.matrix {
        result.push_str(&format!(
            "  {:16.10}  {:16.10}  {:16.10}\n",
            row[0], row[1], row[2]
        ));
    }

    let symbols: Vec<&str> = groups.iter().map(|(e, _)| *e).collect();
    let counts: Vec<String> = groups.iter().map(|(_, p)| p.len().to_string()).collect();
    result.push_str(&format!("   {}\n", symbols.join("   ")));
    result.push_str(&format!("   {}\n", counts.join("   ")));
    result.push_str("Direct\n");

    for (_, positions) in &groups {
        for pos in positions {
            result.push_str(&format!(
                "  {:16.10}  {:16.10}  {:16.10}\n",
                pos[0], pos[1], pos[2]
            ));
        }
    }

    result
}

/// 写出 POSCAR 文件
pub fn write_poscar_file(crystal: &Crystal, path: &Path) -> Result<()> {
    fs::write(path, to_poscar_string(crystal)).map_err(|e| GpawFlowError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ASE 写出的石墨烯弛豫结构
    const GRAPHENE: &str = "\
C
 1.0000000000000000
     4.9260000000000002    0.0000000000000000    0.0000000000000000
     2.4630000000000001    4.2660395000000000    0.0000000000000000
     0.0000000000000000    0.0000000000000000   20.0000000000000000
 C
   8
Direct
  0.0000000000000000  0.0000000000000000  0.5000000000000000
  0.3333333333333333  0.3333333333333333  0.5000000000000000
  0.5000000000000000  0.0000000000000000  0.5000000000000000
  0.8333333333333333  0.3333333333333333  0.5000000000000000
  0.0000000000000000  0.5000000000000000  0.5000000000000000
  0.3333333333333333  0.8333333333333333  0.5000000000000000
  0.5000000000000000  0.5000000000000000  0.5000000000000000
  0.8333333333333333  0.8333333333333333  0.5000000000000000
";

    #[test]
    fn test_parse_ase_handoff() {
        let crystal = parse_poscar_content(GRAPHENE, "graphene").unwrap();
        assert_eq!(crystal.atoms.len(), 8);
        assert!(crystal.atoms.iter().all(|a| a.element == "C"));
        assert_eq!(crystal.source_format.as_deref(), Some("poscar"));

        let (a, b, c, _, _, gamma) = crystal.lattice.parameters();
        assert!((a - 4.926).abs() < 1e-6);
        assert!((b - 4.926).abs() < 1e-3);
        assert!((c - 20.0).abs() < 1e-9);
        assert!((gamma - 60.0).abs() < 1e-2);
    }

    #[test]
    fn test_scale_and_cartesian() {
        let content = "Si
2.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Si
2
Cartesian
0.0 0.0 0.0
1.0 1.0 1.0
";
        let crystal = parse_poscar_content(content, "Si").unwrap();
        let (a, _, _, _, _, _) = crystal.lattice.parameters();
        assert!((a - 4.0).abs() < 1e-9);

        // 笛卡尔坐标同样乘以缩放因子
        let p = crystal.atoms[1].position;
        for x in p {
            assert!((x - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_selective_dynamics() {
        let content = "Fe with selective
1.0
2.87 0.0 0.0
0.0 2.87 0.0
0.0 0.0 2.87
Fe
2
Selective dynamics
Direct
0.0 0.0 0.0 T T T
0.5 0.5 0.5 F F F
";
        let crystal = parse_poscar_content(content, "Fe").unwrap();
        assert_eq!(crystal.atoms.len(), 2);
        assert_eq!(crystal.name, "Fe with selective");
    }

    #[test]
    fn test_truncated_positions_rejected() {
        let content = "NaCl
1.0
5.64 0.0 0.0
0.0 5.64 0.0
0.0 0.0 5.64
Na Cl
1 1
Direct
0.0 0.0 0.0
";
        assert!(parse_poscar_content(content, "NaCl").is_err());
    }

    #[test]
    fn test_vasp4_rejected() {
        let content = "x
1.0
1 0 0
0 1 0
0 0 1
2
Direct
0 0 0
0.5 0.5 0.5
";
        assert!(parse_poscar_content(content, "x").is_err());
    }

    #[test]
    fn test_writer_keeps_atom_order() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let atoms = vec![
            Atom::new("Ti", [0.0, 0.0, 0.0]),
            Atom::new("O", [0.5, 0.5, 0.0]),
            Atom::new("O", [0.5, 0.0, 0.5]),
        ];
        let crystal = Crystal::new("TiO2", lattice, atoms);

        let text = to_poscar_string(&crystal);
        assert!(text.contains("   Ti   O\n   1   2\nDirect\n"));

        let parsed = parse_poscar_content(&text, "ignored").unwrap();
        assert_eq!(parsed.name, "TiO2");
        let elements: Vec<&str> = parsed.atoms.iter().map(|a| a.element.as_str()).collect();
        assert_eq!(elements, vec!["Ti", "O", "O"]);
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C-1-Result-Ground.POSCAR");
        let crystal = parse_poscar_content(GRAPHENE, "graphene").unwrap();
        write_poscar_file(&crystal, &path).unwrap();
        assert_eq!(parse_poscar_file(&path).unwrap().atoms.len(), 8);
    }
}
