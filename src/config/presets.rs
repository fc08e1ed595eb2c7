//! # 起始卡片模板
//!
//! `init` 子命令写出的带注释卡片。
//!
//! ## 依赖关系
//! - 被 `commands/init.rs` 使用

/// 可选的起始结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 8 原子石墨烯片层，真空层沿 z
    Graphene,
    /// 金刚石结构体硅原胞
    Silicon,
}

/// 生成起始卡片文本
pub fn starter_deck(preset: Preset, name: &str) -> String {
    let (structure, calculation, band) = match preset {
        Preset::Graphene => (GRAPHENE_STRUCTURE, GRAPHENE_CALC, GRAPHENE_BAND),
        Preset::Silicon => (SILICON_STRUCTURE, SILICON_CALC, SILICON_BAND),
    };

    format!(
        "{}name = \"{}\"\n\n{}\n{}\n{}\n{}",
        HEADER, name, structure, calculation, band, COMMON
    )
}

const HEADER: &str = "\
# gpawflow input deck
# All output files are named <name>-<stage>-...
# Run with: gpawflow run <this file>
";

const GRAPHENE_STRUCTURE: &str = "\
[structure]
cell = [
    [4.936, 0.0, 0.0],
    [-2.467999999999999, 4.274701393079989, 0.0],
    [0.0, 0.0, 20.0],
]
pbc = true
atoms = [
    { element = \"C\", position = [0.0, 0.0, 5.0] },
    { element = \"C\", position = [-1.2339999999999995, 2.1373506965399947, 5.0] },
    { element = \"C\", position = [2.4679999999999995, 0.0, 5.0] },
    { element = \"C\", position = [1.234, 2.1373506965399947, 5.0] },
    { element = \"C\", position = [2.468000000230841e-06, 1.424899039459532, 5.0] },
    { element = \"C\", position = [-1.2339975319999992, 3.5622497359995267, 5.0] },
    { element = \"C\", position = [2.4680024680000003, 1.424899039459532, 5.0] },
    { element = \"C\", position = [1.234002468000001, 3.5622497359995267, 5.0] },
]
";

const GRAPHENE_CALC: &str = "\
[calculation]
mode = \"pw\"            # pw, lcao, fd, pw-exx (hybrids)
xc = \"PBE\"
cutoff-energy = 340.0   # eV
kpts = [5, 5, 1]

[relax]
enabled = true
minimizer = \"lbfgs\"     # lbfgs or fire
fmax = 0.05             # eV/Ang
# EpsX, EpsY, EpsZ, ShearYZ, ShearXZ, ShearXY; a 2D sheet relaxes in-plane only
strain-mask = [true, true, false, false, false, false]
";

const GRAPHENE_BAND: &str = "\
[band]
path = \"GMKG\"
npoints = 40
bands = 8
energy-max = 15.0
";

const SILICON_STRUCTURE: &str = "\
[structure]
cell = [
    [0.0, 2.7153, 2.7153],
    [2.7153, 0.0, 2.7153],
    [2.7153, 2.7153, 0.0],
]
pbc = true
atoms = [
    { element = \"Si\", position = [0.0, 0.0, 0.0] },
    { element = \"Si\", position = [1.35765, 1.35765, 1.35765] },
]
";

const SILICON_CALC: &str = "\
[calculation]
mode = \"pw\"            # pw, lcao, fd, pw-exx (hybrids)
xc = \"PBE\"
cutoff-energy = 400.0   # eV
kpts = [7, 7, 7]
gamma = true
occupation = { name = \"marzari-vanderbilt\", width = 0.2 }

[relax]
enabled = false
fix-symmetry = true
strain-mask = [false, false, false, false, false, false]
";

const SILICON_BAND: &str = "\
[band]
path = \"GXWKGLUWLK\"
npoints = 401
bands = 8
energy-max = 15.0
";

const COMMON: &str = "\
[dos]
npoints = 500
width = 0.0             # 0 selects the linear tetrahedron method

[output]
draw-graphs = false
cif-export = true

[parallel]
cores = 4               # suggested: number of cores (or threads) minus one
launcher = \"mpirun\"     # mpirun or gpaw
hwthreads = false
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_deck;

    #[test]
    fn test_presets_parse_and_validate() {
        for preset in [Preset::Graphene, Preset::Silicon] {
            let text = starter_deck(preset, "demo");
            let deck = parse_deck(&text, "fallback").unwrap();
            assert_eq!(deck.name, "demo");
        }
    }

    #[test]
    fn test_graphene_preset_atoms() {
        let deck = parse_deck(&starter_deck(Preset::Graphene, "C8"), "x").unwrap();
        assert_eq!(deck.crystal().formula(), "C8");
        assert_eq!(deck.calculation.kpts, [5, 5, 1]);
    }
}
