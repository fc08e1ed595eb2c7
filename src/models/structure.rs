//! # 晶体结构数据模型
//!
//! 输入卡片中的晶胞与原子，以及驱动脚本回传的弛豫结构，都统一为 `Crystal`。
//! 原子位置内部以分数坐标存储；卡片中给出的是笛卡尔坐标 (Å)。
//!
//! ## 依赖关系
//! - 被 `config/`, `parsers/poscar.rs`, `export/cif.rs`, `engine/script.rs` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 行列式小于该值的晶胞视为奇异
const SINGULAR_EPS: f64 = 1e-10;

/// 晶格参数表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    #[cfg(test)]
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let cos_gamma = gamma.to_radians().cos();
        let sin_gamma = gamma.to_radians().sin();

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();

        Lattice {
            matrix: [
                [a, 0.0, 0.0],
                [b * cos_gamma, b * sin_gamma, 0.0],
                [c1, c2, c3],
            ],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let a = norm(a_vec);
        let b = norm(b_vec);
        let c = norm(c_vec);

        let alpha = (dot(b_vec, c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(a_vec, c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(a_vec, b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积（带符号的行列式）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 晶胞是否奇异
    pub fn is_singular(&self) -> bool {
        self.volume().abs() < SINGULAR_EPS
    }

    /// 按同一因子缩放三个晶格向量
    pub fn scaled(&self, factor: f64) -> Self {
        let mut matrix = self.matrix;
        for row in matrix.iter_mut() {
            for v in row.iter_mut() {
                *v *= factor;
            }
        }
        Lattice { matrix }
    }

    /// 笛卡尔坐标转分数坐标
    ///
    /// 奇异晶胞无法求逆，此时原样返回。
    pub fn cart_to_frac(&self, cart: [f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        let det = self.volume();

        if det.abs() < SINGULAR_EPS {
            return cart;
        }

        let inv = [
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
            ],
        ];

        // r = f^T M  =>  f = r M^-1
        [
            cart[0] * inv[0][0] + cart[1] * inv[1][0] + cart[2] * inv[2][0],
            cart[0] * inv[0][1] + cart[1] * inv[1][1] + cart[2] * inv[2][1],
            cart[0] * inv[0][2] + cart[1] * inv[1][2] + cart[2] * inv[2][2],
        ]
    }

    /// 分数坐标转笛卡尔坐标
    #[cfg(test)]
    pub fn frac_to_cart(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称（同时作为所有输出文件的前缀）
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表（分数坐标）
    pub atoms: Vec<Atom>,

    /// 三个方向的周期性边界条件
    pub pbc: [bool; 3],

    /// 来源文件格式
    pub source_format: Option<String>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
            pbc: [true; 3],
            source_format: None,
        }
    }

    /// 由笛卡尔坐标 (Å) 构建结构
    pub fn from_cartesian<'a, I>(name: impl Into<String>, lattice: Lattice, pbc: [bool; 3], sites: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, [f64; 3])>,
    {
        let atoms = sites
            .into_iter()
            .map(|(element, cart)| Atom::new(element, lattice.cart_to_frac(cart)))
            .collect();

        let mut crystal = Crystal::new(name, lattice, atoms);
        crystal.pbc = pbc;
        crystal
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 计算每原子体积
    pub fn volume_per_atom(&self) -> Option<f64> {
        if self.atoms.is_empty() {
            return None;
        }
        Some(self.lattice.volume().abs() / self.atoms.len() as f64)
    }
}
