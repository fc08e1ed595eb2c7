//! # 图表生成
//!
//! 使用 `plotters` 绘制态密度、能带和收敛扫描图，支持 PNG 与 SVG。
//!
//! ## 依赖关系
//! - 被 `commands/post.rs`, `commands/converge.rs` 调用
//! - 使用 `models/bands.rs` 的 BandBlocks, DosCurve
//! - 使用 `engine/scan.rs` 的 ScanSummary

use crate::config::PlotFormat;
use crate::engine::ScanSummary;
use crate::error::{GpawFlowError, Result};
use crate::models::{BandBlocks, DosCurve};

use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const SIZE: (u32, u32) = (1000, 750);

fn plot_err<E: std::fmt::Debug>(e: E) -> GpawFlowError {
    GpawFlowError::Other(format!("plot: {:?}", e))
}

// ─────────────────────────────────────────────────────────────
// 数据准备
// ─────────────────────────────────────────────────────────────

/// 能带折线数据，纵坐标截断在 ±`energy_max`
///
/// 横坐标取 k 索引的数值。
pub fn band_series(bands: &BandBlocks, energy_max: f64) -> Result<Vec<Vec<(f64, f64)>>> {
    if !(energy_max.is_finite() && energy_max > 0.0) {
        return Err(GpawFlowError::InvalidArgument(format!(
            "band plot energy window must be positive, got {}",
            energy_max
        )));
    }
    let energies = bands.energies().map_err(GpawFlowError::Other)?;
    let xs: Vec<f64> = bands
        .k_labels
        .iter()
        .enumerate()
        .map(|(i, k)| k.parse().unwrap_or(i as f64))
        .collect();

    Ok(energies
        .iter()
        .map(|band| {
            xs.iter()
                .zip(band.iter())
                .map(|(&x, &e)| (x, e.clamp(-energy_max, energy_max)))
                .collect()
        })
        .collect())
}

/// DOS 图的坐标范围 (e_min, e_max, dos_max)
pub fn dos_bounds(curve: &DosCurve) -> (f64, f64, f64) {
    let (e_min, e_max) = curve.energy_range().unwrap_or((-1.0, 1.0));
    let peak = curve.peak().map(|(_, w)| w).unwrap_or(1.0);
    let top = if peak > 0.0 { peak * 1.1 } else { 1.0 };
    if e_max > e_min {
        (e_min, e_max, top)
    } else {
        (e_min - 1.0, e_max + 1.0, top)
    }
}

fn padded(min: f64, max: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

// ─────────────────────────────────────────────────────────────
// 态密度
// ─────────────────────────────────────────────────────────────

/// 绘制 DOS 图
pub fn plot_dos(curve: &DosCurve, output_path: &Path, title: &str, format: PlotFormat) -> Result<()> {
    match format {
        PlotFormat::Svg => {
            let root = SVGBackend::new(output_path, SIZE).into_drawing_area();
            draw_dos_chart(&root, curve, title)?;
            root.present().map_err(plot_err)?;
        }
        PlotFormat::Png => {
            let root = BitMapBackend::new(output_path, SIZE).into_drawing_area();
            draw_dos_chart(&root, curve, title)?;
            root.present().map_err(plot_err)?;
        }
    }
    Ok(())
}

fn draw_dos_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    curve: &DosCurve,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let (x_min, x_max, y_max) = dos_bounds(curve);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Energy (eV)")
        .y_desc("DOS")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    let points: Vec<(f64, f64)> = curve
        .energies
        .iter()
        .copied()
        .zip(curve.weights.iter().copied())
        .collect();

    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(AreaSeries::new(points.iter().copied(), 0.0, line_color.mix(0.2)))
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(points, line_color.stroke_width(2)))
        .map_err(plot_err)?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────
// 能带
// ─────────────────────────────────────────────────────────────

/// 绘制能带图，费米能级位于 0
pub fn plot_bands(
    bands: &BandBlocks,
    energy_max: f64,
    output_path: &Path,
    title: &str,
    format: PlotFormat,
) -> Result<()> {
    let series = band_series(bands, energy_max)?;
    match format {
        PlotFormat::Svg => {
            let root = SVGBackend::new(output_path, SIZE).into_drawing_area();
            draw_band_chart(&root, &series, energy_max, title)?;
            root.present().map_err(plot_err)?;
        }
        PlotFormat::Png => {
            let root = BitMapBackend::new(output_path, SIZE).into_drawing_area();
            draw_band_chart(&root, &series, energy_max, title)?;
            root.present().map_err(plot_err)?;
        }
    }
    Ok(())
}

fn draw_band_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &[Vec<(f64, f64)>],
    energy_max: f64,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let x_max = series
        .iter()
        .flat_map(|band| band.iter().map(|(x, _)| *x))
        .fold(0.0_f64, f64::max);
    let x_max = if x_max > 0.0 { x_max } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, -energy_max..energy_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("k-point index")
        .y_desc("E - E_F (eV)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    let line_color = RGBColor(0, 102, 204);
    for band in series {
        chart
            .draw_series(LineSeries::new(band.iter().copied(), line_color.stroke_width(2)))
            .map_err(plot_err)?;
    }

    // 费米能级
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (x_max, 0.0)],
            RGBColor(200, 30, 30).stroke_width(1),
        )))
        .map_err(plot_err)?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────
// 收敛扫描
// ─────────────────────────────────────────────────────────────

/// 绘制扫描表的总能量曲线
pub fn plot_convergence(
    summary: &ScanSummary,
    x_desc: &str,
    output_path: &Path,
    title: &str,
    format: PlotFormat,
) -> Result<()> {
    if summary.rows.is_empty() {
        return Err(GpawFlowError::InvalidArgument(
            "convergence table has no rows to plot".to_string(),
        ));
    }
    match format {
        PlotFormat::Svg => {
            let root = SVGBackend::new(output_path, SIZE).into_drawing_area();
            draw_convergence_chart(&root, summary, x_desc, title)?;
            root.present().map_err(plot_err)?;
        }
        PlotFormat::Png => {
            let root = BitMapBackend::new(output_path, SIZE).into_drawing_area();
            draw_convergence_chart(&root, summary, x_desc, title)?;
            root.present().map_err(plot_err)?;
        }
    }
    Ok(())
}

fn draw_convergence_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    summary: &ScanSummary,
    x_desc: &str,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let e_min = summary.rows.iter().map(|r| r.energy).fold(f64::INFINITY, f64::min);
    let e_max = summary.rows.iter().map(|r| r.energy).fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = padded(e_min, e_max);
    let x_max = (summary.rows.len() as f64 - 0.5).max(0.5);
    let labels: Vec<&str> = summary.rows.iter().map(|r| r.label.as_str()).collect();

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Total energy (eV)")
        .x_labels(labels.len())
        .x_label_formatter(&|x| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 {
                labels.get(i as usize).map(|s| s.to_string()).unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_label_style(("sans-serif", 14))
        .y_label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    let points: Vec<(f64, f64)> = summary
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.energy))
        .collect();

    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(points.iter().copied(), line_color.stroke_width(2)))
        .map_err(plot_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 4, line_color.filled())),
        )
        .map_err(plot_err)?;

    if let Some(i) = summary.converged {
        chart
            .draw_series(std::iter::once(Circle::new(
                points[i],
                7,
                RGBColor(200, 30, 30).stroke_width(2),
            )))
            .map_err(plot_err)?;
    }

    Ok(())
}
