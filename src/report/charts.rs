//! SVG chart rendering.
//!
//! Every renderer draws into an in-memory SVG document with plotters and
//! returns the markup, so the same output can be written to disk for the
//! batch report or inlined into the dashboard page. An empty input always
//! produces a titled placeholder chart instead of an error.

use crate::models::{Distribution, ProductTotal, Series, WordCount};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

/// Canvas size of every chart.
pub const CHART_SIZE: (u32, u32) = (960, 540);

/// Canvas size of word clouds.
pub const CLOUD_SIZE: (u32, u32) = (1000, 600);

const FONT: &str = "sans-serif";

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

fn color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// Draw the "no data" placeholder on an already created canvas.
fn draw_placeholder(root: &DrawingArea<SVGBackend, Shift>, title: &str) -> Result<()> {
    root.fill(&WHITE)?;
    let (w, h) = root.dim_in_pixel();
    root.draw(&Text::new(
        title.to_string(),
        (20, 20),
        (FONT, 24.0).into_font().color(&BLACK),
    ))?;
    root.draw(&Text::new(
        "No data for the selected filters",
        (w as i32 / 2 - 150, h as i32 / 2),
        (FONT, 18.0).into_font().color(&RGBColor(120, 120, 120)),
    ))?;
    root.present()?;
    Ok(())
}

/// A titled chart with no data.
pub fn empty_chart(title: &str, size: (u32, u32)) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_placeholder(&root, title)?;
    }
    Ok(svg)
}

/// Pie chart of a categorical distribution with percentage labels.
pub fn pie_chart(title: &str, dist: &Distribution) -> Result<String> {
    if dist.is_empty() || dist.total == 0 {
        return empty_chart(title, CHART_SIZE);
    }

    let sizes: Vec<f64> = dist.slices.iter().map(|s| s.count as f64).collect();
    let labels: Vec<&str> = dist.slices.iter().map(|s| s.label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..sizes.len()).map(color).collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(title, (FONT, 24.0).into_font())?;

        let (w, h) = root.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.38;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style((FONT, 16.0).into_font().color(&BLACK));
        pie.percentages((FONT, 14.0).into_font().color(&WHITE));
        root.draw(&pie)?;
        root.present()?;
    }
    Ok(svg)
}

/// Line chart with one line per series over a shared categorical x axis.
///
/// The x axis is the sorted union of every series' point labels, so
/// series with gaps simply skip the missing positions.
pub fn line_chart(title: &str, x_desc: &str, y_desc: &str, series: &[Series]) -> Result<String> {
    let x_labels: Vec<String> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(label, _)| label.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if x_labels.is_empty() {
        return empty_chart(title, CHART_SIZE);
    }

    let max = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(_, v)| *v))
        .max()
        .unwrap_or(0);
    let y_max = (max as f64 * 1.1).max(1.0);
    let x_max = (x_labels.len() as i32 - 1).max(1);
    let label_step = (x_labels.len() / 12).max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 24))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(0..x_max, 0f64..y_max)?;

        let format_x = |x: &i32| {
            let idx = *x as usize;
            if idx % label_step == 0 {
                x_labels.get(idx).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };
        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_labels(x_labels.len().min(60))
            .x_label_formatter(&format_x)
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        for (idx, s) in series.iter().enumerate() {
            let c = color(idx);
            let points: Vec<(i32, f64)> = s
                .points
                .iter()
                .filter_map(|(label, value)| {
                    let x = x_labels.binary_search(label).ok()?;
                    Some((x as i32, *value as f64))
                })
                .collect();

            chart.draw_series(
                points
                    .iter()
                    .map(|p| Circle::new(*p, 3, c.filled())),
            )?;
            chart
                .draw_series(LineSeries::new(points, c.stroke_width(2)))?
                .label(s.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
        }

        if series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }
        root.present()?;
    }
    Ok(svg)
}

/// Horizontal bar chart of product totals, first product on top.
pub fn hbar_chart(title: &str, products: &[ProductTotal]) -> Result<String> {
    if products.is_empty() {
        return empty_chart(title, CHART_SIZE);
    }

    let n = products.len() as i32;
    let max = products.iter().map(|p| p.total).max().unwrap_or(0);
    let x_max = (max as f64 * 1.05).max(1.0);
    let names: Vec<String> = products
        .iter()
        .map(|p| shorten(p.display_title(), 40))
        .collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(300)
            .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())?;

        let format_y = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(row) if (0..n).contains(row) => {
                names[(n - 1 - row) as usize].clone()
            }
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc("Review count")
            .y_labels(products.len())
            .y_label_formatter(&format_y)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()?;

        chart.draw_series(products.iter().enumerate().map(|(idx, p)| {
            let row = n - 1 - idx as i32;
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (p.total as f64, SegmentValue::Exact(row + 1)),
                ],
                color(0).filled(),
            );
            bar.set_margin(4, 4, 0, 0);
            bar
        }))?;
        root.present()?;
    }
    Ok(svg)
}

/// Word cloud laid out in rows, font size scaled by frequency.
///
/// Words arrive most frequent first; rows are filled left to right and
/// words that no longer fit on the canvas are dropped.
pub fn word_cloud(title: &str, words: &[WordCount]) -> Result<String> {
    if words.is_empty() {
        return empty_chart(title, CLOUD_SIZE);
    }

    let (width, _) = CLOUD_SIZE;
    let max = words.iter().map(|w| w.count).max().unwrap_or(1) as f64;
    let min = words.iter().map(|w| w.count).min().unwrap_or(1) as f64;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CLOUD_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(title, (FONT, 24.0).into_font())?;
        let (_, area_height) = root.dim_in_pixel();

        let mut x = 10i32;
        let mut y = 10i32;
        let mut row_height = 0i32;

        for (idx, word) in words.iter().enumerate() {
            let size = font_size(word.count as f64, min, max);
            let word_width = (size * 0.6 * word.word.len() as f64) as i32 + 12;
            let word_height = (size * 1.2) as i32;

            if x + word_width > width as i32 - 10 {
                x = 10;
                y += row_height;
                row_height = 0;
            }
            if y + word_height > area_height as i32 - 10 {
                break;
            }

            root.draw(&Text::new(
                word.word.as_str(),
                (x, y),
                (FONT, size).into_font().color(&color(idx)),
            ))?;
            x += word_width;
            row_height = row_height.max(word_height);
        }
        root.present()?;
    }
    Ok(svg)
}

fn font_size(count: f64, min: f64, max: f64) -> f64 {
    const SMALLEST: f64 = 12.0;
    const LARGEST: f64 = 72.0;
    if max <= min {
        return (SMALLEST + LARGEST) / 2.0;
    }
    SMALLEST + (count - min) / (max - min) * (LARGEST - SMALLEST)
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

/// Write rendered SVG markup to a file.
pub fn save_svg(svg: &str, path: &Path) -> Result<()> {
    std::fs::write(path, svg).with_context(|| format!("Failed to write chart {}", path.display()))
}
