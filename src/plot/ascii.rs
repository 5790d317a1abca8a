//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - monthly history: `*` line
//! - forecast: `+` line, continuing from the last historical month
//! - confidence band: `:` between the lower and upper bound of each forecast month

use crate::domain::{ForecastResult, MonthlySeries};

/// Render history and forecast on one month axis.
pub fn render_forecast_plot(
    history: &MonthlySeries,
    forecast: &ForecastResult,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let n_hist = history.len();
    let n_total = n_hist + forecast.len();
    let x_max = n_total.saturating_sub(1).max(1) as f64;

    let values = history.values();
    let (y_min, y_max) = y_range(&values, forecast).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let cell = |i: usize, y: f64| {
        (
            map_x(i as f64, x_max, width),
            map_y(y, y_min, y_max, height),
        )
    };

    let hist_cells: Vec<(usize, usize)> =
        values.iter().enumerate().map(|(i, &y)| cell(i, y)).collect();
    draw_series(&mut grid, &hist_cells, '*');

    // The forecast line starts at the last observed month so the two connect.
    let mut fc_cells: Vec<(usize, usize)> = hist_cells.last().copied().into_iter().collect();
    fc_cells.extend(
        forecast
            .steps
            .iter()
            .enumerate()
            .map(|(h, s)| cell(n_hist + h, s.predicted)),
    );
    draw_series(&mut grid, &fc_cells, '+');

    for (h, s) in forecast.steps.iter().enumerate() {
        let (x, top) = cell(n_hist + h, s.upper);
        let (_, bottom) = cell(n_hist + h, s.lower);
        for row in grid.iter_mut().take(bottom + 1).skip(top) {
            if row[x] == ' ' {
                row[x] = ':';
            }
        }
    }

    let first = history.first_month();
    let last = forecast
        .steps
        .last()
        .map(|s| s.month)
        .or_else(|| history.last_month());

    let mut out = String::new();
    match (first, last) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Plot: months=[{}, {}] | sales=[{y_min:.2}, {y_max:.2}]\n",
            first.format("%Y-%m"),
            last.format("%Y-%m")
        )),
        _ => out.push_str(&format!("Plot: sales=[{y_min:.2}, {y_max:.2}]\n")),
    }

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn y_range(values: &[f64], forecast: &ForecastResult) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let band = forecast
        .steps
        .iter()
        .flat_map(|s| [s.lower, s.predicted, s.upper]);
    for y in values.iter().copied().chain(band) {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(i: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = (i / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], cells: &[(usize, usize)], ch: char) {
    match cells {
        [] => {}
        [(x, y)] => {
            if grid[*y][*x] == ' ' {
                grid[*y][*x] = ch;
            }
        }
        _ => {
            for pair in cells.windows(2) {
                let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
                draw_line(grid, x0, y0, x1, y1, ch);
            }
        }
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastStep, MonthlyPoint};
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let history = MonthlySeries::from_points(vec![
            MonthlyPoint { month: ymd(2024, 10), total: 10.0 },
            MonthlyPoint { month: ymd(2024, 11), total: 20.0 },
            MonthlyPoint { month: ymd(2024, 12), total: 30.0 },
        ])
        .unwrap();
        let forecast = ForecastResult {
            steps: vec![
                ForecastStep { month: ymd(2025, 1), predicted: 40.0, lower: 35.0, upper: 45.0 },
                ForecastStep { month: ymd(2025, 2), predicted: 50.0, lower: 40.0, upper: 60.0 },
            ],
            confidence_level: 0.95,
        };

        let txt = render_forecast_plot(&history, &forecast, 10, 5);
        let expected = concat!(
            "Plot: months=[2024-10, 2025-02] | sales=[7.50, 62.50]\n",
            "         :\n",
            "       :++\n",
            "    **++ :\n",
            " ***      \n",
            "*         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_inputs_render_blank_grid() {
        let history = MonthlySeries::default();
        let forecast = ForecastResult { steps: vec![], confidence_level: 0.95 };
        let txt = render_forecast_plot(&history, &forecast, 10, 5);
        assert!(txt.starts_with("Plot: sales=[-0.05, 1.05]\n"));
        assert_eq!(txt.lines().count(), 6);
    }

    #[test]
    fn flat_series_still_plots() {
        let history = MonthlySeries::from_points(vec![
            MonthlyPoint { month: ymd(2024, 1), total: 5.0 },
            MonthlyPoint { month: ymd(2024, 2), total: 5.0 },
        ])
        .unwrap();
        let forecast = ForecastResult { steps: vec![], confidence_level: 0.95 };
        let txt = render_forecast_plot(&history, &forecast, 10, 5);
        assert!(txt.contains('*'));
    }
}
