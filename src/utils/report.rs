use std::fmt::Write as FmtWrite;
use std::path::Path;

use chrono::NaiveDate;

use crate::commands::WatchlistReport;
use crate::engine::indicators::{RsiZone, RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::errors::AppError;
use crate::models::metrics::METRICS_COLUMNS;
use crate::models::series::{IndicatorSeries, ReturnMatrix};

use super::format::{
    format_axis, format_market_cap, format_price, format_ratio, summary_cards, NOT_AVAILABLE,
};

pub const REPORT_FILE_NAME: &str = "watchlist_report.html";

const CHART_W: f64 = 900.0;
const PAD_LEFT: f64 = 60.0;
const PAD_RIGHT: f64 = 10.0;
const PAD_TOP: f64 = 16.0;
const PAD_BOTTOM: f64 = 22.0;

const RED: (u8, u8, u8) = (239, 68, 68);
const YELLOW: (u8, u8, u8) = (234, 179, 8);
const GREEN: (u8, u8, u8) = (34, 197, 94);

/// Write the full HTML report with inline CSS and SVG charts.
pub fn write_report_html(report: &WatchlistReport, path: &Path) -> Result<(), AppError> {
    let html = render_report_html(report);
    std::fs::write(path, html)
        .map_err(|e| AppError::FileWrite(format!("Cannot create HTML: {}", e)))
}

pub fn render_report_html(report: &WatchlistReport) -> String {
    let mut html = String::with_capacity(128 * 1024);

    // ── HTML head ──
    write!(html, r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Stock Watchlist</title>
<style>
:root {{
  --bg: #09090b; --card: #18181b; --border: #27272a; --fg: #fafafa;
  --muted: #a1a1aa; --green: #22c55e; --red: #ef4444; --blue: #3b82f6;
  --amber: #f59e0b;
}}
* {{ margin:0; padding:0; box-sizing:border-box; }}
body {{ background:var(--bg); color:var(--fg); font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif; padding:24px; max-width:1200px; margin:0 auto; }}
h1 {{ font-size:1.5rem; margin-bottom:8px; }}
h3 {{ font-size:0.95rem; margin-bottom:12px; }}
h4 {{ font-size:0.8rem; color:var(--muted); margin:12px 0 6px; font-weight:500; }}
.timestamp {{ color:var(--muted); font-size:0.8rem; margin-bottom:24px; }}
.card {{ background:var(--card); border:1px solid var(--border); border-radius:8px; padding:16px; margin-bottom:16px; }}
.alert {{ border-color:var(--amber); }}
.alert li {{ font-size:0.8rem; margin-left:16px; color:var(--amber); }}
.metrics-grid {{ display:grid; grid-template-columns:repeat(auto-fill,minmax(220px,1fr)); gap:8px; }}
.metric {{ background:var(--bg); border:1px solid var(--border); border-radius:6px; padding:10px; }}
.metric-label {{ font-size:0.7rem; color:var(--muted); text-transform:uppercase; letter-spacing:0.05em; }}
.metric-value {{ font-size:1.1rem; font-weight:600; margin-top:2px; }}
.chart-container {{ width:100%; overflow-x:auto; }}
.zone {{ font-size:0.75rem; color:var(--muted); font-weight:400; }}
svg {{ display:block; }}
table {{ width:100%; border-collapse:collapse; font-size:0.8rem; }}
th {{ background:var(--bg); color:var(--muted); text-align:left; padding:6px 8px; border-bottom:1px solid var(--border); font-weight:500; text-transform:uppercase; font-size:0.65rem; letter-spacing:0.05em; }}
td {{ padding:6px 8px; border-bottom:1px solid var(--border); }}
td.num {{ text-align:right; font-variant-numeric:tabular-nums; }}
tr:hover td {{ background:rgba(255,255,255,0.02); }}
</style>
</head>
<body>
<h1>Stock Watchlist</h1>
<p class="timestamp">Generated: {}</p>
"#, report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")).ok();

    // ── Failures and warnings ──
    if !report.failures.is_empty() || !report.warnings.is_empty() {
        html.push_str(r#"<div class="card alert"><h3>Warnings</h3><ul>"#);
        for f in &report.failures {
            write!(html, "<li>Error fetching {}: {}</li>", escape_html(f.ticker.as_str()), escape_html(&f.message)).ok();
        }
        for w in &report.warnings {
            write!(html, "<li>{}</li>", escape_html(w)).ok();
        }
        html.push_str("</ul></div>");
    }

    // ── Summary ──
    html.push_str(r#"<div class="card"><h3>Summary</h3><div class="metrics-grid">"#);
    for (label, value) in summary_cards(&report.summary) {
        write!(html, r#"<div class="metric"><div class="metric-label">{}</div><div class="metric-value">{}</div></div>"#, label, value).ok();
    }
    html.push_str("</div></div>");

    // ── Metrics table ──
    html.push_str(r#"<div class="card"><h3>Metrics</h3><div style="overflow-x:auto">"#);
    html.push_str("<table><thead><tr>");
    for h in METRICS_COLUMNS {
        write!(html, "<th>{}</th>", h).ok();
    }
    html.push_str("</tr></thead><tbody>");
    for row in report.table.rows() {
        let name = row.name.as_deref().map(escape_html).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        write!(html, r#"<tr><td>{}</td><td>{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{}</td></tr>"#,
            escape_html(row.ticker.as_str()), name,
            format_price(row.price), format_market_cap(row.market_cap),
            format_price(row.high_52w), format_price(row.low_52w),
            format_ratio(row.trailing_pe)
        ).ok();
    }
    html.push_str("</tbody></table></div></div>");

    // ── Returns heatmap ──
    html.push_str(r#"<div class="card"><h3>Daily Returns (%)</h3><div class="chart-container">"#);
    if report.returns.is_empty() {
        html.push_str(r#"<p class="zone">Not enough overlapping price history.</p>"#);
    } else {
        write_heatmap_svg(&mut html, &report.returns);
    }
    html.push_str("</div></div>");

    // ── Per-ticker indicators ──
    for series in &report.indicators {
        write_indicator_card(&mut html, series);
    }

    html.push_str(r#"<p style="text-align:center;color:var(--muted);font-size:0.7rem;margin-top:24px;">Generated by watchlist</p>"#);
    html.push_str("</body></html>");
    html
}

fn write_indicator_card(html: &mut String, series: &IndicatorSeries) {
    let latest = series.latest();
    let zone = latest
        .rsi
        .map(|v| format!("RSI {:.2} ({})", v, RsiZone::classify(v).label()))
        .unwrap_or_else(|| format!("RSI {}", NOT_AVAILABLE));
    write!(html, r#"<div class="card"><h3>{} <span class="zone">{} &middot; close {}</span></h3><div class="chart-container">"#,
        escape_html(series.ticker.as_str()), zone, format_price(latest.close)).ok();

    if series.is_empty() {
        html.push_str(r#"<p class="zone">No price history.</p></div></div>"#);
        return;
    }

    let close: Vec<Option<f64>> = series.close.iter().map(|v| Some(*v)).collect();

    html.push_str("<h4>Price</h4>");
    write_line_chart(html, &series.dates, &ChartOptions {
        lines: &[
            Line { label: "Close", values: &close, color: "#3b82f6" },
            Line { label: "SMA fast", values: &series.sma_fast, color: "#f59e0b" },
            Line { label: "SMA slow", values: &series.sma_slow, color: "#a855f7" },
        ],
        bars: None,
        guides: &[],
        bounds: None,
        height: 240.0,
    });

    html.push_str("<h4>RSI</h4>");
    write_line_chart(html, &series.dates, &ChartOptions {
        lines: &[Line { label: "RSI", values: &series.rsi, color: "#22c55e" }],
        bars: None,
        guides: &[(RSI_OVERBOUGHT, "#ef4444"), (RSI_OVERSOLD, "#22c55e")],
        bounds: Some((0.0, 100.0)),
        height: 140.0,
    });

    html.push_str("<h4>MACD</h4>");
    write_line_chart(html, &series.dates, &ChartOptions {
        lines: &[
            Line { label: "MACD", values: &series.macd, color: "#3b82f6" },
            Line { label: "Signal", values: &series.signal, color: "#f59e0b" },
        ],
        bars: Some(series.histogram.as_slice()),
        guides: &[(0.0, "#52525b")],
        bounds: None,
        height: 160.0,
    });

    html.push_str("</div></div>");
}

struct Line<'a> {
    label: &'a str,
    values: &'a [Option<f64>],
    color: &'a str,
}

struct ChartOptions<'a> {
    lines: &'a [Line<'a>],
    /// Histogram bars drawn from zero, green above and red below.
    bars: Option<&'a [Option<f64>]>,
    /// Dashed horizontal reference lines.
    guides: &'a [(f64, &'a str)],
    /// Fixed y range; otherwise fitted to the data.
    bounds: Option<(f64, f64)>,
    height: f64,
}

/// Render a multi-line SVG chart. `None` values break the line.
fn write_line_chart(html: &mut String, dates: &[NaiveDate], chart: &ChartOptions) {
    let n = dates.len();
    if n == 0 {
        return;
    }

    let h = chart.height;
    let chart_w = CHART_W - PAD_LEFT - PAD_RIGHT;
    let chart_h = h - PAD_TOP - PAD_BOTTOM;

    let (min_v, max_v) = chart.bounds.unwrap_or_else(|| {
        let present = chart
            .lines
            .iter()
            .flat_map(|l| l.values.iter())
            .chain(chart.bars.into_iter().flatten())
            .filter_map(|v| *v)
            .chain(chart.guides.iter().map(|(g, _)| *g));
        present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    });
    if !min_v.is_finite() || !max_v.is_finite() {
        return;
    }
    let range = if max_v > min_v { max_v - min_v } else { 1.0 };

    let x_step = chart_w / (n as f64 - 1.0).max(1.0);
    let x_at = |i: usize| PAD_LEFT + x_step * i as f64;
    let y_at = |v: f64| PAD_TOP + chart_h * (1.0 - (v - min_v) / range);

    write!(html, r##"<svg width="100%" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg" style="max-width:{}px">"##, CHART_W, h, CHART_W as i64).ok();

    // Grid
    for i in 0..5 {
        let frac = i as f64 / 4.0;
        let y = PAD_TOP + chart_h * frac;
        let val = max_v - range * frac;
        write!(html, r##"<line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="#27272a" stroke-dasharray="3,3"/>"##, PAD_LEFT, y, CHART_W - PAD_RIGHT, y).ok();
        write!(html, r##"<text x="{}" y="{:.1}" fill="#a1a1aa" font-size="10" text-anchor="end">{}</text>"##, PAD_LEFT - 4.0, y + 3.0, format_axis(val)).ok();
    }

    // Date axis
    write!(html, r##"<text x="{}" y="{}" fill="#a1a1aa" font-size="10">{}</text>"##, PAD_LEFT, h - 6.0, dates[0]).ok();
    write!(html, r##"<text x="{}" y="{}" fill="#a1a1aa" font-size="10" text-anchor="end">{}</text>"##, CHART_W - PAD_RIGHT, h - 6.0, dates[n - 1]).ok();

    for (level, color) in chart.guides {
        let y = y_at(*level);
        write!(html, r##"<line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="{}" stroke-dasharray="5,4" stroke-opacity="0.8"/>"##, PAD_LEFT, y, CHART_W - PAD_RIGHT, y, color).ok();
    }

    if let Some(bars) = chart.bars {
        let y0 = y_at(0.0_f64.clamp(min_v, max_v));
        let bar_w = (x_step * 0.8).max(1.0);
        for (i, v) in bars.iter().enumerate() {
            let Some(v) = v else { continue };
            let y = y_at(*v);
            let color = if *v >= 0.0 { "#22c55e" } else { "#ef4444" };
            write!(html, r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="0.5"/>"##,
                x_at(i) - bar_w / 2.0, y.min(y0), bar_w, (y - y0).abs(), color).ok();
        }
    }

    for line in chart.lines {
        let mut path = String::with_capacity(line.values.len() * 16);
        let mut pen_up = true;
        for (i, v) in line.values.iter().enumerate() {
            match v {
                Some(v) => {
                    let cmd = if pen_up { "M" } else { "L" };
                    if !path.is_empty() {
                        path.push(' ');
                    }
                    write!(path, "{}{:.1},{:.1}", cmd, x_at(i), y_at(*v)).ok();
                    pen_up = false;
                }
                None => pen_up = true,
            }
        }
        if !path.is_empty() {
            write!(html, r##"<path d="{}" fill="none" stroke="{}" stroke-width="1.5"/>"##, path, line.color).ok();
        }
    }

    // Legend
    let mut lx = PAD_LEFT + 8.0;
    for line in chart.lines {
        write!(html, r##"<rect x="{:.1}" y="4" width="10" height="3" fill="{}"/><text x="{:.1}" y="9" fill="#a1a1aa" font-size="9">{}</text>"##,
            lx, line.color, lx + 14.0, line.label).ok();
        lx += 20.0 + line.label.len() as f64 * 6.0;
    }

    html.push_str("</svg>");
}

/// Render the returns matrix as a ticker × date grid of colored cells.
fn write_heatmap_svg(html: &mut String, matrix: &ReturnMatrix) {
    let rows = matrix.tickers.len();
    let cols = matrix.dates.len();
    if rows == 0 || cols == 0 {
        return;
    }

    let cell_h = 22.0;
    let chart_w = CHART_W - PAD_LEFT - PAD_RIGHT;
    let cell_w = chart_w / cols as f64;
    let h = PAD_TOP + cell_h * rows as f64 + PAD_BOTTOM;
    let scale = matrix.max_abs();

    write!(html, r##"<svg width="100%" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg" style="max-width:{}px">"##, CHART_W, h, CHART_W as i64).ok();

    for (r, (ticker, values)) in matrix.tickers.iter().zip(&matrix.values).enumerate() {
        let ticker = escape_html(ticker.as_str());
        let y = PAD_TOP + cell_h * r as f64;
        write!(html, r##"<text x="{}" y="{:.1}" fill="#a1a1aa" font-size="10" text-anchor="end">{}</text>"##, PAD_LEFT - 4.0, y + cell_h / 2.0 + 3.0, ticker).ok();
        for (c, (date, v)) in matrix.dates.iter().zip(values).enumerate() {
            write!(html, r##"<rect x="{:.2}" y="{:.1}" width="{:.2}" height="{:.1}" fill="{}"><title>{} {}: {:.2}%</title></rect>"##,
                PAD_LEFT + cell_w * c as f64, y, cell_w, cell_h - 1.0, heat_color(*v, scale), ticker, date, v).ok();
        }
    }

    let axis_y = h - 6.0;
    write!(html, r##"<text x="{}" y="{}" fill="#a1a1aa" font-size="10">{}</text>"##, PAD_LEFT, axis_y, matrix.dates[0]).ok();
    write!(html, r##"<text x="{}" y="{}" fill="#a1a1aa" font-size="10" text-anchor="end">{}</text>"##, CHART_W - PAD_RIGHT, axis_y, matrix.dates[cols - 1]).ok();
    write!(html, r##"<text x="{}" y="{}" fill="#a1a1aa" font-size="10" text-anchor="middle">scale &#177;{:.2}%</text>"##, CHART_W / 2.0, axis_y, scale).ok();

    html.push_str("</svg>");
}

/// Diverging red → yellow → green color centered at zero.
fn heat_color(value: f64, scale: f64) -> String {
    let t = if scale > 0.0 && value.is_finite() {
        (value / scale).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let (from, to, f) = if t < 0.0 { (YELLOW, RED, -t) } else { (YELLOW, GREEN, t) };
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
