//! Text table and chart input for analytics rows

use super::stats::StatsRow;
use crate::chart::{ChartInput, ChartPoint, Metric, PanelSpec, ValueFormat};

/// Two significant digits in `%g` style, at least one decimal for whole
/// numbers, `n/a` when missing
///
/// `12.0 -> "12.0"`, `0.456 -> "0.46"`, `150.0 -> "1.5e+02"`.
pub fn format_sig2(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "n/a".to_string();
    };
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0.0".to_string();
    }

    // Exponent after rounding to two significant digits
    let scientific = format!("{value:.1e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if !(-4..2).contains(&exponent) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let decimals = (1 - exponent) as usize;
    let fixed = trim_fraction(&format!("{value:.decimals$}"));
    if fixed.contains('.') {
        fixed
    } else {
        format!("{value:.1}")
    }
}

fn trim_fraction(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

/// Fixed-width table: model, average percentile, normalized delay, cost
pub fn format_table(rows: &[StatsRow]) -> String {
    let header = format!(
        "{:<35} {:>8} {:>10} {:>15}",
        "Model", "AvgPct", "NormDelay", "AvgCost(cents)"
    );
    let mut lines = vec![header.clone(), "-".repeat(header.len())];
    for row in rows {
        let cents = row.avg_cost.map(|cost| cost * 100.0);
        lines.push(format!(
            "{:<35} {:>8} {:>10} {:>15}",
            row.model,
            format_sig2(row.avg_percentile),
            format_sig2(row.norm_delay),
            format_sig2(cents),
        ));
    }
    lines.join("\n")
}

/// Chart input with x = average percentile; rows without one are left out
pub fn chart_input(rows: &[StatsRow]) -> ChartInput {
    let points = rows
        .iter()
        .filter_map(|row| {
            Some(ChartPoint {
                model: row.model.clone(),
                rank: row.avg_percentile?,
                delay: row.norm_delay,
                cost: row.avg_cost.map(|cost| cost * 100.0),
            })
        })
        .collect();

    let x_label = "Average percentile (lower is better)";
    ChartInput::new(points).with_panels(
        PanelSpec::new(Metric::Delay, "Delay vs. percentile", ValueFormat::Ratio)
            .with_x_label(x_label)
            .with_y_label("Normalized delay")
            .with_missing_label("No delay data"),
        PanelSpec::new(Metric::Cost, "Cost vs. percentile (cents)", ValueFormat::Cents)
            .with_x_label(x_label)
            .with_y_label("Average cost (cents)")
            .with_missing_label("No cost data"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sig2_matches_g_style() {
        let cases = [
            (None, "n/a"),
            (Some(0.0), "0.0"),
            (Some(12.0), "12.0"),
            (Some(12.3), "12.3"),
            (Some(5.0), "5.0"),
            (Some(9.96), "10.0"),
            (Some(0.456), "0.46"),
            (Some(0.5), "0.5"),
            (Some(0.00012), "0.00012"),
            (Some(0.000012), "1.2e-05"),
            (Some(150.0), "1.5e+02"),
            (Some(100.0), "1e+02"),
            (Some(99.6), "1e+02"),
            (Some(-3.0), "-3.0"),
        ];
        for (value, expected) in cases {
            assert_eq!(format_sig2(value), expected, "formatting {value:?}");
        }
    }

    #[test]
    fn test_table_layout() {
        let rows = vec![
            StatsRow {
                model: "openai/gpt-5.1".into(),
                avg_percentile: Some(25.0),
                norm_delay: Some(1.5),
                avg_cost: Some(0.012),
            },
            StatsRow {
                model: "x-ai/grok-4".into(),
                avg_percentile: None,
                norm_delay: None,
                avg_cost: None,
            },
        ];
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), 35 + 1 + 8 + 1 + 10 + 1 + 15);
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[1].len(), lines[0].len());
        assert!(lines[2].starts_with("openai/gpt-5.1"));
        assert!(lines[2].ends_with("1.2"));
        assert!(lines[2].contains(" 25.0 "));
        assert!(lines[3].ends_with("n/a"));
    }

    #[test]
    fn test_chart_input_skips_rows_without_percentile() {
        let rows = vec![
            StatsRow {
                model: "a/one".into(),
                avg_percentile: Some(0.0),
                norm_delay: Some(1.0),
                avg_cost: Some(0.02),
            },
            StatsRow {
                model: "b/two".into(),
                avg_percentile: None,
                norm_delay: Some(2.0),
                avg_cost: None,
            },
        ];
        let input = chart_input(&rows);
        assert_eq!(input.points.len(), 1);
        assert_eq!(input.points[0].cost, Some(2.0));
        assert_eq!(input.panels[0].format, ValueFormat::Ratio);
        assert_eq!(input.panels[1].missing_label, "No cost data");
    }
}
