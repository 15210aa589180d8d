use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::assembler::{Chart, Panel, Share, TopEntry};
use crate::error::EmptyReason;
use crate::refresh::Dashboard;

const NO_DATA: &str = "Keine Daten verfügbar";

/// Parse `#RRGGBB` into a terminal colour.
pub fn hex_to_rgb(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn write_colored(stream: &mut StandardStream, text: &str, color: Color) {
    let _ = stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(stream, "{}", text);
    let _ = stream.reset();
}

fn write_bold(stream: &mut StandardStream, text: &str) {
    let _ = stream.set_color(ColorSpec::new().set_bold(true));
    let _ = write!(stream, "{}", text);
    let _ = stream.reset();
}

fn write_empty(stream: &mut StandardStream, reason: EmptyReason) {
    let detail = match reason {
        EmptyReason::InvalidShape => "unrecognised payload",
        EmptyReason::MissingField => "field missing",
        EmptyReason::TransportFailure => "fetch failed",
    };
    write_colored(stream, &format!("    {NO_DATA}"), Color::Red);
    let _ = writeln!(stream, " ({detail})");
}

fn write_chart(out: &mut StandardStream, heading: &str, panel: Option<&Panel<Chart>>) {
    write_colored(out, &format!("  {heading}\n"), Color::Yellow);
    match panel {
        Some(Panel::Ready(chart)) => write_series(out, chart),
        Some(Panel::Empty(reason)) => write_empty(out, *reason),
        None => {
            let _ = writeln!(out, "    -");
        }
    }
    let _ = writeln!(out);
}

fn write_series(out: &mut StandardStream, chart: &Chart) {
    let series = &chart.series;
    if series.is_empty() {
        let _ = writeln!(out, "    -");
        return;
    }
    for ((label, value), color) in series
        .labels
        .iter()
        .zip(&series.values)
        .zip(&series.colors)
    {
        let _ = write!(out, "    ");
        match hex_to_rgb(color) {
            Some(rgb) => write_colored(out, "■", rgb),
            None => {
                let _ = write!(out, " ");
            }
        }
        let _ = writeln!(out, " {:<28} {:>12} {}", label, format_value(*value), color);
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn write_share(out: &mut StandardStream, label: &str, panel: Option<&Panel<Share>>) {
    write_bold(out, &format!("  {label}"));
    match panel {
        Some(Panel::Ready(share)) => {
            let _ = writeln!(out, "{}% ({})", share.percent, share.caption);
        }
        Some(Panel::Empty(_)) | None => {
            let _ = writeln!(out, "{NO_DATA}");
        }
    }
}

fn write_ranking(out: &mut StandardStream, heading: &str, panel: Option<&Panel<Vec<TopEntry>>>) {
    write_colored(out, &format!("  {heading}\n"), Color::Yellow);
    match panel {
        Some(Panel::Ready(entries)) => {
            for entry in entries {
                let _ = write!(out, "    ");
                let badge = format!("#{}", entry.rank);
                match hex_to_rgb(&entry.badge_color) {
                    Some(rgb) => write_colored(out, &badge, rgb),
                    None => write_bold(out, &badge),
                }
                let _ = writeln!(out, " {} ({})", entry.display_name, entry.display_metric);
            }
        }
        Some(Panel::Empty(reason)) => write_empty(out, *reason),
        None => {
            let _ = writeln!(out, "    -");
        }
    }
    let _ = writeln!(out);
}

pub fn print_dashboard(dashboard: &Dashboard) {
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let panels = dashboard.panels();

    write_colored(&mut out, "\n  Library Stats\n", Color::Cyan);
    if let Some(at) = dashboard.refreshed_at() {
        let _ = writeln!(
            out,
            "  refreshed {} (generation {})",
            at.format("%Y-%m-%d %H:%M:%S"),
            dashboard.generation()
        );
    }
    let _ = writeln!(out);

    match &panels.totals {
        Some(Panel::Ready(totals)) => {
            write_bold(&mut out, "  Animes:      ");
            let _ = writeln!(out, "{}", totals.animes);
            write_bold(&mut out, "  Staffeln:    ");
            let _ = writeln!(out, "{}", totals.seasons);
            write_bold(&mut out, "  Episoden:    ");
            let _ = writeln!(out, "{}", totals.episodes);
        }
        Some(Panel::Empty(reason)) => write_empty(&mut out, *reason),
        None => {}
    }

    if let Some(summary) = panels.storage_summary.as_ref().and_then(Panel::ready) {
        write_bold(&mut out, "  Gesamtgröße: ");
        let _ = writeln!(out, "{}", summary.total_size);
        write_bold(&mut out, "  Gesamtdauer: ");
        let _ = writeln!(out, "{}", summary.total_duration);
        if let Some(exact) = &summary.total_size_bytes {
            write_bold(&mut out, "  Bytes:       ");
            let _ = writeln!(out, "{}", exact.display);
        }
        if let Some(exact) = &summary.total_duration_ms {
            write_bold(&mut out, "  Laufzeit:    ");
            let _ = writeln!(out, "{}", exact.display);
        }
    }

    write_share(&mut out, "HDR:         ", panels.hdr_share.as_ref());
    write_share(&mut out, "4K:          ", panels.uhd_share.as_ref());
    let _ = writeln!(out);

    write_chart(&mut out, "Auflösung", panels.resolution.as_ref());
    write_chart(&mut out, "Codecs", panels.codec.as_ref());

    match &panels.hdr {
        Some(Panel::Ready(hdr)) => {
            write_chart(&mut out, "HDR", Some(&Panel::Ready(hdr.formats.clone())));
            if let Some(types) = &hdr.types {
                write_chart(&mut out, "HDR-Typen", Some(&Panel::Ready(types.clone())));
            }
        }
        Some(Panel::Empty(reason)) => write_chart(&mut out, "HDR", Some(&Panel::Empty(*reason))),
        None => write_chart(&mut out, "HDR", None),
    }

    write_chart(&mut out, "Container", panels.container.as_ref());

    match &panels.storage {
        Some(Panel::Ready(storage)) => {
            write_chart(&mut out, "Speicher (GB)", Some(&Panel::Ready(storage.chart.clone())));
            write_bold(&mut out, "  Speicher gesamt: ");
            let _ = writeln!(out, "{}", storage.total_size.display);
            let _ = writeln!(out);
        }
        Some(Panel::Empty(reason)) => {
            write_chart(&mut out, "Speicher (GB)", Some(&Panel::Empty(*reason)))
        }
        None => write_chart(&mut out, "Speicher (GB)", None),
    }

    write_ranking(&mut out, "Top Animes (Episoden)", panels.top_by_episodes.as_ref());
    write_ranking(&mut out, "Top Animes (Größe)", panels.top_by_size.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert!(matches!(hex_to_rgb("#6a0dad"), Some(Color::Rgb(0x6a, 0x0d, 0xad))));
        assert!(matches!(hex_to_rgb("#FFFFFF"), Some(Color::Rgb(255, 255, 255))));
        assert!(hex_to_rgb("6a0dad").is_none());
        assert!(hex_to_rgb("#fff").is_none());
        assert!(hex_to_rgb("#zzzzzz").is_none());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(1.5), "1.50");
    }
}
