use std::fmt::Write as _;

use mediaload_core::runner::{RunReport, SuiteReport, SuiteRow, TesterReport};
use mediaload_stats::{
    Summary, UNAVAILABLE, format_bitrate, format_bps, format_latency_and_dropped,
};

use super::format::{format_duration, format_flag};
use crate::output::suite_loss;

pub(crate) fn render(report: &RunReport) -> String {
    let mut out = String::new();
    writeln!(&mut out, "room: {}", report.room).ok();

    if report.testers.is_empty() {
        out.push_str("summary: no subscribers\n");
        return out;
    }
    out.push('\n');

    for tester in &report.testers {
        render_tester(tester, &mut out);
        out.push('\n');
    }

    if let Some(total) = &report.total {
        let s = &total.summary;
        let (latency, dropped) = format_latency_and_dropped(s);
        writeln!(&mut out, "total ({} subscribers)", total.testers).ok();
        writeln!(&mut out, "  tracks: {}/{}", s.tracks, s.expected).ok();
        writeln!(&mut out, "  packets: {}", s.packets).ok();
        writeln!(
            &mut out,
            "  bitrate: {} (avg per subscriber {})",
            format_bitrate(s.bytes, s.elapsed),
            format_bps(total.avg_bitrate_bps())
        )
        .ok();
        writeln!(&mut out, "  latency: {latency}").ok();
        writeln!(&mut out, "  dropped: {dropped}").ok();
        writeln!(&mut out, "  elapsed: {}", format_duration(s.elapsed)).ok();
    }

    out
}

fn render_tester(tester: &TesterReport, out: &mut String) {
    writeln!(
        out,
        "{}: tracks {}/{}",
        tester.name, tester.summary.tracks, tester.summary.expected
    )
    .ok();

    if tester.tracks.is_empty() {
        out.push_str("  no tracks received\n");
        return;
    }

    writeln!(
        out,
        "  {:<6} {:<12} {:<6} {:>9} {:>11} {:>10}  dropped",
        "track", "id", "kind", "packets", "bitrate", "latency"
    )
    .ok();
    for track in &tester.tracks {
        let name = if track.name.is_empty() {
            UNAVAILABLE
        } else {
            track.name.as_str()
        };
        row(
            out,
            name,
            &track.track_id,
            &track.kind.to_string(),
            &track.summary,
        );
    }
    row(out, "all", "", "", &tester.summary);
}

fn row(out: &mut String, name: &str, id: &str, kind: &str, s: &Summary) {
    let (latency, dropped) = format_latency_and_dropped(s);
    writeln!(
        out,
        "  {name:<6} {id:<12} {kind:<6} {:>9} {:>11} {latency:>10}  {dropped}",
        s.packets,
        format_bitrate(s.bytes, s.elapsed),
    )
    .ok();
}

pub(crate) fn suite_header() -> String {
    format!(
        "{:>5} {:>5} {:>7} {:>5} {:>5} {:>10} {:>8} {:>8}",
        "pubs", "subs", "tracks", "audio", "video", "packets", "dropped", "loss%"
    )
}

pub(crate) fn suite_row(row: &SuiteRow) -> String {
    format!(
        "{:>5} {:>5} {:>7} {:>5} {:>5} {:>10} {:>8} {:>8}",
        row.case.publishers,
        row.case.subscribers,
        row.tracks,
        format_flag(row.audio),
        format_flag(row.video),
        row.packets,
        row.dropped,
        suite_loss(row)
    )
}

pub(crate) fn suite_footer(report: &SuiteReport) -> String {
    let mut out = String::new();
    writeln!(&mut out, "{} cases completed", report.rows.len()).ok();
    if report.cancelled {
        out.push_str("suite interrupted, remaining cases skipped\n");
    }
    out
}
