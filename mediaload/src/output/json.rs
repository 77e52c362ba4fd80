use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use mediaload_core::runner::{
    Params, ProgressFn, ProgressUpdate, RunReport, SuiteReport, SuiteRow, TesterReport, TrackRow,
};
use mediaload_stats::{Summary, TotalSummary};

use super::{Mode, OutputFormatter};

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _params: &Params, _mode: Mode) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |u: ProgressUpdate| {
            let line = build_progress_line(&u);
            emit_json_line(&line);
        }))
    }

    fn print_report(&self, report: &RunReport) -> anyhow::Result<()> {
        let line = build_report_line(report);
        emit_json_line(&line);
        Ok(())
    }

    fn print_suite_row(&self, row: &SuiteRow) {
        emit_json_line(&build_suite_case_line(row));
    }

    fn print_suite_end(&self, report: &SuiteReport) -> anyhow::Result<()> {
        let line = JsonSuiteLine {
            kind: "suite",
            cases: report.rows.len(),
            cancelled: report.cancelled,
            error: report.error.as_ref().map(ToString::to_string),
        };
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub phase: &'static str,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admitted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<u64>,
}

fn build_progress_line(u: &ProgressUpdate) -> JsonProgressLine {
    let empty = JsonProgressLine {
        kind: "progress",
        phase: "",
        elapsed_secs: 0.0,
        admitted: None,
        total: None,
        rate_per_sec: None,
        duration_secs: None,
        sessions: None,
    };

    match *u {
        ProgressUpdate::Admitting {
            admitted,
            total,
            elapsed,
            rate,
        } => JsonProgressLine {
            phase: "admitting",
            elapsed_secs: elapsed.as_secs_f64(),
            admitted: Some(admitted),
            total: Some(total),
            rate_per_sec: rate.is_finite().then_some(rate),
            ..empty
        },
        ProgressUpdate::Running {
            elapsed,
            duration,
            sessions,
        } => JsonProgressLine {
            phase: "running",
            elapsed_secs: elapsed.as_secs_f64(),
            duration_secs: duration.map(|d| d.as_secs_f64()),
            sessions: Some(sessions),
            ..empty
        },
        ProgressUpdate::Stopping { sessions } => JsonProgressLine {
            phase: "stopping",
            sessions: Some(sessions),
            ..empty
        },
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummary {
    pub tracks: u64,
    pub expected_tracks: u64,
    pub packets: u64,
    pub bytes: u64,
    pub bitrate_bps: f64,
    pub latency_ns: Option<u64>,
    pub dropped: u64,
    pub drop_pct: Option<f64>,
    pub elapsed_secs: f64,
}

impl From<&Summary> for JsonSummary {
    fn from(s: &Summary) -> Self {
        Self {
            tracks: s.tracks,
            expected_tracks: s.expected,
            packets: s.packets,
            bytes: s.bytes,
            bitrate_bps: s.bitrate_bps(),
            latency_ns: s.avg_latency().map(|d| d.as_nanos() as u64),
            dropped: s.dropped,
            drop_pct: s.drop_ratio().map(|r| r * 100.0),
            elapsed_secs: s.elapsed.as_secs_f64(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonTrack {
    pub name: String,
    pub track_id: String,
    pub kind: String,
    #[serde(flatten)]
    pub summary: JsonSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonTester {
    pub name: String,
    pub tracks: Vec<JsonTrack>,
    pub summary: JsonSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonTotal {
    pub testers: u64,
    pub avg_bitrate_bps: f64,
    #[serde(flatten)]
    pub summary: JsonSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonReportLine {
    pub kind: &'static str,
    pub room: String,
    pub testers: Vec<JsonTester>,
    pub total: Option<JsonTotal>,
}

fn build_report_line(report: &RunReport) -> JsonReportLine {
    JsonReportLine {
        kind: "report",
        room: report.room.clone(),
        testers: report.testers.iter().map(build_tester).collect(),
        total: report.total.as_ref().map(build_total),
    }
}

fn build_tester(t: &TesterReport) -> JsonTester {
    JsonTester {
        name: t.name.clone(),
        tracks: t.tracks.iter().map(build_track).collect(),
        summary: (&t.summary).into(),
    }
}

fn build_track(t: &TrackRow) -> JsonTrack {
    JsonTrack {
        name: t.name.clone(),
        track_id: t.track_id.to_string(),
        kind: t.kind.to_string(),
        summary: (&t.summary).into(),
    }
}

fn build_total(t: &TotalSummary) -> JsonTotal {
    JsonTotal {
        testers: t.testers,
        avg_bitrate_bps: t.avg_bitrate_bps(),
        summary: (&t.summary).into(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSuiteCaseLine {
    pub kind: &'static str,
    pub publishers: usize,
    pub subscribers: usize,
    pub audio: bool,
    pub video: bool,
    pub expected_tracks: u64,
    pub tracks: u64,
    pub packets: u64,
    pub dropped: u64,
    pub loss_pct: Option<f64>,
}

fn build_suite_case_line(row: &SuiteRow) -> JsonSuiteCaseLine {
    JsonSuiteCaseLine {
        kind: "suite_case",
        publishers: row.case.publishers,
        subscribers: row.case.subscribers,
        audio: row.audio,
        video: row.video,
        expected_tracks: row.expected_tracks,
        tracks: row.tracks,
        packets: row.packets,
        dropped: row.dropped,
        loss_pct: row.loss_pct(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSuiteLine {
    pub kind: &'static str,
    pub cases: usize,
    pub cancelled: bool,
    pub error: Option<String>,
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
