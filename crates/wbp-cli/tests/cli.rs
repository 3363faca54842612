use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const GP1_PLAN: &str = "\
Work and Budget Plan Summary
(1) Meetings 40,000.00
(2) Training Schools 0.00
(3) Short-Term Scientific Missions 12,345.67
(4) ITC Conference Grants 2,000.00
(5) Dissemination and Communication Products 1,000.00
(6) Other Expenses Related to Scientific Activities 0.00
B. Total Science Expenditure 55,345.67
C. Financial and Scientific Administration and Coordination 8,301.85
Total Grant 63,647.52

Meetings
Title of the Meeting Kick-off
Meeting Type(s) Management Committee
Meeting location Warsaw / Poland
Start Date 12/01/2021
Total cost of the meeting (EUR) 20,000.00
";

const GP4_PLAN: &str = "\
A. COST Networking Tools
(1) Meetings 100,000.00
(2) Training Schools 30,000.00
(3) Mobility 20,000.00
(4) Presentation at Conferences 5,000.00
(5) Dissemination and Communication Products 3,000.00
(6) Other Expenses Related to Scientific Activities 2,000.00
B. Total Science Expenditure 160,000.00
C. Financial and Scientific Administration and Coordination 24,000.00
Total Grant (B+C) 184,000.00

Meetings
Title of the Meeting Plenary
Meeting Type(s) Working Group
Location Porto (Portugal) ITC Yes
Start Date 2023-03-01
End Date 2023-03-02
Total cost of the meeting (EUR) 45,000.00

Training Schools
Title of the Training School
Data Science
Location Riga (Latvia) ITC Yes
Start Date 2023-06-05
End Date 2023-06-09
Total number of expected trainers/trainees 6 20
Total cost of the Training School (EUR) 30,000.00
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("text")).unwrap();
        fs::write(dir.path().join("text/WBP-CA19130-1_ID2001.txt"), GP1_PLAN).unwrap();
        fs::write(dir.path().join("text/WBP-CA19130-4_ID3001.txt"), GP4_PLAN).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn out(&self, name: &str) -> std::path::PathBuf {
        self.path().join("out").join(name)
    }

    fn config(&self, periods: &[u8], reference: Value) -> String {
        let path = self.path().join("config.json");
        let config = json!({
            "sources": {
                "source_dir": self.path().join("text"),
                "grant_periods": periods,
            },
            "output": { "output_dir": self.path().join("out") },
            "verification": { "reference": reference },
        });
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn wbp(&self) -> Command {
        Command::cargo_bin("wbp").unwrap()
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn extract_writes_period_and_summary_files() {
    let ws = Workspace::new();
    let config = ws.config(&[1, 4], json!({}));

    ws.wbp()
        .args(["--config", &config, "extract", "--date", "2026-01-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GP1: 1 meetings, 0 training schools"))
        .stdout(predicate::str::contains("GP4: 1 meetings, 1 training schools"));

    let gp1 = read_json(&ws.out("wbp_gp1.json"));
    assert_eq!(gp1["budget_summary"]["stsm"], json!(12345.67));
    assert!(gp1["budget_summary"].get("mobility").is_none());
    assert_eq!(gp1["meetings"][0]["country"], json!("Poland"));
    assert_eq!(gp1["meetings"][0]["itc_country"], json!(true));
    assert_eq!(gp1["_metadata"]["extraction_date"], json!("2026-01-15"));

    let summary = read_json(&ws.out("wbp_summary.json"));
    assert_eq!(summary["total_meetings_planned"], json!(2));
    assert_eq!(summary["total_training_schools_planned"], json!(1));
    assert_eq!(summary["budgets_by_gp"]["GP1"]["mobility"], json!(12345.67));
    assert_eq!(summary["budgets_by_gp"]["GP4"]["mobility"], json!(20000.0));
    assert_eq!(summary["totals"]["total_grant"], json!(247647.52));
    assert_eq!(summary["missing_grant_periods"], json!([]));
}

#[test]
fn extract_is_idempotent() {
    let ws = Workspace::new();
    let config = ws.config(&[1, 4], json!({}));

    let run = || {
        ws.wbp()
            .args(["--config", &config, "extract", "--date", "2026-01-15"])
            .assert()
            .success();
        (
            fs::read(ws.out("wbp_gp1.json")).unwrap(),
            fs::read(ws.out("wbp_gp4.json")).unwrap(),
            fs::read(ws.out("wbp_summary.json")).unwrap(),
        )
    };

    assert_eq!(run(), run());
}

#[test]
fn extract_single_grant_period() {
    let ws = Workspace::new();
    let config = ws.config(&[1, 4], json!({}));

    ws.wbp()
        .args(["--config", &config, "extract", "--gp", "4", "--date", "2026-01-15"])
        .assert()
        .success();

    assert!(ws.out("wbp_gp4.json").exists());
    assert!(!ws.out("wbp_gp1.json").exists());
}

#[test]
fn extract_reports_missing_source_and_continues() {
    let ws = Workspace::new();
    let config = ws.config(&[1, 2, 4], json!({}));

    ws.wbp()
        .args(["--config", &config, "extract", "--date", "2026-01-15"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("GP2"));

    assert!(ws.out("wbp_gp1.json").exists());
    assert!(ws.out("wbp_gp4.json").exists());
    assert!(!ws.out("wbp_gp2.json").exists());

    let summary = read_json(&ws.out("wbp_summary.json"));
    assert_eq!(summary["missing_grant_periods"], json!([2]));
}

#[test]
fn extract_rejects_invalid_grant_period() {
    let ws = Workspace::new();
    let config = ws.config(&[1], json!({}));

    ws.wbp()
        .args(["--config", &config, "extract", "--gp", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid grant period"));
}

#[test]
fn verify_clean_run_exits_zero() {
    let ws = Workspace::new();
    let config = ws.config(
        &[1, 4],
        json!({ "GP1.total_grant": 63647.52, "GP4.total_grant": 184000.0, "totals.total_grant": 247647.52 }),
    );

    ws.wbp()
        .args(["--config", &config, "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All figures match"));

    let report = read_json(&ws.out("verification_report.json"));
    assert_eq!(report, json!([]));
}

#[test]
fn verify_mismatch_exits_one() {
    let ws = Workspace::new();
    let config = ws.config(&[1, 4], json!({ "GP1.total_grant": 63647.00, "GP3.total_grant": 169820.50 }));

    ws.wbp()
        .args(["--config", &config, "verify", "--format", "json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"field\": \"GP1.total_grant\""))
        .stdout(predicate::str::contains("\"missing\": true"));
}

#[test]
fn verify_tolerance_override() {
    let ws = Workspace::new();
    let config = ws.config(&[1], json!({ "GP1.total_grant": 63647.00 }));

    ws.wbp()
        .args(["--config", &config, "verify", "--tolerance", "1.00"])
        .assert()
        .success();
}

#[test]
fn verify_csv_to_file() {
    let ws = Workspace::new();
    let config = ws.config(&[4], json!({ "GP4.fsac": 1.0 }));
    let output = ws.path().join("report.csv");

    ws.wbp()
        .args(["--config", &config, "verify", "--format", "csv", "--output"])
        .arg(&output)
        .assert()
        .failure();

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("field,expected,actual,diff,missing,not_found_in_source\n"));
    assert!(csv.contains("GP4.fsac,1.00,24000.00,23999.00,false,false"));
}

#[test]
fn ffr_extracts_vm_grants() {
    let ws = Workspace::new();
    fs::write(
        ws.path().join("text/AGA-CA19130-5-FFR_ID4828.txt"),
        "List of paid Virtual Mobility\n\
         1 Maria Iannario NO Explainable AI IT 01/02/2024 01/07/2024 1 500.00\n\
         Sub-total actual amounts 1 500.00\n",
    )
    .unwrap();
    let config = ws.config(&[5], json!({}));

    ws.wbp()
        .args(["--config", &config, "ffr", "--date", "2026-01-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 virtual mobility grants (1,500.00 EUR)"));

    let ffr = read_json(&ws.out("ffr_gp5.json"));
    assert_eq!(ffr["vm_grants"][0]["id"], json!("GP5_VM1"));
    assert_eq!(ffr["vm_total"], json!(1500.0));
}

#[test]
fn pdf_to_text_rejects_invalid_pdf() {
    let ws = Workspace::new();
    let pdf = ws.path().join("broken.pdf");
    fs::write(&pdf, "not a pdf").unwrap();

    ws.wbp()
        .args(["pdf-to-text"])
        .arg(&pdf)
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken.pdf"));
}

#[test]
fn config_init_and_get() {
    let ws = Workspace::new();
    let path = ws.path().join("wbp.json");
    let path = path.to_string_lossy();

    ws.wbp()
        .args(["--config", &path, "config", "init"])
        .assert()
        .success();

    ws.wbp()
        .args(["--config", &path, "config", "get", "output.output_dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("data/wbp"));

    ws.wbp()
        .args(["--config", &path, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}
