//! 集成測試

use std::fs;
use std::path::{Path, PathBuf};

use inbox_recon::{logging, run, Cli};
use recon_calc::RunPhase;
use rstest::rstest;
use tempfile::TempDir;

const INBOX: &str = "\
Planned order not found for 1200252B-M318A, D-1200252-10001, 30.000, Sigmanest Program:41234
Planned order not found for 1200252B-M318A, D-1200252-10001, 1,020.000, Sigmanest Program:41234
Planned order not found for 1200252B-M320A, D-1200252-10002, 100.000, Sigmanest Program:41234
Planned order not found for 1200252B-M999A, D-1200252-10003, 5.000, Sigmanest Program:41299
this line is not a notice
";

const PLANNED_ORDERS: &str = "\
Material Number,Order quantity (GMEIN),WBS Element,Plant
1200252B-M318A,\"1,000\",D-1200252-20001,HS01
1200252B-M318A,100,D-1200252-20002,HS02
1200252B-M320A,60,D-1200252-20003,HS01
1200252B-M777A,10,D-1200252-20004,HS01
";

/// 測試用工作區：收件匣、確認檔資料夾與輸出資料夾
struct Workspace {
    _dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        logging::init_test();

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir(root.join("cnf")).unwrap();
        fs::create_dir(root.join("out")).unwrap();
        fs::write(root.join("inbox.txt"), INBOX).unwrap();

        Self { _dir: dir, root }
    }

    fn confirmation_file(&self, name: &str, rows: &[String]) {
        fs::write(self.root.join("cnf").join(name), rows.join("\n")).unwrap();
    }

    fn planned_orders(&self, content: &str) -> PathBuf {
        let path = self.root.join("orders.csv");
        fs::write(&path, content).unwrap();
        path
    }

    fn cli(&self) -> Cli {
        Cli {
            inbox: self.root.join("inbox.txt"),
            confirmations: Some(self.root.join("cnf")),
            planned_orders: None,
            output_dir: self.root.join("out"),
            max: None,
            all: false,
            name: Some("Production_20240101000000.ready".to_string()),
            parts: false,
            config: None,
            verbose: false,
        }
    }

    fn output(&self, name: &str) -> String {
        fs::read_to_string(self.output_path(name)).unwrap()
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.root.join("out").join(name)
    }
}

fn cnf_row(part: &str, wbs: &str, part_qty: &str, material_qty: &str, program: &str) -> String {
    [
        part,
        "S-1200252",
        wbs,
        "PROD",
        part_qty,
        "EA",
        "9-50W-0375",
        "D-1200252-90001",
        material_qty,
        "IN2",
        "HS01",
        "HS01",
        program,
    ]
    .join("\t")
}

fn standard_confirmations(ws: &Workspace) {
    ws.confirmation_file(
        "Production_20231201120000.outbound.archive",
        &[
            "MARK\tID\tPARTWBS".to_string(),
            // 掃描名稱需以工令轉換
            cnf_row("252b-1b-x-m318a", "D-1200252-10001", "5", "10", "41234"),
        ],
    );
    ws.confirmation_file(
        "Production_20231101120000.outbound.archive",
        &[cnf_row("1200252B-M320A", "D-1200252-10002", "4", "3", "41234")],
    );
}

fn exists(path: &Path) -> bool {
    path.exists()
}

#[test]
fn test_full_reconciliation() {
    let ws = Workspace::new();
    standard_confirmations(&ws);
    let mut cli = ws.cli();
    cli.planned_orders = Some(ws.planned_orders(PLANNED_ORDERS));

    let report = run(&cli).unwrap();
    let result = &report.result;

    assert_eq!(result.completed, RunPhase::Reported);
    assert_eq!(result.stats.inbox_parsed, 4);
    assert_eq!(result.stats.inbox_rejected, 1);
    assert_eq!(result.stats.aggregated, 3);
    assert_eq!(result.stats.matched, 2);
    assert_eq!(result.stats.unmatched, 1);
    assert_eq!(result.stats.matching.rows.rejected, 1);

    // M318A: 1050 = 1000 (20001) + 50 (20002)；M320A: 100 只拿到 60
    assert_eq!(
        ws.output("Production_20240101000000.ready"),
        [
            "1200252B-M318A\tS-1200252\tD-1200252-20001\tPROD\t1000\tEA\t9-50W-0375\tD-1200252-90001\t2000.000\tIN2\tHS01\tHS01\t41234",
            "1200252B-M318A\tS-1200252\tD-1200252-20002\tPROD\t50\tEA\t9-50W-0375\tD-1200252-90001\t100.000\tIN2\tHS01\tHS02\t41234",
            "1200252B-M320A\tS-1200252\tD-1200252-20003\tPROD\t60\tEA\t9-50W-0375\tD-1200252-90001\t45.000\tIN2\tHS01\tHS01\t41234",
            "",
        ]
        .join("\n")
    );

    assert_eq!(
        ws.output("NoCnfRowFound.txt"),
        "Planned order not found for 1200252B-M999A, D-1200252-10003, 5.000, Sigmanest Program:41299\n"
    );
    assert_eq!(
        ws.output("NoPlannedOrderFound.txt"),
        "Mark,Qty,Wbs,Program\n1200252B-M320A,40,D-1200252-10002,41234\n"
    );
    assert_eq!(report.written.len(), 3);
    assert_eq!(
        report.correction_file.as_deref(),
        Some(ws.output_path("Production_20240101000000.ready").as_path())
    );
}

#[test]
fn test_quantity_conserved_across_run() {
    let ws = Workspace::new();
    standard_confirmations(&ws);
    let mut cli = ws.cli();
    cli.planned_orders = Some(ws.planned_orders(PLANNED_ORDERS));

    let report = run(&cli).unwrap();

    for failure in &report.result.matched {
        assert!(failure.is_conserved());
        assert_eq!(
            failure.original_qty(),
            failure.remaining_qty() + failure.allocated_qty()
        );
    }
}

#[test]
fn test_parts_only() {
    let ws = Workspace::new();
    let mut cli = ws.cli();
    cli.parts = true;
    cli.confirmations = None;

    let report = run(&cli).unwrap();

    assert_eq!(report.result.completed, RunPhase::Aggregated);
    assert_eq!(
        ws.output("Parts.txt"),
        "1200252B-M318A\n1200252B-M320A\n1200252B-M999A"
    );
    assert!(!exists(&ws.output_path("NoCnfRowFound.txt")));
    assert!(report.correction_file.is_none());
}

#[test]
fn test_missing_planned_orders_keeps_reports() {
    let ws = Workspace::new();
    standard_confirmations(&ws);
    let cli = ws.cli();

    let report = run(&cli).unwrap();

    assert_eq!(report.result.completed, RunPhase::Matched);
    assert!(report.correction_file.is_none());
    assert!(!exists(&ws.output_path("Production_20240101000000.ready")));
    assert!(!exists(&ws.output_path("NoPlannedOrderFound.txt")));
    assert!(ws.output("NoCnfRowFound.txt").contains("1200252B-M999A"));
}

#[test]
fn test_missing_planned_order_columns_skips_allocation() {
    let ws = Workspace::new();
    standard_confirmations(&ws);
    let mut cli = ws.cli();
    cli.planned_orders = Some(ws.planned_orders("Material Number,WBS Element,Plant\nM,W,P\n"));

    let report = run(&cli).unwrap();

    assert!(report.result.allocation.is_none());
    assert!(report
        .result
        .warnings
        .iter()
        .any(|w| w.message.contains("Order quantity")));
}

#[rstest]
#[case::newest_only(Some(1), false, 1)]
#[case::both_files(Some(2), false, 2)]
#[case::search_all(Some(1), true, 2)]
#[case::default_limit(None, false, 2)]
fn test_source_limit(
    #[case] max: Option<usize>,
    #[case] all: bool,
    #[case] expected_matched: usize,
) {
    let ws = Workspace::new();
    standard_confirmations(&ws);
    let mut cli = ws.cli();
    cli.max = max;
    cli.all = all;

    let report = run(&cli).unwrap();

    assert_eq!(report.result.stats.matched, expected_matched);
}

#[test]
fn test_config_file() {
    let ws = Workspace::new();
    standard_confirmations(&ws);
    let config_path = ws.root.join("recon.json");
    fs::write(
        &config_path,
        r#"{ "source_limit": { "bounded": 1 }, "material_precision": 1 }"#,
    )
    .unwrap();

    let mut cli = ws.cli();
    cli.config = Some(config_path);
    cli.planned_orders = Some(ws.planned_orders(PLANNED_ORDERS));

    let report = run(&cli).unwrap();

    assert_eq!(report.result.stats.matched, 1);
    assert!(ws
        .output("Production_20240101000000.ready")
        .contains("\t2000.0\t"));
}

#[test]
fn test_full_mode_requires_confirmations() {
    let ws = Workspace::new();
    let mut cli = ws.cli();
    cli.confirmations = None;

    assert!(run(&cli).is_err());
}

#[test]
fn test_missing_inbox_fails() {
    let ws = Workspace::new();
    let mut cli = ws.cli();
    cli.inbox = ws.root.join("missing.txt");

    assert!(run(&cli).is_err());
}
