use anyhow::{anyhow, bail, Context, Result};
use backtest_analysis::audit::{audit_summary, default_output_path, parse_audit_file, write_audit_csv};
use backtest_analysis::config::{self, ApplicationConfig, LogConfig};
use backtest_analysis::domain_types::ReportKind;
use backtest_analysis::report::{cumulative_pnl, pnl_statistics, render_runs_summary};
use backtest_analysis::scanner::{RunScanner, ScanOutcome};
use backtest_analysis::loader::RunLoader;
use backtest_analysis::utils::{parse_date, weekdays_between};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backtest_analysis", version, about = "回測輸出掃描與載入工具")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 掃描回測輸出並列印摘要
    Scan {
        /// 回測輸出根目錄，預設使用配置中的 scan.root
        #[arg(long)]
        root: Option<PathBuf>,
        /// 只掃描指定代碼，省略時掃描全部
        #[arg(long)]
        symbol: Option<String>,
        /// 列出所有參數鍵
        #[arg(long)]
        all_keys: bool,
        /// 最多顯示的執行數
        #[arg(long)]
        max_runs: Option<usize>,
    },
    /// 載入單次執行並列印數據概況
    Load {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        symbol: String,
        /// 執行目錄名稱，例如 093000_run1
        #[arg(long = "run")]
        run_id: String,
        /// 日期 (YYYY-MM-DD)，同一 run id 出現在多個日期時必須指定
        #[arg(long)]
        date: Option<String>,
    },
    /// 將券商審計軌跡 XML 轉為 CSV
    Audit {
        /// 審計檔 (FIX 訊息 XML)
        #[arg(long, short)]
        input: PathBuf,
        /// 輸出 CSV，預設為輸入檔改用 .csv 副檔名
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// 列出兩日期之間（含端點）的平日
    Weekdays {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化配置
    let app_config = config::init_config().context("無法加載配置")?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    match cli.command {
        Command::Scan {
            root,
            symbol,
            all_keys,
            max_runs,
        } => {
            let outcome = scan(app_config, root, symbol.as_deref())?;
            print!("{}", render_runs_summary(&outcome.runs, max_runs, all_keys));
            if !outcome.warnings.is_empty() {
                eprintln!("{} 個目錄被略過，詳見日誌", outcome.warnings.len());
            }
        }
        Command::Load {
            root,
            symbol,
            run_id,
            date,
        } => load(app_config, root, &symbol, &run_id, date.as_deref())?,
        Command::Audit { input, output } => audit(&input, output)?,
        Command::Weekdays { start, end } => {
            let start = parse_date(&start).context("無效的起始日期")?;
            let end = parse_date(&end).context("無效的結束日期")?;
            for day in weekdays_between(start, end) {
                println!("{}", day.format("%Y-%m-%d"));
            }
        }
    }

    Ok(())
}

fn resolve_root(app_config: &ApplicationConfig, root: Option<PathBuf>) -> Result<PathBuf> {
    root.or_else(|| app_config.scan.root.clone())
        .ok_or_else(|| anyhow!("未指定回測輸出根目錄（--root 或 scan.root）"))
}

fn scan(app_config: &ApplicationConfig, root: Option<PathBuf>, symbol: Option<&str>) -> Result<ScanOutcome> {
    let root = resolve_root(app_config, root)?;
    let scanner = RunScanner::new(app_config.scan_options()?);

    let outcome = match symbol {
        Some(symbol) => scanner.scan(&root, symbol),
        None => scanner.scan_all(&root),
    }
    .with_context(|| format!("掃描 {} 失敗", root.display()))?;

    info!("共發現 {} 次回測執行", outcome.len());
    Ok(outcome)
}

fn load(
    app_config: &ApplicationConfig,
    root: Option<PathBuf>,
    symbol: &str,
    run_id: &str,
    date: Option<&str>,
) -> Result<()> {
    let date = date.map(parse_date).transpose().context("無效的日期")?;
    let outcome = scan(app_config, root, Some(symbol))?;

    let matches = outcome.filter(|run| run.run_id() == run_id && date.map_or(true, |d| run.date() == d));
    let metadata = match matches.as_slice() {
        [] => bail!("找不到回測執行 {}/{}", symbol, run_id),
        [single] => single.clone(),
        many => bail!(
            "{} 個日期都有執行 {}，請以 --date 指定",
            many.len(),
            run_id
        ),
    };

    let loader = RunLoader::new(app_config.loader_options()?);
    let data = loader
        .load(&metadata)
        .with_context(|| format!("載入 {} 失敗", metadata.id()))?;

    println!("Run: {}", metadata.id());
    println!("Path: {}", metadata.path().display());
    println!("Frequency: {}", metadata.frequency_label());
    println!("Strategy events: {}", data.events.len());
    for kind in ReportKind::ALL {
        match data.report(kind) {
            Some(df) => println!("{}: {} rows x {} columns", kind.name(), df.height(), df.width()),
            None => println!("{}: <missing>", kind.name()),
        }
    }

    if let Some(summary) = &data.summary {
        println!("PnL summary:");
        for (key, value) in summary.iter() {
            println!("  {}: {}", key, value);
        }
    }

    if let Some(positions) = data.positions() {
        let clock = app_config.scan_options()?.clock;
        let points = match cumulative_pnl(positions, &clock) {
            Ok(points) => points,
            Err(e) => {
                warn!("無法計算 {} 的累積損益: {}", metadata.id(), e);
                Vec::new()
            }
        };
        let realized: Vec<f64> = points.iter().map(|p| p.realized).collect();
        if let Some(stats) = pnl_statistics(&realized) {
            println!("Closed positions: {}", stats.count);
            println!("Total realized PnL: {:.2}", stats.total);
            println!("Mean / trade: {:.4}", stats.mean);
            if let Some(std_dev) = stats.std_dev {
                println!("Std dev: {:.4}", std_dev);
            }
            println!("Min / Max: {:.2} / {:.2}", stats.min, stats.max);
            println!("Win rate: {:.1}%", stats.win_rate * 100.0);
        }
        if let Some(last) = points.last() {
            println!("Last close: {} (cumulative {:.2})", last.closed_at, last.cumulative);
        }
    }

    Ok(())
}

fn audit(input: &Path, output: Option<PathBuf>) -> Result<()> {
    if !input.is_file() {
        bail!("找不到審計檔 {}", input.display());
    }
    let output = output.unwrap_or_else(|| default_output_path(input));

    let trail = parse_audit_file(input)?;
    if !write_audit_csv(&trail.records, &output)? {
        println!("No records to write");
        return Ok(());
    }
    println!("Entries: {}", trail.entries_seen);
    println!("Records: {} -> {}", trail.records.len(), output.display());

    let summary = audit_summary(&trail.records, 10);
    println!("Records by entry type:");
    for (entry_type, count) in &summary.by_entry_type {
        println!("  {:20} {:>6}", entry_type, count);
    }
    if !summary.top_symbols.is_empty() {
        println!("Records by symbol (top 10):");
        for (symbol, count) in &summary.top_symbols {
            println!("  {:10} {:>6}", symbol, count);
        }
    }
    Ok(())
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_config.level.to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match log_config.format.to_lowercase().as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(())
}
