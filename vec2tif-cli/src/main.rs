use anyhow::Result;
use clap::Parser;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};
use vec2tif::converter::collect_csv_files;
use vec2tif::{ConvertConfig, Csv2Tif};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 入力CSVファイルまたはディレクトリ（複数指定可）
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// 入力座標のEPSGコード（出力にも同じコードを設定）
    #[arg(long, default_value_t = 4326)]
    crs_code: u32,

    /// 1セルあたりの地上距離（メートル）
    #[arg(short, long)]
    resolution: f64,

    /// 出力ディレクトリ（デフォルト: 入力ファイルと同じディレクトリ）
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// 並列処理スレッド数（指定しない場合は入力順に1つずつ処理）
    #[arg(short, long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    // ログの初期化
    tracing_subscriber::fmt::init();

    // CLI引数の解析
    let args = Args::parse();

    // 処理開始時間を記録
    let start_time = std::time::Instant::now();

    let config = ConvertConfig::new(args.crs_code, args.resolution)?;

    // スレッドプールの設定
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }

    // 出力ディレクトリの作成
    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }

    // ディレクトリはCSVファイルに展開する
    let mut inputs = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            info!("Processing directory: {:?}", input);
            let files = collect_csv_files(input)?;
            info!("Found {} CSV files", files.len());
            inputs.extend(files);
        } else {
            inputs.push(input.clone());
        }
    }

    let mut converter = Csv2Tif::new(inputs, config);
    if let Some(dir) = &args.output_dir {
        converter = converter.with_output_dir(dir);
    }

    let report = if args.threads.is_some() {
        converter.execute_all_parallel()
    } else {
        converter.execute_all()
    };

    info!("Converted {} files", report.converted.len());

    // エラーをチェック
    if !report.is_success() {
        error!("Failed to process {} files:", report.failed.len());
        for (path, err) in &report.failed {
            error!("  {}: {}", path.display(), err);
        }
        anyhow::bail!("{} files failed to process", report.failed.len());
    }

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}
