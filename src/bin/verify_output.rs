use anyhow::{Context, Result};
use csv_compiler::{
    compile::RunSummary,
    output::read_summary,
    table::{read_csv_path, UTF8_BOM},
    CompilerConfig,
};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{env, fs, fs::File, io::Read, path::Path, process::exit};
use zip::ZipArchive;

fn main() -> Result<()> {
    // Expect an output directory and optionally the config that produced it.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <OUTPUT_DIR> [CONFIG_YAML]", args[0]);
        exit(1);
    }
    let mut config = CompilerConfig::resolve(args.get(2).map(String::as_str))?;
    config.output_dir = args[1].clone().into();

    // 1) What the compiler claims
    let record = read_summary(&config.summary_path())?;
    let expected = record.summary.final_rows;

    // 2) Re-read the CSV
    let csv_path = config.csv_path();
    let has_bom = fs::read(&csv_path)
        .with_context(|| format!("reading {}", csv_path.display()))?
        .starts_with(UTF8_BOM);
    let csv_rows = read_csv_path(&csv_path)
        .with_context(|| format!("parsing {}", csv_path.display()))?
        .num_rows();

    // 3) Workbook rows, minus the header row
    let xlsx_path = config.xlsx_path();
    let xlsx_rows = if xlsx_path.exists() {
        Some(xlsx_row_count(&xlsx_path)?)
    } else {
        None
    };

    // 4) Parquet row count from metadata
    let parquet_path = config.parquet_path();
    let parquet_rows = if parquet_path.exists() {
        Some(parquet_row_count(&parquet_path)?)
    } else {
        None
    };

    // 5) Print summary table
    //
    // delta = count(artifact) - final_rows(summary)
    // A FAILED verdict is the compiler's finding about the sources, not an
    // artifact inconsistency.
    println!("archive: {}  generated: {}", record.archive, record.generated_at);
    println!("csv has UTF-8 BOM: {}", has_bom);
    println!(
        "compiler verdict: {} (source rows {}, final rows {})",
        record.summary.verification, record.summary.source_rows, expected
    );
    println!(
        "\n{: <35} {:>15} {:>15}",
        "Artifact", "Rows", "Delta vs summary"
    );
    println!("{:-<67}", "");
    println!("{: <35} {:>15} {:>15}", config.csv_file_name, csv_rows, csv_rows as isize - expected as isize);
    if let Some(rows) = xlsx_rows {
        println!("{: <35} {:>15} {:>15}", config.xlsx_file_name, rows, rows as isize - expected as isize);
    }
    if let Some(rows) = parquet_rows {
        println!("{: <35} {:>15} {:>15}", config.parquet_file_name, rows, rows as isize - expected as isize);
    }

    let counts = ArtifactRows {
        csv: csv_rows,
        xlsx: xlsx_rows,
        parquet: parquet_rows,
    };
    if !(has_bom && counts.agree_with(&record.summary)) {
        eprintln!("\nartifacts do not agree with {}", config.summary_file_name);
        exit(2);
    }
    println!("\nall artifacts agree: {} rows", expected);
    Ok(())
}

/// Data rows found in each artifact; `None` when the artifact was not written.
struct ArtifactRows {
    csv: usize,
    xlsx: Option<usize>,
    parquet: Option<usize>,
}

impl ArtifactRows {
    /// Artifacts are checked against the master table's row count only. The
    /// source count belongs to the verdict.
    fn agree_with(&self, summary: &RunSummary) -> bool {
        let expected = summary.final_rows;
        self.csv == expected
            && self.xlsx.map_or(true, |r| r == expected)
            && self.parquet.map_or(true, |r| r == expected)
    }
}

fn parquet_row_count(path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("reading parquet footer of {}", path.display()))?;
    Ok(reader.metadata().file_metadata().num_rows() as usize)
}

fn xlsx_row_count(path: &Path) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("reading workbook {}", path.display()))?;
    let mut sheet = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .with_context(|| format!("no first sheet in {}", path.display()))?
        .read_to_string(&mut sheet)?;
    Ok(sheet.matches("<row ").count().saturating_sub(1))
}
