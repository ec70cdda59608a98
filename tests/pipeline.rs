use std::fs;
use std::path::Path;

use secretome::consensus::Filter;
use secretome::effector;
use secretome::fasta;
use secretome::matrix;
use secretome::matrix::Matrix;
use secretome::prediction::Tool;
use secretome::tool;
use secretome::Config;
use secretome::Isolate;
use tempdir::TempDir;

fn config(root: &Path, isolates: &[&str]) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::default();
    config.input_dir = root.join("input");
    config.output_dir = root.join("secretomes");
    config.signalp.results_dir = root.join("signalp");
    config.targetp.results_dir = root.join("targetp");
    config.deeptmhmm.results_dir = root.join("deeptmhmm");
    config.effectorp.results_dir = root.join("effectorp");
    config.isolates = isolates
        .iter()
        .map(|name| name.parse::<Isolate>())
        .collect::<Result<_, _>>()?;
    config.validate()?;
    Ok(config)
}

fn write(path: impl AsRef<Path>, contents: &str) -> std::io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)
}

#[test]
fn consensus_keeps_only_records_passing_every_tool() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new("pipeline")?;
    let root = dir.path();
    let config = config(root, &["5C", "B20"])?;

    write(
        root.join("signalp/B20/prediction_results.txt"),
        "# SignalP-6.0\tOrganism: Eukarya\n\
         # ID\tPrediction\tOTHER\tSP(Sec/SPI)\tCS Position\n\
         B20_000001\tSP\t0.001\t0.999\tCS pos: 19-20\n\
         B20_000002\tSP\t0.002\t0.998\tCS pos: 22-23\n\
         B20_000003\tOTHER\t0.990\t0.010\n\
         truncated\n",
    )?;

    write(
        root.join("targetp/B20/B20_summary.targetp2"),
        "# TargetP-2.0\tOrganism: Non-Plant\n\
         # ID\tPrediction\tnoTP\tSP\tmTP\tCS Position\n\
         B20_000001\tmTP\t0.01\t0.01\t0.98\n\
         B20_000002\tSP\t0.00\t0.99\t0.01\tCS pos: 22-23\n\
         B20_000003\tSP\t0.01\t0.98\t0.01\tCS pos: 17-18\n",
    )?;

    write(
        root.join("deeptmhmm/B20_merged.3line"),
        ">B20_000001 | TM\nMKVLLA\nOOOMMM\n\
         >B20_000002 | SP+GLOB\nMALWMR\nSSSOOO\n\
         >B20_000003 | TM\nMSSLLA\nIIIMMM\n",
    )?;

    write(
        root.join("input/B20.faa"),
        ">B20_000001 hypothetical protein\nMKVLLA\n\
         >B20_000002 secreted protein\nMALWMR\n\
         >B20_000003\nMSSLLA\n",
    )?;

    let filter = Filter::from_config(&config);
    let report = filter.run(&config.isolates);

    // The isolate without a proteome fails, but does not halt the batch.
    assert_eq!(report.len(), 2);
    assert!(!report.is_success());

    let failures = report.failures().collect::<Vec<_>>();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "5C");

    let (unit, summary) = report.successes().next().unwrap();
    assert_eq!(unit, "B20");
    assert_eq!(summary.passing(Tool::SignalP), Some(2));
    assert_eq!(summary.passing(Tool::TargetP), Some(2));
    assert_eq!(summary.passing(Tool::DeepTmhmm), Some(1));
    assert_eq!(summary.tools[0].skipped, 1);
    assert_eq!(summary.secretome, 1);
    assert_eq!(summary.seen, 3);
    assert_eq!(summary.kept, 1);

    let output = summary.output.as_ref().unwrap();
    assert_eq!(output, &root.join("secretomes/B20.secretome.faa"));

    let records = fasta::read_all(output)?;
    assert_eq!(records.len(), 1);
    assert_eq!(fasta::name(&records[0]), "B20_000002");
    assert_eq!(records[0].sequence().as_ref(), b"MALWMR");

    Ok(())
}

#[test]
fn empty_consensus_writes_no_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new("pipeline")?;
    let root = dir.path();
    let config = config(root, &["5B"])?;

    write(root.join("signalp/5B/prediction_results.txt"), "5B_000001\tSP\n")?;
    write(root.join("input/5B.faa"), ">5B_000001\nMKV\n")?;

    let filter = Filter::from_config(&config);
    let report = filter.run(&config.isolates);

    assert!(report.is_success());

    let (_, summary) = report.successes().next().unwrap();
    assert_eq!(summary.passing(Tool::TargetP), Some(0));
    assert_eq!(summary.kept, 0);
    assert!(summary.output.is_none());
    assert!(!filter.output_file(&summary.isolate).exists());

    Ok(())
}

#[test]
fn effector_reports_feed_the_matrix() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new("pipeline")?;
    let root = dir.path();
    let config = config(root, &["5B", "B20", "E282"])?;

    write(
        root.join("effectorp/5B_effectorp_results.txt"),
        "# Identifier\tCytoplasmic\tApoplastic\tNon-effector\tPrediction\n\
         shared_1\t-\tY (0.8)\t-\tApoplastic effector\n\
         5B_9\t-\t-\tY (0.9)\tNon-effector\n",
    )?;
    write(
        root.join("effectorp/B20_effectorp_results.txt"),
        "shared_1\t-\tY (0.7)\t-\tApoplastic effector\n\
         B20_4\tY (0.6)\tY (0.55)\t-\tCytoplasmic/apoplastic effector\n",
    )?;

    let summary = effector::Summary::from_dir(&config.effectorp.results_dir, &config.isolates)?;
    assert!(summary.reports()[2].1.is_none());

    let master = config
        .effectorp
        .results_dir
        .join(effector::MASTER_LIST_FILE_NAME);
    assert_eq!(summary.write_master_list(&master)?, 2);
    assert_eq!(fs::read_to_string(&master)?, "B20_4\nshared_1\n");

    let matrix = Matrix::from_isolates(
        matrix::EFFECTOR_LABEL,
        config.isolates.clone(),
        summary.memberships(),
    );

    let path = root.join("effectorp").join(matrix::EFFECTOR_MATRIX_FILE_NAME);
    matrix.write_path(&path)?;

    assert_eq!(
        fs::read_to_string(&path)?,
        "Effector_ID,5B,B20,E282\nB20_4,0,1,0\nshared_1,1,1,0\n"
    );

    let stats = matrix.summary();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.core, 0);
    assert_eq!(stats.accessory, 2);
    assert_eq!(stats.singleton, 1);

    Ok(())
}

#[cfg(unix)]
fn script(path: &Path, body: &str) -> Result<String, Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt as _;

    write(path, &format!("#!/bin/sh\n{body}\n"))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(path.to_string_lossy().into_owned())
}

#[cfg(unix)]
#[test]
fn fallback_proteomes_flow_through_every_stage() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write as _;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    let dir = TempDir::new("pipeline")?;
    let root = dir.path();
    let mut config = config(root, &["5B", "B20"])?;
    config.chunk_size = 1;
    config.deeptmhmm.chunk_dir = root.join("chunks");
    config.deeptmhmm.work_dir = root.join("work");

    write(
        root.join("input/5B.sanitized.faa"),
        ">5B_000001\nMKV\n>5B_000002\nMAL\n",
    )?;

    let mut encoder = GzEncoder::new(
        fs::File::create(root.join("input/B20.faa.gz"))?,
        Compression::default(),
    );
    encoder.write_all(b">B20_000003\nMSS\n")?;
    encoder.finish()?;

    // Stand-in predictors that call every record a secreted, globular protein.
    config.signalp.program = script(
        &root.join("bin/signalp6"),
        r#"awk '/^>/ { print substr($1, 2) "\tSP" }' "$2" > "$4/prediction_results.txt""#,
    )?;
    config.targetp.program = script(
        &root.join("bin/targetp"),
        r#"awk '/^>/ { print substr($1, 2) "\tSP" }' "$2" > "$8/run_summary.targetp2""#,
    )?;
    config.deeptmhmm.program = script(
        &root.join("bin/biolib"),
        r#"mkdir "run_$$" && sed -n 's/^\(>[^ ]*\).*/\1 | SP+GLOB/p' "$4" > "run_$$/predicted_topologies.3line""#,
    )?;

    let signalp = tool::signalp::Runner::from_config(&config).run(&config.isolates);
    let targetp = tool::targetp::Runner::from_config(&config).run(&config.isolates);
    let deeptmhmm = tool::deeptmhmm::Runner::from_config(&config).run(&config.isolates);

    for report in [&signalp, &targetp, &deeptmhmm] {
        assert!(report.is_success(), "{report}");
    }

    let units = |report: &secretome::BatchReport<tool::Status>| {
        report
            .units()
            .iter()
            .map(|(unit, _)| unit.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(units(&signalp), vec!["5B", "B20"]);
    assert_eq!(
        units(&deeptmhmm),
        vec!["5B_part1", "5B_part2", "5B", "B20_part1", "B20"]
    );

    let report = Filter::from_config(&config).run(&config.isolates);
    assert!(report.is_success(), "{report}");

    let summaries = report.successes().collect::<Vec<_>>();
    assert_eq!(summaries.len(), 2);

    let (_, five_b) = summaries[0];
    assert_eq!(five_b.passing(Tool::SignalP), Some(2));
    assert_eq!(five_b.passing(Tool::TargetP), Some(2));
    assert_eq!(five_b.passing(Tool::DeepTmhmm), Some(2));
    assert_eq!(five_b.kept, 2);

    let (_, b20) = summaries[1];
    assert_eq!(b20.kept, 1);

    let records = fasta::read_all(b20.output.as_ref().unwrap())?;
    assert_eq!(fasta::name(&records[0]), "B20_000003");

    Ok(())
}
