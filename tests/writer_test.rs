//! Result writer tests: run directory naming, sample fan-out, file shape.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use voice_bench::config::{RunConfig, Secret};
use voice_bench::driver::GenerationResult;
use voice_bench::sampling::{SamplingPlan, Temperature};
use voice_bench::writer::ResultWriter;

fn config(output: &Path, temperature: f64, n: u32) -> RunConfig {
    RunConfig {
        model_name: "m".into(),
        gpus: 1,
        input_path: PathBuf::from("prompts.jsonl"),
        output_path: output.to_path_buf(),
        hf_token: Secret::new("hf_x"),
        sampling_params: SamplingPlan {
            temperature: Temperature::Scalar(temperature),
            n,
            max_new_tokens: 16,
        },
    }
}

fn results(prompts: usize, samples: usize) -> Vec<GenerationResult> {
    let mut out = Vec::new();
    for p in 0..prompts {
        for s in 0..samples {
            out.push(GenerationResult {
                prompt_index: p,
                sample_index: s,
                text: format!("r{p}s{s}"),
            });
        }
    }
    out
}

fn timestamp(sec: u32) -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2026, 8, 7, 12, 0, sec).unwrap()
}

fn read_responses(path: &Path) -> Vec<String> {
    let raw = fs::read_to_string(path).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    parsed
        .iter()
        .map(|v| v["gen_response"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn single_sample_writes_exactly_results_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1.0, 1);
    let writer = ResultWriter::with_timestamp(&config, timestamp(0));
    let run_dir = writer.write(&results(3, 1)).unwrap();

    assert!(run_dir.join("results.json").is_file());
    // no index suffix may appear for n == 1
    assert!(!run_dir.join("results_0.json").exists());
    let names: Vec<_> = fs::read_dir(&run_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);
}

#[test]
fn multi_sample_fans_out_one_file_per_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 0.7, 2);
    let writer = ResultWriter::with_timestamp(&config, timestamp(0));
    let run_dir = writer.write(&results(3, 2)).unwrap();

    assert!(!run_dir.join("results.json").exists());
    let first = read_responses(&run_dir.join("results_0.json"));
    let second = read_responses(&run_dir.join("results_1.json"));
    assert_eq!(first, vec!["r0s0", "r1s0", "r2s0"]);
    assert_eq!(second, vec!["r0s1", "r1s1", "r2s1"]);
}

#[test]
fn scenario_directory_name_encodes_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 0.7, 2);
    let writer = ResultWriter::with_timestamp(&config, timestamp(0));
    let run_dir = writer.write(&results(3, 2)).unwrap();
    assert_eq!(
        run_dir.file_name().unwrap().to_str().unwrap(),
        "m_temp0.7_n2_2026-08-07_12-00-00"
    );
}

#[test]
fn sample_count_of_one_is_omitted_from_directory_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1.0, 1);
    let writer = ResultWriter::with_timestamp(&config, timestamp(0));
    let run_dir = writer.write(&results(1, 1)).unwrap();
    assert_eq!(
        run_dir.file_name().unwrap().to_str().unwrap(),
        "m_temp1_2026-08-07_12-00-00"
    );
}

#[test]
fn model_slug_is_filesystem_safe() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), 1.0, 1);
    config.model_name = "Qwen/Qwen3-8B".into();
    let writer = ResultWriter::with_timestamp(&config, timestamp(0));
    let run_dir = writer.write(&results(1, 1)).unwrap();
    assert!(run_dir
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("qwen_qwen3-8b_temp1_"));
}

#[test]
fn repeated_runs_land_in_distinct_directories() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1.0, 1);

    let first = ResultWriter::with_timestamp(&config, timestamp(0))
        .write(&results(2, 1))
        .unwrap();
    let first_content = fs::read_to_string(first.join("results.json")).unwrap();

    let second = ResultWriter::with_timestamp(&config, timestamp(1))
        .write(&results(2, 1))
        .unwrap();

    assert_ne!(first, second);
    assert!(second.join("results.json").is_file());
    // the first run's files are untouched
    assert_eq!(
        fs::read_to_string(first.join("results.json")).unwrap(),
        first_content
    );
}

#[test]
fn entries_are_ordered_by_prompt_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1.0, 1);
    let writer = ResultWriter::with_timestamp(&config, timestamp(0));

    // hand the writer results out of order
    let mut shuffled = results(4, 1);
    shuffled.reverse();
    let run_dir = writer.write(&shuffled).unwrap();
    assert_eq!(
        read_responses(&run_dir.join("results.json")),
        vec!["r0s0", "r1s0", "r2s0", "r3s0"]
    );
}

#[test]
fn no_temp_files_survive_a_write() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1.0, 3);
    let writer = ResultWriter::with_timestamp(&config, timestamp(0));
    let run_dir = writer.write(&results(2, 3)).unwrap();
    let count = fs::read_dir(&run_dir).unwrap().count();
    assert_eq!(count, 3);
}
