//! Console rendering for listings, job detail and results.

use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::Table;

use crate::core::codec::ResultsJson;
use crate::core::entities::{Failure, Job, JobListing, Model, Results, ResultsEntry};
use crate::utils::lib::truncate;

pub fn model_row(model: &Model) -> [String; 5] {
    [
        model.model_id.clone(),
        truncate(&model.name, 38),
        model.latest_version.clone(),
        truncate(&model.author, 24),
        if model.is_active { "yes" } else { "no" }.to_string(),
    ]
}

/// Builds the bulk listing table from rows appended as detail fetches
/// completed.
pub fn models_table(rows: Vec<[String; 5]>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["MODEL ID", "NAME", "LATEST", "AUTHOR", "ACTIVE"]);
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table
}

pub fn jobs_table(jobs: &[JobListing]) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["JOB ID", "STATUS", "MODEL", "VERSION"]);
    for job in jobs {
        builder.push_record([
            job.job_identifier.clone(),
            job.status.clone(),
            job.model.name.clone(),
            job.model.version.clone(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table
}

pub fn print_model(model: &Model) {
    println!("Model ID:        {}", model.model_id);
    println!("Name:            {}", model.name);
    println!("Author:          {}", model.author);
    println!("Latest version:  {}", model.latest_version);
    println!("Active version:  {}", model.latest_active_version);
    println!("Versions:        {}", model.versions.join(", "));
    println!(
        "Flags:           active={} recommended={} commercial={}",
        model.is_active, model.is_recommended, model.is_commercial
    );
    if let Some(visibility) = &model.visibility {
        println!("Visibility:      {}", visibility.scope);
    }
    if !model.tags.is_empty() {
        let tags: Vec<&str> = model.tags.iter().map(|t| t.name.as_str()).collect();
        println!("Tags:            {}", tags.join(", "));
    }
    if !model.description.is_empty() {
        println!("\n{}", model.description);
    }
}

pub fn print_job(job: &Job) {
    println!("Job ID:       {}", job.job_identifier);
    println!("Status:       {}", job.status);
    println!(
        "Model:        {} ({} {})",
        job.model.name, job.model.identifier, job.model.version
    );
    println!("Total inputs: {}", job.total_inputs);
    if let Some(submitted_at) = job.submitted_at {
        println!("Submitted at: {submitted_at}");
    }
    if let Some(inputs) = &job.job_inputs {
        let ids: Vec<&str> = inputs
            .identifiers()
            .iter()
            .map(|i| i.identifier.as_str())
            .collect();
        println!("Inputs:       {}", ids.join(", "));
    }
}

fn outcome_summary(entry: &ResultsEntry) -> String {
    match &entry.results_json {
        Some(ResultsJson::Structured(data)) => match data.result.class_predictions.first() {
            Some(top) => format!("{} ({:.3})", top.class_name, top.score),
            None => "-".to_string(),
        },
        Some(ResultsJson::RawList(lines)) => match lines.first() {
            Some(first) => truncate(first, 38),
            None => "-".to_string(),
        },
        None => "-".to_string(),
    }
}

fn outcomes_table(entries: &std::collections::BTreeMap<String, ResultsEntry>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["INPUT", "STATUS", "ENGINE", "LATENCY (MS)", "TOP RESULT"]);
    for (input, entry) in entries {
        builder.push_record([
            input.clone(),
            entry.status.clone(),
            entry.engine.clone(),
            entry
                .model_latency
                .map(|ms| format!("{ms:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            outcome_summary(entry),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table
}

fn failures_table(failures: &std::collections::BTreeMap<String, Failure>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["INPUT", "STATUS", "ENGINE", "ERROR"]);
    for (input, failure) in failures {
        builder.push_record([
            input.clone(),
            failure.status.clone(),
            failure.engine.clone(),
            truncate(&failure.error, 60),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table
}

pub fn print_results(results: &Results) {
    println!("Job ID:       {}", results.job_identifier);
    println!(
        "Inputs:       {} total, {} completed, {} failed, finished={}",
        results.total, results.completed, results.failed, results.finished
    );
    println!(
        "Timing:       queue {} ms, avg latency {:.1} ms, elapsed {} ms",
        results.total_queue_time, results.average_model_latency, results.elapsed_time
    );
    if let Some(entries) = &results.results {
        if !entries.is_empty() {
            println!("\n{}", outcomes_table(entries));
        }
    }
    if let Some(failures) = &results.failures {
        if !failures.is_empty() {
            println!("\nFailures:\n{}", failures_table(failures));
        }
    }
}
