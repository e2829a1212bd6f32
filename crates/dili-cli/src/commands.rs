use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span, warn};

use dili_cli::logging::redact_value;
use dili_cli::replay::ReplayService;
use dili_cli::report::{patient_summaries, ratio_report};
use dili_core::{ClassifierOptions, classify, classify_patient};
use dili_ingest::{
    DaySource, Delimiter, ExposureStore, IngestOptions, read_name_list, read_toxicity_reference,
};
use dili_model::{IciAllowList, ToxicityReference};
use dili_naranjo::{
    NaranjoContext, QueryCheck, QueueOptions, ReasoningOutcome, ReasoningQueue, prepare_query,
};

use crate::cli::{
    ClassifyArgs, DelimiterArg, ExposureArgs, NaranjoArgs, PatientsArgs, QueryArgs, RatiosArgs,
    ReferenceArgs,
};
use crate::summary::{print_assessment, print_classification, print_patients, print_ratios};

pub fn run_patients(args: &PatientsArgs) -> Result<()> {
    let store = open_store(&args.exposure)?;
    let summaries = patient_summaries(&store).context("summarize patients")?;
    if args.json {
        print_json(&summaries)?;
    } else {
        print_patients(&summaries);
    }
    Ok(())
}

pub fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let store = open_store(&args.exposure)?;
    let (reference, options) = load_reference(&args.reference)?;

    let entries = match &args.patient {
        Some(patient) => store
            .drug_entries(patient)
            .with_context(|| format!("look up patient {}", redact_value(patient)))?,
        None => store.all_drug_entries(),
    };
    let result = {
        let _span = info_span!("classify", entries = entries.len()).entered();
        classify(&entries, &reference, &options)
    };
    info!(
        toxic = result.toxic_ids.len(),
        safe = result.safe_ids.len(),
        ingredients = result.toxic_ingredients.len(),
        "classification finished"
    );

    if args.json {
        print_json(&result)?;
    } else {
        print_classification(&result);
    }
    Ok(())
}

pub fn run_ratios(args: &RatiosArgs) -> Result<()> {
    let store = open_store(&args.exposure)?;
    let (reference, options) = load_reference(&args.reference)?;
    let patient = &args.patient;
    let data = store
        .patient_drug_data(patient)
        .with_context(|| format!("look up patient {}", redact_value(patient)))?;

    let classification = classify_patient(&data, &reference, &options);
    let mut sets = classification.reference_sets();
    if let Some(path) = &args.safe_list {
        let safe = read_name_list(path)
            .with_context(|| format!("read safe list {}", path.display()))?;
        sets = sets.with_safe_ids(safe.ids).with_safe_names(safe.names);
    }
    debug!(has_safe = sets.has_safe(), "reference sets ready");

    let report = ratio_report(patient, &data, &sets, args.from, args.to, args.window);
    if args.json {
        print_json(&report)?;
    } else {
        print_ratios(&report);
    }
    Ok(())
}

pub fn run_naranjo(args: &NaranjoArgs) -> Result<()> {
    let store = open_store(&args.exposure)?;
    let (reference, options) = load_reference(&args.reference)?;
    let patient = &args.patient;
    let data = store
        .patient_drug_data(patient)
        .with_context(|| format!("look up patient {}", redact_value(patient)))?;
    let grades = store.patient_grades(patient)?;

    let classification = classify_patient(&data, &reference, &options);
    let context = NaranjoContext::build(&data, &classification, &options.ici, &grades);
    if !context.has_ici_exposure() {
        warn!("patient has no checkpoint inhibitor exposure");
    }

    let Some(reply_path) = &args.reply else {
        return print_json(&context);
    };
    let reply = std::fs::read_to_string(reply_path)
        .with_context(|| format!("read reply {}", reply_path.display()))?;

    let queue = ReasoningQueue::spawn(
        ReplayService::new(reply),
        QueueOptions::default()
            .with_request_timeout(Duration::from_secs(args.timeout))
            .with_request_delay(Duration::ZERO),
    );
    if !queue.check_health() {
        bail!("reply file {} is empty", reply_path.display());
    }
    match queue.submit(context).wait() {
        ReasoningOutcome::Completed { assessment, .. } => {
            if args.json {
                print_json(&assessment)?;
            } else {
                print_assessment(&assessment);
            }
            Ok(())
        }
        ReasoningOutcome::Failed(error) => Err(error).context("score reply"),
        ReasoningOutcome::Cancelled => bail!("reasoning request was cancelled"),
        ReasoningOutcome::TimedOut => {
            bail!("no reply within {} seconds", args.timeout)
        }
    }
}

pub fn run_query(args: &QueryArgs) -> Result<()> {
    let prepared = prepare_query(&args.text);
    debug!(valid = prepared.check.is_valid(), "query checked");
    if args.json {
        print_json(&prepared)?;
    }
    match &prepared.check {
        QueryCheck::Invalid(message) => bail!("{message}"),
        QueryCheck::ValidWithWarning(message) => eprintln!("warning: {message}"),
        QueryCheck::Valid => {}
    }
    if !args.json {
        println!("{}", prepared.query);
    }
    Ok(())
}

fn open_store(args: &ExposureArgs) -> Result<ExposureStore> {
    let _span = info_span!("ingest", path = %args.file.display()).entered();
    let options = ingest_options(args);
    ExposureStore::open(&args.file, &options)
        .with_context(|| format!("load {}", args.file.display()))
}

fn ingest_options(args: &ExposureArgs) -> IngestOptions {
    let day = if args.derive_days {
        DaySource::dates()
    } else {
        DaySource::column(&args.day_column)
    };
    let mut options = IngestOptions::default()
        .with_patient_column(&args.patient_column)
        .with_name_column(&args.name_column)
        .with_day_source(day)
        .with_day_offset(args.day_offset);
    if let Some(delimiter) = args.delimiter {
        options = options.with_delimiter(match delimiter {
            DelimiterArg::Tab => Delimiter::Tab,
            DelimiterArg::Comma => Delimiter::Comma,
            DelimiterArg::Space => Delimiter::Whitespace,
        });
    }
    options
}

fn load_reference(args: &ReferenceArgs) -> Result<(ToxicityReference, ClassifierOptions)> {
    let reference = read_toxicity_reference(&args.toxic_list)
        .with_context(|| format!("read toxic list {}", args.toxic_list.display()))?;
    if reference.is_empty() {
        bail!("toxic list {} has no entries", args.toxic_list.display());
    }

    let mut options = ClassifierOptions::default();
    if let Some(path) = &args.ici_list {
        let list = read_name_list(path)
            .with_context(|| format!("read ICI list {}", path.display()))?;
        options = options.with_ici(IciAllowList::new(list.ids, list.names));
    }
    for marker in &args.invalid_markers {
        options = options.with_invalid_marker(marker);
    }
    Ok((reference, options))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}
