use anyhow::{bail, Result};
use cfgtree_core::{MemoryState, TypedBlock};
use fortimap::client::JsonFileApi;
use fortimap::report::{render_report, render_summary};
use fortimap::resource::{state_to_json, ApplyAction, ReadOutcome, ResourceDriver};
use serde_json::json;

use crate::cli::{ApplyArgs, DeleteArgs, OutputFormat, ReadArgs};
use crate::path_guard;
use crate::session::{read_state, write_json, Session};

pub fn run_read(session: &Session, args: ReadArgs) -> Result<()> {
    let schema = session.schema(&args.resource)?;
    let driver = ResourceDriver::new(schema, &session.patches, session.options(args.import_table));
    let api = JsonFileApi::open(&args.store, &session.catalog)?;
    let params = session.params(&args.params);

    let mut state = match &args.state {
        Some(path) => MemoryState::new(read_state(schema, path)?),
        None => MemoryState::default(),
    };

    let report = match driver.read(&api, &mut state, &params, &args.key)? {
        ReadOutcome::Found(report) => report,
        ReadOutcome::Gone => {
            println!("{} '{}' not found; state cleared", args.resource, args.key);
            return Ok(());
        }
    };
    let typed = state_to_json(state.current());

    if let Some(out) = &args.output {
        let mut inputs = vec![args.store.as_path()];
        inputs.extend(args.state.as_deref());
        path_guard::ensure_output_not_input(out, &inputs)?;
        write_json(out, &typed)?;
    }

    match args.format {
        OutputFormat::Json => {
            let mut doc = json!({ "report": report });
            if args.output.is_none() {
                doc["state"] = typed;
            }
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            println!("{}", render_report(&report));
            println!("{}", render_summary(&report));
            if args.output.is_none() {
                println!("{}", serde_json::to_string_pretty(&typed)?);
            }
        }
    }
    Ok(())
}

pub fn run_apply(session: &Session, args: ApplyArgs) -> Result<()> {
    let schema = session.schema(&args.resource)?;
    let driver = ResourceDriver::new(schema, &session.patches, session.options(false));
    let mut api = JsonFileApi::open(&args.store, &session.catalog)?;
    let params = session.params(&args.params);

    let current = read_state(schema, &args.state)?;
    let prior = match &args.prior {
        Some(path) => read_state(schema, path)?,
        None => TypedBlock::new(),
    };
    let mut state = MemoryState::with_prior(current, prior);

    if let Some(out) = &args.output {
        let mut inputs = vec![args.state.as_path(), args.store.as_path()];
        inputs.extend(args.prior.as_deref());
        path_guard::ensure_output_not_input(out, &inputs)?;
    }

    let (action, outcome) = driver.apply(&mut api, &mut state, &params)?;
    let verb = match action {
        ApplyAction::Created => "created",
        ApplyAction::Updated => "updated",
    };
    let ReadOutcome::Found(report) = outcome else {
        bail!("{} disappeared from {} after being {verb}", args.resource, args.store.display());
    };
    let key = driver.object_id(&state)?;
    println!("{verb} {} '{key}'", args.resource);
    println!("{}", render_summary(&report));

    let typed = state_to_json(state.current());
    match &args.output {
        Some(out) => write_json(out, &typed)?,
        None => println!("{}", serde_json::to_string_pretty(&typed)?),
    }
    Ok(())
}

pub fn run_delete(session: &Session, args: DeleteArgs) -> Result<()> {
    let schema = session.schema(&args.resource)?;
    let driver = ResourceDriver::new(schema, &session.patches, session.options(false));
    let mut api = JsonFileApi::open(&args.store, &session.catalog)?;
    let params = session.params(&args.params);

    let mut state = driver.identity_state(&args.key)?;
    let key = driver.object_id(&state)?;
    driver.delete(&mut api, &mut state, &params)?;
    println!("deleted {} '{key}'", args.resource);
    Ok(())
}
