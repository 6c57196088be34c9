use anyhow::{Context, Result};
use cfgtree_core::{MemoryState, Reconciler, TypedBlock};
use fortimap::report::{render_report, render_summary};
use fortimap::resource::state_to_json;
use serde_json::json;

use crate::cli::{DecodeArgs, EncodeArgs, OutputFormat};
use crate::path_guard;
use crate::session::{read_json, read_state, write_json, Session};

pub fn run_decode(session: &Session, args: DecodeArgs) -> Result<()> {
    let schema = session.schema(&args.resource)?;
    let wire = read_json(&args.wire)?;
    let object = wire
        .as_object()
        .with_context(|| format!("{} does not hold a JSON object", args.wire.display()))?;

    let mut state = match &args.state {
        Some(path) => MemoryState::new(read_state(schema, path)?),
        None => MemoryState::default(),
    };
    let reconciler = Reconciler::new(schema, &session.patches, session.options(args.import_table));
    let report = reconciler
        .decode_all(object, &mut state)
        .with_context(|| format!("failed to decode {}", args.wire.display()))?;
    let typed = state_to_json(state.current());

    if let Some(out) = &args.output {
        let mut inputs = vec![args.wire.as_path()];
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
            if !args.summary {
                println!("{}", render_report(&report));
            }
            println!("{}", render_summary(&report));
            if args.output.is_none() && !args.summary {
                println!("{}", serde_json::to_string_pretty(&typed)?);
            }
        }
    }
    Ok(())
}

pub fn run_encode(session: &Session, args: EncodeArgs) -> Result<()> {
    let schema = session.schema(&args.resource)?;
    let current = read_state(schema, &args.state)?;
    let prior = match &args.prior {
        Some(path) => read_state(schema, path)?,
        None => TypedBlock::new(),
    };
    let state = MemoryState::with_prior(current, prior);

    let reconciler = Reconciler::new(schema, &session.patches, session.options(false));
    let body = reconciler
        .encode_all(&state)
        .with_context(|| format!("failed to encode {}", args.state.display()))?;
    let body = serde_json::Value::Object(body);

    match &args.output {
        Some(out) => {
            let mut inputs = vec![args.state.as_path()];
            inputs.extend(args.prior.as_deref());
            path_guard::ensure_output_not_input(out, &inputs)?;
            write_json(out, &body)?;
        }
        None => println!("{}", serde_json::to_string_pretty(&body)?),
    }
    Ok(())
}
