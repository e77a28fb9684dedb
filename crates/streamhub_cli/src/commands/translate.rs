//! Translate command implementation.

use crate::output::{print_entity_text, EntityLine};
use serde::Serialize;
use std::path::Path;
use streamhub_engine::{StateToContent, StateTranslator, TranslatorFactory, TranslatorOptions};
use streamhub_protocol::StreamResponse;

/// Translation result.
#[derive(Debug, Serialize)]
pub struct TranslateResult {
    /// True if the response was a long-poll timeout.
    pub timeout: bool,
    /// Records in the response.
    pub records: usize,
    /// Entities produced, ordered by record key.
    pub entities: Vec<EntityLine>,
    /// Cursor the response advances to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_event_id: Option<String>,
}

/// Runs the translate command.
pub fn run(
    path: &Path,
    include_replies: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Cannot read response file {:?}: {}", path, e))?;
    let response: StreamResponse = streamhub_protocol::decode_json(&bytes)?;
    let result = translate(&response, include_replies);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

/// Translates every record of `response` with the default translator.
pub fn translate(response: &StreamResponse, include_replies: bool) -> TranslateResult {
    let StreamResponse::Data(payload) = response else {
        return TranslateResult {
            timeout: true,
            records: 0,
            entities: Vec::new(),
            max_event_id: None,
        };
    };

    let factory =
        StateToContent::new(TranslatorOptions::default().with_replies(include_replies));
    let mut translator = factory.translator(payload);
    let entities = payload
        .states
        .iter()
        .filter_map(|(id, state)| translator.write(id, state))
        .map(|entity| EntityLine::from(&entity))
        .collect();

    TranslateResult {
        timeout: false,
        records: payload.states.len(),
        entities,
        max_event_id: Some(payload.max_event_id.as_str().to_string()),
    }
}

fn print_text_output(result: &TranslateResult) {
    if result.timeout {
        println!("timeout: no new events");
        return;
    }
    for line in &result.entities {
        print_entity_text(line);
    }
    println!();
    println!(
        "{} of {} records produced entities",
        result.entities.len(),
        result.records
    );
    if let Some(cursor) = &result.max_event_id {
        println!("maxEventId: {}", cursor);
    }
}
