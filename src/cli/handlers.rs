// src/cli/handlers.rs
use anyhow::Result;
use serde_json::json;

use crate::generators;
use crate::models::GenerationPolicy;

// Handlers for one-shot CLI commands

pub fn handle_generate(
    length: usize,
    no_uppercase: bool,
    no_lowercase: bool,
    no_numbers: bool,
    no_symbols: bool,
    json_output: bool,
) -> Result<()> {
    let policy = GenerationPolicy {
        length,
        include_uppercase: !no_uppercase,
        include_lowercase: !no_lowercase,
        include_numbers: !no_numbers,
        include_symbols: !no_symbols,
    };

    let password = generators::generate(&policy);
    let score = generators::strength_score(&password);
    let strength = generators::classify(&password);

    if json_output {
        let output = json!({
            "password": password,
            "strength": strength,
            "score": score,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", password);
        println!("Strength: {} ({}/7)", strength, score);
    }

    Ok(())
}

pub fn handle_strength(candidate: &str, json_output: bool) -> Result<()> {
    let score = generators::strength_score(candidate);
    let strength = generators::classify(candidate);
    let feedback = generators::improvement_hints(candidate);

    if json_output {
        let output = json!({
            "strength": strength,
            "score": score,
            "feedback": feedback,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Strength: {} ({}/7)", strength, score);
        for hint in &feedback {
            println!("• {}", hint);
        }
    }

    Ok(())
}
