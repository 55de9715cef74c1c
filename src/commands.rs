//! One handler per CLI subcommand. Each gathers its inputs (flags first,
//! then the prompter), runs the generation pipeline and reports an
//! [`Outcome`] for `main` to print.

use std::path::PathBuf;

use tracing::info;

use crate::error::AppError;
use crate::interactive::Prompter;
use crate::llm::Generator;
use crate::output::atomic_write;
use crate::progress::Console;
use crate::prompt::{compose, GenerationRequest};
use crate::proto::{linearize, DefinitionIndex};
use crate::settings::{LlmConfigInfo, LlmProviderConfig};
use crate::source::SourceSelector;

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Result written to `path`.
    Written { path: PathBuf, summary: String },
    /// Result to print on stdout after the summary.
    Printed { summary: String, body: String },
}

// ── Arguments ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ProtoArgs {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub code: bool,
    pub definition: Option<String>,
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceholderArgs {
    pub description: Option<String>,
    pub count: Option<u32>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TestsArgs {
    /// `path[#start:end]`
    pub source: String,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct PersonaArgs {
    pub product: Option<String>,
    pub output: Option<PathBuf>,
}

/// Both positional paths are required; missing either is a usage error.
pub fn require_paths<S, D>(source: Option<S>, destination: Option<D>) -> Result<(S, D), AppError> {
    match (source, destination) {
        (Some(s), Some(d)) => Ok((s, d)),
        _ => Err(AppError::validation(
            "Input and output file paths must be defined",
        )),
    }
}

// ── Handlers ─────────────────────────────────────────────────────

/// `proto <source> <destination> [--code]`
pub async fn proto<G: Generator, P: Prompter>(
    generator: &G,
    prompter: &P,
    console: Console,
    args: ProtoArgs,
) -> Result<Outcome, AppError> {
    if args.source.extension().and_then(|e| e.to_str()) != Some("proto") {
        return Err(AppError::validation("Input file must be a .proto file"));
    }

    let spinner = console.spinner("Scanning for definitions");
    let index = DefinitionIndex::build(&args.source);
    spinner.stop();
    let index = index?;

    if index.is_empty() {
        return Err(AppError::EmptyDefinitionSet {
            path: args.source.display().to_string(),
        });
    }
    info!(path = %args.source.display(), count = index.len(), "indexed definitions");
    console.status(&format!("{} definitions found", index.len()));

    let name = match args.definition {
        Some(name) if index.contains(&name) => name,
        Some(name) => return Err(AppError::UnknownDefinition { name }),
        None => choose_definition(&index, prompter)?,
    };

    let count = if args.code {
        None
    } else {
        Some(match args.count {
            Some(n) => n,
            None => prompter.count("Number of records to generate?", Some(1), "--count")?,
        })
    };

    let definition = linearize(&index, &name)?;
    let request = match count {
        None => GenerationRequest::DefinitionCode {
            name: name.clone(),
            definition,
        },
        Some(count) => GenerationRequest::DefinitionRecords {
            name: name.clone(),
            definition,
            count,
        },
    };

    let spinner_text = if args.code {
        "Generating code for generating mock data for proto definition 🪄"
    } else {
        "Generating mock data for proto definition 🪄"
    };
    let text = generate(generator, console, &request, spinner_text).await?;
    atomic_write(&args.destination, text.as_bytes())?;

    let summary = if args.code {
        "✅ Code for mock data generated successfully 🐙"
    } else {
        "✅ Mock data generated successfully 🐙"
    };
    Ok(Outcome::Written {
        path: args.destination,
        summary: summary.to_string(),
    })
}

/// `placeholder`
pub async fn placeholder<G: Generator, P: Prompter>(
    generator: &G,
    prompter: &P,
    console: Console,
    args: PlaceholderArgs,
) -> Result<Outcome, AppError> {
    let description = match args.description.filter(|d| !d.trim().is_empty()) {
        Some(d) => d,
        None => prompter.text("What do you want placeholder for?", "--description")?,
    };
    let count = match args.count {
        Some(n) => n,
        None => prompter.count("Number of records to generate?", Some(1), "--count")?,
    };

    let request = GenerationRequest::PlaceholderRecords { description, count };
    let text = generate(generator, console, &request, "Generating mock placeholder data 🪄").await?;
    finish(text, args.output, "✅ Mock data generated successfully 🐙")
}

/// `tests <source[#start:end]> <destination>`
pub async fn tests<G: Generator>(
    generator: &G,
    console: Console,
    args: TestsArgs,
) -> Result<Outcome, AppError> {
    let selector = SourceSelector::parse(&args.source)?;
    let snippet = selector.read()?;
    info!(
        path = %selector.path.display(),
        start = selector.start,
        end = ?selector.end,
        "read code snippet"
    );

    let request = GenerationRequest::Tests { snippet };
    let text = generate(generator, console, &request, "Generating tests for code snippet 🪄").await?;
    atomic_write(&args.destination, text.as_bytes())?;

    Ok(Outcome::Written {
        path: args.destination,
        summary: "✅ Test cases generated successfully 🐙".to_string(),
    })
}

/// `persona`
pub async fn persona<G: Generator, P: Prompter>(
    generator: &G,
    prompter: &P,
    console: Console,
    args: PersonaArgs,
) -> Result<Outcome, AppError> {
    let product = match args.product.filter(|p| !p.trim().is_empty()) {
        Some(p) => p,
        None => prompter.text("Describe your product:", "--product")?,
    };

    let request = GenerationRequest::Personas { product };
    let text = generate(
        generator,
        console,
        &request,
        "Generating user personas for the product 🪄",
    )
    .await?;
    finish(text, args.output, "✅ User personas generated successfully 🐙")
}

/// `config`: the resolved provider with the key redacted.
pub fn show_config(config: &LlmProviderConfig) -> Result<Outcome, AppError> {
    let info = LlmConfigInfo::from_config(config);
    let body = serde_json::to_string_pretty(&info)
        .map_err(|e| AppError::validation(format!("Failed to render config: {e}")))?;
    Ok(Outcome::Printed {
        summary: format!("Using {}", config.provider.display_name()),
        body,
    })
}

// ── Helpers ──────────────────────────────────────────────────────

fn choose_definition<P: Prompter>(index: &DefinitionIndex, prompter: &P) -> Result<String, AppError> {
    let names: Vec<&str> = index.names().collect();
    let options: Vec<String> = index
        .definitions()
        .map(|d| format!("{} ({} fields)", d.name, d.fields.len()))
        .collect();
    let choice = prompter.select(
        "Which definition do you want mock data for?",
        &options,
        "--definition",
    )?;
    names
        .get(choice)
        .map(|n| (*n).to_string())
        .ok_or_else(|| AppError::validation(format!("No definition at position {choice}")))
}

async fn generate<G: Generator>(
    generator: &G,
    console: Console,
    request: &GenerationRequest,
    spinner_text: &str,
) -> Result<String, AppError> {
    let prompt = compose(request);
    info!(operation = %request.operation(), prompt_len = prompt.len(), "generating");

    let spinner = console.spinner(spinner_text);
    let result = generator.generate(&prompt).await;
    spinner.stop();
    result
}

fn finish(text: String, output: Option<PathBuf>, summary: &str) -> Result<Outcome, AppError> {
    match output {
        Some(path) => {
            atomic_write(&path, text.as_bytes())?;
            Ok(Outcome::Written {
                path,
                summary: summary.to_string(),
            })
        }
        None => Ok(Outcome::Printed {
            summary: summary.to_string(),
            body: text,
        }),
    }
}
