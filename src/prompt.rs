//! Prompt Composer: one natural-language template per operation.

use std::fmt;

/// What kind of text the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ArrayOfRecords,
    CodeSnippet,
    TestSnippet,
    PersonaList,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::ArrayOfRecords => "array-of-records",
            Operation::CodeSnippet => "code-snippet",
            Operation::TestSnippet => "test-snippet",
            Operation::PersonaList => "persona-list",
        })
    }
}

/// Everything needed to build one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    /// JSON array of `count` records matching a linearized proto definition.
    DefinitionRecords {
        name: String,
        definition: String,
        count: u32,
    },
    /// Faker-based JS code producing records for a proto definition.
    DefinitionCode { name: String, definition: String },
    /// `count` placeholder records for a free-text description.
    PlaceholderRecords { description: String, count: u32 },
    /// Tests for a source-code snippet, in the snippet's language.
    Tests { snippet: String },
    /// User personas for a product description.
    Personas { product: String },
}

impl GenerationRequest {
    pub fn operation(&self) -> Operation {
        match self {
            GenerationRequest::DefinitionRecords { .. }
            | GenerationRequest::PlaceholderRecords { .. } => Operation::ArrayOfRecords,
            GenerationRequest::DefinitionCode { .. } => Operation::CodeSnippet,
            GenerationRequest::Tests { .. } => Operation::TestSnippet,
            GenerationRequest::Personas { .. } => Operation::PersonaList,
        }
    }
}

const ID_AND_IMAGE_HINT: &str = "Use only UUID for id fields and working image urls if needed";

/// Render the prompt text for `request`. Counts and context are embedded verbatim.
pub fn compose(request: &GenerationRequest) -> String {
    match request {
        GenerationRequest::DefinitionRecords {
            name,
            definition,
            count,
        } => format!(
            "Generate valid JSON array with {count} unique items and each item satisfying the \"{name}\" proto definition. {ID_AND_IMAGE_HINT}\n\n{definition}"
        ),
        GenerationRequest::DefinitionCode { name, definition } => format!(
            "Generate JS code with \"@faker-js/faker\" library to create mock data for the \"{name}\" proto definition in object format. {ID_AND_IMAGE_HINT}\n\n{definition}"
        ),
        GenerationRequest::PlaceholderRecords { description, count } => {
            format!("Generate {count} placeholder data for {description}")
        }
        GenerationRequest::Tests { snippet } => format!(
            "Generate tests code for the following code snippet based on what it does in the same language. Respond with only the code, no commentary\n\n{snippet}"
        ),
        GenerationRequest::Personas { product } => format!(
            "Create a few user personas with name alliterations and different backgrounds for {product}. Also add behavior, needs and wants, demographics to each persona"
        ),
    }
}
