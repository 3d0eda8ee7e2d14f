//! Built-in practice content: prompt text per concept and the starter
//! wildcard pool written by `drill init`.

use crate::weights::{DEFAULT_WEIGHT, WeightStore};
use crate::wildcards::WildcardPool;

const CONCEPT_PROMPTS: &[(&str, &str)] = &[
    ("python-basics", "Practice Python variable assignment, data types, and basic operators with input/output operations."),
    ("python-functions", "Work with function definitions, parameters, return values, and scope management in Python."),
    ("python-data-structures", "Practice working with lists, dictionaries, sets, and tuples. Focus on data manipulation and nested structures."),
    ("python-oop", "Implement classes, objects, inheritance, and encapsulation. Focus on method design and attribute management."),
    ("algorithms", "Practice algorithmic thinking with sorting, searching, or graph traversal problems. Consider time complexity."),
    ("debugging", "Debug existing code with logical errors, syntax issues, or runtime exceptions. Practice systematic problem-solving."),
    ("testing", "Write unit tests, integration tests, or debugging test cases. Focus on edge cases and error handling."),
    ("system-design", "Design scalable systems, APIs, or data architectures. Consider performance, reliability, and maintainability."),
    ("javascript-fundamentals", "Practice JavaScript variables, functions, objects, and arrays. Focus on ES6+ features."),
    ("web-development", "Work with HTML, CSS, DOM manipulation, or frontend frameworks. Focus on responsive design."),
    ("database-design", "Design database schemas, write SQL queries, or work with database optimization and indexing."),
    ("api-development", "Create REST APIs, handle HTTP requests/responses, or work with API authentication and validation."),
    ("version-control", "Practice Git workflows, branching strategies, merge conflicts, or collaborative development patterns."),
    ("problem-solving", "Solve complex coding challenges that require breaking down problems into smaller, manageable components."),
];

const STARTER_WILDCARDS: &[(&str, &[&str])] = &[
    ("llm-integration", &[
        "Build a small CLI that sends a prompt to a chat completion API, streams the reply, and retries on rate limits with backoff.",
        "Write a function that splits a long document into overlapping chunks that fit a token budget, preserving paragraph boundaries.",
        "Implement structured output parsing: ask a model for JSON, validate it against a schema, and re-prompt with the error on failure.",
    ]),
    ("retrieval", &[
        "Implement cosine-similarity search over a list of embedding vectors and return the top-k matches with scores.",
        "Build a tiny keyword + vector hybrid ranker and combine both scores with reciprocal rank fusion.",
    ]),
    ("agents", &[
        "Write a tool-calling loop: parse a model's tool request, dispatch to a registry of functions, feed results back until done.",
        "Design a memory buffer for a conversational agent that summarizes old turns once a size limit is reached.",
    ]),
    ("evaluation", &[
        "Create a test harness that runs a fixed set of prompts, scores answers against references, and reports pass rate.",
        "Measure latency and token usage across several prompt variants and print a comparison table.",
    ]),
];

/// Practice prompt for a concept; unknown concepts (promoted wildcards, hand
/// additions) get a generic prompt.
pub fn concept_prompt(concept: &str) -> String {
    CONCEPT_PROMPTS
        .iter()
        .find(|(name, _)| *name == concept)
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| {
            format!("Practice advanced concepts in {concept} with focus on practical implementation.")
        })
}

/// Every built-in concept at the default weight, never practised.
pub fn starter_weights() -> WeightStore {
    CONCEPT_PROMPTS
        .iter()
        .map(|(name, _)| (*name, DEFAULT_WEIGHT))
        .collect()
}

pub fn starter_wildcards() -> WildcardPool {
    STARTER_WILDCARDS
        .iter()
        .map(|(cat, prompts)| (*cat, prompts.iter().map(|p| p.to_string()).collect()))
        .collect()
}
