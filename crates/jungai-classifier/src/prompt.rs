//! Prompt construction and input budgeting.

use std::fmt::Write as _;

use jungai_core::{Archetype, TruncationPolicy};
use jungai_sources::{allocate_budget, text::clip_chars, AggregatedCorpus, CorpusEntry};

use crate::error::ClassifierError;
use crate::generator::ChatRequest;

/// Rough characters-per-token ratio used to turn a token limit into a
/// character budget.
pub const CHARS_PER_TOKEN: usize = 4;

const ANSWER_SHAPE: &str = "Respond with a JSON object of the form \
{\"archetype\": \"<one label from the list>\", \"justification\": \"<one or two sentences citing the text>\"}.";

/// System message naming the twelve labels with a one-line description each.
#[must_use]
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You classify brands into exactly one of twelve brand archetypes, \
using only the text provided about the brand.\n\nArchetypes:\n",
    );
    for archetype in Archetype::ALL {
        let _ = writeln!(prompt, "- {}: {}", archetype.label(), archetype.description());
    }
    prompt
}

/// Instruction appended to the user message after an unreadable reply.
#[must_use]
pub fn strict_instruction() -> String {
    let labels: Vec<&str> = Archetype::ALL.iter().map(|a| a.label()).collect();
    format!(
        "Your previous reply could not be read. Reply with exactly one of these labels \
on the first line and nothing else on that line: {}. You may add a one-sentence \
justification on the second line.",
        labels.join(", ")
    )
}

/// The two requests a classification may send.
#[derive(Debug, Clone)]
pub struct PromptPair {
    pub initial: ChatRequest,
    pub strict: ChatRequest,
    /// Corpus characters that made it into the prompt.
    pub corpus_chars: usize,
}

/// Build the initial and strict-retry requests for `corpus`.
///
/// The whole prompt is kept within `max_input_tokens * CHARS_PER_TOKEN`
/// characters. Fixed text is charged first, then the headers of as many
/// leading documents as fit with room for text; the remainder is spread over
/// those excerpts with `policy`. Documents allotted nothing are left out
/// together with their header.
///
/// # Errors
///
/// Returns [`ClassifierError::InputBudget`] when no corpus text fits.
pub fn build_prompts(
    corpus: &AggregatedCorpus,
    max_input_tokens: usize,
    policy: TruncationPolicy,
) -> Result<PromptPair, ClassifierError> {
    let system = system_prompt();
    let strict_suffix = format!("\n\n{}", strict_instruction());
    let intro = format!(
        "Brand: {}\n\n{ANSWER_SHAPE}\n\nText collected about the brand:\n",
        corpus.brand().name()
    );

    let headers: Vec<String> = corpus
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "\n[{}] {}\n",
                entry.document().kind(),
                entry.document().locator()
            )
        })
        .collect();

    let limit = max_input_tokens.saturating_mul(CHARS_PER_TOKEN);
    let fixed = char_len(&system) + char_len(&intro) + char_len(&strict_suffix);

    // Each included document costs its header plus the newline after its text.
    let mut overhead = fixed;
    let mut included = 0;
    for header in &headers {
        let cost = char_len(header) + 1;
        if overhead + cost >= limit {
            break;
        }
        overhead += cost;
        included += 1;
    }
    if included == 0 {
        return Err(ClassifierError::InputBudget {
            limit,
            required: fixed + headers.first().map_or(0, |h| char_len(h) + 2),
        });
    }
    let text_budget = limit - overhead;

    let lengths: Vec<usize> = corpus.entries()[..included]
        .iter()
        .map(CorpusEntry::excerpt_chars)
        .collect();
    let allocation = allocate_budget(&lengths, text_budget, policy);

    let mut user = intro;
    let mut corpus_chars = 0;
    for ((entry, header), keep) in corpus.entries().iter().zip(&headers).zip(allocation) {
        if keep == 0 {
            continue;
        }
        user.push_str(header);
        user.push_str(clip_chars(entry.excerpt(), keep));
        user.push('\n');
        corpus_chars += keep;
    }

    let strict_user = format!("{user}{strict_suffix}");
    Ok(PromptPair {
        initial: ChatRequest {
            system: system.clone(),
            user,
            json_response: true,
        },
        strict: ChatRequest {
            system,
            user: strict_user,
            json_response: false,
        },
        corpus_chars,
    })
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use jungai_core::{BrandQuery, SourceKind};
    use jungai_sources::{merge_batches, ConnectorBatch, SourceDocument};

    use super::*;

    fn corpus(texts: &[(SourceKind, &str)]) -> AggregatedCorpus {
        let batches = texts
            .iter()
            .enumerate()
            .map(|(i, (kind, text))| ConnectorBatch {
                slot: i,
                priority: 1,
                documents: vec![SourceDocument::new(
                    *kind,
                    format!("https://x.example/{i}"),
                    None,
                    text,
                )],
            })
            .collect();
        merge_batches(
            &BrandQuery::new("AcmeCorp"),
            batches,
            vec![],
            100_000,
            TruncationPolicy::Priority,
        )
        .expect("corpus")
    }

    #[test]
    fn system_prompt_lists_all_labels() {
        let prompt = system_prompt();
        for archetype in Archetype::ALL {
            assert!(prompt.contains(&format!("- {}:", archetype.label())));
        }
    }

    #[test]
    fn prompts_include_brand_and_source_headers() {
        let c = corpus(&[(SourceKind::Search, "We explore the wild.")]);
        let prompts = build_prompts(&c, 3000, TruncationPolicy::Priority).expect("prompts");
        assert!(prompts.initial.user.contains("Brand: AcmeCorp"));
        assert!(prompts.initial.user.contains("[search] https://x.example/0"));
        assert!(prompts.initial.user.contains("We explore the wild."));
        assert!(prompts.initial.json_response);
        assert!(!prompts.strict.json_response);
        assert!(prompts.strict.user.ends_with(&strict_instruction()));
        assert_eq!(prompts.corpus_chars, 20);
    }

    #[test]
    fn prompt_stays_within_token_budget() {
        let long = "word ".repeat(3000);
        let c = corpus(&[
            (SourceKind::Search, long.as_str()),
            (SourceKind::VideoTranscript, long.as_str()),
            (SourceKind::Discussion, long.as_str()),
        ]);
        for policy in [TruncationPolicy::Priority, TruncationPolicy::Balanced] {
            let prompts = build_prompts(&c, 1000, policy).expect("prompts");
            let total =
                prompts.strict.system.chars().count() + prompts.strict.user.chars().count();
            assert!(total <= 1000 * CHARS_PER_TOKEN, "{policy}: {total}");
            assert!(prompts.corpus_chars > 0);
        }
    }

    #[test]
    fn budgeting_is_deterministic() {
        let a = "a".repeat(3000);
        let b = "b".repeat(3000);
        let c = corpus(&[
            (SourceKind::Search, a.as_str()),
            (SourceKind::Discussion, b.as_str()),
        ]);
        let first = build_prompts(&c, 1500, TruncationPolicy::Balanced).expect("prompts");
        let second = build_prompts(&c, 1500, TruncationPolicy::Balanced).expect("prompts");
        assert_eq!(first.initial, second.initial);
        assert_eq!(first.strict, second.strict);
    }

    #[test]
    fn limit_below_fixed_prompt_is_rejected() {
        let c = corpus(&[(SourceKind::Search, "We explore the wild.")]);
        let fixed = system_prompt().chars().count();
        let err = build_prompts(&c, fixed / CHARS_PER_TOKEN, TruncationPolicy::Priority)
            .expect_err("no room for text");
        match err {
            ClassifierError::InputBudget { limit, required } => {
                assert!(required > limit, "{required} <= {limit}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tight_limit_keeps_leading_documents_only() {
        let text = "word ".repeat(400);
        let c = corpus(&[
            (SourceKind::Search, text.as_str()),
            (SourceKind::VideoTranscript, text.as_str()),
            (SourceKind::Discussion, text.as_str()),
        ]);
        let fixed = system_prompt().chars().count()
            + strict_instruction().chars().count()
            + "Brand: AcmeCorp".chars().count()
            + ANSWER_SHAPE.chars().count()
            + 60;
        let max_tokens = (fixed + 40) / CHARS_PER_TOKEN;
        let prompts =
            build_prompts(&c, max_tokens, TruncationPolicy::Balanced).expect("prompts");
        let total = prompts.strict.system.chars().count() + prompts.strict.user.chars().count();
        assert!(prompts.corpus_chars > 0);
        assert!(total <= max_tokens * CHARS_PER_TOKEN, "{total}");
        assert!(prompts.initial.user.contains("[search] https://x.example/0"));
    }
}
