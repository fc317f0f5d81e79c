//! Classification behavior against a scripted generator.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt};
use jungai_classifier::{
    classify_with_backoff, ChatRequest, Classifier, ClassifierError, ClassifierOptions,
    TextGenerator,
};
use jungai_core::{Archetype, BrandQuery, SourceKind, TruncationPolicy};
use jungai_sources::{AggregatedCorpus, SourceDocument};

struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, ClassifierError>>>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, ClassifierError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl TextGenerator for &ScriptedGenerator {
    fn model(&self) -> &str {
        "scripted-model"
    }

    fn generate<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<String, ClassifierError>> {
        self.seen.lock().unwrap().push(request.clone());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()));
        async move { next }.boxed()
    }
}

fn unavailable(status: u16) -> ClassifierError {
    ClassifierError::ModelUnavailable {
        status: Some(status),
        reason: "service error".to_owned(),
    }
}

fn corpus() -> AggregatedCorpus {
    let docs = vec![
        SourceDocument::new(
            SourceKind::Search,
            "https://acme.example/about",
            Some("About Acme".to_owned()),
            "Acme builds off-road gear for people who explore uncharted trails and map their own path.",
        ),
        SourceDocument::new(
            SourceKind::Discussion,
            "https://www.reddit.com/r/gear/comments/1",
            None,
            "Their adventure ads make me want to roam. Real frontier energy.",
        ),
    ];
    AggregatedCorpus::from_documents(
        BrandQuery::new("Acme Outdoors"),
        docs,
        Vec::new(),
        8_000,
        TruncationPolicy::Priority,
    )
    .expect("corpus has text")
}

fn options() -> ClassifierOptions {
    ClassifierOptions {
        max_input_tokens: 3_000,
        policy: TruncationPolicy::Priority,
    }
}

#[tokio::test]
async fn json_reply_is_classified_on_first_attempt() {
    let generator = ScriptedGenerator::new(vec![Ok(
        r#"{"archetype": "Explorer", "justification": "Trails and discovery."}"#.to_owned(),
    )]);
    let classifier = Classifier::new(&generator, options());
    let corpus = corpus();

    let verdict = classifier.classify(&corpus).await.expect("verdict");

    assert_eq!(verdict.archetype(), Archetype::Explorer);
    assert_eq!(verdict.justification(), "Trails and discovery.");
    assert_eq!(verdict.model(), "scripted-model");
    assert_eq!(verdict.attempts(), 1);
    assert_eq!(verdict.corpus().brand, "Acme Outdoors");
    assert_eq!(verdict.corpus().document_count, 2);
    assert_eq!(verdict.corpus().fingerprint, corpus.fingerprint());
    assert!(verdict.patterns_found().contains(&"off road".to_owned()));
    assert!(verdict.patterns_found().contains(&"uncharted".to_owned()));
    assert!(!verdict.patterns_missing().is_empty());
    assert!(verdict
        .patterns_missing()
        .iter()
        .all(|kw| !verdict.patterns_found().contains(kw)));
    assert!(verdict.patterns_found_all().contains_key("Explorer"));
    assert!(verdict.suggestions()[0].starts_with("Use words like: "));
    assert_eq!(generator.calls(), 1);

    let first = &generator.seen.lock().unwrap()[0];
    assert!(first.json_response);
    assert!(first.user.contains("https://acme.example/about"));
}

#[tokio::test]
async fn unreadable_reply_gets_one_strict_retry() {
    let generator = ScriptedGenerator::new(vec![
        Ok("Hard to tell, maybe Hero or Explorer.".to_owned()),
        Ok("Explorer\nOpen-road imagery throughout.".to_owned()),
    ]);
    let classifier = Classifier::new(&generator, options());

    let verdict = classifier.classify(&corpus()).await.expect("verdict");

    assert_eq!(verdict.archetype(), Archetype::Explorer);
    assert_eq!(verdict.justification(), "Open-road imagery throughout.");
    assert_eq!(verdict.attempts(), 2);

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].user, seen[1].user, "retry must use the strict prompt");
}

#[tokio::test]
async fn two_unreadable_replies_fail_after_exactly_two_calls() {
    let generator = ScriptedGenerator::new(vec![
        Ok("no idea".to_owned()),
        Ok("still no idea".to_owned()),
        Ok("Sage".to_owned()),
    ]);
    let classifier = Classifier::new(&generator, options());

    let err = classifier.classify(&corpus()).await.unwrap_err();

    match err {
        ClassifierError::ClassificationParse { response, .. } => {
            assert_eq!(response, "still no idea");
        }
        other => panic!("expected ClassificationParse, got {other:?}"),
    }
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn unavailable_model_is_not_parse_retried() {
    let generator = ScriptedGenerator::new(vec![Err(unavailable(401))]);
    let classifier = Classifier::new(&generator, options());

    let err = classifier.classify(&corpus()).await.unwrap_err();

    assert!(matches!(
        err,
        ClassifierError::ModelUnavailable {
            status: Some(401),
            ..
        }
    ));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn backoff_retries_transient_failures_then_classifies() {
    let generator = ScriptedGenerator::new(vec![
        Err(unavailable(503)),
        Ok(r#"{"archetype": "explorer"}"#.to_owned()),
    ]);
    let classifier = Classifier::new(&generator, options());

    let verdict = classify_with_backoff(&classifier, &corpus(), 2, 0)
        .await
        .expect("verdict");

    assert_eq!(verdict.archetype(), Archetype::Explorer);
    assert_eq!(verdict.attempts(), 1);
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn input_limit_without_room_for_text_sends_nothing() {
    let generator = ScriptedGenerator::new(vec![Ok("Explorer".to_owned())]);
    let classifier = Classifier::new(
        &generator,
        ClassifierOptions {
            max_input_tokens: 200,
            policy: TruncationPolicy::Priority,
        },
    );

    let err = classifier.classify(&corpus()).await.unwrap_err();

    assert!(matches!(err, ClassifierError::InputBudget { limit: 800, .. }), "{err}");
    assert!(!err.is_transient());
    assert_eq!(generator.calls(), 0);
}
