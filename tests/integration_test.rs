use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_test::{assert_err, assert_ok};

use quizzical::clients::{BatchRequest, QuestionProvider, SummaryProvider};
use quizzical::error::{AppError, ProviderError, SummaryError, ValidationError};
use quizzical::models::{Question, SessionStatus};
use quizzical::services::AlternativePlacement;
use quizzical::{Config, QuizController, SummaryMerge};

const CAPITALS: [&str; 5] = ["Paris", "Berlin", "Rome", "Madrid", "Oslo"];

fn capital_questions() -> Vec<Question> {
    CAPITALS
        .iter()
        .map(|capital| {
            Question::new(
                format!("What is the capital city here? ({})", capital),
                *capital,
                [
                    "Lisbon".to_string(),
                    "Stockholm".to_string(),
                    "Vienna".to_string(),
                ],
            )
            .with_metadata("Geography", "easy")
        })
        .collect()
}

/// 题库：按调用次序返回，`failing_calls` 中的那几次返回错误
struct ScriptedQuestions {
    calls: AtomicUsize,
    failing_calls: Vec<usize>,
    batch_size: usize,
}

impl ScriptedQuestions {
    fn reliable() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing_calls: Vec::new(),
            batch_size: CAPITALS.len(),
        }
    }

    fn failing_on(calls: &[usize]) -> Self {
        Self {
            failing_calls: calls.to_vec(),
            ..Self::reliable()
        }
    }

    fn short(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::reliable()
        }
    }
}

#[async_trait]
impl QuestionProvider for ScriptedQuestions {
    async fn fetch_batch(&self, request: &BatchRequest) -> Result<Vec<Question>, ProviderError> {
        assert_eq!(request.amount, CAPITALS.len());

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_calls.contains(&call) {
            return Err(ProviderError::BadResponseCode { code: 5 });
        }
        Ok(capital_questions().into_iter().take(self.batch_size).collect())
    }
}

/// 摘要：需要先放行（gate）才返回，`missing` 中的关键字返回未找到
struct GatedSummaries {
    gate: Arc<Semaphore>,
    missing: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl GatedSummaries {
    fn open() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
            missing: HashSet::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn closed() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            ..Self::open()
        }
    }

    fn missing(titles: &[&str]) -> Self {
        Self {
            missing: titles.iter().map(|t| t.to_string()).collect(),
            ..Self::open()
        }
    }
}

#[async_trait]
impl SummaryProvider for GatedSummaries {
    async fn fetch_summary(&self, title: &str) -> Result<String, SummaryError> {
        self.requested.lock().unwrap().push(title.to_string());
        let _permit = self.gate.acquire().await.expect("gate closed");

        if self.missing.contains(title) {
            return Err(SummaryError::NotFound {
                title: title.to_string(),
            });
        }
        Ok(format!("{} is a capital city.", title))
    }
}

fn controller_with(
    questions: ScriptedQuestions,
    summaries: Arc<GatedSummaries>,
) -> QuizController {
    QuizController::new(&Config::default(), Arc::new(questions), summaries)
        .with_placement(AlternativePlacement::with_seed(17))
}

fn answer_all(controller: &mut QuizController, answers: &[&str]) {
    for (index, value) in answers.iter().enumerate() {
        assert_ok!(controller.select_answer(index, value));
    }
}

fn answer_correctly(controller: &mut QuizController) {
    answer_all(controller, &CAPITALS);
}

#[tokio::test]
async fn test_lengths_match_after_start() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_eq!(controller.status(), SessionStatus::NotStarted);

    assert_ok!(controller.start().await);

    assert_eq!(controller.status(), SessionStatus::InProgress);
    assert_eq!(controller.questions().len(), 5);
    assert_eq!(controller.answers().len(), 5);
    assert_eq!(controller.summaries().len(), 5);
    assert!(controller.answers().iter().all(Option::is_none));
    assert!(controller.summaries().iter().all(Option::is_none));

    for question in controller.questions() {
        assert_eq!(question.alternatives().len(), 4);
        assert_eq!(question.alternatives()[question.slot()], question.correct_answer());
    }
}

#[tokio::test]
async fn test_select_answer_is_idempotent() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_ok!(controller.start().await);

    assert_ok!(controller.select_answer(1, "Berlin"));
    let after_first = controller.answers().to_vec();
    assert_ok!(controller.select_answer(1, "Berlin"));

    assert_eq!(controller.answers(), after_first.as_slice());
    assert_eq!(controller.answers()[1].as_deref(), Some("Berlin"));
}

#[tokio::test]
async fn test_answers_can_be_overwritten_while_in_progress() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_ok!(controller.start().await);

    assert_ok!(controller.select_answer(0, "Vienna"));
    assert_ok!(controller.select_answer(0, "Paris"));
    assert_eq!(controller.answers()[0].as_deref(), Some("Paris"));
}

#[tokio::test]
async fn test_placement_is_stable_across_reads() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_ok!(controller.start().await);

    let before: Vec<Vec<String>> = controller
        .questions()
        .iter()
        .map(|q| q.alternatives().to_vec())
        .collect();

    answer_correctly(&mut controller);
    assert_ok!(controller.submit());
    controller.await_enrichment().await;

    let after: Vec<Vec<String>> = controller
        .questions()
        .iter()
        .map(|q| q.alternatives().to_vec())
        .collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_score_counts_matching_answers() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_ok!(controller.start().await);
    answer_all(
        &mut controller,
        &["Paris", "Lisbon", "Rome", "Madrid", "Stockholm"],
    );

    let score = assert_ok!(controller.submit());

    assert_eq!(score, 3);
    assert_eq!(controller.score(), Some(3));
    assert_eq!(controller.status(), SessionStatus::Submitted);

    let review = assert_ok!(controller.review());
    let correct: Vec<bool> = review.iter().map(|r| r.is_correct).collect();
    assert_eq!(correct, [true, false, true, true, false]);
    assert_eq!(review[4].correct_answer, "Oslo");
}

#[tokio::test]
async fn test_submit_with_unanswered_question_is_rejected() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_ok!(controller.start().await);
    for index in [0, 1, 3, 4] {
        assert_ok!(controller.select_answer(index, CAPITALS[index]));
    }
    let answers_before = controller.answers().to_vec();

    let err = assert_err!(controller.submit());

    match err {
        AppError::Validation(ValidationError::Unanswered { unanswered }) => {
            assert_eq!(unanswered, vec![2]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(controller.status(), SessionStatus::InProgress);
    assert_eq!(controller.score(), None);
    assert_eq!(controller.answers(), answers_before.as_slice());
    assert_eq!(controller.pending_summaries(), 0);
}

#[tokio::test]
async fn test_answers_are_frozen_after_submit() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_ok!(controller.start().await);
    answer_correctly(&mut controller);
    assert_ok!(controller.submit());
    let frozen = controller.answers().to_vec();

    let err = assert_err!(controller.select_answer(0, "Lisbon"));
    assert!(matches!(
        err,
        AppError::InvalidState {
            current: SessionStatus::Submitted,
            ..
        }
    ));
    assert!(controller.submit().is_err());

    controller.await_enrichment().await;
    assert_eq!(controller.answers(), frozen.as_slice());
    assert_eq!(controller.score(), Some(5));
}

#[tokio::test]
async fn test_enrichment_fills_every_summary() {
    let summaries = Arc::new(GatedSummaries::open());
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::clone(&summaries));
    assert_ok!(controller.start().await);
    answer_all(
        &mut controller,
        &["Vienna", "Vienna", "Vienna", "Vienna", "Vienna"],
    );
    assert_eq!(assert_ok!(controller.submit()), 0);

    controller.await_enrichment().await;

    for (summary, capital) in controller.summaries().iter().zip(CAPITALS) {
        assert_eq!(
            summary.as_deref(),
            Some(format!("{} is a capital city.", capital).as_str())
        );
    }
    // 按正确答案查询，而不是用户的答案
    let mut requested = summaries.requested.lock().unwrap().clone();
    requested.sort();
    let mut expected: Vec<String> = CAPITALS.iter().map(|c| c.to_string()).collect();
    expected.sort();
    assert_eq!(requested, expected);
}

#[tokio::test]
async fn test_partial_enrichment_failure_keeps_sentinel() {
    let mut controller = controller_with(
        ScriptedQuestions::reliable(),
        Arc::new(GatedSummaries::missing(&["Rome"])),
    );
    assert_ok!(controller.start().await);
    answer_correctly(&mut controller);
    assert_ok!(controller.submit());

    let mut outcomes = Vec::new();
    for _ in 0..5 {
        outcomes.push(controller.recv_summary_update().await.expect("channel open"));
    }

    assert!(outcomes.contains(&SummaryMerge::Unavailable { index: 2 }));
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, SummaryMerge::Merged { .. }))
            .count(),
        4
    );
    assert_eq!(controller.summaries()[2], None);
    for index in [0, 1, 3, 4] {
        assert!(controller.summaries()[index].is_some());
    }
    assert_eq!(controller.status(), SessionStatus::Submitted);
    assert_eq!(controller.score(), Some(5));
    assert_eq!(controller.pending_summaries(), 0);
}

#[tokio::test]
async fn test_stale_enrichment_never_reaches_new_session() {
    let summaries = Arc::new(GatedSummaries::closed());
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::clone(&summaries));

    assert_ok!(controller.start().await);
    answer_correctly(&mut controller);
    assert_ok!(controller.submit());
    let first_generation = controller.generation();

    controller.reset();
    assert_eq!(controller.status(), SessionStatus::NotStarted);
    assert_ok!(controller.start().await);
    assert_ne!(controller.generation(), first_generation);

    // 放行第一局的全部请求
    summaries.gate.add_permits(5);
    for _ in 0..5 {
        let outcome = controller.recv_summary_update().await.expect("channel open");
        assert_eq!(
            outcome,
            SummaryMerge::Stale {
                generation: first_generation
            }
        );
    }
    assert_eq!(controller.status(), SessionStatus::InProgress);
    assert!(controller.summaries().iter().all(Option::is_none));
    assert!(controller.answers().iter().all(Option::is_none));

    // 新会话自己的摘要正常合并
    answer_correctly(&mut controller);
    assert_ok!(controller.submit());
    controller.await_enrichment().await;
    assert!(controller.summaries().iter().all(Option::is_some));
}

#[tokio::test]
async fn test_start_from_submitted_discards_pending_enrichment() {
    let summaries = Arc::new(GatedSummaries::closed());
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::clone(&summaries));

    assert_ok!(controller.start().await);
    answer_correctly(&mut controller);
    assert_ok!(controller.submit());
    assert_eq!(controller.pending_summaries(), 5);

    // 不经 reset 直接开始新一局
    assert_ok!(controller.start().await);
    assert_eq!(controller.pending_summaries(), 0);

    summaries.gate.add_permits(5);
    for _ in 0..5 {
        let outcome = controller.recv_summary_update().await.expect("channel open");
        assert!(!outcome.is_current());
    }
    assert!(controller.summaries().iter().all(Option::is_none));
}

#[tokio::test]
async fn test_provider_error_keeps_prior_session() {
    let mut controller = controller_with(
        ScriptedQuestions::failing_on(&[1]),
        Arc::new(GatedSummaries::open()),
    );
    assert_ok!(controller.start().await);
    answer_correctly(&mut controller);
    assert_ok!(controller.submit());
    controller.await_enrichment().await;
    let generation = controller.generation();
    let summaries = controller.summaries().to_vec();

    let err = assert_err!(controller.start().await);
    assert!(err.is_provider());
    assert_eq!(controller.status(), SessionStatus::Submitted);
    assert_eq!(controller.generation(), generation);
    assert_eq!(controller.score(), Some(5));
    assert_eq!(controller.summaries(), summaries.as_slice());

    // 重试成功
    assert_ok!(controller.start().await);
    assert_eq!(controller.status(), SessionStatus::InProgress);
    assert!(controller.generation() > generation);
}

#[tokio::test]
async fn test_first_start_failure_can_be_retried() {
    let mut controller = controller_with(
        ScriptedQuestions::failing_on(&[0]),
        Arc::new(GatedSummaries::open()),
    );

    assert_err!(controller.start().await);
    assert_eq!(controller.status(), SessionStatus::NotStarted);
    assert!(controller.questions().is_empty());

    assert_ok!(controller.start().await);
    assert_eq!(controller.questions().len(), 5);
}

#[tokio::test]
async fn test_short_batch_is_provider_error() {
    let mut controller = controller_with(ScriptedQuestions::short(3), Arc::new(GatedSummaries::open()));

    let err = assert_err!(controller.start().await);

    assert!(matches!(
        err,
        AppError::Provider(ProviderError::WrongQuestionCount {
            expected: 5,
            actual: 3
        })
    ));
    assert_eq!(controller.status(), SessionStatus::NotStarted);
}

#[tokio::test]
async fn test_reset_discards_in_progress_answers() {
    let mut controller = controller_with(ScriptedQuestions::reliable(), Arc::new(GatedSummaries::open()));
    assert_ok!(controller.start().await);
    assert_ok!(controller.select_answer(0, "Paris"));

    controller.reset();
    assert!(controller.answers().is_empty());
    assert_eq!(controller.score(), None);

    assert_ok!(controller.start().await);
    assert!(controller.answers().iter().all(Option::is_none));
}

#[tokio::test]
#[ignore] // 需要网络，手动运行：cargo test -- --ignored
async fn test_live_round_trip() {
    quizzical::utils::logging::init(true);

    let config = Config::default();
    let mut controller = QuizController::from_config(&config).expect("创建控制器失败");
    controller.start().await.expect("获取题目失败");

    let answers: Vec<String> = controller
        .questions()
        .iter()
        .map(|q| q.alternatives()[0].clone())
        .collect();
    for (index, value) in answers.iter().enumerate() {
        controller.select_answer(index, value).unwrap();
    }

    let score = controller.submit().unwrap();
    assert!(score <= config.question_count);
    controller.await_enrichment().await;
    assert_eq!(controller.summaries().len(), config.question_count);
}
