//! 测验会话控制器 - 流程层
//!
//! 核心职责：持有唯一的 `QuizSession`，所有状态转换都经过这里
//!
//! 状态机：
//! 1. NotStarted / Submitted → start() → InProgress
//! 2. InProgress → select_answer() → InProgress
//! 3. InProgress → submit() → Submitted（同步计分，后台获取摘要）
//! 4. 任意状态 → reset() → NotStarted
//!
//! 摘要在后台任务中获取，结果经通道返回，控制器按会话代数过滤后合并。

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clients::{BatchRequest, OpenTdbClient, QuestionProvider, SummaryProvider, WikipediaClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, ProviderError, ValidationError};
use crate::models::{Category, Generation, PlacedQuestion, QuizSession, SessionStatus};
use crate::services::{AlternativePlacement, QuestionReview, ScoringEngine, SummaryEnricher, SummaryUpdate};
use crate::utils::logging::{log_score, truncate_text};
use crate::workflow::summary_merge::SummaryMerge;

/// 测验会话控制器
pub struct QuizController {
    question_provider: Arc<dyn QuestionProvider>,
    enricher: SummaryEnricher,
    placement: AlternativePlacement,
    question_count: usize,
    category: Category,
    fetch_timeout: Duration,
    session: QuizSession,
    /// 当前会话尚未返回的摘要数量
    pending_summaries: usize,
    /// `start()` 所在的运行时，`submit()` 在其上派发摘要任务
    runtime: Option<Handle>,
    /// 当前会话的摘要任务
    enrichment: Option<JoinHandle<usize>>,
    updates_tx: UnboundedSender<SummaryUpdate>,
    updates_rx: UnboundedReceiver<SummaryUpdate>,
}

impl QuizController {
    /// 创建新的控制器
    pub fn new(
        config: &Config,
        question_provider: Arc<dyn QuestionProvider>,
        summary_provider: Arc<dyn SummaryProvider>,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            question_provider,
            enricher: SummaryEnricher::new(summary_provider),
            placement: AlternativePlacement::new(),
            question_count: config.question_count,
            category: config.category,
            fetch_timeout: config.request_timeout(),
            session: QuizSession::not_started(Generation::default()),
            pending_summaries: 0,
            runtime: None,
            enrichment: None,
            updates_tx,
            updates_rx,
        }
    }

    /// 使用 Open Trivia DB 和 Wikipedia 创建控制器
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let questions = OpenTdbClient::new(config)?;
        let summaries = WikipediaClient::new(config)
            .map_err(|e| ConfigError::invalid("summary_api_base_url", e.to_string()))?;
        Ok(Self::new(config, Arc::new(questions), Arc::new(summaries)))
    }

    /// 替换选项定位服务（测试中用固定种子）
    pub fn with_placement(mut self, placement: AlternativePlacement) -> Self {
        self.placement = placement;
        self
    }

    /// 开始新的一局
    ///
    /// 只允许在 NotStarted / Submitted 状态调用。题目全部到达并校验通过后才替换会话，
    /// 失败时保持原状态，可直接重试；中途丢弃返回的 future 也不会留下半成品状态。
    pub async fn start(&mut self) -> AppResult<()> {
        let current = self.session.status();
        if current == SessionStatus::InProgress {
            return Err(AppError::invalid_state("start", current));
        }

        let request = BatchRequest::new(self.question_count, self.category);
        info!(
            "📥 正在获取 {} 道题目 (分类: {})...",
            request.amount, request.category
        );

        let questions = match tokio::time::timeout(
            self.fetch_timeout,
            self.question_provider.fetch_batch(&request),
        )
        .await
        {
            Ok(Ok(questions)) => questions,
            Ok(Err(e)) => {
                warn!("⚠️ 获取题目失败: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                warn!("⚠️ 获取题目超时");
                return Err(ProviderError::Timeout {
                    timeout_secs: self.fetch_timeout.as_secs(),
                }
                .into());
            }
        };

        if questions.len() != self.question_count {
            warn!(
                "⚠️ 题目数量不符: 期望 {}，实际 {}",
                self.question_count,
                questions.len()
            );
            return Err(ProviderError::WrongQuestionCount {
                expected: self.question_count,
                actual: questions.len(),
            }
            .into());
        }

        let placed = self.placement.place_batch(questions);
        let generation = self.session.generation().next();
        self.session = QuizSession::in_progress(generation, placed);
        self.pending_summaries = 0;
        self.enrichment = None;
        if let Ok(runtime) = Handle::try_current() {
            self.runtime = Some(runtime);
        }

        info!("✓ [会话 {}] 开始答题，共 {} 题", generation, self.session.len());
        for (i, question) in self.session.questions().iter().enumerate() {
            debug!(
                "[题目#{}] {} (正确答案位置: {})",
                i + 1,
                truncate_text(question.prompt(), 40),
                question.slot()
            );
        }
        Ok(())
    }

    /// 选择答案
    ///
    /// 重复选择同一个值不会改变状态。
    pub fn select_answer(&mut self, index: usize, value: &str) -> AppResult<()> {
        let current = self.session.status();
        if current != SessionStatus::InProgress {
            return Err(AppError::invalid_state("select_answer", current));
        }

        let question = self.session.questions().get(index).ok_or(
            ValidationError::IndexOutOfRange {
                index,
                count: self.session.len(),
            },
        )?;

        if !question.has_alternative(value) {
            return Err(ValidationError::UnknownAlternative {
                index,
                value: value.to_string(),
            }
            .into());
        }

        if self.session.answers()[index].as_deref() == Some(value) {
            return Ok(());
        }

        debug!("[题目#{}] 选择: {}", index + 1, value);
        self.session.set_answer(index, value.to_string());
        Ok(())
    }

    /// 提交答案
    ///
    /// 全部作答后才能提交：冻结答案、同步计分、后台获取摘要。
    ///
    /// 摘要任务派发到 `start()` 所在的 tokio 运行时，因此可以在运行时上下文之外调用；
    /// 找不到运行时时跳过摘要获取，所有摘要视为不可用。
    ///
    /// # 返回
    /// 答对的题目数量
    pub fn submit(&mut self) -> AppResult<usize> {
        let current = self.session.status();
        if current != SessionStatus::InProgress {
            return Err(AppError::invalid_state("submit", current));
        }

        let unanswered = self.session.unanswered();
        if !unanswered.is_empty() {
            return Err(ValidationError::Unanswered { unanswered }.into());
        }

        let score = ScoringEngine::score(self.session.answers(), self.session.questions());
        self.session.freeze(score);
        log_score(score, self.session.len());

        let titles: Vec<String> = self
            .session
            .questions()
            .iter()
            .map(|q| q.correct_answer().to_string())
            .collect();
        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => {
                self.pending_summaries = titles.len();
                self.enrichment = Some(self.enricher.dispatch(
                    &runtime,
                    self.session.generation(),
                    titles,
                    self.updates_tx.clone(),
                ));
            }
            None => warn!("⚠️ 没有可用的 tokio 运行时，跳过摘要获取"),
        }

        Ok(score)
    }

    /// 放弃当前会话，回到 NotStarted
    pub fn reset(&mut self) {
        let generation = self.session.generation().next();
        if self.pending_summaries > 0 {
            info!(
                "[会话 {}] 丢弃，{} 条摘要请求作废",
                self.session.generation(),
                self.pending_summaries
            );
        }
        self.session = QuizSession::not_started(generation);
        self.pending_summaries = 0;
        // 不中止旧任务，迟到的结果靠代数过滤
        self.enrichment = None;
    }

    /// 等待下一条摘要结果并合并
    ///
    /// 可安全地放在 `tokio::select!` 中。
    pub async fn recv_summary_update(&mut self) -> Option<SummaryMerge> {
        let update = self.updates_rx.recv().await?;
        Some(self.merge_summary(update))
    }

    /// 合并所有已到达的摘要结果，不等待
    pub fn drain_summary_updates(&mut self) -> Vec<SummaryMerge> {
        let mut merged = Vec::new();
        while let Ok(update) = self.updates_rx.try_recv() {
            merged.push(self.merge_summary(update));
        }
        merged
    }

    /// 等待当前会话的全部摘要返回
    ///
    /// 摘要任务异常结束时，未返回的摘要视为不可用。
    pub async fn await_enrichment(&mut self) {
        while self.pending_summaries > 0 {
            let Some(task) = self.enrichment.as_mut() else {
                break;
            };
            tokio::select! {
                biased;
                Some(update) = self.updates_rx.recv() => {
                    self.merge_summary(update);
                }
                joined = task => {
                    self.enrichment = None;
                    if let Err(e) = joined {
                        warn!("⚠️ [会话 {}] 摘要任务异常结束: {}", self.session.generation(), e);
                    }
                    self.drain_summary_updates();
                    if self.pending_summaries > 0 {
                        warn!("[会话 {}] {} 条摘要未返回", self.session.generation(), self.pending_summaries);
                        self.pending_summaries = 0;
                    }
                }
            }
        }
    }

    fn merge_summary(&mut self, update: SummaryUpdate) -> SummaryMerge {
        if update.generation != self.session.generation()
            || self.session.status() != SessionStatus::Submitted
        {
            debug!(
                "[会话 {}] 丢弃过期摘要 (题目#{})",
                update.generation,
                update.index + 1
            );
            return SummaryMerge::Stale {
                generation: update.generation,
            };
        }

        self.pending_summaries = self.pending_summaries.saturating_sub(1);
        match update.result {
            Ok(text) => {
                if self.session.set_summary(update.index, text) {
                    SummaryMerge::Merged { index: update.index }
                } else {
                    warn!("[题目#{}] 摘要索引越界，已忽略", update.index + 1);
                    SummaryMerge::Unavailable { index: update.index }
                }
            }
            Err(e) => {
                warn!("[题目#{}] 摘要不可用: {}", update.index + 1, e);
                SummaryMerge::Unavailable { index: update.index }
            }
        }
    }

    /// 逐题批改结果，仅在提交后可用
    pub fn review(&self) -> AppResult<Vec<QuestionReview>> {
        let current = self.session.status();
        if current != SessionStatus::Submitted {
            return Err(AppError::invalid_state("review", current));
        }
        Ok(ScoringEngine::review(
            self.session.answers(),
            self.session.questions(),
        ))
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn generation(&self) -> Generation {
        self.session.generation()
    }

    pub fn questions(&self) -> &[PlacedQuestion] {
        self.session.questions()
    }

    pub fn answers(&self) -> &[Option<String>] {
        self.session.answers()
    }

    pub fn summaries(&self) -> &[Option<String>] {
        self.session.summaries()
    }

    pub fn score(&self) -> Option<usize> {
        self.session.score()
    }

    pub fn pending_summaries(&self) -> usize {
        self.pending_summaries
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn category(&self) -> Category {
        self.category
    }
}
