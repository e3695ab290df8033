//! Quiz composition and session flow: turns a word selection into a
//! shuffled sequence of self-contained question items, runs one retry
//! round over the missed items, and keeps the running score.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::operations::quiz_log::QuizLogDraft;
use crate::db::operations::words::WordWithMeanings;

/// Options shown per multiple-choice item (1 correct + 3 distractors).
pub const OPTION_COUNT: usize = 4;
/// Padding when the working set cannot yield 3 distinct distractors.
/// An em dash can never equal a real headword or meaning.
pub const PLACEHOLDER_OPTION: &str = "\u{2014}";
/// Minimum eligible words before a matching item is synthesized.
pub const MATCH_MIN_WORDS: usize = 3;
/// Pairs per matching item.
pub const MATCH_MAX_PAIRS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Show the translated definition, pick the headword.
    #[serde(rename = "cn2en")]
    Cn2En,
    /// Show the headword, pick the translated definition.
    #[serde(rename = "en2cn")]
    En2Cn,
    /// Show the translated definition, type the headword.
    #[serde(rename = "spell")]
    Spell,
    /// Bipartite match-the-pairs batch over 3-4 words.
    #[serde(rename = "match")]
    Match,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Cn2En => "cn2en",
            QuestionKind::En2Cn => "en2cn",
            QuestionKind::Spell => "spell",
            QuestionKind::Match => "match",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceQuestion {
    pub kind: QuestionKind,
    pub word_id: String,
    pub meaning_id: String,
    /// Headword, for the pronunciation playback trigger.
    pub word: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellingQuestion {
    pub word_id: String,
    pub meaning_id: String,
    /// Full translated definitions, shown as the spelling prompt.
    pub prompt: String,
    pub answer: String,
    pub uk_phonetic: String,
    pub us_phonetic: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPair {
    pub word_id: String,
    pub meaning_id: String,
    pub en: String,
    pub cn: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuestion {
    pub pairs: Vec<MatchPair>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Question {
    Choice(ChoiceQuestion),
    Spelling(SpellingQuestion),
    Match(MatchQuestion),
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::Choice(q) => q.kind,
            Question::Spelling(_) => QuestionKind::Spell,
            Question::Match(_) => QuestionKind::Match,
        }
    }

    /// One log row per constituent word; a matching item logs every pair
    /// with the shared batch outcome.
    pub fn log_drafts(&self, is_correct: bool) -> Vec<QuizLogDraft> {
        match self {
            Question::Choice(q) => vec![QuizLogDraft {
                word_id: q.word_id.clone(),
                meaning_id: q.meaning_id.clone(),
                quiz_type: q.kind.as_str().to_string(),
                is_correct,
            }],
            Question::Spelling(q) => vec![QuizLogDraft {
                word_id: q.word_id.clone(),
                meaning_id: q.meaning_id.clone(),
                quiz_type: QuestionKind::Spell.as_str().to_string(),
                is_correct,
            }],
            Question::Match(q) => q
                .pairs
                .iter()
                .map(|pair| QuizLogDraft {
                    word_id: pair.word_id.clone(),
                    meaning_id: pair.meaning_id.clone(),
                    quiz_type: QuestionKind::Match.as_str().to_string(),
                    is_correct,
                })
                .collect(),
        }
    }
}

/// Learner's answer to the current question.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Answer {
    /// Selected option text.
    Choice { option: String },
    /// Typed headword; compared trimmed, case-insensitively.
    Spelling { input: String },
    /// Outcome of a matching item: mismatched attempts before completion.
    Match { mismatches: u32 },
}

/// First sense of a (possibly multi-sense, newline-joined) definition,
/// with any leading ordinal label stripped.
pub fn primary_meaning(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    strip_ordinal(first_line).trim().to_string()
}

fn strip_ordinal(line: &str) -> &str {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return trimmed;
    }
    let rest = &trimmed[digits..];
    match rest.strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    }
}

/// Builds the 4-option set: the correct answer plus up to 3 distinct
/// distractors drawn from the pool, sentinel-padded, then shuffled.
pub fn build_options<R: Rng + ?Sized>(correct: &str, pool: &[String], rng: &mut R) -> Vec<String> {
    let mut options = vec![correct.to_string()];

    let mut candidates: Vec<&String> = pool
        .iter()
        .filter(|v| !v.is_empty() && v.as_str() != correct)
        .collect();
    candidates.shuffle(rng);

    for candidate in candidates {
        if options.len() >= OPTION_COUNT {
            break;
        }
        if !options.iter().any(|o| o == candidate) {
            options.push(candidate.clone());
        }
    }

    while options.len() < OPTION_COUNT {
        options.push(PLACEHOLDER_OPTION.to_string());
    }

    options.shuffle(rng);
    options
}

fn headword_pool(words: &[WordWithMeanings]) -> Vec<String> {
    words.iter().map(|w| w.word.word.clone()).collect()
}

fn meaning_pool(words: &[WordWithMeanings]) -> Vec<String> {
    words
        .iter()
        .filter_map(|w| w.meanings.first())
        .map(|m| primary_meaning(&m.meaning_cn))
        .collect()
}

fn plain_question<R: Rng + ?Sized>(
    entry: &WordWithMeanings,
    all_words: &[WordWithMeanings],
    rng: &mut R,
) -> Option<Question> {
    let meaning = entry.meanings.first()?;
    let display_cn = primary_meaning(&meaning.meaning_cn);

    let kind = match rng.random_range(0..3) {
        0 => QuestionKind::Cn2En,
        1 => QuestionKind::En2Cn,
        _ => QuestionKind::Spell,
    };

    let question = match kind {
        QuestionKind::Cn2En => Question::Choice(ChoiceQuestion {
            kind,
            word_id: entry.word.id.clone(),
            meaning_id: meaning.id.clone(),
            word: entry.word.word.clone(),
            prompt: display_cn,
            options: build_options(&entry.word.word, &headword_pool(all_words), rng),
            answer: entry.word.word.clone(),
        }),
        QuestionKind::En2Cn => Question::Choice(ChoiceQuestion {
            kind,
            word_id: entry.word.id.clone(),
            meaning_id: meaning.id.clone(),
            word: entry.word.word.clone(),
            prompt: entry.word.word.clone(),
            options: build_options(&display_cn, &meaning_pool(all_words), rng),
            answer: display_cn,
        }),
        _ => Question::Spelling(SpellingQuestion {
            word_id: entry.word.id.clone(),
            meaning_id: meaning.id.clone(),
            prompt: entry
                .meanings
                .iter()
                .map(|m| m.meaning_cn.clone())
                .collect::<Vec<_>>()
                .join("\n"),
            answer: entry.word.word.clone(),
            uk_phonetic: entry.word.uk_phonetic.clone(),
            us_phonetic: entry.word.us_phonetic.clone(),
        }),
    };

    Some(question)
}

fn match_question<R: Rng + ?Sized>(
    eligible: &[&WordWithMeanings],
    rng: &mut R,
) -> Option<Question> {
    if eligible.len() < MATCH_MIN_WORDS {
        return None;
    }

    let mut subset: Vec<&WordWithMeanings> = eligible.to_vec();
    subset.shuffle(rng);
    subset.truncate(MATCH_MAX_PAIRS.min(subset.len()));

    let pairs = subset
        .iter()
        .filter_map(|entry| {
            let meaning = entry.meanings.first()?;
            Some(MatchPair {
                word_id: entry.word.id.clone(),
                meaning_id: meaning.id.clone(),
                en: entry.word.word.clone(),
                cn: primary_meaning(&meaning.meaning_cn),
            })
        })
        .collect::<Vec<_>>();

    Some(Question::Match(MatchQuestion { pairs }))
}

/// Composes the shuffled question sequence: one plain item per word with
/// at least one meaning, plus one matching item when enough words exist.
/// Words without meanings never produce an item.
pub fn build_questions<R: Rng + ?Sized>(
    words: &[WordWithMeanings],
    rng: &mut R,
) -> Vec<Question> {
    let eligible: Vec<&WordWithMeanings> =
        words.iter().filter(|w| !w.meanings.is_empty()).collect();

    let mut questions: Vec<Question> = eligible
        .iter()
        .filter_map(|entry| plain_question(entry, words, rng))
        .collect();

    if let Some(question) = match_question(&eligible, rng) {
        questions.push(question);
    }

    questions.shuffle(rng);
    questions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Quiz,
    Retry,
    Done,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("没有待回答的题目")]
    NoCurrentQuestion,
    #[error("该题已作答")]
    AlreadyAnswered,
    #[error("答案类型与题目不符")]
    AnswerMismatch,
}

/// Result of grading one submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub is_correct: bool,
    /// To be appended to the quiz log by the caller.
    pub logs: Vec<QuizLogDraft>,
}

/// Explicit session state: question cursor, answered flag, running
/// score, and the missed items feeding the single retry round.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    index: usize,
    phase: Phase,
    score: Score,
    missed: Vec<Question>,
    answered: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Self {
        let phase = if questions.is_empty() {
            Phase::Done
        } else {
            Phase::Quiz
        };
        Self {
            questions,
            index: 0,
            phase,
            score: Score::default(),
            missed: Vec::new(),
            answered: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn current(&self) -> Option<&Question> {
        if self.phase == Phase::Done {
            return None;
        }
        self.questions.get(self.index)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Final percentage, rounded to the nearest integer.
    pub fn final_percent(&self) -> u32 {
        if self.score.total == 0 {
            return 0;
        }
        (self.score.correct as f64 / self.score.total as f64 * 100.0).round() as u32
    }

    /// Grades the current question. Each item accepts exactly one answer.
    pub fn submit(&mut self, answer: &Answer) -> Result<Submission, SessionError> {
        if self.answered {
            return Err(SessionError::AlreadyAnswered);
        }
        let question = self.current().ok_or(SessionError::NoCurrentQuestion)?;

        let is_correct = match (question, answer) {
            (Question::Choice(q), Answer::Choice { option }) => option == &q.answer,
            (Question::Spelling(q), Answer::Spelling { input }) => {
                input.trim().to_lowercase() == q.answer.trim().to_lowercase()
            }
            (Question::Match(_), Answer::Match { mismatches }) => *mismatches == 0,
            _ => return Err(SessionError::AnswerMismatch),
        };

        let logs = question.log_drafts(is_correct);
        if !is_correct {
            self.missed.push(question.clone());
        }

        self.score.total += 1;
        if is_correct {
            self.score.correct += 1;
        }
        self.answered = true;

        Ok(Submission { is_correct, logs })
    }

    /// Moves to the next question. At the end of the primary pass the
    /// missed items become the retry round (fresh distractor sets); after
    /// the retry round the session is done regardless of outcome.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        words: &[WordWithMeanings],
        rng: &mut R,
    ) -> Result<Phase, SessionError> {
        if self.phase == Phase::Done {
            return Ok(Phase::Done);
        }
        if !self.answered {
            return Err(SessionError::NoCurrentQuestion);
        }

        if self.index + 1 < self.questions.len() {
            self.index += 1;
            self.answered = false;
            return Ok(self.phase);
        }

        if self.phase == Phase::Quiz && !self.missed.is_empty() {
            let mut retry: Vec<Question> = self
                .missed
                .drain(..)
                .map(|q| regenerate_options(q, words, rng))
                .collect();
            retry.shuffle(rng);

            self.questions = retry;
            self.index = 0;
            self.answered = false;
            self.phase = Phase::Retry;
            return Ok(Phase::Retry);
        }

        self.phase = Phase::Done;
        Ok(Phase::Done)
    }
}

/// A retried multiple-choice item gets a fresh distractor set; spelling
/// and matching items carry over unchanged.
fn regenerate_options<R: Rng + ?Sized>(
    question: Question,
    words: &[WordWithMeanings],
    rng: &mut R,
) -> Question {
    match question {
        Question::Choice(mut q) => {
            let pool = match q.kind {
                QuestionKind::Cn2En => headword_pool(words),
                _ => meaning_pool(words),
            };
            q.options = build_options(&q.answer, &pool, rng);
            Question::Choice(q)
        }
        other => other,
    }
}
