//! Integration tests against an in-memory SQLite store, covering the
//! save/quiz/checkin flows end to end.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use wordpop_backend::db::operations::{checkins, families, progress, quiz_log, words, StoreError};
use wordpop_backend::db::Database;
use wordpop_backend::services::mastery::{Stage, MASTERY_THRESHOLD};
use wordpop_backend::services::quiz::build_questions;
use wordpop_backend::services::scheduler::{
    select_quiz_words, today_quiz_done, QuizMode, SchedulerPolicy,
};

async fn test_db() -> Database {
    Database::in_memory().await.expect("in-memory database")
}

fn new_word(word: &str, meanings: &[&str]) -> words::NewWord {
    words::NewWord {
        word: word.to_string(),
        uk_phonetic: String::new(),
        us_phonetic: String::new(),
        image_url: String::new(),
        meanings: meanings
            .iter()
            .map(|cn| words::NewMeaning {
                pos: "n".to_string(),
                meaning_cn: cn.to_string(),
                meaning_en: String::new(),
                example_en: String::new(),
                example_cn: String::new(),
            })
            .collect(),
    }
}

fn draft(word_id: &str, is_correct: bool) -> quiz_log::QuizLogDraft {
    quiz_log::QuizLogDraft {
        word_id: word_id.to_string(),
        meaning_id: "m1".to_string(),
        quiz_type: "en2cn".to_string(),
        is_correct,
    }
}

#[tokio::test]
async fn on_disk_database_survives_a_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());

    {
        let db = Database::connect(&db_url).await.expect("open");
        let family = families::create_family(&db, "1234").await.expect("family");
        words::save_word(&db, &family.id, &new_word("apple", &["苹果"]))
            .await
            .expect("save");
        db.pool().close().await;
    }

    let db = Database::connect(&db_url).await.expect("reopen");
    let family = families::get_family_by_pin(&db, "1234")
        .await
        .expect("query")
        .expect("family persisted");
    let collection = words::get_words(&db, &family.id).await.expect("words");
    assert_eq!(collection.len(), 1);
    assert_eq!(collection[0].word.word, "apple");
}

#[tokio::test]
async fn resaving_a_word_replaces_meanings_and_keeps_counts() {
    let db = test_db().await;
    let family = families::create_family(&db, "1234").await.expect("family");

    let saved = words::save_word(&db, &family.id, &new_word("apple", &["苹果"]))
        .await
        .expect("first save");

    progress::bump_counts(&db, &family.id, &saved.id, true)
        .await
        .expect("bump");
    progress::bump_counts(&db, &family.id, &saved.id, false)
        .await
        .expect("bump");

    let resaved = words::save_word(
        &db,
        &family.id,
        &new_word("apple", &["苹果", "苹果公司"]),
    )
    .await
    .expect("second save");
    assert_eq!(resaved.id, saved.id, "same headword keeps its id");

    let collection = words::get_words(&db, &family.id).await.expect("words");
    assert_eq!(collection.len(), 1);
    assert_eq!(collection[0].meanings.len(), 2, "meanings replaced wholesale");

    let p = collection[0].progress.as_ref().expect("progress row");
    assert_eq!(p.correct_count, 1, "counts survive a re-save");
    assert_eq!(p.wrong_count, 1);
    assert_eq!(p.stage, Stage::Testing);
}

#[tokio::test]
async fn families_never_see_each_others_words() {
    let db = test_db().await;
    let fam_a = families::create_family(&db, "1111").await.expect("family a");
    let fam_b = families::create_family(&db, "2222").await.expect("family b");

    let word_a = words::save_word(&db, &fam_a.id, &new_word("cat", &["猫"]))
        .await
        .expect("save");
    words::save_word(&db, &fam_b.id, &new_word("dog", &["狗"]))
        .await
        .expect("save");

    let list_a = words::get_words(&db, &fam_a.id).await.expect("list a");
    let list_b = words::get_words(&db, &fam_b.id).await.expect("list b");
    assert_eq!(list_a.len(), 1);
    assert_eq!(list_a[0].word.word, "cat");
    assert_eq!(list_b.len(), 1);
    assert_eq!(list_b[0].word.word, "dog");

    // Same headword in both families is two independent records.
    words::save_word(&db, &fam_b.id, &new_word("cat", &["猫"]))
        .await
        .expect("duplicate headword across families");

    let err = words::delete_word(&db, &fam_b.id, &word_a.id)
        .await
        .expect_err("cross-family delete must fail");
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn duplicate_pin_is_rejected() {
    let db = test_db().await;
    families::create_family(&db, "8888").await.expect("first");

    let err = families::create_family(&db, "8888")
        .await
        .expect_err("duplicate pin");
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn checkin_is_idempotent_per_day() {
    let db = test_db().await;
    let family = families::create_family(&db, "3333").await.expect("family");
    let today = Utc::now().date_naive();

    checkins::upsert_checkin(&db, &family.id, today)
        .await
        .expect("first checkin");
    checkins::upsert_checkin(&db, &family.id, today)
        .await
        .expect("repeat checkin");

    let dates = checkins::get_checkins(&db, &family.id, today - Duration::days(30))
        .await
        .expect("list");
    assert_eq!(dates, vec![today]);
}

#[tokio::test]
async fn quiz_log_is_append_only_and_ordered() {
    let db = test_db().await;
    let family = families::create_family(&db, "4444").await.expect("family");
    let word = words::save_word(&db, &family.id, &new_word("tree", &["树"]))
        .await
        .expect("save");

    quiz_log::append_quiz_log(&db, &family.id, &draft(&word.id, true))
        .await
        .expect("append");
    quiz_log::append_quiz_log(&db, &family.id, &draft(&word.id, false))
        .await
        .expect("append");

    let log = quiz_log::get_quiz_log(&db, &family.id).await.expect("log");
    assert_eq!(log.len(), 2);
    assert!(log[0].created_at <= log[1].created_at);

    // Deleting the word keeps the quiz history.
    words::delete_word(&db, &family.id, &word.id)
        .await
        .expect("delete");
    let log = quiz_log::get_quiz_log(&db, &family.id).await.expect("log");
    assert_eq!(log.len(), 2);
}

#[tokio::test]
async fn mastery_promotion_requires_the_threshold() {
    let db = test_db().await;
    let family = families::create_family(&db, "5555").await.expect("family");
    let nearly = words::save_word(&db, &family.id, &new_word("sun", &["太阳"]))
        .await
        .expect("save");
    let ready = words::save_word(&db, &family.id, &new_word("moon", &["月亮"]))
        .await
        .expect("save");

    for _ in 0..MASTERY_THRESHOLD - 1 {
        progress::bump_counts(&db, &family.id, &nearly.id, true)
            .await
            .expect("bump");
    }
    for _ in 0..MASTERY_THRESHOLD {
        progress::bump_counts(&db, &family.id, &ready.id, true)
            .await
            .expect("bump");
    }

    let promoted = progress::promote_mastered(
        &db,
        &family.id,
        &[nearly.id.clone(), ready.id.clone()],
    )
    .await
    .expect("promote");
    assert_eq!(promoted, 1);

    let p_nearly = progress::get_progress(&db, &nearly.id)
        .await
        .expect("query")
        .expect("row");
    let p_ready = progress::get_progress(&db, &ready.id)
        .await
        .expect("query")
        .expect("row");
    assert_eq!(p_nearly.stage, Stage::Testing);
    assert_eq!(p_ready.stage, Stage::Mastered);
    assert!(p_ready.next_review_at.is_some());

    // A second promotion pass changes nothing.
    let again = progress::promote_mastered(&db, &family.id, &[ready.id.clone()])
        .await
        .expect("promote");
    assert_eq!(again, 0);
}

#[tokio::test]
async fn mastered_words_stay_in_the_review_rotation() {
    let db = test_db().await;
    let family = families::create_family(&db, "6666").await.expect("family");
    let word = words::save_word(&db, &family.id, &new_word("star", &["星星"]))
        .await
        .expect("save");

    for _ in 0..MASTERY_THRESHOLD {
        quiz_log::append_quiz_log(&db, &family.id, &draft(&word.id, true))
            .await
            .expect("append");
        progress::bump_counts(&db, &family.id, &word.id, true)
            .await
            .expect("bump");
    }
    progress::promote_mastered(&db, &family.id, &[word.id.clone()])
        .await
        .expect("promote");

    let collection = words::get_words(&db, &family.id).await.expect("words");
    let log = quiz_log::get_quiz_log(&db, &family.id).await.expect("log");

    // Quizzed moments ago, so ask again tomorrow.
    let tomorrow = Utc::now() + Duration::days(1);
    let mut rng = StdRng::seed_from_u64(42);
    let selected = select_quiz_words(
        &collection,
        &log,
        &tomorrow,
        QuizMode::Standard,
        SchedulerPolicy::default(),
        &mut rng,
    );
    assert_eq!(selected.len(), 1, "mastered word still reviewable");
    assert_eq!(
        selected[0].progress.as_ref().map(|p| p.stage),
        Some(Stage::Mastered)
    );
}

#[tokio::test]
async fn fresh_collection_flows_into_a_quiz() {
    let db = test_db().await;
    let family = families::create_family(&db, "7777").await.expect("family");

    for (headword, meaning) in [("red", "红色"), ("green", "绿色"), ("blue", "蓝色")] {
        words::save_word(&db, &family.id, &new_word(headword, &[meaning]))
            .await
            .expect("save");
    }
    // Saved but never given a meaning, so it cannot be asked about.
    words::save_word(&db, &family.id, &new_word("cyan", &[]))
        .await
        .expect("save");

    let collection = words::get_words(&db, &family.id).await.expect("words");
    let log = quiz_log::get_quiz_log(&db, &family.id).await.expect("log");
    assert!(log.is_empty());

    let now = Utc::now();
    assert!(!today_quiz_done(&log, &now));

    let mut rng = StdRng::seed_from_u64(7);
    let selected = select_quiz_words(
        &collection,
        &log,
        &now,
        QuizMode::Standard,
        SchedulerPolicy::default(),
        &mut rng,
    );
    assert_eq!(selected.len(), 4, "all new words fit under the cap");

    let questions = build_questions(&selected, &mut rng);
    assert!(!questions.is_empty());
    for question in &questions {
        for entry in question.log_drafts(true) {
            assert_ne!(
                collection
                    .iter()
                    .find(|w| w.word.id == entry.word_id)
                    .map(|w| w.word.word.as_str()),
                Some("cyan"),
                "meaningless word must not appear in questions"
            );
        }
    }
}
