//! Request bodies and sample data shared by the API tests.

use serde_json::{json, Value};
use uuid::Uuid;

use nihongo_srs_backend::models::NewVocabulary;

pub const OWNER: &str = "learner-1";

/// Sample vocabulary item, numbered so display order is easy to assert.
pub fn vocabulary(i: usize) -> NewVocabulary {
    NewVocabulary {
        word: format!("単語{}", i),
        reading: Some(format!("たんご{}", i)),
        meaning: format!("word {}", i),
        original_form: None,
        conjugation_info: None,
    }
}

pub fn create_lesson_request(title: &str, num_words: usize) -> Value {
    let vocabulary: Vec<NewVocabulary> = (0..num_words).map(vocabulary).collect();
    json!({
        "title": title,
        "vocabulary": vocabulary,
    })
}

pub fn rate_item_request(item_id: Uuid, lesson_id: Uuid, skill: &str, quality: i64) -> Value {
    json!({
        "owner": OWNER,
        "item_id": item_id,
        "lesson_id": lesson_id,
        "skill": skill,
        "quality": quality,
    })
}

pub fn lesson_scope_request(lesson_id: Uuid) -> Value {
    json!({
        "owner": OWNER,
        "lesson_id": lesson_id,
    })
}

pub fn due_request(lesson_id: Uuid, skill: &str) -> Value {
    json!({
        "owner": OWNER,
        "lesson_id": lesson_id,
        "skill": skill,
    })
}

pub fn progress_request(lesson_id: Uuid, include_all: bool) -> Value {
    json!({
        "owner": OWNER,
        "lesson_id": lesson_id,
        "include_all": include_all,
    })
}
