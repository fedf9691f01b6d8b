use kioku_core::db::open_db_in_memory;
use kioku_core::{
    ItemRepository, ItemType, NewWord, RepoError, SqliteItemRepository, SqliteWordRepository,
    WordEdit, WordRepository,
};

fn new_word(word: &str, reading: &str, meaning: &str) -> NewWord {
    NewWord {
        word: word.to_string(),
        reading: reading.to_string(),
        meaning: meaning.to_string(),
    }
}

#[test]
fn add_word_starts_unlearned_and_enabled() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWordRepository::try_new(&conn).unwrap();

    let word = repo.add_word(&new_word("犬", "いぬ", "dog")).unwrap();

    assert_eq!(word.word, "犬");
    assert_eq!(word.reading, "いぬ");
    assert_eq!(word.meaning, "dog");
    assert_eq!(word.review.level, 0);
    assert_eq!(word.review.review_count, 0);
    assert!(word.review.last_reviewed.is_none());
    assert!(word.review.enabled);
}

#[test]
fn add_word_rejects_duplicates_and_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWordRepository::try_new(&conn).unwrap();

    repo.add_word(&new_word("猫", "ねこ", "cat")).unwrap();
    let err = repo.add_word(&new_word("猫", "ねこ", "cat")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Duplicate {
            item_type: ItemType::Word,
            ..
        }
    ));

    let blank = repo.add_word(&new_word("", "よみ", "meaning")).unwrap_err();
    assert!(matches!(blank, RepoError::Validation(_)));
}

#[test]
fn update_word_replaces_text_without_touching_review_state() {
    let mut conn = open_db_in_memory().unwrap();

    let id = {
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        repo.add_word(&new_word("話す", "はなす", "to talk")).unwrap().id
    };
    {
        let mut items = SqliteItemRepository::try_new(&mut conn).unwrap();
        items.record_outcome(ItemType::Word, id, true).unwrap();
    }

    let repo = SqliteWordRepository::try_new(&conn).unwrap();
    let updated = repo
        .update_word(
            id,
            &WordEdit {
                word: "話す".to_string(),
                reading: "はなす".to_string(),
                meaning: "to speak; to talk".to_string(),
            },
        )
        .unwrap();

    assert_eq!(updated.meaning, "to speak; to talk");
    assert_eq!(updated.review.level, 1);
    assert_eq!(updated.review.review_count, 1);
    assert!(updated.review.last_reviewed.is_some());
}

#[test]
fn update_unknown_word_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWordRepository::try_new(&conn).unwrap();

    let err = repo
        .update_word(
            4242,
            &WordEdit {
                word: "未知".to_string(),
                reading: "みち".to_string(),
                meaning: "unknown".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            item_type: ItemType::Word,
            id: 4242
        }
    ));
}

#[test]
fn update_word_to_existing_spelling_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWordRepository::try_new(&conn).unwrap();

    repo.add_word(&new_word("犬", "いぬ", "dog")).unwrap();
    let second = repo.add_word(&new_word("猫", "ねこ", "cat")).unwrap();

    let err = repo
        .update_word(
            second.id,
            &WordEdit {
                word: "犬".to_string(),
                reading: "いぬ".to_string(),
                meaning: "dog".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate { .. }));
}

#[test]
fn words_list_is_ordered_by_spelling() {
    let mut conn = open_db_in_memory().unwrap();

    {
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        repo.add_word(&new_word("わたし", "わたし", "I")).unwrap();
        repo.add_word(&new_word("あなた", "あなた", "you")).unwrap();
    }

    let items = SqliteItemRepository::try_new(&mut conn).unwrap();
    let words = items.list_words().unwrap();
    let spellings: Vec<&str> = words.iter().map(|word| word.word.as_str()).collect();
    assert_eq!(spellings, vec!["あなた", "わたし"]);
}
