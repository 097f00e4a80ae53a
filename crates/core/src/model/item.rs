use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::category::ContentKind;
use crate::model::ids::ContentId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentDecodeError {
    #[error("malformed page json: {0}")]
    Json(String),

    #[error("page must be a json array or object")]
    NotAnArrayOrObject,

    #[error("item {index} is not a json object")]
    ItemNotObject { index: usize },

    #[error("item {index} has unknown kind {found:?}")]
    UnknownKind { index: usize, found: String },

    #[error("item {index} is a {found} but this category holds {expected}")]
    KindMismatch {
        index: usize,
        expected: ItemKind,
        found: ItemKind,
    },

    #[error("item {index} cannot be classified")]
    Unclassifiable { index: usize },

    #[error("item {index} is invalid: {reason}")]
    Invalid { index: usize, reason: String },

    #[error("item {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

//
// ─── VARIANTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: ContentId,
    pub word: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: ContentId,
    pub en: String,
    #[serde(alias = "kn")]
    pub translation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub id: ContentId,
    pub phrase: String,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speech {
    pub id: ContentId,
    pub title: String,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    #[serde(alias = "en")]
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ContentId,
    pub title: String,
    pub dialogue: Vec<DialogueLine>,
}

/// Discriminant of a [`ContentItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Word,
    Sentence,
    Phrase,
    Speech,
    Conversation,
}

impl ItemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Word => "word",
            ItemKind::Sentence => "sentence",
            ItemKind::Phrase => "phrase",
            ItemKind::Speech => "speech",
            ItemKind::Conversation => "conversation",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "word" => Some(ItemKind::Word),
            "sentence" => Some(ItemKind::Sentence),
            "phrase" => Some(ItemKind::Phrase),
            "speech" => Some(ItemKind::Speech),
            "conversation" => Some(ItemKind::Conversation),
            _ => None,
        }
    }

    /// The item kind a category schema requires, `None` for generic categories.
    #[must_use]
    pub fn expected_for(kind: ContentKind) -> Option<Self> {
        match kind {
            ContentKind::Words => Some(ItemKind::Word),
            ContentKind::Sentences => Some(ItemKind::Sentence),
            ContentKind::Phrases => Some(ItemKind::Phrase),
            ContentKind::Speech => Some(ItemKind::Speech),
            ContentKind::Conversation => Some(ItemKind::Conversation),
            ContentKind::Generic => None,
        }
    }

    /// Field-set classification for untagged records in generic categories.
    fn classify(obj: &Map<String, Value>) -> Option<Self> {
        if obj.contains_key("dialogue") {
            Some(ItemKind::Conversation)
        } else if obj.contains_key("content") {
            Some(ItemKind::Speech)
        } else if obj.contains_key("word") {
            Some(ItemKind::Word)
        } else if obj.contains_key("phrase") {
            Some(ItemKind::Phrase)
        } else if obj.contains_key("en") {
            Some(ItemKind::Sentence)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── CONTENT ITEM ──────────────────────────────────────────────────────────────
//

/// One learning unit, explicitly tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Word(Word),
    Sentence(Sentence),
    Phrase(Phrase),
    Speech(Speech),
    Conversation(Conversation),
}

impl ContentItem {
    #[must_use]
    pub fn id(&self) -> ContentId {
        match self {
            ContentItem::Word(w) => w.id,
            ContentItem::Sentence(s) => s.id,
            ContentItem::Phrase(p) => p.id,
            ContentItem::Speech(s) => s.id,
            ContentItem::Conversation(c) => c.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            ContentItem::Word(_) => ItemKind::Word,
            ContentItem::Sentence(_) => ItemKind::Sentence,
            ContentItem::Phrase(_) => ItemKind::Phrase,
            ContentItem::Speech(_) => ItemKind::Speech,
            ContentItem::Conversation(_) => ItemKind::Conversation,
        }
    }

    /// Headline text: the word, the sentence, the phrase, or the title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            ContentItem::Word(w) => &w.word,
            ContentItem::Sentence(s) => &s.en,
            ContentItem::Phrase(p) => &p.phrase,
            ContentItem::Speech(s) => &s.title,
            ContentItem::Conversation(c) => &c.title,
        }
    }

    /// Short secondary text shown next to the title in lists.
    #[must_use]
    pub fn preview(&self) -> Option<&str> {
        match self {
            ContentItem::Word(w) => Some(&w.meaning),
            ContentItem::Sentence(s) => Some(&s.translation),
            ContentItem::Phrase(p) => Some(&p.meaning),
            ContentItem::Speech(s) => s.content.first().map(String::as_str),
            ContentItem::Conversation(c) => c.dialogue.first().map(|d| d.line.as_str()),
        }
    }

    /// Lines to feed the sentence scroller; `None` for short-form items.
    #[must_use]
    pub fn scroll_lines(&self) -> Option<Vec<String>> {
        match self {
            ContentItem::Speech(s) => Some(s.content.clone()),
            ContentItem::Conversation(c) => Some(
                c.dialogue
                    .iter()
                    .map(|d| format!("{}: {}", d.speaker, d.line))
                    .collect(),
            ),
            _ => None,
        }
    }
}

//
// ─── INGESTION ─────────────────────────────────────────────────────────────────
//

/// Decodes a page body into tagged items according to the category's schema.
///
/// The body is either a json array of records or a single record, which is
/// normalized to a one-element page.
///
/// # Errors
///
/// Returns `ContentDecodeError` if the body is not json, or if any record does
/// not match the category's item kind.
pub fn decode_page(kind: ContentKind, body: &str) -> Result<Vec<ContentItem>, ContentDecodeError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ContentDecodeError::Json(e.to_string()))?;
    let records = match value {
        Value::Array(records) => records,
        record @ Value::Object(_) => vec![record],
        _ => return Err(ContentDecodeError::NotAnArrayOrObject),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| decode_item(kind, index, record))
        .collect()
}

fn decode_item(
    kind: ContentKind,
    index: usize,
    record: Value,
) -> Result<ContentItem, ContentDecodeError> {
    let Value::Object(mut obj) = record else {
        return Err(ContentDecodeError::ItemNotObject { index });
    };

    let tagged = match obj.remove("kind") {
        Some(Value::String(raw)) => Some(
            ItemKind::parse(&raw).ok_or(ContentDecodeError::UnknownKind { index, found: raw })?,
        ),
        Some(other) => {
            return Err(ContentDecodeError::UnknownKind {
                index,
                found: other.to_string(),
            });
        }
        None => None,
    };

    let expected = ItemKind::expected_for(kind);
    if let (Some(expected), Some(found)) = (expected, tagged) {
        if expected != found {
            return Err(ContentDecodeError::KindMismatch {
                index,
                expected,
                found,
            });
        }
    }

    let item_kind = tagged
        .or(expected)
        .or_else(|| ItemKind::classify(&obj))
        .ok_or(ContentDecodeError::Unclassifiable { index })?;

    drop_shadowed_legacy_fields(item_kind, &mut obj);
    let record = Value::Object(obj);
    let item = match item_kind {
        ItemKind::Word => ContentItem::Word(from_record(index, record)?),
        ItemKind::Sentence => ContentItem::Sentence(from_record(index, record)?),
        ItemKind::Phrase => ContentItem::Phrase(from_record(index, record)?),
        ItemKind::Speech => ContentItem::Speech(from_record(index, record)?),
        ItemKind::Conversation => ContentItem::Conversation(from_record(index, record)?),
    };

    if item.title().trim().is_empty() {
        let field = match item_kind {
            ItemKind::Word => "word",
            ItemKind::Sentence => "en",
            ItemKind::Phrase => "phrase",
            ItemKind::Speech | ItemKind::Conversation => "title",
        };
        return Err(ContentDecodeError::EmptyField { index, field });
    }

    Ok(item)
}

/// A legacy name next to its current name is ignored; the current name wins.
fn drop_shadowed_legacy_fields(kind: ItemKind, obj: &mut Map<String, Value>) {
    match kind {
        ItemKind::Sentence => {
            if obj.contains_key("translation") {
                obj.remove("kn");
            }
        }
        ItemKind::Conversation => {
            if let Some(Value::Array(lines)) = obj.get_mut("dialogue") {
                for line in lines.iter_mut().filter_map(Value::as_object_mut) {
                    if line.contains_key("line") {
                        line.remove("en");
                    }
                }
            }
        }
        ItemKind::Word | ItemKind::Phrase | ItemKind::Speech => {}
    }
}

fn from_record<T: DeserializeOwned>(index: usize, record: Value) -> Result<T, ContentDecodeError> {
    serde_json::from_value(record).map_err(|e| ContentDecodeError::Invalid {
        index,
        reason: e.to_string(),
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
