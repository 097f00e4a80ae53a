mod category;
mod ids;
pub mod item;
mod progress;

pub use category::{Category, CategoryRegistry, ContentKind, page_resource_path};
pub use ids::{CategoryId, CategoryIdError, ContentId, PageNumber, PageNumberError, ParseIdError};
pub use item::{
    ContentDecodeError, ContentItem, Conversation, DialogueLine, ItemKind, Phrase, Sentence,
    Speech, Word, decode_page,
};
pub use progress::{MarkedItem, ProgressRecord};
